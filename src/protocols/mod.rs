//! Protocol boundaries for the negotiation layer
//!
//! Only SMB/CIFS is handled; the wire implementation itself is supplied by
//! the embedding application through [`smb::SmbCapability`].

pub mod smb;
