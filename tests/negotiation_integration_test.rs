/*!
 * Integration tests for dialect negotiation and share listing
 */

use std::sync::Arc;

use orbit_dialect::config::NegotiationConfig;
use orbit_dialect::negotiation::{
    DialectRestriction, DialectVerdict, MemoryCredentialStore, MemoryPreferences,
    NegotiationStack, TomlPreferences, STRICT_NEGOTIATION_KEY,
};
use orbit_dialect::protocols::smb::{Credential, Dialect, MockOutcome, MockSmbCapability, RemoteEntry};
use tempfile::tempdir;

struct Harness {
    capability: Arc<MockSmbCapability>,
    credentials: Arc<MemoryCredentialStore>,
    preferences: Arc<MemoryPreferences>,
    stack: NegotiationStack,
}

fn harness() -> Harness {
    harness_with(NegotiationConfig::default())
}

fn harness_with(config: NegotiationConfig) -> Harness {
    let capability = Arc::new(MockSmbCapability::new());
    let credentials = Arc::new(MemoryCredentialStore::new());
    let preferences = Arc::new(MemoryPreferences::new());
    let stack = NegotiationStack::new(
        &config,
        credentials.clone(),
        preferences.clone(),
        capability.clone(),
    );
    Harness {
        capability,
        credentials,
        preferences,
        stack,
    }
}

#[test]
fn test_smb1_server_scenario() {
    let h = harness();
    h.capability.script("nas.local", Dialect::Smb2, MockOutcome::ProtocolFailure);
    h.capability.serve("nas.local", Dialect::Smb1, vec![]);

    let handle = h.stack.selector().select("smb://nas.local/share", true).unwrap();

    assert_eq!(h.stack.cache().get("nas.local"), DialectVerdict::ConfirmedV1);
    assert_eq!(h.stack.cache().len(), 1);
    assert_eq!(h.stack.cache().writes(), 1);
    assert_eq!(handle.context().restriction(), DialectRestriction::Strict);
    assert_eq!(handle.context().dialect(), Dialect::Smb1);

    let probes: Vec<_> = h.capability.root_calls().iter().map(|c| c.dialect).collect();
    assert_eq!(probes, vec![Dialect::Smb2, Dialect::Smb1]);
}

#[test]
fn test_exactly_one_probe_per_unknown_host() {
    let h = harness();
    h.capability.serve("fileserver", Dialect::Smb2, vec![]);

    let handle = h.stack.selector().select("smb://fileserver/projects", true).unwrap();
    assert_eq!(handle.context().to_string(), "strict-smb2");
    assert_eq!(h.capability.root_calls().len(), 1);

    // Cached verdict: no further probing
    for _ in 0..5 {
        let handle = h.stack.selector().select("smb://fileserver/projects/q4", true).unwrap();
        assert_eq!(handle.context().to_string(), "strict-smb2");
    }
    assert_eq!(h.capability.open_count(), 1);
    assert_eq!(h.stack.cache().writes(), 1);
}

#[test]
fn test_auth_failure_never_tries_smb1() {
    let h = harness();
    h.capability.script("nas.local", Dialect::Smb2, MockOutcome::AuthFailure);
    h.capability.serve("nas.local", Dialect::Smb1, vec![]);

    let handle = h.stack.selector().select("smb://nas.local/share", true).unwrap();

    let calls = h.capability.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].dialect, Dialect::Smb2);
    assert_eq!(h.stack.cache().get("nas.local"), DialectVerdict::Unknown);
    // Optimistic default when the dialect stays unknown
    assert_eq!(handle.context().to_string(), "strict-smb2");
}

#[test]
fn test_unknown_verdict_reprobes() {
    let h = harness();

    h.stack.selector().select("smb://offline/share", true).unwrap();
    h.stack.selector().select("smb://offline/share", true).unwrap();

    // Two full probe sequences, nothing cached
    assert_eq!(h.capability.root_calls().len(), 4);
    assert!(h.stack.cache().is_empty());
}

#[test]
fn test_toggle_changes_next_selection_without_cache_mutation() {
    let h = harness();
    h.capability.serve("nas.local", Dialect::Smb2, vec![]);

    h.preferences.set_bool(STRICT_NEGOTIATION_KEY, true);
    let strict = h.stack.selector().connect("smb://nas.local/share").unwrap();
    assert!(strict.context().is_strict());
    let before = h.stack.cache().snapshot();

    h.preferences.set_bool(STRICT_NEGOTIATION_KEY, false);
    let permissive = h.stack.selector().connect("smb://nas.local/share").unwrap();
    assert_eq!(permissive.context().restriction(), DialectRestriction::Permissive);

    assert_eq!(h.stack.cache().snapshot(), before);
    assert_eq!(h.capability.open_count(), 1);
}

#[test]
fn test_guest_when_no_credential() {
    let h = harness();
    let handle = h.stack.selector().select("smb://nas.local/share", false).unwrap();

    let auth = handle.auth();
    assert_eq!(auth.username, "GUEST");
    assert_eq!(auth.domain, "");
    assert_eq!(auth.password.expose(), "");
}

#[test]
fn test_stored_credentials_used_for_listing() {
    let h = harness();
    h.credentials
        .insert("smb://nas.local/share/", Credential::new("jdoe", "pw"));
    h.capability.serve("nas.local", Dialect::Smb1, vec![RemoteEntry::file("a.txt")]);

    let entries = h.stack.lister().list("smb://nas.local/share/").unwrap().unwrap();
    assert_eq!(entries.len(), 1);

    let calls = h.capability.calls();
    assert_eq!(calls.last().unwrap().username, "jdoe");
}

#[test]
fn test_strict_listing_end_to_end() {
    let h = harness();
    h.preferences.set_bool(STRICT_NEGOTIATION_KEY, true);
    h.capability.serve("nas.local", Dialect::Smb1, vec![RemoteEntry::directory("share/")]);
    h.capability
        .set_listing(
            "smb://nas.local/share/",
            MockOutcome::Entries(vec![
                RemoteEntry::file("smb://nas.local/share/movie.mkv"),
                RemoteEntry::other("smb://nas.local/share/lpt1"),
                RemoteEntry::directory("smb://nas.local/share/series/"),
            ]),
        )
        .unwrap();

    let entries = h.stack.lister().list("smb://nas.local/share/").unwrap().unwrap();
    let paths: Vec<_> = entries.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        paths,
        vec!["smb://nas.local/share/movie.mkv", "smb://nas.local/share/series/"]
    );

    let last = h.capability.calls().pop().unwrap();
    assert_eq!(last.path, "/share/");
    assert_eq!(last.restriction, DialectRestriction::Strict);
    assert_eq!(last.dialect, Dialect::Smb1);
}

#[test]
fn test_listing_null_versus_empty() {
    let h = harness();
    h.capability.serve("nas.local", Dialect::Smb1, vec![]);
    h.capability
        .set_listing("smb://nas.local/empty/", MockOutcome::NoResultSet)
        .unwrap();
    h.capability
        .set_listing(
            "smb://nas.local/special/",
            MockOutcome::Entries(vec![RemoteEntry::other("IPC$")]),
        )
        .unwrap();

    assert_eq!(h.stack.lister().list("smb://nas.local/empty/").unwrap(), None);
    assert_eq!(
        h.stack.lister().list("smb://nas.local/special/").unwrap(),
        Some(Vec::new())
    );
}

#[test]
fn test_misconfigured_properties_still_list() {
    let mut config = NegotiationConfig::default();
    config.properties.resolve_order = vec!["SMOKE-SIGNALS".to_string()];
    let h = harness_with(config);
    h.capability.serve("nas.local", Dialect::Smb1, vec![RemoteEntry::file("a.txt")]);

    assert!(h.stack.contexts().permissive(Dialect::Smb1).is_fallback());
    let entries = h.stack.lister().list("smb://nas.local/share/").unwrap().unwrap();
    assert_eq!(entries.len(), 1);
}

#[test]
fn test_file_backed_preferences() {
    let dir = tempdir().unwrap();
    let prefs_path = dir.path().join("prefs.toml");
    std::fs::write(&prefs_path, "strict_negotiation_enabled = true\n").unwrap();

    let capability = Arc::new(MockSmbCapability::new());
    capability.serve("nas.local", Dialect::Smb2, vec![]);
    let stack = NegotiationStack::new(
        &NegotiationConfig::default(),
        Arc::new(MemoryCredentialStore::new()),
        Arc::new(TomlPreferences::new(prefs_path.clone())),
        capability.clone(),
    );

    let handle = stack.selector().connect("smb://nas.local/share").unwrap();
    assert_eq!(handle.context().to_string(), "strict-smb2");

    std::fs::write(&prefs_path, "strict_negotiation_enabled = false\n").unwrap();
    let handle = stack.selector().connect("smb://nas.local/share").unwrap();
    assert_eq!(handle.context().to_string(), "permissive-smb1");
}

#[test]
fn test_config_file_drives_stack() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("negotiation.toml");
    std::fs::write(
        &path,
        r#"
permissive_dialect = "smb2"
unresolved_fallback = "permissive-smb2"
"#,
    )
    .unwrap();

    let config = NegotiationConfig::from_file(&path).unwrap();
    let h = harness_with(config);

    let handle = h.stack.selector().select("smb://nas.local/share", false).unwrap();
    assert_eq!(handle.context().to_string(), "permissive-smb2");

    let handle = h.stack.selector().select("smb://unknown/share", true).unwrap();
    assert_eq!(handle.context().to_string(), "permissive-smb2");
}

#[test]
fn test_limit_off_toggle_selects_permissive_smb2() {
    let mut config = NegotiationConfig::default();
    config.limit_protocol_negotiation = false;
    let h = harness_with(config);

    h.preferences.set_bool(STRICT_NEGOTIATION_KEY, true);
    let handle = h.stack.selector().connect("smb://nas.local/share").unwrap();
    assert_eq!(handle.context().to_string(), "permissive-smb2");

    h.preferences.set_bool(STRICT_NEGOTIATION_KEY, false);
    let handle = h.stack.selector().connect("smb://nas.local/share").unwrap();
    assert_eq!(handle.context().to_string(), "permissive-smb1");

    assert_eq!(h.capability.open_count(), 0);
    assert!(h.stack.cache().is_empty());
}
