//! ---
//! quorum_section: "testing-security"
//! quorum_subsection: "integration-tests"
//! quorum_type: "source"
//! quorum_scope: "code"
//! quorum_description: "End-to-end validation of the security settings fixture."
//! quorum_version: "v0.1.0"
//! quorum_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use indexmap::IndexMap;
use quorum_security_fixture::credentials::{
    DEFAULT_CLIENT_USER_NAME, DEFAULT_PASSWORD, DEFAULT_USER_NAME,
};
use quorum_security_fixture::source::{AUTHORIZATION_HEADER_SETTING, USER_SETTING};
use quorum_security_fixture::{RolePermissions, Scope, SecuritySettingsSource, Settings};
use tempfile::tempdir;

/// Resolve the `user:password` identity regardless of which credential form
/// the fixture picked.
fn effective_identity(settings: &Settings) -> String {
    if let Some(header) = settings.get(AUTHORIZATION_HEADER_SETTING) {
        let encoded = header.strip_prefix("Basic ").unwrap();
        return String::from_utf8(BASE64.decode(encoded).unwrap()).unwrap();
    }
    settings.get(USER_SETTING).unwrap().to_string()
}

#[test]
fn node_and_client_settings_stage_a_secured_cluster() {
    let dir = tempdir().unwrap();
    let source = SecuritySettingsSource::new(3, dir.path(), Scope::Suite).unwrap();

    let node0 = source.node(0).unwrap();
    let node1 = source.node(1).unwrap();

    // Credential files are well formed and per-node.
    let users_path0 = node0.get("security.authc.realms.file.files.users").unwrap();
    let users_path1 = node1.get("security.authc.realms.file.files.users").unwrap();
    assert_ne!(users_path0, users_path1);
    let users = fs::read_to_string(users_path0).unwrap();
    assert_eq!(
        users,
        "test_user:{plain}changeme\ntest_client_user:{plain}changeme\n"
    );
    let users_roles =
        fs::read_to_string(node0.get("security.authc.realms.file.files.users_roles").unwrap())
            .unwrap();
    assert_eq!(
        users_roles,
        "user:test_user,test_client_user\nclient_user:test_client_user\n"
    );

    // The roles document parses back into role permissions.
    let roles_raw =
        fs::read_to_string(node0.get("security.authz.store.files.roles").unwrap()).unwrap();
    let roles: IndexMap<String, RolePermissions> = serde_yaml::from_str(&roles_raw).unwrap();
    assert!(roles.contains_key("user"));
    assert!(roles.contains_key("client_user"));

    // Every node of one fixture shares the same system key.
    let key0 = fs::read(node0.get("security.system_key.file").unwrap()).unwrap();
    let key1 = fs::read(node1.get("security.system_key.file").unwrap()).unwrap();
    assert_eq!(key0, key1);
    assert_eq!(key0, source.system_key().as_bytes());

    // SSL settings point at existing store material; truststore, when
    // present, mirrors the keystore.
    let keystore = node0.get("security.ssl.keystore.path").unwrap();
    assert!(Path::new(keystore).exists());
    assert_eq!(node0.get("security.ssl.keystore.password"), Some("testnode"));
    assert_eq!(node0.get("security.transport.ssl"), Some("true"));
    assert_eq!(node0.get("security.http.ssl"), Some("false"));
    if let Some(truststore) = node0.get("security.ssl.truststore.path") {
        assert_eq!(truststore, keystore);
    }

    // The node-client identity is stable regardless of credential form.
    assert_eq!(
        effective_identity(&node0),
        format!("{DEFAULT_USER_NAME}:{DEFAULT_PASSWORD}")
    );

    // Client settings use the client store and client identity.
    let client = source.client().unwrap();
    assert_eq!(
        client.get("security.ssl.keystore.password"),
        Some("testclient")
    );
    assert!(Path::new(client.get("security.ssl.keystore.path").unwrap()).exists());
    assert_eq!(
        effective_identity(&client),
        format!("{DEFAULT_CLIENT_USER_NAME}:{DEFAULT_PASSWORD}")
    );
}

#[test]
fn distinct_fixtures_get_distinct_keys_and_directories() {
    let dir_a = tempdir().unwrap();
    let dir_b = tempdir().unwrap();
    let source_a = SecuritySettingsSource::new(1, dir_a.path(), Scope::Test).unwrap();
    let source_b = SecuritySettingsSource::new(1, dir_b.path(), Scope::Test).unwrap();

    assert_ne!(
        source_a.system_key().as_bytes(),
        source_b.system_key().as_bytes()
    );

    let node_a = source_a.node(0).unwrap();
    let node_b = source_b.node(0).unwrap();
    assert_ne!(
        node_a.get("security.system_key.file"),
        node_b.get("security.system_key.file")
    );
}

#[test]
fn node_folder_is_recreated_on_reassembly() {
    let dir = tempdir().unwrap();
    let source = SecuritySettingsSource::new(1, dir.path(), Scope::Test).unwrap();

    let first = source.node(0).unwrap();
    let users_path = first.get("security.authc.realms.file.files.users").unwrap();
    let folder = Path::new(users_path).parent().unwrap().to_path_buf();
    fs::write(folder.join("stale"), b"leftover").unwrap();

    source.node(0).unwrap();
    assert!(!folder.join("stale").exists());
    assert!(folder.join("users").exists());
}
