//! ---
//! quorum_section: "testing-security"
//! quorum_subsection: "module"
//! quorum_type: "source"
//! quorum_scope: "code"
//! quorum_description: "Settings source staging security configuration per test node."
//! quorum_version: "v0.1.0"
//! quorum_owner: "tbd"
//! ---
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rand::Rng;
use tracing::{debug, info};

use crate::credentials::{
    basic_auth_header_value, default_roles, default_users, default_users_roles, render_roles,
    render_users, render_users_roles, DEFAULT_CLIENT_USER_NAME, DEFAULT_PASSWORD,
    DEFAULT_USER_NAME,
};
use crate::settings::{Settings, SettingsBuilder};
use crate::syskey::SystemKey;
use crate::tls::{
    absolute_path, ssl_settings_for_store, FixtureCa, PemStore, CLIENT_STORE_PASSWORD,
    NODE_STORE_PASSWORD,
};

/// Settings key holding the system key file path.
pub const SYSTEM_KEY_FILE_SETTING: &str = "security.system_key.file";
/// Settings key carrying a pre-built basic-auth request header.
pub const AUTHORIZATION_HEADER_SETTING: &str = "request.headers.Authorization";
/// Settings key embedding the `user:password` credential directly.
pub const USER_SETTING: &str = "security.user";

/// Scope of the requesting test, used to prefix per-node config folders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Shared across the whole test binary.
    Global,
    /// One cluster per suite.
    Suite,
    /// One cluster per test.
    Test,
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Global => "global",
            Self::Suite => "suite",
            Self::Test => "test",
        };
        f.write_str(name)
    }
}

/// Content hooks for the staged files and identities.
///
/// Default implementations stage the standard fixture identities; derived
/// fixtures override individual hooks to stage alternative credential sets.
pub trait FixtureContent {
    /// Body of the users file.
    fn users(&self) -> Result<String> {
        Ok(render_users(&default_users()))
    }

    /// Body of the users_roles file.
    fn users_roles(&self) -> Result<String> {
        Ok(render_users_roles(&default_users_roles()))
    }

    /// Body of the roles document.
    fn roles(&self) -> Result<String> {
        render_roles(&default_roles())
    }

    /// Username every node authenticates its internal client with.
    fn node_client_username(&self) -> String {
        DEFAULT_USER_NAME.to_string()
    }

    /// Password for [`Self::node_client_username`].
    fn node_client_password(&self) -> String {
        DEFAULT_PASSWORD.to_string()
    }

    /// Username external clients authenticate with.
    fn client_username(&self) -> String {
        DEFAULT_CLIENT_USER_NAME.to_string()
    }

    /// Password for [`Self::client_username`].
    fn client_password(&self) -> String {
        DEFAULT_PASSWORD.to_string()
    }
}

/// Standard fixture content.
#[derive(Debug, Default, Clone, Copy)]
pub struct StandardContent;

impl FixtureContent for StandardContent {}

/// Synthesizes the on-disk security configuration for one secured test
/// cluster and exposes it as settings maps for node and client bootstrap.
///
/// Every cluster should have its own instance, as each writes its own
/// configuration files under `parent_dir`.
pub struct SecuritySettingsSource<C = StandardContent> {
    num_of_nodes: usize,
    parent_dir: PathBuf,
    scope: Scope,
    system_key: SystemKey,
    node_store: PemStore,
    client_store: PemStore,
    content: C,
}

impl SecuritySettingsSource<StandardContent> {
    /// Create a settings source staging the standard identities.
    ///
    /// `num_of_nodes` is the number of nodes the encompassing discovery
    /// configuration expects (it can exceed the nodes actually started);
    /// `parent_dir` will hold every configuration file the fixture writes.
    pub fn new(num_of_nodes: usize, parent_dir: impl AsRef<Path>, scope: Scope) -> Result<Self> {
        Self::with_content(num_of_nodes, parent_dir, scope, StandardContent)
    }
}

impl<C: FixtureContent> SecuritySettingsSource<C> {
    /// Create a settings source with custom content hooks.
    pub fn with_content(
        num_of_nodes: usize,
        parent_dir: impl AsRef<Path>,
        scope: Scope,
        content: C,
    ) -> Result<Self> {
        let parent_dir = parent_dir.as_ref().to_path_buf();
        fs::create_dir_all(&parent_dir).with_context(|| {
            format!("unable to create fixture directory {}", parent_dir.display())
        })?;

        let system_key = SystemKey::generate();
        let ca = FixtureCa::new()?;
        let node_store = ca.issue_store("testnode", NODE_STORE_PASSWORD, &parent_dir)?;
        let client_store = ca.issue_store("testclient", CLIENT_STORE_PASSWORD, &parent_dir)?;
        info!(
            scope = %scope,
            num_of_nodes,
            system_key = %system_key.fingerprint(),
            "created security settings source"
        );

        Ok(Self {
            num_of_nodes,
            parent_dir,
            scope,
            system_key,
            node_store,
            client_store,
            content,
        })
    }

    /// Number of nodes the discovery configuration expects.
    pub fn num_of_nodes(&self) -> usize {
        self.num_of_nodes
    }

    /// Scope this source was created for.
    pub fn scope(&self) -> Scope {
        self.scope
    }

    /// System key shared by every node of this fixture.
    pub fn system_key(&self) -> &SystemKey {
        &self.system_key
    }

    /// Settings common to every node before security configuration is added.
    fn base_node_settings(&self) -> Settings {
        Settings::builder()
            .put("node.mode", "network")
            .put("plugins.types", "quorum-security")
            .put("plugins.load_bundled", false)
            .build()
    }

    /// Assemble the settings for one node, (re)creating its config folder and
    /// writing the credential files, roles document, and system key into it.
    pub fn node(&self, node_ordinal: usize) -> Result<Settings> {
        let folder = recreate_folder(&self.parent_dir, &format!("{}-{}", self.scope, node_ordinal))?;
        let users_path = write_file(&folder, "users", self.content.users()?.as_bytes())?;
        let users_roles_path =
            write_file(&folder, "users_roles", self.content.users_roles()?.as_bytes())?;
        let roles_path = write_file(&folder, "roles.yml", self.content.roles()?.as_bytes())?;
        let key_file = folder.join("system_key");
        self.system_key.write_to(&key_file)?;

        let mut rng = rand::thread_rng();
        let mut builder = Settings::builder()
            .put_all(&self.base_node_settings())
            .put("security.audit.enabled", rng.gen_bool(0.5))
            .put(SYSTEM_KEY_FILE_SETTING, absolute_path(&key_file)?)
            .put("security.authc.realms.file.type", "file")
            .put("security.authc.realms.file.files.users", users_path)
            .put(
                "security.authc.realms.file.files.users_roles",
                users_roles_path,
            )
            .put("security.authz.store.files.roles", roles_path)
            .put_all(&ssl_settings_for_store(&self.node_store)?);

        if cfg!(target_os = "macos") {
            let host = if rng.gen_bool(0.5) { "127.0.0.1" } else { "::1" };
            builder = builder.put("network.host", host);
        }

        builder = put_user(
            builder,
            &self.content.node_client_username(),
            &self.content.node_client_password(),
        );
        Ok(builder.build())
    }

    /// Assemble the settings an external client uses to reach the cluster.
    pub fn client(&self) -> Result<Settings> {
        let builder = Settings::builder().put_all(&ssl_settings_for_store(&self.client_store)?);
        Ok(put_user(
            builder,
            &self.content.client_username(),
            &self.content.client_password(),
        )
        .build())
    }
}

/// Credential setting for an identity: either a pre-built basic-auth header
/// or the embedded `user:password` form. Both denote the same identity.
fn user_credential(username: &str, password: &str, use_header: bool) -> (&'static str, String) {
    if use_header {
        (
            AUTHORIZATION_HEADER_SETTING,
            basic_auth_header_value(username, password),
        )
    } else {
        (USER_SETTING, format!("{username}:{password}"))
    }
}

fn put_user(builder: SettingsBuilder, username: &str, password: &str) -> SettingsBuilder {
    let (key, value) = user_credential(username, password, rand::thread_rng().gen_bool(0.5));
    builder.put(key, value)
}

/// Delete and recreate the named folder under `parent`, returning its path.
fn recreate_folder(parent: &Path, name: &str) -> Result<PathBuf> {
    let folder = parent.join(name);
    if folder.exists() {
        fs::remove_dir_all(&folder).with_context(|| {
            format!("unable to delete existing folder {}", folder.display())
        })?;
    }
    fs::create_dir_all(&folder)
        .with_context(|| format!("unable to create folder {}", folder.display()))?;
    Ok(folder)
}

/// Write a file into `folder` and return its absolute path as a settings value.
fn write_file(folder: &Path, name: &str, content: &[u8]) -> Result<String> {
    let path = folder.join(name);
    fs::write(&path, content)
        .with_context(|| format!("unable to write {}", path.display()))?;
    debug!(path = %path.display(), "wrote fixture file");
    absolute_path(&path)
}
