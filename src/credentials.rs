//! ---
//! quorum_section: "testing-security"
//! quorum_subsection: "module"
//! quorum_type: "source"
//! quorum_scope: "code"
//! quorum_description: "Credential and role file synthesis for the file realm."
//! quorum_version: "v0.1.0"
//! quorum_owner: "tbd"
//! ---
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use indexmap::IndexMap;
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Username staged for every node-client connection.
pub const DEFAULT_USER_NAME: &str = "test_user";
/// Password shared by all staged fixture identities.
pub const DEFAULT_PASSWORD: &str = "changeme";
/// Role granted to the default user.
pub const DEFAULT_ROLE: &str = "user";

/// Username staged for external client connections.
pub const DEFAULT_CLIENT_USER_NAME: &str = "test_client_user";
/// Role granted to the client user (monitor-only cluster actions).
pub const DEFAULT_CLIENT_ROLE: &str = "client_user";

/// Password hashing schemes understood by the file realm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashScheme {
    /// Plaintext passwords, fixture use only.
    Plain,
}

impl HashScheme {
    /// Scheme tag as it appears in the users file.
    pub fn tag(&self) -> &'static str {
        match self {
            Self::Plain => "{plain}",
        }
    }
}

/// Errors raised when staged credential content is malformed.
#[derive(Debug, Error)]
pub enum CredentialError {
    /// Empty username or role name.
    #[error("credential name cannot be empty")]
    EmptyName,
    /// Name would break the line-oriented file syntax.
    #[error("credential name contains a reserved character: {0}")]
    ReservedCharacter(String),
}

fn validate_name(name: &str) -> Result<(), CredentialError> {
    if name.trim().is_empty() {
        return Err(CredentialError::EmptyName);
    }
    if name.contains(':') || name.contains(',') || name.contains(char::is_whitespace) {
        return Err(CredentialError::ReservedCharacter(name.to_string()));
    }
    Ok(())
}

/// One line of the users file: `username:{scheme}password`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserEntry {
    /// Account username.
    pub username: String,
    /// Account password, stored under `scheme`.
    pub password: String,
    /// Hashing scheme tag written before the password.
    pub scheme: HashScheme,
}

impl UserEntry {
    /// Construct a validated plaintext entry.
    pub fn plain(
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Result<Self, CredentialError> {
        let username = username.into();
        validate_name(&username)?;
        Ok(Self {
            username,
            password: password.into(),
            scheme: HashScheme::Plain,
        })
    }

    fn render_line(&self) -> String {
        format!("{}:{}{}", self.username, self.scheme.tag(), self.password)
    }
}

/// One line of the users_roles file: `role:user1,user2`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMembership {
    /// Role name.
    pub role: String,
    /// Usernames holding the role.
    pub users: Vec<String>,
}

impl RoleMembership {
    /// Construct a validated membership line.
    pub fn new(
        role: impl Into<String>,
        users: impl IntoIterator<Item = impl Into<String>>,
    ) -> Result<Self, CredentialError> {
        let role = role.into();
        validate_name(&role)?;
        let users: Vec<String> = users.into_iter().map(Into::into).collect();
        for user in &users {
            validate_name(user)?;
        }
        Ok(Self { role, users })
    }

    fn render_line(&self) -> String {
        format!("{}:{}", self.role, self.users.join(","))
    }
}

/// Cluster-level privileges of a role: either everything or an explicit
/// action list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClusterPrivileges {
    /// Every cluster action.
    All,
    /// Specific cluster actions, e.g. `cluster:monitor/state`.
    Actions(Vec<String>),
}

impl Serialize for ClusterPrivileges {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::All => serializer.serialize_str("ALL"),
            Self::Actions(actions) => actions.serialize(serializer),
        }
    }
}

impl<'de> Deserialize<'de> for ClusterPrivileges {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Scalar(String),
            List(Vec<String>),
        }
        match Raw::deserialize(deserializer)? {
            Raw::Scalar(value) if value == "ALL" => Ok(Self::All),
            Raw::Scalar(value) => Err(D::Error::custom(format!(
                "expected ALL or an action list, got `{value}`"
            ))),
            Raw::List(actions) => Ok(Self::Actions(actions)),
        }
    }
}

/// Permissions attached to one role in the roles document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RolePermissions {
    /// Cluster-level privileges.
    pub cluster: ClusterPrivileges,
    /// Index name pattern to privilege, e.g. `'*' -> ALL`.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub indices: IndexMap<String, String>,
}

/// Users staged by default: the node-client user and the external client user.
pub fn default_users() -> Vec<UserEntry> {
    vec![
        UserEntry {
            username: DEFAULT_USER_NAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            scheme: HashScheme::Plain,
        },
        UserEntry {
            username: DEFAULT_CLIENT_USER_NAME.to_string(),
            password: DEFAULT_PASSWORD.to_string(),
            scheme: HashScheme::Plain,
        },
    ]
}

/// Default role memberships: both users hold the default role, the client
/// user additionally holds the client role.
pub fn default_users_roles() -> Vec<RoleMembership> {
    vec![
        RoleMembership {
            role: DEFAULT_ROLE.to_string(),
            users: vec![
                DEFAULT_USER_NAME.to_string(),
                DEFAULT_CLIENT_USER_NAME.to_string(),
            ],
        },
        RoleMembership {
            role: DEFAULT_CLIENT_ROLE.to_string(),
            users: vec![DEFAULT_CLIENT_USER_NAME.to_string()],
        },
    ]
}

/// Default role permissions: the default role allows everything, the client
/// role only the two cluster-monitor actions a connecting client needs.
pub fn default_roles() -> IndexMap<String, RolePermissions> {
    let mut roles = IndexMap::new();
    roles.insert(
        DEFAULT_ROLE.to_string(),
        RolePermissions {
            cluster: ClusterPrivileges::All,
            indices: IndexMap::from([("*".to_string(), "ALL".to_string())]),
        },
    );
    roles.insert(
        DEFAULT_CLIENT_ROLE.to_string(),
        RolePermissions {
            cluster: ClusterPrivileges::Actions(vec![
                "cluster:monitor/nodes/info".to_string(),
                "cluster:monitor/state".to_string(),
            ]),
            indices: IndexMap::new(),
        },
    );
    roles
}

/// Render the users file body, one `username:{scheme}password` line per entry.
pub fn render_users(entries: &[UserEntry]) -> String {
    let mut body = String::new();
    for entry in entries {
        body.push_str(&entry.render_line());
        body.push('\n');
    }
    body
}

/// Render the users_roles file body, one `role:user1,user2` line per role.
pub fn render_users_roles(memberships: &[RoleMembership]) -> String {
    let mut body = String::new();
    for membership in memberships {
        body.push_str(&membership.render_line());
        body.push('\n');
    }
    body
}

/// Render the YAML roles document mapping role names to permissions.
pub fn render_roles(roles: &IndexMap<String, RolePermissions>) -> anyhow::Result<String> {
    Ok(serde_yaml::to_string(roles)?)
}

/// HTTP basic-auth header value for the given identity.
pub fn basic_auth_header_value(username: &str, password: &str) -> String {
    format!("Basic {}", BASE64.encode(format!("{username}:{password}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_users_render_to_plain_lines() {
        let body = render_users(&default_users());
        assert_eq!(
            body,
            "test_user:{plain}changeme\ntest_client_user:{plain}changeme\n"
        );
    }

    #[test]
    fn default_memberships_render_to_role_lines() {
        let body = render_users_roles(&default_users_roles());
        assert_eq!(
            body,
            "user:test_user,test_client_user\nclient_user:test_client_user\n"
        );
    }

    #[test]
    fn roles_document_round_trips_through_yaml() {
        let rendered = render_roles(&default_roles()).unwrap();
        assert!(rendered.contains("cluster: ALL"));
        assert!(rendered.contains("cluster:monitor/nodes/info"));
        let parsed: IndexMap<String, RolePermissions> = serde_yaml::from_str(&rendered).unwrap();
        assert_eq!(parsed, default_roles());
    }

    #[test]
    fn reserved_characters_are_rejected() {
        assert!(UserEntry::plain("with:colon", "pw").is_err());
        assert!(UserEntry::plain("", "pw").is_err());
        assert!(RoleMembership::new("role", ["a,b"]).is_err());
        assert!(UserEntry::plain("alice", "pw").is_ok());
    }

    #[test]
    fn basic_auth_header_encodes_identity() {
        let header = basic_auth_header_value(DEFAULT_USER_NAME, DEFAULT_PASSWORD);
        assert_eq!(header, "Basic dGVzdF91c2VyOmNoYW5nZW1l");
    }
}
