//! ---
//! quorum_section: "testing-security"
//! quorum_subsection: "module"
//! quorum_type: "source"
//! quorum_scope: "code"
//! quorum_description: "On-disk security configuration fixture for secured test clusters."
//! quorum_version: "v0.1.0"
//! quorum_owner: "tbd"
//! ---
//! Test-support crate that stages the security configuration a secured Quorum
//! test cluster needs on disk (credential files, role files, a shared system
//! key, and TLS store material) and exposes the artifacts as flat settings
//! maps consumed by node and client bootstrap code.
//!
//! Every cluster should use its own [`SecuritySettingsSource`] instance, as
//! each writes its own configuration files under the caller-supplied parent
//! directory.
#![warn(missing_docs)]

pub mod credentials;
pub mod settings;
pub mod source;
pub mod syskey;
pub mod tls;

pub use credentials::{
    ClusterPrivileges, CredentialError, HashScheme, RoleMembership, RolePermissions, UserEntry,
};
pub use settings::{Settings, SettingsBuilder};
pub use source::{FixtureContent, Scope, SecuritySettingsSource, StandardContent};
pub use syskey::SystemKey;
pub use tls::{FixtureCa, PemStore};
