//! ---
//! quorum_section: "testing-security"
//! quorum_subsection: "module"
//! quorum_type: "source"
//! quorum_scope: "code"
//! quorum_description: "Shared symmetric system key staged for every cluster node."
//! quorum_version: "v0.1.0"
//! quorum_owner: "tbd"
//! ---
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use rand::RngCore;
use sha2::{Digest, Sha256};
use tracing::debug;

/// Symmetric signing key (32 bytes) shared by every node of one fixture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SystemKey([u8; 32]);

impl SystemKey {
    /// Generate random key material.
    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        Self(bytes)
    }

    /// Raw key bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// Render as base64 string.
    pub fn to_base64(&self) -> String {
        BASE64.encode(self.0)
    }

    /// SHA-256 fingerprint of the key for log lines.
    pub fn fingerprint(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(self.0);
        hex::encode(hasher.finalize())
    }

    /// Write the key verbatim as a binary file.
    pub fn write_to(&self, path: &Path) -> Result<()> {
        fs::write(path, self.0)
            .with_context(|| format!("unable to write system key to {}", path.display()))?;
        debug!(path = %path.display(), "wrote system key");
        Ok(())
    }
}
