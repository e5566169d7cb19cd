//! ---
//! quorum_section: "testing-security"
//! quorum_subsection: "module"
//! quorum_type: "source"
//! quorum_scope: "code"
//! quorum_description: "Fixture TLS store material and keystore/truststore settings."
//! quorum_version: "v0.1.0"
//! quorum_owner: "tbd"
//! ---
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use path_absolutize::Absolutize;
use rand::Rng;
use rcgen::{Certificate, CertificateParams, DistinguishedName};
use tracing::info;

use crate::settings::Settings;

/// Password protecting the node store.
pub const NODE_STORE_PASSWORD: &str = "testnode";
/// Password protecting the client store.
pub const CLIENT_STORE_PASSWORD: &str = "testclient";

/// On-disk PEM bundle (certificate followed by private key) plus the password
/// bootstrap code expects alongside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PemStore {
    /// Path of the PEM bundle file.
    pub path: PathBuf,
    /// Store password surfaced in the settings.
    pub password: String,
}

/// Throwaway certificate authority issuing the fixture's TLS material.
pub struct FixtureCa {
    ca: Certificate,
}

impl FixtureCa {
    /// Create a new fixture CA.
    pub fn new() -> Result<Self> {
        let mut params = CertificateParams::default();
        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, "Quorum Test Fixture CA");
        params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
        let ca = Certificate::from_params(params).context("unable to create fixture CA")?;
        Ok(Self { ca })
    }

    /// Issue a store for the given common name and write its PEM bundle into
    /// `dir` as `<common_name>.pem`.
    pub fn issue_store(&self, common_name: &str, password: &str, dir: &Path) -> Result<PemStore> {
        let mut params = CertificateParams::default();
        params.distinguished_name = DistinguishedName::new();
        params
            .distinguished_name
            .push(rcgen::DnType::CommonName, common_name);
        params.alg = &rcgen::PKCS_ECDSA_P256_SHA256;
        let cert = Certificate::from_params(params)
            .with_context(|| format!("unable to create certificate for {common_name}"))?;
        let mut bundle = cert
            .serialize_pem_with_signer(&self.ca)
            .with_context(|| format!("unable to sign certificate for {common_name}"))?;
        bundle.push_str(&cert.serialize_private_key_pem());

        let path = dir.join(format!("{common_name}.pem"));
        fs::write(&path, bundle)
            .with_context(|| format!("unable to write store bundle {}", path.display()))?;
        info!(store = %path.display(), "issued fixture TLS store");
        Ok(PemStore {
            path,
            password: password.to_string(),
        })
    }
}

/// SSL settings for a store, with the truststore toggle decided at random
/// (pure test-matrix variation; the trusted material is the store itself
/// either way).
pub fn ssl_settings_for_store(store: &PemStore) -> Result<Settings> {
    ssl_settings(store, rand::thread_rng().gen_bool(0.5))
}

/// SSL settings for a store with an explicit truststore choice.
///
/// Transport TLS is always on and HTTP TLS always off for fixture clusters.
pub fn ssl_settings(store: &PemStore, include_truststore: bool) -> Result<Settings> {
    if !store.path.exists() {
        bail!("store path {} doesn't exist", store.path.display());
    }
    let path = absolute_path(&store.path)?;

    let mut builder = Settings::builder()
        .put("security.ssl.keystore.path", &path)
        .put("security.ssl.keystore.password", &store.password)
        .put("security.transport.ssl", true)
        .put("security.http.ssl", false);
    if include_truststore {
        builder = builder
            .put("security.ssl.truststore.path", &path)
            .put("security.ssl.truststore.password", &store.password);
    }
    Ok(builder.build())
}

/// Absolute-path string for a settings value.
pub(crate) fn absolute_path(path: &Path) -> Result<String> {
    let absolute = path
        .absolutize()
        .with_context(|| format!("unable to absolutize {}", path.display()))?;
    Ok(absolute.to_string_lossy().into_owned())
}
