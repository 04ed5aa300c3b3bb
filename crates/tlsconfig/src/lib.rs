//! # TlsConfig — validated TLS settings for store-to-store transport
//!
//! Rookery nodes replicate messages over TLS. The transport layer owns the
//! actual engine construction (platform TLS glue); this crate owns the part
//! that is easy to get subtly wrong — validating the configuration bundle —
//! and hands the transport an immutable, known-good [`TlsSettings`] value.
//!
//! Construction is two-step: a [`TlsSettingsBuilder`] accumulates options,
//! and [`build`](TlsSettingsBuilder::build) validates the full configuration
//! once. There is no observable half-constructed state, and the store
//! configurations are explicit value types carrying all of their own fields.
//!
//! ## Example
//!
//! ```rust
//! use tlsconfig::{ClientAuth, TlsSettingsBuilder};
//!
//! let settings = TlsSettingsBuilder::new("TLSv1.3")
//!     .client_auth(ClientAuth::Required)
//!     .keystore("PKCS12", "/etc/rookery/node.p12", "store-secret")
//!     .truststore("PKCS12", "/etc/rookery/roots.p12", "trust-secret")
//!     .build()
//!     .unwrap();
//!
//! assert!(settings.need_client_auth());
//! ```

use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// The side of the connection an engine is built for.
///
/// A server applies the configured [`ClientAuth`] policy; a client applies
/// the endpoint identification algorithm. The per-connection peer host and
/// port are supplied by the transport alongside the role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Client,
    Server,
}

/// Server-side client certificate policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ClientAuth {
    /// No client certificate is requested.
    #[default]
    None,
    /// A client certificate is requested but not required.
    Requested,
    /// The handshake fails without a valid client certificate.
    Required,
}

impl FromStr for ClientAuth {
    type Err = TlsConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "none" => Ok(ClientAuth::None),
            "requested" => Ok(ClientAuth::Requested),
            "required" => Ok(ClientAuth::Required),
            other => Err(TlsConfigError::InvalidClientAuth(other.to_string())),
        }
    }
}

/// Key store configuration: the node's own certificate and private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyStoreConfig {
    store_type: String,
    path: PathBuf,
    password: String,
    key_password: Option<String>,
}

impl KeyStoreConfig {
    /// Store container format, e.g. `"PKCS12"`.
    #[must_use]
    pub fn store_type(&self) -> &str {
        &self.store_type
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }

    /// Password protecting the private key. Falls back to the store
    /// password when not set separately.
    #[must_use]
    pub fn key_password(&self) -> &str {
        self.key_password.as_deref().unwrap_or(&self.password)
    }
}

/// Trust store configuration: the roots this node accepts from peers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrustStoreConfig {
    store_type: String,
    path: PathBuf,
    password: String,
}

impl TrustStoreConfig {
    #[must_use]
    pub fn store_type(&self) -> &str {
        &self.store_type
    }

    #[must_use]
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    #[must_use]
    pub fn password(&self) -> &str {
        &self.password
    }
}

/// Configuration validation failures.
///
/// Each variant names the store and the missing field, so a misconfigured
/// keystore and a misconfigured truststore are distinguishable from the
/// message alone.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TlsConfigError {
    #[error("SSL key store path is specified, but key store password is not")]
    KeyStorePasswordMissing,

    #[error("SSL key store password is specified, but key store path is not")]
    KeyStorePathMissing,

    #[error("SSL trust store path is specified, but trust store password is not")]
    TrustStorePasswordMissing,

    #[error("SSL trust store password is specified, but trust store path is not")]
    TrustStorePathMissing,

    #[error("SSL key password is specified, but no key store is configured")]
    KeyPasswordWithoutKeyStore,

    #[error("unrecognized client authentication mode {0:?} (expected none, requested, or required)")]
    InvalidClientAuth(String),
}

/// Immutable, validated TLS settings.
///
/// Produced only by [`TlsSettingsBuilder::build`]; every value of this type
/// has passed the store pairing checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TlsSettings {
    protocol: String,
    provider: Option<String>,
    cipher_suites: Vec<String>,
    enabled_protocols: Vec<String>,
    endpoint_identification_algorithm: Option<String>,
    client_auth: ClientAuth,
    key_manager_algorithm: Option<String>,
    trust_manager_algorithm: Option<String>,
    keystore: Option<KeyStoreConfig>,
    truststore: Option<TrustStoreConfig>,
}

impl TlsSettings {
    /// Context protocol, e.g. `"TLSv1.3"`.
    #[must_use]
    pub fn protocol(&self) -> &str {
        &self.protocol
    }

    #[must_use]
    pub fn provider(&self) -> Option<&str> {
        self.provider.as_deref()
    }

    /// Cipher suites to enable; empty means the engine default.
    #[must_use]
    pub fn cipher_suites(&self) -> &[String] {
        &self.cipher_suites
    }

    /// Protocol versions to enable; empty means the engine default.
    #[must_use]
    pub fn enabled_protocols(&self) -> &[String] {
        &self.enabled_protocols
    }

    /// Applied by [`Role::Client`] engines to verify the peer identity.
    #[must_use]
    pub fn endpoint_identification_algorithm(&self) -> Option<&str> {
        self.endpoint_identification_algorithm.as_deref()
    }

    #[must_use]
    pub fn client_auth(&self) -> ClientAuth {
        self.client_auth
    }

    #[must_use]
    pub fn key_manager_algorithm(&self) -> Option<&str> {
        self.key_manager_algorithm.as_deref()
    }

    #[must_use]
    pub fn trust_manager_algorithm(&self) -> Option<&str> {
        self.trust_manager_algorithm.as_deref()
    }

    #[must_use]
    pub fn keystore(&self) -> Option<&KeyStoreConfig> {
        self.keystore.as_ref()
    }

    #[must_use]
    pub fn truststore(&self) -> Option<&TrustStoreConfig> {
        self.truststore.as_ref()
    }

    /// Whether a [`Role::Server`] engine must require a client certificate.
    #[must_use]
    pub fn need_client_auth(&self) -> bool {
        self.client_auth == ClientAuth::Required
    }

    /// Whether a [`Role::Server`] engine should request, but not require, a
    /// client certificate.
    #[must_use]
    pub fn want_client_auth(&self) -> bool {
        self.client_auth == ClientAuth::Requested
    }
}

/// Accumulates TLS options and validates them into a [`TlsSettings`].
#[derive(Debug, Clone)]
pub struct TlsSettingsBuilder {
    protocol: String,
    provider: Option<String>,
    cipher_suites: Vec<String>,
    enabled_protocols: Vec<String>,
    endpoint_identification_algorithm: Option<String>,
    client_auth: ClientAuth,
    key_manager_algorithm: Option<String>,
    trust_manager_algorithm: Option<String>,
    keystore_type: Option<String>,
    keystore_path: Option<PathBuf>,
    keystore_password: Option<String>,
    key_password: Option<String>,
    truststore_type: Option<String>,
    truststore_path: Option<PathBuf>,
    truststore_password: Option<String>,
}

/// Store container format assumed when none is configured.
const DEFAULT_STORE_TYPE: &str = "PKCS12";

impl TlsSettingsBuilder {
    /// Starts a builder for the given context protocol.
    pub fn new(protocol: impl Into<String>) -> Self {
        Self {
            protocol: protocol.into(),
            provider: None,
            cipher_suites: Vec::new(),
            enabled_protocols: Vec::new(),
            endpoint_identification_algorithm: None,
            client_auth: ClientAuth::default(),
            key_manager_algorithm: None,
            trust_manager_algorithm: None,
            keystore_type: None,
            keystore_path: None,
            keystore_password: None,
            key_password: None,
            truststore_type: None,
            truststore_path: None,
            truststore_password: None,
        }
    }

    pub fn provider(mut self, provider: impl Into<String>) -> Self {
        self.provider = Some(provider.into());
        self
    }

    pub fn cipher_suites(mut self, suites: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.cipher_suites = suites.into_iter().map(Into::into).collect();
        self
    }

    pub fn enabled_protocols(
        mut self,
        protocols: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        self.enabled_protocols = protocols.into_iter().map(Into::into).collect();
        self
    }

    pub fn endpoint_identification_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.endpoint_identification_algorithm = Some(algorithm.into());
        self
    }

    pub fn client_auth(mut self, client_auth: ClientAuth) -> Self {
        self.client_auth = client_auth;
        self
    }

    pub fn key_manager_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.key_manager_algorithm = Some(algorithm.into());
        self
    }

    pub fn trust_manager_algorithm(mut self, algorithm: impl Into<String>) -> Self {
        self.trust_manager_algorithm = Some(algorithm.into());
        self
    }

    /// Configures the keystore in one call.
    pub fn keystore(
        self,
        store_type: impl Into<String>,
        path: impl Into<PathBuf>,
        password: impl Into<String>,
    ) -> Self {
        self.keystore_type(store_type)
            .keystore_path(path)
            .keystore_password(password)
    }

    pub fn keystore_type(mut self, store_type: impl Into<String>) -> Self {
        self.keystore_type = Some(store_type.into());
        self
    }

    pub fn keystore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.keystore_path = Some(path.into());
        self
    }

    pub fn keystore_password(mut self, password: impl Into<String>) -> Self {
        self.keystore_password = Some(password.into());
        self
    }

    /// Separate password for the private key inside the keystore.
    pub fn key_password(mut self, password: impl Into<String>) -> Self {
        self.key_password = Some(password.into());
        self
    }

    /// Configures the truststore in one call.
    pub fn truststore(
        self,
        store_type: impl Into<String>,
        path: impl Into<PathBuf>,
        password: impl Into<String>,
    ) -> Self {
        self.truststore_type(store_type)
            .truststore_path(path)
            .truststore_password(password)
    }

    pub fn truststore_type(mut self, store_type: impl Into<String>) -> Self {
        self.truststore_type = Some(store_type.into());
        self
    }

    pub fn truststore_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.truststore_path = Some(path.into());
        self
    }

    pub fn truststore_password(mut self, password: impl Into<String>) -> Self {
        self.truststore_password = Some(password.into());
        self
    }

    /// Validates the accumulated configuration and emits the immutable
    /// settings value.
    ///
    /// # Errors
    ///
    /// - keystore path and password must be both set or both unset;
    /// - truststore path and password must be both set or both unset;
    /// - a key password without a configured keystore is rejected.
    pub fn build(self) -> Result<TlsSettings, TlsConfigError> {
        let keystore = match (self.keystore_path, self.keystore_password) {
            (Some(path), Some(password)) => Some(KeyStoreConfig {
                store_type: self
                    .keystore_type
                    .unwrap_or_else(|| DEFAULT_STORE_TYPE.to_string()),
                path,
                password,
                key_password: self.key_password.clone(),
            }),
            (Some(_), None) => return Err(TlsConfigError::KeyStorePasswordMissing),
            (None, Some(_)) => return Err(TlsConfigError::KeyStorePathMissing),
            (None, None) => None,
        };

        if keystore.is_none() && self.key_password.is_some() {
            return Err(TlsConfigError::KeyPasswordWithoutKeyStore);
        }

        let truststore = match (self.truststore_path, self.truststore_password) {
            (Some(path), Some(password)) => Some(TrustStoreConfig {
                store_type: self
                    .truststore_type
                    .unwrap_or_else(|| DEFAULT_STORE_TYPE.to_string()),
                path,
                password,
            }),
            (Some(_), None) => return Err(TlsConfigError::TrustStorePasswordMissing),
            (None, Some(_)) => return Err(TlsConfigError::TrustStorePathMissing),
            (None, None) => None,
        };

        Ok(TlsSettings {
            protocol: self.protocol,
            provider: self.provider,
            cipher_suites: self.cipher_suites,
            enabled_protocols: self.enabled_protocols,
            endpoint_identification_algorithm: self.endpoint_identification_algorithm,
            client_auth: self.client_auth,
            key_manager_algorithm: self.key_manager_algorithm,
            trust_manager_algorithm: self.trust_manager_algorithm,
            keystore,
            truststore,
        })
    }
}
