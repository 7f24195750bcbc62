//! Configuration loading via `ortho-config`.

use std::time::Duration;

use ortho_config::OrthoConfig;
use serde::Deserialize;
use thiserror::Error;

/// Default endpoint of the `CloudRift` control plane.
pub const DEFAULT_BASE_URL: &str = "https://api.cloudrift.ai";

/// Protocol version that tracks unreleased API changes.
pub const PROTO_UPCOMING: &str = "~upcoming";
/// Protocol version released on 2025-06-10.
pub const PROTO_2025_06_10: &str = "2025-06-10";
/// Protocol version released on 2025-05-29.
pub const PROTO_2025_05_29: &str = "2025-05-29";
/// Protocol version released on 2025-03-21.
pub const PROTO_2025_03_21: &str = "2025-03-21";
/// Protocol version released on 2025-02-10.
pub const PROTO_2025_02_10: &str = "2025-02-10";
/// Protocol version released on 2024-09-22.
pub const PROTO_2024_09_22: &str = "2024-09-22";

/// Latest protocol version known to this client.
pub const DEFAULT_PROTO_VERSION: &str = PROTO_2025_06_10;

/// Client configuration derived from environment variables, configuration
/// files, and explicit values.
#[derive(Clone, Debug, Deserialize, OrthoConfig, PartialEq, Eq)]
#[ortho_config(prefix = "CLOUDRIFT")]
pub struct ClientConfig {
    /// API token sent with every request. This value is required.
    pub token: String,
    /// Base URL of the control plane.
    #[ortho_config(default = DEFAULT_BASE_URL.to_owned())]
    pub base_url: String,
    /// Protocol version carried in every request body.
    #[ortho_config(default = DEFAULT_PROTO_VERSION.to_owned())]
    pub proto_version: String,
    /// Number of retries after a transport-level failure.
    #[ortho_config(default = 4)]
    pub retries: u32,
    /// Per-request timeout in seconds.
    #[ortho_config(default = 10)]
    pub request_timeout_secs: u64,
}

/// Metadata for a configuration field, used to generate actionable error messages.
struct FieldMetadata {
    description: &'static str,
    env_var: &'static str,
    toml_key: &'static str,
}

impl FieldMetadata {
    const fn new(description: &'static str, env_var: &'static str, toml_key: &'static str) -> Self {
        Self {
            description,
            env_var,
            toml_key,
        }
    }
}

impl ClientConfig {
    /// Builds a configuration from an explicit token, using defaults for the
    /// remaining fields.
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
            base_url: DEFAULT_BASE_URL.to_owned(),
            proto_version: DEFAULT_PROTO_VERSION.to_owned(),
            retries: 4,
            request_timeout_secs: 10,
        }
    }

    /// Overrides the base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Overrides the protocol version.
    #[must_use]
    pub fn with_proto_version(mut self, proto_version: impl Into<String>) -> Self {
        self.proto_version = proto_version.into();
        self
    }

    /// Overrides the retry count for transport failures.
    #[must_use]
    pub const fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries;
        self
    }

    fn require_field(value: &str, metadata: &FieldMetadata) -> Result<(), ConfigError> {
        if value.trim().is_empty() {
            return Err(ConfigError::MissingField(format!(
                "missing {}: set {} or add {} to [cloudrift] in cloudrift.toml",
                metadata.description, metadata.env_var, metadata.toml_key
            )));
        }
        Ok(())
    }

    /// Loads configuration using the `ortho-config` derive. Values merge
    /// defaults, configuration files, environment variables, and CLI flags in
    /// that order of precedence.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the loader fails to merge sources.
    pub fn load_from_sources() -> Result<Self, ConfigError> {
        Self::load().map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Loads configuration without attempting to parse CLI arguments. Values
    /// still merge defaults, configuration files, and environment variables.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] when the merge fails.
    pub fn load_without_cli_args() -> Result<Self, ConfigError> {
        Self::load_from_iter([std::ffi::OsString::from("cloudrift")])
            .map_err(|err| ConfigError::Parse(err.to_string()))
    }

    /// Returns the base URL with a guaranteed trailing slash, falling back to
    /// [`DEFAULT_BASE_URL`] when blank.
    #[must_use]
    pub fn normalised_base_url(&self) -> String {
        let trimmed = self.base_url.trim();
        let base = if trimmed.is_empty() {
            DEFAULT_BASE_URL
        } else {
            trimmed
        };
        if base.ends_with('/') {
            base.to_owned()
        } else {
            format!("{base}/")
        }
    }

    /// Returns the protocol version, falling back to
    /// [`DEFAULT_PROTO_VERSION`] when blank.
    #[must_use]
    pub fn effective_proto_version(&self) -> &str {
        let trimmed = self.proto_version.trim();
        if trimmed.is_empty() {
            DEFAULT_PROTO_VERSION
        } else {
            trimmed
        }
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Performs semantic validation on required fields. Error messages include
    /// guidance on how to provide missing values via environment variables or
    /// configuration files.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::MissingField`] when the token is empty and
    /// [`ConfigError::Invalid`] when the request timeout is zero.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Self::require_field(
            &self.token,
            &FieldMetadata::new("CloudRift API token", "CLOUDRIFT_TOKEN", "token"),
        )?;
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid(String::from(
                "request_timeout_secs must be greater than zero (CLOUDRIFT_REQUEST_TIMEOUT_SECS)",
            )));
        }
        Ok(())
    }
}

/// Errors raised during configuration loading and validation.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ConfigError {
    /// Indicates a required configuration field is empty or missing.
    #[error("missing configuration field: {0}")]
    MissingField(String),
    /// Indicates a field holds a value outside its accepted range.
    #[error("invalid configuration: {0}")]
    Invalid(String),
    /// Surfaces errors from the `ortho-config` loader.
    #[error("configuration parsing failed: {0}")]
    Parse(String),
}

impl From<ortho_config::OrthoError> for ConfigError {
    fn from(value: ortho_config::OrthoError) -> Self {
        Self::Parse(value.to_string())
    }
}
