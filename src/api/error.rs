//! Error types for the `CloudRift` API client.

use std::fmt;

use thiserror::Error;

use crate::backend::RequestError;
use crate::config::ConfigError;

/// Kind of resource named in a failed lookup.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ResourceKind {
    /// A provisioning recipe.
    Recipe,
    /// A registered SSH public key.
    SshKey,
    /// A rented compute instance.
    Instance,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Recipe => "recipe",
            Self::SshKey => "ssh key",
            Self::Instance => "instance",
        };
        f.write_str(label)
    }
}

/// Errors raised by the API client.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum ApiError {
    /// Raised when the client configuration is incomplete.
    #[error("configuration error: {0}")]
    Config(String),
    /// Raised when a required input is missing, before any request is sent.
    #[error("invalid request: {0}")]
    Validation(String),
    /// Raised when the token is rejected or resolves to no identity.
    #[error("authentication failed: {0}")]
    Authentication(String),
    /// Raised when the control plane answers 404, or when a by-id lookup
    /// finds only an inactive resource.
    #[error("resource not found")]
    NotFound,
    /// Raised when a lookup by name or id finds nothing.
    #[error("{kind} {name} not found")]
    Missing {
        /// Kind of resource searched for.
        kind: ResourceKind,
        /// Name or identifier used in the lookup.
        name: String,
    },
    /// Raised when the recipe cache holds no VM recipes after priming.
    #[error("no recipes for virtual machines found")]
    EmptyRecipeCache,
    /// Raised when the request keeps failing at the transport level.
    #[error("request failed: {message}, the failed request was retried: {retries}x")]
    Transport {
        /// Number of retries attempted after the first failure.
        retries: u32,
        /// Message of the last transport failure.
        message: String,
    },
    /// Raised for non-success statuses other than 404.
    #[error("request {url} failed: {status}: body: {body}")]
    Api {
        /// Request URL.
        url: String,
        /// HTTP status code.
        status: u16,
        /// Response body as text.
        body: String,
    },
    /// Raised when a success response lacks the expected payload.
    #[error("{operation} failed: {message}")]
    Schema {
        /// Operation that produced the response.
        operation: String,
        /// Description of the mismatch.
        message: String,
    },
}

impl ApiError {
    /// Returns true only for the not-found sentinel.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound)
    }

    pub(crate) fn schema(operation: &str, message: impl Into<String>) -> Self {
        Self::Schema {
            operation: operation.to_owned(),
            message: message.into(),
        }
    }
}

impl From<ConfigError> for ApiError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value.to_string())
    }
}

impl From<RequestError> for ApiError {
    fn from(value: RequestError) -> Self {
        Self::Validation(value.to_string())
    }
}
