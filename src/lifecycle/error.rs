//! Error types for the lifecycle controllers.

use thiserror::Error;

use crate::api::ApiError;
use crate::backend::RequestError;

/// Errors raised while creating, reading, or deleting tracked resources.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum LifecycleError {
    /// Raised when tracked state lacks a required field.
    #[error("invalid resource state: {0}")]
    Validation(String),
    /// Raised when the SSH key named by the state cannot be resolved.
    #[error("failed to resolve ssh key {key_id}: {source}")]
    SshKey {
        /// Key identifier from the tracked state.
        key_id: String,
        /// Underlying client failure.
        #[source]
        source: ApiError,
    },
    /// Raised when a key cannot be registered or deleted.
    #[error("ssh key request failed: {0}")]
    SshKeyRequest(#[source] ApiError),
    /// Raised when the rent request is rejected.
    #[error("failed to rent instance: {0}")]
    Rent(#[source] ApiError),
    /// Raised when a rent call does not report exactly one instance.
    #[error("expected exactly one instance to be rented, got {count}")]
    InstanceCount {
        /// Number of instance ids reported.
        count: usize,
    },
    /// Raised when polling a freshly rented instance fails.
    #[error("failed to poll instance {instance_id}: {source}")]
    Poll {
        /// Instance being polled.
        instance_id: String,
        /// Underlying client failure.
        #[source]
        source: ApiError,
    },
    /// Raised when a poll loop exceeds its deadline.
    #[error("timeout waiting for {action} on instance {instance_id}")]
    Timeout {
        /// Action being waited on.
        action: String,
        /// Instance identifier.
        instance_id: String,
    },
    /// Raised when the caller cancels a poll loop.
    #[error("{action} cancelled for instance {instance_id}")]
    Cancelled {
        /// Action that was interrupted.
        action: String,
        /// Instance identifier.
        instance_id: String,
    },
    /// Raised when reading an instance fails for a reason other than absence.
    #[error("failed to read instance {instance_id}: {source}")]
    Read {
        /// Instance identifier.
        instance_id: String,
        /// Underlying client failure.
        #[source]
        source: ApiError,
    },
    /// Raised when waiting for teardown observes an unexpected failure.
    #[error("failed to delete instance {instance_id}: {source}")]
    Delete {
        /// Instance identifier.
        instance_id: String,
        /// Underlying client failure.
        #[source]
        source: ApiError,
    },
    /// Raised when the terminate request itself fails.
    #[error("failed to terminate instance {instance_id}: {source}")]
    Terminate {
        /// Instance identifier.
        instance_id: String,
        /// Underlying client failure.
        #[source]
        source: ApiError,
    },
}

impl From<RequestError> for LifecycleError {
    fn from(value: RequestError) -> Self {
        Self::Validation(value.to_string())
    }
}
