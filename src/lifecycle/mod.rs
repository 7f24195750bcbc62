//! Convergent create, read, and delete flows for rented resources.
//!
//! A rent or terminate call only starts a transition on the control plane.
//! [`InstanceController`] turns each into a bounded, cancellable poll loop and
//! keeps the caller's [`VirtualMachineState`] current at every step, including
//! on failure, so a rented instance is never lost track of.

mod create;
mod delete;
mod error;
mod ssh_key;
mod state;

use std::time::Duration;

use tracing::debug;

use crate::api::ApiError;
use crate::backend::Backend;

pub use error::LifecycleError;
pub use ssh_key::{SshKeyController, SshKeyState};
pub use state::{VirtualMachineInfo, VirtualMachineState};

/// Default interval between poll attempts.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);
/// Default ceiling on instance provisioning.
pub const DEFAULT_CREATE_TIMEOUT: Duration = Duration::from_secs(28 * 60);

/// Timing policy for the poll loops.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct LifecyclePolicy {
    /// Interval slept before each poll attempt.
    pub poll_interval: Duration,
    /// Deadline for an instance to become ready after renting.
    pub create_timeout: Duration,
    /// Deadline for an instance to disappear after terminating; `None` waits
    /// until cancelled.
    pub delete_timeout: Option<Duration>,
}

impl Default for LifecyclePolicy {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            create_timeout: DEFAULT_CREATE_TIMEOUT,
            delete_timeout: None,
        }
    }
}

impl LifecyclePolicy {
    /// Sets the poll interval.
    #[must_use]
    pub const fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Sets the create deadline.
    #[must_use]
    pub const fn with_create_timeout(mut self, limit: Duration) -> Self {
        self.create_timeout = limit;
        self
    }

    /// Sets the delete deadline.
    #[must_use]
    pub const fn with_delete_timeout(mut self, limit: Option<Duration>) -> Self {
        self.delete_timeout = limit;
        self
    }
}

/// Result of reading a tracked resource.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ReadOutcome {
    /// The resource exists and the state was refreshed.
    Present,
    /// The resource is gone; the caller should stop tracking it.
    Removed,
}

/// Drives instance lifecycles against a [`Backend`].
#[derive(Clone, Debug)]
pub struct InstanceController<B> {
    backend: B,
    policy: LifecyclePolicy,
}

impl<B: Backend> InstanceController<B> {
    /// Creates a controller with the default policy.
    #[must_use]
    pub fn new(backend: B) -> Self {
        Self::with_policy(backend, LifecyclePolicy::default())
    }

    /// Creates a controller with an explicit policy.
    #[must_use]
    pub const fn with_policy(backend: B, policy: LifecyclePolicy) -> Self {
        Self { backend, policy }
    }

    /// Returns the active policy.
    #[must_use]
    pub const fn policy(&self) -> LifecyclePolicy {
        self.policy
    }

    /// Returns the backend.
    #[must_use]
    pub const fn backend(&self) -> &B {
        &self.backend
    }

    /// Refreshes `state` from the control plane.
    ///
    /// Caller-owned fields are carried over; server-owned fields are replaced.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`] when the state has no id and
    /// [`LifecycleError::Read`] for any failure other than absence.
    pub async fn read(&self, state: &mut VirtualMachineState) -> Result<ReadOutcome, LifecycleError> {
        let Some(id) = state.id.clone() else {
            return Err(LifecycleError::Validation(String::from(
                "instance id is required to read",
            )));
        };
        match self.backend.get_instance(&id).await {
            Ok(instance) => {
                state.merge(&instance);
                Ok(ReadOutcome::Present)
            }
            Err(ApiError::NotFound) => {
                debug!(instance_id = %id, "instance no longer exists");
                Ok(ReadOutcome::Removed)
            }
            Err(source) => Err(LifecycleError::Read {
                instance_id: id,
                source,
            }),
        }
    }
}

async fn deadline(limit: Option<Duration>) {
    match limit {
        Some(after) => tokio::time::sleep(after).await,
        None => std::future::pending().await,
    }
}

#[cfg(test)]
mod tests;
