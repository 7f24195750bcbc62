//! SSH key resource tracking.

use tracing::{debug, info};

use super::{LifecycleError, ReadOutcome};
use crate::backend::Backend;

/// Tracked state of a registered SSH key.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct SshKeyState {
    /// Server-assigned identifier, set once created.
    pub id: Option<String>,
    /// Key name.
    pub name: String,
    /// Public key material.
    pub public_key: String,
}

impl SshKeyState {
    /// State for a key that is yet to be registered.
    #[must_use]
    pub fn planned(name: impl Into<String>, public_key: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            public_key: public_key.into(),
        }
    }
}

/// Creates, reads, and deletes SSH keys against a [`Backend`].
#[derive(Clone, Debug)]
pub struct SshKeyController<B> {
    backend: B,
}

impl<B: Backend> SshKeyController<B> {
    /// Creates a controller.
    #[must_use]
    pub const fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Registers the key and records the server's view of it.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::SshKeyRequest`] when registration fails.
    pub async fn create(&self, state: &mut SshKeyState) -> Result<(), LifecycleError> {
        let key = self
            .backend
            .add_ssh_key(&state.name, &state.public_key)
            .await
            .map_err(LifecycleError::SshKeyRequest)?;
        info!(key_id = %key.id, "ssh key tracked");
        state.id = Some(key.id);
        state.name = key.name;
        state.public_key = key.public_key;
        Ok(())
    }

    /// Refreshes `state` from the key listing.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`] when the state has no id and
    /// [`LifecycleError::SshKeyRequest`] when listing fails.
    pub async fn read(&self, state: &mut SshKeyState) -> Result<ReadOutcome, LifecycleError> {
        let Some(id) = state.id.as_deref() else {
            return Err(LifecycleError::Validation(String::from(
                "ssh key id is required to read",
            )));
        };
        let keys = self
            .backend
            .list_ssh_keys()
            .await
            .map_err(LifecycleError::SshKeyRequest)?;
        let Some(found) = keys.into_iter().find(|key| key.id == id) else {
            debug!(key_id = %id, "ssh key no longer exists");
            return Ok(ReadOutcome::Removed);
        };
        state.name = found.name;
        state.public_key = found.public_key;
        Ok(ReadOutcome::Present)
    }

    /// Deletes the key; a missing id or an already-deleted key succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::SshKeyRequest`] for any other failure.
    pub async fn delete(&self, state: &SshKeyState) -> Result<(), LifecycleError> {
        let Some(id) = state.id.as_deref() else {
            return Ok(());
        };
        self.backend
            .delete_ssh_key(id)
            .await
            .map_err(LifecycleError::SshKeyRequest)
    }
}
