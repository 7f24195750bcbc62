//! SSH key management.

use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use super::CloudRiftClient;
use super::error::{ApiError, ResourceKind};
use super::transport::{discard_body, expect_json};
use super::types::{AddSshKeyData, AddSshKeyResponse, Envelope, SshKey, SshKeyList, Versioned};

const ADD_SSH_KEY_PATH: &str = "api/v1/ssh-keys/add";
const LIST_SSH_KEYS_PATH: &str = "api/v1/ssh-keys/list";

impl CloudRiftClient {
    /// Registers a public key under `name`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Validation`] before any request when either
    /// argument is empty, otherwise any transport or API failure.
    pub async fn add_ssh_key(&self, name: &str, public_key: &str) -> Result<SshKey, ApiError> {
        if name.is_empty() {
            return Err(ApiError::Validation(String::from(
                "ssh key name is defined but empty",
            )));
        }
        if public_key.is_empty() {
            return Err(ApiError::Validation(String::from(
                "ssh public key is defined but empty",
            )));
        }

        let body = Versioned {
            version: self.proto_version(),
            data: AddSshKeyData { name, public_key },
        };
        let response: Envelope<AddSshKeyResponse> = self
            .transport
            .execute(
                Method::POST,
                ADD_SSH_KEY_PATH,
                Some(&body),
                expect_json("adding ssh key", StatusCode::CREATED),
            )
            .await?;
        let key = response.data.public_key;
        info!(key_id = %key.id, name = %key.name, "registered ssh key");
        Ok(key)
    }

    /// Lists every registered key.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] when the request fails.
    pub async fn list_ssh_keys(&self) -> Result<Vec<SshKey>, ApiError> {
        let body = Versioned {
            version: self.proto_version(),
            data: serde_json::Map::new(),
        };
        let response: Envelope<SshKeyList> = self
            .transport
            .execute(
                Method::POST,
                LIST_SSH_KEYS_PATH,
                Some(&body),
                expect_json("listing ssh keys", StatusCode::OK),
            )
            .await?;
        Ok(response.data.keys)
    }

    /// Deletes a key by id. A key that no longer exists counts as deleted.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] for any failure other than not-found.
    pub async fn delete_ssh_key(&self, id: &str) -> Result<(), ApiError> {
        let path = format!("api/v1/ssh-keys/{id}");
        match self
            .transport
            .execute::<(), _, _>(Method::DELETE, &path, None, discard_body)
            .await
        {
            Ok(()) => {
                info!(key_id = %id, "deleted ssh key");
                Ok(())
            }
            Err(ApiError::NotFound) => {
                debug!(key_id = %id, "ssh key already absent");
                Ok(())
            }
            Err(other) => Err(other),
        }
    }

    /// Finds a key by name.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Missing`] when no key has this name.
    pub async fn find_ssh_key_by_name(&self, name: &str) -> Result<SshKey, ApiError> {
        self.list_ssh_keys()
            .await?
            .into_iter()
            .find(|key| key.name == name)
            .ok_or_else(|| ApiError::Missing {
                kind: ResourceKind::SshKey,
                name: name.to_owned(),
            })
    }

    /// Finds a key by id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Missing`] when no key has this id.
    pub async fn find_ssh_key_by_id(&self, id: &str) -> Result<SshKey, ApiError> {
        self.list_ssh_keys()
            .await?
            .into_iter()
            .find(|key| key.id == id)
            .ok_or_else(|| ApiError::Missing {
                kind: ResourceKind::SshKey,
                name: id.to_owned(),
            })
    }
}
