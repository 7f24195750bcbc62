//! Client for the `CloudRift` control-plane REST API.
//!
//! [`CloudRiftClient::connect`] authenticates eagerly and primes the recipe
//! cache; a client value therefore always holds a verified session and at
//! least one VM recipe.

mod error;
mod instances;
mod recipes;
pub mod retry;
mod ssh_keys;
pub mod transport;
mod types;

use std::sync::Arc;

use reqwest::{Method, StatusCode};
use tracing::info;

use crate::backend::{Backend, BackendFuture, RentRequest};
use crate::config::ClientConfig;
use retry::RetryPolicy;
use transport::{Transport, expect_json};
use types::{Envelope, IdentityData};

pub use error::{ApiError, ResourceKind};
pub use recipes::RecipeCache;
pub use types::{
    Instance, InstanceStatus, InstanceType, InstanceVariant, InstancesSelector, LoginInfo, Recipe,
    RecipeDetails, RecipeGroup, ResourceInfo, SshKey, UsernameAndPassword, VirtualMachine,
    VmRecipe,
};

const AUTH_ME_PATH: &str = "api/v1/auth/me";

/// Authenticated client shared by every lifecycle flow.
///
/// Cloning is cheap; clones share the HTTP pool and the recipe cache.
#[derive(Clone, Debug)]
pub struct CloudRiftClient {
    transport: Transport,
    proto_version: String,
    identity: String,
    recipes: Arc<RecipeCache>,
}

impl CloudRiftClient {
    /// Connects using the retry count from `config`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Config`] for invalid configuration or a base URL
    /// that does not serve the identity endpoint,
    /// [`ApiError::Authentication`] when the token is rejected,
    /// [`ApiError::EmptyRecipeCache`] when no VM recipe exists, or any
    /// transport failure.
    pub async fn connect(config: ClientConfig) -> Result<Self, ApiError> {
        let policy = RetryPolicy::with_retries(config.retries);
        Self::connect_with(config, policy).await
    }

    /// Connects with an explicit retry policy.
    ///
    /// # Errors
    ///
    /// See [`CloudRiftClient::connect`].
    pub async fn connect_with(config: ClientConfig, policy: RetryPolicy) -> Result<Self, ApiError> {
        let transport = Transport::new(&config)?.with_retry_policy(policy);
        let mut client = Self {
            transport,
            proto_version: config.effective_proto_version().to_owned(),
            identity: String::new(),
            recipes: Arc::new(RecipeCache::default()),
        };

        client.identity = client.authenticate().await?;
        client.refresh_recipes().await?;
        if client.recipes.is_empty().await {
            return Err(ApiError::EmptyRecipeCache);
        }

        info!(
            identity = %client.identity,
            base_url = %client.transport.base_url(),
            proto_version = %client.proto_version,
            "connected to CloudRift"
        );
        Ok(client)
    }

    async fn authenticate(&self) -> Result<String, ApiError> {
        let response: Envelope<IdentityData> = self
            .transport
            .execute::<(), _, _>(
                Method::POST,
                AUTH_ME_PATH,
                None,
                expect_json("verifying token", StatusCode::OK),
            )
            .await
            .map_err(|err| match err {
                ApiError::Api { status, body, .. } if status == 401 || status == 403 => {
                    ApiError::Authentication(format!("token rejected ({status}): {body}"))
                }
                ApiError::NotFound => ApiError::Config(format!(
                    "identity endpoint {}{AUTH_ME_PATH} not found, check the base URL",
                    self.transport.base_url()
                )),
                other => other,
            })?;

        if response.data.email.is_empty() {
            return Err(ApiError::Authentication(String::from("invalid api token")));
        }
        Ok(response.data.email)
    }

    /// Email of the identity the token resolved to.
    #[must_use]
    pub fn identity(&self) -> &str {
        &self.identity
    }

    /// Protocol version carried in every request body.
    #[must_use]
    pub fn proto_version(&self) -> &str {
        &self.proto_version
    }
}

impl Backend for CloudRiftClient {
    fn add_ssh_key<'a>(&'a self, name: &'a str, public_key: &'a str) -> BackendFuture<'a, SshKey> {
        Box::pin(async move { CloudRiftClient::add_ssh_key(self, name, public_key).await })
    }

    fn list_ssh_keys(&self) -> BackendFuture<'_, Vec<SshKey>> {
        Box::pin(async move { CloudRiftClient::list_ssh_keys(self).await })
    }

    fn delete_ssh_key<'a>(&'a self, id: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move { CloudRiftClient::delete_ssh_key(self, id).await })
    }

    fn find_ssh_key_by_id<'a>(&'a self, id: &'a str) -> BackendFuture<'a, SshKey> {
        Box::pin(async move { CloudRiftClient::find_ssh_key_by_id(self, id).await })
    }

    fn rent_instance<'a>(&'a self, request: &'a RentRequest) -> BackendFuture<'a, Vec<String>> {
        Box::pin(async move { CloudRiftClient::rent_instance(self, request).await })
    }

    fn get_instance<'a>(&'a self, id: &'a str) -> BackendFuture<'a, Instance> {
        Box::pin(async move { CloudRiftClient::get_instance(self, id).await })
    }

    fn terminate_instance<'a>(&'a self, id: &'a str) -> BackendFuture<'a, ()> {
        Box::pin(async move { CloudRiftClient::terminate_instance(self, id).await })
    }
}

#[cfg(test)]
mod tests;
