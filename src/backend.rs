//! Backend abstraction between the lifecycle controllers and the control
//! plane.

use std::future::Future;
use std::pin::Pin;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

use crate::api::{ApiError, Instance, SshKey};

/// Parameters required to rent a new instance.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RentRequest {
    /// Recipe name; resolved case-insensitively.
    pub recipe: String,
    /// Datacenter to place the instance in.
    pub datacenter: String,
    /// Instance type identifier.
    pub instance_type: String,
    /// Public keys installed on the VM.
    pub public_keys: Vec<String>,
    /// Decoded, trimmed startup commands run after first boot.
    pub startup_commands: Option<String>,
}

impl RentRequest {
    /// Starts a builder for a [`RentRequest`].
    #[must_use]
    pub fn builder() -> RentRequestBuilder {
        RentRequestBuilder::new()
    }

    /// Validates the request, returning a descriptive error when a required
    /// field is missing.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when any required field is empty
    /// or any public key is blank.
    pub fn validate(&self) -> Result<(), RequestError> {
        if self.recipe.is_empty() {
            return Err(RequestError::Validation("recipe".to_owned()));
        }
        if self.public_keys.is_empty() || self.public_keys.iter().any(String::is_empty) {
            return Err(RequestError::Validation("public_keys".to_owned()));
        }
        if self.datacenter.is_empty() {
            return Err(RequestError::Validation("datacenter".to_owned()));
        }
        if self.instance_type.is_empty() {
            return Err(RequestError::Validation("instance_type".to_owned()));
        }
        Ok(())
    }
}

/// Builder for [`RentRequest`] that defers trimming, decoding and validation
/// to construction.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct RentRequestBuilder {
    recipe: String,
    datacenter: String,
    instance_type: String,
    public_keys: Vec<String>,
    startup_commands_base64: Option<String>,
}

impl RentRequestBuilder {
    /// Creates an empty builder; fields must be populated before build.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the recipe name.
    #[must_use]
    pub fn recipe(mut self, value: impl Into<String>) -> Self {
        self.recipe = value.into();
        self
    }

    /// Sets the datacenter.
    #[must_use]
    pub fn datacenter(mut self, value: impl Into<String>) -> Self {
        self.datacenter = value.into();
        self
    }

    /// Sets the instance type.
    #[must_use]
    pub fn instance_type(mut self, value: impl Into<String>) -> Self {
        self.instance_type = value.into();
        self
    }

    /// Adds a public key.
    #[must_use]
    pub fn public_key(mut self, value: impl Into<String>) -> Self {
        self.public_keys.push(value.into());
        self
    }

    /// Sets base64-encoded startup commands.
    #[must_use]
    pub fn startup_commands_base64(mut self, value: Option<String>) -> Self {
        self.startup_commands_base64 = value;
        self
    }

    /// Builds and validates the [`RentRequest`], trimming string inputs and
    /// decoding the startup commands.
    ///
    /// # Errors
    ///
    /// Returns [`RequestError::Validation`] when a required field is empty and
    /// [`RequestError::StartupCommands`] when the commands are not valid
    /// base64.
    pub fn build(self) -> Result<RentRequest, RequestError> {
        let startup_commands = match self.startup_commands_base64.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(encoded) => Some(decode_startup_commands(encoded)?),
        };
        let request = RentRequest {
            recipe: self.recipe.trim().to_owned(),
            datacenter: self.datacenter.trim().to_owned(),
            instance_type: self.instance_type.trim().to_owned(),
            public_keys: self
                .public_keys
                .iter()
                .map(|key| key.trim().to_owned())
                .collect(),
            startup_commands,
        };
        request.validate()?;
        Ok(request)
    }
}

fn decode_startup_commands(encoded: &str) -> Result<String, RequestError> {
    let bytes = STANDARD
        .decode(encoded)
        .map_err(|err| RequestError::StartupCommands(err.to_string()))?;
    let text =
        String::from_utf8(bytes).map_err(|err| RequestError::StartupCommands(err.to_string()))?;
    Ok(text.trim().to_owned())
}

/// Errors raised while building requests.
#[derive(Clone, Debug, Error, Eq, PartialEq)]
pub enum RequestError {
    /// Raised when a request is missing a required field.
    #[error("missing or empty field: {0}")]
    Validation(String),
    /// Raised when startup commands cannot be decoded.
    #[error("failed to decode base64 encoded startup commands: {0}")]
    StartupCommands(String),
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, ApiError>> + Send + 'a>>;

/// Operations the lifecycle controllers need from the control plane.
///
/// [`ApiError::NotFound`] must be returned for absent resources so callers
/// can treat it as removal or idempotent success.
pub trait Backend: Send + Sync {
    /// Registers a public key and returns the stored record.
    fn add_ssh_key<'a>(&'a self, name: &'a str, public_key: &'a str) -> BackendFuture<'a, SshKey>;

    /// Lists every registered key.
    fn list_ssh_keys(&self) -> BackendFuture<'_, Vec<SshKey>>;

    /// Deletes a key; absent keys count as deleted.
    fn delete_ssh_key<'a>(&'a self, id: &'a str) -> BackendFuture<'a, ()>;

    /// Finds a key by identifier.
    fn find_ssh_key_by_id<'a>(&'a self, id: &'a str) -> BackendFuture<'a, SshKey>;

    /// Submits a rent request and returns the instance ids reported.
    fn rent_instance<'a>(&'a self, request: &'a RentRequest) -> BackendFuture<'a, Vec<String>>;

    /// Fetches an instance; inactive or absent instances yield
    /// [`ApiError::NotFound`].
    fn get_instance<'a>(&'a self, id: &'a str) -> BackendFuture<'a, Instance>;

    /// Marks an instance for teardown.
    fn terminate_instance<'a>(&'a self, id: &'a str) -> BackendFuture<'a, ()>;
}
