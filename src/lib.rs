//! Resource lifecycle controller and API client for the `CloudRift`
//! control plane.
//!
//! The crate authenticates against the control plane, resolves VM recipes
//! through a self-healing cache, manages SSH keys, and turns one-shot rent
//! and terminate calls into convergent, cancellable poll loops
//! (rent → wait for readiness, terminate → wait for absence).

pub mod api;
pub mod backend;
pub mod cancel;
pub mod config;
pub mod lifecycle;
pub mod test_support;

pub use api::{ApiError, CloudRiftClient, Instance, InstanceStatus, SshKey};
pub use backend::{Backend, RentRequest, RentRequestBuilder, RequestError};
pub use cancel::{CancelHandle, Cancellation, cancellation};
pub use config::{ClientConfig, ConfigError};
pub use lifecycle::{
    InstanceController, LifecycleError, LifecyclePolicy, ReadOutcome, SshKeyController,
    SshKeyState, VirtualMachineState,
};
