//! Shared fixtures for instance lifecycle BDD scenarios.

use std::time::Duration;

use cloudrift::api::InstanceStatus;
use cloudrift::test_support::ScriptedBackend;
use cloudrift::{LifecycleError, LifecyclePolicy, VirtualMachineState};
use rstest::fixture;

pub const KEY_ID: &str = "key-1";
pub const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3Nza bdd@example";

#[derive(Clone, Debug)]
pub struct LifecycleContext {
    pub backend: ScriptedBackend,
    pub state: VirtualMachineState,
    pub policy: LifecyclePolicy,
    pub outcome: Option<Result<(), LifecycleError>>,
}

#[fixture]
pub fn lifecycle_context() -> LifecycleContext {
    LifecycleContext {
        backend: ScriptedBackend::new(),
        state: VirtualMachineState::planned("Ubuntu", "us-east-nc-nr-1", "rtx49-7c-kn.1", KEY_ID),
        policy: LifecyclePolicy::default().with_poll_interval(Duration::from_secs(5)),
        outcome: None,
    }
}

pub fn parse_status(status: &str) -> Option<InstanceStatus> {
    match status {
        "Initializing" => Some(InstanceStatus::Initializing),
        "Active" => Some(InstanceStatus::Active),
        "Deactivating" => Some(InstanceStatus::Deactivating),
        "Inactive" => Some(InstanceStatus::Inactive),
        _ => None,
    }
}
