//! Unit tests for the lifecycle controllers.


use std::time::Duration;

use rstest::fixture;

use super::{InstanceController, LifecyclePolicy, VirtualMachineState};
use crate::test_support::ScriptedBackend;

const KEY_ID: &str = "key-1";
const PUBLIC_KEY: &str = "ssh-ed25519 AAAAC3Nza test@example";

#[fixture]
fn planned() -> VirtualMachineState {
    VirtualMachineState::planned("Ubuntu", "us-east-nc-nr-1", "rtx49-7c-kn.1", KEY_ID)
}

#[fixture]
fn keyed_backend() -> ScriptedBackend {
    ScriptedBackend::new().with_key(KEY_ID, PUBLIC_KEY)
}

fn controller(backend: &ScriptedBackend) -> InstanceController<ScriptedBackend> {
    InstanceController::with_policy(
        backend.clone(),
        LifecyclePolicy::default()
            .with_poll_interval(Duration::from_secs(5))
            .with_create_timeout(Duration::from_secs(62)),
    )
}
