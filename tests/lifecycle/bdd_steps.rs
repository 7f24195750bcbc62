//! BDD step definitions for instance create and delete flows.

use std::time::Duration;

use cloudrift::api::{ApiError, InstanceStatus};
use cloudrift::test_support::instance;
use cloudrift::{Cancellation, InstanceController, LifecycleError, VirtualMachineState};
use rstest_bdd_macros::{given, then, when};
use tokio::runtime::{Builder, Runtime};

use super::test_helpers::{KEY_ID, LifecycleContext, PUBLIC_KEY, parse_status};

#[derive(Debug, thiserror::Error)]
pub enum StepError {
    #[error("assertion failed: {0}")]
    Assertion(String),
    #[error("runtime error: {0}")]
    Runtime(String),
}

fn paused_runtime() -> Result<Runtime, StepError> {
    Builder::new_current_thread()
        .enable_all()
        .start_paused(true)
        .build()
        .map_err(|err| StepError::Runtime(err.to_string()))
}

fn status_arg(status: &str) -> Result<InstanceStatus, StepError> {
    parse_status(status)
        .ok_or_else(|| StepError::Assertion(format!("unknown instance status: {status}")))
}

#[given("a registered ssh key")]
fn registered_key(lifecycle_context: LifecycleContext) -> LifecycleContext {
    LifecycleContext {
        backend: lifecycle_context.backend.with_key(KEY_ID, PUBLIC_KEY),
        ..lifecycle_context
    }
}

#[given("the control plane rents instance \"{id}\"")]
fn rents_instance(lifecycle_context: LifecycleContext, id: String) -> LifecycleContext {
    LifecycleContext {
        backend: lifecycle_context.backend.with_rented_ids(&[id.as_str()]),
        ..lifecycle_context
    }
}

#[given("the control plane rents instances \"{first}\" and \"{second}\"")]
fn rents_two_instances(
    lifecycle_context: LifecycleContext,
    first: String,
    second: String,
) -> LifecycleContext {
    LifecycleContext {
        backend: lifecycle_context
            .backend
            .with_rented_ids(&[first.as_str(), second.as_str()]),
        ..lifecycle_context
    }
}

#[given("a create deadline of \"{secs}\" seconds")]
fn create_deadline(lifecycle_context: LifecycleContext, secs: u64) -> LifecycleContext {
    LifecycleContext {
        policy: lifecycle_context
            .policy
            .with_create_timeout(Duration::from_secs(secs)),
        ..lifecycle_context
    }
}

#[given("the instance reports \"{status}\" on the next poll")]
fn reports_status(
    lifecycle_context: LifecycleContext,
    status: String,
) -> Result<LifecycleContext, StepError> {
    let observed = status_arg(&status)?;
    Ok(LifecycleContext {
        backend: lifecycle_context
            .backend
            .then_poll(Ok(instance("1", observed, false))),
        ..lifecycle_context
    })
}

#[given("the instance becomes ready on the next poll")]
fn becomes_ready(lifecycle_context: LifecycleContext) -> LifecycleContext {
    LifecycleContext {
        backend: lifecycle_context
            .backend
            .then_poll(Ok(instance("1", InstanceStatus::Active, true))),
        ..lifecycle_context
    }
}

#[given("the instance stays \"{status}\"")]
fn stays_in_status(
    lifecycle_context: LifecycleContext,
    status: String,
) -> Result<LifecycleContext, StepError> {
    let observed = status_arg(&status)?;
    Ok(LifecycleContext {
        backend: lifecycle_context
            .backend
            .when_idle(Ok(instance("1", observed, false))),
        ..lifecycle_context
    })
}

#[given("a tracked instance \"{id}\"")]
fn tracked_instance(lifecycle_context: LifecycleContext, id: String) -> LifecycleContext {
    LifecycleContext {
        state: VirtualMachineState::imported(id),
        ..lifecycle_context
    }
}

#[given("the instance disappears on the next poll")]
fn disappears(lifecycle_context: LifecycleContext) -> LifecycleContext {
    LifecycleContext {
        backend: lifecycle_context
            .backend
            .then_poll(Err(ApiError::NotFound)),
        ..lifecycle_context
    }
}

#[when("I create the instance")]
fn create_instance(lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let runtime = paused_runtime()?;
    let controller =
        InstanceController::with_policy(lifecycle_context.backend.clone(), lifecycle_context.policy);
    let mut state = lifecycle_context.state.clone();
    let outcome =
        runtime.block_on(async { controller.create(&mut state, Cancellation::never()).await });
    Ok(LifecycleContext {
        state,
        outcome: Some(outcome),
        ..lifecycle_context
    })
}

#[when("I delete the instance")]
fn delete_instance(lifecycle_context: LifecycleContext) -> Result<LifecycleContext, StepError> {
    let runtime = paused_runtime()?;
    let controller =
        InstanceController::with_policy(lifecycle_context.backend.clone(), lifecycle_context.policy);
    let outcome = runtime.block_on(async {
        controller
            .delete(&lifecycle_context.state, Cancellation::never())
            .await
    });
    Ok(LifecycleContext {
        outcome: Some(outcome),
        ..lifecycle_context
    })
}

fn succeeded(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match &lifecycle_context.outcome {
        Some(Ok(())) => Ok(()),
        Some(Err(err)) => Err(StepError::Assertion(format!("expected success, got {err}"))),
        None => Err(StepError::Assertion(String::from("missing outcome"))),
    }
}

#[then("creation succeeds after \"{polls}\" polls")]
fn creation_succeeds(lifecycle_context: &LifecycleContext, polls: usize) -> Result<(), StepError> {
    succeeded(lifecycle_context)?;
    let observed = lifecycle_context.backend.get_calls();
    if observed == polls {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected {polls} polls, observed {observed}"
        )))
    }
}

#[then("deletion succeeds")]
fn deletion_succeeds(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    succeeded(lifecycle_context)
}

#[then("the tracked status is \"{status}\"")]
fn tracked_status(lifecycle_context: &LifecycleContext, status: String) -> Result<(), StepError> {
    match lifecycle_context.state.status.as_deref() {
        Some(observed) if observed == status => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected status {status}, got {other:?}"
        ))),
    }
}

#[then("the public address is recorded")]
fn public_address_recorded(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    if lifecycle_context.state.public_ip.is_some() {
        Ok(())
    } else {
        Err(StepError::Assertion(String::from(
            "public address should be merged into state",
        )))
    }
}

#[then("creation fails because the rent did not yield exactly one instance")]
fn instance_count_failure(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match &lifecycle_context.outcome {
        Some(Err(LifecycleError::InstanceCount { count: 2 })) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected instance count failure, got {other:?}"
        ))),
    }
}

#[then("the operation times out")]
fn operation_times_out(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    match &lifecycle_context.outcome {
        Some(Err(LifecycleError::Timeout { .. })) => Ok(()),
        other => Err(StepError::Assertion(format!(
            "expected timeout, got {other:?}"
        ))),
    }
}

#[then("no instance was polled")]
fn nothing_polled(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let observed = lifecycle_context.backend.get_calls();
    if observed == 0 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected no polls, observed {observed}"
        )))
    }
}

#[then("the instance was terminated once")]
fn terminated_once(lifecycle_context: &LifecycleContext) -> Result<(), StepError> {
    let observed = lifecycle_context.backend.terminate_calls();
    if observed == 1 {
        Ok(())
    } else {
        Err(StepError::Assertion(format!(
            "expected one terminate call, observed {observed}"
        )))
    }
}
