//! Rent and poll-to-ready.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{InstanceController, LifecycleError, VirtualMachineState, deadline};
use crate::api::Instance;
use crate::backend::{Backend, RentRequest};
use crate::cancel::Cancellation;

const ACTION: &str = "instance readiness";

impl<B: Backend> InstanceController<B> {
    /// Rents an instance for `state` and waits until it is ready.
    ///
    /// `state.id` is set as soon as the rent succeeds. Whatever the outcome of
    /// polling, the last observed snapshot is merged into `state` before this
    /// returns.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Validation`] for incomplete state,
    /// [`LifecycleError::SshKey`] when the key cannot be resolved,
    /// [`LifecycleError::Rent`] or [`LifecycleError::InstanceCount`] when
    /// renting fails, and [`LifecycleError::Poll`],
    /// [`LifecycleError::Timeout`], or [`LifecycleError::Cancelled`] when
    /// the instance never becomes ready.
    pub async fn create(
        &self,
        state: &mut VirtualMachineState,
        mut cancel: Cancellation,
    ) -> Result<(), LifecycleError> {
        if let Some(existing) = &state.id {
            return Err(LifecycleError::Validation(format!(
                "instance {existing} already exists"
            )));
        }
        require("recipe", &state.recipe)?;
        require("datacenter", &state.datacenter)?;
        require("instance_type", &state.instance_type)?;
        require("ssh_key_id", &state.ssh_key_id)?;

        let key = self
            .backend
            .find_ssh_key_by_id(&state.ssh_key_id)
            .await
            .map_err(|source| LifecycleError::SshKey {
                key_id: state.ssh_key_id.clone(),
                source,
            })?;

        let request = RentRequest::builder()
            .recipe(&state.recipe)
            .datacenter(&state.datacenter)
            .instance_type(&state.instance_type)
            .public_key(key.public_key)
            .startup_commands_base64(state.startup_commands.clone())
            .build()?;

        let ids = self
            .backend
            .rent_instance(&request)
            .await
            .map_err(LifecycleError::Rent)?;
        let instance_id = match ids.as_slice() {
            [only] => only.clone(),
            _ => return Err(LifecycleError::InstanceCount { count: ids.len() }),
        };
        state.id = Some(instance_id.clone());
        info!(instance_id = %instance_id, "instance rented, waiting for readiness");

        self.wait_until_ready(state, &instance_id, &mut cancel).await
    }

    async fn wait_until_ready(
        &self,
        state: &mut VirtualMachineState,
        instance_id: &str,
        cancel: &mut Cancellation,
    ) -> Result<(), LifecycleError> {
        let limit = deadline(Some(self.policy.create_timeout));
        tokio::pin!(limit);
        let mut last: Option<Instance> = None;

        loop {
            tokio::select! {
                biased;
                () = &mut limit => {
                    merge_last(state, last.as_ref());
                    warn!(instance_id, "instance did not become ready before the deadline");
                    return Err(LifecycleError::Timeout {
                        action: ACTION.to_owned(),
                        instance_id: instance_id.to_owned(),
                    });
                }
                () = cancel.cancelled() => {
                    merge_last(state, last.as_ref());
                    warn!(instance_id, "instance readiness wait cancelled");
                    return Err(LifecycleError::Cancelled {
                        action: ACTION.to_owned(),
                        instance_id: instance_id.to_owned(),
                    });
                }
                () = sleep(self.policy.poll_interval) => {}
            }

            let instance = match self.backend.get_instance(instance_id).await {
                Ok(instance) => instance,
                Err(source) => {
                    merge_last(state, last.as_ref());
                    return Err(LifecycleError::Poll {
                        instance_id: instance_id.to_owned(),
                        source,
                    });
                }
            };
            debug!(instance_id, status = instance.status.as_str(), "polled instance");

            if instance.is_ready() {
                state.merge(&instance);
                info!(instance_id, "instance ready");
                return Ok(());
            }
            last = Some(instance);
        }
    }
}

fn require(field: &str, value: &str) -> Result<(), LifecycleError> {
    if value.trim().is_empty() {
        return Err(LifecycleError::Validation(format!(
            "missing or empty field: {field}"
        )));
    }
    Ok(())
}

fn merge_last(state: &mut VirtualMachineState, last: Option<&Instance>) {
    if let Some(snapshot) = last {
        state.merge(snapshot);
    }
}
