//! Terminate and poll-to-absent.

use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::{InstanceController, LifecycleError, VirtualMachineState, deadline};
use crate::api::ApiError;
use crate::backend::Backend;
use crate::cancel::Cancellation;

const ACTION: &str = "instance teardown";

impl<B: Backend> InstanceController<B> {
    /// Terminates the instance tracked by `state` and waits until the control
    /// plane no longer reports it.
    ///
    /// A state without an id, or an instance that is already gone, counts as
    /// deleted.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Terminate`] when the terminate request
    /// fails, [`LifecycleError::Delete`] when a poll fails,
    /// [`LifecycleError::Cancelled`] when `cancel` fires, and
    /// [`LifecycleError::Timeout`] when a delete deadline is configured and
    /// exceeded.
    pub async fn delete(
        &self,
        state: &VirtualMachineState,
        mut cancel: Cancellation,
    ) -> Result<(), LifecycleError> {
        let Some(instance_id) = state.id.as_deref() else {
            debug!("no instance id tracked, nothing to delete");
            return Ok(());
        };

        match self.backend.terminate_instance(instance_id).await {
            Ok(()) => {}
            Err(ApiError::NotFound) => {
                debug!(instance_id, "instance already gone");
                return Ok(());
            }
            Err(source) => {
                return Err(LifecycleError::Terminate {
                    instance_id: instance_id.to_owned(),
                    source,
                });
            }
        }

        let limit = deadline(self.policy.delete_timeout);
        tokio::pin!(limit);

        loop {
            tokio::select! {
                biased;
                () = &mut limit => {
                    warn!(instance_id, "instance still present after the delete deadline");
                    return Err(LifecycleError::Timeout {
                        action: ACTION.to_owned(),
                        instance_id: instance_id.to_owned(),
                    });
                }
                () = cancel.cancelled() => {
                    warn!(instance_id, "instance teardown wait cancelled");
                    return Err(LifecycleError::Cancelled {
                        action: ACTION.to_owned(),
                        instance_id: instance_id.to_owned(),
                    });
                }
                () = sleep(self.policy.poll_interval) => {}
            }

            match self.backend.get_instance(instance_id).await {
                Ok(instance) => {
                    debug!(instance_id, status = instance.status.as_str(), "instance still present");
                }
                Err(ApiError::NotFound) => {
                    info!(instance_id, "instance deleted");
                    return Ok(());
                }
                Err(source) => {
                    return Err(LifecycleError::Delete {
                        instance_id: instance_id.to_owned(),
                        source,
                    });
                }
            }
        }
    }
}
