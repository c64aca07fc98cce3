//! Stand-in for the external model-builder worker.

use crate::bus::ModelCommand;
use crate::lifecycle::{MetricLifecycleController, ModelBuildOutcome};
use anyhow::Result;
use uuid::Uuid;

/// Builds every pending model the way a real worker would, polling the
/// registry. Returns the uids that became active.
pub async fn build_pending_models(controller: &MetricLifecycleController) -> Result<Vec<Uuid>> {
    let mut activated = Vec::new();
    for metric in controller.pending_model_requests().await? {
        if controller
            .complete_model_build(&metric.uid, ModelBuildOutcome::Succeeded)
            .await?
        {
            activated.push(metric.uid);
        }
    }
    Ok(activated)
}

/// Drains the commands already published on the controller's bus.
pub fn drain_commands(receiver: &mut async_broadcast::Receiver<ModelCommand>) -> Vec<ModelCommand> {
    let mut commands = Vec::new();
    loop {
        match receiver.try_recv() {
            Ok(command) => commands.push(command),
            Err(async_broadcast::TryRecvError::Overflowed(_)) => continue,
            Err(_) => break,
        }
    }
    commands
}
