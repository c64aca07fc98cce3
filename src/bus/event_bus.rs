use super::message::ModelCommand;
use async_broadcast::TrySendError;
use std::sync::Arc;
use tracing::{debug, warn};

const EVENT_BUS_CAPACITY: usize = 128;

#[derive(Debug)]
pub struct EventBus {
    pub name: String,
    pub main_bus_sender: async_broadcast::Sender<ModelCommand>,
    pub main_bus_receiver: async_broadcast::InactiveReceiver<ModelCommand>,
}

impl EventBus {
    // Create a new event bus.
    // Please note that the receiver is inactive by default as it may be cloned many times.
    // Consider using .activate() or .activate_cloned() to activate it.
    pub fn init(name: String) -> Self {
        let (mut s, r) = async_broadcast::broadcast(EVENT_BUS_CAPACITY);
        // A slow worker loses the oldest commands instead of stalling the controller.
        s.set_overflow(true);
        let r = r.deactivate();
        Self {
            name,
            main_bus_sender: s,
            main_bus_receiver: r,
        }
    }

    /// Publishes without waiting. Returns whether an active receiver got the command.
    pub fn publish(&self, command: ModelCommand) -> bool {
        match self.main_bus_sender.try_broadcast(command) {
            Ok(_) => true,
            Err(TrySendError::Inactive(command)) => {
                debug!(?command, "No active model worker, command dropped");
                false
            }
            Err(TrySendError::Full(command)) | Err(TrySendError::Closed(command)) => {
                warn!(bus = %self.name, ?command, "Failed to publish model command");
                false
            }
        }
    }

    pub fn subscribe(&self) -> async_broadcast::Receiver<ModelCommand> {
        self.main_bus_receiver.activate_cloned()
    }
}

pub fn init_event_bus() -> Arc<EventBus> {
    Arc::new(EventBus::init("MetricMon".to_string()))
}
