pub mod event_bus;
pub mod message;

pub use event_bus::{EventBus, init_event_bus};
pub use message::ModelCommand;
