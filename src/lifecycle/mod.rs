//! Metric monitoring lifecycle.
//!
//! ```text
//! UNMONITORED --monitor--> PENDING_DATA --activate / enough data--> CREATE_PENDING
//!      ^          \_____________explicit range or enough data______/      |
//!      |                                                      worker result
//!      +------------------------unmonitor------------------ ACTIVE | ERROR
//! ```

pub mod activation;
pub mod controller;
pub mod error;
pub mod export;
pub mod model_params;

pub use activation::{activation_status, decide_activation};
pub use controller::{MetricLifecycleController, ModelBuildOutcome};
pub use error::{MonitorError, MonitorErrorKind, MonitorResult};
pub use export::{ExportSpec, data_points_from_json};
pub use model_params::{EncoderSettings, LifecycleSettings};
