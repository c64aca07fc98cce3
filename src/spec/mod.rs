//! Model spec validation.
//!
//! A model spec is the JSON document a caller hands to `monitor_metric`. It is
//! checked once at the boundary and turned into a [`ModelSpec`], whose
//! [`MonitoringMode`] says which of the three configuration forms was used.

pub mod error;
pub mod model_spec;
pub mod schema;
pub mod validator;

pub use error::{ValidationError, ValidationErrorKind};
pub use model_spec::{
    CompleteModelParams, InferenceArgs, InputPredictedField, MetricSpec, ModelSpec,
    MonitoringMode, SimpleModelParams,
};
pub use schema::{CUSTOM_DATASOURCE, CustomMetricSpecSchema, MetricSpecSchema, ValidationSchemas};
pub use validator::validate_model_spec;
