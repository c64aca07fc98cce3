use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// How `inferenceArgs.inputPredictedField` is treated by the model engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputPredictedField {
    Auto,
    Yes,
    No,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct InferenceArgs {
    pub prediction_steps: Vec<u32>,
    pub predicted_field: String,
    pub input_predicted_field: InputPredictedField,
}

/// The convenience `modelParams` form.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct SimpleModelParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_resolution: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_classifier: Option<bool>,
}

impl SimpleModelParams {
    /// The caller-supplied value range, when both ends are given.
    pub fn explicit_range(&self) -> Option<(f64, f64)> {
        match (self.min, self.max) {
            (Some(min), Some(max)) => Some((min, max)),
            _ => None,
        }
    }
}

/// The expert `completeModelParams` form, after the cross-field checks.
///
/// It is also the shape of the synthesized `modelParams` stored on a metric.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteModelParams {
    pub model_config: JsonValue,
    pub inference_args: InferenceArgs,
    pub timestamp_field_name: String,
    pub value_field_name: String,
}

/// The three accepted ways of configuring a model.
#[derive(Debug, Clone, PartialEq)]
pub enum MonitoringMode {
    Automatic,
    Simple(SimpleModelParams),
    Complete(CompleteModelParams),
}

impl MonitoringMode {
    pub fn enable_classifier(&self) -> bool {
        match self {
            MonitoringMode::Simple(params) => params.enable_classifier.unwrap_or(false),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct MetricSpec {
    pub metric: String,
    pub resource: Option<String>,
    pub user_info: Option<Map<String, JsonValue>>,
}

/// A model spec that passed validation.
///
/// Keeps the original document next to its typed form: the document is what
/// gets persisted as the metric's `parameters`.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelSpec {
    pub datasource: String,
    pub metric_spec: MetricSpec,
    pub mode: MonitoringMode,
    document: JsonValue,
}

impl ModelSpec {
    pub(crate) fn new(
        datasource: String,
        metric_spec: MetricSpec,
        mode: MonitoringMode,
        document: JsonValue,
    ) -> Self {
        Self {
            datasource,
            metric_spec,
            mode,
            document,
        }
    }

    pub fn document(&self) -> &JsonValue {
        &self.document
    }

    pub fn into_document(self) -> JsonValue {
        self.document
    }
}
