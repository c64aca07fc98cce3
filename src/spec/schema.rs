use super::error::ValidationError;
use super::model_spec::{InferenceArgs, MetricSpec, SimpleModelParams};
use serde::Deserialize;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;
use std::fmt::Debug;
use std::sync::Arc;

pub const CUSTOM_DATASOURCE: &str = "custom";

/// Structural shape shared by every model spec, whatever its datasource.
///
/// The `completeModelParams` members are optional here on purpose: their
/// absence is reported by the cross-field rules with a dedicated kind.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct ModelSpecDocument {
    pub datasource: String,
    pub metric_spec: Map<String, JsonValue>,
    #[serde(default)]
    pub model_params: Option<SimpleModelParams>,
    #[serde(default)]
    pub complete_model_params: Option<CompleteModelParamsDocument>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub(crate) struct CompleteModelParamsDocument {
    pub model_config: Map<String, JsonValue>,
    #[serde(default)]
    pub inference_args: Option<InferenceArgs>,
    #[serde(default)]
    pub timestamp_field_name: Option<String>,
    #[serde(default)]
    pub value_field_name: Option<String>,
}

const OPTION_KEYS: [&str; 2] = ["modelParams", "completeModelParams"];

/// Checks a document against the general model spec schema.
pub(crate) fn check_model_spec_structure(
    document: &JsonValue,
) -> Result<ModelSpecDocument, ValidationError> {
    let object = document
        .as_object()
        .ok_or_else(|| ValidationError::model_spec_schema("document must be a JSON object"))?;

    // serde would quietly read an explicit null as an absent option
    for key in OPTION_KEYS {
        if matches!(object.get(key), Some(JsonValue::Null)) {
            return Err(ValidationError::model_spec_schema(format!(
                "{} must be an object",
                key
            )));
        }
    }

    let parsed: ModelSpecDocument = serde_json::from_value(document.clone())
        .map_err(ValidationError::model_spec_schema)?;

    if parsed.datasource.is_empty() {
        return Err(ValidationError::model_spec_schema(
            "datasource must not be empty",
        ));
    }

    if let Some(params) = &parsed.model_params {
        if params.min_resolution.is_some_and(|r| r < 0.0) {
            return Err(ValidationError::model_spec_schema(
                "modelParams.minResolution must not be negative",
            ));
        }
    }

    if let Some(args) = parsed
        .complete_model_params
        .as_ref()
        .and_then(|p| p.inference_args.as_ref())
    {
        if args.prediction_steps.is_empty() {
            return Err(ValidationError::model_spec_schema(
                "inferenceArgs.predictionSteps must not be empty",
            ));
        }
    }

    Ok(parsed)
}

/// Datasource-specific schema for the `metricSpec` member.
pub trait MetricSpecSchema: Send + Sync + Debug {
    fn datasource(&self) -> &str;
    fn validate(&self, metric_spec: &Map<String, JsonValue>) -> Result<MetricSpec, ValidationError>;
}

/// `metricSpec` of the `custom` datasource: caller-pushed metrics.
#[derive(Debug, Default, Clone, Copy)]
pub struct CustomMetricSpecSchema;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
struct CustomMetricSpecDocument {
    metric: String,
    #[serde(default)]
    resource: Option<String>,
    #[serde(default)]
    user_info: Option<Map<String, JsonValue>>,
}

impl MetricSpecSchema for CustomMetricSpecSchema {
    fn datasource(&self) -> &str {
        CUSTOM_DATASOURCE
    }

    fn validate(&self, metric_spec: &Map<String, JsonValue>) -> Result<MetricSpec, ValidationError> {
        let parsed: CustomMetricSpecDocument =
            serde_json::from_value(JsonValue::Object(metric_spec.clone()))
                .map_err(ValidationError::metric_spec_schema)?;

        if parsed.metric.is_empty() {
            return Err(ValidationError::metric_spec_schema(
                "metric must not be empty",
            ));
        }

        Ok(MetricSpec {
            metric: parsed.metric,
            resource: parsed.resource,
            user_info: parsed.user_info,
        })
    }
}

/// The `metricSpec` schemas known to the process, keyed by datasource.
#[derive(Debug, Clone)]
pub struct ValidationSchemas {
    metric_specs: HashMap<String, Arc<dyn MetricSpecSchema>>,
}

impl ValidationSchemas {
    pub fn empty() -> Self {
        Self {
            metric_specs: HashMap::new(),
        }
    }

    pub fn with_schema(mut self, schema: Arc<dyn MetricSpecSchema>) -> Self {
        self.metric_specs
            .insert(schema.datasource().to_string(), schema);
        self
    }

    pub fn metric_spec_schema(&self, datasource: &str) -> Option<&Arc<dyn MetricSpecSchema>> {
        self.metric_specs.get(datasource)
    }
}

impl Default for ValidationSchemas {
    fn default() -> Self {
        Self::empty().with_schema(Arc::new(CustomMetricSpecSchema))
    }
}
