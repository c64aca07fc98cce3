use super::error::ValidationError;
use super::model_spec::{CompleteModelParams, ModelSpec, MonitoringMode, SimpleModelParams};
use super::schema::{CompleteModelParamsDocument, ValidationSchemas, check_model_spec_structure};
use serde_json::Value as JsonValue;

/// Validates a model spec document and converts it into a [`ModelSpec`].
///
/// Runs the general structural schema, then the `metricSpec` schema of the
/// document's datasource, then the cross-field rules between `modelParams`
/// and `completeModelParams`. Pure: nothing is read or written.
pub fn validate_model_spec(
    document: &JsonValue,
    schemas: &ValidationSchemas,
) -> Result<ModelSpec, ValidationError> {
    let parsed = check_model_spec_structure(document)?;

    let schema = schemas
        .metric_spec_schema(&parsed.datasource)
        .ok_or_else(|| ValidationError::UnknownDatasource {
            datasource: parsed.datasource.clone(),
        })?;
    let metric_spec = schema.validate(&parsed.metric_spec)?;

    let mode = resolve_monitoring_mode(parsed.model_params, parsed.complete_model_params)?;

    Ok(ModelSpec::new(
        parsed.datasource,
        metric_spec,
        mode,
        document.clone(),
    ))
}

fn resolve_monitoring_mode(
    model_params: Option<SimpleModelParams>,
    complete_model_params: Option<CompleteModelParamsDocument>,
) -> Result<MonitoringMode, ValidationError> {
    match (model_params, complete_model_params) {
        (Some(_), Some(_)) => Err(ValidationError::MutuallyExclusiveOptions),
        (Some(params), None) => Ok(MonitoringMode::Simple(params)),
        (None, Some(complete)) => check_complete_model_params(complete).map(MonitoringMode::Complete),
        (None, None) => Ok(MonitoringMode::Automatic),
    }
}

fn check_complete_model_params(
    document: CompleteModelParamsDocument,
) -> Result<CompleteModelParams, ValidationError> {
    let value_field_name = document
        .value_field_name
        .ok_or(ValidationError::MissingValueFieldName)?;
    let timestamp_field_name = document
        .timestamp_field_name
        .ok_or(ValidationError::MissingTimestampFieldName)?;
    let inference_args = document
        .inference_args
        .ok_or(ValidationError::MissingInferenceArgs)?;

    if inference_args.predicted_field != value_field_name {
        return Err(ValidationError::InconsistentPredictedFieldName {
            predicted_field: inference_args.predicted_field,
            value_field_name,
        });
    }

    Ok(CompleteModelParams {
        model_config: JsonValue::Object(document.model_config),
        inference_args,
        timestamp_field_name,
        value_field_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::error::{
        INCONSISTENT_PREDICTED_FIELD_NAME_MSG, MUTEX_MODEL_SPEC_MSG, NO_INFERENCE_ARGS_MSG,
        NO_TIMESTAMP_FIELD_NAME_MSG, NO_VALUE_FIELD_NAME_MSG, ValidationErrorKind,
    };
    use crate::spec::model_spec::InputPredictedField;
    use serde_json::json;

    fn model_config() -> JsonValue {
        json!({
            "model": "HTMPrediction",
            "modelParams": {"inferenceType": "TemporalAnomaly"}
        })
    }

    fn validate(document: JsonValue) -> Result<ModelSpec, ValidationError> {
        validate_model_spec(&document, &ValidationSchemas::default())
    }

    #[test]
    fn test_automatic_mode() {
        let document = json!({"datasource": "custom", "metricSpec": {"metric": "cpu"}});
        let spec = validate(document.clone()).unwrap();
        assert_eq!(spec.mode, MonitoringMode::Automatic);
        assert_eq!(spec.metric_spec.metric, "cpu");
        assert_eq!(spec.document(), &document);
    }

    #[test]
    fn test_simple_mode() {
        let spec = validate(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu", "resource": "web-1"},
            "modelParams": {"min": 0, "max": 100, "enableClassifier": true}
        }))
        .unwrap();

        match &spec.mode {
            MonitoringMode::Simple(params) => {
                assert_eq!(params.explicit_range(), Some((0.0, 100.0)));
                assert_eq!(params.enable_classifier, Some(true));
            }
            other => panic!("Expected simple mode, got {:?}", other),
        }
        assert_eq!(spec.metric_spec.resource.as_deref(), Some("web-1"));
    }

    #[test]
    fn test_complete_mode() {
        let spec = validate(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "completeModelParams": {
                "modelConfig": model_config(),
                "inferenceArgs": {"predictionSteps": [1], "predictedField": "bar", "inputPredictedField": "auto"},
                "timestampFieldName": "foo",
                "valueFieldName": "bar"
            }
        }))
        .unwrap();

        match &spec.mode {
            MonitoringMode::Complete(params) => {
                assert_eq!(params.model_config, model_config());
                assert_eq!(params.timestamp_field_name, "foo");
                assert_eq!(params.value_field_name, "bar");
                assert_eq!(
                    params.inference_args.input_predicted_field,
                    InputPredictedField::Auto
                );
            }
            other => panic!("Expected complete mode, got {:?}", other),
        }
    }

    #[test]
    fn test_mutually_exclusive_options() {
        let err = validate(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "completeModelParams": {
                "modelConfig": model_config(),
                "inferenceArgs": {"predictionSteps": [1], "predictedField": "bar", "inputPredictedField": "auto"},
                "timestampFieldName": "foo",
                "valueFieldName": "bar"
            },
            "modelParams": {"min": 0, "max": 100}
        }))
        .unwrap_err();

        assert_eq!(err.kind(), ValidationErrorKind::MutuallyExclusiveOptions);
        assert!(err.to_string().starts_with(MUTEX_MODEL_SPEC_MSG));
    }

    #[test]
    fn test_missing_value_field_name() {
        let err = validate(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "completeModelParams": {
                "modelConfig": model_config(),
                "inferenceArgs": {"predictionSteps": [1], "predictedField": "bachman", "inputPredictedField": "auto"},
                "timestampFieldName": "erlich"
            }
        }))
        .unwrap_err();

        assert_eq!(err.kind(), ValidationErrorKind::MissingValueFieldName);
        assert!(err.to_string().starts_with(NO_VALUE_FIELD_NAME_MSG));
    }

    #[test]
    fn test_missing_timestamp_field_name() {
        let err = validate(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "completeModelParams": {
                "modelConfig": model_config(),
                "inferenceArgs": {"predictionSteps": [1], "predictedField": "snow", "inputPredictedField": "auto"},
                "valueFieldName": "snow"
            }
        }))
        .unwrap_err();

        assert_eq!(err.kind(), ValidationErrorKind::MissingTimestampFieldName);
        assert!(err.to_string().starts_with(NO_TIMESTAMP_FIELD_NAME_MSG));
    }

    #[test]
    fn test_missing_inference_args() {
        let err = validate(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "completeModelParams": {
                "modelConfig": model_config(),
                "timestampFieldName": "jon",
                "valueFieldName": "snow"
            }
        }))
        .unwrap_err();

        assert_eq!(err.kind(), ValidationErrorKind::MissingInferenceArgs);
        assert!(err.to_string().starts_with(NO_INFERENCE_ARGS_MSG));
    }

    #[test]
    fn test_inconsistent_predicted_field_name() {
        let err = validate(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "completeModelParams": {
                "modelConfig": model_config(),
                "inferenceArgs": {"predictionSteps": [1], "predictedField": "baz", "inputPredictedField": "auto"},
                "timestampFieldName": "snorf",
                "valueFieldName": "bar"
            }
        }))
        .unwrap_err();

        assert_eq!(
            err.kind(),
            ValidationErrorKind::InconsistentPredictedFieldName
        );
        assert!(
            err.to_string()
                .starts_with(INCONSISTENT_PREDICTED_FIELD_NAME_MSG)
        );
    }

    #[test]
    fn test_unknown_datasource() {
        let err = validate(json!({"datasource": "cloudwatch", "metricSpec": {"metric": "cpu"}}))
            .unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::UnknownDatasource);
    }

    #[test]
    fn test_metric_spec_schema_runs_after_general_schema() {
        let err = validate(json!({"datasource": "custom", "metricSpec": {"name": "cpu"}}))
            .unwrap_err();
        assert_eq!(err.kind(), ValidationErrorKind::MetricSpecSchema);
    }
}
