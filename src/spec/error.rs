use thiserror::Error;

pub const MODEL_SPEC_SCHEMA_MSG: &str = "Model spec failed schema validation";
pub const METRIC_SPEC_SCHEMA_MSG: &str = "metricSpec failed schema validation";
pub const UNKNOWN_DATASOURCE_MSG: &str = "No metricSpec schema registered for datasource";
pub const DATASOURCE_MISMATCH_MSG: &str = "Model spec datasource does not match the metric datasource";
pub const MUTEX_MODEL_SPEC_MSG: &str = "modelParams and completeModelParams are mutually exclusive";
pub const NO_VALUE_FIELD_NAME_MSG: &str = "completeModelParams is missing valueFieldName";
pub const NO_TIMESTAMP_FIELD_NAME_MSG: &str = "completeModelParams is missing timestampFieldName";
pub const NO_INFERENCE_ARGS_MSG: &str = "completeModelParams is missing inferenceArgs";
pub const INCONSISTENT_PREDICTED_FIELD_NAME_MSG: &str =
    "inferenceArgs.predictedField must equal valueFieldName";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValidationErrorKind {
    ModelSpecSchema,
    MetricSpecSchema,
    UnknownDatasource,
    DatasourceMismatch,
    MutuallyExclusiveOptions,
    MissingValueFieldName,
    MissingTimestampFieldName,
    MissingInferenceArgs,
    InconsistentPredictedFieldName,
}

/// Rejection of a model spec document.
///
/// Every message starts with the constant returned by [`ValidationError::prefix`],
/// so callers holding only the text can still branch on the failure kind.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{}: {}", MODEL_SPEC_SCHEMA_MSG, .details)]
    ModelSpecSchema { details: String },

    #[error("{}: {}", METRIC_SPEC_SCHEMA_MSG, .details)]
    MetricSpecSchema { details: String },

    #[error("{}: datasource={}", UNKNOWN_DATASOURCE_MSG, .datasource)]
    UnknownDatasource { datasource: String },

    #[error("{}: expected={}, found={}", DATASOURCE_MISMATCH_MSG, .expected, .found)]
    DatasourceMismatch { expected: String, found: String },

    #[error("{}", MUTEX_MODEL_SPEC_MSG)]
    MutuallyExclusiveOptions,

    #[error("{}", NO_VALUE_FIELD_NAME_MSG)]
    MissingValueFieldName,

    #[error("{}", NO_TIMESTAMP_FIELD_NAME_MSG)]
    MissingTimestampFieldName,

    #[error("{}", NO_INFERENCE_ARGS_MSG)]
    MissingInferenceArgs,

    #[error("{}: predictedField={}, valueFieldName={}", INCONSISTENT_PREDICTED_FIELD_NAME_MSG, .predicted_field, .value_field_name)]
    InconsistentPredictedFieldName {
        predicted_field: String,
        value_field_name: String,
    },
}

impl ValidationError {
    pub fn model_spec_schema(details: impl ToString) -> Self {
        ValidationError::ModelSpecSchema {
            details: details.to_string(),
        }
    }

    pub fn metric_spec_schema(details: impl ToString) -> Self {
        ValidationError::MetricSpecSchema {
            details: details.to_string(),
        }
    }

    pub fn kind(&self) -> ValidationErrorKind {
        match self {
            ValidationError::ModelSpecSchema { .. } => ValidationErrorKind::ModelSpecSchema,
            ValidationError::MetricSpecSchema { .. } => ValidationErrorKind::MetricSpecSchema,
            ValidationError::UnknownDatasource { .. } => ValidationErrorKind::UnknownDatasource,
            ValidationError::DatasourceMismatch { .. } => ValidationErrorKind::DatasourceMismatch,
            ValidationError::MutuallyExclusiveOptions => {
                ValidationErrorKind::MutuallyExclusiveOptions
            }
            ValidationError::MissingValueFieldName => ValidationErrorKind::MissingValueFieldName,
            ValidationError::MissingTimestampFieldName => {
                ValidationErrorKind::MissingTimestampFieldName
            }
            ValidationError::MissingInferenceArgs => ValidationErrorKind::MissingInferenceArgs,
            ValidationError::InconsistentPredictedFieldName { .. } => {
                ValidationErrorKind::InconsistentPredictedFieldName
            }
        }
    }

    pub fn prefix(&self) -> &'static str {
        match self.kind() {
            ValidationErrorKind::ModelSpecSchema => MODEL_SPEC_SCHEMA_MSG,
            ValidationErrorKind::MetricSpecSchema => METRIC_SPEC_SCHEMA_MSG,
            ValidationErrorKind::UnknownDatasource => UNKNOWN_DATASOURCE_MSG,
            ValidationErrorKind::DatasourceMismatch => DATASOURCE_MISMATCH_MSG,
            ValidationErrorKind::MutuallyExclusiveOptions => MUTEX_MODEL_SPEC_MSG,
            ValidationErrorKind::MissingValueFieldName => NO_VALUE_FIELD_NAME_MSG,
            ValidationErrorKind::MissingTimestampFieldName => NO_TIMESTAMP_FIELD_NAME_MSG,
            ValidationErrorKind::MissingInferenceArgs => NO_INFERENCE_ARGS_MSG,
            ValidationErrorKind::InconsistentPredictedFieldName => {
                INCONSISTENT_PREDICTED_FIELD_NAME_MSG
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_start_with_prefix() {
        let errors = vec![
            ValidationError::model_spec_schema("missing field `datasource`"),
            ValidationError::metric_spec_schema("missing field `metric`"),
            ValidationError::UnknownDatasource {
                datasource: "cloudwatch".to_string(),
            },
            ValidationError::DatasourceMismatch {
                expected: "custom".to_string(),
                found: "cloudwatch".to_string(),
            },
            ValidationError::MutuallyExclusiveOptions,
            ValidationError::MissingValueFieldName,
            ValidationError::MissingTimestampFieldName,
            ValidationError::MissingInferenceArgs,
            ValidationError::InconsistentPredictedFieldName {
                predicted_field: "baz".to_string(),
                value_field_name: "bar".to_string(),
            },
        ];

        for error in errors {
            let message = error.to_string();
            assert!(
                message.starts_with(error.prefix()),
                "'{}' should start with '{}'",
                message,
                error.prefix()
            );
        }
    }

    #[test]
    fn test_prefixes_are_distinct() {
        let prefixes = [
            MODEL_SPEC_SCHEMA_MSG,
            METRIC_SPEC_SCHEMA_MSG,
            UNKNOWN_DATASOURCE_MSG,
            DATASOURCE_MISMATCH_MSG,
            MUTEX_MODEL_SPEC_MSG,
            NO_VALUE_FIELD_NAME_MSG,
            NO_TIMESTAMP_FIELD_NAME_MSG,
            NO_INFERENCE_ARGS_MSG,
            INCONSISTENT_PREDICTED_FIELD_NAME_MSG,
        ];
        for (i, a) in prefixes.iter().enumerate() {
            for b in prefixes.iter().skip(i + 1) {
                assert!(!a.starts_with(b) && !b.starts_with(a), "{} / {}", a, b);
            }
        }
    }
}
