//! Builds the model engine configuration stored as a metric's `modelParams`.

use crate::spec::{
    CompleteModelParams, InferenceArgs, InputPredictedField, ModelSpec, MonitoringMode,
    ValidationSchemas,
};
use crate::storage::DataStatistics;
use anyhow::{Context, Result};
use serde_json::{Value as JsonValue, json};

pub const TIMESTAMP_FIELD_NAME: &str = "c0";
pub const VALUE_FIELD_NAME: &str = "c1";

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EncoderSettings {
    pub num_buckets: u32,
    pub default_min_resolution: f64,
}

impl Default for EncoderSettings {
    fn default() -> Self {
        Self {
            num_buckets: 130,
            default_min_resolution: 0.001,
        }
    }
}

/// Immutable settings shared by every controller of the process.
#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub model_creation_record_threshold: u64,
    pub encoder: EncoderSettings,
    pub schemas: ValidationSchemas,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            model_creation_record_threshold: 1000,
            encoder: EncoderSettings::default(),
            schemas: ValidationSchemas::default(),
        }
    }
}

/// Value range used to size the scalar encoder.
///
/// The model spec's `min`/`max` win over the stored data. A flat range is widened
/// by one so the encoder never gets a zero width.
pub fn value_range(mode: &MonitoringMode, stats: Option<&DataStatistics>) -> Option<(f64, f64)> {
    let explicit = match mode {
        MonitoringMode::Simple(params) => params.explicit_range(),
        _ => None,
    };
    let (min, max) = explicit.or_else(|| stats.map(|s| (s.min, s.max)))?;
    if min == max {
        Some((min, min + 1.0))
    } else {
        Some((min, max))
    }
}

pub fn encoder_resolution(min: f64, max: f64, min_resolution: f64, num_buckets: u32) -> f64 {
    let resolution = (max - min) / f64::from(num_buckets.max(1));
    resolution.max(min_resolution)
}

pub fn synthesize_model_params(
    spec: &ModelSpec,
    stats: Option<&DataStatistics>,
    encoder: &EncoderSettings,
) -> Result<JsonValue> {
    if let MonitoringMode::Complete(_) = spec.mode {
        // Stored exactly as the caller wrote it.
        return spec
            .document()
            .get("completeModelParams")
            .cloned()
            .context("completeModelParams missing from a validated spec");
    }

    let min_resolution = match &spec.mode {
        MonitoringMode::Simple(params) => params
            .min_resolution
            .unwrap_or(encoder.default_min_resolution),
        _ => encoder.default_min_resolution,
    };
    let resolution = value_range(&spec.mode, stats)
        .map(|(min, max)| encoder_resolution(min, max, min_resolution, encoder.num_buckets));

    let params = CompleteModelParams {
        model_config: temporal_anomaly_model_config(resolution, spec.mode.enable_classifier()),
        inference_args: InferenceArgs {
            prediction_steps: vec![1],
            predicted_field: VALUE_FIELD_NAME.to_string(),
            input_predicted_field: InputPredictedField::Auto,
        },
        timestamp_field_name: TIMESTAMP_FIELD_NAME.to_string(),
        value_field_name: VALUE_FIELD_NAME.to_string(),
    };

    serde_json::to_value(params).context("Failed to serialize model params")
}

/// Scalar metric with time-of-day encoding, scored for anomalies.
fn temporal_anomaly_model_config(resolution: Option<f64>, enable_classifier: bool) -> JsonValue {
    json!({
        "model": "HTMPrediction",
        "version": 1,
        "predictAheadTime": null,
        "modelParams": {
            "inferenceType": "TemporalAnomaly",
            "sensorParams": {
                "verbosity": 0,
                "sensorAutoReset": null,
                "encoders": {
                    "c0_timeOfDay": {
                        "fieldname": TIMESTAMP_FIELD_NAME,
                        "name": TIMESTAMP_FIELD_NAME,
                        "type": "DateEncoder",
                        "timeOfDay": [21, 9.49]
                    },
                    "c0_dayOfWeek": null,
                    "c0_weekend": null,
                    "c1": {
                        "fieldname": VALUE_FIELD_NAME,
                        "name": VALUE_FIELD_NAME,
                        "type": "RandomDistributedScalarEncoder",
                        "resolution": resolution,
                        "seed": 42
                    }
                }
            },
            "spEnable": true,
            "spParams": {
                "spatialImp": "cpp",
                "columnCount": 2048,
                "inputWidth": 0,
                "numActiveColumnsPerInhArea": 40,
                "potentialPct": 0.8,
                "synPermConnected": 0.2,
                "synPermActiveInc": 0.003,
                "synPermInactiveDec": 0.0005,
                "boostStrength": 0.0,
                "globalInhibition": 1,
                "seed": 1956
            },
            "tmEnable": true,
            "tmParams": {
                "temporalImp": "cpp",
                "columnCount": 2048,
                "cellsPerColumn": 32,
                "inputWidth": 2048,
                "newSynapseCount": 20,
                "maxSynapsesPerSegment": 32,
                "maxSegmentsPerCell": 128,
                "initialPerm": 0.21,
                "permanenceInc": 0.1,
                "permanenceDec": 0.1,
                "minThreshold": 13,
                "activationThreshold": 20,
                "pamLength": 3,
                "seed": 1960
            },
            "clEnable": enable_classifier,
            "clParams": {
                "regionName": "SDRClassifierRegion",
                "alpha": 0.035828933612158,
                "steps": "1",
                "verbosity": 0
            },
            "anomalyParams": {
                "anomalyCacheRecords": null,
                "autoDetectThreshold": null,
                "autoDetectWaitRecords": 5030
            },
            "trainSPNetOnlyIfRequested": false
        }
    })
}

/// Reads the encoder resolution back out of stored `modelParams`.
pub fn stored_encoder_resolution(model_params: &JsonValue) -> Option<f64> {
    model_params
        .pointer("/modelConfig/modelParams/sensorParams/encoders/c1/resolution")
        .and_then(JsonValue::as_f64)
}

/// Reads the classifier flag back out of stored `modelParams`.
pub fn stored_classifier_flag(model_params: &JsonValue) -> Option<bool> {
    model_params
        .pointer("/modelConfig/modelParams/clEnable")
        .and_then(JsonValue::as_bool)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::validate_model_spec;

    fn spec(document: JsonValue) -> ModelSpec {
        validate_model_spec(&document, &ValidationSchemas::default()).unwrap()
    }

    #[test]
    fn test_resolution_from_explicit_range() {
        let spec = spec(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "modelParams": {"min": 0, "max": 130}
        }));
        let params = synthesize_model_params(&spec, None, &EncoderSettings::default()).unwrap();
        assert_eq!(stored_encoder_resolution(&params), Some(1.0));
        assert_eq!(stored_classifier_flag(&params), Some(false));
        assert_eq!(params["valueFieldName"], json!("c1"));
        assert_eq!(params["inferenceArgs"]["predictedField"], json!("c1"));
    }

    #[test]
    fn test_min_resolution_is_a_floor() {
        let spec = spec(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "modelParams": {"min": 0, "max": 1, "minResolution": 0.5}
        }));
        let params = synthesize_model_params(&spec, None, &EncoderSettings::default()).unwrap();
        assert_eq!(stored_encoder_resolution(&params), Some(0.5));
    }

    #[test]
    fn test_unknown_range_leaves_resolution_null() {
        let spec = spec(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "modelParams": {"enableClassifier": true}
        }));
        let params = synthesize_model_params(&spec, None, &EncoderSettings::default()).unwrap();
        assert_eq!(stored_encoder_resolution(&params), None);
        assert_eq!(stored_classifier_flag(&params), Some(true));
    }

    #[test]
    fn test_range_from_data() {
        let spec = spec(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"}
        }));
        let stats = DataStatistics {
            count: 2,
            min: 0.0,
            max: 260.0,
        };
        let params =
            synthesize_model_params(&spec, Some(&stats), &EncoderSettings::default()).unwrap();
        assert_eq!(stored_encoder_resolution(&params), Some(2.0));
    }

    #[test]
    fn test_flat_range_is_widened() {
        let stats = DataStatistics {
            count: 3,
            min: 5.0,
            max: 5.0,
        };
        assert_eq!(
            value_range(&MonitoringMode::Automatic, Some(&stats)),
            Some((5.0, 6.0))
        );
        assert_eq!(encoder_resolution(5.0, 6.0, 0.001, 130), 1.0 / 130.0);
    }

    #[test]
    fn test_complete_params_are_kept_verbatim() {
        let complete = json!({
            "modelConfig": {"model": "custom", "extra": [1, 2, 3]},
            "inferenceArgs": {
                "predictionSteps": [1],
                "predictedField": "value",
                "inputPredictedField": "auto"
            },
            "timestampFieldName": "timestamp",
            "valueFieldName": "value"
        });
        let spec = spec(json!({
            "datasource": "custom",
            "metricSpec": {"metric": "cpu"},
            "completeModelParams": complete.clone()
        }));
        let params = synthesize_model_params(&spec, None, &EncoderSettings::default()).unwrap();
        assert_eq!(params, complete);
    }
}
