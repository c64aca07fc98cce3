use crate::datamodel::MetricDataPoint;
use crate::spec::CUSTOM_DATASOURCE;
use serde_json::{Value as JsonValue, json};
use uuid::Uuid;

/// 2024-01-01T00:00:00Z
pub const BASE_UNIX_SECONDS: i64 = 1_704_067_200;

/// Metric names are unique per datasource, so tests get fresh ones.
pub fn unique_metric_name() -> String {
    format!("test-{}", Uuid::new_v4().simple())
}

pub fn automatic_spec(name: &str) -> JsonValue {
    json!({
        "datasource": CUSTOM_DATASOURCE,
        "metricSpec": {"metric": name}
    })
}

pub fn range_spec(name: &str, min: f64, max: f64) -> JsonValue {
    json!({
        "datasource": CUSTOM_DATASOURCE,
        "metricSpec": {"metric": name},
        "modelParams": {"min": min, "max": max}
    })
}

pub fn model_config() -> JsonValue {
    json!({
        "model": "HTMPrediction",
        "version": 1,
        "modelParams": {
            "inferenceType": "TemporalAnomaly",
            "clEnable": false
        }
    })
}

pub fn complete_model_params() -> JsonValue {
    json!({
        "modelConfig": model_config(),
        "inferenceArgs": {
            "predictionSteps": [1],
            "predictedField": "bar",
            "inputPredictedField": "auto"
        },
        "timestampFieldName": "foo",
        "valueFieldName": "bar"
    })
}

pub fn complete_spec(name: &str) -> JsonValue {
    json!({
        "datasource": CUSTOM_DATASOURCE,
        "metricSpec": {"metric": name},
        "completeModelParams": complete_model_params()
    })
}

/// `count` points one minute apart with values `0, 1, 2, ...`.
pub fn data_points(count: usize) -> Vec<MetricDataPoint> {
    (0..count)
        .map(|i| MetricDataPoint::from_unix_seconds(i as f64, BASE_UNIX_SECONDS + 60 * i as i64))
        .collect()
}
