//! Portable export document: the model spec plus the metric's full history.

use crate::datamodel::monitor_datetime::MonitorDateTimeExt;
use crate::datamodel::{MetricDataPoint, MonitorDateTime};
use hifitime::{UNIX_REF_EPOCH, Unit};
use serde::de::{self, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value as JsonValue};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportSpec {
    pub datasource: String,
    pub metric_spec: JsonValue,

    /// `modelParams` or `completeModelParams`, when the metric had one.
    #[serde(flatten)]
    pub options: Map<String, JsonValue>,

    /// `false` for a metric that was not monitored when exported.
    #[serde(default = "default_monitor", skip_serializing_if = "is_monitored")]
    pub monitor: bool,

    #[serde(with = "export_data")]
    pub data: Vec<MetricDataPoint>,
}

fn default_monitor() -> bool {
    true
}

fn is_monitored(monitor: &bool) -> bool {
    *monitor
}

impl ExportSpec {
    /// Export of a monitored metric, from its stored `parameters`.
    pub fn from_parameters(parameters: &JsonValue, data: Vec<MetricDataPoint>) -> Option<Self> {
        let mut document = parameters.as_object()?.clone();
        let datasource = match document.remove("datasource")? {
            JsonValue::String(datasource) => datasource,
            _ => return None,
        };
        let metric_spec = document.remove("metricSpec")?;
        Some(Self {
            datasource,
            metric_spec,
            options: document,
            monitor: true,
            data,
        })
    }

    /// Export of a metric that has no model spec.
    pub fn unmonitored(datasource: &str, name: &str, data: Vec<MetricDataPoint>) -> Self {
        let mut metric_spec = Map::new();
        metric_spec.insert("metric".to_string(), JsonValue::String(name.to_string()));
        Self {
            datasource: datasource.to_string(),
            metric_spec: JsonValue::Object(metric_spec),
            options: Map::new(),
            monitor: false,
            data,
        }
    }

    pub fn metric_name(&self) -> Option<&str> {
        self.metric_spec.get("metric").and_then(JsonValue::as_str)
    }

    /// The model spec this export was taken from.
    pub fn model_spec_document(&self) -> JsonValue {
        let mut document = self.options.clone();
        document.insert(
            "datasource".to_string(),
            JsonValue::String(self.datasource.clone()),
        );
        document.insert("metricSpec".to_string(), self.metric_spec.clone());
        JsonValue::Object(document)
    }
}

#[derive(Deserialize)]
#[serde(transparent)]
struct DataPoints(#[serde(with = "export_data")] Vec<MetricDataPoint>);

/// Parses a bare `[[value, timestamp], ...]` array.
pub fn data_points_from_json(value: JsonValue) -> serde_json::Result<Vec<MetricDataPoint>> {
    serde_json::from_value::<DataPoints>(value).map(|points| points.0)
}

/// Data points travel as `[value, timestamp]` pairs. Timestamps are written as
/// RFC 3339 and read back from RFC 3339 or Unix seconds.
mod export_data {
    use super::*;

    pub fn serialize<S>(data: &[MetricDataPoint], serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut seq = serializer.serialize_seq(Some(data.len()))?;
        for point in data {
            seq.serialize_element(&(point.value, point.timestamp.to_rfc3339()))?;
        }
        seq.end()
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Vec<MetricDataPoint>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let pairs: Vec<(f64, WireTimestamp)> = Vec::deserialize(deserializer)?;
        pairs
            .into_iter()
            .map(|(value, timestamp)| {
                timestamp
                    .into_datetime()
                    .map(|timestamp| MetricDataPoint::new(value, timestamp))
                    .map_err(de::Error::custom)
            })
            .collect()
    }
}

enum WireTimestamp {
    Text(String),
    UnixSeconds(f64),
}

impl WireTimestamp {
    fn into_datetime(self) -> anyhow::Result<MonitorDateTime> {
        match self {
            WireTimestamp::Text(text) => MonitorDateTime::parse_rfc3339(&text),
            WireTimestamp::UnixSeconds(seconds) if seconds.is_finite() => Ok(
                MonitorDateTime::from_utc_duration(
                    UNIX_REF_EPOCH.to_utc_duration() + seconds * Unit::Second,
                ),
            ),
            WireTimestamp::UnixSeconds(seconds) => {
                Err(anyhow::anyhow!("Invalid timestamp: {}", seconds))
            }
        }
    }
}

impl<'de> Deserialize<'de> for WireTimestamp {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct WireTimestampVisitor;

        impl<'de> Visitor<'de> for WireTimestampVisitor {
            type Value = WireTimestamp;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an RFC 3339 string or Unix seconds")
            }

            fn visit_str<E: de::Error>(self, value: &str) -> Result<Self::Value, E> {
                Ok(WireTimestamp::Text(value.to_string()))
            }

            fn visit_i64<E: de::Error>(self, value: i64) -> Result<Self::Value, E> {
                Ok(WireTimestamp::UnixSeconds(value as f64))
            }

            fn visit_u64<E: de::Error>(self, value: u64) -> Result<Self::Value, E> {
                Ok(WireTimestamp::UnixSeconds(value as f64))
            }

            fn visit_f64<E: de::Error>(self, value: f64) -> Result<Self::Value, E> {
                Ok(WireTimestamp::UnixSeconds(value))
            }
        }

        deserializer.deserialize_any(WireTimestampVisitor)
    }
}
