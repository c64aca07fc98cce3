use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::{fmt, str::FromStr};
use uuid::Uuid;

/// Monitoring state of a metric.
///
/// `Error` is only written by the model-builder worker. The lifecycle
/// controller treats it as a stable state that it never retries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MetricStatus {
    Unmonitored,
    PendingData,
    CreatePending,
    Active,
    Error,
}

impl MetricStatus {
    pub const ALL: [MetricStatus; 5] = [
        MetricStatus::Unmonitored,
        MetricStatus::PendingData,
        MetricStatus::CreatePending,
        MetricStatus::Active,
        MetricStatus::Error,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MetricStatus::Unmonitored => "UNMONITORED",
            MetricStatus::PendingData => "PENDING_DATA",
            MetricStatus::CreatePending => "CREATE_PENDING",
            MetricStatus::Active => "ACTIVE",
            MetricStatus::Error => "ERROR",
        }
    }

    /// Every state in which monitoring has been requested.
    pub fn is_monitored(&self) -> bool {
        !matches!(self, MetricStatus::Unmonitored)
    }
}

impl fmt::Display for MetricStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MetricStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "UNMONITORED" => Ok(MetricStatus::Unmonitored),
            "PENDING_DATA" => Ok(MetricStatus::PendingData),
            "CREATE_PENDING" => Ok(MetricStatus::CreatePending),
            "ACTIVE" => Ok(MetricStatus::Active),
            "ERROR" => Ok(MetricStatus::Error),
            _ => Err(format!("Unknown metric status: {}", s)),
        }
    }
}

/// A named time series owned by one datasource.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub uid: Uuid,
    pub datasource: String,
    pub name: String,
    pub status: MetricStatus,

    /// The model spec document accepted by `monitor_metric`, stored verbatim.
    pub parameters: Option<JsonValue>,

    /// Model engine configuration synthesized from `parameters`.
    pub model_params: Option<JsonValue>,

    /// Grouping label taken from `metricSpec.resource`.
    pub server: Option<String>,

    /// Last message reported by the model-builder worker.
    pub message: Option<String>,
}

/// Row inserted by `create_metric`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetric {
    pub uid: Uuid,
    pub datasource: String,
    pub name: String,
}

impl NewMetric {
    pub fn new(datasource: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            uid: Uuid::new_v4(),
            datasource: datasource.into(),
            name: name.into(),
        }
    }

    pub fn into_metric(self) -> Metric {
        Metric {
            uid: self.uid,
            datasource: self.datasource,
            name: self.name,
            status: MetricStatus::Unmonitored,
            parameters: None,
            model_params: None,
            server: None,
            message: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metric_status_to_string() {
        assert_eq!(MetricStatus::Unmonitored.to_string(), "UNMONITORED");
        assert_eq!(MetricStatus::PendingData.to_string(), "PENDING_DATA");
        assert_eq!(MetricStatus::CreatePending.to_string(), "CREATE_PENDING");
        assert_eq!(MetricStatus::Active.to_string(), "ACTIVE");
        assert_eq!(MetricStatus::Error.to_string(), "ERROR");
    }

    #[test]
    fn test_metric_status_from_str() {
        for status in MetricStatus::ALL {
            assert_eq!(MetricStatus::from_str(status.as_str()).unwrap(), status);
        }
        assert_eq!(
            MetricStatus::from_str("pending_data").unwrap(),
            MetricStatus::PendingData
        );
        assert!(MetricStatus::from_str("paused").is_err());
    }

    #[test]
    fn test_metric_status_serde_matches_display() {
        for status in MetricStatus::ALL {
            let json = serde_json::to_value(status).unwrap();
            assert_eq!(json, JsonValue::String(status.to_string()));
        }
    }

    #[test]
    fn test_is_monitored() {
        assert!(!MetricStatus::Unmonitored.is_monitored());
        assert!(MetricStatus::PendingData.is_monitored());
        assert!(MetricStatus::Error.is_monitored());
    }

    #[test]
    fn test_new_metric_starts_unmonitored() {
        let metric = NewMetric::new("custom", "cpu").into_metric();
        assert_eq!(metric.status, MetricStatus::Unmonitored);
        assert_eq!(metric.datasource, "custom");
        assert!(metric.parameters.is_none());
        assert!(metric.model_params.is_none());
    }
}
