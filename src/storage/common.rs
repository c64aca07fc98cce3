use crate::datamodel::monitor_datetime::MonitorDateTimeExt;
use crate::datamodel::{Metric, MetricDataPoint, MetricStatus, MonitorDateTime};
use crate::storage::{Assign, StorageError};
use anyhow::Result;
use serde_json::Value as JsonValue;
use std::str::FromStr;
use uuid::Uuid;

/// Rows per multi-value INSERT when appending data points.
pub const DATA_POINTS_INSERT_CHUNK: usize = 512;

/// Columns of the `metrics` table, in the order every backend selects them.
pub const METRIC_COLUMNS: &str = "uid, datasource, name, status, parameters, model_params, server, message";

#[derive(Debug, sqlx::FromRow)]
pub struct MetricRow {
    pub uid: String,
    pub datasource: String,
    pub name: String,
    pub status: String,
    pub parameters: Option<String>,
    pub model_params: Option<String>,
    pub server: Option<String>,
    pub message: Option<String>,
}

impl MetricRow {
    pub fn into_metric(self) -> Result<Metric> {
        let uid = Uuid::parse_str(&self.uid).map_err(|e| {
            StorageError::invalid_data_format(
                &format!("Failed to parse metric uid '{}': {}", self.uid, e),
                None,
                Some(&self.name),
            )
        })?;

        let status = MetricStatus::from_str(&self.status).map_err(|e| {
            StorageError::invalid_data_format(
                &format!("Failed to parse metric status '{}': {}", self.status, e),
                Some(uid),
                Some(&self.name),
            )
        })?;

        let parameters = parse_json_column("parameters", self.parameters, uid, &self.name)?;
        let model_params = parse_json_column("model_params", self.model_params, uid, &self.name)?;

        Ok(Metric {
            uid,
            datasource: self.datasource,
            name: self.name,
            status,
            parameters,
            model_params,
            server: self.server,
            message: self.message,
        })
    }
}

fn parse_json_column(
    column: &str,
    raw: Option<String>,
    uid: Uuid,
    name: &str,
) -> Result<Option<JsonValue>> {
    raw.map(|text| {
        serde_json::from_str::<JsonValue>(&text).map_err(|e| {
            anyhow::Error::from(StorageError::invalid_data_format(
                &format!("Failed to parse {} JSON: {}", column, e),
                Some(uid),
                Some(name),
            ))
        })
    })
    .transpose()
}

#[derive(Debug, sqlx::FromRow)]
pub struct DataPointRow {
    pub metric_value: f64,
    pub ts_micros: i64,
}

impl From<DataPointRow> for MetricDataPoint {
    fn from(row: DataPointRow) -> Self {
        MetricDataPoint::new(
            row.metric_value,
            MonitorDateTime::from_unix_microseconds_i64(row.ts_micros),
        )
    }
}

#[derive(Debug, sqlx::FromRow)]
pub struct StatisticsRow {
    pub row_count: i64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
}

/// Text form of a JSON column, as written by every backend.
pub fn json_to_column(value: &JsonValue) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// `None` leaves the column untouched, `Some(None)` writes NULL.
pub fn json_assignment(assign: &Assign<JsonValue>) -> Result<Option<Option<String>>> {
    Ok(match assign {
        Assign::Keep => None,
        Assign::Clear => Some(None),
        Assign::Set(value) => Some(Some(json_to_column(value)?)),
    })
}

pub fn text_assignment(assign: &Assign<String>) -> Option<Option<String>> {
    match assign {
        Assign::Keep => None,
        Assign::Clear => Some(None),
        Assign::Set(value) => Some(Some(value.clone())),
    }
}

/// Convert MonitorDateTime to Unix microseconds for database storage
pub fn datetime_to_micros(datetime: &MonitorDateTime) -> i64 {
    datetime.to_unix_microseconds_i64()
}
