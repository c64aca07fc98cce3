use crate::datamodel::{Metric, MetricDataPoint, MetricStatus, MonitorDateTime, NewMetric};
use crate::storage::common::{
    DATA_POINTS_INSERT_CHUNK, DataPointRow, METRIC_COLUMNS, MetricRow, StatisticsRow,
    datetime_to_micros, json_assignment, text_assignment,
};
use crate::storage::{
    DataStatistics, InsertMetricOutcome, MetricTransition, StorageInstance,
};
use anyhow::{Context, Result, bail};
use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;
use uuid::Uuid;

/// Attempts at inserting a metric whose name collides with a row that
/// disappears before its uid can be read back.
const INSERT_METRIC_ATTEMPTS: usize = 3;

// SQLite implementation
#[derive(Debug)]
pub struct SqliteStorage {
    pool: SqlitePool,
}

impl SqliteStorage {
    pub async fn connect(connection_string: &str) -> Result<Self> {
        let connect_options = SqliteConnectOptions::from_str(connection_string)
            .context("Failed to create sqlite connection options")?
            // Create the database file if it doesn't exist
            .create_if_missing(true)
            .journal_mode(sqlx::sqlite::SqliteJournalMode::Wal)
            // Set a busy timeout of 5 seconds
            .busy_timeout(Duration::from_secs(5));

        // Every connection to an in-memory database opens a distinct database,
        // so the pool is pinned to one connection that is never recycled.
        let pool_options = if is_in_memory(connection_string) {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new()
        };

        let pool = pool_options
            .connect_with(connect_options)
            .await
            .context("Failed to create sqlite pool")?;

        Ok(Self { pool })
    }
}

fn is_in_memory(connection_string: &str) -> bool {
    connection_string.contains(":memory:") || connection_string.contains("mode=memory")
}

#[async_trait]
impl StorageInstance for SqliteStorage {
    async fn create_or_migrate(&self) -> Result<()> {
        sqlx::migrate!("src/storage/sqlite/migrations")
            .run(&self.pool)
            .await
            .context("Failed to migrate database")?;

        Ok(())
    }

    async fn insert_metric(&self, metric: &NewMetric) -> Result<InsertMetricOutcome> {
        let uid = metric.uid.to_string();
        let created_at = MonitorDateTime::now()
            .map(|now| datetime_to_micros(&now))
            .unwrap_or_default();

        for _ in 0..INSERT_METRIC_ATTEMPTS {
            // The UNIQUE (datasource, name) constraint arbitrates concurrent creators
            let inserted = sqlx::query(
                r#"
                INSERT INTO metrics (uid, datasource, name, status, created_at)
                VALUES (?, ?, ?, ?, ?)
                ON CONFLICT (datasource, name) DO NOTHING
                "#,
            )
            .bind(&uid)
            .bind(&metric.datasource)
            .bind(&metric.name)
            .bind(MetricStatus::Unmonitored.as_str())
            .bind(created_at)
            .execute(&self.pool)
            .await
            .context("Failed to insert metric")?
            .rows_affected();

            if inserted > 0 {
                return Ok(InsertMetricOutcome::Inserted(metric.clone().into_metric()));
            }

            if let Some(existing) = self
                .get_metric_by_name(&metric.datasource, &metric.name)
                .await?
            {
                return Ok(InsertMetricOutcome::NameTaken {
                    existing_uid: existing.uid,
                });
            }

            debug!(name = %metric.name, "Conflicting metric vanished, retrying insert");
        }

        bail!(
            "Failed to insert metric '{}' after {} attempts",
            metric.name,
            INSERT_METRIC_ATTEMPTS
        )
    }

    async fn get_metric(&self, uid: &Uuid) -> Result<Option<Metric>> {
        let row: Option<MetricRow> = sqlx::query_as(&format!(
            "SELECT {} FROM metrics WHERE uid = ?",
            METRIC_COLUMNS
        ))
        .bind(uid.to_string())
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to query metric uid={}", uid))?;

        row.map(MetricRow::into_metric).transpose()
    }

    async fn get_metric_by_name(&self, datasource: &str, name: &str) -> Result<Option<Metric>> {
        let row: Option<MetricRow> = sqlx::query_as(&format!(
            "SELECT {} FROM metrics WHERE datasource = ? AND name = ?",
            METRIC_COLUMNS
        ))
        .bind(datasource)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .with_context(|| format!("Failed to query metric name='{}'", name))?;

        row.map(MetricRow::into_metric).transpose()
    }

    async fn list_metrics(
        &self,
        datasource: &str,
        status: Option<MetricStatus>,
    ) -> Result<Vec<Metric>> {
        let rows: Vec<MetricRow> = sqlx::query_as(&format!(
            r#"
            SELECT {} FROM metrics
            WHERE datasource = ?1 AND (?2 IS NULL OR status = ?2)
            ORDER BY name ASC
            "#,
            METRIC_COLUMNS
        ))
        .bind(datasource)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(&self.pool)
        .await
        .context("Failed to list metrics")?;

        rows.into_iter().map(MetricRow::into_metric).collect()
    }

    async fn transition_metric(&self, uid: &Uuid, transition: &MetricTransition) -> Result<bool> {
        let mut builder = QueryBuilder::<Sqlite>::new("UPDATE metrics SET status = ");
        builder.push_bind(transition.to.as_str());

        let assignments = [
            ("parameters", json_assignment(&transition.parameters)?),
            ("model_params", json_assignment(&transition.model_params)?),
            ("server", text_assignment(&transition.server)),
            ("message", text_assignment(&transition.message)),
        ];
        for (column, value) in assignments {
            if let Some(value) = value {
                builder.push(", ").push(column).push(" = ").push_bind(value);
            }
        }

        builder.push(" WHERE uid = ").push_bind(uid.to_string());
        if !transition.allowed_from.is_empty() {
            builder.push(" AND status IN (");
            let mut separated = builder.separated(", ");
            for status in &transition.allowed_from {
                separated.push_bind(status.as_str());
            }
            separated.push_unseparated(")");
        }

        let result = builder
            .build()
            .execute(&self.pool)
            .await
            .with_context(|| format!("Failed to update metric uid={}", uid))?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_metric(&self, uid: &Uuid) -> Result<bool> {
        let uid = uid.to_string();
        let mut transaction = self.pool.begin().await?;

        sqlx::query("DELETE FROM metric_data WHERE uid = ?")
            .bind(&uid)
            .execute(&mut *transaction)
            .await
            .context("Failed to delete metric data")?;

        let deleted = sqlx::query("DELETE FROM metrics WHERE uid = ?")
            .bind(&uid)
            .execute(&mut *transaction)
            .await
            .context("Failed to delete metric")?
            .rows_affected();

        transaction.commit().await?;
        Ok(deleted > 0)
    }

    async fn add_data_points(&self, uid: &Uuid, points: &[MetricDataPoint]) -> Result<()> {
        if points.is_empty() {
            return Ok(());
        }

        let uid = uid.to_string();
        let mut transaction = self.pool.begin().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT 1 FROM metrics WHERE uid = ?")
            .bind(&uid)
            .fetch_optional(&mut *transaction)
            .await?;
        if exists.is_none() {
            bail!("Cannot add data points: metric uid={} does not exist", uid);
        }

        for chunk in points.chunks(DATA_POINTS_INSERT_CHUNK) {
            let mut builder =
                QueryBuilder::<Sqlite>::new("INSERT INTO metric_data (uid, ts_micros, metric_value) ");
            builder.push_values(chunk, |mut row, point| {
                row.push_bind(uid.clone())
                    .push_bind(datetime_to_micros(&point.timestamp))
                    .push_bind(point.value);
            });
            builder
                .build()
                .execute(&mut *transaction)
                .await
                .context("Failed to insert data points")?;
        }

        transaction.commit().await?;
        Ok(())
    }

    async fn query_data_point_count(&self, uid: &Uuid) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM metric_data WHERE uid = ?")
            .bind(uid.to_string())
            .fetch_one(&self.pool)
            .await
            .context("Failed to count data points")?;

        Ok(count.max(0) as u64)
    }

    async fn query_data_points(&self, uid: &Uuid) -> Result<Vec<MetricDataPoint>> {
        let rows: Vec<DataPointRow> = sqlx::query_as(
            r#"
            SELECT metric_value, ts_micros FROM metric_data
            WHERE uid = ?
            ORDER BY ts_micros ASC, id ASC
            "#,
        )
        .bind(uid.to_string())
        .fetch_all(&self.pool)
        .await
        .context("Failed to query data points")?;

        Ok(rows.into_iter().map(MetricDataPoint::from).collect())
    }

    async fn query_data_statistics(&self, uid: &Uuid) -> Result<Option<DataStatistics>> {
        let row: StatisticsRow = sqlx::query_as(
            r#"
            SELECT COUNT(*) AS row_count, MIN(metric_value) AS min_value, MAX(metric_value) AS max_value
            FROM metric_data
            WHERE uid = ?
            "#,
        )
        .bind(uid.to_string())
        .fetch_one(&self.pool)
        .await
        .context("Failed to query data statistics")?;

        Ok(match (row.min_value, row.max_value) {
            (Some(min), Some(max)) if row.row_count > 0 => Some(DataStatistics {
                count: row.row_count as u64,
                min,
                max,
            }),
            _ => None,
        })
    }

    #[cfg(any(test, feature = "test-utils"))]
    async fn cleanup_test_data(&self) -> Result<()> {
        let mut transaction = self.pool.begin().await?;
        sqlx::query("DELETE FROM metric_data")
            .execute(&mut *transaction)
            .await?;
        sqlx::query("DELETE FROM metrics")
            .execute(&mut *transaction)
            .await?;
        transaction.commit().await?;
        Ok(())
    }
}
