use super::activation::{activation_status, decide_activation};
use super::error::{MonitorError, MonitorResult};
use super::export::ExportSpec;
use super::model_params::{LifecycleSettings, synthesize_model_params};
use crate::bus::{EventBus, ModelCommand};
use crate::datamodel::{Metric, MetricDataPoint, MetricStatus, NewMetric};
use crate::spec::{ModelSpec, ValidationError, validate_model_spec};
use crate::storage::{
    Assign, DataStatistics, InsertMetricOutcome, MetricTransition, StorageInstance,
};
use anyhow::anyhow;
use serde_json::Value as JsonValue;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Statuses a metric can be unmonitored from.
const MONITORED_STATUSES: [MetricStatus; 4] = [
    MetricStatus::PendingData,
    MetricStatus::CreatePending,
    MetricStatus::Active,
    MetricStatus::Error,
];

/// Result reported by the model-builder worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModelBuildOutcome {
    Succeeded,
    Failed(String),
}

/// Owns the status of every metric of one datasource.
///
/// There is no in-process lock: each transition is a single conditional update
/// in the registry, so concurrent callers on the same metric cannot both win.
#[derive(Debug, Clone)]
pub struct MetricLifecycleController {
    datasource: String,
    storage: Arc<dyn StorageInstance>,
    settings: Arc<LifecycleSettings>,
    bus: Arc<EventBus>,
}

impl MetricLifecycleController {
    pub fn new(
        datasource: impl Into<String>,
        storage: Arc<dyn StorageInstance>,
        settings: Arc<LifecycleSettings>,
        bus: Arc<EventBus>,
    ) -> Self {
        Self {
            datasource: datasource.into(),
            storage,
            settings,
            bus,
        }
    }

    pub fn datasource(&self) -> &str {
        &self.datasource
    }

    pub fn settings(&self) -> &LifecycleSettings {
        &self.settings
    }

    pub fn bus(&self) -> &Arc<EventBus> {
        &self.bus
    }

    pub async fn create_metric(&self, name: &str) -> MonitorResult<Uuid> {
        if name.is_empty() {
            return Err(ValidationError::metric_spec_schema("metric name must not be empty").into());
        }

        let new_metric = NewMetric::new(self.datasource.clone(), name);
        match self.storage.insert_metric(&new_metric).await? {
            InsertMetricOutcome::Inserted(metric) => {
                info!("Created metric '{}' uid={}", metric.name, metric.uid);
                Ok(metric.uid)
            }
            InsertMetricOutcome::NameTaken { existing_uid } => {
                debug!("Metric '{}' already exists uid={}", name, existing_uid);
                Err(MonitorError::MetricAlreadyExists { uid: existing_uid })
            }
        }
    }

    /// Starts monitoring the metric named in the model spec. Returns the model id,
    /// which is the metric uid.
    pub async fn monitor_metric(&self, document: &JsonValue) -> MonitorResult<Uuid> {
        let spec = self.validate(document)?;
        let metric = self
            .storage
            .get_metric_by_name(&self.datasource, &spec.metric_spec.metric)
            .await?
            .ok_or_else(|| MonitorError::not_found(&spec.metric_spec.metric))?;

        if metric.status.is_monitored() {
            debug!(uid = %metric.uid, status = %metric.status, "Metric is already monitored");
            return Err(MonitorError::MetricAlreadyMonitored { uid: metric.uid });
        }

        let stats = self.storage.query_data_statistics(&metric.uid).await?;
        let count = stats.as_ref().map_or(0, |s| s.count);
        let status = decide_activation(
            &spec.mode,
            count,
            self.settings.model_creation_record_threshold,
        );
        let model_params = synthesize_model_params(&spec, stats.as_ref(), &self.settings.encoder)?;
        let server = match &spec.metric_spec.resource {
            Some(resource) => Assign::Set(resource.clone()),
            None => Assign::Clear,
        };

        let transition = MetricTransition::new(&[MetricStatus::Unmonitored], status)
            .parameters(Assign::Set(document.clone()))
            .model_params(Assign::Set(model_params))
            .server(server)
            .message(Assign::Clear);

        if !self.storage.transition_metric(&metric.uid, &transition).await? {
            // Lost a race with another caller: report what happened to the row.
            return match self.storage.get_metric(&metric.uid).await? {
                Some(current) => Err(MonitorError::MetricAlreadyMonitored { uid: current.uid }),
                None => Err(MonitorError::not_found(&spec.metric_spec.metric)),
            };
        }

        info!(
            "Monitoring metric '{}' uid={} status={} rows={}",
            metric.name, metric.uid, status, count
        );
        if status == MetricStatus::CreatePending {
            self.bus.publish(ModelCommand::CreateModel { uid: metric.uid });
        } else {
            // Rows ingested while the metric was still unmonitored skipped the
            // threshold check.
            self.recheck_threshold(&metric.uid).await?;
        }

        Ok(metric.uid)
    }

    /// Resets a metric to `UNMONITORED` and cancels its model.
    pub async fn unmonitor_metric(&self, uid: &Uuid) -> MonitorResult<()> {
        let metric = self.require_metric(uid).await?;
        if metric.status == MetricStatus::Unmonitored {
            debug!("Metric uid={} is not monitored, nothing to do", uid);
            return Ok(());
        }

        let transition = MetricTransition::new(&MONITORED_STATUSES, MetricStatus::Unmonitored)
            .parameters(Assign::Clear)
            .model_params(Assign::Clear)
            .server(Assign::Clear)
            .message(Assign::Clear);

        if !self.storage.transition_metric(uid, &transition).await? {
            // Only a concurrent unmonitor or delete can get here.
            return match self.storage.get_metric(uid).await? {
                Some(_) => Ok(()),
                None => Err(MonitorError::not_found(uid)),
            };
        }

        info!("Unmonitored metric '{}' uid={}", metric.name, uid);
        self.bus.publish(ModelCommand::DeleteModel { uid: *uid });
        Ok(())
    }

    /// Removes the metric and its data. Unknown names are not an error.
    pub async fn delete_metric_by_name(&self, name: &str) -> MonitorResult<()> {
        let Some(metric) = self
            .storage
            .get_metric_by_name(&self.datasource, name)
            .await?
        else {
            debug!("Metric '{}' does not exist, nothing to delete", name);
            return Ok(());
        };

        if self.storage.delete_metric(&metric.uid).await? {
            info!("Deleted metric '{}' uid={}", name, metric.uid);
            if metric.status.is_monitored() {
                self.bus.publish(ModelCommand::DeleteModel { uid: metric.uid });
            }
        }
        Ok(())
    }

    /// Requests a model for a `PENDING_DATA` metric without waiting for the
    /// record threshold.
    pub async fn activate_model(&self, uid: &Uuid) -> MonitorResult<()> {
        let metric = self.require_metric(uid).await?;
        if metric.status != MetricStatus::PendingData {
            return Err(MonitorError::invalid_state(
                *uid,
                metric.status,
                "only metrics waiting for data can be activated",
            ));
        }

        let Some(stats) = self.storage.query_data_statistics(uid).await? else {
            return Err(MonitorError::invalid_state(
                *uid,
                metric.status,
                "no data points to build a model from",
            ));
        };

        if !self.request_model(&metric, &stats).await? {
            let status = self.require_metric(uid).await?.status;
            return Err(MonitorError::invalid_state(
                *uid,
                status,
                "metric left the pending data state",
            ));
        }
        Ok(())
    }

    /// Appends data points and requests a model once a waiting metric has
    /// enough history.
    pub async fn add_data_points(&self, uid: &Uuid, points: &[MetricDataPoint]) -> MonitorResult<()> {
        check_data_points(points)?;
        self.require_metric(uid).await?;
        self.storage.add_data_points(uid, points).await?;
        debug!("Added {} data points to metric uid={}", points.len(), uid);

        self.recheck_threshold(uid).await
    }

    /// Metrics waiting for the model-builder worker.
    pub async fn pending_model_requests(&self) -> MonitorResult<Vec<Metric>> {
        Ok(self
            .storage
            .list_metrics(&self.datasource, Some(MetricStatus::CreatePending))
            .await?)
    }

    /// Records the worker's result. Returns `false` when the request was
    /// cancelled meanwhile, in which case the worker must discard the model.
    pub async fn complete_model_build(
        &self,
        uid: &Uuid,
        outcome: ModelBuildOutcome,
    ) -> MonitorResult<bool> {
        match self.storage.get_metric(uid).await? {
            Some(metric) if metric.datasource != self.datasource => {
                return Err(MonitorError::not_found(uid));
            }
            Some(_) => {}
            None => {
                debug!("Model request for metric uid={} was cancelled", uid);
                return Ok(false);
            }
        }

        let transition = match &outcome {
            ModelBuildOutcome::Succeeded => {
                MetricTransition::new(&[MetricStatus::CreatePending], MetricStatus::Active)
                    .message(Assign::Clear)
            }
            ModelBuildOutcome::Failed(message) => {
                MetricTransition::new(&[MetricStatus::CreatePending], MetricStatus::Error)
                    .message(Assign::Set(message.clone()))
            }
        };

        let applied = self.storage.transition_metric(uid, &transition).await?;
        match (&outcome, applied) {
            (ModelBuildOutcome::Succeeded, true) => info!("Model is active for metric uid={}", uid),
            (ModelBuildOutcome::Failed(message), true) => {
                warn!("Model creation failed for metric uid={}: {}", uid, message)
            }
            (_, false) => debug!("Model request for metric uid={} was cancelled", uid),
        }
        Ok(applied)
    }

    pub async fn export_model(&self, uid: &Uuid) -> MonitorResult<ExportSpec> {
        let metric = self.require_metric(uid).await?;
        let data = self.storage.query_data_points(uid).await?;

        let export = match &metric.parameters {
            Some(parameters) => ExportSpec::from_parameters(parameters, data).ok_or_else(|| {
                anyhow!("Stored parameters of metric uid={} are not a model spec", uid)
            })?,
            None => ExportSpec::unmonitored(&metric.datasource, &metric.name, data),
        };
        debug!(
            "Exported metric '{}' uid={} with {} data points",
            metric.name,
            uid,
            export.data.len()
        );
        Ok(export)
    }

    /// Recreates an exported metric. Nothing is left behind when a step fails.
    pub async fn import_model(&self, export: &ExportSpec) -> MonitorResult<Uuid> {
        if export.datasource != self.datasource {
            return Err(ValidationError::DatasourceMismatch {
                expected: self.datasource.clone(),
                found: export.datasource.clone(),
            }
            .into());
        }
        let name = export
            .metric_name()
            .ok_or_else(|| ValidationError::metric_spec_schema("missing field `metric`"))?;

        check_data_points(&export.data)?;

        let document = export.model_spec_document();
        if export.monitor {
            self.validate(&document)?;
        }

        let uid = self.create_metric(name).await?;
        if let Err(err) = self.load_import(&uid, export, &document).await {
            warn!("Import of metric '{}' failed, rolling back: {}", name, err);
            if let Err(cleanup_err) = self.storage.delete_metric(&uid).await {
                warn!("Failed to roll back metric uid={}: {:#}", uid, cleanup_err);
            }
            return Err(err);
        }

        info!(
            "Imported metric '{}' uid={} with {} data points",
            name,
            uid,
            export.data.len()
        );
        Ok(uid)
    }

    pub async fn get_metric(&self, uid: &Uuid) -> MonitorResult<Metric> {
        self.require_metric(uid).await
    }

    pub async fn get_metric_by_name(&self, name: &str) -> MonitorResult<Metric> {
        self.storage
            .get_metric_by_name(&self.datasource, name)
            .await?
            .ok_or_else(|| MonitorError::not_found(name))
    }

    pub async fn list_metrics(&self, status: Option<MetricStatus>) -> MonitorResult<Vec<Metric>> {
        Ok(self.storage.list_metrics(&self.datasource, status).await?)
    }

    pub async fn query_data_points(&self, uid: &Uuid) -> MonitorResult<Vec<MetricDataPoint>> {
        self.require_metric(uid).await?;
        Ok(self.storage.query_data_points(uid).await?)
    }

    fn validate(&self, document: &JsonValue) -> MonitorResult<ModelSpec> {
        let spec = validate_model_spec(document, &self.settings.schemas).inspect_err(|err| {
            debug!("Rejected model spec: {}", err);
        })?;
        if spec.datasource != self.datasource {
            return Err(ValidationError::DatasourceMismatch {
                expected: self.datasource.clone(),
                found: spec.datasource,
            }
            .into());
        }
        Ok(spec)
    }

    async fn require_metric(&self, uid: &Uuid) -> MonitorResult<Metric> {
        match self.storage.get_metric(uid).await? {
            Some(metric) if metric.datasource == self.datasource => Ok(metric),
            _ => Err(MonitorError::not_found(uid)),
        }
    }

    async fn recheck_threshold(&self, uid: &Uuid) -> MonitorResult<()> {
        let Some(stats) = self.storage.query_data_statistics(uid).await? else {
            return Ok(());
        };
        if activation_status(stats.count, self.settings.model_creation_record_threshold)
            != MetricStatus::CreatePending
        {
            return Ok(());
        }
        let metric = self.require_metric(uid).await?;
        if metric.status == MetricStatus::PendingData {
            self.request_model(&metric, &stats).await?;
        }
        Ok(())
    }

    /// `PENDING_DATA -> CREATE_PENDING`, with model params sized on the data.
    async fn request_model(&self, metric: &Metric, stats: &DataStatistics) -> MonitorResult<bool> {
        let parameters = metric.parameters.as_ref().ok_or_else(|| {
            MonitorError::invalid_state(metric.uid, metric.status, "metric has no model spec")
        })?;
        let spec = validate_model_spec(parameters, &self.settings.schemas)?;
        let model_params = synthesize_model_params(&spec, Some(stats), &self.settings.encoder)?;

        let transition =
            MetricTransition::new(&[MetricStatus::PendingData], MetricStatus::CreatePending)
                .model_params(Assign::Set(model_params));
        let applied = self.storage.transition_metric(&metric.uid, &transition).await?;
        if applied {
            info!(
                "Requested model for metric '{}' uid={} rows={}",
                metric.name, metric.uid, stats.count
            );
            self.bus.publish(ModelCommand::CreateModel { uid: metric.uid });
        }
        Ok(applied)
    }

    async fn load_import(
        &self,
        uid: &Uuid,
        export: &ExportSpec,
        document: &JsonValue,
    ) -> MonitorResult<()> {
        self.storage.add_data_points(uid, &export.data).await?;
        if export.monitor {
            self.monitor_metric(document).await?;
        }
        Ok(())
    }
}

fn check_data_points(points: &[MetricDataPoint]) -> MonitorResult<()> {
    match points.iter().position(|point| !point.value.is_finite()) {
        Some(index) => Err(MonitorError::InvalidDataPoint {
            index,
            value: points[index].value,
        }),
        None => Ok(()),
    }
}
