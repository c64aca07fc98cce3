use anyhow::Error;
use confique::Config;
use std::sync::{Arc, OnceLock};

use crate::lifecycle::{EncoderSettings, LifecycleSettings};
use crate::spec::ValidationSchemas;

#[derive(Debug, Config)]
pub struct MonitorConfig {
    #[config(
        env = "METRICMON_STORAGE_CONNECTION_STRING",
        default = "sqlite://metricmon.db"
    )]
    pub storage_connection_string: String,

    /// Datasource owning the metrics managed by this instance.
    #[config(env = "METRICMON_DATASOURCE", default = "custom")]
    pub datasource: String,

    #[config(env = "METRICMON_MODEL_CREATION_RECORD_THRESHOLD", default = 1000)]
    pub model_creation_record_threshold: u64,

    #[config(env = "METRICMON_ENCODER_NUM_BUCKETS", default = 130)]
    pub encoder_num_buckets: u32,

    #[config(env = "METRICMON_DEFAULT_MIN_RESOLUTION", default = 0.001)]
    pub default_min_resolution: f64,

    #[config(env = "METRICMON_SENTRY_DSN")]
    pub sentry_dsn: Option<String>,
}

impl MonitorConfig {
    pub fn load() -> Result<MonitorConfig, Error> {
        let c = MonitorConfig::builder()
            .env()
            .file("settings.toml")
            .load()?;

        if c.encoder_num_buckets == 0 {
            anyhow::bail!("encoder_num_buckets must be greater than zero");
        }
        if !(c.default_min_resolution.is_finite() && c.default_min_resolution >= 0.0) {
            anyhow::bail!("default_min_resolution must be a non-negative number");
        }

        Ok(c)
    }

    pub fn lifecycle_settings(&self) -> LifecycleSettings {
        LifecycleSettings {
            model_creation_record_threshold: self.model_creation_record_threshold,
            encoder: EncoderSettings {
                num_buckets: self.encoder_num_buckets,
                default_min_resolution: self.default_min_resolution,
            },
            schemas: ValidationSchemas::default(),
        }
    }
}

static METRICMON_CONFIG: OnceLock<Arc<MonitorConfig>> = OnceLock::new();

pub fn get() -> Result<Arc<MonitorConfig>, Error> {
    METRICMON_CONFIG.get().cloned().ok_or_else(|| {
        Error::msg(
            "Configuration not loaded. Please call load_configuration() before using the configuration",
        )
    })
}

pub fn load_configuration() -> Result<(), Error> {
    if METRICMON_CONFIG.get().is_some() {
        return Ok(());
    }

    let config = MonitorConfig::load()?;
    METRICMON_CONFIG.get_or_init(|| Arc::new(config));

    Ok(())
}
