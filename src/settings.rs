use std::path::PathBuf;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;

use crate::parser::vocab::Vocabulary;

const CONFIG_FILE: &str = "company_rows";
const ENV_PREFIX: &str = "COMPANY_ROWS";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LayoutSettings {
    /// Max distance in pixels between a detection's vertical centre and a
    /// row's running centre.
    pub y_tolerance: f64,
    pub iou_threshold: f64,
}

impl Default for LayoutSettings {
    fn default() -> Self {
        LayoutSettings {
            y_tolerance: 18.0,
            iou_threshold: 0.45,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BatchSettings {
    pub chunk_size: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        BatchSettings { chunk_size: 500 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub db_path: PathBuf,
    pub vocabulary: Vocabulary,
    pub layout: LayoutSettings,
    pub batch: BatchSettings,
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            db_path: PathBuf::from("data/company_rows.sqlite"),
            vocabulary: Vocabulary::default(),
            layout: LayoutSettings::default(),
            batch: BatchSettings::default(),
        }
    }
}

impl Settings {
    /// `company_rows.toml` (optional) overridden by `COMPANY_ROWS__*`
    /// environment variables, e.g. `COMPANY_ROWS__BATCH__CHUNK_SIZE=100`.
    pub fn load() -> Result<Self> {
        Self::from_config(
            Config::builder()
                .add_source(File::with_name(CONFIG_FILE).required(false))
                .add_source(Environment::with_prefix(ENV_PREFIX).separator("__")),
        )
    }

    fn from_config(
        builder: config::ConfigBuilder<config::builder::DefaultState>,
    ) -> Result<Self> {
        let settings = builder
            .build()
            .context("reading settings")?
            .try_deserialize::<Settings>()
            .context("parsing settings")?;
        if settings.batch.chunk_size == 0 {
            anyhow::bail!("batch.chunk_size must be at least 1");
        }
        Ok(settings)
    }
}
