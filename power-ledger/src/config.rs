use serde::Deserialize;
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::codec::DataFormat;

const CONFIG_ENV: &str = "POWER_LEDGER_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "power-ledger.toml";

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the persisted store document.
    pub dir: PathBuf,
    /// Storage key the whole store is saved under.
    pub key: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("power-ledger-data"),
            key: "datacenterPowerData".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub title: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            title: "Datacenter Power Report".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    pub file_stem: String,
    pub pretty_json: bool,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            file_stem: "datacenter_power_data".to_string(),
            pretty_json: true,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub report: ReportConfig,
    pub export: ExportConfig,
}

impl AppConfig {
    /// Load from `$POWER_LEDGER_CONFIG`, else `power-ledger.toml` if present,
    /// else built-in defaults.
    pub fn load() -> anyhow::Result<Self> {
        use std::env;

        match env::var(CONFIG_ENV) {
            Ok(path) => Self::from_file(path),
            Err(_) if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            Err(_) => Ok(Self::default()),
        }
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let contents = fs::read_to_string(path.as_ref())?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> anyhow::Result<Self> {
        let cfg: AppConfig = toml::from_str(contents)?;
        Ok(cfg)
    }

    pub fn export_file_name(&self, format: DataFormat) -> String {
        format!("{}.{}", self.export.file_stem, format.extension())
    }
}
