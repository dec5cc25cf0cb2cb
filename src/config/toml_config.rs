use crate::core::query::{
    FilterParameters, Variant, APPLICATIONS_INDEX, DEFAULT_SINCE_DATE, DEFAULT_UNTIL_DATE,
};
use crate::core::scroll::{ScrollSettings, DEFAULT_LEASE, DEFAULT_PAGE_SIZE};
use crate::core::ConfigProvider;
use crate::utils::error::{EtlError, Result};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Largest page the scroll API accepts by default (`index.max_result_window`).
const MAX_PAGE_SIZE: usize = 10_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub pipeline: PipelineConfig,
    pub source: SourceConfig,
    pub query: QueryConfig,
    pub scroll: Option<ScrollConfig>,
    pub load: LoadConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub endpoint: String,
    pub index: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub headers: Option<BTreeMap<String, String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    pub variant: Variant,
    pub threshold: u64,
    pub since_date: Option<String>,
    pub until_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScrollConfig {
    pub page_size: Option<usize>,
    pub lease_seconds: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoadConfig {
    pub output_path: String,
    pub output_formats: Vec<String>,
    pub compression: Option<CompressionConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompressionConfig {
    pub enabled: bool,
    pub filename: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(EtlError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| EtlError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${ES_API_KEY})；未設定的變數保持原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| EtlError::ConfigError {
            message: format!("Invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.json_logs)
            .unwrap_or(false)
    }

    fn index(&self) -> &str {
        self.source.index.as_deref().unwrap_or(APPLICATIONS_INDEX)
    }

    fn page_size(&self) -> usize {
        self.scroll
            .as_ref()
            .and_then(|s| s.page_size)
            .unwrap_or(DEFAULT_PAGE_SIZE)
    }

    fn lease(&self) -> Duration {
        self.scroll
            .as_ref()
            .and_then(|s| s.lease_seconds)
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_LEASE)
    }
}

impl ConfigProvider for TomlConfig {
    fn endpoint(&self) -> &str {
        &self.source.endpoint
    }

    fn headers(&self) -> Vec<(String, String)> {
        self.source
            .headers
            .iter()
            .flatten()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn timeout_seconds(&self) -> Option<u64> {
        self.source.timeout_seconds
    }

    fn variant(&self) -> Variant {
        self.query.variant
    }

    fn filter_parameters(&self) -> FilterParameters {
        FilterParameters::new(self.query.threshold)
            .since(
                self.query
                    .since_date
                    .as_deref()
                    .unwrap_or(DEFAULT_SINCE_DATE),
            )
            .until(
                self.query
                    .until_date
                    .as_deref()
                    .unwrap_or(DEFAULT_UNTIL_DATE),
            )
    }

    fn scroll_settings(&self) -> ScrollSettings {
        ScrollSettings {
            index: self.index().to_string(),
            page_size: self.page_size(),
            lease: self.lease(),
        }
    }

    fn output_path(&self) -> &str {
        &self.load.output_path
    }

    fn output_formats(&self) -> &[String] {
        &self.load.output_formats
    }

    fn zip_filename(&self) -> Option<&str> {
        let compression = self.load.compression.as_ref().filter(|c| c.enabled)?;
        Some(compression.filename.as_deref().unwrap_or("applications.zip"))
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_url("source.endpoint", &self.source.endpoint)?;
        validation::validate_non_empty_string("source.index", self.index())?;
        validation::validate_path("load.output_path", &self.load.output_path)?;
        validation::validate_output_formats("load.output_formats", &self.load.output_formats)?;
        validation::validate_range("scroll.page_size", self.page_size(), 1, MAX_PAGE_SIZE)?;
        validation::validate_timeout("source.timeout_seconds", self.source.timeout_seconds)?;
        for (name, value) in self.source.headers.iter().flatten() {
            validation::validate_header("source.headers", name, value)?;
        }

        if self.lease().as_secs() == 0 {
            return Err(EtlError::InvalidConfigValueError {
                field: "scroll.lease_seconds".to_string(),
                value: "0".to_string(),
                reason: "Lease must be at least one second".to_string(),
            });
        }

        if let Some(filename) = self.zip_filename() {
            validation::validate_path("load.compression.filename", filename)?;
        }

        Ok(())
    }
}
