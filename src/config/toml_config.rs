use crate::core::ConfigProvider;
use crate::domain::model::{TransportLimits, INT_MAX};
use crate::utils::error::{ChunkcastError, Result};
use crate::utils::validation::{
    validate_chunk_length, validate_positive_number, validate_range, Validate,
};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub group: GroupConfig,
    pub broadcast: BroadcastConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GroupConfig {
    pub ranks: usize,
    pub ceiling: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BroadcastConfig {
    pub data_size: usize,
    pub max_chunk_len: i64,
    pub root: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    pub json_logs: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ChunkcastError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ChunkcastError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${CHUNK_LEN})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ChunkcastError::ConfigValidationError {
            field: "env_substitution".to_string(),
            message: e.to_string(),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validate_positive_number("group.ranks", self.group.ranks, 1)?;
        self.limits()?;
        validate_range("broadcast.root", self.root(), 0, self.group.ranks - 1)?;
        validate_chunk_length(self.broadcast.max_chunk_len, self.ceiling())?;
        Ok(())
    }

    pub fn ceiling(&self) -> usize {
        self.group.ceiling.unwrap_or(INT_MAX)
    }

    pub fn limits(&self) -> Result<TransportLimits> {
        TransportLimits::new(self.ceiling())
    }

    pub fn root(&self) -> usize {
        self.broadcast.root.unwrap_or(0)
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
}

impl ConfigProvider for TomlConfig {
    fn ranks(&self) -> usize {
        self.group.ranks
    }

    fn root(&self) -> usize {
        self.root()
    }

    fn data_size(&self) -> usize {
        self.broadcast.data_size
    }

    fn max_chunk_len(&self) -> i64 {
        self.broadcast.max_chunk_len
    }

    fn count_ceiling(&self) -> usize {
        self.ceiling()
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
