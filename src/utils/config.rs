//! 应用配置
//!
//! 默认值可通过环境变量覆盖：
//! - `SQL_PRACTICE_DATA_DIR`：数据目录
//! - `SQL_PRACTICE_LOG`：日志级别（error/warn/info/debug/trace/off）
//! - `SQL_PRACTICE_QUOTA_BYTES`：本地存储容量上限，未设置则不限

use log::LevelFilter;
use std::path::PathBuf;
use thiserror::Error;

pub const ENV_DATA_DIR: &str = "SQL_PRACTICE_DATA_DIR";
pub const ENV_LOG_LEVEL: &str = "SQL_PRACTICE_LOG";
pub const ENV_QUOTA_BYTES: &str = "SQL_PRACTICE_QUOTA_BYTES";

#[derive(Error, Debug, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid log level in SQL_PRACTICE_LOG: {0}")]
    LogLevel(String),

    #[error("Invalid byte count in SQL_PRACTICE_QUOTA_BYTES: {0}")]
    Quota(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// 为空时使用 Tauri 提供的应用数据目录
    pub data_dir: Option<PathBuf>,
    pub log_level: LevelFilter,
    pub quota_bytes: Option<usize>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: None,
            log_level: LevelFilter::Info,
            quota_bytes: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR).filter(|v| !v.trim().is_empty()) {
            config.data_dir = Some(PathBuf::from(dir));
        }

        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            config.log_level = level
                .trim()
                .parse()
                .map_err(|_| ConfigError::LogLevel(level.clone()))?;
        }

        if let Some(quota) = lookup(ENV_QUOTA_BYTES) {
            let bytes = quota
                .trim()
                .parse::<usize>()
                .map_err(|_| ConfigError::Quota(quota.clone()))?;
            config.quota_bytes = Some(bytes);
        }

        Ok(config)
    }
}
