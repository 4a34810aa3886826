pub mod config;
pub mod logging;

use std::path::{Path, PathBuf};

pub use config::{AppConfig, ConfigError};
pub use logging::init_logging;

#[cfg(target_os = "macos")]
const PLATFORM: &str = "macos";

#[cfg(target_os = "windows")]
const PLATFORM: &str = "windows";

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
const PLATFORM: &str = "linux";

/// 无法从 Tauri 取得数据目录时使用的位置
pub fn fallback_data_dir() -> PathBuf {
    let home = std::env::var_os("HOME")
        .or_else(|| std::env::var_os("USERPROFILE"))
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    home.join(".local").join("share").join("sql-practice")
}

/// 键值存储文件
pub fn get_store_path(data_dir: &Path) -> PathBuf {
    data_dir.join("storage.json")
}

pub fn get_log_path(data_dir: &Path) -> PathBuf {
    data_dir.join("sql-practice.log")
}

pub fn get_platform() -> &'static str {
    PLATFORM
}
