//! 本地键值存储
//!
//! 进度与主题都以字符串形式保存在一个键值存储中：
//! - `FileStore`：应用数据目录下的 JSON 文件，可设置容量上限
//! - `MemoryStore`：内存实现，测试使用

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use thiserror::Error;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Storage quota exceeded")]
    QuotaExceeded,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid progress format: {0}")]
    InvalidFormat(String),

    #[error("Unsupported progress version: {0}")]
    UnsupportedVersion(u32),

    #[error("Storage lock poisoned")]
    LockError,
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// KeyValueStore
// ============================================================

/// 字符串键值存储
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> StorageResult<Option<String>>;

    fn set(&self, key: &str, value: &str) -> StorageResult<()>;

    fn remove(&self, key: &str) -> StorageResult<()>;
}

/// 所有键和值占用的字节数
fn used_bytes(entries: &HashMap<String, String>) -> usize {
    entries.iter().map(|(k, v)| k.len() + v.len()).sum()
}

fn check_quota(entries: &HashMap<String, String>, quota: Option<usize>) -> StorageResult<()> {
    match quota {
        Some(limit) if used_bytes(entries) > limit => Err(StorageError::QuotaExceeded),
        _ => Ok(()),
    }
}

// ============================================================
// MemoryStore
// ============================================================

#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_quota(quota: usize) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            quota: Some(quota),
        }
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let entries = self.entries.lock().map_err(|_| StorageError::LockError)?;
        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockError)?;
        let mut next = entries.clone();
        next.insert(key.to_string(), value.to_string());
        check_quota(&next, self.quota)?;
        *entries = next;
        Ok(())
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let mut entries = self.entries.lock().map_err(|_| StorageError::LockError)?;
        entries.remove(key);
        Ok(())
    }
}

// ============================================================
// FileStore
// ============================================================

/// JSON 文件存储，整个文件是一个字符串到字符串的对象
pub struct FileStore {
    path: PathBuf,
    quota: Option<usize>,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new<P: AsRef<Path>>(path: P, quota: Option<usize>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            quota,
            lock: Mutex::new(()),
        }
    }

    fn read_entries(&self) -> StorageResult<HashMap<String, String>> {
        match fs::read_to_string(&self.path) {
            Ok(raw) if raw.trim().is_empty() => Ok(HashMap::new()),
            Ok(raw) => Ok(serde_json::from_str(&raw)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(HashMap::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// 写入前读取现有内容，文件损坏时从空内容开始
    fn read_entries_for_write(&self) -> HashMap<String, String> {
        self.read_entries().unwrap_or_else(|e| {
            log::warn!("Store file {} unreadable, starting fresh: {}", self.path.display(), e);
            HashMap::new()
        })
    }

    /// 先写临时文件再重命名
    fn write_entries(&self, entries: &HashMap<String, String>) -> StorageResult<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent)?;
            }
        }

        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> StorageResult<Option<String>> {
        let _guard = self.lock.lock().map_err(|_| StorageError::LockError)?;
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::LockError)?;
        let mut entries = self.read_entries_for_write();
        entries.insert(key.to_string(), value.to_string());
        check_quota(&entries, self.quota)?;
        self.write_entries(&entries)
    }

    fn remove(&self, key: &str) -> StorageResult<()> {
        let _guard = self.lock.lock().map_err(|_| StorageError::LockError)?;
        match self.read_entries() {
            Ok(mut entries) => {
                if entries.remove(key).is_some() {
                    self.write_entries(&entries)?;
                }
                Ok(())
            }
            Err(e) => {
                log::warn!("Resetting unreadable store file {}: {}", self.path.display(), e);
                self.write_entries(&HashMap::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_roundtrip() {
        let store = MemoryStore::new();
        assert_eq!(store.get("k").unwrap(), None);
        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }

    #[test]
    fn test_memory_store_quota() {
        let store = MemoryStore::with_quota(10);
        store.set("k", "12345").unwrap();
        assert!(matches!(store.set("k", "12345678901"), Err(StorageError::QuotaExceeded)));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("12345"));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("store.json");

        let store = FileStore::new(&path, None);
        store.set("a", "1").unwrap();
        store.set("b", "2").unwrap();

        let reopened = FileStore::new(&path, None);
        assert_eq!(reopened.get("a").unwrap().as_deref(), Some("1"));
        reopened.remove("a").unwrap();
        assert_eq!(store.get("a").unwrap(), None);
        assert_eq!(store.get("b").unwrap().as_deref(), Some("2"));
    }

    #[test]
    fn test_file_store_quota() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("store.json"), Some(8));
        store.set("k", "1234").unwrap();
        assert!(matches!(store.set("k", "123456789"), Err(StorageError::QuotaExceeded)));
        assert_eq!(store.get("k").unwrap().as_deref(), Some("1234"));
    }

    #[test]
    fn test_file_store_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "not json").unwrap();

        let store = FileStore::new(&path, None);
        assert!(matches!(store.get("k"), Err(StorageError::Serialization(_))));

        store.set("k", "v").unwrap();
        assert_eq!(store.get("k").unwrap().as_deref(), Some("v"));
    }

    #[test]
    fn test_file_store_remove_resets_corrupt_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("store.json");
        fs::write(&path, "{ broken").unwrap();

        let store = FileStore::new(&path, None);
        store.remove("k").unwrap();
        assert_eq!(store.get("k").unwrap(), None);
    }
}
