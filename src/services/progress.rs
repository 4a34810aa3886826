// 学习进度服务模块
// 进度以一条带版本号的 JSON 记录保存，读取时校验结构，损坏时恢复默认值

use crate::models::{Progress, PROGRESS_VERSION};
use crate::services::storage::{KeyValueStore, StorageError, StorageResult};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// 进度记录的存储键
pub const PROGRESS_KEY: &str = "sql_practice_progress";

/// 保存结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaveOutcome {
    Saved,
    /// 空间不足，丢弃了已保存的查询文本后写入成功
    SavedWithoutQueries,
}

/// 解析并校验进度记录
pub fn parse_progress(raw: &str) -> StorageResult<Progress> {
    let value: serde_json::Value = serde_json::from_str(raw)?;
    if !value.is_object() {
        return Err(StorageError::InvalidFormat("expected a JSON object".into()));
    }

    let progress: Progress = serde_json::from_value(value)
        .map_err(|e| StorageError::InvalidFormat(e.to_string()))?;
    if progress.version > PROGRESS_VERSION {
        return Err(StorageError::UnsupportedVersion(progress.version));
    }

    Ok(Progress {
        version: PROGRESS_VERSION,
        ..progress
    })
}

/// 学习进度存储
#[derive(Clone)]
pub struct ProgressStore {
    store: Arc<dyn KeyValueStore>,
    /// 串行化读改写，避免并发命令互相覆盖
    write_lock: Arc<Mutex<()>>,
}

impl ProgressStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            store,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// 读取进度，缺失或损坏时返回默认记录
    pub fn load(&self) -> Progress {
        let raw = match self.store.get(PROGRESS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Progress::default(),
            Err(e) => {
                log::warn!("Failed to load progress: {}", e);
                self.clear_corrupted();
                return Progress::default();
            }
        };

        match parse_progress(&raw) {
            Ok(progress) => progress,
            Err(e) => {
                log::warn!("Discarding corrupted progress: {}", e);
                self.clear_corrupted();
                Progress::default()
            }
        }
    }

    fn clear_corrupted(&self) {
        if let Err(e) = self.store.remove(PROGRESS_KEY) {
            log::error!("Failed to clear corrupted progress: {}", e);
        }
    }

    /// 写入进度，空间不足时丢弃查询文本重试一次
    pub fn save(&self, progress: &Progress) -> StorageResult<SaveOutcome> {
        let raw = serde_json::to_string(progress)?;
        match self.store.set(PROGRESS_KEY, &raw) {
            Ok(()) => Ok(SaveOutcome::Saved),
            Err(StorageError::QuotaExceeded) => {
                log::warn!("Storage quota exceeded, dropping saved queries");
                let trimmed = Progress {
                    saved_queries: Default::default(),
                    ..progress.clone()
                };
                self.store
                    .set(PROGRESS_KEY, &serde_json::to_string(&trimmed)?)?;
                Ok(SaveOutcome::SavedWithoutQueries)
            }
            Err(e) => Err(e),
        }
    }

    // ==================== 读改写操作 ====================

    /// 在写锁内读取、修改并写回；`apply` 返回 false 时不写入
    fn update<F>(&self, apply: F) -> StorageResult<SaveOutcome>
    where
        F: FnOnce(&mut Progress) -> bool,
    {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockError)?;
        let mut progress = self.load();
        if apply(&mut progress) {
            self.save(&progress)
        } else {
            Ok(SaveOutcome::Saved)
        }
    }

    /// 标记题目完成，已完成时不写入
    pub fn mark_complete(&self, question_id: u32) -> StorageResult<SaveOutcome> {
        self.update(|progress| progress.mark_complete(question_id))
    }

    pub fn set_current_question(&self, question_id: u32) -> StorageResult<SaveOutcome> {
        self.update(|progress| {
            progress.current_question = question_id;
            true
        })
    }

    /// 保存题目的查询文本（去掉首尾空白）
    pub fn save_query(&self, question_id: u32, query: &str) -> StorageResult<SaveOutcome> {
        self.update(|progress| {
            progress
                .saved_queries
                .insert(question_id.to_string(), query.trim().to_string());
            true
        })
    }

    /// 已保存的查询文本，没有时返回空串
    pub fn saved_query(&self, question_id: u32) -> String {
        self.load()
            .saved_query(question_id)
            .unwrap_or_default()
            .to_string()
    }

    pub fn is_complete(&self, question_id: u32) -> bool {
        self.load().is_complete(question_id)
    }

    pub fn reset(&self) -> StorageResult<()> {
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockError)?;
        self.store.remove(PROGRESS_KEY)
    }

    // ==================== 备份与恢复 ====================

    /// 导出为格式化 JSON
    pub fn export(&self) -> StorageResult<String> {
        Ok(serde_json::to_string_pretty(&self.load())?)
    }

    /// 校验后覆盖现有进度
    pub fn import(&self, raw: &str) -> StorageResult<SaveOutcome> {
        let progress = parse_progress(raw)?;
        let _guard = self.write_lock.lock().map_err(|_| StorageError::LockError)?;
        self.save(&progress)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::storage::MemoryStore;
    use std::collections::BTreeMap;

    fn setup() -> (Arc<MemoryStore>, ProgressStore) {
        let store = Arc::new(MemoryStore::new());
        let progress = ProgressStore::new(store.clone());
        (store, progress)
    }

    #[test]
    fn test_default_when_missing() {
        let (_, progress) = setup();
        assert_eq!(progress.load(), Progress::default());
    }

    #[test]
    fn test_load_saved_progress() {
        let (store, progress) = setup();
        store
            .set(
                PROGRESS_KEY,
                r#"{"currentQuestion":5,"completedQuestions":["1","2","3"],"savedQueries":{"1":"SELECT * FROM users"}}"#,
            )
            .unwrap();

        let loaded = progress.load();
        assert_eq!(loaded.current_question, 5);
        assert_eq!(loaded.completed_questions, vec!["1", "2", "3"]);
        assert_eq!(loaded.saved_query(1), Some("SELECT * FROM users"));
    }

    #[test]
    fn test_corrupted_data_resets() {
        for raw in [
            "corrupted data",
            r#"{"currentQuestion":5}"#,
            r#"["array"]"#,
            r#"{"completedQuestions":"x","savedQueries":{}}"#,
            r#"{"version":99,"completedQuestions":[],"savedQueries":{}}"#,
        ] {
            let (store, progress) = setup();
            store.set(PROGRESS_KEY, raw).unwrap();
            assert_eq!(progress.load(), Progress::default(), "{raw}");
            assert_eq!(store.get(PROGRESS_KEY).unwrap(), None, "{raw}");
        }
    }

    #[test]
    fn test_save_writes_versioned_record() {
        let (store, progress) = setup();
        progress.set_current_question(4).unwrap();

        let raw = store.get(PROGRESS_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["version"], 1);
        assert_eq!(value["currentQuestion"], 4);
    }

    #[test]
    fn test_save_query_trims() {
        let (_, progress) = setup();
        progress.save_query(1, "  SELECT * FROM users  ").unwrap();
        assert_eq!(progress.saved_query(1), "SELECT * FROM users");
        assert_eq!(progress.saved_query(999), "");
    }

    #[test]
    fn test_mark_complete_idempotent() {
        let (_, progress) = setup();
        progress.mark_complete(1).unwrap();
        progress.mark_complete(1).unwrap();
        progress.mark_complete(2).unwrap();

        assert_eq!(progress.load().completed_questions, vec!["1", "2"]);
        assert!(progress.is_complete(1));
        assert!(!progress.is_complete(3));
    }

    #[test]
    fn test_concurrent_updates_keep_every_change() {
        let (_, progress) = setup();
        let handles: Vec<_> = (1..=16u32)
            .map(|id| {
                let progress = progress.clone();
                std::thread::spawn(move || {
                    progress.mark_complete(id).unwrap();
                    progress.save_query(id, "SELECT 1").unwrap();
                    progress.set_current_question(id).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let loaded = progress.load();
        assert_eq!(loaded.completed_questions.len(), 16);
        assert_eq!(loaded.saved_queries.len(), 16);
        assert!((1..=16).all(|id| loaded.is_complete(id)));
    }

    #[test]
    fn test_lenient_shapes_keep_completion() {
        for raw in [
            r#"{"currentQuestion":2.5,"completedQuestions":["1"],"savedQueries":{}}"#,
            r#"{"currentQuestion":-1,"completedQuestions":["1"],"savedQueries":{}}"#,
            r#"{"completedQuestions":["1"],"savedQueries":null}"#,
            r#"{"completedQuestions":["1"],"savedQueries":{"1":5}}"#,
        ] {
            let (store, progress) = setup();
            store.set(PROGRESS_KEY, raw).unwrap();
            let loaded = progress.load();
            assert!(loaded.is_complete(1), "{raw}");
            assert_eq!(loaded.current_question, 0, "{raw}");
            assert!(loaded.saved_queries.is_empty(), "{raw}");
            assert!(store.get(PROGRESS_KEY).unwrap().is_some(), "{raw}");
        }
    }

    #[test]
    fn test_reset() {
        let (store, progress) = setup();
        progress.mark_complete(1).unwrap();
        progress.reset().unwrap();
        assert_eq!(store.get(PROGRESS_KEY).unwrap(), None);
        assert!(!progress.is_complete(1));
    }

    #[test]
    fn test_quota_drops_saved_queries() {
        let store = Arc::new(MemoryStore::with_quota(160));
        let progress = ProgressStore::new(store.clone());
        progress.mark_complete(1).unwrap();

        let outcome = progress.save_query(1, &"x".repeat(200)).unwrap();
        assert_eq!(outcome, SaveOutcome::SavedWithoutQueries);

        let loaded = progress.load();
        assert!(loaded.saved_queries.is_empty());
        assert!(loaded.is_complete(1));
    }

    #[test]
    fn test_quota_retry_failure_propagates() {
        let store = Arc::new(MemoryStore::with_quota(10));
        let progress = ProgressStore::new(store);
        assert!(matches!(
            progress.mark_complete(1),
            Err(StorageError::QuotaExceeded)
        ));
    }

    #[test]
    fn test_export_import_roundtrip() {
        let (_, source) = setup();
        source.mark_complete(3).unwrap();
        source.mark_complete(1).unwrap();
        source.save_query(3, "SELECT name FROM doctors").unwrap();
        source.set_current_question(3).unwrap();
        let exported = source.export().unwrap();

        let (_, target) = setup();
        target.import(&exported).unwrap();
        assert_eq!(target.load(), source.load());
        assert_eq!(target.export().unwrap(), exported);
    }

    #[test]
    fn test_import_legacy_numeric_ids() {
        let (_, progress) = setup();
        progress
            .import(r#"{"currentQuestion":5,"completedQuestions":[1,2],"savedQueries":{"1":"SELECT *"}}"#)
            .unwrap();

        let loaded = progress.load();
        assert_eq!(loaded.completed_questions, vec!["1", "2"]);
        assert_eq!(
            loaded.saved_queries,
            BTreeMap::from([("1".to_string(), "SELECT *".to_string())])
        );
    }

    #[test]
    fn test_import_rejects_invalid() {
        let (_, progress) = setup();
        progress.mark_complete(7).unwrap();

        assert!(matches!(progress.import("invalid json"), Err(StorageError::Serialization(_))));
        assert!(matches!(
            progress.import(r#"{"currentQuestion":5}"#),
            Err(StorageError::InvalidFormat(_))
        ));
        assert!(matches!(
            progress.import(r#"["array"]"#),
            Err(StorageError::InvalidFormat(_))
        ));
        assert!(progress.is_complete(7));
    }
}
