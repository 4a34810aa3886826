// 应用状态

use crate::services::{EngineHandle, PracticeService, SqlEngine, ThemeStore};
use std::sync::Arc;

/// 由 Tauri 管理的共享状态
pub struct PracticeState {
    pub engine: EngineHandle,
    pub practice: PracticeService,
    pub theme: ThemeStore,
}

impl PracticeState {
    pub fn new(practice: PracticeService, theme: ThemeStore) -> Self {
        Self {
            engine: EngineHandle::default(),
            practice,
            theme,
        }
    }

    /// 获取引擎，首次调用时完成初始化
    pub async fn engine(&self) -> Result<Arc<SqlEngine>, String> {
        self.engine.get().await.map_err(|e| e.to_string())
    }
}
