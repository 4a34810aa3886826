// 主题偏好

use crate::models::Theme;
use crate::services::storage::KeyValueStore;
use std::sync::Arc;

pub const THEME_KEY: &str = "sql_practice_theme";

#[derive(Clone)]
pub struct ThemeStore {
    store: Arc<dyn KeyValueStore>,
}

impl ThemeStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// 读取主题，缺失、无效或读取失败时为浅色
    pub fn load(&self) -> Theme {
        match self.store.get(THEME_KEY) {
            Ok(Some(value)) => Theme::parse(&value).unwrap_or_default(),
            Ok(None) => Theme::default(),
            Err(e) => {
                log::warn!("Failed to read theme: {}", e);
                Theme::default()
            }
        }
    }

    /// 写入失败只记录日志
    pub fn save(&self, theme: Theme) {
        if let Err(e) = self.store.set(THEME_KEY, theme.as_str()) {
            log::warn!("Failed to save theme: {}", e);
        }
    }

    pub fn toggle(&self) -> Theme {
        let next = self.load().toggled();
        self.save(next);
        next
    }
}
