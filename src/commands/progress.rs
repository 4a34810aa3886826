// 进度与偏好命令模块

use super::state::PracticeState;
use crate::models::{Progress, Theme};
use crate::services::SaveOutcome;
use tauri::State;

/// 读取进度
#[tauri::command]
pub async fn get_progress(state: State<'_, PracticeState>) -> Result<Progress, String> {
    Ok(state.practice.progress().load())
}

/// 标记完成
#[tauri::command]
pub async fn mark_question_complete(
    question_id: u32,
    state: State<'_, PracticeState>,
) -> Result<SaveOutcome, String> {
    state
        .practice
        .progress()
        .mark_complete(question_id)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn is_question_complete(
    question_id: u32,
    state: State<'_, PracticeState>,
) -> Result<bool, String> {
    Ok(state.practice.progress().is_complete(question_id))
}

/// 保存查询草稿
#[tauri::command]
pub async fn save_query(
    question_id: u32,
    query: String,
    state: State<'_, PracticeState>,
) -> Result<SaveOutcome, String> {
    state
        .practice
        .progress()
        .save_query(question_id, &query)
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub async fn get_saved_query(
    question_id: u32,
    state: State<'_, PracticeState>,
) -> Result<String, String> {
    Ok(state.practice.progress().saved_query(question_id))
}

/// 清空进度
#[tauri::command]
pub async fn reset_progress(state: State<'_, PracticeState>) -> Result<(), String> {
    state.practice.reset_progress().map_err(|e| e.to_string())
}

/// 导出进度 JSON
#[tauri::command]
pub async fn export_progress(state: State<'_, PracticeState>) -> Result<String, String> {
    state.practice.progress().export().map_err(|e| e.to_string())
}

/// 导入进度 JSON
#[tauri::command]
pub async fn import_progress(
    json: String,
    state: State<'_, PracticeState>,
) -> Result<SaveOutcome, String> {
    state
        .practice
        .progress()
        .import(&json)
        .map_err(|e| e.to_string())
}

// ==================== 主题 ====================

#[tauri::command]
pub async fn get_theme(state: State<'_, PracticeState>) -> Result<Theme, String> {
    Ok(state.theme.load())
}

#[tauri::command]
pub async fn set_theme(theme: Theme, state: State<'_, PracticeState>) -> Result<(), String> {
    state.theme.save(theme);
    Ok(())
}

#[tauri::command]
pub async fn toggle_theme(state: State<'_, PracticeState>) -> Result<Theme, String> {
    Ok(state.theme.toggle())
}
