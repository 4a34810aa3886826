// 练习命令模块
// 题目列表、筛选、提交与导航

use super::state::PracticeState;
use crate::models::{FilterState, Question, QuestionStats};
use crate::services::{Submission, KEYWORDS};
use tauri::State;

/// 全部题目
#[tauri::command]
pub async fn get_questions(state: State<'_, PracticeState>) -> Result<Vec<Question>, String> {
    Ok(state.practice.catalog().questions().to_vec())
}

/// 单道题目
#[tauri::command]
pub async fn get_question(
    id: u32,
    state: State<'_, PracticeState>,
) -> Result<Option<Question>, String> {
    Ok(state.practice.catalog().get(id).cloned())
}

/// 按筛选条件获取题目
#[tauri::command]
pub async fn get_filtered_questions(
    filters: FilterState,
    state: State<'_, PracticeState>,
) -> Result<Vec<Question>, String> {
    Ok(state.practice.filtered_questions(&filters))
}

/// 题目统计
#[tauri::command]
pub async fn get_question_stats(
    filters: FilterState,
    state: State<'_, PracticeState>,
) -> Result<QuestionStats, String> {
    Ok(state.practice.stats(&filters))
}

/// 关键字列表
#[tauri::command]
pub async fn get_keywords() -> Result<Vec<String>, String> {
    Ok(KEYWORDS.iter().map(|k| k.to_string()).collect())
}

/// 提交查询
#[tauri::command]
pub async fn submit_query(
    question_id: u32,
    query: String,
    state: State<'_, PracticeState>,
) -> Result<Submission, String> {
    let engine = state.engine().await?;
    state
        .practice
        .submit(&engine, question_id, &query)
        .map_err(|e| e.to_string())
}

/// 选中题目
#[tauri::command]
pub async fn select_question(
    question_id: u32,
    state: State<'_, PracticeState>,
) -> Result<Question, String> {
    let engine = state.engine().await?;
    state
        .practice
        .select_question(&engine, question_id)
        .map_err(|e| e.to_string())
}

/// 上一题 / 下一题
#[tauri::command]
pub async fn navigate_question(
    filters: FilterState,
    current_id: u32,
    direction: i32,
    state: State<'_, PracticeState>,
) -> Result<Option<Question>, String> {
    let engine = state.engine().await?;
    state
        .practice
        .navigate(&engine, &filters, current_id, direction)
        .map_err(|e| e.to_string())
}
