// SQL 引擎命令模块
// 提供供前端调用的查询执行与表结构命令

use super::state::PracticeState;
use crate::models::{ColumnInfo, DatabaseInfo, QueryResult, SampleDatabase};
use crate::services::SqlEngine;
use tauri::State;

/// 初始化引擎并加载默认数据库
#[tauri::command]
pub async fn init_engine(state: State<'_, PracticeState>) -> Result<(), String> {
    state.engine().await?;
    Ok(())
}

/// 当前数据库是否就绪
#[tauri::command]
pub async fn is_database_ready(state: State<'_, PracticeState>) -> Result<bool, String> {
    Ok(state
        .engine
        .try_get()
        .map(|engine| engine.is_ready())
        .unwrap_or(false))
}

/// 可用的示例数据库
#[tauri::command]
pub async fn get_available_databases() -> Result<Vec<DatabaseInfo>, String> {
    Ok(SqlEngine::available_databases())
}

/// 切换数据库
#[tauri::command]
pub async fn switch_database(
    database: String,
    state: State<'_, PracticeState>,
) -> Result<(), String> {
    let database = database
        .parse::<SampleDatabase>()
        .map_err(|e| e.to_string())?;
    let engine = state.engine().await?;
    engine.switch_database(database).map_err(|e| e.to_string())
}

/// 当前数据库
#[tauri::command]
pub async fn get_current_database(state: State<'_, PracticeState>) -> Result<String, String> {
    let engine = state.engine().await?;
    Ok(engine.current_database().id().to_string())
}

/// 在当前数据库执行查询，错误放在结果的 error 字段中
#[tauri::command]
pub async fn execute_query(
    sql: Option<String>,
    state: State<'_, PracticeState>,
) -> Result<QueryResult, String> {
    let engine = match state.engine().await {
        Ok(engine) => engine,
        Err(e) => return Ok(QueryResult::failed(e)),
    };
    Ok(engine.execute(sql.as_deref()))
}

/// 当前数据库的表名
#[tauri::command]
pub async fn get_table_names(state: State<'_, PracticeState>) -> Result<Vec<String>, String> {
    let engine = state.engine().await?;
    Ok(engine.table_names())
}

/// 表结构
#[tauri::command]
pub async fn get_table_schema(
    table: Option<String>,
    state: State<'_, PracticeState>,
) -> Result<Vec<ColumnInfo>, String> {
    let engine = state.engine().await?;
    Ok(table
        .map(|table| engine.table_schema(&table))
        .unwrap_or_default())
}
