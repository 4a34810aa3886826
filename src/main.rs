#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

use sql_practice::commands::{self, PracticeState};
use sql_practice::services::{FileStore, KeyValueStore, PracticeService, ProgressStore, QuestionCatalog, ThemeStore};
use sql_practice::utils::{self, AppConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tauri::Manager;

#[tauri::command]
fn get_app_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

#[tauri::command]
fn get_platform() -> String {
    utils::get_platform().to_string()
}

fn resolve_data_dir(config: &AppConfig, app: &tauri::App) -> PathBuf {
    if let Some(dir) = &config.data_dir {
        return dir.clone();
    }
    app.path()
        .app_data_dir()
        .unwrap_or_else(|_| utils::fallback_data_dir())
}

fn main() -> anyhow::Result<()> {
    let config = AppConfig::from_env()?;

    tauri::Builder::default()
        .setup(move |app| {
            let data_dir = resolve_data_dir(&config, app);
            let log_path = utils::get_log_path(&data_dir);
            utils::init_logging(config.log_level, Some(&log_path))?;
            log::info!("Starting SQL Practice v{} on {}", env!("CARGO_PKG_VERSION"), utils::get_platform());
            log::info!("Data directory: {}", data_dir.display());

            let store: Arc<dyn KeyValueStore> = Arc::new(FileStore::new(
                utils::get_store_path(&data_dir),
                config.quota_bytes,
            ));
            let catalog = Arc::new(QuestionCatalog::bundled()?);
            log::info!("Loaded {} questions", catalog.len());

            let practice = PracticeService::new(catalog, ProgressStore::new(store.clone()));
            app.manage(PracticeState::new(practice, ThemeStore::new(store)));

            // 后台预热引擎，失败时留待首次调用重试
            let handle = app.handle().clone();
            tauri::async_runtime::spawn(async move {
                let state = handle.state::<PracticeState>();
                if let Err(e) = state.engine.get().await {
                    log::error!("Engine warm-up failed: {}", e);
                }
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            get_app_version,
            get_platform,
            // 引擎命令
            commands::init_engine,
            commands::is_database_ready,
            commands::get_available_databases,
            commands::switch_database,
            commands::get_current_database,
            commands::execute_query,
            commands::get_table_names,
            commands::get_table_schema,
            // 练习命令
            commands::get_questions,
            commands::get_question,
            commands::get_filtered_questions,
            commands::get_question_stats,
            commands::get_keywords,
            commands::submit_query,
            commands::select_question,
            commands::navigate_question,
            // 进度与主题命令
            commands::get_progress,
            commands::mark_question_complete,
            commands::is_question_complete,
            commands::save_query,
            commands::get_saved_query,
            commands::reset_progress,
            commands::export_progress,
            commands::import_progress,
            commands::get_theme,
            commands::set_theme,
            commands::toggle_theme,
        ])
        .run(tauri::generate_context!())?;

    Ok(())
}
