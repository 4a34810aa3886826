// Tauri 命令模块
// 提供供前端调用的命令接口

pub mod engine;
pub mod practice;
pub mod progress;
pub mod state;

pub use state::PracticeState;

pub use engine::{
    init_engine,
    is_database_ready,
    get_available_databases,
    switch_database,
    get_current_database,
    execute_query,
    get_table_names,
    get_table_schema,
};

pub use practice::{
    get_questions,
    get_question,
    get_filtered_questions,
    get_question_stats,
    get_keywords,
    submit_query,
    select_question,
    navigate_question,
};

pub use progress::{
    get_progress,
    mark_question_complete,
    is_question_complete,
    save_query,
    get_saved_query,
    reset_progress,
    export_progress,
    import_progress,
    get_theme,
    set_theme,
    toggle_theme,
};
