// 服务模块
// 提供核心业务逻辑服务

pub mod catalog;
pub mod compare;
pub mod engine;
pub mod filter;
pub mod practice;
pub mod progress;
pub mod storage;
pub mod theme;
pub mod validator;

pub use catalog::{CatalogError, QuestionCatalog};

pub use compare::compare_results;

pub use engine::{EngineError, EngineHandle, EngineResult, SqlEngine};

pub use filter::{filter_questions, navigate, question_stats, KEYWORDS};

pub use practice::{PracticeError, PracticeService, Submission};

pub use progress::{parse_progress, ProgressStore, SaveOutcome, PROGRESS_KEY};

pub use storage::{FileStore, KeyValueStore, MemoryStore, StorageError, StorageResult};

pub use theme::{ThemeStore, THEME_KEY};

pub use validator::{is_valid_query, validate_query, ValidationError, MAX_QUERY_LENGTH};
