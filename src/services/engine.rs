// SQL 引擎服务模块
// 每个示例数据库对应一个内存 SQLite 连接，首次使用时执行内置脚本建库

use crate::models::{Cell, ColumnInfo, DatabaseInfo, QueryResult, SampleDatabase};
use crate::services::validator::{validate_query, UNSAFE_QUERY_MESSAGE};
use rusqlite::types::ValueRef;
use rusqlite::{ffi, Batch, Connection, DropBehavior, Statement};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tokio::sync::OnceCell;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to initialize SQL engine: {0}")]
    Init(String),

    #[error("Failed to initialize {database} database: {source}")]
    Seed {
        database: SampleDatabase,
        #[source]
        source: rusqlite::Error,
    },

    #[error("Database lock poisoned")]
    Lock,
}

pub type EngineResult<T> = Result<T, EngineError>;

/// 示例数据库的建表与数据脚本
fn seed_script(database: SampleDatabase) -> &'static str {
    match database {
        SampleDatabase::Hospital => include_str!("../../data/databases/hospital.sql"),
        SampleDatabase::University => include_str!("../../data/databases/university.sql"),
        SampleDatabase::Company => include_str!("../../data/databases/company.sql"),
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(value: ValueRef<'_>) -> Self {
        match value {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) => Cell::Integer(i),
            ValueRef::Real(f) => Cell::Real(f),
            ValueRef::Text(t) => Cell::Text(String::from_utf8_lossy(t).into_owned()),
            ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
        }
    }
}

/// SQL 引擎
pub struct SqlEngine {
    databases: Mutex<HashMap<SampleDatabase, Connection>>,
    current: Mutex<SampleDatabase>,
}

impl Default for SqlEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl SqlEngine {
    /// 创建空引擎，尚未加载任何数据库
    pub fn new() -> Self {
        Self {
            databases: Mutex::new(HashMap::new()),
            current: Mutex::new(SampleDatabase::default()),
        }
    }

    /// 创建引擎并加载默认数据库
    pub fn bootstrap(default_database: SampleDatabase) -> EngineResult<Self> {
        let engine = Self::new();
        engine.switch_database(default_database)?;
        log::info!(
            "SQL engine ready (SQLite {}), default database: {}",
            rusqlite::version(),
            default_database
        );
        Ok(engine)
    }

    /// 可用的示例数据库列表
    pub fn available_databases() -> Vec<DatabaseInfo> {
        SampleDatabase::ALL.into_iter().map(DatabaseInfo::from).collect()
    }

    // ==================== 数据库管理 ====================

    /// 确保数据库已建好，不改变当前数据库
    pub fn ensure_database(&self, database: SampleDatabase) -> EngineResult<()> {
        let mut databases = self.databases.lock().map_err(|_| EngineError::Lock)?;
        if databases.contains_key(&database) {
            return Ok(());
        }

        let conn = Connection::open_in_memory()
            .and_then(|conn| conn.execute_batch(seed_script(database)).map(|_| conn))
            .map_err(|source| EngineError::Seed { database, source })?;
        // 建库之后的任何提交都改为回滚，示例数据保持不变
        conn.commit_hook(Some(|| true));

        log::info!("Initialized {} database", database);
        databases.insert(database, conn);
        Ok(())
    }

    /// 切换当前数据库，必要时先初始化
    pub fn switch_database(&self, database: SampleDatabase) -> EngineResult<()> {
        self.ensure_database(database)?;
        let mut current = self.current.lock().map_err(|_| EngineError::Lock)?;
        *current = database;
        Ok(())
    }

    pub fn current_database(&self) -> SampleDatabase {
        self.current.lock().map(|current| *current).unwrap_or_default()
    }

    /// 当前数据库是否可用
    pub fn is_ready(&self) -> bool {
        let database = self.current_database();
        self.databases
            .lock()
            .map(|databases| databases.contains_key(&database))
            .unwrap_or(false)
    }

    // ==================== 查询执行 ====================

    /// 在当前数据库上执行查询
    pub fn execute(&self, sql: Option<&str>) -> QueryResult {
        if validate_query(sql).is_err() {
            return QueryResult::failed(UNSAFE_QUERY_MESSAGE);
        }
        let database = self.current_database();
        self.with_connection(database, |conn| run_query(conn, sql.unwrap_or_default()))
            .unwrap_or_else(|| QueryResult::failed("Database not initialized"))
    }

    /// 在指定数据库上执行查询
    pub fn execute_on(&self, sql: Option<&str>, database: SampleDatabase) -> QueryResult {
        if validate_query(sql).is_err() {
            return QueryResult::failed(UNSAFE_QUERY_MESSAGE);
        }
        if let Err(e) = self.ensure_database(database) {
            log::error!("{}", e);
            return QueryResult::failed(e.to_string());
        }
        self.with_connection(database, |conn| run_query(conn, sql.unwrap_or_default()))
            .unwrap_or_else(|| QueryResult::failed("Database not initialized"))
    }

    // ==================== 表结构 ====================

    /// 当前数据库的表名，按名称排序
    pub fn table_names(&self) -> Vec<String> {
        let database = self.current_database();
        let names = self.with_connection(database, |conn| {
            let mut stmt =
                conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
            let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        });

        match names {
            Some(Ok(names)) => names,
            Some(Err(e)) => {
                log::error!("Error getting table names: {}", e);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    /// 当前数据库中某张表的列信息，未知表返回空列表
    pub fn table_schema(&self, table: &str) -> Vec<ColumnInfo> {
        if table.trim().is_empty() {
            return Vec::new();
        }

        let database = self.current_database();
        let columns = self.with_connection(database, |conn| {
            let mut stmt = conn.prepare(
                "SELECT name, type, \"notnull\", pk FROM pragma_table_info(?1) ORDER BY cid",
            )?;
            let rows = stmt.query_map([table], |row| {
                Ok(ColumnInfo {
                    name: row.get(0)?,
                    column_type: row.get(1)?,
                    nullable: row.get::<_, i64>(2)? == 0,
                    pk: row.get::<_, i64>(3)? > 0,
                })
            })?;
            rows.collect::<rusqlite::Result<Vec<_>>>()
        });

        match columns {
            Some(Ok(columns)) => columns,
            Some(Err(e)) => {
                log::error!("Error getting schema for table {}: {}", table, e);
                Vec::new()
            }
            None => Vec::new(),
        }
    }

    // ==================== 辅助方法 ====================

    fn with_connection<T>(
        &self,
        database: SampleDatabase,
        f: impl FnOnce(&Connection) -> T,
    ) -> Option<T> {
        let databases = self.databases.lock().ok()?;
        databases.get(&database).map(f)
    }
}

/// 在回滚事务中执行，修改类语句不会影响示例数据
fn run_query(conn: &Connection, sql: &str) -> QueryResult {
    log::debug!("Executing query: {}", sql);

    let mut tx = match conn.unchecked_transaction() {
        Ok(tx) => tx,
        Err(e) => return QueryResult::failed(e.to_string()),
    };
    let outcome = run_statements(&tx, sql);

    // 学员的 COMMIT / END / ROLLBACK 可能已经结束了事务
    let closed = if tx.is_autocommit() {
        tx.set_drop_behavior(DropBehavior::Ignore);
        Ok(())
    } else {
        tx.rollback()
    };

    match (outcome, closed) {
        (Ok(result), Ok(())) => result,
        (Err(e), _) | (_, Err(e)) => QueryResult::failed(e.to_string()),
    }
}

/// 依次执行全部语句，返回第一个带结果集的语句的结果
///
/// 空语句（只有注释或分号）被跳过；没有任何结果集时返回空结果。
fn run_statements(conn: &Connection, sql: &str) -> rusqlite::Result<QueryResult> {
    let mut batch = Batch::new(conn, sql);
    let mut first = None;

    while let Some(mut stmt) = batch.next()? {
        if stmt.column_count() == 0 {
            match stmt.execute([]) {
                Ok(_) => {}
                // 学员的 COMMIT / END 被提交钩子改为回滚
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.extended_code == ffi::SQLITE_CONSTRAINT_COMMITHOOK =>
                {
                    break
                }
                Err(e) => return Err(e),
            }
        } else {
            let result = collect_rows(&mut stmt)?;
            first.get_or_insert(result);
        }
        // 事务已结束，后续语句不再执行
        if conn.is_autocommit() {
            break;
        }
    }

    Ok(first.unwrap_or_default())
}

fn collect_rows(stmt: &mut Statement<'_>) -> rusqlite::Result<QueryResult> {
    let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let width = columns.len();

    let mut rows = stmt.query([])?;
    let mut values = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for idx in 0..width {
            cells.push(Cell::from(row.get_ref(idx)?));
        }
        values.push(cells);
    }

    Ok(QueryResult {
        columns,
        rows: values,
        error: None,
    })
}

// ==================== 异步初始化 ====================

/// 引擎句柄
///
/// 第一次调用 [`EngineHandle::get`] 时在阻塞线程池中初始化引擎，
/// 并发调用方等待同一次初始化；初始化失败不会被缓存，下次调用重试。
pub struct EngineHandle {
    cell: OnceCell<Arc<SqlEngine>>,
    default_database: SampleDatabase,
}

impl Default for EngineHandle {
    fn default() -> Self {
        Self::new(SampleDatabase::default())
    }
}

impl EngineHandle {
    pub fn new(default_database: SampleDatabase) -> Self {
        Self {
            cell: OnceCell::new(),
            default_database,
        }
    }

    pub async fn get(&self) -> EngineResult<Arc<SqlEngine>> {
        let default_database = self.default_database;
        self.get_or_init_with(move || SqlEngine::bootstrap(default_database))
            .await
    }

    /// 使用自定义构造函数初始化
    pub async fn get_or_init_with<F>(&self, init: F) -> EngineResult<Arc<SqlEngine>>
    where
        F: FnOnce() -> EngineResult<SqlEngine> + Send + 'static,
    {
        let engine = self
            .cell
            .get_or_try_init(|| async move {
                tokio::task::spawn_blocking(init)
                    .await
                    .map_err(|e| EngineError::Init(e.to_string()))?
                    .map(Arc::new)
            })
            .await?;
        Ok(Arc::clone(engine))
    }

    /// 已初始化时返回引擎
    pub fn try_get(&self) -> Option<Arc<SqlEngine>> {
        self.cell.get().cloned()
    }
}
