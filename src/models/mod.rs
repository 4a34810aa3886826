// 数据模型模块
// 题目、查询结果、学习进度与筛选状态

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// 进度记录的当前格式版本
pub const PROGRESS_VERSION: u32 = 1;

// ==================== 示例数据库 ====================

/// 内置的示例数据库
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleDatabase {
    #[default]
    Hospital,
    University,
    Company,
}

impl SampleDatabase {
    pub const ALL: [SampleDatabase; 3] = [
        SampleDatabase::Hospital,
        SampleDatabase::University,
        SampleDatabase::Company,
    ];

    pub fn id(self) -> &'static str {
        match self {
            SampleDatabase::Hospital => "hospital",
            SampleDatabase::University => "university",
            SampleDatabase::Company => "company",
        }
    }

    /// 首字母大写的展示名
    pub fn display_name(self) -> &'static str {
        match self {
            SampleDatabase::Hospital => "Hospital",
            SampleDatabase::University => "University",
            SampleDatabase::Company => "Company",
        }
    }
}

impl fmt::Display for SampleDatabase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.id())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Unknown database: {0}")]
pub struct UnknownDatabase(pub String);

impl FromStr for SampleDatabase {
    type Err = UnknownDatabase;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SampleDatabase::ALL
            .into_iter()
            .find(|db| db.id() == s)
            .ok_or_else(|| UnknownDatabase(s.to_string()))
    }
}

/// 数据库列表项
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    pub id: String,
    pub name: String,
}

impl From<SampleDatabase> for DatabaseInfo {
    fn from(db: SampleDatabase) -> Self {
        Self {
            id: db.id().to_string(),
            name: db.display_name().to_string(),
        }
    }
}

/// 表结构中的一列
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub nullable: bool,
    pub pk: bool,
}

// ==================== 题目 ====================

/// 题目难度
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

/// 练习题，启动时从内置题库加载，之后不可变
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: u32,
    pub title: String,
    pub description: String,
    pub difficulty: Difficulty,
    pub category: String,
    pub database: SampleDatabase,
    pub expected_query: String,
    #[serde(default)]
    pub hint: Option<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

// ==================== 查询结果 ====================

/// 结果集中的单元格
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(f64),
    Text(String),
    Blob(Vec<u8>),
}

impl Cell {
    /// 用于排序与比较的规范化文本
    ///
    /// 整数值的浮点数与对应整数写法相同，文本带引号并转义。
    pub fn canonical_key(&self) -> String {
        match self {
            Cell::Null => "null".to_string(),
            Cell::Integer(i) => i.to_string(),
            Cell::Real(f) if f.is_finite() && f.fract() == 0.0 && f.abs() < 9_007_199_254_740_992.0 => {
                (*f as i64).to_string()
            }
            Cell::Real(f) if f.is_finite() => f.to_string(),
            Cell::Real(_) => "null".to_string(),
            Cell::Text(s) => serde_json::Value::String(s.clone()).to_string(),
            Cell::Blob(bytes) => {
                let hex: String = bytes.iter().map(|b| format!("{:02x}", b)).collect();
                format!("x'{}'", hex)
            }
        }
    }
}

/// 一次查询的结果
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
    pub error: Option<String>,
}

impl QueryResult {
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            columns: Vec::new(),
            rows: Vec::new(),
            error: Some(message.into()),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

// ==================== 学习进度 ====================

/// 持久化的学习进度记录
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    #[serde(default = "legacy_version")]
    pub version: u32,
    /// 最近查看的题目，0 表示没有
    #[serde(default, deserialize_with = "deserialize_current")]
    pub current_question: u32,
    #[serde(deserialize_with = "deserialize_ids")]
    pub completed_questions: Vec<String>,
    /// 必须存在；null 视为空表
    #[serde(deserialize_with = "deserialize_saved_queries")]
    pub saved_queries: BTreeMap<String, String>,
}

impl Default for Progress {
    fn default() -> Self {
        Self {
            version: PROGRESS_VERSION,
            current_question: 0,
            completed_questions: Vec::new(),
            saved_queries: BTreeMap::new(),
        }
    }
}

impl Progress {
    pub fn is_complete(&self, question_id: u32) -> bool {
        let key = question_id.to_string();
        self.completed_questions.iter().any(|id| *id == key)
    }

    /// 标记完成，已完成时返回 false
    pub fn mark_complete(&mut self, question_id: u32) -> bool {
        if self.is_complete(question_id) {
            return false;
        }
        self.completed_questions.push(question_id.to_string());
        true
    }

    pub fn saved_query(&self, question_id: u32) -> Option<&str> {
        self.saved_queries
            .get(&question_id.to_string())
            .map(String::as_str)
    }
}

fn legacy_version() -> u32 {
    PROGRESS_VERSION
}

/// 旧数据里题目 ID 可能是数字也可能是字符串
#[derive(Deserialize)]
#[serde(untagged)]
enum IdRepr {
    Number(u64),
    Text(String),
}

impl IdRepr {
    fn into_key(self) -> String {
        match self {
            IdRepr::Number(n) => n.to_string(),
            IdRepr::Text(s) => s,
        }
    }
}

fn deserialize_ids<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Vec::<IdRepr>::deserialize(deserializer)?;
    let mut seen = HashSet::new();
    let mut ids = Vec::with_capacity(raw.len());
    for id in raw.into_iter().map(IdRepr::into_key) {
        if seen.insert(id.clone()) {
            ids.push(id);
        }
    }
    Ok(ids)
}

/// 非法的当前题目（负数、小数、其他类型）一律视为 0
fn deserialize_current<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    })
}

/// 只保留字符串类型的查询文本
fn deserialize_saved_queries<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?;
    Ok(raw
        .unwrap_or_default()
        .into_iter()
        .filter_map(|(id, query)| match query {
            Value::String(query) => Some((id, query)),
            _ => None,
        })
        .collect())
}

// ==================== 主题 ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn as_str(self) -> &'static str {
        match self {
            Theme::Light => "light",
            Theme::Dark => "dark",
        }
    }

    pub fn parse(value: &str) -> Option<Theme> {
        match value {
            "light" => Some(Theme::Light),
            "dark" => Some(Theme::Dark),
            _ => None,
        }
    }

    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

// ==================== 筛选 ====================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyFilter {
    #[default]
    All,
    Easy,
    Medium,
    Hard,
}

impl DifficultyFilter {
    pub fn matches(self, difficulty: Difficulty) -> bool {
        match self {
            DifficultyFilter::All => true,
            DifficultyFilter::Easy => difficulty == Difficulty::Easy,
            DifficultyFilter::Medium => difficulty == Difficulty::Medium,
            DifficultyFilter::Hard => difficulty == Difficulty::Hard,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
    #[default]
    All,
    Complete,
    Incomplete,
}

impl CompletionFilter {
    pub fn matches(self, is_complete: bool) -> bool {
        match self {
            CompletionFilter::All => true,
            CompletionFilter::Complete => is_complete,
            CompletionFilter::Incomplete => !is_complete,
        }
    }
}

/// 题目列表的筛选条件
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterState {
    pub database: SampleDatabase,
    pub difficulty: DifficultyFilter,
    pub completion: CompletionFilter,
    pub keywords: Vec<String>,
}

/// 题目统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionStats {
    pub total: usize,
    pub filtered: usize,
    pub completed: usize,
}
