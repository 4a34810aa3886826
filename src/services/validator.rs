// 查询校验模块
// 执行前拦截空查询、超长查询与危险语句，其余交给 SQLite 判断

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// 单条查询的最大字符数
pub const MAX_QUERY_LENGTH: usize = 10_000;

/// 禁止作为语句开头的关键字
pub const DENIED_KEYWORDS: [&str; 5] = ["DROP", "DELETE", "ALTER", "TRUNCATE", "PRAGMA"];

/// 校验失败时返回给前端的提示
pub const UNSAFE_QUERY_MESSAGE: &str = "Invalid or unsafe SQL query. Only SELECT queries are allowed.";

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("query is missing")]
    Missing,

    #[error("query is empty")]
    Empty,

    #[error("query exceeds the length limit ({length} characters)")]
    TooLong { length: usize },

    #[error("statement starting with {0} is not allowed")]
    Denied(String),
}

fn denylist() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        let pattern = format!(r"(?i)^\s*({})", DENIED_KEYWORDS.join("|"));
        Regex::new(&pattern).expect("denylist pattern is valid")
    })
}

/// 校验学员查询
pub fn validate_query(sql: Option<&str>) -> Result<(), ValidationError> {
    let sql = sql.ok_or(ValidationError::Missing)?;

    if sql.trim().is_empty() {
        return Err(ValidationError::Empty);
    }

    let length = sql.chars().count();
    if length > MAX_QUERY_LENGTH {
        return Err(ValidationError::TooLong { length });
    }

    if let Some(found) = denylist().captures(sql).and_then(|caps| caps.get(1)) {
        return Err(ValidationError::Denied(found.as_str().to_uppercase()));
    }

    Ok(())
}

pub fn is_valid_query(sql: Option<&str>) -> bool {
    validate_query(sql).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_select() {
        assert!(is_valid_query(Some("SELECT * FROM users")));
        assert!(is_valid_query(Some("SELECT id, name FROM users WHERE id = 1")));
        assert!(is_valid_query(Some("  SELECT * FROM users  ")));
        assert!(is_valid_query(Some("SELECT DISTINCT category FROM products")));
        assert!(is_valid_query(Some("WITH t AS (SELECT 1) SELECT * FROM t")));
    }

    #[test]
    fn test_rejects_denied_keywords() {
        assert_eq!(
            validate_query(Some("DROP TABLE users")),
            Err(ValidationError::Denied("DROP".into()))
        );
        assert!(!is_valid_query(Some("DELETE FROM users")));
        assert!(!is_valid_query(Some("ALTER TABLE users ADD COLUMN email")));
        assert!(!is_valid_query(Some("TRUNCATE TABLE users")));
        assert!(!is_valid_query(Some("PRAGMA table_info(users)")));
    }

    #[test]
    fn test_denylist_ignores_case_and_whitespace() {
        for sql in ["drop table users", "  DeLeTe FROM users", "\n\tpragma foreign_keys", "\r\n AlTeR TABLE t"] {
            assert!(matches!(validate_query(Some(sql)), Err(ValidationError::Denied(_))), "{sql}");
        }
    }

    #[test]
    fn test_denied_keyword_later_in_text_is_allowed() {
        assert!(is_valid_query(Some("SELECT 'DROP TABLE users'")));
    }

    #[test]
    fn test_rejects_missing_and_empty() {
        assert_eq!(validate_query(None), Err(ValidationError::Missing));
        assert_eq!(validate_query(Some("")), Err(ValidationError::Empty));
        assert_eq!(validate_query(Some("   \n")), Err(ValidationError::Empty));
    }

    #[test]
    fn test_rejects_overlong() {
        let long_query = format!("SELECT * FROM users WHERE {}", "id = 1 OR ".repeat(2000));
        assert!(matches!(
            validate_query(Some(&long_query)),
            Err(ValidationError::TooLong { .. })
        ));

        let at_limit = "x".repeat(MAX_QUERY_LENGTH);
        assert!(is_valid_query(Some(&at_limit)));
    }
}
