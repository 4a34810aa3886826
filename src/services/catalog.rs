// 题库服务模块
// 题库 JSON 在编译期打包进程序，启动时解析一次

use crate::models::{Question, SampleDatabase};
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

const BUNDLED_CATALOG: &str = include_str!("../../data/questions.json");

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("Failed to parse question catalog: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Duplicate question id: {0}")]
    DuplicateId(u32),

    #[error("Question id must be positive")]
    ZeroId,
}

#[derive(Deserialize)]
struct CatalogFile {
    questions: Vec<Question>,
}

/// 题库
#[derive(Debug, Clone)]
pub struct QuestionCatalog {
    questions: Vec<Question>,
}

impl QuestionCatalog {
    /// 加载内置题库
    pub fn bundled() -> Result<Self, CatalogError> {
        Self::from_json(BUNDLED_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(raw)?;

        let mut seen = HashSet::new();
        for question in &file.questions {
            if question.id == 0 {
                return Err(CatalogError::ZeroId);
            }
            if !seen.insert(question.id) {
                return Err(CatalogError::DuplicateId(question.id));
            }
        }

        log::info!("Loaded {} questions", file.questions.len());
        Ok(Self {
            questions: file.questions,
        })
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn get(&self, id: u32) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == id)
    }

    pub fn for_database(&self, database: SampleDatabase) -> impl Iterator<Item = &Question> {
        self.questions.iter().filter(move |q| q.database == database)
    }

    pub fn len(&self) -> usize {
        self.questions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Difficulty;
    use crate::services::engine::SqlEngine;

    #[test]
    fn test_bundled_catalog_loads() {
        let catalog = QuestionCatalog::bundled().unwrap();
        assert!(!catalog.is_empty());
        for database in SampleDatabase::ALL {
            assert!(catalog.for_database(database).count() > 0, "{database}");
        }
    }

    #[test]
    fn test_lookup() {
        let catalog = QuestionCatalog::bundled().unwrap();
        let question = catalog.get(1).unwrap();
        assert_eq!(question.database, SampleDatabase::Hospital);
        assert_eq!(question.difficulty, Difficulty::Easy);
        assert!(catalog.get(0).is_none());
    }

    #[test]
    fn test_optional_fields_default() {
        let catalog = QuestionCatalog::from_json(
            r#"{"questions":[{"id":1,"title":"t","description":"d","difficulty":"hard","category":"c","database":"company","expectedQuery":"SELECT 1"}]}"#,
        )
        .unwrap();
        let question = catalog.get(1).unwrap();
        assert_eq!(question.hint, None);
        assert!(question.keywords.is_empty());
    }

    #[test]
    fn test_unknown_database_rejected() {
        let result = QuestionCatalog::from_json(
            r#"{"questions":[{"id":1,"title":"t","description":"d","difficulty":"easy","category":"c","database":"library","expectedQuery":"SELECT 1"}]}"#,
        );
        assert!(matches!(result, Err(CatalogError::Parse(_))));
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let q = r#"{"id":2,"title":"t","description":"d","difficulty":"easy","category":"c","database":"hospital","expectedQuery":"SELECT 1"}"#;
        let raw = format!(r#"{{"questions":[{q},{q}]}}"#);
        assert!(matches!(
            QuestionCatalog::from_json(&raw),
            Err(CatalogError::DuplicateId(2))
        ));
    }

    #[test]
    fn test_expected_queries_run() {
        let catalog = QuestionCatalog::bundled().unwrap();
        let engine = SqlEngine::new();
        for question in catalog.questions() {
            let result = engine.execute_on(Some(&question.expected_query), question.database);
            assert!(result.error.is_none(), "question {}: {:?}", question.id, result.error);
            assert!(!result.columns.is_empty(), "question {}", question.id);
        }
    }
}
