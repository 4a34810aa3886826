// 练习流程服务
// 执行学员查询与标准查询、判定对错，并更新学习进度

use crate::models::{FilterState, Question, QueryResult, QuestionStats};
use crate::services::catalog::QuestionCatalog;
use crate::services::compare::compare_results;
use crate::services::engine::{EngineError, SqlEngine};
use crate::services::filter;
use crate::services::progress::ProgressStore;
use crate::services::storage::StorageError;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PracticeError {
    #[error("Unknown question: {0}")]
    UnknownQuestion(u32),

    #[error(transparent)]
    Engine(#[from] EngineError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// 一次提交的判定结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub question_id: u32,
    pub user_result: QueryResult,
    pub expected_result: QueryResult,
    pub is_correct: bool,
    /// 进度是否写入成功
    pub progress_saved: bool,
}

/// 练习服务
#[derive(Clone)]
pub struct PracticeService {
    catalog: Arc<QuestionCatalog>,
    progress: ProgressStore,
}

impl PracticeService {
    pub fn new(catalog: Arc<QuestionCatalog>, progress: ProgressStore) -> Self {
        Self { catalog, progress }
    }

    pub fn catalog(&self) -> &QuestionCatalog {
        &self.catalog
    }

    pub fn progress(&self) -> &ProgressStore {
        &self.progress
    }

    fn question(&self, question_id: u32) -> Result<&Question, PracticeError> {
        self.catalog
            .get(question_id)
            .ok_or(PracticeError::UnknownQuestion(question_id))
    }

    /// 提交查询
    pub fn submit(
        &self,
        engine: &SqlEngine,
        question_id: u32,
        query: &str,
    ) -> Result<Submission, PracticeError> {
        let question = self.question(question_id)?;

        let user_result = engine.execute_on(Some(query), question.database);
        let expected_result = engine.execute_on(Some(&question.expected_query), question.database);
        if let Some(error) = &expected_result.error {
            log::error!("Expected query of question {} failed: {}", question_id, error);
        }
        let is_correct = compare_results(&user_result, &expected_result);

        let mut progress_saved = true;
        if let Err(e) = self.progress.save_query(question_id, query) {
            log::warn!("Failed to save query for question {}: {}", question_id, e);
            progress_saved = false;
        }
        if is_correct {
            if let Err(e) = self.progress.mark_complete(question_id) {
                log::warn!("Failed to mark question {} complete: {}", question_id, e);
                progress_saved = false;
            }
        }

        Ok(Submission {
            question_id,
            user_result,
            expected_result,
            is_correct,
            progress_saved,
        })
    }

    /// 选中题目：切换到题目所属数据库并记录为当前题目
    pub fn select_question(&self, engine: &SqlEngine, question_id: u32) -> Result<Question, PracticeError> {
        let question = self.question(question_id)?;
        engine.switch_database(question.database)?;
        if let Err(e) = self.progress.set_current_question(question_id) {
            log::warn!("Failed to save current question: {}", e);
        }
        Ok(question.clone())
    }

    pub fn filtered_questions(&self, filters: &FilterState) -> Vec<Question> {
        let progress = self.progress.load();
        filter::filter_questions(self.catalog.questions(), filters, &progress.completed_questions)
            .into_iter()
            .cloned()
            .collect()
    }

    pub fn stats(&self, filters: &FilterState) -> QuestionStats {
        let progress = self.progress.load();
        filter::question_stats(self.catalog.questions(), filters, &progress.completed_questions)
    }

    /// 在筛选结果中切换到上一题或下一题
    pub fn navigate(
        &self,
        engine: &SqlEngine,
        filters: &FilterState,
        current_id: u32,
        direction: i32,
    ) -> Result<Option<Question>, PracticeError> {
        let progress = self.progress.load();
        let filtered =
            filter::filter_questions(self.catalog.questions(), filters, &progress.completed_questions);
        match filter::navigate(&filtered, current_id, direction) {
            Some(next) => self.select_question(engine, next.id).map(Some),
            None => Ok(None),
        }
    }

    pub fn reset_progress(&self) -> Result<(), PracticeError> {
        self.progress.reset()?;
        Ok(())
    }
}
