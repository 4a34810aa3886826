//! 题目筛选与导航

use crate::models::{FilterState, Question, QuestionStats};
use std::collections::HashSet;

/// 筛选面板提供的关键字
pub const KEYWORDS: [&str; 17] = [
    "select", "where", "distinct", "group by", "having", "in", "join", "like", "null", "case",
    "order by", "limit", "count", "avg", "sum", "max", "min",
];

fn completed_set(completed: &[String]) -> HashSet<&str> {
    completed.iter().map(String::as_str).collect()
}

/// 题目的任一标签包含任一选中关键字（不区分大小写）
fn matches_keywords(question: &Question, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return true;
    }
    keywords.iter().any(|kw| {
        let kw = kw.to_lowercase();
        question
            .keywords
            .iter()
            .any(|tag| !tag.is_empty() && tag.to_lowercase().contains(&kw))
    })
}

pub fn filter_questions<'a>(
    questions: &'a [Question],
    filters: &FilterState,
    completed: &[String],
) -> Vec<&'a Question> {
    let completed = completed_set(completed);
    questions
        .iter()
        .filter(|q| q.database == filters.database)
        .filter(|q| filters.difficulty.matches(q.difficulty))
        .filter(|q| {
            let is_complete = completed.contains(q.id.to_string().as_str());
            filters.completion.matches(is_complete)
        })
        .filter(|q| matches_keywords(q, &filters.keywords))
        .collect()
}

/// 当前数据库的题目统计
pub fn question_stats(
    questions: &[Question],
    filters: &FilterState,
    completed: &[String],
) -> QuestionStats {
    let done = completed_set(completed);
    let in_database: Vec<&Question> = questions
        .iter()
        .filter(|q| q.database == filters.database)
        .collect();

    QuestionStats {
        total: in_database.len(),
        filtered: filter_questions(questions, filters, completed).len(),
        completed: in_database
            .iter()
            .filter(|q| done.contains(q.id.to_string().as_str()))
            .count(),
    }
}

/// 在筛选结果中前后移动，越界时停在两端
///
/// 当前题目不在列表中时从第一题开始；位置没有变化时返回 `None`。
pub fn navigate<'a>(filtered: &[&'a Question], current_id: u32, direction: i32) -> Option<&'a Question> {
    let last = filtered.len().checked_sub(1)? as i64;
    let current = filtered
        .iter()
        .position(|q| q.id == current_id)
        .map_or(-1, |pos| pos as i64);
    let target = (current + direction as i64).clamp(0, last);
    if target == current {
        return None;
    }
    filtered.get(target as usize).copied()
}
