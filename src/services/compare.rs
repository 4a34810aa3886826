//! 查询结果比较
//!
//! 判断学员查询与标准答案是否等价：忽略行顺序，按多重集合比较行。
//! 不比较列名，也没有部分得分。

use crate::models::{Cell, QueryResult};

/// 比较两个查询结果
///
/// 任一结果带错误、列数不同或行数不同时直接判错；否则两边的行分别按
/// 规范化文本排序后逐行比较。缺失的单元格按 NULL 处理。
pub fn compare_results(user: &QueryResult, expected: &QueryResult) -> bool {
    if user.is_error() || expected.is_error() {
        return false;
    }
    if user.columns.len() != expected.columns.len() {
        return false;
    }
    if user.rows.len() != expected.rows.len() {
        return false;
    }

    let width = user.columns.len();
    sorted_row_keys(&user.rows, width) == sorted_row_keys(&expected.rows, width)
}

/// 单行的规范化文本，形如 `[1,"John",null]`
pub fn row_key(row: &[Cell], width: usize) -> String {
    let cells: Vec<String> = (0..width.max(row.len()))
        .map(|idx| row.get(idx).unwrap_or(&Cell::Null).canonical_key())
        .collect();
    format!("[{}]", cells.join(","))
}

fn sorted_row_keys(rows: &[Vec<Cell>], width: usize) -> Vec<String> {
    let mut keys: Vec<String> = rows.iter().map(|row| row_key(row, width)).collect();
    keys.sort_unstable();
    keys
}
