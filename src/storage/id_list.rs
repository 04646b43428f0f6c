//! 模块成员列表的文本编码
//!
//! `modules.cards` 与 `modules.unanswered` 两列以逗号分隔的十进制整数保存卡片 ID。
//! 文本格式只在本文件中出现，其余代码一律通过下面三个函数读写。

use std::collections::HashSet;

use thiserror::Error;

/// 列表分隔符
pub const DELIMITER: char = ',';

/// ID 列表解析失败
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("无法解析卡片 ID: {token:?}")]
pub struct IdListError {
    /// 出错的片段
    pub token: String,
}

/// 将 ID 列表编码为文本
///
/// 空列表编码为空字符串。
pub fn format_id_list(ids: &[i64]) -> String {
    ids.iter()
        .map(i64::to_string)
        .collect::<Vec<_>>()
        .join(&DELIMITER.to_string())
}

/// 从文本解析 ID 列表
///
/// 片段两侧的空白会被忽略，空片段会被跳过，因此 `""`、`"1,"` 都是合法输入。
pub fn parse_id_list(raw: &str) -> Result<Vec<i64>, IdListError> {
    raw.split(DELIMITER)
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| {
            token.parse::<i64>().map_err(|_| IdListError {
                token: token.to_string(),
            })
        })
        .collect()
}

/// 按 ID 求并集
///
/// 保留 `existing` 的顺序，再追加 `added` 中尚未出现的 ID。
pub fn union_id_lists(existing: &[i64], added: &[i64]) -> Vec<i64> {
    let mut seen = HashSet::with_capacity(existing.len() + added.len());
    existing
        .iter()
        .chain(added)
        .copied()
        .filter(|id| seen.insert(*id))
        .collect()
}
