//! `UNICODE` 排序规则
//!
//! 所有按名称、卡片正面排序的查询都使用 `COLLATE UNICODE`，
//! 每个连接打开后必须先调用 [`register`]。

use std::cmp::Ordering;

use rusqlite::Connection;
use unicode_casefold::{Locale, UnicodeCaseFold, Variant};
use unicode_normalization::{char::is_combining_mark, UnicodeNormalization};

/// 排序规则名称
pub const UNICODE_COLLATION: &str = "UNICODE";

/// 比较两个字符串，分三级：
///
/// 1. 基本字母：NFD 分解后去掉组合附加符号，再做完整大小写折叠
/// 2. 附加符号：保留附加符号的折叠结果（`e` 在 `é` 之前）
/// 3. 原始字符串，保证结果确定
pub fn unicode_compare(a: &str, b: &str) -> Ordering {
    primary_key(a)
        .cmp(&primary_key(b))
        .then_with(|| secondary_key(a).cmp(&secondary_key(b)))
        .then_with(|| a.cmp(b))
}

fn primary_key(s: &str) -> String {
    let base: String = s.nfd().filter(|c| !is_combining_mark(*c)).collect();
    fold(&base)
}

fn secondary_key(s: &str) -> String {
    let decomposed: String = s.nfd().collect();
    fold(&decomposed)
}

fn fold(s: &str) -> String {
    s.case_fold_with(Variant::Full, Locale::NonTurkic).collect()
}

/// 在连接上注册排序规则
pub fn register(conn: &Connection) -> rusqlite::Result<()> {
    conn.create_collation(UNICODE_COLLATION, unicode_compare)
}
