//! 数据模型定义
//!
//! 定义三类持久化记录（分类、卡片、模块）、查询结果行以及导入用的卡片包，
//! 并提供从数据库行解析的方法。列按名称读取，字段与列的对应关系集中在 `from_row` 中。

use rusqlite::types::Type;
use rusqlite::{Result as SqliteResult, Row};
use serde::{Deserialize, Serialize};

use crate::storage::id_list::parse_id_list;

// ============================================================
// Category - 分类
// ============================================================

/// 分类（语言 / 主题分组）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    /// 自增 ID，尚未入库时为 0
    pub id: i64,
    /// 分类名称（预期唯一，但不做约束）
    pub name: String,
    /// 语言
    pub language: String,
}

impl Category {
    /// 创建尚未入库的分类
    pub fn new(name: impl Into<String>, language: impl Into<String>) -> Self {
        Self {
            id: 0,
            name: name.into(),
            language: language.into(),
        }
    }

    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
            language: row.get("language")?,
        })
    }
}

// ============================================================
// Card - 卡片
// ============================================================

/// 卡片（正反面内容对），创建后只追加不修改
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    /// 自增 ID，尚未入库时为 0
    pub id: i64,
    /// 所属分类 ID（弱引用，不保证存在）
    pub category_id: i64,
    /// 正面内容
    pub front_content: String,
    /// 背面内容
    pub back_content: String,
}

impl Card {
    /// 创建尚未入库的卡片
    pub fn new(
        category_id: i64,
        front_content: impl Into<String>,
        back_content: impl Into<String>,
    ) -> Self {
        Self {
            id: 0,
            category_id,
            front_content: front_content.into(),
            back_content: back_content.into(),
        }
    }
}

/// 卡片查询结果行 (id, front, back)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardRow {
    pub id: i64,
    pub front: String,
    pub back: String,
}

impl CardRow {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            front: row.get("front")?,
            back: row.get("back")?,
        })
    }
}

// ============================================================
// Module - 学习模块
// ============================================================

/// 学习模块
///
/// `card_ids` 以文本形式内嵌在 `modules.cards` 列中，不使用关联表。
/// `unanswered_card_ids` 为 `None` 表示从未记录过进度。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
    /// 自增 ID，尚未入库时为 0
    pub id: i64,
    /// 所属分类 ID
    pub category_id: i64,
    /// 模块名称
    pub name: String,
    /// 成员卡片 ID（有序）
    pub card_ids: Vec<i64>,
    /// 上次学习后仍未掌握的卡片 ID
    pub unanswered_card_ids: Option<Vec<i64>>,
}

impl Module {
    /// 创建尚未入库的模块
    pub fn new(category_id: i64, name: impl Into<String>, card_ids: Vec<i64>) -> Self {
        Self {
            id: 0,
            category_id,
            name: name.into(),
            card_ids,
            unanswered_card_ids: None,
        }
    }

    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            category_id: row.get("categoryId")?,
            name: row.get("name")?,
            card_ids: id_list_column(row, "cards")?.unwrap_or_default(),
            unanswered_card_ids: id_list_column(row, "unanswered")?,
        })
    }
}

/// 读取并解析一个 ID 列表列，NULL 返回 `None`
fn id_list_column(row: &Row, column: &str) -> SqliteResult<Option<Vec<i64>>> {
    let raw: Option<String> = row.get(column)?;
    match raw {
        None => Ok(None),
        Some(text) => parse_id_list(&text).map(Some).map_err(|e| {
            let index = row.as_ref().column_index(column).unwrap_or_default();
            rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(e))
        }),
    }
}

/// 模块列表项 (id, name)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleSummary {
    pub id: i64,
    pub name: String,
}

impl ModuleSummary {
    /// 从数据库行解析
    pub fn from_row(row: &Row) -> SqliteResult<Self> {
        Ok(Self {
            id: row.get("id")?,
            name: row.get("name")?,
        })
    }
}

// ============================================================
// 模块卡片查询结果
// ============================================================

/// 卡片集合的来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressSource {
    /// 读取的是请求的列
    Recorded,
    /// 请求"仅未掌握"但从未记录进度，已退回到全部卡片
    Fallback,
}

/// 模块卡片查询结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleCards {
    /// 卡片行
    pub cards: Vec<CardRow>,
    /// 卡片集合来源
    pub progress: ProgressSource,
}

impl ModuleCards {
    /// 是否发生了退回
    pub fn is_fallback(&self) -> bool {
        self.progress == ProgressSource::Fallback
    }

    /// 卡片 ID（按结果顺序）
    pub fn card_ids(&self) -> Vec<i64> {
        self.cards.iter().map(|card| card.id).collect()
    }
}

// ============================================================
// CardPack - 导入包
// ============================================================

/// 批量导入的卡片包
///
/// 来源格式不在存储层的职责内，这里只接收已解析好的结构。
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CardPack {
    /// 分类名称（必填）
    pub category_name: Option<String>,
    /// 语言（仅在需要新建分类时必填）
    pub language: Option<String>,
    /// 模块名称，缺省时只导入卡片
    pub module_name: Option<String>,
    /// 卡片内容 (正面, 背面)
    #[serde(default)]
    pub card_list: Vec<(String, String)>,
}

impl CardPack {
    /// 创建卡片包
    pub fn new(
        category_name: impl Into<String>,
        language: impl Into<String>,
        module_name: Option<String>,
        card_list: Vec<(String, String)>,
    ) -> Self {
        Self {
            category_name: Some(category_name.into()),
            language: Some(language.into()),
            module_name,
            card_list,
        }
    }
}
