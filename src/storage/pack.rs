//! 卡片包导入
//!
//! 流程：解析或创建分类 -> 批量插入卡片 -> 解析或创建模块（追加或覆盖成员列表）。
//! 追加按 ID 求并集而不是按内容去重，覆盖只替换成员列表，旧卡片仍留在 cards 表中。

use rusqlite::Connection;

use crate::storage::card::CardRepository;
use crate::storage::category::CategoryRepository;
use crate::storage::id_list::union_id_lists;
use crate::storage::models::{CardPack, Category, Module};
use crate::storage::module::ModuleRepository;
use crate::storage::{StorageError, StorageResult};

/// 已有模块的成员列表合并方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeMode {
    /// 与原有成员求并集
    Append,
    /// 用新卡片替换原有成员
    Overwrite,
}

impl MergeMode {
    /// 由 `should_append_module` 标志得到合并方式
    pub fn from_append_flag(should_append: bool) -> Self {
        if should_append {
            MergeMode::Append
        } else {
            MergeMode::Overwrite
        }
    }

    /// 计算合并后的成员列表
    pub fn merge(self, existing: &[i64], inserted: &[i64]) -> Vec<i64> {
        match self {
            MergeMode::Append => union_id_lists(existing, inserted),
            MergeMode::Overwrite => inserted.to_vec(),
        }
    }
}

/// 导入卡片包（内部实现）
///
/// 调用方负责把整个过程包在一个事务里。校验失败时在任何写入之前返回
/// [`StorageError::Validation`]。成功时返回模块更新或插入是否生效；
/// 包中没有模块名时只导入卡片并返回 `true`。
pub fn insert_card_pack_internal(
    conn: &Connection,
    pack: &CardPack,
    mode: MergeMode,
) -> StorageResult<bool> {
    let category_name = pack
        .category_name
        .as_deref()
        .ok_or_else(|| StorageError::Validation("卡片包缺少分类名称".to_string()))?;

    // 查找或创建分类
    let category_id = match CategoryRepository::find_by_name_internal(conn, category_name)? {
        Some(category) => category.id,
        None => {
            let language = pack.language.as_deref().ok_or_else(|| {
                StorageError::Validation(format!("新建分类 {:?} 需要指定语言", category_name))
            })?;
            CategoryRepository::insert_internal(conn, &Category::new(category_name, language))?
        }
    };

    // 插入卡片并记录 ID
    let card_ids = CardRepository::insert_batch_internal(conn, category_id, &pack.card_list)?;

    let Some(module_name) = pack.module_name.as_deref() else {
        tracing::info!(
            category = category_name,
            cards = card_ids.len(),
            "card pack imported without module"
        );
        return Ok(true);
    };

    // 创建或更新模块
    let applied = match ModuleRepository::find_by_name_internal(conn, module_name)? {
        Some(module) => {
            let merged = mode.merge(&module.card_ids, &card_ids);
            let affected = ModuleRepository::update_cards_internal(conn, module.id, &merged)?;
            tracing::info!(
                category = category_name,
                module = module_name,
                module_id = module.id,
                ?mode,
                cards = merged.len(),
                "card pack merged into existing module"
            );
            affected > 0
        }
        None => {
            let module = Module::new(category_id, module_name, card_ids);
            let id = ModuleRepository::insert_internal(conn, &module)?;
            tracing::info!(
                category = category_name,
                module = module_name,
                module_id = id,
                cards = module.card_ids.len(),
                "card pack imported into new module"
            );
            id > 0
        }
    };

    Ok(applied)
}
