//! Module 数据库操作
//!
//! 模块的成员列表和进度列表都以文本形式保存在 modules 表中，
//! 编码和解码统一经过 [`crate::storage::id_list`]。

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::storage::id_list::format_id_list;
use crate::storage::models::{Module, ModuleSummary, ProgressSource};
use crate::storage::{StorageError, StorageResult};

/// 模块数据库操作仓库
pub struct ModuleRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ModuleRepository {
    /// 创建新的 ModuleRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取连接锁
    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 插入模块，返回新 ID
    pub fn insert(&self, module: &Module) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_internal(&conn, module)
    }

    /// 根据 ID 获取模块
    pub fn get(&self, id: i64) -> StorageResult<Option<Module>> {
        let conn = self.get_conn()?;
        Self::get_internal(&conn, id)
    }

    /// 根据名称查找模块
    pub fn find_by_name(&self, name: &str) -> StorageResult<Option<Module>> {
        let conn = self.get_conn()?;
        Self::find_by_name_internal(&conn, name)
    }

    /// 获取分类下的模块列表
    pub fn get_summaries_by_category(&self, category_id: i64) -> StorageResult<Vec<ModuleSummary>> {
        let conn = self.get_conn()?;
        Self::get_summaries_by_category_internal(&conn, category_id)
    }

    /// 覆盖成员列表，返回受影响行数
    pub fn update_cards(&self, id: i64, card_ids: &[i64]) -> StorageResult<usize> {
        let conn = self.get_conn()?;
        Self::update_cards_internal(&conn, id, card_ids)
    }

    /// 覆盖进度列表，返回受影响行数
    pub fn update_progress(&self, id: i64, unanswered: &[i64]) -> StorageResult<usize> {
        let conn = self.get_conn()?;
        Self::update_progress_internal(&conn, id, unanswered)
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    /// 插入模块（内部实现）
    pub fn insert_internal(conn: &Connection, module: &Module) -> StorageResult<i64> {
        conn.execute(
            r#"
            INSERT INTO modules (categoryId, name, cards, unanswered)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                module.category_id,
                module.name,
                format_id_list(&module.card_ids),
                module.unanswered_card_ids.as_deref().map(format_id_list),
            ],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, name = %module.name, cards = module.card_ids.len(), "module inserted");
        Ok(id)
    }

    /// 根据 ID 获取模块（内部实现）
    pub fn get_internal(conn: &Connection, id: i64) -> StorageResult<Option<Module>> {
        let module = conn
            .query_row(
                "SELECT id, categoryId, name, cards, unanswered FROM modules WHERE id = ?1",
                params![id],
                |row| Module::from_row(row),
            )
            .optional()?;

        Ok(module)
    }

    /// 根据名称查找模块（内部实现）
    ///
    /// 名称在全库范围内查找，不区分分类；重名时取最早创建的一条。
    pub fn find_by_name_internal(conn: &Connection, name: &str) -> StorageResult<Option<Module>> {
        let module = conn
            .query_row(
                r#"
                SELECT id, categoryId, name, cards, unanswered
                FROM modules
                WHERE name = ?1
                ORDER BY id
                LIMIT 1
                "#,
                params![name],
                |row| Module::from_row(row),
            )
            .optional()?;

        Ok(module)
    }

    /// 获取分类下的模块列表（内部实现），按名称排序
    pub fn get_summaries_by_category_internal(
        conn: &Connection,
        category_id: i64,
    ) -> StorageResult<Vec<ModuleSummary>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name
            FROM modules
            WHERE categoryId = ?1
            ORDER BY name COLLATE UNICODE
            "#,
        )?;

        let modules = stmt
            .query_map(params![category_id], |row| ModuleSummary::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(modules)
    }

    /// 覆盖成员列表（内部实现）
    pub fn update_cards_internal(
        conn: &Connection,
        id: i64,
        card_ids: &[i64],
    ) -> StorageResult<usize> {
        let affected = conn.execute(
            "UPDATE modules SET cards = ?2 WHERE id = ?1",
            params![id, format_id_list(card_ids)],
        )?;
        Ok(affected)
    }

    /// 覆盖进度列表（内部实现）
    ///
    /// 不校验 `unanswered` 是否为成员列表的子集。
    pub fn update_progress_internal(
        conn: &Connection,
        id: i64,
        unanswered: &[i64],
    ) -> StorageResult<usize> {
        let affected = conn.execute(
            "UPDATE modules SET unanswered = ?2 WHERE id = ?1",
            params![id, format_id_list(unanswered)],
        )?;
        Ok(affected)
    }
}

/// 决定本次学习要读取的卡片 ID
///
/// 请求"仅未掌握"而进度列为 NULL 时，退回到全部成员并标记 [`ProgressSource::Fallback`]。
/// 因此"从未学习"与"全部未掌握"在卡片集合上无法区分，只能通过标记区分。
pub fn study_card_ids(module: &Module, unanswered_only: bool) -> (Vec<i64>, ProgressSource) {
    if !unanswered_only {
        return (module.card_ids.clone(), ProgressSource::Recorded);
    }

    match &module.unanswered_card_ids {
        Some(ids) => (ids.clone(), ProgressSource::Recorded),
        None => (module.card_ids.clone(), ProgressSource::Fallback),
    }
}
