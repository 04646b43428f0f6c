//! Card 数据库操作
//!
//! 卡片只追加，没有更新和删除。

use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

use crate::storage::models::{Card, CardRow};
use crate::storage::{StorageError, StorageResult};

/// 卡片结果排序方式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardOrder {
    /// 按正面内容（UNICODE 排序规则）
    Front,
    /// 每次查询随机
    Random,
}

impl CardOrder {
    fn as_sql(self) -> &'static str {
        match self {
            CardOrder::Front => "front COLLATE UNICODE",
            CardOrder::Random => "RANDOM()",
        }
    }
}

/// 卡片数据库操作仓库
pub struct CardRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CardRepository {
    /// 创建新的 CardRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取连接锁
    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 插入卡片，返回新 ID
    pub fn insert(&self, card: &Card) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_internal(&conn, card)
    }

    /// 批量插入卡片，按输入顺序返回新 ID
    pub fn insert_batch(
        &self,
        category_id: i64,
        contents: &[(String, String)],
    ) -> StorageResult<Vec<i64>> {
        let conn = self.get_conn()?;
        Self::insert_batch_internal(&conn, category_id, contents)
    }

    /// 获取分类下全部卡片
    pub fn get_by_category(&self, category_id: i64) -> StorageResult<Vec<CardRow>> {
        let conn = self.get_conn()?;
        Self::get_by_category_internal(&conn, category_id)
    }

    /// 根据 ID 列表获取卡片
    pub fn get_by_ids(&self, ids: &[i64], order: CardOrder) -> StorageResult<Vec<CardRow>> {
        let conn = self.get_conn()?;
        Self::get_by_ids_internal(&conn, ids, order)
    }

    /// 在分类中按子串过滤卡片
    pub fn filter(&self, category_id: i64, constraint: &str) -> StorageResult<Vec<CardRow>> {
        let conn = self.get_conn()?;
        Self::filter_internal(&conn, category_id, constraint)
    }

    /// 是否存在指定正面内容的卡片
    pub fn exists_with_front(&self, front: &str) -> StorageResult<bool> {
        let conn = self.get_conn()?;
        Self::exists_with_front_internal(&conn, front)
    }

    /// 卡片表是否为空
    pub fn is_empty(&self) -> StorageResult<bool> {
        let conn = self.get_conn()?;
        Self::is_empty_internal(&conn)
    }

    /// 分类下的卡片数量
    pub fn count_by_category(&self, category_id: i64) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        Self::count_by_category_internal(&conn, category_id)
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    /// 插入卡片（内部实现）
    pub fn insert_internal(conn: &Connection, card: &Card) -> StorageResult<i64> {
        conn.execute(
            "INSERT INTO cards (categoryId, front, back) VALUES (?1, ?2, ?3)",
            params![card.category_id, card.front_content, card.back_content],
        )?;

        Ok(conn.last_insert_rowid())
    }

    /// 批量插入卡片（内部实现）
    pub fn insert_batch_internal(
        conn: &Connection,
        category_id: i64,
        contents: &[(String, String)],
    ) -> StorageResult<Vec<i64>> {
        let mut stmt =
            conn.prepare_cached("INSERT INTO cards (categoryId, front, back) VALUES (?1, ?2, ?3)")?;

        let mut ids = Vec::with_capacity(contents.len());
        for (front, back) in contents {
            ids.push(stmt.insert(params![category_id, front, back])?);
        }

        tracing::debug!(category_id, count = ids.len(), "cards inserted");
        Ok(ids)
    }

    /// 获取分类下全部卡片（内部实现），按正面内容排序
    pub fn get_by_category_internal(
        conn: &Connection,
        category_id: i64,
    ) -> StorageResult<Vec<CardRow>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, front, back
            FROM cards
            WHERE categoryId = ?1
            ORDER BY front COLLATE UNICODE
            "#,
        )?;

        let cards = stmt
            .query_map(params![category_id], |row| CardRow::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    /// 根据 ID 列表获取卡片（内部实现）
    ///
    /// 不存在的 ID 被忽略；重复 ID 只返回一行。
    pub fn get_by_ids_internal(
        conn: &Connection,
        ids: &[i64],
        order: CardOrder,
    ) -> StorageResult<Vec<CardRow>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        // ID 列表作为一个 JSON 参数绑定，不受 SQLite 变量个数上限约束
        let id_json = serde_json::to_string(ids)
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let sql = format!(
            r#"
            SELECT id, front, back
            FROM cards
            WHERE id IN (SELECT value FROM json_each(?1))
            ORDER BY {}
            "#,
            order.as_sql()
        );

        let mut stmt = conn.prepare(&sql)?;
        let cards = stmt
            .query_map(params![id_json], |row| CardRow::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    /// 按子串过滤卡片（内部实现）
    ///
    /// 正面或背面包含 `constraint` 即命中（LIKE，ASCII 不区分大小写）。
    /// `%`、`_` 按字面匹配。
    pub fn filter_internal(
        conn: &Connection,
        category_id: i64,
        constraint: &str,
    ) -> StorageResult<Vec<CardRow>> {
        let pattern = like_pattern(constraint);

        let mut stmt = conn.prepare(
            r#"
            SELECT id, front, back
            FROM cards
            WHERE categoryId = ?1
              AND (front LIKE ?2 ESCAPE '\' OR back LIKE ?2 ESCAPE '\')
            ORDER BY front COLLATE UNICODE
            "#,
        )?;

        let cards = stmt
            .query_map(params![category_id, pattern], |row| CardRow::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(cards)
    }

    /// 是否存在指定正面内容的卡片（内部实现），精确匹配
    pub fn exists_with_front_internal(conn: &Connection, front: &str) -> StorageResult<bool> {
        let exists: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM cards WHERE front = ?1)",
            params![front],
            |row| row.get(0),
        )?;
        Ok(exists)
    }

    /// 卡片表是否为空（内部实现）
    pub fn is_empty_internal(conn: &Connection) -> StorageResult<bool> {
        let exists: bool =
            conn.query_row("SELECT EXISTS(SELECT 1 FROM cards)", [], |row| row.get(0))?;
        Ok(!exists)
    }

    /// 分类下的卡片数量（内部实现）
    pub fn count_by_category_internal(conn: &Connection, category_id: i64) -> StorageResult<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM cards WHERE categoryId = ?1",
            params![category_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

/// 构造 `%constraint%`，转义 LIKE 通配符
fn like_pattern(constraint: &str) -> String {
    let mut pattern = String::with_capacity(constraint.len() + 2);
    pattern.push('%');
    for ch in constraint.chars() {
        if matches!(ch, '%' | '_' | '\\') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}
