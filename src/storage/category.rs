//! Category 数据库操作

use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

use crate::storage::models::Category;
use crate::storage::{StorageError, StorageResult};

/// 分类数据库操作仓库
pub struct CategoryRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CategoryRepository {
    /// 创建新的 CategoryRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取连接锁
    fn get_conn(&self) -> StorageResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 插入分类，返回新 ID
    pub fn insert(&self, category: &Category) -> StorageResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_internal(&conn, category)
    }

    /// 根据 ID 获取分类
    pub fn get(&self, id: i64) -> StorageResult<Option<Category>> {
        let conn = self.get_conn()?;
        Self::get_internal(&conn, id)
    }

    /// 根据名称查找分类
    pub fn find_by_name(&self, name: &str) -> StorageResult<Option<Category>> {
        let conn = self.get_conn()?;
        Self::find_by_name_internal(&conn, name)
    }

    /// 获取全部分类
    pub fn get_all(&self) -> StorageResult<Vec<Category>> {
        let conn = self.get_conn()?;
        Self::get_all_internal(&conn)
    }

    /// 分类表是否为空
    pub fn is_empty(&self) -> StorageResult<bool> {
        let conn = self.get_conn()?;
        Self::is_empty_internal(&conn)
    }

    // ============================================================
    // 内部实现方法（静态方法，接受 &Connection）
    // ============================================================

    /// 插入分类（内部实现）
    ///
    /// 不检查重名。
    pub fn insert_internal(conn: &Connection, category: &Category) -> StorageResult<i64> {
        conn.execute(
            "INSERT INTO categories (name, language) VALUES (?1, ?2)",
            params![category.name, category.language],
        )?;

        let id = conn.last_insert_rowid();
        tracing::debug!(id, name = %category.name, "category inserted");
        Ok(id)
    }

    /// 根据 ID 获取分类（内部实现）
    pub fn get_internal(conn: &Connection, id: i64) -> StorageResult<Option<Category>> {
        let category = conn
            .query_row(
                "SELECT id, name, language FROM categories WHERE id = ?1",
                params![id],
                |row| Category::from_row(row),
            )
            .optional()?;

        Ok(category)
    }

    /// 根据名称查找分类（内部实现）
    ///
    /// 名称不唯一时取最早创建的一条。
    pub fn find_by_name_internal(conn: &Connection, name: &str) -> StorageResult<Option<Category>> {
        let category = conn
            .query_row(
                "SELECT id, name, language FROM categories WHERE name = ?1 ORDER BY id LIMIT 1",
                params![name],
                |row| Category::from_row(row),
            )
            .optional()?;

        Ok(category)
    }

    /// 获取全部分类（内部实现），按 (语言, 名称) 排序
    pub fn get_all_internal(conn: &Connection) -> StorageResult<Vec<Category>> {
        let mut stmt = conn.prepare(
            r#"
            SELECT id, name, language
            FROM categories
            ORDER BY language COLLATE UNICODE, name COLLATE UNICODE
            "#,
        )?;

        let categories = stmt
            .query_map([], |row| Category::from_row(row))?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(categories)
    }

    /// 分类表是否为空（内部实现）
    pub fn is_empty_internal(conn: &Connection) -> StorageResult<bool> {
        let exists: bool =
            conn.query_row("SELECT EXISTS(SELECT 1 FROM categories)", [], |row| row.get(0))?;
        Ok(!exists)
    }
}
