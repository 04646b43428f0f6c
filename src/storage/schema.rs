//! 表结构管理
//!
//! 三张表：categories、cards、modules。没有增量迁移：
//! 版本号记录在 `PRAGMA user_version`，版本不一致时整体删除重建。

use rusqlite::Connection;

use crate::storage::{StorageError, StorageResult};

/// 当前表结构版本
pub const SCHEMA_VERSION: i32 = 1;

/// 建表 SQL
const CREATE_TABLES: &str = r#"
CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    language TEXT
);

CREATE TABLE IF NOT EXISTS cards (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    categoryId INTEGER,
    front TEXT,
    back TEXT
);

-- cards / unanswered: 逗号分隔的卡片 ID，unanswered 允许为 NULL
CREATE TABLE IF NOT EXISTS modules (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    categoryId INTEGER,
    name TEXT,
    cards TEXT,
    unanswered TEXT
);

CREATE INDEX IF NOT EXISTS idx_cards_category ON cards(categoryId);
CREATE INDEX IF NOT EXISTS idx_modules_name ON modules(name);
"#;

/// 删表 SQL
const DROP_TABLES: &str = r#"
DROP TABLE IF EXISTS categories;
DROP TABLE IF EXISTS cards;
DROP TABLE IF EXISTS modules;
"#;

/// 读取已记录的表结构版本，新数据库为 0
pub fn current_version(conn: &Connection) -> StorageResult<i32> {
    let version = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;
    Ok(version)
}

fn set_version(conn: &Connection, version: i32) -> StorageResult<()> {
    conn.pragma_update(None, "user_version", version)?;
    Ok(())
}

/// 创建缺失的表，不影响已有数据
pub fn create_tables(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(CREATE_TABLES)
        .map_err(|e| StorageError::Schema(format!("创建表失败: {}", e)))?;
    set_version(conn, SCHEMA_VERSION)
}

/// 删除全部表
pub fn drop_tables(conn: &Connection) -> StorageResult<()> {
    conn.execute_batch(DROP_TABLES)
        .map_err(|e| StorageError::Schema(format!("删除表失败: {}", e)))?;
    Ok(())
}

/// 删除并重建全部表
pub fn recreate_tables(conn: &Connection) -> StorageResult<()> {
    drop_tables(conn)?;
    create_tables(conn)
}

/// 打开数据库时调用：版本一致或新库时仅建表，版本不一致时删除重建
pub fn ensure_schema(conn: &Connection) -> StorageResult<()> {
    let version = current_version(conn)?;

    if version != 0 && version != SCHEMA_VERSION {
        tracing::warn!(
            found = version,
            expected = SCHEMA_VERSION,
            "schema version mismatch, wiping and recreating tables"
        );
        return recreate_tables(conn);
    }

    create_tables(conn)
}
