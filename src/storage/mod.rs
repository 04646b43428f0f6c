//! SQLite 本地存储模块
//!
//! 管理分类、卡片、模块三类记录，提供：
//! - 记录的创建与查询
//! - 卡片包批量导入（追加 / 覆盖模块成员）
//! - 学习进度（未掌握卡片）的记录与读取

// ============================================================
// 子模块声明
// ============================================================

pub mod card;
pub mod category;
pub mod collation;
pub mod id_list;
pub mod models;
pub mod module;
pub mod pack;
pub mod schema;

// ============================================================
// 重新导出主要类型
// ============================================================

pub use card::{CardOrder, CardRepository};
pub use category::CategoryRepository;
pub use id_list::{format_id_list, parse_id_list, IdListError};
pub use models::*;
pub use module::ModuleRepository;
pub use pack::MergeMode;

// ============================================================
// 依赖导入
// ============================================================

use rusqlite::Connection;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

use crate::config::StorageConfig;

// ============================================================
// 错误类型定义
// ============================================================

/// 存储模块错误类型
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("数据库错误: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("参数校验失败: {0}")]
    Validation(String),

    #[error("数据未找到: {0}")]
    NotFound(String),

    #[error("序列化错误: {0}")]
    Serialization(String),

    #[error("表结构错误: {0}")]
    Schema(String),

    #[error("锁获取失败: {0}")]
    LockError(String),
}

impl From<IdListError> for StorageError {
    fn from(err: IdListError) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

pub type StorageResult<T> = Result<T, StorageError>;

// ============================================================
// StorageManager - 存储管理器
// ============================================================

/// 存储管理器
///
/// 在应用启动时创建一次，通过引用传给所有使用方。
/// 连接由一把互斥锁保护，所有读写串行执行。
pub struct StorageManager {
    conn: Arc<Mutex<Connection>>,
    db_path: String,
}

impl StorageManager {
    /// 按配置打开数据库
    ///
    /// 自动创建父目录、设置 PRAGMA、注册排序规则并初始化表结构。
    pub fn open(config: &StorageConfig) -> StorageResult<Self> {
        if let Some(parent) = config.db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let connection = Connection::open(&config.db_path)?;
        connection.busy_timeout(config.busy_timeout)?;
        connection.execute_batch(&format!(
            "PRAGMA journal_mode={};
             PRAGMA synchronous=NORMAL;",
            config.journal_mode.as_pragma_value()
        ))?;

        let manager = Self::from_connection(
            connection,
            config.db_path.to_string_lossy().to_string(),
        )?;
        tracing::info!(path = %manager.db_path, "storage opened");
        Ok(manager)
    }

    /// 以默认配置打开指定路径的数据库
    pub fn new<P: AsRef<Path>>(db_path: P) -> StorageResult<Self> {
        Self::open(&StorageConfig::with_path(db_path.as_ref()))
    }

    /// 创建内存数据库（用于测试）
    pub fn in_memory() -> StorageResult<Self> {
        let connection = Connection::open_in_memory()?;
        Self::from_connection(connection, ":memory:".to_string())
    }

    fn from_connection(connection: Connection, db_path: String) -> StorageResult<Self> {
        collation::register(&connection)?;

        let manager = Self {
            conn: Arc::new(Mutex::new(connection)),
            db_path,
        };
        manager.init()?;

        Ok(manager)
    }

    /// 获取数据库路径
    pub fn db_path(&self) -> &str {
        &self.db_path
    }

    /// 获取数据库连接的锁
    pub fn get_connection(&self) -> StorageResult<MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| StorageError::LockError(e.to_string()))
    }

    /// 执行事务
    ///
    /// 闭包返回 `Ok` 时提交；返回错误时事务在离开作用域时回滚。
    pub fn transaction<F, T>(&self, f: F) -> StorageResult<T>
    where
        F: FnOnce(&Connection) -> StorageResult<T>,
    {
        let mut conn = self.get_connection()?;

        let tx = conn.transaction()?;
        let result = f(&tx)?;
        tx.commit()?;

        Ok(result)
    }

    /// 获取分类仓库
    pub fn categories(&self) -> CategoryRepository {
        CategoryRepository::new(Arc::clone(&self.conn))
    }

    /// 获取卡片仓库
    pub fn cards(&self) -> CardRepository {
        CardRepository::new(Arc::clone(&self.conn))
    }

    /// 获取模块仓库
    pub fn modules(&self) -> ModuleRepository {
        ModuleRepository::new(Arc::clone(&self.conn))
    }

    // ========== 初始化 ==========

    /// 创建缺失的表，幂等，不会删除已有数据
    pub fn init(&self) -> StorageResult<()> {
        let conn = self.get_connection()?;
        schema::ensure_schema(&conn)
    }

    /// 删除并重建全部表，清空所有数据
    pub fn reset_all(&self) -> StorageResult<()> {
        self.transaction(schema::recreate_tables)?;
        tracing::info!(path = %self.db_path, "all tables reset");
        Ok(())
    }

    // ========== 创建 ==========

    /// 插入分类，返回新 ID
    pub fn add_category(&self, category: &Category) -> StorageResult<i64> {
        self.categories().insert(category)
    }

    /// 插入卡片，返回新 ID
    pub fn add_card(&self, card: &Card) -> StorageResult<i64> {
        self.cards().insert(card)
    }

    /// 插入模块，返回新 ID
    pub fn add_module(&self, module: &Module) -> StorageResult<i64> {
        self.modules().insert(module)
    }

    /// 插入分类，返回生成的 ID 是否为正
    ///
    /// 不检查重名。
    pub fn create_category(&self, category: &Category) -> StorageResult<bool> {
        Ok(self.add_category(category)? > 0)
    }

    /// 插入卡片，返回生成的 ID 是否为正
    pub fn create_card(&self, card: &Card) -> StorageResult<bool> {
        Ok(self.add_card(card)? > 0)
    }

    /// 插入模块，返回生成的 ID 是否为正
    pub fn create_module(&self, module: &Module) -> StorageResult<bool> {
        Ok(self.add_module(module)? > 0)
    }

    // ========== 批量导入 ==========

    /// 导入卡片包
    ///
    /// `should_append_module` 为 true 时新卡片并入已有同名模块，否则覆盖其成员列表。
    /// 整个导入在一个事务中完成。缺少分类名，或需要新建分类但缺少语言时返回
    /// [`StorageError::Validation`]，且不产生任何写入。
    pub fn insert_card_pack(
        &self,
        pack: &CardPack,
        should_append_module: bool,
    ) -> StorageResult<bool> {
        let mode = MergeMode::from_append_flag(should_append_module);
        self.transaction(|conn| pack::insert_card_pack_internal(conn, pack, mode))
    }

    // ========== 学习进度 ==========

    /// 覆盖模块的未掌握卡片列表
    ///
    /// 不校验 ID 是否属于该模块。模块不存在时返回 [`StorageError::NotFound`]。
    pub fn update_module_progress(&self, module_id: i64, unanswered: &[i64]) -> StorageResult<()> {
        let affected = self.modules().update_progress(module_id, unanswered)?;
        if affected == 0 {
            return Err(StorageError::NotFound(format!("模块 {}", module_id)));
        }

        tracing::debug!(module_id, unanswered = unanswered.len(), "module progress updated");
        Ok(())
    }

    /// 获取模块的卡片
    ///
    /// `is_unanswered_only` 为 true 且从未记录过进度时退回到全部卡片，
    /// 结果中的 [`ProgressSource::Fallback`] 标记这种情况。
    /// 非随机时按正面内容排序。
    pub fn get_module_cards(
        &self,
        module_id: i64,
        is_random: bool,
        is_unanswered_only: bool,
    ) -> StorageResult<ModuleCards> {
        let conn = self.get_connection()?;

        let module = ModuleRepository::get_internal(&conn, module_id)?
            .ok_or_else(|| StorageError::NotFound(format!("模块 {}", module_id)))?;

        let (ids, progress) = module::study_card_ids(&module, is_unanswered_only);
        if progress == ProgressSource::Fallback {
            tracing::warn!(
                module_id,
                "no progress recorded for module, falling back to all cards"
            );
        }

        let order = if is_random {
            CardOrder::Random
        } else {
            CardOrder::Front
        };
        let cards = CardRepository::get_by_ids_internal(&conn, &ids, order)?;

        Ok(ModuleCards { cards, progress })
    }

    // ========== 查询 ==========

    /// 获取分类下全部卡片，按正面内容排序
    pub fn get_dictionary(&self, category_id: i64) -> StorageResult<Vec<CardRow>> {
        self.cards().get_by_category(category_id)
    }

    /// 在分类中查找正面或背面包含 `constraint` 的卡片，按正面内容排序
    pub fn filter_dictionary(
        &self,
        category_id: i64,
        constraint: &str,
    ) -> StorageResult<Vec<CardRow>> {
        self.cards().filter(category_id, constraint)
    }

    /// 获取全部分类，按 (语言, 名称) 排序
    pub fn get_categories(&self) -> StorageResult<Vec<Category>> {
        self.categories().get_all()
    }

    /// 获取分类下的模块 (id, name)，按名称排序
    pub fn get_modules(&self, category_id: i64) -> StorageResult<Vec<ModuleSummary>> {
        self.modules().get_summaries_by_category(category_id)
    }

    /// 根据 ID 获取分类
    pub fn get_category(&self, id: i64) -> StorageResult<Category> {
        self.categories()
            .get(id)?
            .ok_or_else(|| StorageError::NotFound(format!("分类 {}", id)))
    }

    /// 根据名称查找分类
    pub fn find_category_by_name(&self, name: &str) -> StorageResult<Option<Category>> {
        self.categories().find_by_name(name)
    }

    /// 根据 ID 获取模块
    pub fn get_module(&self, id: i64) -> StorageResult<Module> {
        self.modules()
            .get(id)?
            .ok_or_else(|| StorageError::NotFound(format!("模块 {}", id)))
    }

    /// 根据名称查找模块
    pub fn find_module_by_name(&self, name: &str) -> StorageResult<Option<Module>> {
        self.modules().find_by_name(name)
    }

    /// 分类下的卡片数量
    pub fn count_cards(&self, category_id: i64) -> StorageResult<i64> {
        self.cards().count_by_category(category_id)
    }

    /// 分类表是否为空
    pub fn is_categories_empty(&self) -> StorageResult<bool> {
        self.categories().is_empty()
    }

    /// 卡片表是否为空
    pub fn is_cards_empty(&self) -> StorageResult<bool> {
        self.cards().is_empty()
    }

    /// 是否存在正面内容完全相同的卡片
    pub fn find_card(&self, front_content: &str) -> StorageResult<bool> {
        self.cards().exists_with_front(front_content)
    }
}

// ============================================================
// 测试
// ============================================================
