//! 运行配置
//!
//! 全部来自环境变量（二进制入口先加载 `.env`），缺失或无法解析时使用默认值。

use std::path::{Path, PathBuf};
use std::time::Duration;

pub use crate::logging::LogConfig;

const DEFAULT_DB_PATH: &str = "./data/flexicards.db";

/// 进程配置
#[derive(Debug, Clone)]
pub struct Config {
    pub storage: StorageConfig,
    pub log: LogConfig,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            storage: StorageConfig::from_env(),
            log: LogConfig::from_env(),
        }
    }
}

/// 数据库配置
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// 数据库文件路径（`FLEXICARDS_DB_PATH`），父目录在打开时创建
    pub db_path: PathBuf,
    /// 日志模式（`FLEXICARDS_JOURNAL_MODE`）
    pub journal_mode: SqliteJournalMode,
    /// 锁等待超时（`FLEXICARDS_BUSY_TIMEOUT_MS`）
    pub busy_timeout: Duration,
}

impl StorageConfig {
    pub fn from_env() -> Self {
        let db_path = std::env::var("FLEXICARDS_DB_PATH")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DB_PATH));

        let journal_mode = std::env::var("FLEXICARDS_JOURNAL_MODE")
            .ok()
            .as_deref()
            .and_then(SqliteJournalMode::parse)
            .unwrap_or(SqliteJournalMode::Wal);

        let busy_timeout_ms = env_u64("FLEXICARDS_BUSY_TIMEOUT_MS", 5000);

        Self {
            db_path,
            journal_mode,
            busy_timeout: Duration::from_millis(busy_timeout_ms),
        }
    }

    /// 指定路径，其余取默认值
    pub fn with_path(db_path: &Path) -> Self {
        Self {
            db_path: db_path.to_path_buf(),
            ..Self::default()
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            journal_mode: SqliteJournalMode::Wal,
            busy_timeout: Duration::from_millis(5000),
        }
    }
}

/// SQLite `journal_mode` 取值
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SqliteJournalMode {
    Wal,
    Delete,
    Truncate,
    Persist,
    Memory,
    Off,
}

impl SqliteJournalMode {
    /// 不区分大小写解析
    pub fn parse(value: &str) -> Option<Self> {
        match value.to_ascii_uppercase().as_str() {
            "WAL" => Some(Self::Wal),
            "DELETE" => Some(Self::Delete),
            "TRUNCATE" => Some(Self::Truncate),
            "PERSIST" => Some(Self::Persist),
            "MEMORY" => Some(Self::Memory),
            "OFF" => Some(Self::Off),
            _ => None,
        }
    }

    pub const fn as_pragma_value(self) -> &'static str {
        match self {
            SqliteJournalMode::Wal => "WAL",
            SqliteJournalMode::Delete => "DELETE",
            SqliteJournalMode::Truncate => "TRUNCATE",
            SqliteJournalMode::Persist => "PERSIST",
            SqliteJournalMode::Memory => "MEMORY",
            SqliteJournalMode::Off => "OFF",
        }
    }
}

pub(crate) fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref() {
        Some("true") | Some("1") => true,
        Some("false") | Some("0") => false,
        _ => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(default)
}
