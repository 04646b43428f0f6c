//! FlexiCards 本地存储核心
//!
//! 分类、卡片、学习模块的持久化，卡片包导入，以及学习进度跟踪。

pub mod config;
pub mod logging;
pub mod seed;
pub mod session;
pub mod storage;

pub use session::{SessionSummary, StudySession};
pub use storage::{
    Card, CardPack, CardRow, Category, Module, ModuleCards, ModuleSummary, ProgressSource,
    StorageError, StorageManager, StorageResult,
};
