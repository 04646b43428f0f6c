//! 日志初始化
//!
//! 日志写到 stderr（stdout 留给命令输出），`FLEXICARDS_FILE_LOGS` 打开时
//! 另写一份按天滚动的文件日志。

use std::path::PathBuf;

use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::env_bool;

/// 滚动日志文件名前缀
pub const LOG_FILE_NAME: &str = "flexicards.log";

const DEFAULT_LEVEL: &str = "info";
const DEFAULT_LOG_DIR: &str = "./logs";

/// 日志配置
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// `EnvFilter` 指令，来自 `RUST_LOG`
    pub level: String,
    /// 是否写文件日志（`FLEXICARDS_FILE_LOGS`）
    pub file_logs: bool,
    /// 文件日志目录（`FLEXICARDS_LOG_DIR`）
    pub log_dir: PathBuf,
}

impl LogConfig {
    pub fn from_env() -> Self {
        Self {
            level: std::env::var("RUST_LOG").unwrap_or_else(|_| DEFAULT_LEVEL.to_string()),
            file_logs: env_bool("FLEXICARDS_FILE_LOGS", false),
            log_dir: std::env::var("FLEXICARDS_LOG_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR)),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LEVEL.to_string(),
            file_logs: false,
            log_dir: PathBuf::from(DEFAULT_LOG_DIR),
        }
    }
}

/// 持有文件日志的后台写线程，丢弃时刷新剩余日志
pub struct FileLogGuard {
    _guard: WorkerGuard,
}

/// 初始化全局 subscriber
///
/// 只能调用一次。无效的过滤指令退回 `info`，日志目录无法创建时
/// 只写 stderr；两种情况都在初始化后记一条 warn。
pub fn init_tracing(config: &LogConfig) -> Option<FileLogGuard> {
    let (env_filter, rejected_level) = build_filter(&config.level);
    let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(true);

    let mut dir_error = None;
    let mut guard = None;
    let file_layer = if config.file_logs {
        match std::fs::create_dir_all(&config.log_dir) {
            Ok(()) => {
                let appender =
                    RollingFileAppender::new(Rotation::DAILY, &config.log_dir, LOG_FILE_NAME);
                let (writer, worker) = tracing_appender::non_blocking(appender);
                guard = Some(FileLogGuard { _guard: worker });
                Some(
                    fmt::layer()
                        .with_writer(writer)
                        .with_ansi(false)
                        .with_target(true),
                )
            }
            Err(err) => {
                dir_error = Some(err);
                None
            }
        }
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();

    if let Some(level) = rejected_level {
        tracing::warn!(level = %level, "invalid RUST_LOG directive, using info");
    }
    if let Some(err) = dir_error {
        tracing::warn!(
            log_dir = %config.log_dir.display(),
            error = %err,
            "cannot create log directory, file logging disabled"
        );
    }
    tracing::debug!(file_logs = guard.is_some(), "logging initialized");

    guard
}

/// 解析过滤指令，失败时返回默认过滤器和被拒绝的指令
fn build_filter(level: &str) -> (EnvFilter, Option<String>) {
    match EnvFilter::try_new(level) {
        Ok(filter) => (filter, None),
        Err(_) => (EnvFilter::new(DEFAULT_LEVEL), Some(level.to_string())),
    }
}
