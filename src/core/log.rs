//! 日志系统模块
//!
//! 基于 `tracing` 提供结构化的日志记录功能，
//! 支持控制台输出，以及按天滚动的文件输出。

use std::path::Path;
use tracing::Level;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    prelude::*,
    filter::LevelFilter,
    EnvFilter,
};

use super::config::LogLevel;
use super::error::{HelloTriangleError, Result};

const DEFAULT_LOG_FILE: &str = "hello_triangle.log";

/// 初始化日志系统
///
/// 必须在程序开始时调用一次，重复调用会返回 `HelloTriangleError::Log`。
///
/// `RUST_LOG` 环境变量存在时优先于配置中的级别。
///
/// # 示例
///
/// ```no_run
/// use d3d12_hello_triangle::core::{config::LogLevel, log};
///
/// // 仅控制台输出
/// log::init_logger(LogLevel::Info, false, None).unwrap();
/// ```
pub fn init_logger(level: LogLevel, file_output: bool, log_file_path: Option<&str>) -> Result<()> {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from_level(level.into()).into())
        .from_env_lossy();

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true);

    let file_layer = if file_output {
        let log_path = log_file_path.unwrap_or(DEFAULT_LOG_FILE);
        let path = Path::new(log_path);
        let directory = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        let filename = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or(DEFAULT_LOG_FILE);

        let file_appender = RollingFileAppender::new(Rotation::DAILY, directory, filename);

        Some(
            fmt::layer()
                .with_target(true)
                .with_ansi(false)  // 文件不需要 ANSI 颜色
                .with_writer(file_appender),
        )
    } else {
        None
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| HelloTriangleError::Log(e.to_string()))
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Trace => Level::TRACE,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warn => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level_conversion() {
        assert_eq!(Level::from(LogLevel::Info), Level::INFO);
        assert_eq!(Level::from(LogLevel::Error), Level::ERROR);
        assert_eq!(Level::from(LogLevel::Trace), Level::TRACE);
    }

    #[test]
    fn test_second_init_fails() {
        // 第一次调用可能已被同进程内的其他测试抢先
        let _ = init_logger(LogLevel::Warn, false, None);
        let second = init_logger(LogLevel::Debug, false, None);
        assert!(matches!(second, Err(HelloTriangleError::Log(_))));
    }
}
