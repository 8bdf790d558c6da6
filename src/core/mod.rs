//! 核心功能模块
//!
//! 与图形 API 无关的基础设施：日志、配置和错误处理。

pub mod config;
pub mod error;
pub mod log;

pub use config::{Config, TriangleMode};
pub use error::{GraphicsError, HelloTriangleError, Result};
