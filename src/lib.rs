//! D3D12 Hello Triangle
//!
//! 用 DirectX 12 在窗口中绘制一个顶点着色的三角形。
//! 支持两种模式：比例写入顶点数据的静态模式，以及通过常量缓冲区传入比例的参数化模式。
//!
//! # 模块结构
//!
//! - `core`: 配置、日志、错误处理
//! - `renderer`: 统一渲染接口，以及与平台无关的顶点、常量、着色器和同步逻辑
//! - `gfx`: DirectX 12 后端（仅 Windows）
//!
//! # 使用示例
//!
//! ```no_run
//! use d3d12_hello_triangle::core::Config;
//!
//! let mut config = Config::default();
//! config.apply_args(["app", "--parameterized", "--warp"].iter().map(|s| s.to_string()));
//! assert!(config.validate().is_ok());
//! ```

pub mod core;
pub mod gfx;
pub mod renderer;
