//! D3D12 Hello Triangle 程序入口
//!
//! # 使用方法
//!
//! ```bash
//! # 使用配置文件（config.toml，不存在时使用默认值，解析失败时退出）
//! cargo run
//!
//! # 参数化模式 + WARP 软件适配器
//! cargo run -- --parameterized --warp
//! ```
//!
//! 窗口尺寸固定，不处理 Resize。

use std::sync::Arc;

use anyhow::Context;
use d3d12_hello_triangle::core::{log, Config};
use d3d12_hello_triangle::renderer::Renderer;
use tracing::{error, info};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::window::WindowBuilder;

/// 应用程序入口点
///
/// # 初始化流程
///
/// 1. 加载配置文件（config.toml）并应用命令行参数
/// 2. 初始化日志系统
/// 3. 创建事件循环、窗口和渲染器
/// 4. 启动主循环，每次重绘渲染一帧
fn main() -> anyhow::Result<()> {
    // 1. 加载配置（在初始化日志之前）
    let mut config =
        Config::from_file_or_default("config.toml").context("Failed to load config.toml")?;
    config.apply_args(std::env::args());
    config.validate().context("Invalid configuration")?;

    // 2. 初始化日志系统
    let log_file = config
        .logging
        .file_output
        .then(|| config.logging.log_file.as_str());
    log::init_logger(config.logging.level, config.logging.file_output, log_file)?;
    info!(version = env!("CARGO_PKG_VERSION"), "D3D12 Hello Triangle starting...");

    info!(
        width = config.window.width,
        height = config.window.height,
        mode = config.graphics.triangle.name(),
        warp = config.graphics.use_warp_device,
        vsync = config.graphics.vsync,
        "Graphics configuration"
    );

    // 3. 创建窗口和渲染器
    let event_loop = EventLoop::new().context("Failed to create event loop")?;
    let window = Arc::new(
        WindowBuilder::new()
            .with_title(config.window.title.as_str())
            .with_inner_size(LogicalSize::new(config.window.width, config.window.height))
            .with_resizable(false)
            .build(&event_loop)
            .context("Failed to create window")?,
    );

    let mut renderer = Renderer::new(window.clone(), &config)
        .context("Failed to initialize renderer")?;
    info!(back_buffers = renderer.frame_count(), "Renderer initialized successfully");

    // 4. 主循环
    event_loop.run(move |event, elwt| match event {
        Event::WindowEvent {
            event: WindowEvent::CloseRequested,
            ..
        } => {
            info!(frames = renderer.frames_rendered(), "Close requested, shutting down...");
            elwt.exit();
        }
        Event::WindowEvent {
            event: WindowEvent::RedrawRequested,
            ..
        } => {
            if let Err(e) = renderer.render() {
                error!("Render failed: {}", e);
                elwt.exit();
            }
        }
        Event::AboutToWait => window.request_redraw(),
        _ => (),
    })?;

    Ok(())
}
