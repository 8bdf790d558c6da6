//! 渲染器模块
//!
//! 对外提供统一的 `Renderer` 接口，内部按平台选择图形后端。
//! 与具体 API 无关的部分（顶点、常量、着色器描述、Fence 协议）也放在这里，
//! 可以在任何平台上单独测试。

use std::sync::Arc;

use tracing::info;
use winit::window::Window;

use crate::core::error::Result;
use crate::core::Config;
#[cfg(target_os = "windows")]
use crate::gfx::HelloTriangle;
#[cfg(not(target_os = "windows"))]
use crate::core::error::HelloTriangleError;

pub mod constants;
pub mod shaders;
pub mod sync;
pub mod vertex;

/// 图形后端枚举
///
/// 非 Windows 平台上没有可用变体，`Renderer::new` 会直接返回错误。
enum Backend {
    #[cfg(target_os = "windows")]
    Dx12(HelloTriangle),
}

pub struct Renderer {
    backend: Backend,
}

impl Renderer {
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        #[cfg(target_os = "windows")]
        {
            info!(mode = config.graphics.triangle.name(), "Initializing DirectX 12 backend");
            let renderer = HelloTriangle::new(window, config)?;
            Ok(Self {
                backend: Backend::Dx12(renderer),
            })
        }

        #[cfg(not(target_os = "windows"))]
        {
            let _ = (window, config);
            info!("No graphics backend available on this platform");
            Err(HelloTriangleError::Initialization(
                "Direct3D 12 is only available on Windows".to_string(),
            ))
        }
    }

    /// 渲染一帧，返回时 GPU 已完成该帧
    pub fn render(&mut self) -> Result<()> {
        match &mut self.backend {
            #[cfg(target_os = "windows")]
            Backend::Dx12(renderer) => renderer.render(),
            #[cfg(not(target_os = "windows"))]
            _ => unreachable!(),
        }
    }

    /// 交换链后备缓冲区数量
    pub fn frame_count(&self) -> usize {
        match &self.backend {
            #[cfg(target_os = "windows")]
            Backend::Dx12(renderer) => renderer.back_buffer_count(),
            #[cfg(not(target_os = "windows"))]
            _ => unreachable!(),
        }
    }

    /// 已提交并完成的帧数
    pub fn frames_rendered(&self) -> u64 {
        match &self.backend {
            #[cfg(target_os = "windows")]
            Backend::Dx12(renderer) => renderer.frames_rendered(),
            #[cfg(not(target_os = "windows"))]
            _ => unreachable!(),
        }
    }
}
