//! DirectX 12 图形 API 实现模块
//!
//! - `device`: 工厂、适配器、设备、命令队列
//! - `display`: 交换链和渲染目标视图
//! - `pipeline`: 根签名、PSO、顶点缓冲区、命令录制
//! - `constant_buffer`: 参数化模式的常量缓冲区
//! - `fence`: CPU-GPU 同步
//! - `renderer`: 把以上组件串成每帧流程

pub mod constant_buffer;
pub mod device;
pub mod display;
pub mod fence;
pub mod pipeline;
pub mod renderer;

pub use constant_buffer::ShaderConstantBuffer;
pub use device::GraphicsDevice;
pub use display::Display;
pub use fence::Fence;
pub use pipeline::{FrameTarget, GraphicsPipeline};
pub use renderer::HelloTriangle;

use crate::core::error::{GraphicsError, HelloTriangleError};

/// 把 `windows::core::Error` 转换为带调用名的 `GraphicsError`
pub(crate) fn graphics_error(
    kind: fn(String) -> GraphicsError,
    call: &'static str,
) -> impl FnOnce(windows::core::Error) -> HelloTriangleError {
    move |e| HelloTriangleError::Graphics(kind(format!("{} failed: {}", call, e)))
}
