//! DX12 三角形渲染器
//!
//! 每帧固定四步：录制命令 → 提交 → Present → 等待 Fence。
//! 等待完成后才会复用唯一的命令分配器，所以 CPU 与 GPU 之间不存在帧重叠。

use std::sync::Arc;
use raw_window_handle::{HasWindowHandle, RawWindowHandle};
use tracing::{debug, error, info, trace};
use windows::Win32::Foundation::HWND;
use winit::window::Window;

use super::{Display, Fence, FrameTarget, GraphicsDevice, GraphicsPipeline, ShaderConstantBuffer};
use crate::core::error::{HelloTriangleError, Result};
use crate::core::{Config, TriangleMode};
use crate::renderer::constants::{update_frame_constants, SceneConstants};
use crate::renderer::sync::FrameFence;
use crate::renderer::vertex::aspect_ratio;

/// 字段按释放顺序声明（与创建顺序相反）
pub struct HelloTriangle {
    frame_fence: FrameFence<Fence>,
    constant_buffer: Option<ShaderConstantBuffer>,
    pipeline: GraphicsPipeline,
    display: Display,
    device: GraphicsDevice,
    window: Arc<Window>,
    clear_color: [f32; 4],
    vsync: bool,
    frames_rendered: u64,
}

impl HelloTriangle {
    pub fn new(window: Arc<Window>, config: &Config) -> Result<Self> {
        let size = window.inner_size();
        let (width, height) = (size.width, size.height);
        let ratio = aspect_ratio(width, height);
        let mode = config.graphics.triangle;

        let hwnd = window_hwnd(&window)?;

        let device = GraphicsDevice::new(&config.graphics)?;
        let display = Display::new(&device, hwnd, width, height, config.graphics.frame_count)?;
        let pipeline = GraphicsPipeline::new(
            &device.device,
            &device.command_allocator,
            mode,
            width,
            height,
            ratio,
        )?;

        let constant_buffer = match mode {
            TriangleMode::Parameterized => Some(ShaderConstantBuffer::new(
                &device.device,
                SceneConstants::new(ratio),
            )?),
            TriangleMode::Static => None,
        };

        let frame_fence = FrameFence::new(Fence::new(&device.device, &device.command_queue)?);

        info!(
            adapter = device.adapter_name(),
            width,
            height,
            mode = mode.name(),
            "DX12 renderer initialized"
        );

        Ok(Self {
            frame_fence,
            constant_buffer,
            pipeline,
            display,
            device,
            window,
            clear_color: config.graphics.clear_color,
            vsync: config.graphics.vsync,
            frames_rendered: 0,
        })
    }

    /// 渲染一帧并等待 GPU 完成
    pub fn render(&mut self) -> Result<()> {
        if let Some(cb) = self.constant_buffer.as_mut() {
            let size = self.window.inner_size();
            let constants = update_frame_constants(cb, size.width, size.height);
            trace!(ratio = constants.ratio, "Constant buffer updated");
        }

        let frame_index = self.display.current_back_buffer_index();

        let target = FrameTarget {
            render_target: self.display.render_target(frame_index),
            rtv_handle: self.display.rtv_handle(frame_index),
            clear_color: self.clear_color,
            constant_buffer: self
                .constant_buffer
                .as_ref()
                .map(|cb| cb.gpu_virtual_address()),
        };
        self.pipeline
            .populate_command_list(&self.device.command_allocator, &target)?;

        let command_list = self.pipeline.command_list()?;
        unsafe {
            self.device
                .command_queue
                .ExecuteCommandLists(&[Some(command_list)]);
        }

        self.display.present(self.vsync)?;

        let fence_value = self.frame_fence.wait_for_previous_frame()?;
        self.frames_rendered += 1;

        trace!(frame_index, fence_value = fence_value.value(), "Frame completed");
        Ok(())
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    pub fn back_buffer_count(&self) -> usize {
        self.display.frame_count()
    }
}

impl Drop for HelloTriangle {
    fn drop(&mut self) {
        // GPU 可能仍在使用最后一帧的资源
        if let Err(e) = self.frame_fence.wait_for_previous_frame() {
            error!("Failed to wait for GPU before shutdown: {}", e);
        }
        debug!(frames = self.frames_rendered, "DX12 renderer dropped");
    }
}

fn window_hwnd(window: &Window) -> Result<HWND> {
    let handle = window
        .window_handle()
        .map_err(|e| HelloTriangleError::Initialization(format!("Failed to get window handle: {}", e)))?;

    match handle.as_raw() {
        RawWindowHandle::Win32(win32_handle) => {
            Ok(HWND(win32_handle.hwnd.get() as *mut std::ffi::c_void))
        }
        _ => Err(HelloTriangleError::Initialization(
            "Expected Win32 window handle on Windows platform".to_string(),
        )),
    }
}
