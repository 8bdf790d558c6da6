//! 交换链与渲染目标视图
//!
//! 交换链不会重建：窗口尺寸在创建时固定。

use tracing::info;
use windows::{
    core::*, Win32::Foundation::HWND, Win32::Graphics::Direct3D12::*,
    Win32::Graphics::Dxgi::Common::*, Win32::Graphics::Dxgi::*,
};

use super::graphics_error;
use super::GraphicsDevice;
use crate::core::error::{GraphicsError, Result};

/// 后台缓冲区格式，PSO 的 RTV 格式与之一致
pub const BACK_BUFFER_FORMAT: DXGI_FORMAT = DXGI_FORMAT_R8G8B8A8_UNORM;

pub struct Display {
    /// 每个后台缓冲区一个
    render_targets: Vec<ID3D12Resource>,
    rtv_heap: ID3D12DescriptorHeap,
    rtv_descriptor_size: usize,
    swap_chain: IDXGISwapChain3,
}

impl Display {
    pub fn new(
        device: &GraphicsDevice,
        hwnd: HWND,
        width: u32,
        height: u32,
        frame_count: u32,
    ) -> Result<Self> {
        unsafe {
            let swap_chain_desc = DXGI_SWAP_CHAIN_DESC1 {
                Width: width,
                Height: height,
                Format: BACK_BUFFER_FORMAT,
                SampleDesc: DXGI_SAMPLE_DESC {
                    Count: 1,
                    ..Default::default()
                },
                BufferUsage: DXGI_USAGE_RENDER_TARGET_OUTPUT,
                BufferCount: frame_count,
                SwapEffect: DXGI_SWAP_EFFECT_FLIP_DISCARD,
                ..Default::default()
            };

            // 交换链需要命令队列来执行 Present
            let swap_chain: IDXGISwapChain1 = device
                .factory
                .CreateSwapChainForHwnd(&device.command_queue, hwnd, &swap_chain_desc, None, None)
                .map_err(graphics_error(GraphicsError::SwapchainError, "CreateSwapChainForHwnd"))?;
            let swap_chain: IDXGISwapChain3 = swap_chain
                .cast()
                .map_err(graphics_error(GraphicsError::SwapchainError, "IDXGISwapChain3 cast"))?;

            let rtv_heap_desc = D3D12_DESCRIPTOR_HEAP_DESC {
                NumDescriptors: frame_count,
                Type: D3D12_DESCRIPTOR_HEAP_TYPE_RTV,
                Flags: D3D12_DESCRIPTOR_HEAP_FLAG_NONE,
                NodeMask: 0,
            };
            let rtv_heap: ID3D12DescriptorHeap = device
                .device
                .CreateDescriptorHeap(&rtv_heap_desc)
                .map_err(graphics_error(GraphicsError::ResourceCreation, "CreateDescriptorHeap(RTV)"))?;
            let rtv_descriptor_size = device
                .device
                .GetDescriptorHandleIncrementSize(D3D12_DESCRIPTOR_HEAP_TYPE_RTV)
                as usize;

            let rtv_start = rtv_heap.GetCPUDescriptorHandleForHeapStart();
            let mut render_targets = Vec::with_capacity(frame_count as usize);
            for i in 0..frame_count {
                let surface: ID3D12Resource = swap_chain
                    .GetBuffer(i)
                    .map_err(graphics_error(GraphicsError::SwapchainError, "GetBuffer"))?;
                let handle = D3D12_CPU_DESCRIPTOR_HANDLE {
                    ptr: rtv_start.ptr + i as usize * rtv_descriptor_size,
                };
                device.device.CreateRenderTargetView(&surface, None, handle);
                render_targets.push(surface);
            }

            info!(width, height, buffers = frame_count, "Swap chain created");

            Ok(Self {
                render_targets,
                rtv_heap,
                rtv_descriptor_size,
                swap_chain,
            })
        }
    }

    pub fn current_back_buffer_index(&self) -> usize {
        unsafe { self.swap_chain.GetCurrentBackBufferIndex() as usize }
    }

    pub fn render_target(&self, index: usize) -> &ID3D12Resource {
        &self.render_targets[index]
    }

    pub fn rtv_handle(&self, index: usize) -> D3D12_CPU_DESCRIPTOR_HANDLE {
        let start = unsafe { self.rtv_heap.GetCPUDescriptorHandleForHeapStart() };
        D3D12_CPU_DESCRIPTOR_HANDLE {
            ptr: start.ptr + index * self.rtv_descriptor_size,
        }
    }

    /// 垂直同步时同步间隔为 1
    pub fn present(&self, vsync: bool) -> Result<()> {
        let sync_interval = if vsync { 1 } else { 0 };
        unsafe {
            self.swap_chain
                .Present(sync_interval, DXGI_PRESENT(0))
                .ok()
                .map_err(graphics_error(GraphicsError::SwapchainError, "Present"))
        }
    }

    pub fn frame_count(&self) -> usize {
        self.render_targets.len()
    }
}
