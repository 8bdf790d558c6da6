//! DirectX 12 设备
//!
//! # 初始化流程
//!
//! 1. 启用调试层（Debug 模式且配置允许）
//! 2. 创建 DXGI 工厂
//! 3. 选择适配器（硬件或 WARP）
//! 4. 创建 D3D12 设备
//! 5. 创建命令队列与命令分配器

use tracing::{debug, info, warn};
use windows::{
    core::*, Win32::Graphics::Direct3D::*, Win32::Graphics::Direct3D12::*,
    Win32::Graphics::Dxgi::*,
};

use super::graphics_error;
use crate::core::config::GraphicsConfig;
use crate::core::error::{GraphicsError, HelloTriangleError, Result};

const MIN_FEATURE_LEVEL: D3D_FEATURE_LEVEL = D3D_FEATURE_LEVEL_11_0;

/// 设备、工厂、命令队列和命令分配器
///
/// 字段按销毁顺序声明：先释放依赖设备的对象，最后释放工厂。
pub struct GraphicsDevice {
    pub command_allocator: ID3D12CommandAllocator,
    pub command_queue: ID3D12CommandQueue,
    pub device: ID3D12Device,
    pub factory: IDXGIFactory4,
    adapter_name: String,
}

impl GraphicsDevice {
    pub fn new(config: &GraphicsConfig) -> Result<Self> {
        unsafe {
            if cfg!(debug_assertions) && config.debug_layer {
                enable_debug_layer();
            }

            let factory_flags = if cfg!(debug_assertions) && config.debug_layer {
                DXGI_CREATE_FACTORY_DEBUG
            } else {
                DXGI_CREATE_FACTORY_FLAGS(0)
            };
            let factory: IDXGIFactory4 = CreateDXGIFactory2(factory_flags)
                .map_err(graphics_error(GraphicsError::DeviceCreation, "CreateDXGIFactory2"))?;

            let adapter: IDXGIAdapter1 = if config.use_warp_device {
                factory
                    .EnumWarpAdapter()
                    .map_err(graphics_error(GraphicsError::DeviceCreation, "EnumWarpAdapter"))?
            } else {
                hardware_adapter(&factory)?
            };
            let adapter_name = adapter_description(&adapter);

            let mut device: Option<ID3D12Device> = None;
            D3D12CreateDevice(&adapter, MIN_FEATURE_LEVEL, &mut device)
                .map_err(graphics_error(GraphicsError::DeviceCreation, "D3D12CreateDevice"))?;
            let device = device.ok_or_else(|| {
                GraphicsError::DeviceCreation("D3D12CreateDevice returned no device".to_string())
            })?;

            info!(adapter = %adapter_name, warp = config.use_warp_device, "D3D12 device created");

            let queue_desc = D3D12_COMMAND_QUEUE_DESC {
                Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
                Flags: D3D12_COMMAND_QUEUE_FLAG_NONE,
                ..Default::default()
            };
            let command_queue: ID3D12CommandQueue = device
                .CreateCommandQueue(&queue_desc)
                .map_err(graphics_error(GraphicsError::DeviceCreation, "CreateCommandQueue"))?;

            let command_allocator: ID3D12CommandAllocator = device
                .CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT)
                .map_err(graphics_error(GraphicsError::ResourceCreation, "CreateCommandAllocator"))?;

            debug!("Command queue and allocator created");

            Ok(Self {
                command_allocator,
                command_queue,
                device,
                factory,
                adapter_name,
            })
        }
    }

    pub fn adapter_name(&self) -> &str {
        &self.adapter_name
    }
}

unsafe fn enable_debug_layer() {
    let mut debug: Option<ID3D12Debug> = None;
    match D3D12GetDebugInterface(&mut debug) {
        Ok(()) => {
            if let Some(debug) = debug {
                debug.EnableDebugLayer();
                debug!("DX12 Debug Layer enabled");
            }
        }
        Err(e) => warn!(error = %e, "Failed to enable DX12 Debug Layer"),
    }
}

/// 第一个支持 D3D12 的非软件适配器
unsafe fn hardware_adapter(factory: &IDXGIFactory4) -> Result<IDXGIAdapter1> {
    for i in 0.. {
        let adapter = match factory.EnumAdapters1(i) {
            Ok(a) => a,
            Err(_) => break,
        };

        let desc = adapter
            .GetDesc1()
            .map_err(graphics_error(GraphicsError::DeviceCreation, "GetDesc1"))?;

        if (desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32) != 0 {
            continue;
        }

        // 只检查支持情况，不真正创建设备
        if D3D12CreateDevice(
            &adapter,
            MIN_FEATURE_LEVEL,
            std::ptr::null_mut::<Option<ID3D12Device>>(),
        )
        .is_ok()
        {
            return Ok(adapter);
        }
    }

    Err(HelloTriangleError::Graphics(GraphicsError::DeviceCreation(
        "No hardware adapter supports Direct3D 12 (try --warp)".to_string(),
    )))
}

unsafe fn adapter_description(adapter: &IDXGIAdapter1) -> String {
    match adapter.GetDesc1() {
        Ok(desc) => {
            let len = desc
                .Description
                .iter()
                .position(|&c| c == 0)
                .unwrap_or(desc.Description.len());
            String::from_utf16_lossy(&desc.Description[..len]).trim().to_string()
        }
        Err(_) => "<unknown adapter>".to_string(),
    }
}
