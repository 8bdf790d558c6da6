//! 参数化模式的常量缓冲区
//!
//! 上传堆资源在整个生命周期内保持映射，每帧直接覆盖 CPU 侧内存。

use tracing::debug;
use windows::Win32::Graphics::Direct3D12::*;

use super::graphics_error;
use super::pipeline::create_upload_buffer;
use crate::core::error::{GraphicsError, Result};
use crate::renderer::constants::{MappedConstants, SceneConstants};

pub struct ShaderConstantBuffer {
    resource: ID3D12Resource,
    mapped: *mut u8,
}

impl ShaderConstantBuffer {
    pub fn new(device: &ID3D12Device, initial: SceneConstants) -> Result<Self> {
        unsafe {
            let size = SceneConstants::buffer_size();
            let resource = create_upload_buffer(device, size)?;

            let read_range = D3D12_RANGE { Begin: 0, End: 0 };
            let mut mapped = std::ptr::null_mut();
            resource
                .Map(0, Some(&read_range), Some(&mut mapped))
                .map_err(graphics_error(GraphicsError::ResourceCreation, "Map(constant buffer)"))?;

            let mut buffer = Self {
                resource,
                mapped: mapped as *mut u8,
            };
            buffer.write(&initial);

            debug!(size, "Constant buffer created and mapped");
            Ok(buffer)
        }
    }

    pub fn gpu_virtual_address(&self) -> u64 {
        unsafe { self.resource.GetGPUVirtualAddress() }
    }
}

impl MappedConstants for ShaderConstantBuffer {
    /// 调用时 GPU 不得正在读取该缓冲区（每帧结束时已等待 Fence）
    fn write(&mut self, constants: &SceneConstants) {
        let bytes = bytemuck::bytes_of(constants);
        unsafe {
            std::ptr::copy_nonoverlapping(bytes.as_ptr(), self.mapped, bytes.len());
        }
    }
}

impl Drop for ShaderConstantBuffer {
    fn drop(&mut self) {
        unsafe {
            self.resource.Unmap(0, None);
        }
        debug!("Constant buffer unmapped");
    }
}
