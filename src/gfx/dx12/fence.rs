//! DX12 Fence：`ID3D12Fence` + 自动重置事件

use windows::Win32::Foundation::{CloseHandle, HANDLE, WAIT_FAILED};
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject, INFINITE};

use super::graphics_error;
use crate::core::error::{GraphicsError, Result};
use crate::renderer::sync::{FenceValue, GpuFence};

pub struct Fence {
    fence: ID3D12Fence,
    command_queue: ID3D12CommandQueue,
    event: HANDLE,
}

impl Fence {
    /// Fence 对象从 0 开始，事件为自动重置、初始未触发
    pub fn new(device: &ID3D12Device, command_queue: &ID3D12CommandQueue) -> Result<Self> {
        unsafe {
            let fence: ID3D12Fence = device
                .CreateFence(0, D3D12_FENCE_FLAG_NONE)
                .map_err(graphics_error(GraphicsError::Synchronization, "CreateFence"))?;
            let event = CreateEventA(None, false, false, None)
                .map_err(graphics_error(GraphicsError::Synchronization, "CreateEventA"))?;

            Ok(Self {
                fence,
                command_queue: command_queue.clone(),
                event,
            })
        }
    }
}

impl GpuFence for Fence {
    fn signal(&mut self, value: FenceValue) -> Result<()> {
        unsafe {
            self.command_queue
                .Signal(&self.fence, value.value())
                .map_err(graphics_error(GraphicsError::Synchronization, "Signal"))
        }
    }

    fn completed_value(&self) -> FenceValue {
        FenceValue::new(unsafe { self.fence.GetCompletedValue() })
    }

    fn wait_for(&mut self, value: FenceValue) -> Result<()> {
        unsafe {
            self.fence
                .SetEventOnCompletion(value.value(), self.event)
                .map_err(graphics_error(GraphicsError::Synchronization, "SetEventOnCompletion"))?;

            if WaitForSingleObject(self.event, INFINITE) == WAIT_FAILED {
                return Err(GraphicsError::Synchronization(format!(
                    "WaitForSingleObject failed on fence value {}",
                    value.value()
                ))
                .into());
            }
        }
        Ok(())
    }
}

impl Drop for Fence {
    fn drop(&mut self) {
        if !self.event.is_invalid() {
            unsafe {
                let _ = CloseHandle(self.event);
            }
        }
    }
}
