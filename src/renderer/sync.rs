//! GPU 同步机制模块
//!
//! 每帧提交后，CPU 发出一个新的 Fence 值并阻塞等待 GPU 追上，
//! 之后才复用命令分配器。等待没有超时，也不能取消。
//!
//! ```text
//! render -> present -> signal(v) -> v += 1 -> [completed < v ? wait(v)]
//! ```

use tracing::trace;

use crate::core::error::Result;

/// Fence 值
///
/// 用于CPU-GPU同步的单调递增值。
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct FenceValue(u64);

impl FenceValue {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u64 {
        self.0
    }

    pub fn increment(&mut self) {
        self.0 += 1;
    }
}

/// 图形 API 的 Fence 原语
///
/// DX12 后端由 `ID3D12Fence` + 事件句柄实现，测试中可以用内存实现替代。
pub trait GpuFence {
    /// 在命令队列末尾写入 `value`
    fn signal(&mut self, value: FenceValue) -> Result<()>;

    /// GPU 已完成的最大 Fence 值
    fn completed_value(&self) -> FenceValue;

    /// 阻塞直到 GPU 完成 `value`
    fn wait_for(&mut self, value: FenceValue) -> Result<()>;
}

/// 帧同步器
///
/// 持有下一次要 signal 的值，初始为 1（Fence 对象本身从 0 开始）。
pub struct FrameFence<F: GpuFence> {
    fence: F,
    next_value: FenceValue,
}

impl<F: GpuFence> FrameFence<F> {
    pub fn new(fence: F) -> Self {
        Self {
            fence,
            next_value: FenceValue::new(1),
        }
    }

    /// 等待上一帧完成
    ///
    /// 返回本次 signal 的值。
    pub fn wait_for_previous_frame(&mut self) -> Result<FenceValue> {
        let signaled = self.next_value;
        self.fence.signal(signaled)?;
        self.next_value.increment();

        if self.fence.completed_value() < signaled {
            trace!(fence_value = signaled.value(), "Waiting for GPU");
            self.fence.wait_for(signaled)?;
        }

        Ok(signaled)
    }

    /// 下一次将要 signal 的值
    pub fn next_value(&self) -> FenceValue {
        self.next_value
    }

    pub fn inner(&self) -> &F {
        &self.fence
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 立即完成所有工作的 GPU
    #[derive(Default)]
    struct InstantGpu {
        completed: u64,
        signals: Vec<u64>,
        waits: Vec<u64>,
    }

    impl GpuFence for InstantGpu {
        fn signal(&mut self, value: FenceValue) -> Result<()> {
            self.signals.push(value.value());
            self.completed = value.value();
            Ok(())
        }

        fn completed_value(&self) -> FenceValue {
            FenceValue::new(self.completed)
        }

        fn wait_for(&mut self, value: FenceValue) -> Result<()> {
            self.waits.push(value.value());
            Ok(())
        }
    }

    /// 只有在 CPU 等待时才推进的 GPU
    #[derive(Default)]
    struct LaggingGpu {
        completed: u64,
        pending: u64,
        waits: Vec<u64>,
    }

    impl GpuFence for LaggingGpu {
        fn signal(&mut self, value: FenceValue) -> Result<()> {
            self.pending = value.value();
            Ok(())
        }

        fn completed_value(&self) -> FenceValue {
            FenceValue::new(self.completed)
        }

        fn wait_for(&mut self, value: FenceValue) -> Result<()> {
            self.waits.push(value.value());
            self.completed = self.pending;
            Ok(())
        }
    }

    #[test]
    fn test_fence_value() {
        let mut fence = FenceValue::new(0);
        assert_eq!(fence.value(), 0);

        fence.increment();
        assert_eq!(fence.value(), 1);
        assert!(FenceValue::new(1) < FenceValue::new(2));
    }

    #[test]
    fn test_values_increase_by_one_per_frame() {
        let mut frame_fence = FrameFence::new(InstantGpu::default());
        assert_eq!(frame_fence.next_value().value(), 1);

        for expected in 1..=4 {
            let signaled = frame_fence.wait_for_previous_frame().unwrap();
            assert_eq!(signaled.value(), expected);
        }

        assert_eq!(frame_fence.inner().signals, vec![1, 2, 3, 4]);
        assert_eq!(frame_fence.next_value().value(), 5);
    }

    #[test]
    fn test_no_wait_when_gpu_caught_up() {
        let mut frame_fence = FrameFence::new(InstantGpu::default());
        frame_fence.wait_for_previous_frame().unwrap();
        frame_fence.wait_for_previous_frame().unwrap();
        assert!(frame_fence.inner().waits.is_empty());
    }

    #[test]
    fn test_waits_when_gpu_lags() {
        let mut frame_fence = FrameFence::new(LaggingGpu::default());
        frame_fence.wait_for_previous_frame().unwrap();
        frame_fence.wait_for_previous_frame().unwrap();

        assert_eq!(frame_fence.inner().waits, vec![1, 2]);
        assert_eq!(frame_fence.inner().completed_value().value(), 2);
    }
}
