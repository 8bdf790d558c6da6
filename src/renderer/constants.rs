//! 着色器常量
//!
//! 参数化三角形模式下，顶点着色器从 `b0` 读取的数据。

use bytemuck::{Pod, Zeroable};

use super::vertex::aspect_ratio;

/// D3D12 要求常量缓冲区按 256 字节对齐
pub const CONSTANT_BUFFER_ALIGNMENT: u64 = 256;

/// 与 HLSL `cbuffer SceneConstants : register(b0)` 对应
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SceneConstants {
    /// 纵向缩放比例（窗口宽高比）
    pub ratio: f32,
}

impl SceneConstants {
    pub fn new(ratio: f32) -> Self {
        Self { ratio }
    }

    /// 常量缓冲区资源需要的字节数
    pub fn buffer_size() -> u64 {
        aligned_size(std::mem::size_of::<Self>() as u64)
    }
}

/// CPU 侧持久映射、可直接覆盖的常量缓冲区
pub trait MappedConstants {
    fn write(&mut self, constants: &SceneConstants);
}

/// 按当前窗口尺寸重新计算比例并覆盖映射内存
///
/// 每帧录制命令前调用一次，此时 GPU 已完成上一帧。
pub fn update_frame_constants<M: MappedConstants>(
    buffer: &mut M,
    width: u32,
    height: u32,
) -> SceneConstants {
    let constants = SceneConstants::new(aspect_ratio(width, height));
    buffer.write(&constants);
    constants
}

/// 向上对齐到常量缓冲区边界
pub fn aligned_size(size: u64) -> u64 {
    (size + CONSTANT_BUFFER_ALIGNMENT - 1) & !(CONSTANT_BUFFER_ALIGNMENT - 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aligned_size() {
        assert_eq!(aligned_size(0), 0);
        assert_eq!(aligned_size(1), 256);
        assert_eq!(aligned_size(256), 256);
        assert_eq!(aligned_size(257), 512);
    }

    #[test]
    fn test_scene_constants_buffer_size() {
        assert_eq!(std::mem::size_of::<SceneConstants>(), 4);
        assert_eq!(SceneConstants::buffer_size(), 256);
    }

    /// 记录每次写入的常量
    #[derive(Default)]
    struct RecordingBuffer {
        writes: Vec<SceneConstants>,
    }

    impl MappedConstants for RecordingBuffer {
        fn write(&mut self, constants: &SceneConstants) {
            self.writes.push(*constants);
        }
    }

    #[test]
    fn test_constants_rewritten_every_frame() {
        let mut buffer = RecordingBuffer::default();

        for _ in 0..3 {
            update_frame_constants(&mut buffer, 1280, 720);
        }

        assert_eq!(buffer.writes.len(), 3);
        assert!(buffer
            .writes
            .iter()
            .all(|c| (c.ratio - 1280.0 / 720.0).abs() < f32::EPSILON));
    }

    #[test]
    fn test_frame_constants_follow_window_size() {
        let mut buffer = RecordingBuffer::default();

        let first = update_frame_constants(&mut buffer, 800, 800);
        let second = update_frame_constants(&mut buffer, 1600, 800);
        let degenerate = update_frame_constants(&mut buffer, 1600, 0);

        assert_eq!(first.ratio, 1.0);
        assert_eq!(second.ratio, 2.0);
        assert_eq!(degenerate.ratio, 1.0);
        assert_eq!(buffer.writes, vec![first, second, degenerate]);
    }

    #[test]
    fn test_scene_constants_bytes() {
        let constants = SceneConstants::new(1.5);
        assert_eq!(bytemuck::bytes_of(&constants), &1.5f32.to_ne_bytes());
    }
}
