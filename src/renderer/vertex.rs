//! 顶点数据定义
//!
//! - 使用 `#[repr(C)]` 确保内存布局与 HLSL 输入布局一致
//! - 实现 `Pod` 和 `Zeroable` trait 以便直接拷贝到上传堆

use bytemuck::{Pod, Zeroable};

/// 三角形顶点半宽（归一化设备坐标）
const TRIANGLE_EXTENT: f32 = 0.25;

/// 顶点结构体
///
/// # 内存布局
///
/// - `position`：前 12 字节（3 个 f32），对应 `POSITION`
/// - `color`：后 16 字节（4 个 f32），对应 `COLOR`
///
/// 总大小：28 字节
#[repr(C)]
#[derive(Default, Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [f32; 4],
}

impl Vertex {
    pub const fn new(position: [f32; 3], color: [f32; 4]) -> Self {
        Self { position, color }
    }

    /// `color` 字段在顶点中的字节偏移，供输入布局使用
    pub const COLOR_OFFSET: u32 = 12;

    /// 顶点步长
    pub const STRIDE: u32 = std::mem::size_of::<Vertex>() as u32;
}

/// 计算宽高比，高度为 0 时返回 1.0
pub fn aspect_ratio(width: u32, height: u32) -> f32 {
    if height == 0 {
        1.0
    } else {
        width as f32 / height as f32
    }
}

/// 创建三角形顶点数据
///
/// 纵向坐标乘以 `aspect_ratio`：顶部红色、右下绿色、左下蓝色。
/// 参数化模式下传入 1.0，由顶点着色器在 GPU 上施加比例。
pub fn triangle_vertices(aspect_ratio: f32) -> [Vertex; 3] {
    let e = TRIANGLE_EXTENT;
    [
        Vertex::new([0.0, e * aspect_ratio, 0.0], [1.0, 0.0, 0.0, 1.0]),
        Vertex::new([e, -e * aspect_ratio, 0.0], [0.0, 1.0, 0.0, 1.0]),
        Vertex::new([-e, -e * aspect_ratio, 0.0], [0.0, 0.0, 1.0, 1.0]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::mem;

    #[test]
    fn test_vertex_layout() {
        assert_eq!(mem::size_of::<Vertex>(), 28, "Vertex size should be 28 bytes");
        assert_eq!(mem::align_of::<Vertex>(), 4, "Vertex alignment should be 4 bytes");
        assert_eq!(Vertex::STRIDE, 28);

        let vertex = Vertex::default();
        let vertex_ptr = &vertex as *const Vertex as usize;
        let color_ptr = &vertex.color as *const [f32; 4] as usize;
        assert_eq!((color_ptr - vertex_ptr) as u32, Vertex::COLOR_OFFSET);
    }

    #[test]
    fn test_triangle_scaled_by_aspect_ratio() {
        let vertices = triangle_vertices(2.0);
        assert_eq!(vertices[0].position, [0.0, 0.5, 0.0]);
        assert_eq!(vertices[1].position, [0.25, -0.5, 0.0]);
        assert_eq!(vertices[2].position, [-0.25, -0.5, 0.0]);
    }

    #[test]
    fn test_triangle_colors() {
        let vertices = triangle_vertices(1.0);
        assert_eq!(vertices[0].color, [1.0, 0.0, 0.0, 1.0]);
        assert_eq!(vertices[1].color, [0.0, 1.0, 0.0, 1.0]);
        assert_eq!(vertices[2].color, [0.0, 0.0, 1.0, 1.0]);
    }

    #[test]
    fn test_aspect_ratio() {
        assert_eq!(aspect_ratio(1280, 720), 1280.0 / 720.0);
        assert_eq!(aspect_ratio(800, 0), 1.0);
    }

    #[test]
    fn test_vertices_as_bytes() {
        let vertices = triangle_vertices(1.0);
        let bytes: &[u8] = bytemuck::cast_slice(&vertices);
        assert_eq!(bytes.len(), 3 * 28);
    }
}
