//! 着色器定义
//!
//! HLSL 源码在编译期嵌入，运行时由 DX12 后端通过 D3DCompile 编译。
//!
//! ```text
//! 顶点数据 -> VSMain / VSMainScaled -> 光栅化 -> PSMain -> 渲染目标
//! ```

use crate::core::TriangleMode;

/// 三角形着色器源码
pub const TRIANGLE_HLSL: &str = include_str!("shaders/triangle.hlsl");

/// 着色器阶段：入口函数与目标 profile
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShaderStage {
    pub entry_point: &'static str,
    pub target: &'static str,
}

/// 直接输出顶点位置
pub const VERTEX_STATIC: ShaderStage = ShaderStage { entry_point: "VSMain", target: "vs_5_0" };

/// 纵向坐标乘以常量缓冲区中的 `ratio`
pub const VERTEX_SCALED: ShaderStage = ShaderStage { entry_point: "VSMainScaled", target: "vs_5_0" };

pub const PIXEL: ShaderStage = ShaderStage { entry_point: "PSMain", target: "ps_5_0" };

/// 根据三角形模式选择顶点着色器
pub fn vertex_stage(mode: TriangleMode) -> ShaderStage {
    match mode {
        TriangleMode::Static => VERTEX_STATIC,
        TriangleMode::Parameterized => VERTEX_SCALED,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_stage_selection() {
        assert_eq!(vertex_stage(TriangleMode::Static).entry_point, "VSMain");
        assert_eq!(vertex_stage(TriangleMode::Parameterized).entry_point, "VSMainScaled");
    }

    #[test]
    fn test_source_defines_entry_points() {
        for stage in [VERTEX_STATIC, VERTEX_SCALED, PIXEL] {
            assert!(
                TRIANGLE_HLSL.contains(&format!("{}(", stage.entry_point)),
                "missing entry point {}",
                stage.entry_point
            );
        }
        assert!(TRIANGLE_HLSL.contains("register(b0)"));
    }
}
