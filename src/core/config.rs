//! 配置管理模块
//!
//! 支持从 TOML 配置文件加载，也支持命令行参数覆盖。
//!
//! # 配置文件格式 (config.toml)
//!
//! ```toml
//! [window]
//! width = 1280
//! height = 720
//! title = "D3D12 Hello Triangle"
//!
//! [graphics]
//! use_warp_device = false
//! debug_layer = true
//! vsync = true
//! frame_count = 2
//! triangle = "static"          # 或 "parameterized"
//! clear_color = [0.0, 0.2, 0.4, 1.0]
//!
//! [logging]
//! level = "info"               # trace, debug, info, warn, error
//! file_output = false
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;

use super::error::{ConfigError, HelloTriangleError, Result};

/// 交换链缓冲区数量的合法范围（DXGI 限制）
const MIN_FRAME_COUNT: u32 = 2;
const MAX_FRAME_COUNT: u32 = 16;

/// 渲染器配置
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// 窗口配置
    #[serde(default)]
    pub window: WindowConfig,

    /// 图形配置
    #[serde(default)]
    pub graphics: GraphicsConfig,

    /// 日志配置
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// 窗口配置
///
/// 窗口大小在创建后固定，交换链不会随窗口调整。
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowConfig {
    #[serde(default = "default_width")]
    pub width: u32,

    #[serde(default = "default_height")]
    pub height: u32,

    #[serde(default = "default_title")]
    pub title: String,
}

/// 图形配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphicsConfig {
    /// 使用 WARP 软件光栅化器代替硬件适配器
    #[serde(default)]
    pub use_warp_device: bool,

    /// Debug 构建下启用 D3D12 调试层
    #[serde(default = "default_debug_layer")]
    pub debug_layer: bool,

    /// 垂直同步
    #[serde(default = "default_vsync")]
    pub vsync: bool,

    /// 交换链后台缓冲区数量
    #[serde(default = "default_frame_count")]
    pub frame_count: u32,

    /// 三角形的宽高比处理方式
    #[serde(default)]
    pub triangle: TriangleMode,

    /// 清屏颜色（RGBA）
    #[serde(default = "default_clear_color")]
    pub clear_color: [f32; 4],
}

/// 三角形模式
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TriangleMode {
    /// 宽高比在创建顶点缓冲区时写入顶点数据
    #[default]
    Static,
    /// 宽高比通过常量缓冲区每帧传给顶点着色器
    Parameterized,
}

/// 日志配置
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: LogLevel,

    /// 是否输出到文件
    #[serde(default)]
    pub file_output: bool,

    #[serde(default = "default_log_file")]
    pub log_file: String,
}

/// 日志级别
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

// 默认值函数
fn default_width() -> u32 { 1280 }
fn default_height() -> u32 { 720 }
fn default_title() -> String { "D3D12 Hello Triangle".to_string() }
fn default_debug_layer() -> bool { true }
fn default_vsync() -> bool { true }
fn default_frame_count() -> u32 { 2 }
fn default_clear_color() -> [f32; 4] { [0.0, 0.2, 0.4, 1.0] }
fn default_log_level() -> LogLevel { LogLevel::Info }
fn default_log_file() -> String { "hello_triangle.log".to_string() }

impl Default for WindowConfig {
    fn default() -> Self {
        Self {
            width: default_width(),
            height: default_height(),
            title: default_title(),
        }
    }
}

impl Default for GraphicsConfig {
    fn default() -> Self {
        Self {
            use_warp_device: false,
            debug_layer: default_debug_layer(),
            vsync: default_vsync(),
            frame_count: default_frame_count(),
            triangle: TriangleMode::default(),
            clear_color: default_clear_color(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            file_output: false,
            log_file: default_log_file(),
        }
    }
}

impl Config {
    /// 从配置文件加载
    ///
    /// # 示例
    ///
    /// ```no_run
    /// use d3d12_hello_triangle::core::Config;
    ///
    /// let config = Config::from_file("config.toml").unwrap();
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy().to_string();

        let contents = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound(path_str.clone()))?;

        Self::from_toml_str(&contents)
    }

    /// 从 TOML 字符串解析
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()).into())
    }

    /// 从配置文件加载，文件不存在时使用默认配置
    ///
    /// 文件存在但无法解析时返回错误，不会退回默认值。
    pub fn from_file_or_default<P: AsRef<Path>>(path: P) -> Result<Self> {
        match Self::from_file(path) {
            Err(HelloTriangleError::Config(ConfigError::FileNotFound(_))) => Ok(Self::default()),
            other => other,
        }
    }

    /// 保存配置到文件
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;

        std::fs::write(path, contents)?;
        Ok(())
    }

    /// 从命令行参数覆盖配置
    ///
    /// 支持的参数：
    /// - `--warp`: 使用 WARP 软件适配器
    /// - `--static` / `--parameterized`: 选择三角形模式，同时出现时最后一个生效
    /// - `--no-vsync`: 关闭垂直同步
    /// - `--width <value>` / `--height <value>`: 窗口尺寸
    pub fn apply_args<I>(&mut self, args: I)
    where
        I: IntoIterator,
        I::Item: AsRef<str>,
    {
        let args: Vec<String> = args.into_iter().map(|s| s.as_ref().to_string()).collect();

        if args.iter().any(|a| a == "--warp") {
            self.graphics.use_warp_device = true;
        }

        if let Some(mode) = args.iter().rev().find_map(|a| match a.as_str() {
            "--static" => Some(TriangleMode::Static),
            "--parameterized" => Some(TriangleMode::Parameterized),
            _ => None,
        }) {
            self.graphics.triangle = mode;
        }

        if args.iter().any(|a| a == "--no-vsync") {
            self.graphics.vsync = false;
        }

        if let Some(width) = parse_flag_value(&args, "--width") {
            self.window.width = width;
        }

        if let Some(height) = parse_flag_value(&args, "--height") {
            self.window.height = height;
        }
    }

    /// 验证配置的有效性
    pub fn validate(&self) -> Result<()> {
        if self.window.width == 0 || self.window.height == 0 {
            return Err(ConfigError::InvalidValue {
                field: "window.width/height".to_string(),
                reason: "Window dimensions must be greater than 0".to_string(),
            }.into());
        }

        if !(MIN_FRAME_COUNT..=MAX_FRAME_COUNT).contains(&self.graphics.frame_count) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.frame_count".to_string(),
                reason: format!(
                    "Frame count must be between {} and {}",
                    MIN_FRAME_COUNT, MAX_FRAME_COUNT
                ),
            }.into());
        }

        if self.graphics.clear_color.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ConfigError::InvalidValue {
                field: "graphics.clear_color".to_string(),
                reason: "Color components must be within [0, 1]".to_string(),
            }.into());
        }

        Ok(())
    }
}

fn parse_flag_value(args: &[String], flag: &str) -> Option<u32> {
    let idx = args.iter().position(|a| a == flag)?;
    args.get(idx + 1)?.parse().ok()
}

impl TriangleMode {
    /// 是否需要常量缓冲区
    pub fn uses_constant_buffer(&self) -> bool {
        matches!(self, TriangleMode::Parameterized)
    }

    pub fn name(&self) -> &'static str {
        match self {
            TriangleMode::Static => "static",
            TriangleMode::Parameterized => "parameterized",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
        assert_eq!(config.graphics.frame_count, 2);
        assert_eq!(config.graphics.triangle, TriangleMode::Static);
        assert!(!config.graphics.use_warp_device);
        assert_eq!(config.graphics.clear_color, [0.0, 0.2, 0.4, 1.0]);
    }

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.window.width = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.graphics.frame_count = 1;
        assert!(config.validate().is_err());
        config.graphics.frame_count = 17;
        assert!(config.validate().is_err());
        config.graphics.frame_count = 3;
        assert!(config.validate().is_ok());

        let mut config = Config::default();
        config.graphics.clear_color = [0.0, 1.5, 0.0, 1.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_apply_args() {
        let mut config = Config::default();
        config.apply_args(["app", "--warp", "--parameterized", "--no-vsync", "--width", "640", "--height", "480"]);

        assert!(config.graphics.use_warp_device);
        assert_eq!(config.graphics.triangle, TriangleMode::Parameterized);
        assert!(!config.graphics.vsync);
        assert_eq!(config.window.width, 640);
        assert_eq!(config.window.height, 480);
    }

    #[test]
    fn test_apply_args_ignores_bad_values() {
        let mut config = Config::default();
        config.apply_args(["app", "--width", "wide", "--height"]);
        assert_eq!(config.window.width, 1280);
        assert_eq!(config.window.height, 720);
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml_str(
            r#"
            [graphics]
            triangle = "parameterized"
            use_warp_device = true
            "#,
        )
        .unwrap();

        assert_eq!(config.graphics.triangle, TriangleMode::Parameterized);
        assert!(config.graphics.use_warp_device);
        assert_eq!(config.graphics.frame_count, 2);
        assert_eq!(config.window, WindowConfig::default());
        assert_eq!(config.logging.level, LogLevel::Info);
    }

    #[test]
    fn test_invalid_toml() {
        let err = Config::from_toml_str("[graphics]\ntriangle = \"spinning\"").unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }

    #[test]
    fn test_save_and_reload() {
        let path = std::env::temp_dir().join(format!("hello_triangle_cfg_{}.toml", std::process::id()));
        let mut config = Config::default();
        config.graphics.triangle = TriangleMode::Parameterized;
        config.window.title = "saved".to_string();

        config.save_to_file(&path).unwrap();
        let loaded = Config::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(loaded, config);
    }

    #[test]
    fn test_last_mode_flag_wins() {
        let mut config = Config::default();
        config.apply_args(["app", "--parameterized", "--static"]);
        assert_eq!(config.graphics.triangle, TriangleMode::Static);

        config.apply_args(["app", "--static", "--parameterized"]);
        assert_eq!(config.graphics.triangle, TriangleMode::Parameterized);
    }

    #[test]
    fn test_missing_file_falls_back_to_default() {
        let config = Config::from_file_or_default("definitely/not/here.toml").unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_broken_file_is_an_error() {
        let path = std::env::temp_dir().join(format!("hello_triangle_broken_{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "[graphics]\ntriangle = \"parameterized\"\nframe_count = \"two\"\n",
        )
        .unwrap();

        let result = Config::from_file_or_default(&path);
        std::fs::remove_file(&path).ok();

        assert!(matches!(
            result,
            Err(HelloTriangleError::Config(ConfigError::ParseError(_)))
        ));
    }
}
