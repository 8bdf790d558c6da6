//! 错误处理模块
//!
//! 定义了渲染器中使用的统一错误类型。
//!
//! 原生图形 API 的失败不会被吞掉，而是转换为 `GraphicsError` 沿调用链返回；
//! 构造过程中途失败时，已创建的资源由所有权自动释放。

use std::fmt;

/// 统一的 Result 类型
pub type Result<T> = std::result::Result<T, HelloTriangleError>;

/// 渲染器的错误类型
#[derive(Debug)]
pub enum HelloTriangleError {
    /// 配置错误
    Config(ConfigError),

    /// 图形 API 错误
    Graphics(GraphicsError),

    /// IO 错误
    Io(std::io::Error),

    /// 日志系统错误
    Log(String),

    /// 初始化错误
    Initialization(String),
}

/// 配置相关的错误
#[derive(Debug)]
pub enum ConfigError {
    /// 配置文件未找到
    FileNotFound(String),

    /// 配置文件解析失败
    ParseError(String),

    /// 配置值无效
    InvalidValue { field: String, reason: String },
}

/// 图形 API 相关的错误
#[derive(Debug)]
pub enum GraphicsError {
    /// 设备创建失败
    DeviceCreation(String),

    /// 交换链错误
    SwapchainError(String),

    /// 着色器编译失败
    ShaderCompilation(String),

    /// 资源创建失败
    ResourceCreation(String),

    /// 渲染命令执行失败
    CommandExecution(String),

    /// 栅栏同步失败
    Synchronization(String),
}

impl fmt::Display for HelloTriangleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HelloTriangleError::Config(e) => write!(f, "Configuration error: {}", e),
            HelloTriangleError::Graphics(e) => write!(f, "Graphics error: {}", e),
            HelloTriangleError::Io(e) => write!(f, "IO error: {}", e),
            HelloTriangleError::Log(msg) => write!(f, "Log error: {}", msg),
            HelloTriangleError::Initialization(msg) => write!(f, "Initialization error: {}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::FileNotFound(path) => write!(f, "Config file not found: {}", path),
            ConfigError::ParseError(msg) => write!(f, "Failed to parse config: {}", msg),
            ConfigError::InvalidValue { field, reason } => {
                write!(f, "Invalid value for '{}': {}", field, reason)
            }
        }
    }
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphicsError::DeviceCreation(msg) => write!(f, "Device creation failed: {}", msg),
            GraphicsError::SwapchainError(msg) => write!(f, "Swapchain error: {}", msg),
            GraphicsError::ShaderCompilation(msg) => write!(f, "Shader compilation failed: {}", msg),
            GraphicsError::ResourceCreation(msg) => write!(f, "Resource creation failed: {}", msg),
            GraphicsError::CommandExecution(msg) => write!(f, "Command execution failed: {}", msg),
            GraphicsError::Synchronization(msg) => write!(f, "Synchronization failed: {}", msg),
        }
    }
}

impl std::error::Error for HelloTriangleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            HelloTriangleError::Io(e) => Some(e),
            HelloTriangleError::Config(e) => Some(e),
            HelloTriangleError::Graphics(e) => Some(e),
            _ => None,
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for GraphicsError {}

impl From<std::io::Error> for HelloTriangleError {
    fn from(err: std::io::Error) -> Self {
        HelloTriangleError::Io(err)
    }
}

impl From<ConfigError> for HelloTriangleError {
    fn from(err: ConfigError) -> Self {
        HelloTriangleError::Config(err)
    }
}

impl From<GraphicsError> for HelloTriangleError {
    fn from(err: GraphicsError) -> Self {
        HelloTriangleError::Graphics(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_graphics_error_display() {
        let err: HelloTriangleError =
            GraphicsError::ShaderCompilation("VSMain: syntax error".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Graphics error: Shader compilation failed: VSMain: syntax error"
        );
        assert!(err.source().is_some());
    }

    #[test]
    fn test_config_error_display() {
        let err: HelloTriangleError = ConfigError::InvalidValue {
            field: "graphics.frame_count".to_string(),
            reason: "too small".to_string(),
        }
        .into();
        assert_eq!(
            err.to_string(),
            "Configuration error: Invalid value for 'graphics.frame_count': too small"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = HelloTriangleError::from(io);
        assert!(matches!(err, HelloTriangleError::Io(_)));
    }
}
