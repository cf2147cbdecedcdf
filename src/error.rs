use std::path::PathBuf;

use thiserror::Error;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 应用程序错误类型
///
/// 只有会逃出提取器的错误才会出现在这里；
/// 字段级失败在 [`FieldError`] 中就地消化，整行总会产出一条记录。
#[derive(Debug, Error)]
pub enum AppError {
    /// 页面渲染错误（致命，触发诊断截图）
    #[error("渲染错误: {0}")]
    Render(#[from] RenderError),
    /// 提取器构建错误（选择器配置无效）
    #[error("提取错误: {0}")]
    Extract(#[from] ExtractError),
    /// 发布错误
    #[error("发布错误: {0}")]
    Publish(#[from] PublishError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 诊断截图错误
    #[error("诊断错误: {0}")]
    Diagnostics(#[from] DiagnosticsError),
    /// 运行锁错误
    #[error("运行锁错误: {0}")]
    Lock(#[from] LockError),
}

/// 页面渲染错误
#[derive(Debug, Error)]
pub enum RenderError {
    /// 浏览器配置失败
    #[error("浏览器配置失败: {message}")]
    ConfigurationFailed { message: String },
    /// 启动浏览器失败
    #[error("启动浏览器失败: {source}")]
    LaunchFailed {
        #[source]
        source: BoxError,
    },
    /// 导航失败
    #[error("导航到 {url} 失败: {source}")]
    NavigationFailed {
        url: String,
        #[source]
        source: BoxError,
    },
    /// 读取页面内容失败
    #[error("读取页面内容失败: {source}")]
    ContentFailed {
        #[source]
        source: BoxError,
    },
    /// 截图失败
    #[error("截图失败 ({path}): {source}")]
    ScreenshotFailed {
        path: PathBuf,
        #[source]
        source: BoxError,
    },
    /// 会话已释放
    #[error("渲染会话已释放")]
    SessionReleased,
}

/// 提取器错误
#[derive(Debug, Error)]
pub enum ExtractError {
    /// 选择器无法解析
    #[error("字段 {field} 的选择器无效 '{selector}': {message}")]
    InvalidSelector {
        field: String,
        selector: String,
        message: String,
    },
    /// 国家代码标记为空
    #[error("国家代码标记不能为空: {field}")]
    EmptyMarker { field: String },
}

/// 单个字段提取失败（永不外泄，回退为哨兵值）
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldError {
    /// 未找到节点
    #[error("未找到节点: {selector}")]
    Missing { selector: String },
    /// 节点数量不足
    #[error("节点数量不足: {selector} 需要第 {index} 个，实际 {found} 个")]
    OutOfRange {
        selector: String,
        index: usize,
        found: usize,
    },
    /// 节点文本为空
    #[error("节点文本为空: {selector}")]
    EmptyText { selector: String },
}

/// 发布错误
#[derive(Debug, Error)]
pub enum PublishError {
    /// 序列化快照失败
    #[error("序列化快照失败: {0}")]
    Serialize(#[from] serde_json::Error),
    /// 网络请求失败
    #[error("写入 {destination} 失败: {source}")]
    RequestFailed {
        destination: String,
        #[source]
        source: BoxError,
    },
    /// 远端返回错误状态
    #[error("写入 {destination} 被拒绝: HTTP {status} {body}")]
    BadStatus {
        destination: String,
        status: u16,
        body: String,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 读取配置文件失败
    #[error("读取配置文件失败 ({path}): {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// TOML 解析失败
    #[error("TOML 解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
    /// 配置项无效
    #[error("配置项 {key} 无效: {reason}")]
    Invalid { key: String, reason: String },
}

/// 诊断截图错误
#[derive(Debug, Error)]
pub enum DiagnosticsError {
    /// 创建诊断目录失败
    #[error("创建诊断目录失败 ({path}): {source}")]
    CreateDirFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// 截图失败
    #[error(transparent)]
    Capture(#[from] RenderError),
}

/// 运行锁错误
#[derive(Debug, Error)]
pub enum LockError {
    /// 另一次运行正在进行
    #[error("另一次运行正在进行 (锁文件: {path})")]
    Held { path: PathBuf },
    /// 锁文件读写失败
    #[error("锁文件读写失败 ({path}): {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// ========== 便捷构造函数 ==========

impl RenderError {
    /// 创建启动失败错误
    pub fn launch(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RenderError::LaunchFailed {
            source: Box::new(source),
        }
    }

    /// 创建导航失败错误
    pub fn navigation(
        url: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RenderError::NavigationFailed {
            url: url.into(),
            source: Box::new(source),
        }
    }

    /// 创建读取内容失败错误
    pub fn content(source: impl std::error::Error + Send + Sync + 'static) -> Self {
        RenderError::ContentFailed {
            source: Box::new(source),
        }
    }

    /// 创建截图失败错误
    pub fn screenshot(
        path: impl Into<PathBuf>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        RenderError::ScreenshotFailed {
            path: path.into(),
            source: Box::new(source),
        }
    }
}

impl PublishError {
    /// 创建网络请求失败错误
    pub fn request_failed(
        destination: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        PublishError::RequestFailed {
            destination: destination.into(),
            source: Box::new(source),
        }
    }
}

impl ConfigError {
    /// 创建配置项无效错误
    pub fn invalid(key: impl Into<String>, reason: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            reason: reason.into(),
        }
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;
