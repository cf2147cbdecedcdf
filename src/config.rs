use std::path::{Path, PathBuf};
use std::str::FromStr;

use reqwest::Url;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;
use crate::services::extractor::LeaderboardExtractor;
use crate::services::locator::LocatorTable;

/// 程序配置
///
/// 优先级：环境变量 > 配置文件 > 默认值
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 排行榜页面
    pub target_url: String,
    /// 是否显示详细日志（逐字段回退信息）
    pub verbose_logging: bool,
    /// 诊断截图目录
    pub screenshot_dir: PathBuf,
    /// 远端要整体替换的路径
    pub snapshot_path: String,
    /// 空快照是否也发布（整体覆盖远端）；关闭后保留远端旧值
    pub publish_empty: bool,
    /// 单次写入超时（秒）
    pub publish_timeout_secs: u64,
    pub run_lock: RunLockSettings,
    pub browser: BrowserSettings,
    pub selectors: LocatorTable,
    pub destinations: Vec<Destination>,
}

/// 浏览器配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserSettings {
    /// 浏览器可执行文件，`None` 时自动查找
    pub chrome_executable: Option<PathBuf>,
    pub headless: bool,
    pub window_width: u32,
    pub window_height: u32,
    /// 禁止加载图片
    pub disable_images: bool,
    /// 等待选手行出现的最长时间（秒）
    pub render_timeout_secs: u64,
    /// 轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    pub extra_args: Vec<String>,
}

/// 发布目标
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    pub name: String,
    pub database_url: String,
    #[serde(default)]
    pub auth_token: Option<String>,
}

/// 运行锁配置
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct RunLockSettings {
    /// 锁文件路径，`None` 时不加锁
    pub path: Option<PathBuf>,
    /// 超过该时长的锁视为残留（秒）
    pub stale_after_secs: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            target_url: "https://www.pgatour.com/leaderboard".to_string(),
            verbose_logging: false,
            screenshot_dir: PathBuf::from("screenshots"),
            snapshot_path: "players/players".to_string(),
            publish_empty: true,
            publish_timeout_secs: 30,
            run_lock: RunLockSettings::default(),
            browser: BrowserSettings::default(),
            selectors: LocatorTable::default(),
            destinations: vec![
                Destination::new(
                    "fantasygolf",
                    "https://fantasygolf-22bac-default-rtdb.firebaseio.com",
                ),
                Destination::new(
                    "putterpicks",
                    "https://putterpicks-default-rtdb.firebaseio.com",
                ),
            ],
        }
    }
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            chrome_executable: None,
            headless: true,
            window_width: 1920,
            window_height: 1080,
            disable_images: true,
            render_timeout_secs: 30,
            poll_interval_ms: 500,
            extra_args: Vec::new(),
        }
    }
}

impl Default for RunLockSettings {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from("leaderboard_sync.lock")),
            stale_after_secs: 600,
        }
    }
}

impl Destination {
    pub fn new(name: impl Into<String>, database_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            database_url: database_url.into(),
            auth_token: None,
        }
    }

    /// 从数据库地址推断目标名称（取主机名第一段）
    pub fn from_url(database_url: &str) -> Self {
        let name = Url::parse(database_url)
            .ok()
            .and_then(|u| u.host_str().map(|h| h.split('.').next().unwrap_or(h).to_string()))
            .unwrap_or_else(|| database_url.to_string());
        Self::new(name, database_url)
    }
}

impl Config {
    /// 加载配置：可选的 TOML 文件，然后叠加环境变量
    pub async fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let base = match path {
            Some(path) => Self::from_file(path).await?,
            None => Self::default(),
        };
        let config = base.with_env()?;
        config.validate()?;
        Ok(config)
    }

    /// 从 TOML 文件读取，未写的项使用默认值
    pub async fn from_file(path: &Path) -> Result<Self, ConfigError> {
        debug!("读取配置文件: {}", path.display());

        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| ConfigError::ReadFailed {
                path: path.to_path_buf(),
                source,
            })?;

        toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 用进程环境变量覆盖
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_vars(|name| std::env::var(name).ok())
    }

    /// 用任意变量来源覆盖（便于测试）
    pub fn with_vars<F>(mut self, var: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var("TARGET_URL") {
            self.target_url = v;
        }
        if let Some(v) = parse_var(&var, "VERBOSE_LOGGING", "bool")? {
            self.verbose_logging = v;
        }
        if let Some(v) = var("SCREENSHOT_DIR") {
            self.screenshot_dir = PathBuf::from(v);
        }
        if let Some(v) = var("SNAPSHOT_PATH") {
            self.snapshot_path = v;
        }
        if let Some(v) = parse_var(&var, "PUBLISH_EMPTY", "bool")? {
            self.publish_empty = v;
        }
        if let Some(v) = var("CHROME_EXECUTABLE") {
            self.browser.chrome_executable = Some(PathBuf::from(v));
        }
        if let Some(v) = parse_var(&var, "RENDER_TIMEOUT_SECS", "u64")? {
            self.browser.render_timeout_secs = v;
        }
        if let Some(v) = var("RUN_LOCK_FILE") {
            self.run_lock.path = if v.is_empty() {
                None
            } else {
                Some(PathBuf::from(v))
            };
        }
        if let Some(v) = var("LEADERBOARD_DESTINATIONS") {
            self.destinations = v
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(Destination::from_url)
                .collect();
        }
        if let Some(token) = var("FIREBASE_AUTH_TOKEN") {
            for destination in &mut self.destinations {
                if destination.auth_token.is_none() {
                    destination.auth_token = Some(token.clone());
                }
            }
        }
        Ok(self)
    }

    /// 校验配置
    pub fn validate(&self) -> Result<(), ConfigError> {
        check_http_url("target_url", &self.target_url)?;

        LeaderboardExtractor::new(&self.selectors)
            .map_err(|e| ConfigError::invalid("selectors", e.to_string()))?;

        if self.snapshot_path.trim_matches('/').is_empty() {
            return Err(ConfigError::invalid("snapshot_path", "不能为空"));
        }
        if self.destinations.is_empty() {
            return Err(ConfigError::invalid("destinations", "至少需要一个发布目标"));
        }
        for destination in &self.destinations {
            check_http_url(
                &format!("destinations.{}", destination.name),
                &destination.database_url,
            )?;
        }
        if self.browser.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("browser.poll_interval_ms", "必须大于 0"));
        }
        Ok(())
    }
}

fn parse_var<F, T>(var: &F, name: &str, expected_type: &str) -> Result<Option<T>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match var(name) {
        None => Ok(None),
        Some(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| ConfigError::EnvVarParseFailed {
                var_name: name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }),
    }
}

fn check_http_url(key: &str, value: &str) -> Result<(), ConfigError> {
    let url = Url::parse(value).map_err(|e| ConfigError::invalid(key, e.to_string()))?;
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(ConfigError::invalid(key, format!("不支持的协议 {}", other))),
    }
}
