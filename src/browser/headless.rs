use chromiumoxide::{Browser, BrowserConfig};
use futures::StreamExt;
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tracing::{debug, error, info};

use crate::config::BrowserSettings;
use crate::error::RenderError;

/// 启动无头浏览器
///
/// 返回浏览器和后台事件处理任务的句柄。
pub async fn launch_headless_browser(
    settings: &BrowserSettings,
) -> Result<(Browser, JoinHandle<()>), RenderError> {
    info!("🚀 启动无头浏览器...");

    let mut builder = BrowserConfig::builder()
        .window_size(settings.window_width, settings.window_height)
        .args(browser_args(settings));

    builder = if settings.headless {
        builder.new_headless_mode()
    } else {
        builder.with_head()
    };

    if let Some(path) = &settings.chrome_executable {
        debug!("使用浏览器: {}", path.display());
        builder = builder.chrome_executable(path);
    }

    let config = builder.build().map_err(|message| {
        error!("配置无头浏览器失败: {}", message);
        RenderError::ConfigurationFailed { message }
    })?;

    // 启动浏览器
    let (browser, mut handler) = Browser::launch(config).await.map_err(|e| {
        error!("启动无头浏览器失败: {}", e);
        RenderError::launch(e)
    })?;
    debug!("无头浏览器启动成功");

    // 在后台处理浏览器事件
    let handle = tokio::spawn(async move {
        while let Some(h) = handler.next().await {
            if h.is_err() {
                break;
            }
        }
    });

    // 添加短暂延迟以等待浏览器状态同步
    sleep(tokio::time::Duration::from_millis(300)).await;

    Ok((browser, handle))
}

/// 浏览器启动参数
pub fn browser_args(settings: &BrowserSettings) -> Vec<String> {
    let mut args = vec![
        "--no-sandbox".to_string(),            // 容器/定时任务环境下没有沙盒权限
        "--disable-dev-shm-usage".to_string(), // 防止共享内存不足
        "--disable-gpu".to_string(),
        "--disable-extensions".to_string(),
    ];
    if settings.disable_images {
        args.push("--blink-settings=imagesEnabled=false".to_string());
    }
    args.extend(settings.extra_args.iter().cloned());
    args
}
