//! 渲染会话 - 基础设施层
//!
//! 持有唯一的浏览器资源，只暴露"渲染页面 / 截图 / 释放"三个能力。

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, Page};
use tokio::task::JoinHandle;
use tokio::time::{sleep, timeout, Instant};
use tracing::{debug, info, trace, warn};

use crate::browser::launch_headless_browser;
use crate::config::BrowserSettings;
use crate::error::RenderError;

/// 关闭浏览器后等待事件任务退出的时长
const HANDLER_SHUTDOWN: Duration = Duration::from_secs(5);

/// 渲染会话
///
/// 运行开始时获取一次，结束时释放一次。`release` 可重复调用，第二次起不做任何事。
#[async_trait]
pub trait RenderSession: Send + Sync {
    /// 打开 `url`，等待渲染完成后返回完整 HTML
    async fn render(&mut self, url: &str) -> Result<String, RenderError>;

    /// 把当前页面截图保存到 `path`
    async fn capture_screenshot(&self, path: &Path) -> Result<(), RenderError>;

    /// 释放底层资源
    async fn release(&mut self);
}

/// 基于 chromiumoxide 的无头浏览器会话
pub struct ChromeSession {
    browser: Option<Browser>,
    page: Option<Page>,
    handler: Option<JoinHandle<()>>,
    ready_selector: String,
    render_timeout: Duration,
    poll_interval: Duration,
}

impl ChromeSession {
    /// 启动浏览器并打开空白页
    ///
    /// `ready_selector` 出现即视为页面渲染完成。
    pub async fn launch(
        settings: &BrowserSettings,
        ready_selector: impl Into<String>,
    ) -> Result<Self, RenderError> {
        let (browser, handler) = launch_headless_browser(settings).await?;

        let mut session = Self {
            browser: Some(browser),
            page: None,
            handler: Some(handler),
            ready_selector: ready_selector.into(),
            render_timeout: Duration::from_secs(settings.render_timeout_secs),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        };

        let page = match &session.browser {
            Some(browser) => browser.new_page("about:blank").await,
            None => return Err(RenderError::SessionReleased),
        };

        match page {
            Ok(page) => {
                session.page = Some(page);
                Ok(session)
            }
            Err(e) => {
                session.release().await;
                Err(RenderError::launch(e))
            }
        }
    }

    /// 轮询等待选手行出现
    async fn wait_for_rows(&self, page: &Page) -> bool {
        let deadline = Instant::now() + self.render_timeout;

        loop {
            match page.find_element(self.ready_selector.as_str()).await {
                Ok(_) => {
                    debug!("页面已渲染出 {}", self.ready_selector);
                    return true;
                }
                Err(e) => {
                    if Instant::now() >= deadline {
                        warn!(
                            "⚠️ 等待 {} 超时 ({:?})，按当前页面内容继续",
                            self.ready_selector, self.render_timeout
                        );
                        return false;
                    }
                    trace!("尚未渲染出 {}: {}", self.ready_selector, e);
                }
            }
            sleep(self.poll_interval).await;
        }
    }
}

#[async_trait]
impl RenderSession for ChromeSession {
    async fn render(&mut self, url: &str) -> Result<String, RenderError> {
        let page = self.page.as_ref().ok_or(RenderError::SessionReleased)?;

        info!("🌐 正在打开排行榜页面: {}", url);
        page.goto(url)
            .await
            .map_err(|e| RenderError::navigation(url, e))?;

        self.wait_for_rows(page).await;

        let html = page.content().await.map_err(RenderError::content)?;
        debug!("页面 HTML 长度: {}", html.len());

        Ok(html)
    }

    async fn capture_screenshot(&self, path: &Path) -> Result<(), RenderError> {
        let page = self.page.as_ref().ok_or(RenderError::SessionReleased)?;

        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        page.save_screenshot(params, path)
            .await
            .map_err(|e| RenderError::screenshot(path, e))?;

        Ok(())
    }

    async fn release(&mut self) {
        if let Some(page) = self.page.take() {
            if let Err(e) = page.close().await {
                debug!("关闭页面失败: {}", e);
            }
        }

        if let Some(mut browser) = self.browser.take() {
            if let Err(e) = browser.close().await {
                warn!("关闭浏览器失败: {}", e);
            }
            if let Err(e) = browser.wait().await {
                warn!("等待浏览器进程退出失败: {}", e);
            }
            info!("🧹 浏览器已关闭");
        }

        if let Some(mut handler) = self.handler.take() {
            if timeout(HANDLER_SHUTDOWN, &mut handler).await.is_err() {
                debug!("浏览器事件任务未按时退出，强制终止");
                handler.abort();
            }
        }
    }
}
