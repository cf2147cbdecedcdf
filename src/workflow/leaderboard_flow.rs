//! 排行榜同步流程 - 流程层
//!
//! 核心职责：定义"一次运行"的完整处理流程
//!
//! 流程顺序：
//! 1. 渲染页面 → 提取记录 → 发布快照
//! 2. 出现逃逸错误时截图留证
//! 3. 无论成功失败，都释放渲染会话（只释放一次）
//!
//! 不自动重试，失败由外部调度器下次再跑。

use std::time::Duration;

use tracing::{error, info, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::infrastructure::RenderSession;
use crate::services::{
    Diagnostics, DocumentStatus, ExtractionStats, FirebaseStore, LeaderboardExtractor,
    PublishReport, SnapshotPublisher, SnapshotStore,
};
use crate::utils::logging::log_snapshot;

/// 运行结果
#[derive(Debug)]
pub enum RunOutcome {
    /// 已向所有目标尝试发布
    Published(PublishReport),
    /// 快照为空，按策略未发布
    SkippedEmpty,
    /// 另一次运行持有锁，本次未执行
    Locked,
}

/// 一次运行的汇总
#[derive(Debug)]
pub struct RunReport {
    pub status: DocumentStatus,
    pub stats: ExtractionStats,
    pub records: usize,
    pub outcome: RunOutcome,
}

impl RunReport {
    /// 因运行锁被占用而跳过
    pub fn locked() -> Self {
        Self {
            status: DocumentStatus::NoRows,
            stats: ExtractionStats::default(),
            records: 0,
            outcome: RunOutcome::Locked,
        }
    }

    /// 进程退出码：任一目标发布失败为 2，其余为 0
    pub fn exit_code(&self) -> u8 {
        match &self.outcome {
            RunOutcome::Published(report) if !report.all_succeeded() => 2,
            _ => 0,
        }
    }
}

/// 排行榜同步流程
///
/// - 编排渲染、提取、发布
/// - 决定何时截图、何时释放会话
/// - 不持有渲染资源，只借用会话
pub struct LeaderboardFlow {
    target_url: String,
    extractor: LeaderboardExtractor,
    publisher: SnapshotPublisher,
    diagnostics: Diagnostics,
    publish_empty: bool,
}

impl LeaderboardFlow {
    pub fn new(
        target_url: impl Into<String>,
        extractor: LeaderboardExtractor,
        publisher: SnapshotPublisher,
        diagnostics: Diagnostics,
    ) -> Self {
        Self {
            target_url: target_url.into(),
            extractor,
            publisher,
            diagnostics,
            publish_empty: true,
        }
    }

    /// 空快照是否仍然发布（默认发布）
    pub fn with_publish_empty(mut self, publish_empty: bool) -> Self {
        self.publish_empty = publish_empty;
        self
    }

    /// 根据配置构建：编译选择器，为每个目标创建 Firebase 存储
    pub fn from_config(config: &Config) -> AppResult<Self> {
        let extractor = LeaderboardExtractor::new(&config.selectors)?;

        let timeout = Duration::from_secs(config.publish_timeout_secs);
        let stores = config
            .destinations
            .iter()
            .map(|d| {
                FirebaseStore::new(d, timeout).map(|s| Box::new(s) as Box<dyn SnapshotStore>)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let publisher = SnapshotPublisher::new(config.snapshot_path.clone(), stores);
        let diagnostics = Diagnostics::new(config.screenshot_dir.clone());

        Ok(Self::new(config.target_url.clone(), extractor, publisher, diagnostics)
            .with_publish_empty(config.publish_empty))
    }

    /// 执行一次完整运行
    ///
    /// 会话在返回前一定被释放。
    pub async fn run<S>(&self, session: &mut S) -> AppResult<RunReport>
    where
        S: RenderSession + ?Sized,
    {
        let result = self.execute(session).await;

        if let Err(e) = &result {
            self.recover(session, e).await;
        }

        session.release().await;
        result
    }

    async fn execute<S>(&self, session: &mut S) -> AppResult<RunReport>
    where
        S: RenderSession + ?Sized,
    {
        info!("📄 正在渲染排行榜页面...");
        let html = session.render(&self.target_url).await?;

        let extraction = self.extractor.extract(&html);
        log_snapshot(&extraction.snapshot);

        if extraction.snapshot.is_empty() {
            warn!("{}", "!".repeat(60));
            warn!(
                "❌ 没有提取到任何选手数据 (文档状态: {:?})",
                extraction.status
            );
            warn!("{}", "!".repeat(60));

            if !self.publish_empty {
                warn!("⚠️ 已关闭空快照发布，保留远端旧值");
                return Ok(RunReport {
                    status: extraction.status,
                    stats: extraction.stats,
                    records: 0,
                    outcome: RunOutcome::SkippedEmpty,
                });
            }
        }

        let report = self.publisher.publish(&extraction.snapshot).await?;

        Ok(RunReport {
            status: extraction.status,
            stats: extraction.stats,
            records: extraction.snapshot.len(),
            outcome: RunOutcome::Published(report),
        })
    }

    /// 失败恢复：记录错误并截图
    async fn recover<S>(&self, session: &S, err: &AppError)
    where
        S: RenderSession + ?Sized,
    {
        error!("❌ 运行失败: {}", err);

        if let Err(capture_err) = self.diagnostics.capture(session, &err.to_string()).await {
            error!("📸 诊断截图失败: {}", capture_err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RenderError;
    use crate::services::{LocatorTable, MemoryStore};
    use async_trait::async_trait;
    use std::path::Path;

    #[derive(Default)]
    struct StubSession {
        html: Option<String>,
        releases: usize,
    }

    #[async_trait]
    impl RenderSession for StubSession {
        async fn render(&mut self, url: &str) -> Result<String, RenderError> {
            self.html.clone().ok_or_else(|| {
                RenderError::navigation(
                    url,
                    std::io::Error::new(std::io::ErrorKind::TimedOut, "navigation timed out"),
                )
            })
        }

        async fn capture_screenshot(&self, path: &Path) -> Result<(), RenderError> {
            std::fs::write(path, b"png").map_err(|e| RenderError::screenshot(path, e))
        }

        async fn release(&mut self) {
            self.releases += 1;
        }
    }

    fn flow(store: &MemoryStore, dir: &Path) -> LeaderboardFlow {
        LeaderboardFlow::new(
            "https://example.com/leaderboard",
            LeaderboardExtractor::new(&LocatorTable::default()).unwrap(),
            SnapshotPublisher::new("players/players", vec![Box::new(store.clone())]),
            Diagnostics::new(dir),
        )
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_skipped_when_disabled() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("memory");
        let mut session = StubSession {
            html: Some("<html><body><p>maintenance</p></body></html>".to_string()),
            ..Default::default()
        };

        let report = flow(&store, dir.path())
            .with_publish_empty(false)
            .run(&mut session)
            .await
            .unwrap();

        assert!(matches!(report.outcome, RunOutcome::SkippedEmpty));
        assert_eq!(report.status, DocumentStatus::NoRows);
        assert_eq!(report.exit_code(), 0);
        assert_eq!(store.writes(), 0);
        assert_eq!(session.releases, 1);
    }

    #[tokio::test]
    async fn test_empty_snapshot_is_published_by_default() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("memory");
        let mut session = StubSession {
            html: Some(String::new()),
            ..Default::default()
        };

        let report = flow(&store, dir.path()).run(&mut session).await.unwrap();

        assert_eq!(report.status, DocumentStatus::EmptyDocument);
        assert!(matches!(report.outcome, RunOutcome::Published(_)));
        assert_eq!(store.get("players/players"), Some(serde_json::json!([])));
    }

    #[tokio::test]
    async fn test_render_failure_captures_screenshot_and_releases() {
        let dir = tempfile::tempdir().unwrap();
        let store = MemoryStore::new("memory");
        let mut session = StubSession::default();

        let err = flow(&store, dir.path()).run(&mut session).await.unwrap_err();

        assert!(matches!(err, AppError::Render(_)));
        assert_eq!(session.releases, 1);
        assert_eq!(store.writes(), 0);
        let shots: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(shots.len(), 1);
    }
}
