//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：编译选择器、创建发布目标、输出启动信息
//! 2. **运行互斥**：持有运行锁，避免定时任务重叠
//! 3. **资源管理**：唯一创建浏览器会话的模块，交给流程层后由流程层释放
//! 4. **全局统计**：输出本次运行的汇总

use std::time::Duration;

use tracing::{error, warn};

use crate::config::Config;
use crate::error::{AppError, AppResult, LockError};
use crate::infrastructure::{ChromeSession, RenderSession, RunLock};
use crate::utils::logging::{log_startup, print_failure_summary, print_final_stats};
use crate::workflow::{LeaderboardFlow, RunReport};

/// 应用主结构
pub struct App {
    config: Config,
    flow: LeaderboardFlow,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> AppResult<Self> {
        log_startup(&config);

        let flow = LeaderboardFlow::from_config(&config)?;

        Ok(Self { config, flow })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// 运行一次同步
    pub async fn run(&self) -> AppResult<RunReport> {
        let _lock = match self.acquire_lock() {
            Ok(lock) => lock,
            Err(LockError::Held { path }) => {
                warn!("⚠️ 运行锁被占用 ({})，本次跳过", path.display());
                let report = RunReport::locked();
                print_final_stats(&report);
                return Ok(report);
            }
            Err(e) => return Err(e.into()),
        };

        // 启动失败时没有页面可截图
        let mut session =
            match ChromeSession::launch(&self.config.browser, self.config.selectors.row.as_str())
                .await
            {
                Ok(session) => session,
                Err(e) => {
                    error!("❌ 浏览器启动失败: {}", e);
                    let err = AppError::from(e);
                    print_failure_summary(&err);
                    return Err(err);
                }
            };

        self.drive(&mut session).await
    }

    /// 用给定会话跑一次流程，成功失败都输出统计
    async fn drive<S>(&self, session: &mut S) -> AppResult<RunReport>
    where
        S: RenderSession + ?Sized,
    {
        match self.flow.run(session).await {
            Ok(report) => {
                print_final_stats(&report);
                Ok(report)
            }
            Err(e) => {
                print_failure_summary(&e);
                Err(e)
            }
        }
    }

    fn acquire_lock(&self) -> Result<Option<RunLock>, LockError> {
        match &self.config.run_lock.path {
            Some(path) => RunLock::acquire(
                path,
                Duration::from_secs(self.config.run_lock.stale_after_secs),
            )
            .map(Some),
            None => Ok(None),
        }
    }
}
