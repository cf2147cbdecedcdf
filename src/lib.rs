//! # Leaderboard Sync
//!
//! 抓取实时高尔夫排行榜，并把快照整体发布到多个实时数据库
//!
//! ## 架构设计
//!
//! 本系统采用四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源，只暴露能力
//! - `RenderSession` - 渲染页面、截图、释放
//! - `RunLock` - 同一时间只允许一次运行
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"
//! - `LeaderboardExtractor` - HTML → 有序选手记录
//! - `SnapshotPublisher` - 快照整体替换到每个目标
//! - `Diagnostics` - 出错时截图
//!
//! ### ③ 流程层（Workflow）
//! - `LeaderboardFlow` - 一次运行的完整流程
//!
//! ### ④ 编排层（Orchestration）
//! - `App` - 运行锁、浏览器会话、最终统计

pub mod browser;
pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::{Config, Destination};
pub use error::{AppError, AppResult};
pub use infrastructure::{ChromeSession, RenderSession, RunLock};
pub use models::{CompetitorRecord, LeaderboardSnapshot};
pub use orchestrator::App;
pub use workflow::{LeaderboardFlow, RunOutcome, RunReport};
