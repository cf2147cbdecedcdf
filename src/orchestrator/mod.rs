//! 编排层（Orchestration Layer）
//!
//! ## 层次关系
//!
//! ```text
//! orchestrator::App (运行锁 + 浏览器会话)
//!     ↓
//! workflow::LeaderboardFlow (渲染 → 提取 → 发布 → 失败截图)
//!     ↓
//! services (能力层：extractor / publisher / diagnostics)
//!     ↓
//! infrastructure (基础设施：RenderSession / RunLock)
//! ```
//!
//! 只做调度和统计，不做具体业务判断。

pub mod app;

pub use app::App;
