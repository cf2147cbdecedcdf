//! 日志工具模块
//!
//! 提供订阅器初始化以及日志格式化和输出的辅助函数

use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use crate::config::Config;
use crate::error::AppError;
use crate::models::LeaderboardSnapshot;
use crate::workflow::{RunOutcome, RunReport};

/// 初始化日志
///
/// `RUST_LOG` 优先；否则默认 `info`，详细模式下本 crate 打开到 `trace`。
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "info,leaderboard_sync=trace"
    } else {
        "info"
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

/// 记录程序启动信息
pub fn log_startup(config: &Config) {
    info!("{}", "=".repeat(60));
    info!(
        "🚀 排行榜同步启动 - {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("🌐 页面: {}", config.target_url);
    info!(
        "📊 发布目标: {} 个 (路径: {})",
        config.destinations.len(),
        config.snapshot_path
    );
    info!("{}", "=".repeat(60));
}

/// 逐条打印快照（详细模式）
pub fn log_snapshot(snapshot: &LeaderboardSnapshot) {
    for record in snapshot.records() {
        debug!("名次: {}", record.position);
        debug!("姓名: {}", record.name);
        debug!("成绩: {}", record.score);
        debug!("进度: {}", record.thru_status);
        if let Some(rounds) = &record.round_scores {
            debug!("各轮: {}", rounds.join(", "));
        }
        if record.missing_fields() > 0 {
            debug!("缺失字段: {}", record.missing_fields());
        }
        debug!("{}", "-".repeat(50));
    }
}

/// 打印最终统计信息
pub fn print_final_stats(report: &RunReport) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!(
        "📄 匹配行: {} | 记录: {} | 空白行: {} | 回退字段: {}",
        report.stats.rows_matched,
        report.records,
        report.stats.rows_blank,
        report.stats.fields_defaulted
    );

    match &report.outcome {
        RunOutcome::Published(publish) => {
            info!(
                "✅ 发布成功: {}/{}",
                publish.succeeded(),
                publish.outcomes.len()
            );
            if publish.failed() > 0 {
                warn!("❌ 发布失败: {}", publish.failed());
            }
        }
        RunOutcome::SkippedEmpty => warn!("⚠️ 快照为空，未发布"),
        RunOutcome::Locked => warn!("⚠️ 另一次运行正在进行，本次跳过"),
    }
    info!("{}", "=".repeat(60));
}

/// 运行失败时的统计（没有报告可打印）
pub fn print_failure_summary(err: &AppError) {
    info!("\n{}", "=".repeat(60));
    info!("📊 运行完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    error!("❌ 运行失败，未发布: {}", err);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_text() {
        assert_eq!(truncate_text("abc", 5), "abc");
        assert_eq!(truncate_text("abcdef", 3), "abc...");
        assert_eq!(truncate_text("排行榜同步", 2), "排行...");
    }
}
