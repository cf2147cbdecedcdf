use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::Parser;

use leaderboard_sync::utils::logging;
use leaderboard_sync::{App, Config};

/// 抓取排行榜并发布到所有配置的数据库
#[derive(Parser, Debug)]
#[command(name = "leaderboard_sync", version, about)]
struct Cli {
    /// 配置文件（TOML）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 详细日志
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    // 加载配置
    let mut config = Config::load(cli.config.as_deref()).await?;
    if cli.verbose {
        config.verbose_logging = true;
    }

    // 初始化日志
    logging::init(config.verbose_logging);

    // 初始化并运行应用
    let report = App::initialize(config)?.run().await?;

    Ok(ExitCode::from(report.exit_code()))
}
