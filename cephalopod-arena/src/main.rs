use std::path::PathBuf;

use anyhow::Result;
use cephalopod_arena::{Arena, ArenaConfig};
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Cephalopod AI 对战
#[derive(Debug, Parser)]
#[command(name = "cephalopod-arena", version)]
struct Cli {
    /// 配置文件路径（默认 <config_dir>/cephalopod/arena.json）
    #[arg(long)]
    config: Option<PathBuf>,

    /// 对局数（覆盖配置文件）
    #[arg(long)]
    games: Option<u32>,

    /// 随机种子（覆盖配置文件）
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("cephalopod_arena=info".parse()?),
        )
        .init();

    let cli = Cli::parse();

    let mut config = ArenaConfig::load(cli.config.as_deref())?;
    if let Some(games) = cli.games {
        config.games = games;
    }
    if let Some(seed) = cli.seed {
        config.apply_seed(seed);
    }

    info!("Cephalopod 对战启动中...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .max_blocking_threads(config.blocking_threads)
        .build()?;

    let arena = Arena::new(config)?;
    let scoreboard = runtime.block_on(arena.run())?;

    println!("{}", scoreboard);
    Ok(())
}
