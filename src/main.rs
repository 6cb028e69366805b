//! modoc - 模块文档生成器
//!
//! 扫描配置中的项目，按文件或目录分组，调用 LLM 生成结构化摘要，
//! 渲染为 Markdown 页面并输出供静态前端使用的索引。

use anyhow::Context;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod error;
mod llm;
mod services;
mod state;

use config::AppConfig;
use services::doc_generator::DocPipeline;
use state::AppContext;

/// 命令行参数
#[derive(Debug, Parser)]
#[command(name = "modoc", version, about = "Generate per-module documentation with an LLM")]
struct Cli {
    /// 配置文件路径
    #[arg(short, long, default_value = "config.json", env = "MODOC_CONFIG")]
    config: PathBuf,

    /// 输出根目录（每次运行都会被清空）
    #[arg(short, long, default_value = "./docs")]
    output: PathBuf,
}

/// 在 Windows 上设置控制台代码页为 UTF-8
#[cfg(windows)]
fn setup_console_encoding() {
    unsafe {
        // 设置控制台输出代码页为 UTF-8 (65001)
        extern "system" {
            fn SetConsoleOutputCP(code_page: u32) -> i32;
            fn SetConsoleCP(code_page: u32) -> i32;
        }
        SetConsoleOutputCP(65001);
        SetConsoleCP(65001);
    }
}

#[cfg(not(windows))]
fn setup_console_encoding() {}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    setup_console_encoding();

    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "modoc=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load(&cli.config)
        .with_context(|| format!("failed to load configuration {}", cli.config.display()))?;

    info!("Loading generation backend...");
    let ctx = AppContext::from_config(&config, cli.output.clone())
        .context("failed to initialise generation backend")?;

    let summary = DocPipeline::new(&ctx)
        .run(&config.projects)
        .await
        .context("documentation run aborted")?;

    info!(
        "Done: {} pages written, {} modules failed",
        summary.written_units, summary.failed_units
    );
    Ok(())
}
