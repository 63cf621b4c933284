//! paperweight CLI / 命令行入口
//!
//! `paperweight` runs the daily job: fetch new arXiv papers, rank them,
//! summarize the survivors and email a digest. `paperweight score` ranks a
//! local JSON file instead, for tuning weights offline.

use anyhow::{Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};

use paperweight::analyzer::Analyzer;
use paperweight::arxiv::{self, ArxivClient};
use paperweight::config::{self, AppConfig, DEFAULT_CONFIG_FILE};
use paperweight::logging::init_logging;
use paperweight::notifier;
use paperweight::scoring::Pipeline;
use paperweight::watermark::DEFAULT_WATERMARK_FILE;

/// Fetch, rank and email new arXiv papers / 抓取、排序并邮件推送 arXiv 新论文
#[derive(Parser, Debug)]
#[command(name = "paperweight")]
#[command(version)]
#[command(about, long_about = None)]
struct Cli {
    /// Configuration file / 配置文件
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    #[command(flatten)]
    run: RunArgs,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the full job (default) / 执行完整流程（默认）
    Run(RunArgs),

    /// Rank a local JSON array of papers and print the result / 对本地论文评分
    Score {
        /// JSON file with an array of papers / 论文 JSON 文件
        #[arg(short, long)]
        input: PathBuf,
    },
}

#[derive(Args, Debug, Clone)]
struct RunArgs {
    /// Last-processed-date file / 上次处理日期文件
    #[arg(long, default_value = DEFAULT_WATERMARK_FILE)]
    watermark: PathBuf,

    /// Ignore the last processed date and fetch the last 7 days / 忽略上次处理日期
    #[arg(long)]
    force_refresh: bool,
}

fn load(path: &Path) -> Result<AppConfig> {
    let app_config =
        config::load_config(path).with_context(|| format!("failed to load configuration from {}", path.display()))?;
    init_logging(&app_config.logging).context("failed to initialize logging")?;
    tracing::info!("Configuration loaded successfully");
    Ok(app_config)
}

async fn run(config_path: &Path, args: RunArgs) -> Result<()> {
    let app_config = load(config_path)?;
    if args.force_refresh {
        tracing::info!("Force refresh requested. Ignoring last processed date.");
    }

    // Fail on bad weights before any network traffic / 先校验评分配置
    let pipeline = Pipeline::new(app_config.processor.clone())?;
    let analyzer = Analyzer::new(app_config.analyzer.clone())?;
    let client = ArxivClient::new()?;

    let today = Local::now().date_naive();
    let papers = arxiv::get_recent_papers(&client, &app_config.arxiv, &args.watermark, today, args.force_refresh)
        .await
        .context("failed to fetch papers from arXiv")?;

    if papers.is_empty() {
        tracing::info!("No new papers to process. Exiting.");
        return Ok(());
    }

    let mut ranked = tokio::task::spawn_blocking(move || pipeline.process(papers))
        .await
        .context("scoring task failed")?;

    if ranked.is_empty() {
        tracing::info!("No papers met the relevance criteria. Exiting.");
        return Ok(());
    }
    tracing::info!("Processed {} papers", ranked.len());

    analyzer.summarize_all(&mut ranked).await;

    if notifier::compile_and_send(ranked, &app_config.notifier.email)
        .await
        .context("failed to send notifications")?
    {
        tracing::info!("Notifications compiled and sent successfully");
    }
    Ok(())
}

fn score(config_path: &Path, input: &Path) -> Result<()> {
    let app_config = load(config_path)?;
    let pipeline = Pipeline::new(app_config.processor)?;

    let content =
        std::fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))?;
    let items: Vec<Value> = serde_json::from_str(&content)
        .with_context(|| format!("{} must contain a JSON array of papers", input.display()))?;

    let outcome = pipeline.process_values(items);
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Command::Score { input }) => score(&cli.config, &input),
        Some(Command::Run(args)) => run(&cli.config, args).await,
        None => run(&cli.config, cli.run).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::parse_from(["paperweight", "--force-refresh"]);
        assert!(cli.command.is_none());
        assert!(cli.run.force_refresh);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
        assert_eq!(cli.run.watermark, PathBuf::from(DEFAULT_WATERMARK_FILE));
    }

    #[test]
    fn test_score_command() {
        let cli = Cli::parse_from(["paperweight", "score", "--input", "papers.json", "--config", "alt.json"]);
        assert_eq!(cli.config, PathBuf::from("alt.json"));
        match cli.command {
            Some(Command::Score { input }) => assert_eq!(input, PathBuf::from("papers.json")),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
