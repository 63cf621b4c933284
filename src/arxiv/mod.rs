//! arXiv retrieval module / arXiv 抓取模块
//!
//! feed query -> de-duplicate -> download source or PDF -> extract text.

pub mod client;
pub mod extract;
pub mod feed;

pub use client::ArxivClient;
pub use feed::FeedEntry;

use chrono::{Duration, NaiveDate};
use std::path::Path;

use crate::config::ArxivConfig;
use crate::error::FetchError;
use crate::models::Paper;
use crate::watermark::{fetch_window, Watermark};

/// Fetch everything published since the last run / 获取上次运行以来的新论文
///
/// The watermark advances to `today` only when at least one paper with
/// content was retrieved.
pub async fn get_recent_papers(
    client: &ArxivClient,
    config: &ArxivConfig,
    watermark_path: &Path,
    today: NaiveDate,
    force_refresh: bool,
) -> Result<Vec<Paper>, FetchError> {
    let watermark = Watermark::load(watermark_path);
    tracing::info!("Last processed date: {:?}, current date: {}", watermark.last_processed, today);

    let Some(days) = fetch_window(&watermark, today, force_refresh) else {
        return Ok(Vec::new());
    };

    let start_date = today - Duration::days(days as i64);
    tracing::info!("Fetching papers from {} to {}", start_date, today);

    let entries = client
        .fetch_recent(&config.categories, start_date, config.max_results())
        .await?;
    let papers = client.fetch_papers(entries).await;

    if papers.is_empty() {
        tracing::info!("No new papers found");
    } else {
        match Watermark::new(today).save(watermark_path) {
            Ok(()) => tracing::info!(
                "Processed {} papers. Last processed date updated to {}",
                papers.len(),
                today
            ),
            Err(e) => tracing::warn!("Failed to update watermark {:?}: {}", watermark_path, e),
        }
    }

    Ok(papers)
}
