//! arXiv HTTP client / arXiv HTTP 客户端

use chrono::NaiveDate;
use reqwest::{Client, StatusCode};
use std::collections::HashSet;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::{ContentKind, Paper};
use crate::retry::RetryPolicy;

use super::extract::extract_text;
use super::feed::{parse_feed, query_url, FeedEntry};

/// LaTeX source bundles / 源码包地址
pub const EPRINT_URL: &str = "http://export.arxiv.org/e-print";
/// Rendered PDFs / PDF 地址
pub const PDF_URL: &str = "https://export.arxiv.org/pdf";

const CONTENT_TIMEOUT: Duration = Duration::from_secs(30);
const THROTTLE_EVERY: usize = 4;
const PROGRESS_EVERY: usize = 20;

/// arXiv client / arXiv 客户端
pub struct ArxivClient {
    client: Client,
    retry: RetryPolicy,
    throttle: Duration,
}

impl ArxivClient {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .user_agent(concat!("paperweight/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            retry: RetryPolicy::default(),
            throttle: Duration::from_secs(1),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Newest papers of one category published since `start_date`
    /// 获取某分类自起始日期以来的论文
    pub async fn fetch_category(
        &self,
        category: &str,
        start_date: NaiveDate,
        max_results: Option<usize>,
    ) -> Result<Vec<FeedEntry>, FetchError> {
        tracing::debug!("Fetching arXiv papers for category '{}' since {}", category, start_date);

        let label = format!("arXiv query for {}", category);
        let entries = self
            .retry
            .run(&label, FetchError::is_retryable, || {
                self.fetch_category_once(category, start_date, max_results)
            })
            .await?;

        tracing::info!(
            "Fetched {} papers for category '{}' since {}",
            entries.len(),
            category,
            start_date
        );
        Ok(entries)
    }

    async fn fetch_category_once(
        &self,
        category: &str,
        start_date: NaiveDate,
        max_results: Option<usize>,
    ) -> Result<Vec<FeedEntry>, FetchError> {
        let url = query_url(category, max_results);
        let resp = self.client.get(&url).send().await?;
        let status = resp.status();
        let body = resp.text().await?;

        if status == StatusCode::BAD_REQUEST && body.contains("Invalid field: cat") {
            return Err(FetchError::InvalidCategory(category.to_string()));
        }
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url,
            });
        }

        parse_feed(&body, start_date, max_results)
    }

    /// Query every category and merge, first occurrence of an id wins
    /// 查询所有分类并按编号去重
    ///
    /// An invalid category is logged and skipped; any other failure aborts.
    pub async fn fetch_recent(
        &self,
        categories: &[String],
        start_date: NaiveDate,
        max_results: Option<usize>,
    ) -> Result<Vec<FeedEntry>, FetchError> {
        let mut seen = HashSet::new();
        let mut all = Vec::new();

        for category in categories {
            tracing::info!("Processing category: {}", category);
            match self.fetch_category(category, start_date, max_results).await {
                Ok(entries) => {
                    let fresh = dedup_entries(&mut seen, entries, max_results);
                    tracing::debug!("Added {} new papers from category {}", fresh.len(), category);
                    all.extend(fresh);
                }
                Err(FetchError::InvalidCategory(c)) => {
                    tracing::error!("Invalid arXiv category: {}. Please check your configuration.", c);
                }
                Err(e) => return Err(e),
            }
        }

        tracing::info!("Fetched a total of {} papers", all.len());
        Ok(all)
    }

    /// Download a paper's source, falling back to its PDF / 下载源码，失败则下载 PDF
    pub async fn fetch_content(&self, id: &str) -> Option<(Vec<u8>, ContentKind)> {
        for (base, kind) in [(EPRINT_URL, ContentKind::Source), (PDF_URL, ContentKind::Pdf)] {
            let url = format!("{}/{}", base, id);
            let label = format!("{} download for {}", kind.as_str(), id);
            match self.retry.run(&label, FetchError::is_retryable, || self.get_bytes(&url)).await {
                Ok(data) => {
                    tracing::debug!("Fetched {} for paper ID: {}", kind.as_str(), id);
                    return Some((data, kind));
                }
                Err(e) => {
                    tracing::warn!("Failed to fetch {} for paper ID: {}. Error: {}", kind.as_str(), id, e);
                }
            }
        }

        tracing::error!("Failed to fetch content for paper ID: {}", id);
        None
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let resp = self.client.get(url).timeout(CONTENT_TIMEOUT).send().await?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        Ok(resp.bytes().await?.to_vec())
    }

    /// Download and extract full text; papers without content are dropped
    /// 下载并提取正文，没有正文的论文会被丢弃
    pub async fn fetch_papers(&self, entries: Vec<FeedEntry>) -> Vec<Paper> {
        let total = entries.len();
        tracing::info!("Fetching content for {} papers", total);

        let mut papers = Vec::with_capacity(total);
        for (i, entry) in entries.into_iter().enumerate() {
            let id = entry.id();
            if let Some((data, kind)) = self.fetch_content(&id).await {
                let extracted = tokio::task::spawn_blocking(move || extract_text(&data, kind)).await;
                match extracted {
                    Ok(Ok(content)) => papers.push(Paper {
                        id,
                        title: entry.title,
                        link: entry.link,
                        date: Some(entry.date),
                        abstract_text: entry.abstract_text,
                        content,
                        content_type: Some(kind),
                    }),
                    Ok(Err(e)) => tracing::warn!("Failed to extract text for paper ID {}: {}", id, e),
                    Err(e) => tracing::error!("Extraction task for paper ID {} failed: {}", id, e),
                }
            }

            let done = i + 1;
            if done % THROTTLE_EVERY == 0 {
                tracing::debug!("Processed {}/{} papers. Waiting {:?}...", done, total, self.throttle);
                tokio::time::sleep(self.throttle).await;
            }
            if done % PROGRESS_EVERY == 0 {
                tracing::info!("Processed {}/{} papers", done, total);
            }
        }

        tracing::info!("Returning {} papers with content out of {}", papers.len(), total);
        papers
    }
}

/// Keep entries whose id was not seen yet, capped at `max_results`
/// 去除已出现的论文并限制数量
pub fn dedup_entries(
    seen: &mut HashSet<String>,
    entries: Vec<FeedEntry>,
    max_results: Option<usize>,
) -> Vec<FeedEntry> {
    let mut fresh: Vec<FeedEntry> = entries.into_iter().filter(|e| seen.insert(e.id())).collect();
    if let Some(max) = max_results {
        fresh.truncate(max);
    }
    fresh
}
