//! Paper summaries / 论文摘要生成
//!
//! `abstract` mode reuses each paper's abstract. `summary` mode asks an LLM
//! and falls back to the abstract whenever that does not work out.

use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{AnalysisType, AnalyzerConfig, LlmProvider};
use crate::error::AnalyzerError;
use crate::models::ScoredPaper;
use crate::retry::RetryPolicy;
use crate::scoring::tokenizer::approx_token_count;

pub const OPENAI_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const OPENAI_MODEL: &str = "gpt-4o-mini";
pub const GEMINI_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const GEMINI_MODEL: &str = "gemini-1.5-flash";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Prompt sent to the LLM / 摘要提示词
pub fn build_prompt(content: &str) -> String {
    format!(
        "Write a concise, accurate summary of the following paper's content in about 3-5 sentences:\n\n```{}```",
        content
    )
}

/// Summary generator / 摘要生成器
pub struct Analyzer {
    config: AnalyzerConfig,
    client: Client,
    retry: RetryPolicy,
}

impl Analyzer {
    pub fn new(config: AnalyzerConfig) -> Result<Self, AnalyzerError> {
        let client = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self {
            config,
            client,
            retry: RetryPolicy::default(),
        })
    }

    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Fill `summary` on every paper, in order / 为每篇论文填充摘要
    pub async fn summarize_all(&self, papers: &mut [ScoredPaper]) {
        let total = papers.len();
        for (i, paper) in papers.iter_mut().enumerate() {
            if self.config.analysis_type == AnalysisType::Summary {
                tracing::info!("Summarizing paper {}/{}: {}", i + 1, total, paper.paper.title);
            }
            paper.summary = Some(self.summarize(paper).await);
        }
    }

    /// Digest text for one paper / 生成单篇论文的摘要
    pub async fn summarize(&self, paper: &ScoredPaper) -> String {
        let fallback = || paper.paper.abstract_text.clone();

        if self.config.analysis_type == AnalysisType::Abstract {
            return fallback();
        }

        let (Some(provider), Some(api_key)) = (
            self.config.llm_provider,
            self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()),
        ) else {
            tracing::warn!("No valid LLM provider or API key available. Falling back to abstract.");
            return fallback();
        };

        let prompt = build_prompt(&paper.paper.content);
        tracing::info!("Input token count: {}", approx_token_count(&prompt));

        let label = format!("{} summary for {}", provider.as_str(), paper.paper.id);
        let result = self
            .retry
            .run(&label, AnalyzerError::is_retryable, || {
                self.request_summary(provider, api_key, &prompt)
            })
            .await;

        match result {
            Ok(summary) if !summary.trim().is_empty() => {
                tracing::info!("Output token count: {}", approx_token_count(&summary));
                summary
            }
            Ok(_) => {
                tracing::warn!("Empty summary for {}, using abstract", paper.paper.id);
                fallback()
            }
            Err(e) => {
                tracing::error!("Error summarizing paper {}: {}", paper.paper.id, e);
                fallback()
            }
        }
    }

    async fn request_summary(&self, provider: LlmProvider, api_key: &str, prompt: &str) -> Result<String, AnalyzerError> {
        let request = match provider {
            LlmProvider::Openai => self
                .client
                .post(OPENAI_URL)
                .bearer_auth(api_key)
                .json(&openai_body(prompt)),
            LlmProvider::Gemini => self
                .client
                .post(format!("{}/{}:generateContent", GEMINI_URL, GEMINI_MODEL))
                .query(&[("key", api_key)])
                .json(&gemini_body(prompt)),
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(AnalyzerError::Status {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        let json: Value = resp.json().await?;
        let text = match provider {
            LlmProvider::Openai => openai_text(&json),
            LlmProvider::Gemini => gemini_text(&json),
        };
        text.map(|t| t.trim().to_string()).ok_or(AnalyzerError::EmptyResponse)
    }
}

fn openai_body(prompt: &str) -> Value {
    json!({
        "model": OPENAI_MODEL,
        "messages": [{ "role": "user", "content": prompt }],
    })
}

fn gemini_body(prompt: &str) -> Value {
    json!({
        "contents": [{ "parts": [{ "text": prompt }] }],
    })
}

fn openai_text(json: &Value) -> Option<&str> {
    json["choices"][0]["message"]["content"].as_str()
}

fn gemini_text(json: &Value) -> Option<&str> {
    json["candidates"][0]["content"]["parts"][0]["text"].as_str()
}
