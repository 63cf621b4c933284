//! Pipeline driver / 评分流水线
//!
//! receive -> score (parallel) -> filter -> normalize -> sort.
//! The scoring map runs on rayon; the normalize/sort step runs on the calling
//! thread once every score is known.

use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;

use crate::config::ScoringConfig;
use crate::error::{ConfigError, ItemError};
use crate::models::{Paper, RawPaper, ScoredPaper};

use super::composer::score_item;
use super::ranker;

/// An input item that could not be scored / 被拒绝的输入条目
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    /// Position in the input batch / 在输入中的位置
    pub index: usize,
    pub id: Option<String>,
    pub reason: String,
}

/// Ranked papers plus the items that were skipped / 排序结果及被跳过的条目
#[derive(Debug, Clone, Serialize)]
pub struct RankOutcome {
    pub ranked: Vec<ScoredPaper>,
    pub rejected: Vec<Rejection>,
}

/// Scoring pipeline bound to a validated configuration / 已校验配置的评分流水线
#[derive(Debug, Clone)]
pub struct Pipeline {
    config: ScoringConfig,
}

impl Pipeline {
    /// Validate the configuration before any paper is processed / 先校验配置
    pub fn new(config: ScoringConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ScoringConfig {
        &self.config
    }

    /// Rank a batch of papers / 对一批论文评分排序
    pub fn process(&self, papers: Vec<Paper>) -> Vec<ScoredPaper> {
        let total = papers.len();

        let scored: Vec<ScoredPaper> = papers
            .into_par_iter()
            .map(|paper| {
                let (relevance_score, score_breakdown) = score_item(&paper, &self.config);
                ScoredPaper {
                    paper,
                    relevance_score,
                    score_breakdown,
                    normalized_score: 0.0,
                    summary: None,
                }
            })
            .collect();

        let ranked = ranker::finish(scored, self.config.min_score);
        tracing::info!(
            "Scored {} papers, {} reached min_score {}",
            total,
            ranked.len(),
            self.config.min_score
        );
        ranked
    }

    /// Validate raw items, skip malformed ones and rank the rest / 校验原始条目后排序
    ///
    /// Every skipped item is reported in `RankOutcome::rejected`.
    pub fn process_raw(&self, items: Vec<RawPaper>) -> RankOutcome {
        self.process_items(items.into_iter().map(Ok))
    }

    /// Same as `process_raw` for untyped JSON values / 处理未类型化的 JSON 条目
    ///
    /// A value that does not even deserialize (wrong field types, not an
    /// object) is rejected like a missing field.
    pub fn process_values(&self, items: Vec<Value>) -> RankOutcome {
        self.process_items(
            items
                .into_iter()
                .map(|v| {
                    let id = v
                        .get("id")
                        .and_then(Value::as_str)
                        .map(str::to_string)
                        .or_else(|| v.get("link").and_then(Value::as_str).map(Paper::id_from_link));
                    serde_json::from_value::<RawPaper>(v).map_err(|e| (id, e.to_string()))
                }),
        )
    }

    fn process_items(
        &self,
        items: impl Iterator<Item = Result<RawPaper, (Option<String>, String)>>,
    ) -> RankOutcome {
        let mut papers = Vec::new();
        let mut rejected = Vec::new();

        for (index, item) in items.enumerate() {
            let raw = match item {
                Ok(raw) => raw,
                Err((id, reason)) => {
                    tracing::warn!("Skipping item #{} ({:?}): {}", index, id, reason);
                    rejected.push(Rejection { index, id, reason });
                    continue;
                }
            };

            let id = raw.id.clone().or_else(|| raw.link.as_deref().map(Paper::id_from_link));
            match Paper::try_from(raw) {
                Ok(paper) => papers.push(paper),
                Err(ItemError::MissingField(field)) => {
                    tracing::warn!("Skipping item #{} ({:?}): missing field '{}'", index, id, field);
                    rejected.push(Rejection {
                        index,
                        id,
                        reason: format!("missing field '{}'", field),
                    });
                }
            }
        }

        RankOutcome {
            ranked: self.process(papers),
            rejected,
        }
    }
}
