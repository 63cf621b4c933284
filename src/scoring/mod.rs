//! Relevance scoring module / 相关性评分模块
//!
//! Pure, synchronous computation over in-memory papers:
//! - signals: keyword and important-word counting / 文本信号
//! - composer: weighted, capped per-paper score with breakdown / 单篇评分
//! - ranker: threshold filter, min-max normalization, stable sort / 批量排序
//! - pipeline: validated entry point used by the job / 流水线入口

pub mod composer;
pub mod pipeline;
pub mod ranker;
pub mod signals;
pub mod tokenizer;

pub use composer::{score_item, MAX_ABSTRACT_SCORE, MAX_CONTENT_SCORE, MAX_TITLE_SCORE};
pub use pipeline::{Pipeline, RankOutcome, Rejection};
pub use ranker::rank;
pub use signals::{count_important_word_occurrences, count_keyword_occurrences};
