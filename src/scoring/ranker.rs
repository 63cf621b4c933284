//! Batch ranker / 批量排序
//!
//! Threshold filter, min-max normalization across the surviving batch and a
//! stable descending sort.

use std::cmp::Ordering;

use crate::config::ScoringConfig;
use crate::models::{Paper, ScoredPaper};

use super::composer::score_item;

/// Score, filter, normalize and sort a batch / 评分、过滤、归一化并排序
///
/// Empty input, or a batch where nothing reaches `min_score`, yields an empty
/// vector.
pub fn rank(papers: Vec<Paper>, config: &ScoringConfig) -> Vec<ScoredPaper> {
    let scored = papers
        .into_iter()
        .map(|paper| {
            let (relevance_score, score_breakdown) = score_item(&paper, config);
            ScoredPaper {
                paper,
                relevance_score,
                score_breakdown,
                normalized_score: 0.0,
                summary: None,
            }
        })
        .collect();

    finish(scored, config.min_score)
}

/// Filter, normalize and sort already-scored papers / 对已评分论文做后续处理
pub(crate) fn finish(scored: Vec<ScoredPaper>, min_score: f64) -> Vec<ScoredPaper> {
    let mut kept = filter_by_min_score(scored, min_score);
    normalize_scores(&mut kept);
    sort_by_normalized(&mut kept);
    kept
}

/// Keep papers whose unrounded score reaches the threshold / 按阈值过滤
pub fn filter_by_min_score(scored: Vec<ScoredPaper>, min_score: f64) -> Vec<ScoredPaper> {
    let total = scored.len();
    let kept: Vec<ScoredPaper> = scored
        .into_iter()
        .filter(|p| {
            let keep = p.relevance_score >= min_score;
            if !keep {
                tracing::debug!(
                    "Dropping '{}' (score {:.2} below {:.2})",
                    p.paper.title,
                    p.relevance_score,
                    min_score
                );
            }
            keep
        })
        .collect();

    tracing::debug!("Kept {} papers out of {}", kept.len(), total);
    kept
}

/// Min-max normalize relevance scores into [0, 1] / 最小-最大归一化
///
/// When every score is equal (including a single paper) all get 1.0.
pub fn normalize_scores(papers: &mut [ScoredPaper]) {
    if papers.is_empty() {
        return;
    }

    let (lo, hi) = papers.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), p| {
        (lo.min(p.relevance_score), hi.max(p.relevance_score))
    });

    let range = hi - lo;
    for p in papers.iter_mut() {
        p.normalized_score = if range == 0.0 {
            1.0
        } else {
            (p.relevance_score - lo) / range
        };
    }
}

/// Stable sort, highest normalized score first / 稳定降序排序
pub fn sort_by_normalized(papers: &mut [ScoredPaper]) {
    papers.sort_by(|a, b| {
        b.normalized_score
            .partial_cmp(&a.normalized_score)
            .unwrap_or(Ordering::Equal)
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scored(id: &str, relevance_score: f64) -> ScoredPaper {
        ScoredPaper {
            paper: Paper {
                id: id.to_string(),
                title: format!("Paper {}", id),
                link: format!("http://arxiv.org/abs/{}", id),
                date: None,
                abstract_text: String::new(),
                content: String::new(),
                content_type: None,
            },
            relevance_score,
            score_breakdown: Default::default(),
            normalized_score: 0.0,
            summary: None,
        }
    }

    fn ids(papers: &[ScoredPaper]) -> Vec<&str> {
        papers.iter().map(|p| p.paper.id.as_str()).collect()
    }

    #[test]
    fn test_equal_scores_normalize_to_one() {
        let mut batch = vec![scored("a", 10.0), scored("b", 10.0), scored("c", 10.0)];
        normalize_scores(&mut batch);
        assert!(batch.iter().all(|p| p.normalized_score == 1.0));
    }

    #[test]
    fn test_single_item_normalizes_to_one() {
        let result = finish(vec![scored("a", 3.0)], 0.0);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].normalized_score, 1.0);
    }

    #[test]
    fn test_spread_scores() {
        let batch = vec![scored("a", 10.0), scored("b", 20.0), scored("c", 30.0), scored("d", 40.0)];
        let result = finish(batch, 0.0);
        assert_eq!(ids(&result), vec!["d", "c", "b", "a"]);

        let normalized: Vec<f64> = result.iter().map(|p| p.normalized_score).collect();
        assert_eq!(normalized[0], 1.0);
        assert_eq!(normalized[3], 0.0);
        let (x, y) = (normalized[2], normalized[1]);
        assert!(0.0 < x && x < 1.0);
        assert!(0.0 < y && y < 1.0);
        assert!(x < y);
    }

    #[test]
    fn test_threshold_filter() {
        let batch = vec![scored("a", 4.99), scored("b", 5.0), scored("c", 12.0)];
        let result = finish(batch, 5.0);
        assert_eq!(ids(&result), vec!["c", "b"]);
        assert!(result.iter().all(|p| p.relevance_score >= 5.0));
    }

    #[test]
    fn test_everything_filtered() {
        let batch = vec![scored("a", 1.0), scored("b", 2.0)];
        assert!(finish(batch, 100.0).is_empty());
    }

    #[test]
    fn test_empty_input() {
        let config = ScoringConfig {
            keywords: vec!["ai".to_string()],
            exclusion_keywords: Vec::new(),
            important_words: Vec::new(),
            title_keyword_weight: 1.0,
            abstract_keyword_weight: 1.0,
            content_keyword_weight: 1.0,
            exclusion_keyword_penalty: 1.0,
            important_words_weight: 1.0,
            min_score: 0.0,
        };
        assert!(rank(Vec::new(), &config).is_empty());
    }

    #[test]
    fn test_stable_for_ties() {
        let batch = vec![
            scored("first", 7.0),
            scored("top", 9.0),
            scored("second", 7.0),
            scored("third", 7.0),
            scored("low", 1.0),
        ];
        let result = finish(batch, 0.0);
        assert_eq!(ids(&result), vec!["top", "first", "second", "third", "low"]);
        for pair in result.windows(2) {
            assert!(pair[0].normalized_score >= pair[1].normalized_score);
        }
    }

    #[test]
    fn test_normalization_bounds() {
        let batch: Vec<ScoredPaper> = [3.2, 8.7, 0.0, 15.1, 8.7]
            .iter()
            .enumerate()
            .map(|(i, s)| scored(&i.to_string(), *s))
            .collect();
        let result = finish(batch, 0.0);
        let min = result.iter().map(|p| p.normalized_score).fold(f64::INFINITY, f64::min);
        let max = result.iter().map(|p| p.normalized_score).fold(f64::NEG_INFINITY, f64::max);
        assert_eq!(min, 0.0);
        assert_eq!(max, 1.0);
    }
}
