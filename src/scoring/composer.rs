//! Score composer / 分数合成
//!
//! Combines weighted, capped per-field keyword signals with an exclusion
//! penalty and an important-words bonus. The caps are fixed policy constants.

use crate::config::ScoringConfig;
use crate::models::{KeywordMatching, Paper, ScoreBreakdown};

use super::signals::{count_important_word_occurrences, count_keyword_occurrences};

/// Title sub-score cap / 标题分上限
pub const MAX_TITLE_SCORE: f64 = 50.0;
/// Abstract sub-score cap / 摘要分上限
pub const MAX_ABSTRACT_SCORE: f64 = 50.0;
/// Content sub-score cap, also bounds the penalty and the bonus / 正文分上限
pub const MAX_CONTENT_SCORE: f64 = 25.0;

/// Score one paper / 对单篇论文评分
///
/// Returns the unrounded relevance score (never negative) and a breakdown
/// rounded to 2 decimals. Pure: same input, same output.
pub fn score_item(paper: &Paper, config: &ScoringConfig) -> (f64, ScoreBreakdown) {
    let title_signal = count_keyword_occurrences(&paper.title, &config.keywords);
    let abstract_signal = count_keyword_occurrences(&paper.abstract_text, &config.keywords);
    let content_signal = count_keyword_occurrences(&paper.content, &config.keywords);

    let title_score = (title_signal * config.title_keyword_weight).min(MAX_TITLE_SCORE);
    let abstract_score = (abstract_signal * config.abstract_keyword_weight).min(MAX_ABSTRACT_SCORE);
    let content_score = (content_signal * config.content_keyword_weight).min(MAX_CONTENT_SCORE);

    let mut total = title_score + abstract_score + content_score;

    // Exclusion terms are only looked for in the full content
    let exclusion_signal = count_keyword_occurrences(&paper.content, &config.exclusion_keywords);
    let exclusion_score = (exclusion_signal * config.exclusion_keyword_penalty).min(MAX_CONTENT_SCORE);
    total -= exclusion_score;

    let important_signal = count_important_word_occurrences(&paper.content, &config.important_words);
    let important_score = (important_signal * config.important_words_weight).min(MAX_CONTENT_SCORE);
    total += important_score;

    let breakdown = ScoreBreakdown {
        keyword_matching: KeywordMatching {
            title: round2(title_score),
            abstract_score: round2(abstract_score),
            content: round2(content_score),
        },
        // 0.0 - x keeps a zero penalty from printing as -0.0
        exclusion_penalty: 0.0 - round2(exclusion_score),
        important_words: round2(important_score),
    };

    (total.max(0.0), breakdown)
}

/// Round to 2 decimals for display / 保留两位小数
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paper(title: &str, abstract_text: &str, content: &str) -> Paper {
        Paper {
            id: "2401.00001v1".to_string(),
            title: title.to_string(),
            link: "http://arxiv.org/abs/2401.00001v1".to_string(),
            date: None,
            abstract_text: abstract_text.to_string(),
            content: content.to_string(),
            content_type: None,
        }
    }

    fn config() -> ScoringConfig {
        ScoringConfig {
            keywords: vec!["AI".to_string(), "artificial intelligence".to_string()],
            exclusion_keywords: vec!["biology".to_string()],
            important_words: vec!["neural networks".to_string()],
            title_keyword_weight: 3.0,
            abstract_keyword_weight: 2.0,
            content_keyword_weight: 1.0,
            exclusion_keyword_penalty: 5.0,
            important_words_weight: 0.5,
            min_score: 10.0,
        }
    }

    #[test]
    fn test_ai_paper_scenario() {
        let p = paper(
            "Test Paper on AI",
            "This paper is about artificial intelligence.",
            "We discuss various AI techniques.",
        );
        let (score, breakdown) = score_item(&p, &config());
        assert!(score > 0.0);
        assert_eq!(breakdown.exclusion_penalty, 0.0);
        assert_eq!(breakdown.important_words, 0.0);
        assert!(breakdown.keyword_matching.title > 0.0);
        assert!(breakdown.keyword_matching.abstract_score > 0.0);
        assert!(breakdown.keyword_matching.content > 0.0);
    }

    #[test]
    fn test_score_matches_breakdown_sum() {
        let mut cfg = config();
        cfg.important_words = vec!["deep".to_string()];
        let p = paper(
            "AI for AI",
            "artificial intelligence and AI",
            "deep deep AI with some biology",
        );
        let (score, b) = score_item(&p, &cfg);
        let sum = b.keyword_matching.title + b.keyword_matching.abstract_score + b.keyword_matching.content
            + b.exclusion_penalty
            + b.important_words;
        assert!((score - sum.max(0.0)).abs() < 0.05);
    }

    #[test]
    fn test_caps_applied() {
        let mut cfg = config();
        cfg.title_keyword_weight = 1000.0;
        cfg.abstract_keyword_weight = 1000.0;
        cfg.content_keyword_weight = 1000.0;
        cfg.important_words = vec!["ai".to_string()];
        cfg.important_words_weight = 1000.0;
        let p = paper("AI", "AI", "AI ai AI");
        let (score, b) = score_item(&p, &cfg);
        assert_eq!(b.keyword_matching.title, MAX_TITLE_SCORE);
        assert_eq!(b.keyword_matching.abstract_score, MAX_ABSTRACT_SCORE);
        assert_eq!(b.keyword_matching.content, MAX_CONTENT_SCORE);
        assert_eq!(b.important_words, MAX_CONTENT_SCORE);
        assert_eq!(score, 150.0);
    }

    #[test]
    fn test_exclusion_floors_at_zero() {
        let mut cfg = config();
        cfg.exclusion_keyword_penalty = 1000.0;
        let p = paper("Nothing relevant", "", "biology biology biology");
        let (score, b) = score_item(&p, &cfg);
        assert_eq!(score, 0.0);
        assert_eq!(b.exclusion_penalty, -MAX_CONTENT_SCORE);
    }

    #[test]
    fn test_exclusion_only_reads_content() {
        let p = paper("biology", "biology", "");
        let (_, b) = score_item(&p, &config());
        assert_eq!(b.exclusion_penalty, 0.0);
    }

    #[test]
    fn test_empty_lists_contribute_nothing() {
        let cfg = ScoringConfig {
            keywords: Vec::new(),
            exclusion_keywords: Vec::new(),
            important_words: Vec::new(),
            ..config()
        };
        let p = paper("AI", "AI", "AI biology");
        let (score, b) = score_item(&p, &cfg);
        assert_eq!(score, 0.0);
        assert_eq!(b, ScoreBreakdown::default());
    }

    #[test]
    fn test_idempotent() {
        let p = paper("AI", "artificial intelligence", "AI biology neural");
        let cfg = config();
        assert_eq!(score_item(&p, &cfg), score_item(&p, &cfg));
    }

    #[test]
    fn test_weight_monotonicity() {
        let p = paper("AI in AI", "artificial intelligence", "AI and more AI");
        let mut cfg = config();
        let mut previous = score_item(&p, &cfg).0;
        for weight in [3.5, 5.0, 10.0, 40.0, 100.0] {
            cfg.title_keyword_weight = weight;
            let (score, _) = score_item(&p, &cfg);
            assert!(score >= previous);
            previous = score;
        }
    }

    #[test]
    fn test_bounds_hold_on_noisy_text() {
        let cfg = ScoringConfig {
            important_words: vec!["model".to_string(), "data".to_string()],
            ..config()
        };
        let texts = [
            "",
            "AI",
            "biology biology biology biology AI",
            "A model of data, with data and model and AI, artificial intelligence!",
            "ΑΙ ai Ai aI - ελληνικά biology",
        ];
        for title in texts {
            for content in texts {
                let (score, b) = score_item(&paper(title, content, content), &cfg);
                assert!(score >= 0.0);
                assert!((0.0..=MAX_TITLE_SCORE).contains(&b.keyword_matching.title));
                assert!((0.0..=MAX_ABSTRACT_SCORE).contains(&b.keyword_matching.abstract_score));
                assert!((0.0..=MAX_CONTENT_SCORE).contains(&b.keyword_matching.content));
                assert!((-MAX_CONTENT_SCORE..=0.0).contains(&b.exclusion_penalty));
                assert!((0.0..=MAX_CONTENT_SCORE).contains(&b.important_words));
            }
        }
    }

    #[test]
    fn test_round2() {
        assert_eq!(round2(1.234), 1.23);
        assert_eq!(round2(1.235_1), 1.24);
        assert_eq!(round2(0.0), 0.0);
    }
}
