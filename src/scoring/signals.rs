//! Text signal extraction / 文本信号提取
//!
//! Both signals are dampened with `ln(count + 1)` per term, so repetition is
//! rewarded but cannot run away.

use super::tokenizer::word_counts;

/// Sum of `ln(count + 1)` over keywords, counting case-insensitive substring
/// matches / 关键词子串计数
///
/// A keyword that never occurs contributes `ln(1) = 0`.
pub fn count_keyword_occurrences<S: AsRef<str>>(text: &str, keywords: &[S]) -> f64 {
    if keywords.is_empty() {
        return 0.0;
    }

    let lower = text.to_lowercase();
    keywords
        .iter()
        .map(|keyword| {
            let needle = keyword.as_ref().to_lowercase();
            let count = lower.matches(needle.as_str()).count();
            (count as f64 + 1.0).ln()
        })
        .sum()
}

/// Sum of `ln(count + 1)` over important words found as whole tokens / 重要词整词计数
///
/// Words absent from the text are skipped, which is numerically the same as
/// adding `ln(1)`.
pub fn count_important_word_occurrences<S: AsRef<str>>(text: &str, important_words: &[S]) -> f64 {
    if important_words.is_empty() {
        return 0.0;
    }

    let counts = word_counts(text);
    important_words
        .iter()
        .filter_map(|word| counts.get(&word.as_ref().to_lowercase()))
        .map(|&count| (count as f64 + 1.0).ln())
        .sum()
}
