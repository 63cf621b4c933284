//! Word tokenizer / 分词器
//!
//! Splits text into maximal runs of alphanumeric or underscore characters,
//! lower-cased. Unicode letters and digits count as word characters.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

/// Word pattern (Unicode aware `\w+`) / 单词模式
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"\w+").expect("valid word regex"));

/// Tokenize text into lower-cased words / 对文本进行分词
pub fn tokenize(text: &str) -> Vec<String> {
    let lower = text.to_lowercase();
    WORD.find_iter(&lower).map(|m| m.as_str().to_string()).collect()
}

/// Count occurrences of each distinct token / 统计词频
pub fn word_counts(text: &str) -> HashMap<String, usize> {
    let lower = text.to_lowercase();
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in WORD.find_iter(&lower) {
        *counts.entry(m.as_str().to_string()).or_insert(0) += 1;
    }
    counts
}

/// Rough token estimate used for LLM request logging / 粗略估算 token 数
pub fn approx_token_count(text: &str) -> usize {
    WORD.find_iter(text).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tokenize_english() {
        let tokens = tokenize("Hello, World! snake_case 42x");
        assert_eq!(tokens, vec!["hello", "world", "snake_case", "42x"]);
    }

    #[test]
    fn test_tokenize_punctuation_only() {
        assert!(tokenize("... --- !!!").is_empty());
        assert!(tokenize("").is_empty());
    }

    #[test]
    fn test_word_counts() {
        let counts = word_counts("Neural nets; neural NETS and neural-networks");
        assert_eq!(counts.get("neural"), Some(&3));
        assert_eq!(counts.get("nets"), Some(&2));
        assert_eq!(counts.get("networks"), Some(&1));
        assert_eq!(counts.get("neural-networks"), None);
    }

    #[test]
    fn test_unicode_words() {
        let tokens = tokenize("Über Straße");
        assert_eq!(tokens, vec!["über", "straße"]);
    }
}
