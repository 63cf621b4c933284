//! Paper records flowing through the pipeline / 论文数据模型

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ItemError;

/// Where a paper's full text came from / 正文来源
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContentKind {
    /// LaTeX source bundle (e-print) / 源码包
    Source,
    /// Rendered PDF / PDF
    Pdf,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Source => "source",
            ContentKind::Pdf => "pdf",
        }
    }
}

/// A paper ready to be scored / 待评分论文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Paper {
    /// arXiv identifier, e.g. `2401.01234v1` / arXiv 编号
    pub id: String,
    pub title: String,
    pub link: String,
    /// Publication date / 发布日期
    pub date: Option<NaiveDate>,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub content: String,
    pub content_type: Option<ContentKind>,
}

impl Paper {
    /// Extract the arXiv id from an abstract link / 从链接中提取 arXiv 编号
    ///
    /// `http://arxiv.org/abs/2401.01234v1` -> `2401.01234v1`
    pub fn id_from_link(link: &str) -> String {
        link.rsplit("/abs/").next().unwrap_or(link).to_string()
    }
}

/// A paper as read from an untrusted source / 未校验的论文输入
///
/// Text fields are optional so that a missing field can be told apart from an
/// empty one.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawPaper {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default, rename = "abstract")]
    pub abstract_text: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub content_type: Option<ContentKind>,
}

impl TryFrom<RawPaper> for Paper {
    type Error = ItemError;

    fn try_from(raw: RawPaper) -> Result<Self, Self::Error> {
        let title = raw.title.ok_or(ItemError::MissingField("title"))?;
        let abstract_text = raw.abstract_text.ok_or(ItemError::MissingField("abstract"))?;
        let content = raw.content.ok_or(ItemError::MissingField("content"))?;
        let link = raw.link.unwrap_or_default();
        let id = match raw.id {
            Some(id) => id,
            None if !link.is_empty() => Paper::id_from_link(&link),
            None => String::new(),
        };

        Ok(Paper {
            id,
            title,
            link,
            date: raw.date,
            abstract_text,
            content,
            content_type: raw.content_type,
        })
    }
}

/// Per-field keyword sub-scores after weighting and capping / 关键词匹配分项
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct KeywordMatching {
    pub title: f64,
    #[serde(rename = "abstract")]
    pub abstract_score: f64,
    pub content: f64,
}

/// How a relevance score was composed, rounded to 2 decimals / 分数构成明细
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub keyword_matching: KeywordMatching,
    /// Zero or negative / 扣分（非正）
    pub exclusion_penalty: f64,
    /// Zero or positive / 加分（非负）
    pub important_words: f64,
}

/// A paper annotated by the scoring pipeline / 评分后的论文
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredPaper {
    #[serde(flatten)]
    pub paper: Paper,
    /// Unrounded, never negative / 未取整的相关性分数
    pub relevance_score: f64,
    pub score_breakdown: ScoreBreakdown,
    /// Min-max normalized within the batch / 批内归一化分数
    pub normalized_score: f64,
    /// Filled by the analyzer / 由分析器填充
    pub summary: Option<String>,
}

impl ScoredPaper {
    /// Summary if present, abstract otherwise / 优先摘要，否则原始摘要
    pub fn summary_or_abstract(&self) -> &str {
        match self.summary.as_deref() {
            Some(s) if !s.trim().is_empty() => s,
            _ => &self.paper.abstract_text,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_from_link() {
        assert_eq!(Paper::id_from_link("http://arxiv.org/abs/2401.01234v1"), "2401.01234v1");
        assert_eq!(Paper::id_from_link("2401.01234v1"), "2401.01234v1");
    }

    #[test]
    fn test_raw_paper_missing_field() {
        let raw = RawPaper {
            title: Some("A title".to_string()),
            abstract_text: Some(String::new()),
            ..Default::default()
        };
        assert_eq!(Paper::try_from(raw), Err(ItemError::MissingField("content")));
    }

    #[test]
    fn test_raw_paper_empty_fields_are_valid() {
        let raw: RawPaper = serde_json::from_str(
            r#"{"title": "", "abstract": "", "content": "", "link": "http://arxiv.org/abs/2401.00001v2"}"#,
        )
        .unwrap();
        let paper = Paper::try_from(raw).unwrap();
        assert_eq!(paper.id, "2401.00001v2");
        assert!(paper.title.is_empty());
        assert!(paper.content.is_empty());
    }
}
