//! arXiv Atom feed / arXiv Atom 订阅解析

use chrono::{NaiveDate, NaiveDateTime};
use quick_xml::events::Event;
use quick_xml::Reader;

use crate::error::FetchError;
use crate::models::Paper;

/// arXiv export API / arXiv 查询接口
pub const API_URL: &str = "http://export.arxiv.org/api/query";

const PUBLISHED_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";

/// One feed entry, before content is fetched / 订阅条目
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedEntry {
    pub title: String,
    /// Abstract page URL, the Atom `id` / 摘要页链接
    pub link: String,
    pub date: NaiveDate,
    pub abstract_text: String,
}

impl FeedEntry {
    pub fn id(&self) -> String {
        Paper::id_from_link(&self.link)
    }
}

/// Build the newest-first query URL for a category / 构建分类查询地址
pub fn query_url(category: &str, max_results: Option<usize>) -> String {
    let mut url = format!(
        "{}?search_query=cat:{}&start=0&sortBy=submittedDate&sortOrder=descending",
        API_URL, category
    );
    if let Some(max) = max_results {
        url.push_str(&format!("&max_results={}", max));
    }
    url
}

#[derive(Default)]
struct PartialEntry {
    title: Option<String>,
    id: Option<String>,
    published: Option<String>,
    summary: Option<String>,
}

impl PartialEntry {
    fn field(&mut self, name: &str) -> Option<&mut Option<String>> {
        match name {
            "title" => Some(&mut self.title),
            "id" => Some(&mut self.id),
            "published" => Some(&mut self.published),
            "summary" => Some(&mut self.summary),
            _ => None,
        }
    }
}

/// Parse a newest-first feed, keeping entries published on or after
/// `start_date` / 解析订阅并按起始日期截断
///
/// Parsing stops at the first older entry or once `max_results` entries were
/// collected. Incomplete entries and unparseable dates are skipped.
pub fn parse_feed(xml: &str, start_date: NaiveDate, max_results: Option<usize>) -> Result<Vec<FeedEntry>, FetchError> {
    let mut entries = Vec::new();
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);

    let mut current: Option<PartialEntry> = None;
    let mut field: Option<String> = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let local_name = e.local_name();
                let name = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
                match name {
                    "entry" => current = Some(PartialEntry::default()),
                    _ => {
                        // A present element counts even when its text is empty
                        if let Some(slot) = current.as_mut().and_then(|p| p.field(name)) {
                            slot.get_or_insert_with(String::new);
                            field = Some(name.to_string());
                        }
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                let local_name = e.local_name();
                let name = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
                if let Some(slot) = current.as_mut().and_then(|p| p.field(name)) {
                    slot.get_or_insert_with(String::new);
                }
            }
            Ok(Event::End(ref e)) => {
                let local_name = e.local_name();
                let name = std::str::from_utf8(local_name.as_ref()).unwrap_or("");
                if name != "entry" {
                    if field.as_deref() == Some(name) {
                        field = None;
                    }
                    continue;
                }

                let Some(partial) = current.take() else { continue };
                let Some(entry) = complete_entry(partial) else { continue };

                if entry.date < start_date {
                    tracing::debug!("Stopping at '{}' published {} before {}", entry.title, entry.date, start_date);
                    break;
                }
                tracing::debug!("Paper '{}' submitted on {}", entry.title, entry.date);
                entries.push(entry);

                if max_results.is_some_and(|max| entries.len() >= max) {
                    tracing::debug!("Reached max_results limit of {}", entries.len());
                    break;
                }
            }
            Ok(Event::Text(e)) => {
                if let (Some(partial), Some(name)) = (current.as_mut(), field.as_deref()) {
                    let text = e.unescape().map_err(|e| FetchError::Feed(e.to_string()))?;
                    if let Some(slot) = partial.field(name) {
                        slot.get_or_insert_with(String::new).push_str(&text);
                    }
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(FetchError::Feed(format!(
                    "error at position {}: {}",
                    reader.buffer_position(),
                    e
                )))
            }
            _ => {}
        }
    }

    Ok(entries)
}

fn complete_entry(partial: PartialEntry) -> Option<FeedEntry> {
    let (Some(title), Some(link), Some(published), Some(summary)) =
        (partial.title, partial.id, partial.published, partial.summary)
    else {
        tracing::warn!("Skipping entry due to missing required elements");
        return None;
    };

    let title = title.trim().to_string();
    match NaiveDateTime::parse_from_str(published.trim(), PUBLISHED_FORMAT) {
        Ok(published) => Some(FeedEntry {
            title,
            link: link.trim().to_string(),
            date: published.date(),
            abstract_text: summary.trim().to_string(),
        }),
        Err(_) => {
            tracing::warn!("Invalid date format for paper: {}", title);
            None
        }
    }
}
