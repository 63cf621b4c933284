//! Email digest / 邮件通知

use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};

use crate::config::{EmailConfig, SortOrder};
use crate::error::NotifyError;
use crate::models::ScoredPaper;

/// Digest subject line / 邮件主题
pub const SUBJECT: &str = "New Papers from ArXiv";

/// Order papers for the digest / 按配置排序
///
/// `Relevance` keeps the incoming order, which is the ranker's.
pub fn sort_papers(papers: &mut [ScoredPaper], order: SortOrder) {
    match order {
        SortOrder::Relevance => {}
        SortOrder::Alphabetical => papers.sort_by_cached_key(|p| p.paper.title.to_lowercase()),
        SortOrder::PublicationTime => papers.sort_by(|a, b| b.paper.date.cmp(&a.paper.date)),
    }
}

/// Plain text digest body / 纯文本邮件正文
pub fn render_body(papers: &[ScoredPaper]) -> String {
    let mut body = String::from("Here are the latest papers:\n\n");
    for p in papers {
        let date = p
            .paper
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        body.push_str(&format!("Title: {}\n", p.paper.title));
        body.push_str(&format!("Date: {}\n", date));
        body.push_str(&format!("Summary: {}\n", p.summary_or_abstract()));
        body.push_str(&format!("Link: {}\n", p.paper.link));
        body.push_str(&format!("Relevance Score: {:.2}\n\n", p.relevance_score));
    }
    body
}

fn mailbox(address: &str) -> Result<Mailbox, NotifyError> {
    address.parse().map_err(|e: lettre::address::AddressError| NotifyError::Address {
        address: address.to_string(),
        reason: e.to_string(),
    })
}

/// Build the digest message / 构建邮件
pub fn build_message(config: &EmailConfig, subject: &str, body: String) -> Result<Message, NotifyError> {
    let message = Message::builder()
        .from(mailbox(&config.from)?)
        .to(mailbox(&config.to)?)
        .subject(subject)
        .header(ContentType::TEXT_PLAIN)
        .body(body)?;
    Ok(message)
}

/// Send over SMTP with STARTTLS / 通过 SMTP (STARTTLS) 发送
pub async fn send_email(config: &EmailConfig, message: Message) -> Result<(), NotifyError> {
    let creds = Credentials::new(config.from.clone(), config.password.clone());

    let mailer: AsyncSmtpTransport<Tokio1Executor> =
        AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_server)?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

    mailer.send(message).await?;
    tracing::info!("Email sent successfully to {}", config.to);
    Ok(())
}

/// Sort, render and send the digest / 排序、渲染并发送摘要邮件
///
/// Returns `Ok(false)` without touching the network when there is nothing to
/// send.
pub async fn compile_and_send(mut papers: Vec<ScoredPaper>, config: &EmailConfig) -> Result<bool, NotifyError> {
    if papers.is_empty() {
        tracing::info!("No papers to send notifications for");
        return Ok(false);
    }

    sort_papers(&mut papers, config.sort_order);
    let message = build_message(config, SUBJECT, render_body(&papers))?;
    send_email(config, message).await?;
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Paper;
    use chrono::NaiveDate;

    fn scored(title: &str, date: Option<(i32, u32, u32)>, score: f64) -> ScoredPaper {
        ScoredPaper {
            paper: Paper {
                id: title.to_lowercase(),
                title: title.to_string(),
                link: format!("http://arxiv.org/abs/{}", title.to_lowercase()),
                date: date.and_then(|(y, m, d)| NaiveDate::from_ymd_opt(y, m, d)),
                abstract_text: format!("Abstract of {}", title),
                content: String::new(),
                content_type: None,
            },
            relevance_score: score,
            score_breakdown: Default::default(),
            normalized_score: 0.0,
            summary: None,
        }
    }

    fn email_config() -> EmailConfig {
        EmailConfig {
            to: "reader@example.com".to_string(),
            from: "paperweight@example.com".to_string(),
            password: "secret".to_string(),
            smtp_server: "smtp.example.com".to_string(),
            smtp_port: 587,
            sort_order: SortOrder::Relevance,
        }
    }

    fn titles(papers: &[ScoredPaper]) -> Vec<&str> {
        papers.iter().map(|p| p.paper.title.as_str()).collect()
    }

    fn batch() -> Vec<ScoredPaper> {
        vec![
            scored("beta", Some((2024, 3, 8)), 30.0),
            scored("Alpha", Some((2024, 3, 9)), 20.0),
            scored("gamma", None, 10.0),
            scored("Delta", Some((2024, 3, 1)), 5.0),
        ]
    }

    #[test]
    fn test_sort_orders() {
        let mut papers = batch();
        sort_papers(&mut papers, SortOrder::Relevance);
        assert_eq!(titles(&papers), vec!["beta", "Alpha", "gamma", "Delta"]);

        sort_papers(&mut papers, SortOrder::Alphabetical);
        assert_eq!(titles(&papers), vec!["Alpha", "beta", "Delta", "gamma"]);

        sort_papers(&mut papers, SortOrder::PublicationTime);
        assert_eq!(titles(&papers), vec!["Alpha", "beta", "Delta", "gamma"]);
    }

    #[test]
    fn test_render_body() {
        let mut first = scored("Alpha", Some((2024, 3, 9)), 12.346);
        first.summary = Some("LLM summary".to_string());
        let body = render_body(&[first, scored("gamma", None, 3.0)]);

        assert!(body.starts_with("Here are the latest papers:\n\n"));
        assert!(body.contains(
            "Title: Alpha\nDate: 2024-03-09\nSummary: LLM summary\nLink: http://arxiv.org/abs/alpha\nRelevance Score: 12.35\n\n"
        ));
        assert!(body.contains("Date: unknown\nSummary: Abstract of gamma\n"));
        assert!(body.ends_with("Relevance Score: 3.00\n\n"));
    }

    #[test]
    fn test_build_message() {
        let message = build_message(&email_config(), SUBJECT, "body text".to_string()).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Subject: New Papers from ArXiv"));
        assert!(raw.contains("To: reader@example.com"));
        assert!(raw.contains("body text"));
    }

    #[test]
    fn test_invalid_address() {
        let mut config = email_config();
        config.to = "not an address".to_string();
        assert!(matches!(
            build_message(&config, SUBJECT, String::new()),
            Err(NotifyError::Address { .. })
        ));
    }

    #[tokio::test]
    async fn test_nothing_to_send() {
        assert!(!compile_and_send(Vec::new(), &email_config()).await.unwrap());
    }
}
