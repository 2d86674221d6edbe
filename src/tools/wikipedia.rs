//! Wikipedia 工具：MediaWiki API 搜索最相关条目，返回其导言摘要的前若干字符
//!
//! 命中消歧义页时改查该页的第一个条目链接；第二次查询仍拿不到摘要才提示 "Multiple Wikipedia articles found"。

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::{ToolsSection, WikipediaSection};
use crate::tools::http::{build_client, clean_query, get_json};
use crate::tools::{Tool, ToolError};

/// 条目查询结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageLookup {
    Summary(String),
    /// 消歧义页；`first_option` 为页内第一个主命名空间链接
    Disambiguation { first_option: Option<String> },
    Missing,
}

pub struct WikipediaTool {
    client: Client,
    api_url: String,
    summary_chars: usize,
}

impl WikipediaTool {
    pub fn new(tools: &ToolsSection, section: &WikipediaSection) -> Self {
        Self {
            client: build_client(tools.http_timeout_secs, &tools.user_agent),
            api_url: format!("{}/w/api.php", section.base_url.trim_end_matches('/')),
            summary_chars: section.summary_chars,
        }
    }

    async fn top_title(&self, query: &str) -> Result<Option<String>, ToolError> {
        let data = get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query".to_string()),
                ("list", "search".to_string()),
                ("srsearch", query.to_string()),
                ("srlimit", "1".to_string()),
                ("format", "json".to_string()),
            ],
        )
        .await?;
        Ok(parse_top_title(&data))
    }

    async fn page(&self, title: &str) -> Result<PageLookup, ToolError> {
        let data = get_json(
            &self.client,
            &self.api_url,
            &[
                ("action", "query".to_string()),
                ("prop", "extracts|pageprops|links".to_string()),
                ("exintro", "1".to_string()),
                ("plnamespace", "0".to_string()),
                ("pllimit", "1".to_string()),
                ("explaintext", "1".to_string()),
                ("redirects", "1".to_string()),
                ("titles", title.to_string()),
                ("format", "json".to_string()),
            ],
        )
        .await?;
        parse_page(&data)
    }

    /// 消歧义页：查第一个候选条目，只接受正常摘要
    async fn first_option_summary(&self, first_option: Option<String>) -> Option<String> {
        let title = first_option?;
        match self.page(&title).await {
            Ok(PageLookup::Summary(text)) => Some(text),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!(title = %title, error = %e, "disambiguation follow-up failed");
                None
            }
        }
    }
}

fn parse_top_title(data: &Value) -> Option<String> {
    data.pointer("/query/search/0/title")
        .and_then(Value::as_str)
        .map(String::from)
}

fn parse_page(data: &Value) -> Result<PageLookup, ToolError> {
    let page = data
        .pointer("/query/pages")
        .and_then(Value::as_object)
        .and_then(|pages| pages.values().next())
        .ok_or_else(|| ToolError::Parse("missing 'query.pages'".to_string()))?;
    if page.get("missing").is_some() {
        return Ok(PageLookup::Missing);
    }
    if page.pointer("/pageprops/disambiguation").is_some() {
        let first_option = page
            .pointer("/links/0/title")
            .and_then(Value::as_str)
            .map(String::from);
        return Ok(PageLookup::Disambiguation { first_option });
    }
    match page.get("extract").and_then(Value::as_str) {
        Some(text) if !text.trim().is_empty() => Ok(PageLookup::Summary(text.trim().to_string())),
        _ => Ok(PageLookup::Missing),
    }
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    fn description(&self) -> &str {
        "Get detailed explanations and summaries from Wikipedia. who, what, when, where, why, how, story."
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let query = clean_query(input);
        tracing::info!(query = %query, "wikipedia search");
        let Some(title) = self.top_title(&query).await? else {
            return Ok(format!("No Wikipedia articles found for '{query}'"));
        };
        match self.page(&title).await? {
            PageLookup::Summary(text) => Ok(text.chars().take(self.summary_chars).collect()),
            PageLookup::Disambiguation { first_option } => {
                match self.first_option_summary(first_option).await {
                    Some(text) => Ok(text.chars().take(self.summary_chars).collect()),
                    None => Ok(format!(
                        "Multiple Wikipedia articles found for '{query}'. Please be more specific."
                    )),
                }
            }
            PageLookup::Missing => Ok(format!("No Wikipedia article found for '{query}'")),
        }
    }

    fn describe_failure(&self, err: &ToolError) -> String {
        format!("An error occurred while searching Wikipedia: {err}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_top_title() {
        let data = json!({"query": {"search": [{"title": "Alan Turing", "pageid": 1208}]}});
        assert_eq!(parse_top_title(&data).as_deref(), Some("Alan Turing"));
        assert_eq!(parse_top_title(&json!({"query": {"search": []}})), None);
    }

    #[test]
    fn test_parse_page_variants() {
        let summary = json!({"query": {"pages": {"1208": {"title": "Alan Turing", "extract": " Alan Mathison Turing was... "}}}});
        assert_eq!(
            parse_page(&summary).unwrap(),
            PageLookup::Summary("Alan Mathison Turing was...".to_string())
        );

        let disambig = json!({"query": {"pages": {"5": {"title": "Mercury", "pageprops": {"disambiguation": ""}, "extract": "Mercury may refer to"}}}});
        assert_eq!(
            parse_page(&disambig).unwrap(),
            PageLookup::Disambiguation { first_option: None }
        );

        let missing = json!({"query": {"pages": {"-1": {"title": "Zzq", "missing": ""}}}});
        assert_eq!(parse_page(&missing).unwrap(), PageLookup::Missing);

        assert!(parse_page(&json!({"batchcomplete": ""})).is_err());
    }

    #[test]
    fn test_disambiguation_keeps_first_linked_article() {
        let data = json!({"query": {"pages": {"5": {
            "title": "Mercury",
            "pageprops": {"disambiguation": ""},
            "links": [{"ns": 0, "title": "Mercury (planet)"}],
            "extract": "Mercury may refer to:"
        }}}});
        assert_eq!(
            parse_page(&data).unwrap(),
            PageLookup::Disambiguation {
                first_option: Some("Mercury (planet)".to_string())
            }
        );
    }

    #[tokio::test]
    async fn test_disambiguation_without_reachable_option_yields_nothing() {
        let tools = ToolsSection {
            http_timeout_secs: 2,
            ..ToolsSection::default()
        };
        let t = WikipediaTool::new(
            &tools,
            &WikipediaSection {
                base_url: "http://127.0.0.1:9".to_string(),
                ..WikipediaSection::default()
            },
        );
        assert_eq!(t.first_option_summary(None).await, None);
        assert_eq!(t.first_option_summary(Some("Mercury (planet)".to_string())).await, None);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_as_text() {
        let tools = ToolsSection {
            http_timeout_secs: 2,
            ..ToolsSection::default()
        };
        let t = WikipediaTool::new(
            &tools,
            &WikipediaSection {
                base_url: "http://127.0.0.1:9".to_string(),
                ..WikipediaSection::default()
            },
        );
        let err = t.execute("Alan Turing").await.unwrap_err();
        assert!(t
            .describe_failure(&err)
            .starts_with("An error occurred while searching Wikipedia:"));
    }
}
