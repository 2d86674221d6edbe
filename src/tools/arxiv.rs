//! ArXiv 工具：调用 arXiv Atom 查询接口，返回前几篇论文的标题、链接与摘要
//!
//! Atom 结构固定且简单，直接用正则取 `<entry>` 中的 title / id / summary。

use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;

use crate::config::{ArxivSection, ToolsSection};
use crate::tools::http::{build_client, clean_query, get_text};
use crate::tools::{Tool, ToolError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArxivEntry {
    pub title: String,
    pub link: String,
    pub summary: String,
}

pub struct ArxivTool {
    client: Client,
    base_url: String,
    max_results: usize,
    summary_chars: usize,
    entry_re: Regex,
    field_re: Regex,
}

impl ArxivTool {
    pub fn new(tools: &ToolsSection, section: &ArxivSection) -> Self {
        Self {
            client: build_client(tools.http_timeout_secs, &tools.user_agent),
            base_url: section.base_url.trim_end_matches('/').to_string(),
            max_results: section.max_results,
            summary_chars: section.summary_chars,
            entry_re: Regex::new(r"(?s)<entry>(.*?)</entry>").expect("static regex"),
            field_re: Regex::new(r"(?s)<(title|id|summary)>(.*?)</(?:title|id|summary)>")
                .expect("static regex"),
        }
    }

    /// 从 Atom 文本中解析条目；缺字段的条目跳过
    pub fn parse_feed(&self, xml: &str) -> Vec<ArxivEntry> {
        self.entry_re
            .captures_iter(xml)
            .filter_map(|entry| {
                let body = entry.get(1)?.as_str();
                let (mut title, mut link, mut summary) = (None, None, None);
                for cap in self.field_re.captures_iter(body) {
                    let value = normalize(&cap[2]);
                    match &cap[1] {
                        "title" => title = title.or(Some(value)),
                        "id" => link = link.or(Some(value)),
                        _ => summary = summary.or(Some(value)),
                    }
                }
                Some(ArxivEntry {
                    title: title?,
                    link: link?,
                    summary: summary?,
                })
            })
            .collect()
    }

    fn format_entries(&self, entries: &[ArxivEntry]) -> String {
        entries
            .iter()
            .map(|e| {
                format!(
                    "Title: {}\nLink: {}\nSummary: {}...\n",
                    e.title,
                    e.link,
                    e.summary.chars().take(self.summary_chars).collect::<String>()
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// 折叠空白并还原 XML 实体
fn normalize(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}

#[async_trait]
impl Tool for ArxivTool {
    fn name(&self) -> &str {
        "ArXiv"
    }

    fn description(&self) -> &str {
        "Searches arXiv for scientific papers. research paper topic or keywords."
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let query = clean_query(input);
        if query.is_empty() {
            return Ok("No query provided.".to_string());
        }
        tracing::info!(query = %query, "arxiv search");
        let url = format!("{}/api/query", self.base_url);
        let xml = get_text(
            &self.client,
            &url,
            &[
                ("search_query", format!("all:{query}")),
                ("start", "0".to_string()),
                ("max_results", self.max_results.to_string()),
            ],
        )
        .await?;
        let mut entries = self.parse_feed(&xml);
        entries.truncate(self.max_results);
        if entries.is_empty() {
            return Ok("No results found on arXiv.".to_string());
        }
        Ok(self.format_entries(&entries))
    }

    fn describe_failure(&self, err: &ToolError) -> String {
        format!("Error searching ArXiv: {err}")
    }
}
