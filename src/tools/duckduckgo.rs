//! DuckDuckGo 工具：抓取 html.duckduckgo.com 结果页，提取前几条的标题、摘要与链接
//!
//! 结果页无 JS，标题在 `a.result__a`，摘要在 `a.result__snippet`；链接经 `/l/?uddg=` 跳转，取 uddg 原始地址。
//! 片段中的标签与实体用 html2text 还原为纯文本。

use async_trait::async_trait;
use html2text::from_read;
use regex::Regex;
use reqwest::{Client, Url};

use crate::config::{DuckDuckGoSection, ToolsSection};
use crate::tools::http::{build_client, clean_query, get_text};
use crate::tools::{Tool, ToolError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub title: String,
    pub snippet: String,
    pub link: String,
}

pub struct DuckDuckGoTool {
    client: Client,
    base_url: String,
    max_results: usize,
    snippet_chars: usize,
    title_re: Regex,
    href_re: Regex,
    snippet_re: Regex,
    tag_re: Regex,
}

impl DuckDuckGoTool {
    pub fn new(tools: &ToolsSection, section: &DuckDuckGoSection) -> Self {
        Self {
            client: build_client(tools.http_timeout_secs, &tools.user_agent),
            base_url: section.base_url.trim_end_matches('/').to_string(),
            max_results: section.max_results,
            snippet_chars: section.snippet_chars,
            title_re: Regex::new(r#"(?s)<a([^>]*class="result__a"[^>]*)>(.*?)</a>"#)
                .expect("static regex"),
            href_re: Regex::new(r#"href="([^"]*)""#).expect("static regex"),
            snippet_re: Regex::new(r#"(?s)class="result__snippet"[^>]*>(.*?)</(?:a|div|td)>"#)
                .expect("static regex"),
            tag_re: Regex::new(r"<[^>]+>").expect("static regex"),
        }
    }

    /// 解析结果页；标题与摘要按出现顺序配对
    pub fn parse_results(&self, html: &str) -> Vec<SearchHit> {
        let snippets: Vec<String> = self
            .snippet_re
            .captures_iter(html)
            .map(|c| self.fragment_text(&c[1]))
            .collect();
        self.title_re
            .captures_iter(html)
            .enumerate()
            .filter_map(|(i, cap)| {
                let href = self.href_re.captures(&cap[1])?.get(1)?.as_str();
                Some(SearchHit {
                    title: self.fragment_text(&cap[2]),
                    snippet: snippets.get(i).cloned().unwrap_or_default(),
                    link: resolve_link(href),
                })
            })
            .filter(|hit| !hit.title.is_empty())
            .take(self.max_results)
            .collect()
    }

    fn fragment_text(&self, fragment: &str) -> String {
        let stripped = self.tag_re.replace_all(fragment, "");
        let text = match from_read(stripped.as_bytes(), 10_000) {
            Ok(text) if !text.trim().is_empty() => text,
            _ => stripped.into_owned(),
        };
        text.split_whitespace().collect::<Vec<_>>().join(" ")
    }

    fn format_hits(&self, hits: &[SearchHit]) -> String {
        hits.iter()
            .map(|h| {
                let body = if h.snippet.is_empty() {
                    String::new()
                } else {
                    format!(
                        "{}...",
                        h.snippet.chars().take(self.snippet_chars).collect::<String>()
                    )
                };
                format!("- {}\n  {}\n  Source: {}", h.title, body, h.link)
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// `//duckduckgo.com/l/?uddg=<encoded>&rut=..` -> 原始地址；其他链接原样返回
fn resolve_link(href: &str) -> String {
    let absolute = if href.starts_with("//") {
        format!("https:{href}")
    } else {
        href.to_string()
    };
    Url::parse(&absolute)
        .ok()
        .and_then(|url| {
            url.query_pairs()
                .find(|(k, _)| k == "uddg")
                .map(|(_, v)| v.into_owned())
        })
        .unwrap_or(absolute)
}

#[async_trait]
impl Tool for DuckDuckGoTool {
    fn name(&self) -> &str {
        "DuckDuckGo"
    }

    fn description(&self) -> &str {
        "Search the web for current information. Input: search query. who, what, when, where, why, how."
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let query = clean_query(input);
        tracing::info!(query = %query, "duckduckgo search");
        let url = format!("{}/html/", self.base_url);
        let html = get_text(&self.client, &url, &[("q", query)]).await?;
        let hits = self.parse_results(&html);
        if hits.is_empty() {
            return Ok("No results found on DuckDuckGo.".to_string());
        }
        Ok(self.format_hits(&hits))
    }

    fn describe_failure(&self, err: &ToolError) -> String {
        format!("An error occurred while searching DuckDuckGo: {err}")
    }
}
