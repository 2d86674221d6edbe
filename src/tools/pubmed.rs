//! PubMed 工具：E-utilities esearch 取 ID，再 esummary 取标题

use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;

use crate::config::{PubMedSection, ToolsSection};
use crate::tools::http::{build_client, clean_query, get_json};
use crate::tools::{Tool, ToolError};

pub struct PubMedTool {
    client: Client,
    base_url: String,
    max_results: usize,
    abstract_chars: usize,
}

impl PubMedTool {
    pub fn new(tools: &ToolsSection, section: &PubMedSection) -> Self {
        Self {
            client: build_client(tools.http_timeout_secs, &tools.user_agent),
            base_url: section.base_url.trim_end_matches('/').to_string(),
            max_results: section.max_results,
            abstract_chars: section.abstract_chars,
        }
    }

    async fn search_ids(&self, query: &str) -> Result<Vec<String>, ToolError> {
        let url = format!("{}/entrez/eutils/esearch.fcgi", self.base_url);
        let data = get_json(
            &self.client,
            &url,
            &[
                ("db", "pubmed".to_string()),
                ("term", query.to_string()),
                ("retmax", self.max_results.to_string()),
                ("format", "json".to_string()),
            ],
        )
        .await?;
        Ok(parse_id_list(&data))
    }

    async fn summaries(&self, ids: &[String]) -> Result<Value, ToolError> {
        let url = format!("{}/entrez/eutils/esummary.fcgi", self.base_url);
        get_json(
            &self.client,
            &url,
            &[
                ("db", "pubmed".to_string()),
                ("id", ids.join(",")),
                ("format", "json".to_string()),
            ],
        )
        .await
    }

    /// 按 ids 顺序格式化 esummary 结果；缺失的 id 视为响应异常
    pub fn format_summaries(&self, ids: &[String], data: &Value) -> Result<String, ToolError> {
        let result = data
            .get("result")
            .ok_or_else(|| ToolError::Parse("missing 'result' in esummary".to_string()))?;
        let mut out = Vec::with_capacity(ids.len());
        for id in ids {
            let paper = result
                .get(id)
                .ok_or_else(|| ToolError::Parse(format!("missing summary for {id}")))?;
            let title = paper
                .get("title")
                .and_then(Value::as_str)
                .unwrap_or("No title available");
            let abstract_text = paper
                .get("abstract")
                .and_then(Value::as_str)
                .unwrap_or("No abstract available");
            out.push(format!(
                "Title: {}\nPubMed ID: {}\nAbstract: {}...\n",
                title,
                id,
                abstract_text
                    .chars()
                    .take(self.abstract_chars)
                    .collect::<String>()
            ));
        }
        Ok(out.join("\n"))
    }
}

fn parse_id_list(data: &Value) -> Vec<String> {
    data.pointer("/esearchresult/idlist")
        .and_then(Value::as_array)
        .map(|ids| {
            ids.iter()
                .filter_map(|v| v.as_str().map(String::from))
                .collect()
        })
        .unwrap_or_default()
}

#[async_trait]
impl Tool for PubMedTool {
    fn name(&self) -> &str {
        "PubMed"
    }

    fn description(&self) -> &str {
        "Searches PubMed for medical research. research paper on medical topic or keywords."
    }

    async fn execute(&self, input: &str) -> Result<String, ToolError> {
        let query = clean_query(input);
        if query.is_empty() {
            return Ok("No query provided.".to_string());
        }
        tracing::info!(query = %query, "pubmed search");
        let mut ids = self.search_ids(&query).await?;
        ids.truncate(self.max_results);
        if ids.is_empty() {
            return Ok("No results found on PubMed.".to_string());
        }
        let data = self.summaries(&ids).await?;
        self.format_summaries(&ids, &data)
    }

    fn describe_failure(&self, err: &ToolError) -> String {
        format!("Error searching PubMed: {err}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn tool(base_url: &str) -> PubMedTool {
        let tools = ToolsSection {
            http_timeout_secs: 2,
            ..ToolsSection::default()
        };
        let section = PubMedSection {
            base_url: base_url.to_string(),
            ..PubMedSection::default()
        };
        PubMedTool::new(&tools, &section)
    }

    #[test]
    fn test_parse_id_list() {
        let data = json!({"esearchresult": {"count": "2", "idlist": ["111", "222"]}});
        assert_eq!(parse_id_list(&data), vec!["111", "222"]);
        assert!(parse_id_list(&json!({})).is_empty());
    }

    #[test]
    fn test_format_summaries_defaults_missing_fields() {
        let data = json!({"result": {"uids": ["111"], "111": {"title": "Aspirin and you"}}});
        let out = tool("http://unused")
            .format_summaries(&["111".to_string()], &data)
            .unwrap();
        assert_eq!(
            out,
            "Title: Aspirin and you\nPubMed ID: 111\nAbstract: No abstract available...\n"
        );
    }

    #[test]
    fn test_format_summaries_missing_id_is_error() {
        let data = json!({"result": {}});
        let t = tool("http://unused");
        let err = t.format_summaries(&["9".to_string()], &data).unwrap_err();
        assert_eq!(
            t.describe_failure(&err),
            "Error searching PubMed: unexpected response: missing summary for 9"
        );
    }

    #[tokio::test]
    async fn test_fetch_failure_is_reported_as_text() {
        let t = tool("http://127.0.0.1:9");
        let err = t.execute("aspirin").await.unwrap_err();
        assert!(t.describe_failure(&err).starts_with("Error searching PubMed:"));
    }
}
