//! 联网工具共用：HTTP 客户端构建、查询清洗、带状态检查的 GET

use std::time::Duration;

use reqwest::Client;

use crate::tools::ToolError;

/// 带超时与 User-Agent 的 reqwest 客户端
pub fn build_client(timeout_secs: u64, user_agent: &str) -> Client {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .user_agent(user_agent.to_string())
        .build()
        .unwrap_or_default()
}

/// 去掉模型常加的引号，`+` 视为空格
pub fn clean_query(input: &str) -> String {
    input
        .trim()
        .trim_matches(|c: char| c == '"' || c == '\'')
        .replace('+', " ")
        .trim()
        .to_string()
}

/// GET 并检查状态码，返回响应体文本
pub async fn get_text(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<String, ToolError> {
    let resp = client.get(url).query(query).send().await?;
    if !resp.status().is_success() {
        return Err(ToolError::Status(resp.status().as_u16()));
    }
    Ok(resp.text().await?)
}

/// GET 并按 JSON 解析
pub async fn get_json(
    client: &Client,
    url: &str,
    query: &[(&str, String)],
) -> Result<serde_json::Value, ToolError> {
    let body = get_text(client, url, query).await?;
    serde_json::from_str(&body).map_err(|e| ToolError::Parse(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_query() {
        assert_eq!(clean_query("  \"quantum+computing\" "), "quantum computing");
        assert_eq!(clean_query("'CRISPR'"), "CRISPR");
        assert_eq!(clean_query(""), "");
    }
}
