//! 工具注册表
//!
//! 所有工具实现 Tool trait（name / description / execute / describe_failure），由 ToolRegistry 按名注册与查找；
//! ToolExecutor 在调用时加超时，并把任何失败转成给模型看的描述文本。

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

/// 工具内部失败。永远不会越过 ToolExecutor 边界，只会被渲染成 Observation 文本。
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("{0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {0}")]
    Status(u16),

    #[error("unexpected response: {0}")]
    Parse(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// 工具 trait：名称、描述（拼进 prompt 的工具目录）、异步执行（单行文本输入）
#[async_trait]
pub trait Tool: Send + Sync {
    /// 工具名称（即 `Action:` 行里的名字，大小写敏感）
    fn name(&self) -> &str;

    /// 工具描述（供 LLM 理解功能）
    fn description(&self) -> &str;

    /// 执行工具；"无结果" 之类的正常情况返回 Ok 文本
    async fn execute(&self, input: &str) -> Result<String, ToolError>;

    /// 把失败渲染成 Observation 文本，各工具可覆盖前缀
    fn describe_failure(&self, err: &ToolError) -> String {
        format!("Error running {}: {}", self.name(), err)
    }
}

/// 工具注册表：保持注册顺序（决定 prompt 中工具目录的顺序）
#[derive(Default, Clone)]
pub struct ToolRegistry {
    tools: Vec<Arc<dyn Tool>>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// 注册工具；同名工具替换旧的并保持原位置
    pub fn register(&mut self, tool: impl Tool + 'static) {
        self.register_arc(Arc::new(tool));
    }

    pub fn register_arc(&mut self, tool: Arc<dyn Tool>) {
        match self.tools.iter().position(|t| t.name() == tool.name()) {
            Some(i) => self.tools[i] = tool,
            None => self.tools.push(tool),
        }
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.iter().find(|t| t.name() == name).cloned()
    }

    pub fn tool_names(&self) -> Vec<String> {
        self.tools.iter().map(|t| t.name().to_string()).collect()
    }

    /// 返回有序的 (name, description) 列表，用于生成 prompt 中的工具目录
    pub fn describe(&self) -> Vec<(String, String)> {
        self.tools
            .iter()
            .map(|t| (t.name().to_string(), t.description().to_string()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.tools.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Named(&'static str, &'static str);

    #[async_trait]
    impl Tool for Named {
        fn name(&self) -> &str {
            self.0
        }
        fn description(&self) -> &str {
            self.1
        }
        async fn execute(&self, input: &str) -> Result<String, ToolError> {
            Ok(input.to_string())
        }
    }

    #[test]
    fn test_describe_keeps_registration_order() {
        let mut reg = ToolRegistry::new();
        reg.register(Named("Wikipedia", "wiki"));
        reg.register(Named("BasicMath", "math"));
        reg.register(Named("ArXiv", "papers"));
        assert_eq!(reg.tool_names(), vec!["Wikipedia", "BasicMath", "ArXiv"]);
        assert_eq!(reg.describe()[1], ("BasicMath".to_string(), "math".to_string()));
    }

    #[test]
    fn test_reregister_replaces_in_place() {
        let mut reg = ToolRegistry::new();
        reg.register(Named("A", "old"));
        reg.register(Named("B", "b"));
        reg.register(Named("A", "new"));
        assert_eq!(reg.len(), 2);
        assert_eq!(reg.describe()[0].1, "new");
    }

    #[test]
    fn test_lookup_is_case_sensitive() {
        let mut reg = ToolRegistry::new();
        reg.register(Named("PubMed", "med"));
        assert!(reg.get("PubMed").is_some());
        assert!(reg.get("pubmed").is_none());
    }

    #[test]
    fn test_default_failure_text() {
        let tool = Named("X", "x");
        assert_eq!(
            tool.describe_failure(&ToolError::Status(503)),
            "Error running X: HTTP 503"
        );
    }
}
