//! 工具执行器
//!
//! 持有 ToolRegistry 与全局超时，invoke(tool_name, input) 在超时内调用工具；
//! 任何失败（工具报错、超时、未知工具）都转成描述文本返回，不会向上抛错。
//! 每次调用输出结构化审计日志（JSON）。

use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::react::Observation;
use crate::tools::{ToolError, ToolRegistry};

/// 工具执行器：对每次调用施加超时，结果统一为 Observation
pub struct ToolExecutor {
    registry: ToolRegistry,
    timeout: Duration,
    max_observation_chars: usize,
}

impl ToolExecutor {
    pub fn new(registry: ToolRegistry, timeout_secs: u64, max_observation_chars: usize) -> Self {
        Self {
            registry,
            timeout: Duration::from_secs(timeout_secs),
            max_observation_chars,
        }
    }

    /// 执行指定工具，永不失败；输出 JSON 审计日志
    pub async fn invoke(&self, tool_name: &str, input: &str) -> Observation {
        let Some(tool) = self.registry.get(tool_name) else {
            tracing::warn!(tool = %tool_name, "unknown tool requested");
            return Observation::new(format!(
                "{} is not a valid tool, try one of [{}].",
                tool_name,
                self.registry.tool_names().join(", ")
            ));
        };

        let start = Instant::now();
        let result = timeout(self.timeout, tool.execute(input)).await;

        let (ok, outcome): (bool, &str) = match &result {
            Ok(Ok(_)) => (true, "ok"),
            Ok(Err(_)) => (false, "error"),
            Err(_) => (false, "timeout"),
        };
        let audit = serde_json::json!({
            "event": "tool_audit",
            "tool": tool_name,
            "ok": ok,
            "outcome": outcome,
            "duration_ms": start.elapsed().as_millis() as u64,
            "input_preview": input_preview(input),
        });
        tracing::info!(audit = %audit.to_string(), "tool");

        let text = match result {
            Ok(Ok(content)) => content,
            Ok(Err(e)) => tool.describe_failure(&e),
            Err(_) => tool.describe_failure(&ToolError::Timeout(self.timeout.as_secs())),
        };
        Observation::clipped(text, self.max_observation_chars)
    }

    pub fn registry(&self) -> &ToolRegistry {
        &self.registry
    }
}

fn input_preview(input: &str) -> String {
    if input.chars().count() > 200 {
        format!("{}...", input.chars().take(200).collect::<String>())
    } else {
        input.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::Tool;
    use async_trait::async_trait;

    struct Failing;

    #[async_trait]
    impl Tool for Failing {
        fn name(&self) -> &str {
            "Failing"
        }
        fn description(&self) -> &str {
            "always fails"
        }
        async fn execute(&self, _input: &str) -> Result<String, ToolError> {
            Err(ToolError::Parse("boom".to_string()))
        }
        fn describe_failure(&self, err: &ToolError) -> String {
            format!("Error in Failing: {err}")
        }
    }

    struct Slow;

    #[async_trait]
    impl Tool for Slow {
        fn name(&self) -> &str {
            "Slow"
        }
        fn description(&self) -> &str {
            "never returns in time"
        }
        async fn execute(&self, _input: &str) -> Result<String, ToolError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok("late".to_string())
        }
    }

    struct Loud;

    #[async_trait]
    impl Tool for Loud {
        fn name(&self) -> &str {
            "Loud"
        }
        fn description(&self) -> &str {
            "long output"
        }
        async fn execute(&self, _input: &str) -> Result<String, ToolError> {
            Ok("x".repeat(50))
        }
    }

    fn executor() -> ToolExecutor {
        let mut reg = ToolRegistry::new();
        reg.register(Failing);
        reg.register(Slow);
        reg.register(Loud);
        ToolExecutor {
            registry: reg,
            timeout: Duration::from_millis(50),
            max_observation_chars: 10,
        }
    }

    #[tokio::test]
    async fn test_tool_error_becomes_text() {
        let obs = executor().invoke("Failing", "q").await;
        assert_eq!(obs.text, "Error in Failing: unexpected response: boom");
    }

    #[tokio::test]
    async fn test_timeout_becomes_text() {
        let obs = executor().invoke("Slow", "q").await;
        assert!(obs.text.starts_with("Error running Slow: timed out"));
    }

    #[tokio::test]
    async fn test_unknown_tool_lists_valid_names() {
        let obs = executor().invoke("Nope", "q").await;
        assert_eq!(obs.text, "Nope is not a valid tool, try one of [Failing, Slow, Loud].");
    }

    #[tokio::test]
    async fn test_long_output_truncated() {
        let obs = executor().invoke("Loud", "").await;
        assert!(obs.truncated);
        assert!(obs.text.starts_with("xxxxxxxxxx..."));
    }
}
