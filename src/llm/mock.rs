//! Mock / Scripted LLM 客户端（用于测试与本地跑通，无需模型服务）
//!
//! - MockLlmClient：取 prompt 中最后一个 `Question:` 行，直接回 `Final Answer: Echo from Mock: ...`
//! - ScriptedLlmClient：按顺序回放预置的补全或错误，并记录每次收到的 prompt

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::llm::traits::truncate_at_stop;
use crate::llm::{LlmClient, LlmError};

/// Mock 客户端：回显问题作为最终答案
#[derive(Debug, Default)]
pub struct MockLlmClient;

#[async_trait]
impl LlmClient for MockLlmClient {
    async fn complete(&self, prompt: &str, _stop: &[&str]) -> Result<String, LlmError> {
        let question = prompt
            .lines()
            .rev()
            .find_map(|l| l.strip_prefix("Question:"))
            .map(str::trim)
            .unwrap_or("(no input)");
        Ok(format!(
            " I can answer directly.\nFinal Answer: Echo from Mock: {}",
            question
        ))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// 脚本化客户端：每次 complete 弹出一条预置结果；脚本耗尽时返回 Unavailable
#[derive(Debug, Default)]
pub struct ScriptedLlmClient {
    script: Mutex<VecDeque<Result<String, LlmError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    pub fn new<I, S>(responses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_results(responses.into_iter().map(|s| Ok(s.into())))
    }

    pub fn from_results(results: impl IntoIterator<Item = Result<String, LlmError>>) -> Self {
        Self {
            script: Mutex::new(results.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// 已收到的 prompt（按调用顺序）
    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.prompts.lock().map(|p| p.len()).unwrap_or(0)
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, LlmError> {
        if let Ok(mut p) = self.prompts.lock() {
            p.push(prompt.to_string());
        }
        let next = self
            .script
            .lock()
            .map_err(|e| LlmError::Unavailable(e.to_string()))?
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::Unavailable("script exhausted".to_string())));
        next.map(|text| truncate_at_stop(&text, stop))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
