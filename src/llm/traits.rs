//! LLM 客户端抽象
//!
//! 所有后端（Ollama / OpenAI 兼容 / Scripted）实现 LlmClient：complete(prompt, stop) 返回纯文本补全。
//! 文本协议在 prompt 里，客户端不关心工具与格式。

use async_trait::async_trait;
use thiserror::Error;

/// 模型调用失败（基础设施层面），ReAct 循环遇到即终止本次运行
#[derive(Error, Debug, Clone, PartialEq)]
pub enum LlmError {
    #[error("model backend unreachable: {0}")]
    Unavailable(String),

    #[error("model request timed out after {0}s")]
    Timeout(u64),

    #[error("model returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("invalid model response: {0}")]
    InvalidResponse(String),
}

/// LLM 客户端 trait：prompt 进，文本出
///
/// `stop` 为停止序列：生成遇到任一序列即截断（不含序列本身）。
/// 实现需可被多个并发运行共享（无状态或内部同步）。
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(&self, prompt: &str, stop: &[&str]) -> Result<String, LlmError>;

    /// 后端名称，用于日志
    fn name(&self) -> &str {
        "llm"
    }
}

/// 在最早出现的停止序列处截断
///
/// 部分后端不支持服务端 stop，或会把停止序列本身带回来；各实现统一再截一次。
pub fn truncate_at_stop(text: &str, stop: &[&str]) -> String {
    let cut = stop
        .iter()
        .filter(|s| !s.is_empty())
        .filter_map(|s| text.find(s))
        .min()
        .unwrap_or(text.len());
    text[..cut].to_string()
}
