//! LLM 层：客户端抽象与实现（Ollama / OpenAI 兼容 / Mock / Scripted）

pub mod mock;
pub mod ollama;
pub mod openai;
pub mod traits;

use std::sync::Arc;

use crate::config::AppConfig;

pub use mock::{MockLlmClient, ScriptedLlmClient};
pub use ollama::{OllamaClient, OLLAMA_BASE_URL, OLLAMA_DEFAULT_MODEL};
pub use openai::{OpenAiClient, TokenUsage};
pub use traits::{truncate_at_stop, LlmClient, LlmError};

/// 根据配置选择 LLM 后端（ollama / openai / mock）；未知 provider 回退到 Mock
pub fn create_llm_from_config(cfg: &AppConfig) -> Arc<dyn LlmClient> {
    let llm = &cfg.llm;
    match llm.provider.to_lowercase().as_str() {
        "ollama" => {
            tracing::info!(model = %llm.model, "Using Ollama LLM");
            Arc::new(OllamaClient::new(
                llm.base_url.as_deref(),
                &llm.model,
                llm.timeout_secs,
            ))
        }
        "openai" => {
            tracing::info!(model = %llm.model, "Using OpenAI-compatible LLM");
            Arc::new(OpenAiClient::new(
                llm.base_url.as_deref(),
                &llm.model,
                llm.api_key.as_deref(),
                llm.timeout_secs,
            ))
        }
        "mock" => Arc::new(MockLlmClient),
        other => {
            tracing::warn!(provider = %other, "Unknown LLM provider, using Mock LLM");
            Arc::new(MockLlmClient)
        }
    }
}
