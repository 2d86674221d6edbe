//! Agent 错误类型
//!
//! 只有基础设施层面的失败会从 `run()` 冒出：模型不可用、问题为空。
//! 工具失败与输出解析失败都在循环内部恢复，不会出现在这里。

use thiserror::Error;

use crate::llm::LlmError;

#[derive(Error, Debug)]
pub enum AgentError {
    /// 模型后端不可达 / 超时 / 返回异常，本次运行进入 Failed
    #[error("Model unavailable: {0}")]
    ModelUnavailable(#[from] LlmError),

    #[error("No query provided")]
    EmptyQuestion,

    #[error("Config error: {0}")]
    ConfigError(String),
}

impl From<config::ConfigError> for AgentError {
    fn from(e: config::ConfigError) -> Self {
        AgentError::ConfigError(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_model_unavailable_message_is_descriptive() {
        let err: AgentError = LlmError::Unavailable("connection refused".to_string()).into();
        assert_eq!(
            err.to_string(),
            "Model unavailable: model backend unreachable: connection refused"
        );
    }

    #[test]
    fn test_config_error_conversion() {
        let err: AgentError = config::ConfigError::NotFound("agent.max_iterations".to_string()).into();
        assert!(matches!(err, AgentError::ConfigError(_)));
        assert!(err.to_string().starts_with("Config error:"));
    }
}
