//! Scholar - 基于 ReAct 的研究助手
//!
//! 模块划分：
//! - **agent**: 无头 Agent 运行时（供 HTTP 服务与 CLI 调用）
//! - **config**: 应用配置加载（TOML + 环境变量）
//! - **core**: 错误类型
//! - **llm**: LLM 客户端抽象与实现（Ollama / OpenAI 兼容 / Mock）
//! - **observability**: 日志初始化
//! - **react**: 文本协议解析、Prompt、Planner、ReAct 主循环
//! - **tools**: 研究工具（Wikipedia、DuckDuckGo、BasicMath、ArXiv、PubMed）与执行器
//! - **server**: HTTP 接口（需启用 `web` feature）

pub mod agent;
pub mod config;
pub mod core;
pub mod llm;
pub mod observability;
pub mod react;
#[cfg(feature = "web")]
pub mod server;
pub mod tools;

pub use agent::ResearchAgent;
pub use react::{RunOutcome, RunStatus};
