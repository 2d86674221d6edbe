//! Headless Agent 运行时
//!
//! 供 HTTP 服务与 CLI 调用：进程启动时由 AppConfig 构建一次 ResearchAgent（LLM + 工具 + 循环参数），
//! 之后每个请求调用 `run(question)`，运行之间不共享可变状态。

use std::sync::Arc;

use crate::config::{AgentSection, AppConfig};
use crate::core::AgentError;
use crate::llm::{create_llm_from_config, LlmClient};
use crate::react::{react_loop, Planner, RunOutcome};
use crate::tools::{default_registry, ToolExecutor, ToolRegistry};

/// 预构建的 Agent：Planner、ToolExecutor 与循环参数，可多请求共享
pub struct ResearchAgent {
    planner: Planner,
    executor: ToolExecutor,
    settings: AgentSection,
}

impl ResearchAgent {
    /// 由显式组件构建（测试可注入 Scripted LLM 与假工具）
    pub fn new(
        llm: Arc<dyn LlmClient>,
        registry: ToolRegistry,
        settings: AgentSection,
        tool_timeout_secs: u64,
    ) -> Self {
        let planner = Planner::new(llm, &registry.describe(), settings.max_iterations);
        let executor = ToolExecutor::new(registry, tool_timeout_secs, settings.max_observation_chars);
        Self {
            planner,
            executor,
            settings,
        }
    }

    /// 从配置构建：按 [llm] 选择后端，注册五个研究工具
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self::with_llm(cfg, create_llm_from_config(cfg))
    }

    /// 使用配置中的工具与循环参数，但替换 LLM
    pub fn with_llm(cfg: &AppConfig, llm: Arc<dyn LlmClient>) -> Self {
        Self::new(
            llm,
            default_registry(&cfg.tools),
            cfg.agent.clone(),
            cfg.tools.tool_timeout_secs,
        )
    }

    /// 处理单个问题：跑 ReAct 循环，返回答案文本与运行状态
    pub async fn run(&self, question: &str) -> Result<RunOutcome, AgentError> {
        react_loop(&self.planner, &self.executor, &self.settings, question).await
    }

    /// 工具目录 (name, description)，顺序与 prompt 一致
    pub fn catalogue(&self) -> Vec<(String, String)> {
        self.executor.registry().describe()
    }

    pub fn settings(&self) -> &AgentSection {
        &self.settings
    }
}
