//! Planner：拼 prompt、调用模型（带 Observation 停止序列）、解析输出
//!
//! 持有 LLM 与渲染好的 PromptBuilder；本身无运行状态，可被多个并发运行共享。

use std::sync::Arc;

use crate::llm::{LlmClient, LlmError};
use crate::react::{parse_output, AgentStep, ParseError, PromptBuilder, Transcript};

/// 生成在 `Observation:` 标签处停止，防止模型自己编造观察结果
pub const STOP_SEQUENCES: [&str; 2] = ["\nObservation:", "\n\tObservation:"];

pub struct Planner {
    llm: Arc<dyn LlmClient>,
    prompts: PromptBuilder,
    tool_names: Vec<String>,
}

impl Planner {
    /// `catalogue` 为 ToolRegistry::describe() 的结果
    pub fn new(llm: Arc<dyn LlmClient>, catalogue: &[(String, String)], max_iterations: usize) -> Self {
        Self {
            llm,
            prompts: PromptBuilder::new(catalogue, max_iterations),
            tool_names: catalogue.iter().map(|(n, _)| n.clone()).collect(),
        }
    }

    pub fn tool_names(&self) -> &[String] {
        &self.tool_names
    }

    pub fn llm_name(&self) -> &str {
        self.llm.name()
    }

    /// 常规一轮：返回原始补全
    pub async fn plan(&self, question: &str, transcript: &Transcript) -> Result<String, LlmError> {
        let prompt = self.prompts.build(question, transcript);
        self.llm.complete(&prompt, &STOP_SEQUENCES).await
    }

    /// 预算耗尽后的最后一次调用
    pub async fn plan_final(&self, question: &str, transcript: &Transcript) -> Result<String, LlmError> {
        let prompt = self.prompts.build_final(question, transcript);
        self.llm.complete(&prompt, &STOP_SEQUENCES).await
    }

    pub fn parse(&self, completion: &str) -> Result<AgentStep, ParseError> {
        parse_output(completion, &self.tool_names)
    }
}
