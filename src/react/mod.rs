//! 认知层：文本协议解析、Prompt 构建、Transcript、Planner 与 ReAct 主循环

pub mod loop_;
pub mod parser;
pub mod planner;
pub mod prompt;
pub mod transcript;

pub use loop_::{react_loop, RunOutcome, ITERATION_LIMIT_MESSAGE};
pub use parser::{before_observation, parse_output, AgentStep, ParseError, ParseErrorKind};
pub use planner::{Planner, STOP_SEQUENCES};
pub use prompt::{PromptBuilder, FORCE_FINAL_ANSWER_SUFFIX};
pub use transcript::{Action, FinalAnswer, Observation, RunState, RunStatus, Transcript, Turn};
