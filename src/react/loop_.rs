//! ReAct 主循环
//!
//! Plan -> Parse -> Act (Tool) -> Observe -> 下一轮 Plan，直到 Final Answer 或迭代预算耗尽。
//! 解析失败与工具失败都作为 Observation 写回 Transcript 并计入预算；只有模型不可用才返回错误。
//! 预算耗尽时按 early_stopping 处理：generate 再调用一次模型要求直接作答，force 直接返回停止提示。

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::config::{AgentSection, EarlyStopping};
use crate::core::AgentError;
use crate::react::{before_observation, AgentStep, Observation, Planner, RunState, RunStatus, Transcript, Turn};
use crate::tools::ToolExecutor;

/// 预算耗尽且没有可用文本时返回的固定提示
pub const ITERATION_LIMIT_MESSAGE: &str = "Agent stopped due to iteration limit.";

/// 单次运行结果；Transcript 随结果一起交给调用方，之后即丢弃
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub text: String,
    pub status: RunStatus,
    pub iterations_used: usize,
    pub transcript: Transcript,
}

impl RunOutcome {
    fn from_state(state: RunState, text: String) -> Self {
        Self {
            text,
            status: state.status,
            iterations_used: state.iterations_used,
            transcript: state.transcript,
        }
    }
}

/// 执行一次 ReAct 运行；每次调用拥有自己的 RunState，不与其他运行共享可变状态
pub async fn react_loop(
    planner: &Planner,
    executor: &ToolExecutor,
    settings: &AgentSection,
    question: &str,
) -> Result<RunOutcome, AgentError> {
    let question = question.trim();
    if question.is_empty() {
        return Err(AgentError::EmptyQuestion);
    }
    let span = tracing::info_span!("react_run", run_id = %Uuid::new_v4(), llm = %planner.llm_name());
    react_loop_impl(planner, executor, settings, question)
        .instrument(span)
        .await
}

async fn react_loop_impl(
    planner: &Planner,
    executor: &ToolExecutor,
    settings: &AgentSection,
    question: &str,
) -> Result<RunOutcome, AgentError> {
    let mut state = RunState::new();
    tracing::info!(question = %question, max_iterations = settings.max_iterations, "run started");

    while state.iterations_used < settings.max_iterations {
        let step = state.iterations_used + 1;
        let completion = match planner.plan(question, &state.transcript).await {
            Ok(c) => c,
            Err(e) => {
                state.status = RunStatus::Failed;
                tracing::error!(step, error = %e, "model call failed");
                return Err(e.into());
            }
        };

        match planner.parse(&completion) {
            Ok(AgentStep::Finish { thought, answer }) => {
                push_thought(&mut state.transcript, thought);
                let text = answer.text.clone();
                state.transcript.push(Turn::FinalAnswer(answer));
                state.status = RunStatus::Succeeded;
                tracing::info!(step, "final answer");
                return Ok(RunOutcome::from_state(state, text));
            }
            Ok(AgentStep::Action { thought, action }) => {
                tracing::info!(step, tool = %action.tool_name, input = %action.tool_input, "action");
                let observation = executor.invoke(&action.tool_name, &action.tool_input).await;
                push_thought(&mut state.transcript, thought);
                state.transcript.push(Turn::Action(action));
                state.transcript.push(Turn::Observation(observation));
            }
            Err(e) => {
                tracing::warn!(step, error = %e, "unparseable model output");
                let correction = e.corrective_observation(planner.tool_names());
                push_thought(&mut state.transcript, e.thought);
                state.transcript.push(Turn::Observation(Observation::new(correction)));
            }
        }
        state.iterations_used += 1;
    }

    tracing::info!(iterations = state.iterations_used, "iteration budget exhausted");
    match settings.early_stopping {
        EarlyStopping::Force => {
            state.status = RunStatus::Stopped;
            Ok(RunOutcome::from_state(state, ITERATION_LIMIT_MESSAGE.to_string()))
        }
        EarlyStopping::Generate => {
            let completion = match planner.plan_final(question, &state.transcript).await {
                Ok(c) => c,
                Err(e) => {
                    state.status = RunStatus::Failed;
                    tracing::error!(error = %e, "forced final-answer call failed");
                    return Err(e.into());
                }
            };
            if let Ok(AgentStep::Finish { thought, answer }) = planner.parse(&completion) {
                push_thought(&mut state.transcript, thought);
                let text = answer.text.clone();
                state.transcript.push(Turn::FinalAnswer(answer));
                state.status = RunStatus::Succeeded;
                return Ok(RunOutcome::from_state(state, text));
            }
            state.status = RunStatus::Stopped;
            let raw = before_observation(&completion);
            let text = if raw.is_empty() {
                ITERATION_LIMIT_MESSAGE.to_string()
            } else {
                raw
            };
            Ok(RunOutcome::from_state(state, text))
        }
    }
}

fn push_thought(transcript: &mut Transcript, text: String) {
    let text = text.trim();
    if !text.is_empty() {
        transcript.push(Turn::Thought {
            text: text.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::config::{ArxivSection, ToolsSection};
    use crate::llm::{LlmError, ScriptedLlmClient};
    use crate::react::Action;
    use crate::tools::{ArxivTool, MathTool, ToolRegistry};

    fn executor() -> ToolExecutor {
        let tools_cfg = ToolsSection {
            http_timeout_secs: 2,
            ..ToolsSection::default()
        };
        let mut reg = ToolRegistry::new();
        reg.register(MathTool);
        reg.register(ArxivTool::new(
            &tools_cfg,
            &ArxivSection {
                base_url: "http://127.0.0.1:9".to_string(),
                ..ArxivSection::default()
            },
        ));
        ToolExecutor::new(reg, 10, 4000)
    }

    fn settings(max_iterations: usize, early_stopping: EarlyStopping) -> AgentSection {
        AgentSection {
            max_iterations,
            early_stopping,
            ..AgentSection::default()
        }
    }

    async fn run_scripted(
        llm: Arc<ScriptedLlmClient>,
        settings: &AgentSection,
        question: &str,
    ) -> Result<RunOutcome, AgentError> {
        let executor = executor();
        let planner = Planner::new(llm, &executor.registry().describe(), settings.max_iterations);
        react_loop(&planner, &executor, settings, question).await
    }

    #[tokio::test]
    async fn test_math_question_succeeds_after_one_action() {
        let llm = Arc::new(ScriptedLlmClient::new([
            " I should calculate this.\nAction: BasicMath\nAction Input: 2+2",
            " I now know the final answer\nFinal Answer: 4",
        ]));
        let out = run_scripted(llm.clone(), &settings(3, EarlyStopping::Generate), "What is 2+2?")
            .await
            .unwrap();
        assert_eq!(out.text, "4");
        assert_eq!(out.status, RunStatus::Succeeded);
        assert_eq!(out.iterations_used, 1);
        assert!(out.transcript.is_finished());
        assert_eq!(llm.call_count(), 2);
        assert!(llm.prompts()[1].ends_with(
            "Question: What is 2+2?\nThought: I should calculate this.\nAction: BasicMath\nAction Input: 2+2\nObservation: 4\nThought:"
        ));
    }

    #[tokio::test]
    async fn test_persistent_noise_stops_with_forced_text() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "blorp",
            "zzz",
            "???",
            "still nothing useful",
        ]));
        let out = run_scripted(llm.clone(), &settings(3, EarlyStopping::Generate), "xyzzy")
            .await
            .unwrap();
        assert_eq!(out.status, RunStatus::Stopped);
        assert_eq!(out.text, "still nothing useful");
        assert_eq!(out.iterations_used, 3);
        assert_eq!(llm.call_count(), 4);
        assert!(llm.prompts()[3].ends_with(crate::react::FORCE_FINAL_ANSWER_SUFFIX));
        assert!(out
            .transcript
            .observations()
            .all(|o| o.text.starts_with("Invalid Format:")));
    }

    #[tokio::test]
    async fn test_model_calls_bounded_by_budget_plus_one() {
        let llm = Arc::new(ScriptedLlmClient::new(
            std::iter::repeat("Action: BasicMath\nAction Input: 1+1").take(10),
        ));
        let out = run_scripted(llm.clone(), &settings(3, EarlyStopping::Generate), "loop forever")
            .await
            .unwrap();
        assert_eq!(llm.call_count(), 4);
        assert_eq!(out.status, RunStatus::Stopped);
        assert_eq!(out.text, "Action: BasicMath\nAction Input: 1+1");
        assert_eq!(out.transcript.observations().count(), 3);
    }

    #[tokio::test]
    async fn test_forced_final_answer_succeeds() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "Action: BasicMath\nAction Input: 6*7",
            "Final Answer: 42",
        ]));
        let out = run_scripted(llm.clone(), &settings(1, EarlyStopping::Generate), "6 times 7?")
            .await
            .unwrap();
        assert_eq!(out.status, RunStatus::Succeeded);
        assert_eq!(out.text, "42");
        assert_eq!(out.iterations_used, 1);
    }

    #[tokio::test]
    async fn test_empty_forced_text_falls_back_to_message() {
        let llm = Arc::new(ScriptedLlmClient::new(["noise", "   "]));
        let out = run_scripted(llm, &settings(1, EarlyStopping::Generate), "q")
            .await
            .unwrap();
        assert_eq!(out.status, RunStatus::Stopped);
        assert_eq!(out.text, ITERATION_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_force_mode_skips_extra_call() {
        let llm = Arc::new(ScriptedLlmClient::new(["noise", "noise", "noise", "Final Answer: never"]));
        let out = run_scripted(llm.clone(), &settings(3, EarlyStopping::Force), "q")
            .await
            .unwrap();
        assert_eq!(llm.call_count(), 3);
        assert_eq!(out.status, RunStatus::Stopped);
        assert_eq!(out.text, ITERATION_LIMIT_MESSAGE);
    }

    #[tokio::test]
    async fn test_tool_failure_feeds_back_and_run_continues() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "Action: ArXiv\nAction Input: quantum error correction",
            "Final Answer: arXiv is unreachable right now.",
        ]));
        let out = run_scripted(llm.clone(), &settings(3, EarlyStopping::Generate), "Find papers")
            .await
            .unwrap();
        let obs: Vec<_> = out.transcript.observations().collect();
        assert_eq!(obs.len(), 1);
        assert!(obs[0].text.starts_with("Error searching ArXiv:"));
        assert_eq!(llm.call_count(), 2);
        assert_eq!(out.status, RunStatus::Succeeded);
    }

    #[tokio::test]
    async fn test_unknown_tool_gets_corrective_observation() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "Action: Google\nAction Input: rust",
            "Final Answer: done",
        ]));
        let out = run_scripted(llm.clone(), &settings(3, EarlyStopping::Generate), "q")
            .await
            .unwrap();
        assert_eq!(out.iterations_used, 1);
        assert!(!out.transcript.turns().iter().any(|t| matches!(t, Turn::Action(_))));
        assert!(llm.prompts()[1].contains("Invalid Format: 'Google' is not a valid tool name."));
    }

    #[tokio::test]
    async fn test_hallucinated_observation_is_not_recorded() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "Action: BasicMath\nAction Input: 1+1\nObservation: 3\nFinal Answer: 3",
            "Final Answer: 2",
        ]));
        let out = run_scripted(llm, &settings(3, EarlyStopping::Generate), "1+1?")
            .await
            .unwrap();
        assert_eq!(out.text, "2");
        let turns = out.transcript.turns();
        assert_eq!(
            turns[0],
            Turn::Action(Action {
                tool_name: "BasicMath".to_string(),
                tool_input: "1+1".to_string(),
            })
        );
        assert_eq!(turns[1], Turn::Observation(Observation::new("2")));
    }

    #[tokio::test]
    async fn test_fabricated_observation_in_unparseable_output_not_fed_back() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "I will guess.\n  Observation: FABRICATED paris is in germany",
            "Final Answer: done",
        ]));
        let out = run_scripted(llm.clone(), &settings(3, EarlyStopping::Generate), "Where is Paris?")
            .await
            .unwrap();
        assert_eq!(out.status, RunStatus::Succeeded);
        assert_eq!(
            out.transcript.turns()[0],
            Turn::Thought {
                text: "I will guess.".to_string()
            }
        );
        assert!(!llm.prompts()[1].contains("FABRICATED"));
        assert!(llm.prompts()[1].contains("Thought: I will guess.\nObservation: Invalid Format:"));
    }

    #[tokio::test]
    async fn test_forced_text_drops_fabricated_observation() {
        let llm = Arc::new(ScriptedLlmClient::new([
            "noise",
            "Paris is in France.\n  Observation: FABRICATED",
        ]));
        let out = run_scripted(llm, &settings(1, EarlyStopping::Generate), "Where is Paris?")
            .await
            .unwrap();
        assert_eq!(out.status, RunStatus::Stopped);
        assert_eq!(out.text, "Paris is in France.");
    }

    #[tokio::test]
    async fn test_model_unavailable_is_hard_error() {
        let llm = Arc::new(ScriptedLlmClient::from_results([Err(LlmError::Unavailable(
            "connection refused".to_string(),
        ))]));
        let err = run_scripted(llm, &settings(3, EarlyStopping::Generate), "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ModelUnavailable(LlmError::Unavailable(_))));
    }

    #[tokio::test]
    async fn test_model_failure_on_forced_call_is_hard_error() {
        let llm = Arc::new(ScriptedLlmClient::from_results([
            Ok("noise".to_string()),
            Err(LlmError::Timeout(120)),
        ]));
        let err = run_scripted(llm, &settings(1, EarlyStopping::Generate), "q")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::ModelUnavailable(LlmError::Timeout(120))));
    }

    #[tokio::test]
    async fn test_empty_question_rejected_without_model_call() {
        let llm = Arc::new(ScriptedLlmClient::new(["Final Answer: x"]));
        let err = run_scripted(llm.clone(), &settings(3, EarlyStopping::Generate), "   ")
            .await
            .unwrap_err();
        assert!(matches!(err, AgentError::EmptyQuestion));
        assert_eq!(llm.call_count(), 0);
    }
}
