//! 输出解析：把一次模型补全解析为 Action / Final Answer，或 ParseError
//!
//! 基于行首标签匹配（`Final Answer:` / `Action:` / `Action Input:`），取第一个完整的条目；
//! 第一条 `Observation:` 行及之后的内容视为模型编造，直接丢弃。纯函数，不做任何 I/O。

use thiserror::Error;

use crate::react::{Action, FinalAnswer};

pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";
pub const ACTION_MARKER: &str = "Action:";
pub const ACTION_INPUT_MARKER: &str = "Action Input:";
pub const OBSERVATION_MARKER: &str = "Observation:";
pub const THOUGHT_MARKER: &str = "Thought:";

/// 一次补全解析出的下一步
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentStep {
    Action { thought: String, action: Action },
    Finish { thought: String, answer: FinalAnswer },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    #[error("Could not find an 'Action:' or 'Final Answer:' line")]
    MissingAction,

    #[error("'Action: {0}' is not followed by an 'Action Input:' line")]
    MissingActionInput(String),

    #[error("'{0}' is not a valid tool name")]
    UnknownTool(String),

    #[error("'Final Answer:' is empty")]
    EmptyFinalAnswer,
}

/// 解析失败：保留原始补全；`thought` 是第一条 `Observation:` 之前的部分，只有它会写入 Transcript
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}")]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub raw_text: String,
    pub thought: String,
}

impl ParseError {
    /// 纠错 Observation：说明格式错误并重申协议
    pub fn corrective_observation(&self, tool_names: &[String]) -> String {
        format!(
            "Invalid Format: {}. Respond using the exact format:\n\
             Thought: your reasoning\n\
             Action: one of [{}]\n\
             Action Input: a single line of input\n\
             or, if you know the answer:\n\
             Final Answer: your answer",
            self.kind,
            tool_names.join(", ")
        )
    }
}

fn strip_marker<'a>(line: &'a str, marker: &str) -> Option<&'a str> {
    line.trim_start().strip_prefix(marker)
}

fn strip_quotes(s: &str) -> &str {
    s.trim().trim_matches(|c: char| c == '"' || c == '\'' || c == '`').trim()
}

fn thought_before(lines: &[&str]) -> String {
    let text = lines.join("\n");
    let text = text.trim();
    text.strip_prefix(THOUGHT_MARKER).unwrap_or(text).trim().to_string()
}

/// 第一条 `Observation:` 行（允许缩进）之前的行
fn lines_before_observation(text: &str) -> Vec<&str> {
    text.lines()
        .take_while(|l| strip_marker(l, OBSERVATION_MARKER).is_none())
        .collect()
}

/// 丢弃模型编造的观察结果：返回第一条 `Observation:` 行之前的文本（已 trim）
pub fn before_observation(text: &str) -> String {
    lines_before_observation(text).join("\n").trim().to_string()
}

/// 解析一次补全；`tool_names` 为注册的工具名（大小写敏感）
pub fn parse_output(text: &str, tool_names: &[String]) -> Result<AgentStep, ParseError> {
    let lines = lines_before_observation(text);
    let err = |kind| ParseError {
        kind,
        raw_text: text.to_string(),
        thought: thought_before(&lines),
    };

    let mut first_problem: Option<ParseErrorKind> = None;
    let mut i = 0;
    while i < lines.len() {
        if let Some(rest) = strip_marker(lines[i], FINAL_ANSWER_MARKER) {
            let mut answer = rest.to_string();
            for l in &lines[i + 1..] {
                answer.push('\n');
                answer.push_str(l);
            }
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(AgentStep::Finish {
                    thought: thought_before(&lines[..i]),
                    answer: FinalAnswer {
                        text: answer.to_string(),
                    },
                });
            }
            first_problem.get_or_insert(ParseErrorKind::EmptyFinalAnswer);
        } else if let Some(rest) = strip_marker(lines[i], ACTION_MARKER) {
            let tool = strip_quotes(rest);
            let input_line = lines[i + 1..]
                .iter()
                .take_while(|l| strip_marker(l, ACTION_MARKER).is_none())
                .find_map(|l| strip_marker(l, ACTION_INPUT_MARKER));
            match input_line {
                Some(input) => {
                    if !tool_names.iter().any(|n| n == tool) {
                        return Err(err(ParseErrorKind::UnknownTool(tool.to_string())));
                    }
                    return Ok(AgentStep::Action {
                        thought: thought_before(&lines[..i]),
                        action: Action {
                            tool_name: tool.to_string(),
                            tool_input: strip_quotes(input).to_string(),
                        },
                    });
                }
                None => {
                    first_problem.get_or_insert(ParseErrorKind::MissingActionInput(tool.to_string()));
                }
            }
        }
        i += 1;
    }

    Err(err(first_problem.unwrap_or(ParseErrorKind::MissingAction)))
}
