//! 单次运行的 Transcript 与 RunState
//!
//! Transcript 只追加、归一次 `run()` 独占，运行结束即丢弃；渲染结果就是 prompt 里的 scratchpad。

use serde::Serialize;

/// 解析出的工具调用：tool_name 一定是注册过的名字
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Action {
    pub tool_name: String,
    pub tool_input: String,
}

/// 工具（或解析失败）产生的观察结果
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Observation {
    pub text: String,
    /// 原文超过 max_observation_chars 被截断
    pub truncated: bool,
}

impl Observation {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            truncated: false,
        }
    }

    /// 按字符数截断（不切断 UTF-8）
    pub fn clipped(text: String, max_chars: usize) -> Self {
        if text.chars().count() <= max_chars {
            return Self {
                text,
                truncated: false,
            };
        }
        let mut clipped: String = text.chars().take(max_chars).collect();
        clipped.push_str("...[truncated]");
        Self {
            text: clipped,
            truncated: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FinalAnswer {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Turn {
    Thought { text: String },
    Action(Action),
    Observation(Observation),
    FinalAnswer(FinalAnswer),
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct Transcript {
    turns: Vec<Turn>,
}

impl Transcript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, turn: Turn) {
        self.turns.push(turn);
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.turns.last(), Some(Turn::FinalAnswer(_)))
    }

    pub fn observations(&self) -> impl Iterator<Item = &Observation> {
        self.turns.iter().filter_map(|t| match t {
            Turn::Observation(o) => Some(o),
            _ => None,
        })
    }

    /// 渲染为 ReAct scratchpad，接在 prompt 末尾的 `Thought:` 之后
    ///
    /// 每一步形如 ` {thought}\nAction: ..\nAction Input: ..\nObservation: ..\nThought:`；
    /// FinalAnswer 不参与渲染（出现即运行结束）。
    pub fn render(&self) -> String {
        let mut out = String::new();
        for turn in &self.turns {
            match turn {
                Turn::Thought { text } => {
                    if !text.is_empty() {
                        out.push(' ');
                        out.push_str(text);
                    }
                }
                Turn::Action(a) => {
                    out.push_str(&format!(
                        "\nAction: {}\nAction Input: {}",
                        a.tool_name, a.tool_input
                    ));
                }
                Turn::Observation(o) => {
                    out.push_str(&format!("\nObservation: {}\nThought:", o.text));
                }
                Turn::FinalAnswer(_) => {}
            }
        }
        out
    }
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pending,
    /// 模型给出了 Final Answer
    Succeeded,
    /// 预算耗尽，返回尽力而为的文本
    Stopped,
    /// 模型不可用
    Failed,
}

/// 单次 `run()` 的可变状态，只由循环修改
#[derive(Debug)]
pub struct RunState {
    pub transcript: Transcript,
    pub iterations_used: usize,
    pub status: RunStatus,
}

impl RunState {
    pub fn new() -> Self {
        Self {
            transcript: Transcript::new(),
            iterations_used: 0,
            status: RunStatus::Pending,
        }
    }
}

impl Default for RunState {
    fn default() -> Self {
        Self::new()
    }
}
