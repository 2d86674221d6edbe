//! ReAct Prompt 构建
//!
//! 固定前言 + 工具目录 + 格式说明在启动时渲染一次；每轮只追加 `Question:` 与 Transcript scratchpad。

use crate::react::Transcript;

/// 预算耗尽后强制生成最终答案时追加的提示
pub const FORCE_FINAL_ANSWER_SUFFIX: &str =
    "\n\nI now need to return a final answer based on the previous steps:";

const PREAMBLE: &str = "You are a helpful research assistant that finds information using the available tools. Follow these guidelines strictly:";

const INSTRUCTIONS: &str = "Instructions:
. Details from Internal Knowledge: Related information you already know
. Add line breaks between sections
. Use the exact tool name from the list above
. Keep queries simple and clear
. Use tools according to the type of information needed
. In case of research paper only use ArXiv and PubMed
. Summarize information from multiple sources when relevant
. Stop as soon as you have a clear answer with reference links";

/// Prompt 构建器：持有渲染好的固定前缀
#[derive(Debug, Clone)]
pub struct PromptBuilder {
    prefix: String,
}

impl PromptBuilder {
    /// `catalogue` 为有序 (name, description)；`max_iterations` 写进格式说明
    pub fn new(catalogue: &[(String, String)], max_iterations: usize) -> Self {
        let tool_lines = catalogue
            .iter()
            .map(|(name, desc)| format!("{name}: {desc}"))
            .collect::<Vec<_>>()
            .join("\n");
        let names: Vec<&str> = catalogue.iter().map(|(n, _)| n.as_str()).collect();

        let prefix = format!(
            "{PREAMBLE}\n\n\
             Available tools:\n\n\
             {tool_lines}\n\n\
             {INSTRUCTIONS}\n\n\
             Use this exact format:\n\n\
             Question: the input question you must answer\n\
             Thought: analyze the question and decide which tool to use\n\
             Action: use EXACTLY one of these tools: {}\n\
             Action Input: just the plain search query or math expression\n\
             Observation: the result of the action\n\
             ... (this Thought/Action/Action Input/Observation can repeat up to {max_iterations} times if needed)\n\
             Thought: I now know the final answer\n\
             Final Answer: provide a complete answer based on the information gathered with link (Details from Web Search:\n\
             - First result title and brief description\n\
             - Second result title and brief description\n\n\
             References:\n\
             [1] link1\n\
             [2] link2\n\
             [etc])\n\n\
             Begin!\n\n",
            human_list(&names),
        );
        Self { prefix }
    }

    /// 常规一轮的 prompt
    pub fn build(&self, question: &str, transcript: &Transcript) -> String {
        format!(
            "{}Question: {}\nThought:{}",
            self.prefix,
            question.trim(),
            transcript.render()
        )
    }

    /// 预算耗尽后要求直接给出 Final Answer 的 prompt
    pub fn build_final(&self, question: &str, transcript: &Transcript) -> String {
        format!("{}{}", self.build(question, transcript), FORCE_FINAL_ANSWER_SUFFIX)
    }
}

/// "A, B, or C"
fn human_list(names: &[&str]) -> String {
    match names {
        [] => String::new(),
        [one] => one.to_string(),
        [a, b] => format!("{a} or {b}"),
        [rest @ .., last] => format!("{}, or {}", rest.join(", "), last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::react::{Action, Observation, Turn};

    fn catalogue() -> Vec<(String, String)> {
        vec![
            ("Wikipedia".to_string(), "encyclopedia".to_string()),
            ("BasicMath".to_string(), "calculator".to_string()),
            ("ArXiv".to_string(), "papers".to_string()),
        ]
    }

    #[test]
    fn test_prompt_layout() {
        let builder = PromptBuilder::new(&catalogue(), 3);
        let prompt = builder.build("  What is 2+2? ", &Transcript::new());
        assert!(prompt.contains("Available tools:\n\nWikipedia: encyclopedia\nBasicMath: calculator\nArXiv: papers\n"));
        assert!(prompt.contains("Action: use EXACTLY one of these tools: Wikipedia, BasicMath, or ArXiv\n"));
        assert!(prompt.contains("can repeat up to 3 times"));
        assert!(prompt.ends_with("Begin!\n\nQuestion: What is 2+2?\nThought:"));
    }

    #[test]
    fn test_prompt_appends_transcript_and_final_suffix() {
        let builder = PromptBuilder::new(&catalogue(), 3);
        let mut t = Transcript::new();
        t.push(Turn::Thought {
            text: "compute it".to_string(),
        });
        t.push(Turn::Action(Action {
            tool_name: "BasicMath".to_string(),
            tool_input: "2+2".to_string(),
        }));
        t.push(Turn::Observation(Observation::new("4")));
        let prompt = builder.build("What is 2+2?", &t);
        assert!(prompt.ends_with(
            "Question: What is 2+2?\nThought: compute it\nAction: BasicMath\nAction Input: 2+2\nObservation: 4\nThought:"
        ));
        let final_prompt = builder.build_final("What is 2+2?", &t);
        assert!(final_prompt.ends_with(
            "Observation: 4\nThought:\n\nI now need to return a final answer based on the previous steps:"
        ));
    }

    #[test]
    fn test_human_list() {
        assert_eq!(human_list(&["A"]), "A");
        assert_eq!(human_list(&["A", "B"]), "A or B");
        assert_eq!(human_list(&["A", "B", "C", "D"]), "A, B, C, or D");
    }
}
