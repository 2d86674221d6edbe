//! 命令行提问：一次运行，打印答案与状态
//!
//! 用法: cargo run --bin scholar-ask -- "What is the capital of France?"
//! 输出设 SCHOLAR_ASK_JSON=1 时为完整 RunOutcome（含 transcript）的 JSON。

use anyhow::Context;
use scholar::config::load_config;
use scholar::{observability, ResearchAgent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    let question = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    if question.trim().is_empty() {
        eprintln!("usage: scholar-ask <question>");
        std::process::exit(2);
    }

    let cfg = load_config(None).unwrap_or_default();
    let agent = ResearchAgent::from_config(&cfg);
    let outcome = agent.run(&question).await.context("Run failed")?;

    if std::env::var("SCHOLAR_ASK_JSON").is_ok_and(|v| v == "1") {
        println!("{}", serde_json::to_string_pretty(&outcome)?);
    } else {
        println!("{}", outcome.text);
        eprintln!(
            "[{:?} after {} iteration(s)]",
            outcome.status, outcome.iterations_used
        );
    }
    Ok(())
}
