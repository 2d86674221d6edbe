//! 工具箱：Wikipedia / DuckDuckGo / BasicMath / ArXiv / PubMed 与执行器

pub mod arxiv;
pub mod duckduckgo;
pub mod executor;
pub mod http;
pub mod math;
pub mod pubmed;
pub mod registry;
pub mod wikipedia;

use crate::config::ToolsSection;

pub use arxiv::ArxivTool;
pub use duckduckgo::DuckDuckGoTool;
pub use executor::ToolExecutor;
pub use math::MathTool;
pub use pubmed::PubMedTool;
pub use registry::{Tool, ToolError, ToolRegistry};
pub use wikipedia::WikipediaTool;

/// 按固定顺序注册五个研究工具（顺序即 prompt 中工具目录的顺序）
pub fn default_registry(cfg: &ToolsSection) -> ToolRegistry {
    let mut tools = ToolRegistry::new();
    tools.register(WikipediaTool::new(cfg, &cfg.wikipedia));
    tools.register(DuckDuckGoTool::new(cfg, &cfg.duckduckgo));
    tools.register(MathTool);
    tools.register(ArxivTool::new(cfg, &cfg.arxiv));
    tools.register(PubMedTool::new(cfg, &cfg.pubmed));
    tools
}
