//! Scholar HTTP 服务
//!
//! 启动: cargo run --bin scholar
//! 请求: curl -X POST http://127.0.0.1:5000/search -H 'content-type: application/json' -d '{"query":"..."}'

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use scholar::config::load_config;
use scholar::server::{create_router, ServerState};
use scholar::{observability, ResearchAgent};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    observability::init();

    // 可选：第一个参数为额外的配置文件路径
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let cfg = match load_config(config_path) {
        Ok(cfg) => cfg,
        Err(e) => {
            tracing::warn!(error = %e, "failed to load config, using defaults");
            Default::default()
        }
    };

    let agent = ResearchAgent::from_config(&cfg);
    tracing::info!(
        provider = %cfg.llm.provider,
        model = %cfg.llm.model,
        max_iterations = cfg.agent.max_iterations,
        tools = ?agent.catalogue().iter().map(|(n, _)| n.as_str()).collect::<Vec<_>>(),
        "agent ready"
    );

    let state = Arc::new(ServerState {
        agent: Arc::new(agent),
        request_timeout: Duration::from_secs(cfg.app.request_timeout_secs),
    });
    let app = create_router(state);

    let listener = tokio::net::TcpListener::bind(&cfg.app.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.app.bind_addr))?;
    tracing::info!("Scholar listening on http://{}", cfg.app.bind_addr);
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
