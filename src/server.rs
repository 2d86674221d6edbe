//! HTTP 接口（axum）
//!
//! - `POST /search`  `{"query": "..."}` -> 200 `{"result", "status", "iterations"}` / 400 / 500 / 504 `{"error"}`
//! - `GET /tools`    工具目录
//! - `GET /health`
//!
//! 只暴露错误描述文本，不暴露内部细节。

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::agent::ResearchAgent;
use crate::core::AgentError;
use crate::react::RunStatus;

/// 服务状态：Agent 在进程启动时构建一次
pub struct ServerState {
    pub agent: Arc<ResearchAgent>,
    pub request_timeout: Duration,
}

#[derive(Debug, Deserialize)]
pub struct SearchRequest {
    pub query: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub result: String,
    pub status: RunStatus,
    pub iterations: usize,
}

#[derive(Debug, Serialize)]
pub struct ToolInfo {
    pub name: String,
    pub description: String,
}

pub fn create_router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/search", post(search))
        .route("/tools", get(list_tools))
        .route("/health", get(|| async { "ok" }))
        .with_state(state)
}

fn error_response(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<Value>) {
    (status, Json(json!({ "error": message.into() })))
}

async fn search(
    State(state): State<Arc<ServerState>>,
    body: Result<Json<SearchRequest>, JsonRejection>,
) -> Response {
    let query = match body {
        Ok(Json(req)) => req.query.unwrap_or_default(),
        Err(rejection) => {
            tracing::warn!(error = %rejection, "bad /search body");
            String::new()
        }
    };
    if query.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, AgentError::EmptyQuestion.to_string())
            .into_response();
    }

    match tokio::time::timeout(state.request_timeout, state.agent.run(&query)).await {
        Ok(Ok(outcome)) => {
            let body = SearchResponse {
                result: outcome.text,
                status: outcome.status,
                iterations: outcome.iterations_used,
            };
            (StatusCode::OK, Json(body)).into_response()
        }
        Ok(Err(AgentError::EmptyQuestion)) => {
            error_response(StatusCode::BAD_REQUEST, AgentError::EmptyQuestion.to_string())
                .into_response()
        }
        Ok(Err(e)) => {
            tracing::error!(error = %e, "run failed");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response()
        }
        Err(_) => {
            tracing::error!(timeout_secs = state.request_timeout.as_secs(), "run timed out");
            error_response(StatusCode::GATEWAY_TIMEOUT, "Request timed out").into_response()
        }
    }
}

async fn list_tools(State(state): State<Arc<ServerState>>) -> Json<Vec<ToolInfo>> {
    Json(
        state
            .agent
            .catalogue()
            .into_iter()
            .map(|(name, description)| ToolInfo { name, description })
            .collect(),
    )
}
