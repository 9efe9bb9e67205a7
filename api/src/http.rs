// http.rs
use anyhow::Result;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use gitscope_core::ai::{
    AiText, ChallengeRequest, ChatRequest, ExplainRequest, LearningPathRequest,
};

use crate::metrics::MetricsCollector;
use crate::prompts::{self, Prompt};
use crate::upstream::UpstreamClient;

#[derive(Clone)]
pub struct ApiState {
    upstream: Arc<UpstreamClient>,
    metrics: Arc<MetricsCollector>,
}

impl ApiState {
    pub fn new(upstream: UpstreamClient) -> Self {
        Self {
            upstream: Arc::new(upstream),
            metrics: Arc::new(MetricsCollector::new()),
        }
    }
}

struct AppError(anyhow::Error);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let msg = format!("{}", self.0);
        let status = if msg.contains("timeout") || msg.contains("timed out") {
            StatusCode::GATEWAY_TIMEOUT
        } else if msg.contains("overloaded") || msg.contains("429") {
            StatusCode::SERVICE_UNAVAILABLE
        } else {
            StatusCode::BAD_GATEWAY
        };

        warn!(error = %self.0, status = %status, "AI request failed");
        (status, msg).into_response()
    }
}

impl<E: Into<anyhow::Error>> From<E> for AppError {
    fn from(err: E) -> Self {
        Self(err.into())
    }
}

async fn run_prompt(state: &ApiState, operation: &str, prompt: Prompt) -> Result<Json<AiText>, AppError> {
    let start = Instant::now();
    state.metrics.record_request(operation).await;

    let result = state.upstream.complete(&prompt.system, &prompt.messages).await;
    state.metrics.record_response_time(start.elapsed()).await;

    match result {
        Ok(text) => {
            info!(
                operation,
                elapsed_ms = start.elapsed().as_millis(),
                chars = text.len(),
                "completed"
            );
            Ok(Json(AiText { text }))
        }
        Err(err) => {
            state.metrics.record_error().await;
            Err(err.into())
        }
    }
}

async fn explain(
    State(state): State<ApiState>,
    Json(request): Json<ExplainRequest>,
) -> Result<Json<AiText>, AppError> {
    run_prompt(&state, "explain", prompts::explain(&request)).await
}

async fn learning_path(
    State(state): State<ApiState>,
    Json(request): Json<LearningPathRequest>,
) -> Result<Json<AiText>, AppError> {
    run_prompt(&state, "learning-path", prompts::learning_path(&request)).await
}

async fn chat(
    State(state): State<ApiState>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<AiText>, AppError> {
    run_prompt(&state, "chat", prompts::chat(&request)).await
}

async fn challenges(
    State(state): State<ApiState>,
    Json(request): Json<ChallengeRequest>,
) -> Result<Json<AiText>, AppError> {
    run_prompt(&state, "challenges", prompts::challenges(&request)).await
}

async fn health() -> &'static str {
    "OK"
}

async fn metrics(State(state): State<ApiState>) -> impl IntoResponse {
    Json(state.metrics.get_metrics().await)
}

pub async fn serve(addr: SocketAddr, state: ApiState) -> Result<()> {
    let app = Router::new()
        .route("/health", get(health))
        .route("/metrics", get(metrics))
        .route("/v1/explain", post(explain))
        .route("/v1/learning-path", post(learning_path))
        .route("/v1/chat", post(chat))
        .route("/v1/challenges", post(challenges))
        .with_state(state)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        );

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
