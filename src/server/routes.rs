//! HTTP routes for send requests

use axum::{extract::State, http::StatusCode, response::IntoResponse, routing::{get, post}, Json, Router};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::debug;

use crate::ledger::{BalanceSource, LedgerClient};
use crate::service::{SendOrder, SendReport, SendService};
use crate::submit::{FailureKind, Progress};

pub struct AppState<L> { pub service: SendService<L>, pub app_name: Arc<str> }

impl<L> Clone for AppState<L> {
    fn clone(&self) -> Self {
        Self { service: self.service.clone(), app_name: Arc::clone(&self.app_name) }
    }
}

impl<L> AppState<L> {
    pub fn new(service: SendService<L>, app_name: &str) -> Self {
        Self { service, app_name: Arc::from(app_name) }
    }
}

pub fn create_router<L>(service: SendService<L>, app_name: &str) -> Router
where
    L: LedgerClient + BalanceSource + 'static,
{
    Router::new()
        .route("/health", get(health::<L>))
        .route("/send", post(send::<L>))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(AppState::new(service, app_name))
}

/// Bad input is the caller's fault, a failed account load is upstream's;
/// everything else is a completed request, successful or not.
pub fn status_for(report: &SendReport) -> StatusCode {
    match report.outcome.failure_kind() {
        Some(FailureKind::Validation) => StatusCode::BAD_REQUEST,
        Some(FailureKind::AccountLoad) => StatusCode::BAD_GATEWAY,
        _ => StatusCode::OK,
    }
}

async fn health<L>(State(s): State<AppState<L>>) -> impl IntoResponse
where
    L: LedgerClient + BalanceSource + 'static,
{
    Json(serde_json::json!({
        "status": "ok",
        "service": &*s.app_name,
        "max_attempts": s.service.config().max_attempts,
    }))
}

async fn send<L>(State(s): State<AppState<L>>, Json(order): Json<SendOrder>) -> (StatusCode, Json<SendReport>)
where
    L: LedgerClient + BalanceSource + 'static,
{
    let report = s
        .service
        .send(&order, |p: Progress| debug!(attempt = p.attempt, max = p.max_attempts, "Attempt"))
        .await;
    (status_for(&report), Json(report))
}
