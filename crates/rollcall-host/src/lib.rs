//! HTTP adapter for the signup desk.
//!
//! Models the messaging transport at its interface: the real chat platform
//! sits behind a webhook relay that posts one JSON message per inbound
//! chat line and sends the returned reply (if any) back to the channel.
//! Signature verification and display-name directory lookup belong to that
//! relay, not to this process.

use std::sync::Arc;

use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use rollcall_core::{SignupDesk, SignupError, reply};
use rollcall_store::{DynLedgerStore, DynSettingsProvider, DynStatsStore};

pub type DynDesk = SignupDesk<DynLedgerStore, DynSettingsProvider, DynStatsStore>;

/// Shared handler state. The single mutex serializes every command for
/// the deployment's one event/capacity scope; the engine's read-modify-
/// write sequence needs exclusive ledger access for its duration.
#[derive(Clone)]
pub struct AppState {
    desk: Arc<Mutex<DynDesk>>,
}

impl AppState {
    pub fn new(
        ledger: DynLedgerStore,
        settings: DynSettingsProvider,
        stats: DynStatsStore,
    ) -> Self {
        Self {
            desk: Arc::new(Mutex::new(SignupDesk::new(ledger, settings, stats))),
        }
    }
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/message", post(message))
        .route("/summary", get(summary))
        .route("/promote", post(promote))
}

#[derive(Debug)]
struct ApiError(SignupError);

impl From<SignupError> for ApiError {
    fn from(err: SignupError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        tracing::error!("request failed: {}", self.0);
        let body = serde_json::json!({
            "code": "store_unavailable",
            "message": self.0.to_string(),
        });
        (StatusCode::BAD_GATEWAY, Json(body)).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct InboundMessage {
    pub user_id: String,
    #[serde(default)]
    pub display_name: String,
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct OutboundReply {
    pub reply: Option<String>,
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({ "ok": true }))
}

/// One inbound chat line. A `null` reply means the relay should stay
/// silent. A store failure is reported to the channel as the generic
/// operator-facing error, matching the chat contract, rather than as an
/// HTTP failure.
async fn message(
    State(state): State<AppState>,
    Json(msg): Json<InboundMessage>,
) -> Json<OutboundReply> {
    let desk = state.desk.lock().await;
    match desk.handle(&msg.user_id, &msg.display_name, &msg.text) {
        Ok(reply) => Json(OutboundReply { reply }),
        Err(err) => {
            tracing::error!(user_id = %msg.user_id, "command aborted: {err}");
            Json(OutboundReply {
                reply: Some(reply::STORE_UNAVAILABLE.to_string()),
            })
        }
    }
}

async fn summary(State(state): State<AppState>) -> Result<String, ApiError> {
    let desk = state.desk.lock().await;
    Ok(desk.summary()?)
}

/// Operator endpoint: re-runs the promotion cascade after an out-of-band
/// capacity increase.
async fn promote(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let desk = state.desk.lock().await;
    desk.promote()?;
    Ok(Json(serde_json::json!({ "ok": true })))
}
