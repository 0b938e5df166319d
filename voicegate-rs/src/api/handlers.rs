//! Webhook request handlers
//!
//! These translate the voice provider's form posts into state-machine calls
//! and always answer with a TwiML document - a webhook error must become a
//! spoken apology on the live call, never an HTTP failure the provider
//! turns into dead air.

use axum::{
    extract::{Path, State},
    http::{header, HeaderMap, StatusCode},
    response::IntoResponse,
    Form, Json,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::audio::RequestBase;
use crate::config::Config;
use crate::redemption::{prompts, RedemptionFlow};
use crate::store::CodeStore;
use crate::twiml::{Gather, VoiceResponse};

/// Shared application state.
pub struct AppState {
    pub store: CodeStore,
    pub flow: RedemptionFlow,
    pub config: Config,
}

/// Digits webhook body (field names are the provider's).
#[derive(Debug, Deserialize)]
pub struct InboundDigits {
    #[serde(rename = "Digits", default)]
    pub digits: String,
    #[serde(rename = "From", default)]
    pub from: String,
}

/// Health response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub codes: i64,
}

/// API error response
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

impl ApiError {
    pub fn new(msg: &str) -> Self {
        Self {
            error: msg.to_string(),
        }
    }
}

/// Scheme + host the request was addressed with. Honors the forwarding
/// proxy's `X-Forwarded-Proto`, so URLs we hand to the provider keep the
/// secure scheme when the platform terminates TLS for us.
pub fn request_base(headers: &HeaderMap) -> Option<RequestBase> {
    let host = headers.get(header::HOST)?.to_str().ok()?;
    let scheme = match headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
    {
        Some("https") => "https",
        _ => "http",
    };

    Some(RequestBase::new(scheme, host))
}

fn apology(state: &AppState) -> VoiceResponse {
    VoiceResponse::new()
        .say(&state.config.voice.language, prompts::SYSTEM_ERROR)
        .hangup()
}

/// GET|POST /voice - greet the caller and gather the serial code digits.
pub async fn voice(State(state): State<Arc<AppState>>) -> VoiceResponse {
    let voice = &state.config.voice;

    VoiceResponse::new()
        .gather(
            Gather::new(voice.gather_digits, "/check_code", voice.gather_timeout_secs)
                .say(&voice.language, prompts::GATHER_PROMPT),
        )
        .say(&voice.language, prompts::NO_INPUT)
}

/// POST /check_code - digits collected on the inbound call.
pub async fn check_code(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<InboundDigits>,
) -> VoiceResponse {
    let base = request_base(&headers);

    match state
        .flow
        .handle_digits(&form.digits, &form.from, base.as_ref())
        .await
    {
        Ok(reply) => reply.twiml,
        Err(e) => {
            error!("Verification leg failed: {}", e);
            apology(&state)
        }
    }
}

/// GET|POST /fulfill/:code - the outbound call connected.
pub async fn fulfill(
    State(state): State<Arc<AppState>>,
    Path(code): Path<String>,
    headers: HeaderMap,
) -> VoiceResponse {
    let base = request_base(&headers);

    match state.flow.handle_fulfillment(&code, base.as_ref()).await {
        Ok(reply) => reply.twiml,
        Err(e) => {
            error!("Fulfillment leg failed for code {}: {}", code, e);
            apology(&state)
        }
    }
}

/// GET /health - liveness plus database connectivity.
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.count().await {
        Ok(codes) => (
            StatusCode::OK,
            Json(HealthResponse {
                status: "ok".to_string(),
                codes,
            }),
        )
            .into_response(),
        Err(e) => {
            error!("Health check failed: {}", e);
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiError::new("database unavailable")),
            )
                .into_response()
        }
    }
}
