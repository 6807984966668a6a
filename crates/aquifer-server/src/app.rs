//! HTTP surface of the evaluation service.
//!
//! Implements the UM-Bridge-style protocol (version 1.0) over JSON:
//!
//! - `GET  /Info`        — protocol version and registered model names
//! - `POST /ModelInfo`   — capability flags for one model
//! - `POST /InputSizes`  — per-parameter element counts
//! - `POST /OutputSizes` — output cardinality (always `[1]`)
//! - `POST /Evaluate`    — one end-to-end forward evaluation
//!
//! Request bodies carry `name`, an optional inline `config` (which
//! overrides the server's base configuration when non-empty) and, for
//! `Evaluate`, an optional `input` holding one vector per declared
//! parameter. Model failures are reported as a JSON error envelope
//! whose `type` matches the core taxonomy (`ConfigurationError`,
//! `IOError`, `SimulationFailure`, `OutputCorruptError`).

use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use tower_http::trace::TraceLayer;

use aquifer_core::{apply_params, Config, ForwardModel, Model, ModelError};

/// Protocol version reported by `/Info`.
const PROTOCOL_VERSION: f64 = 1.0;

/// Shared service state: the single registered model plus the base
/// configuration loaded at startup.
#[derive(Clone)]
pub struct AppState {
    pub model: Arc<ForwardModel>,
    pub base_config: Arc<Config>,
}

impl AppState {
    pub fn new(model: ForwardModel, base_config: Config) -> Self {
        Self {
            model: Arc::new(model),
            base_config: Arc::new(base_config),
        }
    }
}

type Reply = Result<Json<Value>, (StatusCode, Json<Value>)>;

#[derive(Debug, Deserialize)]
struct ModelRequest {
    name: String,
    #[serde(default)]
    config: Value,
    #[serde(default)]
    input: Vec<Vec<f64>>,
}

/// Build the service router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/Info", get(info))
        .route("/ModelInfo", post(model_info))
        .route("/InputSizes", post(input_sizes))
        .route("/OutputSizes", post(output_sizes))
        .route("/Evaluate", post(evaluate))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn info(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "protocolVersion": PROTOCOL_VERSION,
        "models": [state.model.name()],
    }))
}

async fn model_info(State(state): State<AppState>, Json(req): Json<ModelRequest>) -> Reply {
    let model = resolve_model(&state, &req.name)?;
    Ok(Json(json!({
        "support": {
            "Evaluate": model.supports_evaluate(),
            "Gradient": model.supports_gradient(),
        }
    })))
}

async fn input_sizes(State(state): State<AppState>, Json(req): Json<ModelRequest>) -> Reply {
    let model = resolve_model(&state, &req.name)?;
    let config = resolve_config(&state, req.config)?;
    let sizes = model.input_sizes(&config).map_err(model_error)?;
    Ok(Json(json!({ "inputSizes": sizes })))
}

async fn output_sizes(State(state): State<AppState>, Json(req): Json<ModelRequest>) -> Reply {
    let model = resolve_model(&state, &req.name)?;
    let config = resolve_config(&state, req.config)?;
    Ok(Json(json!({ "outputSizes": model.output_sizes(&config) })))
}

async fn evaluate(State(state): State<AppState>, Json(req): Json<ModelRequest>) -> Reply {
    let model = resolve_model(&state, &req.name)?;
    let mut config = resolve_config(&state, req.config)?;
    if !req.input.is_empty() {
        let flat: Vec<f64> = req.input.into_iter().flatten().collect();
        apply_params(&mut config, &flat).map_err(model_error)?;
    }

    tracing::info!(model = %req.name, "evaluation requested");
    let output = model.evaluate(&config).await.map_err(model_error)?;
    Ok(Json(json!({ "output": [output] })))
}

fn resolve_model<'a>(
    state: &'a AppState,
    name: &str,
) -> Result<&'a ForwardModel, (StatusCode, Json<Value>)> {
    if name == state.model.name() {
        Ok(&state.model)
    } else {
        Err(error_reply(
            StatusCode::BAD_REQUEST,
            "UnsupportedModel",
            &format!("no model registered under \"{name}\""),
        ))
    }
}

/// Use the request's inline config when one was supplied, otherwise
/// the server's base configuration.
fn resolve_config(
    state: &AppState,
    inline: Value,
) -> Result<Config, (StatusCode, Json<Value>)> {
    let empty = match &inline {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        _ => false,
    };
    if empty {
        Ok((*state.base_config).clone())
    } else {
        Config::from_json(inline).map_err(model_error)
    }
}

fn model_error(err: ModelError) -> (StatusCode, Json<Value>) {
    let status = match err {
        ModelError::Configuration(_) => StatusCode::BAD_REQUEST,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    };
    tracing::warn!(kind = err.kind(), error = %err, "request failed");
    error_reply(status, err.kind(), &err.to_string())
}

fn error_reply(status: StatusCode, kind: &str, message: &str) -> (StatusCode, Json<Value>) {
    (
        status,
        Json(json!({ "error": { "type": kind, "message": message } })),
    )
}
