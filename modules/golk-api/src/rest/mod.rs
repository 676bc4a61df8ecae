pub mod weather;

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use golk_common::sri_lanka_time;
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::chat::prompt::ChatSettings;
use crate::chat::ChatInput;
use crate::AppState;

// --- Request bodies ---

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
    pub session_id: String,
    #[serde(default)]
    pub settings: ChatSettings,
    pub time: Option<String>,
    pub date: Option<String>,
    #[serde(default)]
    pub question_history: Vec<String>,
    #[serde(default)]
    pub answer_history: Vec<String>,
}

// --- Helpers ---

pub fn error_json(status: StatusCode, detail: impl Into<String>) -> Response {
    (status, Json(json!({ "detail": detail.into() }))).into_response()
}

fn session_not_found() -> Response {
    error_json(StatusCode::NOT_FOUND, "Session not found")
}

// --- Handlers ---

pub async fn root() -> impl IntoResponse {
    Json(json!({
        "message": "Welcome to GoLK, your Sri Lanka travel assistant",
        "endpoints": ["/api/start_session", "/api/chat", "/weather/{month}"],
    }))
}

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "sessions": state.sessions.len().await,
        "examples": state.pipeline.examples().len(),
        "weather": state.weather.is_some(),
    }))
}

pub async fn start_session(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let session_id = state.sessions.start().await;
    info!(session_id = %session_id, "Session started");
    Json(json!({ "session_id": session_id }))
}

pub async fn chat(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Response {
    let Some(session) = state.sessions.get(&req.session_id).await else {
        return error_json(StatusCode::BAD_REQUEST, "Invalid session ID");
    };
    if req.question.trim().is_empty() {
        return error_json(StatusCode::BAD_REQUEST, "Question must not be empty");
    }

    let local = sri_lanka_time(Utc::now());
    let date = req
        .date
        .clone()
        .unwrap_or_else(|| local.format("%Y-%m-%d").to_string());
    let time = req
        .time
        .clone()
        .unwrap_or_else(|| local.format("%H:%M").to_string());

    // Client-held history wins over the server copy when supplied.
    let (questions, answers) = if req.question_history.is_empty() {
        (&session.questions, &session.answers)
    } else {
        (&req.question_history, &req.answer_history)
    };

    let result = match state
        .pipeline
        .answer(ChatInput {
            question: &req.question,
            settings: &req.settings,
            date: &date,
            time: &time,
            questions,
            answers,
        })
        .await
    {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, session_id = %req.session_id, "Chat pipeline failed");
            return error_json(
                StatusCode::BAD_GATEWAY,
                format!("Failed to generate an answer: {e}"),
            );
        }
    };

    let Some(question_count) = state
        .sessions
        .append(&req.session_id, &req.question, &result.text_explanation)
        .await
    else {
        return error_json(StatusCode::BAD_REQUEST, "Invalid session ID");
    };

    Json(json!({
        "session_id": req.session_id,
        "result": result,
        "timestamp": Utc::now().to_rfc3339(),
        "question_count": question_count,
    }))
    .into_response()
}

pub async fn history(State(state): State<Arc<AppState>>, Path(id): Path<String>) -> Response {
    match state.sessions.get(&id).await {
        Some(session) => Json(json!({
            "session_id": id,
            "questions": session.questions,
            "answers": session.answers,
            "created_at": session.created_at.to_rfc3339(),
        }))
        .into_response(),
        None => session_not_found(),
    }
}

pub async fn delete_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Response {
    if state.sessions.remove(&id).await {
        info!(session_id = %id, "Session deleted");
        Json(json!({ "message": "Session deleted", "session_id": id })).into_response()
    } else {
        session_not_found()
    }
}

pub async fn check_session(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    Json(json!({ "valid": state.sessions.contains(&id).await }))
}
