//! Control surface for the daemon.
//!
//! Three endpoints: `GET /health` for liveness probes, `GET /status` for
//! the authentication flags the UI displays, and `POST /send_code` which
//! feeds an interactively supplied 2FA code into the shared slot the
//! worker's handshake polls. The code may arrive as a urlencoded form or
//! a JSON body.

use std::future::Future;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Request, State};
use axum::http::{header::CONTENT_TYPE, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, RequestExt, Router};
use log::{info, warn};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::status::AuthStatus;

/// Shared state handed to every handler.
#[derive(Clone)]
pub struct AppState {
    pub status: Arc<AuthStatus>,
}

/// Build the control-surface router.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/status", get(status))
        .route("/send_code", post(send_code))
        .with_state(state)
}

/// Bind and serve until the shutdown future resolves.
pub async fn serve(
    state: AppState,
    port: u16,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> Result<()> {
    let listener = TcpListener::bind(("0.0.0.0", port))
        .await
        .context(format!("Failed to bind control surface port {port}"))?;
    info!("Control surface listening on port {}", port);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("Control surface server failed")
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "service": "backup-shipper"}))
}

async fn status(State(state): State<AppState>) -> Json<crate::status::StatusSnapshot> {
    Json(state.status.snapshot())
}

#[derive(Deserialize, Default)]
struct CodePayload {
    code: Option<String>,
}

async fn send_code(State(state): State<AppState>, request: Request) -> Response {
    let content_type = request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|value| value.to_str().ok())
        .unwrap_or("")
        .to_string();

    let payload = if content_type.starts_with("application/x-www-form-urlencoded") {
        request
            .extract::<Form<CodePayload>, _>()
            .await
            .map(|Form(payload)| payload)
            .map_err(|e| e.to_string())
    } else {
        request
            .extract::<Json<CodePayload>, _>()
            .await
            .map(|Json(payload)| payload)
            .map_err(|e| e.to_string())
    };

    let code = match payload {
        Ok(payload) => payload.code.filter(|code| !code.trim().is_empty()),
        Err(e) => {
            warn!("Error receiving verification code: {}", e);
            None
        }
    };

    match code {
        Some(code) => {
            info!("Verification code received");
            state.status.submit_code(code);
            Json(json!({"success": true, "response": "Code received"})).into_response()
        }
        None => (
            StatusCode::BAD_REQUEST,
            Json(json!({"success": false, "error": "No code provided"})),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    async fn spawn_server(state: AppState) -> SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router(state)).await.unwrap();
        });
        addr
    }

    fn test_state() -> AppState {
        AppState {
            status: Arc::new(AuthStatus::new()),
        }
    }

    #[tokio::test]
    async fn test_health_endpoint() {
        let addr = spawn_server(test_state()).await;

        let body: serde_json::Value = reqwest::get(format!("http://{addr}/health"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], "backup-shipper");
    }

    #[tokio::test]
    async fn test_status_reflects_auth_state() {
        let state = test_state();
        state.status.set_awaiting_code();
        let addr = spawn_server(state).await;

        let body: serde_json::Value = reqwest::get(format!("http://{addr}/status"))
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(body["requires_2fa"], true);
        assert_eq!(body["is_authenticated"], false);
        assert_eq!(body["status"], "running");
    }

    #[tokio::test]
    async fn test_send_code_json_body() {
        let state = test_state();
        let status = Arc::clone(&state.status);
        let addr = spawn_server(state).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/send_code"))
            .json(&json!({"code": "123456"}))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(status.take_code(), Some("123456".to_string()));
    }

    #[tokio::test]
    async fn test_send_code_form_body() {
        let state = test_state();
        let status = Arc::clone(&state.status);
        let addr = spawn_server(state).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/send_code"))
            .form(&[("code", "654321")])
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());
        assert_eq!(status.take_code(), Some("654321".to_string()));
    }

    #[tokio::test]
    async fn test_send_code_missing_code_is_rejected() {
        let state = test_state();
        let status = Arc::clone(&state.status);
        let addr = spawn_server(state).await;

        let response = reqwest::Client::new()
            .post(format!("http://{addr}/send_code"))
            .json(&json!({}))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), reqwest::StatusCode::BAD_REQUEST);
        assert_eq!(status.take_code(), None);
    }
}
