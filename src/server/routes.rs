//! HTTP route handlers for the scribe API.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;

use crate::scribe::core::errors::ScribeError;
use crate::scribe::intake::adapter::InboundChatEvent;
use crate::scribe::runtime::command::RoomOverview;

use super::state::AppState;

/// Create the API router with all routes.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/messages", post(submit_message))
        .route("/api/rooms", get(room_stats))
        .route("/api/rooms/{topic}/summarize", post(summarize_room))
        .with_state(state)
}

/// Health check endpoint.
async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "meeting-scribe",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn unavailable(err: &ScribeError) -> (StatusCode, String) {
    (StatusCode::SERVICE_UNAVAILABLE, format!("Scribe unavailable: {err}"))
}

/// Queue an inbound chat event from the gateway.
async fn submit_message(
    State(state): State<Arc<AppState>>,
    Json(event): Json<InboundChatEvent>,
) -> Result<StatusCode, (StatusCode, String)> {
    state
        .scribe
        .submit_message(event)
        .await
        .map_err(|e| unavailable(&e))?;
    Ok(StatusCode::ACCEPTED)
}

/// Buffer stats of every non-empty room.
async fn room_stats(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<RoomOverview>>, (StatusCode, String)> {
    let rooms = state.scribe.room_stats().await.map_err(|e| unavailable(&e))?;
    Ok(Json(rooms))
}

/// Manual summary response.
#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    /// Room the request was for.
    pub room_topic: String,
    /// Whether a summary was started.
    pub started: bool,
}

/// Force a summary of a room, as if the keyword had been posted.
async fn summarize_room(
    State(state): State<Arc<AppState>>,
    Path(topic): Path<String>,
) -> Result<(StatusCode, Json<SummarizeResponse>), (StatusCode, String)> {
    let started = state
        .scribe
        .summarize_now(topic.clone())
        .await
        .map_err(|e| unavailable(&e))?;
    let status = if started {
        StatusCode::ACCEPTED
    } else {
        StatusCode::OK
    };
    Ok((
        status,
        Json(SummarizeResponse {
            room_topic: topic,
            started,
        }),
    ))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::body::{Body, to_bytes};
    use axum::http::Request;
    use tokio::sync::mpsc;
    use tower::ServiceExt;

    use super::*;
    use crate::scribe::core::config::{ReportLanguage, ScribeConfig, TriggerConfig};
    use crate::scribe::core::errors::SummarizationError;
    use crate::scribe::delivery::sink::{Delivery, LogDelivery};
    use crate::scribe::runtime::command::ScribeHandle;
    use crate::scribe::runtime::event_loop::ScribeRuntime;
    use crate::scribe::summarization::generator::SummaryGenerator;
    use crate::scribe::summarization::summarizer::{SummarizeFuture, Summarizer};

    struct EchoSummarizer;

    impl Summarizer for EchoSummarizer {
        fn summarize(
            &self,
            lines: Vec<String>,
        ) -> SummarizeFuture<'_, Result<String, SummarizationError>> {
            Box::pin(async move { Ok(lines.join("\n")) })
        }

        fn name(&self) -> &'static str {
            "echo"
        }
    }

    fn app() -> Router {
        let config = ScribeConfig {
            summary_trigger: TriggerConfig {
                interval_minutes: 0,
                message_count: 0,
                keyword: "@bot 总结".to_string(),
                min_messages_for_summary: 3,
            },
            ..ScribeConfig::default()
        };
        let summarizer: Arc<dyn Summarizer> = Arc::new(EchoSummarizer);
        let generator = Arc::new(SummaryGenerator::new(
            summarizer,
            Duration::from_secs(5),
            ReportLanguage::En,
        ));
        let delivery: Arc<dyn Delivery> = Arc::new(LogDelivery);
        let (runtime, handle) = ScribeRuntime::new(&config, generator, delivery);
        let _ = runtime.spawn();
        create_router(AppState::new(handle))
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: axum::response::Response) -> serde_json::Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_check() {
        let response = app()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_posted_messages_show_in_room_stats() {
        let app = app();
        for sender in ["alice", "bob"] {
            let body = format!(r#"{{"sender":"{sender}","content":"hello","room_topic":"Team"}}"#);
            let response = app
                .clone()
                .oneshot(post_json("/api/messages", &body))
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::ACCEPTED);
        }

        let response = app
            .oneshot(Request::get("/api/rooms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        let rooms = json_body(response).await;
        assert_eq!(rooms[0]["room_topic"], "Team");
        assert_eq!(rooms[0]["stats"]["count"], 2);
        assert_eq!(rooms[0]["stats"]["participants"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_malformed_event_is_rejected() {
        let response = app()
            .oneshot(post_json("/api/messages", r#"{"content":"no sender"}"#))
            .await
            .unwrap();
        assert!(response.status().is_client_error());
    }

    #[tokio::test]
    async fn test_summarize_respects_message_floor() {
        let app = app();
        let body = r#"{"sender":"alice","content":"hello","room_topic":"Team"}"#;
        app.clone()
            .oneshot(post_json("/api/messages", body))
            .await
            .unwrap();

        let response = app
            .oneshot(post_json("/api/rooms/Team/summarize", ""))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let payload = json_body(response).await;
        assert_eq!(payload["room_topic"], "Team");
        assert_eq!(payload["started"], false);
    }

    #[tokio::test]
    async fn test_stopped_runtime_is_unavailable() {
        let (sender, receiver) = mpsc::channel(1);
        drop(receiver);
        let app = create_router(AppState::new(ScribeHandle::new(sender)));

        let response = app
            .oneshot(Request::get("/api/rooms").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
