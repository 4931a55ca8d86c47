//! HTTP Routes
//!
//! API Endpoints:
//! - /api/ping              GET   健康检查
//! - /api/respond           POST  发起一次流式回复（完成后返回统计）
//! - /api/respond/cancel    POST  取消进行中的流
//! - /api/respond/active    GET   列出进行中的流

use axum::{
    routing::{get, post},
    Router,
};
use std::sync::Arc;

use super::handlers;
use super::state::AppState;

/// 创建所有路由
pub fn create_routes() -> Router<Arc<AppState>> {
    Router::new().nest("/api", api_routes())
}

/// API 路由
fn api_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/ping", get(handlers::ping))
        .route("/respond", post(handlers::respond))
        .route("/respond/cancel", post(handlers::cancel_stream))
        .route("/respond/active", get(handlers::list_active_streams))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RespondSettings;
    use crate::infrastructure::adapters::{ChannelSpeechSink, FakeLlmClient, FakeLlmClientConfig};
    use crate::infrastructure::memory::InMemoryStreamRegistry;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
    };
    use serde_json::Value;
    use tokio::sync::mpsc;
    use tower::util::ServiceExt;

    fn test_router(fragments: &[&str]) -> (Router, mpsc::Receiver<String>) {
        let llm = FakeLlmClient::new(FakeLlmClientConfig {
            fragments: fragments.iter().map(|s| s.to_string()).collect(),
            ..Default::default()
        });
        let (sink, rx) = ChannelSpeechSink::channel(16);
        let state = AppState::new(
            Arc::new(llm),
            Arc::new(sink),
            InMemoryStreamRegistry::new().arc(),
            RespondSettings::default(),
        );
        (create_routes().with_state(Arc::new(state)), rx)
    }

    async fn body_json(response: axum::response::Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_ping() {
        let (app, _rx) = test_router(&[]);
        let request = Request::builder()
            .uri("/api/ping")
            .body(Body::empty())
            .unwrap();

        let response = app.oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["status"], "ok");
        assert_eq!(json["active_streams"], 0);
    }

    #[tokio::test]
    async fn test_respond_returns_summary() {
        let (app, mut rx) = test_router(&["你好呀朋友们，", "欢迎收听"]);

        let response = app
            .oneshot(post_json(
                "/api/respond",
                r#"{"message": "打个招呼", "stream_id": "s1"}"#,
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let json = body_json(response).await;
        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["stream_id"], "s1");
        assert_eq!(json["data"]["segments"], 2);
        assert_eq!(json["data"]["cancelled"], false);

        assert_eq!(rx.recv().await.as_deref(), Some("你好呀朋友们，"));
        assert_eq!(rx.recv().await.as_deref(), Some("欢迎收听"));
    }

    #[tokio::test]
    async fn test_respond_empty_message_is_bad_request() {
        let (app, _rx) = test_router(&[]);

        let response = app
            .oneshot(post_json("/api/respond", r#"{"message": "  "}"#))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["errno"], 400);
        assert!(json["data"].is_null());
    }

    #[tokio::test]
    async fn test_cancel_unknown_stream_is_not_found() {
        let (app, _rx) = test_router(&[]);

        let response = app
            .oneshot(post_json("/api/respond/cancel", r#"{"stream_id": "nope"}"#))
            .await
            .unwrap();

        let json = body_json(response).await;
        assert_eq!(json["errno"], 404);
    }

    #[tokio::test]
    async fn test_active_streams_empty() {
        let (app, _rx) = test_router(&[]);
        let request = Request::builder()
            .uri("/api/respond/active")
            .body(Body::empty())
            .unwrap();

        let json = body_json(app.oneshot(request).await.unwrap()).await;
        assert_eq!(json["errno"], 0);
        assert_eq!(json["data"]["streams"].as_array().map(Vec::len), Some(0));
    }
}
