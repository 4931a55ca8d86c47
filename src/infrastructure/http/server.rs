//! HTTP Server
//!
//! Axum 服务器：路由、中间件与优雅关闭

use std::sync::Arc;
use std::time::Duration;

use axum::middleware;
use axum::Router;
use http::header::{AUTHORIZATION, CONTENT_TYPE};
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use super::middleware::error_logging_middleware;
use super::routes::create_routes;
use super::state::AppState;
use crate::application::StreamRegistryPort;

pub use crate::config::ServerConfig;

/// HTTP 服务器
pub struct HttpServer {
    config: ServerConfig,
    state: Arc<AppState>,
}

impl HttpServer {
    pub fn new(config: ServerConfig, state: AppState) -> Self {
        Self {
            config,
            state: Arc::new(state),
        }
    }

    fn build_router(&self) -> Router {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .max_age(Duration::from_secs(3600));

        create_routes()
            .layer(middleware::from_fn(error_logging_middleware))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
            .with_state(self.state.clone())
    }

    /// 启动服务器，`shutdown_signal` 完成后停止接收新连接
    ///
    /// 关闭时取消所有进行中的流，已缓冲的内容照常提交
    pub async fn run_with_shutdown<F>(self, shutdown_signal: F) -> Result<(), std::io::Error>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let router = self.build_router();
        let addr = self.config.addr();
        let registry = self.state.stream_registry.clone();

        info!("Starting HTTP server on {}", addr);

        let listener = TcpListener::bind(&addr).await?;
        axum::serve(listener, router)
            .with_graceful_shutdown(async move {
                shutdown_signal.await;
                cancel_all(registry.as_ref());
            })
            .await?;

        Ok(())
    }
}

fn cancel_all(registry: &dyn StreamRegistryPort) {
    for stream in registry.list() {
        info!(stream_id = %stream.id, "Cancelling stream on shutdown");
        // 流可能已在此期间结束
        let _ = registry.cancel(&stream.id);
    }
}
