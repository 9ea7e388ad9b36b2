use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use super::handlers;
use super::jobs::JobTable;
use crate::config::{AppConfig, UiConfig};
use crate::downloader::DownloadHandler;

/// 路由共享状态
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<DownloadHandler>,
    pub jobs: JobTable,
    pub ui: Arc<UiConfig>,
}

impl AppState {
    pub fn new(handler: DownloadHandler, ui: UiConfig) -> Self {
        Self {
            handler: Arc::new(handler),
            jobs: JobTable::new(),
            ui: Arc::new(ui),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/health", get(handlers::health))
        .route("/api/downloads", post(handlers::create_download))
        .route(
            "/api/downloads/{id}",
            get(handlers::download_status).delete(handlers::dismiss_download),
        )
        .route("/api/downloads/{id}/file", get(handlers::download_file))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(CorsLayer::permissive()),
        )
        .with_state(state)
}

/// 启动网页界面
pub async fn serve(config: &AppConfig, handler: DownloadHandler, addr: SocketAddr) -> anyhow::Result<()> {
    let app = router(AppState::new(handler, config.ui.clone()));

    let listener = TcpListener::bind(addr).await?;
    info!("🚀 网页界面已启动: http://{}", listener.local_addr()?);
    info!("  /                      - 下载页面");
    info!("  /api/downloads         - 提交下载 (POST)");
    info!("  /api/downloads/{{id}}    - 任务状态 / 关闭");
    info!("  /api/downloads/{{id}}/file - 保存文件");
    info!("文件保存目录: {:?}", config.output_dir);

    axum::serve(listener, app).await?;
    Ok(())
}
