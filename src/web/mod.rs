pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod ui;

use crate::{
    detection::ImageProcessor, models::ModelManager, utils::error::DetectError, Config, Result,
};
use axum::{
    extract::{DefaultBodyLimit, State},
    response::Json,
    routing::{get, post},
    Router,
};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tower_http::{limit::RequestBodyLimitLayer, services::ServeDir, timeout::TimeoutLayer};

/// 标注结果的静态访问路径
pub const OUTPUT_URL_PREFIX: &str = "/static/outputs";

/// 请求共享状态
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub models: Arc<ModelManager>,
    pub processor: Arc<ImageProcessor>,
    /// 串行化上传处理，避免并发请求写同名文件
    pub pipeline_lock: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(models: Arc<ModelManager>) -> Result<Self> {
        let processor = Arc::new(ImageProcessor::new(Arc::clone(&models))?);

        Ok(Self {
            config: models.config().clone(),
            models,
            processor,
            pipeline_lock: Arc::new(Mutex::new(())),
        })
    }
}

pub async fn serve(config: Config) -> Result<()> {
    // 创建上传与输出目录
    config.ensure_directories()?;

    // 加载模型（进程内只加载一次）
    let models = Arc::new(ModelManager::load(config.clone())?);
    models.health_check()?;

    let state = AppState::new(models)?;
    let app = create_app(state);

    // 解析绑定地址
    let addr: SocketAddr = config.bind_addr.parse().map_err(|e| {
        DetectError::Config(format!("Invalid bind address {}: {}", config.bind_addr, e))
    })?;

    tracing::info!("Server starting on http://{}", addr);
    tracing::info!("API endpoints:");
    tracing::info!("  GET  /                - Upload form");
    tracing::info!("  POST /                - Multipart upload (field \"files\"), HTML result");
    tracing::info!("  POST /api/upload      - Multipart upload, JSON result");
    tracing::info!("  GET  {}/* - Annotated images", OUTPUT_URL_PREFIX);
    tracing::info!("  GET  /health          - Health check");
    tracing::info!("  GET  /api/info        - Service information");

    let listener = TcpListener::bind(&addr).await.map_err(|e| {
        DetectError::Internal(format!("Failed to bind to address {}: {}", addr, e))
    })?;

    axum::serve(listener, app)
        .await
        .map_err(|e| DetectError::Internal(format!("Server failed to start: {}", e)))?;

    Ok(())
}

pub fn create_app(state: AppState) -> Router {
    let server_config = &state.config.server_config;

    Router::new()
        .route("/", get(handlers::index_handler).post(handlers::upload_handler))
        .route("/api/upload", post(handlers::api_upload_handler))
        .route("/health", get(health_handler))
        .route("/api/info", get(info_handler))
        .nest_service(OUTPUT_URL_PREFIX, ServeDir::new(&state.config.output_dir))
        // multipart默认2MB上限，改由RequestBodyLimitLayer统一限制
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(server_config.max_request_size))
        .layer(TimeoutLayer::new(Duration::from_secs(server_config.request_timeout)))
        .layer(axum::middleware::from_fn(middleware::security_headers))
        .layer(axum::middleware::from_fn(middleware::request_logging))
        .with_state(state)
}

/// 健康检查端点
async fn health_handler(State(state): State<AppState>) -> Result<Json<serde_json::Value>> {
    state.models.health_check()?;

    Ok(Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
        "version": env!("CARGO_PKG_VERSION")
    })))
}

/// 服务信息端点
async fn info_handler(State(state): State<AppState>) -> Json<serde_json::Value> {
    let stats = state.models.get_stats();

    Json(json!({
        "service": "ONNX Detect Service",
        "version": env!("CARGO_PKG_VERSION"),
        "description": env!("CARGO_PKG_DESCRIPTION"),
        "model": stats,
        "upload": {
            "field": handlers::UPLOAD_FIELD,
            "allowed_extensions": crate::utils::ALLOWED_EXTENSIONS,
            "max_request_size": state.config.server_config.max_request_size,
        }
    }))
}
