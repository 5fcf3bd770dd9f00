use crate::{
    detection::ProcessOutcome,
    utils::{allowed_file, annotated_name, error::DetectError, storage_name},
    web::{extractors::RequestId, ui, AppState, OUTPUT_URL_PREFIX},
    Result,
};
use axum::{
    extract::{Multipart, State},
    response::{Html, Json},
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

/// 上传表单中的文件字段名（可重复）
pub const UPLOAD_FIELD: &str = "files";

/// JSON响应格式
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    pub timestamp: String,
    pub request_id: String,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            timestamp: chrono::Utc::now().to_rfc3339(),
            request_id,
        }
    }
}

/// 一次上传请求的处理结果
#[derive(Debug, Default, Serialize)]
pub struct UploadSummary {
    /// 标注图像的访问URL，按提交顺序
    pub processed_images: Vec<String>,
    /// 通过校验但无法解码的文件名
    pub failed_files: Vec<String>,
}

/// 首页：空的上传表单
pub async fn index_handler() -> Html<String> {
    Html(ui::render_page(&[], &[]))
}

/// 表单上传处理器，返回HTML页面
pub async fn upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> Result<Html<String>> {
    let summary = process_uploads(&state, &request_id, multipart).await?;

    Ok(Html(ui::render_page(
        &summary.processed_images,
        &summary.failed_files,
    )))
}

/// JSON上传处理器
pub async fn api_upload_handler(
    State(state): State<AppState>,
    RequestId(request_id): RequestId,
    multipart: Multipart,
) -> Result<Json<ApiResponse<UploadSummary>>> {
    let summary = process_uploads(&state, &request_id, multipart).await?;

    Ok(Json(ApiResponse::success(summary, request_id)))
}

/// 标注图像的访问URL
pub fn output_url(output_name: &str) -> String {
    format!("{}/{}", OUTPUT_URL_PREFIX, urlencoding::encode(output_name))
}

/// 逐个处理multipart中的文件：校验 → 保存 → 检测标注 → 收集URL
async fn process_uploads(
    state: &AppState,
    request_id: &str,
    mut multipart: Multipart,
) -> Result<UploadSummary> {
    let start_time = Instant::now();
    tracing::info!("Processing upload request: request_id={}", request_id);

    let mut summary = UploadSummary::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        DetectError::InvalidInput(format!("Failed to read multipart field: {}", e))
    })? {
        let field_name = field.name().unwrap_or("unknown").to_string();
        if field_name != UPLOAD_FIELD {
            tracing::debug!("Ignoring unknown field: {}", field_name);
            continue;
        }

        let Some(client_name) = field.file_name().map(str::to_string) else {
            tracing::debug!("Skipping file field without a filename");
            continue;
        };
        if !allowed_file(&client_name) {
            tracing::debug!("Skipping disallowed file: {:?}", client_name);
            continue;
        }
        let Some(name) = storage_name(&client_name) else {
            tracing::debug!("Skipping file without a usable name: {:?}", client_name);
            continue;
        };

        let data = field.bytes().await.map_err(|e| {
            DetectError::InvalidInput(format!("Failed to read file data: {}", e))
        })?;
        if data.is_empty() {
            tracing::debug!("Skipping empty file: {}", name);
            continue;
        }

        // 只在写入和处理期间持有流水线锁
        let _guard = state.pipeline_lock.lock().await;

        let upload_path = state.config.upload_path(&name);
        tokio::fs::write(&upload_path, &data).await?;
        tracing::debug!("Saved upload {} ({} bytes)", upload_path.display(), data.len());

        let output_name = annotated_name(&name);
        let output_path = state.config.output_path(&output_name);
        let processor = Arc::clone(&state.processor);

        let outcome = tokio::task::spawn_blocking(move || {
            processor.process(&upload_path, &output_path)
        })
        .await
        .map_err(|e| DetectError::Internal(format!("Processing task failed: {}", e)))??;

        match outcome {
            ProcessOutcome::Annotated { .. } => {
                summary.processed_images.push(output_url(&output_name));
            }
            ProcessOutcome::Unreadable { .. } => {
                summary.failed_files.push(name);
            }
        }
    }

    tracing::info!(
        "Upload completed: request_id={}, processed={}, failed={}, time={:.3}s",
        request_id,
        summary.processed_images.len(),
        summary.failed_files.len(),
        start_time.elapsed().as_secs_f32()
    );

    Ok(summary)
}
