use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DetectError {
    #[error("Model loading failed: {0}")]
    ModelLoad(String),

    #[error("Image processing failed: {0}")]
    ImageProcessing(String),

    #[error("Detection inference failed: {0}")]
    Inference(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Image codec error: {0}")]
    Image(#[from] image::ImageError),

    #[error("ORT error: {0}")]
    Ort(#[from] ort::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl DetectError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DetectError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            // 上传内容无法解码
            DetectError::Image(_) => StatusCode::UNPROCESSABLE_ENTITY,
            DetectError::ModelLoad(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            DetectError::ModelLoad(_) => "MODEL_LOAD_ERROR",
            DetectError::ImageProcessing(_) => "IMAGE_PROCESSING_ERROR",
            DetectError::Inference(_) => "INFERENCE_ERROR",
            DetectError::InvalidInput(_) => "INVALID_INPUT",
            DetectError::Config(_) => "CONFIG_ERROR",
            DetectError::Io(_) => "IO_ERROR",
            DetectError::Image(_) => "IMAGE_CODEC_ERROR",
            DetectError::Ort(_) => "ORT_ERROR",
            DetectError::Internal(_) => "INTERNAL_ERROR",
        }
    }
}

impl IntoResponse for DetectError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let error_response = serde_json::json!({
            "error": {
                "code": self.error_code(),
                "message": self.to_string(),
            }
        });

        tracing::error!("Request failed: {} ({})", self, status);

        (status, axum::Json(error_response)).into_response()
    }
}
