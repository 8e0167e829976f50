use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;

use crate::models::ApiResponse;

/// 服务错误分类, 统一映射为 HTTP 响应 (不做任何重试)
#[derive(Error, Debug)]
pub enum AppError {
    /// 文件不可读 / PDF 无法解析
    #[error("Failed to extract invoice content: {0}")]
    Extraction(String),

    /// 外部模型不可达、鉴权/配额失败或空响应
    #[error("AI service error: {0}")]
    AiService(String),

    /// 模型输出中找不到可解析的 JSON 对象
    #[error("Malformed AI response: {0}")]
    MalformedResponse(String),

    #[error("Database error: {0}")]
    Store(#[from] sqlx::Error),

    #[error("Invoice not found")]
    NotFound,

    /// 上传在暂存前被拒绝 (类型/大小/缺少文件)
    #[error("{0}")]
    InvalidUpload(String),

    /// 兜底错误, 不向调用方暴露细节
    #[error("Internal server error")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::InvalidUpload(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            AppError::Internal(detail) => tracing::error!("Unhandled error: {}", detail),
            AppError::NotFound | AppError::InvalidUpload(_) => tracing::debug!("{}", self),
            _ => tracing::error!("{}", self),
        }
        let body: ApiResponse<()> = ApiResponse::failure(self.to_string());
        (status, Json(body)).into_response()
    }
}
