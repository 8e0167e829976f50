use axum::extract::multipart::{Multipart, MultipartError};
use std::path::Path;

use crate::config::UploadConfig;
use crate::error::AppError;
use crate::extract::FileKind;
use crate::service::StagedUpload;

/// 上传表单中的文件字段名
pub const FILE_FIELD: &str = "invoice";

/// 读取 multipart 中的发票文件, 校验类型与大小后暂存
pub async fn read_upload(mut multipart: Multipart, config: &UploadConfig) -> Result<StagedUpload, AppError> {
    while let Some(field) = multipart.next_field().await.map_err(invalid_body)? {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let file_name = field
            .file_name()
            .map(str::to_string)
            .filter(|name| !name.is_empty())
            .ok_or_else(no_file)?;
        let content_type = field.content_type().unwrap_or_default().to_string();

        // 扩展名与声明的类型都必须在白名单内
        if FileKind::from_path(Path::new(&file_name)).is_none()
            || !FileKind::is_allowed_media_type(&content_type)
        {
            tracing::warn!(file_name = %file_name, content_type = %content_type, "Rejected upload type");
            return Err(AppError::InvalidUpload("Images/PDF only!".to_string()));
        }

        let bytes = field.bytes().await.map_err(invalid_body)?;
        if bytes.len() > config.max_bytes {
            return Err(too_large(config.max_bytes));
        }
        if bytes.is_empty() {
            return Err(no_file());
        }

        tracing::info!(file_name = %file_name, bytes = bytes.len(), "Upload received");
        return StagedUpload::stage(&config.staging_dir, &file_name, &bytes).await;
    }
    Err(no_file())
}

fn no_file() -> AppError {
    AppError::InvalidUpload("No file uploaded".to_string())
}

fn too_large(max_bytes: usize) -> AppError {
    AppError::InvalidUpload(format!("File too large (limit {} bytes)", max_bytes))
}

fn invalid_body(e: MultipartError) -> AppError {
    AppError::InvalidUpload(format!("Invalid upload: {}", e.body_text()))
}
