use serde::Serialize;

/// 统一响应体: {success, data?, message?}
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invoice_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            invoice_id: None,
            data: Some(data),
            message: None,
        }
    }

    /// 上传成功: 额外带上新记录 ID
    pub fn uploaded(invoice_id: i64, data: T) -> Self {
        Self {
            success: true,
            invoice_id: Some(invoice_id),
            data: Some(data),
            message: None,
        }
    }

    pub fn done() -> Self {
        Self {
            success: true,
            invoice_id: None,
            data: None,
            message: None,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            invoice_id: None,
            data: None,
            message: Some(message.into()),
        }
    }
}
