use axum::{
    extract::{multipart::MultipartRejection, Json, Multipart, Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;

use crate::api::{parse_id, upload::read_upload, AppState};
use crate::error::AppError;
use crate::models::{ApiResponse, InvoiceRecord};

/// 搜索参数
#[derive(Debug, Default, Deserialize)]
pub struct SearchParams {
    pub query: Option<String>,
}

impl SearchParams {
    /// 去掉首尾空白; 空串视为未提供
    pub fn term(&self) -> Option<&str> {
        self.query.as_deref().map(str::trim).filter(|q| !q.is_empty())
    }
}

/// 健康检查
pub async fn health_check() -> &'static str {
    "OK"
}

/// 上传发票并抽取结构化数据
pub async fn upload_invoice(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Response, AppError> {
    let multipart = multipart.map_err(|_| AppError::InvalidUpload("No file uploaded".to_string()))?;
    let staged = read_upload(multipart, &state.upload).await?;
    let record = state.service.process_staged(staged).await?;

    let response = ApiResponse::uploaded(record.id, record);
    Ok((StatusCode::OK, Json(response)).into_response())
}

/// 全部发票 (上传时间倒序)
pub async fn list_invoices(State(state): State<AppState>) -> Response {
    match state.service.list().await {
        Ok(invoices) => (StatusCode::OK, Json(ApiResponse::ok(invoices))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn get_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<InvoiceRecord>>, AppError> {
    let invoice = state.service.get(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::ok(invoice)))
}

pub async fn delete_invoice(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ApiResponse<()>>, AppError> {
    state.service.delete(parse_id(&id)?).await?;
    Ok(Json(ApiResponse::done()))
}

/// 搜索; 缺少 query 时重定向到全量列表
pub async fn search_invoices(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(term) = params.term() else {
        return Redirect::to("/api/invoices").into_response();
    };
    match state.service.search(term).await {
        Ok(invoices) => (StatusCode::OK, Json(ApiResponse::ok(invoices))).into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn not_found() -> Response {
    let body: ApiResponse<()> = ApiResponse::failure("Not found");
    (StatusCode::NOT_FOUND, Json(body)).into_response()
}
