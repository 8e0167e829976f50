pub mod handlers;
pub mod upload;
pub mod views;

use axum::{
    extract::{DefaultBodyLimit, Request},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use futures::FutureExt;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tower::ServiceBuilder;

use crate::config::UploadConfig;
use crate::error::AppError;
use crate::service::InvoiceService;

pub use handlers::*;

/// multipart 边界与头部的额外字节
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// 共享状态
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<InvoiceService>,
    pub upload: Arc<UploadConfig>,
}

/// 构建路由: JSON API + HTML 页面
pub fn router(state: AppState) -> Router {
    let body_limit = state.upload.max_bytes + MULTIPART_OVERHEAD;

    let api_routes = Router::new()
        .route("/api/invoices", get(handlers::list_invoices))
        .route("/api/invoices/upload", post(handlers::upload_invoice))
        .route("/api/invoices/search", get(handlers::search_invoices))
        .route(
            "/api/invoices/:id",
            get(handlers::get_invoice).delete(handlers::delete_invoice),
        );

    let view_routes = Router::new()
        .route("/", get(views::index))
        .route("/invoices/upload", post(views::upload))
        .route("/invoices/:id", get(views::detail))
        .route("/invoices/:id/delete", post(views::delete));

    Router::new()
        .route("/health", get(handlers::health_check))
        .merge(api_routes)
        .merge(view_routes)
        .fallback(handlers::not_found)
        .layer(
            ServiceBuilder::new()
                .layer(middleware::from_fn(catch_panic))
                .layer(DefaultBodyLimit::max(body_limit)),
        )
        .with_state(state)
}

/// 兜底: handler panic 时记录日志并返回通用 500
async fn catch_panic(req: Request, next: Next) -> Response {
    match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            AppError::Internal(detail).into_response()
        }
    }
}

/// 路径中的 ID; 非数字视为不存在
pub(crate) fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.trim().parse().map_err(|_| AppError::NotFound)
}
