pub mod ai;
pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod models;
pub mod normalize;
pub mod service;

pub use ai::{GeminiClient, GenerativeModel};
pub use config::AppConfig;
pub use db::{create_pool, ensure_schema, InvoiceStore, PgInvoiceStore};
pub use error::AppError;
pub use service::InvoiceService;
