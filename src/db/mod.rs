pub mod pool;
pub mod queries;
pub mod store;

#[cfg(test)]
pub mod memory;

pub use pool::{create_pool, ensure_schema};
pub use queries::PgInvoiceStore;
pub use store::InvoiceStore;
