pub mod invoice_service;
pub mod staging;

pub use invoice_service::InvoiceService;
pub use staging::StagedUpload;
