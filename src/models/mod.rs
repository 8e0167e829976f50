pub mod invoice;
pub mod response;

pub use invoice::{keys, line_items, InvoiceFields, InvoiceRecord, LineItem, NewInvoice, UploadMetadata};
pub use response::ApiResponse;
