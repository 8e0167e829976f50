pub mod content;
pub mod parser;
pub mod prompt;

#[cfg(test)]
pub mod fixtures;

pub use content::{extract_content, FileKind, InvoiceContent};
pub use parser::parse_response;
pub use prompt::build_prompt;
