pub mod gemini;

#[cfg(test)]
pub mod scripted;

use async_trait::async_trait;

use crate::error::AppError;
use crate::extract::InvoiceContent;

pub use gemini::GeminiClient;

/// 外部生成模型: 提示词 + 内容 -> 原始文本输出
#[async_trait]
pub trait GenerativeModel: Send + Sync {
    async fn generate(&self, prompt: &str, content: &InvoiceContent) -> Result<String, AppError>;
}
