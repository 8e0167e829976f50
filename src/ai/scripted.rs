use async_trait::async_trait;
use std::sync::{Arc, Mutex};

use crate::ai::GenerativeModel;
use crate::error::AppError;
use crate::extract::InvoiceContent;

type Calls = Arc<Mutex<Vec<(String, InvoiceContent)>>>;

/// 测试用模型: 返回固定输出并记录调用
pub struct ScriptedModel {
    reply: Result<String, String>,
    calls: Calls,
}

impl ScriptedModel {
    pub fn reply(text: &str) -> Self {
        Self {
            reply: Ok(text.to_string()),
            calls: Calls::default(),
        }
    }

    pub fn fail(message: &str) -> Self {
        Self {
            reply: Err(message.to_string()),
            calls: Calls::default(),
        }
    }

    pub fn calls(&self) -> Calls {
        Arc::clone(&self.calls)
    }
}

#[async_trait]
impl GenerativeModel for ScriptedModel {
    async fn generate(&self, prompt: &str, content: &InvoiceContent) -> Result<String, AppError> {
        self.calls
            .lock()
            .unwrap()
            .push((prompt.to_string(), content.clone()));
        self.reply.clone().map_err(AppError::AiService)
    }
}
