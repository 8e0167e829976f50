use chrono::Utc;
use std::sync::Arc;
use tracing::Instrument;

use crate::ai::GenerativeModel;
use crate::db::InvoiceStore;
use crate::error::AppError;
use crate::extract::{build_prompt, extract_content, parse_response, FileKind};
use crate::models::{InvoiceRecord, NewInvoice, UploadMetadata};
use crate::service::StagedUpload;

/// 发票服务: 上传流水线 + 存储直通操作
pub struct InvoiceService {
    store: Arc<dyn InvoiceStore>,
    model: Arc<dyn GenerativeModel>,
}

impl InvoiceService {
    pub fn new(store: Arc<dyn InvoiceStore>, model: Arc<dyn GenerativeModel>) -> Self {
        Self { store, model }
    }

    /// 处理暂存文件并在结束后删除 (无论成功与否)
    pub async fn process_staged(&self, upload: StagedUpload) -> Result<InvoiceRecord, AppError> {
        let result = self.process_upload(&upload).await;
        upload.discard().await;
        result
    }

    /// 上传流水线: 内容抽取 -> 模型调用 -> 响应解析 -> 合并元数据 -> 入库
    pub async fn process_upload(&self, upload: &StagedUpload) -> Result<InvoiceRecord, AppError> {
        let span = tracing::info_span!("upload", filename = %upload.original_filename);
        self.run_pipeline(upload).instrument(span).await
    }

    async fn run_pipeline(&self, upload: &StagedUpload) -> Result<InvoiceRecord, AppError> {
        let start_time = std::time::Instant::now();

        // 1. 内容抽取
        let kind = FileKind::from_path(upload.path()).ok_or_else(|| {
            AppError::Extraction(format!("unsupported file type: {}", upload.original_filename))
        })?;
        let content = extract_content(upload.path(), kind).await?;

        // 2. 调用模型
        let prompt = build_prompt(kind);
        let raw = self.model.generate(&prompt, &content).await?;

        // 3. 解析模型输出
        let fields = parse_response(&raw)?;
        tracing::info!(keys = fields.len(), "AI response parsed");

        // 4. 合并系统元数据 (覆盖模型返回的同名字段) 并入库
        let invoice = NewInvoice::new(
            fields,
            UploadMetadata {
                original_filename: upload.original_filename.clone(),
                file_path: upload.path().display().to_string(),
                upload_date: Utc::now(),
            },
        );
        let id = self.store.insert(&invoice).await?;

        tracing::info!(invoice_id = id, kind = ?kind, elapsed = ?start_time.elapsed(), "Invoice stored");
        Ok(invoice.into_record(id))
    }

    pub async fn list(&self) -> Result<Vec<InvoiceRecord>, AppError> {
        self.store.list_all().await
    }

    pub async fn get(&self, id: i64) -> Result<InvoiceRecord, AppError> {
        self.store.get_by_id(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<(), AppError> {
        self.store.delete_by_id(id).await?;
        tracing::info!(invoice_id = id, "Invoice deleted");
        Ok(())
    }

    pub async fn search(&self, query: &str) -> Result<Vec<InvoiceRecord>, AppError> {
        self.store.search(query).await
    }
}
