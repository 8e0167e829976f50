use async_trait::async_trait;
use std::sync::Mutex;

use crate::db::store::{matches_query, InvoiceStore};
use crate::error::AppError;
use crate::models::{InvoiceRecord, NewInvoice};

/// 测试用内存存储, 排序与搜索语义与 PgInvoiceStore 一致
#[derive(Default)]
pub struct MemoryInvoiceStore {
    records: Mutex<Vec<InvoiceRecord>>,
}

impl MemoryInvoiceStore {
    pub fn len(&self) -> usize {
        self.records.lock().unwrap().len()
    }

    fn sorted(mut records: Vec<InvoiceRecord>) -> Vec<InvoiceRecord> {
        records.sort_by(|a, b| b.upload_date.cmp(&a.upload_date).then(b.id.cmp(&a.id)));
        records
    }
}

#[async_trait]
impl InvoiceStore for MemoryInvoiceStore {
    async fn insert(&self, invoice: &NewInvoice) -> Result<i64, AppError> {
        let mut records = self.records.lock().unwrap();
        let id = records.iter().map(|r| r.id).max().unwrap_or(0) + 1;
        records.push(invoice.clone().into_record(id));
        Ok(id)
    }

    async fn list_all(&self) -> Result<Vec<InvoiceRecord>, AppError> {
        Ok(Self::sorted(self.records.lock().unwrap().clone()))
    }

    async fn get_by_id(&self, id: i64) -> Result<InvoiceRecord, AppError> {
        self.records
            .lock()
            .unwrap()
            .iter()
            .find(|r| r.id == id)
            .cloned()
            .ok_or(AppError::NotFound)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        let mut records = self.records.lock().unwrap();
        let before = records.len();
        records.retain(|r| r.id != id);
        if records.len() == before {
            return Err(AppError::NotFound);
        }
        Ok(())
    }

    async fn search(&self, query: &str) -> Result<Vec<InvoiceRecord>, AppError> {
        if query.trim().is_empty() {
            return self.list_all().await;
        }
        let needle = query.to_lowercase();
        let found = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| matches_query(&r.fields, &needle))
            .cloned()
            .collect();
        Ok(Self::sorted(found))
    }
}
