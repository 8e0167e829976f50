use async_trait::async_trait;

use crate::error::AppError;
use crate::models::{keys, InvoiceFields, InvoiceRecord, NewInvoice};
use crate::normalize::value_text;

/// 发票存储网关: 薄封装, 一致性完全交给外部数据库
#[async_trait]
pub trait InvoiceStore: Send + Sync {
    /// 插入新记录, 返回存储分配的 ID
    async fn insert(&self, invoice: &NewInvoice) -> Result<i64, AppError>;

    /// 全部记录, 按上传时间倒序
    async fn list_all(&self) -> Result<Vec<InvoiceRecord>, AppError>;

    async fn get_by_id(&self, id: i64) -> Result<InvoiceRecord, AppError>;

    /// 没有匹配行时返回 NotFound
    async fn delete_by_id(&self, id: i64) -> Result<(), AppError>;

    /// 供应商名、发票号或任一明细描述包含 query (大小写不敏感); 空 query 等价于 list_all
    async fn search(&self, query: &str) -> Result<Vec<InvoiceRecord>, AppError>;
}

/// ILIKE 子串模式, 转义 \ % _
pub fn like_pattern(query: &str) -> String {
    let mut pattern = String::with_capacity(query.len() + 2);
    pattern.push('%');
    for ch in query.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(ch);
    }
    pattern.push('%');
    pattern
}

/// 内存侧的搜索匹配, needle 需已转小写
pub fn matches_query(fields: &InvoiceFields, needle: &str) -> bool {
    let contains = |text: String| text.to_lowercase().contains(needle);

    let top_level = [keys::VENDOR_NAME, keys::INVOICE_NUMBER]
        .iter()
        .filter_map(|key| fields.get(*key))
        .filter(|v| !v.is_null())
        .any(|v| contains(value_text(v)));

    top_level
        || crate::models::line_items(fields)
            .iter()
            .filter_map(|item| item.description())
            .filter(|v| !v.is_null())
            .any(|v| contains(value_text(v)))
}
