use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// AI 抽取出的原始字段 (无 schema 约束, 读取时再归一化)
pub type InvoiceFields = Map<String, Value>;

/// 记录中使用的字段名 (与提示词中要求的 JSON 键一致)
pub mod keys {
    pub const VENDOR_NAME: &str = "vendorName";
    pub const VENDOR_ADDRESS: &str = "vendorAddress";
    pub const VENDOR_CONTACT: &str = "vendorContact";
    pub const INVOICE_NUMBER: &str = "invoiceNumber";
    pub const DATE: &str = "date";
    pub const DUE_DATE: &str = "dueDate";
    pub const ITEMS: &str = "items";
    pub const SUBTOTAL: &str = "subtotal";
    pub const TAX_AMOUNT: &str = "taxAmount";
    pub const DISCOUNT: &str = "discount";
    pub const TOTAL_AMOUNT: &str = "totalAmount";
    pub const PAYMENT_TERMS: &str = "paymentTerms";
    pub const NOTES: &str = "notes";

    pub const DESCRIPTION: &str = "description";
    pub const QUANTITY: &str = "quantity";
    pub const UNIT_PRICE: &str = "unitPrice";
    pub const AMOUNT: &str = "amount";

    /// 系统字段, 总是覆盖模型返回的同名键
    pub const SYSTEM: [&str; 4] = ["_id", "originalFilename", "filePath", "uploadDate"];
}

/// 发票记录 (invoices 表一行)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceRecord {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(flatten)]
    pub fields: InvoiceFields,
    pub original_filename: String,
    pub file_path: String,
    pub upload_date: DateTime<Utc>,
}

impl InvoiceRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    /// 明细行; 缺失或不是数组时为空
    pub fn items(&self) -> Vec<LineItem<'_>> {
        line_items(&self.fields)
    }
}

/// 明细行视图, 所有字段都可能缺失或类型不一致
#[derive(Debug, Clone, Copy)]
pub struct LineItem<'a>(pub &'a Value);

impl<'a> LineItem<'a> {
    fn field(&self, key: &str) -> Option<&'a Value> {
        self.0.as_object().and_then(|obj| obj.get(key))
    }

    pub fn description(&self) -> Option<&'a Value> {
        self.field(keys::DESCRIPTION)
    }

    pub fn quantity(&self) -> Option<&'a Value> {
        self.field(keys::QUANTITY)
    }

    pub fn unit_price(&self) -> Option<&'a Value> {
        self.field(keys::UNIT_PRICE)
    }

    pub fn amount(&self) -> Option<&'a Value> {
        self.field(keys::AMOUNT)
    }
}

pub fn line_items(fields: &InvoiceFields) -> Vec<LineItem<'_>> {
    match fields.get(keys::ITEMS) {
        Some(Value::Array(items)) => items.iter().map(LineItem).collect(),
        _ => Vec::new(),
    }
}

/// 上传事件产生的元数据
#[derive(Debug, Clone)]
pub struct UploadMetadata {
    pub original_filename: String,
    pub file_path: String,
    pub upload_date: DateTime<Utc>,
}

/// 待插入的发票: 模型字段 + 系统元数据
#[derive(Debug, Clone)]
pub struct NewInvoice {
    pub fields: InvoiceFields,
    pub metadata: UploadMetadata,
}

impl NewInvoice {
    /// 合并元数据; 模型返回的同名系统字段被丢弃
    pub fn new(mut fields: InvoiceFields, metadata: UploadMetadata) -> Self {
        for key in keys::SYSTEM {
            fields.remove(key);
        }
        Self { fields, metadata }
    }

    pub fn into_record(self, id: i64) -> InvoiceRecord {
        InvoiceRecord {
            id,
            fields: self.fields,
            original_filename: self.metadata.original_filename,
            file_path: self.metadata.file_path,
            upload_date: self.metadata.upload_date,
        }
    }
}
