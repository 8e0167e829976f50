use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{FromRow, PgPool};

use crate::db::store::{like_pattern, InvoiceStore};
use crate::error::AppError;
use crate::models::{InvoiceFields, InvoiceRecord, NewInvoice};

/// invoices 表一行
#[derive(Debug, FromRow)]
pub struct InvoiceRow {
    id: i64,
    data: Json<InvoiceFields>,
    original_filename: String,
    file_path: String,
    upload_date: DateTime<Utc>,
}

impl From<InvoiceRow> for InvoiceRecord {
    fn from(row: InvoiceRow) -> Self {
        InvoiceRecord {
            id: row.id,
            fields: row.data.0,
            original_filename: row.original_filename,
            file_path: row.file_path,
            upload_date: row.upload_date,
        }
    }
}

/// 插入一条发票记录, 返回新 ID
pub async fn insert_invoice(pool: &PgPool, invoice: &NewInvoice) -> Result<i64, sqlx::Error> {
    let start_time = std::time::Instant::now();

    let id = sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO invoices (data, original_filename, file_path, upload_date)
        VALUES ($1, $2, $3, $4)
        RETURNING id
        "#
    )
    .bind(Json(&invoice.fields))
    .bind(&invoice.metadata.original_filename)
    .bind(&invoice.metadata.file_path)
    .bind(invoice.metadata.upload_date)
    .fetch_one(pool)
    .await?;

    tracing::debug!("INSERT invoices 成功, id={}, 耗时: {:?}", id, start_time.elapsed());
    Ok(id)
}

/// 查询全部发票 (按上传时间倒序)
pub async fn list_invoices(pool: &PgPool) -> Result<Vec<InvoiceRow>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceRow>(
        r#"
        SELECT id, data, original_filename, file_path, upload_date
        FROM invoices
        ORDER BY upload_date DESC, id DESC
        "#
    )
    .fetch_all(pool)
    .await
}

pub async fn get_invoice(pool: &PgPool, id: i64) -> Result<Option<InvoiceRow>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceRow>(
        r#"
        SELECT id, data, original_filename, file_path, upload_date
        FROM invoices
        WHERE id = $1
        "#
    )
    .bind(id)
    .fetch_optional(pool)
    .await
}

/// 删除发票, 返回影响行数
pub async fn delete_invoice(pool: &PgPool, id: i64) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM invoices WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

/// 按供应商名 / 发票号 / 明细描述模糊搜索 (pattern 已转义)
pub async fn search_invoices(pool: &PgPool, pattern: &str) -> Result<Vec<InvoiceRow>, sqlx::Error> {
    sqlx::query_as::<_, InvoiceRow>(
        r#"
        SELECT id, data, original_filename, file_path, upload_date
        FROM invoices
        WHERE data->>'vendorName' ILIKE $1 ESCAPE '\'
           OR data->>'invoiceNumber' ILIKE $1 ESCAPE '\'
           OR EXISTS (
                SELECT 1
                FROM jsonb_array_elements(
                    CASE WHEN jsonb_typeof(data->'items') = 'array'
                         THEN data->'items'
                         ELSE '[]'::jsonb
                    END
                ) AS item
                WHERE item->>'description' ILIKE $1 ESCAPE '\'
           )
        ORDER BY upload_date DESC, id DESC
        "#
    )
    .bind(pattern)
    .fetch_all(pool)
    .await
}

/// PostgreSQL 实现
#[derive(Clone)]
pub struct PgInvoiceStore {
    pool: PgPool,
}

impl PgInvoiceStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl InvoiceStore for PgInvoiceStore {
    async fn insert(&self, invoice: &NewInvoice) -> Result<i64, AppError> {
        Ok(insert_invoice(&self.pool, invoice).await?)
    }

    async fn list_all(&self) -> Result<Vec<InvoiceRecord>, AppError> {
        let rows = list_invoices(&self.pool).await?;
        Ok(rows.into_iter().map(InvoiceRecord::from).collect())
    }

    async fn get_by_id(&self, id: i64) -> Result<InvoiceRecord, AppError> {
        get_invoice(&self.pool, id)
            .await?
            .map(InvoiceRecord::from)
            .ok_or(AppError::NotFound)
    }

    async fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        match delete_invoice(&self.pool, id).await? {
            0 => Err(AppError::NotFound),
            _ => Ok(()),
        }
    }

    async fn search(&self, query: &str) -> Result<Vec<InvoiceRecord>, AppError> {
        if query.trim().is_empty() {
            return self.list_all().await;
        }
        let rows = search_invoices(&self.pool, &like_pattern(query)).await?;
        Ok(rows.into_iter().map(InvoiceRecord::from).collect())
    }
}
