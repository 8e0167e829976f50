//! 服务端渲染的审阅页面
//!
//! 所有模型来源的文本都先经过 `sanitize`, 金额与日期经过归一化函数.

use axum::{
    extract::{multipart::MultipartRejection, Multipart, Path, Query, State},
    response::{Html, IntoResponse, Redirect, Response},
};
use chrono::{Local, Utc};
use serde_json::Value;

use crate::api::upload::{read_upload, FILE_FIELD};
use crate::api::{handlers::SearchParams, parse_id, AppState};
use crate::error::AppError;
use crate::models::{keys, InvoiceRecord};
use crate::normalize::{
    calculate_subtotal, escape_html, format_currency, format_date, format_usd, is_blank, sanitize,
    time_ago, NOT_SPECIFIED,
};

/// 页面错误: 与 AppError 同样的状态码, 但渲染为 HTML
pub struct ViewError(AppError);

impl From<AppError> for ViewError {
    fn from(e: AppError) -> Self {
        ViewError(e)
    }
}

impl IntoResponse for ViewError {
    fn into_response(self) -> Response {
        let status = self.0.status();
        if status.is_server_error() {
            tracing::error!("{}", self.0);
        }
        let body = format!(
            r#"<div class="alert">Error: {}</div><p><a href="/">Back to invoices</a></p>"#,
            escape_html(&self.0.to_string())
        );
        (status, page("Error", &body)).into_response()
    }
}

/// `title` 与 `body` 须已转义
fn page(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} - Invoice Analyzer</title>
<style>
body {{ font-family: sans-serif; max-width: 960px; margin: 2rem auto; }}
.invoice-item {{ display: flex; justify-content: space-between; padding: .75rem; border-bottom: 1px solid #ddd; }}
.invoice-amount {{ font-weight: bold; }}
.muted {{ color: #777; font-size: .85rem; }}
.alert {{ padding: .75rem; background: #fdecea; }}
table {{ width: 100%; border-collapse: collapse; }}
td, th {{ border-bottom: 1px solid #eee; padding: .4rem; text-align: left; }}
</style>
</head>
<body>
<h1><a href="/">Invoice Analyzer</a></h1>
{body}
</body>
</html>"#,
        title = title,
        body = body,
    ))
}

/// 值为空时使用默认文本
fn text_or(value: Option<&Value>, fallback: &str) -> String {
    match value {
        Some(v) if !is_blank(v) => sanitize(Some(v)),
        _ => escape_html(fallback),
    }
}

/// 列表中的金额: 文本原样显示, 数字格式化
fn amount_label(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) if !s.trim().is_empty() => escape_html(s.trim()),
        Some(v @ Value::Number(_)) if !is_blank(v) => format_currency(Some(v)),
        _ => "N/A".to_string(),
    }
}

/// 列表中的日期: 发票日期, 缺失时用上传日期
fn list_date(invoice: &InvoiceRecord) -> String {
    match invoice.get(keys::DATE) {
        Some(v) if !is_blank(v) => escape_html(&format_date(Some(v))),
        _ => invoice.upload_date.with_timezone(&Local).format("%-m/%-d/%Y").to_string(),
    }
}

fn render_list(invoices: &[InvoiceRecord], empty_message: &str) -> String {
    if invoices.is_empty() {
        return format!(r#"<p class="muted">{}</p>"#, escape_html(empty_message));
    }

    let now = Utc::now();
    invoices
        .iter()
        .map(|invoice| {
            format!(
                r#"<a class="invoice-item" href="/invoices/{id}">
  <div>
    <div class="invoice-vendor">{vendor}</div>
    <div class="invoice-number">Invoice #: {number}</div>
    <div class="invoice-date">Date: {date}</div>
  </div>
  <div>
    <div class="invoice-amount">{amount}</div>
    <small class="muted">{age}</small>
  </div>
</a>"#,
                id = invoice.id,
                vendor = text_or(invoice.get(keys::VENDOR_NAME), "Unknown Vendor"),
                number = text_or(invoice.get(keys::INVOICE_NUMBER), "N/A"),
                date = list_date(invoice),
                amount = amount_label(invoice.get(keys::TOTAL_AMOUNT)),
                age = time_ago(invoice.upload_date, now),
            )
        })
        .collect()
}

/// 首页: 上传表单 + 搜索 + 发票列表
pub async fn index(
    State(state): State<AppState>,
    Query(params): Query<SearchParams>,
) -> Result<Html<String>, ViewError> {
    let term = params.term();
    let invoices = match term {
        Some(term) => state.service.search(term).await?,
        None => state.service.list().await?,
    };
    let empty_message = match term {
        Some(term) => format!("No invoices found matching \"{}\"", term),
        None => "No invoices found. Upload your first invoice to get started.".to_string(),
    };

    let body = format!(
        r#"<form method="post" action="/invoices/upload" enctype="multipart/form-data">
  <input type="file" name="{field}" accept=".jpg,.jpeg,.png,.pdf" required>
  <button type="submit">Upload &amp; Analyze</button>
</form>
<form method="get" action="/">
  <input type="search" name="query" value="{query}" placeholder="Vendor, invoice number or item">
  <button type="submit">Search</button>
</form>
<div id="invoicesList">
{list}
</div>"#,
        field = FILE_FIELD,
        query = escape_html(term.unwrap_or_default()),
        list = render_list(&invoices, &empty_message),
    );
    Ok(page("Invoices", &body))
}

/// 详情页
pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Html<String>, ViewError> {
    let invoice = state.service.get(parse_id(&id)?).await?;
    let title = format!("Invoice: {}", text_or(invoice.get(keys::INVOICE_NUMBER), "N/A"));

    let items = invoice.items();
    let rows: String = if items.is_empty() {
        r#"<tr><td colspan="4">No line items available</td></tr>"#.to_string()
    } else {
        items
            .iter()
            .map(|item| {
                format!(
                    "<tr><td>{}</td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    text_or(item.description(), "No description"),
                    text_or(item.quantity(), "1"),
                    format_currency(item.unit_price()),
                    format_currency(item.amount()),
                )
            })
            .collect()
    };

    let body = format!(
        r#"<h2>{title}</h2>
<table>
  <tr><th>Vendor</th><td>{vendor}</td></tr>
  <tr><th>Vendor Address</th><td>{address}</td></tr>
  <tr><th>Vendor Contact</th><td>{contact}</td></tr>
  <tr><th>Invoice Number</th><td>{number}</td></tr>
  <tr><th>Uploaded</th><td>{uploaded} ({file})</td></tr>
  <tr><th>Invoice Date</th><td>{date}</td></tr>
  <tr><th>Due Date</th><td>{due}</td></tr>
  <tr><th>Subtotal</th><td>{subtotal}</td></tr>
  <tr><th>Tax</th><td>{tax}</td></tr>
  <tr><th>Discount</th><td>{discount}</td></tr>
  <tr><th>Total</th><td>{total}</td></tr>
  <tr><th>Payment Terms</th><td>{terms}</td></tr>
  <tr><th>Notes</th><td>{notes}</td></tr>
</table>
<h3>Line Items</h3>
<table>
  <tr><th>Description</th><th>Quantity</th><th>Unit Price</th><th>Amount</th></tr>
  {rows}
</table>
<form method="post" action="/invoices/{id}/delete">
  <button type="submit">Delete invoice</button>
</form>"#,
        title = title,
        vendor = text_or(invoice.get(keys::VENDOR_NAME), "Unknown Vendor"),
        address = text_or(invoice.get(keys::VENDOR_ADDRESS), NOT_SPECIFIED),
        contact = text_or(invoice.get(keys::VENDOR_CONTACT), NOT_SPECIFIED),
        number = text_or(invoice.get(keys::INVOICE_NUMBER), "N/A"),
        uploaded = invoice.upload_date.with_timezone(&Local).format("%-m/%-d/%Y, %-I:%M:%S %p"),
        file = escape_html(&invoice.original_filename),
        date = escape_html(&format_date(invoice.get(keys::DATE))),
        due = escape_html(&format_date(invoice.get(keys::DUE_DATE))),
        subtotal = format_usd(calculate_subtotal(&invoice.fields)),
        tax = format_currency(invoice.get(keys::TAX_AMOUNT)),
        discount = format_currency(invoice.get(keys::DISCOUNT)),
        total = format_currency(invoice.get(keys::TOTAL_AMOUNT)),
        terms = text_or(invoice.get(keys::PAYMENT_TERMS), NOT_SPECIFIED),
        notes = text_or(invoice.get(keys::NOTES), "No notes available"),
        rows = rows,
        id = invoice.id,
    );
    Ok(page(&title, &body))
}

/// 表单上传, 成功后跳转到详情页
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Redirect, ViewError> {
    let multipart = multipart.map_err(|_| AppError::InvalidUpload("No file uploaded".to_string()))?;
    let staged = read_upload(multipart, &state.upload).await?;
    let record = state.service.process_staged(staged).await?;
    Ok(Redirect::to(&format!("/invoices/{}", record.id)))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, ViewError> {
    state.service.delete(parse_id(&id)?).await?;
    Ok(Redirect::to("/"))
}
