//! 展示层归一化
//!
//! 模型输出的字段形态不稳定 (数字/字符串混用、日期格式各异、缺失),
//! 这里的函数都是全函数: 任何转换失败都返回约定的兜底值, 从不报错.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

use crate::models::{keys, line_items, InvoiceFields};

pub const NOT_SPECIFIED: &str = "Not specified";
pub const ZERO_AMOUNT: &str = "$0.00";
pub const RECENTLY: &str = "recently";

const MINUTE: i64 = 60;
const HOUR: i64 = 3_600;
const DAY: i64 = 86_400;
const MONTH: i64 = 2_592_000;
const YEAR: i64 = 31_536_000;

const DATE_FORMATS: [&str; 10] = [
    "%Y-%m-%d",
    "%m/%d/%Y",
    "%Y/%m/%d",
    "%B %d, %Y",
    "%b %d, %Y",
    "%B %d %Y",
    "%d %B %Y",
    "%d %b %Y",
    "%d-%b-%Y",
    "%d.%m.%Y",
];

const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M"];

/// 任意值转文本; null 为空串
pub fn value_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// 转义 & < > " ' 五个 HTML 字符
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub fn sanitize(value: Option<&Value>) -> String {
    value.map(|v| escape_html(&value_text(v))).unwrap_or_default()
}

/// 是否视为 "没有值" (null / 空串 / false / 0)
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.trim().is_empty(),
        Value::Number(n) => n.as_f64() == Some(0.0),
        _ => false,
    }
}

/// 解析日期; 失败时原样返回
pub fn format_date(value: Option<&Value>) -> String {
    let Some(value) = value.filter(|v| !is_blank(v)) else {
        return NOT_SPECIFIED.to_string();
    };

    let date = match value {
        Value::String(s) => parse_date(s.trim()),
        Value::Number(n) => n
            .as_i64()
            .and_then(DateTime::<Utc>::from_timestamp_millis)
            .map(|dt| dt.date_naive()),
        _ => None,
    };

    match date {
        Some(date) => date.format("%-m/%-d/%Y").to_string(),
        None => value_text(value),
    }
}

pub fn parse_date(text: &str) -> Option<NaiveDate> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(text) {
        return Some(dt.date_naive());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(text, fmt).ok())
        .map(|dt| dt.date())
        .or_else(|| {
            DATE_FORMATS
                .iter()
                .find_map(|fmt| NaiveDate::parse_from_str(text, fmt).ok())
        })
}

/// 金额解析: 文本先去掉数字、'.'、'-' 以外的字符, 再取最长的数字前缀
pub fn parse_amount(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => {
            let cleaned: String = s
                .chars()
                .filter(|c| c.is_ascii_digit() || *c == '.' || *c == '-')
                .collect();
            parse_float_prefix(&cleaned)
        }
        _ => None,
    }
    .filter(|v| v.is_finite())
}

fn parse_float_prefix(s: &str) -> Option<f64> {
    let bytes = s.as_bytes();
    let mut end = usize::from(bytes.first() == Some(&b'-'));
    let mut digits = 0;
    let mut seen_dot = false;

    while end < bytes.len() {
        match bytes[end] {
            b'0'..=b'9' => digits += 1,
            b'.' if !seen_dot => seen_dot = true,
            _ => break,
        }
        end += 1;
    }

    if digits == 0 {
        return None;
    }
    s[..end].parse().ok()
}

pub fn format_currency(value: Option<&Value>) -> String {
    value
        .and_then(parse_amount)
        .map(format_usd)
        .unwrap_or_else(|| ZERO_AMOUNT.to_string())
}

/// 美元格式: 两位小数 + 千分位, 负数为 -$5.00
pub fn format_usd(amount: f64) -> String {
    if !amount.is_finite() {
        return ZERO_AMOUNT.to_string();
    }
    let fixed = format!("{:.2}", amount.abs());
    let (whole, cents) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let is_zero = whole.bytes().all(|b| b == b'0') && cents.bytes().all(|b| b == b'0');
    let sign = if amount < 0.0 && !is_zero { "-" } else { "" };
    format!("{}${}.{}", sign, grouped, cents)
}

/// 小计: 有明细时累加明细金额, 否则退回总金额
pub fn calculate_subtotal(fields: &InvoiceFields) -> f64 {
    let items = line_items(fields);
    if items.is_empty() {
        return fields
            .get(keys::TOTAL_AMOUNT)
            .and_then(parse_amount)
            .unwrap_or(0.0);
    }
    items
        .iter()
        .map(|item| item.amount().and_then(parse_amount).unwrap_or(0.0))
        .sum()
}

/// 相对时间 (月按 30 天, 年按 365 天近似); 时间戳晚于 now 时为 "recently"
pub fn time_ago(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - timestamp).num_seconds();
    if seconds < 0 {
        return RECENTLY.to_string();
    }

    let units: [(i64, &str, &str); 5] = [
        (YEAR, "a year ago", "years"),
        (MONTH, "a month ago", "months"),
        (DAY, "yesterday", "days"),
        (HOUR, "an hour ago", "hours"),
        (MINUTE, "a minute ago", "minutes"),
    ];

    for (size, singular, plural) in units {
        let interval = seconds / size;
        if interval > 1 {
            return format!("{} {} ago", interval, plural);
        }
        if interval == 1 {
            return singular.to_string();
        }
    }
    "just now".to_string()
}
