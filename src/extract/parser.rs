use crate::error::AppError;
use crate::models::InvoiceFields;

/// 从模型原始输出中恢复 JSON 对象
///
/// 依次尝试:
/// 1. 整体严格解析
/// 2. 从每个 '{' 开始做括号配平扫描 (跟踪字符串与转义), 取第一个能解析的对象
/// 3. 第一个 '{' 到最后一个 '}' 的子串
pub fn parse_response(raw: &str) -> Result<InvoiceFields, AppError> {
    if let Ok(fields) = serde_json::from_str::<InvoiceFields>(raw.trim()) {
        return Ok(fields);
    }

    let start = raw
        .find('{')
        .ok_or_else(|| AppError::MalformedResponse("No '{' found in AI response".into()))?;
    let end = raw
        .rfind('}')
        .filter(|&end| end > start)
        .ok_or_else(|| AppError::MalformedResponse("No '}' found in AI response".into()))?;

    for (pos, _) in raw[start..].match_indices('{') {
        if let Some(span) = balanced_object_at(raw, start + pos) {
            if let Ok(fields) = serde_json::from_str::<InvoiceFields>(span) {
                return Ok(fields);
            }
        }
    }

    serde_json::from_str::<InvoiceFields>(&raw[start..=end])
        .map_err(|e| AppError::MalformedResponse(format!("Invalid JSON in AI response: {}", e)))
}

/// 从 start 处的 '{' 开始找到与之配平的 '}'
fn balanced_object_at(text: &str, start: usize) -> Option<&str> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}
