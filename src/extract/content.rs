use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::path::Path;

use crate::error::AppError;

/// 少于该数量的非空白字符视为扫描件 PDF, 整份 PDF 交给模型直接识别
const MIN_TEXT_CHARS: usize = 30;

const PDF_MEDIA_TYPE: &str = "application/pdf";

/// 允许上传的文件类型
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
    Pdf,
    Jpeg,
    Png,
}

impl FileKind {
    /// 按扩展名识别 (大小写不敏感, 可带前导 '.')
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "pdf" => Some(FileKind::Pdf),
            "jpg" | "jpeg" => Some(FileKind::Jpeg),
            "png" => Some(FileKind::Png),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(Self::from_extension)
    }

    pub fn media_type(self) -> &'static str {
        match self {
            FileKind::Pdf => PDF_MEDIA_TYPE,
            FileKind::Jpeg => "image/jpeg",
            FileKind::Png => "image/png",
        }
    }

    pub fn is_pdf(self) -> bool {
        self == FileKind::Pdf
    }

    /// 客户端声明的 Content-Type 是否在白名单内
    pub fn is_allowed_media_type(media_type: &str) -> bool {
        let essence = media_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        matches!(
            essence.as_str(),
            "image/jpeg" | "image/jpg" | "image/png" | "application/pdf"
        )
    }
}

/// 提交给模型的内容
#[derive(Debug, Clone, PartialEq)]
pub enum InvoiceContent {
    /// PDF 中抽取的纯文本
    Text(String),
    /// base64 编码的内联数据 (图片或扫描件 PDF)
    Inline { mime_type: &'static str, data: String },
}

/// 读取暂存文件并转换为模型输入
pub async fn extract_content(path: &Path, kind: FileKind) -> Result<InvoiceContent, AppError> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Extraction(format!("cannot read {}: {}", path.display(), e)))?;

    tracing::debug!(path = %path.display(), bytes = bytes.len(), kind = ?kind, "读取暂存文件");

    if !kind.is_pdf() {
        return Ok(inline(kind.media_type(), &bytes));
    }

    // pdf-extract 是同步且可能 panic 的, 放到阻塞线程池
    tokio::task::spawn_blocking(move || pdf_content(&bytes))
        .await
        .map_err(|e| AppError::Extraction(format!("PDF parser crashed: {}", e)))?
}

fn inline(mime_type: &'static str, bytes: &[u8]) -> InvoiceContent {
    InvoiceContent::Inline {
        mime_type,
        data: STANDARD.encode(bytes),
    }
}

fn pdf_content(bytes: &[u8]) -> Result<InvoiceContent, AppError> {
    let text = extract_pdf_text(bytes)?;
    let meaningful = text.chars().filter(|c| !c.is_whitespace()).count();
    if meaningful < MIN_TEXT_CHARS {
        tracing::info!(chars = meaningful, "PDF text too short, sending the document inline");
        return Ok(inline(PDF_MEDIA_TYPE, bytes));
    }
    tracing::info!(chars = meaningful, "Text extracted from PDF");
    Ok(InvoiceContent::Text(text))
}

pub fn extract_pdf_text(bytes: &[u8]) -> Result<String, AppError> {
    pdf_extract::extract_text_from_mem(bytes)
        .map_err(|e| AppError::Extraction(format!("Failed to extract PDF text: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::fixtures;
    use std::io::Write;

    #[test]
    fn test_kind_from_extension() {
        assert_eq!(FileKind::from_extension("PDF"), Some(FileKind::Pdf));
        assert_eq!(FileKind::from_extension(".jpg"), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_extension("jpeg"), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_extension("png"), Some(FileKind::Png));
        assert_eq!(FileKind::from_extension("gif"), None);
        assert_eq!(FileKind::from_path(Path::new("uploads/1-scan.JPG")), Some(FileKind::Jpeg));
        assert_eq!(FileKind::from_path(Path::new("noext")), None);
    }

    #[test]
    fn test_jpg_uses_jpeg_media_type() {
        assert_eq!(FileKind::Jpeg.media_type(), "image/jpeg");
        assert_eq!(FileKind::Png.media_type(), "image/png");
    }

    #[test]
    fn test_media_type_allow_list() {
        assert!(FileKind::is_allowed_media_type("application/pdf"));
        assert!(FileKind::is_allowed_media_type("image/PNG"));
        assert!(FileKind::is_allowed_media_type("image/jpeg; charset=binary"));
        assert!(!FileKind::is_allowed_media_type("image/gif"));
        assert!(!FileKind::is_allowed_media_type("text/plain"));
    }

    #[test]
    fn test_garbage_bytes() {
        let result = extract_pdf_text(b"this is not a pdf");
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }

    #[tokio::test]
    async fn test_image_becomes_base64_payload() {
        let mut file = tempfile::Builder::new().suffix(".png").tempfile().unwrap();
        file.write_all(b"\x89PNG fake").unwrap();

        let content = extract_content(file.path(), FileKind::Png).await.unwrap();
        assert_eq!(
            content,
            InvoiceContent::Inline {
                mime_type: "image/png",
                data: STANDARD.encode(b"\x89PNG fake"),
            }
        );
    }

    #[tokio::test]
    async fn test_corrupt_pdf_is_extraction_error() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(b"definitely not a pdf").unwrap();

        let result = extract_content(file.path(), FileKind::Pdf).await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }

    #[tokio::test]
    async fn test_text_pdf_yields_text() {
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(&fixtures::text_invoice_pdf()).unwrap();

        match extract_content(file.path(), FileKind::Pdf).await.unwrap() {
            InvoiceContent::Text(text) => {
                assert!(text.contains("INV-2024-0042"));
                assert!(text.contains("Globex"));
            }
            other => panic!("expected text, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_near_empty_pdf_is_sent_inline() {
        let bytes = fixtures::pdf_with_lines(&["p. 1"]);
        let mut file = tempfile::Builder::new().suffix(".pdf").tempfile().unwrap();
        file.write_all(&bytes).unwrap();

        let content = extract_content(file.path(), FileKind::Pdf).await.unwrap();
        assert_eq!(
            content,
            InvoiceContent::Inline {
                mime_type: "application/pdf",
                data: STANDARD.encode(&bytes),
            }
        );
    }

    #[tokio::test]
    async fn test_missing_file_is_extraction_error() {
        let result = extract_content(Path::new("/nonexistent/invoice.png"), FileKind::Png).await;
        assert!(matches!(result, Err(AppError::Extraction(_))));
    }
}
