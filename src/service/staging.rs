use chrono::Utc;
use std::io::Write;
use std::path::Path;
use tempfile::TempPath;

use crate::error::AppError;

/// 暂存在磁盘上的上传文件
///
/// 文件由 `TempPath` 持有: 正常流程调用 `discard`, 提前返回或 panic 时在 drop 中删除.
#[derive(Debug)]
pub struct StagedUpload {
    path: TempPath,
    pub original_filename: String,
}

impl StagedUpload {
    /// 写入 <dir>/<毫秒时间戳>-<随机串>-<文件名>
    pub async fn stage(dir: &Path, original_filename: &str, bytes: &[u8]) -> Result<Self, AppError> {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::Internal(format!("cannot create staging dir {}: {}", dir.display(), e)))?;

        let prefix = format!("{}-", Utc::now().timestamp_millis());
        let suffix = format!("-{}", safe_file_name(original_filename));
        let dir = dir.to_path_buf();
        let bytes = bytes.to_vec();

        let path = tokio::task::spawn_blocking(move || -> std::io::Result<TempPath> {
            let mut file = tempfile::Builder::new()
                .prefix(&prefix)
                .suffix(&suffix)
                .rand_bytes(6)
                .tempfile_in(&dir)?;
            file.write_all(&bytes)?;
            file.flush()?;
            Ok(file.into_temp_path())
        })
        .await
        .map_err(|e| AppError::Internal(format!("staging task failed: {}", e)))?
        .map_err(|e| AppError::Internal(format!("cannot stage {}: {}", original_filename, e)))?;

        tracing::debug!(path = %path.display(), "Upload staged");
        Ok(Self {
            path,
            original_filename: original_filename.to_string(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 删除暂存文件; 失败只记日志
    pub async fn discard(self) {
        let path = self.path.to_path_buf();
        let result = tokio::task::spawn_blocking(move || self.path.close()).await;
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::warn!(path = %path.display(), error = %e, "File cleanup error"),
            Err(e) => tracing::warn!(path = %path.display(), error = %e, "File cleanup task failed"),
        }
    }
}

/// 只保留最后一段文件名, 非常规字符替换为 '_'
fn safe_file_name(name: &str) -> String {
    let base = Path::new(name)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    base.chars()
        .map(|c| if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') { c } else { '_' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_file_name() {
        assert_eq!(safe_file_name("invoice 01.pdf"), "invoice_01.pdf");
        assert_eq!(safe_file_name("../../etc/passwd.png"), "passwd.png");
        assert_eq!(safe_file_name(".."), "upload");
    }

    #[tokio::test]
    async fn test_stage_and_discard() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::stage(dir.path(), "scan.png", b"png").await.unwrap();

        assert!(staged.path().starts_with(dir.path()));
        assert!(staged.path().to_string_lossy().ends_with("-scan.png"));
        assert_eq!(tokio::fs::read(staged.path()).await.unwrap(), b"png");

        let path = staged.path().to_path_buf();
        staged.discard().await;
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_same_name_uploads_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let first = StagedUpload::stage(dir.path(), "scan.png", b"first").await.unwrap();
        let second = StagedUpload::stage(dir.path(), "scan.png", b"second").await.unwrap();
        assert_ne!(first.path(), second.path());

        first.discard().await;
        assert_eq!(tokio::fs::read(second.path()).await.unwrap(), b"second");
    }

    #[tokio::test]
    async fn test_drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let staged = StagedUpload::stage(dir.path(), "scan.pdf", b"%PDF").await.unwrap();
        let path = staged.path().to_path_buf();

        drop(staged);
        assert!(!path.exists());
    }
}
