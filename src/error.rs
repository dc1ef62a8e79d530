//! 預覽圖產生流程的錯誤分類
//!
//! 同一個錯誤值會交給所有等待同一把 key 的呼叫者，因此必須可以 `Clone`，
//! 底層的 `io::Error` / `anyhow::Error` 一律先格式化成字串。

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ArtifactError {
    #[error("無效的 artifact key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    #[error("無法讀取影片 {}: {reason}", .path.display())]
    SourceUnreadable { path: PathBuf, reason: String },

    #[error("第 {index} 張縮圖擷取失敗 (時間點 {timestamp_ms} ms): {reason}")]
    RenderFailure {
        index: usize,
        timestamp_ms: u64,
        reason: String,
    },

    #[error("無法寫入 {}: {reason}", .path.display())]
    WriteFailure { path: PathBuf, reason: String },

    #[error("預覽圖產生逾時 ({key}，超過 {} 秒)", .limit.as_secs())]
    Timeout { key: String, limit: Duration },

    #[error("預覽圖產生程序異常終止 ({key}): {reason}")]
    GenerationPanicked { key: String, reason: String },

    #[error("預覽圖產生已取消: {}", .path.display())]
    Cancelled { path: PathBuf },
}

impl ArtifactError {
    pub(crate) fn write_failure(path: impl Into<PathBuf>, err: impl std::fmt::Display) -> Self {
        Self::WriteFailure {
            path: path.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn source_unreadable(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::SourceUnreadable {
            path: path.into(),
            reason: format!("{err:#}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_is_cloned_verbatim() {
        let err = ArtifactError::RenderFailure {
            index: 3,
            timestamp_ms: 30_000,
            reason: "decoder stalled".to_string(),
        };
        let copy = err.clone();
        assert_eq!(err, copy);
        assert_eq!(err.to_string(), copy.to_string());
    }

    #[test]
    fn test_source_unreadable_keeps_context_chain() {
        let inner = anyhow::anyhow!("moov atom not found").context("ffprobe 執行失敗");
        let err = ArtifactError::source_unreadable("/videos/a.mp4", &inner);
        let ArtifactError::SourceUnreadable { reason, .. } = err else {
            panic!("unexpected variant");
        };
        assert!(reason.contains("ffprobe 執行失敗"));
        assert!(reason.contains("moov atom not found"));
    }
}
