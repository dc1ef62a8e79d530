use crate::error::ArtifactError;
use anyhow::{Context, Result};
use regex::Regex;
use std::fmt;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::LazyLock;

const BUFFER_SIZE: usize = 4 * 1024 * 1024; // 4MB buffer

/// key 直接作為輸出子目錄名稱，不能含路徑分隔字元或 `..`
static REGEX_VALID_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-][A-Za-z0-9._-]{0,127}$").expect("Invalid regex"));

/// 影片內容的識別字串（通常是內容雜湊）
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ArtifactKey(String);

impl ArtifactKey {
    pub fn new(key: impl Into<String>) -> Result<Self, ArtifactError> {
        let key = key.into();
        if key.is_empty() {
            return Err(ArtifactError::InvalidKey {
                key,
                reason: "key 不可為空".to_string(),
            });
        }
        if !REGEX_VALID_KEY.is_match(&key) || key.contains("..") {
            return Err(ArtifactError::InvalidKey {
                key,
                reason: "只允許英數字、'.'、'_'、'-'，最長 128 字元".to_string(),
            });
        }
        Ok(Self(key))
    }

    /// 以 BLAKE3 計算檔案內容雜湊作為 key
    pub fn from_file(path: &Path) -> Result<Self> {
        let file = File::open(path).with_context(|| format!("無法開啟檔案: {}", path.display()))?;
        let mut reader = BufReader::with_capacity(BUFFER_SIZE, file);
        let mut hasher = blake3::Hasher::new();
        let mut buffer = vec![0u8; BUFFER_SIZE];

        loop {
            let bytes_read = reader
                .read(&mut buffer)
                .with_context(|| format!("讀取檔案失敗: {}", path.display()))?;
            if bytes_read == 0 {
                break;
            }
            hasher.update(&buffer[..bytes_read]);
        }

        Ok(Self(hasher.finalize().to_hex().to_string()))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArtifactKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for ArtifactKey {
    type Error = ArtifactError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_valid_keys() {
        assert!(ArtifactKey::new("af1349b9f5f9a1a6a0404dea36dcc949").is_ok());
        assert!(ArtifactKey::new("show-01_ep.02").is_ok());
        assert_eq!(ArtifactKey::new("abc").unwrap().as_str(), "abc");
    }

    #[test]
    fn test_invalid_keys() {
        for key in ["", "..", "a/b", "a\\b", "../etc", ".hidden", "a..b", "x y", &"a".repeat(129)] {
            let err = ArtifactKey::new(key).unwrap_err();
            assert!(
                matches!(err, ArtifactError::InvalidKey { .. }),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_same_content_same_key() {
        let mut file1 = NamedTempFile::new().unwrap();
        let mut file2 = NamedTempFile::new().unwrap();
        let mut file3 = NamedTempFile::new().unwrap();
        file1.write_all(b"identical content").unwrap();
        file2.write_all(b"identical content").unwrap();
        file3.write_all(b"other content").unwrap();

        let key1 = ArtifactKey::from_file(file1.path()).unwrap();
        let key2 = ArtifactKey::from_file(file2.path()).unwrap();
        let key3 = ArtifactKey::from_file(file3.path()).unwrap();

        assert_eq!(key1, key2);
        assert_ne!(key1, key3);
        assert_eq!(key1.as_str().len(), 64);
        // 雜湊產生的 key 本身必須是合法 key
        assert!(ArtifactKey::new(key1.as_str()).is_ok());
    }

    #[test]
    fn test_from_missing_file() {
        assert!(ArtifactKey::from_file(Path::new("/nonexistent/video.mp4")).is_err());
    }
}
