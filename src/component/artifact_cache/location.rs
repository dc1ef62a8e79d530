use std::path::{Path, PathBuf};

pub const SPRITE_FILE_NAME: &str = "sprite.png";
pub const CUE_FILE_NAME: &str = "sprite.vtt";

/// 一部影片的預覽圖輸出位置：`<dir>/sprite.png` 與 `<dir>/sprite.vtt`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactLocation {
    pub dir: PathBuf,
    pub sprite_path: PathBuf,
    pub cue_path: PathBuf,
}

impl ArtifactLocation {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        Self {
            sprite_path: dir.join(SPRITE_FILE_NAME),
            cue_path: dir.join(CUE_FILE_NAME),
            dir,
        }
    }

    #[must_use]
    pub fn for_key(output_root: &Path, key: &str) -> Self {
        Self::new(output_root.join(key))
    }

    /// PNG 最後寫入，兩個檔案都在才算完成
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.sprite_path.is_file() && self.cue_path.is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_paths_derive_from_key() {
        let location = ArtifactLocation::for_key(Path::new("/srv/metadata"), "abc123");
        assert_eq!(location.dir, PathBuf::from("/srv/metadata/abc123"));
        assert_eq!(location.sprite_path, PathBuf::from("/srv/metadata/abc123/sprite.png"));
        assert_eq!(location.cue_path, PathBuf::from("/srv/metadata/abc123/sprite.vtt"));
    }

    #[test]
    fn test_is_complete_requires_both_files() {
        let dir = tempdir().unwrap();
        let location = ArtifactLocation::new(dir.path());
        assert!(!location.is_complete());

        std::fs::write(&location.cue_path, "WEBVTT\n\n").unwrap();
        assert!(!location.is_complete());

        std::fs::write(&location.sprite_path, b"png").unwrap();
        assert!(location.is_complete());
    }
}
