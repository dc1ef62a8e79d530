use crate::component::sprite_generator::LayoutOptions;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 最近使用路徑的保留數量
pub const MAX_RECENT_PATHS: usize = 10;

/// 介面語言
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    #[serde(rename = "zh-TW")]
    ZhTw,
    #[serde(rename = "en-US")]
    EnUs,
}

impl Language {
    pub const ALL: [Self; 2] = [Self::ZhTw, Self::EnUs];

    /// 對應 `locales/` 下的檔名
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ZhTw => "zh-TW",
            Self::EnUs => "en-US",
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ZhTw => write!(f, "繁體中文"),
            Self::EnUs => write!(f, "English"),
        }
    }
}

/// 預覽圖設定（對應 settings.json）
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SpriteSettings {
    /// 目標取樣間隔（秒）
    pub interval_seconds: u64,
    /// 每部影片最多幾張縮圖，設太高會讓長片的處理時間失控
    pub max_frames: u64,
    /// 縮圖高度（像素），寬度依原片比例換算
    pub frame_height: u32,
    /// 預覽圖輸出根目錄，每部影片一個 `<key>` 子目錄
    pub output_root: PathBuf,
    /// VTT 內圖片網址的前綴
    pub url_prefix: String,
    /// VTT 內圖片網址的最後一段
    pub image_route: String,
    /// 單次產生的逾時秒數，`None` 表示不設限
    pub generation_timeout_seconds: Option<u64>,
    /// 批次模式同時處理的影片數
    pub max_parallel_videos: usize,
    /// 視為影片的副檔名（含前導點）
    pub video_extensions: Vec<String>,
    pub recent_paths: Vec<String>,
    pub language: Language,
}

impl Default for SpriteSettings {
    fn default() -> Self {
        Self {
            interval_seconds: 10,
            max_frames: 150,
            frame_height: 144,
            output_root: PathBuf::from("metadata"),
            url_prefix: "/video".to_string(),
            image_route: "thumbnails.png".to_string(),
            generation_timeout_seconds: Some(600),
            max_parallel_videos: 4,
            video_extensions: [".mp4", ".mkv", ".avi", ".mov", ".webm", ".m4v", ".ts", ".wmv"]
                .iter()
                .map(ToString::to_string)
                .collect(),
            recent_paths: Vec::new(),
            language: Language::default(),
        }
    }
}

impl SpriteSettings {
    #[must_use]
    pub fn layout_options(&self) -> LayoutOptions {
        LayoutOptions {
            interval_seconds: self.interval_seconds,
            max_frames: self.max_frames,
            frame_height: self.frame_height,
        }
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.generation_timeout_seconds.map(Duration::from_secs)
    }

    #[must_use]
    pub fn video_extensions_set(&self) -> HashSet<String> {
        self.video_extensions
            .iter()
            .map(|ext| ext.to_lowercase())
            .collect()
    }

    #[must_use]
    pub fn is_video_file(&self, path: &Path) -> bool {
        let video_extensions = self.video_extensions_set();
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| video_extensions.contains(&format!(".{}", ext.to_lowercase())))
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub settings: SpriteSettings,
}
