//! 影格擷取能力的介面
//!
//! 產生器只透過這兩個 trait 讀取影片；關閉影片即 drop handle。

use anyhow::Result;
use image::RgbImage;
use std::path::Path;

/// 開啟影片後取得的基本資訊
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceInfo {
    pub duration_ms: u64,
    pub width: u32,
    pub height: u32,
}

pub trait FrameExtractor: Send + Sync {
    type Handle: VideoHandle;

    fn open(&self, path: &Path) -> Result<Self::Handle>;
}

pub trait VideoHandle {
    fn info(&self) -> SourceInfo;

    /// 擷取 `timestamp_ms` 的畫面並縮放為 `width`x`height`
    fn render_frame(&mut self, timestamp_ms: u64, width: u32, height: u32) -> Result<RgbImage>;
}
