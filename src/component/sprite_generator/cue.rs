//! WebVTT 縮圖對照表
//!
//! 每張縮圖對應一段 `[start, end)` 時間區間，以及它在預覽圖上的像素範圍。

use super::layout::SpriteLayout;
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use std::fmt::Write;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub w: u32,
    pub h: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cue {
    pub start_ms: u64,
    pub end_ms: u64,
    pub region: PixelRegion,
}

/// 依版面產生所有 cue
///
/// 最後一段結束於影片長度（整秒），整體涵蓋 `[0, duration)` 且不重疊。
#[must_use]
pub fn build_cues(layout: &SpriteLayout) -> Vec<Cue> {
    (0..layout.num_frames)
        .map(|i| {
            let start = layout.timestamp_seconds(i);
            let end = if i + 1 == layout.num_frames {
                layout.duration_seconds
            } else {
                layout.timestamp_seconds(i + 1)
            };
            let (x, y) = layout.cell_origin(i);

            Cue {
                start_ms: start * 1000,
                end_ms: end * 1000,
                region: PixelRegion {
                    x,
                    y,
                    w: layout.frame_width,
                    h: layout.frame_height,
                },
            }
        })
        .collect()
}

/// 毫秒轉成 `HH:MM:SS.mmm`
#[must_use]
pub fn format_vtt_time(ms: u64) -> String {
    let total_seconds = ms / 1000;
    format!(
        "{:02}:{:02}:{:02}.{:03}",
        total_seconds / 3600,
        (total_seconds / 60) % 60,
        total_seconds % 60,
        ms % 1000
    )
}

/// 預覽圖在 API 上的網址：`<prefix>/<base64url(來源路徑)>/<route>`
///
/// 來源路徑以 URL-safe、無 padding 的 base64（`-`、`_`）編碼，
/// 解析這段網址的一方必須用相同字母表解碼，標準 base64 的 `+`、`/`、`=` 不會出現。
#[must_use]
pub fn sprite_image_url(url_prefix: &str, image_route: &str, source: &Path) -> String {
    let source_ref = URL_SAFE_NO_PAD.encode(source.to_string_lossy().as_bytes());
    format!(
        "{}/{}/{}",
        url_prefix.trim_end_matches('/'),
        source_ref,
        image_route.trim_start_matches('/')
    )
}

#[must_use]
pub fn render_vtt(cues: &[Cue], image_url: &str) -> String {
    let mut vtt = String::from("WEBVTT\n\n");
    for cue in cues {
        // 寫入 String 不會失敗
        let _ = write!(
            vtt,
            "{} --> {}\n{}#xywh={},{},{},{}\n\n",
            format_vtt_time(cue.start_ms),
            format_vtt_time(cue.end_ms),
            image_url,
            cue.region.x,
            cue.region.y,
            cue.region.w,
            cue.region.h,
        );
    }
    vtt
}
