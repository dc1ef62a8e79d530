//! 影片拖曳預覽圖產生元件
//!
//! 依影片長度平均取樣縮圖，排成網格輸出 `sprite.png`，
//! 並產生對應時間區間的 `sprite.vtt`。

mod cue;
mod extractor;
mod ffmpeg_extractor;
mod generator;
mod layout;

pub use cue::{Cue, PixelRegion, build_cues, format_vtt_time, render_vtt, sprite_image_url};
pub use extractor::{FrameExtractor, SourceInfo, VideoHandle};
pub use ffmpeg_extractor::{FfmpegExtractor, FfmpegVideo};
pub use generator::{CueUrlOptions, SpriteGenerator};
pub use layout::{
    LayoutOptions, MAX_CANVAS_PIXELS, MAX_FRAME_HEIGHT, SpriteLayout, grid_dimensions, sample_count,
    scaled_width,
};
