use super::cue::{build_cues, render_vtt, sprite_image_url};
use super::extractor::{FrameExtractor, VideoHandle};
use super::layout::{LayoutOptions, SpriteLayout};
use crate::component::artifact_cache::{ArtifactBuilder, ArtifactLocation};
use crate::error::ArtifactError;
use image::imageops::{self, FilterType};
use image::{ImageFormat, Rgb, RgbImage};
use log::{debug, info, warn};
use std::fs;
use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tempfile::NamedTempFile;

/// VTT 內網址的組成設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CueUrlOptions {
    pub url_prefix: String,
    pub image_route: String,
}

impl Default for CueUrlOptions {
    fn default() -> Self {
        Self {
            url_prefix: "/video".to_string(),
            image_route: "thumbnails.png".to_string(),
        }
    }
}

/// 預覽圖產生器
///
/// 流程：
/// 0. 輸出目錄已有完整結果則直接返回
/// 1. 開啟影片取得長度與尺寸
/// 2. 計算取樣張數與網格
/// 3. 依序擷取縮圖並貼到黑底畫布
/// 4. 產生 VTT
/// 5. 先寫 VTT 再寫 PNG，兩者都成功才算完成
pub struct SpriteGenerator<E> {
    extractor: E,
    layout_options: LayoutOptions,
    url_options: CueUrlOptions,
}

impl<E: FrameExtractor> SpriteGenerator<E> {
    pub const fn new(extractor: E, layout_options: LayoutOptions, url_options: CueUrlOptions) -> Self {
        Self {
            extractor,
            layout_options,
            url_options,
        }
    }

    pub fn generate(&self, source: &Path, output_dir: &Path) -> Result<(), ArtifactError> {
        self.generate_cancellable(source, output_dir, &AtomicBool::new(false))
    }

    /// `cancelled` 變為 `true` 後，在下一張縮圖前放棄，不寫入任何檔案
    pub fn generate_cancellable(
        &self,
        source: &Path,
        output_dir: &Path,
        cancelled: &AtomicBool,
    ) -> Result<(), ArtifactError> {
        let location = ArtifactLocation::new(output_dir);
        if location.is_complete() {
            debug!("預覽圖已存在，跳過: {}", location.sprite_path.display());
            return Ok(());
        }

        let started = Instant::now();

        let mut video = self
            .extractor
            .open(source)
            .map_err(|e| ArtifactError::source_unreadable(source, &e))?;
        let source_info = video.info();

        let layout = SpriteLayout::compute(
            source_info.duration_ms,
            source_info.width,
            source_info.height,
            &self.layout_options,
        )
        .map_err(|e| ArtifactError::source_unreadable(source, &e))?;

        info!(
            "擷取 {} 張縮圖 ({}x{} 格，間隔 {}s): {}",
            layout.num_frames,
            layout.columns,
            layout.rows,
            layout.sample_interval_seconds,
            source.display()
        );

        let sprite = render_sprite(&mut video, &layout, source, cancelled)?;
        // 寫檔前先關閉影片
        drop(video);
        if cancelled.load(Ordering::SeqCst) {
            return Err(ArtifactError::Cancelled {
                path: source.to_path_buf(),
            });
        }

        let image_url = sprite_image_url(
            &self.url_options.url_prefix,
            &self.url_options.image_route,
            source,
        );
        let vtt = render_vtt(&build_cues(&layout), &image_url);

        commit(&location, &vtt, &sprite)?;

        info!(
            "預覽圖已建立 ({} ms): {}",
            started.elapsed().as_millis(),
            location.dir.display()
        );
        Ok(())
    }
}

impl<E: FrameExtractor + 'static> ArtifactBuilder for SpriteGenerator<E> {
    fn build(
        &self,
        source: &Path,
        location: &ArtifactLocation,
        cancelled: &AtomicBool,
    ) -> Result<(), ArtifactError> {
        self.generate_cancellable(source, &location.dir, cancelled)
    }
}

fn render_sprite<H: VideoHandle>(
    video: &mut H,
    layout: &SpriteLayout,
    source: &Path,
    cancelled: &AtomicBool,
) -> Result<RgbImage, ArtifactError> {
    let (canvas_width, canvas_height) = layout.canvas_size();
    let mut sprite = RgbImage::from_pixel(canvas_width, canvas_height, Rgb([0, 0, 0]));

    for i in 0..layout.num_frames {
        if cancelled.load(Ordering::SeqCst) {
            debug!("產生已取消，停在第 {i} 張縮圖");
            return Err(ArtifactError::Cancelled {
                path: source.to_path_buf(),
            });
        }
        let timestamp_ms = layout.timestamp_seconds(i) * 1000;
        let frame = video
            .render_frame(timestamp_ms, layout.frame_width, layout.frame_height)
            .map_err(|e| ArtifactError::RenderFailure {
                index: i as usize,
                timestamp_ms,
                reason: format!("{e:#}"),
            })?;

        let frame = if frame.dimensions() == (layout.frame_width, layout.frame_height) {
            frame
        } else {
            imageops::resize(&frame, layout.frame_width, layout.frame_height, FilterType::Triangle)
        };

        let (x, y) = layout.cell_origin(i);
        imageops::replace(&mut sprite, &frame, i64::from(x), i64::from(y));
        debug!("縮圖 {i} @ {timestamp_ms} ms -> ({x}, {y})");
    }

    Ok(sprite)
}

/// 寫入暫存檔後改名，PNG 最後落地，存在即代表 VTT 也已完成
fn commit(location: &ArtifactLocation, vtt: &str, sprite: &RgbImage) -> Result<(), ArtifactError> {
    fs::create_dir_all(&location.dir).map_err(|e| ArtifactError::write_failure(&location.dir, e))?;

    let mut cue_file = NamedTempFile::new_in(&location.dir)
        .map_err(|e| ArtifactError::write_failure(&location.dir, e))?;
    cue_file
        .write_all(vtt.as_bytes())
        .and_then(|()| cue_file.as_file().sync_all())
        .map_err(|e| ArtifactError::write_failure(&location.cue_path, e))?;
    cue_file
        .persist(&location.cue_path)
        .map_err(|e| ArtifactError::write_failure(&location.cue_path, e))?;

    if let Err(e) = write_sprite(location, sprite) {
        if let Err(cleanup) = fs::remove_file(&location.cue_path) {
            warn!("無法清理 VTT {}: {cleanup}", location.cue_path.display());
        }
        return Err(e);
    }

    Ok(())
}

fn write_sprite(location: &ArtifactLocation, sprite: &RgbImage) -> Result<(), ArtifactError> {
    let mut sprite_file = NamedTempFile::new_in(&location.dir)
        .map_err(|e| ArtifactError::write_failure(&location.dir, e))?;
    sprite
        .write_to(sprite_file.as_file_mut(), ImageFormat::Png)
        .map_err(|e| ArtifactError::write_failure(&location.sprite_path, e))?;
    sprite_file
        .as_file()
        .sync_all()
        .map_err(|e| ArtifactError::write_failure(&location.sprite_path, e))?;
    sprite_file
        .persist(&location.sprite_path)
        .map_err(|e| ArtifactError::write_failure(&location.sprite_path, e))?;
    Ok(())
}
