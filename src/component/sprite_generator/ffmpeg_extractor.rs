use super::extractor::{FrameExtractor, SourceInfo, VideoHandle};
use crate::tools::get_video_info;
use anyhow::{Context, Result, bail};
use image::RgbImage;
use log::debug;
use std::path::{Path, PathBuf};
use std::process::Command;

/// 兩段式 seek 的前置緩衝時間（秒）
const SEEK_MARGIN: f64 = 2.0;

/// 以 ffprobe / ffmpeg 實作的影格擷取
#[derive(Debug, Clone, Default)]
pub struct FfmpegExtractor;

pub struct FfmpegVideo {
    path: PathBuf,
    info: SourceInfo,
}

impl FrameExtractor for FfmpegExtractor {
    type Handle = FfmpegVideo;

    fn open(&self, path: &Path) -> Result<FfmpegVideo> {
        let video_info = get_video_info(path)?;
        Ok(FfmpegVideo {
            path: path.to_path_buf(),
            info: SourceInfo {
                duration_ms: video_info.duration_ms,
                width: video_info.width,
                height: video_info.height,
            },
        })
    }
}

impl VideoHandle for FfmpegVideo {
    fn info(&self) -> SourceInfo {
        self.info
    }

    fn render_frame(&mut self, timestamp_ms: u64, width: u32, height: u32) -> Result<RgbImage> {
        let args = build_frame_args(&self.path, timestamp_ms, width, height);
        debug!("ffmpeg {}", args.join(" "));

        let output = Command::new("ffmpeg")
            .args(&args)
            .output()
            .with_context(|| format!("無法執行 ffmpeg 擷取縮圖: {}", self.path.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("ffmpeg 擷取縮圖失敗: {}", stderr.trim());
        }

        let expected = width as usize * height as usize * 3;
        if output.stdout.len() < expected {
            bail!(
                "ffmpeg 輸出不足: 需要 {expected} bytes，只有 {} bytes（時間點 {timestamp_ms} ms）",
                output.stdout.len()
            );
        }

        let mut pixels = output.stdout;
        pixels.truncate(expected);
        RgbImage::from_raw(width, height, pixels)
            .ok_or_else(|| anyhow::anyhow!("無法建立 {width}x{height} 縮圖"))
    }
}

/// 建立單張 rgb24 影格的 ffmpeg 參數
///
/// 兩段式 seek：
/// 1. `-ss` 在 `-i` 前：快速跳轉到最近的關鍵幀
/// 2. `-ss` 在 `-i` 後：精準解碼到目標時間點
fn build_frame_args(path: &Path, timestamp_ms: u64, width: u32, height: u32) -> Vec<String> {
    let timestamp = timestamp_ms as f64 / 1000.0;
    let t0 = (timestamp - SEEK_MARGIN).max(0.0);
    let delta = timestamp - t0;

    let mut args = vec![
        "-hide_banner".to_string(),
        "-loglevel".to_string(),
        "error".to_string(),
    ];

    if t0 > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{t0:.3}"));
    }

    args.push("-i".to_string());
    args.push(path.to_string_lossy().to_string());

    if delta > 0.0 {
        args.push("-ss".to_string());
        args.push(format!("{delta:.3}"));
    }

    args.extend([
        "-frames:v".to_string(),
        "1".to_string(),
        "-an".to_string(),
        "-sn".to_string(),
        "-dn".to_string(),
        "-threads".to_string(),
        "1".to_string(),
        "-vf".to_string(),
        format!("scale={width}:{height}"),
        "-f".to_string(),
        "rawvideo".to_string(),
        "-pix_fmt".to_string(),
        "rgb24".to_string(),
        "-".to_string(),
    ]);

    args
}
