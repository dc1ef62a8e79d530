use crate::component::artifact_cache::{
    ArtifactCache, ArtifactKey, ArtifactLocation, ResolveOrigin,
};
use crate::component::sprite_generator::{CueUrlOptions, FfmpegExtractor, SpriteGenerator};
use crate::config::Config;
use crate::config::save::{add_recent_path, save_settings};
use crate::tools::{
    VideoFileInfo, ensure_directory_exists, scan_video_files, validate_directory_exists,
};
use anyhow::{Context, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, info, warn};
use rayon::prelude::*;
use rust_i18n::t;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

/// 批次產生結果
#[derive(Debug, Default, PartialEq, Eq)]
pub struct GenerationResult {
    pub total_videos: usize,
    pub generated: usize,
    pub cached: usize,
    pub failed: usize,
}

/// 批次預覽圖產生
///
/// 掃描資料夾內的影片，以內容雜湊為 key 交給共用的快取，
/// 同內容的影片只會產生一次。
pub struct SpritePreviewGenerator {
    config: Config,
    shutdown_signal: Arc<AtomicBool>,
}

impl SpritePreviewGenerator {
    pub const fn new(config: Config, shutdown_signal: Arc<AtomicBool>) -> Self {
        Self {
            config,
            shutdown_signal,
        }
    }

    /// 以設定建立 ffmpeg 版本的快取
    #[must_use]
    pub fn build_cache(config: &Config) -> ArtifactCache {
        let settings = &config.settings;
        let generator = SpriteGenerator::new(
            FfmpegExtractor,
            settings.layout_options(),
            CueUrlOptions {
                url_prefix: settings.url_prefix.clone(),
                image_route: settings.image_route.clone(),
            },
        );
        ArtifactCache::new(
            Arc::new(generator),
            settings.output_root.clone(),
            settings.timeout(),
        )
    }

    pub fn run(&mut self) -> Result<()> {
        println!("{}", style(t!("sprite.title")).cyan().bold());

        let input_path = self.prompt_input_path()?;
        let input_dir = PathBuf::from(&input_path);
        validate_directory_exists(&input_dir)?;

        let output_root = self.config.settings.output_root.clone();
        ensure_directory_exists(&output_root)?;

        println!("{}", style(t!("sprite.scanning")).dim());
        let video_files = scan_video_files(&input_dir, &self.config.settings)?;

        add_recent_path(&mut self.config.settings, &input_path);
        if let Err(e) = save_settings(&self.config.settings) {
            warn!("無法儲存設定: {e:#}");
        }

        if video_files.is_empty() {
            println!("{}", style(t!("sprite.no_videos")).yellow());
            return Ok(());
        }

        println!(
            "{}",
            style(t!(
                "sprite.found",
                count = video_files.len(),
                output = output_root.display()
            ))
            .green()
        );

        let cache = Self::build_cache(&self.config);
        let result = self.process_videos(&video_files, &cache)?;
        cache.log_stats();

        self.print_summary(&result);
        Ok(())
    }

    fn prompt_input_path(&self) -> Result<String> {
        let recent = &self.config.settings.recent_paths;
        if !recent.is_empty() {
            let mut options: Vec<String> = recent.clone();
            options.push(t!("sprite.other_path").to_string());

            let selection = Select::with_theme(&ColorfulTheme::default())
                .with_prompt(t!("sprite.pick_folder"))
                .items(&options)
                .default(0)
                .interact()?;

            if selection < recent.len() {
                return Ok(recent[selection].clone());
            }
        }

        let path: String = Input::new()
            .with_prompt(t!("sprite.enter_folder"))
            .interact_text()?;
        Ok(path.trim().to_string())
    }

    /// 平行處理影片，同時進行的數量由 `max_parallel_videos` 限制
    pub fn process_videos(
        &self,
        videos: &[VideoFileInfo],
        cache: &ArtifactCache,
    ) -> Result<GenerationResult> {
        let generated = AtomicUsize::new(0);
        let cached = AtomicUsize::new(0);
        let failed = AtomicUsize::new(0);

        let progress_bar = ProgressBar::new(videos.len() as u64);
        progress_bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta}) {msg}")
                .context("Invalid progress bar template")?
                .progress_chars("#>-"),
        );
        progress_bar.set_message(t!("sprite.progress").to_string());

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(self.config.settings.max_parallel_videos.max(1))
            .build()
            .context("無法建立執行緒池")?;

        pool.install(|| {
            videos.par_iter().for_each(|video| {
                if self.shutdown_signal.load(Ordering::SeqCst) {
                    return;
                }

                let counter = match Self::process_single_video(video, cache) {
                    Ok(true) => &cached,
                    Ok(false) => &generated,
                    Err(e) => {
                        error!("處理影片失敗 {}: {e:#}", video.path.display());
                        progress_bar.println(format!(
                            "  {} {}: {e:#}",
                            style("✗").red(),
                            video.path.display()
                        ));
                        &failed
                    }
                };
                counter.fetch_add(1, Ordering::Relaxed);
                progress_bar.inc(1);
            });
        });

        if self.shutdown_signal.load(Ordering::SeqCst) {
            warn!("收到中斷訊號，停止處理");
            progress_bar.abandon_with_message(t!("sprite.interrupted").to_string());
        } else {
            progress_bar.finish_with_message(t!("sprite.done").to_string());
        }

        Ok(GenerationResult {
            total_videos: videos.len(),
            generated: generated.into_inner(),
            cached: cached.into_inner(),
            failed: failed.into_inner(),
        })
    }

    /// 回傳 `true` 表示預覽圖原本就存在，或由同內容的另一個影片產生
    fn process_single_video(video: &VideoFileInfo, cache: &ArtifactCache) -> Result<bool> {
        let key = ArtifactKey::from_file(&video.path)?;
        let already_done =
            ArtifactLocation::for_key(cache.output_root(), key.as_str()).is_complete();

        let (location, origin) = cache.resolve_with_origin(&key, &video.path)?;
        info!(
            "預覽圖就緒 {} -> {}",
            video.path.display(),
            location.dir.display()
        );
        Ok(already_done || origin == ResolveOrigin::Joined)
    }

    fn print_summary(&self, result: &GenerationResult) {
        println!();
        println!("{}", style(t!("sprite.summary_title")).cyan().bold());
        println!("  {}", t!("sprite.summary_total", count = result.total_videos));
        println!(
            "  {}",
            style(t!("sprite.summary_generated", count = result.generated)).green()
        );

        if result.cached > 0 {
            println!(
                "  {}",
                style(t!("sprite.summary_cached", count = result.cached)).yellow()
            );
        }

        if result.failed > 0 {
            println!(
                "  {}",
                style(t!("sprite.summary_failed", count = result.failed)).red()
            );
        }

        info!(
            "預覽圖產生完成 - 新產生: {}, 已存在: {}, 失敗: {}",
            result.generated, result.cached, result.failed
        );
    }
}
