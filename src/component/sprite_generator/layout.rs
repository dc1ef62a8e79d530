//! 預覽圖版面計算
//!
//! 全部使用整數秒運算，同一部影片每次算出的版面都相同。

use anyhow::{Result, anyhow, bail};

/// 版面參數（由設定檔帶入）
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutOptions {
    /// 目標取樣間隔（秒）
    pub interval_seconds: u64,
    /// 縮圖數量上限
    pub max_frames: u64,
    /// 縮圖高度
    pub frame_height: u32,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        Self {
            interval_seconds: 10,
            max_frames: 150,
            frame_height: 144,
        }
    }
}

/// 影片長度不足一個目標間隔時改用的固定間隔
const FALLBACK_INTERVAL_SECONDS: u64 = 10;

/// 縮圖高度上限（8K）
pub const MAX_FRAME_HEIGHT: u32 = 4320;

/// 預覽圖像素上限，RGB 緩衝區約 300 MB
pub const MAX_CANVAS_PIXELS: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpriteLayout {
    pub num_frames: u64,
    pub columns: u64,
    pub rows: u64,
    pub frame_width: u32,
    pub frame_height: u32,
    pub sample_interval_seconds: u64,
    /// 影片長度（捨去到整秒）
    pub duration_seconds: u64,
    pub canvas_width: u32,
    pub canvas_height: u32,
}

impl SpriteLayout {
    pub fn compute(
        duration_ms: u64,
        source_width: u32,
        source_height: u32,
        options: &LayoutOptions,
    ) -> Result<Self> {
        let duration_seconds = duration_ms / 1000;
        if duration_seconds == 0 {
            bail!("影片太短（< 1 秒）: {duration_ms} ms");
        }
        if source_width == 0 || source_height == 0 {
            bail!("無效的影片尺寸: {source_width}x{source_height}");
        }
        if options.frame_height == 0 {
            bail!("縮圖高度必須大於 0");
        }
        if options.frame_height > MAX_FRAME_HEIGHT {
            bail!(
                "縮圖高度 {} 超過上限 {MAX_FRAME_HEIGHT}",
                options.frame_height
            );
        }

        let num_frames = sample_count(duration_seconds, options);
        let (columns, rows) = grid_dimensions(num_frames);
        let frame_width = scaled_width(options.frame_height, source_width, source_height);
        let frame_height = options.frame_height;

        let (canvas_width, canvas_height) = checked_canvas(columns, rows, frame_width, frame_height)
            .ok_or_else(|| {
                anyhow!(
                    "預覽圖過大: {columns}x{rows} 格，每格 {frame_width}x{frame_height}，上限 {MAX_CANVAS_PIXELS} 像素"
                )
            })?;

        Ok(Self {
            num_frames,
            columns,
            rows,
            frame_width,
            frame_height,
            sample_interval_seconds: duration_seconds / num_frames,
            duration_seconds,
            canvas_width,
            canvas_height,
        })
    }

    /// 第 `index` 張縮圖的取樣時間點（秒）
    #[must_use]
    pub const fn timestamp_seconds(&self, index: u64) -> u64 {
        index * self.sample_interval_seconds
    }

    /// 第 `index` 張縮圖在預覽圖中的左上角座標，依列優先排列
    #[must_use]
    pub const fn cell_origin(&self, index: u64) -> (u32, u32) {
        // index < columns * rows，座標必定落在已檢查過的畫布內
        let x = (index % self.columns) * self.frame_width as u64;
        let y = (index / self.columns) * self.frame_height as u64;
        (x as u32, y as u32)
    }

    #[must_use]
    pub const fn canvas_size(&self) -> (u32, u32) {
        (self.canvas_width, self.canvas_height)
    }
}

/// 畫布寬高，任一邊超出 `u32` 或面積超過 `MAX_CANVAS_PIXELS` 時回傳 `None`
fn checked_canvas(columns: u64, rows: u64, frame_width: u32, frame_height: u32) -> Option<(u32, u32)> {
    let width = columns.checked_mul(u64::from(frame_width))?;
    let height = rows.checked_mul(u64::from(frame_height))?;
    if width.checked_mul(height)? > MAX_CANVAS_PIXELS {
        return None;
    }
    Some((u32::try_from(width).ok()?, u32::try_from(height).ok()?))
}

/// 決定縮圖張數
///
/// 每 `interval_seconds` 取一張；影片比間隔還短時改用固定 10 秒間隔。
/// 結果限制在 `[1, max_frames]`，短片整數除法得到 0 時至少保留一張。
#[must_use]
pub fn sample_count(duration_seconds: u64, options: &LayoutOptions) -> u64 {
    let interval = if options.interval_seconds > 0 && options.interval_seconds < duration_seconds {
        options.interval_seconds
    } else {
        FALLBACK_INTERVAL_SECONDS
    };

    (duration_seconds / interval)
        .min(options.max_frames)
        .max(1)
}

/// 網格欄列數：`columns = floor(sqrt(n))`，`rows = ceil(n / columns)`
#[must_use]
pub fn grid_dimensions(num_frames: u64) -> (u64, u64) {
    let columns = num_frames.isqrt().max(1);
    let rows = num_frames.div_ceil(columns);
    (columns, rows)
}

/// 依原片比例換算縮圖寬度（四捨五入，至少 1 像素）
///
/// 超出 `u32` 時飽和為 `u32::MAX`，由畫布上限擋下。
#[must_use]
pub fn scaled_width(target_height: u32, source_width: u32, source_height: u32) -> u32 {
    let width = (u128::from(target_height) * u128::from(source_width) * 2 + u128::from(source_height))
        / (u128::from(source_height) * 2);
    u32::try_from(width).unwrap_or(u32::MAX).max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hundred_second_video() {
        let layout = SpriteLayout::compute(100_000, 1920, 1080, &LayoutOptions::default()).unwrap();

        assert_eq!(layout.num_frames, 10);
        assert_eq!(layout.columns, 3);
        assert_eq!(layout.rows, 4);
        assert_eq!(layout.sample_interval_seconds, 10);
        assert_eq!(layout.frame_height, 144);
        assert_eq!(layout.frame_width, 256);
        assert_eq!(layout.canvas_size(), (768, 576));
    }

    #[test]
    fn test_short_video_clamps_to_one_frame() {
        // 5 / 10 = 0 -> 至少一張
        let layout = SpriteLayout::compute(5_000, 640, 360, &LayoutOptions::default()).unwrap();

        assert_eq!(layout.num_frames, 1);
        assert_eq!(layout.columns, 1);
        assert_eq!(layout.rows, 1);
        assert_eq!(layout.sample_interval_seconds, 5);
    }

    #[test]
    fn test_duration_equal_to_interval_uses_fallback() {
        let options = LayoutOptions {
            interval_seconds: 30,
            ..LayoutOptions::default()
        };
        // 30 秒不大於間隔 -> 30 / 10 = 3 張
        assert_eq!(sample_count(30, &options), 3);
    }

    #[test]
    fn test_sub_second_video_is_rejected() {
        assert!(SpriteLayout::compute(999, 640, 360, &LayoutOptions::default()).is_err());
    }

    #[test]
    fn test_zero_dimensions_are_rejected() {
        assert!(SpriteLayout::compute(60_000, 640, 0, &LayoutOptions::default()).is_err());
        assert!(SpriteLayout::compute(60_000, 0, 360, &LayoutOptions::default()).is_err());
    }

    #[test]
    fn test_frame_count_is_bounded_for_long_videos() {
        let options = LayoutOptions::default();
        for hours in [1_u64, 3, 12, 240] {
            let layout =
                SpriteLayout::compute(hours * 3_600_000, 1920, 1080, &options).unwrap();
            assert!(layout.num_frames <= options.max_frames);
            assert_eq!(layout.num_frames, 150);
            // 平均分布在整部影片
            assert_eq!(layout.sample_interval_seconds, hours * 3600 / 150);
        }
    }

    #[test]
    fn test_frame_count_never_exceeds_max_for_any_duration() {
        let options = LayoutOptions {
            interval_seconds: 7,
            max_frames: 40,
            frame_height: 90,
        };
        for duration in 1..2_000 {
            let n = sample_count(duration, &options);
            assert!(n >= 1);
            assert!(n <= options.max_frames, "duration {duration} -> {n}");
        }
    }

    #[test]
    fn test_grid_invariants() {
        for n in 1..=500_u64 {
            let (columns, rows) = grid_dimensions(n);
            let expected_columns = (n as f64).sqrt().floor() as u64;
            assert_eq!(columns, expected_columns, "n = {n}");
            assert!(columns * rows >= n, "n = {n}");
            // 最後一列不會整列空白
            assert!(columns * (rows - 1) < n, "n = {n}");
        }
    }

    #[test]
    fn test_scaled_width_preserves_aspect() {
        assert_eq!(scaled_width(144, 1920, 1080), 256);
        assert_eq!(scaled_width(144, 1080, 1920), 81);
        assert_eq!(scaled_width(144, 720, 480), 216);
        // 640x272 (2.35:1) -> 338.8 -> 339
        assert_eq!(scaled_width(144, 640, 272), 339);
        assert_eq!(scaled_width(144, 1, 10_000), 1);
        assert_eq!(scaled_width(u32::MAX, u32::MAX, 1), u32::MAX);
    }

    #[test]
    fn test_oversized_frame_height_is_rejected() {
        let options = LayoutOptions {
            frame_height: 2_000_000_000,
            ..LayoutOptions::default()
        };
        assert!(SpriteLayout::compute(100_000, 1920, 1080, &options).is_err());
    }

    #[test]
    fn test_canvas_area_is_bounded() {
        // 150 張 8K 高度、超寬來源的縮圖 -> 超過像素上限
        let options = LayoutOptions {
            frame_height: MAX_FRAME_HEIGHT,
            ..LayoutOptions::default()
        };
        let err = SpriteLayout::compute(3_600_000, 7680, 1080, &options).unwrap_err();
        assert!(err.to_string().contains("預覽圖過大"));

        // 極端長寬比造成寬度溢位
        assert!(SpriteLayout::compute(100_000, u32::MAX, 1, &LayoutOptions::default()).is_err());

        // 上限內的高度仍可使用
        let options = LayoutOptions {
            frame_height: 720,
            ..LayoutOptions::default()
        };
        let layout = SpriteLayout::compute(100_000, 1280, 720, &options).unwrap();
        assert_eq!(layout.canvas_size(), (3 * 1280, 4 * 720));
    }

    #[test]
    fn test_cell_origin_is_raster_order() {
        let layout = SpriteLayout::compute(100_000, 1920, 1080, &LayoutOptions::default()).unwrap();

        assert_eq!(layout.cell_origin(0), (0, 0));
        assert_eq!(layout.cell_origin(1), (256, 0));
        assert_eq!(layout.cell_origin(2), (512, 0));
        assert_eq!(layout.cell_origin(3), (0, 144));
        assert_eq!(layout.cell_origin(9), (0, 432));
    }

    #[test]
    fn test_timestamps_are_evenly_spaced() {
        let layout = SpriteLayout::compute(125_400, 1280, 720, &LayoutOptions::default()).unwrap();

        assert_eq!(layout.duration_seconds, 125);
        assert_eq!(layout.num_frames, 12);
        assert_eq!(layout.sample_interval_seconds, 10);
        assert_eq!(layout.timestamp_seconds(0), 0);
        assert_eq!(layout.timestamp_seconds(11), 110);
    }
}
