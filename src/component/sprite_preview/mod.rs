//! 批次預覽圖產生元件
//!
//! 流程：
//! A. 掃描影片資料夾
//! B. 計算內容雜湊作為 key
//! C. 交給快取產生（同內容只產生一次）
//! D. 輸出摘要

mod main;

pub use main::{GenerationResult, SpritePreviewGenerator};
