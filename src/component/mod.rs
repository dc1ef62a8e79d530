//! 功能元件模組
//!
//! `artifact_cache` 與 `sprite_generator` 是預覽圖核心，
//! `sprite_preview` 是互動式的批次介面

pub mod artifact_cache;
pub mod sprite_generator;
pub mod sprite_preview;

pub use artifact_cache::ArtifactCache;
pub use sprite_generator::SpriteGenerator;
pub use sprite_preview::SpritePreviewGenerator;
