//! 預覽圖快取
//!
//! 以影片內容 key 為索引的單次產生（single-flight）快取：
//! 同一 key 的並行請求共用同一個產生工作與結果。

mod cache;
mod entry;
mod key;
mod location;

pub use cache::{ArtifactBuilder, ArtifactCache, CacheStats, ResolveOrigin};
pub use entry::{ArtifactEntry, EntryState};
pub use key::ArtifactKey;
pub use location::{ArtifactLocation, CUE_FILE_NAME, SPRITE_FILE_NAME};
