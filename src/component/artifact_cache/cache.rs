use super::entry::ArtifactEntry;
use super::key::ArtifactKey;
use super::location::ArtifactLocation;
use crate::error::ArtifactError;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use log::{debug, error, info, warn};
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::thread;
use std::time::Duration;

/// 實際產生預覽圖的一方，每個 key 同時最多只會被呼叫一次
pub trait ArtifactBuilder: Send + Sync + 'static {
    /// `cancelled` 在等待逾時後變為 `true`，此時結果已不會被採用
    fn build(
        &self,
        source: &Path,
        location: &ArtifactLocation,
        cancelled: &AtomicBool,
    ) -> Result<(), ArtifactError>;
}

/// 這次請求是啟動了產生工作，還是加入既有的 entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResolveOrigin {
    Started,
    Joined,
}

/// 請求統計
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CacheStats {
    /// 收到的請求總數
    pub total_requests: u64,
    /// 等待既有 entry 的請求數
    pub coalesced_requests: u64,
    /// 觸發新產生工作的請求數
    pub new_requests: u64,
}

impl CacheStats {
    /// 合併比例 (0.0 ~ 1.0)
    #[must_use]
    pub fn coalescing_ratio(&self) -> f64 {
        if self.total_requests == 0 {
            0.0
        } else {
            self.coalesced_requests as f64 / self.total_requests as f64
        }
    }
}

/// 以內容 key 去重的預覽圖快取
///
/// 同一個 key 的並行請求只會啟動一個產生工作，其餘請求等待同一個結果。
/// 成功的 entry 永久保留；失敗的 entry 在下一次請求時重新產生。
pub struct ArtifactCache {
    entries: DashMap<ArtifactKey, Arc<ArtifactEntry>>,
    builder: Arc<dyn ArtifactBuilder>,
    output_root: PathBuf,
    timeout: Option<Duration>,
    total_requests: AtomicU64,
    coalesced_requests: AtomicU64,
    new_requests: AtomicU64,
}

impl ArtifactCache {
    pub fn new(
        builder: Arc<dyn ArtifactBuilder>,
        output_root: impl Into<PathBuf>,
        timeout: Option<Duration>,
    ) -> Self {
        Self {
            entries: DashMap::new(),
            builder,
            output_root: output_root.into(),
            timeout,
            total_requests: AtomicU64::new(0),
            coalesced_requests: AtomicU64::new(0),
            new_requests: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn output_root(&self) -> &Path {
        &self.output_root
    }

    /// 取得 `key` 的預覽圖位置，必要時產生
    pub fn resolve(&self, key: &str, source: &Path) -> Result<ArtifactLocation, ArtifactError> {
        let key = ArtifactKey::new(key)?;
        self.resolve_key(&key, source)
    }

    pub fn resolve_key(
        &self,
        key: &ArtifactKey,
        source: &Path,
    ) -> Result<ArtifactLocation, ArtifactError> {
        self.resolve_with_origin(key, source)
            .map(|(location, _)| location)
    }

    /// 與 `resolve_key` 相同，另外回傳這次請求是否啟動了產生工作
    pub fn resolve_with_origin(
        &self,
        key: &ArtifactKey,
        source: &Path,
    ) -> Result<(ArtifactLocation, ResolveOrigin), ArtifactError> {
        self.total_requests.fetch_add(1, Ordering::Relaxed);

        let (entry, origin) = self.join_or_create(key);
        if origin == ResolveOrigin::Started {
            self.spawn_generation(Arc::clone(&entry), source.to_path_buf());
        }

        let result = entry.wait(self.timeout);
        if result.is_err() {
            // 失敗不快取；工作仍在執行時保留 entry，避免同一把 key 再啟動第二個工作
            self.entries.remove_if(key, |_, current| {
                Arc::ptr_eq(current, &entry) && !current.is_running()
            });
        }
        result.map(|location| (location, origin))
    }

    /// 單一 entry 操作決定誰負責產生
    fn join_or_create(&self, key: &ArtifactKey) -> (Arc<ArtifactEntry>, ResolveOrigin) {
        match self.entries.entry(key.clone()) {
            Entry::Occupied(mut occupied) => {
                let current = occupied.get();
                if current.is_failed() && !current.is_running() {
                    let entry = self.new_entry(key);
                    occupied.insert(Arc::clone(&entry));
                    debug!("重新產生先前失敗的預覽圖: {key}");
                    (entry, ResolveOrigin::Started)
                } else {
                    if current.is_failed() {
                        debug!("逾時的產生工作尚未結束，不重新產生: {key}");
                    } else {
                        debug!("等待既有的預覽圖產生工作: {key}");
                    }
                    self.coalesced_requests.fetch_add(1, Ordering::Relaxed);
                    (Arc::clone(current), ResolveOrigin::Joined)
                }
            }
            Entry::Vacant(vacant) => {
                let entry = self.new_entry(key);
                vacant.insert(Arc::clone(&entry));
                debug!("新的預覽圖請求: {key}");
                (entry, ResolveOrigin::Started)
            }
        }
    }

    fn new_entry(&self, key: &ArtifactKey) -> Arc<ArtifactEntry> {
        self.new_requests.fetch_add(1, Ordering::Relaxed);
        Arc::new(ArtifactEntry::pending(
            key.clone(),
            ArtifactLocation::for_key(&self.output_root, key.as_str()),
        ))
    }

    /// 產生工作只持有自己的 entry，不持有整張表
    fn spawn_generation(&self, entry: Arc<ArtifactEntry>, source: PathBuf) {
        let builder = Arc::clone(&self.builder);
        let worker_entry = Arc::clone(&entry);

        let spawned = thread::Builder::new()
            .name(format!("sprite-{}", short_key(entry.key())))
            .spawn(move || {
                let result = panic::catch_unwind(AssertUnwindSafe(|| {
                    builder.build(&source, worker_entry.location(), worker_entry.cancel_flag())
                }))
                .unwrap_or_else(|payload| {
                    Err(ArtifactError::GenerationPanicked {
                        key: worker_entry.key().to_string(),
                        reason: panic_message(payload.as_ref()),
                    })
                });

                if let Err(e) = &result {
                    error!("預覽圖產生失敗 {}: {e}", worker_entry.key());
                }
                // 先標記結束，被喚醒的等待者才能移除失敗的 entry
                worker_entry.finish_run();
                if !worker_entry.settle(result) {
                    warn!("產生工作在逾時後才結束，結果不採用: {}", worker_entry.key());
                }
            });

        if let Err(e) = spawned {
            entry.finish_run();
            entry.settle(Err(ArtifactError::GenerationPanicked {
                key: entry.key().to_string(),
                reason: format!("無法建立工作執行緒: {e}"),
            }));
        }
    }

    #[must_use]
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            total_requests: self.total_requests.load(Ordering::Relaxed),
            coalesced_requests: self.coalesced_requests.load(Ordering::Relaxed),
            new_requests: self.new_requests.load(Ordering::Relaxed),
        }
    }

    /// 目前表中的 entry 數（含進行中與已完成）
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn log_stats(&self) {
        let stats = self.stats();
        info!(
            "預覽圖快取統計 - 請求: {}, 合併: {}, 新產生: {}, entry: {}, 合併率: {:.1}%",
            stats.total_requests,
            stats.coalesced_requests,
            stats.new_requests,
            self.len(),
            stats.coalescing_ratio() * 100.0
        );
    }
}

fn short_key(key: &ArtifactKey) -> &str {
    let key = key.as_str();
    key.get(..12).unwrap_or(key)
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    payload
        .downcast_ref::<&str>()
        .map(ToString::to_string)
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
