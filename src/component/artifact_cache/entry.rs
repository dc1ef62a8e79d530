use super::key::ArtifactKey;
use super::location::ArtifactLocation;
use crate::error::ArtifactError;
use parking_lot::{Condvar, Mutex};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryState {
    Pending,
    Ready,
    Failed(ArtifactError),
}

/// 單一 key 的產生狀態
///
/// 狀態只會從 `Pending` 轉為 `Ready` 或 `Failed` 一次；
/// 等待者在同一把鎖下檢查狀態，不會錯過通知。
///
/// `running` 在產生工作真正結束前保持為 `true`，即使 entry 已因逾時而失敗；
/// 快取以此避免同一把 key 同時有兩個產生工作。
#[derive(Debug)]
pub struct ArtifactEntry {
    key: ArtifactKey,
    location: ArtifactLocation,
    state: Mutex<EntryState>,
    settled: Condvar,
    started_at: Instant,
    running: AtomicBool,
    cancelled: AtomicBool,
}

impl ArtifactEntry {
    pub(crate) fn pending(key: ArtifactKey, location: ArtifactLocation) -> Self {
        Self {
            key,
            location,
            state: Mutex::new(EntryState::Pending),
            settled: Condvar::new(),
            started_at: Instant::now(),
            running: AtomicBool::new(true),
            cancelled: AtomicBool::new(false),
        }
    }

    #[must_use]
    pub const fn key(&self) -> &ArtifactKey {
        &self.key
    }

    #[must_use]
    pub const fn location(&self) -> &ArtifactLocation {
        &self.location
    }

    #[must_use]
    pub fn state(&self) -> EntryState {
        self.state.lock().clone()
    }

    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(*self.state.lock(), EntryState::Failed(_))
    }

    /// 產生工作是否仍在執行（逾時後也可能仍在執行）
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// 逾時後設為 `true`，產生工作應盡快放棄
    pub(crate) fn cancel_flag(&self) -> &AtomicBool {
        &self.cancelled
    }

    /// 產生工作結束（不論成功、失敗或 panic）
    pub(crate) fn finish_run(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    /// 寫入最終結果並喚醒所有等待者；已完成的 entry 不會被覆寫
    pub(crate) fn settle(&self, result: Result<(), ArtifactError>) -> bool {
        let mut state = self.state.lock();
        if *state != EntryState::Pending {
            return false;
        }

        *state = match result {
            Ok(()) => EntryState::Ready,
            Err(e) => EntryState::Failed(e),
        };
        self.settled.notify_all();
        true
    }

    /// 等待產生結束
    ///
    /// 有設定 `timeout` 時，期限從 entry 建立開始計算；
    /// 逾時仍未完成的 entry 會被標記為 `Timeout` 失敗並通知其他等待者。
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> Result<ArtifactLocation, ArtifactError> {
        let deadline = timeout.map(|limit| (self.started_at + limit, limit));
        let mut state = self.state.lock();

        loop {
            match &*state {
                EntryState::Ready => return Ok(self.location.clone()),
                EntryState::Failed(e) => return Err(e.clone()),
                EntryState::Pending => {}
            }

            match deadline {
                None => self.settled.wait(&mut state),
                Some((at, limit)) => {
                    if self.settled.wait_until(&mut state, at).timed_out()
                        && *state == EntryState::Pending
                    {
                        *state = EntryState::Failed(ArtifactError::Timeout {
                            key: self.key.to_string(),
                            limit,
                        });
                        self.cancelled.store(true, Ordering::SeqCst);
                        self.settled.notify_all();
                    }
                }
            }
        }
    }
}
