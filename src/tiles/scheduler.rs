use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use crossbeam_channel::{unbounded, Receiver, Sender};
use futures::future::{AbortHandle, AbortRegistration, Abortable};

use crate::{
    core::constants::MAX_FETCHERS,
    prelude::HashMap,
    runtime::AsyncSpawner,
    tiles::{cache::TileCache, loader::ImageLoader},
    MapError,
};

/// Which cache a finished fetch lands in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheTarget {
    Tile,
    Icon,
}

/// Counters for fetch activity, mostly useful for diagnostics and tests
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    pub started: u64,
    pub loaded: u64,
    pub failed: u64,
    /// Completions thrown away because their fetch had been cancelled
    pub discarded: u64,
}

/// Callback used to wake the host when a completion is waiting
pub type FetchWaker = Arc<dyn Fn() + Send + Sync>;

#[derive(Debug, Clone)]
struct FetchRequest {
    url: String,
    target: CacheTarget,
}

/// Validity token shared between the scheduler and one running fetch task.
///
/// Invalidating also aborts the load, so a hung request gives its worker
/// back straight away.
#[derive(Debug, Clone)]
struct FetchHandle {
    valid: Arc<AtomicBool>,
    abort: AbortHandle,
}

impl FetchHandle {
    fn new() -> (Self, AbortRegistration) {
        let (abort, registration) = AbortHandle::new_pair();
        let handle = Self {
            valid: Arc::new(AtomicBool::new(true)),
            abort,
        };
        (handle, registration)
    }

    fn is_valid(&self) -> bool {
        self.valid.load(Ordering::Acquire)
    }

    fn invalidate(&self) {
        self.valid.store(false, Ordering::Release);
        self.abort.abort();
    }
}

enum FetchOutcome<B> {
    Loaded(B),
    Failed(MapError),
    /// Cancelled before or while loading
    Skipped,
}

struct Completion<B> {
    url: String,
    target: CacheTarget,
    outcome: FetchOutcome<B>,
}

/// Bounded pool of fetch workers fed from a per-frame miss list.
///
/// Every frame the renderer calls [`begin_frame`](Self::begin_frame), reports
/// each cache miss with [`request`](Self::request) and closes with
/// [`end_frame`](Self::end_frame). At most `max_workers` fetches run at once;
/// each worker picks a random pending miss, and when its fetch completes it
/// pulls the next one. A frame without misses cancels everything still in
/// flight.
///
/// Completions come back over a channel and only touch the caches inside
/// [`process_completions`](Self::process_completions), which runs on the
/// owner thread.
pub struct FetchScheduler<L: ImageLoader> {
    loader: Arc<L>,
    spawner: Arc<dyn AsyncSpawner>,
    max_workers: usize,
    active_workers: usize,
    pending: Vec<FetchRequest>,
    active: HashMap<String, FetchHandle>,
    misses: usize,
    tx: Sender<Completion<L::Bitmap>>,
    rx: Receiver<Completion<L::Bitmap>>,
    waker: Option<FetchWaker>,
    stats: FetchStats,
}

impl<L: ImageLoader> FetchScheduler<L> {
    pub fn new(loader: Arc<L>, spawner: Arc<dyn AsyncSpawner>) -> Self {
        let (tx, rx) = unbounded();
        Self {
            loader,
            spawner,
            max_workers: MAX_FETCHERS,
            active_workers: 0,
            pending: Vec::new(),
            active: HashMap::default(),
            misses: 0,
            tx,
            rx,
            waker: None,
            stats: FetchStats::default(),
        }
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.set_max_workers(max_workers);
        self
    }

    pub fn set_max_workers(&mut self, max_workers: usize) {
        self.max_workers = max_workers.max(1);
    }

    /// Called from fetch tasks after a completion is queued
    pub fn set_waker(&mut self, waker: Option<FetchWaker>) {
        self.waker = waker;
    }

    pub fn begin_frame(&mut self) {
        self.pending.clear();
        self.misses = 0;
    }

    /// Report a cache miss for `url`.
    ///
    /// Urls already pending this frame or currently being fetched are not
    /// queued twice.
    pub fn request(&mut self, url: &str, target: CacheTarget) {
        self.misses += 1;
        if self.active.contains_key(url) || self.pending.iter().any(|p| p.url == url) {
            return;
        }
        self.pending.push(FetchRequest {
            url: url.to_string(),
            target,
        });
    }

    pub fn end_frame(&mut self) {
        if self.misses == 0 {
            self.cancel();
            return;
        }

        let idle = self.max_workers.saturating_sub(self.active_workers);
        let workers = idle.min(self.pending.len());
        for _ in 0..workers {
            self.start_worker();
        }
    }

    /// Drop all pending misses and invalidate every running fetch.
    ///
    /// Running loads are aborted. Their tasks still report back, and the
    /// workers are retired once those reports are drained.
    pub fn cancel(&mut self) {
        if !self.active.is_empty() || !self.pending.is_empty() {
            log::debug!(
                "cancelling {} running and {} pending fetches",
                self.active.len(),
                self.pending.len()
            );
        }
        self.pending.clear();
        for handle in self.active.values() {
            handle.invalidate();
        }
    }

    fn start_worker(&mut self) {
        self.active_workers += 1;
        log::debug!("fetch worker started ({} active)", self.active_workers);
        self.dispatch_next();
    }

    /// Hand the next pending miss to the worker that just became free, or
    /// retire the worker when there is nothing left.
    fn dispatch_next(&mut self) {
        if self.pending.is_empty() {
            self.active_workers = self.active_workers.saturating_sub(1);
            log::debug!("fetch worker stopped ({} active)", self.active_workers);
            return;
        }

        let index = fastrand::usize(..self.pending.len());
        let FetchRequest { url, target } = self.pending.swap_remove(index);

        let (handle, registration) = FetchHandle::new();
        let valid = handle.valid.clone();
        self.active.insert(url.clone(), handle);
        self.stats.started += 1;

        let loader = self.loader.clone();
        let tx = self.tx.clone();
        let waker = self.waker.clone();

        self.spawner.spawn_boxed(Box::pin(async move {
            let outcome = if valid.load(Ordering::Acquire) {
                match Abortable::new(loader.load(&url), registration).await {
                    Ok(Ok(bitmap)) => FetchOutcome::Loaded(bitmap),
                    Ok(Err(err)) => FetchOutcome::Failed(err),
                    Err(_aborted) => FetchOutcome::Skipped,
                }
            } else {
                FetchOutcome::Skipped
            };

            // The receiver only disappears with the scheduler itself
            if tx.send(Completion { url, target, outcome }).is_ok() {
                if let Some(waker) = waker {
                    waker();
                }
            }
        }));
    }

    /// Drain finished fetches into the caches and keep their workers busy.
    ///
    /// Returns `true` when at least one bitmap was inserted.
    pub fn process_completions(
        &mut self,
        tiles: &mut TileCache<L::Bitmap>,
        icons: &mut TileCache<L::Bitmap>,
    ) -> bool {
        let mut inserted = false;

        while let Ok(Completion { url, target, outcome }) = self.rx.try_recv() {
            let valid = self
                .active
                .remove(&url)
                .map(|handle| handle.is_valid())
                .unwrap_or(false);

            match outcome {
                FetchOutcome::Loaded(bitmap) if valid => {
                    let cache = match target {
                        CacheTarget::Tile => &mut *tiles,
                        CacheTarget::Icon => &mut *icons,
                    };
                    cache.insert(url, bitmap);
                    self.stats.loaded += 1;
                    inserted = true;
                }
                FetchOutcome::Failed(err) => {
                    log::warn!("failed to load {}: {}", url, err);
                    self.stats.failed += 1;
                }
                FetchOutcome::Loaded(_) | FetchOutcome::Skipped => {
                    log::trace!("discarding cancelled fetch of {}", url);
                    self.stats.discarded += 1;
                }
            }

            self.dispatch_next();
        }

        inserted
    }

    pub fn max_workers(&self) -> usize {
        self.max_workers
    }

    pub fn active_workers(&self) -> usize {
        self.active_workers
    }

    /// Fetches spawned and not yet drained, cancelled ones included
    pub fn in_flight(&self) -> usize {
        self.active.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn misses(&self) -> usize {
        self.misses
    }

    pub fn stats(&self) -> FetchStats {
        self.stats
    }
}
