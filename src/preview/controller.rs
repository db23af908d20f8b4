//! The live preview controller: threads, channel and session around
//! [`PreviewState`].
//!
//! ```text
//!  control thread                              worker pool (1 thread)
//!  ──────────────                              ──────────────────────
//!  set_quality(q) ─ issue ─▶ dispatch ─spawn─▶ encoder.encode(image, q)
//!                                                        │
//!  poll() / wait() ◀──────── mpsc::Receiver ◀── Completion
//!        │
//!        └─ accept / drop / report ─▶ PreviewEvent
//! ```
//!
//! The control thread never blocks in [`set_quality`](PreviewController::set_quality).
//! Completions are only applied when the owner drains them with
//! [`poll`](PreviewController::poll) or [`wait`](PreviewController::wait), so
//! every mutation of the session and of the sequence counters happens on the
//! thread that owns the controller.

use super::state::{PreviewState, PreviewStatus, Verdict};
use crate::cache::{CacheStats, EncodeCache};
use crate::config::PreviewConfig;
use crate::error::{CompressorError, PreconditionError};
use crate::imaging::{DecodeError, EncodeError, Encoder, ImageBuffer, Quality};
use crate::persist;
use crate::session::Session;
use crate::size::format_size;
use crate::types::{CompressionRequest, CompressionResult, ImageInfo};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::mpsc::{Receiver, RecvTimeoutError, Sender, TryRecvError, channel};
use std::time::{Duration, Instant};

/// A finished encode travelling back from the worker.
#[derive(Debug)]
struct Completion {
    request: CompressionRequest,
    /// Fingerprint of the image that was encoded, for the cache.
    source_hash: String,
    outcome: Result<Arc<Vec<u8>>, EncodeError>,
}

/// What the UI should render after draining completions.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewEvent {
    /// A new preview: show `result.bytes` and put `display_size` in the size label.
    Updated {
        result: CompressionResult,
        display_size: String,
    },
    /// The latest request could not be encoded. The previous preview stays.
    Failed {
        sequence: u64,
        quality: Quality,
        error: EncodeError,
    },
}

pub struct PreviewController<E: Encoder + 'static> {
    encoder: Arc<E>,
    pool: rayon::ThreadPool,
    tx: Sender<Completion>,
    rx: Receiver<Completion>,
    state: PreviewState,
    session: Session,
    cache: EncodeCache,
    debounce: Duration,
    quality: Quality,
}

impl<E: Encoder + 'static> PreviewController<E> {
    /// Create a controller with its own single-thread encode pool.
    pub fn new(encoder: E, config: &PreviewConfig) -> Result<Self, CompressorError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(1)
            .thread_name(|i| format!("encode-{i}"))
            .build()?;
        let (tx, rx) = channel();
        Ok(Self {
            encoder: Arc::new(encoder),
            pool,
            tx,
            rx,
            state: PreviewState::new(),
            session: Session::new(),
            cache: EncodeCache::new(config.cache_entries),
            debounce: config.debounce(),
            quality: Quality::default(),
        })
    }

    /// Replace the session with a fresh one for `image`.
    ///
    /// Any encode still running for the previous image finishes in the
    /// background and its result is dropped on arrival.
    pub fn load_image(&mut self, image: ImageBuffer, source_path: Option<PathBuf>) {
        self.session = Session::opened(image, source_path);
        self.state.reset();
        log::debug!("Loaded image, generation {}", self.state.generation());
    }

    /// Open and decode `path`, then load it.
    ///
    /// On failure the current session is left exactly as it was.
    pub fn open(&mut self, path: &Path) -> Result<ImageInfo, DecodeError> {
        let image = ImageBuffer::open(path)?;
        let info = image.info();
        self.load_image(image, Some(path.to_path_buf()));
        Ok(info)
    }

    /// Request a preview at `quality`. Returns immediately.
    pub fn set_quality(&mut self, quality: Quality) -> Result<CompressionRequest, PreconditionError> {
        let now = Instant::now();
        let request = self.state.issue(quality, now + self.debounce)?;
        self.quality = quality;

        let Some(image) = self.session.image() else {
            return Err(PreconditionError::NoImage);
        };
        let source_hash = image.fingerprint().to_string();
        if let Some(bytes) = self.cache.get(&source_hash, self.encoder.name(), quality) {
            log::debug!(
                "Cache hit for sequence {} at {}% compression",
                request.sequence,
                quality.compression_percent()
            );
            self.state.mark_delivered(request);
            // Goes through the channel like any other completion so ordering
            // and acceptance stay in one place.
            self.tx
                .send(Completion {
                    request,
                    source_hash,
                    outcome: Ok(bytes),
                })
                .ok();
        } else {
            self.pump(now);
        }
        Ok(request)
    }

    /// [`set_quality`](Self::set_quality) from a slider position (0–100).
    pub fn set_compression_percent(
        &mut self,
        percent: f64,
    ) -> Result<CompressionRequest, PreconditionError> {
        self.set_quality(Quality::from_compression_percent(percent))
    }

    /// Apply every completion that has already arrived, without blocking.
    pub fn poll(&mut self) -> Vec<PreviewEvent> {
        let mut events = Vec::new();
        loop {
            match self.rx.try_recv() {
                Ok(completion) => events.extend(self.handle(completion)),
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }
        self.pump(Instant::now());
        events
    }

    /// Apply completions until nothing is running or waiting, or `timeout` passes.
    pub fn wait(&mut self, timeout: Duration) -> Vec<PreviewEvent> {
        let deadline = Instant::now() + timeout;
        let mut events = self.poll();

        while matches!(
            self.state.status(),
            PreviewStatus::Encoding | PreviewStatus::EncodingStale
        ) {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            let wake = self
                .state
                .next_deadline()
                .map_or(deadline, |d| d.min(deadline));
            match self.rx.recv_timeout(wake.saturating_duration_since(now)) {
                Ok(completion) => events.extend(self.handle(completion)),
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => break,
            }
            events.extend(self.poll());
        }
        events
    }

    fn handle(&mut self, completion: Completion) -> Option<PreviewEvent> {
        let Completion {
            request,
            source_hash,
            outcome,
        } = completion;

        if let Ok(bytes) = &outcome {
            self.cache
                .insert(&source_hash, self.encoder.name(), request.quality, bytes.clone());
        }

        match (self.state.complete(&request, outcome.is_ok()), outcome) {
            (Verdict::Accepted, Ok(bytes)) => {
                let result = CompressionResult {
                    sequence: request.sequence,
                    quality: request.quality,
                    bytes,
                };
                let display_size = format_size(result.byte_size());
                log::info!(
                    "Preview {} at {}% compression: {}",
                    request.sequence,
                    request.quality.compression_percent(),
                    display_size
                );
                self.session = std::mem::take(&mut self.session).accept(result.clone());
                Some(PreviewEvent::Updated {
                    result,
                    display_size,
                })
            }
            (Verdict::Failed, Err(error)) => {
                log::warn!("Preview {} failed: {}", request.sequence, error);
                Some(PreviewEvent::Failed {
                    sequence: request.sequence,
                    quality: request.quality,
                    error,
                })
            }
            _ => {
                log::debug!(
                    "Dropped stale result {}/{} (latest {}/{})",
                    request.generation,
                    request.sequence,
                    self.state.generation(),
                    self.state.latest()
                );
                None
            }
        }
    }

    /// Hand the waiting request to the worker if it is free and due.
    fn pump(&mut self, now: Instant) {
        let Some(request) = self.state.next_dispatch(now) else {
            return;
        };
        let Some(image) = self.session.image().cloned() else {
            return;
        };
        let encoder = Arc::clone(&self.encoder);
        let tx = self.tx.clone();
        log::debug!(
            "Encoding sequence {} at {}% compression",
            request.sequence,
            request.quality.compression_percent()
        );
        self.pool.spawn(move || {
            let outcome = encoder.encode(&image, request.quality).map(Arc::new);
            tx.send(Completion {
                request,
                source_hash: image.fingerprint().to_string(),
                outcome,
            })
            .ok();
        });
    }

    /// Write the accepted preview to `destination`; returns the byte count.
    pub fn save(&self, destination: &Path) -> Result<u64, CompressorError> {
        persist::save(self.session.last_accepted(), destination)
    }

    pub fn status(&self) -> PreviewStatus {
        self.state.status()
    }

    /// The most recently requested quality.
    pub fn quality(&self) -> Quality {
        self.quality
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
