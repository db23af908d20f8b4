//! The bookkeeping half of the preview controller, free of threads and I/O.
//!
//! [`PreviewState`] decides which request is current, which one may be
//! dispatched next, and whether a completion may update the preview. Keeping
//! it separate from the worker plumbing means every ordering scenario,
//! including completions arriving in an order the real single-worker pool
//! would never produce, can be tested by calling methods in sequence.
//!
//! ## Acceptance rule
//!
//! A completion is accepted iff its `generation` equals the current
//! generation (same loaded image) **and** its `sequence` equals the latest
//! issued sequence. Everything else is stale and is dropped.
//!
//! ## Scheduling
//!
//! At most one request is in flight and at most one waits behind it. A new
//! request always replaces the waiting one, so a burst of slider events costs
//! at most one superseded encode (the one already running) plus one encode for
//! the final position. A waiting request also carries a `ready_at` instant,
//! which implements the optional debounce.
//!
//! A request answered without the worker (cache hit) sits in a `delivered`
//! slot until its completion is applied, so the status keeps reporting work
//! pending in between.

use crate::error::PreconditionError;
use crate::imaging::Quality;
use crate::types::CompressionRequest;
use std::time::Instant;

/// Externally visible controller state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreviewStatus {
    /// No image loaded.
    Idle,
    /// Image loaded, nothing running or waiting.
    Ready,
    /// The running or waiting request is the latest one.
    Encoding,
    /// The running request has been superseded by one still pending; its
    /// result will be dropped.
    EncodingStale,
}

/// What to do with a finished encode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Latest request succeeded: publish it.
    Accepted,
    /// Latest request failed: report it, keep the previous preview.
    Failed,
    /// Superseded: drop silently.
    Stale,
}

#[derive(Debug, Clone, Copy)]
struct Waiting {
    request: CompressionRequest,
    ready_at: Instant,
}

#[derive(Debug, Default)]
pub struct PreviewState {
    generation: u64,
    latest: u64,
    has_image: bool,
    in_flight: Option<CompressionRequest>,
    waiting: Option<Waiting>,
    delivered: Option<CompressionRequest>,
}

impl PreviewState {
    pub fn new() -> Self {
        Self::default()
    }

    /// A new image was loaded.
    ///
    /// Starts a new generation with the sequence counter back at 0. A request
    /// still running for the old image stays recorded as in flight so that
    /// nothing new is dispatched until the worker is free again; it no
    /// longer counts towards the status.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.latest = 0;
        self.has_image = true;
        self.waiting = None;
        self.delivered = None;
    }

    /// Issue a request for `quality`, to be dispatched no earlier than `ready_at`.
    pub fn issue(
        &mut self,
        quality: Quality,
        ready_at: Instant,
    ) -> Result<CompressionRequest, PreconditionError> {
        if !self.has_image {
            return Err(PreconditionError::NoImage);
        }
        self.latest += 1;
        let request = CompressionRequest {
            generation: self.generation,
            sequence: self.latest,
            quality,
        };
        self.waiting = Some(Waiting { request, ready_at });
        Ok(request)
    }

    /// The waiting `request` was answered without the worker (cache hit).
    ///
    /// It is no longer dispatched but stays pending until [`complete`](Self::complete)
    /// sees it.
    pub fn mark_delivered(&mut self, request: CompressionRequest) {
        if self.waiting.is_some_and(|w| w.request == request) {
            self.waiting = None;
        }
        self.delivered = Some(request);
    }

    /// Take the waiting request if the worker is free and its delay is over.
    pub fn next_dispatch(&mut self, now: Instant) -> Option<CompressionRequest> {
        if self.in_flight.is_some() {
            return None;
        }
        let waiting = self.waiting?;
        if waiting.ready_at > now {
            return None;
        }
        self.waiting = None;
        self.in_flight = Some(waiting.request);
        Some(waiting.request)
    }

    /// When the waiting request becomes dispatchable, if the worker is free.
    pub fn next_deadline(&self) -> Option<Instant> {
        if self.in_flight.is_some() {
            return None;
        }
        self.waiting.map(|w| w.ready_at)
    }

    /// Record a finished encode and decide its fate.
    pub fn complete(&mut self, request: &CompressionRequest, succeeded: bool) -> Verdict {
        if self.in_flight.as_ref() == Some(request) {
            self.in_flight = None;
        }
        if self.delivered.as_ref() == Some(request) {
            self.delivered = None;
        }
        if !self.is_current(request) {
            return Verdict::Stale;
        }
        if succeeded {
            Verdict::Accepted
        } else {
            Verdict::Failed
        }
    }

    fn is_current(&self, request: &CompressionRequest) -> bool {
        request.generation == self.generation && request.sequence == self.latest
    }

    pub fn status(&self) -> PreviewStatus {
        if !self.has_image {
            return PreviewStatus::Idle;
        }
        let pending = self.waiting.is_some()
            || self.delivered.as_ref().is_some_and(|r| self.is_current(r));
        match &self.in_flight {
            Some(running) if self.is_current(running) => PreviewStatus::Encoding,
            // older sequence, or an encode left over from the previous image
            Some(_) if pending => PreviewStatus::EncodingStale,
            None if pending => PreviewStatus::Encoding,
            _ => PreviewStatus::Ready,
        }
    }

    /// Whether an encode is running on the worker.
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn latest(&self) -> u64 {
        self.latest
    }
}
