//! In-memory cache of encoded previews.
//!
//! Dragging a slider back and forth revisits the same positions over and
//! over. Each one is a full JPEG encode of the source, so the preview
//! controller keeps recent results here and re-publishes them instantly.
//!
//! ## Cache keys
//!
//! The cache is **content-addressed**: a key combines
//!
//! - **`source_hash`**: the [`ImageBuffer`](crate::imaging::ImageBuffer)
//!   fingerprint (SHA-256 of the source bytes). Reopening the same file hits
//!   the entries from its previous session.
//! - **`params_hash`**: SHA-256 of the encoder name and the codec quality.
//!   Slider positions that land on the same codec quality share an entry.
//!
//! ## Bounds
//!
//! At most `capacity` entries are kept; the oldest insertion is evicted
//! first. A capacity of 0 disables the cache entirely.

use crate::imaging::Quality;
use sha2::{Digest, Sha256};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::sync::Arc;

/// SHA-256 of encoding parameters, as a hex string.
pub fn hash_encode_params(encoder: &str, quality: Quality) -> String {
    let mut hasher = Sha256::new();
    hasher.update(encoder.as_bytes());
    hasher.update(b"\0");
    hasher.update([quality.codec_value()]);
    format!("{:x}", hasher.finalize())
}

/// Bounded map from `(source_hash, params_hash)` to encoded bytes.
#[derive(Debug)]
pub struct EncodeCache {
    capacity: usize,
    entries: HashMap<String, Arc<Vec<u8>>>,
    /// Insertion order, oldest first.
    order: VecDeque<String>,
    stats: CacheStats,
}

impl EncodeCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            stats: CacheStats::default(),
        }
    }

    fn key(source_hash: &str, encoder: &str, quality: Quality) -> String {
        format!("{}:{}", source_hash, hash_encode_params(encoder, quality))
    }

    /// Look up an encode, counting a hit or miss.
    pub fn get(
        &mut self,
        source_hash: &str,
        encoder: &str,
        quality: Quality,
    ) -> Option<Arc<Vec<u8>>> {
        if self.capacity == 0 {
            return None;
        }
        match self.entries.get(&Self::key(source_hash, encoder, quality)) {
            Some(bytes) => {
                self.stats.hit();
                Some(bytes.clone())
            }
            None => {
                self.stats.miss();
                None
            }
        }
    }

    /// Store an encode, evicting the oldest entries beyond capacity.
    pub fn insert(
        &mut self,
        source_hash: &str,
        encoder: &str,
        quality: Quality,
        bytes: Arc<Vec<u8>>,
    ) {
        if self.capacity == 0 {
            return;
        }
        let key = Self::key(source_hash, encoder, quality);
        if self.entries.insert(key.clone(), bytes).is_none() {
            self.order.push_back(key);
        }
        while self.order.len() > self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }
}

/// Lookup counters, shown by the CLI after a preview session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} encoded ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} encoded", self.misses)
        }
    }
}
