//! Content-addressed parse cache.
//!
//! Parsing is pure over (name, bytes, context date, tolerance), so its result
//! can be memoised on a hash of exactly those inputs. The cache is an explicit
//! value owned by the caller; nothing is global.

use std::collections::{HashMap, VecDeque};

use askue_core::models::RawFile;
use askue_data::parser::{parse_file, FileParse, ParserConfig};

// ── Defaults ──────────────────────────────────────────────────────────────────

/// Default number of parsed files kept before the oldest is evicted.
pub const DEFAULT_CACHE_CAPACITY: usize = 256;

/// blake3 digest of everything that influences a parse.
pub type CacheKey = [u8; 32];

/// Hash the parse inputs of `file` under `config`.
pub fn cache_key(file: &RawFile, config: &ParserConfig) -> CacheKey {
    let mut hasher = blake3::Hasher::new();
    hasher.update(&(file.name.len() as u64).to_le_bytes());
    hasher.update(file.name.as_bytes());
    hasher.update(&(file.content.len() as u64).to_le_bytes());
    hasher.update(&file.content);
    hasher.update(file.context_date.to_string().as_bytes());
    hasher.update(&config.checksum_tolerance.to_bits().to_le_bytes());
    *hasher.finalize().as_bytes()
}

// ── ParseCache ────────────────────────────────────────────────────────────────

/// Bounded memo of [`parse_file`] results with FIFO eviction.
#[derive(Debug)]
pub struct ParseCache {
    capacity: usize,
    entries: HashMap<CacheKey, FileParse>,
    /// Insertion order, oldest first.
    order: VecDeque<CacheKey>,
    hits: u64,
    misses: u64,
}

impl Default for ParseCache {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_CAPACITY)
    }
}

impl ParseCache {
    /// Create a cache holding at most `capacity` files. A capacity of zero
    /// disables caching.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: HashMap::new(),
            order: VecDeque::new(),
            hits: 0,
            misses: 0,
        }
    }

    // ── Public API ────────────────────────────────────────────────────────

    /// Return the cached parse of `file`, parsing and storing it on a miss.
    pub fn get_or_parse(&mut self, file: &RawFile, config: &ParserConfig) -> FileParse {
        let key = cache_key(file, config);

        if let Some(hit) = self.entries.get(&key) {
            self.hits += 1;
            tracing::debug!(file = %file.name, "parse cache hit");
            return hit.clone();
        }

        self.misses += 1;
        let parsed = parse_file(file, config);
        self.insert(key, parsed.clone());
        parsed
    }

    /// Drop every entry; counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
        tracing::debug!("parse cache cleared");
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }

    // ── Private helpers ───────────────────────────────────────────────────

    fn insert(&mut self, key: CacheKey, parsed: FileParse) {
        if self.capacity == 0 {
            return;
        }
        while self.order.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key);
        self.entries.insert(key, parsed);
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
