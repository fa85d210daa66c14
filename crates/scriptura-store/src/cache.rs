//! Response cache keyed by language, normalized question and a context
//! fingerprint.
//!
//! Keys look like `FR:comment pardonner?:-1x3k9` (the last segment is empty
//! when there is no context). Exact lookups are a single map access.
//! [`ResponseCache::get_similar`] scans every key of the same language and
//! compares word sets, so it is only reasonable while `max_entries` stays
//! small; a larger store would want an inverted index by token instead.

use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use serde::Serialize;
use tracing::{debug, instrument};

use scriptura_core::config::CacheConfig;
use scriptura_core::{Clock, Language};

/// Key/value storage with time-based expiry and a capacity bound.
pub trait CacheStore: Send + Sync {
    /// Value for `key` unless it is missing or expired.
    fn get(&self, key: &str) -> Option<String>;

    /// Insert or replace; may evict the least recently used entry.
    fn insert(&self, key: String, value: String);

    /// Live keys starting with `prefix`.
    fn keys_with_prefix(&self, prefix: &str) -> Vec<String>;

    /// Remove expired entries, returning how many were dropped.
    fn purge_expired(&self) -> usize;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn clear(&self);
}

struct Stored {
    value: String,
    inserted_at_ms: u64,
}

/// LRU-bounded in-memory store; entries expire `ttl_ms` after insertion.
pub struct MemoryCacheStore {
    entries: Mutex<LruCache<String, Stored>>,
    clock: Arc<dyn Clock>,
    ttl_ms: u64,
}

impl MemoryCacheStore {
    pub fn new(capacity: usize, ttl_ms: u64, clock: Arc<dyn Clock>) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            clock,
            ttl_ms,
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, LruCache<String, Stored>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn expired(&self, stored: &Stored, now: u64) -> bool {
        now.saturating_sub(stored.inserted_at_ms) >= self.ttl_ms
    }
}

impl CacheStore for MemoryCacheStore {
    fn get(&self, key: &str) -> Option<String> {
        let now = self.clock.now_ms();
        let mut entries = self.lock();
        let expired = match entries.get(key) {
            Some(stored) if !self.expired(stored, now) => return Some(stored.value.clone()),
            Some(_) => true,
            None => false,
        };
        if expired {
            entries.pop(key);
        }
        None
    }

    fn insert(&self, key: String, value: String) {
        let stored = Stored {
            value,
            inserted_at_ms: self.clock.now_ms(),
        };
        if let Some((evicted, _)) = self.lock().push(key.clone(), stored) {
            if evicted != key {
                debug!(key = %evicted, "cache entry evicted for capacity");
            }
        }
    }

    fn keys_with_prefix(&self, prefix: &str) -> Vec<String> {
        let now = self.clock.now_ms();
        self.lock()
            .iter()
            .filter(|(k, v)| k.starts_with(prefix) && !self.expired(v, now))
            .map(|(k, _)| k.clone())
            .collect()
    }

    fn purge_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut entries = self.lock();
        let stale: Vec<String> = entries
            .iter()
            .filter(|(_, v)| self.expired(v, now))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &stale {
            entries.pop(key);
        }
        stale.len()
    }

    fn len(&self) -> usize {
        self.lock().len()
    }

    fn clear(&self) {
        self.lock().clear();
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub hit_rate: f64,
    pub size: usize,
}

pub struct ResponseCache {
    store: Box<dyn CacheStore>,
    key_chars: usize,
    similarity_threshold: f64,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl ResponseCache {
    pub fn new(config: &CacheConfig, store: Box<dyn CacheStore>) -> Self {
        Self {
            store,
            key_chars: config.key_chars,
            similarity_threshold: config.similarity_threshold,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// In-memory cache built straight from config.
    pub fn in_memory(config: &CacheConfig, clock: Arc<dyn Clock>) -> Self {
        let store = MemoryCacheStore::new(
            config.max_entries,
            config.ttl_secs.saturating_mul(1000),
            clock,
        );
        Self::new(config, Box::new(store))
    }

    /// Lowercased, trimmed, and cut to `key_chars` characters.
    pub fn normalize(&self, question: &str) -> String {
        question
            .trim()
            .to_lowercase()
            .chars()
            .take(self.key_chars)
            .collect()
    }

    pub fn key(&self, question: &str, language: Language, context: Option<&str>) -> String {
        let fingerprint = context.map(context_hash).unwrap_or_default();
        format!(
            "{}:{}:{}",
            language.code(),
            self.normalize(question),
            fingerprint
        )
    }

    #[instrument(skip(self, question, context), fields(language = %language))]
    pub fn get(&self, question: &str, language: Language, context: Option<&str>) -> Option<String> {
        let key = self.key(question, language, context);
        match self.store.get(&key) {
            Some(text) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                debug!("cache hit");
                Some(text)
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Store a shaped reply. Blank replies are refused.
    pub fn set(&self, question: &str, language: Language, context: Option<&str>, text: &str) -> bool {
        if text.trim().is_empty() {
            return false;
        }
        let key = self.key(question, language, context);
        self.store.insert(key, text.to_string());
        true
    }

    /// First entry with the same language and context whose question
    /// shares at least `similarity_threshold` of its words (Jaccard) with
    /// `question`.
    #[instrument(skip(self, question, context), fields(language = %language))]
    pub fn get_similar(
        &self,
        question: &str,
        language: Language,
        context: Option<&str>,
    ) -> Option<String> {
        let prefix = format!("{}:", language.code());
        let fingerprint = context.map(context_hash).unwrap_or_default();
        let normalized = self.normalize(question);
        let wanted = word_set(&normalized);

        for key in self.store.keys_with_prefix(&prefix) {
            let Some((candidate, candidate_fp)) = split_key(&key, &prefix) else {
                continue;
            };
            if candidate_fp != fingerprint {
                continue;
            }
            let score = jaccard(&wanted, &word_set(candidate));
            if score >= self.similarity_threshold {
                if let Some(text) = self.store.get(&key) {
                    debug!(score, "similar cache hit");
                    self.hits.fetch_add(1, Ordering::Relaxed);
                    return Some(text);
                }
            }
        }
        None
    }

    pub fn purge_expired(&self) -> usize {
        self.store.purge_expired()
    }

    pub fn clear(&self) {
        self.store.clear();
    }

    pub fn stats(&self) -> CacheStats {
        let hits = self.hits.load(Ordering::Relaxed);
        let misses = self.misses.load(Ordering::Relaxed);
        let total = hits + misses;
        CacheStats {
            hits,
            misses,
            hit_rate: if total == 0 {
                0.0
            } else {
                hits as f64 / total as f64
            },
            size: self.store.len(),
        }
    }
}

/// Question and fingerprint segments of a key, split at the final `:`.
fn split_key<'a>(key: &'a str, prefix: &str) -> Option<(&'a str, &'a str)> {
    key.strip_prefix(prefix).and_then(|rest| rest.rsplit_once(':'))
}

fn word_set(text: &str) -> HashSet<&str> {
    text.split_whitespace().collect()
}

fn jaccard(a: &HashSet<&str>, b: &HashSet<&str>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// 32-bit rolling hash (`h = h * 31 + unit`, wrapping) over UTF-16 code
/// units, rendered in signed base 36. Cheap and stable across restarts.
pub fn context_hash(context: &str) -> String {
    let mut hash: i32 = 0;
    for unit in context.encode_utf16() {
        hash = (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32);
    }
    to_base36(hash)
}

fn to_base36(n: i32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if n == 0 {
        return "0".to_string();
    }
    let mut value = (n as i64).unsigned_abs();
    let mut out = Vec::new();
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    if n < 0 {
        out.push(b'-');
    }
    out.reverse();
    String::from_utf8_lossy(&out).into_owned()
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use scriptura_core::ManualClock;

    use super::*;

    fn cache(clock: Arc<ManualClock>) -> ResponseCache {
        ResponseCache::in_memory(&CacheConfig::default(), clock)
    }

    #[test]
    fn key_is_language_qualified() {
        let c = cache(Arc::new(ManualClock::new(0)));
        let fr = c.key("  Comment Pardonner? ", Language::Fr, None);
        let mg = c.key("  Comment Pardonner? ", Language::Mg, None);
        assert_eq!(fr, "FR:comment pardonner?:");
        assert_eq!(mg, "MG:comment pardonner?:");
    }

    #[test]
    fn key_truncates_long_questions() {
        let c = cache(Arc::new(ManualClock::new(0)));
        let long = "é".repeat(150);
        let key = c.key(&long, Language::Fr, None);
        assert_eq!(key.chars().filter(|ch| *ch == 'é').count(), 100);
    }

    #[test]
    fn context_hash_matches_reference_values() {
        assert_eq!(context_hash(""), "0");
        assert_eq!(context_hash("a"), "2p");
        // 31 * 97 + 98 = 3105
        assert_eq!(context_hash("ab"), "2e9");
        assert!(context_hash("llama-3.3-70b-versatile").len() > 1);
    }

    #[test]
    fn base36_handles_negative_and_min() {
        assert_eq!(to_base36(-35), "-z");
        assert_eq!(to_base36(i32::MIN), "-zik0zk");
    }

    #[test]
    fn same_question_within_ttl_returns_identical_text() {
        let clock = Arc::new(ManualClock::new(0));
        let c = cache(clock.clone());
        assert!(c.set("Comment pardonner?", Language::Fr, Some("m"), "Réponse exacte."));

        clock.advance(Duration::from_secs(599));
        assert_eq!(
            c.get("comment pardonner?", Language::Fr, Some("m")).as_deref(),
            Some("Réponse exacte.")
        );

        clock.advance(Duration::from_secs(1));
        assert_eq!(c.get("Comment pardonner?", Language::Fr, Some("m")), None);
    }

    #[test]
    fn languages_and_contexts_do_not_collide() {
        let c = cache(Arc::new(ManualClock::new(0)));
        c.set("vavaka", Language::Mg, None, "MG text");
        assert_eq!(c.get("vavaka", Language::Fr, None), None);
        assert_eq!(c.get("vavaka", Language::Mg, Some("other")), None);
        assert_eq!(c.get("vavaka", Language::Mg, None).as_deref(), Some("MG text"));
    }

    #[test]
    fn blank_text_is_not_cached() {
        let c = cache(Arc::new(ManualClock::new(0)));
        assert!(!c.set("question", Language::Fr, None, "   "));
        assert_eq!(c.stats().size, 0);
    }

    #[test]
    fn capacity_evicts_least_recent() {
        let clock = Arc::new(ManualClock::new(0));
        let config = CacheConfig {
            max_entries: 2,
            ..CacheConfig::default()
        };
        let c = ResponseCache::in_memory(&config, clock);
        c.set("un", Language::Fr, None, "1");
        c.set("deux", Language::Fr, None, "2");
        c.set("trois", Language::Fr, None, "3");
        assert_eq!(c.get("un", Language::Fr, None), None);
        assert_eq!(c.get("trois", Language::Fr, None).as_deref(), Some("3"));
        assert_eq!(c.stats().size, 2);
    }

    #[test]
    fn similar_lookup_uses_jaccard_threshold() {
        let c = cache(Arc::new(ManualClock::new(0)));
        c.set(
            "que dit la bible sur le pardon",
            Language::Fr,
            Some("m"),
            "Pardon.",
        );
        // 7 shared words of 8 distinct: 0.875
        assert_eq!(
            c.get_similar("que dit la bible sur le pardon ?", Language::Fr, Some("m"))
                .as_deref(),
            Some("Pardon.")
        );
        assert_eq!(
            c.get_similar("que dit la bible sur le pardon", Language::Mg, Some("m")),
            None
        );
        // 5 of 8: 0.625
        assert_eq!(
            c.get_similar("que dit la bible sur la colère", Language::Fr, Some("m")),
            None
        );
    }

    #[test]
    fn similar_lookup_stays_within_context() {
        let c = cache(Arc::new(ManualClock::new(0)));
        c.set("qui est moïse dans la bible", Language::Fr, Some("model-a"), "Réponse A.");
        assert_eq!(
            c.get_similar("qui est moïse dans la bible ?", Language::Fr, Some("model-b")),
            None
        );
        assert_eq!(
            c.get_similar("qui est moïse dans la bible ?", Language::Fr, None),
            None
        );
        assert_eq!(
            c.get_similar("qui est moïse dans la bible ?", Language::Fr, Some("model-a"))
                .as_deref(),
            Some("Réponse A.")
        );
    }

    #[test]
    fn similar_lookup_ignores_expired_entries() {
        let clock = Arc::new(ManualClock::new(0));
        let c = cache(clock.clone());
        c.set("la grâce de dieu", Language::Fr, None, "Grâce.");
        clock.advance(Duration::from_secs(601));
        assert_eq!(c.get_similar("la grâce de dieu", Language::Fr, None), None);
        assert_eq!(c.purge_expired(), 1);
    }

    #[test]
    fn stats_track_hits_and_misses() {
        let c = cache(Arc::new(ManualClock::new(0)));
        c.set("foi", Language::Fr, None, "La foi.");
        c.get("foi", Language::Fr, None);
        c.get("foi", Language::Fr, None);
        c.get("espérance", Language::Fr, None);
        let stats = c.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert!((stats.hit_rate - 2.0 / 3.0).abs() < 1e-9);
        c.clear();
        assert_eq!(c.stats().size, 0);
    }
}
