use std::{
	collections::HashMap,
	hash::Hash,
	sync::{Arc, Mutex},
	time::Duration,
};

use serde_json::Value;
use time::OffsetDateTime;

use crate::{Error, Result};

const EXTRACTION_CACHE_SCHEMA_VERSION: i32 = 1;

pub trait Clock
where
	Self: Send + Sync,
{
	fn now(&self) -> OffsetDateTime;
}

pub struct SystemClock;
impl Clock for SystemClock {
	fn now(&self) -> OffsetDateTime {
		OffsetDateTime::now_utc()
	}
}

/// Manually advanced clock for deterministic expiry.
pub struct FakeClock {
	now: Mutex<OffsetDateTime>,
}
impl FakeClock {
	pub fn new(start: OffsetDateTime) -> Self {
		Self { now: Mutex::new(start) }
	}

	pub fn advance(&self, by: Duration) {
		let mut now = self.now.lock().unwrap_or_else(|err| err.into_inner());

		*now += by;
	}
}
impl Clock for FakeClock {
	fn now(&self) -> OffsetDateTime {
		*self.now.lock().unwrap_or_else(|err| err.into_inner())
	}
}

struct Entry<V> {
	value: V,
	expires_at: OffsetDateTime,
}

/// Bounded map whose entries expire `ttl` after insertion, as observed by the injected clock.
///
/// A zero `ttl` disables the cache: inserts are dropped and lookups always miss.
pub struct TtlCache<K, V> {
	ttl: Duration,
	max_entries: usize,
	clock: Arc<dyn Clock>,
	entries: Mutex<HashMap<K, Entry<V>>>,
}
impl<K, V> TtlCache<K, V>
where
	K: Eq + Hash + Clone,
	V: Clone,
{
	pub fn new(ttl: Duration, max_entries: usize, clock: Arc<dyn Clock>) -> Self {
		Self { ttl, max_entries, clock, entries: Mutex::new(HashMap::new()) }
	}

	pub fn is_enabled(&self) -> bool {
		!self.ttl.is_zero() && self.max_entries > 0
	}

	pub fn get(&self, key: &K) -> Option<V> {
		let now = self.clock.now();
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		match entries.get(key) {
			Some(entry) if entry.expires_at > now => Some(entry.value.clone()),
			Some(_) => {
				entries.remove(key);

				None
			},
			None => None,
		}
	}

	/// Time left before `key` expires, if it is live.
	pub fn remaining(&self, key: &K) -> Option<Duration> {
		let now = self.clock.now();
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let entry = entries.get(key)?;

		if entry.expires_at <= now {
			return None;
		}

		Duration::try_from(entry.expires_at - now).ok()
	}

	pub fn insert(&self, key: K, value: V) {
		if !self.is_enabled() {
			return;
		}

		let now = self.clock.now();
		// A TTL past the representable date range cannot be stored; treat it as uncached.
		let Some(expires_at) =
			time::Duration::try_from(self.ttl).ok().and_then(|ttl| now.checked_add(ttl))
		else {
			return;
		};
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		if entries.len() >= self.max_entries && !entries.contains_key(&key) {
			entries.retain(|_, entry| entry.expires_at > now);
		}
		if entries.len() >= self.max_entries && !entries.contains_key(&key) {
			// Still full of live entries: evict the one closest to expiry.
			let oldest = entries
				.iter()
				.min_by_key(|(_, entry)| entry.expires_at)
				.map(|(key, _)| key.clone());

			if let Some(oldest) = oldest {
				entries.remove(&oldest);
			}
		}

		entries.insert(key, Entry { value, expires_at });
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap_or_else(|err| err.into_inner()).len()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}
}

pub fn hash_cache_key(payload: &Value) -> Result<String> {
	let raw = serde_json::to_vec(payload).map_err(|err| Error::Provider {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;

	Ok(blake3::hash(&raw).to_hex().to_string())
}

/// Key for extracted skills. Whitespace and case differences in the need collapse to one entry;
/// changing the extractor chain invalidates old entries.
pub fn build_extraction_cache_key(need: &str, models: &[String]) -> Result<String> {
	let normalized = need.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
	let payload = serde_json::json!({
		"kind": "skills",
		"schema_version": EXTRACTION_CACHE_SCHEMA_VERSION,
		"need": normalized,
		"models": models,
	});

	hash_cache_key(&payload)
}

pub fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);

	&key[..len]
}
