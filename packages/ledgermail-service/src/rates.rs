//! In-process TTL cache for conversion rates.

use std::{collections::HashMap, sync::Mutex};

use time::{Duration, OffsetDateTime};

struct CachedRate {
	rate: f64,
	cached_at: OffsetDateTime,
}

/// Caches pair rates for a fixed TTL so a run over many messages hits the
/// FX provider at most once per currency pair.
pub struct RateCache {
	ttl: Duration,
	entries: Mutex<HashMap<(String, String), CachedRate>>,
}
impl RateCache {
	pub fn new(ttl: Duration) -> Self {
		Self { ttl, entries: Mutex::new(HashMap::new()) }
	}

	/// Returns the cached rate when it is still fresh. Expired entries are
	/// dropped on the way out.
	pub fn get(&self, from: &str, to: &str, now: OffsetDateTime) -> Option<f64> {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let key = (from.to_string(), to.to_string());

		match entries.get(&key) {
			Some(entry) if now - entry.cached_at < self.ttl => Some(entry.rate),
			Some(_) => {
				entries.remove(&key);

				None
			},
			None => None,
		}
	}

	pub fn put(&self, from: &str, to: &str, rate: f64, now: OffsetDateTime) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.insert((from.to_string(), to.to_string()), CachedRate { rate, cached_at: now });
	}
}
