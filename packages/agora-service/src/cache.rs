use std::{collections::HashMap, sync::Mutex};

use time::{Duration, OffsetDateTime};

use agora_domain::entity::{EntityType, SearchFilters, SortMode};

use crate::{ServiceError, ServiceResult, search::SearchResponse};

/// Bump when the response envelope shape changes so stale entries
/// hashed under the old shape can never be served.
const CACHE_KEY_VERSION: &str = "v1";

/// In-process TTL cache for assembled search envelopes. Entries are
/// checked for freshness on read; `put` sweeps expired entries so the
/// map stays bounded by the active key set.
pub struct ResultCache {
	entries: Mutex<HashMap<String, CacheEntry>>,
}

struct CacheEntry {
	envelope: SearchResponse,
	created_at: OffsetDateTime,
}

impl ResultCache {
	pub fn new() -> Self {
		Self { entries: Mutex::new(HashMap::new()) }
	}

	pub fn get(&self, key: &str, now: OffsetDateTime, ttl: Duration) -> Option<SearchResponse> {
		let entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());
		let entry = entries.get(key)?;

		if now - entry.created_at >= ttl {
			return None;
		}

		Some(entry.envelope.clone())
	}

	pub fn put(&self, key: String, envelope: SearchResponse, now: OffsetDateTime, ttl: Duration) {
		let mut entries = self.entries.lock().unwrap_or_else(|err| err.into_inner());

		entries.retain(|_, entry| now - entry.created_at < ttl);
		entries.insert(key, CacheEntry { envelope, created_at: now });
	}
}

impl Default for ResultCache {
	fn default() -> Self {
		Self::new()
	}
}

pub(crate) fn hash_cache_key(payload: &serde_json::Value) -> ServiceResult<String> {
	let raw = serde_json::to_vec(payload).map_err(|err| ServiceError::Storage {
		message: format!("Failed to encode cache key payload: {err}"),
	})?;
	Ok(blake3::hash(&raw).to_hex().to_string())
}

pub(crate) fn cache_key_prefix(key: &str) -> &str {
	let len = key.len().min(12);
	&key[..len]
}

pub(crate) fn build_result_cache_key(
	query: &str,
	entity_types: &[EntityType],
	filters: &SearchFilters,
	sort: SortMode,
	limit: u32,
	offset: u32,
) -> ServiceResult<String> {
	let types: Vec<&str> = entity_types.iter().map(|ty| ty.as_str()).collect();
	let payload = serde_json::json!({
		"kind": "search",
		"version": CACHE_KEY_VERSION,
		"query": query,
		"types": types,
		"filters": filters,
		"sort": sort,
		"limit": limit,
		"offset": offset,
	});
	hash_cache_key(&payload)
}
