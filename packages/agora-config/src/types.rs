use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	#[serde(default)]
	pub search: Search,
	#[serde(default)]
	pub ranking: Ranking,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Search {
	pub default_limit: u32,
	pub max_limit: u32,
	/// Matchers fetch `limit * overfetch_factor` candidate rows so re-ranking has
	/// more to choose from before truncation.
	pub overfetch_factor: u32,
	pub default_radius_km: f64,
	pub suggestion_limit: u32,
	pub related_limit: u32,
	pub cache: SearchCacheConfig,
	pub facets: SearchFacets,
	pub trending: SearchTrending,
}
impl Default for Search {
	fn default() -> Self {
		Self {
			default_limit: 20,
			max_limit: 50,
			overfetch_factor: 2,
			default_radius_km: 50.0,
			suggestion_limit: 6,
			related_limit: 4,
			cache: SearchCacheConfig::default(),
			facets: SearchFacets::default(),
			trending: SearchTrending::default(),
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchCacheConfig {
	pub enabled: bool,
	pub ttl_seconds: i64,
}
impl Default for SearchCacheConfig {
	fn default() -> Self {
		Self { enabled: true, ttl_seconds: 300 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchFacets {
	/// When true, facets come from a dedicated aggregation query over the full
	/// filtered universe; when false (or on failure) they are derived from the
	/// fetched page only.
	pub remote: bool,
}
impl Default for SearchFacets {
	fn default() -> Self {
		Self { remote: true }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct SearchTrending {
	pub window_hours: i64,
	pub limit: u32,
	pub max_limit: u32,
}
impl Default for SearchTrending {
	fn default() -> Self {
		Self { window_hours: 24, limit: 5, max_limit: 10 }
	}
}

/// Relevance weight overrides. Every default matches the fixed constants the
/// scorer was designed around; overriding is for experimentation, not a runtime
/// learning surface.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Ranking {
	pub event: EventWeights,
	pub user: UserWeights,
	pub organization: OrganizationWeights,
	pub post: PostWeights,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct EventWeights {
	pub title: f32,
	pub description: f32,
	pub category: f32,
	pub city: f32,
	pub venue: f32,
	pub preferred_category: f32,
	pub starts_within_week: f32,
	pub starts_within_month: f32,
}
impl Default for EventWeights {
	fn default() -> Self {
		Self {
			title: 10.0,
			description: 5.0,
			category: 8.0,
			city: 6.0,
			venue: 6.0,
			preferred_category: 3.0,
			starts_within_week: 2.0,
			starts_within_month: 1.0,
		}
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct UserWeights {
	pub username: f32,
	pub display_name: f32,
	pub bio: f32,
	pub verified: f32,
}
impl Default for UserWeights {
	fn default() -> Self {
		Self { username: 10.0, display_name: 8.0, bio: 5.0, verified: 2.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct OrganizationWeights {
	pub name: f32,
	pub slug: f32,
	pub description: f32,
	pub verified: f32,
}
impl Default for OrganizationWeights {
	fn default() -> Self {
		Self { name: 10.0, slug: 8.0, description: 5.0, verified: 2.0 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct PostWeights {
	pub reaction: f32,
	pub comment: f32,
	pub category_affinity: f32,
}
impl Default for PostWeights {
	fn default() -> Self {
		Self { reaction: 1.0, comment: 1.0, category_affinity: 3.0 }
	}
}
