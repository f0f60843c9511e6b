pub mod facets;
pub mod ranking;
pub mod suggest;

use std::time::Instant;

use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use agora_config::Config;
use agora_domain::{
	entity::{EntityType, PriceRange, SearchFilters, SortMode},
	expand::expand_terms,
	geo::{self, GeoPoint},
};
use agora_storage::models::{AnalyticsInsert, EventRow, OrganizationRow, PostRow, UserRow};
pub use facets::{Facet, Facets};

use crate::{SearchService, ServiceError, ServiceResult, analytics, cache};

const MIN_QUERY_CHARS: usize = 2;
const MAX_OFFSET: u32 = 10_000;
const POST_PREVIEW_CHARS: usize = 140;

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SearchRequest {
	pub q: String,
	#[serde(default)]
	pub types: Option<Vec<EntityType>>,
	#[serde(default)]
	pub category: Option<String>,
	/// "lat,lng" pair; resolved against `radius_km`.
	#[serde(default)]
	pub location: Option<String>,
	#[serde(default)]
	pub radius_km: Option<f64>,
	#[serde(default, with = "crate::time_serde::option")]
	pub date_from: Option<OffsetDateTime>,
	#[serde(default, with = "crate::time_serde::option")]
	pub date_to: Option<OffsetDateTime>,
	#[serde(default)]
	pub price_range: Option<PriceRange>,
	#[serde(default)]
	pub tags: Option<Vec<String>>,
	#[serde(default)]
	pub organizer_id: Option<Uuid>,
	#[serde(default)]
	pub verified_only: Option<bool>,
	#[serde(default)]
	pub include_past_events: Option<bool>,
	#[serde(default)]
	pub sort_by: Option<SortMode>,
	#[serde(default)]
	pub limit: Option<u32>,
	#[serde(default)]
	pub offset: Option<u32>,
	#[serde(default)]
	pub session_id: Option<String>,
	#[serde(default)]
	pub user_id: Option<Uuid>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchResponse {
	pub query: String,
	pub results: SearchResults,
	pub meta: SearchMeta,
	pub suggestions: Vec<String>,
	pub trending: Vec<String>,
	pub related_searches: Vec<String>,
	pub filters_applied: Vec<String>,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct SearchResults {
	pub events: Vec<EventResult>,
	pub organizations: Vec<OrganizationResult>,
	pub users: Vec<UserResult>,
	pub posts: Vec<PostResult>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct SearchMeta {
	pub total: usize,
	pub search_time_ms: i64,
	pub has_more: bool,
	pub facets: Facets,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct EventResult {
	pub id: Uuid,
	pub entity_type: EntityType,
	pub title: String,
	pub category: Option<String>,
	pub city: Option<String>,
	pub venue: Option<String>,
	pub image_url: Option<String>,
	pub price_min: Option<f64>,
	pub tickets_available: Option<i32>,
	pub likes_count: i64,
	/// Present only when the request carried a location filter and the event has
	/// coordinates.
	pub distance_km: Option<f64>,
	pub relevance_score: f32,
	#[serde(with = "crate::time_serde")]
	pub start_at: OffsetDateTime,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct UserResult {
	pub id: Uuid,
	pub entity_type: EntityType,
	pub username: String,
	pub display_name: Option<String>,
	pub avatar_url: Option<String>,
	pub verified: bool,
	pub followers_count: i64,
	pub relevance_score: f32,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct OrganizationResult {
	pub id: Uuid,
	pub entity_type: EntityType,
	pub name: String,
	pub slug: String,
	pub description: Option<String>,
	pub logo_url: Option<String>,
	pub verified: bool,
	pub followers_count: i64,
	pub relevance_score: f32,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct PostResult {
	pub id: Uuid,
	pub entity_type: EntityType,
	pub title: Option<String>,
	pub body_preview: String,
	pub image_url: Option<String>,
	pub event_category: Option<String>,
	pub reactions_count: i64,
	pub comments_count: i64,
	pub relevance_score: f32,
	#[serde(with = "crate::time_serde")]
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub(crate) struct ResolvedQuery {
	pub(crate) raw: String,
	pub(crate) terms: Vec<String>,
	pub(crate) entity_types: Vec<EntityType>,
	pub(crate) filters: SearchFilters,
	pub(crate) sort: SortMode,
	pub(crate) limit: u32,
	pub(crate) offset: u32,
	pub(crate) session_id: Option<String>,
	pub(crate) user_id: Option<Uuid>,
}

impl SearchService {
	pub async fn search(&self, request: SearchRequest) -> ServiceResult<SearchResponse> {
		let started = Instant::now();
		let now = OffsetDateTime::now_utc();
		let query = resolve_query(&request, &self.cfg)?;
		let cache_cfg = &self.cfg.search.cache;
		let ttl = Duration::seconds(cache_cfg.ttl_seconds);
		let cache_key = if cache_cfg.enabled {
			match cache::build_result_cache_key(
				&query.raw,
				&query.entity_types,
				&query.filters,
				query.sort,
				query.limit,
				query.offset,
			) {
				Ok(key) => Some(key),
				Err(err) => {
					warn!(error = %err, "Cache key build failed.");
					None
				},
			}
		} else {
			None
		};

		if let Some(key) = cache_key.as_ref() {
			if let Some(envelope) = self.cache.get(key, now, ttl) {
				tracing::info!(
					cache_hit = true,
					cache_key_prefix = cache::cache_key_prefix(key),
					"Serving search response from cache."
				);
				return Ok(envelope);
			}
			tracing::info!(
				cache_hit = false,
				cache_key_prefix = cache::cache_key_prefix(key),
				"Search cache miss."
			);
		}

		let preferred = match query.user_id {
			Some(user_id) => match self.store.preferred_categories(user_id).await {
				Ok(categories) => categories,
				Err(err) => {
					warn!(
						error = %err,
						"Preferred category lookup failed; skipping personalization."
					);
					Vec::new()
				},
			},
			None => Vec::new(),
		};

		let fetch_limit =
			i64::from(query.offset + query.limit) * i64::from(self.cfg.search.overfetch_factor);
		let wants = |ty: EntityType| query.entity_types.contains(&ty);

		// Matchers run concurrently; a failed matcher degrades to an empty bucket
		// instead of failing the whole search.
		let event_rows = async {
			if !wants(EntityType::Event) {
				return Vec::new();
			}
			match self.store.search_events(&query.terms, &query.filters, now, fetch_limit).await {
				Ok(rows) => rows,
				Err(err) => {
					warn!(error = %err, entity = "events", "Matcher failed; bucket left empty.");
					Vec::new()
				},
			}
		};
		let user_rows = async {
			if !wants(EntityType::User) {
				return Vec::new();
			}
			match self
				.store
				.search_users(&query.terms, query.filters.verified_only, fetch_limit)
				.await
			{
				Ok(rows) => rows,
				Err(err) => {
					warn!(error = %err, entity = "users", "Matcher failed; bucket left empty.");
					Vec::new()
				},
			}
		};
		let organization_rows = async {
			if !wants(EntityType::Organization) {
				return Vec::new();
			}
			match self
				.store
				.search_organizations(&query.terms, query.filters.verified_only, fetch_limit)
				.await
			{
				Ok(rows) => rows,
				Err(err) => {
					warn!(
						error = %err,
						entity = "organizations",
						"Matcher failed; bucket left empty."
					);
					Vec::new()
				},
			}
		};
		let post_rows = async {
			if !wants(EntityType::Post) {
				return Vec::new();
			}
			match self.store.search_posts(&query.terms, &query.filters, fetch_limit).await {
				Ok(rows) => rows,
				Err(err) => {
					warn!(error = %err, entity = "posts", "Matcher failed; bucket left empty.");
					Vec::new()
				},
			}
		};
		let (event_rows, user_rows, organization_rows, post_rows) =
			tokio::join!(event_rows, user_rows, organization_rows, post_rows);

		let suggestions = suggest::suggestions(
			&query.raw,
			&event_rows,
			&organization_rows,
			&user_rows,
			&post_rows,
			self.cfg.search.suggestion_limit as usize,
		);

		let ctx = ranking::ScoreContext {
			terms: &query.terms,
			preferred_categories: &preferred,
			now,
			weights: &self.cfg.ranking,
		};
		let relevance_sorted = query.sort == SortMode::Relevance;

		let mut events = Vec::with_capacity(event_rows.len());
		for row in &event_rows {
			let distance_km = match (query.filters.location, row.lat, row.lng) {
				(Some(origin), Some(lat), Some(lng)) =>
					Some(geo::haversine_km(origin, GeoPoint { lat, lng })),
				_ => None,
			};
			if query.filters.location.is_some() {
				// No coordinates means the event cannot be placed inside the radius.
				match distance_km {
					Some(distance) if distance <= query.filters.radius_km => {},
					_ => continue,
				}
			}
			let score = ranking::score_event(row, &ctx);
			if relevance_sorted && score <= 0.0 {
				continue;
			}
			events.push(event_result(row, score, distance_km));
		}

		let mut users = Vec::with_capacity(user_rows.len());
		for row in &user_rows {
			let score = ranking::score_user(row, &ctx);
			if relevance_sorted && score <= 0.0 {
				continue;
			}
			users.push(user_result(row, score));
		}

		let mut organizations = Vec::with_capacity(organization_rows.len());
		for row in &organization_rows {
			let score = ranking::score_organization(row, &ctx);
			if relevance_sorted && score <= 0.0 {
				continue;
			}
			organizations.push(organization_result(row, score));
		}

		let mut posts = Vec::with_capacity(post_rows.len());
		for row in &post_rows {
			let score = ranking::score_post(row, &ctx);
			if relevance_sorted && score <= 0.0 {
				continue;
			}
			posts.push(post_result(row, score));
		}

		ranking::sort_events(&mut events, query.sort);
		ranking::sort_users(&mut users, query.sort);
		ranking::sort_organizations(&mut organizations, query.sort);
		ranking::sort_posts(&mut posts, query.sort);

		let events = paginate(events, query.offset, query.limit);
		let users = paginate(users, query.offset, query.limit);
		let organizations = paginate(organizations, query.offset, query.limit);
		let posts = paginate(posts, query.offset, query.limit);

		let facets = if wants(EntityType::Event) {
			facets::build(self, &query, &events, now).await
		} else {
			Facets::default()
		};

		let trending_cfg = &self.cfg.search.trending;
		let since = now - Duration::hours(trending_cfg.window_hours);
		let trending = match self.store.trending(since, i64::from(trending_cfg.limit)).await {
			Ok(rows) => rows.into_iter().map(|row| row.query_text).collect(),
			Err(err) => {
				warn!(error = %err, "Trending lookup failed; omitting trending queries.");
				Vec::new()
			},
		};

		let related_searches = suggest::related_searches(
			&query.raw,
			&query.terms,
			self.cfg.search.related_limit as usize,
		);

		let total = events.len() + users.len() + organizations.len() + posts.len();
		let search_time_ms = started.elapsed().as_millis() as i64;
		let filters_applied: Vec<String> =
			query.filters.applied_labels().into_iter().map(str::to_string).collect();

		let envelope = SearchResponse {
			query: query.raw.clone(),
			results: SearchResults { events, organizations, users, posts },
			meta: SearchMeta {
				total,
				search_time_ms,
				// Full per-entity counts would need COUNT(*) round-trips; a full
				// page is treated as a signal that more rows exist.
				has_more: total >= query.limit as usize,
				facets,
			},
			suggestions,
			trending,
			related_searches,
			filters_applied: filters_applied.clone(),
		};

		let record = AnalyticsInsert {
			analytics_id: Uuid::new_v4(),
			session_id: query
				.session_id
				.clone()
				.unwrap_or_else(|| Uuid::new_v4().to_string()),
			user_id: query.user_id,
			query_text: query.raw.clone(),
			entity_types: query.entity_types.iter().map(|ty| ty.as_str().to_string()).collect(),
			results_count: total as i32,
			has_results: total > 0,
			search_time_ms,
			filters_applied: serde_json::json!(filters_applied),
			created_at: now,
		};
		analytics::dispatch(self.store.clone(), record);

		if let Some(key) = cache_key {
			self.cache.put(key, envelope.clone(), now, ttl);
		}

		Ok(envelope)
	}
}

fn resolve_query(request: &SearchRequest, cfg: &Config) -> ServiceResult<ResolvedQuery> {
	let raw = request.q.trim();

	if raw.chars().count() < MIN_QUERY_CHARS {
		return Err(ServiceError::InvalidRequest {
			message: format!("Query must be at least {MIN_QUERY_CHARS} characters long."),
		});
	}

	let limit = request.limit.unwrap_or(cfg.search.default_limit);

	if limit == 0 {
		return Err(ServiceError::InvalidRequest {
			message: "Limit must be greater than zero.".to_string(),
		});
	}

	let limit = limit.min(cfg.search.max_limit);
	let offset = request.offset.unwrap_or(0);

	if offset > MAX_OFFSET {
		return Err(ServiceError::InvalidRequest {
			message: format!("Offset must not exceed {MAX_OFFSET}."),
		});
	}

	let entity_types = match &request.types {
		Some(types) if !types.is_empty() => {
			let mut deduped = Vec::new();

			for ty in types {
				if !deduped.contains(ty) {
					deduped.push(*ty);
				}
			}

			deduped
		},
		_ => EntityType::ALL.to_vec(),
	};

	let location = match &request.location {
		Some(raw_location) =>
			Some(geo::parse_latlng(raw_location).ok_or_else(|| ServiceError::InvalidRequest {
				message: "Location must be a \"lat,lng\" pair with in-range coordinates."
					.to_string(),
			})?),
		None => None,
	};
	let radius_km = request.radius_km.unwrap_or(cfg.search.default_radius_km);

	if !radius_km.is_finite() || radius_km <= 0.0 {
		return Err(ServiceError::InvalidRequest {
			message: "Radius must be a positive number of kilometers.".to_string(),
		});
	}

	if let Some(price) = &request.price_range {
		let valid =
			price.min.is_finite() && price.max.is_finite() && price.min >= 0.0 && price.max >= price.min;

		if !valid {
			return Err(ServiceError::InvalidRequest {
				message: "Price range must satisfy 0 <= min <= max.".to_string(),
			});
		}
	}

	if let (Some(from), Some(to)) = (request.date_from, request.date_to) {
		if to < from {
			return Err(ServiceError::InvalidRequest {
				message: "Date range end must not precede its start.".to_string(),
			});
		}
	}

	let filters = SearchFilters {
		category: request
			.category
			.as_deref()
			.map(str::trim)
			.filter(|category| !category.is_empty())
			.map(str::to_string),
		location,
		radius_km,
		date_from: request.date_from,
		date_to: request.date_to,
		price: request.price_range,
		tags: request
			.tags
			.clone()
			.unwrap_or_default()
			.into_iter()
			.filter(|tag| !tag.trim().is_empty())
			.collect(),
		organizer_id: request.organizer_id,
		verified_only: request.verified_only.unwrap_or(false),
		include_past_events: request.include_past_events.unwrap_or(false),
	};

	Ok(ResolvedQuery {
		raw: raw.to_string(),
		terms: expand_terms(raw),
		entity_types,
		filters,
		sort: request.sort_by.unwrap_or_default(),
		limit,
		offset,
		session_id: request.session_id.clone().filter(|id| !id.trim().is_empty()),
		user_id: request.user_id,
	})
}

fn paginate<T>(items: Vec<T>, offset: u32, limit: u32) -> Vec<T> {
	items.into_iter().skip(offset as usize).take(limit as usize).collect()
}

fn event_result(row: &EventRow, relevance_score: f32, distance_km: Option<f64>) -> EventResult {
	EventResult {
		id: row.event_id,
		entity_type: EntityType::Event,
		title: row.title.clone(),
		category: row.category.clone(),
		city: row.city.clone(),
		venue: row.venue.clone(),
		image_url: row.image_url.clone(),
		price_min: row.price_min,
		tickets_available: row.tickets_available,
		likes_count: row.likes_count,
		distance_km,
		relevance_score,
		start_at: row.start_at,
		created_at: row.created_at,
	}
}

fn user_result(row: &UserRow, relevance_score: f32) -> UserResult {
	UserResult {
		id: row.user_id,
		entity_type: EntityType::User,
		username: row.username.clone(),
		display_name: row.display_name.clone(),
		avatar_url: row.avatar_url.clone(),
		verified: row.verified,
		followers_count: row.followers_count,
		relevance_score,
		created_at: row.created_at,
	}
}

fn organization_result(row: &OrganizationRow, relevance_score: f32) -> OrganizationResult {
	OrganizationResult {
		id: row.org_id,
		entity_type: EntityType::Organization,
		name: row.name.clone(),
		slug: row.slug.clone(),
		description: row.description.clone(),
		logo_url: row.logo_url.clone(),
		verified: row.verified,
		followers_count: row.followers_count,
		relevance_score,
		created_at: row.created_at,
	}
}

fn post_result(row: &PostRow, relevance_score: f32) -> PostResult {
	PostResult {
		id: row.post_id,
		entity_type: EntityType::Post,
		title: row.title.clone(),
		body_preview: body_preview(&row.body),
		image_url: row.image_url.clone(),
		event_category: row.event_category.clone(),
		reactions_count: row.reactions_count,
		comments_count: row.comments_count,
		relevance_score,
		created_at: row.created_at,
	}
}

fn body_preview(body: &str) -> String {
	let trimmed = body.trim();

	if trimmed.chars().count() <= POST_PREVIEW_CHARS {
		return trimmed.to_string();
	}

	let cut: String = trimmed.chars().take(POST_PREVIEW_CHARS).collect();

	format!("{}…", cut.trim_end())
}
