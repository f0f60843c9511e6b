pub mod analytics;
pub mod cache;
pub mod search;
pub mod time_serde;

use std::{future::Future, pin::Pin, sync::Arc};

use time::OffsetDateTime;
use uuid::Uuid;

use agora_config::Config;
use agora_domain::entity::SearchFilters;
use agora_storage::{
	db::Db,
	models::{AnalyticsInsert, ClickUpdate, EventRow, OrganizationRow, PostRow, TrendingRow, UserRow},
	queries::{self, FacetBuckets},
};
pub use analytics::{
	ClickRequest, ClickResponse, TrendingEntry, TrendingRequest, TrendingResponse,
};
use cache::ResultCache;
pub use search::{
	EventResult, Facet, Facets, OrganizationResult, PostResult, SearchMeta, SearchRequest,
	SearchResponse, SearchResults, UserResult,
};

pub type ServiceResult<T> = Result<T, ServiceError>;

pub type BoxFuture<'a, T> = Pin<Box<dyn Future<Output = T> + Send + 'a>>;

/// Storage seam for the aggregator. Every method maps to one query in
/// `agora_storage::queries`; tests swap in in-memory implementations.
pub trait SearchStore
where
	Self: Send + Sync,
{
	fn search_events<'a>(
		&'a self,
		terms: &'a [String],
		filters: &'a SearchFilters,
		now: OffsetDateTime,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<EventRow>>>;

	fn search_users<'a>(
		&'a self,
		terms: &'a [String],
		verified_only: bool,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<UserRow>>>;

	fn search_organizations<'a>(
		&'a self,
		terms: &'a [String],
		verified_only: bool,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<OrganizationRow>>>;

	fn search_posts<'a>(
		&'a self,
		terms: &'a [String],
		filters: &'a SearchFilters,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PostRow>>>;

	fn event_facets<'a>(
		&'a self,
		terms: &'a [String],
		filters: &'a SearchFilters,
		now: OffsetDateTime,
	) -> BoxFuture<'a, color_eyre::Result<FacetBuckets>>;

	fn trending<'a>(
		&'a self,
		since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<TrendingRow>>>;

	fn preferred_categories<'a>(
		&'a self,
		user_id: Uuid,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>>;

	fn insert_analytics<'a>(
		&'a self,
		record: &'a AnalyticsInsert,
	) -> BoxFuture<'a, color_eyre::Result<()>>;

	fn record_click<'a>(&'a self, click: &'a ClickUpdate)
	-> BoxFuture<'a, color_eyre::Result<bool>>;
}

#[derive(Debug)]
pub enum ServiceError {
	InvalidRequest { message: String },
	Storage { message: String },
}

pub struct SearchService {
	pub cfg: Config,
	pub store: Arc<dyn SearchStore>,
	cache: ResultCache,
}

struct DefaultStore {
	db: Db,
}

impl std::fmt::Display for ServiceError {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::InvalidRequest { message } => write!(f, "Invalid request: {message}"),
			Self::Storage { message } => write!(f, "Storage error: {message}"),
		}
	}
}

impl std::error::Error for ServiceError {}

impl From<sqlx::Error> for ServiceError {
	fn from(err: sqlx::Error) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl From<color_eyre::Report> for ServiceError {
	fn from(err: color_eyre::Report) -> Self {
		Self::Storage { message: err.to_string() }
	}
}

impl SearchStore for DefaultStore {
	fn search_events<'a>(
		&'a self,
		terms: &'a [String],
		filters: &'a SearchFilters,
		now: OffsetDateTime,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<EventRow>>> {
		Box::pin(async move {
			Ok(queries::search_events(&self.db, terms, filters, now, fetch_limit).await?)
		})
	}

	fn search_users<'a>(
		&'a self,
		terms: &'a [String],
		verified_only: bool,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<UserRow>>> {
		Box::pin(async move {
			Ok(queries::search_users(&self.db, terms, verified_only, fetch_limit).await?)
		})
	}

	fn search_organizations<'a>(
		&'a self,
		terms: &'a [String],
		verified_only: bool,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<OrganizationRow>>> {
		Box::pin(async move {
			Ok(queries::search_organizations(&self.db, terms, verified_only, fetch_limit).await?)
		})
	}

	fn search_posts<'a>(
		&'a self,
		terms: &'a [String],
		filters: &'a SearchFilters,
		fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PostRow>>> {
		Box::pin(
			async move { Ok(queries::search_posts(&self.db, terms, filters, fetch_limit).await?) },
		)
	}

	fn event_facets<'a>(
		&'a self,
		terms: &'a [String],
		filters: &'a SearchFilters,
		now: OffsetDateTime,
	) -> BoxFuture<'a, color_eyre::Result<FacetBuckets>> {
		Box::pin(async move { Ok(queries::event_facets(&self.db, terms, filters, now).await?) })
	}

	fn trending<'a>(
		&'a self,
		since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<TrendingRow>>> {
		Box::pin(async move { Ok(queries::trending_queries(&self.db, since, limit).await?) })
	}

	fn preferred_categories<'a>(
		&'a self,
		user_id: Uuid,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		Box::pin(async move { Ok(queries::preferred_categories(&self.db, user_id).await?) })
	}

	fn insert_analytics<'a>(
		&'a self,
		record: &'a AnalyticsInsert,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(queries::insert_analytics(&self.db, record).await?) })
	}

	fn record_click<'a>(
		&'a self,
		click: &'a ClickUpdate,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(async move { Ok(queries::record_click(&self.db, click).await?) })
	}
}

impl SearchService {
	pub fn new(cfg: Config, db: Db) -> Self {
		Self::with_store(cfg, Arc::new(DefaultStore { db }))
	}

	pub fn with_store(cfg: Config, store: Arc<dyn SearchStore>) -> Self {
		Self { cfg, store, cache: ResultCache::new() }
	}
}
