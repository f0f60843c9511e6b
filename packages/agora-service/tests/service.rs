use std::sync::{
	Arc,
	atomic::{AtomicUsize, Ordering},
};

use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use agora_config::{Config, Postgres, Ranking, Search, Service, Storage};
use agora_domain::entity::{EntityType, SearchFilters, SortMode};
use agora_service::{
	BoxFuture, ClickRequest, SearchRequest, SearchService, SearchStore, ServiceError,
	TrendingRequest,
};
use agora_storage::{
	models::{AnalyticsInsert, ClickUpdate, EventRow, OrganizationRow, PostRow, TrendingRow, UserRow},
	queries::FacetBuckets,
};

#[derive(Default)]
struct SpyStore {
	events: Vec<EventRow>,
	users: Vec<UserRow>,
	organizations: Vec<OrganizationRow>,
	posts: Vec<PostRow>,
	trending: Vec<TrendingRow>,
	fail_events: bool,
	click_recorded: bool,
	event_calls: AtomicUsize,
	user_calls: AtomicUsize,
	organization_calls: AtomicUsize,
	post_calls: AtomicUsize,
	facet_calls: AtomicUsize,
	trending_calls: AtomicUsize,
	preferred_calls: AtomicUsize,
	analytics_calls: AtomicUsize,
	click_calls: AtomicUsize,
}

impl SpyStore {
	fn matcher_calls(&self) -> usize {
		self.event_calls.load(Ordering::SeqCst)
			+ self.user_calls.load(Ordering::SeqCst)
			+ self.organization_calls.load(Ordering::SeqCst)
			+ self.post_calls.load(Ordering::SeqCst)
	}
}

impl SearchStore for SpyStore {
	fn search_events<'a>(
		&'a self,
		_terms: &'a [String],
		_filters: &'a SearchFilters,
		_now: OffsetDateTime,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<EventRow>>> {
		self.event_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move {
			if self.fail_events {
				return Err(color_eyre::eyre::eyre!("events unavailable"));
			}
			Ok(self.events.clone())
		})
	}

	fn search_users<'a>(
		&'a self,
		_terms: &'a [String],
		_verified_only: bool,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<UserRow>>> {
		self.user_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move { Ok(self.users.clone()) })
	}

	fn search_organizations<'a>(
		&'a self,
		_terms: &'a [String],
		_verified_only: bool,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<OrganizationRow>>> {
		self.organization_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move { Ok(self.organizations.clone()) })
	}

	fn search_posts<'a>(
		&'a self,
		_terms: &'a [String],
		_filters: &'a SearchFilters,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PostRow>>> {
		self.post_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move { Ok(self.posts.clone()) })
	}

	fn event_facets<'a>(
		&'a self,
		_terms: &'a [String],
		_filters: &'a SearchFilters,
		_now: OffsetDateTime,
	) -> BoxFuture<'a, color_eyre::Result<FacetBuckets>> {
		self.facet_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move { Ok(FacetBuckets::default()) })
	}

	fn trending<'a>(
		&'a self,
		_since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<TrendingRow>>> {
		self.trending_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move {
			let mut rows = self.trending.clone();
			rows.truncate(limit as usize);
			Ok(rows)
		})
	}

	fn preferred_categories<'a>(
		&'a self,
		_user_id: Uuid,
	) -> BoxFuture<'a, color_eyre::Result<Vec<String>>> {
		self.preferred_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move { Ok(Vec::new()) })
	}

	fn insert_analytics<'a>(
		&'a self,
		_record: &'a AnalyticsInsert,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		self.analytics_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move { Ok(()) })
	}

	fn record_click<'a>(
		&'a self,
		_click: &'a ClickUpdate,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		self.click_calls.fetch_add(1, Ordering::SeqCst);
		Box::pin(async move { Ok(self.click_recorded) })
	}
}

fn test_config() -> Config {
	Config {
		service: Service { http_bind: "127.0.0.1:0".to_string(), log_level: "info".to_string() },
		storage: Storage {
			postgres: Postgres { dsn: "postgres://unused".to_string(), pool_max_conns: 1 },
		},
		search: Search::default(),
		ranking: Ranking::default(),
	}
}

fn service_with(store: SpyStore) -> (SearchService, Arc<SpyStore>) {
	let store = Arc::new(store);

	(SearchService::with_store(test_config(), store.clone()), store)
}

fn request(q: &str) -> SearchRequest {
	SearchRequest { q: q.to_string(), ..SearchRequest::default() }
}

fn event(title: &str, category: Option<&str>, days_out: i64) -> EventRow {
	let now = OffsetDateTime::now_utc();

	EventRow {
		event_id: Uuid::new_v4(),
		organizer_id: None,
		title: title.to_string(),
		description: None,
		category: category.map(str::to_string),
		city: None,
		venue: None,
		image_url: None,
		lat: None,
		lng: None,
		price_min: None,
		tickets_available: None,
		likes_count: 0,
		start_at: now + Duration::days(days_out),
		created_at: now - Duration::days(1),
	}
}

fn located_event(title: &str, lat: f64, lng: f64) -> EventRow {
	EventRow { lat: Some(lat), lng: Some(lng), ..event(title, None, 60) }
}

fn user(username: &str, verified: bool, followers: i64) -> UserRow {
	UserRow {
		user_id: Uuid::new_v4(),
		username: username.to_string(),
		display_name: None,
		bio: None,
		avatar_url: None,
		verified,
		followers_count: followers,
		created_at: OffsetDateTime::now_utc(),
	}
}

fn post(body: &str, reactions: i64, comments: i64) -> PostRow {
	PostRow {
		post_id: Uuid::new_v4(),
		author_id: None,
		title: None,
		body: body.to_string(),
		image_url: None,
		event_category: None,
		reactions_count: reactions,
		comments_count: comments,
		created_at: OffsetDateTime::now_utc(),
	}
}

async fn wait_for_analytics(store: &SpyStore) -> usize {
	for _ in 0..100 {
		let calls = store.analytics_calls.load(Ordering::SeqCst);

		if calls > 0 {
			return calls;
		}

		tokio::time::sleep(std::time::Duration::from_millis(5)).await;
	}

	store.analytics_calls.load(Ordering::SeqCst)
}

#[tokio::test]
async fn short_query_is_rejected_before_any_store_call() {
	let (service, store) = service_with(SpyStore::default());
	let err = service.search(request(" a ")).await.expect_err("Expected a validation error.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
	assert_eq!(store.matcher_calls(), 0);
	assert_eq!(store.trending_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_location_is_rejected() {
	let (service, store) = service_with(SpyStore::default());
	let mut req = request("jazz");
	req.location = Some("somewhere".to_string());
	let err = service.search(req).await.expect_err("Expected a validation error.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
	assert_eq!(store.matcher_calls(), 0);
}

#[tokio::test]
async fn matching_events_are_scored_and_ordered_by_relevance() {
	let store = SpyStore {
		events: vec![
			event("Evening market", None, 60),
			event("Jazz Night", None, 3),
			event("Jazz Brunch", None, 60),
		],
		..SpyStore::default()
	};
	let (service, _) = service_with(store);
	let response = service.search(request("jazz")).await.expect("Expected a search response.");
	let events = &response.results.events;

	// "Evening market" never matches a term, so relevance sorting drops it.
	assert_eq!(events.len(), 2);
	// The soon event earns the recency bonus on top of the title match.
	assert_eq!(events[0].title, "Jazz Night");
	assert!(events[0].relevance_score > events[1].relevance_score);
	assert_eq!(response.meta.total, 2);
	assert!(!response.meta.has_more);
}

#[tokio::test]
async fn identical_search_is_served_from_cache() {
	let store = SpyStore { events: vec![event("Jazz Night", None, 3)], ..SpyStore::default() };
	let (service, store) = service_with(store);

	let first = service.search(request("jazz")).await.expect("Expected a search response.");
	let calls_after_first = store.matcher_calls();
	let second = service.search(request("jazz")).await.expect("Expected a search response.");

	assert_eq!(store.matcher_calls(), calls_after_first);

	// A hit replays the stored envelope byte for byte, timing included.
	let first = serde_json::to_value(&first).expect("Expected a serializable envelope.");
	let second = serde_json::to_value(&second).expect("Expected a serializable envelope.");
	assert_eq!(first, second);
}

#[tokio::test]
async fn changing_the_offset_bypasses_the_cache() {
	let store = SpyStore { events: vec![event("Jazz Night", None, 3)], ..SpyStore::default() };
	let (service, store) = service_with(store);

	service.search(request("jazz")).await.expect("Expected a search response.");
	let calls_after_first = store.matcher_calls();

	let mut paged = request("jazz");
	paged.offset = Some(20);
	service.search(paged).await.expect("Expected a search response.");

	assert!(store.matcher_calls() > calls_after_first);
}

#[tokio::test]
async fn failed_matcher_degrades_to_an_empty_bucket() {
	let store = SpyStore {
		fail_events: true,
		users: vec![user("jazzcat", true, 10)],
		..SpyStore::default()
	};
	let (service, _) = service_with(store);
	let response = service.search(request("jazz")).await.expect("Expected a search response.");

	assert!(response.results.events.is_empty());
	assert_eq!(response.results.users.len(), 1);
	assert_eq!(response.meta.total, 1);
}

#[tokio::test]
async fn requested_types_scope_the_fan_out() {
	let store = SpyStore { users: vec![user("jazzcat", false, 10)], ..SpyStore::default() };
	let (service, store) = service_with(store);
	let mut req = request("jazz");
	req.types = Some(vec![EntityType::User]);
	let response = service.search(req).await.expect("Expected a search response.");

	assert_eq!(store.user_calls.load(Ordering::SeqCst), 1);
	assert_eq!(store.event_calls.load(Ordering::SeqCst), 0);
	assert_eq!(store.post_calls.load(Ordering::SeqCst), 0);
	assert_eq!(store.facet_calls.load(Ordering::SeqCst), 0);
	assert!(response.results.events.is_empty());
	assert_eq!(response.results.users.len(), 1);
}

#[tokio::test]
async fn zero_engagement_posts_are_dropped_only_under_relevance_sort() {
	let store = SpyStore {
		posts: vec![post("all about jazz", 0, 0), post("jazz rehearsal notes", 2, 1)],
		..SpyStore::default()
	};
	let (service, _) = service_with(store);

	let by_relevance =
		service.search(request("jazz")).await.expect("Expected a search response.");
	assert_eq!(by_relevance.results.posts.len(), 1);

	let mut by_date = request("jazz");
	by_date.sort_by = Some(SortMode::Date);
	let by_date = service.search(by_date).await.expect("Expected a search response.");
	assert_eq!(by_date.results.posts.len(), 2);
}

#[tokio::test]
async fn date_sort_orders_buckets_newest_first() {
	let now = OffsetDateTime::now_utc();
	let store = SpyStore {
		events: vec![
			event("Jazz Brunch", None, 5),
			event("Jazz Festival", None, 90),
			event("Jazz Night", None, 30),
		],
		posts: vec![
			PostRow { created_at: now - Duration::days(9), ..post("jazz rehearsal", 1, 0) },
			PostRow { created_at: now - Duration::days(1), ..post("jazz tonight", 1, 0) },
			PostRow { created_at: now - Duration::days(4), ..post("jazz lineup", 1, 0) },
		],
		..SpyStore::default()
	};
	let (service, _) = service_with(store);
	let mut req = request("jazz");
	req.sort_by = Some(SortMode::Date);
	let response = service.search(req).await.expect("Expected a search response.");

	let event_titles: Vec<&str> =
		response.results.events.iter().map(|event| event.title.as_str()).collect();
	assert_eq!(event_titles, vec!["Jazz Festival", "Jazz Night", "Jazz Brunch"]);
	let starts: Vec<OffsetDateTime> =
		response.results.events.iter().map(|event| event.start_at).collect();
	assert!(starts.windows(2).all(|pair| pair[0] >= pair[1]));
	let post_dates: Vec<OffsetDateTime> =
		response.results.posts.iter().map(|post| post.created_at).collect();
	assert_eq!(post_dates.len(), 3);
	assert!(post_dates.windows(2).all(|pair| pair[0] >= pair[1]));
}

#[tokio::test]
async fn location_filter_excludes_far_and_unlocated_events() {
	// Berlin center; one event in Berlin, one in Hamburg, one with no coordinates.
	let store = SpyStore {
		events: vec![
			located_event("Jazz in Berlin", 52.52, 13.40),
			located_event("Jazz in Hamburg", 53.55, 9.99),
			event("Jazz somewhere", None, 60),
		],
		..SpyStore::default()
	};
	let (service, _) = service_with(store);
	let mut req = request("jazz");
	req.location = Some("52.52,13.40".to_string());
	req.radius_km = Some(50.0);
	let response = service.search(req).await.expect("Expected a search response.");
	let events = &response.results.events;

	assert_eq!(events.len(), 1);
	assert_eq!(events[0].title, "Jazz in Berlin");
	assert!(events[0].distance_km.expect("Expected a distance.") < 1.0);
}

#[tokio::test]
async fn distance_sort_orders_by_proximity() {
	let store = SpyStore {
		events: vec![
			located_event("Jazz in Potsdam", 52.40, 13.06),
			located_event("Jazz in Berlin", 52.52, 13.40),
		],
		..SpyStore::default()
	};
	let (service, _) = service_with(store);
	let mut req = request("jazz");
	req.location = Some("52.52,13.40".to_string());
	req.sort_by = Some(SortMode::Distance);
	let response = service.search(req).await.expect("Expected a search response.");
	let titles: Vec<&str> =
		response.results.events.iter().map(|event| event.title.as_str()).collect();

	assert_eq!(titles, vec!["Jazz in Berlin", "Jazz in Potsdam"]);
}

#[tokio::test]
async fn envelope_carries_suggestions_trending_and_related() {
	let store = SpyStore {
		events: vec![event("Concert under the stars", None, 3)],
		trending: vec![
			TrendingRow { query_text: "jazz night".to_string(), occurrences: 9 },
			TrendingRow { query_text: "food festival".to_string(), occurrences: 4 },
		],
		..SpyStore::default()
	};
	let (service, _) = service_with(store);
	let response = service.search(request("concert")).await.expect("Expected a search response.");

	assert_eq!(response.suggestions, vec!["Concert under the stars".to_string()]);
	assert_eq!(
		response.trending,
		vec!["jazz night".to_string(), "food festival".to_string()]
	);
	// "concert" expands to synonyms; the typed query itself is excluded.
	assert!(!response.related_searches.is_empty());
	assert!(!response.related_searches.contains(&"concert".to_string()));
}

#[tokio::test]
async fn search_dispatches_one_analytics_record() {
	let store = SpyStore { events: vec![event("Jazz Night", None, 3)], ..SpyStore::default() };
	let (service, store) = service_with(store);
	let mut req = request("jazz");
	req.session_id = Some("session-1".to_string());
	service.search(req).await.expect("Expected a search response.");

	assert_eq!(wait_for_analytics(&store).await, 1);
}

#[tokio::test]
async fn filters_applied_echoes_the_active_filters() {
	let store = SpyStore::default();
	let (service, _) = service_with(store);
	let mut req = request("jazz");
	req.category = Some("music".to_string());
	req.verified_only = Some(true);
	let response = service.search(req).await.expect("Expected a search response.");

	assert_eq!(
		response.filters_applied,
		vec!["category".to_string(), "verified_only".to_string()]
	);
}

#[tokio::test]
async fn trending_clamps_the_limit_to_the_configured_maximum() {
	let rows: Vec<TrendingRow> = (0..20)
		.map(|i| TrendingRow { query_text: format!("query {i}"), occurrences: 20 - i })
		.collect();
	let store = SpyStore { trending: rows, ..SpyStore::default() };
	let (service, _) = service_with(store);
	let response = service
		.trending(TrendingRequest { window_hours: None, limit: Some(50) })
		.await
		.expect("Expected a trending response.");

	// Configured max_limit is 10.
	assert_eq!(response.entries.len(), 10);
	assert_eq!(response.entries[0].query, "query 0");
}

#[tokio::test]
async fn trending_rejects_a_non_positive_window() {
	let (service, _) = service_with(SpyStore::default());
	let err = service
		.trending(TrendingRequest { window_hours: Some(0), limit: None })
		.await
		.expect_err("Expected a validation error.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
}

#[tokio::test]
async fn click_requires_a_session_and_query() {
	let (service, store) = service_with(SpyStore::default());
	let err = service
		.record_click(ClickRequest {
			session_id: " ".to_string(),
			query: "jazz".to_string(),
			result_id: Uuid::new_v4(),
			result_type: EntityType::Event,
			position: 0,
		})
		.await
		.expect_err("Expected a validation error.");

	assert!(matches!(err, ServiceError::InvalidRequest { .. }));
	assert_eq!(store.click_calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn click_reports_whether_a_search_was_attributed() {
	let store = SpyStore { click_recorded: true, ..SpyStore::default() };
	let (service, store) = service_with(store);
	let response = service
		.record_click(ClickRequest {
			session_id: "session-1".to_string(),
			query: "jazz".to_string(),
			result_id: Uuid::new_v4(),
			result_type: EntityType::Event,
			position: 2,
		})
		.await
		.expect("Expected a click response.");

	assert!(response.recorded);
	assert_eq!(store.click_calls.load(Ordering::SeqCst), 1);
}
