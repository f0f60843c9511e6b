use std::sync::Arc;

use axum::{
	body::{self, Body},
	http::{Request, StatusCode},
};
use time::{Duration, OffsetDateTime};
use tower::util::ServiceExt;
use uuid::Uuid;

use agora_api::{routes, state::AppState};
use agora_config::{Config, Postgres, Ranking, Search, Service, Storage};
use agora_domain::entity::SearchFilters;
use agora_service::{BoxFuture, SearchService, SearchStore};
use agora_storage::{
	models::{AnalyticsInsert, ClickUpdate, EventRow, OrganizationRow, PostRow, TrendingRow, UserRow},
	queries::FacetBuckets,
};

/// Canned storage backend so routes can be exercised without Postgres.
struct FixtureStore {
	events: Vec<EventRow>,
	trending: Vec<TrendingRow>,
}

impl SearchStore for FixtureStore {
	fn search_events<'a>(
		&'a self,
		_terms: &'a [String],
		_filters: &'a SearchFilters,
		_now: OffsetDateTime,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<EventRow>>> {
		Box::pin(async move { Ok(self.events.clone()) })
	}

	fn search_users<'a>(
		&'a self,
		_terms: &'a [String],
		_verified_only: bool,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<UserRow>>> {
		Box::pin(async move { Ok(Vec::new()) })
	}

	fn search_organizations<'a>(
		&'a self,
		_terms: &'a [String],
		_verified_only: bool,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<OrganizationRow>>> {
		Box::pin(async move { Ok(Vec::new()) })
	}

	fn search_posts<'a>(
		&'a self,
		_terms: &'a [String],
		_filters: &'a SearchFilters,
		_fetch_limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<PostRow>>> {
		Box::pin(async move { Ok(Vec::new()) })
	}

	fn event_facets<'a>(
		&'a self,
		_terms: &'a [String],
		_filters: &'a SearchFilters,
		_now: OffsetDateTime,
	) -> BoxFuture<'a, color_eyre::Result<FacetBuckets>> {
		Box::pin(async move { Ok(FacetBuckets::default()) })
	}

	fn trending<'a>(
		&'a self,
		_since: OffsetDateTime,
		limit: i64,
	) -> BoxFuture<'a, color_eyre::Result<Vec<TrendingRow>>> {
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
		Box::pin(async move { Ok(Vec::new()) })
	}

	fn insert_analytics<'a>(
		&'a self,
		_record: &'a AnalyticsInsert,
	) -> BoxFuture<'a, color_eyre::Result<()>> {
		Box::pin(async move { Ok(()) })
	}

	fn record_click<'a>(
		&'a self,
		_click: &'a ClickUpdate,
	) -> BoxFuture<'a, color_eyre::Result<bool>> {
		Box::pin(async move { Ok(true) })
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

fn test_app() -> axum::Router {
	let now = OffsetDateTime::now_utc();
	let store = FixtureStore {
		events: vec![EventRow {
			event_id: Uuid::new_v4(),
			organizer_id: None,
			title: "Jazz Night".to_string(),
			description: None,
			category: Some("music".to_string()),
			city: Some("Berlin".to_string()),
			venue: None,
			image_url: None,
			lat: None,
			lng: None,
			price_min: Some(15.0),
			tickets_available: Some(80),
			likes_count: 12,
			start_at: now + Duration::days(3),
			created_at: now - Duration::days(1),
		}],
		trending: vec![TrendingRow { query_text: "jazz night".to_string(), occurrences: 7 }],
	};
	let service = SearchService::with_store(test_config(), Arc::new(store));

	routes::router(AppState::with_service(service))
}

async fn json_body(response: axum::response::Response) -> serde_json::Value {
	let bytes = body::to_bytes(response.into_body(), usize::MAX)
		.await
		.expect("Failed to read response body.");

	serde_json::from_slice(&bytes).expect("Failed to parse response.")
}

#[tokio::test]
async fn health_ok() {
	let response = test_app()
		.oneshot(
			Request::builder()
				.uri("/health")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /health.");

	assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn search_returns_the_envelope() {
	let payload = serde_json::json!({ "q": "jazz" });
	let response = test_app()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/search")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /v1/search.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["query"], "jazz");
	assert_eq!(json["results"]["events"][0]["title"], "Jazz Night");
	assert_eq!(json["meta"]["total"], 1);
	assert_eq!(json["trending"][0], "jazz night");
}

#[tokio::test]
async fn short_query_is_a_bad_request() {
	let payload = serde_json::json!({ "q": "a" });
	let response = test_app()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/search")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /v1/search.");

	assert_eq!(response.status(), StatusCode::BAD_REQUEST);

	let json = json_body(response).await;

	assert_eq!(json["error_code"], "invalid_request");
}

#[tokio::test]
async fn trending_endpoint_reads_query_params() {
	let response = test_app()
		.oneshot(
			Request::builder()
				.uri("/v1/search/trending?limit=3")
				.body(Body::empty())
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /v1/search/trending.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["entries"][0]["query"], "jazz night");
	assert_eq!(json["entries"][0]["count"], 7);
}

#[tokio::test]
async fn click_endpoint_acknowledges_the_click() {
	let payload = serde_json::json!({
		"session_id": "session-1",
		"query": "jazz",
		"result_id": Uuid::new_v4(),
		"result_type": "events",
		"position": 0
	});
	let response = test_app()
		.oneshot(
			Request::builder()
				.method("POST")
				.uri("/v1/search/click")
				.header("content-type", "application/json")
				.body(Body::from(payload.to_string()))
				.expect("Failed to build request."),
		)
		.await
		.expect("Failed to call /v1/search/click.");

	assert_eq!(response.status(), StatusCode::OK);

	let json = json_body(response).await;

	assert_eq!(json["recorded"], true);
}
