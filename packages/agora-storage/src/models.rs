use serde_json::Value;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct EventRow {
	pub event_id: Uuid,
	pub organizer_id: Option<Uuid>,
	pub title: String,
	pub description: Option<String>,
	pub category: Option<String>,
	pub city: Option<String>,
	pub venue: Option<String>,
	pub image_url: Option<String>,
	pub lat: Option<f64>,
	pub lng: Option<f64>,
	pub price_min: Option<f64>,
	pub tickets_available: Option<i32>,
	pub likes_count: i64,
	pub start_at: OffsetDateTime,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserRow {
	pub user_id: Uuid,
	pub username: String,
	pub display_name: Option<String>,
	pub bio: Option<String>,
	pub avatar_url: Option<String>,
	pub verified: bool,
	pub followers_count: i64,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct OrganizationRow {
	pub org_id: Uuid,
	pub name: String,
	pub slug: String,
	pub description: Option<String>,
	pub logo_url: Option<String>,
	pub verified: bool,
	pub followers_count: i64,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostRow {
	pub post_id: Uuid,
	pub author_id: Option<Uuid>,
	pub title: Option<String>,
	pub body: String,
	pub image_url: Option<String>,
	pub event_category: Option<String>,
	pub reactions_count: i64,
	pub comments_count: i64,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct FacetCount {
	pub name: String,
	pub count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TrendingRow {
	pub query_text: String,
	pub occurrences: i64,
}

/// One write-only analytics row per search. Click fields start NULL and are set at
/// most once by the click follow-up.
#[derive(Debug, Clone)]
pub struct AnalyticsInsert {
	pub analytics_id: Uuid,
	pub session_id: String,
	pub user_id: Option<Uuid>,
	pub query_text: String,
	pub entity_types: Vec<String>,
	pub results_count: i32,
	pub has_results: bool,
	pub search_time_ms: i64,
	pub filters_applied: Value,
	pub created_at: OffsetDateTime,
}

#[derive(Debug, Clone)]
pub struct ClickUpdate {
	pub session_id: String,
	pub query_text: String,
	pub clicked_result_id: Uuid,
	pub clicked_result_type: String,
	pub position_clicked: i32,
}
