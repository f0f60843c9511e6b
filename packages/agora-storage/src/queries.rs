use color_eyre::Result;
use sqlx::{Postgres, QueryBuilder};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use agora_domain::entity::SearchFilters;

use crate::{
	db::Db,
	models::{
		AnalyticsInsert, ClickUpdate, EventRow, FacetCount, OrganizationRow, PostRow, TrendingRow,
		UserRow,
	},
};

const EVENT_TEXT_FIELDS: [&str; 5] = ["title", "description", "category", "city", "venue"];
const USER_TEXT_FIELDS: [&str; 3] = ["username", "display_name", "bio"];
const ORGANIZATION_TEXT_FIELDS: [&str; 3] = ["name", "slug", "description"];
const POST_TEXT_FIELDS: [&str; 2] = ["title", "body"];

const FACET_BUCKET_LIMIT: i64 = 20;
const PREFERRED_CATEGORY_LIMIT: i64 = 5;

pub async fn search_events(
	db: &Db,
	terms: &[String],
	filters: &SearchFilters,
	now: OffsetDateTime,
	fetch_limit: i64,
) -> Result<Vec<EventRow>> {
	let mut builder = QueryBuilder::new(
		"\
SELECT event_id, organizer_id, title, description, category, city, venue, image_url,
	lat, lng, price_min, tickets_available, likes_count, start_at, created_at
FROM events
WHERE status = 'published' AND visibility = 'public'",
	);

	push_event_filters(&mut builder, filters, now);
	builder.push(" AND ");
	push_term_group(&mut builder, terms, &EVENT_TEXT_FIELDS);
	builder.push(" ORDER BY start_at ASC, event_id ASC LIMIT ").push_bind(fetch_limit);

	let rows = builder.build_query_as::<EventRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn search_users(
	db: &Db,
	terms: &[String],
	verified_only: bool,
	fetch_limit: i64,
) -> Result<Vec<UserRow>> {
	let mut builder = QueryBuilder::new(
		"\
SELECT user_id, username, display_name, bio, avatar_url, verified, followers_count, created_at
FROM users
WHERE ",
	);

	push_term_group(&mut builder, terms, &USER_TEXT_FIELDS);

	if verified_only {
		builder.push(" AND verified = TRUE");
	}

	builder.push(" ORDER BY followers_count DESC, user_id ASC LIMIT ").push_bind(fetch_limit);

	let rows = builder.build_query_as::<UserRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn search_organizations(
	db: &Db,
	terms: &[String],
	verified_only: bool,
	fetch_limit: i64,
) -> Result<Vec<OrganizationRow>> {
	let mut builder = QueryBuilder::new(
		"\
SELECT org_id, name, slug, description, logo_url, verified, followers_count, created_at
FROM organizations
WHERE ",
	);

	push_term_group(&mut builder, terms, &ORGANIZATION_TEXT_FIELDS);

	if verified_only {
		builder.push(" AND verified = TRUE");
	}

	builder.push(" ORDER BY followers_count DESC, org_id ASC LIMIT ").push_bind(fetch_limit);

	let rows = builder.build_query_as::<OrganizationRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

pub async fn search_posts(
	db: &Db,
	terms: &[String],
	filters: &SearchFilters,
	fetch_limit: i64,
) -> Result<Vec<PostRow>> {
	let mut builder = QueryBuilder::new(
		"\
SELECT post_id, author_id, title, body, image_url, event_category, reactions_count,
	comments_count, created_at
FROM posts
WHERE visibility = 'public'",
	);

	if let Some(from) = filters.date_from {
		builder.push(" AND created_at >= ").push_bind(from);
	}
	if let Some(to) = filters.date_to {
		builder.push(" AND created_at <= ").push_bind(to);
	}

	builder.push(" AND ");
	push_term_group(&mut builder, terms, &POST_TEXT_FIELDS);
	builder.push(" ORDER BY created_at DESC, post_id ASC LIMIT ").push_bind(fetch_limit);

	let rows = builder.build_query_as::<PostRow>().fetch_all(&db.pool).await?;

	Ok(rows)
}

#[derive(Debug, Default)]
pub struct FacetBuckets {
	pub categories: Vec<FacetCount>,
	pub cities: Vec<FacetCount>,
	pub price_ranges: Vec<FacetCount>,
	pub date_ranges: Vec<FacetCount>,
}

/// Facet aggregation over the full filtered event universe, not just the fetched
/// page. The bracket labels must match `agora_domain::facet` so the client-side
/// fallback produces the same facet names.
pub async fn event_facets(
	db: &Db,
	terms: &[String],
	filters: &SearchFilters,
	now: OffsetDateTime,
) -> Result<FacetBuckets> {
	let categories = grouped_facet(db, "category", terms, filters, now).await?;
	let cities = grouped_facet(db, "city", terms, filters, now).await?;
	let price_ranges = bracket_facet(db, price_bracket_expr(), terms, filters, now).await?;
	let date_ranges = date_bracket_facet(db, terms, filters, now).await?;

	Ok(FacetBuckets { categories, cities, price_ranges, date_ranges })
}

pub async fn trending_queries(
	db: &Db,
	since: OffsetDateTime,
	limit: i64,
) -> Result<Vec<TrendingRow>> {
	let rows = sqlx::query_as(
		"\
SELECT lower(query_text) AS query_text, COUNT(*) AS occurrences
FROM search_analytics
WHERE created_at >= $1 AND has_results
GROUP BY lower(query_text)
ORDER BY occurrences DESC, query_text ASC
LIMIT $2",
	)
	.bind(since)
	.bind(limit)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows)
}

/// Preferred categories for personalization, derived from the user's check-in
/// history, most frequent first.
pub async fn preferred_categories(db: &Db, user_id: Uuid) -> Result<Vec<String>> {
	let rows: Vec<(String,)> = sqlx::query_as(
		"\
SELECT e.category
FROM event_checkins c
JOIN events e ON e.event_id = c.event_id
WHERE c.user_id = $1 AND e.category IS NOT NULL
GROUP BY e.category
ORDER BY COUNT(*) DESC, e.category ASC
LIMIT $2",
	)
	.bind(user_id)
	.bind(PREFERRED_CATEGORY_LIMIT)
	.fetch_all(&db.pool)
	.await?;

	Ok(rows.into_iter().map(|(category,)| category).collect())
}

pub async fn insert_analytics(db: &Db, record: &AnalyticsInsert) -> Result<()> {
	sqlx::query(
		"\
INSERT INTO search_analytics (
	analytics_id,
	session_id,
	user_id,
	query_text,
	entity_types,
	results_count,
	has_results,
	search_time_ms,
	filters_applied,
	created_at
)
VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)",
	)
	.bind(record.analytics_id)
	.bind(record.session_id.as_str())
	.bind(record.user_id)
	.bind(record.query_text.as_str())
	.bind(&record.entity_types)
	.bind(record.results_count)
	.bind(record.has_results)
	.bind(record.search_time_ms)
	.bind(&record.filters_applied)
	.bind(record.created_at)
	.execute(&db.pool)
	.await?;

	Ok(())
}

/// Attributes a click to the most recent analytics row for the same session and
/// query. Returns false when no matching row exists.
pub async fn record_click(db: &Db, click: &ClickUpdate) -> Result<bool> {
	let result = sqlx::query(
		"\
UPDATE search_analytics
SET clicked_result_id = $1, clicked_result_type = $2, position_clicked = $3
WHERE analytics_id = (
	SELECT analytics_id
	FROM search_analytics
	WHERE session_id = $4 AND query_text = $5
	ORDER BY created_at DESC
	LIMIT 1
)",
	)
	.bind(click.clicked_result_id)
	.bind(click.clicked_result_type.as_str())
	.bind(click.position_clicked)
	.bind(click.session_id.as_str())
	.bind(click.query_text.as_str())
	.execute(&db.pool)
	.await?;

	Ok(result.rows_affected() > 0)
}

/// Escapes LIKE metacharacters so user terms match literally inside `%term%`.
pub fn escape_like(term: &str) -> String {
	term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

fn push_event_filters(
	builder: &mut QueryBuilder<'_, Postgres>,
	filters: &SearchFilters,
	now: OffsetDateTime,
) {
	if !filters.include_past_events {
		builder.push(" AND start_at >= ").push_bind(now);
	}
	if let Some(category) = filters.category.clone() {
		builder.push(" AND category = ").push_bind(category);
	}
	if let Some(from) = filters.date_from {
		builder.push(" AND start_at >= ").push_bind(from);
	}
	if let Some(to) = filters.date_to {
		builder.push(" AND start_at <= ").push_bind(to);
	}
	if let Some(price) = filters.price {
		builder.push(" AND COALESCE(price_min, 0) >= ").push_bind(price.min);
		builder.push(" AND COALESCE(price_min, 0) <= ").push_bind(price.max);
	}
	if !filters.tags.is_empty() {
		builder.push(" AND tags && ").push_bind(filters.tags.clone());
	}
	if let Some(organizer_id) = filters.organizer_id {
		builder.push(" AND organizer_id = ").push_bind(organizer_id);
	}
}

/// Pushes the OR-combined `field ILIKE %term%` group, one predicate per term per
/// field. Degenerates to TRUE when no terms are given.
fn push_term_group(builder: &mut QueryBuilder<'_, Postgres>, terms: &[String], fields: &[&str]) {
	if terms.is_empty() {
		builder.push("TRUE");

		return;
	}

	builder.push("(");

	let mut separated = builder.separated(" OR ");

	for term in terms {
		let pattern = format!("%{}%", escape_like(term));

		for field in fields {
			separated.push(format!("{field} ILIKE "));
			separated.push_bind_unseparated(pattern.clone());
		}
	}

	builder.push(")");
}

async fn grouped_facet(
	db: &Db,
	column: &str,
	terms: &[String],
	filters: &SearchFilters,
	now: OffsetDateTime,
) -> Result<Vec<FacetCount>> {
	let mut builder = QueryBuilder::new(format!(
		"\
SELECT {column} AS name, COUNT(*) AS count
FROM events
WHERE status = 'published' AND visibility = 'public' AND {column} IS NOT NULL",
	));

	push_event_filters(&mut builder, filters, now);
	builder.push(" AND ");
	push_term_group(&mut builder, terms, &EVENT_TEXT_FIELDS);
	builder
		.push(format!(" GROUP BY {column} ORDER BY count DESC, name ASC LIMIT "))
		.push_bind(FACET_BUCKET_LIMIT);

	let rows = builder.build_query_as::<FacetCount>().fetch_all(&db.pool).await?;

	Ok(rows)
}

async fn bracket_facet(
	db: &Db,
	bracket_expr: &str,
	terms: &[String],
	filters: &SearchFilters,
	now: OffsetDateTime,
) -> Result<Vec<FacetCount>> {
	let mut builder = QueryBuilder::new(format!(
		"\
SELECT {bracket_expr} AS name, COUNT(*) AS count
FROM events
WHERE status = 'published' AND visibility = 'public'",
	));

	push_event_filters(&mut builder, filters, now);
	builder.push(" AND ");
	push_term_group(&mut builder, terms, &EVENT_TEXT_FIELDS);
	builder.push(" GROUP BY name ORDER BY count DESC, name ASC");

	let rows = builder.build_query_as::<FacetCount>().fetch_all(&db.pool).await?;

	Ok(rows)
}

async fn date_bracket_facet(
	db: &Db,
	terms: &[String],
	filters: &SearchFilters,
	now: OffsetDateTime,
) -> Result<Vec<FacetCount>> {
	let today = now + Duration::days(1);
	let week = now + Duration::days(7);
	let month = now + Duration::days(30);
	let mut builder = QueryBuilder::new("SELECT CASE WHEN start_at < ");

	builder.push_bind(now);
	builder.push(" THEN 'past' WHEN start_at < ").push_bind(today);
	builder.push(" THEN 'today' WHEN start_at < ").push_bind(week);
	builder.push(" THEN 'this_week' WHEN start_at < ").push_bind(month);
	builder.push(
		"\
 THEN 'this_month' ELSE 'later' END AS name, COUNT(*) AS count
FROM events
WHERE status = 'published' AND visibility = 'public'",
	);

	push_event_filters(&mut builder, filters, now);
	builder.push(" AND ");
	push_term_group(&mut builder, terms, &EVENT_TEXT_FIELDS);
	builder.push(" GROUP BY name ORDER BY count DESC, name ASC");

	let rows = builder.build_query_as::<FacetCount>().fetch_all(&db.pool).await?;

	Ok(rows)
}

fn price_bracket_expr() -> &'static str {
	"\
CASE WHEN COALESCE(price_min, 0) <= 0 THEN 'free'
	WHEN price_min < 25 THEN 'under_25'
	WHEN price_min < 50 THEN '25_to_50'
	WHEN price_min < 100 THEN '50_to_100'
	ELSE 'over_100' END"
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn escapes_like_metacharacters() {
		assert_eq!(escape_like("50%_off\\now"), "50\\%\\_off\\\\now");
		assert_eq!(escape_like("plain"), "plain");
	}
}
