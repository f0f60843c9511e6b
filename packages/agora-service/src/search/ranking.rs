use std::cmp::Ordering;

use time::{Duration, OffsetDateTime};

use agora_config::Ranking;
use agora_domain::entity::SortMode;
use agora_storage::models::{EventRow, OrganizationRow, PostRow, UserRow};

use crate::search::{EventResult, OrganizationResult, PostResult, UserResult};

/// Shared inputs for a scoring pass. Terms are already lowercased by the
/// expansion step; preferred categories come from the user's check-in history.
pub(crate) struct ScoreContext<'a> {
	pub(crate) terms: &'a [String],
	pub(crate) preferred_categories: &'a [String],
	pub(crate) now: OffsetDateTime,
	pub(crate) weights: &'a Ranking,
}

pub(crate) fn score_event(row: &EventRow, ctx: &ScoreContext<'_>) -> f32 {
	let weights = &ctx.weights.event;
	let mut score = 0.0;

	if matches_any(ctx.terms, Some(&row.title)) {
		score += weights.title;
	}
	if matches_any(ctx.terms, row.description.as_deref()) {
		score += weights.description;
	}
	if matches_any(ctx.terms, row.category.as_deref()) {
		score += weights.category;
	}
	if matches_any(ctx.terms, row.city.as_deref()) {
		score += weights.city;
	}
	if matches_any(ctx.terms, row.venue.as_deref()) {
		score += weights.venue;
	}
	if let Some(category) = row.category.as_deref() {
		if ctx.preferred_categories.iter().any(|preferred| preferred.eq_ignore_ascii_case(category))
		{
			score += weights.preferred_category;
		}
	}

	let until_start = row.start_at - ctx.now;

	if until_start >= Duration::ZERO {
		if until_start <= Duration::days(7) {
			score += weights.starts_within_week;
		} else if until_start <= Duration::days(30) {
			score += weights.starts_within_month;
		}
	}

	score
}

pub(crate) fn score_user(row: &UserRow, ctx: &ScoreContext<'_>) -> f32 {
	let weights = &ctx.weights.user;
	let mut score = 0.0;

	if matches_any(ctx.terms, Some(&row.username)) {
		score += weights.username;
	}
	if matches_any(ctx.terms, row.display_name.as_deref()) {
		score += weights.display_name;
	}
	if matches_any(ctx.terms, row.bio.as_deref()) {
		score += weights.bio;
	}
	if row.verified {
		score += weights.verified;
	}

	score
}

pub(crate) fn score_organization(row: &OrganizationRow, ctx: &ScoreContext<'_>) -> f32 {
	let weights = &ctx.weights.organization;
	let mut score = 0.0;

	if matches_any(ctx.terms, Some(&row.name)) {
		score += weights.name;
	}
	if matches_any(ctx.terms, Some(&row.slug)) {
		score += weights.slug;
	}
	if matches_any(ctx.terms, row.description.as_deref()) {
		score += weights.description;
	}
	if row.verified {
		score += weights.verified;
	}

	score
}

/// Posts score on engagement, not text overlap; the matcher already guarantees
/// a text match, so an untouched post with no affinity legitimately scores zero.
pub(crate) fn score_post(row: &PostRow, ctx: &ScoreContext<'_>) -> f32 {
	let weights = &ctx.weights.post;
	let mut score =
		row.reactions_count as f32 * weights.reaction + row.comments_count as f32 * weights.comment;

	if let Some(category) = row.event_category.as_deref() {
		if ctx.preferred_categories.iter().any(|preferred| preferred.eq_ignore_ascii_case(category))
		{
			score += weights.category_affinity;
		}
	}

	score
}

pub(crate) fn sort_events(items: &mut [EventResult], sort: SortMode) {
	match sort {
		SortMode::Relevance => sort_by_score(items, |item| item.relevance_score),
		SortMode::Date => items.sort_by(|a, b| b.start_at.cmp(&a.start_at)),
		SortMode::Popularity => items.sort_by(|a, b| b.likes_count.cmp(&a.likes_count)),
		SortMode::Distance => {
			// Events without coordinates degrade to relevance order among
			// themselves, same as the buckets that carry no coordinates at all.
			sort_by_score(items, |item| item.relevance_score);
			items.sort_by(|a, b| match (a.distance_km, b.distance_km) {
				(Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
				(Some(_), None) => Ordering::Less,
				(None, Some(_)) => Ordering::Greater,
				(None, None) => Ordering::Equal,
			});
		},
	}
}

pub(crate) fn sort_users(items: &mut [UserResult], sort: SortMode) {
	match sort {
		SortMode::Date => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
		SortMode::Popularity => items.sort_by(|a, b| b.followers_count.cmp(&a.followers_count)),
		// Users carry no coordinates, so distance degrades to relevance.
		SortMode::Relevance | SortMode::Distance =>
			sort_by_score(items, |item| item.relevance_score),
	}
}

pub(crate) fn sort_organizations(items: &mut [OrganizationResult], sort: SortMode) {
	match sort {
		SortMode::Date => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
		SortMode::Popularity => items.sort_by(|a, b| b.followers_count.cmp(&a.followers_count)),
		SortMode::Relevance | SortMode::Distance =>
			sort_by_score(items, |item| item.relevance_score),
	}
}

pub(crate) fn sort_posts(items: &mut [PostResult], sort: SortMode) {
	match sort {
		SortMode::Date => items.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
		SortMode::Popularity => items
			.sort_by(|a, b| (b.reactions_count + b.comments_count).cmp(&(a.reactions_count + a.comments_count))),
		SortMode::Relevance | SortMode::Distance =>
			sort_by_score(items, |item| item.relevance_score),
	}
}

// Stable sort keeps the matcher's deterministic order as the tie-breaker.
fn sort_by_score<T>(items: &mut [T], score: impl Fn(&T) -> f32) {
	items.sort_by(|a, b| score(b).partial_cmp(&score(a)).unwrap_or(Ordering::Equal));
}

fn matches_any(terms: &[String], field: Option<&str>) -> bool {
	let Some(field) = field else {
		return false;
	};
	let lowered = field.to_lowercase();

	terms.iter().any(|term| lowered.contains(term.as_str()))
}
