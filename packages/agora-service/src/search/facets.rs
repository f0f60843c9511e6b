use std::collections::HashMap;

use time::OffsetDateTime;
use tracing::warn;

use agora_domain::facet::{date_bracket, price_bracket};
use agora_storage::{models::FacetCount, queries::FacetBuckets};

use crate::{SearchService, search::{EventResult, ResolvedQuery}};

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct Facet {
	pub name: String,
	pub count: i64,
}

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct Facets {
	pub categories: Vec<Facet>,
	pub locations: Vec<Facet>,
	pub price_ranges: Vec<Facet>,
	pub date_ranges: Vec<Facet>,
}

/// Facets describe the filtered event universe. The aggregation query is the
/// accurate source; when it fails (or is disabled) the current page stands in,
/// trading count precision for availability.
pub(crate) async fn build(
	service: &SearchService,
	query: &ResolvedQuery,
	page: &[EventResult],
	now: OffsetDateTime,
) -> Facets {
	if service.cfg.search.facets.remote {
		match service.store.event_facets(&query.terms, &query.filters, now).await {
			Ok(buckets) => return from_buckets(buckets),
			Err(err) => {
				warn!(error = %err, "Facet aggregation failed; deriving facets from the page.");
			},
		}
	}

	page_facets(page, now)
}

fn from_buckets(buckets: FacetBuckets) -> Facets {
	Facets {
		categories: convert(buckets.categories),
		locations: convert(buckets.cities),
		price_ranges: convert(buckets.price_ranges),
		date_ranges: convert(buckets.date_ranges),
	}
}

fn convert(counts: Vec<FacetCount>) -> Vec<Facet> {
	counts.into_iter().map(|count| Facet { name: count.name, count: count.count }).collect()
}

pub(crate) fn page_facets(page: &[EventResult], now: OffsetDateTime) -> Facets {
	let mut categories: HashMap<&str, i64> = HashMap::new();
	let mut locations: HashMap<&str, i64> = HashMap::new();
	let mut price_ranges: HashMap<&str, i64> = HashMap::new();
	let mut date_ranges: HashMap<&str, i64> = HashMap::new();

	for event in page {
		if let Some(category) = event.category.as_deref() {
			*categories.entry(category).or_default() += 1;
		}
		if let Some(city) = event.city.as_deref() {
			*locations.entry(city).or_default() += 1;
		}

		*price_ranges.entry(price_bracket(event.price_min)).or_default() += 1;
		*date_ranges.entry(date_bracket(event.start_at, now)).or_default() += 1;
	}

	Facets {
		categories: ranked(categories),
		locations: ranked(locations),
		price_ranges: ranked(price_ranges),
		date_ranges: ranked(date_ranges),
	}
}

fn ranked(counts: HashMap<&str, i64>) -> Vec<Facet> {
	let mut facets: Vec<Facet> = counts
		.into_iter()
		.map(|(name, count)| Facet { name: name.to_string(), count })
		.collect();

	facets.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));

	facets
}
