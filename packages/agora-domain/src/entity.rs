use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use crate::geo::GeoPoint;

pub const DEFAULT_RADIUS_KM: f64 = 50.0;

/// The four searchable categories. Relevance scores are scoped to one entity type
/// and are not comparable across types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityType {
	#[serde(rename = "events")]
	Event,
	#[serde(rename = "organizations")]
	Organization,
	#[serde(rename = "users")]
	User,
	#[serde(rename = "posts")]
	Post,
}
impl EntityType {
	pub const ALL: [Self; 4] = [Self::Event, Self::Organization, Self::User, Self::Post];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Event => "events",
			Self::Organization => "organizations",
			Self::User => "users",
			Self::Post => "posts",
		}
	}
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
	#[default]
	Relevance,
	Date,
	Popularity,
	Distance,
}
impl SortMode {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Relevance => "relevance",
			Self::Date => "date",
			Self::Popularity => "popularity",
			Self::Distance => "distance",
		}
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PriceRange {
	pub min: f64,
	pub max: f64,
}

/// Structural filters applied before the text predicate. A matcher ANDs these onto
/// its query; the expanded terms are ORed as `ILIKE %term%` afterwards.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SearchFilters {
	pub category: Option<String>,
	pub location: Option<GeoPoint>,
	pub radius_km: f64,
	pub date_from: Option<OffsetDateTime>,
	pub date_to: Option<OffsetDateTime>,
	pub price: Option<PriceRange>,
	pub tags: Vec<String>,
	pub organizer_id: Option<Uuid>,
	pub verified_only: bool,
	pub include_past_events: bool,
}
impl SearchFilters {
	/// Labels of the filters actually set, echoed back in the response envelope and
	/// recorded in analytics.
	pub fn applied_labels(&self) -> Vec<&'static str> {
		let mut labels = Vec::new();

		if self.category.is_some() {
			labels.push("category");
		}
		if self.location.is_some() {
			labels.push("location");
		}
		if self.date_from.is_some() || self.date_to.is_some() {
			labels.push("date_range");
		}
		if self.price.is_some() {
			labels.push("price_range");
		}
		if !self.tags.is_empty() {
			labels.push("tags");
		}
		if self.organizer_id.is_some() {
			labels.push("organizer");
		}
		if self.verified_only {
			labels.push("verified_only");
		}
		if self.include_past_events {
			labels.push("include_past_events");
		}

		labels
	}
}
