use time::{Duration, OffsetDateTime, macros::datetime};

use agora_domain::{
	entity::{EntityType, SearchFilters, SortMode},
	expand::{MAX_EXPANDED_TERMS, expand_terms},
	facet::{date_bracket, price_bracket},
	geo::{GeoPoint, haversine_km, parse_latlng},
};

#[test]
fn expands_known_synonyms_after_original() {
	let terms = expand_terms("concert");

	assert_eq!(terms[0], "concert");
	assert!(terms.contains(&"music".to_string()));
	assert!(terms.contains(&"live".to_string()));
	assert!(terms.len() <= MAX_EXPANDED_TERMS);
}

#[test]
fn unknown_query_expands_to_itself() {
	assert_eq!(expand_terms("zzz_nonexistent_query_xyz"), vec!["zzz_nonexistent_query_xyz"]);
}

#[test]
fn expansion_lowercases_and_dedupes() {
	let terms = expand_terms("Music Concert");

	assert_eq!(terms[0], "music concert");
	assert_eq!(terms.iter().filter(|term| *term == "concert").count(), 1);
	assert_eq!(terms.iter().filter(|term| *term == "music").count(), 0);
}

#[test]
fn expansion_matches_whole_words_only() {
	// "concerto" must not hit the "concert" entry.
	assert_eq!(expand_terms("concerto"), vec!["concerto"]);
}

#[test]
fn parses_latlng_pairs() {
	let point = parse_latlng("40.7128, -74.0060").expect("valid pair");

	assert!((point.lat - 40.7128).abs() < 1e-9);
	assert!((point.lng + 74.006).abs() < 1e-9);
	assert!(parse_latlng("91.0,0.0").is_none());
	assert!(parse_latlng("0.0,181.0").is_none());
	assert!(parse_latlng("not-a-pair").is_none());
	assert!(parse_latlng("1.0").is_none());
}

#[test]
fn haversine_known_distance() {
	let new_york = GeoPoint { lat: 40.7128, lng: -74.006 };
	let london = GeoPoint { lat: 51.5074, lng: -0.1278 };
	let distance = haversine_km(new_york, london);

	assert!((distance - 5_570.0).abs() < 30.0, "got {distance}");
	assert_eq!(haversine_km(new_york, new_york), 0.0);
}

#[test]
fn price_brackets_cover_boundaries() {
	assert_eq!(price_bracket(None), "free");
	assert_eq!(price_bracket(Some(0.0)), "free");
	assert_eq!(price_bracket(Some(10.0)), "under_25");
	assert_eq!(price_bracket(Some(25.0)), "25_to_50");
	assert_eq!(price_bracket(Some(50.0)), "50_to_100");
	assert_eq!(price_bracket(Some(100.0)), "over_100");
}

#[test]
fn date_brackets_relative_to_now() {
	let now = datetime!(2025-06-01 12:00 UTC);

	assert_eq!(date_bracket(now - Duration::hours(1), now), "past");
	assert_eq!(date_bracket(now + Duration::hours(3), now), "today");
	assert_eq!(date_bracket(now + Duration::days(3), now), "this_week");
	assert_eq!(date_bracket(now + Duration::days(20), now), "this_month");
	assert_eq!(date_bracket(now + Duration::days(90), now), "later");
}

#[test]
fn entity_types_serialize_as_plural_labels() {
	let json = serde_json::to_string(&EntityType::Organization).expect("serialize");

	assert_eq!(json, "\"organizations\"");
	assert_eq!(EntityType::ALL.len(), 4);

	let parsed: EntityType = serde_json::from_str("\"events\"").expect("deserialize");

	assert_eq!(parsed, EntityType::Event);
}

#[test]
fn sort_mode_defaults_to_relevance() {
	assert_eq!(SortMode::default(), SortMode::Relevance);

	let parsed: SortMode = serde_json::from_str("\"distance\"").expect("deserialize");

	assert_eq!(parsed, SortMode::Distance);
}

#[test]
fn applied_labels_reflect_set_filters() {
	let empty = SearchFilters::default();

	assert!(empty.applied_labels().is_empty());

	let filters = SearchFilters {
		category: Some("Music".to_string()),
		verified_only: true,
		date_to: Some(OffsetDateTime::now_utc()),
		..Default::default()
	};
	let labels = filters.applied_labels();

	assert_eq!(labels, vec!["category", "date_range", "verified_only"]);
}
