use time::{Duration, OffsetDateTime};

/// Price bracket labels, ordered from cheapest to most expensive. The same labels
/// come back from the SQL aggregation path so the two facet sources agree.
pub const PRICE_BRACKETS: [&str; 5] = ["free", "under_25", "25_to_50", "50_to_100", "over_100"];

/// Date bracket labels relative to query time.
pub const DATE_BRACKETS: [&str; 5] = ["today", "this_week", "this_month", "later", "past"];

pub fn price_bracket(price_min: Option<f64>) -> &'static str {
	match price_min {
		None => "free",
		Some(price) if price <= 0.0 => "free",
		Some(price) if price < 25.0 => "under_25",
		Some(price) if price < 50.0 => "25_to_50",
		Some(price) if price < 100.0 => "50_to_100",
		Some(_) => "over_100",
	}
}

pub fn date_bracket(start_at: OffsetDateTime, now: OffsetDateTime) -> &'static str {
	if start_at < now {
		return "past";
	}

	let until = start_at - now;

	if until < Duration::days(1) {
		"today"
	} else if until < Duration::days(7) {
		"this_week"
	} else if until < Duration::days(30) {
		"this_month"
	} else {
		"later"
	}
}
