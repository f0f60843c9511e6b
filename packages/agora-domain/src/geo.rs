use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6_371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
	pub lat: f64,
	pub lng: f64,
}

/// Parses a "lat,lng" pair. Rejects out-of-range or non-finite coordinates.
pub fn parse_latlng(raw: &str) -> Option<GeoPoint> {
	let (lat, lng) = raw.split_once(',')?;
	let lat: f64 = lat.trim().parse().ok()?;
	let lng: f64 = lng.trim().parse().ok()?;

	if !lat.is_finite() || !lng.is_finite() {
		return None;
	}
	if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
		return None;
	}

	Some(GeoPoint { lat, lng })
}

/// Great-circle distance in kilometers (haversine).
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
	let d_lat = (b.lat - a.lat).to_radians();
	let d_lng = (b.lng - a.lng).to_radians();
	let h = (d_lat / 2.0).sin().powi(2)
		+ a.lat.to_radians().cos() * b.lat.to_radians().cos() * (d_lng / 2.0).sin().powi(2);

	2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}
