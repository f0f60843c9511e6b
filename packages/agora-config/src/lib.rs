mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EventWeights, OrganizationWeights, Postgres, PostWeights, Ranking, Search,
	SearchCacheConfig, SearchFacets, SearchTrending, Service, Storage, UserWeights,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.search.default_limit == 0 {
		return Err(Error::Validation {
			message: "search.default_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.max_limit < cfg.search.default_limit {
		return Err(Error::Validation {
			message: "search.max_limit must be at least search.default_limit.".to_string(),
		});
	}
	if cfg.search.overfetch_factor == 0 {
		return Err(Error::Validation {
			message: "search.overfetch_factor must be greater than zero.".to_string(),
		});
	}
	if !cfg.search.default_radius_km.is_finite() || cfg.search.default_radius_km <= 0.0 {
		return Err(Error::Validation {
			message: "search.default_radius_km must be a positive finite number.".to_string(),
		});
	}
	if cfg.search.suggestion_limit == 0 {
		return Err(Error::Validation {
			message: "search.suggestion_limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.cache.ttl_seconds <= 0 {
		return Err(Error::Validation {
			message: "search.cache.ttl_seconds must be greater than zero.".to_string(),
		});
	}
	if cfg.search.trending.window_hours <= 0 {
		return Err(Error::Validation {
			message: "search.trending.window_hours must be greater than zero.".to_string(),
		});
	}
	if cfg.search.trending.limit == 0 {
		return Err(Error::Validation {
			message: "search.trending.limit must be greater than zero.".to_string(),
		});
	}
	if cfg.search.trending.max_limit < cfg.search.trending.limit {
		return Err(Error::Validation {
			message: "search.trending.max_limit must be at least search.trending.limit."
				.to_string(),
		});
	}

	for (label, weight) in weight_entries(&cfg.ranking) {
		if !weight.is_finite() {
			return Err(Error::Validation {
				message: format!("ranking.{label} must be a finite number."),
			});
		}
		if weight < 0.0 {
			return Err(Error::Validation {
				message: format!("ranking.{label} must be zero or greater."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}

fn weight_entries(ranking: &Ranking) -> Vec<(&'static str, f32)> {
	vec![
		("event.title", ranking.event.title),
		("event.description", ranking.event.description),
		("event.category", ranking.event.category),
		("event.city", ranking.event.city),
		("event.venue", ranking.event.venue),
		("event.preferred_category", ranking.event.preferred_category),
		("event.starts_within_week", ranking.event.starts_within_week),
		("event.starts_within_month", ranking.event.starts_within_month),
		("user.username", ranking.user.username),
		("user.display_name", ranking.user.display_name),
		("user.bio", ranking.user.bio),
		("user.verified", ranking.user.verified),
		("organization.name", ranking.organization.name),
		("organization.slug", ranking.organization.slug),
		("organization.description", ranking.organization.description),
		("organization.verified", ranking.organization.verified),
		("post.reaction", ranking.post.reaction),
		("post.comment", ranking.post.comment),
		("post.category_affinity", ranking.post.category_affinity),
	]
}
