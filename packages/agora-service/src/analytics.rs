use std::sync::Arc;

use time::{Duration, OffsetDateTime};
use tracing::warn;
use uuid::Uuid;

use agora_domain::entity::EntityType;
use agora_storage::models::{AnalyticsInsert, ClickUpdate};

use crate::{SearchService, SearchStore, ServiceError, ServiceResult};

#[derive(Debug, Clone, Default, serde::Serialize, serde::Deserialize)]
pub struct TrendingRequest {
	#[serde(default)]
	pub window_hours: Option<i64>,
	#[serde(default)]
	pub limit: Option<u32>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrendingEntry {
	pub query: String,
	pub count: i64,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct TrendingResponse {
	pub entries: Vec<TrendingEntry>,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClickRequest {
	pub session_id: String,
	pub query: String,
	pub result_id: Uuid,
	pub result_type: EntityType,
	pub position: u32,
}

#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct ClickResponse {
	pub recorded: bool,
}

impl SearchService {
	/// Most frequent successful queries inside the window, ranked by occurrence
	/// count over the analytics log.
	pub async fn trending(&self, request: TrendingRequest) -> ServiceResult<TrendingResponse> {
		let cfg = &self.cfg.search.trending;
		let window_hours = request.window_hours.unwrap_or(cfg.window_hours);

		if window_hours <= 0 {
			return Err(ServiceError::InvalidRequest {
				message: "Trending window must be a positive number of hours.".to_string(),
			});
		}

		let limit = request.limit.unwrap_or(cfg.limit).min(cfg.max_limit);

		if limit == 0 {
			return Err(ServiceError::InvalidRequest {
				message: "Trending limit must be greater than zero.".to_string(),
			});
		}

		let since = OffsetDateTime::now_utc() - Duration::hours(window_hours);
		let rows = self.store.trending(since, i64::from(limit)).await?;

		Ok(TrendingResponse {
			entries: rows
				.into_iter()
				.map(|row| TrendingEntry { query: row.query_text, count: row.occurrences })
				.collect(),
		})
	}

	/// Attributes a result click to the most recent search this session ran for
	/// the same query text. Storage failures degrade to `recorded: false`; a
	/// click must never surface an error to the caller.
	pub async fn record_click(&self, request: ClickRequest) -> ServiceResult<ClickResponse> {
		if request.session_id.trim().is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Session id must not be empty.".to_string(),
			});
		}

		let query_text = request.query.trim().to_string();

		if query_text.is_empty() {
			return Err(ServiceError::InvalidRequest {
				message: "Query text must not be empty.".to_string(),
			});
		}

		let click = ClickUpdate {
			session_id: request.session_id,
			query_text,
			clicked_result_id: request.result_id,
			clicked_result_type: request.result_type.as_str().to_string(),
			position_clicked: i32::try_from(request.position).unwrap_or(i32::MAX),
		};

		match self.store.record_click(&click).await {
			Ok(recorded) => Ok(ClickResponse { recorded }),
			Err(err) => {
				warn!(error = %err, "Click recording failed.");
				Ok(ClickResponse { recorded: false })
			},
		}
	}
}

/// Fire-and-forget analytics write. The search response never waits on it and
/// never sees its failure.
pub(crate) fn dispatch(store: Arc<dyn SearchStore>, record: AnalyticsInsert) {
	tokio::spawn(async move {
		if let Err(err) = store.insert_analytics(&record).await {
			warn!(error = %err, "Search analytics insert failed.");
		}
	});
}
