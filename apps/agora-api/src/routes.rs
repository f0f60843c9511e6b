use axum::{
	Json, Router,
	extract::{Query, State},
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use agora_service::{
	ClickRequest, ClickResponse, SearchRequest, SearchResponse, ServiceError, TrendingRequest,
	TrendingResponse,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/search", post(search))
		.route("/v1/search/trending", get(trending))
		.route("/v1/search/click", post(click))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn search(
	State(state): State<AppState>,
	Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
	let response = state.service.search(payload).await?;
	Ok(Json(response))
}

async fn trending(
	State(state): State<AppState>,
	Query(params): Query<TrendingRequest>,
) -> Result<Json<TrendingResponse>, ApiError> {
	let response = state.service.trending(params).await?;
	Ok(Json(response))
}

async fn click(
	State(state): State<AppState>,
	Json(payload): Json<ClickRequest>,
) -> Result<Json<ClickResponse>, ApiError> {
	let response = state.service.record_click(payload).await?;
	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: String,
	message: String,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: String,
	message: String,
}

impl From<ServiceError> for ApiError {
	fn from(err: ServiceError) -> Self {
		match err {
			ServiceError::InvalidRequest { message } => Self {
				status: StatusCode::BAD_REQUEST,
				error_code: "invalid_request".to_string(),
				message,
			},
			ServiceError::Storage { message } => Self {
				status: StatusCode::INTERNAL_SERVER_ERROR,
				error_code: "storage_error".to_string(),
				message,
			},
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		let body = ErrorBody { error_code: self.error_code, message: self.message };
		(self.status, Json(body)).into_response()
	}
}
