use axum::{
	Json, Router,
	extract::State,
	http::StatusCode,
	response::{IntoResponse, Response},
	routing::{get, post},
};
use serde::Serialize;

use sm_service::{
	AssignSkillsRequest, AssignSkillsResponse, Error, FindHelpersRequest, FindHelpersResponse,
	Stage, WeeklyStats,
};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/v1/helpers/find", post(find_helpers))
		.route("/v1/stats/weekly", get(weekly_stats))
		.route("/v1/people/skills", post(assign_skills))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn find_helpers(
	State(state): State<AppState>,
	Json(payload): Json<FindHelpersRequest>,
) -> Result<Json<FindHelpersResponse>, ApiError> {
	let response = state.service.find_helpers(payload).await?;

	Ok(Json(response))
}

async fn weekly_stats(State(state): State<AppState>) -> Result<Json<WeeklyStats>, ApiError> {
	let response = state.service.weekly_stats().await?;

	Ok(Json(response))
}

async fn assign_skills(
	State(state): State<AppState>,
	Json(payload): Json<AssignSkillsRequest>,
) -> Result<Json<AssignSkillsResponse>, ApiError> {
	let response = state.service.assign_skills(payload).await?;

	Ok(Json(response))
}

#[derive(Debug, Serialize)]
struct ErrorBody {
	error_code: &'static str,
	stage: &'static str,
	message: String,
	#[serde(skip_serializing_if = "Option::is_none")]
	retry_after_secs: Option<u64>,
}

#[derive(Debug)]
pub struct ApiError {
	status: StatusCode,
	error_code: &'static str,
	stage: Stage,
	message: String,
	retry_after_secs: Option<u64>,
}
impl ApiError {
	fn new(status: StatusCode, error_code: &'static str, err: &Error) -> Self {
		Self {
			status,
			error_code,
			stage: err.stage(),
			message: err.to_string(),
			retry_after_secs: None,
		}
	}
}

impl From<Error> for ApiError {
	fn from(err: Error) -> Self {
		match err {
			Error::InvalidRequest { .. } =>
				ApiError::new(StatusCode::BAD_REQUEST, "INVALID_REQUEST", &err),
			Error::NotFound { .. } => ApiError::new(StatusCode::NOT_FOUND, "NOT_FOUND", &err),
			Error::RateLimited { retry_after_secs } => ApiError {
				retry_after_secs: Some(retry_after_secs),
				..ApiError::new(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED", &err)
			},
			Error::ExtractionFailed { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "EXTRACTION_FAILED", &err),
			Error::EmbeddingFailed { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "EMBEDDING_FAILED", &err),
			Error::RetrievalFailed { .. } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "RETRIEVAL_FAILED", &err),
			Error::RerankFailed { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "RERANK_FAILED", &err),
			Error::NeedLogFailed { .. } =>
				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "NEED_LOG_FAILED", &err),
			Error::StatsFailed { .. } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "STATS_FAILED", &err),
			Error::AssignFailed { .. } =>
				ApiError::new(StatusCode::SERVICE_UNAVAILABLE, "ASSIGN_FAILED", &err),
			Error::Provider { .. } =>
				ApiError::new(StatusCode::BAD_GATEWAY, "PROVIDER_ERROR", &err),
			Error::Storage { .. } =>
				ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", &err),
		}
	}
}

impl IntoResponse for ApiError {
	fn into_response(self) -> Response {
		if self.status.is_server_error() {
			tracing::error!(
				error_code = self.error_code,
				stage = self.stage.as_str(),
				message = %self.message,
				"Request failed."
			);
		}

		let body = ErrorBody {
			error_code: self.error_code,
			stage: self.stage.as_str(),
			message: self.message,
			retry_after_secs: self.retry_after_secs,
		};

		(self.status, Json(body)).into_response()
	}
}
