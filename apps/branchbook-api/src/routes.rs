use axum::{
	Json, Router,
	extract::{Query, State, rejection::QueryRejection},
	http::{HeaderMap, StatusCode},
	response::{IntoResponse, Response},
	routing::get,
};

use branchbook_service::{Envelope, Error, ListCustomersRequest};

use crate::state::AppState;

pub fn router(state: AppState) -> Router {
	Router::new()
		.route("/health", get(health))
		.route("/api/customers", get(list_customers))
		.with_state(state)
}

async fn health() -> StatusCode {
	StatusCode::OK
}

async fn list_customers(
	State(state): State<AppState>,
	headers: HeaderMap,
	query: Result<Query<ListCustomersRequest>, QueryRejection>,
) -> Response {
	let claims = match state.verifier.authenticate(&headers) {
		Ok(claims) => claims,
		Err(err) => {
			tracing::debug!(error = %err, "Bearer token rejected.");

			return (StatusCode::UNAUTHORIZED, Json(Envelope::rejected(err.to_string())))
				.into_response();
		},
	};
	// Malformed query strings fall back to the defaults like any other bad value.
	let req = query.map(|Query(req)| req).unwrap_or_default();
	let user_id = claims.user_id.clone().unwrap_or_default();

	match state.service.list_customers(&claims.into_identity(), req).await {
		Ok(page) => (StatusCode::OK, Json(Envelope::success(&page))).into_response(),
		Err(err) => {
			tracing::info!(%user_id, error = %err, "Customer listing failed.");

			(status_for(&err), Json(Envelope::failure(&err))).into_response()
		},
	}
}

fn status_for(err: &Error) -> StatusCode {
	match err {
		err if err.is_unauthenticated() => StatusCode::UNAUTHORIZED,
		Error::Authorization(_) => StatusCode::FORBIDDEN,
		Error::RecordStore { .. } => StatusCode::INTERNAL_SERVER_ERROR,
	}
}
