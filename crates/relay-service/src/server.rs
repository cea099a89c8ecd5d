//! HTTP server for the relay API.
//!
//! Routes:
//! - `GET /api/quote` issues a signed quote
//! - `GET /api/rates` returns the current rate for a currency
//! - `POST /api/quotes/verify` pre-verifies a signed quote
//! - `GET /health`

use crate::apis;
use axum::{
	extract::{Query, State},
	response::Json,
	routing::{get, post},
	Router,
};
use relay_config::{ApiConfig, Config};
use relay_delivery::RouterReader;
use relay_quote::QuoteService;
use relay_types::{
	current_timestamp, APIError, Address, ApiResponse, QuoteParams, Rate, RateParams, SignedQuote,
	VerifyRequest, VerifyResponse, B256,
};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

/// Shared application state for the API server.
#[derive(Clone)]
pub struct AppState {
	/// Complete configuration.
	pub config: Arc<Config>,
	pub quotes: Arc<QuoteService>,
	/// Present when `network.rpc_url` is configured.
	pub router_reader: Option<Arc<dyn RouterReader>>,
	/// Domain separator computed from `[router]` and `network.chain_id`.
	pub domain_separator: B256,
	/// Address of the configured dealer key, if any.
	pub dealer: Option<Address>,
}

/// Builds the application router.
pub fn app(state: AppState) -> Router {
	Router::new()
		.nest(
			"/api",
			Router::new()
				.route("/quote", get(handle_quote))
				.route("/rates", get(handle_rates))
				.route("/quotes/verify", post(handle_verify)),
		)
		.route("/health", get(handle_health))
		.layer(
			ServiceBuilder::new()
				.layer(TraceLayer::new_for_http())
				.layer(CorsLayer::permissive()),
		)
		.with_state(state)
}

/// Starts the HTTP server for the API.
pub async fn start_server(
	api_config: ApiConfig,
	state: AppState,
) -> Result<(), Box<dyn std::error::Error>> {
	let service_id = state.config.service.id.clone();
	let bind_address = format!("{}:{}", api_config.host, api_config.port);
	let listener = TcpListener::bind(&bind_address).await?;

	tracing::info!("Relay API [{}] starting on {}", service_id, bind_address);

	axum::serve(listener, app(state)).await?;

	Ok(())
}

async fn handle_quote(
	State(state): State<AppState>,
	Query(params): Query<QuoteParams>,
) -> Result<Json<ApiResponse<SignedQuote>>, APIError> {
	let signed = apis::quote::process_quote_request(params, &state.quotes).await?;
	Ok(Json(ApiResponse::ok(signed)))
}

async fn handle_rates(
	State(state): State<AppState>,
	Query(params): Query<RateParams>,
) -> Result<Json<ApiResponse<Rate>>, APIError> {
	let rate = apis::quote::process_rate_request(params, &state.quotes).await?;
	Ok(Json(ApiResponse::ok(rate)))
}

async fn handle_verify(
	State(state): State<AppState>,
	Json(request): Json<VerifyRequest>,
) -> Result<Json<ApiResponse<VerifyResponse>>, APIError> {
	let result =
		apis::verify::process_verify_request(request, &state, current_timestamp()).await?;
	Ok(Json(ApiResponse::ok(result)))
}

async fn handle_health() -> Json<Value> {
	Json(json!({ "status": "ok" }))
}
