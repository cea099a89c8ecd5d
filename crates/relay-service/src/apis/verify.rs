//! Off-chain pre-verification of a signed quote.
//!
//! Runs the router's own checks against the configured domain so a client can
//! learn why a redemption would revert before paying gas for it.

use crate::server::AppState;
use relay_settlement::verify_quote;
use relay_types::{APIError, Address, VerifyRequest, VerifyResponse, U256};

/// Seconds a client should wait after a failed chain read.
const CHAIN_RETRY_AFTER_SECONDS: u64 = 15;

/// Processes `POST /api/quotes/verify` at time `now`.
///
/// The signer is checked against the configured dealer key, or against the
/// router's `dealer()` when no key is configured locally. When a router reader
/// is available and the quote otherwise verifies, its nonce is compared with
/// the payer's on-chain nonce.
pub async fn process_verify_request(
	request: VerifyRequest,
	state: &AppState,
	now: u64,
) -> Result<VerifyResponse, APIError> {
	let dealer = expected_dealer(state).await?;
	let result = verify_quote(
		&state.domain_separator,
		dealer,
		&request.quote,
		&request.signature,
		now,
		None,
	);
	if !result.valid {
		tracing::debug!(reason = ?result.reason, signer = %result.signer, "Quote would not redeem");
		return Ok(result);
	}

	let Some(reader) = &state.router_reader else {
		return Ok(result);
	};
	let nonce: U256 = reader
		.get_nonce(request.quote.payer)
		.await
		.map_err(chain_unavailable)?;

	Ok(verify_quote(
		&state.domain_separator,
		dealer,
		&request.quote,
		&request.signature,
		now,
		Some(nonce),
	))
}

async fn expected_dealer(state: &AppState) -> Result<Address, APIError> {
	if let Some(dealer) = state.dealer {
		return Ok(dealer);
	}
	match &state.router_reader {
		Some(reader) => reader.dealer().await.map_err(chain_unavailable),
		None => Err(APIError::InternalServerError {
			error_type: "NO_DEALER_KEY".to_string(),
			message: "No dealer key configured and no router to ask".to_string(),
		}),
	}
}

fn chain_unavailable(err: relay_delivery::DeliveryError) -> APIError {
	tracing::warn!("Router read failed: {}", err);
	APIError::ServiceUnavailable {
		error_type: "CHAIN_UNAVAILABLE".to_string(),
		message: err.to_string(),
		retry_after: Some(CHAIN_RETRY_AFTER_SECONDS),
	}
}
