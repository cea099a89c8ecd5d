//! API types for the relay HTTP API.
//!
//! Successful responses use the `{success: true, data}` envelope and failures
//! use `{success: false, error}`, which is the contract the wallet UI reads.

use crate::quote::Quote;
use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Raw query parameters of `GET /api/quote`.
///
/// Every field is optional at this layer so that missing parameters surface as
/// an `InvalidRequest` with a useful message instead of a generic extractor
/// rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteParams {
	pub token_in: Option<String>,
	pub token_out: Option<String>,
	pub amount_in: Option<String>,
	pub recipient: Option<String>,
	pub payer: Option<String>,
	pub nonce: Option<String>,
	pub currency: Option<String>,
}

/// Query parameters of `GET /api/rates`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RateParams {
	pub currency: Option<String>,
}

/// Body of `POST /api/quotes/verify`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
	pub quote: Quote,
	pub signature: Bytes,
}

/// Why a quote would be rejected by the router.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationFailure {
	Expired,
	InvalidSignature,
	StaleNonce,
}

/// Outcome of an off-chain pre-verification.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
	pub valid: bool,
	/// Address recovered from the signature over the reconstructed digest.
	pub signer: Address,
	pub digest: B256,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub reason: Option<VerificationFailure>,
}

/// Success envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
	pub success: bool,
	pub data: T,
}

impl<T> ApiResponse<T> {
	pub fn ok(data: T) -> Self {
		Self {
			success: true,
			data,
		}
	}
}

/// API error response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
	/// Always `false`.
	pub success: bool,
	/// Human-readable description.
	pub error: String,
	/// Machine-readable error code.
	pub code: String,
	/// Suggested retry delay in seconds
	#[serde(rename = "retryAfter", skip_serializing_if = "Option::is_none")]
	pub retry_after: Option<u64>,
}

/// Errors produced while issuing a quote.
#[derive(Debug, Error)]
pub enum QuoteError {
	/// Missing or malformed input; the client can fix it.
	#[error("Invalid request: {0}")]
	InvalidRequest(String),
	/// Every rate source failed or returned no usable rate; retryable.
	#[error("Rate unavailable: {0}")]
	RateUnavailable(String),
	/// No dealer key is configured and unsigned quotes are not allowed.
	#[error("No dealer key configured")]
	NoDealerKey,
	/// The dealer key exists but could not produce a signature.
	#[error("Signing failed: {0}")]
	SigningFailure(String),
}

/// Structured API error type with appropriate HTTP status mapping.
#[derive(Debug)]
pub enum APIError {
	/// Bad request with validation errors (400)
	BadRequest { error_type: String, message: String },
	/// Service unavailable with optional retry information (503)
	ServiceUnavailable {
		error_type: String,
		message: String,
		retry_after: Option<u64>,
	},
	/// Internal server error (500)
	InternalServerError { error_type: String, message: String },
}

/// Seconds a client should wait before asking for a rate again.
const RATE_RETRY_AFTER_SECONDS: u64 = 30;

impl APIError {
	/// Get the HTTP status code for this error.
	pub fn status_code(&self) -> u16 {
		match self {
			APIError::BadRequest { .. } => 400,
			APIError::ServiceUnavailable { .. } => 503,
			APIError::InternalServerError { .. } => 500,
		}
	}

	/// Convert to ErrorResponse for JSON serialization.
	pub fn to_error_response(&self) -> ErrorResponse {
		let (code, message, retry_after) = match self {
			APIError::BadRequest {
				error_type,
				message,
			} => (error_type, message, None),
			APIError::ServiceUnavailable {
				error_type,
				message,
				retry_after,
			} => (error_type, message, *retry_after),
			APIError::InternalServerError {
				error_type,
				message,
			} => (error_type, message, None),
		};
		ErrorResponse {
			success: false,
			error: message.clone(),
			code: code.clone(),
			retry_after,
		}
	}
}

impl fmt::Display for APIError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			APIError::BadRequest { message, .. } => write!(f, "Bad Request: {}", message),
			APIError::ServiceUnavailable { message, .. } => {
				write!(f, "Service Unavailable: {}", message)
			},
			APIError::InternalServerError { message, .. } => {
				write!(f, "Internal Server Error: {}", message)
			},
		}
	}
}

impl std::error::Error for APIError {}

impl From<QuoteError> for APIError {
	fn from(err: QuoteError) -> Self {
		let message = err.to_string();
		match err {
			QuoteError::InvalidRequest(_) => APIError::BadRequest {
				error_type: "INVALID_REQUEST".to_string(),
				message,
			},
			QuoteError::RateUnavailable(_) => APIError::ServiceUnavailable {
				error_type: "RATE_UNAVAILABLE".to_string(),
				message,
				retry_after: Some(RATE_RETRY_AFTER_SECONDS),
			},
			QuoteError::NoDealerKey => APIError::InternalServerError {
				error_type: "NO_DEALER_KEY".to_string(),
				message,
			},
			QuoteError::SigningFailure(_) => APIError::InternalServerError {
				error_type: "SIGNING_FAILED".to_string(),
				message,
			},
		}
	}
}

impl axum::response::IntoResponse for APIError {
	fn into_response(self) -> axum::response::Response {
		use axum::{http::StatusCode, response::Json};

		let status =
			StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

		(status, Json(self.to_error_response())).into_response()
	}
}

/// Serde module for U256 as a base-10 string.
pub mod u256_serde {
	use alloy_primitives::U256;
	use serde::{de::Error, Deserialize, Deserializer, Serialize, Serializer};

	pub fn serialize<S>(value: &U256, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		value.to_string().serialize(serializer)
	}

	pub fn deserialize<'de, D>(deserializer: D) -> Result<U256, D::Error>
	where
		D: Deserializer<'de>,
	{
		let s = String::deserialize(deserializer)?;
		U256::from_str_radix(&s, 10).map_err(D::Error::custom)
	}
}

/// Parses a base-10 unsigned integer that may be as wide as a `uint256`.
pub fn parse_u256(value: &str) -> Option<U256> {
	let trimmed = value.trim();
	if trimmed.is_empty() || !trimmed.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}
	U256::from_str_radix(trimmed, 10).ok()
}
