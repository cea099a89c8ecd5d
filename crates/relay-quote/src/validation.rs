//! Turns raw query parameters into a [`QuoteRequest`].

use alloy_primitives::Address;
use relay_types::{parse_u256, QuoteError, QuoteParams, QuoteRequest, U256};
use std::str::FromStr;

/// Validates `GET /api/quote` parameters.
///
/// `tokenIn`, `tokenOut`, `amountIn`, `recipient` and `payer` are required.
/// `nonce` defaults to 0 and `currency` to `default_currency`.
pub fn validate_quote_params(
	params: &QuoteParams,
	default_currency: &str,
) -> Result<QuoteRequest, QuoteError> {
	let missing: Vec<&str> = [
		("tokenIn", &params.token_in),
		("tokenOut", &params.token_out),
		("amountIn", &params.amount_in),
		("recipient", &params.recipient),
		("payer", &params.payer),
	]
	.into_iter()
	.filter(|(_, value)| value.as_deref().is_none_or(|v| v.trim().is_empty()))
	.map(|(name, _)| name)
	.collect();

	if !missing.is_empty() {
		return Err(QuoteError::InvalidRequest(format!(
			"Missing required parameters: {}",
			missing.join(", ")
		)));
	}

	let token_in = parse_address("tokenIn", params.token_in.as_deref())?;
	let token_out = parse_address("tokenOut", params.token_out.as_deref())?;
	let recipient = parse_address("recipient", params.recipient.as_deref())?;
	let payer = parse_address("payer", params.payer.as_deref())?;

	let amount_in = params
		.amount_in
		.as_deref()
		.and_then(parse_u256)
		.ok_or_else(|| {
			QuoteError::InvalidRequest("amountIn must be a base-10 unsigned integer".into())
		})?;
	if amount_in.is_zero() {
		return Err(QuoteError::InvalidRequest(
			"amountIn must be greater than zero".into(),
		));
	}

	let nonce = match params.nonce.as_deref().map(str::trim) {
		None | Some("") => U256::ZERO,
		Some(raw) => parse_u256(raw).ok_or_else(|| {
			QuoteError::InvalidRequest("nonce must be a base-10 unsigned integer".into())
		})?,
	};

	let currency = validate_currency(params.currency.as_deref(), default_currency)?;

	Ok(QuoteRequest {
		token_in,
		token_out,
		amount_in,
		payer,
		recipient,
		nonce,
		currency,
	})
}

/// Normalises a currency code to upper case, using `default_currency` when absent.
pub fn validate_currency(
	currency: Option<&str>,
	default_currency: &str,
) -> Result<String, QuoteError> {
	let code = match currency.map(str::trim) {
		None | Some("") => default_currency.to_string(),
		Some(code) => code.to_ascii_uppercase(),
	};
	if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_uppercase()) {
		return Err(QuoteError::InvalidRequest(format!(
			"currency must be a 3-letter ISO code, got '{}'",
			code
		)));
	}
	Ok(code)
}

/// Accepts `0x` followed by exactly 40 hex digits, in any case.
fn parse_address(name: &str, value: Option<&str>) -> Result<Address, QuoteError> {
	let raw = value.unwrap_or_default().trim();
	let well_formed = raw.len() == 42 && (raw.starts_with("0x") || raw.starts_with("0X"));
	well_formed
		.then(|| Address::from_str(&raw[2..]).ok())
		.flatten()
		.ok_or_else(|| QuoteError::InvalidRequest(format!("{} is not a valid address", name)))
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	fn params() -> QuoteParams {
		QuoteParams {
			token_in: Some("0xcff09905f8f18b35f5a1ba6d2822d62b3d8c48be".into()),
			token_out: Some("0xF98A4A0482D534C004CDB9A3358FD71347C4395B".into()),
			amount_in: Some("10000000".into()),
			recipient: Some("0x70997970C51812dc3A010C7d01b50e0d17dc79C8".into()),
			payer: Some("0xf39Fd6e51aad88F6F4ce6aB8827279cffFb92266".into()),
			nonce: None,
			currency: None,
		}
	}

	#[test]
	fn test_valid_params_with_defaults() {
		let request = validate_quote_params(&params(), "IDR").unwrap();
		assert_eq!(request.token_out, address!("f98a4a0482d534c004cdb9a3358fd71347c4395b"));
		assert_eq!(request.amount_in, U256::from(10_000_000u64));
		assert_eq!(request.nonce, U256::ZERO);
		assert_eq!(request.currency, "IDR");
	}

	#[test]
	fn test_missing_parameters_are_listed() {
		let mut p = params();
		p.payer = None;
		p.token_in = Some("  ".into());
		let err = validate_quote_params(&p, "IDR").unwrap_err();
		let message = err.to_string();
		assert!(matches!(err, QuoteError::InvalidRequest(_)));
		assert!(message.contains("tokenIn"));
		assert!(message.contains("payer"));
		assert!(!message.contains("recipient"));
	}

	#[test]
	fn test_malformed_address_rejected() {
		for bad in [
			"cff09905f8f18b35f5a1ba6d2822d62b3d8c48be",
			"0xcff09905f8f18b35f5a1ba6d2822d62b3d8c48",
			"0xzzf09905f8f18b35f5a1ba6d2822d62b3d8c48be",
			"alice.eth",
		] {
			let mut p = params();
			p.recipient = Some(bad.into());
			let err = validate_quote_params(&p, "IDR").unwrap_err();
			assert!(err.to_string().contains("recipient"), "accepted {}", bad);
		}
	}

	#[test]
	fn test_amount_and_nonce_parsing() {
		let mut p = params();
		p.amount_in = Some("1.5".into());
		assert!(validate_quote_params(&p, "IDR").is_err());

		p.amount_in = Some("0".into());
		assert!(validate_quote_params(&p, "IDR").is_err());

		let mut p = params();
		p.nonce = Some("7".into());
		assert_eq!(validate_quote_params(&p, "IDR").unwrap().nonce, U256::from(7u64));

		p.nonce = Some("-1".into());
		assert!(validate_quote_params(&p, "IDR").is_err());
	}

	#[test]
	fn test_currency_normalisation() {
		assert_eq!(validate_currency(Some("php"), "IDR").unwrap(), "PHP");
		assert_eq!(validate_currency(Some(""), "IDR").unwrap(), "IDR");
		assert_eq!(validate_currency(None, "JPY").unwrap(), "JPY");
		assert!(validate_currency(Some("RUPIAH"), "IDR").is_err());
		assert!(validate_currency(Some("I1R"), "IDR").is_err());
	}
}
