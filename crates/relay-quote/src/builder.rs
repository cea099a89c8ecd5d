//! Quote construction.
//!
//! Everything here is pure: the rate, the token decimals and the clock are
//! passed in, so a quote is a deterministic function of its inputs.

use relay_types::{Quote, QuoteError, QuoteRequest, Rate, QUOTE_VALIDITY_SECONDS, U256};
use rust_decimal::Decimal;

/// Converts `amount_in` (smallest units of the input token) into smallest
/// units of the output token at `rate`, truncating toward zero.
///
/// With the rate written as `mantissa / 10^scale` the result is
/// `floor(amount_in * mantissa * 10^output_decimals / (10^input_decimals * 10^scale))`,
/// evaluated in 256-bit integers so no float rounding can push the payout up.
pub fn compute_amount_out(
	amount_in: U256,
	rate: Decimal,
	input_decimals: u8,
	output_decimals: u8,
) -> Result<U256, QuoteError> {
	if rate <= Decimal::ZERO {
		return Err(QuoteError::RateUnavailable(
			"rate must be greater than zero".into(),
		));
	}

	let mantissa = U256::from(rate.mantissa().unsigned_abs());
	let ten = U256::from(10u8);
	let numerator = amount_in
		.checked_mul(mantissa)
		.and_then(|v| v.checked_mul(ten.pow(U256::from(output_decimals))))
		.ok_or_else(|| QuoteError::InvalidRequest("amountIn is too large to quote".into()))?;
	let denominator = ten.pow(U256::from(input_decimals)) * ten.pow(U256::from(rate.scale()));

	Ok(numerator / denominator)
}

/// Builds an unsigned quote valid for [`QUOTE_VALIDITY_SECONDS`] after `now`.
pub fn build_quote(
	request: &QuoteRequest,
	rate: &Rate,
	input_decimals: u8,
	output_decimals: u8,
	now: u64,
) -> Result<Quote, QuoteError> {
	let amount_out = compute_amount_out(
		request.amount_in,
		rate.rate,
		input_decimals,
		output_decimals,
	)?;

	Ok(Quote {
		token_in: request.token_in,
		token_out: request.token_out,
		amount_in: request.amount_in,
		amount_out,
		payer: request.payer,
		recipient: request.recipient,
		nonce: request.nonce,
		deadline: U256::from(now) + U256::from(QUOTE_VALIDITY_SECONDS),
	})
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;
	use std::str::FromStr;

	fn dec(s: &str) -> Decimal {
		Decimal::from_str(s).unwrap()
	}

	fn request(amount_in: u64) -> QuoteRequest {
		QuoteRequest {
			token_in: address!("cff09905f8f18b35f5a1ba6d2822d62b3d8c48be"),
			token_out: address!("f98a4a0482d534c004cdb9a3358fd71347c4395b"),
			amount_in: U256::from(amount_in),
			payer: address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266"),
			recipient: address!("70997970c51812dc3a010c7d01b50e0d17dc79c8"),
			nonce: U256::from(3u64),
			currency: "IDR".to_string(),
		}
	}

	fn rate(value: &str) -> Rate {
		Rate {
			currency: "IDR".to_string(),
			rate: dec(value),
			source: "mock".to_string(),
			timestamp: 0,
		}
	}

	#[test]
	fn test_ten_usdc_at_15000_idr() {
		let amount = compute_amount_out(U256::from(10_000_000u64), dec("15000"), 6, 2).unwrap();
		assert_eq!(amount, U256::from(15_000_000u64));
	}

	#[test]
	fn test_truncates_toward_zero() {
		// 1.234567 * 15923.47 = 19658.5905... -> 1965859 cents
		let amount = compute_amount_out(U256::from(1_234_567u64), dec("15923.47"), 6, 2).unwrap();
		assert_eq!(amount, U256::from(1_965_859u64));

		// 0.000001 * 0.5 * 100 = 0.00005 -> 0
		let amount = compute_amount_out(U256::from(1u64), dec("0.5"), 6, 2).unwrap();
		assert_eq!(amount, U256::ZERO);
	}

	#[test]
	fn test_scale_of_rate_does_not_matter() {
		let a = compute_amount_out(U256::from(5_500_000u64), dec("56.1"), 6, 2).unwrap();
		let b = compute_amount_out(U256::from(5_500_000u64), dec("56.100000"), 6, 2).unwrap();
		assert_eq!(a, b);
		assert_eq!(a, U256::from(30_855u64));
	}

	#[test]
	fn test_zero_rate_is_rate_unavailable() {
		assert!(matches!(
			compute_amount_out(U256::from(1u64), Decimal::ZERO, 6, 2),
			Err(QuoteError::RateUnavailable(_))
		));
	}

	#[test]
	fn test_overflow_is_invalid_request() {
		assert!(matches!(
			compute_amount_out(U256::MAX, dec("15000"), 6, 2),
			Err(QuoteError::InvalidRequest(_))
		));
	}

	#[test]
	fn test_payout_never_exceeds_exact_value() {
		// amount_out * 10^in * 10^scale <= amount_in * mantissa * 10^out < (amount_out + 1) * 10^in * 10^scale
		let rates = ["15000", "15923.4712", "0.0000651", "149.2", "1", "3.333333333"];
		let ten = U256::from(10u8);
		for rate_str in rates {
			let rate = dec(rate_str);
			let mantissa = U256::from(rate.mantissa().unsigned_abs());
			let scale = ten.pow(U256::from(rate.scale()));
			let mut amount = 1u64;
			while amount < 10_000_000_000_000 {
				for (in_dec, out_dec) in [(6u8, 2u8), (6, 0), (18, 2), (2, 18)] {
					let amount_in = U256::from(amount);
					let out = compute_amount_out(amount_in, rate, in_dec, out_dec).unwrap();
					let lhs = out * ten.pow(U256::from(in_dec)) * scale;
					let exact = amount_in * mantissa * ten.pow(U256::from(out_dec));
					assert!(lhs <= exact, "overpaid for {} at {}", amount, rate_str);
					assert!(
						lhs + ten.pow(U256::from(in_dec)) * scale > exact,
						"underpaid by a full unit for {} at {}",
						amount,
						rate_str
					);
				}
				amount = amount * 7 + 3;
			}
		}
	}

	#[test]
	fn test_build_quote_sets_deadline_and_copies_fields() {
		let req = request(10_000_000);
		let quote = build_quote(&req, &rate("15000"), 6, 2, 1_700_000_000).unwrap();
		assert_eq!(quote.amount_out, U256::from(15_000_000u64));
		assert_eq!(quote.deadline, U256::from(1_700_000_600u64));
		assert_eq!(quote.nonce, req.nonce);
		assert_eq!(quote.payer, req.payer);
		assert_eq!(quote.recipient, req.recipient);
		assert_eq!(quote.token_in, req.token_in);
		assert_eq!(quote.token_out, req.token_out);
	}
}
