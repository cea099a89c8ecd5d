//! Foreign-exchange rate observation.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A USD -> `currency` rate fetched for a single request.
///
/// Rates are never persisted; `timestamp` records when the observation was
/// taken, in milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rate {
	pub currency: String,
	#[serde(with = "rust_decimal::serde::float")]
	pub rate: Decimal,
	/// Identifier of the source that answered.
	pub source: String,
	pub timestamp: u64,
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::str::FromStr;

	#[test]
	fn test_rate_serializes_value_as_json_number() {
		let rate = Rate {
			currency: "IDR".to_string(),
			rate: Decimal::from_str("15000.5").unwrap(),
			source: "open.er-api.com".to_string(),
			timestamp: 1_700_000_000_000,
		};
		let json = serde_json::to_value(&rate).unwrap();
		assert_eq!(json["rate"], serde_json::json!(15000.5));
		assert_eq!(json["source"], "open.er-api.com");
		assert_eq!(json["currency"], "IDR");
	}
}
