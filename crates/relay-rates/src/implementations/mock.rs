//! Fixed-table rate source for local development and tests.

use crate::{
	parse_decimal, RateError, RateSourceFactory, RateSourceInterface, RateSourceRegistry,
};
use async_trait::async_trait;
use relay_types::{
	current_timestamp_millis, ConfigSchema, Field, FieldType, ImplementationRegistry, Rate,
	Schema, ValidationError,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

pub const SOURCE_ID: &str = "mock";

/// Serves rates from a table given in configuration:
///
/// ```toml
/// [rates.implementations.mock]
/// rates = { IDR = "15000", PHP = "56.1" }
/// fail = false
/// ```
pub struct MockRateSource {
	rates: HashMap<String, Decimal>,
	/// Every lookup fails, to exercise fallback paths.
	fail: bool,
}

impl MockRateSource {
	pub fn new(rates: HashMap<String, Decimal>, fail: bool) -> Self {
		Self { rates, fail }
	}
}

pub struct MockRateSchema;

impl ConfigSchema for MockRateSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![
				Field::new("rates", FieldType::Table(Schema::new(vec![], vec![]))),
				Field::new("fail", FieldType::Boolean),
			],
		);
		schema.validate(config)?;

		if let Some(rates) = config.get("rates").and_then(|r| r.as_table()) {
			for (code, value) in rates {
				let parsed = match value {
					toml::Value::String(s) => parse_decimal(s).ok(),
					toml::Value::Integer(i) => Some(Decimal::from(*i)),
					toml::Value::Float(f) => parse_decimal(&f.to_string()).ok(),
					_ => None,
				};
				if parsed.is_none() {
					return Err(ValidationError::InvalidValue {
						field: format!("rates.{}", code),
						message: "must be a number or a decimal string".to_string(),
					});
				}
			}
		}
		Ok(())
	}
}

#[async_trait]
impl RateSourceInterface for MockRateSource {
	fn source_id(&self) -> &'static str {
		SOURCE_ID
	}

	async fn fetch_rate(&self, currency: &str) -> Result<Rate, RateError> {
		if self.fail {
			return Err(RateError::Network("mock source configured to fail".into()));
		}
		let rate = self
			.rates
			.get(currency)
			.copied()
			.ok_or_else(|| RateError::MissingRate(currency.to_string()))?;

		Ok(Rate {
			currency: currency.to_string(),
			rate,
			source: SOURCE_ID.to_string(),
			timestamp: current_timestamp_millis(),
		})
	}
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "mock";
	type Factory = RateSourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn RateSourceInterface>, RateError> {
			MockRateSchema
				.validate(config)
				.map_err(|e| RateError::Configuration(format!("mock: {}", e)))?;

			let mut rates = HashMap::new();
			if let Some(table) = config.get("rates").and_then(|r| r.as_table()) {
				for (code, value) in table {
					let rate = match value {
						toml::Value::String(s) => parse_decimal(s)?,
						toml::Value::Integer(i) => Decimal::from(*i),
						toml::Value::Float(f) => parse_decimal(&f.to_string())?,
						other => {
							return Err(RateError::Configuration(format!(
								"mock rate for {} is not numeric: {}",
								code, other
							)))
						},
					};
					rates.insert(code.to_ascii_uppercase(), rate);
				}
			}
			let fail = config
				.get("fail")
				.and_then(|v| v.as_bool())
				.unwrap_or(false);

			Ok(Box::new(MockRateSource::new(rates, fail)))
		}
	}
}

impl RateSourceRegistry for Registry {}
