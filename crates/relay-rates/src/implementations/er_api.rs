//! Primary rate source backed by open.er-api.com.
//!
//! One request returns every rate against USD; the requested currency is
//! picked out of the `rates` map.

use crate::{
	get_json, http_client, rate_from_body, RateError, RateSourceFactory, RateSourceInterface,
	RateSourceRegistry,
};
use async_trait::async_trait;
use relay_types::{
	current_timestamp_millis, ConfigSchema, Field, FieldType, ImplementationRegistry, Rate,
	Schema, ValidationError,
};

const DEFAULT_URL: &str = "https://open.er-api.com/v6/latest/USD";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

/// Identifier reported in every rate from this source.
pub const SOURCE_ID: &str = "open.er-api.com";

/// Rate source for the open exchange-rate API.
pub struct ErApiSource {
	client: reqwest::Client,
	url: String,
}

impl ErApiSource {
	pub fn new(url: String, timeout_seconds: u64) -> Result<Self, RateError> {
		Ok(Self {
			client: http_client(timeout_seconds)?,
			url,
		})
	}
}

/// Configuration schema for the open.er-api.com source.
pub struct ErApiSchema;

impl ConfigSchema for ErApiSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], remote_source_fields()).validate(config)
	}
}

/// Optional `url` and `timeout_seconds` accepted by the remote sources.
pub(crate) fn remote_source_fields() -> Vec<Field> {
	vec![
		Field::new("url", FieldType::String).with_validator(|value| match value.as_str() {
			Some(url) if url.starts_with("http://") || url.starts_with("https://") => Ok(()),
			_ => Err("url must start with http:// or https://".to_string()),
		}),
		Field::new(
			"timeout_seconds",
			FieldType::Integer {
				min: Some(1),
				max: Some(60),
			},
		),
	]
}

#[async_trait]
impl RateSourceInterface for ErApiSource {
	fn source_id(&self) -> &'static str {
		SOURCE_ID
	}

	async fn fetch_rate(&self, currency: &str) -> Result<Rate, RateError> {
		tracing::debug!(url = %self.url, currency = %currency, "Querying open.er-api.com");
		let body = get_json(&self.client, &self.url).await?;

		if let Some(result) = body.get("result").and_then(|r| r.as_str()) {
			if result != "success" {
				return Err(RateError::Parse(format!("upstream result '{}'", result)));
			}
		}

		Ok(Rate {
			currency: currency.to_string(),
			rate: rate_from_body(&body, currency)?,
			source: SOURCE_ID.to_string(),
			timestamp: current_timestamp_millis(),
		})
	}
}

/// Registry for the open.er-api.com source.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "er_api";
	type Factory = RateSourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn RateSourceInterface>, RateError> {
			ErApiSchema
				.validate(config)
				.map_err(|e| RateError::Configuration(format!("er_api: {}", e)))?;

			let url = config
				.get("url")
				.and_then(|v| v.as_str())
				.unwrap_or(DEFAULT_URL)
				.to_string();
			let timeout_seconds = config
				.get("timeout_seconds")
				.and_then(|v| v.as_integer())
				.map(|t| t as u64)
				.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

			Ok(Box::new(ErApiSource::new(url, timeout_seconds)?))
		}
	}
}

impl RateSourceRegistry for Registry {}
