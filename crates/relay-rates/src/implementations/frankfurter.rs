//! Fallback rate source backed by the European Central Bank reference rates
//! published through api.frankfurter.app.

use super::er_api::remote_source_fields;
use crate::{
	get_json, http_client, rate_from_body, RateError, RateSourceFactory, RateSourceInterface,
	RateSourceRegistry,
};
use async_trait::async_trait;
use relay_types::{
	current_timestamp_millis, ConfigSchema, ImplementationRegistry, Rate, Schema,
	ValidationError,
};

const DEFAULT_URL: &str = "https://api.frankfurter.app/latest?from=USD";
const DEFAULT_TIMEOUT_SECONDS: u64 = 10;

pub const SOURCE_ID: &str = "frankfurter.app (ECB)";

pub struct FrankfurterSource {
	client: reqwest::Client,
	base_url: String,
}

impl FrankfurterSource {
	pub fn new(base_url: String, timeout_seconds: u64) -> Result<Self, RateError> {
		Ok(Self {
			client: http_client(timeout_seconds)?,
			base_url,
		})
	}

	/// The API filters server side, so the currency goes into the query.
	fn url_for(&self, currency: &str) -> String {
		let separator = if self.base_url.contains('?') { '&' } else { '?' };
		format!("{}{}to={}", self.base_url, separator, currency)
	}
}

pub struct FrankfurterSchema;

impl ConfigSchema for FrankfurterSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![], remote_source_fields()).validate(config)
	}
}

#[async_trait]
impl RateSourceInterface for FrankfurterSource {
	fn source_id(&self) -> &'static str {
		SOURCE_ID
	}

	async fn fetch_rate(&self, currency: &str) -> Result<Rate, RateError> {
		let url = self.url_for(currency);
		tracing::debug!(url = %url, "Querying frankfurter.app");
		let body = get_json(&self.client, &url).await?;

		Ok(Rate {
			currency: currency.to_string(),
			rate: rate_from_body(&body, currency)?,
			source: SOURCE_ID.to_string(),
			timestamp: current_timestamp_millis(),
		})
	}
}

pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "frankfurter";
	type Factory = RateSourceFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn RateSourceInterface>, RateError> {
			FrankfurterSchema
				.validate(config)
				.map_err(|e| RateError::Configuration(format!("frankfurter: {}", e)))?;

			let base_url = config
				.get("url")
				.and_then(|v| v.as_str())
				.unwrap_or(DEFAULT_URL)
				.to_string();
			let timeout_seconds = config
				.get("timeout_seconds")
				.and_then(|v| v.as_integer())
				.map(|t| t as u64)
				.unwrap_or(DEFAULT_TIMEOUT_SECONDS);

			Ok(Box::new(FrankfurterSource::new(base_url, timeout_seconds)?))
		}
	}
}

impl RateSourceRegistry for Registry {}
