//! Exchange rate module for the settlement relay.
//!
//! Quotes are priced from a USD -> currency rate. Rates come from pluggable
//! sources behind [`RateSourceInterface`]; the [`RateService`] asks the primary
//! source first and falls through to a single fallback. There is no retry or
//! backoff beyond that, and no default rate is ever substituted.

use async_trait::async_trait;
use relay_types::{ImplementationRegistry, Rate};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tokio::time::Instant;

/// Re-export implementations
pub mod implementations {
	pub mod er_api;
	pub mod frankfurter;
	pub mod mock;
}

/// Errors that can occur while fetching a rate.
#[derive(Debug, Error)]
pub enum RateError {
	/// The source could not be reached.
	#[error("Network error: {0}")]
	Network(String),
	/// The source answered with a non-success status.
	#[error("HTTP error: status {0}")]
	Http(u16),
	/// The source answered but has no usable rate for the currency.
	#[error("No rate for {0}")]
	MissingRate(String),
	/// The response body could not be interpreted.
	#[error("Parse error: {0}")]
	Parse(String),
	/// Every configured source failed.
	#[error("Rate for {0} not available from any source")]
	NotAvailable(String),
	/// Error that occurs when configuration is invalid.
	#[error("Configuration error: {0}")]
	Configuration(String),
}

/// Trait defining the interface for rate source implementations.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RateSourceInterface: Send + Sync {
	/// Identifier reported in [`Rate::source`].
	fn source_id(&self) -> &'static str;

	/// Fetches the USD -> `currency` rate. `currency` is an upper-case ISO-4217 code.
	async fn fetch_rate(&self, currency: &str) -> Result<Rate, RateError>;
}

/// Type alias for rate source factory functions.
pub type RateSourceFactory = fn(&toml::Value) -> Result<Box<dyn RateSourceInterface>, RateError>;

/// Registry trait for rate source implementations.
pub trait RateSourceRegistry: ImplementationRegistry<Factory = RateSourceFactory> {}

/// Get all registered rate source implementations.
pub fn get_all_implementations() -> Vec<(&'static str, RateSourceFactory)> {
	use implementations::{er_api, frankfurter, mock};

	vec![
		(er_api::Registry::NAME, er_api::Registry::factory()),
		(frankfurter::Registry::NAME, frankfurter::Registry::factory()),
		(mock::Registry::NAME, mock::Registry::factory()),
	]
}

/// Reads `rates.<currency>` from a JSON body shaped like `{"rates": {"IDR": 15000.5}}`.
///
/// A missing, zero or negative rate is a [`RateError::MissingRate`].
pub(crate) fn rate_from_body(body: &serde_json::Value, currency: &str) -> Result<Decimal, RateError> {
	let value = body
		.get("rates")
		.and_then(|rates| rates.get(currency))
		.ok_or_else(|| RateError::MissingRate(currency.to_string()))?;

	let rate = match value {
		serde_json::Value::Number(n) => parse_decimal(&n.to_string())?,
		serde_json::Value::String(s) => parse_decimal(s)?,
		other => {
			return Err(RateError::Parse(format!(
				"rate for {} is not a number: {}",
				currency, other
			)))
		},
	};

	if rate <= Decimal::ZERO {
		return Err(RateError::MissingRate(currency.to_string()));
	}
	Ok(rate)
}

/// Parses a decimal literal, accepting exponent notation such as `6.5e-5`.
pub(crate) fn parse_decimal(raw: &str) -> Result<Decimal, RateError> {
	Decimal::from_str(raw)
		.or_else(|_| Decimal::from_scientific(raw))
		.map_err(|e| RateError::Parse(format!("invalid rate '{}': {}", raw, e)))
}

/// Builds the shared HTTP client used by the remote sources.
pub(crate) fn http_client(timeout_seconds: u64) -> Result<reqwest::Client, RateError> {
	reqwest::Client::builder()
		.timeout(Duration::from_secs(timeout_seconds))
		.build()
		.map_err(|e| RateError::Configuration(format!("Failed to build HTTP client: {}", e)))
}

/// GETs `url` and returns the JSON body, mapping transport and status failures.
pub(crate) async fn get_json(
	client: &reqwest::Client,
	url: &str,
) -> Result<serde_json::Value, RateError> {
	let response = client
		.get(url)
		.send()
		.await
		.map_err(|e| RateError::Network(e.to_string()))?;

	let status = response.status();
	if !status.is_success() {
		return Err(RateError::Http(status.as_u16()));
	}

	response
		.json::<serde_json::Value>()
		.await
		.map_err(|e| RateError::Parse(e.to_string()))
}

/// Service that resolves rates through a primary and optional fallback source.
pub struct RateService {
	primary: Arc<dyn RateSourceInterface>,
	fallback: Option<Arc<dyn RateSourceInterface>>,
	/// Zero disables caching.
	cache_ttl: Duration,
	cache: RwLock<HashMap<String, (Instant, Rate)>>,
}

impl RateService {
	pub fn new(
		primary: Arc<dyn RateSourceInterface>,
		fallback: Option<Arc<dyn RateSourceInterface>>,
		cache_ttl: Duration,
	) -> Self {
		Self {
			primary,
			fallback,
			cache_ttl,
			cache: RwLock::new(HashMap::new()),
		}
	}

	/// Fetches the USD -> `currency` rate.
	///
	/// The primary source is asked first; any failure, including a missing or
	/// zero rate, falls through to the fallback. When both fail the result is
	/// [`RateError::NotAvailable`].
	pub async fn fetch_rate(&self, currency: &str) -> Result<Rate, RateError> {
		let currency = currency.trim().to_ascii_uppercase();

		if let Some(rate) = self.cached(&currency).await {
			tracing::debug!(currency = %currency, source = %rate.source, "Serving cached rate");
			return Ok(rate);
		}

		let rate = match Self::ask(self.primary.as_ref(), &currency).await {
			Ok(rate) => rate,
			Err(primary_err) => {
				let Some(fallback) = &self.fallback else {
					tracing::warn!(
						currency = %currency,
						source = self.primary.source_id(),
						error = %primary_err,
						"Rate source failed and no fallback is configured"
					);
					return Err(RateError::NotAvailable(currency));
				};
				tracing::warn!(
					currency = %currency,
					source = self.primary.source_id(),
					error = %primary_err,
					"Primary rate source failed, trying fallback"
				);
				Self::ask(fallback.as_ref(), &currency).await.map_err(|e| {
					tracing::warn!(
						currency = %currency,
						source = fallback.source_id(),
						error = %e,
						"Fallback rate source failed"
					);
					RateError::NotAvailable(currency.clone())
				})?
			},
		};

		tracing::info!(currency = %currency, rate = %rate.rate, source = %rate.source, "Fetched rate");
		self.store(&currency, &rate).await;
		Ok(rate)
	}

	async fn ask(source: &dyn RateSourceInterface, currency: &str) -> Result<Rate, RateError> {
		let rate = source.fetch_rate(currency).await?;
		if rate.rate <= Decimal::ZERO {
			return Err(RateError::MissingRate(currency.to_string()));
		}
		Ok(rate)
	}

	async fn cached(&self, currency: &str) -> Option<Rate> {
		if self.cache_ttl.is_zero() {
			return None;
		}
		let cache = self.cache.read().await;
		cache
			.get(currency)
			.filter(|(fetched_at, _)| fetched_at.elapsed() < self.cache_ttl)
			.map(|(_, rate)| rate.clone())
	}

	async fn store(&self, currency: &str, rate: &Rate) {
		if self.cache_ttl.is_zero() {
			return;
		}
		self.cache
			.write()
			.await
			.insert(currency.to_string(), (Instant::now(), rate.clone()));
	}
}
