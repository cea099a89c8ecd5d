//! Quote issuance for the settlement relay.
//!
//! A quote request is validated, priced from the rate service, turned into a
//! quote with a fixed ten minute deadline and signed by the dealer over the
//! router's EIP-712 domain. Nothing is stored: the router's per-payer nonce is
//! the only thing that retires a quote.

pub mod builder;
pub mod signer;
pub mod validation;

use chrono::{DateTime, SecondsFormat, Utc};
use relay_config::Config;
use relay_rates::RateService;
use relay_types::{
	current_timestamp, format_token_amount, QuoteError, QuoteParams, Rate, SignedQuote, U256,
};
use std::sync::Arc;

pub use builder::{build_quote, compute_amount_out};
pub use signer::{router_domain, QuoteSigner};
pub use validation::{validate_currency, validate_quote_params};

/// Orchestrates validation, pricing and signing.
pub struct QuoteService {
	config: Arc<Config>,
	rates: Arc<RateService>,
	signer: Arc<QuoteSigner>,
}

impl QuoteService {
	pub fn new(config: Arc<Config>, rates: Arc<RateService>, signer: Arc<QuoteSigner>) -> Self {
		Self {
			config,
			rates,
			signer,
		}
	}

	pub fn signer(&self) -> &QuoteSigner {
		&self.signer
	}

	/// Handles a quote request end to end.
	pub async fn quote(&self, params: &QuoteParams) -> Result<SignedQuote, QuoteError> {
		self.quote_at(params, current_timestamp()).await
	}

	/// Same as [`QuoteService::quote`] with an explicit clock.
	pub async fn quote_at(&self, params: &QuoteParams, now: u64) -> Result<SignedQuote, QuoteError> {
		let request = validate_quote_params(params, &self.config.quote.default_currency)?;
		let rate = self.fetch_rate(&request.currency).await?;

		let input_decimals = self
			.config
			.token_decimals(&request.token_in, self.config.quote.input_decimals);
		let output_decimals = self
			.config
			.token_decimals(&request.token_out, self.config.quote.output_decimals);

		let quote = build_quote(&request, &rate, input_decimals, output_decimals, now)?;
		let (signature, signature_status) = self.signer.sign(&quote).await?;

		tracing::info!(
			payer = %quote.payer,
			currency = %request.currency,
			amount_in = %format_token_amount(quote.amount_in, input_decimals),
			amount_out = %format_token_amount(quote.amount_out, output_decimals),
			nonce = %quote.nonce,
			status = %signature_status,
			"Issued quote"
		);

		Ok(SignedQuote {
			expires_at: expires_at(quote.deadline),
			quote,
			signature,
			signature_status,
			rate,
			router: self.config.router.address,
		})
	}

	/// Looks up a rate for `GET /api/rates`, defaulting the currency.
	pub async fn rate(&self, currency: Option<&str>) -> Result<Rate, QuoteError> {
		let currency = validate_currency(currency, &self.config.quote.default_currency)?;
		self.fetch_rate(&currency).await
	}

	async fn fetch_rate(&self, currency: &str) -> Result<Rate, QuoteError> {
		self.rates
			.fetch_rate(currency)
			.await
			.map_err(|_| QuoteError::RateUnavailable(format!("Could not fetch rate for {}", currency)))
	}
}

/// Renders a deadline as RFC 3339 with millisecond precision, e.g. `2023-11-14T22:23:20.000Z`.
pub fn expires_at(deadline: U256) -> String {
	let seconds = i64::try_from(deadline).unwrap_or(i64::MAX);
	DateTime::<Utc>::from_timestamp(seconds, 0)
		.map(|t| t.to_rfc3339_opts(SecondsFormat::Millis, true))
		.unwrap_or_default()
}
