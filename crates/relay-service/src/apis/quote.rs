//! Quote and rate lookups.

use relay_quote::QuoteService;
use relay_types::{APIError, QuoteParams, Rate, RateParams, SignedQuote};

/// Processes `GET /api/quote`.
pub async fn process_quote_request(
	params: QuoteParams,
	quotes: &QuoteService,
) -> Result<SignedQuote, APIError> {
	quotes.quote(&params).await.map_err(|e| {
		tracing::warn!("Quote request failed: {}", e);
		APIError::from(e)
	})
}

/// Processes `GET /api/rates`.
pub async fn process_rate_request(
	params: RateParams,
	quotes: &QuoteService,
) -> Result<Rate, APIError> {
	quotes
		.rate(params.currency.as_deref())
		.await
		.map_err(|e| {
			tracing::warn!("Rate request failed: {}", e);
			APIError::from(e)
		})
}
