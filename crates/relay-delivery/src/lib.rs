//! Read access to a deployed settlement router.
//!
//! The relay never sends transactions. It only reads the router's public
//! accessors: a payer's current nonce, to flag stale quotes, and the domain
//! separator and dealer, to confirm that quotes signed here can be redeemed
//! there.

use async_trait::async_trait;
use relay_types::{Address, B256, U256};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod evm {
		pub mod alloy;
	}
}

/// Errors that can occur while reading router state.
#[derive(Debug, Error)]
pub enum DeliveryError {
	/// Error that occurs during network communication.
	#[error("Network error: {0}")]
	Network(String),
	/// The call reached the node but the contract reverted or returned garbage.
	#[error("Contract call failed: {0}")]
	Contract(String),
}

/// Side-effect free accessors of the router contract.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait RouterReader: Send + Sync {
	/// Current nonce of `payer`; quotes must be built against this value.
	async fn get_nonce(&self, payer: Address) -> Result<U256, DeliveryError>;

	/// Domain separator fixed at deployment.
	async fn domain_separator(&self) -> Result<B256, DeliveryError>;

	/// The dealer address the router accepts signatures from.
	async fn dealer(&self) -> Result<Address, DeliveryError>;
}

/// Result of comparing a deployed router against local settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeploymentReport {
	pub onchain_domain_separator: B256,
	pub onchain_dealer: Address,
	pub domain_separator_matches: bool,
	/// `None` when no dealer key is configured locally.
	pub dealer_matches: Option<bool>,
}

impl DeploymentReport {
	pub fn is_consistent(&self) -> bool {
		self.domain_separator_matches && self.dealer_matches != Some(false)
	}
}

/// Reads the router's domain separator and dealer and compares them with the
/// separator computed locally and the configured dealer key's address.
///
/// Mismatches are logged as warnings; quotes signed against a mismatched
/// domain or by a different dealer will fail on-chain with `InvalidSignature`.
pub async fn check_deployment(
	reader: &dyn RouterReader,
	expected_domain_separator: B256,
	expected_dealer: Option<Address>,
) -> Result<DeploymentReport, DeliveryError> {
	let onchain_domain_separator = reader.domain_separator().await?;
	let onchain_dealer = reader.dealer().await?;

	let report = DeploymentReport {
		onchain_domain_separator,
		onchain_dealer,
		domain_separator_matches: onchain_domain_separator == expected_domain_separator,
		dealer_matches: expected_dealer.map(|dealer| dealer == onchain_dealer),
	};

	if !report.domain_separator_matches {
		tracing::warn!(
			onchain = %onchain_domain_separator,
			local = %expected_domain_separator,
			"Router domain separator differs from configuration; signed quotes will not redeem"
		);
	}
	match (report.dealer_matches, expected_dealer) {
		(Some(false), Some(local)) => tracing::warn!(
			onchain = %onchain_dealer,
			local = %local,
			"Router dealer differs from configured dealer key"
		),
		(Some(true), _) => tracing::info!(dealer = %onchain_dealer, "Router deployment verified"),
		_ => tracing::debug!(dealer = %onchain_dealer, "No local dealer key to compare"),
	}

	Ok(report)
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const DEALER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

	fn reader(separator: B256, dealer: Address) -> MockRouterReader {
		let mut reader = MockRouterReader::new();
		reader
			.expect_domain_separator()
			.returning(move || Ok(separator));
		reader.expect_dealer().returning(move || Ok(dealer));
		reader
	}

	#[tokio::test]
	async fn test_consistent_deployment() {
		let separator = B256::repeat_byte(0xab);
		let report = check_deployment(&reader(separator, DEALER), separator, Some(DEALER))
			.await
			.unwrap();
		assert!(report.is_consistent());
		assert_eq!(report.dealer_matches, Some(true));
	}

	#[tokio::test]
	async fn test_mismatches_are_reported() {
		let separator = B256::repeat_byte(0xab);
		let report = check_deployment(
			&reader(separator, DEALER),
			B256::repeat_byte(0xcd),
			Some(Address::ZERO),
		)
		.await
		.unwrap();
		assert!(!report.domain_separator_matches);
		assert_eq!(report.dealer_matches, Some(false));
		assert!(!report.is_consistent());
	}

	#[tokio::test]
	async fn test_without_local_dealer_only_domain_is_checked() {
		let separator = B256::repeat_byte(0xab);
		let report = check_deployment(&reader(separator, DEALER), separator, None)
			.await
			.unwrap();
		assert_eq!(report.dealer_matches, None);
		assert!(report.is_consistent());
	}

	#[tokio::test]
	async fn test_read_errors_propagate() {
		let mut reader = MockRouterReader::new();
		reader
			.expect_domain_separator()
			.returning(|| Err(DeliveryError::Network("connection refused".into())));
		reader.expect_dealer().never();
		let err = check_deployment(&reader, B256::ZERO, None).await.unwrap_err();
		assert!(matches!(err, DeliveryError::Network(_)));
	}
}
