//! Dealer account management for the settlement relay.
//!
//! The dealer is the only signer the router accepts. This crate hides where
//! the dealer key lives behind [`AccountInterface`]; callers only ever see the
//! dealer address and 65-byte recoverable signatures over 32-byte digests.

use async_trait::async_trait;
use relay_types::{Address, ImplementationRegistry, B256, SIGNATURE_LENGTH};
use thiserror::Error;

/// Re-export implementations
pub mod implementations {
	pub mod local;
}

/// Errors that can occur during account operations.
#[derive(Debug, Error)]
pub enum AccountError {
	/// The implementation is configured but its key is empty.
	#[error("No private key configured")]
	MissingKey,
	/// Error that occurs when a cryptographic key is invalid or malformed.
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	/// Error that occurs when signing operations fail.
	#[error("Signing failed: {0}")]
	SigningFailed(String),
}

/// Trait defining the interface for dealer account implementations.
///
/// Implementations must be safe to call from concurrent requests.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait AccountInterface: Send + Sync {
	/// Address the router must have configured as its dealer.
	async fn address(&self) -> Result<Address, AccountError>;

	/// Signs a 32-byte digest, returning `r || s || v` with `v` in {27, 28}.
	async fn sign_hash(&self, hash: &B256) -> Result<[u8; SIGNATURE_LENGTH], AccountError>;
}

/// Type alias for account factory functions.
pub type AccountFactory = fn(&toml::Value) -> Result<Box<dyn AccountInterface>, AccountError>;

/// Registry trait for account implementations.
pub trait AccountRegistry: ImplementationRegistry<Factory = AccountFactory> {}

/// Get all registered account implementations.
pub fn get_all_implementations() -> Vec<(&'static str, AccountFactory)> {
	use implementations::local;

	vec![(local::Registry::NAME, local::Registry::factory())]
}

/// Service that manages the dealer account.
pub struct AccountService {
	implementation: Box<dyn AccountInterface>,
}

impl AccountService {
	pub fn new(implementation: Box<dyn AccountInterface>) -> Self {
		Self { implementation }
	}

	/// Retrieves the dealer address.
	pub async fn get_address(&self) -> Result<Address, AccountError> {
		self.implementation.address().await
	}

	/// Signs a digest with the dealer key.
	pub async fn sign_hash(&self, hash: &B256) -> Result<[u8; SIGNATURE_LENGTH], AccountError> {
		self.implementation.sign_hash(hash).await
	}
}
