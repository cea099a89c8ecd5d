//! Dealer key held in process memory.
//!
//! The key is read from `[dealer.implementations.local] private_key`. Values
//! pasted from env files are tolerated: whitespace, quote characters and a
//! missing `0x` prefix are cleaned up before parsing.

use crate::{AccountError, AccountFactory, AccountInterface, AccountRegistry};
use alloy_signer::Signer;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use relay_types::{
	normalize_private_key, Address, ConfigSchema, Field, FieldType, ImplementationRegistry,
	Schema, SecretString, ValidationError, B256, SIGNATURE_LENGTH,
};
use std::str::FromStr;

/// Local wallet implementation backed by a raw private key.
pub struct LocalWallet {
	signer: PrivateKeySigner,
}

impl LocalWallet {
	/// Builds a wallet from a raw key string.
	///
	/// A key that is empty after normalisation is [`AccountError::MissingKey`];
	/// anything that does not parse as a secp256k1 scalar is
	/// [`AccountError::InvalidKey`]. The key itself never appears in errors.
	pub fn new(private_key: &SecretString) -> Result<Self, AccountError> {
		let key = private_key
			.with_exposed(normalize_private_key)
			.map(SecretString::from)
			.ok_or(AccountError::MissingKey)?;

		let signer = key
			.with_exposed(PrivateKeySigner::from_str)
			.map_err(|_| {
				AccountError::InvalidKey("private key is not a valid secp256k1 scalar".into())
			})?;

		Ok(Self { signer })
	}
}

/// Configuration schema for the local wallet.
pub struct LocalWalletSchema;

impl ConfigSchema for LocalWalletSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		Schema::new(vec![Field::new("private_key", FieldType::String)], vec![]).validate(config)
	}
}

#[async_trait]
impl AccountInterface for LocalWallet {
	async fn address(&self) -> Result<Address, AccountError> {
		Ok(self.signer.address())
	}

	async fn sign_hash(&self, hash: &B256) -> Result<[u8; SIGNATURE_LENGTH], AccountError> {
		let signature = self
			.signer
			.sign_hash(hash)
			.await
			.map_err(|e| AccountError::SigningFailed(e.to_string()))?;
		Ok(signature.as_bytes())
	}
}

/// Registry for the local wallet implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "local";
	type Factory = AccountFactory;

	fn factory() -> Self::Factory {
		|config: &toml::Value| -> Result<Box<dyn AccountInterface>, AccountError> {
			LocalWalletSchema
				.validate(config)
				.map_err(|e| AccountError::InvalidKey(e.to_string()))?;

			let private_key = config
				.get("private_key")
				.and_then(|v| v.as_str())
				.map(SecretString::from)
				.ok_or(AccountError::MissingKey)?;

			let wallet = LocalWallet::new(&private_key)?;
			tracing::info!(dealer = %wallet.signer.address(), "Loaded dealer key");
			Ok(Box::new(wallet))
		}
	}
}

impl AccountRegistry for Registry {}
