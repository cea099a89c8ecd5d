//! Settlement model for the relay.
//!
//! This crate holds an in-process model of the router contract that redeems
//! dealer-signed quotes. It is the reference for what the deployed router
//! accepts: the verification path hashes quotes by hand, independently of the
//! signer, and every redemption is all-or-nothing.

use relay_types::{Address, U256};
use thiserror::Error;

pub mod ledger;
pub mod router;
pub mod verify;

pub use ledger::{Erc20Ledger, TokenLedger};
pub use router::{RedeemArgs, Router, RouterDeployment, SwapEvent};
pub use verify::{quote_digest, quote_struct_hash, recover_signer, verify_quote};

/// Errors raised by token movements.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransferError {
	#[error("Insufficient balance of {token} for {holder}: need {needed}, have {available}")]
	InsufficientBalance {
		token: Address,
		holder: Address,
		needed: U256,
		available: U256,
	},
	#[error("Insufficient allowance of {token} from {owner} to {spender}: need {needed}, have {available}")]
	InsufficientAllowance {
		token: Address,
		owner: Address,
		spender: Address,
		needed: U256,
		available: U256,
	},
	#[error("Balance of {token} for {holder} would overflow")]
	Overflow { token: Address, holder: Address },
}

/// Reasons the router rejects a call. A rejected call changes no state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouterError {
	/// The quote deadline is in the past.
	#[error("Quote expired at {deadline} (now {now})")]
	Expired { deadline: U256, now: u64 },
	/// The signature does not recover to the dealer under the caller's current nonce.
	#[error("Invalid signature: recovered {recovered}")]
	InvalidSignature { recovered: Address },
	/// Pulling the input token from the payer failed.
	#[error("Transfer in failed: {0}")]
	TransferInFailed(TransferError),
	/// Paying the output token to the recipient failed.
	#[error("Transfer out failed: {0}")]
	TransferOutFailed(TransferError),
	/// Only the owner may call this.
	#[error("Not authorized: {caller}")]
	NotAuthorized { caller: Address },
}

/// What a client should do after a rejected redemption.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Remedy {
	/// Fetch a fresh quote (expired, replayed or tampered).
	Requote,
	/// Raise the router's allowance on the input token.
	Reapprove,
	/// Add funds: the payer's input balance or the router's output liquidity.
	TopUp,
	/// Nothing the payer can do.
	None,
}

impl RouterError {
	pub fn remedy(&self) -> Remedy {
		match self {
			RouterError::Expired { .. } | RouterError::InvalidSignature { .. } => Remedy::Requote,
			RouterError::TransferInFailed(TransferError::InsufficientAllowance { .. }) => {
				Remedy::Reapprove
			},
			RouterError::TransferInFailed(TransferError::InsufficientBalance { .. })
			| RouterError::TransferOutFailed(TransferError::InsufficientBalance { .. }) => Remedy::TopUp,
			_ => Remedy::None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_remedies() {
		let balance = TransferError::InsufficientBalance {
			token: Address::ZERO,
			holder: Address::ZERO,
			needed: U256::from(2u64),
			available: U256::from(1u64),
		};
		let allowance = TransferError::InsufficientAllowance {
			token: Address::ZERO,
			owner: Address::ZERO,
			spender: Address::ZERO,
			needed: U256::from(2u64),
			available: U256::ZERO,
		};

		assert_eq!(
			RouterError::Expired {
				deadline: U256::ZERO,
				now: 1
			}
			.remedy(),
			Remedy::Requote
		);
		assert_eq!(
			RouterError::InvalidSignature {
				recovered: Address::ZERO
			}
			.remedy(),
			Remedy::Requote
		);
		assert_eq!(
			RouterError::TransferInFailed(allowance).remedy(),
			Remedy::Reapprove
		);
		assert_eq!(
			RouterError::TransferInFailed(balance.clone()).remedy(),
			Remedy::TopUp
		);
		assert_eq!(RouterError::TransferOutFailed(balance).remedy(), Remedy::TopUp);
		assert_eq!(
			RouterError::NotAuthorized {
				caller: Address::ZERO
			}
			.remedy(),
			Remedy::None
		);
	}
}
