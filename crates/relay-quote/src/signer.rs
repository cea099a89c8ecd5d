//! EIP-712 quote signing.
//!
//! The digest is produced by the `sol!` generated [`SolStruct`] impl of the
//! router's `Quote` type under the router's domain. The router side rebuilds
//! the same bytes by hand, so the two must be kept in lockstep.

use alloy_primitives::{Bytes, B256, U256};
use alloy_sol_types::{Eip712Domain, SolStruct};
use relay_account::AccountService;
use relay_types::{Address, Quote, QuoteError, SignatureStatus, SIGNATURE_LENGTH};
use std::sync::Arc;

/// Solidity view of the quote as signed.
pub mod typed {
	alloy_sol_types::sol! {
		#[derive(Debug, PartialEq, Eq)]
		struct Quote {
			address tokenIn;
			address tokenOut;
			uint256 amountIn;
			uint256 amountOut;
			address payer;
			address recipient;
			uint256 nonce;
			uint256 deadline;
		}
	}
}

impl From<&Quote> for typed::Quote {
	fn from(quote: &Quote) -> Self {
		Self {
			tokenIn: quote.token_in,
			tokenOut: quote.token_out,
			amountIn: quote.amount_in,
			amountOut: quote.amount_out,
			payer: quote.payer,
			recipient: quote.recipient,
			nonce: quote.nonce,
			deadline: quote.deadline,
		}
	}
}

/// Builds the router's typed-data domain.
pub fn router_domain(name: &str, version: &str, chain_id: u64, router: Address) -> Eip712Domain {
	Eip712Domain::new(
		Some(name.to_string().into()),
		Some(version.to_string().into()),
		Some(U256::from(chain_id)),
		Some(router),
		None,
	)
}

/// Signs quotes with the dealer key, or issues demo placeholders when allowed.
pub struct QuoteSigner {
	domain: Eip712Domain,
	account: Option<Arc<AccountService>>,
	allow_unsigned: bool,
}

impl QuoteSigner {
	pub fn new(
		domain: Eip712Domain,
		account: Option<Arc<AccountService>>,
		allow_unsigned: bool,
	) -> Self {
		Self {
			domain,
			account,
			allow_unsigned,
		}
	}

	pub fn domain(&self) -> &Eip712Domain {
		&self.domain
	}

	/// keccak256(0x1901 || domainSeparator || hashStruct(quote)).
	pub fn digest(&self, quote: &Quote) -> B256 {
		typed::Quote::from(quote).eip712_signing_hash(&self.domain)
	}

	/// Signs `quote`.
	///
	/// Without a dealer key the result is [`QuoteError::NoDealerKey`] unless
	/// unsigned demo quotes are enabled, in which case the signature is 65 zero
	/// bytes. That placeholder never recovers to any dealer on-chain.
	pub async fn sign(&self, quote: &Quote) -> Result<(Bytes, SignatureStatus), QuoteError> {
		let Some(account) = &self.account else {
			if self.allow_unsigned {
				tracing::warn!("No dealer key configured, issuing unsigned demo quote");
				return Ok((
					Bytes::from(vec![0u8; SIGNATURE_LENGTH]),
					SignatureStatus::UnsignedDemo,
				));
			}
			return Err(QuoteError::NoDealerKey);
		};

		let dealer = account
			.get_address()
			.await
			.map_err(|e| QuoteError::SigningFailure(e.to_string()))?;
		let digest = self.digest(quote);
		let signature = account.sign_hash(&digest).await.map_err(|e| {
			tracing::warn!(error = %e, "Dealer failed to sign quote");
			QuoteError::SigningFailure(e.to_string())
		})?;

		tracing::debug!(digest = %digest, dealer = %dealer, "Signed quote");
		Ok((Bytes::from(signature.to_vec()), SignatureStatus::Signed(dealer)))
	}
}
