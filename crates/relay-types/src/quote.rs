//! Quote types exchanged between the dealer and the settlement router.
//!
//! A [`Quote`] carries exactly the eight fields the router re-derives when it
//! verifies a redemption. Amounts, nonce and deadline are serialized as decimal
//! strings so that no JSON consumer ever rounds them through a float.

use crate::api::u256_serde;
use crate::rate::Rate;
use alloy_primitives::{Address, Bytes, U256};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// Fixed validity window of every quote, in seconds.
pub const QUOTE_VALIDITY_SECONDS: u64 = 600;

/// Length of a recoverable signature blob: r (32) || s (32) || v (1).
pub const SIGNATURE_LENGTH: usize = 65;

/// Exchange quote signed off-chain and redeemed on-chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
	/// Token the payer sends.
	pub token_in: Address,
	/// Token the recipient receives.
	pub token_out: Address,
	/// Input amount in the smallest units of `token_in`.
	#[serde(with = "u256_serde")]
	pub amount_in: U256,
	/// Output amount in the smallest units of `token_out`, fixed at signing time.
	#[serde(with = "u256_serde")]
	pub amount_out: U256,
	/// Address placing the order; must be the caller at redemption.
	pub payer: Address,
	/// Address receiving `amount_out`.
	pub recipient: Address,
	/// Payer's router nonce this quote is bound to.
	#[serde(with = "u256_serde")]
	pub nonce: U256,
	/// Unix timestamp (seconds) after which redemption fails.
	#[serde(with = "u256_serde")]
	pub deadline: U256,
}

/// Validated input to the quote builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteRequest {
	pub token_in: Address,
	pub token_out: Address,
	pub amount_in: U256,
	pub payer: Address,
	pub recipient: Address,
	pub nonce: U256,
	/// ISO-4217 code of the output currency, upper case.
	pub currency: String,
}

/// How the signature attached to a quote was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignatureStatus {
	/// Signed by the dealer key with the given address.
	Signed(Address),
	/// Placeholder zero signature issued in explicit demo mode.
	UnsignedDemo,
}

impl fmt::Display for SignatureStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SignatureStatus::Signed(dealer) => {
				let address = format!("0x{:x}", dealer);
				write!(f, "signed_by_{}", &address[..10])
			},
			SignatureStatus::UnsignedDemo => write!(f, "unsigned_demo"),
		}
	}
}

impl Serialize for SignatureStatus {
	fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
	where
		S: Serializer,
	{
		serializer.collect_str(self)
	}
}

/// A quote together with everything the client needs to redeem it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedQuote {
	pub quote: Quote,
	/// 65-byte recoverable signature, hex encoded.
	pub signature: Bytes,
	pub signature_status: SignatureStatus,
	/// Rate the output amount was computed with.
	pub rate: Rate,
	/// Router contract the quote is bound to.
	pub router: Address,
	/// Deadline rendered as an RFC 3339 timestamp.
	pub expires_at: String,
}
