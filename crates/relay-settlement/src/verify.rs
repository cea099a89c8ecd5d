//! Stateless quote verification.
//!
//! These are the checks the router runs before touching any balance, exposed
//! as pure functions so the HTTP service can pre-verify a quote with exactly
//! the router's semantics.

use alloy_primitives::{keccak256, PrimitiveSignature};
use relay_types::{
	compute_final_digest, utils::QUOTE_TYPE, Address, Eip712AbiEncoder, Quote,
	VerificationFailure, VerifyResponse, B256, SIGNATURE_LENGTH, U256,
};

/// hashStruct(quote) with fields encoded in declaration order.
pub fn quote_struct_hash(quote: &Quote) -> B256 {
	let mut enc = Eip712AbiEncoder::new();
	enc.push_b256(&keccak256(QUOTE_TYPE.as_bytes()));
	enc.push_address(&quote.token_in);
	enc.push_address(&quote.token_out);
	enc.push_u256(quote.amount_in);
	enc.push_u256(quote.amount_out);
	enc.push_address(&quote.payer);
	enc.push_address(&quote.recipient);
	enc.push_u256(quote.nonce);
	enc.push_u256(quote.deadline);
	keccak256(enc.finish())
}

/// Typed-data digest of `quote` under `domain_separator`.
pub fn quote_digest(domain_separator: &B256, quote: &Quote) -> B256 {
	compute_final_digest(domain_separator, &quote_struct_hash(quote))
}

/// Recovers the signer of `digest` from an `r || s || v` blob.
///
/// Mirrors `ecrecover`: a blob of the wrong length, a `v` outside {27, 28} or
/// an unrecoverable point yields the zero address instead of an error.
pub fn recover_signer(digest: &B256, signature: &[u8]) -> Address {
	if signature.len() != SIGNATURE_LENGTH {
		return Address::ZERO;
	}
	let v = signature[64];
	if v != 27 && v != 28 {
		return Address::ZERO;
	}
	let sig = PrimitiveSignature::new(
		U256::from_be_slice(&signature[..32]),
		U256::from_be_slice(&signature[32..64]),
		v == 28,
	);
	sig.recover_address_from_prehash(digest)
		.unwrap_or(Address::ZERO)
}

/// Checks `quote` the way the router would at time `now`.
///
/// `current_nonce` is the payer's nonce as read from the router, when known.
/// Checks run in router order: deadline, then signer, then nonce.
pub fn verify_quote(
	domain_separator: &B256,
	dealer: Address,
	quote: &Quote,
	signature: &[u8],
	now: u64,
	current_nonce: Option<U256>,
) -> VerifyResponse {
	let digest = quote_digest(domain_separator, quote);
	let signer = recover_signer(&digest, signature);

	let reason = if U256::from(now) > quote.deadline {
		Some(VerificationFailure::Expired)
	} else if signer.is_zero() || signer != dealer {
		Some(VerificationFailure::InvalidSignature)
	} else if current_nonce.is_some_and(|nonce| nonce != quote.nonce) {
		Some(VerificationFailure::StaleNonce)
	} else {
		None
	};

	VerifyResponse {
		valid: reason.is_none(),
		signer,
		digest,
		reason,
	}
}
