//! Utility functions shared across the relay crates.

pub mod eip712;
pub mod formatting;
pub mod helpers;

pub use eip712::{
	compute_domain_separator, compute_final_digest, Eip712AbiEncoder, DOMAIN_TYPE, QUOTE_TYPE,
};
pub use formatting::{format_token_amount, normalize_private_key, with_0x_prefix};
pub use helpers::{current_timestamp, current_timestamp_millis};
