//! Common types module for the settlement relay.
//!
//! This module defines the data types shared by the quoting service, the
//! settlement model and the HTTP layer. Keeping them in one crate guarantees
//! that every component agrees on the shape of a quote and its wire encoding.

/// API types for HTTP endpoints and request/response structures.
pub mod api;
/// The signed quote and the request that produces it.
pub mod quote;
/// Foreign-exchange rate observations.
pub mod rate;
/// Registry trait for self-registering implementations.
pub mod registry;
/// Redacted string wrapper for key material.
pub mod secret_string;
/// Utility functions for common type conversions.
pub mod utils;
/// Configuration validation types for ensuring type-safe configurations.
pub mod validation;

pub use alloy_primitives::{Address, Bytes, B256, U256};

pub use api::*;
pub use quote::*;
pub use rate::*;
pub use registry::ImplementationRegistry;
pub use secret_string::SecretString;
pub use utils::{
	compute_domain_separator, compute_final_digest, current_timestamp, current_timestamp_millis,
	format_token_amount, normalize_private_key, with_0x_prefix, Eip712AbiEncoder,
};
pub use validation::*;
