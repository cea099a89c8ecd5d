//! Configuration module for the settlement relay.
//!
//! The relay reads one TOML document at startup into an immutable [`Config`]
//! that is then shared behind an `Arc`. Values of the form `${VAR}` or
//! `${VAR:-default}` are substituted from the environment before parsing, so
//! the dealer key never needs to be written into the file itself.
//!
//! ## Modular Configuration Support
//!
//! Configurations can be split into multiple files:
//! - Use `include = ["rates.toml", "tokens.toml"]` to include other config files
//! - Each top-level section must be unique across all files (no duplicates allowed)

mod loader;

use alloy_primitives::Address;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;
use thiserror::Error;

/// Largest decimals value accepted for a token.
const MAX_TOKEN_DECIMALS: u8 = 36;

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
	/// Error that occurs during file I/O operations.
	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
	/// Error that occurs when parsing TOML configuration.
	#[error("Configuration error: {0}")]
	Parse(String),
	/// Error that occurs when configuration validation fails.
	#[error("Validation error: {0}")]
	Validation(String),
}

impl From<toml::de::Error> for ConfigError {
	fn from(err: toml::de::Error) -> Self {
		// Keep the message only, not the echoed input
		ConfigError::Parse(err.message().to_string())
	}
}

/// Main configuration structure for the relay.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
	/// Identity of this relay instance.
	pub service: ServiceConfig,
	/// Chain the router is deployed on.
	pub network: NetworkConfig,
	/// Router contract and its typed-data domain.
	pub router: RouterConfig,
	/// Dealer key used to sign quotes. Absent means no key is configured.
	pub dealer: Option<DealerConfig>,
	/// Quote construction settings.
	#[serde(default)]
	pub quote: QuoteConfig,
	/// Exchange rate sources.
	pub rates: RatesConfig,
	/// Known tokens and their decimals.
	#[serde(default)]
	pub tokens: Vec<TokenConfig>,
	/// Configuration for the HTTP API server.
	pub api: Option<ApiConfig>,
}

/// Configuration specific to the relay instance.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
	/// Identifier used in logs.
	pub id: String,
}

/// Network the router lives on.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NetworkConfig {
	/// Chain id bound into every quote's domain separator.
	pub chain_id: u64,
	/// JSON-RPC endpoint. Enables the deployment check and on-chain nonce lookups.
	pub rpc_url: Option<String>,
}

/// Router deployment and typed-data domain.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouterConfig {
	/// Verifying contract of the domain.
	pub address: Address,
	#[serde(default = "default_domain_name")]
	pub domain_name: String,
	#[serde(default = "default_domain_version")]
	pub domain_version: String,
}

fn default_domain_name() -> String {
	"APACash".to_string()
}

fn default_domain_version() -> String {
	"1".to_string()
}

/// Configuration for dealer key management.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DealerConfig {
	/// Which implementation to use.
	pub primary: String,
	/// Map of account implementation names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// Quote construction settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QuoteConfig {
	/// Currency used when a request omits `currency`.
	#[serde(default = "default_currency")]
	pub default_currency: String,
	/// Decimals of `tokenIn` when the token is not listed in `[[tokens]]`.
	#[serde(default = "default_input_decimals")]
	pub input_decimals: u8,
	/// Decimals of `tokenOut` when the token is not listed in `[[tokens]]`.
	#[serde(default = "default_output_decimals")]
	pub output_decimals: u8,
	/// Issue quotes with a zero placeholder signature when no dealer key is
	/// configured. Demo deployments only.
	#[serde(default)]
	pub allow_unsigned: bool,
}

impl Default for QuoteConfig {
	fn default() -> Self {
		Self {
			default_currency: default_currency(),
			input_decimals: default_input_decimals(),
			output_decimals: default_output_decimals(),
			allow_unsigned: false,
		}
	}
}

fn default_currency() -> String {
	"IDR".to_string()
}

fn default_input_decimals() -> u8 {
	6
}

fn default_output_decimals() -> u8 {
	2
}

/// Configuration for exchange rate sources.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RatesConfig {
	/// Source consulted first.
	pub primary: String,
	/// Source consulted when the primary fails.
	pub fallback: Option<String>,
	/// Seconds a fetched rate may be reused. 0 disables caching.
	#[serde(default)]
	pub cache_ttl_seconds: u64,
	/// Map of rate source names to their configurations.
	pub implementations: HashMap<String, toml::Value>,
}

/// A token the relay quotes for.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TokenConfig {
	pub address: Address,
	pub symbol: String,
	pub decimals: u8,
}

/// Configuration for the HTTP API server.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ApiConfig {
	/// Whether the API server is enabled.
	#[serde(default)]
	pub enabled: bool,
	/// Host address to bind the server to.
	#[serde(default = "default_api_host")]
	pub host: String,
	/// Port to bind the server to.
	#[serde(default = "default_api_port")]
	pub port: u16,
}

fn default_api_host() -> String {
	"127.0.0.1".to_string()
}

fn default_api_port() -> u16 {
	3003
}

/// Resolves environment variables in a string.
///
/// Replaces ${VAR_NAME} with the value of the environment variable VAR_NAME.
/// Supports default values with ${VAR_NAME:-default_value}.
///
/// Input strings are limited to 1MB to bound regex work.
pub(crate) fn resolve_env_vars(input: &str) -> Result<String, ConfigError> {
	const MAX_INPUT_SIZE: usize = 1024 * 1024;
	if input.len() > MAX_INPUT_SIZE {
		return Err(ConfigError::Validation(format!(
			"Configuration file too large: {} bytes (max: {} bytes)",
			input.len(),
			MAX_INPUT_SIZE
		)));
	}

	let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]{0,127})(?::-([^}]{0,256}))?\}")
		.map_err(|e| ConfigError::Parse(format!("Regex error: {}", e)))?;

	let mut result = String::with_capacity(input.len());
	let mut last = 0;

	for cap in re.captures_iter(input) {
		let (Some(full_match), Some(var_name)) = (cap.get(0), cap.get(1)) else {
			continue;
		};
		let value = match std::env::var(var_name.as_str()) {
			Ok(v) => v,
			Err(_) => match cap.get(2) {
				Some(default) => default.as_str().to_string(),
				None => {
					return Err(ConfigError::Validation(format!(
						"Environment variable '{}' not found",
						var_name.as_str()
					)))
				},
			},
		};

		result.push_str(&input[last..full_match.start()]);
		result.push_str(&value);
		last = full_match.end();
	}
	result.push_str(&input[last..]);

	Ok(result)
}

impl Config {
	/// Loads configuration from a file, following `include` directives.
	pub async fn from_file(path: &str) -> Result<Self, ConfigError> {
		let path_buf = Path::new(path);
		let base_dir = path_buf
			.parent()
			.filter(|p| !p.as_os_str().is_empty())
			.unwrap_or_else(|| Path::new("."));

		let mut loader = loader::ConfigLoader::new(base_dir);
		let file_name = path_buf
			.file_name()
			.ok_or_else(|| ConfigError::Validation(format!("Invalid path: {}", path)))?;
		loader.load_config(file_name).await
	}

	/// Parses TOML whose environment variables are already resolved.
	pub(crate) fn from_resolved(s: &str) -> Result<Self, ConfigError> {
		let config: Config = toml::from_str(s)?;
		config.validate()?;
		Ok(config)
	}

	/// Decimals of `token`, or `fallback` when the token is not listed.
	pub fn token_decimals(&self, token: &Address, fallback: u8) -> u8 {
		self.tokens
			.iter()
			.find(|t| &t.address == token)
			.map(|t| t.decimals)
			.unwrap_or(fallback)
	}

	/// Validates cross-field constraints serde cannot express.
	fn validate(&self) -> Result<(), ConfigError> {
		if self.service.id.trim().is_empty() {
			return Err(ConfigError::Validation("Service ID cannot be empty".into()));
		}

		if self.network.chain_id == 0 {
			return Err(ConfigError::Validation(
				"network.chain_id must be greater than 0".into(),
			));
		}
		if let Some(url) = &self.network.rpc_url {
			if !(url.starts_with("http://") || url.starts_with("https://")) {
				return Err(ConfigError::Validation(format!(
					"network.rpc_url must be an http(s) URL, got '{}'",
					url
				)));
			}
		}

		if self.router.domain_name.is_empty() || self.router.domain_version.is_empty() {
			return Err(ConfigError::Validation(
				"router.domain_name and router.domain_version cannot be empty".into(),
			));
		}

		if let Some(dealer) = &self.dealer {
			if !dealer.implementations.contains_key(&dealer.primary) {
				return Err(ConfigError::Validation(format!(
					"Primary dealer '{}' not found in implementations",
					dealer.primary
				)));
			}
		}

		self.validate_quote()?;
		self.validate_rates()?;
		self.validate_tokens()?;

		Ok(())
	}

	fn validate_quote(&self) -> Result<(), ConfigError> {
		let currency = &self.quote.default_currency;
		if currency.len() != 3 || !currency.chars().all(|c| c.is_ascii_uppercase()) {
			return Err(ConfigError::Validation(format!(
				"quote.default_currency must be a 3-letter upper-case code, got '{}'",
				currency
			)));
		}
		for (name, decimals) in [
			("input_decimals", self.quote.input_decimals),
			("output_decimals", self.quote.output_decimals),
		] {
			if decimals > MAX_TOKEN_DECIMALS {
				return Err(ConfigError::Validation(format!(
					"quote.{} cannot exceed {}",
					name, MAX_TOKEN_DECIMALS
				)));
			}
		}
		Ok(())
	}

	fn validate_rates(&self) -> Result<(), ConfigError> {
		let rates = &self.rates;
		if rates.implementations.is_empty() {
			return Err(ConfigError::Validation(
				"At least one rate source implementation must be configured".into(),
			));
		}
		if !rates.implementations.contains_key(&rates.primary) {
			return Err(ConfigError::Validation(format!(
				"Primary rate source '{}' not found in implementations",
				rates.primary
			)));
		}
		if let Some(fallback) = &rates.fallback {
			if fallback == &rates.primary {
				return Err(ConfigError::Validation(
					"Fallback rate source must differ from the primary".into(),
				));
			}
			if !rates.implementations.contains_key(fallback) {
				return Err(ConfigError::Validation(format!(
					"Fallback rate source '{}' not found in implementations",
					fallback
				)));
			}
		}
		if rates.cache_ttl_seconds > 3600 {
			return Err(ConfigError::Validation(
				"rates.cache_ttl_seconds cannot exceed 3600".into(),
			));
		}
		Ok(())
	}

	fn validate_tokens(&self) -> Result<(), ConfigError> {
		let mut seen = HashSet::new();
		for token in &self.tokens {
			if token.decimals > MAX_TOKEN_DECIMALS {
				return Err(ConfigError::Validation(format!(
					"Token {} decimals cannot exceed {}",
					token.symbol, MAX_TOKEN_DECIMALS
				)));
			}
			if !seen.insert(token.address) {
				return Err(ConfigError::Validation(format!(
					"Token address {} is listed more than once",
					token.address
				)));
			}
		}
		Ok(())
	}
}

/// Parses a TOML string, resolving environment variables and validating the result.
impl FromStr for Config {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		Config::from_resolved(&resolve_env_vars(s)?)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const BASE: &str = r#"
[service]
id = "apac-dealer"

[network]
chain_id = 421614

[router]
address = "0x93fc90a3fb7d8c15bbaf50bfcc612b26ca8e68c8"

[rates]
primary = "er_api"
fallback = "frankfurter"
[rates.implementations.er_api]
[rates.implementations.frankfurter]
"#;

	#[test]
	fn test_env_var_resolution() {
		std::env::set_var("RELAY_TEST_HOST", "localhost");
		std::env::set_var("RELAY_TEST_PORT", "8545");

		let input = "url = \"http://${RELAY_TEST_HOST}:${RELAY_TEST_PORT}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "url = \"http://localhost:8545\"");

		std::env::remove_var("RELAY_TEST_HOST");
		std::env::remove_var("RELAY_TEST_PORT");
	}

	#[test]
	fn test_env_var_with_default() {
		let input = "value = \"${RELAY_MISSING_VAR:-fallback}\" other = \"${RELAY_MISSING_VAR:-}\"";
		let result = resolve_env_vars(input).unwrap();
		assert_eq!(result, "value = \"fallback\" other = \"\"");
	}

	#[test]
	fn test_missing_env_var_error() {
		let result = resolve_env_vars("value = \"${RELAY_MISSING_VAR}\"");
		assert!(result.unwrap_err().to_string().contains("RELAY_MISSING_VAR"));
	}

	#[test]
	fn test_minimal_config_applies_defaults() {
		let config: Config = BASE.parse().unwrap();
		assert_eq!(config.service.id, "apac-dealer");
		assert_eq!(config.router.domain_name, "APACash");
		assert_eq!(config.router.domain_version, "1");
		assert_eq!(config.quote.default_currency, "IDR");
		assert_eq!(config.quote.input_decimals, 6);
		assert_eq!(config.quote.output_decimals, 2);
		assert!(!config.quote.allow_unsigned);
		assert_eq!(config.rates.cache_ttl_seconds, 0);
		assert!(config.dealer.is_none());
		assert!(config.api.is_none());
	}

	#[test]
	fn test_dealer_key_from_env() {
		std::env::set_var("RELAY_TEST_DEALER_KEY", "0xabc");
		let config_str = format!(
			"{}\n[dealer]\nprimary = \"local\"\n[dealer.implementations.local]\nprivate_key = \"${{RELAY_TEST_DEALER_KEY}}\"\n",
			BASE
		);
		let config: Config = config_str.parse().unwrap();
		let dealer = config.dealer.unwrap();
		assert_eq!(
			dealer.implementations["local"]
				.get("private_key")
				.and_then(|v| v.as_str()),
			Some("0xabc")
		);
		std::env::remove_var("RELAY_TEST_DEALER_KEY");
	}

	#[test]
	fn test_token_decimals_lookup() {
		let config_str = format!(
			"{}\n[[tokens]]\naddress = \"0xcff09905f8f18b35f5a1ba6d2822d62b3d8c48be\"\nsymbol = \"USDC\"\ndecimals = 6\n",
			BASE
		);
		let config: Config = config_str.parse().unwrap();
		assert_eq!(
			config.token_decimals(&address!("cff09905f8f18b35f5a1ba6d2822d62b3d8c48be"), 18),
			6
		);
		assert_eq!(config.token_decimals(&Address::ZERO, 18), 18);
	}

	#[test]
	fn test_unknown_primary_rate_source_rejected() {
		let config_str = BASE.replace("primary = \"er_api\"", "primary = \"bloomberg\"");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err
			.to_string()
			.contains("Primary rate source 'bloomberg' not found"));
	}

	#[test]
	fn test_fallback_equal_to_primary_rejected() {
		let config_str = BASE.replace("fallback = \"frankfurter\"", "fallback = \"er_api\"");
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("must differ"));
	}

	#[test]
	fn test_zero_chain_id_rejected() {
		let config_str = BASE.replace("chain_id = 421614", "chain_id = 0");
		assert!(Config::from_str(&config_str).is_err());
	}

	#[test]
	fn test_malformed_router_address_rejected() {
		let config_str = BASE.replace(
			"0x93fc90a3fb7d8c15bbaf50bfcc612b26ca8e68c8",
			"0x93fc90a3fb",
		);
		assert!(matches!(
			Config::from_str(&config_str),
			Err(ConfigError::Parse(_))
		));
	}

	#[test]
	fn test_duplicate_token_rejected() {
		let token = "\n[[tokens]]\naddress = \"0xcff09905f8f18b35f5a1ba6d2822d62b3d8c48be\"\nsymbol = \"USDC\"\ndecimals = 6\n";
		let config_str = format!("{}{}{}", BASE, token, token);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("listed more than once"));
	}

	#[test]
	fn test_unknown_dealer_primary_rejected() {
		let config_str = format!(
			"{}\n[dealer]\nprimary = \"kms\"\n[dealer.implementations.local]\nprivate_key = \"0x01\"\n",
			BASE
		);
		let err = Config::from_str(&config_str).unwrap_err();
		assert!(err.to_string().contains("Primary dealer 'kms' not found"));
	}

	#[test]
	fn test_lower_case_default_currency_rejected() {
		let config_str = format!("{}\n[quote]\ndefault_currency = \"idr\"\n", BASE);
		assert!(Config::from_str(&config_str).is_err());
	}
}
