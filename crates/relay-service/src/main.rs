//! Main entry point for the settlement relay.
//!
//! The relay prices and signs exchange quotes that the on-chain router
//! redeems. It loads its configuration, builds the rate sources and dealer
//! account named there, optionally checks the deployed router against the
//! local domain, and serves the HTTP API.

use clap::Parser;
use relay_config::Config;
use std::path::PathBuf;

mod apis;
mod factory_registry;
mod server;

/// Command-line arguments for the relay service.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
	/// Path to configuration file
	#[arg(short, long, default_value = "config/demo.toml", env = "RELAY_CONFIG")]
	config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, default_value = "info")]
	log_level: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	use tracing_subscriber::{fmt, EnvFilter};

	let env_filter =
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

	fmt()
		.with_env_filter(env_filter)
		.with_thread_ids(true)
		.with_target(true)
		.init();

	tracing::info!("Started relay");

	let config_path = args
		.config
		.to_str()
		.ok_or("Configuration path is not valid UTF-8")?;
	let config = Config::from_file(config_path).await?;
	tracing::info!("Loaded configuration [{}]", config.service.id);

	let api_config = config.api.clone().filter(|api| api.enabled);
	let state = factory_registry::build_app_state(config).await?;

	if let Some(reader) = &state.router_reader {
		match relay_delivery::check_deployment(
			reader.as_ref(),
			state.domain_separator,
			state.dealer,
		)
		.await
		{
			Ok(report) if !report.is_consistent() => {
				tracing::warn!("Router deployment does not match configuration")
			},
			Ok(_) => {},
			Err(e) => tracing::warn!("Could not check router deployment: {}", e),
		}
	}

	match api_config {
		Some(api_config) => server::start_server(api_config, state).await?,
		None => tracing::warn!("API server is disabled; nothing to serve"),
	}

	tracing::info!("Stopped relay");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_args_defaults() {
		let args = Args::parse_from(["relay"]);
		assert_eq!(args.log_level, "info");
	}

	#[test]
	fn test_args_custom_values() {
		let args = Args::parse_from(["relay", "--config", "custom.toml", "-l", "debug"]);
		assert_eq!(args.config, PathBuf::from("custom.toml"));
		assert_eq!(args.log_level, "debug");
	}

	#[tokio::test]
	async fn test_build_from_config_file() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("relay.toml");
		std::fs::write(
			&path,
			r#"
include = "rates.toml"

[service]
id = "file-relay"

[network]
chain_id = 31337

[router]
address = "0x5fbdb2315678afecb367f032d93f642f64180aa3"

[quote]
allow_unsigned = true
"#,
		)
		.unwrap();
		std::fs::write(
			dir.path().join("rates.toml"),
			r#"
[rates]
primary = "mock"
[rates.implementations.mock]
rates = { IDR = 15000 }
"#,
		)
		.unwrap();

		let config = Config::from_file(path.to_str().unwrap()).await.unwrap();
		let state = factory_registry::build_app_state(config).await.unwrap();
		assert_eq!(state.config.service.id, "file-relay");
		assert!(state.dealer.is_none());

		let params = relay_types::QuoteParams {
			token_in: Some("0xcff09905f8f18b35f5a1ba6d2822d62b3d8c48be".into()),
			token_out: Some("0xf98a4a0482d534c004cdb9a3358fd71347c4395b".into()),
			amount_in: Some("10000000".into()),
			recipient: Some("0x70997970c51812dc3a010c7d01b50e0d17dc79c8".into()),
			payer: Some("0x3c44cdddb6a900fa2b585dd299e03d12fa4293bc".into()),
			..Default::default()
		};
		let signed = state.quotes.quote(&params).await.unwrap();
		assert_eq!(signed.signature_status, relay_types::SignatureStatus::UnsignedDemo);
		assert_eq!(signed.quote.amount_out.to_string(), "15000000");
	}

	#[tokio::test]
	async fn test_shipped_config_loads() {
		let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/demo.toml");
		let config = Config::from_file(path).await.unwrap();
		assert_eq!(config.rates.primary, "er_api");
		assert_eq!(config.rates.fallback.as_deref(), Some("frankfurter"));
		assert!(config.api.as_ref().is_some_and(|api| api.enabled));
	}
}
