//! Factory registry for pluggable relay components.
//!
//! Rate sources and dealer accounts register themselves by the name used in
//! configuration. At startup the configured names are resolved here and the
//! services the HTTP layer needs are assembled.

use crate::server::AppState;
use relay_account::{AccountError, AccountFactory, AccountService};
use relay_config::Config;
use relay_delivery::{implementations::evm::alloy::AlloyRouterReader, RouterReader};
use relay_quote::{router_domain, QuoteService, QuoteSigner};
use relay_rates::{RateService, RateSourceFactory, RateSourceInterface};
use relay_types::compute_domain_separator;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use std::time::Duration;

/// Registry of every implementation compiled into the binary.
pub struct FactoryRegistry {
	pub rates: HashMap<String, RateSourceFactory>,
	pub account: HashMap<String, AccountFactory>,
}

impl FactoryRegistry {
	pub fn new() -> Self {
		Self {
			rates: HashMap::new(),
			account: HashMap::new(),
		}
	}

	/// Register a rate source implementation
	pub fn register_rates(&mut self, name: impl Into<String>, factory: RateSourceFactory) {
		self.rates.insert(name.into(), factory);
	}

	/// Register an account implementation
	pub fn register_account(&mut self, name: impl Into<String>, factory: AccountFactory) {
		self.account.insert(name.into(), factory);
	}
}

static REGISTRY: OnceLock<FactoryRegistry> = OnceLock::new();

/// Get the global factory registry, populating it on first use.
pub fn get_registry() -> &'static FactoryRegistry {
	REGISTRY.get_or_init(|| {
		let mut registry = FactoryRegistry::new();

		for (name, factory) in relay_rates::get_all_implementations() {
			tracing::debug!("Registering rate source implementation: {}", name);
			registry.register_rates(name, factory);
		}

		for (name, factory) in relay_account::get_all_implementations() {
			tracing::debug!("Registering account implementation: {}", name);
			registry.register_account(name, factory);
		}

		registry
	})
}

fn unknown_implementation<F>(
	kind: &str,
	name: &str,
	available: &HashMap<String, F>,
) -> Box<dyn std::error::Error> {
	let mut names: Vec<_> = available.keys().cloned().collect();
	names.sort();
	format!(
		"Unknown {} implementation '{}'. Available: [{}]",
		kind,
		name,
		names.join(", ")
	)
	.into()
}

fn implementation_config<'a>(
	kind: &str,
	name: &str,
	implementations: &'a HashMap<String, toml::Value>,
) -> Result<&'a toml::Value, Box<dyn std::error::Error>> {
	implementations
		.get(name)
		.ok_or_else(|| format!("No configuration for {} implementation '{}'", kind, name).into())
}

fn build_rate_source(
	registry: &FactoryRegistry,
	config: &Config,
	name: &str,
) -> Result<Arc<dyn RateSourceInterface>, Box<dyn std::error::Error>> {
	let factory = registry
		.rates
		.get(name)
		.ok_or_else(|| unknown_implementation("rate source", name, &registry.rates))?;
	let table = implementation_config("rate source", name, &config.rates.implementations)?;
	let source = factory(table)?;
	tracing::info!(name = %name, source = %source.source_id(), "Loaded rate source");
	Ok(Arc::from(source))
}

/// Builds the primary and fallback rate sources named in `[rates]`.
pub fn build_rate_service(
	registry: &FactoryRegistry,
	config: &Config,
) -> Result<RateService, Box<dyn std::error::Error>> {
	let primary = build_rate_source(registry, config, &config.rates.primary)?;
	let fallback = config
		.rates
		.fallback
		.as_deref()
		.map(|name| build_rate_source(registry, config, name))
		.transpose()?;
	if fallback.is_none() {
		tracing::warn!("No fallback rate source configured");
	}

	Ok(RateService::new(
		primary,
		fallback,
		Duration::from_secs(config.rates.cache_ttl_seconds),
	))
}

/// Builds the dealer account from `[dealer]`.
///
/// No `[dealer]` section, or an empty key, yields `None`: the relay starts and
/// reports `NO_DEALER_KEY` per request. A key that is present but malformed is
/// a startup error.
pub fn build_dealer(
	registry: &FactoryRegistry,
	config: &Config,
) -> Result<Option<AccountService>, Box<dyn std::error::Error>> {
	let Some(dealer) = &config.dealer else {
		tracing::warn!("No dealer configured; quotes cannot be signed");
		return Ok(None);
	};

	let factory = registry
		.account
		.get(&dealer.primary)
		.ok_or_else(|| unknown_implementation("account", &dealer.primary, &registry.account))?;
	let table = implementation_config("account", &dealer.primary, &dealer.implementations)?;

	match factory(table) {
		Ok(account) => Ok(Some(AccountService::new(account))),
		Err(AccountError::MissingKey) => {
			tracing::warn!("Dealer private key is empty; quotes cannot be signed");
			Ok(None)
		},
		Err(e) => Err(e.into()),
	}
}

/// Assembles everything the HTTP API needs from configuration.
pub async fn build_app_state(config: Config) -> Result<AppState, Box<dyn std::error::Error>> {
	let registry = get_registry();
	let rates = build_rate_service(registry, &config)?;
	let account = build_dealer(registry, &config)?.map(Arc::new);

	let dealer = match &account {
		Some(account) => Some(account.get_address().await?),
		None => None,
	};
	if dealer.is_none() && config.quote.allow_unsigned {
		tracing::warn!("Unsigned demo quotes are enabled; they can never be redeemed");
	}

	let router = &config.router;
	let domain = router_domain(
		&router.domain_name,
		&router.domain_version,
		config.network.chain_id,
		router.address,
	);
	let domain_separator = compute_domain_separator(
		&router.domain_name,
		&router.domain_version,
		config.network.chain_id,
		&router.address,
	);
	let signer = QuoteSigner::new(domain, account, config.quote.allow_unsigned);

	let router_reader = match &config.network.rpc_url {
		Some(url) => {
			Some(Arc::new(AlloyRouterReader::new(url, router.address)?) as Arc<dyn RouterReader>)
		},
		None => None,
	};

	let config = Arc::new(config);
	let quotes = QuoteService::new(Arc::clone(&config), Arc::new(rates), Arc::new(signer));

	Ok(AppState {
		config,
		quotes: Arc::new(quotes),
		router_reader,
		domain_separator,
		dealer,
	})
}
