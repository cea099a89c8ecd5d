//! Registry trait for self-registering implementations.
//!
//! Pluggable components (rate sources, dealer accounts) expose a `Registry`
//! struct so the service can build them by the name used in configuration.

/// Base trait for implementation registries.
pub trait ImplementationRegistry {
	/// The name used in configuration files to reference this implementation,
	/// e.g. `"er_api"` for `[rates.implementations.er_api]` or `"local"` for
	/// `[dealer.implementations.local]`.
	const NAME: &'static str;

	/// The factory function type this implementation provides.
	type Factory;

	/// Get the factory function for this implementation.
	fn factory() -> Self::Factory;
}
