//! Router reads over JSON-RPC using the Alloy provider.

use crate::{DeliveryError, RouterReader};
use alloy_provider::RootProvider;
use alloy_sol_types::sol;
use alloy_transport_http::Http;
use async_trait::async_trait;
use relay_types::{Address, B256, U256};

sol! {
	#[sol(rpc)]
	interface IApaCashRouter {
		event Swap(address indexed payer, address indexed recipient, address tokenIn, address tokenOut, uint256 amountIn, uint256 amountOut);

		function swapWithSignature(address tokenIn, address tokenOut, uint256 amountIn, uint256 amountOut, address recipient, uint256 deadline, bytes signature) external;
		function getNonce(address payer) external view returns (uint256);
		function DOMAIN_SEPARATOR() external view returns (bytes32);
		function dealer() external view returns (address);
	}
}

/// [`RouterReader`] backed by an HTTP JSON-RPC endpoint.
pub struct AlloyRouterReader {
	provider: RootProvider<Http<reqwest::Client>>,
	router: Address,
}

impl AlloyRouterReader {
	pub fn new(rpc_url: &str, router: Address) -> Result<Self, DeliveryError> {
		let url = rpc_url
			.parse()
			.map_err(|e| DeliveryError::Network(format!("Invalid RPC URL: {}", e)))?;
		Ok(Self {
			provider: RootProvider::new_http(url),
			router,
		})
	}
}

#[async_trait]
impl RouterReader for AlloyRouterReader {
	async fn get_nonce(&self, payer: Address) -> Result<U256, DeliveryError> {
		let nonce = IApaCashRouter::new(self.router, &self.provider)
			.getNonce(payer)
			.call()
			.await
			.map_err(|e| DeliveryError::Contract(format!("Failed to call getNonce: {}", e)))?;
		Ok(nonce._0)
	}

	async fn domain_separator(&self) -> Result<B256, DeliveryError> {
		let separator = IApaCashRouter::new(self.router, &self.provider)
			.DOMAIN_SEPARATOR()
			.call()
			.await
			.map_err(|e| {
				DeliveryError::Contract(format!("Failed to call DOMAIN_SEPARATOR: {}", e))
			})?;
		Ok(separator._0)
	}

	async fn dealer(&self) -> Result<Address, DeliveryError> {
		let dealer = IApaCashRouter::new(self.router, &self.provider)
			.dealer()
			.call()
			.await
			.map_err(|e| DeliveryError::Contract(format!("Failed to call dealer: {}", e)))?;
		Ok(dealer._0)
	}
}
