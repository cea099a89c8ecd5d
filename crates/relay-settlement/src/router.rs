//! The router state machine.
//!
//! A redemption records the nonce and ledger entries it writes and restores
//! them when a later step fails, so a failed redemption leaves no trace.

use crate::ledger::{Erc20Ledger, TokenLedger};
use crate::verify::{quote_digest, recover_signer};
use crate::RouterError;
use relay_types::{compute_domain_separator, Address, Bytes, Quote, B256, U256};
use std::collections::HashMap;

/// Immutable parameters fixed when the router is deployed.
#[derive(Debug, Clone)]
pub struct RouterDeployment {
	/// Address of the router itself; the typed-data verifying contract.
	pub address: Address,
	/// Treasury that receives input tokens and may fund the router.
	pub owner: Address,
	/// The only signer whose quotes are accepted.
	pub dealer: Address,
	pub domain_name: String,
	pub domain_version: String,
	pub chain_id: u64,
}

/// Arguments of a redemption, in call order. The payer is the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedeemArgs {
	pub token_in: Address,
	pub token_out: Address,
	pub amount_in: U256,
	pub amount_out: U256,
	pub recipient: Address,
	pub deadline: U256,
	pub signature: Bytes,
}

impl RedeemArgs {
	/// Redemption arguments for a quote as issued to `quote.payer`.
	pub fn from_quote(quote: &Quote, signature: Bytes) -> Self {
		Self {
			token_in: quote.token_in,
			token_out: quote.token_out,
			amount_in: quote.amount_in,
			amount_out: quote.amount_out,
			recipient: quote.recipient,
			deadline: quote.deadline,
			signature,
		}
	}
}

/// Emitted on every successful redemption.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwapEvent {
	pub payer: Address,
	pub recipient: Address,
	pub token_in: Address,
	pub token_out: Address,
	pub amount_in: U256,
	pub amount_out: U256,
}

#[derive(Debug)]
struct RouterState<L> {
	nonces: HashMap<Address, U256>,
	ledger: L,
}

/// In-process model of the settlement router.
#[derive(Debug)]
pub struct Router<L = Erc20Ledger> {
	address: Address,
	owner: Address,
	dealer: Address,
	domain_separator: B256,
	state: RouterState<L>,
	events: Vec<SwapEvent>,
}

impl<L: TokenLedger> Router<L> {
	/// Deploys a router on top of `ledger`. The domain separator is computed here once.
	pub fn deploy(deployment: RouterDeployment, ledger: L) -> Self {
		let domain_separator = compute_domain_separator(
			&deployment.domain_name,
			&deployment.domain_version,
			deployment.chain_id,
			&deployment.address,
		);
		tracing::debug!(
			router = %deployment.address,
			dealer = %deployment.dealer,
			domain_separator = %domain_separator,
			"Deployed router"
		);
		Self {
			address: deployment.address,
			owner: deployment.owner,
			dealer: deployment.dealer,
			domain_separator,
			state: RouterState {
				nonces: HashMap::new(),
				ledger,
			},
			events: Vec::new(),
		}
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn owner(&self) -> Address {
		self.owner
	}

	pub fn dealer(&self) -> Address {
		self.dealer
	}

	/// Fixed at deployment.
	pub fn domain_separator(&self) -> B256 {
		self.domain_separator
	}

	/// The payer's current nonce; zero for payers never seen.
	pub fn get_nonce(&self, payer: Address) -> U256 {
		self.state
			.nonces
			.get(&payer)
			.copied()
			.unwrap_or_default()
	}

	pub fn ledger(&self) -> &L {
		&self.state.ledger
	}

	/// Direct access to token balances for actions outside the router, such as
	/// minting or approvals by token holders.
	pub fn ledger_mut(&mut self) -> &mut L {
		&mut self.state.ledger
	}

	pub fn events(&self) -> &[SwapEvent] {
		&self.events
	}

	/// Redeems a dealer-signed quote on behalf of `caller` at time `now`.
	pub fn redeem(
		&mut self,
		caller: Address,
		now: u64,
		args: &RedeemArgs,
	) -> Result<SwapEvent, RouterError> {
		if U256::from(now) > args.deadline {
			return Err(RouterError::Expired {
				deadline: args.deadline,
				now,
			});
		}

		let nonce = self.get_nonce(caller);
		let quote = Quote {
			token_in: args.token_in,
			token_out: args.token_out,
			amount_in: args.amount_in,
			amount_out: args.amount_out,
			payer: caller,
			recipient: args.recipient,
			nonce,
			deadline: args.deadline,
		};
		let digest = quote_digest(&self.domain_separator, &quote);
		let recovered = recover_signer(&digest, &args.signature);
		if recovered.is_zero() || recovered != self.dealer {
			return Err(RouterError::InvalidSignature { recovered });
		}

		let previous_nonce = self.state.nonces.insert(caller, nonce + U256::from(1u64));
		self.state.ledger.begin();
		if let Err(e) = self.settle(caller, args) {
			self.state.ledger.rollback();
			match previous_nonce {
				Some(previous) => self.state.nonces.insert(caller, previous),
				None => self.state.nonces.remove(&caller),
			};
			return Err(e);
		}
		self.state.ledger.commit();

		let event = SwapEvent {
			payer: caller,
			recipient: args.recipient,
			token_in: args.token_in,
			token_out: args.token_out,
			amount_in: args.amount_in,
			amount_out: args.amount_out,
		};
		tracing::info!(
			payer = %caller,
			recipient = %args.recipient,
			amount_in = %args.amount_in,
			amount_out = %args.amount_out,
			"Swap"
		);
		self.events.push(event.clone());
		Ok(event)
	}

	/// Payer to owner, then router to recipient.
	fn settle(&mut self, caller: Address, args: &RedeemArgs) -> Result<(), RouterError> {
		self.state
			.ledger
			.transfer_from(args.token_in, self.address, caller, self.owner, args.amount_in)
			.map_err(RouterError::TransferInFailed)?;
		self.state
			.ledger
			.transfer(args.token_out, self.address, args.recipient, args.amount_out)
			.map_err(RouterError::TransferOutFailed)
	}

	/// Pulls `amount` of `token` from the owner into the router's balance.
	pub fn fund(&mut self, caller: Address, token: Address, amount: U256) -> Result<(), RouterError> {
		if caller != self.owner {
			return Err(RouterError::NotAuthorized { caller });
		}
		self.state
			.ledger
			.transfer_from(token, self.address, self.owner, self.address, amount)
			.map_err(RouterError::TransferInFailed)
	}
}
