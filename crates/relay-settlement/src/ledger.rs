//! Fungible token balances as the router sees them.

use crate::TransferError;
use relay_types::{Address, U256};
use std::collections::HashMap;

/// ERC-20 style operations the router depends on.
///
/// A failed transfer leaves the ledger untouched. Writes made between
/// [`TokenLedger::begin`] and [`TokenLedger::rollback`] are undone together.
pub trait TokenLedger {
	fn balance_of(&self, token: Address, holder: Address) -> U256;

	fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256;

	/// Moves `amount` of `token` from `from` to `to`.
	fn transfer(
		&mut self,
		token: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TransferError>;

	/// Moves `amount` from `from` to `to` on behalf of `spender`, consuming allowance.
	fn transfer_from(
		&mut self,
		token: Address,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TransferError>;

	/// Starts recording writes.
	fn begin(&mut self);

	/// Keeps every write since [`TokenLedger::begin`].
	fn commit(&mut self);

	/// Restores every entry written since [`TokenLedger::begin`].
	fn rollback(&mut self);
}

/// Previous value of a ledger entry, `None` when it did not exist.
#[derive(Debug, Clone)]
enum JournalEntry {
	Balance((Address, Address), Option<U256>),
	Allowance((Address, Address, Address), Option<U256>),
}

/// In-memory multi-token ledger.
#[derive(Debug, Clone, Default)]
pub struct Erc20Ledger {
	balances: HashMap<(Address, Address), U256>,
	allowances: HashMap<(Address, Address, Address), U256>,
	journal: Option<Vec<JournalEntry>>,
}

impl Erc20Ledger {
	pub fn new() -> Self {
		Self::default()
	}

	/// Credits `amount` of `token` to `to` out of thin air.
	pub fn mint(&mut self, token: Address, to: Address, amount: U256) -> Result<(), TransferError> {
		let balance = self.balance_of(token, to);
		let updated = balance
			.checked_add(amount)
			.ok_or(TransferError::Overflow { token, holder: to })?;
		self.set_balance(token, to, updated);
		Ok(())
	}

	/// Sets the allowance `owner` grants `spender`, replacing any previous value.
	pub fn approve(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
		self.set_allowance(token, owner, spender, amount);
	}

	fn set_balance(&mut self, token: Address, holder: Address, amount: U256) {
		let previous = self.balances.insert((token, holder), amount);
		if let Some(journal) = &mut self.journal {
			journal.push(JournalEntry::Balance((token, holder), previous));
		}
	}

	fn set_allowance(&mut self, token: Address, owner: Address, spender: Address, amount: U256) {
		let previous = self.allowances.insert((token, owner, spender), amount);
		if let Some(journal) = &mut self.journal {
			journal.push(JournalEntry::Allowance((token, owner, spender), previous));
		}
	}
}

impl TokenLedger for Erc20Ledger {
	fn balance_of(&self, token: Address, holder: Address) -> U256 {
		self.balances
			.get(&(token, holder))
			.copied()
			.unwrap_or_default()
	}

	fn allowance(&self, token: Address, owner: Address, spender: Address) -> U256 {
		self.allowances
			.get(&(token, owner, spender))
			.copied()
			.unwrap_or_default()
	}

	fn transfer(
		&mut self,
		token: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TransferError> {
		let available = self.balance_of(token, from);
		if available < amount {
			return Err(TransferError::InsufficientBalance {
				token,
				holder: from,
				needed: amount,
				available,
			});
		}
		if from == to {
			return Ok(());
		}
		let credited = self
			.balance_of(token, to)
			.checked_add(amount)
			.ok_or(TransferError::Overflow { token, holder: to })?;
		self.set_balance(token, from, available - amount);
		self.set_balance(token, to, credited);
		Ok(())
	}

	fn transfer_from(
		&mut self,
		token: Address,
		spender: Address,
		from: Address,
		to: Address,
		amount: U256,
	) -> Result<(), TransferError> {
		let allowance = self.allowance(token, from, spender);
		if allowance < amount {
			return Err(TransferError::InsufficientAllowance {
				token,
				owner: from,
				spender,
				needed: amount,
				available: allowance,
			});
		}
		self.transfer(token, from, to, amount)?;
		// unlimited approvals are not decremented
		if allowance != U256::MAX {
			self.set_allowance(token, from, spender, allowance - amount);
		}
		Ok(())
	}

	fn begin(&mut self) {
		self.journal = Some(Vec::new());
	}

	fn commit(&mut self) {
		self.journal = None;
	}

	fn rollback(&mut self) {
		let Some(journal) = self.journal.take() else {
			return;
		};
		for entry in journal.into_iter().rev() {
			match entry {
				JournalEntry::Balance(key, Some(amount)) => {
					self.balances.insert(key, amount);
				},
				JournalEntry::Balance(key, None) => {
					self.balances.remove(&key);
				},
				JournalEntry::Allowance(key, Some(amount)) => {
					self.allowances.insert(key, amount);
				},
				JournalEntry::Allowance(key, None) => {
					self.allowances.remove(&key);
				},
			}
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy_primitives::address;

	const TOKEN: Address = address!("cff09905f8f18b35f5a1ba6d2822d62b3d8c48be");
	const ALICE: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");
	const BOB: Address = address!("70997970c51812dc3a010c7d01b50e0d17dc79c8");

	fn funded() -> Erc20Ledger {
		let mut ledger = Erc20Ledger::new();
		ledger.mint(TOKEN, ALICE, U256::from(100u64)).unwrap();
		ledger
	}

	#[test]
	fn test_transfer_moves_balance() {
		let mut ledger = funded();
		ledger.transfer(TOKEN, ALICE, BOB, U256::from(40u64)).unwrap();
		assert_eq!(ledger.balance_of(TOKEN, ALICE), U256::from(60u64));
		assert_eq!(ledger.balance_of(TOKEN, BOB), U256::from(40u64));
	}

	#[test]
	fn test_transfer_rejects_overdraft_without_side_effects() {
		let mut ledger = funded();
		let err = ledger
			.transfer(TOKEN, ALICE, BOB, U256::from(101u64))
			.unwrap_err();
		assert!(matches!(err, TransferError::InsufficientBalance { available, .. } if available == U256::from(100u64)));
		assert_eq!(ledger.balance_of(TOKEN, ALICE), U256::from(100u64));
		assert_eq!(ledger.balance_of(TOKEN, BOB), U256::ZERO);
	}

	#[test]
	fn test_transfer_from_consumes_allowance() {
		let mut ledger = funded();
		ledger.approve(TOKEN, ALICE, BOB, U256::from(50u64));

		ledger
			.transfer_from(TOKEN, BOB, ALICE, BOB, U256::from(30u64))
			.unwrap();
		assert_eq!(ledger.allowance(TOKEN, ALICE, BOB), U256::from(20u64));

		let err = ledger
			.transfer_from(TOKEN, BOB, ALICE, BOB, U256::from(30u64))
			.unwrap_err();
		assert!(matches!(err, TransferError::InsufficientAllowance { .. }));
		assert_eq!(ledger.balance_of(TOKEN, BOB), U256::from(30u64));
	}

	#[test]
	fn test_unlimited_allowance_is_not_decremented() {
		let mut ledger = funded();
		ledger.approve(TOKEN, ALICE, BOB, U256::MAX);
		ledger
			.transfer_from(TOKEN, BOB, ALICE, BOB, U256::from(10u64))
			.unwrap();
		assert_eq!(ledger.allowance(TOKEN, ALICE, BOB), U256::MAX);
	}

	#[test]
	fn test_rollback_restores_touched_entries() {
		let mut ledger = funded();
		ledger.approve(TOKEN, ALICE, BOB, U256::from(50u64));

		ledger.begin();
		ledger
			.transfer_from(TOKEN, BOB, ALICE, BOB, U256::from(30u64))
			.unwrap();
		ledger.mint(TOKEN, BOB, U256::from(5u64)).unwrap();
		ledger.rollback();

		assert_eq!(ledger.balance_of(TOKEN, ALICE), U256::from(100u64));
		assert_eq!(ledger.balance_of(TOKEN, BOB), U256::ZERO);
		assert_eq!(ledger.allowance(TOKEN, ALICE, BOB), U256::from(50u64));
		assert!(!ledger.balances.contains_key(&(TOKEN, BOB)));
	}

	#[test]
	fn test_commit_keeps_writes() {
		let mut ledger = funded();
		ledger.begin();
		ledger.transfer(TOKEN, ALICE, BOB, U256::from(40u64)).unwrap();
		ledger.commit();
		// nothing left to undo
		ledger.rollback();

		assert_eq!(ledger.balance_of(TOKEN, ALICE), U256::from(60u64));
		assert_eq!(ledger.balance_of(TOKEN, BOB), U256::from(40u64));
	}

	#[test]
	fn test_mint_overflow() {
		let mut ledger = Erc20Ledger::new();
		ledger.mint(TOKEN, ALICE, U256::MAX).unwrap();
		assert!(matches!(
			ledger.mint(TOKEN, ALICE, U256::from(1u64)),
			Err(TransferError::Overflow { .. })
		));
	}
}
