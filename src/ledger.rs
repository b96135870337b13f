use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::errors::{LendingError, Result};
use crate::types::{Address, AssetId};

/// fungible asset transfer primitive the engine settles against
///
/// the engine pre-validates every operation and orders its ledger calls so
/// that a returned error leaves no partial state; implementations must apply
/// each transfer atomically
pub trait Ledger {
    /// move `amount` of `asset` from one account to another
    fn transfer(&mut self, asset: AssetId, from: Address, to: Address, amount: Money)
        -> Result<()>;

    /// current balance of an account
    fn balance_of(&self, asset: AssetId, owner: Address) -> Money;
}

/// reference ledger holding balances in memory, per asset then per account
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct InMemoryLedger {
    accounts: BTreeMap<AssetId, BTreeMap<Address, Money>>,
}

impl InMemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// faucet for tests and demos: credit an account out of thin air
    pub fn credit(&mut self, asset: AssetId, owner: Address, amount: Money) {
        *self
            .accounts
            .entry(asset)
            .or_default()
            .entry(owner)
            .or_insert(Money::ZERO) += amount;
    }
}

impl Ledger for InMemoryLedger {
    fn transfer(
        &mut self,
        asset: AssetId,
        from: Address,
        to: Address,
        amount: Money,
    ) -> Result<()> {
        if amount.is_negative() {
            return Err(LendingError::InvalidAmount { amount });
        }

        let available = self.balance_of(asset, from);
        if available < amount {
            return Err(LendingError::InsufficientFunds {
                available,
                requested: amount,
            });
        }

        let holders = self.accounts.entry(asset).or_default();
        *holders.entry(from).or_insert(Money::ZERO) -= amount;
        *holders.entry(to).or_insert(Money::ZERO) += amount;
        Ok(())
    }

    fn balance_of(&self, asset: AssetId, owner: Address) -> Money {
        self.accounts
            .get(&asset)
            .and_then(|holders| holders.get(&owner))
            .copied()
            .unwrap_or(Money::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transfer_moves_balance() {
        let mut ledger = InMemoryLedger::new();
        let asset = AssetId::generate();
        let alice = Address::generate();
        let bob = Address::generate();

        ledger.credit(asset, alice, Money::from_major(100));
        ledger
            .transfer(asset, alice, bob, Money::from_major(40))
            .unwrap();

        assert_eq!(ledger.balance_of(asset, alice), Money::from_major(60));
        assert_eq!(ledger.balance_of(asset, bob), Money::from_major(40));
    }

    #[test]
    fn test_transfer_insufficient_funds() {
        let mut ledger = InMemoryLedger::new();
        let asset = AssetId::generate();
        let alice = Address::generate();
        let bob = Address::generate();

        ledger.credit(asset, alice, Money::from_major(10));
        let err = ledger
            .transfer(asset, alice, bob, Money::from_major(25))
            .unwrap_err();

        assert_eq!(
            err,
            LendingError::InsufficientFunds {
                available: Money::from_major(10),
                requested: Money::from_major(25),
            }
        );
        // nothing moved
        assert_eq!(ledger.balance_of(asset, alice), Money::from_major(10));
        assert_eq!(ledger.balance_of(asset, bob), Money::ZERO);
    }

    #[test]
    fn test_balances_are_per_asset() {
        let mut ledger = InMemoryLedger::new();
        let usd = AssetId::generate();
        let btc = AssetId::generate();
        let alice = Address::generate();

        ledger.credit(usd, alice, Money::from_major(100));
        assert_eq!(ledger.balance_of(btc, alice), Money::ZERO);
    }
}
