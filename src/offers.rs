use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::types::{Address, AssetId, OfferId, OfferStatus};

/// one acceptable collateral asset and the amount required of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CollateralRequirement {
    pub asset: AssetId,
    pub amount: Money,
}

/// capital posted by a lender, waiting for a borrower to pledge collateral
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LenderOffer {
    pub id: OfferId,
    pub owner: Address,
    pub lend_asset: AssetId,
    pub lend_amount: Money,
    /// acceptable collateral assets, paired with per-asset required amounts
    pub accepted_collateral: Vec<CollateralRequirement>,
    pub interest: Rate,
    pub period_secs: i64,
    pub installment_count: u32,
    /// empty = open to all borrowers
    pub whitelist: Vec<Address>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

impl LenderOffer {
    /// whitelist check; an empty whitelist admits everyone
    pub fn admits(&self, caller: Address) -> bool {
        self.whitelist.is_empty() || self.whitelist.contains(&caller)
    }

    /// required amount for a chosen collateral asset, if accepted
    pub fn required_amount(&self, asset: AssetId) -> Option<Money> {
        self.accepted_collateral
            .iter()
            .find(|req| req.asset == asset)
            .map(|req| req.amount)
    }
}

/// collateral pledged by a borrower, waiting for a lender to fund it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollateralOffer {
    pub id: OfferId,
    pub owner: Address,
    pub collateral_asset: AssetId,
    pub collateral_amount: Money,
    pub loan_asset: AssetId,
    pub loan_amount: Money,
    pub interest: Rate,
    pub period_secs: i64,
    pub installment_count: u32,
    /// empty = open to all lenders
    pub whitelist: Vec<Address>,
    pub status: OfferStatus,
    pub created_at: DateTime<Utc>,
}

impl CollateralOffer {
    pub fn admits(&self, caller: Address) -> bool {
        self.whitelist.is_empty() || self.whitelist.contains(&caller)
    }
}

/// parameters for creating a lender offer
#[derive(Debug, Clone)]
pub struct LenderOfferParams {
    pub lend_asset: AssetId,
    pub lend_amount: Money,
    pub collateral_assets: Vec<AssetId>,
    pub collateral_amounts: Vec<Money>,
    pub interest: Rate,
    pub period_secs: i64,
    pub installment_count: u32,
    pub whitelist: Vec<Address>,
}

impl LenderOfferParams {
    /// validate at the registry boundary and pair assets with amounts by index
    pub fn validate(&self) -> Result<Vec<CollateralRequirement>> {
        validate_terms(self.lend_amount, self.period_secs, self.installment_count)?;

        if self.collateral_assets.len() != self.collateral_amounts.len() {
            return Err(LendingError::MismatchedCollateralArrays {
                assets: self.collateral_assets.len(),
                amounts: self.collateral_amounts.len(),
            });
        }
        if self.collateral_assets.is_empty() {
            return Err(LendingError::EmptyCollateralList);
        }
        for &amount in &self.collateral_amounts {
            if !amount.is_positive() {
                return Err(LendingError::InvalidAmount { amount });
            }
        }

        Ok(self
            .collateral_assets
            .iter()
            .zip(&self.collateral_amounts)
            .map(|(&asset, &amount)| CollateralRequirement { asset, amount })
            .collect())
    }
}

/// parameters for creating a collateral offer
#[derive(Debug, Clone)]
pub struct CollateralOfferParams {
    pub collateral_asset: AssetId,
    pub collateral_amount: Money,
    pub loan_asset: AssetId,
    pub loan_amount: Money,
    pub interest: Rate,
    pub period_secs: i64,
    pub installment_count: u32,
    pub whitelist: Vec<Address>,
}

impl CollateralOfferParams {
    pub fn validate(&self) -> Result<()> {
        validate_terms(self.loan_amount, self.period_secs, self.installment_count)?;
        if !self.collateral_amount.is_positive() {
            return Err(LendingError::InvalidAmount {
                amount: self.collateral_amount,
            });
        }
        Ok(())
    }
}

fn validate_terms(amount: Money, period_secs: i64, installment_count: u32) -> Result<()> {
    if !amount.is_positive() {
        return Err(LendingError::InvalidAmount { amount });
    }
    if period_secs <= 0 {
        return Err(LendingError::InvalidPeriod {
            seconds: period_secs,
        });
    }
    if installment_count == 0 {
        return Err(LendingError::InvalidInstallmentCount {
            count: installment_count,
        });
    }
    Ok(())
}

/// arena-style store of both offer sides, keyed by monotonically increasing
/// ids; offers are never removed so history stays queryable
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct OfferBook {
    lender_offers: BTreeMap<OfferId, LenderOffer>,
    collateral_offers: BTreeMap<OfferId, CollateralOffer>,
    next_lender_id: u64,
    next_collateral_id: u64,
}

impl OfferBook {
    pub fn new() -> Self {
        Self {
            lender_offers: BTreeMap::new(),
            collateral_offers: BTreeMap::new(),
            next_lender_id: 1,
            next_collateral_id: 1,
        }
    }

    /// store a validated lender offer as Open
    pub fn insert_lender(
        &mut self,
        owner: Address,
        params: &LenderOfferParams,
        accepted_collateral: Vec<CollateralRequirement>,
        now: DateTime<Utc>,
    ) -> OfferId {
        let id = OfferId(self.next_lender_id);
        self.next_lender_id += 1;
        self.lender_offers.insert(
            id,
            LenderOffer {
                id,
                owner,
                lend_asset: params.lend_asset,
                lend_amount: params.lend_amount,
                accepted_collateral,
                interest: params.interest,
                period_secs: params.period_secs,
                installment_count: params.installment_count,
                whitelist: params.whitelist.clone(),
                status: OfferStatus::Open,
                created_at: now,
            },
        );
        id
    }

    /// store a validated collateral offer as Open
    pub fn insert_collateral(
        &mut self,
        owner: Address,
        params: &CollateralOfferParams,
        now: DateTime<Utc>,
    ) -> OfferId {
        let id = OfferId(self.next_collateral_id);
        self.next_collateral_id += 1;
        self.collateral_offers.insert(
            id,
            CollateralOffer {
                id,
                owner,
                collateral_asset: params.collateral_asset,
                collateral_amount: params.collateral_amount,
                loan_asset: params.loan_asset,
                loan_amount: params.loan_amount,
                interest: params.interest,
                period_secs: params.period_secs,
                installment_count: params.installment_count,
                whitelist: params.whitelist.clone(),
                status: OfferStatus::Open,
                created_at: now,
            },
        );
        id
    }

    pub fn lender_offer(&self, id: OfferId) -> Result<&LenderOffer> {
        self.lender_offers
            .get(&id)
            .ok_or(LendingError::OfferNotFound { offer_id: id })
    }

    pub fn collateral_offer(&self, id: OfferId) -> Result<&CollateralOffer> {
        self.collateral_offers
            .get(&id)
            .ok_or(LendingError::OfferNotFound { offer_id: id })
    }

    /// atomically flip an open lender offer to a terminal status; the single
    /// check-and-flip that enforces at-most-once consumption
    pub fn close_lender_offer(&mut self, id: OfferId, status: OfferStatus) -> Result<()> {
        let offer = self
            .lender_offers
            .get_mut(&id)
            .ok_or(LendingError::OfferNotFound { offer_id: id })?;
        if offer.status != OfferStatus::Open {
            return Err(LendingError::OfferNotOpen {
                offer_id: id,
                status: offer.status,
            });
        }
        offer.status = status;
        Ok(())
    }

    pub fn close_collateral_offer(&mut self, id: OfferId, status: OfferStatus) -> Result<()> {
        let offer = self
            .collateral_offers
            .get_mut(&id)
            .ok_or(LendingError::OfferNotFound { offer_id: id })?;
        if offer.status != OfferStatus::Open {
            return Err(LendingError::OfferNotOpen {
                offer_id: id,
                status: offer.status,
            });
        }
        offer.status = status;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lender_params() -> LenderOfferParams {
        LenderOfferParams {
            lend_asset: AssetId::generate(),
            lend_amount: Money::from_major(1000),
            collateral_assets: vec![AssetId::generate()],
            collateral_amounts: vec![Money::from_major(100)],
            interest: Rate::from_percentage(10),
            period_secs: 86_400,
            installment_count: 10,
            whitelist: Vec::new(),
        }
    }

    #[test]
    fn test_validate_pairs_by_index() {
        let asset_a = AssetId::generate();
        let asset_b = AssetId::generate();
        let params = LenderOfferParams {
            collateral_assets: vec![asset_a, asset_b],
            collateral_amounts: vec![Money::from_major(100), Money::from_major(250)],
            ..lender_params()
        };

        let reqs = params.validate().unwrap();
        assert_eq!(reqs.len(), 2);
        assert_eq!(reqs[0].asset, asset_a);
        assert_eq!(reqs[0].amount, Money::from_major(100));
        assert_eq!(reqs[1].asset, asset_b);
        assert_eq!(reqs[1].amount, Money::from_major(250));
    }

    #[test]
    fn test_validate_rejects_mismatched_arrays() {
        let params = LenderOfferParams {
            collateral_assets: vec![AssetId::generate(), AssetId::generate()],
            collateral_amounts: vec![Money::from_major(100)],
            ..lender_params()
        };
        assert_eq!(
            params.validate().unwrap_err(),
            LendingError::MismatchedCollateralArrays {
                assets: 2,
                amounts: 1
            }
        );
    }

    #[test]
    fn test_validate_rejects_empty_collateral() {
        let params = LenderOfferParams {
            collateral_assets: Vec::new(),
            collateral_amounts: Vec::new(),
            ..lender_params()
        };
        assert_eq!(
            params.validate().unwrap_err(),
            LendingError::EmptyCollateralList
        );
    }

    #[test]
    fn test_validate_rejects_bad_terms() {
        let zero_amount = LenderOfferParams {
            lend_amount: Money::ZERO,
            ..lender_params()
        };
        assert!(matches!(
            zero_amount.validate().unwrap_err(),
            LendingError::InvalidAmount { .. }
        ));

        let zero_period = LenderOfferParams {
            period_secs: 0,
            ..lender_params()
        };
        assert!(matches!(
            zero_period.validate().unwrap_err(),
            LendingError::InvalidPeriod { .. }
        ));

        let zero_count = LenderOfferParams {
            installment_count: 0,
            ..lender_params()
        };
        assert!(matches!(
            zero_count.validate().unwrap_err(),
            LendingError::InvalidInstallmentCount { .. }
        ));
    }

    #[test]
    fn test_ids_assigned_from_one_per_side() {
        let mut book = OfferBook::new();
        let owner = Address::generate();
        let now = Utc::now();

        let params = lender_params();
        let reqs = params.validate().unwrap();
        let lender_id = book.insert_lender(owner, &params, reqs, now);
        assert_eq!(lender_id, OfferId(1));

        let cparams = CollateralOfferParams {
            collateral_asset: AssetId::generate(),
            collateral_amount: Money::from_major(100),
            loan_asset: AssetId::generate(),
            loan_amount: Money::from_major(1000),
            interest: Rate::from_percentage(10),
            period_secs: 86_400,
            installment_count: 10,
            whitelist: Vec::new(),
        };
        cparams.validate().unwrap();
        let collateral_id = book.insert_collateral(owner, &cparams, now);
        assert_eq!(collateral_id, OfferId(1));
    }

    #[test]
    fn test_close_is_at_most_once() {
        let mut book = OfferBook::new();
        let owner = Address::generate();
        let now = Utc::now();

        let params = lender_params();
        let reqs = params.validate().unwrap();
        let id = book.insert_lender(owner, &params, reqs, now);

        book.close_lender_offer(id, OfferStatus::Matched).unwrap();
        let err = book
            .close_lender_offer(id, OfferStatus::Cancelled)
            .unwrap_err();
        assert_eq!(
            err,
            LendingError::OfferNotOpen {
                offer_id: id,
                status: OfferStatus::Matched
            }
        );
        // first flip stands
        assert_eq!(book.lender_offer(id).unwrap().status, OfferStatus::Matched);
    }

    #[test]
    fn test_whitelist_admission() {
        let mut params = lender_params();
        let listed = Address::generate();
        let stranger = Address::generate();

        let reqs = params.validate().unwrap();
        let mut book = OfferBook::new();
        let open_id = book.insert_lender(Address::generate(), &params, reqs.clone(), Utc::now());
        assert!(book.lender_offer(open_id).unwrap().admits(stranger));

        params.whitelist = vec![listed];
        let gated_id = book.insert_lender(Address::generate(), &params, reqs, Utc::now());
        let gated = book.lender_offer(gated_id).unwrap();
        assert!(gated.admits(listed));
        assert!(!gated.admits(stranger));

        // the collateral side gates its lenders the same way
        let cparams = CollateralOfferParams {
            collateral_asset: AssetId::generate(),
            collateral_amount: Money::from_major(100),
            loan_asset: AssetId::generate(),
            loan_amount: Money::from_major(1000),
            interest: Rate::from_percentage(10),
            period_secs: 86_400,
            installment_count: 10,
            whitelist: vec![listed],
        };
        let gated_id = book.insert_collateral(Address::generate(), &cparams, Utc::now());
        let gated = book.collateral_offer(gated_id).unwrap();
        assert!(gated.admits(listed));
        assert!(!gated.admits(stranger));
    }
}
