use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// authenticated caller identity; the sole authorization basis for owner,
/// whitelist, and claim-holder checks
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Address(Uuid);

impl Address {
    /// generate a fresh address
    pub fn generate() -> Self {
        Address(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for Address {
    fn from(id: Uuid) -> Self {
        Address(id)
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// fungible asset identity on the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AssetId(Uuid);

impl AssetId {
    pub fn generate() -> Self {
        AssetId(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl From<Uuid> for AssetId {
    fn from(id: Uuid) -> Self {
        AssetId(id)
    }
}

impl fmt::Display for AssetId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// unique identifier for an offer, monotonically assigned starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct OfferId(pub u64);

impl fmt::Display for OfferId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "offer-{}", self.0)
    }
}

/// unique identifier for a loan, monotonically assigned starting at 1
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct LoanId(pub u64);

impl fmt::Display for LoanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "loan-{}", self.0)
    }
}

/// unique identifier for a claim token
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TokenId(pub u64);

impl fmt::Display for TokenId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "token-{}", self.0)
    }
}

/// offer status; transitions Open -> Matched or Open -> Cancelled exactly once
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferStatus {
    /// awaiting a counterparty
    Open,
    /// consumed into a loan; immutable history
    Matched,
    /// withdrawn by its owner; escrow refunded
    Cancelled,
}

/// which side of the book an offer sits on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OfferKind {
    /// capital posted, collateral wanted
    Lender,
    /// collateral posted, loan wanted
    Collateral,
}

/// the offer a loan was created from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OfferRef {
    pub kind: OfferKind,
    pub id: OfferId,
}

/// loan status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LoanStatus {
    /// performing, installments outstanding
    Active,
    /// all installments paid; settlement legs may still be pending
    Repaid,
    /// installment missed past grace; collateral seized by the lender side
    Defaulted,
    /// collateral returned to the borrower side after full repayment
    CollateralClaimed,
    /// both legs settled, claim tokens burned
    DebtClaimed,
}

/// which payout a claim token entitles its holder to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimKind {
    /// repayment proceeds, or the collateral on default
    LenderClaim,
    /// collateral return on full repayment
    BorrowerClaim,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_ordered() {
        assert!(OfferId(1) < OfferId(2));
        assert!(LoanId(3) > LoanId(1));
    }

    #[test]
    fn test_address_identity() {
        let a = Address::generate();
        let b = Address::generate();
        assert_ne!(a, b);
        assert_eq!(a, Address::from(a.as_uuid()));
    }
}
