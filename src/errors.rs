use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::decimal::Money;
use crate::types::{AssetId, LoanId, LoanStatus, OfferId, OfferStatus, TokenId};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum LendingError {
    // validation
    #[error("invalid amount: {amount}")]
    InvalidAmount { amount: Money },

    #[error("invalid installment period: {seconds} seconds")]
    InvalidPeriod { seconds: i64 },

    #[error("invalid installment count: {count}")]
    InvalidInstallmentCount { count: u32 },

    #[error("mismatched collateral arrays: {assets} assets, {amounts} amounts")]
    MismatchedCollateralArrays { assets: usize, amounts: usize },

    #[error("collateral list is empty")]
    EmptyCollateralList,

    // authorization
    #[error("caller is not the offer owner: {offer_id}")]
    NotOwner { offer_id: OfferId },

    #[error("caller does not hold claim token {token_id}")]
    NotClaimHolder { token_id: TokenId },

    #[error("caller is not on the offer whitelist: {offer_id}")]
    NotWhitelisted { offer_id: OfferId },

    // state
    #[error("offer not found: {offer_id}")]
    OfferNotFound { offer_id: OfferId },

    #[error("offer not open: {offer_id} is {status:?}")]
    OfferNotOpen {
        offer_id: OfferId,
        status: OfferStatus,
    },

    #[error("loan not found: {loan_id}")]
    LoanNotFound { loan_id: LoanId },

    #[error("loan not active: {loan_id} is {status:?}")]
    LoanNotActive {
        loan_id: LoanId,
        status: LoanStatus,
    },

    #[error("loan not past due: next installment due at {due_at}, current time {current_time}")]
    NotPastDue {
        due_at: DateTime<Utc>,
        current_time: DateTime<Utc>,
    },

    #[error("claim token already burned: {token_id}")]
    AlreadyBurned { token_id: TokenId },

    #[error("claim token not found: {token_id}")]
    TokenNotFound { token_id: TokenId },

    #[error("claim token vault not bound")]
    VaultNotBound,

    #[error("claim token vault already bound")]
    VaultAlreadyBound,

    // economic
    #[error("amount mismatch: expected {expected}, provided {provided}")]
    AmountMismatch { expected: Money, provided: Money },

    #[error("collateral asset not accepted by offer: {asset}")]
    UnacceptedCollateral { asset: AssetId },

    #[error("overpayment: outstanding debt {outstanding}, provided {provided}")]
    OverPayment {
        outstanding: Money,
        provided: Money,
    },

    #[error("nothing to claim for {loan_id}")]
    NothingToClaim { loan_id: LoanId },

    #[error("insufficient funds: available {available}, requested {requested}")]
    InsufficientFunds {
        available: Money,
        requested: Money,
    },
}

pub type Result<T> = std::result::Result<T, LendingError>;
