use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::decimal::Money;
use crate::types::{
    Address, AssetId, ClaimKind, LoanId, LoanStatus, OfferId, OfferKind, TokenId,
};

/// all events emitted by the lending desk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Event {
    // offer events
    LenderOfferCreated {
        offer_id: OfferId,
        owner: Address,
        lend_asset: AssetId,
        lend_amount: Money,
        timestamp: DateTime<Utc>,
    },
    CollateralOfferCreated {
        offer_id: OfferId,
        owner: Address,
        collateral_asset: AssetId,
        collateral_amount: Money,
        timestamp: DateTime<Utc>,
    },
    OfferCancelled {
        kind: OfferKind,
        offer_id: OfferId,
        refunded: Money,
        timestamp: DateTime<Utc>,
    },
    OfferMatched {
        kind: OfferKind,
        offer_id: OfferId,
        loan_id: LoanId,
        timestamp: DateTime<Utc>,
    },

    // loan lifecycle events
    LoanOriginated {
        loan_id: LoanId,
        lender: Address,
        borrower: Address,
        principal_asset: AssetId,
        principal_amount: Money,
        collateral_asset: AssetId,
        collateral_amount: Money,
        timestamp: DateTime<Utc>,
    },
    PaymentReceived {
        loan_id: LoanId,
        payer: Address,
        amount: Money,
        installments_credited: u32,
        installments_paid: u32,
        timestamp: DateTime<Utc>,
    },
    LoanRepaid {
        loan_id: LoanId,
        total_repaid: Money,
        timestamp: DateTime<Utc>,
    },

    // settlement events
    CollateralSeized {
        loan_id: LoanId,
        claimant: Address,
        collateral_amount: Money,
        swept_proceeds: Money,
        timestamp: DateTime<Utc>,
    },
    CollateralReturned {
        loan_id: LoanId,
        claimant: Address,
        collateral_amount: Money,
        timestamp: DateTime<Utc>,
    },
    ProceedsWithdrawn {
        loan_id: LoanId,
        claimant: Address,
        amount: Money,
        timestamp: DateTime<Utc>,
    },
    LoanFinalized {
        loan_id: LoanId,
        final_status: LoanStatus,
        timestamp: DateTime<Utc>,
    },

    // claim token events
    ClaimTokenMinted {
        token_id: TokenId,
        loan_id: LoanId,
        kind: ClaimKind,
        holder: Address,
    },
    ClaimTokenTransferred {
        token_id: TokenId,
        from: Address,
        to: Address,
    },
    ClaimTokenBurned {
        token_id: TokenId,
    },
}

/// event store for collecting events during operations
#[derive(Debug, Default)]
pub struct EventStore {
    events: Vec<Event>,
}

impl EventStore {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn emit(&mut self, event: Event) {
        self.events.push(event);
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}
