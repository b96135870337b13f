pub mod config;
pub mod decimal;
pub mod errors;
pub mod events;
pub mod ledger;
pub mod loan;
pub mod offers;
pub mod protocol;
pub mod tokens;
pub mod types;

// re-export key types
pub use config::ProtocolConfig;
pub use decimal::{Money, Rate};
pub use errors::{LendingError, Result};
pub use events::{Event, EventStore};
pub use ledger::{InMemoryLedger, Ledger};
pub use loan::{Loan, LoanBook, LoanView, PaymentOutcome};
pub use offers::{
    CollateralOffer, CollateralOfferParams, CollateralRequirement, LenderOffer,
    LenderOfferParams, OfferBook,
};
pub use protocol::LendingDesk;
pub use tokens::{ClaimToken, ClaimTokenVault};
pub use types::{
    Address, AssetId, ClaimKind, LoanId, LoanStatus, OfferId, OfferKind, OfferRef, OfferStatus,
    TokenId,
};

// re-export external dependencies that users will need
pub use chrono;
pub use hourglass_rs::{SafeTimeProvider, TimeSource};
pub use rust_decimal::Decimal;
pub use uuid::Uuid;
