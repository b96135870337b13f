use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::types::{Address, AssetId, LoanId, LoanStatus, OfferRef, TokenId};

/// the matched, active agreement produced by consuming exactly one offer
///
/// the sole mutable record once matching completes; repayments accumulate in
/// `proceeds_balance` until the lender-claim holder withdraws them
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Loan {
    pub id: LoanId,
    pub origin: OfferRef,
    pub lender: Address,
    pub borrower: Address,
    pub principal_asset: AssetId,
    pub principal_amount: Money,
    pub collateral_asset: AssetId,
    pub collateral_amount: Money,
    pub interest: Rate,
    pub period_secs: i64,
    pub installment_count: u32,
    pub installments_paid: u32,
    /// cumulative amount paid in, credited or not
    pub amount_repaid: Money,
    /// escrowed repayments awaiting withdrawal by the lender-claim holder
    pub proceeds_balance: Money,
    pub created_at: DateTime<Utc>,
    pub status: LoanStatus,
    pub lender_token: TokenId,
    pub borrower_token: TokenId,
    /// collateral leg settled (returned to borrower or seized by lender)
    pub collateral_settled: bool,
}

/// outcome of a credited payment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentOutcome {
    pub installments_credited: u32,
    pub repaid: bool,
}

impl Loan {
    /// installment period as a duration
    pub fn period(&self) -> Duration {
        Duration::seconds(self.period_secs)
    }

    /// amount due per installment: principal plus flat interest on the whole
    /// principal, split evenly across the schedule
    pub fn installment_due(&self) -> Money {
        let total = self.principal_amount.as_decimal()
            * (Decimal::ONE + self.interest.as_decimal());
        Money::from_decimal(total / Decimal::from(self.installment_count))
    }

    /// total debt over the life of the loan; defined as the per-installment
    /// due times the count so the schedule sums exactly
    pub fn total_debt(&self) -> Money {
        self.installment_due() * Decimal::from(self.installment_count)
    }

    /// debt not yet paid in
    pub fn outstanding_debt(&self) -> Money {
        (self.total_debt() - self.amount_repaid).max(Money::ZERO)
    }

    /// paid-in amount not yet credited as a full installment
    pub fn pending_credit(&self) -> Money {
        let credited = self.installment_due() * Decimal::from(self.installments_paid);
        (self.amount_repaid - credited).max(Money::ZERO)
    }

    /// when the next uncredited installment falls due
    pub fn next_due_at(&self) -> DateTime<Utc> {
        self.created_at + self.period() * (self.installments_paid as i32 + 1)
    }

    /// lazy default test: the borrower has missed an installment once the
    /// current time passes the next due date plus the grace allowance
    pub fn is_past_due(&self, now: DateTime<Utc>, grace: Duration) -> bool {
        self.status == LoanStatus::Active && now > self.next_due_at() + grace
    }

    /// reject payments the schedule cannot absorb; called before any funds
    /// move so a failure has no side effects
    pub fn validate_payment(&self, amount: Money) -> Result<()> {
        if self.status != LoanStatus::Active {
            return Err(LendingError::LoanNotActive {
                loan_id: self.id,
                status: self.status,
            });
        }
        if !amount.is_positive() {
            return Err(LendingError::InvalidAmount { amount });
        }
        let outstanding = self.outstanding_debt();
        if amount > outstanding {
            return Err(LendingError::OverPayment {
                outstanding,
                provided: amount,
            });
        }
        Ok(())
    }

    /// credit a validated payment against the schedule; a payment counts
    /// toward `installments_paid` once the uncredited balance reaches one
    /// full installment's due amount
    pub fn apply_payment(&mut self, amount: Money) -> PaymentOutcome {
        self.amount_repaid += amount;
        self.proceeds_balance += amount;

        let due = self.installment_due();
        let mut credited = 0;
        while self.installments_paid < self.installment_count && self.pending_credit() >= due {
            self.installments_paid += 1;
            credited += 1;
        }

        let repaid = self.installments_paid == self.installment_count;
        if repaid {
            self.status = LoanStatus::Repaid;
        }

        PaymentOutcome {
            installments_credited: credited,
            repaid,
        }
    }
}

/// projection of a loan with its computed schedule fields, for queries
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanView {
    pub loan_id: LoanId,
    pub status: LoanStatus,
    pub installments_paid: u32,
    pub installments_remaining: u32,
    pub installment_due: Money,
    /// amount still needed to credit the next installment
    pub amount_due: Money,
    pub outstanding_debt: Money,
    pub proceeds_balance: Money,
    pub next_due_at: DateTime<Utc>,
    pub past_due: bool,
}

impl LoanView {
    /// compute the view from an explicit current time
    pub fn of(loan: &Loan, now: DateTime<Utc>, grace: Duration) -> Self {
        let amount_due = if loan.status == LoanStatus::Active {
            (loan.installment_due() - loan.pending_credit()).max(Money::ZERO)
        } else {
            Money::ZERO
        };
        Self {
            loan_id: loan.id,
            status: loan.status,
            installments_paid: loan.installments_paid,
            installments_remaining: loan.installment_count - loan.installments_paid,
            installment_due: loan.installment_due(),
            amount_due,
            outstanding_debt: loan.outstanding_debt(),
            proceeds_balance: loan.proceeds_balance,
            next_due_at: loan.next_due_at(),
            past_due: loan.is_past_due(now, grace),
        }
    }
}

/// arena-style store of loans, keyed by monotonically increasing id
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct LoanBook {
    loans: BTreeMap<LoanId, Loan>,
    next_id: u64,
}

impl LoanBook {
    pub fn new() -> Self {
        Self {
            loans: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// reserve the next loan id
    pub fn next_id(&self) -> LoanId {
        LoanId(self.next_id)
    }

    /// store a freshly matched loan under its reserved id
    pub fn insert(&mut self, loan: Loan) -> LoanId {
        debug_assert_eq!(loan.id.0, self.next_id);
        let id = loan.id;
        self.next_id += 1;
        self.loans.insert(id, loan);
        id
    }

    pub fn loan(&self, id: LoanId) -> Result<&Loan> {
        self.loans
            .get(&id)
            .ok_or(LendingError::LoanNotFound { loan_id: id })
    }

    pub fn loan_mut(&mut self, id: LoanId) -> Result<&mut Loan> {
        self.loans
            .get_mut(&id)
            .ok_or(LendingError::LoanNotFound { loan_id: id })
    }
}
