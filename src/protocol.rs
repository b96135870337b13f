use hourglass_rs::SafeTimeProvider;

use crate::config::ProtocolConfig;
use crate::decimal::{Money, Rate};
use crate::errors::{LendingError, Result};
use crate::events::{Event, EventStore};
use crate::ledger::Ledger;
use crate::loan::{Loan, LoanBook, LoanView};
use crate::offers::{
    CollateralOffer, CollateralOfferParams, LenderOffer, LenderOfferParams, OfferBook,
};
use crate::tokens::ClaimTokenVault;
use crate::types::{
    Address, AssetId, ClaimKind, LoanId, LoanStatus, OfferId, OfferKind, OfferRef, OfferStatus,
    TokenId,
};

/// the bilaterally agreed terms carried from a consumed offer into its loan
#[derive(Debug, Clone, Copy)]
struct LoanTerms {
    interest: Rate,
    period_secs: i64,
    installment_count: u32,
}

/// the lending desk: offer registry, matching engine, loan lifecycle, and
/// settlement resolver behind one serialized mutation surface
///
/// every mutating call validates fully before touching ledger or book state,
/// so an error return implies no state change; `&mut self` provides the
/// single-writer ordering the at-most-once guarantees rely on
pub struct LendingDesk<L: Ledger> {
    pub config: ProtocolConfig,
    pub ledger: L,
    escrow: Address,
    offers: OfferBook,
    loans: LoanBook,
    vault: Option<ClaimTokenVault>,
    pub events: EventStore,
}

impl<L: Ledger> LendingDesk<L> {
    pub fn new(config: ProtocolConfig, ledger: L) -> Self {
        Self {
            config,
            ledger,
            escrow: Address::generate(),
            offers: OfferBook::new(),
            loans: LoanBook::new(),
            vault: None,
            events: EventStore::new(),
        }
    }

    /// the account all offer escrow, collateral, and proceeds sit in
    pub fn escrow_address(&self) -> Address {
        self.escrow
    }

    /// one-time administrative linkage of the claim-token vault
    pub fn bind(&mut self, vault: ClaimTokenVault) -> Result<()> {
        if self.vault.is_some() {
            return Err(LendingError::VaultAlreadyBound);
        }
        self.vault = Some(vault);
        Ok(())
    }

    fn vault(&self) -> Result<&ClaimTokenVault> {
        self.vault.as_ref().ok_or(LendingError::VaultNotBound)
    }

    fn vault_mut(&mut self) -> Result<&mut ClaimTokenVault> {
        self.vault.as_mut().ok_or(LendingError::VaultNotBound)
    }

    // ---- offer registry ----

    /// post capital to lend; the lend amount is escrowed immediately
    pub fn create_lender_offer(
        &mut self,
        caller: Address,
        params: LenderOfferParams,
        time_provider: &SafeTimeProvider,
    ) -> Result<OfferId> {
        let accepted_collateral = params.validate()?;

        self.ledger
            .transfer(params.lend_asset, caller, self.escrow, params.lend_amount)?;

        let now = time_provider.now();
        let offer_id = self
            .offers
            .insert_lender(caller, &params, accepted_collateral, now);

        self.events.emit(Event::LenderOfferCreated {
            offer_id,
            owner: caller,
            lend_asset: params.lend_asset,
            lend_amount: params.lend_amount,
            timestamp: now,
        });

        Ok(offer_id)
    }

    /// withdraw an open lender offer and release its escrow
    pub fn cancel_lender_offer(
        &mut self,
        caller: Address,
        offer_id: OfferId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let offer = self.offers.lender_offer(offer_id)?;
        if offer.status != OfferStatus::Open {
            return Err(LendingError::OfferNotOpen {
                offer_id,
                status: offer.status,
            });
        }
        if offer.owner != caller {
            return Err(LendingError::NotOwner { offer_id });
        }
        let (asset, amount) = (offer.lend_asset, offer.lend_amount);

        self.ledger.transfer(asset, self.escrow, caller, amount)?;
        self.offers
            .close_lender_offer(offer_id, OfferStatus::Cancelled)?;

        self.events.emit(Event::OfferCancelled {
            kind: OfferKind::Lender,
            offer_id,
            refunded: amount,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    /// pledge collateral in search of a loan; the collateral is escrowed
    /// immediately
    pub fn create_collateral_offer(
        &mut self,
        caller: Address,
        params: CollateralOfferParams,
        time_provider: &SafeTimeProvider,
    ) -> Result<OfferId> {
        params.validate()?;

        self.ledger.transfer(
            params.collateral_asset,
            caller,
            self.escrow,
            params.collateral_amount,
        )?;

        let now = time_provider.now();
        let offer_id = self.offers.insert_collateral(caller, &params, now);

        self.events.emit(Event::CollateralOfferCreated {
            offer_id,
            owner: caller,
            collateral_asset: params.collateral_asset,
            collateral_amount: params.collateral_amount,
            timestamp: now,
        });

        Ok(offer_id)
    }

    /// withdraw an open collateral offer and release its escrow
    pub fn cancel_collateral_offer(
        &mut self,
        caller: Address,
        offer_id: OfferId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let offer = self.offers.collateral_offer(offer_id)?;
        if offer.status != OfferStatus::Open {
            return Err(LendingError::OfferNotOpen {
                offer_id,
                status: offer.status,
            });
        }
        if offer.owner != caller {
            return Err(LendingError::NotOwner { offer_id });
        }
        let (asset, amount) = (offer.collateral_asset, offer.collateral_amount);

        self.ledger.transfer(asset, self.escrow, caller, amount)?;
        self.offers
            .close_collateral_offer(offer_id, OfferStatus::Cancelled)?;

        self.events.emit(Event::OfferCancelled {
            kind: OfferKind::Collateral,
            offer_id,
            refunded: amount,
            timestamp: time_provider.now(),
        });
        Ok(())
    }

    // ---- matching engine ----

    /// borrower path: pledge one of the acceptable collateral assets against
    /// an open lender offer; on success the principal is disbursed to the
    /// caller and a loan is originated
    pub fn accept_lender_offer(
        &mut self,
        caller: Address,
        offer_id: OfferId,
        chosen_asset: AssetId,
        chosen_amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanId> {
        self.vault()?;

        let offer = self.offers.lender_offer(offer_id)?;
        if offer.status != OfferStatus::Open {
            return Err(LendingError::OfferNotOpen {
                offer_id,
                status: offer.status,
            });
        }
        if !offer.admits(caller) {
            return Err(LendingError::NotWhitelisted { offer_id });
        }
        let required = offer
            .required_amount(chosen_asset)
            .ok_or(LendingError::UnacceptedCollateral {
                asset: chosen_asset,
            })?;
        if chosen_amount != required {
            return Err(LendingError::AmountMismatch {
                expected: required,
                provided: chosen_amount,
            });
        }
        // the caller must actually hold the collateral before the offer is
        // consumed, so the two transfers below cannot half-complete
        let available = self.ledger.balance_of(chosen_asset, caller);
        if available < chosen_amount {
            return Err(LendingError::InsufficientFunds {
                available,
                requested: chosen_amount,
            });
        }
        let offer = offer.clone();

        // check-and-flip: the offer is consumed exactly once
        self.offers
            .close_lender_offer(offer_id, OfferStatus::Matched)?;

        self.ledger
            .transfer(chosen_asset, caller, self.escrow, chosen_amount)?;
        self.ledger
            .transfer(offer.lend_asset, self.escrow, caller, offer.lend_amount)?;

        let now = time_provider.now();
        self.originate_loan(
            OfferRef {
                kind: OfferKind::Lender,
                id: offer_id,
            },
            offer.owner,
            caller,
            offer.lend_asset,
            offer.lend_amount,
            chosen_asset,
            chosen_amount,
            LoanTerms {
                interest: offer.interest,
                period_secs: offer.period_secs,
                installment_count: offer.installment_count,
            },
            now,
        )
    }

    /// lender path: fund an open collateral offer; the collateral is already
    /// escrowed, the caller's principal is escrowed and disbursed to the
    /// borrower immediately
    pub fn accept_collateral_offer(
        &mut self,
        caller: Address,
        offer_id: OfferId,
        time_provider: &SafeTimeProvider,
    ) -> Result<LoanId> {
        self.vault()?;

        let offer = self.offers.collateral_offer(offer_id)?;
        if offer.status != OfferStatus::Open {
            return Err(LendingError::OfferNotOpen {
                offer_id,
                status: offer.status,
            });
        }
        if !offer.admits(caller) {
            return Err(LendingError::NotWhitelisted { offer_id });
        }
        let available = self.ledger.balance_of(offer.loan_asset, caller);
        if available < offer.loan_amount {
            return Err(LendingError::InsufficientFunds {
                available,
                requested: offer.loan_amount,
            });
        }
        // the escrow must still hold the collateral declared at creation
        let escrowed = self.ledger.balance_of(offer.collateral_asset, self.escrow);
        if escrowed < offer.collateral_amount {
            return Err(LendingError::AmountMismatch {
                expected: offer.collateral_amount,
                provided: escrowed,
            });
        }
        let offer = offer.clone();

        self.offers
            .close_collateral_offer(offer_id, OfferStatus::Matched)?;

        self.ledger
            .transfer(offer.loan_asset, caller, self.escrow, offer.loan_amount)?;
        self.ledger
            .transfer(offer.loan_asset, self.escrow, offer.owner, offer.loan_amount)?;

        let now = time_provider.now();
        self.originate_loan(
            OfferRef {
                kind: OfferKind::Collateral,
                id: offer_id,
            },
            caller,
            offer.owner,
            offer.loan_asset,
            offer.loan_amount,
            offer.collateral_asset,
            offer.collateral_amount,
            LoanTerms {
                interest: offer.interest,
                period_secs: offer.period_secs,
                installment_count: offer.installment_count,
            },
            now,
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn originate_loan(
        &mut self,
        origin: OfferRef,
        lender: Address,
        borrower: Address,
        principal_asset: AssetId,
        principal_amount: Money,
        collateral_asset: AssetId,
        collateral_amount: Money,
        terms: LoanTerms,
        now: chrono::DateTime<chrono::Utc>,
    ) -> Result<LoanId> {
        let loan_id = self.loans.next_id();

        let vault = self.vault_mut()?;
        let lender_token = vault.mint(ClaimKind::LenderClaim, lender, loan_id);
        let borrower_token = vault.mint(ClaimKind::BorrowerClaim, borrower, loan_id);

        let loan = Loan {
            id: loan_id,
            origin,
            lender,
            borrower,
            principal_asset,
            principal_amount,
            collateral_asset,
            collateral_amount,
            interest: terms.interest,
            period_secs: terms.period_secs,
            installment_count: terms.installment_count,
            installments_paid: 0,
            amount_repaid: Money::ZERO,
            proceeds_balance: Money::ZERO,
            created_at: now,
            status: LoanStatus::Active,
            lender_token,
            borrower_token,
            collateral_settled: false,
        };
        self.loans.insert(loan);

        self.events.emit(Event::OfferMatched {
            kind: origin.kind,
            offer_id: origin.id,
            loan_id,
            timestamp: now,
        });
        self.events.emit(Event::ClaimTokenMinted {
            token_id: lender_token,
            loan_id,
            kind: ClaimKind::LenderClaim,
            holder: lender,
        });
        self.events.emit(Event::ClaimTokenMinted {
            token_id: borrower_token,
            loan_id,
            kind: ClaimKind::BorrowerClaim,
            holder: borrower,
        });
        self.events.emit(Event::LoanOriginated {
            loan_id,
            lender,
            borrower,
            principal_asset,
            principal_amount,
            collateral_asset,
            collateral_amount,
            timestamp: now,
        });

        Ok(loan_id)
    }

    // ---- loan lifecycle ----

    /// pay toward an active loan's schedule; any payer is accepted, funds
    /// land in the loan's proceeds balance until the lender side withdraws
    pub fn pay_debt(
        &mut self,
        caller: Address,
        loan_id: LoanId,
        amount: Money,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let loan = self.loans.loan(loan_id)?;
        loan.validate_payment(amount)?;
        let asset = loan.principal_asset;

        self.ledger.transfer(asset, caller, self.escrow, amount)?;

        let loan = self.loans.loan_mut(loan_id)?;
        let outcome = loan.apply_payment(amount);
        let installments_paid = loan.installments_paid;
        let total_repaid = loan.amount_repaid;

        let now = time_provider.now();
        self.events.emit(Event::PaymentReceived {
            loan_id,
            payer: caller,
            amount,
            installments_credited: outcome.installments_credited,
            installments_paid,
            timestamp: now,
        });
        if outcome.repaid {
            self.events.emit(Event::LoanRepaid {
                loan_id,
                total_repaid,
                timestamp: now,
            });
        }
        Ok(())
    }

    // ---- claim / settlement resolver ----

    /// default path: the current lender-claim holder seizes the collateral
    /// (plus any unwithdrawn proceeds) once an installment is missed past
    /// the grace allowance
    pub fn claim_collateral_as_lender(
        &mut self,
        caller: Address,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let loan = self.loans.loan(loan_id)?;
        let lender_token = loan.lender_token;
        let borrower_token = loan.borrower_token;

        // status first: a settled loan reports LoanNotActive rather than a
        // burned-token error on repeat claims
        if loan.status != LoanStatus::Active {
            return Err(LendingError::LoanNotActive {
                loan_id,
                status: loan.status,
            });
        }
        let holder = self.vault()?.owner_of(lender_token)?;
        if holder != caller {
            return Err(LendingError::NotClaimHolder {
                token_id: lender_token,
            });
        }
        let now = time_provider.now();
        if !loan.is_past_due(now, self.config.grace_period()) {
            return Err(LendingError::NotPastDue {
                due_at: loan.next_due_at() + self.config.grace_period(),
                current_time: now,
            });
        }
        let collateral_asset = loan.collateral_asset;
        let collateral_amount = loan.collateral_amount;
        let principal_asset = loan.principal_asset;
        let swept_proceeds = loan.proceeds_balance;

        self.ledger
            .transfer(collateral_asset, self.escrow, caller, collateral_amount)?;
        if swept_proceeds.is_positive() {
            self.ledger
                .transfer(principal_asset, self.escrow, caller, swept_proceeds)?;
        }

        let vault = self.vault_mut()?;
        vault.burn(lender_token)?;
        vault.burn(borrower_token)?;

        let loan = self.loans.loan_mut(loan_id)?;
        loan.status = LoanStatus::Defaulted;
        loan.proceeds_balance = Money::ZERO;
        loan.collateral_settled = true;

        self.events.emit(Event::CollateralSeized {
            loan_id,
            claimant: caller,
            collateral_amount,
            swept_proceeds,
            timestamp: now,
        });
        self.events.emit(Event::ClaimTokenBurned {
            token_id: lender_token,
        });
        self.events.emit(Event::ClaimTokenBurned {
            token_id: borrower_token,
        });
        self.events.emit(Event::LoanFinalized {
            loan_id,
            final_status: LoanStatus::Defaulted,
            timestamp: now,
        });
        Ok(())
    }

    /// success path: the current borrower-claim holder takes the collateral
    /// back once the loan is fully repaid
    pub fn claim_collateral_as_borrower(
        &mut self,
        caller: Address,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<()> {
        let loan = self.loans.loan(loan_id)?;
        let borrower_token = loan.borrower_token;
        let lender_token = loan.lender_token;

        let holder = self.vault()?.owner_of(borrower_token)?;
        if holder != caller {
            return Err(LendingError::NotClaimHolder {
                token_id: borrower_token,
            });
        }
        if loan.status != LoanStatus::Repaid {
            return Err(LendingError::LoanNotActive {
                loan_id,
                status: loan.status,
            });
        }
        let collateral_asset = loan.collateral_asset;
        let collateral_amount = loan.collateral_amount;

        self.ledger
            .transfer(collateral_asset, self.escrow, caller, collateral_amount)?;

        let vault = self.vault_mut()?;
        vault.burn(borrower_token)?;
        let debt_leg_settled = vault
            .token(lender_token)
            .map(|t| t.burned)
            .unwrap_or(false);

        let loan = self.loans.loan_mut(loan_id)?;
        loan.collateral_settled = true;
        loan.status = if debt_leg_settled {
            LoanStatus::DebtClaimed
        } else {
            LoanStatus::CollateralClaimed
        };
        let final_status = loan.status;

        let now = time_provider.now();
        self.events.emit(Event::CollateralReturned {
            loan_id,
            claimant: caller,
            collateral_amount,
            timestamp: now,
        });
        self.events.emit(Event::ClaimTokenBurned {
            token_id: borrower_token,
        });
        if final_status == LoanStatus::DebtClaimed {
            self.events.emit(Event::LoanFinalized {
                loan_id,
                final_status,
                timestamp: now,
            });
        }
        Ok(())
    }

    /// withdraw the accumulated proceeds balance; callable by the current
    /// lender-claim holder whenever the balance is positive, incrementally
    /// while the loan is still active
    pub fn claim_debt(
        &mut self,
        caller: Address,
        loan_id: LoanId,
        time_provider: &SafeTimeProvider,
    ) -> Result<Money> {
        let loan = self.loans.loan(loan_id)?;
        let lender_token = loan.lender_token;

        let holder = self.vault()?.owner_of(lender_token)?;
        if holder != caller {
            return Err(LendingError::NotClaimHolder {
                token_id: lender_token,
            });
        }
        let proceeds = loan.proceeds_balance;
        if !proceeds.is_positive() {
            return Err(LendingError::NothingToClaim { loan_id });
        }
        let principal_asset = loan.principal_asset;
        let status = loan.status;
        let collateral_settled = loan.collateral_settled;

        self.ledger
            .transfer(principal_asset, self.escrow, caller, proceeds)?;

        let loan = self.loans.loan_mut(loan_id)?;
        loan.proceeds_balance = Money::ZERO;

        let now = time_provider.now();
        self.events.emit(Event::ProceedsWithdrawn {
            loan_id,
            claimant: caller,
            amount: proceeds,
            timestamp: now,
        });

        // the lender leg is fully settled once the schedule is complete and
        // the proceeds are drained
        if status != LoanStatus::Active {
            self.vault_mut()?.burn(lender_token)?;
            self.events.emit(Event::ClaimTokenBurned {
                token_id: lender_token,
            });
            if collateral_settled {
                let loan = self.loans.loan_mut(loan_id)?;
                loan.status = LoanStatus::DebtClaimed;
                self.events.emit(Event::LoanFinalized {
                    loan_id,
                    final_status: LoanStatus::DebtClaimed,
                    timestamp: now,
                });
            }
        }
        Ok(proceeds)
    }

    // ---- claim token surface ----

    /// transfer a claim token to a new holder; pure ownership mutation, the
    /// loan record is untouched and future payouts follow the token
    pub fn transfer_claim(
        &mut self,
        caller: Address,
        token_id: TokenId,
        new_holder: Address,
    ) -> Result<()> {
        self.vault_mut()?.transfer(caller, token_id, new_holder)?;
        self.events.emit(Event::ClaimTokenTransferred {
            token_id,
            from: caller,
            to: new_holder,
        });
        Ok(())
    }

    /// current holder of a claim token
    pub fn claim_holder(&self, token_id: TokenId) -> Result<Address> {
        self.vault()?.owner_of(token_id)
    }

    // ---- query surface ----

    pub fn lender_offer(&self, id: OfferId) -> Result<&LenderOffer> {
        self.offers.lender_offer(id)
    }

    pub fn collateral_offer(&self, id: OfferId) -> Result<&CollateralOffer> {
        self.offers.collateral_offer(id)
    }

    pub fn loan(&self, id: LoanId) -> Result<&Loan> {
        self.loans.loan(id)
    }

    /// loan with computed schedule fields at the caller-visible current time
    pub fn loan_view(&self, id: LoanId, time_provider: &SafeTimeProvider) -> Result<LoanView> {
        let loan = self.loans.loan(id)?;
        Ok(LoanView::of(
            loan,
            time_provider.now(),
            self.config.grace_period(),
        ))
    }

    pub fn offer_book(&self) -> &OfferBook {
        &self.offers
    }

    pub fn loan_book(&self) -> &LoanBook {
        &self.loans
    }

    pub fn take_events(&mut self) -> Vec<Event> {
        self.events.take_events()
    }
}
