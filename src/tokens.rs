use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::errors::{LendingError, Result};
use crate::types::{Address, ClaimKind, LoanId, TokenId};

/// transferable non-fungible receipt entitling its current holder to a
/// specific payout from a specific loan
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimToken {
    pub id: TokenId,
    pub loan_id: LoanId,
    pub kind: ClaimKind,
    pub holder: Address,
    pub burned: bool,
}

/// owned-record table of claim tokens, decoupled from loan state
///
/// transfer is a pure ownership mutation; burned tokens stay in the table so
/// historical ids remain queryable
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
pub struct ClaimTokenVault {
    tokens: BTreeMap<TokenId, ClaimToken>,
    next_id: u64,
}

impl ClaimTokenVault {
    pub fn new() -> Self {
        Self {
            tokens: BTreeMap::new(),
            next_id: 1,
        }
    }

    /// mint a new claim token for a loan
    pub fn mint(&mut self, kind: ClaimKind, holder: Address, loan_id: LoanId) -> TokenId {
        let id = TokenId(self.next_id);
        self.next_id += 1;
        self.tokens.insert(
            id,
            ClaimToken {
                id,
                loan_id,
                kind,
                holder,
                burned: false,
            },
        );
        id
    }

    /// current holder of a live token
    pub fn owner_of(&self, token_id: TokenId) -> Result<Address> {
        let token = self
            .tokens
            .get(&token_id)
            .ok_or(LendingError::TokenNotFound { token_id })?;
        if token.burned {
            return Err(LendingError::AlreadyBurned { token_id });
        }
        Ok(token.holder)
    }

    /// transfer a token to a new holder; only the current holder may transfer
    pub fn transfer(&mut self, caller: Address, token_id: TokenId, new_holder: Address)
        -> Result<()> {
        let holder = self.owner_of(token_id)?;
        if holder != caller {
            return Err(LendingError::NotClaimHolder { token_id });
        }
        // owner_of guarantees presence and liveness
        if let Some(token) = self.tokens.get_mut(&token_id) {
            token.holder = new_holder;
        }
        Ok(())
    }

    /// burn a token; fails if already burned
    pub fn burn(&mut self, token_id: TokenId) -> Result<()> {
        let token = self
            .tokens
            .get_mut(&token_id)
            .ok_or(LendingError::TokenNotFound { token_id })?;
        if token.burned {
            return Err(LendingError::AlreadyBurned { token_id });
        }
        token.burned = true;
        Ok(())
    }

    /// fetch a token record, burned or live
    pub fn token(&self, token_id: TokenId) -> Option<&ClaimToken> {
        self.tokens.get(&token_id)
    }
}
