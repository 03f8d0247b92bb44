// State - Token ledger plus every auction drawing from it
use crate::auction::{Auction, AuctionError};
use crate::ledger::TokenLedger;
use crate::types::{AccountId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Everything the operator CLI reads and mutates
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NectarState {
    /// Time the state was created
    pub genesis_time: Timestamp,

    pub ledger: TokenLedger,

    /// Auctions by name
    pub auctions: BTreeMap<String, Auction>,
}

impl NectarState {
    pub fn new(governor: AccountId, genesis_time: Timestamp) -> Self {
        Self {
            genesis_time,
            ledger: TokenLedger::new(governor),
            auctions: BTreeMap::new(),
        }
    }

    pub fn auction(&self, name: &str) -> Option<&Auction> {
        self.auctions.get(name)
    }

    /// Auction plus the ledger it settles against
    pub fn auction_mut(&mut self, name: &str) -> Option<(&mut Auction, &mut TokenLedger)> {
        let ledger = &mut self.ledger;
        self.auctions.get_mut(name).map(|auction| (auction, ledger))
    }

    /// Adds an auction; fails on a duplicate name
    pub fn add_auction(&mut self, auction: Auction) -> Result<(), AuctionError> {
        if self.auctions.contains_key(auction.name()) {
            return Err(AuctionError::Duplicate(auction.name().to_string()));
        }
        self.auctions.insert(auction.name().to_string(), auction);
        Ok(())
    }
}
