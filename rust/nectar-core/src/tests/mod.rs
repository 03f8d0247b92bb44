// Tests module
// Scenarios: end-to-end flows through ledger, curves and auction
// Invariants: cap, availability and claim properties under random operation sequences

pub mod invariants;

use crate::auction::Auction;
use crate::emission::EmissionCurveParams;
use crate::ledger::TokenLedger;
use crate::types::{AccountId, Balance, DenominationId, RoleId, Timestamp};

pub(crate) fn account(seed: u8) -> AccountId {
    AccountId::from_bytes([seed; 32])
}

pub(crate) fn admin() -> AccountId {
    account(0)
}

pub(crate) fn governor() -> AccountId {
    account(9)
}

pub(crate) fn treasury() -> AccountId {
    account(8)
}

/// Ledger with one registered bucket, not yet granted to anyone
pub(crate) fn ledger_with(name: &str, cap: Balance, curve: EmissionCurveParams) -> (TokenLedger, RoleId) {
    let mut ledger: TokenLedger = TokenLedger::new(governor());
    let bucket = ledger
        .register_bucket(&governor(), name, DenominationId::BASE, cap, curve)
        .expect("register bucket");
    (ledger, bucket)
}

/// Ledger plus an auction allowed to mint from `bucket`
pub(crate) fn auction_setup(
    cap: Balance,
    curve: EmissionCurveParams,
    window: u64,
    start: Timestamp,
    beneficiary: Option<AccountId>,
) -> (TokenLedger, Auction) {
    let (mut ledger, bucket) = ledger_with("AUCTION22_ALLOCATION", cap, curve);
    let auction = Auction::new("auction", bucket, window, start, beneficiary).expect("auction");
    ledger
        .grant_role(&governor(), bucket, auction.account())
        .expect("grant auction role");
    (ledger, auction)
}
