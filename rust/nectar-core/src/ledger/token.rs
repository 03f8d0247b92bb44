// Token ledger - Roles, allocation buckets and balances behind one owner
// Principle: The only path to new supply is a curve-gated bucket mint
use super::allocation::{AllocationBucket, AllocationLedger, AllocationSource, LedgerError};
use super::supply::TokenSupply;
use crate::contracts::{BalanceLedger, BalanceObserver, Balances, RoleRegistry, VoteCheckpoints};
use crate::emission::EmissionCurveParams;
use crate::types::{AccountId, Balance, DenominationId, RoleId, Timestamp};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

/// Single owner of every piece of token state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLedger<O = VoteCheckpoints> {
    roles: RoleRegistry,
    allocations: AllocationLedger,
    balances: Balances<O>,
}

impl<O: BalanceObserver + Default> TokenLedger<O> {
    pub fn new(governor: AccountId) -> Self {
        Self {
            roles: RoleRegistry::new(governor),
            allocations: AllocationLedger::new(),
            balances: Balances::new(),
        }
    }
}

impl<O: BalanceObserver> TokenLedger<O> {
    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn allocations(&self) -> &AllocationLedger {
        &self.allocations
    }

    pub fn balances(&self) -> &Balances<O> {
        &self.balances
    }

    pub fn bucket(&self, id: RoleId) -> Option<&AllocationBucket> {
        self.allocations.bucket(id)
    }

    pub fn supply(&self) -> TokenSupply<'_> {
        TokenSupply::new(&self.allocations, self.balances.total_supply())
    }

    pub fn grant_role(&mut self, caller: &AccountId, role: RoleId, account: AccountId) -> Result<bool, LedgerError> {
        Ok(self.roles.grant_role(caller, role, account)?)
    }

    pub fn revoke_role(&mut self, caller: &AccountId, role: RoleId, account: &AccountId) -> Result<bool, LedgerError> {
        Ok(self.roles.revoke_role(caller, role, account)?)
    }

    pub fn register_bucket(
        &mut self,
        caller: &AccountId,
        name: &str,
        denomination: DenominationId,
        cap: Balance,
        curve: EmissionCurveParams,
    ) -> Result<RoleId, LedgerError> {
        self.allocations
            .register_bucket(&self.roles, caller, name, denomination, cap, curve)
    }

    pub fn set_curve(
        &mut self,
        caller: &AccountId,
        bucket: RoleId,
        params: EmissionCurveParams,
    ) -> Result<(), LedgerError> {
        self.allocations.set_curve(&self.roles, caller, bucket, params)
    }

    pub fn allocate(
        &mut self,
        caller: &AccountId,
        bucket: RoleId,
        denomination: DenominationId,
        new_cap: Balance,
    ) -> Result<(), LedgerError> {
        self.allocations
            .allocate(&self.roles, caller, bucket, denomination, new_cap)
    }

    pub fn available(&self, bucket: RoleId, now: Timestamp) -> Result<Balance, LedgerError> {
        self.allocations.available(bucket, now)
    }

    pub fn mint(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        bucket: RoleId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        self.allocations
            .mint(&self.roles, &mut self.balances, caller, to, bucket, amount, now)
    }

    pub fn balance_of(&self, account: &AccountId) -> Balance {
        self.balances.balance_of(account)
    }

    pub fn total_supply(&self) -> Balance {
        self.balances.total_supply()
    }

    pub fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        if let Err(e) = self.balances.transfer(from, to, amount, now) {
            warn!("Transfer {} -> {} of {} failed: {}", from, to, amount, e);
            return Err(e.into());
        }
        debug!("Transferred {} from {} to {}", amount, from, to);
        Ok(())
    }
}

impl TokenLedger<VoteCheckpoints> {
    /// Vote weight of `account` at `at`
    pub fn votes_at(&self, account: &AccountId, at: Timestamp) -> Balance {
        self.balances.observer().votes_at(account, at)
    }

    pub fn current_votes(&self, account: &AccountId) -> Balance {
        self.balances.observer().current_votes(account)
    }
}

impl<O: BalanceObserver> AllocationSource for TokenLedger<O> {
    fn available(&self, bucket: RoleId, now: Timestamp) -> Result<Balance, LedgerError> {
        TokenLedger::available(self, bucket, now)
    }

    fn mint(
        &mut self,
        caller: &AccountId,
        to: &AccountId,
        bucket: RoleId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        TokenLedger::mint(self, caller, to, bucket, amount, now)
    }

    fn balance_of(&self, account: &AccountId) -> Balance {
        TokenLedger::balance_of(self, account)
    }

    fn transfer(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        amount: Balance,
        now: Timestamp,
    ) -> Result<(), LedgerError> {
        TokenLedger::transfer(self, from, to, amount, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::BalanceError;
    use crate::types::UNIT;

    fn account(seed: u8) -> AccountId {
        AccountId::from_bytes([seed; 32])
    }

    fn ledger_with_bucket() -> (TokenLedger, RoleId) {
        let governor = account(9);
        let mut ledger: TokenLedger = TokenLedger::new(governor);
        let bucket = RoleId::named("ANON_ALLOCATION");
        ledger.allocate(&governor, bucket, DenominationId::BASE, 100 * UNIT).unwrap();
        ledger.grant_role(&governor, bucket, account(0)).unwrap();
        (ledger, bucket)
    }

    #[test]
    fn test_mint_then_transfer() {
        let (mut ledger, bucket) = ledger_with_bucket();
        ledger.mint(&account(0), &account(1), bucket, 10 * UNIT, 5).unwrap();
        ledger.transfer(&account(1), &account(2), 4 * UNIT, 6).unwrap();

        assert_eq!(ledger.balance_of(&account(1)), 6 * UNIT);
        assert_eq!(ledger.balance_of(&account(2)), 4 * UNIT);
        assert_eq!(ledger.total_supply(), 10 * UNIT);
        assert_eq!(ledger.supply().total_minted(), 10 * UNIT);
    }

    #[test]
    fn test_transfer_insufficient() {
        let (mut ledger, _) = ledger_with_bucket();
        let result = ledger.transfer(&account(1), &account(2), 1, 1);
        assert_eq!(
            result,
            Err(LedgerError::Balance(BalanceError::InsufficientBalance { requested: 1, available: 0 }))
        );
    }

    #[test]
    fn test_votes_follow_balances() {
        let (mut ledger, bucket) = ledger_with_bucket();
        ledger.mint(&account(0), &account(1), bucket, 10 * UNIT, 100).unwrap();
        ledger.transfer(&account(1), &account(2), 10 * UNIT, 200).unwrap();

        assert_eq!(ledger.votes_at(&account(1), 150), 10 * UNIT);
        assert_eq!(ledger.votes_at(&account(1), 200), 0);
        assert_eq!(ledger.current_votes(&account(2)), 10 * UNIT);
    }

    #[test]
    fn test_revoked_minter_cannot_mint() {
        let (mut ledger, bucket) = ledger_with_bucket();
        let governor = account(9);
        ledger.revoke_role(&governor, bucket, &account(0)).unwrap();

        let result = ledger.mint(&account(0), &account(0), bucket, 1, 0);
        assert_eq!(result, Err(LedgerError::Unauthorized { actor: account(0), role: bucket }));
    }

    #[test]
    fn test_last_governor_error_maps() {
        let (mut ledger, _) = ledger_with_bucket();
        let governor = account(9);
        let result = ledger.revoke_role(&governor, RoleId::governor(), &governor);
        assert_eq!(result, Err(LedgerError::LastGovernor));
    }
}
