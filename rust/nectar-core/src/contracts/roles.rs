// Roles - Permission registry for allocation roles
// Principle: One governing authority, explicit grants, nothing ambient
use crate::types::{AccountId, RoleId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Role membership registry
///
/// Every role, including each allocation role, is administered by the
/// governor role. The governor itself can only be granted or revoked by a
/// governor, and the last governor cannot be removed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleRegistry {
    members: BTreeMap<RoleId, BTreeSet<AccountId>>,
}

impl RoleRegistry {
    pub fn new(governor: AccountId) -> Self {
        let mut members = BTreeMap::new();
        members.insert(RoleId::governor(), BTreeSet::from([governor]));
        Self { members }
    }

    pub fn has_role(&self, actor: &AccountId, role: RoleId) -> bool {
        self.members
            .get(&role)
            .map(|set| set.contains(actor))
            .unwrap_or(false)
    }

    /// Fails with `Unauthorized` unless `actor` holds `role`
    pub fn ensure_role(&self, actor: &AccountId, role: RoleId) -> Result<(), RoleError> {
        if self.has_role(actor, role) {
            Ok(())
        } else {
            Err(RoleError::Unauthorized { actor: *actor, role })
        }
    }

    /// Role allowed to administer `role`
    pub fn admin_of(&self, _role: RoleId) -> RoleId {
        RoleId::governor()
    }

    /// Grants `role` to `account`; returns false if it was already held
    pub fn grant_role(
        &mut self,
        caller: &AccountId,
        role: RoleId,
        account: AccountId,
    ) -> Result<bool, RoleError> {
        if let Err(e) = self.ensure_role(caller, self.admin_of(role)) {
            warn!("Role grant rejected: {}", e);
            return Err(e);
        }

        let granted = self.members.entry(role).or_default().insert(account);
        if granted {
            info!("Granted {} to {}", role, account);
        }
        Ok(granted)
    }

    /// Revokes `role` from `account`; returns false if it was not held
    pub fn revoke_role(
        &mut self,
        caller: &AccountId,
        role: RoleId,
        account: &AccountId,
    ) -> Result<bool, RoleError> {
        if let Err(e) = self.ensure_role(caller, self.admin_of(role)) {
            warn!("Role revoke rejected: {}", e);
            return Err(e);
        }

        if role == RoleId::governor() && self.member_count(role) == 1 && self.has_role(account, role) {
            return Err(RoleError::LastGovernor);
        }

        let revoked = self
            .members
            .get_mut(&role)
            .map(|set| set.remove(account))
            .unwrap_or(false);
        if revoked {
            info!("Revoked {} from {}", role, account);
        }
        Ok(revoked)
    }

    pub fn members(&self, role: RoleId) -> impl Iterator<Item = &AccountId> {
        self.members.get(&role).into_iter().flatten()
    }

    pub fn member_count(&self, role: RoleId) -> usize {
        self.members.get(&role).map(|set| set.len()).unwrap_or(0)
    }
}

/// Role errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoleError {
    #[error("{actor} lacks {role}")]
    Unauthorized { actor: AccountId, role: RoleId },

    #[error("Cannot revoke the last governor")]
    LastGovernor,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(seed: u8) -> AccountId {
        AccountId::from_bytes([seed; 32])
    }

    #[test]
    fn test_governor_holds_role() {
        let registry = RoleRegistry::new(account(9));
        assert!(registry.has_role(&account(9), RoleId::governor()));
        assert!(!registry.has_role(&account(1), RoleId::governor()));
    }

    #[test]
    fn test_grant_requires_governor() {
        let mut registry = RoleRegistry::new(account(9));
        let role = RoleId::named("RESERVED_ALLOCATION");

        let result = registry.grant_role(&account(1), role, account(1));
        assert_eq!(
            result,
            Err(RoleError::Unauthorized { actor: account(1), role: RoleId::governor() })
        );

        assert_eq!(registry.grant_role(&account(9), role, account(1)), Ok(true));
        assert_eq!(registry.grant_role(&account(9), role, account(1)), Ok(false));
        assert!(registry.has_role(&account(1), role));
    }

    #[test]
    fn test_revoke() {
        let mut registry = RoleRegistry::new(account(9));
        let role = RoleId::named("ANON_ALLOCATION");
        registry.grant_role(&account(9), role, account(1)).unwrap();

        assert_eq!(registry.revoke_role(&account(9), role, &account(1)), Ok(true));
        assert!(!registry.has_role(&account(1), role));
        assert_eq!(registry.revoke_role(&account(9), role, &account(1)), Ok(false));
    }

    #[test]
    fn test_last_governor_is_kept() {
        let mut registry = RoleRegistry::new(account(9));
        let governor = RoleId::governor();

        assert_eq!(
            registry.revoke_role(&account(9), governor, &account(9)),
            Err(RoleError::LastGovernor)
        );

        registry.grant_role(&account(9), governor, account(8)).unwrap();
        assert_eq!(registry.revoke_role(&account(8), governor, &account(9)), Ok(true));
        assert_eq!(registry.member_count(governor), 1);
    }
}
