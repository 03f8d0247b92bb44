// Invariant Tests
//
// Properties that must hold whatever sequence of operations runs:
// 1. A bucket never mints past its cap or ahead of its curve
// 2. Rejected operations leave the ledger untouched
// 3. Claims split the budget in proportion to deposits and never overpay
// 4. Claiming twice pays once
// 5. Epoch budgets do not depend on the order claims arrive in

use super::{account, admin, auction_setup, governor, ledger_with, treasury};
use crate::auction::ClaimOutcome;
use crate::emission::{mul_div_floor, EmissionCurveParams};
use crate::ledger::{LedgerError, TokenLedger};
use crate::types::{Balance, DenominationId, RoleId, Timestamp, UNIT};
use proptest::prelude::*;

const CAP: Balance = 1_000_000 * UNIT;
const HORIZON: Timestamp = 10_000;

/// Linear unlock from 0 to `HORIZON`
fn linear() -> EmissionCurveParams {
    EmissionCurveParams::new(0, 0, 1, HORIZON, 0, 1).unwrap()
}

#[derive(Debug, Clone)]
enum Op {
    Advance(u64),
    Mint(Balance),
    UnauthorizedMint(Balance),
    Allocate(Balance),
    Transfer(Balance),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        (1u64..2_000).prop_map(Op::Advance),
        (1u128..200_000 * UNIT).prop_map(Op::Mint),
        (1u128..1_000 * UNIT).prop_map(Op::UnauthorizedMint),
        (0u128..2 * CAP).prop_map(Op::Allocate),
        (1u128..100_000 * UNIT).prop_map(Op::Transfer),
    ]
}

fn snapshot(ledger: &TokenLedger, bucket: RoleId) -> (Balance, Balance, Balance, Balance) {
    let b = ledger.bucket(bucket).unwrap();
    (b.cap, b.minted, ledger.total_supply(), ledger.balance_of(&admin()))
}

// =============================================================================
// INVARIANT 1 & 2: Cap, curve and atomic rejection
// =============================================================================

#[cfg(test)]
mod ledger_invariants {
    use super::*;

    proptest! {
        #[test]
        fn minted_stays_within_cap_and_curve(ops in prop::collection::vec(arb_op(), 1..40)) {
            let (mut ledger, bucket) = ledger_with("ANON_ALLOCATION", CAP, linear());
            ledger.grant_role(&governor(), bucket, admin()).unwrap();
            let mut now: Timestamp = 0;

            for op in ops {
                let before = snapshot(&ledger, bucket);
                let result = match op {
                    Op::Advance(dt) => {
                        now += dt;
                        Ok(())
                    }
                    Op::Mint(amount) => ledger.mint(&admin(), &admin(), bucket, amount, now),
                    Op::UnauthorizedMint(amount) => {
                        let r = ledger.mint(&account(3), &account(3), bucket, amount, now);
                        prop_assert!(matches!(r, Err(LedgerError::Unauthorized { .. })), "unexpected {:?}", r);
                        r
                    }
                    Op::Allocate(cap) => ledger.allocate(&governor(), bucket, DenominationId::BASE, cap),
                    Op::Transfer(amount) => ledger.transfer(&admin(), &account(1), amount, now),
                };

                if result.is_err() {
                    prop_assert_eq!(snapshot(&ledger, bucket), before);
                }

                let b = ledger.bucket(bucket).unwrap();
                prop_assert!(b.minted <= b.cap);
                prop_assert!(b.minted <= b.unlocked_at(now).max(before.1));
                prop_assert_eq!(ledger.total_supply(), b.minted);
                prop_assert_eq!(ledger.supply().total_minted(), b.minted);
            }
        }

        #[test]
        fn cap_edit_never_drops_below_minted(mint in 1u128..CAP, new_cap in 0u128..CAP) {
            let (mut ledger, bucket) = ledger_with("ANON_ALLOCATION", CAP, EmissionCurveParams::immediate(0));
            ledger.grant_role(&governor(), bucket, admin()).unwrap();
            ledger.mint(&admin(), &admin(), bucket, mint, 0).unwrap();

            let result = ledger.allocate(&governor(), bucket, DenominationId::BASE, new_cap);
            if new_cap < mint {
                prop_assert_eq!(result, Err(LedgerError::CapBelowMinted { cap: new_cap, minted: mint }));
                prop_assert_eq!(ledger.bucket(bucket).unwrap().cap, CAP);
            } else {
                prop_assert!(result.is_ok());
                prop_assert_eq!(ledger.available(bucket, 0).unwrap(), new_cap - mint);
            }
        }
    }
}

// =============================================================================
// INVARIANT 3 & 4: Proportional, bounded, idempotent claims
// =============================================================================

#[cfg(test)]
mod claim_invariants {
    use super::*;

    const WINDOW: u64 = 900;

    proptest! {
        #[test]
        fn claims_are_proportional(
            deposits in prop::collection::vec(1u128..1_000_000 * UNIT, 1..8),
            with_beneficiary in any::<bool>(),
        ) {
            let beneficiary = if with_beneficiary { Some(treasury()) } else { None };
            let (mut ledger, mut auction) = auction_setup(CAP, linear(), WINDOW, 0, beneficiary);

            for (i, amount) in deposits.iter().enumerate() {
                auction.deposit(&account(10 + i as u8), *amount, i as u64).unwrap();
            }
            let total: Balance = deposits.iter().sum();
            let budget = auction.auction_supply(&ledger, 0, WINDOW).unwrap();

            let mut paid = 0;
            for (i, amount) in deposits.iter().enumerate() {
                let who = account(10 + i as u8);
                let outcome = auction.claim(&mut ledger, &who, 0, WINDOW).unwrap();
                let expected = mul_div_floor(budget, *amount, total).unwrap();
                prop_assert_eq!(outcome, ClaimOutcome::Paid(expected));
                prop_assert_eq!(ledger.balance_of(&who), expected);
                paid += expected;
            }

            prop_assert!(paid <= budget);
            prop_assert!(budget - paid < deposits.len() as Balance);
            if deposits.len() == 1 {
                prop_assert_eq!(paid, budget);
            }

            let holding = ledger.balance_of(&auction.account());
            match beneficiary {
                Some(to) => {
                    prop_assert_eq!(holding, 0);
                    prop_assert_eq!(ledger.balance_of(&to), budget - paid);
                }
                None => prop_assert_eq!(holding, budget - paid),
            }
            prop_assert_eq!(ledger.total_supply(), budget);
        }

        #[test]
        fn claim_order_does_not_move_budgets(
            order in (1usize..6).prop_flat_map(|n| Just((0..n).collect::<Vec<usize>>()).prop_shuffle()),
        ) {
            let n = order.len();
            let (mut ledger, mut auction) = auction_setup(CAP, linear(), WINDOW, 0, None);
            for i in 0..n {
                auction.deposit(&account(10 + i as u8), UNIT, i as u64 * WINDOW).unwrap();
            }

            let now = n as u64 * WINDOW;
            for &i in &order {
                auction.claim(&mut ledger, &account(10 + i as u8), i as u64, now).unwrap();
            }

            let curve = linear();
            for i in 0..n {
                let start = curve.unlocked_at(CAP, i as u64 * WINDOW);
                let end = curve.unlocked_at(CAP, (i as u64 + 1) * WINDOW);
                prop_assert_eq!(auction.epoch(i as u64).unwrap().budget, end - start);
                prop_assert_eq!(ledger.balance_of(&account(10 + i as u8)), end - start);
            }
            prop_assert_eq!(ledger.total_supply(), curve.unlocked_at(CAP, now));
        }

        #[test]
        fn second_claim_pays_nothing(
            first in 1u128..1_000 * UNIT,
            second in 1u128..1_000 * UNIT,
            later in 0u64..10_000,
        ) {
            let (mut ledger, mut auction) = auction_setup(CAP, linear(), WINDOW, 0, Some(treasury()));
            auction.deposit(&admin(), first, 0).unwrap();
            auction.deposit(&account(1), second, 1).unwrap();

            let outcome = auction.claim(&mut ledger, &admin(), 0, WINDOW).unwrap();
            let balance = ledger.balance_of(&admin());
            let supply = ledger.total_supply();
            prop_assert_eq!(outcome, ClaimOutcome::Paid(balance));

            let again = auction.claim(&mut ledger, &admin(), 0, WINDOW + later).unwrap();
            prop_assert_eq!(again, ClaimOutcome::AlreadyClaimed(balance));
            prop_assert_eq!(ledger.balance_of(&admin()), balance);
            prop_assert_eq!(ledger.total_supply(), supply);
        }
    }
}
