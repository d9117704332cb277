use pretty_assertions::assert_eq;
use soroban_sdk::{
    testutils::{Address as _, Events},
    vec, Address, IntoVal, Symbol,
};
use synthex::{accumulator::ScaledFactor, utils::assert_approx_amount};

use super::setup::{multiplier, LedgerTest, ONE, PRECISE};
use crate::{
    error::ContractError,
    events::{DebtEvent, LastCloseAtLog, PushDebtLog, UpdateUserDebtLog},
    replay::{replay, DebtLedgerState},
    storage::DebtData,
};

fn factor(value: u128, scale: i32, epoch: u32) -> ScaledFactor {
    ScaledFactor {
        value,
        scale,
        epoch,
    }
}

#[test]
fn push_debt_chains_factors() {
    let test = LedgerTest::new();

    test.at(100);
    // the first epoch always starts at one
    test.push(PRECISE / 4);
    test.at(200);
    test.push(PRECISE / 2);
    test.push(3 * PRECISE);

    assert_eq!(test.ledger.query_debt_current_index(), 3);
    assert_eq!(test.ledger.query_debt_factor(&0), Some(ScaledFactor::one(0)));
    assert_eq!(test.ledger.query_debt_factor(&1), Some(factor(PRECISE / 2, 0, 0)));
    assert_eq!(
        test.ledger.query_debt_factor(&2),
        Some(factor(3 * PRECISE / 2, 0, 0))
    );
    assert_eq!(test.ledger.query_debt_factor(&3), None);
    assert_eq!(
        test.ledger.query_last_system_debt_factor(),
        factor(3 * PRECISE / 2, 0, 0)
    );

    assert_eq!(
        test.ledger.query_debt_log(&0, &2),
        vec![
            &test.env,
            DebtEvent::PushDebt(PushDebtLog {
                index: 0,
                factor: multiplier(&test.env, PRECISE / 4),
                debt_factor: ScaledFactor::one(0),
                timestamp: 100,
            }),
            DebtEvent::PushDebt(PushDebtLog {
                index: 1,
                factor: multiplier(&test.env, PRECISE / 2),
                debt_factor: factor(PRECISE / 2, 0, 0),
                timestamp: 200,
            }),
        ]
    );
}

#[test]
fn zero_factor_restarts_next_epoch() {
    let test = LedgerTest::new();

    test.push(PRECISE);
    test.push(0);
    assert_eq!(
        test.ledger.query_last_system_debt_factor(),
        ScaledFactor::zero(0)
    );

    test.push(PRECISE / 3);
    assert_eq!(
        test.ledger.query_last_system_debt_factor(),
        ScaledFactor::one(1)
    );
}

#[test]
fn snapshots_from_a_closed_epoch_carry_no_share() {
    let test = LedgerTest::new();
    let alice = Address::generate(&test.env);

    test.push(PRECISE);
    test.ledger.update_user_debt(&test.protocol, &alice, &(ONE / 2));
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), ONE / 2);

    test.push(0);
    test.push(PRECISE);
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), 0);
    assert_eq!(test.ledger.query_user_debt_balance(&alice, &(100 * ONE)), 0);
}

#[test]
fn update_user_debt_snapshots_last_factor() {
    let test = LedgerTest::new();
    let user = Address::generate(&test.env);

    test.push(PRECISE);
    test.push(PRECISE / 2);

    test.at(1_000);
    test.ledger.update_user_debt(&test.protocol, &user, &(ONE / 5));

    let expected = DebtData {
        debt_proportion: ONE / 5,
        debt_factor: factor(PRECISE / 2, 0, 0),
        timestamp: 1_000,
    };
    assert_eq!(test.ledger.query_user_debt_state(&user), expected);
    assert_eq!(
        test.ledger.query_debt_log(&2, &1),
        vec![
            &test.env,
            DebtEvent::UpdateUserDebt(UpdateUserDebtLog {
                user: user.clone(),
                debt_proportion: ONE / 5,
                debt_factor: factor(PRECISE / 2, 0, 0),
                timestamp: 1_000,
            })
        ]
    );

    // the share follows later epochs
    test.push(PRECISE / 2);
    assert_eq!(test.ledger.query_user_debt_proportion(&user), ONE / 10);
}

#[test]
fn update_debt_pushes_then_snapshots() {
    let test = LedgerTest::new();
    let user = Address::generate(&test.env);

    test.push(PRECISE);
    test.ledger.update_debt(
        &test.protocol,
        &user,
        &(ONE / 2),
        &multiplier(&test.env, PRECISE / 4),
    );

    assert_eq!(test.ledger.query_debt_current_index(), 2);
    assert_eq!(
        test.ledger.query_user_debt_state(&user).debt_factor,
        factor(PRECISE / 4, 0, 0)
    );
    assert_eq!(test.ledger.query_debt_log_len(), 3);
}

#[test]
fn build_and_burn_track_shares() {
    let test = LedgerTest::new();
    let alice = Address::generate(&test.env);
    let bob = Address::generate(&test.env);

    let alice_data = test
        .ledger
        .build_debt(&test.protocol, &alice, &(100 * ONE), &0);
    assert_eq!(alice_data.debt_proportion, ONE);
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), ONE);

    // bob doubles the system debt, halving alice's share
    test.ledger
        .build_debt(&test.protocol, &bob, &(100 * ONE), &(100 * ONE));
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), ONE / 2);
    assert_eq!(test.ledger.query_user_debt_proportion(&bob), ONE / 2);
    assert_eq!(
        test.ledger.query_user_debt_balance(&alice, &(200 * ONE)),
        100 * ONE
    );

    // burning more than owed only burns the balance
    let burnt = test
        .ledger
        .burn_debt(&test.protocol, &alice, &(150 * ONE), &(200 * ONE));
    assert_eq!(burnt, 100 * ONE);
    assert_eq!(test.ledger.query_debt_factor(&2), Some(ScaledFactor::one(0)));
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), 0);
    assert_eq!(test.ledger.query_user_debt_proportion(&bob), ONE);
    assert_eq!(
        test.ledger.query_user_debt_balance(&bob, &(100 * ONE)),
        100 * ONE
    );

    assert_eq!(
        test.ledger
            .try_burn_debt(&test.protocol, &alice, &ONE, &(100 * ONE)),
        Err(Ok(ContractError::NoDebtToBurn))
    );
    assert_eq!(
        test.ledger
            .try_build_debt(&test.protocol, &alice, &0, &(100 * ONE)),
        Err(Ok(ContractError::InvalidAmount))
    );
    assert_eq!(
        test.ledger
            .try_burn_debt(&test.protocol, &bob, &0, &(100 * ONE)),
        Err(Ok(ContractError::InvalidAmount))
    );
}

#[test]
fn burning_all_debt_resets_factor() {
    let test = LedgerTest::new();
    let alice = Address::generate(&test.env);
    let bob = Address::generate(&test.env);

    test.ledger
        .build_debt(&test.protocol, &alice, &(100 * ONE), &0);
    test.ledger
        .burn_debt(&test.protocol, &alice, &(100 * ONE), &(100 * ONE));
    assert_eq!(test.ledger.query_debt_factor(&1), Some(ScaledFactor::zero(0)));
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), 0);

    let bob_data = test.ledger.build_debt(&test.protocol, &bob, &(50 * ONE), &0);
    assert_eq!(test.ledger.query_debt_factor(&2), Some(ScaledFactor::one(1)));
    assert_eq!(bob_data.debt_factor, ScaledFactor::one(1));
    assert_eq!(test.ledger.query_user_debt_proportion(&bob), ONE);
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), 0);
}

#[test]
fn build_into_empty_system_opens_new_epoch() {
    let test = LedgerTest::new();
    let alice = Address::generate(&test.env);

    test.push(PRECISE);
    let data = test
        .ledger
        .build_debt(&test.protocol, &alice, &(10 * ONE), &0);

    assert_eq!(test.ledger.query_debt_factor(&1), Some(ScaledFactor::zero(0)));
    assert_eq!(test.ledger.query_debt_factor(&2), Some(ScaledFactor::one(1)));
    assert_eq!(data.debt_factor, ScaledFactor::one(1));
    assert_eq!(test.ledger.query_user_debt_proportion(&alice), ONE);
    assert_eq!(
        test.ledger.query_user_debt_balance(&alice, &(10 * ONE)),
        10 * ONE
    );
}

#[test]
fn large_growth_keeps_factor_precise() {
    let test = LedgerTest::new();
    let alice = Address::generate(&test.env);
    let bob = Address::generate(&test.env);
    let carol = Address::generate(&test.env);
    let dave = Address::generate(&test.env);
    let tolerance = 100_000_000;

    // a single unit, then a million tokens on top of it
    test.ledger.build_debt(&test.protocol, &alice, &1, &0);
    let mut total_debt = 1;
    test.ledger
        .build_debt(&test.protocol, &bob, &(1_000_000 * ONE), &total_debt);
    total_debt += 1_000_000 * ONE;
    test.ledger
        .build_debt(&test.protocol, &carol, &ONE, &total_debt);
    total_debt += ONE;

    let last = test.ledger.query_last_system_debt_factor();
    assert!(!last.is_zero());
    assert_eq!((last.scale, last.epoch), (2, 0));

    let bob_balance = test.ledger.query_user_debt_balance(&bob, &total_debt);
    let carol_balance = test.ledger.query_user_debt_balance(&carol, &total_debt);
    assert!(
        assert_approx_amount(bob_balance as i128, (1_000_000 * ONE) as i128, tolerance),
        "{bob_balance}"
    );
    assert!(
        assert_approx_amount(carol_balance as i128, ONE as i128, tolerance),
        "{carol_balance}"
    );

    test.ledger
        .build_debt(&test.protocol, &dave, &(5 * ONE), &total_debt);
    total_debt += 5 * ONE;

    // the largest holder leaves; the remaining shares grow a hundred thousandfold
    let burnt = test
        .ledger
        .burn_debt(&test.protocol, &bob, &(2_000_000 * ONE), &total_debt);
    total_debt -= burnt;
    assert_eq!(test.ledger.query_user_debt_proportion(&bob), 0);

    let carol_balance = test.ledger.query_user_debt_balance(&carol, &total_debt);
    let dave_balance = test.ledger.query_user_debt_balance(&dave, &total_debt);
    assert!(
        assert_approx_amount(carol_balance as i128, ONE as i128, tolerance),
        "{carol_balance}"
    );
    assert!(
        assert_approx_amount(dave_balance as i128, (5 * ONE) as i128, tolerance),
        "{dave_balance}"
    );
}

#[test]
fn users_are_listed_in_first_seen_order() {
    let test = LedgerTest::new();
    let alice = Address::generate(&test.env);
    let bob = Address::generate(&test.env);
    let carol = Address::generate(&test.env);

    test.ledger
        .build_debt(&test.protocol, &alice, &(10 * ONE), &0);
    test.ledger
        .build_debt(&test.protocol, &bob, &(10 * ONE), &(10 * ONE));
    // a second snapshot does not register bob again
    test.ledger
        .build_debt(&test.protocol, &bob, &(10 * ONE), &(20 * ONE));
    test.ledger.update_user_debt(&test.protocol, &carol, &0);

    assert_eq!(test.ledger.query_user_count(), 3);
    assert_eq!(
        test.ledger.query_users(&0, &2),
        vec![&test.env, alice.clone(), bob.clone()]
    );
    assert_eq!(
        test.ledger.query_users(&2, &10),
        vec![&test.env, carol.clone()]
    );
    assert_eq!(test.ledger.query_users(&3, &10).len(), 0);
    assert_eq!(test.ledger.query_state().users.len(), 3);
}

#[test]
fn last_close_at_stays_within_pushed_epochs() {
    let test = LedgerTest::new();

    assert_eq!(
        test.ledger.try_set_last_close_at(&test.closer, &0),
        Err(Ok(ContractError::InvalidCloseIndex))
    );

    for _ in 0..3 {
        test.push(PRECISE);
    }
    test.at(42);
    test.ledger.set_last_close_at(&test.closer, &1);
    assert_eq!(
        test.ledger.try_set_last_close_at(&test.closer, &0),
        Err(Ok(ContractError::InvalidCloseIndex))
    );
    assert_eq!(
        test.ledger.try_set_last_close_at(&test.closer, &3),
        Err(Ok(ContractError::InvalidCloseIndex))
    );
    test.ledger.set_last_close_at(&test.closer, &2);

    assert_eq!(test.ledger.query_last_close_at(), 2);
    assert_eq!(
        test.ledger.query_debt_log(&3, &2),
        vec![
            &test.env,
            DebtEvent::LastCloseAt(LastCloseAtLog {
                index: 1,
                timestamp: 42,
            }),
            DebtEvent::LastCloseAt(LastCloseAtLog {
                index: 2,
                timestamp: 42,
            }),
        ]
    );
}

#[test]
fn push_prunes_closed_factors_in_bounded_steps() {
    let test = LedgerTest::new();

    for _ in 0..60 {
        test.push(PRECISE);
    }
    test.ledger.set_last_close_at(&test.closer, &55);
    assert_eq!(test.ledger.query_last_deleted_to(), 0);

    test.push(PRECISE);
    assert_eq!(test.ledger.query_last_deleted_to(), 50);
    assert_eq!(test.ledger.query_debt_factor(&49), None);
    assert_eq!(test.ledger.query_debt_factor(&50), Some(ScaledFactor::one(0)));

    test.push(PRECISE);
    assert_eq!(test.ledger.query_last_deleted_to(), 55);
    assert_eq!(test.ledger.query_debt_factor(&54), None);

    // the newest factor is never pruned
    let current = test.ledger.query_debt_current_index();
    test.ledger.set_last_close_at(&test.closer, &(current - 1));
    test.push(PRECISE);
    assert_eq!(test.ledger.query_last_deleted_to(), current - 1);
    assert_eq!(
        test.ledger.query_debt_factor(&(current - 1)),
        Some(ScaledFactor::one(0))
    );
    assert_eq!(test.ledger.query_state().debt_factors.len(), 2);
}

#[test]
fn journal_replays_to_live_state() {
    let test = LedgerTest::new();
    let alice = Address::generate(&test.env);
    let bob = Address::generate(&test.env);

    test.at(10);
    test.ledger
        .build_debt(&test.protocol, &alice, &(300 * ONE), &0);
    test.at(20);
    test.ledger
        .build_debt(&test.protocol, &bob, &(100 * ONE), &(300 * ONE));
    test.at(30);
    test.ledger.set_last_close_at(&test.closer, &1);
    test.ledger
        .burn_debt(&test.protocol, &alice, &(50 * ONE), &(400 * ONE));

    let state = test.ledger.query_state();
    assert_eq!(
        replay(DebtLedgerState::new(&test.env), &test.history(&test.ledger)),
        state
    );
    assert_eq!(state.users.len(), 2);
    assert_eq!(state.last_deleted_to, 1);
    assert_eq!(state.debt_current_index, 3);
    assert_eq!(
        state.users.get(bob.clone()),
        Some(test.ledger.query_user_debt_state(&bob))
    );
}

#[test]
fn host_events_decode_to_journal_records() {
    let test = LedgerTest::new();
    let user = Address::generate(&test.env);

    test.at(77);
    test.ledger.update_user_debt(&test.protocol, &user, &ONE);

    let (contract, topics, data) = test.env.events().all().last().unwrap();
    assert_eq!(contract, test.ledger.address);
    assert_eq!(
        topics,
        vec![
            &test.env,
            Symbol::new(&test.env, "UpdateUserDebtLog").into_val(&test.env)
        ]
    );

    let decoded = DebtEvent::from_host_event(&test.env, &topics, &data);
    assert_eq!(decoded, test.ledger.query_debt_log(&0, &1).first());
    assert_eq!(
        decoded,
        Some(DebtEvent::UpdateUserDebt(UpdateUserDebtLog {
            user,
            debt_proportion: ONE,
            debt_factor: ScaledFactor::one(0),
            timestamp: 77,
        }))
    );

    let foreign = vec![&test.env, Symbol::new(&test.env, "Staked").into_val(&test.env)];
    assert_eq!(DebtEvent::from_host_event(&test.env, &foreign, &data), None);
}
