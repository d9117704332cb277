use soroban_sdk::{contract, contractimpl, contractmeta, log, Address, Env, Map, Vec, U256};
use synthex::{
    access::{self, Role},
    accumulator::ScaledFactor,
    journal,
};

use crate::{
    error::ContractError,
    events::{self, DebtEvent, LastCloseAtLog, PushDebtLog, UpdateUserDebtLog},
    math::{self, prune_range},
    operation::Operation,
    replay::DebtLedgerState,
    storage::{
        get_debt_current_index, get_debt_factor, get_last_close_at, get_last_deleted_to,
        get_last_system_debt_factor, get_user_count, get_user_debt, get_users, is_initialized,
        remove_debt_factor, save_debt_factor, save_user_debt, set_debt_current_index,
        save_last_close_at, set_initialized, set_last_deleted_to, DebtData,
    },
};

// Metadata that is added on to the WASM custom section
contractmeta!(
    key = "Description",
    val = "Synthex global debt ledger"
);

/// Users read per storage page when exporting the full state.
const USERS_PAGE: u32 = 100;

#[contract]
pub struct DebtLedger;

pub trait DebtLedgerTrait {
    fn initialize(env: Env, admin: Address) -> Result<(), ContractError>;

    fn grant_role(
        env: Env,
        sender: Address,
        role: Role,
        account: Address,
    ) -> Result<(), ContractError>;

    fn revoke_role(
        env: Env,
        sender: Address,
        role: Role,
        account: Address,
    ) -> Result<(), ContractError>;

    /// Opens a new epoch whose cumulative factor is the previous one scaled
    /// by `factor` (27 decimals).
    fn push_debt(env: Env, sender: Address, factor: U256) -> Result<(), ContractError>;

    fn update_user_debt(
        env: Env,
        sender: Address,
        user: Address,
        debt_proportion: u128,
    ) -> Result<(), ContractError>;

    fn update_debt(
        env: Env,
        sender: Address,
        user: Address,
        debt_proportion: u128,
        factor: U256,
    ) -> Result<(), ContractError>;

    /// Issues `amount` of debt to `user` in a system currently owing
    /// `total_debt`.
    fn build_debt(
        env: Env,
        sender: Address,
        user: Address,
        amount: u128,
        total_debt: u128,
    ) -> Result<DebtData, ContractError>;

    /// Burns up to `amount` of `user`'s debt and returns what was burnt.
    fn burn_debt(
        env: Env,
        sender: Address,
        user: Address,
        amount: u128,
        total_debt: u128,
    ) -> Result<u128, ContractError>;

    fn set_last_close_at(env: Env, sender: Address, index: u64) -> Result<(), ContractError>;

    /// Writes captured user snapshots back verbatim. Nothing is derived from
    /// the current global state.
    fn import_debt_data(
        env: Env,
        sender: Address,
        users: Vec<Address>,
        debt_proportions: Vec<u128>,
        debt_factors: Vec<ScaledFactor>,
        timestamps: Vec<u64>,
    ) -> Result<(), ContractError>;

    // QUERIES

    fn query_user_debt_state(env: Env, user: Address) -> DebtData;

    fn query_debt_current_index(env: Env) -> u64;

    fn query_last_close_at(env: Env) -> u64;

    fn query_last_deleted_to(env: Env) -> u64;

    fn query_debt_factor(env: Env, index: u64) -> Option<ScaledFactor>;

    fn query_last_system_debt_factor(env: Env) -> ScaledFactor;

    fn query_user_debt_proportion(env: Env, user: Address) -> Result<u128, ContractError>;

    fn query_user_debt_balance(
        env: Env,
        user: Address,
        total_debt: u128,
    ) -> Result<u128, ContractError>;

    fn query_role_holders(env: Env, role: Role) -> Vec<Address>;

    fn query_users(env: Env, start: u64, limit: u32) -> Vec<Address>;

    fn query_user_count(env: Env) -> u64;

    fn query_state(env: Env) -> DebtLedgerState;

    fn query_debt_log(env: Env, start: u64, limit: u32) -> Vec<DebtEvent>;

    fn query_debt_log_len(env: Env) -> u64;
}

#[contractimpl]
impl DebtLedgerTrait for DebtLedger {
    fn initialize(env: Env, admin: Address) -> Result<(), ContractError> {
        if is_initialized(&env) {
            log!(
                &env,
                "Debt ledger: Initialize: initializing contract twice is not allowed"
            );
            return Err(ContractError::AlreadyInitialized);
        }

        set_initialized(&env);
        access::grant(&env, Role::Admin, &admin);

        env.events()
            .publish(("initialize", "Debt ledger admin"), &admin);

        Ok(())
    }

    fn grant_role(
        env: Env,
        sender: Address,
        role: Role,
        account: Address,
    ) -> Result<(), ContractError> {
        authorize(&env, &sender, Operation::GrantRole)?;

        if access::grant(&env, role, &account) {
            env.events().publish(("grant_role", role), &account);
        }

        Ok(())
    }

    fn revoke_role(
        env: Env,
        sender: Address,
        role: Role,
        account: Address,
    ) -> Result<(), ContractError> {
        authorize(&env, &sender, Operation::RevokeRole)?;

        if access::revoke(&env, role, &account) {
            env.events().publish(("revoke_role", role), &account);
        }

        Ok(())
    }

    fn push_debt(env: Env, sender: Address, factor: U256) -> Result<(), ContractError> {
        authorize(&env, &sender, Operation::PushDebt)?;

        push_debt_factor(&env, factor)
    }

    fn update_user_debt(
        env: Env,
        sender: Address,
        user: Address,
        debt_proportion: u128,
    ) -> Result<(), ContractError> {
        authorize(&env, &sender, Operation::UpdateUserDebt)?;

        update_user_debt_state(&env, user, debt_proportion);

        Ok(())
    }

    fn update_debt(
        env: Env,
        sender: Address,
        user: Address,
        debt_proportion: u128,
        factor: U256,
    ) -> Result<(), ContractError> {
        authorize(&env, &sender, Operation::UpdateDebt)?;

        push_debt_factor(&env, factor)?;
        update_user_debt_state(&env, user, debt_proportion);

        Ok(())
    }

    fn build_debt(
        env: Env,
        sender: Address,
        user: Address,
        amount: u128,
        total_debt: u128,
    ) -> Result<DebtData, ContractError> {
        authorize(&env, &sender, Operation::BuildDebt)?;

        if amount == 0 {
            log!(&env, "Debt ledger: Build debt: amount must be positive");
            return Err(ContractError::InvalidAmount);
        }

        // an empty system closes the running epoch so the builder snapshots a fresh one
        if total_debt == 0
            && get_debt_current_index(&env) > 0
            && !get_last_system_debt_factor(&env).is_zero()
        {
            push_debt_factor(&env, U256::from_u32(&env, 0))?;
        }

        let balance = user_debt_balance(&env, &user, total_debt)?;
        let shift = math::build_shift(&env, balance, amount, total_debt)?;

        push_debt_factor(&env, shift.factor)?;
        Ok(update_user_debt_state(&env, user, shift.debt_proportion))
    }

    fn burn_debt(
        env: Env,
        sender: Address,
        user: Address,
        amount: u128,
        total_debt: u128,
    ) -> Result<u128, ContractError> {
        authorize(&env, &sender, Operation::BurnDebt)?;

        if amount == 0 {
            log!(&env, "Debt ledger: Burn debt: amount must be positive");
            return Err(ContractError::InvalidAmount);
        }

        let balance = user_debt_balance(&env, &user, total_debt)?;
        if balance == 0 {
            log!(&env, "Debt ledger: Burn debt: user has no debt to burn");
            return Err(ContractError::NoDebtToBurn);
        }

        // rounding can leave a sole holder's balance a few units above the total
        let amount = amount.min(balance).min(total_debt);
        let shift = math::burn_shift(&env, balance, amount, total_debt)?;

        push_debt_factor(&env, shift.factor)?;
        update_user_debt_state(&env, user, shift.debt_proportion);

        Ok(amount)
    }

    fn set_last_close_at(env: Env, sender: Address, index: u64) -> Result<(), ContractError> {
        authorize(&env, &sender, Operation::SetLastCloseAt)?;

        let last_close_at = get_last_close_at(&env);
        let debt_current_index = get_debt_current_index(&env);
        if index < last_close_at || index >= debt_current_index {
            log!(
                &env,
                "Debt ledger: Set last close at: index {} outside [{}, {})",
                index,
                last_close_at,
                debt_current_index
            );
            return Err(ContractError::InvalidCloseIndex);
        }

        save_last_close_at(&env, index);
        events::record(
            &env,
            DebtEvent::LastCloseAt(LastCloseAtLog {
                index,
                timestamp: env.ledger().timestamp(),
            }),
        );

        Ok(())
    }

    fn import_debt_data(
        env: Env,
        sender: Address,
        users: Vec<Address>,
        debt_proportions: Vec<u128>,
        debt_factors: Vec<ScaledFactor>,
        timestamps: Vec<u64>,
    ) -> Result<(), ContractError> {
        authorize(&env, &sender, Operation::ImportDebtData)?;

        let len = users.len();
        if debt_proportions.len() != len || debt_factors.len() != len || timestamps.len() != len
        {
            log!(
                &env,
                "Debt ledger: Import debt data: column lengths differ"
            );
            return Err(ContractError::InvalidImportLength);
        }

        for (((user, debt_proportion), debt_factor), timestamp) in users
            .iter()
            .zip(debt_proportions.iter())
            .zip(debt_factors.iter())
            .zip(timestamps.iter())
        {
            let data = DebtData {
                debt_proportion,
                debt_factor: debt_factor.clone(),
                timestamp,
            };
            save_user_debt(&env, &user, &data);
            events::record(
                &env,
                DebtEvent::UpdateUserDebt(UpdateUserDebtLog {
                    user,
                    debt_proportion,
                    debt_factor,
                    timestamp,
                }),
            );
        }

        Ok(())
    }

    fn query_user_debt_state(env: Env, user: Address) -> DebtData {
        get_user_debt(&env, &user)
    }

    fn query_debt_current_index(env: Env) -> u64 {
        get_debt_current_index(&env)
    }

    fn query_last_close_at(env: Env) -> u64 {
        get_last_close_at(&env)
    }

    fn query_last_deleted_to(env: Env) -> u64 {
        get_last_deleted_to(&env)
    }

    fn query_debt_factor(env: Env, index: u64) -> Option<ScaledFactor> {
        get_debt_factor(&env, index)
    }

    fn query_last_system_debt_factor(env: Env) -> ScaledFactor {
        get_last_system_debt_factor(&env)
    }

    fn query_user_debt_proportion(env: Env, user: Address) -> Result<u128, ContractError> {
        math::current_proportion(
            &env,
            &get_user_debt(&env, &user),
            &get_last_system_debt_factor(&env),
        )
    }

    fn query_user_debt_balance(
        env: Env,
        user: Address,
        total_debt: u128,
    ) -> Result<u128, ContractError> {
        user_debt_balance(&env, &user, total_debt)
    }

    fn query_role_holders(env: Env, role: Role) -> Vec<Address> {
        access::holders(&env, role)
    }

    fn query_users(env: Env, start: u64, limit: u32) -> Vec<Address> {
        get_users(&env, start, limit)
    }

    fn query_user_count(env: Env) -> u64 {
        get_user_count(&env)
    }

    fn query_state(env: Env) -> DebtLedgerState {
        let mut users = Map::new(&env);
        let count = get_user_count(&env);
        let mut start = 0;
        while start < count {
            for user in get_users(&env, start, USERS_PAGE).iter() {
                let data = get_user_debt(&env, &user);
                users.set(user, data);
            }
            start += USERS_PAGE as u64;
        }

        let debt_current_index = get_debt_current_index(&env);
        let last_deleted_to = get_last_deleted_to(&env);
        let mut debt_factors = Map::new(&env);
        for index in last_deleted_to..debt_current_index {
            if let Some(factor) = get_debt_factor(&env, index) {
                debt_factors.set(index, factor);
            }
        }

        DebtLedgerState {
            users,
            debt_factors,
            debt_current_index,
            last_close_at: get_last_close_at(&env),
            last_deleted_to,
        }
    }

    fn query_debt_log(env: Env, start: u64, limit: u32) -> Vec<DebtEvent> {
        events::read(&env, start, limit)
    }

    fn query_debt_log_len(env: Env) -> u64 {
        journal::len(&env)
    }
}

fn authorize(env: &Env, sender: &Address, operation: Operation) -> Result<(), ContractError> {
    if !is_initialized(env) {
        log!(env, "Debt ledger: Authorize: contract is not initialized");
        return Err(ContractError::NotInitialized);
    }

    access::authorize(env, sender, operation).map_err(|err| {
        log!(env, "Debt ledger: Authorize: sender lacks the required role");
        ContractError::from(err)
    })
}

fn user_debt_balance(env: &Env, user: &Address, total_debt: u128) -> Result<u128, ContractError> {
    let proportion = math::current_proportion(
        env,
        &get_user_debt(env, user),
        &get_last_system_debt_factor(env),
    )?;
    math::debt_balance(env, proportion, total_debt)
}

fn push_debt_factor(env: &Env, factor: U256) -> Result<(), ContractError> {
    let index = get_debt_current_index(env);
    let previous = match index {
        0 => None,
        index => get_debt_factor(env, index - 1),
    };
    let debt_factor = math::next_debt_factor(env, previous, &factor)?;

    save_debt_factor(env, index, &debt_factor);
    events::record(
        env,
        DebtEvent::PushDebt(PushDebtLog {
            index,
            factor,
            debt_factor,
            timestamp: env.ledger().timestamp(),
        }),
    );
    set_debt_current_index(env, index + 1);

    let stale = prune_range(get_last_deleted_to(env), get_last_close_at(env));
    set_last_deleted_to(env, stale.end);
    for index in stale {
        remove_debt_factor(env, index);
    }

    Ok(())
}

fn update_user_debt_state(env: &Env, user: Address, debt_proportion: u128) -> DebtData {
    let data = DebtData {
        debt_proportion,
        debt_factor: get_last_system_debt_factor(env),
        timestamp: env.ledger().timestamp(),
    };
    save_user_debt(env, &user, &data);
    events::record(
        env,
        DebtEvent::UpdateUserDebt(UpdateUserDebtLog {
            user,
            debt_proportion: data.debt_proportion,
            debt_factor: data.debt_factor.clone(),
            timestamp: data.timestamp,
        }),
    );

    data
}
