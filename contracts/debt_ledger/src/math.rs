use core::ops::Range;

use soroban_decimal::mul_div;
use soroban_sdk::{Env, U256};
use synthex::{
    accumulator::{rebase, ScaledFactor, PRECISE_UNIT},
    DECIMAL_FRACTIONAL,
};

use crate::{error::ContractError, storage::DebtData};

/// Upper bound on stale debt factors removed by a single push.
pub const MAX_DELETE_PER_PUSH: u64 = 50;

/// New user proportion (18 decimals) and the multiplier to push (27
/// decimals) for one build or burn.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebtShift {
    pub debt_proportion: u128,
    pub factor: U256,
}

/// Cumulative factor recorded for a new epoch. The first epoch restarts at
/// one; so does the epoch after the system debt was burnt to zero.
pub fn next_debt_factor(
    env: &Env,
    previous: Option<ScaledFactor>,
    factor: &U256,
) -> Result<ScaledFactor, ContractError> {
    match previous {
        None => Ok(ScaledFactor::one(0)),
        Some(previous) => Ok(previous.apply(env, factor)?),
    }
}

pub fn current_proportion(
    env: &Env,
    data: &DebtData,
    last_system_debt_factor: &ScaledFactor,
) -> Result<u128, ContractError> {
    Ok(rebase(
        env,
        data.debt_proportion,
        last_system_debt_factor,
        &data.debt_factor,
    )?)
}

pub fn debt_balance(env: &Env, proportion: u128, total_debt: u128) -> Result<u128, ContractError> {
    Ok(mul_div(env, proportion, total_debt, DECIMAL_FRACTIONAL)?)
}

/// Issuing `amount` into a system holding `total_debt` shrinks every
/// existing share by `1 - amount / new_total`.
pub fn build_shift(
    env: &Env,
    balance: u128,
    amount: u128,
    total_debt: u128,
) -> Result<DebtShift, ContractError> {
    let new_total = total_debt
        .checked_add(amount)
        .ok_or(ContractError::ContractMathError)?;
    let factor = PRECISE_UNIT
        .checked_sub(mul_div(env, amount, PRECISE_UNIT, new_total)?)
        .ok_or(ContractError::ContractMathError)?;

    let new_balance = balance
        .checked_add(amount)
        .ok_or(ContractError::ContractMathError)?;
    let debt_proportion = mul_div(env, new_balance, DECIMAL_FRACTIONAL, new_total)?;

    Ok(DebtShift {
        debt_proportion,
        factor: U256::from_u128(env, factor),
    })
}

/// Burning `amount` grows every remaining share by `1 + amount / new_total`.
/// Burning the whole system debt pushes a zero factor.
pub fn burn_shift(
    env: &Env,
    balance: u128,
    amount: u128,
    total_debt: u128,
) -> Result<DebtShift, ContractError> {
    let new_total = total_debt
        .checked_sub(amount)
        .ok_or(ContractError::ContractMathError)?;
    if new_total == 0 {
        return Ok(DebtShift {
            debt_proportion: 0,
            factor: U256::from_u32(env, 0),
        });
    }

    let unit = U256::from_u128(env, PRECISE_UNIT);
    let factor = U256::from_u128(env, amount)
        .mul(&unit)
        .div(&U256::from_u128(env, new_total))
        .add(&unit);
    let debt_proportion = if balance > amount {
        mul_div(env, balance - amount, DECIMAL_FRACTIONAL, new_total)?
    } else {
        0
    };

    Ok(DebtShift {
        debt_proportion,
        factor,
    })
}

/// Indexes to delete on the next push: everything left below the last
/// close, at most [`MAX_DELETE_PER_PUSH`] at a time.
pub fn prune_range(last_deleted_to: u64, last_close_at: u64) -> Range<u64> {
    let count = last_close_at
        .saturating_sub(last_deleted_to)
        .min(MAX_DELETE_PER_PUSH);
    last_deleted_to..last_deleted_to + count
}
