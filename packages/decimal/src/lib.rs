#![no_std]

mod decimal256;

pub use decimal256::{Decimal256, Error};

use soroban_sdk::{Env, U256};

/// Atomic units in one whole decimal (1*10**18).
pub const DECIMAL_FRACTIONAL: u128 = 1_000_000_000_000_000_000u128;

/// `value * numerator / denominator` computed in 256 bits and truncated.
pub fn mul_div(env: &Env, value: u128, numerator: u128, denominator: u128) -> Result<u128, Error> {
    if denominator == 0 {
        return Err(Error::DivideByZero);
    }
    U256::from_u128(env, value)
        .mul(&U256::from_u128(env, numerator))
        .div(&U256::from_u128(env, denominator))
        .to_u128()
        .ok_or(Error::Overflow)
}
