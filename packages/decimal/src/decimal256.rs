// A lot of this code is taken from the cosmwasm-std crate, which is licensed under the Apache
// License 2.0 - https://github.com/CosmWasm/cosmwasm.

use soroban_sdk::{Env, U256};

#[derive(Debug, PartialEq, Eq)]
pub enum Error {
    DivideByZero,
    /// Result does not fit back into 128 bits.
    Overflow,
}

/// Fixed-point decimal with 18 fractional digits backed by a host `U256`.
///
/// All divisions truncate toward zero, so repeated operations drift downwards
/// by at most one atomic unit per division.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd)]
pub struct Decimal256(U256);

impl Decimal256 {
    const DECIMAL_FRACTIONAL: u128 = 1_000_000_000_000_000_000u128; // 1*10**18

    /// Wraps atomic units (`value / 10^18`).
    pub fn raw(value: U256) -> Self {
        Decimal256(value)
    }

    fn decimal_fractional(env: &Env) -> U256 {
        U256::from_u128(env, Self::DECIMAL_FRACTIONAL)
    }

    pub fn to_u256(&self) -> U256 {
        self.0.clone()
    }

    pub fn checked_from_ratio(env: &Env, numerator: U256, denominator: U256) -> Result<Self, Error> {
        if denominator == U256::from_u32(env, 0) {
            return Err(Error::DivideByZero);
        }

        let ratio = numerator
            .mul(&Self::decimal_fractional(env))
            .div(&denominator);

        Ok(Decimal256(ratio))
    }

    /// Multiplies an integer amount by this decimal, truncating the result.
    pub fn mul_int(&self, env: &Env, amount: u128) -> Result<u128, Error> {
        U256::from_u128(env, amount)
            .mul(&self.0)
            .div(&Self::decimal_fractional(env))
            .to_u128()
            .ok_or(Error::Overflow)
    }
}
