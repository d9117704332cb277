#![no_std]

pub mod access;
pub mod accumulator;
pub mod journal;
pub mod ttl;
pub mod utils;

pub use soroban_decimal::DECIMAL_FRACTIONAL;

/// One whole token in 18 decimal atomic units.
pub const TOKEN_UNIT: i128 = DECIMAL_FRACTIONAL as i128;
