#![no_std]
mod contract;
mod error;
mod math;
mod operation;
mod storage;

pub mod events;
pub mod replay;

pub use contract::{DebtLedger, DebtLedgerClient};
pub use storage::DebtData;
