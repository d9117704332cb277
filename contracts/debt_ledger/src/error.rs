use soroban_sdk::contracterror;
use synthex::{access::AccessError, accumulator::AccumulatorError};

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 700,
    NotInitialized = 701,
    Unauthorized = 702,
    InvalidImportLength = 703,
    InvalidCloseIndex = 704,
    InvalidAmount = 705,
    NoDebtToBurn = 706,
    ContractMathError = 707,
}

impl From<AccessError> for ContractError {
    fn from(err: AccessError) -> Self {
        match err {
            AccessError::Unauthorized => ContractError::Unauthorized,
        }
    }
}

impl From<AccumulatorError> for ContractError {
    fn from(_: AccumulatorError) -> Self {
        ContractError::ContractMathError
    }
}

impl From<soroban_decimal::Error> for ContractError {
    fn from(_: soroban_decimal::Error) -> Self {
        ContractError::ContractMathError
    }
}
