use soroban_sdk::contracterror;
use synthex::accumulator::AccumulatorError;

#[contracterror]
#[derive(Copy, Clone, Debug, Eq, PartialEq, PartialOrd, Ord)]
#[repr(u32)]
pub enum ContractError {
    AlreadyInitialized = 600,
    NotInitialized = 601,
    InvalidTimeWindow = 602,
    InvalidAmount = 603,
    InvalidRewardToken = 604,
    NotStarted = 605,
    AlreadyEnded = 606,
    MaxStakeExceeded = 607,
    InsufficientStake = 608,
    NothingToClaim = 609,
    ContractMathError = 610,
}

impl From<AccumulatorError> for ContractError {
    fn from(_: AccumulatorError) -> Self {
        ContractError::ContractMathError
    }
}
