//! Debt ledger event records.
//!
//! Every mutation publishes exactly one record as a host event, with the
//! record name as first topic, and appends the same record to the on-ledger
//! journal. Recovery tooling reads either stream back as [`DebtEvent`]s.
use soroban_sdk::{contracttype, Address, Env, IntoVal, Symbol, TryFromVal, Val, Vec, U256};
use synthex::{accumulator::ScaledFactor, journal};

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct UpdateUserDebtLog {
    pub user: Address,
    pub debt_proportion: u128,
    pub debt_factor: ScaledFactor,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PushDebtLog {
    pub index: u64,
    /// Multiplier handed to `push_debt`, 27 decimals
    pub factor: U256,
    /// Cumulative factor recorded at `index`
    pub debt_factor: ScaledFactor,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct LastCloseAtLog {
    pub index: u64,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum DebtEvent {
    UpdateUserDebt(UpdateUserDebtLog),
    PushDebt(PushDebtLog),
    LastCloseAt(LastCloseAtLog),
}

const UPDATE_USER_DEBT: &str = "UpdateUserDebtLog";
const PUSH_DEBT: &str = "PushDebtLog";
const LAST_CLOSE_AT: &str = "LastCloseAtLog";

impl DebtEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DebtEvent::UpdateUserDebt(_) => UPDATE_USER_DEBT,
            DebtEvent::PushDebt(_) => PUSH_DEBT,
            DebtEvent::LastCloseAt(_) => LAST_CLOSE_AT,
        }
    }

    pub fn timestamp(&self) -> u64 {
        match self {
            DebtEvent::UpdateUserDebt(log) => log.timestamp,
            DebtEvent::PushDebt(log) => log.timestamp,
            DebtEvent::LastCloseAt(log) => log.timestamp,
        }
    }

    /// Decodes a captured host event. Events of other contracts, or with
    /// an unknown name, yield `None`.
    pub fn from_host_event(env: &Env, topics: &Vec<Val>, data: &Val) -> Option<DebtEvent> {
        let name = Symbol::try_from_val(env, &topics.get(0)?).ok()?;

        if name == Symbol::new(env, UPDATE_USER_DEBT) {
            UpdateUserDebtLog::try_from_val(env, data)
                .ok()
                .map(DebtEvent::UpdateUserDebt)
        } else if name == Symbol::new(env, PUSH_DEBT) {
            PushDebtLog::try_from_val(env, data)
                .ok()
                .map(DebtEvent::PushDebt)
        } else if name == Symbol::new(env, LAST_CLOSE_AT) {
            LastCloseAtLog::try_from_val(env, data)
                .ok()
                .map(DebtEvent::LastCloseAt)
        } else {
            None
        }
    }

    fn into_data(self, env: &Env) -> Val {
        match self {
            DebtEvent::UpdateUserDebt(log) => log.into_val(env),
            DebtEvent::PushDebt(log) => log.into_val(env),
            DebtEvent::LastCloseAt(log) => log.into_val(env),
        }
    }
}

pub(crate) fn record(env: &Env, event: DebtEvent) {
    journal::append(env, &event);
    let name = Symbol::new(env, event.name());
    env.events().publish((name,), event.into_data(env));
}

pub(crate) fn read(env: &Env, start: u64, limit: u32) -> Vec<DebtEvent> {
    journal::read(env, start, limit)
}
