use soroban_sdk::{contracttype, Address, Env, Symbol, Vec};
use synthex::journal;

/// Acting user, amount moved and the ledger time of the change.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakeLog {
    pub user: Address,
    pub amount: i128,
    pub timestamp: u64,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum StakeEvent {
    Staked(StakeLog),
    Unstaked(StakeLog),
    RewardClaimed(StakeLog),
}

impl StakeEvent {
    pub fn name(&self) -> &'static str {
        match self {
            StakeEvent::Staked(_) => "Staked",
            StakeEvent::Unstaked(_) => "Unstaked",
            StakeEvent::RewardClaimed(_) => "RewardClaimed",
        }
    }

    pub fn log(&self) -> &StakeLog {
        match self {
            StakeEvent::Staked(log)
            | StakeEvent::Unstaked(log)
            | StakeEvent::RewardClaimed(log) => log,
        }
    }
}

/// Publishes the event and appends it to the pool's journal.
pub fn record(env: &Env, event: StakeEvent) {
    let log = event.log();
    env.events().publish(
        (Symbol::new(env, event.name()), log.user.clone()),
        log.clone(),
    );
    journal::append(env, &event);
}

pub fn read(env: &Env, start: u64, limit: u32) -> Vec<StakeEvent> {
    journal::read(env, start, limit)
}
