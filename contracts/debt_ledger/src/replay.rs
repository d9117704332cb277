//! Deterministic rebuild of ledger storage from its event history.
//!
//! [`replay`] folds a sequence of [`DebtEvent`]s into a [`DebtLedgerState`]
//! exactly the way the contract mutates its own storage, so a captured
//! history can be checked against a live snapshot without a chain.
use soroban_sdk::{contracttype, Address, Env, Map, Vec};
use synthex::accumulator::ScaledFactor;

use crate::{events::DebtEvent, math::prune_range, storage::DebtData};

/// Full snapshot of the ledger's storage.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebtLedgerState {
    pub users: Map<Address, DebtData>,
    /// Live (not yet pruned) factors by epoch index
    pub debt_factors: Map<u64, ScaledFactor>,
    pub debt_current_index: u64,
    pub last_close_at: u64,
    pub last_deleted_to: u64,
}

impl DebtLedgerState {
    pub fn new(env: &Env) -> Self {
        DebtLedgerState {
            users: Map::new(env),
            debt_factors: Map::new(env),
            debt_current_index: 0,
            last_close_at: 0,
            last_deleted_to: 0,
        }
    }

    pub fn apply(&mut self, event: &DebtEvent) {
        match event {
            DebtEvent::UpdateUserDebt(log) => {
                self.users.set(
                    log.user.clone(),
                    DebtData {
                        debt_proportion: log.debt_proportion,
                        debt_factor: log.debt_factor.clone(),
                        timestamp: log.timestamp,
                    },
                );
            }
            DebtEvent::PushDebt(log) => {
                self.debt_factors.set(log.index, log.debt_factor.clone());
                self.debt_current_index = log.index + 1;

                let stale = prune_range(self.last_deleted_to, self.last_close_at);
                self.last_deleted_to = stale.end;
                for index in stale {
                    self.debt_factors.remove(index);
                }
            }
            DebtEvent::LastCloseAt(log) => {
                self.last_close_at = log.index;
            }
        }
    }
}

pub fn replay(initial: DebtLedgerState, events: &Vec<DebtEvent>) -> DebtLedgerState {
    let mut state = initial;
    for event in events.iter() {
        state.apply(&event);
    }

    state
}
