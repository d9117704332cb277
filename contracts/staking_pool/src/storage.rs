use soroban_sdk::{contracttype, log, panic_with_error, Address, Env};
use synthex::{
    accumulator::{Accumulator, Checkpoint, RewardWindow},
    ttl::{extend_instance, extend_persistent},
};

use crate::error::ContractError;

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Config,
    PoolState,
    Initialized,
    Position(Address),
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    /// Token users stake; the pool holds it in custody
    pub pool_token: Address,
    /// Token the reward budget is paid out in
    pub reward_token: Address,
    pub start_time: u64,
    pub end_time: u64,
    /// Per-staker ceiling on the staked balance
    pub max_stake_amount: i128,
    /// Budget emitted linearly over `[start_time, end_time]`
    pub total_reward_amount: i128,
}

impl Config {
    pub fn reward_window(&self) -> RewardWindow {
        RewardWindow {
            start_time: self.start_time,
            end_time: self.end_time,
            total_reward: self.total_reward_amount,
        }
    }
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct PoolState {
    pub total_staked: i128,
    pub accumulator: Accumulator,
}

#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StakePosition {
    pub staked_amount: i128,
    pub last_accrual_time: u64,
    /// Reward already paid out; what is left to claim is
    /// `reward_checkpoint.accrued - claimed_reward`
    pub claimed_reward: i128,
    pub reward_checkpoint: Checkpoint,
}

impl StakePosition {
    pub fn new(env: &Env) -> Self {
        StakePosition {
            staked_amount: 0,
            last_accrual_time: 0,
            claimed_reward: 0,
            reward_checkpoint: Checkpoint::new(env),
        }
    }

    pub fn accrued_reward(&self) -> i128 {
        self.reward_checkpoint.accrued
    }
}

pub fn is_initialized(env: &Env) -> bool {
    env.storage()
        .instance()
        .get(&DataKey::Initialized)
        .unwrap_or(false)
}

pub fn set_initialized(env: &Env) {
    env.storage().instance().set(&DataKey::Initialized, &true);
    extend_instance(env);
}

pub fn save_config(env: &Env, config: &Config) {
    env.storage().instance().set(&DataKey::Config, config);
    extend_instance(env);
}

pub fn get_config(env: &Env) -> Config {
    extend_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::Config)
        .unwrap_or_else(|| {
            log!(&env, "Pool: Get config: Config not set");
            panic_with_error!(&env, ContractError::NotInitialized)
        })
}

pub fn save_pool_state(env: &Env, state: &PoolState) {
    env.storage().instance().set(&DataKey::PoolState, state);
    extend_instance(env);
}

pub fn get_pool_state(env: &Env) -> PoolState {
    extend_instance(env);
    env.storage()
        .instance()
        .get(&DataKey::PoolState)
        .unwrap_or_else(|| {
            log!(&env, "Pool: Get pool state: Pool state not set");
            panic_with_error!(&env, ContractError::NotInitialized)
        })
}

/// Stakers without a position read as an empty one.
pub fn get_position(env: &Env, user: &Address) -> StakePosition {
    let key = DataKey::Position(user.clone());
    match env.storage().persistent().get::<_, StakePosition>(&key) {
        Some(position) => {
            extend_persistent(env, &key);
            position
        }
        None => StakePosition::new(env),
    }
}

pub fn save_position(env: &Env, user: &Address, position: &StakePosition) {
    let key = DataKey::Position(user.clone());
    env.storage().persistent().set(&key, position);
    extend_persistent(env, &key);
}
