use soroban_sdk::{contract, contractimpl, contractmeta, log, token, Address, Env, Vec};
use synthex::{accumulator::Accumulator, journal};

use crate::{
    error::ContractError,
    events::{self, StakeEvent, StakeLog},
    storage::{
        get_config, get_pool_state, get_position, is_initialized, save_config, save_pool_state,
        save_position, set_initialized, Config, PoolState, StakePosition,
    },
};

// Metadata that is added on to the WASM custom section
contractmeta!(
    key = "Description",
    val = "Synthex time-weighted staking reward pool"
);

#[contract]
pub struct StakingPool;

pub trait StakingPoolTrait {
    // The reward budget is paid from the pool's own `reward_token` balance,
    // so the deployer funds the pool with `total_reward_amount` separately.
    fn initialize(
        env: Env,
        pool_token: Address,
        reward_token: Address,
        start_time: u64,
        end_time: u64,
        max_stake_amount: i128,
        total_reward_amount: i128,
    ) -> Result<(), ContractError>;

    fn stake(env: Env, user: Address, amount: i128) -> Result<(), ContractError>;

    fn unstake(env: Env, user: Address, amount: i128) -> Result<(), ContractError>;

    /// Unstakes the whole balance and returns it. A zero balance is not an
    /// error: the call records `Unstaked(user, 0, now)` and returns 0.
    fn unstake_all(env: Env, user: Address) -> Result<i128, ContractError>;

    /// Pays out everything accrued and not yet claimed.
    fn claim_reward(env: Env, user: Address) -> Result<i128, ContractError>;

    // QUERIES

    fn query_config(env: Env) -> Config;

    fn query_total_staked(env: Env) -> i128;

    fn query_staked(env: Env, user: Address) -> i128;

    fn query_stake_position(env: Env, user: Address) -> StakePosition;

    fn query_pool_state(env: Env) -> PoolState;

    /// Claimable reward as of now, without writing anything.
    fn query_reward(env: Env, user: Address) -> Result<i128, ContractError>;

    fn query_stake_log(env: Env, start: u64, limit: u32) -> Vec<StakeEvent>;

    fn query_stake_log_len(env: Env) -> u64;
}

#[contractimpl]
impl StakingPoolTrait for StakingPool {
    fn initialize(
        env: Env,
        pool_token: Address,
        reward_token: Address,
        start_time: u64,
        end_time: u64,
        max_stake_amount: i128,
        total_reward_amount: i128,
    ) -> Result<(), ContractError> {
        if is_initialized(&env) {
            log!(
                &env,
                "Pool: Initialize: initializing contract twice is not allowed"
            );
            return Err(ContractError::AlreadyInitialized);
        }

        if start_time >= end_time {
            log!(
                &env,
                "Pool: Initialize: start time {} must be before end time {}",
                start_time,
                end_time
            );
            return Err(ContractError::InvalidTimeWindow);
        }

        if max_stake_amount <= 0 || total_reward_amount <= 0 {
            log!(
                &env,
                "Pool: Initialize: stake ceiling and reward budget must be positive"
            );
            return Err(ContractError::InvalidAmount);
        }

        if reward_token == pool_token {
            log!(
                &env,
                "Pool: Initialize: reward token must differ from the pool token"
            );
            return Err(ContractError::InvalidRewardToken);
        }

        set_initialized(&env);
        save_config(
            &env,
            &Config {
                pool_token: pool_token.clone(),
                reward_token,
                start_time,
                end_time,
                max_stake_amount,
                total_reward_amount,
            },
        );
        save_pool_state(
            &env,
            &PoolState {
                total_staked: 0,
                accumulator: Accumulator::new(&env, start_time),
            },
        );

        env.events()
            .publish(("initialize", "Staking reward pool"), &pool_token);

        Ok(())
    }

    fn stake(env: Env, user: Address, amount: i128) -> Result<(), ContractError> {
        user.require_auth();

        if amount <= 0 {
            log!(&env, "Pool: Stake: amount must be positive, got {}", amount);
            return Err(ContractError::InvalidAmount);
        }

        let config = get_config(&env);
        let now = env.ledger().timestamp();

        if now < config.start_time {
            log!(
                &env,
                "Pool: Stake: staking opens at {}, now is {}",
                config.start_time,
                now
            );
            return Err(ContractError::NotStarted);
        }
        if now >= config.end_time {
            log!(
                &env,
                "Pool: Stake: staking closed at {}, now is {}",
                config.end_time,
                now
            );
            return Err(ContractError::AlreadyEnded);
        }

        let mut position = get_position(&env, &user);
        let new_balance = position
            .staked_amount
            .checked_add(amount)
            .ok_or(ContractError::ContractMathError)?;
        if new_balance > config.max_stake_amount {
            log!(
                &env,
                "Pool: Stake: balance {} would exceed the ceiling {}",
                new_balance,
                config.max_stake_amount
            );
            return Err(ContractError::MaxStakeExceeded);
        }

        let mut state = get_pool_state(&env);
        settle(&env, &config, &mut state, &mut position, now)?;

        position.staked_amount = new_balance;
        state.total_staked = state
            .total_staked
            .checked_add(amount)
            .ok_or(ContractError::ContractMathError)?;

        token::Client::new(&env, &config.pool_token).transfer(
            &user,
            &env.current_contract_address(),
            &amount,
        );

        save_position(&env, &user, &position);
        save_pool_state(&env, &state);
        events::record(
            &env,
            StakeEvent::Staked(StakeLog {
                user,
                amount,
                timestamp: now,
            }),
        );

        Ok(())
    }

    fn unstake(env: Env, user: Address, amount: i128) -> Result<(), ContractError> {
        user.require_auth();

        if amount < 0 {
            log!(&env, "Pool: Unstake: amount can not be negative, got {}", amount);
            return Err(ContractError::InvalidAmount);
        }

        withdraw(&env, user, amount)
    }

    fn unstake_all(env: Env, user: Address) -> Result<i128, ContractError> {
        user.require_auth();

        let amount = get_position(&env, &user).staked_amount;
        withdraw(&env, user, amount)?;

        Ok(amount)
    }

    fn claim_reward(env: Env, user: Address) -> Result<i128, ContractError> {
        user.require_auth();

        let config = get_config(&env);
        let now = env.ledger().timestamp();
        let mut state = get_pool_state(&env);
        let mut position = get_position(&env, &user);
        settle(&env, &config, &mut state, &mut position, now)?;

        let claimable = position.accrued_reward() - position.claimed_reward;
        if claimable <= 0 {
            log!(&env, "Pool: Claim reward: nothing to claim");
            return Err(ContractError::NothingToClaim);
        }
        position.claimed_reward = position.accrued_reward();

        token::Client::new(&env, &config.reward_token).transfer(
            &env.current_contract_address(),
            &user,
            &claimable,
        );

        save_position(&env, &user, &position);
        save_pool_state(&env, &state);
        events::record(
            &env,
            StakeEvent::RewardClaimed(StakeLog {
                user,
                amount: claimable,
                timestamp: now,
            }),
        );

        Ok(claimable)
    }

    fn query_config(env: Env) -> Config {
        get_config(&env)
    }

    fn query_total_staked(env: Env) -> i128 {
        get_pool_state(&env).total_staked
    }

    fn query_staked(env: Env, user: Address) -> i128 {
        get_position(&env, &user).staked_amount
    }

    fn query_stake_position(env: Env, user: Address) -> StakePosition {
        get_position(&env, &user)
    }

    fn query_pool_state(env: Env) -> PoolState {
        get_pool_state(&env)
    }

    fn query_reward(env: Env, user: Address) -> Result<i128, ContractError> {
        let config = get_config(&env);
        let state = get_pool_state(&env);
        let position = get_position(&env, &user);

        let mut accumulator = state.accumulator;
        accumulator.advance(
            &env,
            env.ledger().timestamp(),
            &config.reward_window(),
            state.total_staked,
        )?;
        let accrued = accumulator.pending(
            &env,
            &position.reward_checkpoint,
            position.staked_amount,
        )?;

        Ok(accrued - position.claimed_reward)
    }

    fn query_stake_log(env: Env, start: u64, limit: u32) -> Vec<StakeEvent> {
        events::read(&env, start, limit)
    }

    fn query_stake_log_len(env: Env) -> u64 {
        journal::len(&env)
    }
}

/// Brings the global accumulator up to `now` and credits `position` for the
/// time elapsed since its last settlement. Runs before every balance change.
fn settle(
    env: &Env,
    config: &Config,
    state: &mut PoolState,
    position: &mut StakePosition,
    now: u64,
) -> Result<(), ContractError> {
    state.accumulator.advance(
        env,
        now,
        &config.reward_window(),
        state.total_staked,
    )?;
    state
        .accumulator
        .settle(env, &mut position.reward_checkpoint, position.staked_amount)?;
    position.last_accrual_time = now;

    Ok(())
}

fn withdraw(env: &Env, user: Address, amount: i128) -> Result<(), ContractError> {
    let config = get_config(env);
    let now = env.ledger().timestamp();
    let mut position = get_position(env, &user);

    if amount > position.staked_amount {
        log!(
            env,
            "Pool: Unstake: requested {} but only {} is staked",
            amount,
            position.staked_amount
        );
        return Err(ContractError::InsufficientStake);
    }

    let mut state = get_pool_state(env);
    settle(env, &config, &mut state, &mut position, now)?;

    position.staked_amount -= amount;
    state.total_staked -= amount;

    if amount > 0 {
        token::Client::new(env, &config.pool_token).transfer(
            &env.current_contract_address(),
            &user,
            &amount,
        );
    }

    save_position(env, &user, &position);
    save_pool_state(env, &state);
    events::record(
        env,
        StakeEvent::Unstaked(StakeLog {
            user,
            amount,
            timestamp: now,
        }),
    );

    Ok(())
}
