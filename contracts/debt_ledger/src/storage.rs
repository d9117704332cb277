use soroban_sdk::{contracttype, Address, Env, Vec};
use synthex::{
    accumulator::ScaledFactor,
    ttl::{extend_instance, extend_persistent},
};

#[contracttype]
#[derive(Clone)]
pub enum DataKey {
    Initialized,
    DebtCurrentIndex,
    LastCloseAt,
    LastDeletedTo,
    DebtFactor(u64),
    UserDebt(Address),
    UserCount,
    UserAt(u64),
}

/// A user's debt snapshot. The current share of system debt is
/// `debt_proportion * last_system_debt_factor / debt_factor`.
#[contracttype]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct DebtData {
    pub debt_proportion: u128,
    pub debt_factor: ScaledFactor,
    pub timestamp: u64,
}

impl DebtData {
    pub fn empty() -> Self {
        DebtData {
            debt_proportion: 0,
            debt_factor: ScaledFactor::zero(0),
            timestamp: 0,
        }
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

fn get_counter(env: &Env, key: &DataKey) -> u64 {
    extend_instance(env);
    env.storage().instance().get(key).unwrap_or(0)
}

fn set_counter(env: &Env, key: &DataKey, value: u64) {
    env.storage().instance().set(key, &value);
    extend_instance(env);
}

pub fn get_debt_current_index(env: &Env) -> u64 {
    get_counter(env, &DataKey::DebtCurrentIndex)
}

pub fn set_debt_current_index(env: &Env, index: u64) {
    set_counter(env, &DataKey::DebtCurrentIndex, index)
}

pub fn get_last_close_at(env: &Env) -> u64 {
    get_counter(env, &DataKey::LastCloseAt)
}

pub fn save_last_close_at(env: &Env, index: u64) {
    set_counter(env, &DataKey::LastCloseAt, index)
}

pub fn get_last_deleted_to(env: &Env) -> u64 {
    get_counter(env, &DataKey::LastDeletedTo)
}

pub fn set_last_deleted_to(env: &Env, index: u64) {
    set_counter(env, &DataKey::LastDeletedTo, index)
}

/// Pruned and never-written indexes both read as `None`.
pub fn get_debt_factor(env: &Env, index: u64) -> Option<ScaledFactor> {
    let key = DataKey::DebtFactor(index);
    let factor = env.storage().persistent().get(&key);
    if factor.is_some() {
        extend_persistent(env, &key);
    }

    factor
}

pub fn save_debt_factor(env: &Env, index: u64, factor: &ScaledFactor) {
    let key = DataKey::DebtFactor(index);
    env.storage().persistent().set(&key, factor);
    extend_persistent(env, &key);
}

pub fn remove_debt_factor(env: &Env, index: u64) {
    env.storage().persistent().remove(&DataKey::DebtFactor(index));
}

/// Factor of the newest epoch; one before the first push.
pub fn get_last_system_debt_factor(env: &Env) -> ScaledFactor {
    match get_debt_current_index(env) {
        0 => ScaledFactor::one(0),
        index => get_debt_factor(env, index - 1).unwrap_or(ScaledFactor::zero(0)),
    }
}

pub fn get_user_debt(env: &Env, user: &Address) -> DebtData {
    let key = DataKey::UserDebt(user.clone());
    match env.storage().persistent().get::<_, DebtData>(&key) {
        Some(data) => {
            extend_persistent(env, &key);
            data
        }
        None => DebtData::empty(),
    }
}

pub fn save_user_debt(env: &Env, user: &Address, data: &DebtData) {
    let key = DataKey::UserDebt(user.clone());
    if !env.storage().persistent().has(&key) {
        register_user(env, user);
    }
    env.storage().persistent().set(&key, data);
    extend_persistent(env, &key);
}

pub fn get_user_count(env: &Env) -> u64 {
    get_counter(env, &DataKey::UserCount)
}

/// Addresses that ever had a debt record, in first-seen order, paged.
pub fn get_users(env: &Env, start: u64, limit: u32) -> Vec<Address> {
    let end = get_user_count(env).min(start.saturating_add(limit as u64));
    let mut users = Vec::new(env);
    for position in start..end {
        let key = DataKey::UserAt(position);
        if let Some(user) = env.storage().persistent().get::<_, Address>(&key) {
            extend_persistent(env, &key);
            users.push_back(user);
        }
    }

    users
}

fn register_user(env: &Env, user: &Address) {
    let position = get_user_count(env);
    let key = DataKey::UserAt(position);
    env.storage().persistent().set(&key, user);
    extend_persistent(env, &key);
    set_counter(env, &DataKey::UserCount, position + 1);
}
