//! Append-only, on-ledger record of every state-changing action.
//!
//! Host events are not readable from inside a contract, so each ledger also
//! keeps its own numbered journal. Entries are never rewritten or removed.
use soroban_sdk::{contracttype, Env, IntoVal, TryFromVal, Val, Vec};

use crate::ttl::{extend_instance, extend_persistent};

#[contracttype]
#[derive(Clone)]
enum JournalKey {
    JournalLength,
    JournalEntry(u64),
}

pub fn len(env: &Env) -> u64 {
    extend_instance(env);
    env.storage()
        .instance()
        .get(&JournalKey::JournalLength)
        .unwrap_or(0)
}

/// Appends `entry` and returns its sequence number.
pub fn append<T>(env: &Env, entry: &T) -> u64
where
    T: IntoVal<Env, Val>,
{
    let seq = len(env);
    let key = JournalKey::JournalEntry(seq);
    env.storage().persistent().set(&key, entry);
    extend_persistent(env, &key);
    env.storage()
        .instance()
        .set(&JournalKey::JournalLength, &(seq + 1));

    seq
}

pub fn get<T>(env: &Env, seq: u64) -> Option<T>
where
    T: TryFromVal<Env, Val>,
{
    let key = JournalKey::JournalEntry(seq);
    let entry = env.storage().persistent().get(&key);
    if entry.is_some() {
        extend_persistent(env, &key);
    }

    entry
}

/// Reads at most `limit` entries starting at sequence number `start`.
pub fn read<T>(env: &Env, start: u64, limit: u32) -> Vec<T>
where
    T: IntoVal<Env, Val> + TryFromVal<Env, Val>,
{
    let end = len(env).min(start.saturating_add(limit as u64));
    let mut entries = Vec::new(env);
    for seq in start..end {
        if let Some(entry) = get::<T>(env, seq) {
            entries.push_back(entry);
        }
    }

    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{contract, contractimpl, vec};

    #[contract]
    struct Harness;

    #[contractimpl]
    impl Harness {}

    #[test]
    fn entries_keep_insertion_order() {
        let env = Env::default();
        let harness = env.register(Harness, ());

        env.as_contract(&harness, || {
            assert_eq!(len(&env), 0);
            assert_eq!(append(&env, &10u64), 0);
            assert_eq!(append(&env, &20u64), 1);
            assert_eq!(append(&env, &30u64), 2);
            assert_eq!(len(&env), 3);

            assert_eq!(get::<u64>(&env, 1), Some(20));
            assert_eq!(get::<u64>(&env, 3), None);
            assert_eq!(read::<u64>(&env, 0, 10), vec![&env, 10u64, 20, 30]);
            assert_eq!(read::<u64>(&env, 1, 1), vec![&env, 20u64]);
            assert_eq!(read::<u64>(&env, 5, 10), Vec::<u64>::new(&env));
        });
    }
}
