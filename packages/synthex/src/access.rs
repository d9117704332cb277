//! Role based access control.
//!
//! Contracts describe every privileged entry point as an operation and map it
//! to the role allowed to call it through [`Capability`]. Role membership is
//! kept in instance storage, one address list per role.
use soroban_sdk::{contracttype, Address, Env, Vec};

use crate::ttl::extend_instance;

#[contracttype]
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(u32)]
pub enum Role {
    Admin = 0,
    /// The build/burn subsystem that moves system debt
    Protocol = 1,
    /// The fee-period closer
    RewardSystem = 2,
}

#[contracttype]
#[derive(Clone)]
enum AccessKey {
    RoleHolders(Role),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessError {
    Unauthorized,
}

/// Operation → role table implemented by each contract's operation enum.
pub trait Capability {
    fn required_role(&self) -> Role;
}

pub fn holders(env: &Env, role: Role) -> Vec<Address> {
    extend_instance(env);
    env.storage()
        .instance()
        .get(&AccessKey::RoleHolders(role))
        .unwrap_or_else(|| Vec::new(env))
}

pub fn has_role(env: &Env, role: Role, account: &Address) -> bool {
    holders(env, role).contains(account)
}

/// Returns `false` if the account already held the role.
pub fn grant(env: &Env, role: Role, account: &Address) -> bool {
    let mut accounts = holders(env, role);
    if accounts.contains(account) {
        return false;
    }
    accounts.push_back(account.clone());
    env.storage()
        .instance()
        .set(&AccessKey::RoleHolders(role), &accounts);

    true
}

/// Returns `false` if the account did not hold the role.
pub fn revoke(env: &Env, role: Role, account: &Address) -> bool {
    let mut accounts = holders(env, role);
    match accounts.first_index_of(account) {
        Some(index) => {
            accounts.remove(index);
            env.storage()
                .instance()
                .set(&AccessKey::RoleHolders(role), &accounts);
            true
        }
        None => false,
    }
}

/// Authenticates `caller` and checks it holds the role `operation` needs.
pub fn authorize<O: Capability>(
    env: &Env,
    caller: &Address,
    operation: O,
) -> Result<(), AccessError> {
    caller.require_auth();

    if has_role(env, operation.required_role(), caller) {
        Ok(())
    } else {
        Err(AccessError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use soroban_sdk::{contract, contractimpl, testutils::Address as _};

    #[derive(Clone, Copy)]
    enum Operation {
        Import,
        Close,
    }

    impl Capability for Operation {
        fn required_role(&self) -> Role {
            match self {
                Operation::Import => Role::Admin,
                Operation::Close => Role::RewardSystem,
            }
        }
    }

    #[contract]
    pub struct Harness;

    #[contractimpl]
    impl Harness {
        pub fn grant_role(env: Env, role: Role, account: Address) -> bool {
            grant(&env, role, &account)
        }

        pub fn import(env: Env, caller: Address) -> bool {
            authorize(&env, &caller, Operation::Import).is_ok()
        }

        pub fn close(env: Env, caller: Address) -> bool {
            authorize(&env, &caller, Operation::Close).is_ok()
        }
    }

    #[test]
    fn grant_and_revoke_roles() {
        let env = Env::default();
        let harness = env.register(Harness, ());
        let alice = Address::generate(&env);
        let bob = Address::generate(&env);

        env.as_contract(&harness, || {
            assert!(grant(&env, Role::Protocol, &alice));
            assert!(!grant(&env, Role::Protocol, &alice));
            assert!(grant(&env, Role::Protocol, &bob));
            assert_eq!(holders(&env, Role::Protocol).len(), 2);
            assert!(!has_role(&env, Role::Admin, &alice));

            assert!(revoke(&env, Role::Protocol, &alice));
            assert!(!revoke(&env, Role::Protocol, &alice));
            assert!(!has_role(&env, Role::Protocol, &alice));
            assert!(has_role(&env, Role::Protocol, &bob));
        });
    }

    #[test]
    fn authorize_checks_operation_role() {
        let env = Env::default();
        env.mock_all_auths();
        let harness = HarnessClient::new(&env, &env.register(Harness, ()));
        let admin = Address::generate(&env);
        let closer = Address::generate(&env);

        harness.grant_role(&Role::Admin, &admin);
        harness.grant_role(&Role::RewardSystem, &closer);

        // each call authenticates in its own invocation
        assert!(harness.import(&admin));
        assert!(!harness.import(&closer));
        assert!(harness.close(&closer));
        assert!(!harness.close(&admin));
    }

    #[test]
    fn authorize_requires_caller_signature() {
        let env = Env::default();
        let harness = HarnessClient::new(&env, &env.register(Harness, ()));
        let admin = Address::generate(&env);
        harness.grant_role(&Role::Admin, &admin);

        assert!(harness.try_import(&admin).is_err());
    }
}
