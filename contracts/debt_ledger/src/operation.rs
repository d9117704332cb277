use synthex::access::{Capability, Role};

/// Every privileged entry point of the ledger.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    GrantRole,
    RevokeRole,
    PushDebt,
    UpdateUserDebt,
    UpdateDebt,
    BuildDebt,
    BurnDebt,
    SetLastCloseAt,
    ImportDebtData,
}

impl Capability for Operation {
    fn required_role(&self) -> Role {
        match self {
            Operation::GrantRole | Operation::RevokeRole | Operation::ImportDebtData => Role::Admin,
            Operation::PushDebt
            | Operation::UpdateUserDebt
            | Operation::UpdateDebt
            | Operation::BuildDebt
            | Operation::BurnDebt => Role::Protocol,
            Operation::SetLastCloseAt => Role::RewardSystem,
        }
    }
}
