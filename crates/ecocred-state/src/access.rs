use ecocred_core::error::EcoCredError;
use ecocred_core::event::Event;
use ecocred_core::types::{Address, Role};
use tracing::info;

use crate::staged::StagedState;
use crate::view::LedgerView;

/// Fail unless `caller` holds one of `roles`.
pub(crate) fn require_any_role(
    st: &StagedState<'_>,
    caller: &Address,
    roles: &[Role],
    what: &str,
) -> Result<(), EcoCredError> {
    let held = st.role_of(caller)?;
    if roles.contains(&held) {
        Ok(())
    } else {
        Err(EcoCredError::Unauthorized(format!("{what} requires {roles:?}, {caller} holds {held}")))
    }
}

/// ADMIN-only. Replaces whatever role `account` held before.
pub fn grant_role(st: &mut StagedState<'_>, caller: &Address, account: &Address, role: Role) -> Result<(), EcoCredError> {
    require_any_role(st, caller, &[Role::Admin], "granting roles")?;
    if account.is_zero() {
        return Err(EcoCredError::InvalidArgument("cannot grant a role to the null address".into()));
    }
    if role == Role::None {
        return Err(EcoCredError::InvalidArgument("use RevokeRole to clear a role".into()));
    }
    st.put_role(account, role)?;
    info!(%account, %role, granted_by = %caller, "role granted");
    st.emit(Event::RoleGranted { account: *account, role, granted_by: *caller });
    Ok(())
}

pub fn revoke_role(st: &mut StagedState<'_>, caller: &Address, account: &Address) -> Result<(), EcoCredError> {
    require_any_role(st, caller, &[Role::Admin], "revoking roles")?;
    let previous = st.role_of(account)?;
    if previous == Role::None {
        return Err(EcoCredError::not_found("role assignment", account));
    }
    st.put_role(account, Role::None)?;
    info!(%account, %previous, revoked_by = %caller, "role revoked");
    st.emit(Event::RoleRevoked { account: *account, previous, revoked_by: *caller });
    Ok(())
}
