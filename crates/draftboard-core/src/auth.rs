// Turn authorization: who may pick right now.

use serde::{Deserialize, Serialize};

use crate::state::{DraftState, DraftStatus};

/// Authorization policy for mutating operations.
///
/// The privileged identity is configuration, not a baked-in default.
/// `admin: None` means no override exists and only the on-the-clock
/// assignee can pick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthPolicy {
    pub admin: Option<String>,
}

impl AuthPolicy {
    pub fn is_admin(&self, caller: &str) -> bool {
        self.admin.as_deref() == Some(caller)
    }
}

/// Whether `caller` may make the current pick.
///
/// True only when the draft is in progress, a pick slot remains, and the
/// on-the-clock team's assignee is the caller (or the caller is the
/// configured admin). An unclaimed team on the clock means nobody but the
/// admin can act. Used both to drive presentation and to gate the actual
/// mutation.
pub fn can_act(state: &DraftState, caller: &str, policy: &AuthPolicy) -> bool {
    if state.status != DraftStatus::InProgress {
        return false;
    }
    let Some(team) = state.on_the_clock() else {
        return false;
    };
    if policy.is_admin(caller) {
        return true;
    }
    team.assignee.as_deref() == Some(caller)
}
