use tracing::debug;

use roster_core::{Action, AppError, Decision, authorize};
use roster_models::Member;

use crate::metrics::track_authorization_denied;

/// Runs the authorization policy over stored memberships, logging and counting
/// any denial before converting it into the error taxonomy.
pub fn enforce(
    action: Action,
    actor: Option<&Member>,
    target: Option<&Member>,
) -> Result<Decision, AppError> {
    authorize(action, actor.map(Member::seat), target.map(Member::seat)).map_err(|denial| {
        debug!(
            action = action.label(),
            reason = denial.reason(),
            %denial,
            "authorization denied"
        );
        track_authorization_denied(action.label(), denial.reason());
        denial.into()
    })
}
