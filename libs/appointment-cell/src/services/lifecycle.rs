use tracing::{debug, warn};

use shared_models::error::AppError;

use crate::models::AppointmentStatus;

/// Appointment status state machine.
///
/// `pending` moves to `confirmed` or `cancelled`, `confirmed` moves to
/// `completed` or `cancelled`; `completed` and `cancelled` are terminal.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppointmentLifecycleService;

impl AppointmentLifecycleService {
    pub fn new() -> Self {
        Self
    }

    /// Validate that a status transition is allowed
    pub fn validate_status_transition(
        &self,
        current_status: AppointmentStatus,
        new_status: AppointmentStatus,
    ) -> Result<(), AppError> {
        debug!("Validating status transition from {} to {}", current_status, new_status);

        if !self.get_valid_transitions(current_status).contains(&new_status) {
            warn!("Invalid status transition attempted: {} -> {}", current_status, new_status);
            return Err(AppError::InvalidTransition {
                from: current_status.to_string(),
                to: new_status.to_string(),
            });
        }

        Ok(())
    }

    pub fn get_valid_transitions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            AppointmentStatus::Confirmed => vec![AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            AppointmentStatus::Completed | AppointmentStatus::Cancelled => vec![],
        }
    }

    /// Actions the doctor may trigger from the dashboard. Completion is
    /// left to the backend, so only pending appointments offer any.
    pub fn client_actions(&self, current_status: AppointmentStatus) -> Vec<AppointmentStatus> {
        match current_status {
            AppointmentStatus::Pending => vec![AppointmentStatus::Confirmed, AppointmentStatus::Cancelled],
            _ => vec![],
        }
    }

    pub fn is_terminal(&self, status: AppointmentStatus) -> bool {
        self.get_valid_transitions(status).is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_transition_table() {
        let lifecycle = AppointmentLifecycleService::new();
        use AppointmentStatus::*;

        let allowed = [(Pending, Confirmed), (Pending, Cancelled), (Confirmed, Completed), (Confirmed, Cancelled)];

        for from in AppointmentStatus::ALL {
            for to in AppointmentStatus::ALL {
                let result = lifecycle.validate_status_transition(from, to);
                if allowed.contains(&(from, to)) {
                    assert!(result.is_ok(), "{} -> {} should be allowed", from, to);
                } else {
                    assert_matches!(result, Err(AppError::InvalidTransition { .. }));
                }
            }
        }
    }

    #[test]
    fn test_terminal_states() {
        let lifecycle = AppointmentLifecycleService::new();
        assert!(lifecycle.is_terminal(AppointmentStatus::Completed));
        assert!(lifecycle.is_terminal(AppointmentStatus::Cancelled));
        assert!(!lifecycle.is_terminal(AppointmentStatus::Confirmed));
    }

    #[test]
    fn test_client_actions_only_from_pending() {
        let lifecycle = AppointmentLifecycleService::new();
        assert_eq!(
            lifecycle.client_actions(AppointmentStatus::Pending),
            vec![AppointmentStatus::Confirmed, AppointmentStatus::Cancelled]
        );
        assert!(lifecycle.client_actions(AppointmentStatus::Confirmed).is_empty());
    }
}
