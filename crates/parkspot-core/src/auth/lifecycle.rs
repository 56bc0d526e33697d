use std::sync::{Arc, Mutex};

use tracing::info;

use super::session::Session;

/// Foreground state reported by the host application.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppState {
    Active,
    Inactive,
    Background,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    /// The session was not remembered, so its in-memory tokens were dropped.
    ClearedSessionTokens,
    /// The session is remembered and survives backgrounding.
    Retained,
    NoOp,
}

/// Logs the user out of session-only logins when the app leaves the
/// foreground.
pub struct LifecycleGuard {
    session: Arc<Session>,
    state: Mutex<AppState>,
}

impl LifecycleGuard {
    pub fn new(session: Arc<Session>) -> Self {
        Self {
            session,
            state: Mutex::new(AppState::Active),
        }
    }

    pub fn state(&self) -> AppState {
        *self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn on_state_change(&self, next: AppState) -> LifecycleAction {
        let previous = {
            let mut state = self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
            std::mem::replace(&mut *state, next)
        };

        let leaving_foreground =
            previous == AppState::Active && matches!(next, AppState::Inactive | AppState::Background);
        if !leaving_foreground {
            return LifecycleAction::NoOp;
        }

        if self.session.is_remembered() {
            LifecycleAction::Retained
        } else {
            self.session.clear_session_tokens();
            info!(?next, "Cleared session-only tokens on leaving foreground");
            LifecycleAction::ClearedSessionTokens
        }
    }
}
