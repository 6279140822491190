//! Authentication and active-window state shared between the host and the router.

use crate::window::WindowKind;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug)]
struct SessionState {
    is_authenticated: bool,
    active_window: WindowKind,
}

/// A consistent, copyable view of the session at one instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub is_authenticated: bool,
    pub active_window: WindowKind,
}

/// Owner handle for the single session state of the application.
///
/// Fields are private: the only writers are the three event methods, so every
/// transition goes through one place and shows up in the log.
#[derive(Debug, Clone)]
pub struct SessionHandle {
    state: Arc<RwLock<SessionState>>,
}

impl SessionHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(SessionState {
                is_authenticated: false,
                active_window: WindowKind::login_equivalent(),
            })),
        }
    }

    pub fn on_login_succeeded(&self) {
        let mut state = self.state.write();
        state.is_authenticated = true;
        tracing::info!(window = %state.active_window, "Session authenticated");
    }

    /// Clears authentication and forces the active window back to login.
    pub fn on_logout(&self) {
        let mut state = self.state.write();
        state.is_authenticated = false;
        state.active_window = WindowKind::login_equivalent();
        tracing::info!("Session logged out");
    }

    /// Window tracking is independent of authentication.
    pub fn on_window_activated(&self, kind: WindowKind) {
        let mut state = self.state.write();
        if state.active_window != kind {
            tracing::debug!(from = %state.active_window, to = %kind, "Active window changed");
        }
        state.active_window = kind;
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        let state = self.state.read();
        SessionSnapshot {
            is_authenticated: state.is_authenticated,
            active_window: state.active_window,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state.read().is_authenticated
    }

    pub fn active_window(&self) -> WindowKind {
        self.state.read().active_window
    }
}

impl Default for SessionHandle {
    fn default() -> Self {
        Self::new()
    }
}
