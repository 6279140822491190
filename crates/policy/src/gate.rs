//! Authorization decisions over the session state.
//!
//! The decision functions are pure: they read a `SessionSnapshot` and a
//! `NavigationTable` and never mutate anything. `SecurityGate` pairs them with
//! the live session for callers that do not hold a snapshot of their own.

use crate::navigation::NavigationTable;
use crate::session::{SessionHandle, SessionSnapshot};
use crate::window::WindowKind;
use std::fmt;

/// Anything the gate can authorize: it has a name and may require a login.
pub trait Protected {
    fn label(&self) -> &str;
    fn requires_auth(&self) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    NotAuthenticated,
    PostLoginTarget { to: WindowKind },
    NotAdjacent { from: WindowKind, to: WindowKind },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::NotAuthenticated => f.write_str("login required"),
            DenyReason::PostLoginTarget { to } => write!(f, "{} requires login", to),
            DenyReason::NotAdjacent { from, to } => {
                write!(f, "no navigation edge {} -> {}", from, to)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allowed,
    Denied(DenyReason),
}

impl GateDecision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, GateDecision::Allowed)
    }
}

pub fn decide_command(requires_auth: bool, session: &SessionSnapshot) -> GateDecision {
    if !requires_auth || session.is_authenticated {
        GateDecision::Allowed
    } else {
        GateDecision::Denied(DenyReason::NotAuthenticated)
    }
}

pub fn decide_navigation(
    table: &NavigationTable,
    session: &SessionSnapshot,
    from: WindowKind,
    to: WindowKind,
) -> GateDecision {
    if to.is_post_login() {
        return if session.is_authenticated {
            GateDecision::Allowed
        } else {
            GateDecision::Denied(DenyReason::PostLoginTarget { to })
        };
    }

    if from == to || table.contains(from, to) {
        GateDecision::Allowed
    } else {
        GateDecision::Denied(DenyReason::NotAdjacent { from, to })
    }
}

pub struct SecurityGate {
    session: SessionHandle,
    navigation: NavigationTable,
}

impl SecurityGate {
    pub fn new(session: SessionHandle, navigation: NavigationTable) -> Self {
        Self {
            session,
            navigation,
        }
    }

    pub fn session(&self) -> &SessionHandle {
        &self.session
    }

    pub fn navigation(&self) -> &NavigationTable {
        &self.navigation
    }

    pub fn authorize<C: Protected + ?Sized>(&self, command: &C) -> GateDecision {
        self.authorize_at(command, &self.session.snapshot())
    }

    /// Like `authorize`, evaluated against a snapshot the caller already holds.
    pub fn authorize_at<C: Protected + ?Sized>(
        &self,
        command: &C,
        session: &SessionSnapshot,
    ) -> GateDecision {
        let decision = decide_command(command.requires_auth(), session);
        if let GateDecision::Denied(reason) = decision {
            tracing::warn!(
                target: "voxgate::security",
                command = command.label(),
                %reason,
                "Command blocked"
            );
        }
        decision
    }

    pub fn authorize_navigation(&self, from: WindowKind, to: WindowKind) -> GateDecision {
        self.authorize_navigation_at(&self.session.snapshot(), from, to)
    }

    pub fn authorize_navigation_at(
        &self,
        session: &SessionSnapshot,
        from: WindowKind,
        to: WindowKind,
    ) -> GateDecision {
        let decision = decide_navigation(&self.navigation, session, from, to);
        if let GateDecision::Denied(reason) = decision {
            tracing::warn!(
                target: "voxgate::security",
                %from,
                %to,
                %reason,
                "Navigation blocked"
            );
        }
        decision
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Cmd {
        auth: bool,
    }

    impl Protected for Cmd {
        fn label(&self) -> &str {
            "test"
        }

        fn requires_auth(&self) -> bool {
            self.auth
        }
    }

    fn gate() -> SecurityGate {
        SecurityGate::new(SessionHandle::new(), NavigationTable::default())
    }

    #[test]
    fn test_public_command_always_allowed() {
        let gate = gate();
        assert!(gate.authorize(&Cmd { auth: false }).is_allowed());
        gate.session().on_login_succeeded();
        assert!(gate.authorize(&Cmd { auth: false }).is_allowed());
    }

    #[test]
    fn test_protected_command_follows_login() {
        let gate = gate();
        let cmd = Cmd { auth: true };
        assert_eq!(
            gate.authorize(&cmd),
            GateDecision::Denied(DenyReason::NotAuthenticated)
        );

        gate.session().on_login_succeeded();
        assert!(gate.authorize(&cmd).is_allowed());

        gate.session().on_logout();
        assert!(!gate.authorize(&cmd).is_allowed());
    }

    #[test]
    fn test_adjacency_declared_both_ways() {
        let gate = gate();
        assert!(gate
            .authorize_navigation(WindowKind::Login, WindowKind::SignUp)
            .is_allowed());
        assert!(gate
            .authorize_navigation(WindowKind::SignUp, WindowKind::Login)
            .is_allowed());
    }

    #[test]
    fn test_post_login_target_needs_auth() {
        let gate = gate();
        assert_eq!(
            gate.authorize_navigation(WindowKind::Login, WindowKind::Dashboard),
            GateDecision::Denied(DenyReason::PostLoginTarget {
                to: WindowKind::Dashboard
            })
        );

        gate.session().on_login_succeeded();
        assert!(gate
            .authorize_navigation(WindowKind::Login, WindowKind::Dashboard)
            .is_allowed());
    }

    #[test]
    fn test_post_login_rule_overrides_table() {
        let mut table = NavigationTable::empty();
        table.allow(WindowKind::Login, WindowKind::Settings);
        let gate = SecurityGate::new(SessionHandle::new(), table);
        assert!(!gate
            .authorize_navigation(WindowKind::Login, WindowKind::Settings)
            .is_allowed());
    }

    #[test]
    fn test_same_window_is_noop_allowed() {
        let gate = gate();
        assert!(gate
            .authorize_navigation(WindowKind::ForgotPassword, WindowKind::ForgotPassword)
            .is_allowed());
    }

    #[test]
    fn test_undeclared_pre_login_edge_denied() {
        let gate = gate();
        assert_eq!(
            gate.authorize_navigation(WindowKind::SignUp, WindowKind::ForgotPassword),
            GateDecision::Denied(DenyReason::NotAdjacent {
                from: WindowKind::SignUp,
                to: WindowKind::ForgotPassword
            })
        );
    }
}
