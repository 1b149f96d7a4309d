use std::collections::BTreeSet;

use tracing::debug;

use cupid_types::models::{Role, Session};

pub type RoleSet = BTreeSet<Role>;

pub const DEFAULT_LOGIN_PATH: &str = "/admin-login";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    RedirectUnauthenticated(DenyReason),
}

/// Why a redirect happened. Both reasons send the user to the same login
/// page; the distinction is only kept for logs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    NotSignedIn,
    RoleNotPermitted(Role),
}

/// Pure access decision. An empty `required` set admits any signed-in user
/// but still turns away anonymous sessions.
pub fn evaluate(required: &RoleSet, session: &Session) -> Decision {
    let Some(user) = session.user() else {
        return Decision::RedirectUnauthenticated(DenyReason::NotSignedIn);
    };
    if required.is_empty() || required.contains(&user.role) {
        Decision::Allow
    } else {
        Decision::RedirectUnauthenticated(DenyReason::RoleNotPermitted(user.role.clone()))
    }
}

/// Wraps a protected view: required roles plus where to send the user when
/// they are turned away.
#[derive(Debug, Clone)]
pub struct AccessGuard {
    required: RoleSet,
    login_path: String,
}

impl AccessGuard {
    pub fn new(required: impl IntoIterator<Item = Role>, login_path: impl Into<String>) -> Self {
        Self {
            required: required.into_iter().collect(),
            login_path: login_path.into(),
        }
    }

    pub fn admin_only(login_path: impl Into<String>) -> Self {
        Self::new([Role::Admin], login_path)
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn evaluate(&self, session: &Session) -> Decision {
        let decision = evaluate(&self.required, session);
        if let Decision::RedirectUnauthenticated(reason) = &decision {
            debug!("Guard redirecting to {}: {:?}", self.login_path, reason);
        }
        decision
    }
}
