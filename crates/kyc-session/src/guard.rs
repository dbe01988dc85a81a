//! Navigation guards.
//!
//! Two guards run before a route is entered:
//! - [`AuthGuard`] requires an authenticated session and sends everyone
//!   else to the login route, remembering where they were going.
//! - [`RoleGuard`] requires one of the route's declared roles and sends
//!   under-privileged users to the landing page, never to login.
//!
//! A denial is not an error, it is a [`Redirect`].

use kyc_model::Role;

use crate::config::SessionConfig;

/// Read access to the session facts the guards need.
pub trait AccessContext {
    /// Whether there is an authenticated, unexpired session.
    fn is_authenticated(&self) -> bool;

    /// Whether the session holds the named role.
    fn has_role(&self, role: &str) -> bool;

    /// Whether the session holds at least one of `roles`.
    fn has_any_role(&self, roles: &[Role]) -> bool {
        roles.iter().any(|r| self.has_role(r.as_str()))
    }
}

/// Why a guard refused entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyReason {
    /// No authenticated session.
    Unauthenticated,
    /// Authenticated but lacking every required role.
    Forbidden,
    /// No route matches the path.
    NotFound,
}

/// Where a refused navigation goes instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    /// Target route.
    pub to: String,
    /// Route to return to after logging in.
    pub return_to: Option<String>,
    /// Why entry was refused.
    pub reason: DenyReason,
}

impl Redirect {
    /// Renders the redirect as a URL, adding `returnUrl` when present.
    #[must_use]
    pub fn url(&self) -> String {
        match &self.return_to {
            Some(back) => format!("{}?returnUrl={}", self.to, urlencoding::encode(back)),
            None => self.to.clone(),
        }
    }
}

/// Outcome of a guard check.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Entry allowed.
    Allow,
    /// Entry refused.
    Redirect(Redirect),
}

impl GuardDecision {
    /// Checks if entry was allowed.
    #[must_use]
    pub const fn is_allowed(&self) -> bool {
        matches!(self, Self::Allow)
    }

    /// The redirect, if entry was refused.
    #[must_use]
    pub const fn redirect(&self) -> Option<&Redirect> {
        match self {
            Self::Allow => None,
            Self::Redirect(r) => Some(r),
        }
    }
}

/// Requires an authenticated session.
#[derive(Debug, Clone)]
pub struct AuthGuard {
    login_route: String,
}

impl AuthGuard {
    /// Creates the guard from the session configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            login_route: config.login_route.clone(),
        }
    }

    /// Checks entry to `attempted`.
    pub fn check(&self, ctx: &dyn AccessContext, attempted: &str) -> GuardDecision {
        if ctx.is_authenticated() {
            return GuardDecision::Allow;
        }
        tracing::debug!(route = attempted, "Not authenticated, redirecting to login");
        GuardDecision::Redirect(Redirect {
            to: self.login_route.clone(),
            return_to: Some(attempted.to_string()).filter(|p| *p != self.login_route),
            reason: DenyReason::Unauthenticated,
        })
    }
}

/// Requires one of a route's declared roles.
///
/// Authentication is checked again here rather than assumed from an earlier
/// [`AuthGuard`].
#[derive(Debug, Clone)]
pub struct RoleGuard {
    auth: AuthGuard,
    landing_route: String,
}

impl RoleGuard {
    /// Creates the guard from the session configuration.
    #[must_use]
    pub fn new(config: &SessionConfig) -> Self {
        Self {
            auth: AuthGuard::new(config),
            landing_route: config.landing_route.clone(),
        }
    }

    /// Checks entry to `attempted`, which declares `required` roles.
    ///
    /// An empty `required` set admits any authenticated session.
    pub fn check(
        &self,
        ctx: &dyn AccessContext,
        required: &[Role],
        attempted: &str,
    ) -> GuardDecision {
        let auth = self.auth.check(ctx, attempted);
        if !auth.is_allowed() {
            return auth;
        }
        if required.is_empty() || ctx.has_any_role(required) {
            return GuardDecision::Allow;
        }
        tracing::debug!(
            route = attempted,
            required = ?required,
            "Missing required role, redirecting to landing page"
        );
        GuardDecision::Redirect(Redirect {
            to: self.landing_route.clone(),
            return_to: None,
            reason: DenyReason::Forbidden,
        })
    }
}
