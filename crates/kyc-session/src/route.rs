//! Console routing table.
//!
//! Each route declares who may enter it. [`Router::navigate`] resolves a
//! path against the table and runs the guards in order: authentication
//! first, then roles.

use kyc_model::Role;

use crate::config::SessionConfig;
use crate::guard::{AccessContext, AuthGuard, DenyReason, GuardDecision, Redirect, RoleGuard};

/// Who may enter a route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Access {
    /// Anyone.
    Public,
    /// Authenticated sessions holding one of `roles`; an empty list admits
    /// every authenticated session.
    Authenticated {
        /// Required roles (any one suffices).
        roles: Vec<Role>,
    },
}

impl Access {
    /// Any authenticated session.
    #[must_use]
    pub const fn authenticated() -> Self {
        Self::Authenticated { roles: Vec::new() }
    }

    /// Authenticated sessions holding one of `roles`.
    #[must_use]
    pub fn roles(roles: &[Role]) -> Self {
        Self::Authenticated {
            roles: roles.to_vec(),
        }
    }
}

/// A console route.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Absolute path, without trailing slash.
    pub path: &'static str,
    /// Human-readable title.
    pub title: &'static str,
    /// Access rule.
    pub access: Access,
}

/// Ordered set of routes.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    /// Creates a table from routes.
    #[must_use]
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// Routes of the onboarding console.
    #[must_use]
    pub fn console() -> Self {
        let admins = [Role::SuperAdmin, Role::Admin];
        Self::new(vec![
            Route {
                path: "/login",
                title: "Log in",
                access: Access::Public,
            },
            Route {
                path: "/register",
                title: "Register",
                access: Access::Public,
            },
            Route {
                path: "/forgot-password",
                title: "Forgot password",
                access: Access::Public,
            },
            Route {
                path: "/reset-password",
                title: "Reset password",
                access: Access::Public,
            },
            Route {
                path: "/onboarders",
                title: "Onboarding review",
                access: Access::authenticated(),
            },
            Route {
                path: "/admin",
                title: "Administration",
                access: Access::roles(&admins),
            },
            Route {
                path: "/admin/users",
                title: "Users",
                access: Access::roles(&admins),
            },
            Route {
                path: "/admin/empresas",
                title: "Companies",
                access: Access::roles(&[Role::SuperAdmin]),
            },
        ])
    }

    /// Finds the route for a normalized path.
    #[must_use]
    pub fn find(&self, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.path == path)
    }

    /// All routes, in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Route> {
        self.routes.iter()
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::console()
    }
}

/// Result of resolving a navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
    /// The route may be entered.
    Enter {
        /// Normalized path of the entered route.
        path: String,
    },
    /// The navigation goes elsewhere.
    Redirect(Redirect),
}

/// Resolves paths against a [`RouteTable`] and applies the guards.
#[derive(Debug, Clone)]
pub struct Router {
    table: RouteTable,
    auth: AuthGuard,
    role: RoleGuard,
    login_route: String,
    landing_route: String,
}

impl Router {
    /// Creates a router.
    #[must_use]
    pub fn new(table: RouteTable, config: &SessionConfig) -> Self {
        Self {
            table,
            auth: AuthGuard::new(config),
            role: RoleGuard::new(config),
            login_route: config.login_route.clone(),
            landing_route: config.landing_route.clone(),
        }
    }

    /// Routing table.
    #[must_use]
    pub const fn table(&self) -> &RouteTable {
        &self.table
    }

    /// Resolves a navigation to `target`, which may carry a query string.
    ///
    /// The empty path and `/` lead to the landing route. Unknown paths lead
    /// to the login route.
    pub fn navigate(&self, ctx: &dyn AccessContext, target: &str) -> Navigation {
        let path = normalize(target);
        let (path, attempted) = if path == "/" {
            (self.landing_route.as_str(), self.landing_route.as_str())
        } else {
            (path, target)
        };

        let Some(route) = self.table.find(path) else {
            tracing::debug!(path, "No such route");
            return Navigation::Redirect(Redirect {
                to: self.login_route.clone(),
                return_to: None,
                reason: DenyReason::NotFound,
            });
        };

        let Access::Authenticated { roles } = &route.access else {
            return Navigation::Enter {
                path: path.to_string(),
            };
        };

        if let GuardDecision::Redirect(redirect) = self.auth.check(ctx, attempted) {
            return Navigation::Redirect(redirect);
        }
        match self.role.check(ctx, roles, attempted) {
            GuardDecision::Allow => Navigation::Enter {
                path: path.to_string(),
            },
            GuardDecision::Redirect(redirect) => Navigation::Redirect(redirect),
        }
    }
}

/// Strips the query, fragment and trailing slash from a path.
fn normalize(target: &str) -> &str {
    let end = target.find(['?', '#']).unwrap_or(target.len());
    let path = target[..end].trim();
    let path = path.trim_end_matches('/');
    if path.is_empty() {
        "/"
    } else {
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Ctx(bool, &'static [&'static str]);

    impl AccessContext for Ctx {
        fn is_authenticated(&self) -> bool {
            self.0
        }

        fn has_role(&self, role: &str) -> bool {
            self.1.contains(&role)
        }
    }

    fn router() -> Router {
        Router::new(RouteTable::console(), &SessionConfig::default())
    }

    fn redirect(nav: Navigation) -> Redirect {
        match nav {
            Navigation::Redirect(r) => r,
            Navigation::Enter { path } => panic!("entered {path}"),
        }
    }

    #[test]
    fn normalizes_paths() {
        assert_eq!(normalize("/admin/users/?page=2"), "/admin/users");
        assert_eq!(normalize("/onboarders#top"), "/onboarders");
        assert_eq!(normalize(""), "/");
        assert_eq!(normalize("/"), "/");
    }

    #[test]
    fn public_routes_need_nothing() {
        let nav = router().navigate(&Ctx(false, &[]), "/reset-password?token=abc");
        assert_eq!(
            nav,
            Navigation::Enter {
                path: "/reset-password".to_string()
            }
        );
    }

    #[test]
    fn root_leads_to_landing() {
        let nav = router().navigate(&Ctx(true, &["USER"]), "/");
        assert_eq!(
            nav,
            Navigation::Enter {
                path: "/onboarders".to_string()
            }
        );

        let r = redirect(router().navigate(&Ctx(false, &[]), ""));
        assert_eq!(r.to, "/login");
        assert_eq!(r.return_to.as_deref(), Some("/onboarders"));
    }

    #[test]
    fn protected_route_keeps_full_return_target() {
        let r = redirect(router().navigate(&Ctx(false, &[]), "/onboarders?estado=PENDIENTE"));
        assert_eq!(r.reason, DenyReason::Unauthenticated);
        assert_eq!(r.return_to.as_deref(), Some("/onboarders?estado=PENDIENTE"));
    }

    /// Counts how often authentication is asked for.
    #[derive(Default)]
    struct Counting(std::cell::Cell<u32>);

    impl AccessContext for Counting {
        fn is_authenticated(&self) -> bool {
            self.0.set(self.0.get() + 1);
            false
        }

        fn has_role(&self, _: &str) -> bool {
            false
        }
    }

    #[test]
    fn unauthenticated_visit_stops_at_the_first_guard() {
        let ctx = Counting::default();
        let r = redirect(router().navigate(&ctx, "/admin/users"));
        assert_eq!(r.reason, DenyReason::Unauthenticated);
        assert_eq!(ctx.0.get(), 1);
    }

    #[test]
    fn company_admin_is_superadmin_only() {
        let r = redirect(router().navigate(&Ctx(true, &["ADMIN"]), "/admin/empresas"));
        assert_eq!(r.to, "/onboarders");
        assert_eq!(r.reason, DenyReason::Forbidden);

        let nav = router().navigate(&Ctx(true, &["ADMIN"]), "/admin/users");
        assert!(matches!(nav, Navigation::Enter { .. }));
    }

    #[test]
    fn unknown_paths_go_to_login() {
        let r = redirect(router().navigate(&Ctx(true, &["SUPERADMIN"]), "/nope"));
        assert_eq!(r.to, "/login");
        assert_eq!(r.reason, DenyReason::NotFound);
        assert!(r.return_to.is_none());
    }
}
