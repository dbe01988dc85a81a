//! Session configuration.

use serde::{Deserialize, Serialize};

/// Default login entry point.
pub const DEFAULT_LOGIN_ROUTE: &str = "/login";

/// Default landing page for authenticated users.
pub const DEFAULT_LANDING_ROUTE: &str = "/onboarders";

/// Endpoints that must never carry the bearer token.
pub const DEFAULT_PUBLIC_ENDPOINTS: [&str; 2] = ["/auth/login", "/auth/register"];

/// Session and navigation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Route that unauthenticated navigation is sent to.
    #[serde(default = "default_login_route")]
    pub login_route: String,

    /// Route that under-privileged navigation is sent to.
    #[serde(default = "default_landing_route")]
    pub landing_route: String,

    /// URL fragments of requests that are sent without the bearer token.
    #[serde(default = "default_public_endpoints")]
    pub public_endpoints: Vec<String>,
}

fn default_login_route() -> String {
    DEFAULT_LOGIN_ROUTE.to_string()
}

fn default_landing_route() -> String {
    DEFAULT_LANDING_ROUTE.to_string()
}

fn default_public_endpoints() -> Vec<String> {
    DEFAULT_PUBLIC_ENDPOINTS.iter().map(|s| (*s).to_string()).collect()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            login_route: default_login_route(),
            landing_route: default_landing_route(),
            public_endpoints: default_public_endpoints(),
        }
    }
}

impl SessionConfig {
    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Config` when a route is not absolute or the
    /// login and landing routes coincide.
    pub fn validate(&self) -> crate::SessionResult<()> {
        for (name, route) in [
            ("login_route", &self.login_route),
            ("landing_route", &self.landing_route),
        ] {
            if !route.starts_with('/') {
                return Err(crate::SessionError::Config(format!(
                    "{name} must start with '/': {route}"
                )));
            }
        }
        if self.login_route == self.landing_route {
            return Err(crate::SessionError::Config(
                "login_route and landing_route must differ".to_string(),
            ));
        }
        if self.public_endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(crate::SessionError::Config(
                "public_endpoints must not contain empty entries".to_string(),
            ));
        }
        Ok(())
    }
}
