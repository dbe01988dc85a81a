//! Observable session state.
//!
//! [`SessionState`] owns the in-memory session and is the only thing that
//! mutates it, through [`SessionState::login`] and [`SessionState::logout`].
//! Consumers read a [`SessionSnapshot`] or subscribe to changes; every
//! change replaces the whole snapshot at once, so a subscriber never sees a
//! user without the matching roles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use kyc_model::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    Role,
};

use crate::api::AuthApi;
use crate::claims::{CurrentUser, TokenClaims};
use crate::config::SessionConfig;
use crate::error::{SessionError, SessionResult};
use crate::guard::AccessContext;
use crate::store::SessionStore;
use crate::token;

/// Moves the user to another route.
pub trait Navigator: Send + Sync {
    /// Navigates to `path`.
    fn navigate(&self, path: &str);
}

/// Navigator that goes nowhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopNavigator;

impl Navigator for NoopNavigator {
    fn navigate(&self, path: &str) {
        debug!(path, "Navigation requested");
    }
}

/// Point-in-time view of the session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionSnapshot {
    /// Logged-in user, if any.
    pub user: Option<CurrentUser>,
    /// Whether a valid token backed this snapshot when it was taken.
    pub authenticated: bool,
    /// Role names resolved from the token.
    pub roles: Vec<String>,
    /// Token expiry (Unix seconds).
    pub expires_at: Option<i64>,
}

impl SessionSnapshot {
    fn from_claims(user: Option<CurrentUser>, claims: Option<TokenClaims>, now: i64) -> Self {
        match claims.filter(|c| !c.is_expired_at(now)) {
            Some(claims) => Self {
                user,
                authenticated: true,
                roles: claims.roles,
                expires_at: claims.exp,
            },
            None => Self {
                user,
                ..Self::default()
            },
        }
    }

    /// Checks if the session is authenticated and unexpired at `now`.
    #[must_use]
    pub fn is_authenticated_at(&self, now: i64) -> bool {
        self.authenticated && self.expires_at.is_some_and(|exp| now < exp)
    }
}

impl AccessContext for SessionSnapshot {
    fn is_authenticated(&self) -> bool {
        self.is_authenticated_at(chrono::Utc::now().timestamp())
    }

    fn has_role(&self, role: &str) -> bool {
        self.roles.iter().any(|r| r == role)
    }
}

/// Clears the in-flight flag when the login attempt ends, however it ends.
struct LoginSlot<'a>(&'a AtomicBool);

impl<'a> LoginSlot<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoginSlot<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Snapshot described by what the store holds right now.
fn stored_snapshot(store: &SessionStore) -> SessionSnapshot {
    let claims = store.token().as_deref().and_then(token::decode_claims);
    SessionSnapshot::from_claims(store.user(), claims, chrono::Utc::now().timestamp())
}

/// The session of this process.
pub struct SessionState {
    api: Arc<dyn AuthApi>,
    store: SessionStore,
    navigator: Arc<dyn Navigator>,
    config: SessionConfig,
    tx: watch::Sender<SessionSnapshot>,
    login_in_flight: AtomicBool,
}

impl std::fmt::Debug for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionState")
            .field("snapshot", &*self.tx.borrow())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionState {
    /// Restores the session from the store.
    ///
    /// An absent, malformed or expired token yields an unauthenticated
    /// session. The cached user is kept either way so it can still be shown.
    pub fn new(
        api: Arc<dyn AuthApi>,
        store: SessionStore,
        navigator: Arc<dyn Navigator>,
        config: SessionConfig,
    ) -> Self {
        let snapshot = stored_snapshot(&store);
        debug!(
            authenticated = snapshot.authenticated,
            roles = ?snapshot.roles,
            "Session restored"
        );
        let (tx, _) = watch::channel(snapshot);
        Self {
            api,
            store,
            navigator,
            config,
            tx,
            login_in_flight: AtomicBool::new(false),
        }
    }

    /// Subscribes to session changes.
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.tx.subscribe()
    }

    /// Current snapshot.
    pub fn snapshot(&self) -> SessionSnapshot {
        self.tx.borrow().clone()
    }

    /// Session configuration.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Logged-in user, if any.
    pub fn current_user(&self) -> Option<CurrentUser> {
        self.tx.borrow().user.clone()
    }

    /// Checks if there is an authenticated, unexpired session.
    pub fn is_authenticated(&self) -> bool {
        self.tx.borrow().is_authenticated()
    }

    /// Checks for a role by name, reading the resolved role list.
    pub fn has_role(&self, role: &str) -> bool {
        self.tx.borrow().has_role(role)
    }

    /// Resolved role names.
    pub fn roles(&self) -> Vec<String> {
        self.tx.borrow().roles.clone()
    }

    /// Checks if the session holds any of `roles`.
    pub fn has_any_role(&self, roles: &[Role]) -> bool {
        AccessContext::has_any_role(self, roles)
    }

    /// Checks for the `ADMIN` or `SUPERADMIN` role.
    pub fn is_admin(&self) -> bool {
        self.has_any_role(&[Role::Admin, Role::SuperAdmin])
    }

    /// Checks for the `SUPERADMIN` role.
    pub fn is_super_admin(&self) -> bool {
        self.has_any_role(&[Role::SuperAdmin])
    }

    /// Raw stored token, for attaching to requests.
    pub fn token(&self) -> Option<String> {
        self.store.token()
    }

    /// Company RUC of the session.
    pub fn company_id(&self) -> Option<String> {
        token::company_id(self.token().as_deref(), self.tx.borrow().user.as_ref())
    }

    /// Display name of the session.
    pub fn display_name(&self) -> Option<String> {
        token::display_name(self.token().as_deref(), self.tx.borrow().user.as_ref())
    }

    /// Logs in and replaces the session.
    ///
    /// When the API call fails or returns no usable token, the previous
    /// session is left as it was.
    ///
    /// # Errors
    ///
    /// - `SessionError::LoginInProgress` if another login is still running
    /// - `SessionError::Api` / `SessionError::Http` if the API call fails
    /// - `SessionError::UnusableToken` if the response has no valid token
    /// - `SessionError::Storage` if the session cannot be persisted
    pub async fn login(&self, credentials: &LoginRequest) -> SessionResult<CurrentUser> {
        let _slot = LoginSlot::acquire(&self.login_in_flight).ok_or_else(|| {
            warn!(email = %credentials.email, "Login already in progress");
            SessionError::LoginInProgress
        })?;

        let response = self.api.login(credentials).await.map_err(|e| {
            warn!(email = %credentials.email, error = %e, "Login failed");
            e
        })?;

        let raw = response
            .token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .ok_or(SessionError::UnusableToken)?;
        let claims = token::decode_claims(raw)
            .filter(|c| !c.is_expired())
            .ok_or(SessionError::UnusableToken)?;

        let user = CurrentUser {
            id: response.id,
            email: response.email,
            nombre: claims.nombre.clone(),
            roles: Some(claims.roles.clone()),
            empresa_ruc: claims.empresa_ruc.clone(),
        };

        if let Err(e) = self.store.replace(raw, &user) {
            warn!(email = %user.email, error = %e, "Failed to persist session");
            self.resync();
            return Err(e);
        }

        self.tx.send_replace(SessionSnapshot {
            user: Some(user.clone()),
            authenticated: true,
            roles: claims.roles,
            expires_at: claims.exp,
        });
        info!(user_id = user.id, email = %user.email, "Logged in");
        Ok(user)
    }

    /// Republishes the session from the store if the two disagree. Only
    /// needed after a store write failed midway.
    fn resync(&self) {
        let stored = stored_snapshot(&self.store);
        self.tx.send_if_modified(|current| {
            if *current == stored {
                false
            } else {
                *current = stored;
                true
            }
        });
    }

    /// Ends the session and navigates to the login route. Never fails.
    pub fn logout(&self) {
        self.store.clear();
        let previous = self.tx.send_replace(SessionSnapshot::default());
        if let Some(user) = previous.user {
            info!(user_id = user.id, "Logged out");
        }
        self.navigator.navigate(&self.config.login_route);
    }

    /// Registers a new account. The current session is not touched.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn register(&self, request: &RegisterRequest) -> SessionResult<AuthResponse> {
        let response = self.api.register(request).await?;
        info!(user_id = response.id, email = %response.email, "Account registered");
        Ok(response)
    }

    /// Requests a password reset e-mail.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn forgot_password(&self, request: &ForgotPasswordRequest) -> SessionResult<()> {
        self.api.forgot_password(request).await
    }

    /// Sets a new password with a reset token.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    pub async fn reset_password(&self, request: &ResetPasswordRequest) -> SessionResult<()> {
        self.api.reset_password(request).await
    }

    /// Checks a password reset token.
    ///
    /// # Errors
    ///
    /// Returns the API error when the token is rejected.
    pub async fn validate_reset_token(&self, token: &str) -> SessionResult<()> {
        self.api.validate_reset_token(token).await
    }
}

impl AccessContext for SessionState {
    fn is_authenticated(&self) -> bool {
        Self::is_authenticated(self)
    }

    fn has_role(&self, role: &str) -> bool {
        Self::has_role(self, role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::tests::make_token;

    struct NoApi;

    #[async_trait::async_trait]
    impl AuthApi for NoApi {
        async fn login(&self, _: &LoginRequest) -> SessionResult<AuthResponse> {
            Err(SessionError::Api {
                status: 401,
                message: "Invalid credentials".to_string(),
            })
        }

        async fn register(&self, _: &RegisterRequest) -> SessionResult<AuthResponse> {
            unreachable!()
        }

        async fn forgot_password(&self, _: &ForgotPasswordRequest) -> SessionResult<()> {
            Ok(())
        }

        async fn reset_password(&self, _: &ResetPasswordRequest) -> SessionResult<()> {
            Ok(())
        }

        async fn validate_reset_token(&self, _: &str) -> SessionResult<()> {
            Ok(())
        }
    }

    fn state(store: SessionStore) -> SessionState {
        SessionState::new(
            Arc::new(NoApi),
            store,
            Arc::new(NoopNavigator),
            SessionConfig::default(),
        )
    }

    #[test]
    fn restores_valid_session() {
        let store = SessionStore::in_memory();
        let exp = chrono::Utc::now().timestamp() + 3600;
        store
            .set_token(&make_token(&serde_json::json!({"exp": exp, "roles": ["ADMIN"]})))
            .unwrap();
        store.set_user(&CurrentUser::new(3, "ana@acme.pe")).unwrap();

        let state = state(store);
        assert!(state.is_authenticated());
        assert!(state.is_admin());
        assert!(!state.is_super_admin());
        assert_eq!(state.current_user().unwrap().id, 3);
        assert_eq!(state.snapshot().expires_at, Some(exp));
    }

    #[test]
    fn snapshot_expires_on_its_own() {
        let snapshot = SessionSnapshot {
            user: None,
            authenticated: true,
            roles: vec!["USER".to_string()],
            expires_at: Some(100),
        };
        assert!(snapshot.is_authenticated_at(99));
        assert!(!snapshot.is_authenticated_at(100));
    }

    #[tokio::test]
    async fn failed_login_keeps_session() {
        let state = state(SessionStore::in_memory());
        let err = state
            .login(&LoginRequest::new("a@b.pe", "wrong"))
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
        assert_eq!(state.snapshot(), SessionSnapshot::default());

        // The in-flight slot was released.
        assert!(!state.login_in_flight.load(Ordering::Acquire));
    }

    #[test]
    fn login_slot_is_exclusive() {
        let flag = AtomicBool::new(false);
        let first = LoginSlot::acquire(&flag);
        assert!(first.is_some());
        assert!(LoginSlot::acquire(&flag).is_none());
        drop(first);
        assert!(LoginSlot::acquire(&flag).is_some());
    }
}
