//! End-to-end session flows against an in-memory API.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use parking_lot::Mutex;

use kyc_model::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    Role,
};
use kyc_session::store::{TOKEN_KEY, USER_KEY};
use kyc_session::{
    AccessContext, AuthApi, CurrentUser, DenyReason, KeyValueStorage, MemoryStorage, Navigation,
    Navigator, RouteTable, Router, SessionConfig, SessionError, SessionResult, SessionState,
    SessionStore,
};

fn now() -> i64 {
    chrono::Utc::now().timestamp()
}

fn make_token(payload: &serde_json::Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let body = URL_SAFE_NO_PAD.encode(payload.to_string());
    format!("{header}.{body}.signature")
}

/// API answering logins from a queue.
#[derive(Default)]
struct FakeApi {
    logins: Mutex<VecDeque<SessionResult<AuthResponse>>>,
    delay: Option<Duration>,
}

impl FakeApi {
    fn answering(responses: Vec<SessionResult<AuthResponse>>) -> Self {
        Self {
            logins: Mutex::new(responses.into()),
            delay: None,
        }
    }

    fn slow(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }
}

#[async_trait]
impl AuthApi for FakeApi {
    async fn login(&self, _: &LoginRequest) -> SessionResult<AuthResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.logins
            .lock()
            .pop_front()
            .unwrap_or_else(|| Err(SessionError::Config("no login queued".to_string())))
    }

    async fn register(&self, request: &RegisterRequest) -> SessionResult<AuthResponse> {
        Ok(AuthResponse {
            id: 99,
            email: request.email.clone(),
            token: None,
        })
    }

    async fn forgot_password(&self, _: &ForgotPasswordRequest) -> SessionResult<()> {
        Ok(())
    }

    async fn reset_password(&self, _: &ResetPasswordRequest) -> SessionResult<()> {
        Ok(())
    }

    async fn validate_reset_token(&self, token: &str) -> SessionResult<()> {
        if token == "good" {
            Ok(())
        } else {
            Err(SessionError::Api {
                status: 400,
                message: "Token inválido".to_string(),
            })
        }
    }
}

#[derive(Default)]
struct RecordingNavigator {
    visited: Mutex<Vec<String>>,
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, path: &str) {
        self.visited.lock().push(path.to_string());
    }
}

fn ok_login(id: i64, email: &str, claims: serde_json::Value) -> SessionResult<AuthResponse> {
    Ok(AuthResponse {
        id,
        email: email.to_string(),
        token: Some(make_token(&claims)),
    })
}

struct Harness {
    state: SessionState,
    storage: Arc<MemoryStorage>,
    navigator: Arc<RecordingNavigator>,
}

fn harness(api: FakeApi, storage: Arc<MemoryStorage>) -> Harness {
    let navigator = Arc::new(RecordingNavigator::default());
    let state = SessionState::new(
        Arc::new(api),
        SessionStore::from_shared(storage.clone()),
        navigator.clone(),
        SessionConfig::default(),
    );
    Harness {
        state,
        storage,
        navigator,
    }
}

fn credentials() -> LoginRequest {
    LoginRequest::new("ana@acme.pe", "secret")
}

#[tokio::test]
async fn login_replaces_previous_roles() {
    let api = FakeApi::answering(vec![
        ok_login(1, "ana@acme.pe", serde_json::json!({"exp": now() + 3600, "roles": ["ADMIN"]})),
        ok_login(
            2,
            "luis@acme.pe",
            serde_json::json!({"exp": now() + 3600, "roles": ["USER"], "empresaRuc": "20100070970", "nombre": "Luis"}),
        ),
    ]);
    let h = harness(api, Arc::new(MemoryStorage::new()));
    let mut changes = h.state.subscribe();

    h.state.login(&credentials()).await.unwrap();
    assert!(h.state.is_admin());
    assert!(changes.has_changed().unwrap());
    let seen = changes.borrow_and_update().clone();
    assert!(seen.authenticated);
    assert_eq!(seen.user.unwrap().id, 1);

    let user = h.state.login(&credentials()).await.unwrap();
    assert_eq!(user.nombre.as_deref(), Some("Luis"));
    assert!(!h.state.is_admin());
    assert!(h.state.has_role("USER"));
    assert_eq!(h.state.roles(), vec!["USER"]);
    assert_eq!(h.state.company_id().as_deref(), Some("20100070970"));
    assert_eq!(h.state.display_name().as_deref(), Some("Luis"));

    let cached: CurrentUser =
        serde_json::from_str(&h.storage.get(USER_KEY).unwrap()).unwrap();
    assert_eq!(cached.id, 2);
    assert_eq!(cached.roles, Some(vec!["USER".to_string()]));
}

#[tokio::test]
async fn logout_clears_everything_and_navigates() {
    let api = FakeApi::answering(vec![ok_login(
        1,
        "ana@acme.pe",
        serde_json::json!({"exp": now() + 3600, "roles": ["SUPERADMIN"]}),
    )]);
    let h = harness(api, Arc::new(MemoryStorage::new()));
    h.state.login(&credentials()).await.unwrap();

    h.state.logout();
    assert!(h.storage.get(TOKEN_KEY).is_none());
    assert!(h.storage.get(USER_KEY).is_none());
    assert!(!h.state.is_authenticated());
    assert!(h.state.roles().is_empty());
    assert!(h.state.current_user().is_none());
    assert_eq!(*h.navigator.visited.lock(), vec!["/login"]);

    // Logging out twice is harmless.
    h.state.logout();
    assert_eq!(h.navigator.visited.lock().len(), 2);
}

#[tokio::test]
async fn failed_login_leaves_session_untouched() {
    let api = FakeApi::answering(vec![
        ok_login(1, "ana@acme.pe", serde_json::json!({"exp": now() + 3600, "roles": ["ADMIN"]})),
        Err(SessionError::Api {
            status: 401,
            message: "Usuario inactivo".to_string(),
        }),
        Ok(AuthResponse {
            id: 3,
            email: "x@acme.pe".to_string(),
            token: None,
        }),
        ok_login(4, "y@acme.pe", serde_json::json!({"exp": now() - 10, "roles": ["USER"]})),
    ]);
    let h = harness(api, Arc::new(MemoryStorage::new()));
    h.state.login(&credentials()).await.unwrap();
    let before = h.state.snapshot();
    let stored = h.storage.get(TOKEN_KEY);

    let err = h.state.login(&credentials()).await.unwrap_err();
    assert_eq!(err.user_message(), "Usuario inactivo");

    let err = h.state.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, SessionError::UnusableToken));

    let err = h.state.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, SessionError::UnusableToken));

    assert_eq!(h.state.snapshot(), before);
    assert_eq!(h.storage.get(TOKEN_KEY), stored);
}

/// Storage whose user slot can be made to reject writes.
#[derive(Default)]
struct FlakyStorage {
    inner: MemoryStorage,
    reject_user: AtomicBool,
}

impl KeyValueStorage for FlakyStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.get(key)
    }

    fn set(&self, key: &str, value: &str) -> SessionResult<()> {
        if key == USER_KEY && self.reject_user.load(Ordering::SeqCst) {
            return Err(io::Error::new(io::ErrorKind::Other, "disk full").into());
        }
        self.inner.set(key, value)
    }

    fn remove(&self, key: &str) -> SessionResult<()> {
        self.inner.remove(key)
    }
}

#[tokio::test]
async fn failed_persistence_keeps_memory_and_store_in_step() {
    let api = FakeApi::answering(vec![
        ok_login(1, "ana@acme.pe", serde_json::json!({"exp": now() + 3600, "roles": ["ADMIN"]})),
        ok_login(2, "luis@acme.pe", serde_json::json!({"exp": now() + 3600, "roles": ["USER"]})),
    ]);
    let storage = Arc::new(FlakyStorage::default());
    let state = SessionState::new(
        Arc::new(api),
        SessionStore::from_shared(storage.clone()),
        Arc::new(RecordingNavigator::default()),
        SessionConfig::default(),
    );
    state.login(&credentials()).await.unwrap();
    let before = state.snapshot();
    let token_before = storage.get(TOKEN_KEY);
    let user_before = storage.get(USER_KEY);

    storage.reject_user.store(true, Ordering::SeqCst);
    let err = state.login(&credentials()).await.unwrap_err();
    assert!(matches!(err, SessionError::Storage(_)));

    assert_eq!(storage.get(TOKEN_KEY), token_before);
    assert_eq!(storage.get(USER_KEY), user_before);
    assert_eq!(state.snapshot(), before);
    assert_eq!(state.roles(), vec!["ADMIN"]);
    assert_eq!(state.token(), token_before);
}

#[tokio::test]
async fn first_login_failing_to_persist_leaves_no_session() {
    let api = FakeApi::answering(vec![ok_login(
        1,
        "ana@acme.pe",
        serde_json::json!({"exp": now() + 3600, "roles": ["ADMIN"]}),
    )]);
    let storage = Arc::new(FlakyStorage::default());
    storage.reject_user.store(true, Ordering::SeqCst);
    let state = SessionState::new(
        Arc::new(api),
        SessionStore::from_shared(storage.clone()),
        Arc::new(RecordingNavigator::default()),
        SessionConfig::default(),
    );

    assert!(state.login(&credentials()).await.is_err());
    assert!(storage.get(TOKEN_KEY).is_none());
    assert!(!state.is_authenticated());
    assert!(state.roles().is_empty());
}

#[tokio::test]
async fn concurrent_login_is_rejected() {
    let api = FakeApi::answering(vec![ok_login(
        1,
        "ana@acme.pe",
        serde_json::json!({"exp": now() + 3600, "roles": ["USER"]}),
    )])
    .slow(Duration::from_millis(50));
    let h = harness(api, Arc::new(MemoryStorage::new()));

    let creds = credentials();
    let (first, second) = tokio::join!(h.state.login(&creds), async {
        tokio::time::sleep(Duration::from_millis(5)).await;
        h.state.login(&creds).await
    });
    assert!(first.is_ok());
    assert!(matches!(second, Err(SessionError::LoginInProgress)));
    assert!(h.state.is_authenticated());
}

#[test]
fn expired_token_at_startup_is_no_session() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            TOKEN_KEY,
            &make_token(&serde_json::json!({"exp": now() - 3600, "roles": ["ADMIN"]})),
        )
        .unwrap();
    storage
        .set(USER_KEY, r#"{"id": 7, "email": "ana@acme.pe", "nombre": "Ana"}"#)
        .unwrap();
    let h = harness(FakeApi::default(), storage);

    assert!(!h.state.is_authenticated());
    assert!(h.state.roles().is_empty());
    // Still shown as the last user.
    assert_eq!(h.state.current_user().unwrap().label(), "Ana");

    let router = Router::new(RouteTable::console(), h.state.config());
    match router.navigate(&h.state, "/admin") {
        Navigation::Redirect(r) => {
            assert_eq!(r.to, "/login");
            assert_eq!(r.reason, DenyReason::Unauthenticated);
        }
        other => panic!("unexpected {other:?}"),
    }
}

#[test]
fn corrupt_cached_user_does_not_break_startup() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            TOKEN_KEY,
            &make_token(&serde_json::json!({"exp": now() + 3600, "roles": ["USER"]})),
        )
        .unwrap();
    storage.set(USER_KEY, "{\"id\": ").unwrap();
    let h = harness(FakeApi::default(), storage);

    assert!(h.state.is_authenticated());
    assert!(h.state.current_user().is_none());
}

#[test]
fn user_cannot_reach_superadmin_route() {
    let storage = Arc::new(MemoryStorage::new());
    storage
        .set(
            TOKEN_KEY,
            &make_token(&serde_json::json!({"exp": now() + 3600, "roles": ["USER"]})),
        )
        .unwrap();
    let h = harness(FakeApi::default(), storage);
    assert!(!h.state.has_any_role(&[Role::SuperAdmin]));

    let router = Router::new(RouteTable::console(), h.state.config());
    match router.navigate(&h.state, "/admin/empresas") {
        Navigation::Redirect(r) => {
            assert_eq!(r.to, "/onboarders");
            assert_eq!(r.reason, DenyReason::Forbidden);
        }
        other => panic!("unexpected {other:?}"),
    }
    assert_eq!(
        router.navigate(&h.state, "/onboarders"),
        Navigation::Enter {
            path: "/onboarders".to_string()
        }
    );
    assert!(h.state.snapshot().is_authenticated());
}

#[tokio::test]
async fn pass_through_operations() {
    let h = harness(FakeApi::default(), Arc::new(MemoryStorage::new()));
    let registered = h
        .state
        .register(&RegisterRequest {
            nombre: "Nuevo".to_string(),
            email: "nuevo@acme.pe".to_string(),
            dni: None,
            empresa_ruc: None,
            password: "x".to_string(),
            activo: true,
            tipo_usuario: Role::User,
        })
        .await
        .unwrap();
    assert_eq!(registered.id, 99);
    assert!(!h.state.is_authenticated());

    assert!(h.state.validate_reset_token("good").await.is_ok());
    let err = h.state.validate_reset_token("bad").await.unwrap_err();
    assert_eq!(err.user_message(), "Token inválido");
}
