//! # kyc-session
//!
//! Client-side session and authorization model for the KYC onboarding
//! console.
//!
//! - [`token`]: decodes the claims of the session token (no signature check;
//!   the API re-verifies every request)
//! - [`store`]: durable token / current-user slots
//! - [`state`]: the observable session (user, authenticated flag, roles)
//! - [`guard`] and [`route`]: navigation guards and the console routing table
//! - [`augmenter`]: attaches the bearer token to outgoing API requests
//! - [`api`]: the authentication endpoints

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod api;
pub mod augmenter;
pub mod claims;
pub mod config;
pub mod error;
pub mod guard;
pub mod route;
pub mod state;
pub mod store;
pub mod token;

pub use api::{AuthApi, HttpAuthApi};
pub use augmenter::BearerAugmenter;
pub use claims::{CurrentUser, TokenClaims};
pub use config::SessionConfig;
pub use error::{SessionError, SessionResult};
pub use guard::{AccessContext, AuthGuard, DenyReason, GuardDecision, Redirect, RoleGuard};
pub use route::{Access, Navigation, Route, RouteTable, Router};
pub use state::{Navigator, NoopNavigator, SessionSnapshot, SessionState};
pub use store::{FileStorage, KeyValueStorage, MemoryStorage, SessionStore};
