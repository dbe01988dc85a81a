//! # kyc-model
//!
//! Domain models for the KYC onboarding console.
//!
//! This crate defines the wire records exchanged with the onboarding API:
//! - Console users and their roles
//! - Companies ("empresas")
//! - Onboarding submissions (cabecera / detalle) and score interpretation
//! - Authentication request/response records
//! - Spring-style paginated responses

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]

pub mod auth;
pub mod de;
pub mod empresa;
pub mod onboarding;
pub mod page;
pub mod role;
pub mod user;

pub use auth::{
    AuthResponse, ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
};
pub use empresa::{EmpresaRequest, EmpresaResponse, EmpresaToken};
pub use onboarding::{
    Cabecera, Detalle, EstadoOnboarder, EstadoProceso, RechazoRequest, Score, ScoreCheck, Sexo,
    Tratante, SCORE_THRESHOLD,
};
pub use page::PageResponse;
pub use role::{ParseRoleError, Role};
pub use user::{UsuarioListResponse, UsuarioUpdateRequest};
