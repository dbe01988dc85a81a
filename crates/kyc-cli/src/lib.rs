//! # kyc-cli
//!
//! Command-line administration console for the KYC onboarding API.
//!
//! Every console screen is a subcommand:
//! - Session: login, logout, registration, password reset, whoami
//! - Users and companies ("empresas") for administrators
//! - The onboarding review queue (list, inspect, approve, reject)
//! - Token inspection and configuration management
//!
//! Commands navigate to a console route first, so the same guards that
//! protect the screens decide whether a command may run.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::uninlined_format_args)]
#![allow(clippy::future_not_send)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod output;

pub use cli::Cli;
pub use config::CliConfig;
pub use error::{CliError, CliResult};
