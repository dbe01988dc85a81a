//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use kyc_model::{EstadoOnboarder, Role};

use crate::config::OutputFormat;

/// KYC console - administration tool for the onboarding API.
#[derive(Debug, Parser)]
#[command(name = "kyc")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// API base URL (overrides config).
    #[arg(short, long, env = "KYC_API_URL")]
    pub api_url: Option<String>,

    /// Directory holding the session (overrides config).
    #[arg(long, env = "KYC_SESSION_DIR")]
    pub session_dir: Option<PathBuf>,

    /// Output format (overrides config).
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Enable verbose output.
    #[arg(short, long)]
    pub verbose: bool,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Log in and store the session.
    Login {
        /// Account e-mail (prompted if omitted).
        #[arg(short, long)]
        email: Option<String>,

        /// Password (prompted if omitted).
        #[arg(long, env = "KYC_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },

    /// End the session.
    Logout,

    /// Show the current session.
    #[command(alias = "status")]
    Whoami,

    /// Register a new account.
    Register {
        /// Display name.
        #[arg(long)]
        nombre: String,

        /// Account e-mail.
        #[arg(long)]
        email: String,

        /// National identity document number (8 digits).
        #[arg(long)]
        dni: Option<String>,

        /// RUC of the company to assign the account to.
        #[arg(long)]
        empresa_ruc: Option<String>,

        /// Role of the new account.
        #[arg(long, default_value = "USER")]
        role: Role,

        /// Create the account inactive.
        #[arg(long)]
        inactive: bool,
    },

    /// Request a password reset e-mail.
    ForgotPassword {
        /// Account e-mail.
        email: String,
    },

    /// Set a new password with a reset token.
    ResetPassword {
        /// Token from the reset e-mail.
        token: String,
    },

    /// User management commands.
    #[command(subcommand)]
    User(UserCommand),

    /// Company management commands.
    #[command(subcommand)]
    Empresa(EmpresaCommand),

    /// Onboarding review commands.
    #[command(subcommand)]
    Onboarding(OnboardingCommand),

    /// Decode a session token without verifying it.
    DecodeToken {
        /// Token to decode (the stored session token if omitted).
        token: Option<String>,
    },

    /// Configuration management.
    #[command(subcommand)]
    Config(ConfigCommand),
}

/// User commands.
#[derive(Debug, Subcommand)]
pub enum UserCommand {
    /// List users.
    List,

    /// Get user details.
    Get {
        /// User ID.
        id: i64,
    },

    /// Update a user.
    Update {
        /// User ID.
        id: i64,

        /// New display name.
        #[arg(long)]
        nombre: Option<String>,

        /// New e-mail.
        #[arg(long)]
        email: Option<String>,

        /// New company RUC.
        #[arg(long)]
        empresa_ruc: Option<String>,

        /// New role.
        #[arg(long)]
        role: Option<Role>,

        /// Prompt for a new password.
        #[arg(long)]
        password: bool,
    },

    /// Activate or deactivate a user.
    ToggleActive {
        /// User ID.
        id: i64,
    },

    /// Delete a user.
    Delete {
        /// User ID.
        id: i64,

        /// Skip confirmation.
        #[arg(long)]
        force: bool,
    },
}

/// Company commands.
#[derive(Debug, Subcommand)]
pub enum EmpresaCommand {
    /// List companies.
    List {
        /// Filter by RUC or name.
        #[arg(long)]
        filtro: Option<String>,

        /// Page number (0-based).
        #[arg(long, default_value = "0")]
        page: u32,

        /// Page size.
        #[arg(long, default_value = "10")]
        size: u32,
    },

    /// Get company details.
    Get {
        /// Company RUC.
        ruc: String,
    },

    /// Create a company.
    Create {
        /// Company RUC (11 digits).
        ruc: String,

        /// Company name.
        #[arg(long)]
        nombre: String,

        /// Contact e-mail.
        #[arg(long)]
        email: String,

        /// ID of the user in charge.
        #[arg(long)]
        encargado: Option<i64>,
    },

    /// Update a company.
    Update {
        /// Company RUC.
        ruc: String,

        /// New name.
        #[arg(long)]
        nombre: Option<String>,

        /// New contact e-mail.
        #[arg(long)]
        email: Option<String>,

        /// New user in charge.
        #[arg(long)]
        encargado: Option<i64>,
    },

    /// Delete a company.
    Delete {
        /// Company RUC.
        ruc: String,

        /// Skip confirmation.
        #[arg(long)]
        force: bool,
    },

    /// Show the company's API token.
    Token {
        /// Company RUC.
        ruc: String,
    },
}

/// Onboarding commands.
#[derive(Debug, Subcommand)]
pub enum OnboardingCommand {
    /// List submissions.
    List {
        /// Filter by DNI.
        #[arg(long)]
        dni: Option<String>,

        /// Filter by review state.
        #[arg(long, value_parser = parse_estado)]
        estado: Option<EstadoOnboarder>,

        /// Filter by company ID.
        #[arg(long)]
        empresa_id: Option<i64>,

        /// Page number (0-based).
        #[arg(long, default_value = "0")]
        page: u32,

        /// Page size.
        #[arg(long, default_value = "20")]
        size: u32,
    },

    /// Get a submission with its detail.
    Get {
        /// Submission ID.
        id: i64,
    },

    /// Approve a submission.
    Approve {
        /// Submission ID.
        id: i64,
    },

    /// Reject a submission.
    Reject {
        /// Submission ID.
        id: i64,

        /// Reason shown to the applicant (prompted if omitted).
        #[arg(long)]
        motivo: Option<String>,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration.
    Show,

    /// Set a configuration value.
    Set {
        /// Configuration key.
        key: String,

        /// Configuration value.
        value: String,
    },

    /// Write a default configuration file.
    Init,
}

fn parse_estado(s: &str) -> Result<EstadoOnboarder, String> {
    match s.to_uppercase().as_str() {
        "PENDIENTE" => Ok(EstadoOnboarder::Pendiente),
        "APROBADO" => Ok(EstadoOnboarder::Aprobado),
        "RECHAZADO" => Ok(EstadoOnboarder::Rechazado),
        _ => Err(format!(
            "unknown state '{s}' (expected PENDIENTE, APROBADO or RECHAZADO)"
        )),
    }
}
