//! # KYC console CLI
//!
//! Command-line administration for the KYC onboarding API.

#![forbid(unsafe_code)]
#![allow(clippy::uninlined_format_args)]

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use kyc_cli::{
    cli::{Cli, Command},
    commands::{self, Context},
    config::CliConfig,
    output::error,
    CliResult,
};

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| default.into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run(cli: Cli, mut config: CliConfig) -> CliResult<()> {
    if let Command::Config(cmd) = cli.command {
        return commands::run_config(cmd, &mut config);
    }

    let ctx = Context::new(&cli, config)?;
    match cli.command {
        Command::Login { email, password } => commands::login(&ctx, email, password).await,
        Command::Logout => commands::logout(&ctx),
        Command::Whoami => commands::whoami(&ctx),
        Command::Register {
            nombre,
            email,
            dni,
            empresa_ruc,
            role,
            inactive,
        } => commands::register(&ctx, nombre, email, dni, empresa_ruc, role, inactive).await,
        Command::ForgotPassword { email } => commands::forgot_password(&ctx, email).await,
        Command::ResetPassword { token } => commands::reset_password(&ctx, token).await,
        Command::User(cmd) => commands::run_user(cmd, &ctx).await,
        Command::Empresa(cmd) => commands::run_empresa(cmd, &ctx).await,
        Command::Onboarding(cmd) => commands::run_onboarding(cmd, &ctx).await,
        Command::DecodeToken { token } => commands::run_decode_token(token, &ctx),
        Command::Config(_) => Ok(()),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match CliConfig::load() {
        Ok(c) => c,
        Err(e) => {
            error(&format!("Failed to load configuration: {}", e));
            std::process::exit(1);
        }
    };

    if let Err(e) = run(cli, config).await {
        error(&e.to_string());
        std::process::exit(1);
    }
}
