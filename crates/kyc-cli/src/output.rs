//! Output formatting utilities.

use colored::Colorize;
use tabled::{settings::Style, Table, Tabled};

use kyc_model::PageResponse;

use crate::config::OutputFormat;

/// Prints a success message.
pub fn success(message: &str) {
    println!("{} {}", "✓".green().bold(), message);
}

/// Prints an error message.
pub fn error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Prints a warning message.
pub fn warning(message: &str) {
    eprintln!("{} {}", "⚠".yellow().bold(), message);
}

/// Prints an info message.
pub fn info(message: &str) {
    println!("{} {}", "ℹ".blue().bold(), message);
}

/// Outputs rows in the specified format. `raw` is what JSON/YAML print.
pub fn output<R: Tabled, T: serde::Serialize>(
    rows: &[R],
    raw: &T,
    format: OutputFormat,
) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table => {
            if rows.is_empty() {
                info("No results found.");
            } else {
                let table = Table::new(rows).with(Style::rounded()).to_string();
                println!("{table}");
            }
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(raw)?);
        }
        OutputFormat::Yaml => {
            print_yaml_value(&serde_json::to_value(raw)?, 0);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

/// Outputs one page of rows, followed by the page position in table mode.
pub fn output_page<R: Tabled, T: serde::Serialize>(
    rows: &[R],
    page: &PageResponse<T>,
    format: OutputFormat,
) -> crate::CliResult<()> {
    output(rows, page, format)?;
    if format == OutputFormat::Table && !page.is_empty() {
        println!("{}", page.summary().dimmed());
    }
    Ok(())
}

/// Outputs a single item.
pub fn output_single<T: serde::Serialize>(item: &T, format: OutputFormat) -> crate::CliResult<()> {
    match format {
        OutputFormat::Table | OutputFormat::Yaml => {
            print_yaml_value(&serde_json::to_value(item)?, 0);
        }
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(item)?);
        }
        OutputFormat::Quiet => {}
    }
    Ok(())
}

/// Prints a JSON value as YAML-like output. Null fields are skipped.
fn print_yaml_value(value: &serde_json::Value, indent: usize) {
    let prefix = "  ".repeat(indent);

    match value {
        serde_json::Value::Array(arr) => {
            for item in arr {
                if item.is_object() {
                    println!("{prefix}-");
                    print_yaml_value(item, indent + 1);
                } else {
                    println!("{prefix}- {}", scalar(item));
                }
            }
        }
        serde_json::Value::Object(map) => {
            for (key, val) in map {
                if val.is_null() {
                    continue;
                }
                if val.is_object() || val.is_array() {
                    println!("{prefix}{}:", key.bold());
                    print_yaml_value(val, indent + 1);
                } else {
                    println!("{prefix}{}: {}", key.bold(), scalar(val));
                }
            }
        }
        other => println!("{prefix}{}", scalar(other)),
    }
}

fn scalar(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Prompts for confirmation.
pub fn confirm(message: &str) -> crate::CliResult<bool> {
    print!("{message} [y/N]: ");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;

    let answer = input.trim();
    Ok(answer.eq_ignore_ascii_case("y") || answer.eq_ignore_ascii_case("yes"))
}

/// Prompts for a line of input.
pub fn prompt(message: &str) -> crate::CliResult<String> {
    print!("{message}");
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(input.trim().to_string())
}

/// Prompts for password input (hidden).
pub fn prompt_password(prompt: &str) -> crate::CliResult<String> {
    Ok(rpassword::prompt_password(prompt)?)
}

/// Prompts twice for a new password and checks both entries match.
pub fn prompt_new_password(min_len: usize) -> crate::CliResult<String> {
    let password = prompt_password("New password: ")?;
    let again = prompt_password("Confirm password: ")?;
    check_new_password(&password, &again, min_len)?;
    Ok(password)
}

/// Checks a typed password against its confirmation and a minimum length
/// in characters.
pub(crate) fn check_new_password(
    password: &str,
    again: &str,
    min_len: usize,
) -> crate::CliResult<()> {
    if password != again {
        return Err(crate::CliError::Validation(
            "Passwords do not match".to_string(),
        ));
    }
    if password.chars().count() < min_len {
        return Err(crate::CliError::Validation(format!(
            "Password must be at least {min_len} characters"
        )));
    }
    Ok(())
}
