//! Onboarding review queue commands.

use colored::Colorize;
use tabled::Tabled;

use kyc_model::{Cabecera, EstadoOnboarder, PageResponse, RechazoRequest, Score, ScoreCheck};

use crate::cli::OnboardingCommand;
use crate::config::OutputFormat;
use crate::output::{info, output_page, output_single, prompt, success};
use crate::{CliError, CliResult};

use super::{query, Context};

/// Route guarding the review queue.
const ROUTE: &str = "/onboarders";

/// Submission row for table output.
#[derive(Debug, Clone, Tabled)]
pub struct CabeceraRow {
    /// Submission ID.
    #[tabled(rename = "ID")]
    pub id: i64,
    /// DNI.
    #[tabled(rename = "DNI")]
    pub dni: String,
    /// Applicant name.
    #[tabled(rename = "Name")]
    pub nombre: String,
    /// Request date.
    #[tabled(rename = "Requested")]
    pub fecha: String,
    /// Document check.
    #[tabled(rename = "Document")]
    pub documento: String,
    /// Face comparison.
    #[tabled(rename = "Biometrics")]
    pub biometria: String,
    /// Liveness.
    #[tabled(rename = "Liveness")]
    pub liveness: String,
    /// Review state.
    #[tabled(rename = "State")]
    pub estado: String,
}

/// `Válido (95%)`, or `N/A` without a score.
fn score_cell(check: ScoreCheck, score: Option<f64>) -> String {
    match score {
        None => check.format(None).to_string(),
        Some(_) => format!("{} ({})", check.format(score), Score::percent(score)),
    }
}

impl From<&Cabecera> for CabeceraRow {
    fn from(c: &Cabecera) -> Self {
        Self {
            id: c.id,
            dni: c.nro_dni.clone(),
            nombre: c.nombre_completo(),
            fecha: c.fecha_solicitud.chars().take(10).collect(),
            documento: score_cell(ScoreCheck::Documento, c.validacion_documento),
            biometria: score_cell(ScoreCheck::Comparacion, c.comparacion_biometrica),
            liveness: score_cell(ScoreCheck::Liveness, c.liveness_detection),
            estado: c.estado.label().to_string(),
        }
    }
}

/// Runs an onboarding command.
pub async fn run_onboarding(cmd: OnboardingCommand, ctx: &Context) -> CliResult<()> {
    match cmd {
        OnboardingCommand::List {
            dni,
            estado,
            empresa_id,
            page,
            size,
        } => {
            let q = query(&[
                ("page", Some(page.to_string())),
                ("size", Some(size.to_string())),
                ("nroDni", dni),
                ("estado", estado.map(|e| e.as_str().to_string())),
                ("empresaId", empresa_id.map(|id| id.to_string())),
            ]);
            ctx.enter(&format!("{ROUTE}{q}"))?;

            let result: PageResponse<Cabecera> =
                ctx.client.get(&format!("/onboarding{q}")).await?;
            let rows: Vec<CabeceraRow> = result.content.iter().map(CabeceraRow::from).collect();
            output_page(&rows, &result, ctx.format)
        }
        OnboardingCommand::Get { id } => {
            ctx.enter(ROUTE)?;
            let cabecera = fetch(ctx, id).await?;
            if ctx.format == OutputFormat::Table {
                print_summary(&cabecera);
                Ok(())
            } else {
                output_single(&cabecera, ctx.format)
            }
        }
        OnboardingCommand::Approve { id } => {
            ctx.enter(ROUTE)?;
            ensure_reviewable(&fetch(ctx, id).await?)?;
            let updated: Cabecera = ctx
                .client
                .post(&format!("/onboarding/{id}/aprobar"), &serde_json::json!({}))
                .await?;
            success(&format!(
                "Submission {id} ({}) approved",
                updated.nombre_completo()
            ));
            Ok(())
        }
        OnboardingCommand::Reject { id, motivo } => {
            ctx.enter(ROUTE)?;
            ensure_reviewable(&fetch(ctx, id).await?)?;
            let motivo = match motivo {
                Some(m) => m,
                None => prompt("Reason for rejection: ")?,
            };
            if motivo.trim().is_empty() {
                return Err(CliError::Validation(
                    "a rejection reason is required".to_string(),
                ));
            }
            let updated: Cabecera = ctx
                .client
                .post(
                    &format!("/onboarding/{id}/rechazar"),
                    &RechazoRequest {
                        motivo_rechazo: motivo.trim().to_string(),
                    },
                )
                .await?;
            success(&format!(
                "Submission {id} ({}) rejected",
                updated.nombre_completo()
            ));
            Ok(())
        }
    }
}

async fn fetch(ctx: &Context, id: i64) -> CliResult<Cabecera> {
    ctx.client.get(&format!("/onboarding/{id}")).await
}

/// Only pending submissions can be approved or rejected.
fn ensure_reviewable(cabecera: &Cabecera) -> CliResult<()> {
    if cabecera.is_reviewable() {
        Ok(())
    } else {
        Err(CliError::Validation(format!(
            "submission {} is already {}",
            cabecera.id,
            cabecera.estado.label().to_lowercase()
        )))
    }
}

fn print_summary(c: &Cabecera) {
    let estado = match c.estado {
        EstadoOnboarder::Pendiente => c.estado.label().yellow(),
        EstadoOnboarder::Aprobado => c.estado.label().green(),
        EstadoOnboarder::Rechazado => c.estado.label().red(),
    };
    println!("{} [{estado}]", c.nombre_completo().bold());
    println!("  DNI:        {}", c.nro_dni);
    println!("  Requested:  {}", c.fecha_solicitud);
    println!(
        "  Document:   {}",
        score_cell(ScoreCheck::Documento, c.validacion_documento)
    );
    println!(
        "  Biometrics: {}",
        score_cell(ScoreCheck::Comparacion, c.comparacion_biometrica)
    );
    println!(
        "  Liveness:   {}",
        score_cell(ScoreCheck::Liveness, c.liveness_detection)
    );
    if let Some(hit) = c.reniec_hit {
        println!(
            "  RENIEC:     {} ({})",
            if hit { "match" } else { "no match" },
            Score::percent(c.reniec_similarity)
        );
    }
    if let Some(t) = &c.tratante {
        println!("  Reviewer:   {} <{}>", t.nombre, t.email);
    }
    if let Some(m) = &c.motivo_rechazo {
        println!("  Rejected:   {m}");
    }
    if let Some(err) = &c.mensaje_error {
        println!(
            "  Failed at:  {} ({err})",
            c.paso_fallido.as_deref().unwrap_or("unknown step")
        );
    }
    match &c.detalle {
        Some(d) => {
            if let Some(n) = &d.nacionalidad {
                println!("  Nationality: {n}");
            }
            if let Some(s) = d.sexo {
                println!("  Sex:        {s:?}");
            }
            if let Some(b) = &d.fecha_nacimiento {
                println!("  Born:       {b}");
            }
            if let Some(e) = &d.fecha_caducidad {
                println!("  Doc expiry: {e}");
            }
        }
        None => info("No detail record attached to this submission"),
    }
}
