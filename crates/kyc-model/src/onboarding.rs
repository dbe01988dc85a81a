//! Onboarding submissions (`/onboarding`).
//!
//! A submission is split in two records: the [`Cabecera`] summary shown in
//! the review queue and the [`Detalle`] with the extracted document data and
//! photo references. Document OCR, liveness detection and biometric
//! comparison scores are computed by the backend; this module only
//! interprets them for display.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Minimum normalised score (percent) that counts as a positive result.
pub const SCORE_THRESHOLD: f64 = 90.0;

/// Review state of a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoOnboarder {
    /// Waiting for review.
    Pendiente,
    /// Approved by a reviewer.
    Aprobado,
    /// Rejected by a reviewer.
    Rechazado,
}

impl EstadoOnboarder {
    /// Wire name, as used in the `estado` query parameter.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pendiente => "PENDIENTE",
            Self::Aprobado => "APROBADO",
            Self::Rechazado => "RECHAZADO",
        }
    }

    /// Display label.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Pendiente => "Pendiente",
            Self::Aprobado => "Aprobado",
            Self::Rechazado => "Rechazado",
        }
    }
}

impl fmt::Display for EstadoOnboarder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Processing state of the automated pipeline for a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EstadoProceso {
    /// Still running.
    InProgress,
    /// Every step finished.
    Completed,
    /// A step failed; see `paso_fallido`.
    Failed,
}

/// Person who processed a submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tratante {
    /// User ID.
    pub id: i64,
    /// Display name.
    pub nombre: String,
    /// Account e-mail.
    #[serde(alias = "acjMail")]
    pub email: String,
}

/// Summary record of an onboarding submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cabecera {
    /// Submission ID.
    pub id: i64,
    /// Given names.
    pub nombres: String,
    /// Surnames.
    pub apellidos: String,
    /// Identity document number.
    pub nro_dni: String,
    /// When the submission was received.
    pub fecha_solicitud: String,
    /// Document authenticity score.
    #[serde(default)]
    pub validacion_documento: Option<f64>,
    /// Selfie-vs-document face comparison score.
    #[serde(default)]
    pub comparacion_biometrica: Option<f64>,
    /// Liveness detection score.
    #[serde(default)]
    pub liveness_detection: Option<f64>,
    /// Review state.
    pub estado: EstadoOnboarder,
    /// Pipeline state.
    pub estado_proceso: EstadoProceso,
    /// Current pipeline step.
    #[serde(default)]
    pub paso_actual: u32,
    /// Name of the failed step, if any.
    #[serde(default)]
    pub paso_fallido: Option<String>,
    /// Pipeline error message, if any.
    #[serde(default)]
    pub mensaje_error: Option<String>,
    /// When the pipeline completed.
    #[serde(default)]
    pub fecha_completado: Option<String>,
    /// When the submission was approved.
    #[serde(default)]
    pub fecha_aprobacion: Option<String>,
    /// When the submission was rejected.
    #[serde(default)]
    pub fecha_rechazo: Option<String>,
    /// Reason given on rejection.
    #[serde(default)]
    pub motivo_rechazo: Option<String>,
    /// Reviewer who processed the submission.
    #[serde(default)]
    pub tratante: Option<Tratante>,
    /// Whether the RENIEC registry returned a match.
    #[serde(default)]
    pub reniec_hit: Option<bool>,
    /// RENIEC photo similarity score.
    #[serde(default)]
    pub reniec_similarity: Option<f64>,
    /// When RENIEC was queried.
    #[serde(default)]
    pub fecha_validacion_reniec: Option<String>,
    /// Raw RENIEC response.
    #[serde(default)]
    pub metadata_reniec: Option<String>,
    /// Raw OCR response.
    #[serde(default, rename = "metadataOCR")]
    pub metadata_ocr: Option<String>,
    /// Raw liveness response.
    #[serde(default)]
    pub metadata_liveness: Option<String>,
    /// Raw comparison response.
    #[serde(default)]
    pub metadata_comparacion: Option<String>,
    /// Embedded detail, when the endpoint returns it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detalle: Option<Detalle>,
}

impl Cabecera {
    /// Full name of the applicant.
    #[must_use]
    pub fn nombre_completo(&self) -> String {
        format!("{} {}", self.nombres, self.apellidos)
    }

    /// Returns whether the submission can still be approved or rejected.
    #[must_use]
    pub fn is_reviewable(&self) -> bool {
        self.estado == EstadoOnboarder::Pendiente
    }
}

/// Applicant sex as read from the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sexo {
    /// Female.
    F,
    /// Male.
    M,
}

/// Extended detail of an onboarding submission.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Detalle {
    /// Detail ID.
    pub id: i64,
    /// Nationality.
    #[serde(default)]
    pub nacionalidad: Option<String>,
    /// Sex.
    #[serde(default)]
    pub sexo: Option<Sexo>,
    /// Date of birth.
    #[serde(default)]
    pub fecha_nacimiento: Option<String>,
    /// Document expiry date.
    #[serde(default)]
    pub fecha_caducidad: Option<String>,
    /// Front photo of the document.
    #[serde(default)]
    pub foto_anverso: Option<String>,
    /// Back photo of the document.
    #[serde(default)]
    pub foto_reverso: Option<String>,
    /// Face crop from the document.
    #[serde(default)]
    pub foto_facial_dni: Option<String>,
    /// Selfie.
    #[serde(default)]
    pub foto_selfie: Option<String>,
    /// Review state.
    pub estado: EstadoOnboarder,
}

/// Body of `POST /onboarding/{id}/rechazar`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RechazoRequest {
    /// Reason shown to the applicant.
    pub motivo_rechazo: String,
}

/// The automated checks whose scores are shown for each submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreCheck {
    /// Document authenticity.
    Documento,
    /// Face comparison between selfie and document.
    Comparacion,
    /// Liveness detection.
    Liveness,
}

impl ScoreCheck {
    /// Label for a positive and a negative outcome.
    const fn labels(self) -> (&'static str, &'static str) {
        match self {
            Self::Documento => ("Válido", "Inválido"),
            Self::Comparacion => ("Coincide", "No coincide"),
            Self::Liveness => ("Positivo", "Negativo"),
        }
    }

    /// Formats a raw score for display.
    #[must_use]
    pub fn format(self, score: Option<f64>) -> &'static str {
        let (yes, no) = self.labels();
        match score {
            None => "N/A",
            Some(_) if Score::is_positive(score) => yes,
            Some(_) => no,
        }
    }
}

/// Score interpretation helpers.
pub struct Score;

impl Score {
    /// Normalises a score to percent.
    ///
    /// Values in `(0, 1]` are fractions and get scaled and rounded; anything
    /// else is already a percentage.
    #[must_use]
    pub fn normalize(score: Option<f64>) -> Option<f64> {
        score.map(|s| if s > 0.0 && s <= 1.0 { (s * 100.0).round() } else { s })
    }

    /// Returns whether a score reaches [`SCORE_THRESHOLD`]. Missing scores
    /// are never positive.
    #[must_use]
    pub fn is_positive(score: Option<f64>) -> bool {
        Self::normalize(score).is_some_and(|s| s >= SCORE_THRESHOLD)
    }

    /// Formats a score as `93%`, or `N/A` when missing.
    #[must_use]
    pub fn percent(score: Option<f64>) -> String {
        Self::normalize(score).map_or_else(|| "N/A".to_string(), |s| format!("{s:.0}%"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_fractions() {
        assert_eq!(Score::normalize(Some(0.93)), Some(93.0));
        assert_eq!(Score::normalize(Some(1.0)), Some(100.0));
        assert_eq!(Score::normalize(Some(0.0)), Some(0.0));
        assert_eq!(Score::normalize(Some(87.0)), Some(87.0));
        assert_eq!(Score::normalize(None), None);
    }

    #[test]
    fn threshold_is_inclusive() {
        assert!(Score::is_positive(Some(90.0)));
        assert!(Score::is_positive(Some(0.9)));
        assert!(!Score::is_positive(Some(89.9)));
        assert!(!Score::is_positive(None));
    }

    #[test]
    fn labels() {
        assert_eq!(ScoreCheck::Liveness.format(Some(0.95)), "Positivo");
        assert_eq!(ScoreCheck::Liveness.format(Some(0.5)), "Negativo");
        assert_eq!(ScoreCheck::Documento.format(Some(99.0)), "Válido");
        assert_eq!(ScoreCheck::Comparacion.format(Some(10.0)), "No coincide");
        assert_eq!(ScoreCheck::Comparacion.format(None), "N/A");
        assert_eq!(Score::percent(Some(0.934)), "93%");
        assert_eq!(EstadoOnboarder::Rechazado.to_string(), "Rechazado");
    }

    #[test]
    fn cabecera_with_embedded_detalle() {
        let json = r#"{
            "id": 41,
            "nombres": "Rosa",
            "apellidos": "Quispe",
            "nroDni": "45678912",
            "fechaSolicitud": "2025-03-02T10:00:00",
            "validacionDocumento": 0.97,
            "comparacionBiometrica": null,
            "livenessDetection": 92,
            "estado": "PENDIENTE",
            "estadoProceso": "COMPLETED",
            "pasoActual": 4,
            "metadataOCR": "{}",
            "tratante": {"id": 2, "nombre": "Luis", "acjMail": "luis@acme.pe"},
            "detalle": {"id": 9, "sexo": "F", "estado": "PENDIENTE"}
        }"#;
        let cabecera: Cabecera = serde_json::from_str(json).unwrap();
        assert_eq!(cabecera.nombre_completo(), "Rosa Quispe");
        assert!(cabecera.is_reviewable());
        assert_eq!(cabecera.metadata_ocr.as_deref(), Some("{}"));
        assert_eq!(cabecera.tratante.unwrap().email, "luis@acme.pe");
        assert_eq!(cabecera.detalle.unwrap().sexo, Some(Sexo::F));
    }
}
