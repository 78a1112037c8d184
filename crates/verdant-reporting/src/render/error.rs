use thiserror::Error;
use verdant_core::error::DomainError;

/// Failure while encoding a report export.
#[derive(Debug, Error)]
pub enum ReportError {
    /// CSV serialization failed.
    #[error("CSV export failed: {0}")]
    Csv(String),

    /// PDF generation failed.
    #[error("PDF export failed: {0}")]
    Pdf(String),
}

impl From<csv::Error> for ReportError {
    fn from(e: csv::Error) -> Self {
        Self::Csv(e.to_string())
    }
}

impl From<ReportError> for DomainError {
    fn from(e: ReportError) -> Self {
        Self::Infrastructure(e.to_string())
    }
}
