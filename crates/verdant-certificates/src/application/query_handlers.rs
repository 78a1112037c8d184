//! Query handlers for the Certificates context.

use verdant_core::error::DomainError;

use crate::domain::certificate::{VerifiedCertificate, normalize_code};
use crate::domain::repository::CertificateRepository;

/// Looks up a certificate by its verification code (case and surrounding
/// whitespace are ignored).
///
/// # Errors
///
/// Returns `DomainError::NotFound` if no certificate has the code.
pub async fn verify_certificate(
    code: &str,
    repo: &dyn CertificateRepository,
) -> Result<VerifiedCertificate, DomainError> {
    let code = normalize_code(code);
    if code.is_empty() {
        return Err(DomainError::not_found("certificate", code));
    }
    repo.find_certificate_by_code(&code)
        .await?
        .map(VerifiedCertificate::from)
        .ok_or_else(|| DomainError::not_found("certificate", code))
}
