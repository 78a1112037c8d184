//! Command handlers for the Certificates context.

use std::sync::Mutex;

use tracing::{info, warn};
use uuid::Uuid;
use verdant_core::clock::Clock;
use verdant_core::command::Command;
use verdant_core::error::DomainError;
use verdant_core::profile::{ProfileRepository, require_profile};
use verdant_core::rng::DeterministicRng;
use verdant_notifications::{Mailer, templates};

use crate::domain::certificate::{Certificate, generate_verification_code};
use crate::domain::commands::IssueCertificate;
use crate::domain::repository::CertificateRepository;

const MAX_CODE_ATTEMPTS: usize = 5;

/// Collaborators needed to issue a certificate.
pub struct IssueContext<'a> {
    /// Time source.
    pub clock: &'a dyn Clock,
    /// Code generator.
    pub rng: &'a Mutex<dyn DeterministicRng + Send>,
    /// Holder profiles.
    pub profiles: &'a dyn ProfileRepository,
    /// Certificate persistence.
    pub repo: &'a dyn CertificateRepository,
    /// Email delivery.
    pub mailer: &'a dyn Mailer,
    /// Public base URL for the verification link.
    pub base_url: &'a str,
}

fn draw_code(rng: &Mutex<dyn DeterministicRng + Send>) -> Result<String, DomainError> {
    let mut guard = rng
        .lock()
        .map_err(|e| DomainError::Infrastructure(format!("RNG mutex poisoned: {e}")))?;
    Ok(generate_verification_code(&mut *guard))
}

/// Handles the `IssueCertificate` command.
///
/// Issuing is idempotent: an enrollment that already has a certificate gets
/// it back unchanged, including when a concurrent request inserted it first.
/// The announcement email is best-effort.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for an unknown or foreign enrollment,
/// `DomainError::Validation` if the module is not completed, and
/// `DomainError::Infrastructure` if no free code is found or persistence
/// fails.
pub async fn handle_issue_certificate(
    command: &IssueCertificate,
    ctx: &IssueContext<'_>,
) -> Result<Certificate, DomainError> {
    let enrollment = ctx
        .repo
        .find_certifiable_enrollment(command.enrollment_id)
        .await?
        .filter(|e| e.user_id == command.user_id)
        .ok_or_else(|| DomainError::not_found("enrollment", command.enrollment_id))?;

    if let Some(existing) = ctx
        .repo
        .find_certificate_by_enrollment(enrollment.id)
        .await?
    {
        return Ok(existing);
    }
    if !enrollment.completed {
        return Err(DomainError::validation(
            "Completa todas las lecciones para obtener el certificado",
        ));
    }

    let holder = require_profile(command.user_id, ctx.profiles).await?;

    for attempt in 1..=MAX_CODE_ATTEMPTS {
        // Lock RNG only while drawing, never across an await.
        let verification_code = draw_code(ctx.rng)?;
        let certificate = Certificate {
            id: Uuid::new_v4(),
            enrollment_id: enrollment.id,
            user_id: holder.id,
            module_id: enrollment.module_id,
            holder_name: holder.full_name.clone(),
            module_title: enrollment.module_title.clone(),
            core_value: enrollment.core_value,
            verification_code,
            xp_earned: enrollment.xp_earned,
            issued_at: ctx.clock.now(),
        };

        match ctx.repo.insert_certificate(&certificate).await {
            Ok(()) => {
                info!(
                    command = command.command_type(),
                    correlation_id = %command.correlation_id(),
                    actor = ?command.actor_id(),
                    enrollment_id = %enrollment.id,
                    code = %certificate.verification_code,
                    "certificate issued"
                );
                announce(&certificate, &holder.email, ctx).await;
                return Ok(certificate);
            }
            Err(DomainError::Conflict(_)) => {
                if let Some(existing) = ctx
                    .repo
                    .find_certificate_by_enrollment(enrollment.id)
                    .await?
                {
                    info!(
                        enrollment_id = %enrollment.id,
                        "certificate issued concurrently, returning it"
                    );
                    return Ok(existing);
                }
                warn!(attempt, "verification code collision, drawing again");
            }
            Err(e) => return Err(e),
        }
    }

    Err(DomainError::infrastructure(
        "could not allocate a unique verification code",
    ))
}

async fn announce(certificate: &Certificate, email: &str, ctx: &IssueContext<'_>) {
    let message = templates::certificate_issued(
        email,
        &certificate.holder_name,
        &certificate.module_title,
        &certificate.verification_code,
        &format!(
            "{}/certificates/verify/{}",
            ctx.base_url, certificate.verification_code
        ),
    );
    if let Err(e) = ctx.mailer.send(&message).await {
        warn!(
            certificate_id = %certificate.id,
            error = %e,
            "failed to send certificate email"
        );
    }
}
