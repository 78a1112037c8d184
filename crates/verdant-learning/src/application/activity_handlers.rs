//! Saving activity responses.

use tracing::{info, warn};
use uuid::Uuid;
use verdant_core::clock::Clock;
use verdant_core::command::Command;
use verdant_core::error::DomainError;

use crate::application::LearningSettings;
use crate::domain::activity::ActivityResponse;
use crate::domain::commands::SaveActivity;
use crate::domain::enrollment::Enrollment;
use crate::domain::repository::LearningRepository;

/// Loads an enrollment owned by `user_id`.
///
/// # Errors
///
/// Returns `DomainError::NotFound` if the enrollment does not exist or
/// belongs to someone else.
pub async fn load_owned_enrollment(
    enrollment_id: Uuid,
    user_id: Uuid,
    repo: &dyn LearningRepository,
) -> Result<Enrollment, DomainError> {
    let enrollment = repo
        .find_enrollment(enrollment_id)
        .await?
        .ok_or_else(|| DomainError::not_found("enrollment", enrollment_id))?;
    enrollment.ensure_owned_by(user_id)?;
    Ok(enrollment)
}

/// Handles the `SaveActivity` command: normalizes the payload, merges it
/// into the stored response, and marks the enrollment as started.
///
/// The legacy mirror write is best-effort.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for a foreign or unknown enrollment or a
/// lesson outside the enrolled module, and `DomainError::Validation` for an
/// invalid payload.
pub async fn handle_save_activity(
    command: &SaveActivity,
    clock: &dyn Clock,
    settings: &LearningSettings,
    repo: &dyn LearningRepository,
) -> Result<ActivityResponse, DomainError> {
    let mut enrollment =
        load_owned_enrollment(command.enrollment_id, command.user_id, repo).await?;
    let patch = command.payload.clone().normalize()?;

    let lesson = repo
        .find_lesson(patch.lesson_id)
        .await?
        .filter(|l| l.module_id == enrollment.module_id)
        .ok_or_else(|| DomainError::not_found("lesson", patch.lesson_id))?;
    if patch.module_id != enrollment.module_id {
        return Err(DomainError::validation(
            "La lección no pertenece al módulo inscrito",
        ));
    }

    let now = clock.now();
    let existing = repo.find_activity_response(enrollment.id, lesson.id).await?;
    let is_new = existing.is_none();
    let response = ActivityResponse::merge(existing, patch, &enrollment, now);
    repo.upsert_activity_response(&response).await?;

    if settings.legacy_dual_write {
        if let Err(e) = repo.write_legacy_response(&response).await {
            warn!(
                enrollment_id = %enrollment.id,
                lesson_id = %lesson.id,
                error = %e,
                "legacy response mirror failed"
            );
        }
    }

    enrollment.touch(now);
    repo.update_enrollment(&enrollment).await?;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        enrollment_id = %enrollment.id,
        lesson_id = %lesson.id,
        created = is_new,
        completion_percentage = response.completion_percentage,
        "activity saved"
    );

    Ok(response)
}
