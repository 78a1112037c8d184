//! Lesson completion and validation previews.

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;
use verdant_core::clock::Clock;
use verdant_core::command::Command;
use verdant_core::error::DomainError;

use crate::application::LearningSettings;
use crate::application::activity_handlers::load_owned_enrollment;
use crate::domain::commands::CompleteLesson;
use crate::domain::enrollment::{Enrollment, LessonCompletion};
use crate::domain::gamification::{Achievement, UserAchievement, UserStats, newly_unlocked};
use crate::domain::lesson::LessonDefinition;
use crate::domain::repository::{GamificationRepository, LearningRepository};
use crate::domain::validation::{LessonValidationReport, validate_lesson};

/// Result of completing a lesson.
#[derive(Debug, Clone, Serialize)]
pub struct LessonCompletionOutcome {
    /// The stored completion.
    pub completion: LessonCompletion,
    /// The enrollment after the update.
    pub enrollment: Enrollment,
    /// Whether this call completed the lesson (false on repeats).
    pub newly_completed: bool,
    /// XP awarded by this call.
    pub xp_awarded: i64,
    /// Achievements unlocked by this call.
    pub achievements_unlocked: Vec<Achievement>,
    /// Validation that allowed the completion.
    pub validation: LessonValidationReport,
}

/// Completion rejected by quality control.
#[derive(Debug, Clone, Serialize)]
pub struct RejectedCompletion {
    /// Why the submission failed.
    pub validation: LessonValidationReport,
}

/// Either a completion or the validation that blocked it.
#[derive(Debug, Clone)]
pub enum CompletionResult {
    /// The lesson is complete.
    Completed(Box<LessonCompletionOutcome>),
    /// The submission did not pass validation.
    Rejected(RejectedCompletion),
}

async fn load_lesson(
    enrollment: &Enrollment,
    lesson_id: Uuid,
    repo: &dyn LearningRepository,
) -> Result<LessonDefinition, DomainError> {
    repo.find_lesson(lesson_id)
        .await?
        .filter(|l| l.module_id == enrollment.module_id)
        .ok_or_else(|| DomainError::not_found("lesson", lesson_id))
}

/// Validates the saved response for a lesson without completing it.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for a foreign enrollment or a lesson
/// outside the enrolled module.
pub async fn preview_lesson_validation(
    user_id: Uuid,
    enrollment_id: Uuid,
    lesson_id: Uuid,
    settings: &LearningSettings,
    repo: &dyn LearningRepository,
) -> Result<LessonValidationReport, DomainError> {
    let enrollment = load_owned_enrollment(enrollment_id, user_id, repo).await?;
    let lesson = load_lesson(&enrollment, lesson_id, repo).await?;
    let response = repo.find_activity_response(enrollment.id, lesson.id).await?;
    Ok(validate_lesson(
        &lesson.submission(response.as_ref()),
        &settings.thresholds,
    ))
}

/// Handles the `CompleteLesson` command.
///
/// The completion and the enrollment it advances are stored together.
/// Completing an already completed lesson returns the stored completion and
/// awards nothing beyond a module bonus that was still owed.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for a foreign enrollment or unknown
/// lesson, and `DomainError::Infrastructure` if persistence fails.
pub async fn handle_complete_lesson(
    command: &CompleteLesson,
    clock: &dyn Clock,
    settings: &LearningSettings,
    repo: &dyn LearningRepository,
    gamification: &dyn GamificationRepository,
) -> Result<CompletionResult, DomainError> {
    let mut enrollment =
        load_owned_enrollment(command.enrollment_id, command.user_id, repo).await?;
    let lesson = load_lesson(&enrollment, command.lesson_id, repo).await?;
    let response = repo.find_activity_response(enrollment.id, lesson.id).await?;
    let validation = validate_lesson(&lesson.submission(response.as_ref()), &settings.thresholds);

    if let Some(existing) = repo.find_lesson_completion(enrollment.id, lesson.id).await? {
        return catch_up(command, existing, enrollment, validation, clock, repo, gamification)
            .await;
    }

    if !validation.valid {
        info!(
            command = command.command_type(),
            correlation_id = %command.correlation_id(),
            actor = ?command.actor_id(),
            enrollment_id = %enrollment.id,
            lesson_id = %lesson.id,
            score = validation.score,
            "lesson completion rejected by validation"
        );
        return Ok(CompletionResult::Rejected(RejectedCompletion { validation }));
    }

    let now = clock.now();
    let mut completion = LessonCompletion {
        enrollment_id: enrollment.id,
        lesson_id: lesson.id,
        score: i32::try_from(validation.score).unwrap_or(100),
        xp_awarded: 0,
        completed_at: now,
    };

    let completed_lessons = repo.count_lesson_completions(enrollment.id).await? + 1;
    let total_lessons = repo.count_lessons(enrollment.module_id).await?;
    let was_completed = enrollment.completed;
    let xp_awarded = enrollment.record_lesson_completion(
        completed_lessons,
        total_lessons,
        i64::from(lesson.xp_reward),
        now,
    );
    completion.xp_awarded = xp_awarded;

    if !repo.record_lesson_completion(&completion, &enrollment).await? {
        // A concurrent request completed the lesson first.
        let existing = repo
            .find_lesson_completion(enrollment.id, lesson.id)
            .await?
            .unwrap_or(completion);
        let enrollment = load_owned_enrollment(command.enrollment_id, command.user_id, repo).await?;
        return catch_up(command, existing, enrollment, validation, clock, repo, gamification)
            .await;
    }

    let module_completed = enrollment.completed && !was_completed;
    let today = clock.today();
    let achievements_unlocked =
        update_gamification(enrollment.user_id, clock, gamification, |stats| {
            stats.record_lesson(xp_awarded, module_completed, today);
        })
        .await;

    info!(
        command = command.command_type(),
        correlation_id = %command.correlation_id(),
        actor = ?command.actor_id(),
        enrollment_id = %enrollment.id,
        lesson_id = %lesson.id,
        xp_awarded,
        progress_percentage = enrollment.progress_percentage,
        module_completed,
        "lesson completed"
    );

    Ok(CompletionResult::Completed(Box::new(LessonCompletionOutcome {
        completion,
        enrollment,
        newly_completed: true,
        xp_awarded,
        achievements_unlocked,
        validation,
    })))
}

/// Answers a repeated completion. Progress is recounted from the stored
/// completions so an enrollment left behind by concurrent completions of
/// different lessons catches up, awarding the module bonus if it finishes.
async fn catch_up(
    command: &CompleteLesson,
    existing: LessonCompletion,
    mut enrollment: Enrollment,
    validation: LessonValidationReport,
    clock: &dyn Clock,
    repo: &dyn LearningRepository,
    gamification: &dyn GamificationRepository,
) -> Result<CompletionResult, DomainError> {
    let completed_lessons = repo.count_lesson_completions(enrollment.id).await?;
    let total_lessons = repo.count_lessons(enrollment.module_id).await?;
    let before = enrollment.progress_percentage;
    let bonus_xp = enrollment.advance_progress(completed_lessons, total_lessons, clock.now());

    let mut achievements_unlocked = Vec::new();
    if enrollment.progress_percentage != before {
        repo.update_enrollment(&enrollment).await?;
        info!(
            command = command.command_type(),
            correlation_id = %command.correlation_id(),
            actor = ?command.actor_id(),
            enrollment_id = %enrollment.id,
            progress_percentage = enrollment.progress_percentage,
            bonus_xp,
            "enrollment progress caught up"
        );
    }
    if bonus_xp > 0 {
        let today = clock.today();
        achievements_unlocked =
            update_gamification(enrollment.user_id, clock, gamification, |stats| {
                stats.record_module_completion(bonus_xp, today);
            })
            .await;
    }

    Ok(CompletionResult::Completed(Box::new(LessonCompletionOutcome {
        completion: existing,
        enrollment,
        newly_completed: false,
        xp_awarded: bonus_xp,
        achievements_unlocked,
        validation,
    })))
}

/// Updates stats and unlocks achievements. Failures are logged; the lesson
/// completion itself has already been stored.
async fn update_gamification(
    user_id: Uuid,
    clock: &dyn Clock,
    repo: &dyn GamificationRepository,
    apply: impl FnOnce(&mut UserStats) + Send,
) -> Vec<Achievement> {
    let result: Result<Vec<Achievement>, DomainError> = async {
        let mut stats = repo
            .find_user_stats(user_id)
            .await?
            .unwrap_or_else(|| UserStats::new(user_id));
        apply(&mut stats);
        repo.save_user_stats(&stats).await?;

        let unlocked: Vec<Achievement> = repo
            .list_achievements(user_id)
            .await?
            .into_iter()
            .map(|a| a.achievement)
            .collect();
        let fresh = newly_unlocked(&stats, &unlocked);
        for &achievement in &fresh {
            repo.unlock_achievement(&UserAchievement {
                user_id,
                achievement,
                unlocked_at: clock.now(),
            })
            .await?;
        }
        Ok(fresh)
    }
    .await;

    result.unwrap_or_else(|e| {
        warn!(user_id = %user_id, error = %e, "failed to update gamification stats");
        Vec::new()
    })
}
