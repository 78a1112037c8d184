//! Query handlers for the Learning context.

use serde::Serialize;
use uuid::Uuid;
use verdant_core::error::DomainError;

use crate::application::activity_handlers::load_owned_enrollment;
use crate::domain::activity::ActivityResponse;
use crate::domain::enrollment::Enrollment;
use crate::domain::gamification::{LevelProgress, UserAchievement, UserStats};
use crate::domain::repository::{GamificationRepository, LearningRepository};

/// Lists the caller's enrollments.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if persistence fails.
pub async fn list_enrollments(
    user_id: Uuid,
    repo: &dyn LearningRepository,
) -> Result<Vec<Enrollment>, DomainError> {
    repo.list_enrollments(user_id).await
}

/// Lists saved responses of one of the caller's enrollments.
///
/// # Errors
///
/// Returns `DomainError::NotFound` for a foreign or unknown enrollment.
pub async fn list_activity_responses(
    user_id: Uuid,
    enrollment_id: Uuid,
    lesson_id: Option<Uuid>,
    repo: &dyn LearningRepository,
) -> Result<Vec<ActivityResponse>, DomainError> {
    let enrollment = load_owned_enrollment(enrollment_id, user_id, repo).await?;
    repo.list_activity_responses(enrollment.id, lesson_id).await
}

/// Gamification overview for a learner.
#[derive(Debug, Clone, Serialize)]
pub struct GamificationSummary {
    /// Cumulative stats.
    pub stats: UserStats,
    /// Level position.
    pub level: LevelProgress,
    /// Unlocked achievements.
    pub achievements: Vec<UserAchievement>,
}

/// Loads the caller's gamification overview. Learners without activity get
/// zeroed stats.
///
/// # Errors
///
/// Returns `DomainError::Infrastructure` if persistence fails.
pub async fn get_gamification_summary(
    user_id: Uuid,
    repo: &dyn GamificationRepository,
) -> Result<GamificationSummary, DomainError> {
    let stats = repo
        .find_user_stats(user_id)
        .await?
        .unwrap_or_else(|| UserStats::new(user_id));
    let achievements = repo.list_achievements(user_id).await?;
    Ok(GamificationSummary {
        level: LevelProgress::for_xp(stats.total_xp),
        stats,
        achievements,
    })
}
