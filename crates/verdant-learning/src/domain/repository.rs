//! Persistence contracts for the Learning context.

use async_trait::async_trait;
use uuid::Uuid;
use verdant_core::error::DomainError;

use super::activity::ActivityResponse;
use super::enrollment::{Enrollment, LessonCompletion};
use super::gamification::{UserAchievement, UserStats};
use super::lesson::LessonDefinition;

/// Repository for enrollments, lessons, saved responses and completions.
#[async_trait]
pub trait LearningRepository: Send + Sync {
    /// Lists a learner's enrollments, most recent purchase first.
    async fn list_enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>, DomainError>;

    /// Loads an enrollment by id.
    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, DomainError>;

    /// Persists status, progress, XP and timestamps of an enrollment.
    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError>;

    /// Loads a lesson by id.
    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<LessonDefinition>, DomainError>;

    /// Counts the lessons of a module.
    async fn count_lessons(&self, module_id: Uuid) -> Result<i64, DomainError>;

    /// Loads the saved response for one lesson.
    async fn find_activity_response(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<ActivityResponse>, DomainError>;

    /// Lists saved responses of an enrollment, optionally for one lesson.
    async fn list_activity_responses(
        &self,
        enrollment_id: Uuid,
        lesson_id: Option<Uuid>,
    ) -> Result<Vec<ActivityResponse>, DomainError>;

    /// Inserts or replaces the response for its (enrollment, lesson) pair.
    async fn upsert_activity_response(
        &self,
        response: &ActivityResponse,
    ) -> Result<(), DomainError>;

    /// Mirrors a response into the legacy `lesson_responses` table.
    async fn write_legacy_response(&self, response: &ActivityResponse) -> Result<(), DomainError>;

    /// Loads the completion of one lesson.
    async fn find_lesson_completion(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<LessonCompletion>, DomainError>;

    /// Stores a new completion together with the enrollment it advances, in
    /// one transaction. Returns `false`, writing nothing, if the lesson was
    /// already completed.
    async fn record_lesson_completion(
        &self,
        completion: &LessonCompletion,
        enrollment: &Enrollment,
    ) -> Result<bool, DomainError>;

    /// Counts completed lessons of an enrollment.
    async fn count_lesson_completions(&self, enrollment_id: Uuid) -> Result<i64, DomainError>;
}

/// Repository for gamification state.
#[async_trait]
pub trait GamificationRepository: Send + Sync {
    /// Loads a learner's stats.
    async fn find_user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>, DomainError>;

    /// Inserts or replaces a learner's stats.
    async fn save_user_stats(&self, stats: &UserStats) -> Result<(), DomainError>;

    /// Lists unlocked achievements, oldest first.
    async fn list_achievements(&self, user_id: Uuid) -> Result<Vec<UserAchievement>, DomainError>;

    /// Records an unlock; unlocking twice is a no-op.
    async fn unlock_achievement(&self, achievement: &UserAchievement) -> Result<(), DomainError>;
}
