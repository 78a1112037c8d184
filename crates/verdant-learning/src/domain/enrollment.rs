//! Enrollments and lesson completions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdant_core::error::DomainError;
use verdant_core::purchase::PurchaseType;

/// XP granted on top of the last lesson's reward when a module completes.
pub const MODULE_COMPLETION_BONUS_XP: i64 = 200;

/// Progress status of an enrollment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EnrollmentStatus {
    /// Purchased, never opened.
    NotStarted,
    /// At least one activity saved.
    InProgress,
    /// Every lesson completed.
    Completed,
}

impl EnrollmentStatus {
    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotStarted => "not_started",
            Self::InProgress => "in_progress",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for EnrollmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EnrollmentStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "not_started" => Ok(Self::NotStarted),
            "in_progress" => Ok(Self::InProgress),
            "completed" => Ok(Self::Completed),
            other => Err(DomainError::infrastructure(format!(
                "unknown enrollment status: {other}"
            ))),
        }
    }
}

/// A learner's access to a purchased module.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Enrollment {
    /// Enrollment identifier.
    pub id: Uuid,
    /// Learner.
    pub user_id: Uuid,
    /// Module.
    pub module_id: Uuid,
    /// Paying corporate account, if any.
    pub corporate_account_id: Option<Uuid>,
    /// Individual or corporate.
    pub purchase_type: PurchaseType,
    /// Amount attributed to this seat, in minor units.
    pub price_paid_cents: i64,
    /// Progress status.
    pub status: EnrollmentStatus,
    /// 0..=100; never decreases.
    pub progress_percentage: i32,
    /// Whether every lesson is complete.
    pub completed: bool,
    /// When the last lesson was completed.
    pub completed_at: Option<DateTime<Utc>>,
    /// XP earned in this module.
    pub xp_earned: i64,
    /// Purchase time.
    pub purchased_at: DateTime<Utc>,
    /// Last activity save or completion.
    pub last_accessed_at: Option<DateTime<Utc>>,
}

impl Enrollment {
    /// Checks that `user_id` owns the enrollment. Foreign enrollments are
    /// reported as missing so their existence does not leak.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::NotFound` for any other user.
    pub fn ensure_owned_by(&self, user_id: Uuid) -> Result<(), DomainError> {
        if self.user_id == user_id {
            Ok(())
        } else {
            Err(DomainError::not_found("enrollment", self.id))
        }
    }

    /// Records activity: starts the enrollment and refreshes the access time.
    pub fn touch(&mut self, now: DateTime<Utc>) {
        if self.status == EnrollmentStatus::NotStarted {
            self.status = EnrollmentStatus::InProgress;
        }
        self.last_accessed_at = Some(now);
    }

    /// Applies a newly completed lesson. Returns the XP awarded, including
    /// the module bonus when this completion finishes the module.
    pub fn record_lesson_completion(
        &mut self,
        completed_lessons: i64,
        total_lessons: i64,
        lesson_xp: i64,
        now: DateTime<Utc>,
    ) -> i64 {
        self.touch(now);
        self.xp_earned += lesson_xp;
        lesson_xp + self.advance_progress(completed_lessons, total_lessons, now)
    }

    /// Raises progress to `completed_lessons` out of `total_lessons` and
    /// completes the module once every lesson is done. Returns the module
    /// bonus (already added to `xp_earned`) when this call completes it.
    pub fn advance_progress(
        &mut self,
        completed_lessons: i64,
        total_lessons: i64,
        now: DateTime<Utc>,
    ) -> i64 {
        let progress = if total_lessons <= 0 {
            100
        } else {
            i32::try_from((completed_lessons * 100 / total_lessons).clamp(0, 100)).unwrap_or(100)
        };
        self.progress_percentage = self.progress_percentage.max(progress);

        if self.progress_percentage < 100 || self.completed {
            return 0;
        }
        self.completed = true;
        self.completed_at = Some(now);
        self.status = EnrollmentStatus::Completed;
        self.xp_earned += MODULE_COMPLETION_BONUS_XP;
        MODULE_COMPLETION_BONUS_XP
    }
}

/// A completed lesson within an enrollment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LessonCompletion {
    /// Enrollment.
    pub enrollment_id: Uuid,
    /// Lesson.
    pub lesson_id: Uuid,
    /// Validation score at completion.
    pub score: i32,
    /// XP awarded for this completion, including any module bonus.
    pub xp_awarded: i64,
    /// Completion time.
    pub completed_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn fixed_now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 15, 10, 0, 0).unwrap()
    }

    fn enrollment() -> Enrollment {
        Enrollment {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            module_id: Uuid::new_v4(),
            corporate_account_id: None,
            purchase_type: PurchaseType::Individual,
            price_paid_cents: 0,
            status: EnrollmentStatus::NotStarted,
            progress_percentage: 0,
            completed: false,
            completed_at: None,
            xp_earned: 0,
            purchased_at: fixed_now(),
            last_accessed_at: None,
        }
    }

    #[test]
    fn test_foreign_enrollment_reads_as_not_found() {
        let e = enrollment();
        assert!(e.ensure_owned_by(e.user_id).is_ok());
        assert!(matches!(
            e.ensure_owned_by(Uuid::new_v4()),
            Err(DomainError::NotFound { .. })
        ));
    }

    #[test]
    fn test_touch_starts_enrollment() {
        let mut e = enrollment();
        e.touch(fixed_now());
        assert_eq!(e.status, EnrollmentStatus::InProgress);
        assert_eq!(e.last_accessed_at, Some(fixed_now()));
    }

    #[test]
    fn test_progress_never_decreases() {
        let mut e = enrollment();
        e.progress_percentage = 75;
        e.record_lesson_completion(1, 4, 50, fixed_now());
        assert_eq!(e.progress_percentage, 75);
    }

    #[test]
    fn test_last_lesson_awards_module_bonus() {
        // Arrange
        let mut e = enrollment();
        e.record_lesson_completion(1, 2, 50, fixed_now());

        // Act
        let awarded = e.record_lesson_completion(2, 2, 50, fixed_now());

        // Assert
        assert_eq!(awarded, 250);
        assert_eq!(e.xp_earned, 300);
        assert!(e.completed);
        assert_eq!(e.status, EnrollmentStatus::Completed);
        assert_eq!(e.completed_at, Some(fixed_now()));
    }

    #[test]
    fn test_advance_progress_catches_up_and_completes_once() {
        let mut e = enrollment();
        e.progress_percentage = 50;
        e.xp_earned = 250;

        let bonus = e.advance_progress(2, 2, fixed_now());
        let again = e.advance_progress(2, 2, fixed_now());

        assert_eq!(bonus, MODULE_COMPLETION_BONUS_XP);
        assert_eq!(again, 0);
        assert!(e.completed);
        assert_eq!(e.status, EnrollmentStatus::Completed);
        assert_eq!(e.progress_percentage, 100);
        assert_eq!(e.xp_earned, 450);
    }
}
