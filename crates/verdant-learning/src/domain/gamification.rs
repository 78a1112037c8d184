//! XP, levels, streaks and achievements.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use verdant_core::error::DomainError;

/// A learner's cumulative stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserStats {
    /// Learner.
    pub user_id: Uuid,
    /// Lifetime XP.
    pub total_xp: i64,
    /// Level derived from `total_xp`.
    pub level: i32,
    /// Consecutive days with activity, ending at `last_activity_date`.
    pub current_streak: i32,
    /// Best streak ever.
    pub longest_streak: i32,
    /// Lessons completed across modules.
    pub lessons_completed: i64,
    /// Modules completed.
    pub modules_completed: i64,
    /// Day of the last completion.
    pub last_activity_date: Option<NaiveDate>,
}

impl UserStats {
    /// Stats for a learner with no activity.
    #[must_use]
    pub fn new(user_id: Uuid) -> Self {
        Self {
            user_id,
            total_xp: 0,
            level: 1,
            current_streak: 0,
            longest_streak: 0,
            lessons_completed: 0,
            modules_completed: 0,
            last_activity_date: None,
        }
    }

    /// Applies a lesson completion on `today`.
    pub fn record_lesson(&mut self, xp: i64, module_completed: bool, today: NaiveDate) {
        self.total_xp += xp;
        self.level = level_for_xp(self.total_xp);
        self.lessons_completed += 1;
        if module_completed {
            self.modules_completed += 1;
        }
        self.record_activity(today);
    }

    /// Applies a module completion that is recognised after its last
    /// lesson was already counted.
    pub fn record_module_completion(&mut self, bonus_xp: i64, today: NaiveDate) {
        self.total_xp += bonus_xp;
        self.level = level_for_xp(self.total_xp);
        self.modules_completed += 1;
        self.record_activity(today);
    }

    /// Advances the streak for activity on `today`: the next day extends it,
    /// the same day keeps it, anything else restarts it.
    pub fn record_activity(&mut self, today: NaiveDate) {
        self.current_streak = match self.last_activity_date {
            Some(last) if last == today => self.current_streak.max(1),
            Some(last) if last.succ_opt() == Some(today) => self.current_streak + 1,
            _ => 1,
        };
        self.longest_streak = self.longest_streak.max(self.current_streak);
        self.last_activity_date = Some(today);
    }
}

/// XP needed to reach `level`: `50·n·(n−1)`.
#[must_use]
pub fn xp_for_level(level: i32) -> i64 {
    let n = i64::from(level.max(1));
    50 * n * (n - 1)
}

/// Level reached with `total_xp`.
#[must_use]
pub fn level_for_xp(total_xp: i64) -> i32 {
    let mut level = 1;
    while xp_for_level(level + 1) <= total_xp {
        level += 1;
    }
    level
}

/// Position inside the current level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LevelProgress {
    /// Current level.
    pub level: i32,
    /// Lifetime XP.
    pub total_xp: i64,
    /// XP at which the current level started.
    pub current_level_xp: i64,
    /// XP at which the next level starts.
    pub next_level_xp: i64,
    /// XP still needed for the next level.
    pub xp_to_next_level: i64,
}

impl LevelProgress {
    /// Computes progress for `total_xp`.
    #[must_use]
    pub fn for_xp(total_xp: i64) -> Self {
        let level = level_for_xp(total_xp);
        let next_level_xp = xp_for_level(level + 1);
        Self {
            level,
            total_xp,
            current_level_xp: xp_for_level(level),
            next_level_xp,
            xp_to_next_level: next_level_xp - total_xp,
        }
    }
}

/// Unlockable achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Achievement {
    /// Completed a first lesson.
    FirstLesson,
    /// Completed a first module.
    FirstModule,
    /// Completed five modules.
    ModuleCollector,
    /// Reached a seven-day streak.
    WeekStreak,
    /// Earned 1000 XP.
    Xp1000,
}

impl Achievement {
    /// Every achievement, in display order.
    pub const ALL: [Self; 5] = [
        Self::FirstLesson,
        Self::FirstModule,
        Self::ModuleCollector,
        Self::WeekStreak,
        Self::Xp1000,
    ];

    /// Database representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::FirstLesson => "first_lesson",
            Self::FirstModule => "first_module",
            Self::ModuleCollector => "module_collector",
            Self::WeekStreak => "week_streak",
            Self::Xp1000 => "xp_1000",
        }
    }

    /// Whether the stats satisfy this achievement.
    #[must_use]
    pub fn is_satisfied_by(self, stats: &UserStats) -> bool {
        match self {
            Self::FirstLesson => stats.lessons_completed >= 1,
            Self::FirstModule => stats.modules_completed >= 1,
            Self::ModuleCollector => stats.modules_completed >= 5,
            Self::WeekStreak => stats.longest_streak >= 7,
            Self::Xp1000 => stats.total_xp >= 1_000,
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Achievement {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| DomainError::infrastructure(format!("unknown achievement: {s}")))
    }
}

/// An unlocked achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserAchievement {
    /// Learner.
    pub user_id: Uuid,
    /// Achievement.
    pub achievement: Achievement,
    /// Unlock time.
    pub unlocked_at: DateTime<Utc>,
}

/// Achievements satisfied by `stats` that are not yet unlocked.
#[must_use]
pub fn newly_unlocked(stats: &UserStats, unlocked: &[Achievement]) -> Vec<Achievement> {
    Achievement::ALL
        .into_iter()
        .filter(|a| !unlocked.contains(a) && a.is_satisfied_by(stats))
        .collect()
}
