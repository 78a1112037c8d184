use async_trait::async_trait;
use serde_json::{Map, Value, json};
use sqlx::Row;
use sqlx::PgExecutor;
use sqlx::postgres::PgRow;
use uuid::Uuid;
use verdant_core::error::DomainError;
use verdant_learning::domain::activity::ActivityResponse;
use verdant_learning::domain::enrollment::{Enrollment, LessonCompletion};
use verdant_learning::domain::gamification::{UserAchievement, UserStats};
use verdant_learning::domain::lesson::{ActivityConfig, LessonDefinition};
use verdant_learning::domain::repository::{GamificationRepository, LearningRepository};

use crate::PgStore;
use crate::error::{count, db_error, parse_column};
use crate::marketplace::lesson_from_row;

const ENROLLMENT_COLUMNS: &str = "id, user_id, module_id, corporate_account_id, purchase_type, \
     price_paid_cents, status, progress_percentage, completed, completed_at, xp_earned, \
     purchased_at, last_accessed_at";

const RESPONSE_COLUMNS: &str = "enrollment_id, lesson_id, module_id, user_id, activity_type, \
     responses, reflection, tool_results, evidence_urls, questions_answered, total_questions, \
     completion_percentage, time_spent_minutes, created_at, updated_at";

fn enrollment_from_row(row: &PgRow) -> Result<Enrollment, DomainError> {
    Ok(Enrollment {
        id: row.try_get("id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        module_id: row.try_get("module_id").map_err(db_error)?,
        corporate_account_id: row.try_get("corporate_account_id").map_err(db_error)?,
        purchase_type: parse_column(row, "purchase_type")?,
        price_paid_cents: row.try_get("price_paid_cents").map_err(db_error)?,
        status: parse_column(row, "status")?,
        progress_percentage: row.try_get("progress_percentage").map_err(db_error)?,
        completed: row.try_get("completed").map_err(db_error)?,
        completed_at: row.try_get("completed_at").map_err(db_error)?,
        xp_earned: row.try_get("xp_earned").map_err(db_error)?,
        purchased_at: row.try_get("purchased_at").map_err(db_error)?,
        last_accessed_at: row.try_get("last_accessed_at").map_err(db_error)?,
    })
}

async fn write_enrollment<'e, E>(executor: E, enrollment: &Enrollment) -> Result<(), DomainError>
where
    E: PgExecutor<'e>,
{
    let updated = sqlx::query(
        "UPDATE course_enrollments \
         SET status = $2, progress_percentage = $3, completed = $4, completed_at = $5, \
             xp_earned = $6, last_accessed_at = $7 \
         WHERE id = $1",
    )
    .bind(enrollment.id)
    .bind(enrollment.status.as_str())
    .bind(enrollment.progress_percentage)
    .bind(enrollment.completed)
    .bind(enrollment.completed_at)
    .bind(enrollment.xp_earned)
    .bind(enrollment.last_accessed_at)
    .execute(executor)
    .await
    .map_err(db_error)?
    .rows_affected();
    if updated == 0 {
        return Err(DomainError::not_found("enrollment", enrollment.id));
    }
    Ok(())
}

fn object(row: &PgRow, column: &str) -> Result<Map<String, Value>, DomainError> {
    Ok(match row.try_get::<Value, _>(column).map_err(db_error)? {
        Value::Object(map) => map,
        _ => Map::new(),
    })
}

fn response_from_row(row: &PgRow) -> Result<ActivityResponse, DomainError> {
    Ok(ActivityResponse {
        enrollment_id: row.try_get("enrollment_id").map_err(db_error)?,
        lesson_id: row.try_get("lesson_id").map_err(db_error)?,
        module_id: row.try_get("module_id").map_err(db_error)?,
        user_id: row.try_get("user_id").map_err(db_error)?,
        activity_type: row.try_get("activity_type").map_err(db_error)?,
        responses: object(row, "responses")?,
        reflection: row.try_get("reflection").map_err(db_error)?,
        tool_results: object(row, "tool_results")?,
        evidence_urls: row.try_get("evidence_urls").map_err(db_error)?,
        questions_answered: row.try_get("questions_answered").map_err(db_error)?,
        total_questions: row.try_get("total_questions").map_err(db_error)?,
        completion_percentage: row.try_get("completion_percentage").map_err(db_error)?,
        time_spent_minutes: row.try_get("time_spent_minutes").map_err(db_error)?,
        created_at: row.try_get("created_at").map_err(db_error)?,
        updated_at: row.try_get("updated_at").map_err(db_error)?,
    })
}

fn completion_from_row(row: &PgRow) -> Result<LessonCompletion, DomainError> {
    Ok(LessonCompletion {
        enrollment_id: row.try_get("enrollment_id").map_err(db_error)?,
        lesson_id: row.try_get("lesson_id").map_err(db_error)?,
        score: row.try_get("score").map_err(db_error)?,
        xp_awarded: row.try_get("xp_awarded").map_err(db_error)?,
        completed_at: row.try_get("completed_at").map_err(db_error)?,
    })
}

#[async_trait]
impl LearningRepository for PgStore {
    async fn list_enrollments(&self, user_id: Uuid) -> Result<Vec<Enrollment>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM course_enrollments \
             WHERE user_id = $1 ORDER BY purchased_at DESC"
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(enrollment_from_row).collect()
    }

    async fn find_enrollment(&self, id: Uuid) -> Result<Option<Enrollment>, DomainError> {
        sqlx::query(&format!(
            "SELECT {ENROLLMENT_COLUMNS} FROM course_enrollments WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(enrollment_from_row)
        .transpose()
    }

    async fn update_enrollment(&self, enrollment: &Enrollment) -> Result<(), DomainError> {
        write_enrollment(&self.pool, enrollment).await
    }

    async fn find_lesson(&self, lesson_id: Uuid) -> Result<Option<LessonDefinition>, DomainError> {
        let row = sqlx::query(
            "SELECT id, module_id, lesson_order, title, content, xp_reward, activity_type, \
             activity_config FROM module_lessons WHERE id = $1",
        )
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        let Some(row) = row else {
            return Ok(None);
        };
        let lesson = lesson_from_row(&row)?;
        Ok(Some(LessonDefinition {
            config: ActivityConfig::from_json(&lesson.activity_config),
            id: lesson.id,
            module_id: lesson.module_id,
            lesson_order: lesson.lesson_order,
            title: lesson.title,
            xp_reward: lesson.xp_reward,
            activity_type: lesson.activity_type,
        }))
    }

    async fn count_lessons(&self, module_id: Uuid) -> Result<i64, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) FROM module_lessons WHERE module_id = $1")
            .bind(module_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        count(&row)
    }

    async fn find_activity_response(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<ActivityResponse>, DomainError> {
        sqlx::query(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM activity_responses \
             WHERE enrollment_id = $1 AND lesson_id = $2"
        ))
        .bind(enrollment_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(response_from_row)
        .transpose()
    }

    async fn list_activity_responses(
        &self,
        enrollment_id: Uuid,
        lesson_id: Option<Uuid>,
    ) -> Result<Vec<ActivityResponse>, DomainError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESPONSE_COLUMNS} FROM activity_responses \
             WHERE enrollment_id = $1 AND ($2::uuid IS NULL OR lesson_id = $2) \
             ORDER BY created_at"
        ))
        .bind(enrollment_id)
        .bind(lesson_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter().map(response_from_row).collect()
    }

    async fn upsert_activity_response(
        &self,
        response: &ActivityResponse,
    ) -> Result<(), DomainError> {
        sqlx::query(&format!(
            "INSERT INTO activity_responses ({RESPONSE_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15) \
             ON CONFLICT (enrollment_id, lesson_id) DO UPDATE \
             SET activity_type = EXCLUDED.activity_type, \
                 responses = EXCLUDED.responses, \
                 reflection = EXCLUDED.reflection, \
                 tool_results = EXCLUDED.tool_results, \
                 evidence_urls = EXCLUDED.evidence_urls, \
                 questions_answered = EXCLUDED.questions_answered, \
                 total_questions = EXCLUDED.total_questions, \
                 completion_percentage = EXCLUDED.completion_percentage, \
                 time_spent_minutes = EXCLUDED.time_spent_minutes, \
                 updated_at = EXCLUDED.updated_at"
        ))
        .bind(response.enrollment_id)
        .bind(response.lesson_id)
        .bind(response.module_id)
        .bind(response.user_id)
        .bind(&response.activity_type)
        .bind(Value::Object(response.responses.clone()))
        .bind(&response.reflection)
        .bind(Value::Object(response.tool_results.clone()))
        .bind(&response.evidence_urls)
        .bind(response.questions_answered)
        .bind(response.total_questions)
        .bind(response.completion_percentage)
        .bind(response.time_spent_minutes)
        .bind(response.created_at)
        .bind(response.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn write_legacy_response(&self, response: &ActivityResponse) -> Result<(), DomainError> {
        let data = json!({
            "activity_type": response.activity_type,
            "responses": response.responses,
            "reflection": response.reflection,
            "tool_results": response.tool_results,
            "evidence_urls": response.evidence_urls,
            "completion_percentage": response.completion_percentage,
        });
        sqlx::query(
            "INSERT INTO lesson_responses (enrollment_id, lesson_id, user_id, response_data, \
             updated_at) VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (enrollment_id, lesson_id) DO UPDATE \
             SET response_data = EXCLUDED.response_data, updated_at = EXCLUDED.updated_at",
        )
        .bind(response.enrollment_id)
        .bind(response.lesson_id)
        .bind(response.user_id)
        .bind(data)
        .bind(response.updated_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn find_lesson_completion(
        &self,
        enrollment_id: Uuid,
        lesson_id: Uuid,
    ) -> Result<Option<LessonCompletion>, DomainError> {
        sqlx::query(
            "SELECT enrollment_id, lesson_id, score, xp_awarded, completed_at \
             FROM lesson_completions WHERE enrollment_id = $1 AND lesson_id = $2",
        )
        .bind(enrollment_id)
        .bind(lesson_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?
        .as_ref()
        .map(completion_from_row)
        .transpose()
    }

    async fn record_lesson_completion(
        &self,
        completion: &LessonCompletion,
        enrollment: &Enrollment,
    ) -> Result<bool, DomainError> {
        let mut tx = self.pool.begin().await.map_err(db_error)?;
        let inserted = sqlx::query(
            "INSERT INTO lesson_completions \
             (enrollment_id, lesson_id, score, xp_awarded, completed_at) \
             VALUES ($1, $2, $3, $4, $5) \
             ON CONFLICT (enrollment_id, lesson_id) DO NOTHING",
        )
        .bind(completion.enrollment_id)
        .bind(completion.lesson_id)
        .bind(completion.score)
        .bind(completion.xp_awarded)
        .bind(completion.completed_at)
        .execute(&mut *tx)
        .await
        .map_err(db_error)?
        .rows_affected();
        if inserted == 0 {
            tx.rollback().await.map_err(db_error)?;
            return Ok(false);
        }

        write_enrollment(&mut *tx, enrollment).await?;
        tx.commit().await.map_err(db_error)?;
        Ok(true)
    }

    async fn count_lesson_completions(&self, enrollment_id: Uuid) -> Result<i64, DomainError> {
        let row = sqlx::query("SELECT COUNT(*) FROM lesson_completions WHERE enrollment_id = $1")
            .bind(enrollment_id)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error)?;
        count(&row)
    }
}

#[async_trait]
impl GamificationRepository for PgStore {
    async fn find_user_stats(&self, user_id: Uuid) -> Result<Option<UserStats>, DomainError> {
        let row = sqlx::query(
            "SELECT user_id, total_xp, level, current_streak, longest_streak, \
             lessons_completed, modules_completed, last_activity_date \
             FROM user_stats WHERE user_id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error)?;
        row.map(|row| {
            Ok(UserStats {
                user_id: row.try_get("user_id").map_err(db_error)?,
                total_xp: row.try_get("total_xp").map_err(db_error)?,
                level: row.try_get("level").map_err(db_error)?,
                current_streak: row.try_get("current_streak").map_err(db_error)?,
                longest_streak: row.try_get("longest_streak").map_err(db_error)?,
                lessons_completed: row.try_get("lessons_completed").map_err(db_error)?,
                modules_completed: row.try_get("modules_completed").map_err(db_error)?,
                last_activity_date: row.try_get("last_activity_date").map_err(db_error)?,
            })
        })
        .transpose()
    }

    async fn save_user_stats(&self, stats: &UserStats) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO user_stats (user_id, total_xp, level, current_streak, longest_streak, \
             lessons_completed, modules_completed, last_activity_date) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
             ON CONFLICT (user_id) DO UPDATE \
             SET total_xp = EXCLUDED.total_xp, level = EXCLUDED.level, \
                 current_streak = EXCLUDED.current_streak, \
                 longest_streak = EXCLUDED.longest_streak, \
                 lessons_completed = EXCLUDED.lessons_completed, \
                 modules_completed = EXCLUDED.modules_completed, \
                 last_activity_date = EXCLUDED.last_activity_date",
        )
        .bind(stats.user_id)
        .bind(stats.total_xp)
        .bind(stats.level)
        .bind(stats.current_streak)
        .bind(stats.longest_streak)
        .bind(stats.lessons_completed)
        .bind(stats.modules_completed)
        .bind(stats.last_activity_date)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }

    async fn list_achievements(&self, user_id: Uuid) -> Result<Vec<UserAchievement>, DomainError> {
        let rows = sqlx::query(
            "SELECT user_id, achievement, unlocked_at FROM user_achievements \
             WHERE user_id = $1 ORDER BY unlocked_at",
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter()
            .map(|row| {
                Ok(UserAchievement {
                    user_id: row.try_get("user_id").map_err(db_error)?,
                    achievement: parse_column(row, "achievement")?,
                    unlocked_at: row.try_get("unlocked_at").map_err(db_error)?,
                })
            })
            .collect()
    }

    async fn unlock_achievement(&self, achievement: &UserAchievement) -> Result<(), DomainError> {
        sqlx::query(
            "INSERT INTO user_achievements (user_id, achievement, unlocked_at) \
             VALUES ($1, $2, $3) ON CONFLICT (user_id, achievement) DO NOTHING",
        )
        .bind(achievement.user_id)
        .bind(achievement.achievement.as_str())
        .bind(achievement.unlocked_at)
        .execute(&self.pool)
        .await
        .map_err(db_error)?;
        Ok(())
    }
}
