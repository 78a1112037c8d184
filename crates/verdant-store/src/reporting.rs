use async_trait::async_trait;
use sqlx::Row;
use uuid::Uuid;
use verdant_core::error::DomainError;
use verdant_reporting::domain::report::{EnrollmentRow, ModuleRow, ToolResultRow};
use verdant_reporting::domain::repository::ReportRepository;

use crate::PgStore;
use crate::error::{db_error, parse_column};

#[async_trait]
impl ReportRepository for PgStore {
    async fn list_employee_enrollments(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<EnrollmentRow>, DomainError> {
        let rows = sqlx::query(
            "SELECT e.user_id, e.module_id, e.status, e.progress_percentage, e.completed, \
                    e.xp_earned, \
                    (SELECT COUNT(*) FROM lesson_completions c \
                      WHERE c.enrollment_id = e.id)::bigint AS lessons_completed \
             FROM course_enrollments e \
             JOIN profiles p ON p.id = e.user_id \
             WHERE p.corporate_account_id = $1 \
             ORDER BY e.purchased_at",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter()
            .map(|row| {
                Ok(EnrollmentRow {
                    user_id: row.try_get("user_id").map_err(db_error)?,
                    module_id: row.try_get("module_id").map_err(db_error)?,
                    status: row.try_get("status").map_err(db_error)?,
                    progress_percentage: row.try_get("progress_percentage").map_err(db_error)?,
                    completed: row.try_get("completed").map_err(db_error)?,
                    xp_earned: row.try_get("xp_earned").map_err(db_error)?,
                    lessons_completed: row.try_get("lessons_completed").map_err(db_error)?,
                })
            })
            .collect()
    }

    async fn list_modules_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ModuleRow>, DomainError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        let rows = sqlx::query(
            "SELECT id, title, core_value FROM marketplace_modules \
             WHERE id = ANY($1) ORDER BY title",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter()
            .map(|row| {
                Ok(ModuleRow {
                    id: row.try_get("id").map_err(db_error)?,
                    title: row.try_get("title").map_err(db_error)?,
                    core_value: parse_column(row, "core_value")?,
                })
            })
            .collect()
    }

    async fn list_employee_tool_results(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<ToolResultRow>, DomainError> {
        let rows = sqlx::query(
            "SELECT r.user_id, t.key AS tool_name, t.value AS result \
             FROM activity_responses r \
             JOIN profiles p ON p.id = r.user_id \
             CROSS JOIN LATERAL jsonb_each(r.tool_results) AS t \
             WHERE p.corporate_account_id = $1 \
             ORDER BY r.created_at, t.key",
        )
        .bind(account_id)
        .fetch_all(&self.pool)
        .await
        .map_err(db_error)?;
        rows.iter()
            .map(|row| {
                Ok(ToolResultRow {
                    user_id: row.try_get("user_id").map_err(db_error)?,
                    tool_name: row.try_get("tool_name").map_err(db_error)?,
                    result: row.try_get("result").map_err(db_error)?,
                })
            })
            .collect()
    }
}
