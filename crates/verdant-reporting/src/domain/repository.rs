//! Persistence contract for the ESG Reporting context.

use async_trait::async_trait;
use uuid::Uuid;
use verdant_core::error::DomainError;

use super::report::{EnrollmentRow, ModuleRow, ToolResultRow};

/// Read-only access to the rows an ESG report is built from.
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// Lists the enrollments of every member of a corporate account, with
    /// their completed lesson counts.
    async fn list_employee_enrollments(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<EnrollmentRow>, DomainError>;

    /// Loads the given modules; unknown ids are skipped.
    async fn list_modules_by_ids(&self, ids: &[Uuid]) -> Result<Vec<ModuleRow>, DomainError>;

    /// Lists tool results saved by members of a corporate account.
    async fn list_employee_tool_results(
        &self,
        account_id: Uuid,
    ) -> Result<Vec<ToolResultRow>, DomainError>;
}
