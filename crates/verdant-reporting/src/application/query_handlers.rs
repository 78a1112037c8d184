//! Query handlers for the ESG Reporting context.

use std::collections::BTreeSet;

use tracing::info;
use uuid::Uuid;
use verdant_core::clock::Clock;
use verdant_core::error::DomainError;
use verdant_core::profile::{ProfileRepository, require_profile};

use crate::domain::report::{EsgReport, ReportInput, build_esg_report};
use crate::domain::repository::ReportRepository;

/// Builds the ESG report of the corporate account administered by the caller.
///
/// # Errors
///
/// Returns `DomainError::Forbidden` if the caller is not a corporate admin,
/// `DomainError::NotFound` if the account is gone, and
/// `DomainError::Infrastructure` on persistence failures.
pub async fn generate_esg_report(
    user_id: Uuid,
    clock: &dyn Clock,
    profiles: &dyn ProfileRepository,
    repo: &dyn ReportRepository,
) -> Result<EsgReport, DomainError> {
    let caller = require_profile(user_id, profiles).await?;
    let account_id = caller.administered_account().ok_or_else(|| {
        DomainError::Forbidden(
            "Solo los administradores corporativos pueden generar reportes".to_owned(),
        )
    })?;
    let account = profiles
        .find_corporate_account(account_id)
        .await?
        .ok_or_else(|| DomainError::not_found("corporate account", account_id))?;

    let employees = profiles.list_account_members(account_id).await?;
    let enrollments = repo.list_employee_enrollments(account_id).await?;
    let module_ids: Vec<Uuid> = enrollments
        .iter()
        .map(|e| e.module_id)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    let modules = repo.list_modules_by_ids(&module_ids).await?;
    let tool_results = repo.list_employee_tool_results(account_id).await?;

    let report = build_esg_report(
        &ReportInput {
            account,
            employees,
            enrollments,
            modules,
            tool_results,
        },
        clock.now(),
    );

    info!(
        corporate_account_id = %account_id,
        employees = report.totals.employees,
        enrollments = report.totals.enrollments,
        "ESG report generated"
    );

    Ok(report)
}
