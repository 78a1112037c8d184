use serde::Serialize;

use super::ReportError;
use crate::domain::report::EsgReport;

#[derive(Serialize)]
struct EmployeeLine<'a> {
    full_name: &'a str,
    email: &'a str,
    enrollments: usize,
    completed_modules: usize,
    lessons_completed: i64,
    xp_earned: i64,
    average_progress: f64,
}

/// Encodes the per-employee table of a report as CSV, one header row first.
///
/// # Errors
///
/// Returns `ReportError::Csv` if a row cannot be written.
pub fn render_csv(report: &EsgReport) -> Result<Vec<u8>, ReportError> {
    let mut wtr = csv::Writer::from_writer(vec![]);
    if report.employees.is_empty() {
        wtr.write_record([
            "full_name",
            "email",
            "enrollments",
            "completed_modules",
            "lessons_completed",
            "xp_earned",
            "average_progress",
        ])?;
    }
    for e in &report.employees {
        wtr.serialize(EmployeeLine {
            full_name: &e.full_name,
            email: &e.email,
            enrollments: e.enrollments,
            completed_modules: e.completed_modules,
            lessons_completed: e.lessons_completed,
            xp_earned: e.xp_earned,
            average_progress: e.average_progress,
        })?;
    }
    wtr.into_inner().map_err(|e| ReportError::Csv(e.to_string()))
}
