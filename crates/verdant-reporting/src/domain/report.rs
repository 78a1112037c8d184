//! ESG report model and assembly.
//!
//! The report is computed in memory from plain rows so the arithmetic can be
//! tested without a database.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use uuid::Uuid;
use verdant_core::core_value::CoreValue;
use verdant_core::error::DomainError;
use verdant_core::profile::{CorporateAccount, Profile};

/// Tool-result keys summed into impact metrics.
pub const IMPACT_KEYS: [&str; 4] = [
    "co2_reduction_kg",
    "water_saved_liters",
    "waste_diverted_kg",
    "cost_savings",
];

/// Export format requested by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReportFormat {
    /// Structured JSON.
    #[default]
    Json,
    /// One row per employee.
    Csv,
    /// Printable single page.
    Pdf,
}

impl FromStr for ReportFormat {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "csv" => Ok(Self::Csv),
            "pdf" => Ok(Self::Pdf),
            other => Err(DomainError::validation(format!(
                "Formato de reporte no soportado: {other}"
            ))),
        }
    }
}

/// An employee enrollment, as read for reporting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrollmentRow {
    /// Employee.
    pub user_id: Uuid,
    /// Module.
    pub module_id: Uuid,
    /// `not_started`, `in_progress` or `completed`.
    pub status: String,
    /// 0..=100.
    pub progress_percentage: i32,
    /// Whether the module is complete.
    pub completed: bool,
    /// XP earned in the module.
    pub xp_earned: i64,
    /// Lessons completed in the module.
    pub lessons_completed: i64,
}

/// A module referenced by the report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleRow {
    /// Module id.
    pub id: Uuid,
    /// Title.
    pub title: String,
    /// Core value.
    pub core_value: CoreValue,
}

/// A saved tool result of an employee.
#[derive(Debug, Clone, PartialEq)]
pub struct ToolResultRow {
    /// Employee.
    pub user_id: Uuid,
    /// Tool name.
    pub tool_name: String,
    /// Tool output.
    pub result: Value,
}

/// Everything the report is computed from.
#[derive(Debug, Clone)]
pub struct ReportInput {
    /// The corporate account.
    pub account: CorporateAccount,
    /// Profiles of the account.
    pub employees: Vec<Profile>,
    /// Their enrollments.
    pub enrollments: Vec<EnrollmentRow>,
    /// Modules referenced by the enrollments.
    pub modules: Vec<ModuleRow>,
    /// Their tool results.
    pub tool_results: Vec<ToolResultRow>,
}

/// Headline numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ReportTotals {
    /// Profiles in the account.
    pub employees: usize,
    /// Employees who started at least one module.
    pub active_employees: usize,
    /// Enrollments.
    pub enrollments: usize,
    /// Completed enrollments.
    pub completed_enrollments: usize,
    /// Completed share of enrollments, percent with one decimal.
    pub completion_rate: f64,
    /// XP earned.
    pub total_xp: i64,
    /// Lessons completed.
    pub lessons_completed: i64,
}

/// Per core value breakdown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoreValueSummary {
    /// Core value.
    pub core_value: CoreValue,
    /// Display label.
    pub label: String,
    /// Enrollments in modules with this value.
    pub enrollments: usize,
    /// Completed ones.
    pub completions: usize,
}

/// Per module breakdown.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModuleSummary {
    /// Module id.
    pub module_id: Uuid,
    /// Title.
    pub title: String,
    /// Core value.
    pub core_value: CoreValue,
    /// Enrollments.
    pub enrollments: usize,
    /// Completed enrollments.
    pub completions: usize,
    /// Mean progress, percent with one decimal.
    pub average_progress: f64,
}

/// Per employee row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EmployeeSummary {
    /// Employee.
    pub user_id: Uuid,
    /// Name.
    pub full_name: String,
    /// Email.
    pub email: String,
    /// Enrollments.
    pub enrollments: usize,
    /// Completed modules.
    pub completed_modules: usize,
    /// Lessons completed.
    pub lessons_completed: i64,
    /// XP earned.
    pub xp_earned: i64,
    /// Mean progress, percent with one decimal.
    pub average_progress: f64,
}

/// Tool usage counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ToolUsage {
    /// Tool name.
    pub tool_name: String,
    /// Saved results.
    pub uses: usize,
    /// Distinct employees.
    pub users: usize,
}

/// Measured impact summed from tool results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct ImpactMetrics {
    /// CO₂ avoided, kg.
    pub co2_reduction_kg: f64,
    /// Water saved, liters.
    pub water_saved_liters: f64,
    /// Waste diverted from landfill, kg.
    pub waste_diverted_kg: f64,
    /// Money saved.
    pub cost_savings: f64,
}

/// The ESG impact report of a corporate account.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EsgReport {
    /// Account id.
    pub corporate_account_id: Uuid,
    /// Company name.
    pub company_name: String,
    /// Generation time.
    pub generated_at: DateTime<Utc>,
    /// Headline numbers.
    pub totals: ReportTotals,
    /// Breakdown by core value, in canonical value order.
    pub core_values: Vec<CoreValueSummary>,
    /// Breakdown by module, by title.
    pub modules: Vec<ModuleSummary>,
    /// One row per employee, by name.
    pub employees: Vec<EmployeeSummary>,
    /// Tool usage, most used first.
    pub tools: Vec<ToolUsage>,
    /// Measured impact.
    pub impact: ImpactMetrics,
}

#[allow(clippy::cast_precision_loss)]
fn ratio_percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        round1(part as f64 * 100.0 / whole as f64)
    }
}

#[allow(clippy::cast_precision_loss)]
fn mean_progress<'a>(rows: impl Iterator<Item = &'a EnrollmentRow>) -> f64 {
    let (sum, count) = rows.fold((0_i64, 0_usize), |(s, c), r| {
        (s + i64::from(r.progress_percentage), c + 1)
    });
    if count == 0 {
        0.0
    } else {
        round1(sum as f64 / count as f64)
    }
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn numeric(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn add_impact(impact: &mut ImpactMetrics, result: &Value) {
    let Some(object) = result.as_object() else {
        return;
    };
    for key in IMPACT_KEYS {
        if let Some(v) = object.get(key).and_then(numeric) {
            match key {
                "co2_reduction_kg" => impact.co2_reduction_kg += v,
                "water_saved_liters" => impact.water_saved_liters += v,
                "waste_diverted_kg" => impact.waste_diverted_kg += v,
                _ => impact.cost_savings += v,
            }
        }
    }
}

/// Computes the report.
#[must_use]
pub fn build_esg_report(input: &ReportInput, now: DateTime<Utc>) -> EsgReport {
    let modules: HashMap<Uuid, &ModuleRow> = input.modules.iter().map(|m| (m.id, m)).collect();

    let enrollments = input.enrollments.len();
    let completed_enrollments = input.enrollments.iter().filter(|e| e.completed).count();
    let active: HashSet<Uuid> = input
        .enrollments
        .iter()
        .filter(|e| e.status != "not_started" || e.lessons_completed > 0)
        .map(|e| e.user_id)
        .collect();

    let totals = ReportTotals {
        employees: input.employees.len(),
        active_employees: active.len(),
        enrollments,
        completed_enrollments,
        completion_rate: ratio_percent(completed_enrollments, enrollments),
        total_xp: input.enrollments.iter().map(|e| e.xp_earned).sum(),
        lessons_completed: input.enrollments.iter().map(|e| e.lessons_completed).sum(),
    };

    let mut by_value: BTreeMap<CoreValue, (usize, usize)> = BTreeMap::new();
    for e in &input.enrollments {
        if let Some(module) = modules.get(&e.module_id) {
            let entry = by_value.entry(module.core_value).or_default();
            entry.0 += 1;
            if e.completed {
                entry.1 += 1;
            }
        }
    }
    let core_values = by_value
        .into_iter()
        .map(|(value, (enrolled, completed))| CoreValueSummary {
            core_value: value,
            label: value.label().to_owned(),
            enrollments: enrolled,
            completions: completed,
        })
        .collect();

    let mut module_summaries: Vec<ModuleSummary> = input
        .modules
        .iter()
        .map(|m| {
            let rows: Vec<&EnrollmentRow> = input
                .enrollments
                .iter()
                .filter(|e| e.module_id == m.id)
                .collect();
            ModuleSummary {
                module_id: m.id,
                title: m.title.clone(),
                core_value: m.core_value,
                enrollments: rows.len(),
                completions: rows.iter().filter(|e| e.completed).count(),
                average_progress: mean_progress(rows.iter().copied()),
            }
        })
        .collect();
    module_summaries.sort_by(|a, b| a.title.cmp(&b.title));

    let mut employees: Vec<EmployeeSummary> = input
        .employees
        .iter()
        .map(|p| {
            let rows: Vec<&EnrollmentRow> = input
                .enrollments
                .iter()
                .filter(|e| e.user_id == p.id)
                .collect();
            EmployeeSummary {
                user_id: p.id,
                full_name: p.full_name.clone(),
                email: p.email.clone(),
                enrollments: rows.len(),
                completed_modules: rows.iter().filter(|e| e.completed).count(),
                lessons_completed: rows.iter().map(|e| e.lessons_completed).sum(),
                xp_earned: rows.iter().map(|e| e.xp_earned).sum(),
                average_progress: mean_progress(rows.iter().copied()),
            }
        })
        .collect();
    employees.sort_by(|a, b| a.full_name.cmp(&b.full_name));

    let mut tool_map: BTreeMap<&str, (usize, HashSet<Uuid>)> = BTreeMap::new();
    let mut impact = ImpactMetrics::default();
    for row in &input.tool_results {
        let entry = tool_map.entry(row.tool_name.as_str()).or_default();
        entry.0 += 1;
        entry.1.insert(row.user_id);
        add_impact(&mut impact, &row.result);
    }
    let mut tools: Vec<ToolUsage> = tool_map
        .into_iter()
        .map(|(name, (uses, users))| ToolUsage {
            tool_name: name.to_owned(),
            uses,
            users: users.len(),
        })
        .collect();
    tools.sort_by(|a, b| b.uses.cmp(&a.uses).then_with(|| a.tool_name.cmp(&b.tool_name)));

    EsgReport {
        corporate_account_id: input.account.id,
        company_name: input.account.company_name.clone(),
        generated_at: now,
        totals,
        core_values,
        modules: module_summaries,
        employees,
        tools,
        impact,
    }
}
