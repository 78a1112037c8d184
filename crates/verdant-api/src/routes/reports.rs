//! Routes for the ESG Reporting bounded context.

use axum::extract::{Query, State};
use axum::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use tracing::instrument;
use verdant_core::error::DomainError;
use verdant_reporting::application::query_handlers::generate_esg_report;
use verdant_reporting::domain::report::ReportFormat;
use verdant_reporting::render::{PdfOptions, render_csv, render_pdf};

use crate::auth::AuthUser;
use crate::error::ApiError;
use crate::state::AppState;

/// Query string of GET /esg.
#[derive(Debug, Deserialize)]
pub struct EsgQuery {
    /// `json`, `csv` or `pdf`; JSON when absent.
    pub format: Option<String>,
    /// Include the per-tool section in PDF exports.
    pub include_tools: Option<bool>,
}

/// GET /esg
#[instrument(skip(state), fields(user_id = %user.user_id))]
async fn esg_report(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<EsgQuery>,
) -> Result<Response, ApiError> {
    let format = query
        .format
        .as_deref()
        .map(str::parse::<ReportFormat>)
        .transpose()?
        .unwrap_or_default();
    let report = generate_esg_report(
        user.user_id,
        state.clock.as_ref(),
        &*state.profiles,
        &*state.reports,
    )
    .await?;
    let stem = format!("reporte-esg-{}", report.generated_at.format("%Y-%m-%d"));

    let response = match format {
        ReportFormat::Json => Json(report).into_response(),
        ReportFormat::Csv => {
            let bytes = render_csv(&report).map_err(DomainError::from)?;
            (
                [
                    (CONTENT_TYPE, "text/csv; charset=utf-8".to_owned()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{stem}.csv\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
        ReportFormat::Pdf => {
            let options = PdfOptions {
                include_tools: query.include_tools.unwrap_or(true),
            };
            let bytes = render_pdf(&report, &options).map_err(DomainError::from)?;
            (
                [
                    (CONTENT_TYPE, "application/pdf".to_owned()),
                    (
                        CONTENT_DISPOSITION,
                        format!("attachment; filename=\"{stem}.pdf\""),
                    ),
                ],
                bytes,
            )
                .into_response()
        }
    };
    Ok(response)
}

/// Returns the router for corporate reports.
pub fn router() -> Router<AppState> {
    Router::new().route("/esg", get(esg_report))
}
