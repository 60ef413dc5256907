//! Report download endpoints.
//!
//! Handlers fetch their snapshot through the injected [`SourceClient`], then
//! hand it to a report variant on the blocking pool. Upstream failures turn
//! into empty data; only bad input (400) and assembly failures (500) reach
//! the client as errors.
//!
//! [`SourceClient`]: crate::sources::SourceClient

use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use chrono::Utc;
use serde::Deserialize;
use tracing::{error, info};

use super::AppState;
use crate::charts;
use crate::error::{AssemblyError, ReportError, ReportResult};
use crate::models::FieldRecord;
use crate::reports::{self, GeneratedReport, ReportContext};
use crate::sources::or_empty;
use crate::stats::StatsWindow;

// ---

const MAX_DAYS: u32 = 365;

pub fn router() -> Router<AppState> {
    // ---
    Router::new()
        .route("/reports/farmer", get(farmer_report))
        .route("/reports/fields/{field_id}/graphs", get(graphs_report))
        .route(
            "/reports/fields/{field_id}/recommendations",
            get(recommendations_report),
        )
        .route("/reports/advisories", get(advisories_report))
        .route("/reports/weather", get(weather_report))
}

#[derive(Debug, Deserialize)]
struct DaysQuery {
    days: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct AdvisoriesQuery {
    field_id: Option<String>,
}

#[derive(Debug, Deserialize)]
struct WeatherQuery {
    location: Option<String>,
}

impl IntoResponse for GeneratedReport {
    fn into_response(self) -> Response {
        // ---
        let disposition = content_disposition(&self.file_name);
        (
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, GeneratedReport::CONTENT_TYPE.to_string()),
                (header::CONTENT_DISPOSITION, disposition),
            ],
            self.bytes,
        )
            .into_response()
    }
}

/// Attachment header with an ASCII `filename` and, when the name is not
/// plain ASCII, an RFC 5987 `filename*` carrying the UTF-8 original.
fn content_disposition(file_name: &str) -> String {
    // ---
    if file_name.is_ascii() {
        return format!("attachment; filename=\"{file_name}\"");
    }

    let mut fallback = String::with_capacity(file_name.len());
    for c in file_name.chars() {
        let c = if c.is_ascii() { c } else { '_' };
        if !(c == '_' && fallback.ends_with('_')) {
            fallback.push(c);
        }
    }

    format!(
        "attachment; filename=\"{}\"; filename*=UTF-8''{}",
        fallback,
        urlencoding::encode(file_name)
    )
}

fn require_days(days: Option<u32>) -> ReportResult<u32> {
    // ---
    match days {
        Some(d) if (1..=MAX_DAYS).contains(&d) => Ok(d),
        Some(d) => Err(ReportError::InvalidRequest(format!(
            "days must be between 1 and {MAX_DAYS}, got {d}"
        ))),
        None => Err(ReportError::InvalidRequest(
            "days query parameter is required".to_string(),
        )),
    }
}

/// Field ids are interpolated into upstream paths.
fn require_field_id(raw: &str) -> ReportResult<String> {
    // ---
    let id = raw.trim();
    let valid = !id.is_empty()
        && id.len() <= 64
        && id.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    if valid {
        Ok(id.to_string())
    } else {
        Err(ReportError::InvalidRequest(format!("invalid field id {raw:?}")))
    }
}

/// Display name for a field, falling back to its id.
async fn field_name(state: &AppState, field_id: &str) -> String {
    // ---
    or_empty("fields", state.sources.field(field_id).await)
        .as_ref()
        .and_then(|f: &FieldRecord| f.name.clone())
        .unwrap_or_else(|| field_id.to_string())
}

/// Run report generation off the async workers.
async fn render<F>(state: &AppState, job: F) -> ReportResult<GeneratedReport>
where
    F: FnOnce(&ReportContext<'_>) -> ReportResult<GeneratedReport> + Send + 'static,
{
    // ---
    let labels = state.labels.clone();
    let brand = state.brand.clone();
    let today = Utc::now().date_naive();

    tokio::task::spawn_blocking(move || {
        let ctx = ReportContext::new(labels.as_ref(), today).with_brand(&brand);
        job(&ctx)
    })
    .await
    .map_err(|e| {
        error!("Report task failed: {}", e);
        ReportError::from(AssemblyError::Backend(format!("report task failed: {e}")))
    })?
}

async fn farmer_report(
    State(state): State<AppState>,
    Query(params): Query<DaysQuery>,
) -> ReportResult<GeneratedReport> {
    // ---
    let days = require_days(params.days)?;
    info!("GET /reports/farmer days={}", days);

    let snapshot = state.sources.farmer_snapshot(days).await;
    let window = StatsWindow::last_days(days, Utc::now());

    render(&state, move |ctx| reports::full::generate(&snapshot, &window, ctx)).await
}

async fn graphs_report(
    State(state): State<AppState>,
    Path(field_id): Path<String>,
    Query(params): Query<DaysQuery>,
) -> ReportResult<GeneratedReport> {
    // ---
    let field_id = require_field_id(&field_id)?;
    let days = require_days(params.days)?;
    info!("GET /reports/fields/{}/graphs days={}", field_id, days);

    let (name, readings) = tokio::join!(
        field_name(&state, &field_id),
        state.sources.sensor_history(&field_id, days)
    );
    let readings = or_empty("sensor history", readings);
    let charts = charts::sensor_charts(&readings);

    render(&state, move |ctx| reports::graphs::generate(&name, &charts, ctx)).await
}

async fn recommendations_report(
    State(state): State<AppState>,
    Path(field_id): Path<String>,
) -> ReportResult<GeneratedReport> {
    // ---
    let field_id = require_field_id(&field_id)?;
    info!("GET /reports/fields/{}/recommendations", field_id);

    let (name, data) = tokio::join!(
        field_name(&state, &field_id),
        state.sources.recommendations(&field_id)
    );
    let data = or_empty("recommendations", data);

    render(&state, move |ctx| reports::recommendations::generate(&name, &data, ctx)).await
}

async fn advisories_report(
    State(state): State<AppState>,
    Query(params): Query<AdvisoriesQuery>,
) -> ReportResult<GeneratedReport> {
    // ---
    let field_id = params
        .field_id
        .as_deref()
        .filter(|s| !s.trim().is_empty())
        .map(require_field_id)
        .transpose()?;
    info!("GET /reports/advisories field_id={:?}", field_id);

    let advisories = or_empty(
        "advisories",
        state.sources.advisories(field_id.as_deref()).await,
    );
    let subject = match &field_id {
        Some(id) => Some(field_name(&state, id).await),
        None => None,
    };

    render(&state, move |ctx| {
        reports::advisories::generate(&advisories, subject.as_deref(), ctx)
    })
    .await
}

async fn weather_report(
    State(state): State<AppState>,
    Query(params): Query<WeatherQuery>,
) -> ReportResult<GeneratedReport> {
    // ---
    let location = params
        .location
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .ok_or_else(|| ReportError::InvalidRequest("location query parameter is required".into()))?;
    info!("GET /reports/weather location={}", location);

    let weather = or_empty("weather", state.sources.weather(&location).await);

    render(&state, move |ctx| reports::weather::generate(&location, &weather, ctx)).await
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn days_must_be_in_range() {
        // ---
        assert_eq!(require_days(Some(30)).unwrap(), 30);
        assert_eq!(require_days(Some(365)).unwrap(), 365);
        assert!(require_days(Some(0)).is_err());
        assert!(require_days(Some(366)).is_err());
        assert!(require_days(None).is_err());
    }

    #[test]
    fn field_ids_are_path_safe() {
        // ---
        assert_eq!(require_field_id(" 42 ").unwrap(), "42");
        assert_eq!(require_field_id("north-field_1").unwrap(), "north-field_1");
        assert!(require_field_id("../admin").is_err());
        assert!(require_field_id("a b").is_err());
        assert!(require_field_id("").is_err());
    }

    #[test]
    fn non_ascii_file_names_get_an_encoded_variant() {
        // ---
        assert_eq!(
            content_disposition("Weather_Report_Pune_2024-07-04.pdf"),
            "attachment; filename=\"Weather_Report_Pune_2024-07-04.pdf\""
        );
        assert_eq!(
            content_disposition("Graphs_Report_வயல்_2024-07-04.pdf"),
            "attachment; filename=\"Graphs_Report_2024-07-04.pdf\"; \
             filename*=UTF-8''Graphs_Report_%E0%AE%B5%E0%AE%AF%E0%AE%B2%E0%AF%8D_2024-07-04.pdf"
        );
    }

    #[test]
    fn pdf_response_carries_download_headers() {
        // ---
        let report = GeneratedReport {
            kind: reports::ReportKind::Weather,
            file_name: "Weather_Report_Pune_2024-07-04.pdf".into(),
            bytes: b"%PDF-1.3".to_vec(),
            page_count: 1,
        };
        let response = report.into_response();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "application/pdf");
        assert_eq!(
            response.headers()[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Weather_Report_Pune_2024-07-04.pdf\""
        );
    }
}
