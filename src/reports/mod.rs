//! Report variants.
//!
//! Each variant is a pure function of its input snapshot, a label lookup and
//! the report date. `build()` produces the block list; `generate()` renders it
//! and names the file.

pub mod advisories;
pub mod full;
pub mod graphs;
pub mod recommendations;
pub mod weather;

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{info, info_span};
use uuid::Uuid;

use crate::document::{Block, Document, RgbColor};
use crate::error::ReportResult;
use crate::labels::{labelled, Labels};

// ---

pub const TITLE_SIZE: f32 = 24.0;
pub const SUBTITLE_SIZE: f32 = 18.0;
pub const SECTION_SIZE: f32 = 16.0;
pub const SUBSECTION_SIZE: f32 = 12.0;
pub const BODY_SIZE: f32 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Farmer,
    Graphs,
    Recommendations,
    Advisories,
    Weather,
}

impl ReportKind {
    pub fn prefix(self) -> &'static str {
        match self {
            ReportKind::Farmer => "Farmer_Report",
            ReportKind::Graphs => "Graphs_Report",
            ReportKind::Recommendations => "Recommendations_Report",
            ReportKind::Advisories => "Advisories_Report",
            ReportKind::Weather => "Weather_Report",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ReportKind::Farmer => "farmer",
            ReportKind::Graphs => "graphs",
            ReportKind::Recommendations => "recommendations",
            ReportKind::Advisories => "advisories",
            ReportKind::Weather => "weather",
        }
    }
}

/// Everything a variant needs besides its data.
#[derive(Clone, Copy)]
pub struct ReportContext<'a> {
    pub labels: &'a dyn Labels,
    pub today: NaiveDate,
    pub brand: &'a str,
}

impl<'a> ReportContext<'a> {
    pub fn new(labels: &'a dyn Labels, today: NaiveDate) -> Self {
        Self {
            labels,
            today,
            brand: "FarmIQ",
        }
    }

    pub fn with_brand(mut self, brand: &'a str) -> Self {
        self.brand = brand;
        self
    }

    pub fn t(&self, key: &str) -> String {
        self.labels.translate(key)
    }

    /// `"{label}: {value}"` with the label translated.
    pub fn line(&self, key: &str, value: &str) -> String {
        labelled(self.labels, key, value)
    }

    pub fn today_iso(&self) -> String {
        self.today.format("%Y-%m-%d").to_string()
    }

    /// "Generated: YYYY-MM-DD" line shared by every cover.
    pub fn generated_line(&self) -> Block {
        Block::centered(self.line("Generated", &self.today_iso()), BODY_SIZE)
    }

    /// Title and generated date; the opening of every variant but the full one.
    pub fn cover(&self, title: impl Into<String>) -> Vec<Block> {
        vec![
            Block::title(title, SUBTITLE_SIZE, RgbColor::BLACK),
            self.generated_line(),
            Block::Spacer(8.0),
        ]
    }
}

/// A rendered report ready to hand to the caller.
#[derive(Debug, Clone)]
pub struct GeneratedReport {
    pub kind: ReportKind,
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

impl GeneratedReport {
    pub const CONTENT_TYPE: &'static str = "application/pdf";
}

/// Make a subject safe for a file name.
///
/// Whitespace runs become `_`. Anything that is not a letter, a digit, `-`
/// or `.` is dropped, and repeated underscores collapse.
pub fn sanitize_subject(subject: &str) -> String {
    // ---
    let mut out = String::with_capacity(subject.len());

    for c in subject.trim().chars() {
        let mapped = if c.is_whitespace() || c == '_' {
            Some('_')
        } else if c.is_alphanumeric() || c == '-' || c == '.' {
            Some(c)
        } else {
            None
        };

        match mapped {
            Some('_') if out.ends_with('_') || out.is_empty() => {}
            Some(c) => out.push(c),
            None => {}
        }
    }

    out.trim_matches(|c| c == '_' || c == '.').to_string()
}

/// `{Kind}_Report_{Subject}_{YYYY-MM-DD}.pdf`; an empty subject drops its segment.
pub fn report_file_name(kind: ReportKind, subject: Option<&str>, date: NaiveDate) -> String {
    // ---
    let date = date.format("%Y-%m-%d");
    match subject.map(sanitize_subject).filter(|s| !s.is_empty()) {
        Some(subject) => format!("{}_{}_{}.pdf", kind.prefix(), subject, date),
        None => format!("{}_{}.pdf", kind.prefix(), date),
    }
}

/// Render a built document and wrap it with its file name.
pub fn finish(
    kind: ReportKind,
    subject: Option<&str>,
    ctx: &ReportContext<'_>,
    document: &Document,
) -> ReportResult<GeneratedReport> {
    // ---
    let request_id = Uuid::new_v4();
    let span = info_span!("report", kind = kind.as_str(), %request_id);
    let _guard = span.enter();

    let rendered = document.render()?;
    let file_name = report_file_name(kind, subject, ctx.today);

    info!(
        file_name = %file_name,
        pages = rendered.page_count,
        bytes = rendered.bytes.len(),
        "Report generated"
    );

    Ok(GeneratedReport {
        kind,
        file_name,
        bytes: rendered.bytes,
        page_count: rendered.page_count,
    })
}

/// Text of every text block, for tests and logging.
pub fn block_texts(blocks: &[Block]) -> Vec<&str> {
    blocks
        .iter()
        .filter_map(|b| match b {
            Block::Text(t) => Some(t.text.as_str()),
            _ => None,
        })
        .collect()
}
