//! Advisory history report. Every advisory after the first starts a page.

use super::{finish, GeneratedReport, ReportContext, ReportKind, BODY_SIZE};
use crate::aggregate::to_iso_date;
use crate::document::{Block, Document, Table, TableStyle, Theme};
use crate::error::ReportResult;
use crate::format;
use crate::models::AdvisoryRecord;

// ---

const FIELD_HEADING_SIZE: f32 = 14.0;
const DATE_SIZE: f32 = 11.0;

/// `YYYY-MM-DD` when the date parses, the raw text otherwise.
fn display_date(raw: Option<&str>) -> String {
    // ---
    match to_iso_date(raw) {
        Ok(date) => date.format("%Y-%m-%d").to_string(),
        Err(_) => format::text_or_na(raw),
    }
}

pub fn build(advisories: &[AdvisoryRecord], ctx: &ReportContext<'_>) -> Document {
    // ---
    let title = ctx.t("Advisory History Report");
    let mut doc = Document::new(title.clone());
    doc.extend(ctx.cover(title));

    if advisories.is_empty() {
        doc.push(Block::text(ctx.t("No advisories available"), BODY_SIZE));
        return doc;
    }

    for (index, advisory) in advisories.iter().enumerate() {
        if index > 0 {
            doc.push(Block::PageBreak);
        }

        doc.push(Block::heading(
            ctx.line("Field", &format::text_or_na(advisory.field_name.as_deref())),
            FIELD_HEADING_SIZE,
        ));
        doc.push(Block::text(
            ctx.line("Date", &display_date(advisory.date.as_deref())),
            DATE_SIZE,
        ));

        let rows = advisory
            .recommendations
            .iter()
            .map(|rec| {
                vec![
                    format::text_or_na(rec.kind.as_deref()),
                    format::text_or_na(rec.status.as_ref().map(|s| s.as_str())),
                    format::text_or_na(rec.message.as_deref()),
                ]
            })
            .collect();

        doc.push(Block::table(
            Table::new(&["Type", "Status", "Message"], rows, Theme::Advisory, TableStyle::Striped)
                .with_widths(&[1.0, 1.0, 3.0]),
        ));
    }

    doc
}

/// `field_name` names the file when the history is scoped to one field.
pub fn generate(
    advisories: &[AdvisoryRecord],
    field_name: Option<&str>,
    ctx: &ReportContext<'_>,
) -> ReportResult<GeneratedReport> {
    // ---
    let doc = build(advisories, ctx);
    finish(ReportKind::Advisories, field_name, ctx, &doc)
}
