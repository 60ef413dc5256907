//! Full farmer report: cover, executive summary, field overview, one section
//! per day, and statistics over the caller's window.

use tracing::debug;

use super::{
    finish, GeneratedReport, ReportContext, ReportKind, BODY_SIZE, SECTION_SIZE, SUBSECTION_SIZE,
    SUBTITLE_SIZE, TITLE_SIZE,
};
use crate::aggregate::{aggregate_by_date, DateBucket};
use crate::document::{Block, Document, RgbColor, Table, TableStyle, Theme};
use crate::error::ReportResult;
use crate::format;
use crate::models::FarmerSnapshot;
use crate::stats::{compute_stats, SensorField, StatsWindow};

// ---

const DAY_HEADING_SIZE: f32 = 14.0;

pub fn build(snapshot: &FarmerSnapshot, window: &StatsWindow, ctx: &ReportContext<'_>) -> Document {
    // ---
    let mut doc = Document::new(ctx.t("Farmer Report"));

    doc.extend(cover(snapshot, ctx));
    doc.extend(executive_summary(snapshot, ctx));
    doc.extend(fields_overview(snapshot, ctx));

    let buckets = aggregate_by_date(&snapshot.fields, &snapshot.advisories);
    doc.extend(date_sections(&buckets, ctx));
    doc.extend(statistics(snapshot, window, ctx));

    debug!(
        fields = snapshot.fields.len(),
        advisories = snapshot.advisories.len(),
        days = buckets.len(),
        "Built farmer report"
    );
    doc
}

pub fn generate(
    snapshot: &FarmerSnapshot,
    window: &StatsWindow,
    ctx: &ReportContext<'_>,
) -> ReportResult<GeneratedReport> {
    // ---
    let doc = build(snapshot, window, ctx);
    finish(ReportKind::Farmer, snapshot.profile.name.as_deref(), ctx, &doc)
}

fn cover(snapshot: &FarmerSnapshot, ctx: &ReportContext<'_>) -> Vec<Block> {
    // ---
    let profile = &snapshot.profile;
    let line = |key: &str, value: Option<&str>| {
        Block::centered(ctx.line(key, &format::text_or_na(value)), SUBSECTION_SIZE)
    };

    vec![
        Block::Spacer(40.0),
        Block::title(ctx.brand, TITLE_SIZE, RgbColor::GREEN),
        Block::title(ctx.t("Farmer Report"), SUBTITLE_SIZE, RgbColor::BLACK),
        Block::Spacer(6.0),
        line("Farmer", profile.name.as_deref()),
        line("Location", profile.location.as_deref()),
        line("Farming Type", profile.farming_type.as_deref()),
        line("Report Generated", Some(ctx.today_iso().as_str())),
        Block::PageBreak,
    ]
}

fn executive_summary(snapshot: &FarmerSnapshot, ctx: &ReportContext<'_>) -> Vec<Block> {
    // ---
    let rows = vec![
        vec!["Total Fields".to_string(), snapshot.fields.len().to_string()],
        vec!["Total Advisories".to_string(), snapshot.advisories.len().to_string()],
        vec!["Active Fields".to_string(), snapshot.active_fields().to_string()],
    ];

    vec![
        Block::heading(ctx.t("Executive Summary"), SECTION_SIZE),
        Block::table(Table::new(&["Metric", "Value"], rows, Theme::Summary, TableStyle::Striped)),
    ]
}

fn fields_overview(snapshot: &FarmerSnapshot, ctx: &ReportContext<'_>) -> Vec<Block> {
    // ---
    let mut blocks = vec![Block::heading(ctx.t("Fields Overview"), SECTION_SIZE)];

    if snapshot.fields.is_empty() {
        blocks.push(Block::text(ctx.t("No fields data available"), BODY_SIZE));
        return blocks;
    }

    let rows = snapshot
        .fields
        .iter()
        .map(|f| {
            let field = &f.field;
            vec![
                format::text_or_na(field.name.as_deref()),
                format::text_or_na(field.crop_name.as_deref()),
                format::text_or_na(field.crop_stage.as_deref()),
                format::text_or_na(field.location.as_deref()),
            ]
        })
        .collect();

    blocks.push(Block::table(Table::new(
        &["Field Name", "Crop", "Stage", "Location"],
        rows,
        Theme::Summary,
        TableStyle::Striped,
    )));
    blocks
}

/// One section per non-empty bucket, in bucket order.
fn date_sections(buckets: &[DateBucket], ctx: &ReportContext<'_>) -> Vec<Block> {
    // ---
    let mut blocks = Vec::new();

    if buckets.iter().all(DateBucket::is_empty) {
        blocks.push(Block::heading(ctx.t("No date-wise data available"), SUBSECTION_SIZE));
        return blocks;
    }

    for bucket in buckets.iter().filter(|b| !b.is_empty()) {
        blocks.push(Block::Spacer(4.0));
        blocks.push(Block::heading(
            ctx.line("Date", &bucket.date_key()),
            DAY_HEADING_SIZE,
        ));

        for day in bucket.fields.values() {
            let Some(latest) = day.latest() else {
                continue;
            };

            let rows = SensorField::ALL
                .iter()
                .map(|&metric| vec![metric.label().to_string(), metric.format(metric.value(latest))])
                .collect();

            blocks.push(Block::heading(
                ctx.line("Field", &day.field_name),
                SUBSECTION_SIZE,
            ));
            blocks.push(Block::table(Table::new(
                &["Parameter", "Value"],
                rows,
                Theme::Sensor,
                TableStyle::Grid,
            )));
        }

        if !bucket.advisories.is_empty() {
            let rows = bucket
                .advisories
                .iter()
                .flat_map(|adv| {
                    adv.recommendations.iter().map(move |rec| {
                        vec![
                            format::text_or_na(adv.field_name.as_deref()),
                            format::text_or_na(rec.kind.as_deref()),
                            format::text_or_na(rec.status.as_ref().map(|s| s.as_str())),
                            format::text_or_na(rec.message.as_deref()),
                        ]
                    })
                })
                .collect();

            blocks.push(Block::heading(format!("{}:", ctx.t("Advisories")), SUBSECTION_SIZE));
            blocks.push(Block::table(Table::new(
                &["Field", "Type", "Status", "Message"],
                rows,
                Theme::Advisory,
                TableStyle::Striped,
            )));
        }
    }

    blocks
}

fn statistics(snapshot: &FarmerSnapshot, window: &StatsWindow, ctx: &ReportContext<'_>) -> Vec<Block> {
    // ---
    let mut blocks = vec![
        Block::Spacer(6.0),
        Block::heading(ctx.t("Statistics"), SECTION_SIZE),
        Block::text(
            format!(
                "{}: {} - {}",
                ctx.t("Period"),
                window.start.format("%Y-%m-%d"),
                window.end.format("%Y-%m-%d")
            ),
            BODY_SIZE,
        ),
    ];

    let readings = window.filter(snapshot.all_readings());
    if readings.is_empty() {
        blocks.push(Block::text(ctx.t("No sensor data available for statistics"), BODY_SIZE));
        return blocks;
    }

    let rows = [
        ("Average Air Temperature", SensorField::AirTemp),
        ("Average Air Humidity", SensorField::AirHumidity),
        ("Average Soil Moisture", SensorField::SoilMoisture),
    ]
    .into_iter()
    .map(|(label, metric)| {
        let stats = compute_stats(&readings, metric);
        vec![label.to_string(), metric.format(stats.avg)]
    })
    .collect();

    blocks.push(Block::table(Table::new(&["Metric", "Value"], rows, Theme::Summary, TableStyle::Striped)));
    blocks
}
