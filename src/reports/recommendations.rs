//! Recommendations report for one field.

use super::{finish, GeneratedReport, ReportContext, ReportKind, BODY_SIZE, SUBSECTION_SIZE};
use crate::document::{Block, Document, Table, TableStyle, Theme};
use crate::error::ReportResult;
use crate::format;
use crate::models::{FieldRecommendations, Recommendation};

// ---

const KEY_VALUE_SIZE: f32 = 14.0;

pub fn build(field_name: &str, data: &FieldRecommendations, ctx: &ReportContext<'_>) -> Document {
    // ---
    let title = format!("{} - {}", field_name, ctx.t("Recommendations Report"));
    let mut doc = Document::new(title.clone());
    doc.extend(ctx.cover(title));

    doc.push(Block::heading(
        ctx.line("Crop Stage", &format::text_or_na(data.crop_stage.as_deref())),
        KEY_VALUE_SIZE,
    ));
    doc.push(Block::heading(
        ctx.line("GDD Value", &format::fixed1(data.gdd_value)),
        KEY_VALUE_SIZE,
    ));
    doc.push(Block::Spacer(4.0));

    let rows = data
        .recommendations
        .iter()
        .map(|rec| {
            vec![
                format::text_or_na(rec.title.as_deref()),
                format::text_or_na(rec.status.as_ref().map(|s| s.as_str())),
                description_cell(rec, ctx),
                format::text_or_na(rec.timing.as_deref()),
            ]
        })
        .collect();

    doc.push(Block::table(
        Table::new(
            &["Title", "Status", "Description", "Timing"],
            rows,
            Theme::Summary,
            TableStyle::Striped,
        )
        .with_widths(&[2.0, 1.0, 4.0, 1.5]),
    ));

    if let Some(reasoning) = data.ai_reasoning_text.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
        doc.push(Block::Spacer(6.0));
        doc.push(Block::heading(format!("{}:", ctx.t("AI Reasoning")), SUBSECTION_SIZE));
        doc.push(Block::text(reasoning, BODY_SIZE));
    }

    doc
}

/// Description with the expert explanation, if any, on its own line.
fn description_cell(rec: &Recommendation, ctx: &ReportContext<'_>) -> String {
    // ---
    fn present(v: &Option<String>) -> Option<&str> {
        v.as_deref().map(str::trim).filter(|s| !s.is_empty())
    }

    match (present(&rec.description), present(&rec.explanation)) {
        (Some(d), Some(e)) => format!("{}\n{}", d, ctx.line("Expert Context", e)),
        (None, Some(e)) => ctx.line("Expert Context", e),
        (d, None) => format::text_or_na(d),
    }
}

pub fn generate(
    field_name: &str,
    data: &FieldRecommendations,
    ctx: &ReportContext<'_>,
) -> ReportResult<GeneratedReport> {
    // ---
    let doc = build(field_name, data, ctx);
    finish(ReportKind::Recommendations, Some(field_name), ctx, &doc)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::labels::NoLabels;
    use crate::models::{Recommendation, RecommendationStatus};
    use crate::reports::block_texts;
    use chrono::NaiveDate;

    fn data() -> FieldRecommendations {
        FieldRecommendations {
            crop_stage: Some("Flowering".into()),
            gdd_value: Some(1234.56),
            recommendations: vec![
                Recommendation {
                    title: Some("Irrigate".into()),
                    description: Some("Soil moisture is below 30%".into()),
                    status: Some(RecommendationStatus::DoNow),
                    explanation: Some("Optimal range is 60-70% at flowering.".into()),
                    timing: Some("Today".into()),
                },
                Recommendation::default(),
            ],
            ai_reasoning_text: Some("Heat stress expected this week.".into()),
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    #[test]
    fn key_values_then_table_then_reasoning() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, today());
        let doc = build("East Plot", &data(), &ctx);
        let texts = block_texts(doc.blocks());

        assert_eq!(texts[0], "East Plot - Recommendations Report");
        assert!(texts.contains(&"Crop Stage: Flowering"));
        assert!(texts.contains(&"GDD Value: 1234.6"));
        assert_eq!(texts[texts.len() - 1], "Heat stress expected this week.");

        let table = doc
            .blocks()
            .iter()
            .find_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .unwrap();
        assert_eq!(table.columns, vec!["Title", "Status", "Description", "Timing"]);
        assert_eq!(
            table.rows[0],
            vec![
                "Irrigate",
                "do_now",
                "Soil moisture is below 30%\nExpert Context: Optimal range is 60-70% at flowering.",
                "Today"
            ]
        );
        assert_eq!(table.rows[1], vec!["N/A", "N/A", "N/A", "N/A"]);
    }

    #[test]
    fn explanation_alone_fills_the_description() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, today());
        let rec = Recommendation {
            explanation: Some(" Wait two days after irrigation. ".into()),
            ..Default::default()
        };

        assert_eq!(description_cell(&rec, &ctx), "Expert Context: Wait two days after irrigation.");
    }

    #[test]
    fn missing_values_render_na_and_reasoning_is_optional() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, today());
        let doc = build("East Plot", &FieldRecommendations::default(), &ctx);
        let texts = block_texts(doc.blocks());

        assert!(texts.contains(&"Crop Stage: N/A"));
        assert!(texts.contains(&"GDD Value: N/A"));
        assert!(!texts.contains(&"AI Reasoning:"));
    }

    #[test]
    fn generates_named_pdf() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, today());
        let report = generate("East Plot", &data(), &ctx).unwrap();

        assert_eq!(report.file_name, "Recommendations_Report_East_Plot_2024-06-01.pdf");
        assert_eq!(report.page_count, 1);
    }
}
