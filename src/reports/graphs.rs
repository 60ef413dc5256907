//! Graphs report: a cover followed by one full-width image per chart.

use tracing::info;

use super::{finish, GeneratedReport, ReportContext, ReportKind, BODY_SIZE};
use crate::charts::{rasterize_all, ChartSource};
use crate::document::{Block, Document, RasterImage};
use crate::error::ReportResult;

// ---

/// Lay out already rasterized charts. Each chart carries its own title as
/// its caption, so nothing else is placed between them.
pub fn build(field_name: &str, images: Vec<RasterImage>, ctx: &ReportContext<'_>) -> Document {
    // ---
    let title = format!("{} - {}", field_name, ctx.t("Graphs Report"));
    let mut doc = Document::new(title.clone());
    doc.extend(ctx.cover(title));

    if images.is_empty() {
        doc.push(Block::text(ctx.t("No charts available"), BODY_SIZE));
    }
    doc.extend(images.into_iter().map(Block::Image));
    doc
}

/// Rasterize `charts` in order, dropping any that fail, and render the report.
pub fn generate(
    field_name: &str,
    charts: &[Box<dyn ChartSource>],
    ctx: &ReportContext<'_>,
) -> ReportResult<GeneratedReport> {
    // ---
    let images = rasterize_all(charts);
    info!(
        requested = charts.len(),
        rasterized = images.len(),
        "Charts ready for graphs report"
    );

    let doc = build(field_name, images, ctx);
    finish(ReportKind::Graphs, Some(field_name), ctx, &doc)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::charts::{EncodedChart, SeriesChart};
    use crate::labels::NoLabels;
    use crate::reports::block_texts;
    use chrono::NaiveDate;

    fn ctx_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 2, 1).unwrap()
    }

    #[test]
    fn failed_chart_is_left_out() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, ctx_date());
        let charts: Vec<Box<dyn ChartSource>> = vec![
            Box::new(SeriesChart::new("Air Temperature", vec![20.0, 22.0, 21.0]).with_size(400, 200)),
            Box::new(EncodedChart::new("Broken", vec![0, 1, 2, 3])),
            Box::new(SeriesChart::new("Soil Moisture", vec![40.0, 38.0]).with_size(400, 200)),
        ];

        let report = generate("North Field", &charts, &ctx).unwrap();

        assert_eq!(report.file_name, "Graphs_Report_North_Field_2024-02-01.pdf");
        assert!(report.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn images_follow_the_cover_directly() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, ctx_date());
        let image = SeriesChart::new("Air", vec![1.0, 2.0])
            .with_size(300, 150)
            .rasterize()
            .unwrap();

        let doc = build("North", vec![image.clone(), image], &ctx);
        let blocks = doc.blocks();

        assert_eq!(block_texts(blocks), vec!["North - Graphs Report", "Generated: 2024-02-01"]);
        assert!(matches!(blocks[blocks.len() - 1], Block::Image(_)));
        assert!(matches!(blocks[blocks.len() - 2], Block::Image(_)));
    }

    #[test]
    fn every_chart_is_titled_on_the_page() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, ctx_date());
        let charts: Vec<Box<dyn ChartSource>> = vec![
            Box::new(SeriesChart::new("Air Temperature", vec![20.0, 22.0]).with_size(400, 200)),
            Box::new(SeriesChart::new("Soil Moisture", vec![20.0, 22.0]).with_size(400, 200)),
        ];

        let doc = build("North", rasterize_all(&charts), &ctx);
        let texts: Vec<String> = doc
            .layout()
            .iter()
            .flat_map(|p| p.texts().map(str::to_string).collect::<Vec<_>>())
            .collect();

        assert!(texts.iter().any(|t| t == "Air Temperature"));
        assert!(texts.iter().any(|t| t == "Soil Moisture"));
    }

    #[test]
    fn no_charts_still_produces_a_document() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, ctx_date());
        let doc = build("North", Vec::new(), &ctx);

        assert!(block_texts(doc.blocks()).contains(&"No charts available"));
        assert_eq!(doc.render().unwrap().page_count, 1);
    }
}
