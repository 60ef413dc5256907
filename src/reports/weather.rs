//! Weather report for one location.

use super::{finish, GeneratedReport, ReportContext, ReportKind};
use crate::document::{Block, Document, Table, TableStyle, Theme};
use crate::error::ReportResult;
use crate::format;
use crate::models::WeatherSnapshot;

// ---

const SECTION: f32 = 14.0;

pub fn build(location: &str, weather: &WeatherSnapshot, ctx: &ReportContext<'_>) -> Document {
    // ---
    let title = format!("{} - {}", ctx.t("Weather Report"), location);
    let mut doc = Document::new(title.clone());
    doc.extend(ctx.cover(title));

    let current = &weather.current;
    doc.push(Block::heading(ctx.t("Current Weather"), SECTION));
    doc.push(Block::table(Table::new(
        &["Parameter", "Value"],
        vec![
            vec!["Temperature".into(), format::temperature(current.temperature)],
            vec!["Humidity".into(), format::percent_compact(current.humidity)],
            vec!["Wind Speed".into(), format::speed(current.wind_speed)],
            vec!["Conditions".into(), format::text_or_na(current.conditions.as_deref())],
        ],
        Theme::Sensor,
        TableStyle::Striped,
    )));

    if !weather.forecast.is_empty() {
        let rows = weather
            .forecast
            .iter()
            .map(|f| {
                vec![
                    format::text_or_na(f.time.as_deref()),
                    format::temperature(f.temperature),
                    format::text_or_na(f.conditions.as_deref()),
                ]
            })
            .collect();

        doc.push(Block::Spacer(6.0));
        doc.push(Block::heading(ctx.t("Forecast"), SECTION));
        doc.push(Block::table(Table::new(
            &["Time", "Temperature", "Conditions"],
            rows,
            Theme::Sensor,
            TableStyle::Striped,
        )));
    }

    if !weather.alerts.is_empty() {
        let rows = weather
            .alerts
            .iter()
            .map(|a| {
                vec![
                    format::text_or_na(a.kind.as_deref()),
                    format::text_or_na(a.title.as_deref()),
                    format::text_or_na(a.message.as_deref()),
                ]
            })
            .collect();

        doc.push(Block::Spacer(6.0));
        doc.push(Block::heading(ctx.t("Weather Alerts"), SECTION));
        doc.push(Block::table(
            Table::new(&["Type", "Title", "Message"], rows, Theme::Alert, TableStyle::Striped)
                .with_widths(&[1.0, 1.5, 3.0]),
        ));
    }

    doc
}

pub fn generate(
    location: &str,
    weather: &WeatherSnapshot,
    ctx: &ReportContext<'_>,
) -> ReportResult<GeneratedReport> {
    // ---
    let doc = build(location, weather, ctx);
    finish(ReportKind::Weather, Some(location), ctx, &doc)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::labels::NoLabels;
    use crate::models::{CurrentConditions, ForecastEntry, WeatherAlert};
    use chrono::NaiveDate;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 4).unwrap()
    }

    fn tables(doc: &Document) -> Vec<&Table> {
        doc.blocks()
            .iter()
            .filter_map(|b| match b {
                Block::Table(t) => Some(t),
                _ => None,
            })
            .collect()
    }

    fn current() -> CurrentConditions {
        CurrentConditions {
            temperature: Some(31.0),
            humidity: Some(72.5),
            wind_speed: Some(12.0),
            conditions: Some("Humid".into()),
        }
    }

    #[test]
    fn optional_tables_are_omitted_when_empty() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, today());
        let weather = WeatherSnapshot {
            current: current(),
            ..Default::default()
        };

        let doc = build("Pune", &weather, &ctx);
        let tables = tables(&doc);

        assert_eq!(tables.len(), 1);
        assert_eq!(tables[0].rows[0], vec!["Temperature", "31.0°C"]);
        assert_eq!(tables[0].rows[1], vec!["Humidity", "72.5%"]);
        assert_eq!(tables[0].rows[2], vec!["Wind Speed", "12.0 km/h"]);
        assert_eq!(tables[0].rows[3], vec!["Conditions", "Humid"]);
    }

    #[test]
    fn forecast_and_alerts_use_their_columns() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, today());
        let weather = WeatherSnapshot {
            current: current(),
            forecast: vec![ForecastEntry {
                time: Some("15:00".into()),
                temperature: Some(33.0),
                conditions: None,
            }],
            alerts: vec![WeatherAlert {
                kind: Some("heat".into()),
                title: Some("Heat wave".into()),
                message: Some("Irrigate early".into()),
            }],
        };

        let doc = build("Pune", &weather, &ctx);
        let tables = tables(&doc);

        assert_eq!(tables.len(), 3);
        assert_eq!(tables[1].columns, vec!["Time", "Temperature", "Conditions"]);
        assert_eq!(tables[1].rows[0], vec!["15:00", "33.0°C", "N/A"]);
        assert_eq!(tables[2].columns, vec!["Type", "Title", "Message"]);
        assert_eq!(tables[2].theme, Theme::Alert);
    }

    #[test]
    fn generates_named_pdf() {
        // ---
        let labels = NoLabels;
        let ctx = ReportContext::new(&labels, today());
        let report = generate("Pune", &WeatherSnapshot::default(), &ctx).unwrap();

        assert_eq!(report.file_name, "Weather_Report_Pune_2024-07-04.pdf");
        assert!(report.bytes.starts_with(b"%PDF"));
    }
}
