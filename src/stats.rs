//! Min / max / average over sparse sensor series.
//!
//! The same calculator serves chart scaling (time-range scoped) and the full
//! report's statistics table (whole window). The window is always supplied by
//! the caller.

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;

use crate::aggregate::parse_timestamp;
use crate::models::SensorReading;
use crate::numeric::finite;

// ---

/// The six measurements a [`SensorReading`] can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SensorField {
    AirTemp,
    AirHumidity,
    SoilMoisture,
    SoilTemp,
    LightLux,
    WindSpeed,
}

impl SensorField {
    pub const ALL: [SensorField; 6] = [
        SensorField::AirTemp,
        SensorField::AirHumidity,
        SensorField::SoilMoisture,
        SensorField::SoilTemp,
        SensorField::LightLux,
        SensorField::WindSpeed,
    ];

    pub fn key(self) -> &'static str {
        match self {
            SensorField::AirTemp => "air_temp",
            SensorField::AirHumidity => "air_humidity",
            SensorField::SoilMoisture => "soil_moisture",
            SensorField::SoilTemp => "soil_temp",
            SensorField::LightLux => "light_lux",
            SensorField::WindSpeed => "wind_speed",
        }
    }

    /// Row label used in the per-date sensor table.
    pub fn label(self) -> &'static str {
        match self {
            SensorField::AirTemp => "Air Temperature",
            SensorField::AirHumidity => "Air Humidity",
            SensorField::SoilMoisture => "Soil Moisture",
            SensorField::SoilTemp => "Soil Temperature",
            SensorField::LightLux => "Light Intensity",
            SensorField::WindSpeed => "Wind Speed",
        }
    }

    pub fn value(self, reading: &SensorReading) -> Option<f64> {
        // ---
        let raw = match self {
            SensorField::AirTemp => reading.air_temp,
            SensorField::AirHumidity => reading.air_humidity,
            SensorField::SoilMoisture => reading.soil_moisture,
            SensorField::SoilTemp => reading.soil_temp,
            SensorField::LightLux => reading.light_lux,
            SensorField::WindSpeed => reading.wind_speed,
        };
        finite(raw)
    }

    /// Format a value of this metric with its unit.
    pub fn format(self, value: Option<f64>) -> String {
        // ---
        use crate::format;
        match self {
            SensorField::AirTemp | SensorField::SoilTemp => format::temperature(value),
            SensorField::AirHumidity | SensorField::SoilMoisture => format::percent(value),
            SensorField::LightLux => format::lux(value),
            SensorField::WindSpeed => format::speed(value),
        }
    }
}

/// Summary of one series. All three are `None` together when the series had
/// no usable values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct Stats {
    pub min: Option<f64>,
    pub max: Option<f64>,
    pub avg: Option<f64>,
    pub count: usize,
}

impl Stats {
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }
}

/// Stats over arbitrary optional values, skipping missing and non-finite ones.
pub fn compute_values<I>(values: I) -> Stats
where
    I: IntoIterator<Item = Option<f64>>,
{
    // ---
    let mut count = 0usize;
    let mut sum = 0.0f64;
    let mut min = f64::INFINITY;
    let mut max = f64::NEG_INFINITY;

    for v in values.into_iter().filter_map(finite) {
        count += 1;
        sum += v;
        min = min.min(v);
        max = max.max(v);
    }

    if count == 0 {
        return Stats::default();
    }

    // Rounding in the sum may push the mean a hair outside [min, max].
    let avg = (sum / count as f64).clamp(min, max);

    Stats {
        min: Some(min),
        max: Some(max),
        avg: Some(avg),
        count,
    }
}

/// Stats for one metric over a set of readings.
pub fn compute_stats(readings: &[SensorReading], field: SensorField) -> Stats {
    compute_values(readings.iter().map(|r| field.value(r)))
}

/// Stats for every metric, in [`SensorField::ALL`] order.
pub fn summarize(readings: &[SensorReading]) -> Vec<(SensorField, Stats)> {
    SensorField::ALL
        .iter()
        .map(|&f| (f, compute_stats(readings, f)))
        .collect()
}

/// Half-open time range `[start, end)` a statistic is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl StatsWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// The `days` days ending at `now` (inclusive of `now`).
    pub fn last_days(days: u32, now: DateTime<Utc>) -> Self {
        // ---
        Self {
            start: now - Duration::days(i64::from(days)),
            end: now + Duration::nanoseconds(1),
        }
    }

    pub fn days(&self) -> i64 {
        (self.end - self.start).num_days()
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at < self.end
    }

    /// Readings whose timestamp parses and falls inside the window.
    pub fn filter<'a>(&self, readings: impl IntoIterator<Item = &'a SensorReading>) -> Vec<SensorReading> {
        // ---
        readings
            .into_iter()
            .filter(|r| {
                r.timestamp
                    .as_deref()
                    .and_then(|t| parse_timestamp(t).ok())
                    .is_some_and(|at| self.contains(at))
            })
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use approx::assert_relative_eq;
    use chrono::TimeZone;

    fn temps(values: &[Option<f64>]) -> Vec<SensorReading> {
        values
            .iter()
            .map(|&t| SensorReading {
                air_temp: t,
                ..Default::default()
            })
            .collect()
    }

    #[test]
    fn scenario_skips_missing_values() {
        // ---
        // null and undefined both arrive as None
        let readings = temps(&[Some(25.0), None, Some(35.0), None, Some(30.0)]);
        let stats = compute_stats(&readings, SensorField::AirTemp);

        assert_eq!(stats.min, Some(25.0));
        assert_eq!(stats.max, Some(35.0));
        assert_relative_eq!(stats.avg.unwrap(), 30.0);
        assert_eq!(stats.count, 3);
    }

    #[test]
    fn empty_or_all_missing_is_all_none() {
        // ---
        let empty = compute_stats(&[], SensorField::SoilMoisture);
        assert_eq!((empty.min, empty.max, empty.avg), (None, None, None));

        let all_none = compute_stats(&temps(&[None, None]), SensorField::AirTemp);
        assert_eq!((all_none.min, all_none.max, all_none.avg), (None, None, None));
        assert!(all_none.is_empty());
    }

    #[test]
    fn non_finite_values_are_ignored() {
        // ---
        let stats = compute_values([Some(f64::NAN), Some(4.0), Some(f64::INFINITY)]);
        assert_eq!(stats.min, Some(4.0));
        assert_eq!(stats.max, Some(4.0));
        assert_eq!(stats.avg, Some(4.0));
    }

    #[test]
    fn average_stays_between_extremes() {
        // ---
        let series: Vec<Vec<Option<f64>>> = vec![
            vec![Some(0.1), Some(0.1), Some(0.1)],
            vec![Some(-5.5), Some(12.25), Some(3.0), None],
            vec![Some(1e-9), Some(1e9)],
            vec![Some(42.0)],
        ];

        for values in series {
            let stats = compute_values(values.iter().copied());
            let (min, avg, max) = (stats.min.unwrap(), stats.avg.unwrap(), stats.max.unwrap());
            assert!(min <= avg && avg <= max, "{min} <= {avg} <= {max}");
        }
    }

    #[test]
    fn summarize_covers_every_metric() {
        // ---
        let readings = vec![SensorReading {
            air_temp: Some(20.0),
            light_lux: Some(500.0),
            ..Default::default()
        }];
        let summary = summarize(&readings);

        assert_eq!(summary.len(), 6);
        assert_eq!(summary[0].1.avg, Some(20.0));
        assert_eq!(summary[4], (SensorField::LightLux, compute_stats(&readings, SensorField::LightLux)));
        assert!(summary[5].1.is_empty());
    }

    #[test]
    fn window_filters_by_timestamp() {
        // ---
        let now = Utc.with_ymd_and_hms(2024, 1, 31, 12, 0, 0).unwrap();
        let window = StatsWindow::last_days(7, now);
        assert_eq!(window.days(), 7);

        let at = |ts: &str| SensorReading {
            timestamp: Some(ts.to_string()),
            air_temp: Some(1.0),
            ..Default::default()
        };
        let readings = vec![
            at("2024-01-20T12:00:00Z"),
            at("2024-01-25T12:00:00Z"),
            at("2024-01-31T12:00:00Z"),
            at("broken"),
        ];

        let inside = window.filter(&readings);
        assert_eq!(inside.len(), 2);
    }

    #[test]
    fn formats_by_metric() {
        // ---
        assert_eq!(SensorField::AirTemp.format(Some(24.0)), "24.0°C");
        assert_eq!(SensorField::SoilMoisture.format(Some(45.0)), "45.0%");
        assert_eq!(SensorField::LightLux.format(Some(812.4)), "812 lux");
        assert_eq!(SensorField::WindSpeed.format(None), "N/A");
    }
}
