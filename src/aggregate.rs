//! Date-keyed aggregation of sensor readings and advisories.
//!
//! Readings and advisories arrive from independent sources keyed differently
//! (field id vs. field name, full timestamps vs. plain dates). This module
//! folds them into one [`DateBucket`] per calendar day, sorted ascending.
//! Records whose date cannot be read are logged and skipped; they never take
//! their siblings down with them.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::error::RecordParseError;
use crate::models::{AdvisoryRecord, FieldWithReadings, RawAdvisoryRecord, RawFieldWithReadings, SensorReading};
use crate::sources::decode_list;

// ---

const NAIVE_FORMATS: [&str; 3] = [
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
];

/// Parse an ISO-8601 timestamp or plain date.
///
/// Offsets are honoured and normalised to UTC. Timestamps without an offset,
/// and plain `YYYY-MM-DD` dates (midnight), are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, RecordParseError> {
    // ---
    let s = raw.trim();
    if s.is_empty() {
        return Err(RecordParseError::MissingTimestamp);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }

    for fmt in NAIVE_FORMATS {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, fmt) {
            return Ok(naive.and_utc());
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
        .ok_or_else(|| RecordParseError::Timestamp(raw.to_string()))
}

/// Calendar date (UTC) of an optional timestamp string.
pub fn to_iso_date(raw: Option<&str>) -> Result<NaiveDate, RecordParseError> {
    // ---
    let raw = raw.ok_or(RecordParseError::MissingTimestamp)?;
    Ok(parse_timestamp(raw)?.date_naive())
}

/// One field's readings on one day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDay {
    pub field_name: String,
    pub sensor_readings: Vec<SensorReading>,
}

impl FieldDay {
    /// Representative reading for the day: the latest by timestamp.
    ///
    /// Readings with equal timestamps resolve to the one encountered last.
    pub fn latest(&self) -> Option<&SensorReading> {
        // ---
        self.sensor_readings
            .iter()
            .enumerate()
            .max_by_key(|(position, reading)| {
                let at = reading
                    .timestamp
                    .as_deref()
                    .and_then(|t| parse_timestamp(t).ok());
                (at, *position)
            })
            .map(|(_, reading)| reading)
    }
}

/// Everything known about one calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateBucket {
    pub date: NaiveDate,
    /// Keyed by field id (`"unknown"` when the field had none).
    pub fields: BTreeMap<String, FieldDay>,
    pub advisories: Vec<AdvisoryRecord>,
}

impl DateBucket {
    fn new(date: NaiveDate) -> Self {
        Self {
            date,
            fields: BTreeMap::new(),
            advisories: Vec::new(),
        }
    }

    /// `YYYY-MM-DD`.
    pub fn date_key(&self) -> String {
        self.date.format("%Y-%m-%d").to_string()
    }

    pub fn is_empty(&self) -> bool {
        self.advisories.is_empty() && self.fields.values().all(|f| f.sensor_readings.is_empty())
    }
}

/// Group readings and advisories by calendar date, ascending.
pub fn aggregate_by_date(
    fields: &[FieldWithReadings],
    advisories: &[AdvisoryRecord],
) -> Vec<DateBucket> {
    // ---
    let mut buckets: BTreeMap<NaiveDate, DateBucket> = BTreeMap::new();
    let mut skipped = 0usize;

    for entry in fields {
        let field_key = entry.field.key();

        for reading in &entry.sensor_data {
            let date = match to_iso_date(reading.timestamp.as_deref()) {
                Ok(date) => date,
                Err(e) => {
                    warn!(field_key = %field_key, reason = %e, "Dropping sensor reading from date buckets");
                    skipped += 1;
                    continue;
                }
            };

            buckets
                .entry(date)
                .or_insert_with(|| DateBucket::new(date))
                .fields
                .entry(field_key.clone())
                .or_insert_with(|| FieldDay {
                    field_name: entry.field.display_name().to_string(),
                    sensor_readings: Vec::new(),
                })
                .sensor_readings
                .push(reading.clone());
        }
    }

    for advisory in advisories {
        let date = match to_iso_date(advisory.date.as_deref()) {
            Ok(date) => date,
            Err(e) => {
                warn!(
                    advisory_id = advisory.advisory_id.as_deref().unwrap_or("-"),
                    reason = %e,
                    "Dropping advisory from date buckets"
                );
                skipped += 1;
                continue;
            }
        };

        buckets
            .entry(date)
            .or_insert_with(|| DateBucket::new(date))
            .advisories
            .push(advisory.clone());
    }

    debug!(
        "Aggregated {} date buckets ({} records skipped)",
        buckets.len(),
        skipped
    );

    // BTreeMap iteration is already ascending by date.
    buckets.into_values().collect()
}

/// Aggregate straight from loosely typed JSON.
///
/// Either argument may be null or not an array; that side is treated as empty.
pub fn aggregate_json(fields: &Value, advisories: &Value) -> Vec<DateBucket> {
    // ---
    let fields: Vec<FieldWithReadings> = decode_list::<RawFieldWithReadings>(fields, "fields")
        .into_iter()
        .map(RawFieldWithReadings::into_canonical)
        .collect();
    let advisories: Vec<AdvisoryRecord> = decode_list::<RawAdvisoryRecord>(advisories, "advisories")
        .into_iter()
        .map(RawAdvisoryRecord::into_canonical)
        .collect();

    aggregate_by_date(&fields, &advisories)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::{FieldRecord, RecommendationItem, RecommendationStatus};
    use serde_json::json;

    fn reading(ts: &str, temp: Option<f64>) -> SensorReading {
        SensorReading {
            timestamp: Some(ts.to_string()),
            air_temp: temp,
            ..Default::default()
        }
    }

    fn field(id: &str, name: &str, readings: Vec<SensorReading>) -> FieldWithReadings {
        FieldWithReadings {
            field: FieldRecord {
                id: Some(id.to_string()),
                name: Some(name.to_string()),
                ..Default::default()
            },
            sensor_data: readings,
        }
    }

    fn advisory(id: &str, date: &str, statuses: &[&str]) -> AdvisoryRecord {
        AdvisoryRecord {
            advisory_id: Some(id.to_string()),
            field_id: Some("F1".to_string()),
            field_name: Some("Field 1".to_string()),
            date: Some(date.to_string()),
            recommendations: statuses
                .iter()
                .map(|s| RecommendationItem {
                    kind: Some("irrigation".to_string()),
                    status: Some(RecommendationStatus::parse(s)),
                    message: Some(format!("advice {s}")),
                })
                .collect(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn timestamps_in_several_shapes() {
        // ---
        assert_eq!(to_iso_date(Some("2024-01-15T10:00:00")).unwrap(), day("2024-01-15"));
        assert_eq!(to_iso_date(Some("2024-01-15T23:30:00Z")).unwrap(), day("2024-01-15"));
        assert_eq!(to_iso_date(Some("2024-01-15 06:00:00.250")).unwrap(), day("2024-01-15"));
        assert_eq!(to_iso_date(Some("2024-01-12")).unwrap(), day("2024-01-12"));
        // +05:30 shifts back across midnight in UTC
        assert_eq!(to_iso_date(Some("2024-01-15T02:00:00+05:30")).unwrap(), day("2024-01-14"));
    }

    #[test]
    fn bad_timestamps_are_errors() {
        // ---
        assert_eq!(
            to_iso_date(Some("not-a-date")),
            Err(RecordParseError::Timestamp("not-a-date".into()))
        );
        assert_eq!(to_iso_date(None), Err(RecordParseError::MissingTimestamp));
        assert_eq!(to_iso_date(Some("  ")), Err(RecordParseError::MissingTimestamp));
        assert!(to_iso_date(Some("2024-02-30")).is_err());
    }

    #[test]
    fn scenario_two_fields_same_day() {
        // ---
        let fields = vec![
            field(
                "F1",
                "North",
                vec![
                    reading("2024-01-15T08:00:00Z", Some(24.0)),
                    reading("2024-01-15T16:00:00Z", Some(26.0)),
                ],
            ),
            field("F2", "South", vec![reading("2024-01-15T09:00:00Z", Some(30.0))]),
        ];

        let buckets = aggregate_by_date(&fields, &[]);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date_key(), "2024-01-15");
        assert_eq!(buckets[0].fields.len(), 2);
        assert_eq!(buckets[0].fields["F1"].sensor_readings.len(), 2);
        assert_eq!(buckets[0].fields["F2"].sensor_readings.len(), 1);
        assert_eq!(buckets[0].fields["F1"].field_name, "North");
    }

    #[test]
    fn scenario_advisory_only_day() {
        // ---
        let advisories = vec![advisory("1", "2024-01-10T10:00:00", &["do_now", "wait"])];

        let buckets = aggregate_by_date(&[], &advisories);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date_key(), "2024-01-10");
        assert!(buckets[0].fields.is_empty());
        assert_eq!(buckets[0].advisories.len(), 1);
        assert_eq!(buckets[0].advisories[0].recommendations.len(), 2);
    }

    #[test]
    fn scenario_empty_inputs() {
        // ---
        assert!(aggregate_by_date(&[], &[]).is_empty());
        assert!(aggregate_json(&json!(null), &json!({ "not": "a list" })).is_empty());
        assert!(aggregate_json(&json!([]), &json!([])).is_empty());
    }

    #[test]
    fn scenario_malformed_advisory_date() {
        // ---
        let advisories = vec![
            advisory("bad", "not-a-date", &["monitor"]),
            advisory("good", "2024-01-12T10:00:00", &["do_now"]),
        ];

        let buckets = aggregate_by_date(&[], &advisories);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].date_key(), "2024-01-12");
        assert_eq!(buckets[0].advisories[0].advisory_id.as_deref(), Some("good"));
    }

    #[test]
    fn bad_reading_does_not_disturb_siblings() {
        // ---
        let fields = vec![field(
            "F1",
            "North",
            vec![
                reading("2024-01-15T08:00:00Z", Some(24.0)),
                reading("yesterday", Some(99.0)),
                SensorReading::default(),
                reading("2024-01-16T08:00:00Z", Some(25.0)),
            ],
        )];

        let buckets = aggregate_by_date(&fields, &[]);

        assert_eq!(buckets.len(), 2);
        let temps: Vec<_> = buckets
            .iter()
            .flat_map(|b| b.fields["F1"].sensor_readings.iter().map(|r| r.air_temp))
            .collect();
        assert_eq!(temps, vec![Some(24.0), Some(25.0)]);
    }

    #[test]
    fn sensor_and_advisory_share_a_bucket() {
        // ---
        let fields = vec![field("F1", "North", vec![reading("2024-01-15T08:00:00Z", Some(24.0))])];
        let advisories = vec![advisory("1", "2024-01-15", &["wait"])];

        let buckets = aggregate_by_date(&fields, &advisories);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].fields.len(), 1);
        assert_eq!(buckets[0].advisories.len(), 1);
    }

    #[test]
    fn output_is_sorted_for_every_input_order() {
        // ---
        let dates = ["2024-03-01", "2024-01-20", "2024-02-11", "2023-12-31"];
        let expected = vec!["2023-12-31", "2024-01-20", "2024-02-11", "2024-03-01"];

        for rotation in 0..dates.len() {
            let mut order = dates.to_vec();
            order.rotate_left(rotation);
            let readings = order
                .iter()
                .map(|d| reading(&format!("{d}T12:00:00Z"), Some(20.0)))
                .collect();
            let advisories: Vec<_> = order.iter().rev().map(|d| advisory(d, d, &["monitor"])).collect();

            let keys: Vec<String> = aggregate_by_date(&[field("F1", "North", readings)], &advisories)
                .iter()
                .map(DateBucket::date_key)
                .collect();
            assert_eq!(keys, expected);
        }
    }

    #[test]
    fn aggregation_is_idempotent() {
        // ---
        let fields = vec![
            field("F1", "North", vec![reading("2024-01-15T08:00:00Z", Some(24.0))]),
            field("F2", "South", vec![reading("2024-01-14T08:00:00Z", None)]),
        ];
        let advisories = vec![advisory("1", "2024-01-15T10:00:00", &["do_now"])];

        assert_eq!(
            aggregate_by_date(&fields, &advisories),
            aggregate_by_date(&fields, &advisories)
        );
    }

    #[test]
    fn fields_without_id_share_unknown_key() {
        // ---
        let mut anonymous = field("x", "Anon", vec![reading("2024-01-15T08:00:00Z", Some(21.0))]);
        anonymous.field.id = None;

        let buckets = aggregate_by_date(&[anonymous], &[]);
        assert!(buckets[0].fields.contains_key("unknown"));
    }

    #[test]
    fn latest_is_by_timestamp_not_position() {
        // ---
        let day = FieldDay {
            field_name: "North".into(),
            sensor_readings: vec![
                reading("2024-01-15T18:00:00Z", Some(26.0)),
                reading("2024-01-15T06:00:00Z", Some(19.0)),
            ],
        };
        assert_eq!(day.latest().unwrap().air_temp, Some(26.0));

        let tied = FieldDay {
            field_name: "North".into(),
            sensor_readings: vec![
                reading("2024-01-15T06:00:00Z", Some(1.0)),
                reading("2024-01-15T06:00:00Z", Some(2.0)),
            ],
        };
        assert_eq!(tied.latest().unwrap().air_temp, Some(2.0));
    }

    #[test]
    fn json_entry_point_tolerates_mixed_shapes() {
        // ---
        let fields = json!([
            {
                "id": 1,
                "name": "Field 1",
                "sensorData": [
                    { "timestamp": "2024-01-15T08:00:00Z", "air_temp": 24.0 },
                    { "timestamp": "garbage", "air_temp": 25.0 }
                ]
            },
            "not a field",
            { "field_id": "2", "name": "Field 2", "sensor_data": null }
        ]);
        let advisories = json!([
            { "advisory_id": "3", "field_id": "2", "date": "2024-01-12T10:00:00", "recommendations": [] },
            null
        ]);

        let buckets = aggregate_json(&fields, &advisories);

        let keys: Vec<_> = buckets.iter().map(DateBucket::date_key).collect();
        assert_eq!(keys, vec!["2024-01-12", "2024-01-15"]);
        assert_eq!(buckets[1].fields["1"].sensor_readings.len(), 1);
    }
}
