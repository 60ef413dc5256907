//! Data models for the report engine.
//!
//! Upstream sources disagree on key casing and on whether ids and numbers are
//! strings. The `Raw*` types absorb those differences and are converted into
//! the canonical shapes with `into_canonical()` at the adapter boundary, so the
//! aggregator and the report variants only ever see one shape.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::numeric::{coerce_opt, id_string};

// ---

/// Metadata for one field. `id` is authoritative, `name` is display only.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRecord {
    pub id: Option<String>,
    pub name: Option<String>,
    pub crop_name: Option<String>,
    pub crop_stage: Option<String>,
    pub location: Option<String>,
}

impl FieldRecord {
    /// Key used to group this field's readings inside a date bucket.
    pub fn key(&self) -> String {
        self.id.clone().unwrap_or_else(|| "unknown".to_string())
    }

    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("Unknown Field")
    }
}

/// One sensor sample. Every measurement may be missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SensorReading {
    pub timestamp: Option<String>,
    pub air_temp: Option<f64>,
    pub air_humidity: Option<f64>,
    pub soil_moisture: Option<f64>,
    pub soil_temp: Option<f64>,
    pub light_lux: Option<f64>,
    pub wind_speed: Option<f64>,
}

/// A field together with the sensor history fetched for it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldWithReadings {
    pub field: FieldRecord,
    pub sensor_data: Vec<SensorReading>,
}

impl FieldWithReadings {
    pub fn has_sensor_data(&self) -> bool {
        !self.sensor_data.is_empty()
    }
}

/// Advice status as sent by the advisory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RecommendationStatus {
    DoNow,
    Wait,
    Monitor,
    Other(String),
}

impl RecommendationStatus {
    pub fn parse(raw: &str) -> Self {
        // ---
        match raw.trim().to_ascii_lowercase().as_str() {
            "do_now" | "do now" | "donow" => Self::DoNow,
            "wait" => Self::Wait,
            "monitor" => Self::Monitor,
            _ => Self::Other(raw.trim().to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::DoNow => "do_now",
            Self::Wait => "wait",
            Self::Monitor => "monitor",
            Self::Other(s) => s,
        }
    }
}

impl fmt::Display for RecommendationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub kind: Option<String>,
    pub status: Option<RecommendationStatus>,
    pub message: Option<String>,
}

/// One advisory event, kept whole when bucketed by date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AdvisoryRecord {
    pub advisory_id: Option<String>,
    pub field_id: Option<String>,
    pub field_name: Option<String>,
    pub date: Option<String>,
    pub recommendations: Vec<RecommendationItem>,
}

/// Who the full report is about.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmerProfile {
    pub name: Option<String>,
    pub location: Option<String>,
    pub farming_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub title: Option<String>,
    pub description: Option<String>,
    pub status: Option<RecommendationStatus>,
    pub explanation: Option<String>,
    pub timing: Option<String>,
}

/// Current crop-stage recommendations for a single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FieldRecommendations {
    pub crop_stage: Option<String>,
    pub gdd_value: Option<f64>,
    pub recommendations: Vec<Recommendation>,
    pub ai_reasoning_text: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CurrentConditions {
    pub temperature: Option<f64>,
    pub humidity: Option<f64>,
    pub wind_speed: Option<f64>,
    pub conditions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForecastEntry {
    pub time: Option<String>,
    pub temperature: Option<f64>,
    pub conditions: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherAlert {
    pub kind: Option<String>,
    pub title: Option<String>,
    pub message: Option<String>,
}

/// Weather for one location at report time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub current: CurrentConditions,
    pub forecast: Vec<ForecastEntry>,
    pub alerts: Vec<WeatherAlert>,
}

/// Everything the full farmer report is built from.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FarmerSnapshot {
    pub profile: FarmerProfile,
    pub fields: Vec<FieldWithReadings>,
    pub advisories: Vec<AdvisoryRecord>,
}

impl FarmerSnapshot {
    /// Fields with at least one sensor reading.
    pub fn active_fields(&self) -> usize {
        self.fields.iter().filter(|f| f.has_sensor_data()).count()
    }

    pub fn all_readings(&self) -> impl Iterator<Item = &SensorReading> {
        self.fields.iter().flat_map(|f| f.sensor_data.iter())
    }
}

// --- Raw wire shapes

fn text(value: Option<Value>) -> Option<String> {
    // ---
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn status(value: Option<Value>) -> Option<RecommendationStatus> {
    text(value).map(|s| RecommendationStatus::parse(&s))
}

fn list<T: for<'de> Deserialize<'de>>(value: Option<Value>) -> Vec<T> {
    // ---
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| match serde_json::from_value::<T>(item) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    tracing::warn!("Skipping malformed nested item: {}", e);
                    None
                }
            })
            .collect(),
        _ => Vec::new(),
    }
}

/// Field metadata as served by the fields endpoint.
#[derive(Debug, Deserialize)]
pub struct RawFieldRecord {
    // ---
    pub id: Option<Value>,
    pub field_id: Option<Value>,
    pub name: Option<Value>,
    #[serde(alias = "cropName")]
    pub crop_name: Option<Value>,
    #[serde(alias = "cropStage")]
    pub crop_stage: Option<Value>,
    pub location: Option<Value>,
}

impl RawFieldRecord {
    pub fn into_canonical(self) -> FieldRecord {
        // ---
        let id = self
            .id
            .as_ref()
            .and_then(id_string)
            .or_else(|| self.field_id.as_ref().and_then(id_string));

        FieldRecord {
            id,
            name: text(self.name),
            crop_name: text(self.crop_name),
            crop_stage: text(self.crop_stage),
            location: text(self.location),
        }
    }
}

/// Sensor sample as served by the historical readings endpoint.
#[derive(Debug, Deserialize)]
pub struct RawSensorReading {
    // ---
    #[serde(alias = "time", alias = "recorded_at")]
    pub timestamp: Option<Value>,
    #[serde(alias = "airTemp")]
    pub air_temp: Option<Value>,
    #[serde(alias = "airHumidity")]
    pub air_humidity: Option<Value>,
    #[serde(alias = "soilMoisture")]
    pub soil_moisture: Option<Value>,
    #[serde(alias = "soilTemp", alias = "soil_temperature", alias = "soilTemperature")]
    pub soil_temp: Option<Value>,
    #[serde(alias = "lightLux", alias = "light_intensity", alias = "lightIntensity")]
    pub light_lux: Option<Value>,
    #[serde(alias = "windSpeed")]
    pub wind_speed: Option<Value>,
}

impl RawSensorReading {
    pub fn into_canonical(self) -> SensorReading {
        // ---
        SensorReading {
            timestamp: text(self.timestamp),
            air_temp: coerce_opt(self.air_temp.as_ref()),
            air_humidity: coerce_opt(self.air_humidity.as_ref()),
            soil_moisture: coerce_opt(self.soil_moisture.as_ref()),
            soil_temp: coerce_opt(self.soil_temp.as_ref()),
            light_lux: coerce_opt(self.light_lux.as_ref()),
            wind_speed: coerce_opt(self.wind_speed.as_ref()),
        }
    }
}

/// Field metadata with its sensor history already attached.
#[derive(Debug, Deserialize)]
pub struct RawFieldWithReadings {
    // ---
    #[serde(flatten)]
    pub field: RawFieldRecord,
    #[serde(alias = "sensorData", alias = "readings")]
    pub sensor_data: Option<Value>,
}

impl RawFieldWithReadings {
    pub fn into_canonical(self) -> FieldWithReadings {
        // ---
        FieldWithReadings {
            field: self.field.into_canonical(),
            sensor_data: list::<RawSensorReading>(self.sensor_data)
                .into_iter()
                .map(RawSensorReading::into_canonical)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawRecommendationItem {
    #[serde(rename = "type", alias = "kind")]
    pub kind: Option<Value>,
    pub status: Option<Value>,
    pub message: Option<Value>,
}

impl RawRecommendationItem {
    pub fn into_canonical(self) -> RecommendationItem {
        RecommendationItem {
            kind: text(self.kind),
            status: status(self.status),
            message: text(self.message),
        }
    }
}

/// Advisory as served by the advisory history endpoint.
#[derive(Debug, Deserialize)]
pub struct RawAdvisoryRecord {
    // ---
    #[serde(alias = "advisoryId", alias = "id")]
    pub advisory_id: Option<Value>,
    #[serde(alias = "fieldId")]
    pub field_id: Option<Value>,
    #[serde(alias = "fieldName")]
    pub field_name: Option<Value>,
    #[serde(alias = "created_at", alias = "createdAt")]
    pub date: Option<Value>,
    pub recommendations: Option<Value>,
}

impl RawAdvisoryRecord {
    pub fn into_canonical(self) -> AdvisoryRecord {
        // ---
        AdvisoryRecord {
            advisory_id: self.advisory_id.as_ref().and_then(id_string),
            field_id: self.field_id.as_ref().and_then(id_string),
            field_name: text(self.field_name),
            date: text(self.date),
            recommendations: list::<RawRecommendationItem>(self.recommendations)
                .into_iter()
                .map(RawRecommendationItem::into_canonical)
                .collect(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawFarmerProfile {
    pub name: Option<Value>,
    pub location: Option<Value>,
    #[serde(alias = "farmingType")]
    pub farming_type: Option<Value>,
}

impl RawFarmerProfile {
    pub fn into_canonical(self) -> FarmerProfile {
        FarmerProfile {
            name: text(self.name),
            location: text(self.location),
            farming_type: text(self.farming_type),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawRecommendation {
    pub title: Option<Value>,
    pub description: Option<Value>,
    pub status: Option<Value>,
    pub explanation: Option<Value>,
    pub timing: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawFieldRecommendations {
    // ---
    #[serde(alias = "cropStage")]
    pub crop_stage: Option<Value>,
    #[serde(alias = "gddValue", alias = "gdd")]
    pub gdd_value: Option<Value>,
    pub recommendations: Option<Value>,
    #[serde(alias = "aiReasoningText", alias = "reasoning")]
    pub ai_reasoning_text: Option<Value>,
}

impl RawFieldRecommendations {
    pub fn into_canonical(self) -> FieldRecommendations {
        // ---
        let recommendations = list::<RawRecommendation>(self.recommendations)
            .into_iter()
            .map(|r| Recommendation {
                title: text(r.title),
                description: text(r.description),
                status: status(r.status),
                explanation: text(r.explanation),
                timing: text(r.timing),
            })
            .collect();

        FieldRecommendations {
            crop_stage: text(self.crop_stage),
            gdd_value: coerce_opt(self.gdd_value.as_ref()),
            recommendations,
            ai_reasoning_text: text(self.ai_reasoning_text),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RawCurrentConditions {
    #[serde(alias = "temp")]
    pub temperature: Option<Value>,
    pub humidity: Option<Value>,
    #[serde(alias = "windSpeed")]
    pub wind_speed: Option<Value>,
    #[serde(alias = "condition", alias = "description")]
    pub conditions: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawForecastEntry {
    pub time: Option<Value>,
    #[serde(alias = "temp")]
    pub temperature: Option<Value>,
    #[serde(alias = "condition", alias = "description")]
    pub conditions: Option<Value>,
}

#[derive(Debug, Deserialize)]
pub struct RawWeatherAlert {
    #[serde(rename = "type", alias = "kind")]
    pub kind: Option<Value>,
    pub title: Option<Value>,
    pub message: Option<Value>,
}

/// Weather payload: current conditions plus optional forecast and alerts.
#[derive(Debug, Deserialize)]
pub struct RawWeatherSnapshot {
    pub current: Option<RawCurrentConditions>,
    pub forecast: Option<Value>,
    pub alerts: Option<Value>,
}

impl RawWeatherSnapshot {
    pub fn into_canonical(self) -> WeatherSnapshot {
        // ---
        let current = self
            .current
            .map(|c| CurrentConditions {
                temperature: coerce_opt(c.temperature.as_ref()),
                humidity: coerce_opt(c.humidity.as_ref()),
                wind_speed: coerce_opt(c.wind_speed.as_ref()),
                conditions: text(c.conditions),
            })
            .unwrap_or_default();

        let forecast = list::<RawForecastEntry>(self.forecast)
            .into_iter()
            .map(|f| ForecastEntry {
                time: text(f.time),
                temperature: coerce_opt(f.temperature.as_ref()),
                conditions: text(f.conditions),
            })
            .collect();

        let alerts = list::<RawWeatherAlert>(self.alerts)
            .into_iter()
            .map(|a| WeatherAlert {
                kind: text(a.kind),
                title: text(a.title),
                message: text(a.message),
            })
            .collect();

        WeatherSnapshot {
            current,
            forecast,
            alerts,
        }
    }
}
