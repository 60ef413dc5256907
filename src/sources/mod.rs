//! Source Adapters for the upstream farm API.
//!
//! [`SourceClient`] is constructed once from [`Config`] and passed to whoever
//! needs it; nothing here reaches for global state. Every payload is
//! normalized through the `Raw*` models before it leaves this module.
//!
//! A failing source never aborts a report. Callers turn failures into empty
//! collections with [`or_empty`], which logs what was lost.

use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::SourceFetchError;
use crate::models::{
    AdvisoryRecord, FarmerProfile, FarmerSnapshot, FieldRecommendations, FieldRecord,
    FieldWithReadings, RawAdvisoryRecord, RawFarmerProfile, RawFieldRecommendations,
    RawFieldRecord, RawSensorReading, RawWeatherSnapshot, SensorReading, WeatherSnapshot,
};

// ---

/// Unwrap `{ "data": ... }` / `{ "results": ... }` envelopes.
fn unwrap_envelope(value: &Value) -> &Value {
    // ---
    for key in ["data", "results"] {
        if let Some(inner) = value.get(key) {
            if inner.is_array() || inner.is_object() {
                return inner;
            }
        }
    }
    value
}

/// Decode a list payload, tolerating everything that is not a list.
///
/// Accepts a bare array or one wrapped under `data`/`results`. Null and
/// non-array values decode as empty; items that fail to decode are logged
/// and skipped while the rest are kept.
pub fn decode_list<T: DeserializeOwned>(value: &Value, what: &str) -> Vec<T> {
    // ---
    let Some(items) = unwrap_envelope(value).as_array() else {
        if !value.is_null() {
            warn!(source = what, "Expected a list, treating payload as empty");
        }
        return Vec::new();
    };

    let mut decoded = Vec::with_capacity(items.len());
    for (i, item) in items.iter().enumerate() {
        match serde_json::from_value::<T>(item.clone()) {
            Ok(parsed) => decoded.push(parsed),
            Err(e) => {
                warn!(source = what, index = i, reason = %e, "Skipping undecodable item");
            }
        }
    }

    debug!(source = what, kept = decoded.len(), total = items.len(), "Decoded list");
    decoded
}

/// Value of a failed source, logged and replaced by its default.
pub fn or_empty<T: Default>(what: &str, result: Result<T, SourceFetchError>) -> T {
    // ---
    match result {
        Ok(value) => value,
        Err(e) => {
            warn!(source = what, reason = %e, "Source unavailable, continuing without it");
            T::default()
        }
    }
}

/// HTTP client for the upstream farm API.
#[derive(Debug, Clone)]
pub struct SourceClient {
    http: reqwest::Client,
    base_url: String,
}

impl SourceClient {
    pub fn new(base_url: &str, token: Option<&str>, timeout: Duration) -> reqwest::Result<Self> {
        // ---
        let mut headers = HeaderMap::new();
        if let Some(token) = token.filter(|t| !t.is_empty()) {
            if let Ok(mut value) = HeaderValue::from_str(&format!("Bearer {token}")) {
                value.set_sensitive(true);
                headers.insert(AUTHORIZATION, value);
            } else {
                warn!("SOURCE_API_TOKEN contains invalid header characters, sending no token");
            }
        }

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .default_headers(headers)
            .build()?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> reqwest::Result<Self> {
        Self::new(
            &config.source_api_url,
            config.source_api_token.as_deref(),
            Duration::from_secs(u64::from(config.source_timeout_secs)),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json(&self, path: &str, query: &[(&str, &str)]) -> Result<Value, SourceFetchError> {
        // ---
        let url = format!("{}{}", self.base_url, path);
        debug!("Fetching {}", url);

        let response = self
            .http
            .get(&url)
            .query(query)
            .send()
            .await
            .map_err(|source| SourceFetchError::Http {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(SourceFetchError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response
            .json::<Value>()
            .await
            .map_err(|source| SourceFetchError::Decode { url, source })
    }

    async fn get_object<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> Result<T, SourceFetchError> {
        // ---
        let value = self.get_json(path, query).await?;
        serde_json::from_value(unwrap_envelope(&value).clone()).map_err(|source| {
            SourceFetchError::Payload {
                url: format!("{}{}", self.base_url, path),
                source,
            }
        })
    }

    /// `GET /fields`
    pub async fn fields(&self) -> Result<Vec<FieldRecord>, SourceFetchError> {
        // ---
        let value = self.get_json("/fields", &[]).await?;
        Ok(decode_list::<RawFieldRecord>(&value, "fields")
            .into_iter()
            .map(RawFieldRecord::into_canonical)
            .collect())
    }

    /// One field from `GET /fields`, matched by id.
    pub async fn field(&self, field_id: &str) -> Result<Option<FieldRecord>, SourceFetchError> {
        // ---
        let fields = self.fields().await?;
        Ok(fields.into_iter().find(|f| f.id.as_deref() == Some(field_id)))
    }

    /// `GET /fields/{id}/sensors/historical?range={days}d`
    pub async fn sensor_history(
        &self,
        field_id: &str,
        days: u32,
    ) -> Result<Vec<SensorReading>, SourceFetchError> {
        // ---
        let path = format!("/fields/{field_id}/sensors/historical");
        let range = format!("{days}d");
        let value = self.get_json(&path, &[("range", range.as_str())]).await?;

        Ok(decode_list::<RawSensorReading>(&value, "sensor history")
            .into_iter()
            .map(RawSensorReading::into_canonical)
            .collect())
    }

    /// `GET /advisories`, optionally scoped to one field.
    pub async fn advisories(
        &self,
        field_id: Option<&str>,
    ) -> Result<Vec<AdvisoryRecord>, SourceFetchError> {
        // ---
        let query: Vec<(&str, &str)> = field_id.map(|id| ("field_id", id)).into_iter().collect();
        let value = self.get_json("/advisories", &query).await?;

        Ok(decode_list::<RawAdvisoryRecord>(&value, "advisories")
            .into_iter()
            .map(RawAdvisoryRecord::into_canonical)
            .collect())
    }

    /// `GET /fields/{id}/recommendations`
    pub async fn recommendations(
        &self,
        field_id: &str,
    ) -> Result<FieldRecommendations, SourceFetchError> {
        // ---
        let path = format!("/fields/{field_id}/recommendations");
        let raw: RawFieldRecommendations = self.get_object(&path, &[]).await?;
        Ok(raw.into_canonical())
    }

    /// `GET /weather/report?location=`
    pub async fn weather(&self, location: &str) -> Result<WeatherSnapshot, SourceFetchError> {
        // ---
        let raw: RawWeatherSnapshot = self
            .get_object("/weather/report", &[("location", location)])
            .await?;
        Ok(raw.into_canonical())
    }

    /// `GET /farmers/me`
    pub async fn farmer_profile(&self) -> Result<FarmerProfile, SourceFetchError> {
        // ---
        let raw: RawFarmerProfile = self.get_object("/farmers/me", &[]).await?;
        Ok(raw.into_canonical())
    }

    /// Everything the full report needs, fetched concurrently.
    ///
    /// Fields, advisories and the profile are fetched side by side, then every
    /// field's sensor history in parallel. Any source that fails contributes
    /// an empty collection.
    pub async fn farmer_snapshot(&self, days: u32) -> FarmerSnapshot {
        // ---
        let (fields, advisories, profile) =
            tokio::join!(self.fields(), self.advisories(None), self.farmer_profile());

        let fields = or_empty("fields", fields);
        let advisories = or_empty("advisories", advisories);
        let profile = or_empty("farmer profile", profile);

        let mut histories: Vec<Vec<SensorReading>> = vec![Vec::new(); fields.len()];
        let mut tasks = JoinSet::new();

        for (index, field) in fields.iter().enumerate() {
            let Some(id) = field.id.clone() else {
                continue;
            };
            let client = self.clone();
            tasks.spawn(async move {
                let result = client.sensor_history(&id, days).await;
                (index, id, result)
            });
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, id, result)) => {
                    histories[index] = or_empty(&format!("sensor history for field {id}"), result);
                }
                Err(e) => warn!(reason = %e, "Sensor history task did not complete"),
            }
        }

        let fields: Vec<FieldWithReadings> = fields
            .into_iter()
            .zip(histories)
            .map(|(field, sensor_data)| FieldWithReadings { field, sensor_data })
            .collect();

        info!(
            fields = fields.len(),
            advisories = advisories.len(),
            readings = fields.iter().map(|f| f.sensor_data.len()).sum::<usize>(),
            "Fetched farmer snapshot"
        );

        FarmerSnapshot {
            profile,
            fields,
            advisories,
        }
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use serde_json::json;
    use tokio_test::{assert_err, block_on};

    #[test]
    fn decode_list_accepts_bare_and_wrapped_arrays() {
        // ---
        let bare = json!([{ "id": 1, "name": "North" }]);
        let wrapped = json!({ "data": [{ "field_id": "7", "name": "South" }] });
        let results = json!({ "results": [{ "id": "x" }], "next_cursor": null });

        let a: Vec<FieldRecord> = decode_list::<RawFieldRecord>(&bare, "fields")
            .into_iter()
            .map(RawFieldRecord::into_canonical)
            .collect();
        let b: Vec<FieldRecord> = decode_list::<RawFieldRecord>(&wrapped, "fields")
            .into_iter()
            .map(RawFieldRecord::into_canonical)
            .collect();

        assert_eq!(a[0].id.as_deref(), Some("1"));
        assert_eq!(b[0].id.as_deref(), Some("7"));
        assert_eq!(decode_list::<RawFieldRecord>(&results, "fields").len(), 1);
    }

    #[test]
    fn decode_list_treats_non_lists_as_empty() {
        // ---
        assert!(decode_list::<RawFieldRecord>(&Value::Null, "fields").is_empty());
        assert!(decode_list::<RawFieldRecord>(&json!("oops"), "fields").is_empty());
        assert!(decode_list::<RawFieldRecord>(&json!({ "id": 1 }), "fields").is_empty());
    }

    #[test]
    fn decode_list_skips_bad_items_only() {
        // ---
        let value = json!([{ "id": 1 }, "not an object", 42, { "id": 2 }]);
        let fields = decode_list::<RawFieldRecord>(&value, "fields");
        assert_eq!(fields.len(), 2);
    }

    #[test]
    fn or_empty_swallows_failures() {
        // ---
        let failed: Result<Vec<FieldRecord>, SourceFetchError> = Err(SourceFetchError::Status {
            url: "http://upstream/fields".into(),
            status: 503,
        });
        assert!(or_empty("fields", failed).is_empty());
        assert_eq!(or_empty("count", Ok::<_, SourceFetchError>(3)), 3);
    }

    #[test]
    fn unreachable_upstream_is_an_http_error() {
        // ---
        let client =
            SourceClient::new("http://127.0.0.1:9/", None, Duration::from_secs(2)).unwrap();
        assert_eq!(client.base_url(), "http://127.0.0.1:9");

        let result = block_on(client.fields());
        assert_err!(&result);
        assert!(matches!(result, Err(SourceFetchError::Http { .. })));
    }
}
