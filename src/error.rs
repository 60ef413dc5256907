//! Error taxonomy for the report engine.
//!
//! Only [`AssemblyError`] (wrapped in [`ReportError`]) ever crosses the
//! engine boundary. The other kinds are absorbed and logged by the component
//! that owns them: source failures become empty collections, unparsable
//! records are skipped, and charts that fail to rasterize are left out.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// A Source Adapter call failed or returned something unusable.
#[derive(Error, Debug)]
pub enum SourceFetchError {
    #[error("request to {url} failed: {source}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} answered with status {status}")]
    Status { url: String, status: u16 },

    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("unexpected payload shape from {url}: {source}")]
    Payload {
        url: String,
        #[source]
        source: serde_json::Error,
    },
}

/// A single record carried a value that could not be interpreted.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordParseError {
    #[error("unparsable timestamp {0:?}")]
    Timestamp(String),

    #[error("missing timestamp")]
    MissingTimestamp,
}

/// One chart could not be turned into a raster image.
#[derive(Error, Debug)]
pub enum RasterizationError {
    #[error("chart '{0}' has no numeric points to plot")]
    EmptySeries(String),

    #[error("chart '{label}' has invalid dimensions {width}x{height}")]
    InvalidSize {
        label: String,
        width: u32,
        height: u32,
    },

    #[error("chart '{label}' could not be decoded: {reason}")]
    Decode { label: String, reason: String },

    #[error("chart '{label}' could not be encoded: {reason}")]
    Encode { label: String, reason: String },
}

/// The document backend failed while producing the output file.
#[derive(Error, Debug)]
pub enum AssemblyError {
    #[error("PDF backend error: {0}")]
    Backend(String),

    #[error("embedded image {index} could not be decoded: {reason}")]
    Image { index: usize, reason: String },
}

/// Boundary error returned to callers of the engine and the HTTP layer.
#[derive(Error, Debug)]
pub enum ReportError {
    #[error("Failed to generate report: {0}")]
    Assembly(#[from] AssemblyError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),
}

pub type ReportResult<T> = Result<T, ReportError>;

impl IntoResponse for ReportError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ReportError::InvalidRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ReportError::Assembly(e) => {
                tracing::error!("Report assembly failed: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to generate report".to_string(),
                )
            }
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn assembly_errors_hide_details_from_clients() {
        // ---
        let err = ReportError::from(AssemblyError::Backend("xref table broken".into()));
        let response = err.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn invalid_requests_map_to_bad_request() {
        // ---
        let err = ReportError::InvalidRequest("days must be between 1 and 365".into());
        assert_eq!(
            err.to_string(),
            "Invalid request: days must be between 1 and 365"
        );
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
