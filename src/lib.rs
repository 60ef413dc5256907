//! Report aggregation and generation engine for the FarmIQ advisory service.
//!
//! Data flows leaf-first through the modules:
//! - `sources` fetches fields, sensor history, advisories, recommendations
//!   and weather from the upstream API and normalizes them into `models`
//! - `aggregate` groups readings and advisories into per-date buckets
//! - `stats` computes min / max / average over sparse series
//! - `document` lays blocks out onto A4 pages and renders PDF
//! - `reports` composes the five report variants
//! - `routes` exposes them over HTTP
//!
//! Only assembly failures cross the engine boundary; everything else is
//! logged and absorbed where it happens (see `error`).

pub mod aggregate;
pub mod charts;
pub mod config;
pub mod document;
pub mod error;
pub mod format;
pub mod labels;
pub mod models;
pub mod numeric;
pub mod reports;
pub mod routes;
pub mod sources;
pub mod stats;

pub use config::Config;
pub use error::{AssemblyError, ReportError, ReportResult};
pub use reports::{GeneratedReport, ReportContext, ReportKind};
