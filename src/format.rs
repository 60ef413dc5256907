//! Display formatting for report cells.
//!
//! A missing value always renders as [`NA`], without a unit suffix.

pub const NA: &str = "N/A";

pub fn temperature(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:.1}°C"))
}

pub fn percent(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:.1}%"))
}

/// Whole numbers print without decimals, anything else with one.
pub fn percent_compact(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{}%", compact(v)))
}

pub fn lux(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:.0} lux"))
}

pub fn speed(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:.1} km/h"))
}

pub fn fixed1(value: Option<f64>) -> String {
    value.map_or_else(|| NA.to_string(), |v| format!("{v:.1}"))
}

/// Trimmed text, or [`NA`] when absent or blank.
pub fn text_or_na(value: Option<&str>) -> String {
    // ---
    match value.map(str::trim) {
        Some(s) if !s.is_empty() => s.to_string(),
        _ => NA.to_string(),
    }
}

fn compact(v: f64) -> String {
    // ---
    if v.fract() == 0.0 {
        format!("{v:.0}")
    } else {
        format!("{v:.1}")
    }
}
