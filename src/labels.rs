//! Label lookup for user-facing report text.
//!
//! Keys are the English display strings themselves, so a missing translation
//! degrades to readable English. Table column headers and fixed row labels do
//! not go through this lookup.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};

/// Supplies display strings for report prose (headings, cover lines, notes).
pub trait Labels: Send + Sync {
    /// Translation for `key`, if one exists.
    fn lookup(&self, key: &str) -> Option<String>;

    /// Translation for `key`, echoing the key when none exists.
    fn translate(&self, key: &str) -> String {
        self.lookup(key).unwrap_or_else(|| key.to_string())
    }
}

/// Echoes every key.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoLabels;

impl Labels for NoLabels {
    fn lookup(&self, _key: &str) -> Option<String> {
        None
    }
}

/// Translations loaded from a flat JSON object.
#[derive(Debug, Clone, Default)]
pub struct LabelCatalog {
    entries: HashMap<String, String>,
}

impl LabelCatalog {
    pub fn new(entries: HashMap<String, String>) -> Self {
        Self { entries }
    }

    /// Load a `{ "key": "translation", ... }` file.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        // ---
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading label file {}", path.display()))?;
        let entries: HashMap<String, String> = serde_json::from_str(&raw)
            .with_context(|| format!("parsing label file {}", path.display()))?;

        tracing::info!("Loaded {} labels from {}", entries.len(), path.display());
        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Labels for LabelCatalog {
    fn lookup(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }
}

/// `"{label}: {value}"` with the label translated.
pub fn labelled(labels: &dyn Labels, key: &str, value: &str) -> String {
    format!("{}: {}", labels.translate(key), value)
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    #[test]
    fn missing_keys_echo() {
        // ---
        assert_eq!(NoLabels.translate("Executive Summary"), "Executive Summary");

        let catalog = LabelCatalog::new(HashMap::from([(
            "Executive Summary".to_string(),
            "Resumen Ejecutivo".to_string(),
        )]));
        assert_eq!(catalog.translate("Executive Summary"), "Resumen Ejecutivo");
        assert_eq!(catalog.translate("Statistics"), "Statistics");
    }

    #[test]
    fn labelled_lines() {
        // ---
        assert_eq!(labelled(&NoLabels, "Farmer", "Asha"), "Farmer: Asha");
    }

    #[test]
    fn catalog_loads_from_file() {
        // ---
        let path = std::env::temp_dir().join(format!("labels-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, r#"{ "Statistics": "Estadísticas" }"#).unwrap();

        let catalog = LabelCatalog::from_json_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.translate("Statistics"), "Estadísticas");
    }

    #[test]
    fn bad_label_file_is_an_error() {
        // ---
        let path = std::env::temp_dir().join(format!("labels-{}.json", uuid::Uuid::new_v4()));
        std::fs::write(&path, "[1, 2, 3]").unwrap();

        let result = LabelCatalog::from_json_file(&path);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
