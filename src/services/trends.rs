// src/services/trends.rs
use log::info;
use std::path::Path;

use crate::errors::GenerationError;
use crate::models::Trend;

const BUILTIN_CATALOG: &str = include_str!("../../data/trends.json");

/// Read-only list of style templates, sorted by display order.
#[derive(Debug, Clone)]
pub struct TrendCatalog {
    trends: Vec<Trend>,
}

impl TrendCatalog {
    pub fn new(mut trends: Vec<Trend>) -> Self {
        // Stable sort keeps file order for equal `order` values.
        trends.sort_by_key(|t| t.order);
        Self { trends }
    }

    pub fn builtin() -> Result<Self, GenerationError> {
        Self::from_json(BUILTIN_CATALOG)
    }

    pub fn from_json(raw: &str) -> Result<Self, GenerationError> {
        let trends: Vec<Trend> = serde_json::from_str(raw)
            .map_err(|e| GenerationError::Catalog(format!("invalid catalog JSON: {}", e)))?;
        Ok(Self::new(trends))
    }

    pub fn load(path: &Path) -> Result<Self, GenerationError> {
        let raw = std::fs::read_to_string(path).map_err(|e| {
            GenerationError::Catalog(format!("cannot read {}: {}", path.display(), e))
        })?;
        let catalog = Self::from_json(&raw)?;
        info!(
            "Loaded {} trend(s) from {}",
            catalog.trends.len(),
            path.display()
        );
        Ok(catalog)
    }

    pub fn all(&self) -> &[Trend] {
        &self.trends
    }

    pub fn get(&self, id: &str) -> Option<&Trend> {
        self.trends.iter().find(|t| t.id == id)
    }

    /// Case-insensitive substring match on the title. An empty term matches everything.
    pub fn search(&self, term: &str) -> Vec<&Trend> {
        let needle = term.trim().to_lowercase();
        self.trends
            .iter()
            .filter(|t| needle.is_empty() || t.title.to_lowercase().contains(&needle))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.trends.len()
    }

    pub fn is_empty(&self) -> bool {
        self.trends.is_empty()
    }
}
