//! Harvest job configuration.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::run::HarvestRun;

/// How often a harvest job is meant to run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Frequency {
    #[default]
    Once,
    Daily,
    Weekly,
    Monthly,
}

impl Frequency {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Once => "ONCE",
            Self::Daily => "DAILY",
            Self::Weekly => "WEEKLY",
            Self::Monthly => "MONTHLY",
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Frequency {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "once" => Ok(Self::Once),
            "daily" => Ok(Self::Daily),
            "weekly" => Ok(Self::Weekly),
            "monthly" => Ok(Self::Monthly),
            _ => Err(ValidationError::InvalidParameterValue {
                parameter: "frequency".to_string(),
                value: value.to_string(),
            }),
        }
    }
}

/// Kind of remote catalog a job harvests.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CatalogKind {
    #[default]
    Csw,
    /// A GeoNetwork node, harvested through its CSW endpoint.
    GeoNetwork,
}

/// A configured harvest job and its run history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ingest {
    /// Assigned by the repository on first save.
    #[serde(default)]
    pub id: Option<u64>,
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub catalog: CatalogKind,
    #[serde(default)]
    pub frequency: Frequency,
    pub begin_date: Option<NaiveDate>,
    #[serde(default)]
    pub required_fields: Vec<String>,
    #[serde(default)]
    pub runs: Vec<HarvestRun>,
}

impl Ingest {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            url: url.into(),
            catalog: CatalogKind::default(),
            frequency: Frequency::default(),
            begin_date: None,
            required_fields: Vec::new(),
            runs: Vec::new(),
        }
    }

    /// Add a required field, ignoring duplicates.
    pub fn add_required_field(&mut self, field: impl Into<String>) {
        let field = field.into();
        if !self.required_fields.contains(&field) {
            self.required_fields.push(field);
        }
    }

    /// Most recent run, if any.
    pub fn last_run(&self) -> Option<&HarvestRun> {
        self.runs.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frequency_from_str() {
        assert_eq!("daily".parse::<Frequency>(), Ok(Frequency::Daily));
        assert_eq!("MONTHLY".parse::<Frequency>(), Ok(Frequency::Monthly));
        assert!("hourly".parse::<Frequency>().is_err());
    }

    #[test]
    fn test_required_fields_are_unique() {
        let mut ingest = Ingest::new("roads", "http://example.org/csw");
        ingest.add_required_field("title");
        ingest.add_required_field("title");
        assert_eq!(ingest.required_fields, vec!["title"]);
    }

    #[test]
    fn test_yaml_defaults() {
        let ingest: Ingest =
            serde_yaml_ng::from_str("name: roads\nurl: http://example.org/csw\nbegin_date: null\n")
                .unwrap();
        assert_eq!(ingest.frequency, Frequency::Once);
        assert_eq!(ingest.catalog, CatalogKind::Csw);
        assert!(ingest.runs.is_empty());
    }
}
