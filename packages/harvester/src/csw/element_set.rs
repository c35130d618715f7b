//! CSW `ElementSetName` negotiation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Level of detail requested for returned records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementSetName {
    Brief,
    /// What a CSW server returns when the parameter is absent.
    #[default]
    Summary,
    Full,
}

impl ElementSetName {
    /// Wire value of the parameter.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Brief => "brief",
            Self::Summary => "summary",
            Self::Full => "full",
        }
    }

    /// Negotiate an element set from an optional raw value.
    ///
    /// Absence means [`ElementSetName::Summary`]. Matching is exact and
    /// case-sensitive.
    ///
    /// # Examples
    /// ```
    /// use catalog_harvester::csw::ElementSetName;
    ///
    /// assert_eq!(ElementSetName::parse(None).unwrap(), ElementSetName::Summary);
    /// assert_eq!(ElementSetName::parse(Some("full")).unwrap(), ElementSetName::Full);
    /// assert!(ElementSetName::parse(Some("FULL")).is_err());
    /// ```
    pub fn parse(raw: Option<&str>) -> Result<Self, ValidationError> {
        match raw {
            None => Ok(Self::Summary),
            Some(value) => value.parse(),
        }
    }
}

impl FromStr for ElementSetName {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "brief" => Ok(Self::Brief),
            "summary" => Ok(Self::Summary),
            "full" => Ok(Self::Full),
            other => Err(ValidationError::InvalidParameterValue {
                parameter: "elementSetName".to_string(),
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for ElementSetName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_absent_value_is_summary() {
        assert_eq!(ElementSetName::parse(None), Ok(ElementSetName::Summary));
        assert_eq!(ElementSetName::default(), ElementSetName::Summary);
    }

    #[test]
    fn test_known_values() {
        assert_eq!(ElementSetName::parse(Some("brief")), Ok(ElementSetName::Brief));
        assert_eq!(ElementSetName::parse(Some("summary")), Ok(ElementSetName::Summary));
        assert_eq!(ElementSetName::parse(Some("full")), Ok(ElementSetName::Full));
    }

    #[test]
    fn test_rejects_wrong_case_and_unknown_values() {
        for raw in ["BRIEF", "invalid", "", " full"] {
            assert_eq!(
                ElementSetName::parse(Some(raw)),
                Err(ValidationError::InvalidParameterValue {
                    parameter: "elementSetName".to_string(),
                    value: raw.to_string(),
                })
            );
        }
    }

    #[test]
    fn test_display_is_wire_value() {
        assert_eq!(ElementSetName::Brief.to_string(), "brief");
        assert_eq!(ElementSetName::Full.as_str(), "full");
    }
}
