//! Bounding box validation.
//!
//! [`validate_bounds`] keeps a plain boolean contract; [`check_bounds`] says
//! why a box was rejected.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::{LATITUDE_RANGE, LONGITUDE_RANGE};
use crate::error::ValidationError;

/// A validated geographic extent in degrees (x = longitude, y = latitude).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

/// Bounding box coordinates as extracted from metadata, not yet parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextBounds {
    pub min_x: String,
    pub min_y: String,
    pub max_x: String,
    pub max_y: String,
}

impl TextBounds {
    pub fn new(
        min_x: impl Into<String>,
        min_y: impl Into<String>,
        max_x: impl Into<String>,
        max_y: impl Into<String>,
    ) -> Self {
        Self {
            min_x: min_x.into(),
            min_y: min_y.into(),
            max_x: max_x.into(),
            max_y: max_y.into(),
        }
    }

    pub fn check(&self) -> Result<BoundingBox, BoundsIssue> {
        check_bounds(
            self.min_x.as_str(),
            self.min_y.as_str(),
            self.max_x.as_str(),
            self.max_y.as_str(),
        )
    }
}

/// Why a bounding box was rejected.
#[derive(Debug, Clone, PartialEq)]
pub enum BoundsIssue {
    /// A value is not a number at all.
    Unparseable(String),
    /// NaN or infinite.
    NotFinite,
    OutOfRange { axis: Axis, value: f64 },
    /// A minimum exceeds its maximum.
    Inverted { axis: Axis },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Longitude,
    Latitude,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Longitude => f.write_str("longitude"),
            Self::Latitude => f.write_str("latitude"),
        }
    }
}

impl fmt::Display for BoundsIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable(value) => write!(f, "'{value}' is not a number"),
            Self::NotFinite => f.write_str("coordinate is not finite"),
            Self::OutOfRange { axis, value } => write!(f, "{axis} {value} is out of range"),
            Self::Inverted { axis } => write!(f, "minimum {axis} exceeds maximum"),
        }
    }
}

impl From<BoundsIssue> for ValidationError {
    fn from(issue: BoundsIssue) -> Self {
        ValidationError::InvalidBounds(issue.to_string())
    }
}

/// A value that can be read as one coordinate.
pub trait CoordinateInput {
    fn to_coordinate(&self) -> Result<f64, BoundsIssue>;
}

impl CoordinateInput for f64 {
    fn to_coordinate(&self) -> Result<f64, BoundsIssue> {
        if self.is_finite() {
            Ok(*self)
        } else {
            Err(BoundsIssue::NotFinite)
        }
    }
}

impl CoordinateInput for &str {
    fn to_coordinate(&self) -> Result<f64, BoundsIssue> {
        let value: f64 = self
            .trim()
            .parse()
            .map_err(|_| BoundsIssue::Unparseable(self.to_string()))?;
        value.to_coordinate()
    }
}

impl CoordinateInput for String {
    fn to_coordinate(&self) -> Result<f64, BoundsIssue> {
        self.as_str().to_coordinate()
    }
}

/// Validate four coordinates and return the parsed box or the first issue.
///
/// # Examples
/// ```
/// use catalog_harvester::bbox::{check_bounds, Axis, BoundsIssue};
///
/// assert!(check_bounds(-75.0, 40.0, -70.0, 45.0).is_ok());
/// assert_eq!(
///     check_bounds(-70.0, 40.0, -75.0, 45.0),
///     Err(BoundsIssue::Inverted { axis: Axis::Longitude })
/// );
/// ```
pub fn check_bounds<T: CoordinateInput>(
    min_x: T,
    min_y: T,
    max_x: T,
    max_y: T,
) -> Result<BoundingBox, BoundsIssue> {
    let bbox = BoundingBox {
        min_x: min_x.to_coordinate()?,
        min_y: min_y.to_coordinate()?,
        max_x: max_x.to_coordinate()?,
        max_y: max_y.to_coordinate()?,
    };

    for value in [bbox.min_x, bbox.max_x] {
        in_range(Axis::Longitude, value, LONGITUDE_RANGE)?;
    }
    for value in [bbox.min_y, bbox.max_y] {
        in_range(Axis::Latitude, value, LATITUDE_RANGE)?;
    }

    if bbox.min_x > bbox.max_x {
        return Err(BoundsIssue::Inverted {
            axis: Axis::Longitude,
        });
    }
    if bbox.min_y > bbox.max_y {
        return Err(BoundsIssue::Inverted {
            axis: Axis::Latitude,
        });
    }
    Ok(bbox)
}

fn in_range(axis: Axis, value: f64, (low, high): (f64, f64)) -> Result<(), BoundsIssue> {
    if (low..=high).contains(&value) {
        Ok(())
    } else {
        Err(BoundsIssue::OutOfRange { axis, value })
    }
}

/// Whether four coordinates form a valid geographic extent.
///
/// Text and numeric inputs give the same answer for the same values.
///
/// # Examples
/// ```
/// use catalog_harvester::bbox::validate_bounds;
///
/// assert!(validate_bounds("-75.0", "40.0", "-70.0", "45.0"));
/// assert!(!validate_bounds("x", "0", "1", "1"));
/// ```
pub fn validate_bounds<T: CoordinateInput>(min_x: T, min_y: T, max_x: T, max_y: T) -> bool {
    check_bounds(min_x, min_y, max_x, max_y).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const CASES: [([&str; 4], bool); 9] = [
        (["-75.0", "40.0", "-70.0", "45.0"], true),
        (["-70.0", "40.0", "-75.0", "45.0"], false),
        (["-75.0", "45.0", "-70.0", "40.0"], false),
        (["-180", "-90", "180", "90"], true),
        (["0", "0", "0", "0"], true),
        (["-181", "0", "10", "10"], false),
        (["0", "0", "10", "90.5"], false),
        (["NaN", "0", "1", "1"], false),
        (["inf", "0", "1", "1"], false),
    ];

    #[test]
    fn test_known_boxes() {
        for ([a, b, c, d], expected) in CASES {
            assert_eq!(validate_bounds(a, b, c, d), expected, "{a} {b} {c} {d}");
        }
    }

    #[test]
    fn test_text_and_numeric_forms_agree() {
        for ([a, b, c, d], _) in CASES {
            let numbers: Vec<f64> = [a, b, c, d].iter().map(|v| v.parse().unwrap()).collect();
            assert_eq!(
                validate_bounds(a, b, c, d),
                validate_bounds(numbers[0], numbers[1], numbers[2], numbers[3]),
                "{a} {b} {c} {d}"
            );
            assert_eq!(
                validate_bounds(a.to_string(), b.to_string(), c.to_string(), d.to_string()),
                validate_bounds(a, b, c, d)
            );
        }
    }

    #[test]
    fn test_non_numeric_input() {
        assert!(!validate_bounds("x", "0", "1", "1"));
        assert_eq!(
            check_bounds("x", "0", "1", "1"),
            Err(BoundsIssue::Unparseable("x".to_string()))
        );
        assert!(!validate_bounds("", "0", "1", "1"));
    }

    #[test]
    fn test_whitespace_is_trimmed() {
        assert!(validate_bounds(" -75.0", "40.0 ", "-70.0", "45.0"));
    }

    #[test]
    fn test_issue_converts_to_validation_error() {
        let err: ValidationError = BoundsIssue::Inverted {
            axis: Axis::Latitude,
        }
        .into();
        assert_eq!(
            err,
            ValidationError::InvalidBounds("minimum latitude exceeds maximum".to_string())
        );
    }

    #[test]
    fn test_text_bounds_check() {
        let bounds = TextBounds::new("1", "2", "3", "4");
        assert_eq!(
            bounds.check(),
            Ok(BoundingBox {
                min_x: 1.0,
                min_y: 2.0,
                max_x: 3.0,
                max_y: 4.0
            })
        );
    }
}
