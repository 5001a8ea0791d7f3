//! AQI severity classification.
//!
//! Fixed CPCB-style breakpoints and the matching display color ramp. This is
//! the single source of truth for severity everywhere a value is colored:
//! ward fills, marker icons, and the summary panel.

use serde::{Deserialize, Serialize};

/// Severity category for an AQI value, ordered from best to worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AqiCategory {
    Good,
    Satisfactory,
    Moderate,
    Poor,
    VeryPoor,
    Severe,
}

impl AqiCategory {
    /// Rank for monotonicity comparisons: Good = 0 .. Severe = 5.
    #[must_use]
    pub fn severity_rank(self) -> u8 {
        match self {
            AqiCategory::Good => 0,
            AqiCategory::Satisfactory => 1,
            AqiCategory::Moderate => 2,
            AqiCategory::Poor => 3,
            AqiCategory::VeryPoor => 4,
            AqiCategory::Severe => 5,
        }
    }
}

impl std::fmt::Display for AqiCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AqiCategory::Good => write!(f, "Good"),
            AqiCategory::Satisfactory => write!(f, "Satisfactory"),
            AqiCategory::Moderate => write!(f, "Moderate"),
            AqiCategory::Poor => write!(f, "Poor"),
            AqiCategory::VeryPoor => write!(f, "Very Poor"),
            AqiCategory::Severe => write!(f, "Severe"),
        }
    }
}

/// A classified AQI value: category plus its display color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AqiClass {
    pub category: AqiCategory,
    pub color: &'static str,
}

/// Maps an AQI value to its severity category and color.
///
/// Breakpoints are inclusive upper bounds: ≤50 Good, ≤100 Satisfactory,
/// ≤200 Moderate, ≤300 Poor, ≤400 Very Poor, else Severe. Non-finite or
/// non-positive values fall into the lowest band rather than erroring —
/// a missing reading is presented as neutral, never as a crash.
#[must_use]
pub fn classify(aqi: f64) -> AqiClass {
    let (category, color) = if !aqi.is_finite() || aqi <= 50.0 {
        (AqiCategory::Good, "#00e400")
    } else if aqi <= 100.0 {
        (AqiCategory::Satisfactory, "#ffff00")
    } else if aqi <= 200.0 {
        (AqiCategory::Moderate, "#ff7e00")
    } else if aqi <= 300.0 {
        (AqiCategory::Poor, "#ff0000")
    } else if aqi <= 400.0 {
        (AqiCategory::VeryPoor, "#8f3f97")
    } else {
        (AqiCategory::Severe, "#7e0023")
    };
    AqiClass { category, color }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_concrete_breakpoints() {
        assert_eq!(classify(40.0).category, AqiCategory::Good);
        assert_eq!(classify(50.0).category, AqiCategory::Good);
        assert_eq!(classify(51.0).category, AqiCategory::Satisfactory);
        assert_eq!(classify(100.0).category, AqiCategory::Satisfactory);
        assert_eq!(classify(120.0).category, AqiCategory::Moderate);
        assert_eq!(classify(250.0).category, AqiCategory::Poor);
        assert_eq!(classify(350.0).category, AqiCategory::VeryPoor);
        assert_eq!(classify(450.0).category, AqiCategory::Severe);
    }

    #[test]
    fn classify_is_monotonic() {
        let mut prev = 0u8;
        let mut aqi = 0.0;
        while aqi <= 600.0 {
            let rank = classify(aqi).category.severity_rank();
            assert!(
                rank >= prev,
                "severity rank decreased at aqi={aqi}: {rank} < {prev}"
            );
            prev = rank;
            aqi += 0.5;
        }
    }

    #[test]
    fn classify_non_finite_and_non_positive_are_neutral() {
        assert_eq!(classify(f64::NAN).category, AqiCategory::Good);
        assert_eq!(classify(f64::INFINITY).category, AqiCategory::Good);
        assert_eq!(classify(-10.0).category, AqiCategory::Good);
        assert_eq!(classify(0.0).category, AqiCategory::Good);
    }

    #[test]
    fn classify_colors_match_categories() {
        assert_eq!(classify(40.0).color, "#00e400");
        assert_eq!(classify(120.0).color, "#ff7e00");
        assert_eq!(classify(450.0).color, "#7e0023");
    }
}
