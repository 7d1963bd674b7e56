use anyhow::{anyhow, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod wire;

/// One candidate label from the upstream breed classifier. The list a
/// capture carries is ordered highest-confidence first and treated as
/// opaque input everywhere except the final review step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Prediction {
    pub label: String,
    pub confidence: f64,
}

impl Prediction {
    pub fn validate(&self) -> Result<()> {
        if self.label.trim().is_empty() {
            return Err(anyhow!("prediction label is required"));
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(anyhow!("confidence must be between 0 and 1"));
        }
        Ok(())
    }
}

/// The three quality gates a reviewer answers on the approval path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
pub struct QualityChecks {
    pub lighting: bool,
    pub sharpness: bool,
    pub centering: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CaptureKind {
    Scan,
    Registration,
}

impl CaptureKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CaptureKind::Scan => "scan",
            CaptureKind::Registration => "registration",
        }
    }

    pub fn from_str_value(value: &str) -> Result<Self> {
        match value {
            "scan" => Ok(CaptureKind::Scan),
            "registration" => Ok(CaptureKind::Registration),
            other => Err(anyhow!("unknown capture kind: {other}")),
        }
    }
}

impl fmt::Display for CaptureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Terminal classification of one uploaded image. `Pending` is never
/// stored; it is derived from the absence of a decision row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Pending,
    Approved,
    Rejected,
}

impl Disposition {
    pub fn as_str(&self) -> &'static str {
        match self {
            Disposition::Pending => "pending",
            Disposition::Approved => "approved",
            Disposition::Rejected => "rejected",
        }
    }
}

impl fmt::Display for Disposition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A stored image URL with the angle label recorded at capture time, if any.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RunImage {
    pub url: String,
    pub angle_label: Option<String>,
}

/// Display label for an image at 1-based position `position`; falls back to
/// a synthetic "Angle N" when capture recorded no semantic label.
pub fn angle_label_or_default(angle_label: Option<&str>, position: usize) -> String {
    match angle_label {
        Some(label) if !label.trim().is_empty() => label.to_string(),
        _ => format!("Angle {position}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prediction_validation_rejects_empty_label() {
        let prediction = Prediction {
            label: "  ".into(),
            confidence: 0.5,
        };
        assert!(prediction.validate().is_err());
    }

    #[test]
    fn prediction_validation_rejects_out_of_range_confidence() {
        let prediction = Prediction {
            label: "Gir".into(),
            confidence: 1.2,
        };
        assert!(prediction.validate().is_err());
    }

    #[test]
    fn capture_kind_round_trips_wire_strings() {
        assert_eq!(CaptureKind::from_str_value("scan").unwrap(), CaptureKind::Scan);
        assert_eq!(
            CaptureKind::from_str_value("registration").unwrap(),
            CaptureKind::Registration
        );
        assert!(CaptureKind::from_str_value("other").is_err());
    }

    #[test]
    fn angle_label_falls_back_to_position() {
        assert_eq!(angle_label_or_default(Some("Muzzle"), 1), "Muzzle");
        assert_eq!(angle_label_or_default(Some(" "), 2), "Angle 2");
        assert_eq!(angle_label_or_default(None, 3), "Angle 3");
    }
}
