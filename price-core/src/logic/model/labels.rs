//! Price tier mapping
//!
//! The remote classifier answers with a bare integer class. This maps it to
//! the text and artwork shown to users.

use serde::{Deserialize, Serialize};

/// Predicted price range of a phone
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriceTier {
    Budget,
    LowerMid,
    UpperMid,
    Premium,
    /// Any class outside 0..=3
    Unknown,
}

impl PriceTier {
    pub fn from_class(class: i64) -> Self {
        match class {
            0 => PriceTier::Budget,
            1 => PriceTier::LowerMid,
            2 => PriceTier::UpperMid,
            3 => PriceTier::Premium,
            _ => PriceTier::Unknown,
        }
    }

    /// Class index, `None` for `Unknown`
    pub fn class(&self) -> Option<i64> {
        match self {
            PriceTier::Budget => Some(0),
            PriceTier::LowerMid => Some(1),
            PriceTier::UpperMid => Some(2),
            PriceTier::Premium => Some(3),
            PriceTier::Unknown => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            PriceTier::Budget => "Budget mobile phone",
            PriceTier::LowerMid => "Lower mid-range phone",
            PriceTier::UpperMid => "Upper mid-range phone",
            PriceTier::Premium => "Premium phone",
            PriceTier::Unknown => "Unknown prediction result",
        }
    }

    pub fn image(&self) -> &'static str {
        match self {
            PriceTier::Budget => "budget.jpg",
            PriceTier::LowerMid => "lower-mid.jpg",
            PriceTier::UpperMid => "upper-mid.jpg",
            PriceTier::Premium => "premium.png",
            PriceTier::Unknown => "placeholder.svg",
        }
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, PriceTier::Unknown)
    }
}

/// Label and image for a raw class
pub fn format_prediction_result(class: i64) -> (&'static str, &'static str) {
    let tier = PriceTier::from_class(class);
    (tier.label(), tier.image())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_prediction_result() {
        assert_eq!(format_prediction_result(0), ("Budget mobile phone", "budget.jpg"));
        assert_eq!(format_prediction_result(3), ("Premium phone", "premium.png"));
        assert_eq!(
            format_prediction_result(99),
            ("Unknown prediction result", "placeholder.svg")
        );
        assert_eq!(format_prediction_result(-1).0, "Unknown prediction result");
    }

    #[test]
    fn test_class_round_trip() {
        for class in 0..=3 {
            assert_eq!(PriceTier::from_class(class).class(), Some(class));
        }
        assert_eq!(PriceTier::from_class(4).class(), None);
        assert!(!PriceTier::from_class(4).is_known());
    }
}
