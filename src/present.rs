use serde::Serialize;

/// Raw model output with the derived unit conversions.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Prediction {
    pub minutes: f64,
    pub hours: f64,
    pub days: f64,
}

/// The three numbers as shown to the user, two decimals each.
///
/// Formatting is Rust's `{:.2}`: correctly rounded from the exact binary
/// value, with exact decimal ties going to the even digit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayedPrediction {
    pub minutes: String,
    pub hours: String,
    pub days: String,
}

impl Prediction {
    pub fn from_minutes(minutes: f64) -> Self {
        let hours = minutes / 60.0;
        let days = hours / 24.0;
        Self { minutes, hours, days }
    }

    /// Negative totals are shown unchanged; callers may flag them.
    pub fn is_negative(&self) -> bool {
        self.minutes < 0.0
    }

    pub fn display(&self) -> DisplayedPrediction {
        DisplayedPrediction {
            minutes: format!("{:.2}", self.minutes),
            hours: format!("{:.2}", self.hours),
            days: format!("{:.2}", self.days),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_minutes_to_hours_and_days() {
        let p = Prediction::from_minutes(2880.0);
        assert_eq!(p.hours, 48.0);
        assert_eq!(p.days, 2.0);
        assert_eq!(
            p.display(),
            DisplayedPrediction {
                minutes: "2880.00".into(),
                hours: "48.00".into(),
                days: "2.00".into(),
            }
        );
    }

    #[test]
    fn display_matches_formatted_conversions() {
        for m in [0.0, 1.0, 59.99, 1234.5678, 98765.4321, 1e7 + 0.333] {
            let p = Prediction::from_minutes(m);
            let shown = p.display();
            assert_eq!(shown.minutes, format!("{:.2}", m));
            assert_eq!(shown.hours, format!("{:.2}", m / 60.0));
            assert_eq!(shown.days, format!("{:.2}", m / 60.0 / 24.0));
        }
    }

    #[test]
    fn rounds_to_two_decimals() {
        let p = Prediction::from_minutes(100.0);
        // 100 / 60 = 1.6666..., 100 / 1440 = 0.069444...
        assert_eq!(p.display().hours, "1.67");
        assert_eq!(p.display().days, "0.07");
    }

    #[test]
    fn negative_values_pass_through() {
        let p = Prediction::from_minutes(-120.0);
        assert!(p.is_negative());
        assert_eq!(p.display().minutes, "-120.00");
        assert_eq!(p.display().hours, "-2.00");
        assert_eq!(p.display().days, "-0.08");
        assert!(!Prediction::from_minutes(0.0).is_negative());
    }
}
