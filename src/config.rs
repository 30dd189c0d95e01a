use crate::error::{ForecastError, Result};

/// Whether a seasonal component is fitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SeasonalityToggle {
    /// Decided from the span and spacing of the history.
    #[default]
    Auto,
    On,
    Off,
}

impl std::str::FromStr for SeasonalityToggle {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(SeasonalityToggle::Auto),
            "on" | "true" => Ok(SeasonalityToggle::On),
            "off" | "false" => Ok(SeasonalityToggle::Off),
            other => Err(format!("expected auto, on or off, got '{}'", other)),
        }
    }
}

/// Settings for the additive trend/seasonality model.
///
/// `Default` matches the usual Prophet defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelConfig {
    /// Fewer distinct timestamps than this fails the fit with `InsufficientData`.
    pub min_distinct_points: usize,
    pub n_changepoints: usize,
    /// Share of the history in which changepoints may be placed.
    pub changepoint_range: f64,
    pub changepoint_prior_scale: f64,
    pub seasonality_prior_scale: f64,
    /// Coverage of the uncertainty interval, e.g. 0.80.
    pub interval_width: f64,
    pub yearly: SeasonalityToggle,
    pub weekly: SeasonalityToggle,
    pub daily: SeasonalityToggle,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            min_distinct_points: 2,
            n_changepoints: 25,
            changepoint_range: 0.8,
            changepoint_prior_scale: 0.05,
            seasonality_prior_scale: 10.0,
            interval_width: 0.80,
            yearly: SeasonalityToggle::Auto,
            weekly: SeasonalityToggle::Auto,
            daily: SeasonalityToggle::Auto,
        }
    }
}

impl ModelConfig {
    pub fn with_min_distinct_points(mut self, n: usize) -> Self {
        self.min_distinct_points = n;
        self
    }

    pub fn with_changepoints(mut self, n: usize) -> Self {
        self.n_changepoints = n;
        self
    }

    pub fn with_changepoint_range(mut self, range: f64) -> Self {
        self.changepoint_range = range;
        self
    }

    pub fn with_changepoint_prior_scale(mut self, scale: f64) -> Self {
        self.changepoint_prior_scale = scale;
        self
    }

    pub fn with_seasonality_prior_scale(mut self, scale: f64) -> Self {
        self.seasonality_prior_scale = scale;
        self
    }

    pub fn with_interval_width(mut self, width: f64) -> Self {
        self.interval_width = width;
        self
    }

    pub fn with_yearly(mut self, toggle: SeasonalityToggle) -> Self {
        self.yearly = toggle;
        self
    }

    pub fn with_weekly(mut self, toggle: SeasonalityToggle) -> Self {
        self.weekly = toggle;
        self
    }

    pub fn with_daily(mut self, toggle: SeasonalityToggle) -> Self {
        self.daily = toggle;
        self
    }

    /// Checks that every setting is in range.
    ///
    /// # Errors
    /// * `InvalidConfig` naming the first offending setting.
    pub fn validate(&self) -> Result<()> {
        let invalid = |name: &str, value: f64| {
            Err(ForecastError::InvalidConfig(format!("{} out of range: {}", name, value)))
        };
        if self.min_distinct_points < 2 {
            return invalid("min_distinct_points", self.min_distinct_points as f64);
        }
        if !(self.changepoint_range > 0.0 && self.changepoint_range <= 1.0) {
            return invalid("changepoint_range", self.changepoint_range);
        }
        if !(self.changepoint_prior_scale > 0.0 && self.changepoint_prior_scale.is_finite()) {
            return invalid("changepoint_prior_scale", self.changepoint_prior_scale);
        }
        if !(self.seasonality_prior_scale > 0.0 && self.seasonality_prior_scale.is_finite()) {
            return invalid("seasonality_prior_scale", self.seasonality_prior_scale);
        }
        if !(self.interval_width > 0.0 && self.interval_width < 1.0) {
            return invalid("interval_width", self.interval_width);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        assert!(ModelConfig::default().validate().is_ok());
    }

    #[test]
    fn test_rejects_bad_interval_width() {
        let err = ModelConfig::default().with_interval_width(1.5).validate().unwrap_err();
        assert!(err.to_string().contains("interval_width"));
    }

    #[test]
    fn test_rejects_min_points_below_two() {
        assert!(ModelConfig::default().with_min_distinct_points(1).validate().is_err());
    }

    #[test]
    fn test_toggle_from_str() {
        assert_eq!("AUTO".parse::<SeasonalityToggle>(), Ok(SeasonalityToggle::Auto));
        assert_eq!("on".parse::<SeasonalityToggle>(), Ok(SeasonalityToggle::On));
        assert_eq!("off".parse::<SeasonalityToggle>(), Ok(SeasonalityToggle::Off));
        assert!("sometimes".parse::<SeasonalityToggle>().is_err());
    }
}
