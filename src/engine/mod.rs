//! Forecast engine: a pluggable trend/seasonality capability behind
//! `fit`, `extend` and `predict`.

pub mod additive;
mod linalg;

pub use additive::{AdditiveFit, AdditiveModel};

use crate::error::{ForecastError, Result};
use crate::series::{ExtendedTimeline, ForecastResult, ForecastRow, Horizon, ObservationSeries};

/// A forecasting model that can be fitted to a series and queried over a
/// timeline.
///
/// Implementations must be deterministic: the same series gives the same
/// fitted model and the same predictions.
pub trait ForecastCapability {
    /// Parameters produced by `fit`.
    type Model;

    /// Smallest number of distinct timestamps the capability can fit.
    fn min_distinct_points(&self) -> usize;

    fn fit(&self, series: &ObservationSeries) -> Result<Self::Model>;

    /// The fitted history followed by `horizon` daily steps.
    fn extend(&self, model: &Self::Model, horizon: Horizon) -> Result<ExtendedTimeline>;

    /// Point forecast, interval and components for every timeline entry.
    fn predict(&self, model: &Self::Model, timeline: &ExtendedTimeline) -> Result<ForecastResult>;
}

/// Builds a timeline from the sorted history plus `horizon` points at daily
/// increments after the last historical timestamp.
///
/// # Errors
/// * `MalformedInput` if a future day falls past the end of the calendar.
pub fn daily_timeline(history: Vec<chrono::NaiveDateTime>, horizon: Horizon) -> Result<ExtendedTimeline> {
    let future = match history.last() {
        Some(&last) => (1..=i64::from(horizon.days()))
            .map(|d| {
                last.checked_add_signed(chrono::TimeDelta::days(d)).ok_or_else(|| {
                    ForecastError::MalformedInput(format!(
                        "{} is too late to forecast {} day(s) ahead",
                        last,
                        horizon.days()
                    ))
                })
            })
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };
    Ok(ExtendedTimeline::new(history, future))
}

/// Wraps a capability and enforces its contract: the minimum-data check
/// before fitting and interval ordering after predicting.
#[derive(Debug, Clone)]
pub struct ForecastEngine<C> {
    capability: C,
}

impl<C: ForecastCapability> ForecastEngine<C> {
    pub fn new(capability: C) -> Self {
        Self { capability }
    }

    pub fn capability(&self) -> &C {
        &self.capability
    }

    /// # Errors
    /// * `InsufficientData` if the series has too few distinct timestamps.
    /// * Whatever the capability reports, usually `ModelFit`.
    pub fn fit(&self, series: &ObservationSeries) -> Result<C::Model> {
        let required = self.capability.min_distinct_points();
        let got = series.distinct_timestamps();
        if got < required {
            return Err(ForecastError::InsufficientData { required, got });
        }
        tracing::info!(points = series.len(), distinct = got, "fitting model");
        self.capability.fit(series)
    }

    pub fn extend(&self, model: &C::Model, horizon: Horizon) -> Result<ExtendedTimeline> {
        self.capability.extend(model, horizon)
    }

    /// # Errors
    /// * `ModelFit` for the first row with a non-finite value.
    /// * `IntervalViolation` for the first row where
    ///   `yhat_lower <= yhat <= yhat_upper` does not hold.
    pub fn predict(&self, model: &C::Model, timeline: &ExtendedTimeline) -> Result<ForecastResult> {
        let forecast = self.capability.predict(model, timeline)?;
        if let Some(row) = forecast.rows.iter().find(|r| !row_is_finite(r)) {
            tracing::error!(ds = %row.ds, "non-finite forecast");
            return Err(ForecastError::ModelFit(format!(
                "non-finite forecast at {} (yhat {}, interval [{}, {}])",
                row.ds, row.yhat, row.yhat_lower, row.yhat_upper
            )));
        }
        if let Some(row) = forecast
            .rows
            .iter()
            .find(|r| !(r.yhat_lower <= r.yhat && r.yhat <= r.yhat_upper))
        {
            tracing::error!(ds = %row.ds, "forecast interval out of order");
            return Err(ForecastError::IntervalViolation {
                ds: row.ds,
                lower: row.yhat_lower,
                yhat: row.yhat,
                upper: row.yhat_upper,
            });
        }
        Ok(forecast)
    }
}

fn row_is_finite(row: &ForecastRow) -> bool {
    [
        row.yhat,
        row.yhat_lower,
        row.yhat_upper,
        row.trend,
        row.trend_lower,
        row.trend_upper,
        row.additive_terms,
    ]
    .into_iter()
    .chain(row.daily)
    .chain(row.weekly)
    .chain(row.yearly)
    .all(f64::is_finite)
}

impl Default for ForecastEngine<AdditiveModel> {
    fn default() -> Self {
        Self::new(AdditiveModel::default())
    }
}
