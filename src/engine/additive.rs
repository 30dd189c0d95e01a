//! Additive trend/seasonality model.
//!
//! `y(t) = trend(t) + Σ seasonal(t) + ε`, where the trend is piecewise linear
//! with regularised rate changes at fixed changepoints and every seasonal
//! component is a truncated Fourier series. Parameters are the MAP estimate
//! under Gaussian priors, so fitting is a single penalised least-squares
//! solve with no sampling.

use chrono::NaiveDateTime;

use super::{ForecastCapability, daily_timeline, linalg};
use crate::config::{ModelConfig, SeasonalityToggle};
use crate::error::{ForecastError, Result};
use crate::series::{ExtendedTimeline, ForecastResult, ForecastRow, Horizon, ObservationSeries};

const SECONDS_PER_DAY: f64 = 86_400.0;

/// Noise level, in scaled units, used to weigh the priors against the data.
const NOMINAL_NOISE: f64 = 0.1;

/// Penalty on the offset and base rate, which are effectively unregularised.
const BASE_PENALTY: f64 = 1e-8;

/// Fitted Fourier component.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedSeasonality {
    pub name: &'static str,
    pub period_days: f64,
    pub order: usize,
    coefficients: Vec<f64>,
}

impl FittedSeasonality {
    fn value_at(&self, ds: NaiveDateTime) -> f64 {
        fourier_row(epoch_days(ds), self.period_days, self.order)
            .iter()
            .zip(&self.coefficients)
            .map(|(x, b)| x * b)
            .sum()
    }
}

/// Parameters of a fitted additive model.
#[derive(Debug, Clone, PartialEq)]
pub struct AdditiveFit {
    /// History timestamps in time order, duplicates kept.
    history: Vec<NaiveDateTime>,
    t0: NaiveDateTime,
    span_seconds: f64,
    y_scale: f64,
    /// Base growth rate.
    k: f64,
    /// Offset.
    m: f64,
    /// Changepoint locations in scaled time.
    changepoints: Vec<f64>,
    /// Rate adjustments at each changepoint.
    deltas: Vec<f64>,
    seasonalities: Vec<FittedSeasonality>,
    /// Residual standard deviation, scaled units.
    sigma_obs: f64,
    z: f64,
}

impl AdditiveFit {
    pub fn history(&self) -> &[NaiveDateTime] {
        &self.history
    }

    pub fn seasonalities(&self) -> &[FittedSeasonality] {
        &self.seasonalities
    }

    pub fn changepoints(&self) -> usize {
        self.changepoints.len()
    }

    /// Residual standard deviation in the units of `y`.
    pub fn sigma(&self) -> f64 {
        self.sigma_obs * self.y_scale
    }

    fn scaled_time(&self, ds: NaiveDateTime) -> f64 {
        seconds_between(self.t0, ds) / self.span_seconds
    }

    fn trend_at(&self, t: f64) -> f64 {
        let adjust: f64 = self
            .changepoints
            .iter()
            .zip(&self.deltas)
            .map(|(s, d)| d * (t - s).max(0.0))
            .sum();
        self.k * t + self.m + adjust
    }

    /// Standard deviation of the trend at scaled time `t`. Zero inside the
    /// history; beyond it, grows as future rate changes of the size seen in
    /// the history accumulate.
    fn trend_sd_at(&self, t: f64) -> f64 {
        let ahead = t - 1.0;
        if ahead <= 0.0 || self.deltas.is_empty() {
            return 0.0;
        }
        let mean_abs_delta =
            self.deltas.iter().map(|d| d.abs()).sum::<f64>() / self.deltas.len() as f64;
        let expected_changes = self.changepoints.len() as f64 * ahead;
        mean_abs_delta * ahead * expected_changes.sqrt()
    }
}

/// Additive trend/seasonality capability.
#[derive(Debug, Clone, Default)]
pub struct AdditiveModel {
    config: ModelConfig,
}

impl AdditiveModel {
    /// # Errors
    /// * `InvalidConfig` if any setting is out of range.
    pub fn new(config: ModelConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Seasonal components to fit for a history of the given span and
    /// smallest spacing, both in days.
    fn select_seasonalities(&self, span_days: f64, min_spacing_days: f64) -> Vec<(&'static str, f64, usize)> {
        let enabled = |toggle: SeasonalityToggle, auto: bool| match toggle {
            SeasonalityToggle::On => true,
            SeasonalityToggle::Off => false,
            SeasonalityToggle::Auto => auto,
        };

        let mut selected = Vec::new();
        if enabled(self.config.yearly, span_days >= 730.0) {
            selected.push(("yearly", 365.25, 10));
        }
        if enabled(self.config.weekly, span_days >= 14.0 && min_spacing_days < 7.0) {
            selected.push(("weekly", 7.0, 3));
        }
        if enabled(self.config.daily, span_days >= 2.0 && min_spacing_days < 1.0) {
            selected.push(("daily", 1.0, 4));
        }
        selected
    }
}

impl ForecastCapability for AdditiveModel {
    type Model = AdditiveFit;

    fn min_distinct_points(&self) -> usize {
        self.config.min_distinct_points
    }

    fn fit(&self, series: &ObservationSeries) -> Result<AdditiveFit> {
        let sorted = series.sorted_by_time();
        let obs = sorted.as_slice();

        let mut distinct: Vec<NaiveDateTime> = obs.iter().map(|o| o.ds).collect();
        distinct.dedup();
        let (Some(&t0), Some(&last)) = (distinct.first(), distinct.last()) else {
            return Err(ForecastError::InsufficientData { required: 2, got: 0 });
        };
        if distinct.len() < 2 {
            return Err(ForecastError::InsufficientData { required: 2, got: distinct.len() });
        }

        let span_seconds = seconds_between(t0, last);
        if span_seconds <= 0.0 {
            return Err(ForecastError::InsufficientData { required: 2, got: 1 });
        }
        let y_scale = obs.iter().map(|o| o.y.abs()).fold(0.0, f64::max);
        let y_scale = if y_scale > 0.0 { y_scale } else { 1.0 };

        let t: Vec<f64> = obs.iter().map(|o| seconds_between(t0, o.ds) / span_seconds).collect();
        let y: Vec<f64> = obs.iter().map(|o| o.y / y_scale).collect();

        let distinct_t: Vec<f64> = distinct.iter().map(|&ds| seconds_between(t0, ds) / span_seconds).collect();
        let changepoints = place_changepoints(&distinct_t, self.config.n_changepoints, self.config.changepoint_range);

        let min_spacing_days = distinct
            .windows(2)
            .map(|w| seconds_between(w[0], w[1]) / SECONDS_PER_DAY)
            .fold(f64::INFINITY, f64::min);
        let seasonal_specs = self.select_seasonalities(span_seconds / SECONDS_PER_DAY, min_spacing_days);

        // Columns: offset, rate, one hinge per changepoint, then Fourier terms.
        let x: Vec<Vec<f64>> = obs
            .iter()
            .zip(&t)
            .map(|(o, &ti)| {
                let mut row = Vec::with_capacity(2 + changepoints.len());
                row.push(1.0);
                row.push(ti);
                row.extend(changepoints.iter().map(|s| (ti - s).max(0.0)));
                for &(_, period, order) in &seasonal_specs {
                    row.extend(fourier_row(epoch_days(o.ds), period, order));
                }
                row
            })
            .collect();

        let cp_penalty = (NOMINAL_NOISE / self.config.changepoint_prior_scale).powi(2);
        let season_penalty = (NOMINAL_NOISE / self.config.seasonality_prior_scale).powi(2);
        let mut penalty = vec![BASE_PENALTY, BASE_PENALTY];
        penalty.extend(std::iter::repeat_n(cp_penalty, changepoints.len()));
        for &(_, _, order) in &seasonal_specs {
            penalty.extend(std::iter::repeat_n(season_penalty, 2 * order));
        }

        let beta = linalg::ridge_solve(&x, &y, &penalty)?;

        let fitted: Vec<f64> = x
            .iter()
            .map(|row| row.iter().zip(&beta).map(|(a, b)| a * b).sum::<f64>())
            .collect();
        let sse: f64 = y.iter().zip(&fitted).map(|(a, b)| (a - b).powi(2)).sum();
        let sigma_obs = (sse / y.len() as f64).sqrt();
        if !sigma_obs.is_finite() {
            return Err(ForecastError::ModelFit("non-finite residual variance".to_string()));
        }

        let n_cp = changepoints.len();
        let mut offset = 2 + n_cp;
        let seasonalities = seasonal_specs
            .iter()
            .map(|&(name, period_days, order)| {
                let coefficients = beta[offset..offset + 2 * order].to_vec();
                offset += 2 * order;
                FittedSeasonality { name, period_days, order, coefficients }
            })
            .collect::<Vec<_>>();

        tracing::info!(
            changepoints = n_cp,
            seasonalities = ?seasonalities.iter().map(|s| s.name).collect::<Vec<_>>(),
            sigma = sigma_obs * y_scale,
            "model fitted"
        );

        Ok(AdditiveFit {
            history: obs.iter().map(|o| o.ds).collect(),
            t0,
            span_seconds,
            y_scale,
            m: beta[0],
            k: beta[1],
            deltas: beta[2..2 + n_cp].to_vec(),
            changepoints,
            seasonalities,
            sigma_obs,
            z: z_score(self.config.interval_width),
        })
    }

    fn extend(&self, model: &AdditiveFit, horizon: Horizon) -> Result<ExtendedTimeline> {
        daily_timeline(model.history.clone(), horizon)
    }

    fn predict(&self, model: &AdditiveFit, timeline: &ExtendedTimeline) -> Result<ForecastResult> {
        let history_len = timeline.history().len();
        let scale = model.y_scale;

        let rows = timeline
            .timestamps()
            .iter()
            .enumerate()
            .map(|(i, &ds)| {
                let t = model.scaled_time(ds);
                let trend = model.trend_at(t);
                let trend_sd = model.trend_sd_at(t);
                let total_sd = (model.sigma_obs.powi(2) + trend_sd.powi(2)).sqrt();

                let component = |name: &str| {
                    model
                        .seasonalities
                        .iter()
                        .find(|s| s.name == name)
                        .map(|s| s.value_at(ds) * scale)
                };
                let additive: f64 = model.seasonalities.iter().map(|s| s.value_at(ds)).sum();
                let yhat = trend + additive;

                ForecastRow {
                    ds,
                    trend: trend * scale,
                    trend_lower: (trend - model.z * trend_sd) * scale,
                    trend_upper: (trend + model.z * trend_sd) * scale,
                    yhat_lower: (yhat - model.z * total_sd) * scale,
                    yhat_upper: (yhat + model.z * total_sd) * scale,
                    additive_terms: additive * scale,
                    daily: component("daily"),
                    weekly: component("weekly"),
                    yearly: component("yearly"),
                    yhat: yhat * scale,
                    is_forecast: i >= history_len,
                }
            })
            .collect();

        Ok(ForecastResult {
            rows,
            components: model.seasonalities.iter().map(|s| s.name.to_string()).collect(),
        })
    }
}

/// Signed seconds from `from` to `to`, keeping sub-millisecond precision
/// whenever the gap fits in nanoseconds.
fn seconds_between(from: NaiveDateTime, to: NaiveDateTime) -> f64 {
    let delta = to.signed_duration_since(from);
    match delta.num_nanoseconds() {
        Some(ns) => ns as f64 / 1e9,
        None => delta.num_milliseconds() as f64 / 1000.0,
    }
}

/// Days since the Unix epoch, so seasonal phase follows the calendar.
fn epoch_days(ds: NaiveDateTime) -> f64 {
    let utc = ds.and_utc();
    (utc.timestamp() as f64 + f64::from(utc.timestamp_subsec_nanos()) / 1e9) / SECONDS_PER_DAY
}

/// `[sin(2πnt/P), cos(2πnt/P)]` for `n` in `1..=order`.
fn fourier_row(t_days: f64, period_days: f64, order: usize) -> Vec<f64> {
    (1..=order)
        .flat_map(|n| {
            let x = 2.0 * std::f64::consts::PI * n as f64 * t_days / period_days;
            [x.sin(), x.cos()]
        })
        .collect()
}

/// Spreads up to `n_changepoints` over the first `range` share of the
/// distinct scaled timestamps. The first timestamp is never a changepoint.
fn place_changepoints(distinct_t: &[f64], n_changepoints: usize, range: f64) -> Vec<f64> {
    let hist_size = (distinct_t.len() as f64 * range).floor() as usize;
    let n = n_changepoints.min(hist_size.saturating_sub(1));
    if n == 0 {
        return Vec::new();
    }
    let step = (hist_size - 1) as f64 / n as f64;
    (1..=n)
        .map(|i| distinct_t[(i as f64 * step).round() as usize])
        .collect()
}

/// Two-sided normal quantile for the common interval widths.
fn z_score(interval_width: f64) -> f64 {
    match interval_width {
        w if w >= 0.99 => 2.576,
        w if w >= 0.95 => 1.96,
        w if w >= 0.90 => 1.645,
        w if w >= 0.80 => 1.282,
        w if w >= 0.68 => 0.994,
        _ => 0.674,
    }
}
