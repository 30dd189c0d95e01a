use chrono::NaiveDateTime;

/// One row of an uploaded table, restricted to the two columns the pipeline
/// reads. A cell missing from the row is `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawRecord {
    pub timestamp: Option<String>,
    pub scrubbing: Option<String>,
}

impl RawRecord {
    pub fn new(timestamp: &str, scrubbing: &str) -> Self {
        Self {
            timestamp: Some(timestamp.to_string()),
            scrubbing: Some(scrubbing.to_string()),
        }
    }
}

/// A validated `(ds, y)` pair.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Observation {
    pub ds: NaiveDateTime,
    pub y: f64,
}

/// Time series produced by the normalizer.
///
/// Every `ds` is a real instant and every `y` is finite. Order follows the
/// upload; duplicates are kept.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ObservationSeries {
    observations: Vec<Observation>,
}

impl ObservationSeries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an observation, refusing non-finite values.
    pub fn push(&mut self, ds: NaiveDateTime, y: f64) -> bool {
        if !y.is_finite() {
            return false;
        }
        self.observations.push(Observation { ds, y });
        true
    }

    pub fn len(&self) -> usize {
        self.observations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.observations.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Observation> {
        self.observations.iter()
    }

    pub fn as_slice(&self) -> &[Observation] {
        &self.observations
    }

    /// Number of distinct timestamps in the series.
    pub fn distinct_timestamps(&self) -> usize {
        let mut stamps: Vec<NaiveDateTime> = self.observations.iter().map(|o| o.ds).collect();
        stamps.sort_unstable();
        stamps.dedup();
        stamps.len()
    }

    /// Copy of the series ordered by `ds`. Ties keep their upload order.
    pub fn sorted_by_time(&self) -> Self {
        let mut observations = self.observations.clone();
        observations.sort_by_key(|o| o.ds);
        Self { observations }
    }
}

impl FromIterator<Observation> for ObservationSeries {
    fn from_iter<I: IntoIterator<Item = Observation>>(iter: I) -> Self {
        let mut series = Self::new();
        for obs in iter {
            series.push(obs.ds, obs.y);
        }
        series
    }
}

impl<'a> IntoIterator for &'a ObservationSeries {
    type Item = &'a Observation;
    type IntoIter = std::slice::Iter<'a, Observation>;

    fn into_iter(self) -> Self::IntoIter {
        self.observations.iter()
    }
}

/// Number of days to forecast past the last observation, always in
/// `[Horizon::MIN, Horizon::MAX]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Horizon(u32);

impl Horizon {
    pub const MIN: u32 = 1;
    pub const MAX: u32 = 30;
    pub const DEFAULT: Horizon = Horizon(7);

    /// Validates a requested horizon. Out-of-range values are rejected, not
    /// clamped.
    pub fn new(days: i64) -> crate::error::Result<Self> {
        if days < i64::from(Self::MIN) || days > i64::from(Self::MAX) {
            return Err(crate::error::ForecastError::InvalidHorizon(days));
        }
        Ok(Horizon(days as u32))
    }

    pub fn days(self) -> u32 {
        self.0
    }
}

impl Default for Horizon {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Historical timestamps followed by the forecast horizon.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtendedTimeline {
    timestamps: Vec<NaiveDateTime>,
    history_len: usize,
}

impl ExtendedTimeline {
    pub fn new(history: Vec<NaiveDateTime>, future: Vec<NaiveDateTime>) -> Self {
        let history_len = history.len();
        let mut timestamps = history;
        timestamps.extend(future);
        Self { timestamps, history_len }
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    pub fn timestamps(&self) -> &[NaiveDateTime] {
        &self.timestamps
    }

    pub fn history(&self) -> &[NaiveDateTime] {
        &self.timestamps[..self.history_len]
    }

    pub fn future(&self) -> &[NaiveDateTime] {
        &self.timestamps[self.history_len..]
    }
}

/// One forecast row. Seasonal columns are `None` when the fitted model has
/// no such component.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct ForecastRow {
    pub ds: NaiveDateTime,
    pub trend: f64,
    pub trend_lower: f64,
    pub trend_upper: f64,
    pub yhat_lower: f64,
    pub yhat_upper: f64,
    pub additive_terms: f64,
    pub daily: Option<f64>,
    pub weekly: Option<f64>,
    pub yearly: Option<f64>,
    pub yhat: f64,
    pub is_forecast: bool,
}

/// Forecast over history and horizon, in timeline order.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastResult {
    pub rows: Vec<ForecastRow>,
    /// Names of the seasonal components present in `rows`.
    pub components: Vec<String>,
}

impl ForecastResult {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn history(&self) -> impl Iterator<Item = &ForecastRow> {
        self.rows.iter().filter(|r| !r.is_forecast)
    }

    pub fn horizon(&self) -> impl Iterator<Item = &ForecastRow> {
        self.rows.iter().filter(|r| r.is_forecast)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn at(day: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 1, day)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_push_rejects_non_finite() {
        let mut series = ObservationSeries::new();
        assert!(series.push(at(1), 3.0));
        assert!(!series.push(at(2), f64::NAN));
        assert!(!series.push(at(3), f64::INFINITY));
        assert_eq!(series.len(), 1);
    }

    #[test]
    fn test_distinct_timestamps_ignores_duplicates() {
        let series: ObservationSeries = [(1, 1.0), (1, 2.0), (2, 3.0)]
            .into_iter()
            .map(|(d, y)| Observation { ds: at(d), y })
            .collect();
        assert_eq!(series.len(), 3);
        assert_eq!(series.distinct_timestamps(), 2);
    }

    #[test]
    fn test_sorted_by_time_is_stable() {
        let series: ObservationSeries = [(3, 1.0), (1, 2.0), (3, 0.5)]
            .into_iter()
            .map(|(d, y)| Observation { ds: at(d), y })
            .collect();
        let sorted = series.sorted_by_time();
        let ys: Vec<f64> = sorted.iter().map(|o| o.y).collect();
        assert_eq!(ys, vec![2.0, 1.0, 0.5]);
    }

    #[test]
    fn test_horizon_bounds() {
        assert_eq!(Horizon::new(1).unwrap().days(), 1);
        assert_eq!(Horizon::new(30).unwrap().days(), 30);
        assert!(matches!(
            Horizon::new(0),
            Err(crate::error::ForecastError::InvalidHorizon(0))
        ));
        assert!(matches!(
            Horizon::new(31),
            Err(crate::error::ForecastError::InvalidHorizon(31))
        ));
        assert_eq!(Horizon::default().days(), 7);
    }

    #[test]
    fn test_timeline_split() {
        let timeline = ExtendedTimeline::new(vec![at(1), at(2)], vec![at(3)]);
        assert_eq!(timeline.len(), 3);
        assert_eq!(timeline.history(), &[at(1), at(2)]);
        assert_eq!(timeline.future(), &[at(3)]);
    }
}
