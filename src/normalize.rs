use crate::series;

/// Day-first date layouts, tried in order. Two-digit years come first: `%y`
/// rejects a four-digit year, while `%Y` would read "24" as year 24.
const DATE_FORMATS: [&str; 7] = [
    "%d/%m/%y",
    "%d/%m/%Y",
    "%d-%m-%y",
    "%d-%m-%Y",
    "%d.%m.%y",
    "%d.%m.%Y",
    "%Y-%m-%d",
];

const TIME_FORMATS: [&str; 2] = ["%H:%M:%S%.f", "%H:%M"];

/// Result of normalizing an upload, with the number of rows dropped per reason.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalizationReport {
    pub series: series::ObservationSeries,
    pub total_rows: usize,
    /// Rows whose timestamp was missing or unparseable.
    pub dropped_timestamp: usize,
    /// Rows with a valid timestamp but a missing or non-numeric value.
    pub dropped_value: usize,
}

impl NormalizationReport {
    pub fn dropped(&self) -> usize {
        self.dropped_timestamp + self.dropped_value
    }
}

/// Parses a day-first date/time string such as "05/03/2024" or
/// "05-03-2024 13:45:00".
///
/// A date without a time is midnight. ISO `YYYY-MM-DD` dates, optionally
/// followed by a space or `T` and a time, are accepted as well.
///
/// # Returns
/// * `Some(NaiveDateTime)` - Parsed instant, or `None` if no layout matches.
pub fn parse_day_first(raw: &str) -> Option<chrono::NaiveDateTime> {
    let s = raw.trim();
    if s.is_empty() {
        return None;
    }

    let (date_part, time_part) = match s.find([' ', 'T']) {
        Some(i) => (&s[..i], Some(s[i + 1..].trim())),
        None => (s, None),
    };

    let date = DATE_FORMATS
        .iter()
        .find_map(|fmt| chrono::NaiveDate::parse_from_str(date_part, fmt).ok())?;

    let time = match time_part {
        None => chrono::NaiveTime::MIN,
        Some(t) => TIME_FORMATS
            .iter()
            .find_map(|fmt| chrono::NaiveTime::parse_from_str(t, fmt).ok())?,
    };

    Some(date.and_time(time))
}

/// Parses a scrubbing count. Empty, non-numeric and non-finite values are
/// rejected.
pub fn parse_value(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Converts raw upload rows into an observation series.
///
/// Rows with a bad timestamp or a bad value are dropped, never filled in.
/// Output order follows input order.
pub fn normalize(rows: &[series::RawRecord]) -> series::ObservationSeries {
    normalize_with_report(rows).series
}

/// Same as [`normalize`], also counting the rows that were dropped.
pub fn normalize_with_report(rows: &[series::RawRecord]) -> NormalizationReport {
    let mut report = NormalizationReport {
        total_rows: rows.len(),
        ..Default::default()
    };

    for (line, row) in rows.iter().enumerate() {
        let Some(ds) = row.timestamp.as_deref().and_then(parse_day_first) else {
            tracing::debug!(row = line, timestamp = ?row.timestamp, "dropping row: bad timestamp");
            report.dropped_timestamp += 1;
            continue;
        };
        let Some(y) = row.scrubbing.as_deref().and_then(parse_value) else {
            tracing::debug!(row = line, scrubbing = ?row.scrubbing, "dropping row: bad value");
            report.dropped_value += 1;
            continue;
        };
        report.series.push(ds, y);
    }

    if report.dropped() > 0 {
        tracing::warn!(
            total = report.total_rows,
            bad_timestamp = report.dropped_timestamp,
            bad_value = report.dropped_value,
            "dropped rows during normalization"
        );
    }

    report
}
