use scrub_forecast::series;

/// Formats a timestamp for console output: `YYYY-MM-DD HH:MM:SS`.
///
/// # Arguments
/// * `ts` - Timestamp to format.
///
/// # Returns
/// * `String` - Formatted timestamp (e.g., "2024-03-05 00:00:00").
pub fn format_timestamp(ts: chrono::NaiveDateTime) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

/// Prints the first `count` normalized observations.
///
/// # Example Output
/// ```text
///  - ds: 2024-01-01 00:00:00, y: 5.00
///  - ds: 2024-01-02 00:00:00, y: 7.00
/// ```
pub fn print_observations(items: &series::ObservationSeries, count: usize) {
    for item in items.iter().take(count) {
        println!(" - ds: {}, y: {:.2}", format_timestamp(item.ds), item.y);
    }
}

/// Prints the first `count` future rows of a forecast, with interval, trend
/// and any seasonal components the model produced.
///
/// # Example Output
/// ```text
///  - ds: 2024-02-01 00:00:00, yhat: 12.31 [10.02, 14.60], trend: 11.90, weekly: 0.41
/// ```
pub fn print_forecast(forecast: &series::ForecastResult, count: usize) {
    for row in forecast.horizon().take(count) {
        let mut line = format!(
            " - ds: {}, yhat: {:.2} [{:.2}, {:.2}], trend: {:.2}",
            format_timestamp(row.ds),
            row.yhat,
            row.yhat_lower,
            row.yhat_upper,
            row.trend,
        );
        for (name, value) in [("yearly", row.yearly), ("weekly", row.weekly), ("daily", row.daily)] {
            if let Some(v) = value {
                line.push_str(&format!(", {}: {:.2}", name, v));
            }
        }
        println!("{}", line);
    }
}

/// Creates the spinner shown while the model is being fitted.
pub fn fitting_spinner() -> indicatif::ProgressBar {
    let spinner = indicatif::ProgressBar::new_spinner();
    spinner.set_style(
        indicatif::ProgressStyle::with_template("{spinner} {msg} [{elapsed}]")
            .unwrap_or_else(|_| indicatif::ProgressStyle::default_spinner()),
    );
    spinner.enable_steady_tick(std::time::Duration::from_millis(100));
    spinner
}
