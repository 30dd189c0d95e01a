use scrub_forecast::config;
use scrub_forecast::series;

/// Structure representing command-line arguments.
#[derive(Debug)]
pub struct Args {
    pub input: std::path::PathBuf,
    pub output: Option<std::path::PathBuf>,
    pub days: i64,
    pub preview: usize,
    pub model: config::ModelConfig,
}

/// Command-line arguments parser using Clap.
///
/// Supports the upload path, forecast horizon, optional CSV output and the
/// model settings, with validation.
impl Args {
    /// Parses command-line arguments using `clap`.
    ///
    /// # Returns
    /// * `Args` - Struct containing parsed arguments.
    ///
    /// # Errors
    /// * Exits with a usage message if required arguments are missing or invalid.
    pub fn parse() -> Self {
        Self::from_matches(&command().get_matches())
    }

    fn from_matches(matches: &clap::ArgMatches) -> Self {
        let toggle = |name: &str| {
            matches
                .get_one::<config::SeasonalityToggle>(name)
                .copied()
                .unwrap_or_default()
        };
        let defaults = config::ModelConfig::default();
        let model = config::ModelConfig::default()
            .with_interval_width(
                matches.get_one::<f64>("interval").copied().unwrap_or(defaults.interval_width),
            )
            .with_min_distinct_points(
                matches.get_one::<usize>("min-points").copied().unwrap_or(defaults.min_distinct_points),
            )
            .with_changepoints(
                matches.get_one::<usize>("changepoints").copied().unwrap_or(defaults.n_changepoints),
            )
            .with_yearly(toggle("yearly"))
            .with_weekly(toggle("weekly"))
            .with_daily(toggle("daily"));

        Args {
            input: matches
                .get_one::<std::path::PathBuf>("input")
                .cloned()
                .unwrap_or_default(),
            output: matches.get_one::<std::path::PathBuf>("output").cloned(),
            days: matches
                .get_one::<i64>("days")
                .copied()
                .unwrap_or(i64::from(series::Horizon::DEFAULT.days())),
            preview: matches.get_one::<usize>("preview").copied().unwrap_or(5),
            model,
        }
    }
}

fn command() -> clap::Command {
    clap::Command::new("scrub-forecast")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Forecast Ceph scrubbing counts from a CSV export")
        .arg(
            clap::Arg::new("input")
                .short('i')
                .long("input")
                .help("Path to CSV file with `timestamp` and `scrubbing` columns")
                .required(true)
                .num_args(1)
                .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("days")
            .short('d')
            .long("days")
            .help("Number of future days to predict (1-30)")
            .num_args(1)
            .default_value("7")
            .value_parser(clap::builder::ValueParser::new(parse_horizon)),
        )
        .arg(
            clap::Arg::new("output")
            .short('o')
            .long("output")
            .help("Write the full forecast table to this CSV file")
            .num_args(1)
            .value_parser(clap::value_parser!(std::path::PathBuf)),
        )
        .arg(
            clap::Arg::new("interval")
            .short('w')
            .long("interval-width")
            .help("Width of the uncertainty interval, between 0 and 1")
            .num_args(1)
            .default_value("0.8")
            .value_parser(clap::builder::ValueParser::new(parse_unit_interval)),
        )
        .arg(
            clap::Arg::new("min-points")
            .long("min-points")
            .help("Minimum number of distinct timestamps required to fit")
            .num_args(1)
            .default_value("2")
            .value_parser(clap::value_parser!(usize)),
        )
        .arg(
            clap::Arg::new("changepoints")
            .long("changepoints")
            .help("Number of potential trend changepoints")
            .num_args(1)
            .default_value("25")
            .value_parser(clap::value_parser!(usize)),
        )
        .arg(seasonality_arg("yearly"))
        .arg(seasonality_arg("weekly"))
        .arg(seasonality_arg("daily"))
        .arg(
            clap::Arg::new("preview")
            .short('p')
            .long("preview")
            .help("Number of rows to print from the input and the forecast")
            .num_args(1)
            .default_value("5")
            .value_parser(clap::value_parser!(usize)),
        )
}

fn seasonality_arg(name: &'static str) -> clap::Arg {
    clap::Arg::new(name)
        .long(name)
        .help("Fit this seasonal component: auto, on or off")
        .num_args(1)
        .default_value("auto")
        .value_parser(clap::builder::ValueParser::new(|s: &str| {
            s.parse::<config::SeasonalityToggle>()
        }))
}

/// Validates that the horizon is an integer in the accepted range.
///
/// # Arguments
/// * `s` - String representation of the number of days.
///
/// # Returns
/// * `Result<i64>` - Validated number of days.
fn parse_horizon(s: &str) -> Result<i64, String> {
    let days = s
        .parse::<i64>()
        .map_err(|e| format!("Not a valid number: {}", e))?;
    series::Horizon::new(days)
        .map(|h| i64::from(h.days()))
        .map_err(|e| e.to_string())
}

fn parse_unit_interval(s: &str) -> Result<f64, String> {
    match s.parse::<f64>() {
        Ok(w) if w > 0.0 && w < 1.0 => Ok(w),
        Ok(w) => Err(format!("Must be between 0 and 1, got {}", w)),
        Err(e) => Err(format!("Not a valid number: {}", e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<Args, clap::Error> {
        command()
            .try_get_matches_from(args)
            .map(|m| Args::from_matches(&m))
    }

    #[test]
    fn test_defaults() {
        let args = parse(&["scrub-forecast", "-i", "data.csv"]).unwrap();
        assert_eq!(args.days, 7);
        assert_eq!(args.preview, 5);
        assert!(args.output.is_none());
        assert_eq!(args.model, config::ModelConfig::default());
    }

    #[test]
    fn test_horizon_out_of_range_rejected() {
        assert!(parse(&["scrub-forecast", "-i", "data.csv", "-d", "0"]).is_err());
        assert!(parse(&["scrub-forecast", "-i", "data.csv", "-d", "31"]).is_err());
        assert!(parse(&["scrub-forecast", "-i", "data.csv", "-d", "30"]).is_ok());
    }

    #[test]
    fn test_model_settings() {
        let args = parse(&[
            "scrub-forecast", "-i", "data.csv", "-w", "0.95", "--weekly", "off", "--min-points", "5",
        ])
        .unwrap();
        assert_eq!(args.model.interval_width, 0.95);
        assert_eq!(args.model.weekly, config::SeasonalityToggle::Off);
        assert_eq!(args.model.min_distinct_points, 5);
    }

    #[test]
    fn test_bad_interval_rejected() {
        assert!(parse(&["scrub-forecast", "-i", "data.csv", "-w", "1.2"]).is_err());
    }
}
