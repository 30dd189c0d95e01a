mod cli;
mod utils;

use anyhow::Context;
use scrub_forecast::{csv_processor, engine, pipeline};

/// Main entry point of the application.
///
/// This function orchestrates the entire workflow:
/// 1. Parses command-line arguments.
/// 2. Reads the uploaded CSV file.
/// 3. Normalizes the rows and fits the forecasting model.
/// 4. Prints a preview of the input and of the forecast.
/// 5. Optionally writes the full forecast table to CSV.
///
/// # Returns
///
/// * `anyhow::Result<()>` - Success or an error if any step fails.
fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "scrub_forecast=warn".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let total_start = std::time::Instant::now();
    let args = cli::Args::parse();

    let model = engine::AdditiveModel::new(args.model.clone())
        .context("Invalid model settings")?;
    let engine = engine::ForecastEngine::new(model);

    let rows = csv_processor::read_records_from_path(&args.input)
        .with_context(|| format!("Failed to load {}", args.input.display()))?;

    let spinner = utils::fitting_spinner();
    spinner.set_message(format!("Forecasting {} day(s) from {} row(s)...", args.days, rows.len()));
    let result = pipeline::run(&rows, args.days, &engine);
    spinner.finish_and_clear();
    let output = result.context("Forecast failed")?;

    println!("✅ Data loaded successfully!");
    if output.report.dropped() > 0 {
        println!(
            "⚠️ Dropped {} of {} row(s): {} with a bad timestamp, {} with a bad value",
            output.report.dropped(),
            output.report.total_rows,
            output.report.dropped_timestamp,
            output.report.dropped_value,
        );
    }
    println!("📊 Preview of your data:");
    utils::print_observations(&output.report.series, args.preview);

    println!("📈 Forecast results:");
    utils::print_forecast(&output.forecast, args.preview);
    if !output.forecast.components.is_empty() {
        println!("📉 Components: trend, {}", output.forecast.components.join(", "));
    }

    if let Some(path) = &args.output {
        let file = std::fs::File::create(path)
            .with_context(|| format!("Failed to create {}", path.display()))?;
        csv_processor::write_forecast(std::io::BufWriter::new(file), &output.forecast)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("💾 Wrote {} row(s) to {}", output.forecast.len(), path.display());
    }

    println!(
        "🎯 Prediction complete in {:?} seconds",
        total_start.elapsed().as_secs_f64()
    );
    Ok(())
}
