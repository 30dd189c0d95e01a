use crate::csv_processor;
use crate::engine::{ForecastCapability, ForecastEngine};
use crate::error::{ForecastError, Result};
use crate::normalize;
use crate::series::{ForecastResult, Horizon, ObservationSeries, RawRecord};

/// Validated input of one pipeline run.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastRequest {
    pub history: ObservationSeries,
    pub horizon: Horizon,
}

/// Everything a run produces: the forecast and how the upload was cleaned.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOutput {
    pub forecast: ForecastResult,
    pub report: normalize::NormalizationReport,
}

/// Runs normalize → fit → extend → predict over uploaded rows.
///
/// The horizon is validated before any work is done. Each stage consumes only
/// the previous stage's output; nothing is cached between runs.
///
/// # Errors
/// * `InvalidHorizon` if `horizon_days` is outside `[1, 30]`.
/// * `MalformedInput` if no row survives normalization.
/// * `InsufficientData`, `ModelFit` or `IntervalViolation` from the engine.
pub fn run<C: ForecastCapability>(
    rows: &[RawRecord],
    horizon_days: i64,
    engine: &ForecastEngine<C>,
) -> Result<PipelineOutput> {
    let horizon = Horizon::new(horizon_days)?;
    let report = normalize::normalize_with_report(rows);
    if report.series.is_empty() {
        return Err(ForecastError::MalformedInput(format!(
            "no valid rows out of {} (bad timestamp: {}, bad value: {})",
            report.total_rows, report.dropped_timestamp, report.dropped_value
        )));
    }
    tracing::info!(
        kept = report.series.len(),
        dropped = report.dropped(),
        horizon = horizon.days(),
        "normalized upload"
    );

    let request = ForecastRequest {
        history: report.series.clone(),
        horizon,
    };
    let forecast = fit_and_predict(&request, engine)?;
    Ok(PipelineOutput { forecast, report })
}

/// Fits the engine on a validated request and predicts history plus horizon.
pub fn fit_and_predict<C: ForecastCapability>(
    request: &ForecastRequest,
    engine: &ForecastEngine<C>,
) -> Result<ForecastResult> {
    let model = engine.fit(&request.history)?;
    let timeline = engine.extend(&model, request.horizon)?;
    tracing::info!(points = timeline.len(), future = timeline.future().len(), "extended timeline");
    engine.predict(&model, &timeline)
}

/// Reads a CSV upload and runs the pipeline on it.
///
/// # Errors
/// * `MalformedInput` if required columns are missing.
/// * Anything [`run`] reports.
pub fn run_upload<R: std::io::Read, C: ForecastCapability>(
    upload: R,
    horizon_days: i64,
    engine: &ForecastEngine<C>,
) -> Result<PipelineOutput> {
    Horizon::new(horizon_days)?;
    let rows = csv_processor::read_records(upload)?;
    run(&rows, horizon_days, engine)
}
