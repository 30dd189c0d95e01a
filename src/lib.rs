//! Scrubbing-count forecasting pipeline.
//!
//! Turns an uploaded CSV table into a clean `(ds, y)` series, fits an
//! additive trend/seasonality model and returns a forecast covering the
//! history and a horizon of 1 to 30 days.
//!
//! ```no_run
//! use scrub_forecast::engine::{AdditiveModel, ForecastEngine};
//! use scrub_forecast::pipeline;
//!
//! let file = std::fs::File::open("scrubbing.csv")?;
//! let engine = ForecastEngine::new(AdditiveModel::default());
//! let output = pipeline::run_upload(file, 7, &engine)?;
//! for row in output.forecast.horizon() {
//!     println!("{} {:.1} [{:.1}, {:.1}]", row.ds, row.yhat, row.yhat_lower, row.yhat_upper);
//! }
//! # Ok::<(), scrub_forecast::error::ForecastError>(())
//! ```

pub mod config;
pub mod csv_processor;
pub mod engine;
pub mod error;
pub mod normalize;
pub mod pipeline;
pub mod series;

pub use error::{ErrorKind, ForecastError, Result};
