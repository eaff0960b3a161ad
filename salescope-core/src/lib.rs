//! salescope-core: sales normalization, monthly aggregation and smoothing forecasts

pub mod aggregate;
pub mod error;
pub mod forecast;
pub mod insight;
pub mod month;
pub mod normalize;
pub mod pipeline;
pub mod record;

pub use aggregate::{
    Aggregates, Dimension, MonthlySeries, MonthlyTotal, RankEntry, RankTable, aggregate,
    monthly_totals, rank,
};
pub use error::{Error, Result};
pub use forecast::{
    FORECAST_HORIZON, Forecast, ForecastPoint, ModelSpec, SmoothingParams, UnavailableReason,
    forecast,
};
pub use insight::{InsightBundle, assemble};
pub use month::YearMonth;
pub use normalize::{
    DatasetFingerprint, NormalizationStats, NormalizeOptions, NormalizedDataset, normalize,
};
pub use pipeline::{AnalysisOptions, analyze, analyze_rows};
pub use record::{RawRow, RawTable, REQUIRED_COLUMNS, TransactionRecord};
