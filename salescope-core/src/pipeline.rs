//! normalize -> aggregate -> forecast -> assemble, as one synchronous call.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::aggregate::aggregate;
use crate::error::Result;
use crate::forecast::forecast;
use crate::insight::{InsightBundle, assemble};
use crate::normalize::{NormalizeOptions, normalize};
use crate::record::{RawRow, RawTable};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisOptions {
    pub normalize: NormalizeOptions,
}

/// Analyze a loaded table.
///
/// Fails only on structural problems (missing column, no data rows). Everything else,
/// including a table where every row is invalid, yields a bundle.
pub fn analyze(table: &RawTable, options: &AnalysisOptions) -> Result<InsightBundle> {
    let rows = table.rows_by_column()?;
    analyze_rows(&rows, options)
}

/// Analyze rows whose columns are already resolved.
pub fn analyze_rows(rows: &[RawRow], options: &AnalysisOptions) -> Result<InsightBundle> {
    let dataset = normalize(rows, &options.normalize);
    let aggregates = aggregate(&dataset);
    let projection = forecast(&aggregates.series);

    info!(
        rows = dataset.stats().input_rows,
        kept = dataset.len(),
        months = aggregates.series.len(),
        forecast = projection.is_available(),
        "analysis complete"
    );

    assemble(dataset.stats(), aggregates, projection)
}
