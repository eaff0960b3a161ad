//! Insight assembler: one read-only bundle per analysis run.

use serde::Serialize;

use crate::aggregate::{Aggregates, MonthlySeries, RankTable};
use crate::error::{Error, Result};
use crate::forecast::Forecast;
use crate::normalize::{DatasetFingerprint, NormalizationStats};

/// Aggregates and forecast of a single run. Replaced wholesale on re-run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InsightBundle {
    stats: NormalizationStats,
    series: MonthlySeries,
    products: RankTable,
    regions: RankTable,
    customers: RankTable,
    forecast: Forecast,
}

impl InsightBundle {
    pub fn stats(&self) -> NormalizationStats {
        self.stats
    }

    pub fn series(&self) -> &MonthlySeries {
        &self.series
    }

    /// Top products by total sales
    pub fn products(&self) -> &RankTable {
        &self.products
    }

    /// Every region by total sales
    pub fn regions(&self) -> &RankTable {
        &self.regions
    }

    /// Top customers by total sales
    pub fn customers(&self) -> &RankTable {
        &self.customers
    }

    pub fn forecast(&self) -> &Forecast {
        &self.forecast
    }
}

fn check(
    expected: Option<DatasetFingerprint>,
    actual: Option<DatasetFingerprint>,
    component: &'static str,
) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(Error::MismatchedRun { component })
    }
}

/// Combine the pieces of one run; no further computation happens here.
///
/// Every piece must come from the same dataset as the monthly series.
pub fn assemble(
    stats: NormalizationStats,
    aggregates: Aggregates,
    forecast: Forecast,
) -> Result<InsightBundle> {
    let Aggregates {
        series,
        products,
        regions,
        customers,
    } = aggregates;

    let run = series.source();
    check(run, products.source(), "product ranking")?;
    check(run, regions.source(), "region ranking")?;
    check(run, customers.source(), "customer ranking")?;
    check(run, forecast.source(), "forecast")?;

    Ok(InsightBundle {
        stats,
        series,
        products,
        regions,
        customers,
        forecast,
    })
}
