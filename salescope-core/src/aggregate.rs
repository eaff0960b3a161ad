//! Monthly aggregator: gap-free monthly totals and per-dimension rank tables.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::debug;

use crate::month::YearMonth;
use crate::normalize::{DatasetFingerprint, NormalizedDataset};
use crate::record::TransactionRecord;

pub const TOP_PRODUCTS: usize = 10;
pub const TOP_CUSTOMERS: usize = 10;

/// One month of the series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthlyTotal {
    pub month: YearMonth,
    pub total: f64,
}

/// Monthly totals from the earliest to the latest month, one entry per month, no gaps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlySeries {
    points: Vec<MonthlyTotal>,
    #[serde(skip)]
    source: Option<DatasetFingerprint>,
}

impl MonthlySeries {
    /// Build a series from consecutive months starting at `start`.
    pub fn from_values(start: YearMonth, values: &[f64]) -> Self {
        let mut month = start;
        let mut points = Vec::with_capacity(values.len());
        for &total in values {
            points.push(MonthlyTotal { month, total });
            month = month.succ();
        }
        Self {
            points,
            source: None,
        }
    }

    pub fn points(&self) -> &[MonthlyTotal] {
        &self.points
    }

    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.total).collect()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first_month(&self) -> Option<YearMonth> {
        self.points.first().map(|p| p.month)
    }

    pub fn last_month(&self) -> Option<YearMonth> {
        self.points.last().map(|p| p.month)
    }

    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.total).sum()
    }

    /// Fingerprint of the dataset this series was aggregated from, if any.
    pub fn source(&self) -> Option<DatasetFingerprint> {
        self.source
    }
}

/// Category dimension a rank table is built over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dimension {
    #[serde(rename = "product")]
    Product,
    #[serde(rename = "region")]
    Region,
    #[serde(rename = "customer")]
    Customer,
}

impl Dimension {
    pub fn label<'a>(&self, record: &'a TransactionRecord) -> &'a str {
        match self {
            Dimension::Product => &record.product,
            Dimension::Region => &record.region,
            Dimension::Customer => &record.customer_id,
        }
    }

    /// Number of groups kept in the table (`None` keeps all).
    pub fn default_limit(&self) -> Option<usize> {
        match self {
            Dimension::Product => Some(TOP_PRODUCTS),
            Dimension::Region => None,
            Dimension::Customer => Some(TOP_CUSTOMERS),
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Dimension::Product => "Product",
            Dimension::Region => "Region",
            Dimension::Customer => "Customer ID",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub label: String,
    pub total: f64,
}

/// Category totals, descending; ties keep first-appearance order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankTable {
    dimension: Dimension,
    entries: Vec<RankEntry>,
    #[serde(skip)]
    source: Option<DatasetFingerprint>,
}

impl RankTable {
    pub fn dimension(&self) -> Dimension {
        self.dimension
    }

    pub fn entries(&self) -> &[RankEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn source(&self) -> Option<DatasetFingerprint> {
        self.source
    }
}

/// Everything the aggregator derives from one dataset.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregates {
    pub series: MonthlySeries,
    pub products: RankTable,
    pub regions: RankTable,
    pub customers: RankTable,
}

/// Sum amounts per calendar month and reindex onto a contiguous monthly range.
///
/// Months without transactions appear with a zero total.
pub fn monthly_totals(dataset: &NormalizedDataset) -> MonthlySeries {
    let mut grouped: BTreeMap<YearMonth, f64> = BTreeMap::new();
    for record in dataset.records() {
        *grouped.entry(YearMonth::from_date(record.date)).or_insert(0.0) += record.amount;
    }

    let mut points = Vec::new();
    if let (Some((&first, _)), Some((&last, _))) = (grouped.first_key_value(), grouped.last_key_value()) {
        let mut month = first;
        loop {
            points.push(MonthlyTotal {
                month,
                total: grouped.get(&month).copied().unwrap_or(0.0),
            });
            if month == last {
                break;
            }
            month = month.succ();
        }
    }

    MonthlySeries {
        points,
        source: Some(dataset.fingerprint()),
    }
}

/// Sum amounts per label of `dimension`, sort descending and keep the first `limit` groups.
///
/// Records whose label is blank are not grouped.
pub fn rank(dataset: &NormalizedDataset, dimension: Dimension, limit: Option<usize>) -> RankTable {
    let mut order: HashMap<&str, usize> = HashMap::new();
    let mut entries: Vec<RankEntry> = Vec::new();

    for record in dataset.records() {
        let label = dimension.label(record);
        if label.trim().is_empty() {
            continue;
        }
        match order.get(label) {
            Some(&i) => entries[i].total += record.amount,
            None => {
                order.insert(label, entries.len());
                entries.push(RankEntry {
                    label: label.to_string(),
                    total: record.amount,
                });
            }
        }
    }

    // sort_by is stable, so equal totals stay in first-seen order
    entries.sort_by(|a, b| b.total.total_cmp(&a.total));
    if let Some(n) = limit {
        entries.truncate(n);
    }

    RankTable {
        dimension,
        entries,
        source: Some(dataset.fingerprint()),
    }
}

/// Run every aggregation over the dataset.
pub fn aggregate(dataset: &NormalizedDataset) -> Aggregates {
    let series = monthly_totals(dataset);
    let products = rank(dataset, Dimension::Product, Dimension::Product.default_limit());
    let regions = rank(dataset, Dimension::Region, Dimension::Region.default_limit());
    let customers = rank(dataset, Dimension::Customer, Dimension::Customer.default_limit());

    debug!(
        months = series.len(),
        products = products.len(),
        regions = regions.len(),
        customers = customers.len(),
        "aggregated dataset"
    );

    Aggregates {
        series,
        products,
        regions,
        customers,
    }
}
