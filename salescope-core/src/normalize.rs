//! Record normalizer: exact-duplicate removal, then date and amount validation.
//!
//! Rows that fail to parse are dropped, never defaulted. The counts of what was dropped are
//! kept on the dataset so a host can report them.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::hash::{DefaultHasher, Hash, Hasher};
use tracing::debug;

use crate::record::{RawRow, TransactionRecord};

pub const DEFAULT_DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizeOptions {
    /// chrono format string for the `Date` column.
    pub date_format: String,
}

impl Default for NormalizeOptions {
    fn default() -> Self {
        Self {
            date_format: DEFAULT_DATE_FORMAT.to_string(),
        }
    }
}

/// Row accounting for one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NormalizationStats {
    pub input_rows: usize,
    pub duplicates: usize,
    pub invalid_dates: usize,
    pub invalid_amounts: usize,
    pub kept: usize,
}

/// Identity of the record set a result was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DatasetFingerprint(pub u64);

impl DatasetFingerprint {
    fn of(records: &[TransactionRecord]) -> Self {
        let mut hasher = DefaultHasher::new();
        records.len().hash(&mut hasher);
        for r in records {
            r.date.hash(&mut hasher);
            r.amount.to_bits().hash(&mut hasher);
            r.product.hash(&mut hasher);
            r.region.hash(&mut hasher);
            r.customer_id.hash(&mut hasher);
        }
        Self(hasher.finish())
    }
}

/// Clean, ordered records of one pipeline run. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedDataset {
    records: Vec<TransactionRecord>,
    stats: NormalizationStats,
    fingerprint: DatasetFingerprint,
}

impl NormalizedDataset {
    pub fn records(&self) -> &[TransactionRecord] {
        &self.records
    }

    pub fn stats(&self) -> NormalizationStats {
        self.stats
    }

    pub fn fingerprint(&self) -> DatasetFingerprint {
        self.fingerprint
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Render the records back into raw rows (ISO dates, shortest round-trip amounts).
    pub fn to_raw_rows(&self) -> Vec<RawRow> {
        self.records
            .iter()
            .map(|r| RawRow {
                date: r.date.format(DEFAULT_DATE_FORMAT).to_string(),
                amount: r.amount.to_string(),
                product: r.product.clone(),
                region: r.region.clone(),
                customer_id: r.customer_id.clone(),
            })
            .collect()
    }
}

/// Why a single row was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowRejection {
    InvalidDate,
    InvalidAmount,
}

pub fn parse_date(raw: &str, format: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), format).ok()
}

pub fn parse_amount(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Typed parse of one raw row.
pub fn parse_row(row: &RawRow, options: &NormalizeOptions) -> Result<TransactionRecord, RowRejection> {
    let date = parse_date(&row.date, &options.date_format).ok_or(RowRejection::InvalidDate)?;
    let amount = parse_amount(&row.amount).ok_or(RowRejection::InvalidAmount)?;

    Ok(TransactionRecord {
        date,
        amount,
        product: row.product.clone(),
        region: row.region.clone(),
        customer_id: row.customer_id.clone(),
    })
}

/// Normalize raw rows into a dataset.
///
/// Duplicates are judged on the raw text, first occurrence wins. An input where every row
/// is dropped yields an empty dataset.
pub fn normalize(rows: &[RawRow], options: &NormalizeOptions) -> NormalizedDataset {
    let mut stats = NormalizationStats {
        input_rows: rows.len(),
        ..Default::default()
    };

    let mut seen: HashSet<&RawRow> = HashSet::with_capacity(rows.len());
    let mut records = Vec::with_capacity(rows.len());

    for row in rows {
        if !seen.insert(row) {
            stats.duplicates += 1;
            continue;
        }

        match parse_row(row, options) {
            Ok(record) => records.push(record),
            Err(RowRejection::InvalidDate) => stats.invalid_dates += 1,
            Err(RowRejection::InvalidAmount) => stats.invalid_amounts += 1,
        }
    }

    stats.kept = records.len();
    debug!(
        input = stats.input_rows,
        duplicates = stats.duplicates,
        invalid_dates = stats.invalid_dates,
        invalid_amounts = stats.invalid_amounts,
        kept = stats.kept,
        "normalized sales rows"
    );

    let fingerprint = DatasetFingerprint::of(&records);
    NormalizedDataset {
        records,
        stats,
        fingerprint,
    }
}
