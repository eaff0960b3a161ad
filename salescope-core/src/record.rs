//! Input surface: raw text tables as loaded by a reader, and parsed transaction records.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

pub const COL_DATE: &str = "Date";
pub const COL_SALES: &str = "Sales";
pub const COL_PRODUCT: &str = "Product";
pub const COL_REGION: &str = "Region";
pub const COL_CUSTOMER: &str = "Customer ID";

/// Columns every sales table must carry, in the order `RawRow` stores them.
pub const REQUIRED_COLUMNS: [&str; 5] = [COL_DATE, COL_SALES, COL_PRODUCT, COL_REGION, COL_CUSTOMER];

/// A loaded table: header row plus text cells, untouched by any parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// One row with the five sales fields still as text.
///
/// Equality is exact text equality, which is what duplicate removal relies on.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RawRow {
    pub date: String,
    pub amount: String,
    pub product: String,
    pub region: String,
    pub customer_id: String,
}

impl RawRow {
    pub fn new(
        date: impl Into<String>,
        amount: impl Into<String>,
        product: impl Into<String>,
        region: impl Into<String>,
        customer_id: impl Into<String>,
    ) -> Self {
        Self {
            date: date.into(),
            amount: amount.into(),
            product: product.into(),
            region: region.into(),
            customer_id: customer_id.into(),
        }
    }
}

impl RawTable {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        Self { headers, rows }
    }

    fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h.trim() == name)
            .ok_or_else(|| Error::MissingColumn(name.to_string()))
    }

    /// Resolve the required columns by header name and project every row onto them.
    ///
    /// Cells missing from short rows read as the empty string.
    pub fn rows_by_column(&self) -> Result<Vec<RawRow>> {
        let mut idx = [0usize; 5];
        for (slot, name) in idx.iter_mut().zip(REQUIRED_COLUMNS) {
            *slot = self.column_index(name)?;
        }

        if self.rows.is_empty() {
            return Err(Error::EmptyInput);
        }

        let cell = |row: &[String], i: usize| row.get(i).cloned().unwrap_or_default();

        Ok(self
            .rows
            .iter()
            .map(|row| RawRow {
                date: cell(row, idx[0]),
                amount: cell(row, idx[1]),
                product: cell(row, idx[2]),
                region: cell(row, idx[3]),
                customer_id: cell(row, idx[4]),
            })
            .collect())
    }
}

/// A validated sales transaction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    pub date: NaiveDate,
    /// Signed sale amount; always finite.
    pub amount: f64,
    pub product: String,
    pub region: String,
    /// Kept as text: identifiers may be numeric or not.
    pub customer_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(v: &[&str]) -> Vec<String> {
        v.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_rows_by_column_reorders_fields() {
        let table = RawTable::new(
            strings(&["Customer ID", "Region", "Product", "Sales", "Date", "Note"]),
            vec![strings(&["1001", "North", "Product A", "1200", "2023-01-05", "x"])],
        );
        let rows = table.rows_by_column().unwrap();
        assert_eq!(rows, vec![RawRow::new("2023-01-05", "1200", "Product A", "North", "1001")]);
    }

    #[test]
    fn test_missing_column_is_reported() {
        let table = RawTable::new(
            strings(&["Date", "Sales", "Product", "Region"]),
            vec![strings(&["2023-01-05", "1200", "A", "North"])],
        );
        assert_eq!(
            table.rows_by_column(),
            Err(Error::MissingColumn("Customer ID".to_string()))
        );
    }

    #[test]
    fn test_empty_table_is_rejected() {
        let table = RawTable::new(strings(&REQUIRED_COLUMNS), Vec::new());
        assert_eq!(table.rows_by_column(), Err(Error::EmptyInput));
    }

    #[test]
    fn test_short_rows_read_blank_cells() {
        let table = RawTable::new(
            strings(&[" Date ", "Sales", "Product", "Region", "Customer ID"]),
            vec![strings(&["2023-01-05", "1200"])],
        );
        let rows = table.rows_by_column().unwrap();
        assert_eq!(rows[0].product, "");
        assert_eq!(rows[0].customer_id, "");
    }
}
