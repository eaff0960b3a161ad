//! CSV reader producing a `RawTable`.
//!
//! Expected header (column order is free, extra columns are ignored):
//!   Date,Sales,Product,Region,Customer ID
//!
//! Every cell stays text; validation belongs to the normalizer.

use anyhow::{Context, Result};
use salescope_core::RawTable;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Read a headed CSV table from any reader.
pub fn read_csv<R: Read>(reader: R) -> Result<RawTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let headers: Vec<String> = rdr
        .headers()
        .context("reading CSV header row")?
        .iter()
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();

    let mut rows: Vec<Vec<String>> = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        // +2: one for the header, one for 1-based line numbers
        let record = result.with_context(|| format!("reading CSV row {}", i + 2))?;
        rows.push(record.iter().map(str::to_string).collect());
    }

    debug!(columns = headers.len(), rows = rows.len(), "read CSV table");
    Ok(RawTable::new(headers, rows))
}

/// Read a headed CSV file.
pub fn read_csv_path(path: impl AsRef<Path>) -> Result<RawTable> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).with_context(|| format!("opening {}", path.display()))?;
    read_csv(file).with_context(|| format!("parsing {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use salescope_core::{AnalysisOptions, Error, analyze};

    #[test]
    fn test_reads_headers_and_cells_as_text() {
        let text = "Date,Sales,Product,Region,Customer ID\n\
                    2023-01-05,1200,Product A,North,1001\n\
                    2023-01-12, 800 ,\"Product B, large\",South,C-17\n";
        let table = read_csv(text.as_bytes()).unwrap();

        assert_eq!(table.headers, vec!["Date", "Sales", "Product", "Region", "Customer ID"]);
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[1][1], " 800 ");
        assert_eq!(table.rows[1][2], "Product B, large");
        assert_eq!(table.rows[1][4], "C-17");
    }

    #[test]
    fn test_ragged_rows_are_kept() {
        let text = "Date,Sales,Product,Region,Customer ID\n2023-01-05,1200\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.rows[0].len(), 2);

        let bundle = analyze(&table, &AnalysisOptions::default()).unwrap();
        assert_eq!(bundle.series().total(), 1200.0);
        assert!(bundle.products().is_empty());
    }

    #[test]
    fn test_byte_order_mark_is_stripped() {
        let text = "\u{feff}Date,Sales,Product,Region,Customer ID\n2023-01-05,1,A,N,1\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(table.headers[0], "Date");
    }

    #[test]
    fn test_missing_column_surfaces_from_core() {
        let text = "Date,Amount,Product,Region,Customer ID\n2023-01-05,1,A,N,1\n";
        let table = read_csv(text.as_bytes()).unwrap();
        assert_eq!(
            analyze(&table, &AnalysisOptions::default()),
            Err(Error::MissingColumn("Sales".to_string()))
        );
    }

    #[test]
    fn test_missing_file_has_path_context() {
        let err = read_csv_path("/definitely/not/here.csv").unwrap_err();
        assert!(format!("{err:#}").contains("/definitely/not/here.csv"));
    }
}
