//! Built-in sample dataset: one year of sales across five products and four regions.

use anyhow::Result;
use salescope_core::RawTable;

use crate::csv_table::read_csv;

pub const SAMPLE_SALES_CSV: &str = "\
Date,Sales,Product,Region,Customer ID
2023-01-05,1200,Product A,North,1001
2023-01-12,800,Product B,South,1002
2023-01-18,950,Product C,East,1003
2023-02-02,1300,Product A,North,1004
2023-02-11,700,Product B,West,1001
2023-02-20,1650,Product D,South,1005
2023-03-03,2000,Product C,East,1002
2023-03-15,1550,Product E,North,1006
2023-03-26,900,Product A,West,1003
2023-04-05,2200,Product B,South,1005
2023-04-18,1100,Product D,East,1007
2023-04-27,1400,Product C,North,1004
2023-05-08,1750,Product E,West,1008
2023-05-17,1300,Product A,North,1002
2023-05-29,1600,Product B,South,1009
2023-06-05,2100,Product C,East,1003
2023-06-13,950,Product D,West,1010
2023-06-25,1250,Product E,North,1001
2023-07-02,1800,Product A,South,1011
2023-07-14,1400,Product B,East,1008
2023-07-28,1750,Product C,West,1004
2023-08-03,2300,Product D,North,1006
2023-08-17,900,Product A,South,1009
2023-08-26,1500,Product E,East,1012
2023-09-04,1950,Product B,North,1003
2023-09-16,1700,Product C,West,1001
2023-09-29,2100,Product D,South,1010
2023-10-07,1600,Product E,East,1002
2023-10-20,1300,Product A,North,1007
2023-10-30,2000,Product B,West,1011
2023-11-05,2200,Product C,South,1005
2023-11-18,1800,Product D,East,1004
2023-11-28,1400,Product E,North,1008
2023-12-02,2500,Product A,West,1012
2023-12-14,1950,Product B,East,1009
2023-12-27,1650,Product C,South,1010
";

/// The sample dataset as a loaded table.
pub fn sample_table() -> Result<RawTable> {
    read_csv(SAMPLE_SALES_CSV.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;
    use salescope_core::{AnalysisOptions, ModelSpec, analyze};

    #[test]
    fn test_sample_loads() {
        let table = sample_table().unwrap();
        assert_eq!(table.rows.len(), 36);
    }

    #[test]
    fn test_sample_analysis() {
        let bundle = analyze(&sample_table().unwrap(), &AnalysisOptions::default()).unwrap();

        assert_eq!(bundle.stats().kept, 36);
        assert_eq!(bundle.series().len(), 12);
        assert_eq!(bundle.series().points()[0].total, 2950.0);
        assert_eq!(bundle.series().total(), 56_500.0);

        // Product C: 950 + 2000 + 1400 + 2100 + 1750 + 1700 + 2200 + 1650
        let top = &bundle.products().entries()[0];
        assert_eq!(top.label, "Product C");
        assert_eq!(top.total, 13_750.0);
        assert_eq!(bundle.products().len(), 5);
        assert_eq!(bundle.regions().len(), 4);
        assert_eq!(bundle.customers().len(), 10);

        assert_eq!(bundle.forecast().model(), ModelSpec::Trend);
        assert_eq!(bundle.forecast().points().len(), 6);
    }
}
