//! salescope-ingest: load sales tables (CSV) into raw text rows for the core pipeline.

pub mod csv_table;
pub mod sample;

pub use csv_table::{read_csv, read_csv_path};
pub use sample::{SAMPLE_SALES_CSV, sample_table};
