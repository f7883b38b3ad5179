//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `csv_file`: csv crate for delimited dataset files
//! - `memory`: already parsed tables
//! - `sanitize`: measurement and identifier filtering for logs

pub mod csv_file;
pub mod memory;
pub mod sanitize;

pub use csv_file::CsvFileSource;
pub use memory::InMemorySource;
