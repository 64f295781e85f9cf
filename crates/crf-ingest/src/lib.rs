//! Spreadsheet ingestion for CRF metadata.
//!
//! Loads the forms and collection specialization tables from workbooks or
//! CSV exports and merges them into the ordered rows of one form.

pub mod error;
pub mod records;
pub mod source;
pub mod table;

pub use error::{IngestError, Result};
pub use records::{FormRecord, parse_form_records, parse_item_rows};
pub use source::{FormSources, SourcePaths, load_form_metadata};
pub use table::{Table, TableFormat, read_table};
