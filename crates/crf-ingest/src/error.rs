use std::path::PathBuf;

use crf_model::ModelError;

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse CSV {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("failed to read workbook {path}: {message}")]
    Workbook { path: PathBuf, message: String },

    #[error("sheet {sheet:?} not found in {path}")]
    SheetNotFound { path: PathBuf, sheet: String },

    #[error("unsupported table format: {path}")]
    UnsupportedFormat { path: PathBuf },

    #[error("{table} is missing required columns: {}", columns.join(", "))]
    MissingColumns { table: String, columns: Vec<String> },

    #[error("{table} row {row}: {source}")]
    InvalidValue {
        table: String,
        row: usize,
        #[source]
        source: ModelError,
    },

    #[error("no rows found in the forms metadata for form {form_id:?}")]
    FormNotFound { form_id: String },

    #[error("no collection specializations match the groups of form {form_id:?}")]
    NoMatchingRows { form_id: String },
}

impl IngestError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
