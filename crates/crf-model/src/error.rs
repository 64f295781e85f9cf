use thiserror::Error;

#[derive(Debug, Error)]
pub enum ModelError {
    #[error("unknown ODM version: {0}")]
    UnknownOdmVersion(String),
    #[error("invalid Y/N flag for {field}: {value:?}")]
    InvalidFlag { field: &'static str, value: String },
    #[error("invalid number for {field}: {value:?}")]
    InvalidNumber { field: &'static str, value: String },
    #[error("unknown hidden row policy: {0}")]
    UnknownHiddenRowPolicy(String),
}

pub type Result<T> = std::result::Result<T, ModelError>;
