use thiserror::Error;

use crate::oid::IdentifierKind;

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid identifier kind: {0:?}")]
    InvalidIdentifierKind(String),

    #[error("{kind} identifier requires a literal value")]
    MissingLiteral { kind: IdentifierKind },

    #[error(
        "codelist {oid}: value_display_list has {displays} entries but value_list has {values}"
    )]
    CodelistDisplayMismatch {
        oid: String,
        values: usize,
        displays: usize,
    },

    #[error(
        "group {group_id} is placed more than once in section {section_id}; \
         concept identifier {oid} would not be unique"
    )]
    DuplicateConcept {
        oid: String,
        section_id: String,
        group_id: String,
    },
}

pub type Result<T> = std::result::Result<T, CoreError>;
