//! CRF metadata model.
//!
//! Typed spreadsheet rows on the input side, the CDISC ODM document model on
//! the output side.

pub mod error;
pub mod odm;
pub mod rows;
pub mod validation;
pub mod version;

pub use error::{ModelError, Result};
pub use odm::{
    Alias, CodeList, CodeListItem, CodeListRef, Coding, EnumeratedItem, FormDef, GlobalVariables,
    ItemDef, ItemGroupDef, ItemGroupRef, ItemGroupType, ItemRef, LocalizedText, MeasurementUnit,
    MeasurementUnitRef, MetaDataVersion, Odm, Study, TranslatedText, YesNo,
};
pub use rows::{CrfRow, FormMetadata, GroupKey, ItemRow, SectionRow, UNIT_SUFFIX};
pub use validation::{IssueSeverity, ValidationIssue, ValidationReport};
pub use version::{HiddenRowPolicy, OdmVersion};
