//! Typed metadata rows.
//!
//! The ingest layer converts spreadsheet records into these structs once,
//! right after loading. Everything downstream works on typed fields instead
//! of column-name lookups.

use serde::{Deserialize, Serialize};

use crate::{ModelError, Result};

/// Suffix of variables carrying a unit for a sibling result variable.
pub const UNIT_SUFFIX: &str = "ORRESU";

/// One form section as described by the forms sheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SectionRow {
    pub form_id: String,
    pub section_id: String,
    pub section_order: u32,
    pub label: String,
    pub repeating: bool,
    pub annotation: String,
    pub completion_instruction: String,
}

impl SectionRow {
    /// Key used to deduplicate section descriptors.
    pub fn dedup_key(&self) -> (&str, u32, &str) {
        (&self.section_id, self.section_order, &self.label)
    }
}

/// One collection specialization (item-level) record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub group_id: String,
    pub bc_id: String,
    pub vlm_group_id: String,
    pub short_name: String,
    pub item_order: u32,
    pub collection_item: String,
    pub variable_name: String,
    pub data_type: String,
    pub length: Option<u32>,
    pub question_text: String,
    pub prompt: String,
    pub mandatory: bool,
    pub hidden: bool,
    pub codelist: String,
    pub codelist_submission_value: String,
    pub value_list: String,
    pub value_display_list: String,
    pub prepopulated_term: String,
    pub prepopulated_code: String,
    pub sdtm_annotation: String,
    pub cdash_annotation: String,
}

impl ItemRow {
    /// True when this row carries the unit of a sibling result variable.
    pub fn is_unit_row(&self) -> bool {
        self.variable_name.ends_with(UNIT_SUFFIX)
    }

    /// Variable name of the unit row that belongs to this result row.
    pub fn unit_variable_name(&self) -> String {
        format!("{}U", self.variable_name)
    }

    /// Unit literal declared by a unit row, if any.
    pub fn unit_literal(&self) -> Option<&str> {
        let term = self.prepopulated_term.trim();
        (self.is_unit_row() && !term.is_empty()).then_some(term)
    }

    /// True when the row produces a codelist: a named one or one built from
    /// its value list.
    pub fn declares_codelist(&self) -> bool {
        !self.codelist.is_empty() || !self.value_display_list.is_empty()
    }
}

/// A merged row: the item record joined with its form section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrfRow {
    pub section: SectionRow,
    /// Order of the concept (biomedical concept) within the section.
    pub concept_order: u32,
    pub item: ItemRow,
    /// Literal of the sibling unit row, joined by the ingest layer.
    pub unit: Option<String>,
}

impl CrfRow {
    pub fn group_key(&self) -> GroupKey {
        GroupKey {
            section_order: self.section.section_order,
            section_id: self.section.section_id.clone(),
            concept_order: self.concept_order,
            group_id: self.item.group_id.clone(),
        }
    }

    /// Sort key of the merged sequence. Section and group ids break ties so
    /// the rows of one concept stay consecutive.
    pub fn sort_key(&self) -> (u32, &str, u32, &str, u32) {
        (
            self.section.section_order,
            &self.section.section_id,
            self.concept_order,
            &self.item.group_id,
            self.item.item_order,
        )
    }

    pub fn is_hidden(&self) -> bool {
        self.item.hidden
    }
}

/// Everything the row source adapter returns for one form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormMetadata {
    pub form_id: String,
    pub form_name: String,
    pub form_annotation: String,
    /// Deduplicated section descriptors in section order.
    pub sections: Vec<SectionRow>,
    /// Merged item rows sorted by section, concept and item order.
    pub rows: Vec<CrfRow>,
}

/// Identity of a concept node. A change of key between consecutive rows
/// starts a new concept.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupKey {
    pub section_order: u32,
    pub section_id: String,
    pub concept_order: u32,
    pub group_id: String,
}

/// Parse a `Y`/`N` spreadsheet flag. Blank cells read as `N`.
pub fn parse_flag(field: &'static str, value: &str) -> Result<bool> {
    match value.trim().to_ascii_uppercase().as_str() {
        "Y" | "YES" => Ok(true),
        "N" | "NO" | "" => Ok(false),
        _ => Err(ModelError::InvalidFlag {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parse an order number or length. Spreadsheet readers may render integral
/// numbers as `3.0`, which is accepted.
pub fn parse_number(field: &'static str, value: &str) -> Result<u32> {
    let trimmed = value.trim();
    if let Ok(number) = trimmed.parse::<u32>() {
        return Ok(number);
    }
    match trimmed.parse::<f64>() {
        Ok(number) if number >= 0.0 && number.fract() == 0.0 && number <= f64::from(u32::MAX) => {
            Ok(number as u32)
        }
        _ => Err(ModelError::InvalidNumber {
            field,
            value: value.to_string(),
        }),
    }
}

/// Parse an optional number; blank cells yield `None`.
pub fn parse_optional_number(field: &'static str, value: &str) -> Result<Option<u32>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse_number(field, value).map(Some)
    }
}
