//! Typed conversion of the forms and collection specialization tables.

use crf_model::rows::{parse_flag, parse_number, parse_optional_number};
use crf_model::{ItemRow, ModelError, SectionRow};

use crate::error::{IngestError, Result};
use crate::table::Table;

pub const FORMS_REQUIRED_COLUMNS: &[&str] = &[
    "form_id",
    "form_label",
    "form_section_id",
    "form_section_order_number",
    "form_section_label",
    "collection_group_id",
    "bc_order_number",
];

pub const COLLECTION_REQUIRED_COLUMNS: &[&str] = &[
    "collection_group_id",
    "order_number",
    "collection_item",
    "variable_name",
    "data_type",
];

/// One row of the forms sheet: a group placed in a section of a form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRecord {
    pub section: SectionRow,
    pub form_label: String,
    pub form_annotation: String,
    pub group_id: String,
    pub concept_order: u32,
}

/// Column lookup for one record. Optional columns read as empty strings.
struct RecordView<'a> {
    table: &'a Table,
    record: &'a [String],
}

impl<'a> RecordView<'a> {
    fn get(&self, column: &str) -> &'a str {
        self.table
            .column_index(column)
            .and_then(|idx| self.record.get(idx))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn owned(&self, column: &str) -> String {
        self.get(column).to_string()
    }

    /// Identifier columns are compared and synthesized into OIDs, so
    /// surrounding whitespace is dropped. Text columns are kept verbatim.
    fn key(&self, column: &str) -> &'a str {
        self.get(column).trim()
    }

    fn owned_key(&self, column: &str) -> String {
        self.key(column).to_string()
    }
}

fn ensure_columns(table: &Table, required: &[&str]) -> Result<()> {
    let missing = table.missing_columns(required);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(IngestError::MissingColumns {
            table: table.name.clone(),
            columns: missing,
        })
    }
}

fn invalid(table: &Table, idx: usize) -> impl FnOnce(ModelError) -> IngestError + '_ {
    // Row numbers are 1-based and count the header line.
    move |source| IngestError::InvalidValue {
        table: table.name.clone(),
        row: idx + 2,
        source,
    }
}

/// Typed records of one form. Rows of other forms are never parsed, so a
/// malformed value elsewhere in the sheet does not affect this form.
pub fn parse_form_records(table: &Table, form_id: &str) -> Result<Vec<FormRecord>> {
    ensure_columns(table, FORMS_REQUIRED_COLUMNS)?;
    let mut records = Vec::new();
    for (idx, record) in table.rows.iter().enumerate() {
        let view = RecordView { table, record };
        if view.key("form_id") != form_id {
            continue;
        }
        let section_order = parse_number(
            "form_section_order_number",
            view.get("form_section_order_number"),
        )
        .map_err(invalid(table, idx))?;
        let repeating = parse_flag("form_section_repeating", view.get("form_section_repeating"))
            .map_err(invalid(table, idx))?;
        let concept_order = parse_number("bc_order_number", view.get("bc_order_number"))
            .map_err(invalid(table, idx))?;
        records.push(FormRecord {
            section: SectionRow {
                form_id: view.owned_key("form_id"),
                section_id: view.owned_key("form_section_id"),
                section_order,
                label: view.owned("form_section_label"),
                repeating,
                annotation: view.owned("form_section_annotation"),
                completion_instruction: view.owned("form_section_completion_instruction"),
            },
            form_label: view.owned("form_label"),
            form_annotation: view.owned("form_annotation"),
            group_id: view.owned_key("collection_group_id"),
            concept_order,
        });
    }
    Ok(records)
}

/// Typed collection specializations of the groups accepted by `include`.
/// Other groups are skipped without being parsed.
pub fn parse_item_rows(table: &Table, include: impl Fn(&str) -> bool) -> Result<Vec<ItemRow>> {
    ensure_columns(table, COLLECTION_REQUIRED_COLUMNS)?;
    let mut rows = Vec::new();
    for (idx, record) in table.rows.iter().enumerate() {
        let view = RecordView { table, record };
        if !include(view.key("collection_group_id")) {
            continue;
        }
        let item_order =
            parse_number("order_number", view.get("order_number")).map_err(invalid(table, idx))?;
        let length =
            parse_optional_number("length", view.get("length")).map_err(invalid(table, idx))?;
        let mandatory = parse_flag("mandatory_variable", view.get("mandatory_variable"))
            .map_err(invalid(table, idx))?;
        let hidden =
            parse_flag("display_hidden", view.get("display_hidden")).map_err(invalid(table, idx))?;
        rows.push(ItemRow {
            group_id: view.owned_key("collection_group_id"),
            bc_id: view.owned_key("bc_id"),
            vlm_group_id: view.owned_key("vlm_group_id"),
            short_name: view.owned_key("short_name"),
            item_order,
            collection_item: view.owned_key("collection_item"),
            variable_name: view.owned_key("variable_name"),
            data_type: view.owned_key("data_type"),
            length,
            question_text: view.owned("question_text"),
            prompt: view.owned("prompt"),
            mandatory,
            hidden,
            codelist: view.owned_key("codelist"),
            codelist_submission_value: view.owned_key("codelist_submission_value"),
            value_list: view.owned("value_list"),
            value_display_list: view.owned("value_display_list"),
            prepopulated_term: view.owned_key("prepopulated_term"),
            prepopulated_code: view.owned_key("prepopulated_code"),
            sdtm_annotation: view.owned("sdtm_annotation"),
            cdash_annotation: view.owned("cdash_annotation"),
        });
    }
    Ok(rows)
}
