//! Row source adapter: filter the forms sheet to one form, join it with the
//! collection specializations and return the ordered rows.

use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crf_model::{CrfRow, FormMetadata, GroupKey, SectionRow};
use tracing::{debug, info, warn};

use crate::error::{IngestError, Result};
use crate::records::{FormRecord, parse_form_records, parse_item_rows};
use crate::table::{Table, read_table};

/// Where the two metadata tables live.
#[derive(Debug, Clone)]
pub struct SourcePaths {
    pub forms_path: PathBuf,
    pub forms_sheet: String,
    pub collection_path: PathBuf,
    pub collection_sheet: String,
}

/// The two raw tables, loaded once per run.
#[derive(Debug, Clone)]
pub struct FormSources {
    pub forms: Table,
    pub collection: Table,
}

impl FormSources {
    pub fn new(forms: Table, collection: Table) -> Self {
        Self { forms, collection }
    }

    pub fn load(paths: &SourcePaths) -> Result<Self> {
        let forms = read_table(&paths.forms_path, &paths.forms_sheet)?;
        let collection = read_table(&paths.collection_path, &paths.collection_sheet)?;
        Ok(Self { forms, collection })
    }
}

/// Load everything needed to build one form.
///
/// Sections come back deduplicated and in section order. Rows are the inner
/// join of the form's records with the collection specializations on the
/// group id, sorted by section, concept and item order with the section and
/// group ids as tie-breakers. The sort is stable, so rows with equal keys
/// keep their join order. Only the requested form's records and the
/// specializations of its groups are type-checked.
pub fn load_form_metadata(sources: &FormSources, form_id: &str) -> Result<FormMetadata> {
    let records = parse_form_records(&sources.forms, form_id)?;
    let Some(first) = records.first() else {
        return Err(IngestError::FormNotFound {
            form_id: form_id.to_string(),
        });
    };
    let form_name = first.form_label.clone();
    let form_annotation = first.form_annotation.clone();

    let sections = dedup_sections(&records);

    let mut by_group: HashMap<&str, Vec<&FormRecord>> = HashMap::new();
    for record in &records {
        by_group
            .entry(record.group_id.as_str())
            .or_default()
            .push(record);
    }
    let items = parse_item_rows(&sources.collection, |group| by_group.contains_key(group))?;

    let mut rows = Vec::new();
    for item in &items {
        let Some(placements) = by_group.get(item.group_id.as_str()) else {
            continue;
        };
        for record in placements {
            rows.push(CrfRow {
                section: record.section.clone(),
                concept_order: record.concept_order,
                item: item.clone(),
                unit: None,
            });
        }
    }
    if rows.is_empty() {
        return Err(IngestError::NoMatchingRows {
            form_id: form_id.to_string(),
        });
    }
    rows.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
    join_units(&mut rows);

    let unmatched: BTreeSet<&str> = by_group
        .keys()
        .copied()
        .filter(|group| !items.iter().any(|item| item.group_id == *group))
        .collect();
    if !unmatched.is_empty() {
        warn!(
            form_id,
            groups = ?unmatched,
            "form groups without collection specializations"
        );
    }

    info!(
        form_id,
        form_name = %form_name,
        sections = sections.len(),
        rows = rows.len(),
        "form metadata loaded"
    );
    Ok(FormMetadata {
        form_id: form_id.to_string(),
        form_name,
        form_annotation,
        sections,
        rows,
    })
}

/// Unique section descriptors, first occurrence wins, in section order.
fn dedup_sections(records: &[FormRecord]) -> Vec<SectionRow> {
    let mut seen = BTreeSet::new();
    let mut sections: Vec<SectionRow> = records
        .iter()
        .filter(|record| {
            let (id, order, label) = record.section.dedup_key();
            seen.insert((id.to_string(), order, label.to_string()))
        })
        .map(|record| record.section.clone())
        .collect();
    sections.sort_by_key(|section| section.section_order);
    sections
}

/// Attach each unit row's literal to the result row it qualifies. The match
/// is on the concept's group key plus the result variable name with a `U`
/// appended.
fn join_units(rows: &mut [CrfRow]) {
    let mut units: HashMap<(GroupKey, String), String> = HashMap::new();
    for row in rows.iter() {
        if let Some(literal) = row.item.unit_literal() {
            units
                .entry((row.group_key(), row.item.variable_name.clone()))
                .or_insert_with(|| literal.to_string());
        }
    }
    if units.is_empty() {
        return;
    }
    for row in rows.iter_mut().filter(|row| !row.item.is_unit_row()) {
        let key = (row.group_key(), row.item.unit_variable_name());
        if let Some(unit) = units.get(&key) {
            debug!(
                variable = %row.item.variable_name,
                unit = %unit,
                "unit joined"
            );
            row.unit = Some(unit.clone());
        }
    }
}
