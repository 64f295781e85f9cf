#![allow(dead_code)]

use crf_model::{CrfRow, FormMetadata, ItemRow, SectionRow};

pub fn section(id: &str, order: u32) -> SectionRow {
    SectionRow {
        form_id: "VS".to_string(),
        section_id: id.to_string(),
        section_order: order,
        label: format!("Section {id}"),
        repeating: false,
        annotation: format!("{id} annotation"),
        completion_instruction: String::new(),
    }
}

pub fn item(group: &str, order: u32, name: &str) -> ItemRow {
    ItemRow {
        group_id: group.to_string(),
        short_name: format!("{group} concept"),
        item_order: order,
        collection_item: name.to_string(),
        variable_name: name.to_string(),
        data_type: "text".to_string(),
        question_text: format!("{name}?"),
        sdtm_annotation: name.to_string(),
        ..ItemRow::default()
    }
}

pub fn row(section: &SectionRow, concept_order: u32, item: ItemRow) -> CrfRow {
    CrfRow {
        section: section.clone(),
        concept_order,
        item,
        unit: None,
    }
}

pub fn metadata(sections: Vec<SectionRow>, rows: Vec<CrfRow>) -> FormMetadata {
    FormMetadata {
        form_id: "VS".to_string(),
        form_name: "Vital Signs".to_string(),
        form_annotation: "DOMAIN: VS".to_string(),
        sections,
        rows,
    }
}

/// G1 (two rows) and G2 (one row) in section S1.
pub fn two_concepts() -> FormMetadata {
    let s1 = section("S1", 1);
    let rows = vec![
        row(&s1, 1, item("G1", 1, "VSTESTCD")),
        row(&s1, 1, item("G1", 2, "VSORRES")),
        row(&s1, 2, item("G2", 1, "VSPOS")),
    ];
    metadata(vec![s1], rows)
}

/// One concept whose result row carries a unit from a hidden unit row.
pub fn weight_with_unit(group: &str, concept_order: u32, section: &SectionRow) -> Vec<CrfRow> {
    let mut result = row(section, concept_order, item(group, 1, "VSORRES"));
    result.unit = Some("kg".to_string());
    let mut unit = item(group, 2, "VSORRESU");
    unit.hidden = true;
    unit.prepopulated_term = "kg".to_string();
    unit.codelist = "C66770".to_string();
    unit.codelist_submission_value = "VSRESU".to_string();
    vec![result, row(section, concept_order, unit)]
}
