#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use crf_core::{Envelope, assemble, build};
use crf_model::{CrfRow, FormMetadata, HiddenRowPolicy, ItemRow, Odm, OdmVersion, SectionRow};

fn section() -> SectionRow {
    SectionRow {
        form_id: "VS".to_string(),
        section_id: "S1".to_string(),
        section_order: 1,
        label: "Blood Pressure".to_string(),
        repeating: false,
        annotation: "VS".to_string(),
        completion_instruction: "Record after 5 minutes at rest".to_string(),
    }
}

fn item(order: u32, variable: &str) -> ItemRow {
    ItemRow {
        group_id: "BP".to_string(),
        short_name: "Blood Pressure".to_string(),
        item_order: order,
        collection_item: variable.to_string(),
        variable_name: variable.to_string(),
        data_type: "text".to_string(),
        sdtm_annotation: variable.to_string(),
        cdash_annotation: variable.to_string(),
        ..ItemRow::default()
    }
}

/// Position (codelist), systolic result with a unit, and the hidden unit row.
pub fn vital_signs() -> FormMetadata {
    let s1 = section();
    let mut position = item(1, "VSPOS");
    position.question_text = "What was the position?".to_string();
    position.prompt = "Position".to_string();
    position.codelist = "C71148".to_string();
    position.codelist_submission_value = "POSITION".to_string();
    position.value_list = "SITTING;STANDING".to_string();
    position.value_display_list = "Sitting;Standing".to_string();

    let mut result = item(2, "SYSBP_VSORRES");
    result.data_type = "integer".to_string();
    result.question_text = "Systolic blood pressure".to_string();
    result.prompt = "Systolic".to_string();
    result.sdtm_annotation = "VSORRES when VSTESTCD = SYSBP".to_string();

    let mut unit = item(3, "SYSBP_VSORRESU");
    unit.hidden = true;
    unit.prepopulated_term = "mmHg".to_string();
    unit.codelist = "C66770".to_string();
    unit.codelist_submission_value = "VSRESU".to_string();

    let rows = vec![
        CrfRow {
            section: s1.clone(),
            concept_order: 1,
            item: position,
            unit: None,
        },
        CrfRow {
            section: s1.clone(),
            concept_order: 1,
            item: result,
            unit: Some("mmHg".to_string()),
        },
        CrfRow {
            section: s1.clone(),
            concept_order: 1,
            item: unit,
            unit: None,
        },
    ];
    FormMetadata {
        form_id: "VS".to_string(),
        form_name: "Vital Signs".to_string(),
        form_annotation: "DOMAIN: VS".to_string(),
        sections: vec![s1],
        rows,
    }
}

pub fn odm(version: OdmVersion) -> Odm {
    let built = build(version, HiddenRowPolicy::default_for(version), &vital_signs()).unwrap();
    let created_at = Utc.with_ymd_and_hms(2025, 3, 14, 9, 26, 53).unwrap();
    assemble(built, &Envelope::default(), version, created_at)
}
