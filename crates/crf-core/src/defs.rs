//! Pure constructors for the form, section, concept and item definitions.

use crf_model::{
    Alias, CodeListRef, Coding, CrfRow, ItemDef, ItemGroupDef, ItemGroupRef, ItemGroupType,
    ItemRef, LocalizedText, MeasurementUnitRef, OdmVersion, SectionRow, YesNo,
};

use crate::codelist::{code_list_oid, map_data_type};
use crate::error::Result;
use crate::oid::{IdentifierKind, section_oid, synthesize, unit_oid};

pub const FORM_ANNOTATION: &str = "formAnnotation";
pub const SECTION_ANNOTATION: &str = "formSectionAnnotation";
pub const SECTION_COMPLETION_INSTRUCTION: &str = "formSectionCompletionInstruction";
pub const PROMPT_ALIAS: &str = "prompt";
pub const SDTM_ALIAS: &str = "SDTM";
pub const CDASH_ALIAS: &str = "CDASH";

const BC_SYSTEM_NAME: &str = "CDISC Biomedical Concept";
const DSS_SYSTEM_NAME: &str = "CDISC SDTM Dataset Specialization";

fn group_type(version: OdmVersion, kind: ItemGroupType) -> Option<ItemGroupType> {
    version.supports_nested_groups().then_some(kind)
}

pub fn section_def(version: OdmVersion, section: &SectionRow) -> ItemGroupDef {
    ItemGroupDef {
        oid: section_oid(version, section),
        name: section.label.clone(),
        repeating: section.repeating.into(),
        group_type: group_type(version, ItemGroupType::Section),
        description: Some(LocalizedText::english(&section.label, version)),
        codings: Vec::new(),
        item_group_refs: Vec::new(),
        item_refs: Vec::new(),
        aliases: Vec::new(),
    }
}

/// Annotation and completion instruction aliases of a section.
pub fn section_aliases(section: &SectionRow) -> Vec<Alias> {
    let mut aliases = Vec::new();
    if !section.annotation.is_empty() {
        aliases.push(Alias::new(SECTION_ANNOTATION, &section.annotation));
    }
    if !section.completion_instruction.is_empty() {
        aliases.push(Alias::new(
            SECTION_COMPLETION_INSTRUCTION,
            &section.completion_instruction,
        ));
    }
    aliases
}

/// Display name of a concept: the short name, or the group id when blank.
pub fn concept_name(row: &CrfRow) -> &str {
    if row.item.short_name.is_empty() {
        &row.item.group_id
    } else {
        &row.item.short_name
    }
}

pub fn concept_def(version: OdmVersion, row: &CrfRow) -> Result<ItemGroupDef> {
    let name = concept_name(row).to_string();
    let mut codings = Vec::new();
    if version == OdmVersion::V2_0 {
        let item = &row.item;
        if !item.bc_id.is_empty() {
            codings.push(Coding {
                code: item.bc_id.clone(),
                system: format!("/mdr/bc/biomedicalconcepts/{}", item.bc_id),
                system_name: Some(BC_SYSTEM_NAME.to_string()),
            });
        }
        if !item.vlm_group_id.is_empty() {
            codings.push(Coding {
                code: item.vlm_group_id.clone(),
                system: format!(
                    "/mdr/specializations/sdtm/datasetspecializations/{}",
                    item.vlm_group_id
                ),
                system_name: Some(DSS_SYSTEM_NAME.to_string()),
            });
        }
    }
    Ok(ItemGroupDef {
        oid: synthesize(version, IdentifierKind::Concept, row, None)?,
        description: Some(LocalizedText::english(&name, version)),
        name,
        repeating: row.section.repeating.into(),
        group_type: group_type(version, ItemGroupType::Concept),
        codings,
        item_group_refs: Vec::new(),
        item_refs: Vec::new(),
        aliases: Vec::new(),
    })
}

pub fn concept_ref(oid: &str, row: &CrfRow) -> ItemGroupRef {
    ItemGroupRef {
        item_group_oid: oid.to_string(),
        order_number: row.concept_order,
        mandatory: YesNo::Yes,
    }
}

pub fn item_ref(version: OdmVersion, row: &CrfRow) -> Result<ItemRef> {
    let term = row.item.prepopulated_term.trim();
    let pre_specified_value =
        (version == OdmVersion::V2_0 && !term.is_empty()).then(|| term.to_string());
    Ok(ItemRef {
        item_oid: synthesize(version, IdentifierKind::Item, row, None)?,
        order_number: row.item.item_order,
        mandatory: row.item.mandatory.into(),
        pre_specified_value,
    })
}

pub fn item_def(version: OdmVersion, row: &CrfRow) -> Result<ItemDef> {
    let item = &row.item;
    let text = |value: &str| {
        (!value.is_empty()).then(|| LocalizedText::english(value, version))
    };

    let mut aliases = Vec::new();
    if version == OdmVersion::V1_3_2 && !item.prompt.is_empty() {
        aliases.push(Alias::new(PROMPT_ALIAS, &item.prompt));
    }
    if !item.sdtm_annotation.is_empty() {
        aliases.push(Alias::new(SDTM_ALIAS, &item.sdtm_annotation));
    }
    if !item.cdash_annotation.is_empty() {
        aliases.push(Alias::new(CDASH_ALIAS, &item.cdash_annotation));
    }

    Ok(ItemDef {
        oid: synthesize(version, IdentifierKind::Item, row, None)?,
        name: item.collection_item.clone(),
        data_type: map_data_type(version, &item.data_type),
        length: item.length,
        description: text(&item.variable_name),
        question: text(&item.question_text),
        prompt: match version {
            OdmVersion::V1_3_2 => None,
            OdmVersion::V2_0 => text(&item.prompt),
        },
        code_list_ref: code_list_oid(version, row)?
            .map(|code_list_oid| CodeListRef { code_list_oid }),
        measurement_unit_ref: row.unit.as_deref().map(|unit| MeasurementUnitRef {
            measurement_unit_oid: unit_oid(unit),
        }),
        aliases,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crf_model::ItemRow;

    fn row() -> CrfRow {
        CrfRow {
            section: SectionRow {
                form_id: "VS".to_string(),
                section_id: "S1".to_string(),
                section_order: 1,
                label: "Vitals".to_string(),
                repeating: true,
                annotation: "VS".to_string(),
                completion_instruction: String::new(),
            },
            concept_order: 1,
            item: ItemRow {
                group_id: "G1".to_string(),
                bc_id: "C25208".to_string(),
                short_name: "Weight".to_string(),
                item_order: 2,
                collection_item: "VSORRES".to_string(),
                variable_name: "VSORRES".to_string(),
                data_type: "decimal".to_string(),
                length: Some(8),
                question_text: "What was the weight?".to_string(),
                prompt: "Weight".to_string(),
                mandatory: true,
                sdtm_annotation: "VSORRES".to_string(),
                cdash_annotation: "VSORRES_WEIGHT".to_string(),
                ..ItemRow::default()
            },
            unit: Some("kg".to_string()),
        }
    }

    #[test]
    fn item_def_for_132_keeps_prompt_as_alias() {
        let def = item_def(OdmVersion::V1_3_2, &row()).unwrap();
        assert_eq!(def.data_type, "float");
        assert!(def.prompt.is_none());
        assert_eq!(def.alias(PROMPT_ALIAS), Some("Weight"));
        assert_eq!(def.alias(SDTM_ALIAS), Some("VSORRES"));
        assert_eq!(def.alias(CDASH_ALIAS), Some("VSORRES_WEIGHT"));
        assert_eq!(
            def.measurement_unit_ref.unwrap().measurement_unit_oid,
            "MU.kg"
        );
        assert!(def.code_list_ref.is_none());
    }

    #[test]
    fn item_def_for_20_emits_prompt_element() {
        let def = item_def(OdmVersion::V2_0, &row()).unwrap();
        assert_eq!(def.data_type, "decimal");
        assert_eq!(def.prompt.as_ref().unwrap().text(), Some("Weight"));
        assert_eq!(def.alias(PROMPT_ALIAS), None);
    }

    #[test]
    fn concept_codings_only_for_20() {
        let v20 = concept_def(OdmVersion::V2_0, &row()).unwrap();
        assert_eq!(v20.group_type, Some(ItemGroupType::Concept));
        assert_eq!(v20.codings.len(), 1);
        assert_eq!(v20.repeating, YesNo::Yes);

        let v132 = concept_def(OdmVersion::V1_3_2, &row()).unwrap();
        assert_eq!(v132.group_type, None);
        assert!(v132.codings.is_empty());
    }

    #[test]
    fn section_aliases_skip_blank_fields() {
        let aliases = section_aliases(&row().section);
        assert_eq!(aliases, vec![Alias::new(SECTION_ANNOTATION, "VS")]);
    }
}
