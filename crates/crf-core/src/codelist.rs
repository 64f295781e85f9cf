//! Codelist and measurement unit constructors.

use crf_model::{
    CodeList, CodeListItem, Coding, CrfRow, EnumeratedItem, LocalizedText, MeasurementUnit,
    OdmVersion,
};

use crate::error::{CoreError, Result};
use crate::oid::{IdentifierKind, synthesize, unit_oid};

pub const TERMINOLOGY_SYSTEM: &str = "https://www.cdisc.org/standards/terminology";
pub const TERMINOLOGY_SYSTEM_NAME: &str = "CDISC/NCI CT";

/// ODM 1.3.2 has no `decimal` data type; it is written as `float`.
pub fn map_data_type(version: OdmVersion, data_type: &str) -> String {
    match (version, data_type) {
        (OdmVersion::V1_3_2, "decimal") => "float".to_string(),
        _ => data_type.to_string(),
    }
}

/// Split a `;`-delimited list. No escaping is supported.
pub fn split_list(value: &str) -> Vec<&str> {
    value.split(';').map(str::trim).collect()
}

fn terminology_coding(code: &str) -> Coding {
    Coding {
        code: code.to_string(),
        system: TERMINOLOGY_SYSTEM.to_string(),
        system_name: Some(TERMINOLOGY_SYSTEM_NAME.to_string()),
    }
}

/// OID of the codelist a row refers to: a named codelist wins over a value
/// list. `None` when the row declares neither.
pub fn code_list_oid(version: OdmVersion, row: &CrfRow) -> Result<Option<String>> {
    if !row.item.declares_codelist() {
        return Ok(None);
    }
    let kind = if row.item.codelist.is_empty() {
        IdentifierKind::CodelistFromValueList
    } else {
        IdentifierKind::Codelist
    };
    synthesize(version, kind, row, None).map(Some)
}

/// Build the codelist declared by `row`, if any.
///
/// Multi-value lists pair `value_list` with `value_display_list` by
/// position; a value repeated in the list takes the decode of its first
/// occurrence. Without a value list the prepopulated term, when present,
/// becomes the single enumerated entry.
pub fn build_code_list(version: OdmVersion, row: &CrfRow) -> Result<Option<CodeList>> {
    let Some(oid) = code_list_oid(version, row)? else {
        return Ok(None);
    };
    let item = &row.item;
    let name = if !item.codelist.is_empty() {
        item.codelist_submission_value.clone()
    } else {
        let owner = if item.vlm_group_id.is_empty() {
            &item.group_id
        } else {
            &item.vlm_group_id
        };
        format!("{owner}-{}", item.variable_name)
    };

    let mut code_list = CodeList {
        oid,
        name,
        data_type: map_data_type(version, &item.data_type),
        items: Vec::new(),
        enumerated_items: Vec::new(),
        codings: Vec::new(),
    };

    if !item.value_list.is_empty() {
        let values = split_list(&item.value_list);
        let displays = split_list(&item.value_display_list);
        if displays.len() < values.len() {
            return Err(CoreError::CodelistDisplayMismatch {
                oid: code_list.oid,
                values: values.len(),
                displays: displays.len(),
            });
        }
        code_list.items = values
            .iter()
            .map(|value| {
                let first = values.iter().position(|v| v == value).unwrap_or_default();
                CodeListItem {
                    coded_value: (*value).to_string(),
                    decode: Some(LocalizedText::english(displays[first], version)),
                    codings: Vec::new(),
                }
            })
            .collect();
    } else {
        let term = item.prepopulated_term.trim();
        if !term.is_empty() {
            match version {
                OdmVersion::V1_3_2 => code_list.enumerated_items.push(EnumeratedItem {
                    coded_value: term.to_string(),
                }),
                OdmVersion::V2_0 => {
                    let code = item.prepopulated_code.trim();
                    code_list.items.push(CodeListItem {
                        coded_value: term.to_string(),
                        decode: None,
                        codings: if code.is_empty() {
                            Vec::new()
                        } else {
                            vec![terminology_coding(code)]
                        },
                    });
                }
            }
        }
    }

    if version == OdmVersion::V2_0 && !item.codelist.is_empty() {
        code_list.codings.push(terminology_coding(&item.codelist));
    }
    Ok(Some(code_list))
}

pub fn build_measurement_unit(version: OdmVersion, literal: &str) -> MeasurementUnit {
    MeasurementUnit {
        oid: unit_oid(literal),
        name: literal.to_string(),
        symbol: LocalizedText::english(literal, version),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crf_model::{ItemRow, SectionRow};

    fn row(item: ItemRow) -> CrfRow {
        CrfRow {
            section: SectionRow {
                form_id: "VS".to_string(),
                section_id: "S1".to_string(),
                section_order: 1,
                label: "Vitals".to_string(),
                repeating: false,
                annotation: String::new(),
                completion_instruction: String::new(),
            },
            concept_order: 1,
            item,
            unit: None,
        }
    }

    #[test]
    fn value_list_pairs_with_display_list() {
        let row = row(ItemRow {
            group_id: "G1".to_string(),
            collection_item: "VSPOS".to_string(),
            variable_name: "VSPOS".to_string(),
            data_type: "text".to_string(),
            codelist: "C71148".to_string(),
            codelist_submission_value: "POSITION".to_string(),
            value_list: "SITTING;STANDING".to_string(),
            value_display_list: "Sitting;Standing".to_string(),
            ..ItemRow::default()
        });
        let list = build_code_list(OdmVersion::V1_3_2, &row).unwrap().unwrap();
        assert_eq!(list.oid, "CL.S1_G1_1.VSPOS.C71148");
        assert_eq!(list.name, "POSITION");
        assert_eq!(
            list.options(),
            vec![("Sitting", "SITTING"), ("Standing", "STANDING")]
        );
        assert!(list.codings.is_empty());
    }

    #[test]
    fn repeated_value_takes_first_decode() {
        let row = row(ItemRow {
            group_id: "G1".to_string(),
            variable_name: "XX".to_string(),
            value_list: "A;B;A".to_string(),
            value_display_list: "Alpha;Beta;Other".to_string(),
            ..ItemRow::default()
        });
        let list = build_code_list(OdmVersion::V2_0, &row).unwrap().unwrap();
        assert_eq!(list.name, "G1-XX");
        assert_eq!(
            list.options(),
            vec![("Alpha", "A"), ("Beta", "B"), ("Alpha", "A")]
        );
    }

    #[test]
    fn short_display_list_is_rejected() {
        let row = row(ItemRow {
            variable_name: "XX".to_string(),
            value_list: "A;B".to_string(),
            value_display_list: "Alpha".to_string(),
            ..ItemRow::default()
        });
        let err = build_code_list(OdmVersion::V1_3_2, &row).unwrap_err();
        assert!(matches!(
            err,
            CoreError::CodelistDisplayMismatch {
                values: 2,
                displays: 1,
                ..
            }
        ));
    }

    #[test]
    fn prepopulated_term_is_enumerated_per_version() {
        let row = row(ItemRow {
            group_id: "G1".to_string(),
            collection_item: "VSTESTCD".to_string(),
            variable_name: "VSTESTCD".to_string(),
            data_type: "text".to_string(),
            codelist: "C66741".to_string(),
            prepopulated_term: "WEIGHT".to_string(),
            prepopulated_code: "C25208".to_string(),
            ..ItemRow::default()
        });
        let v132 = build_code_list(OdmVersion::V1_3_2, &row).unwrap().unwrap();
        assert_eq!(v132.enumerated_items.len(), 1);
        assert!(v132.items.is_empty());

        let v20 = build_code_list(OdmVersion::V2_0, &row).unwrap().unwrap();
        assert!(v20.enumerated_items.is_empty());
        assert_eq!(v20.items[0].coded_value, "WEIGHT");
        assert_eq!(v20.items[0].codings[0].code, "C25208");
        assert_eq!(v20.codings[0].code, "C66741");
    }

    #[test]
    fn decimal_maps_to_float_only_for_132() {
        assert_eq!(map_data_type(OdmVersion::V1_3_2, "decimal"), "float");
        assert_eq!(map_data_type(OdmVersion::V2_0, "decimal"), "decimal");
        assert_eq!(map_data_type(OdmVersion::V1_3_2, "text"), "text");
    }

    #[test]
    fn rows_without_codelist_build_nothing() {
        let row = row(ItemRow::default());
        assert!(build_code_list(OdmVersion::V2_0, &row).unwrap().is_none());
    }
}
