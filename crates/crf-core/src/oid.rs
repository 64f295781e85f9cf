//! Identifier synthesis.
//!
//! Every OID in a generated document is a pure function of the identifier
//! kind, the ODM release and the key fields of one merged row. Rebuilding the
//! same form from the same metadata always yields the same identifiers.

use std::fmt;
use std::str::FromStr;

use crf_model::{CrfRow, OdmVersion, SectionRow};

use crate::error::{CoreError, Result};

pub const DOCUMENT_OID: &str = "ODM.CDASH.POC";
pub const STUDY_OID: &str = "ODM.CDASH.STUDY";
pub const METADATA_VERSION_OID: &str = "ODM.CDASH.STUDY.MDV";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentifierKind {
    Document,
    Study,
    MetaDataVersion,
    Form,
    Section,
    Concept,
    Item,
    Codelist,
    CodelistFromValueList,
    MeasurementUnit,
}

impl IdentifierKind {
    pub const ALL: [IdentifierKind; 10] = [
        IdentifierKind::Document,
        IdentifierKind::Study,
        IdentifierKind::MetaDataVersion,
        IdentifierKind::Form,
        IdentifierKind::Section,
        IdentifierKind::Concept,
        IdentifierKind::Item,
        IdentifierKind::Codelist,
        IdentifierKind::CodelistFromValueList,
        IdentifierKind::MeasurementUnit,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            IdentifierKind::Document => "Document",
            IdentifierKind::Study => "Study",
            IdentifierKind::MetaDataVersion => "MetaDataVersion",
            IdentifierKind::Form => "Form",
            IdentifierKind::Section => "Section",
            IdentifierKind::Concept => "Concept",
            IdentifierKind::Item => "Item",
            IdentifierKind::Codelist => "Codelist",
            IdentifierKind::CodelistFromValueList => "CodelistFromValueList",
            IdentifierKind::MeasurementUnit => "MeasurementUnit",
        }
    }
}

impl fmt::Display for IdentifierKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IdentifierKind {
    type Err = CoreError;

    /// Accepts the variant names in any case, with or without `_`/`-`
    /// separators, plus the short forms `ODM`, `MDV`, `CODELIST_VL` and `UNIT`.
    fn from_str(s: &str) -> Result<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|ch| *ch != '_' && *ch != '-')
            .collect::<String>()
            .to_ascii_lowercase();
        let kind = match key.as_str() {
            "document" | "odm" => IdentifierKind::Document,
            "study" => IdentifierKind::Study,
            "metadataversion" | "mdv" => IdentifierKind::MetaDataVersion,
            "form" => IdentifierKind::Form,
            "section" => IdentifierKind::Section,
            "concept" => IdentifierKind::Concept,
            "item" => IdentifierKind::Item,
            "codelist" => IdentifierKind::Codelist,
            "codelistfromvaluelist" | "codelistvl" => IdentifierKind::CodelistFromValueList,
            "measurementunit" | "unit" => IdentifierKind::MeasurementUnit,
            _ => return Err(CoreError::InvalidIdentifierKind(s.to_string())),
        };
        Ok(kind)
    }
}

/// Build the OID of `kind` for `row`.
///
/// `literal` is only read for [`IdentifierKind::MeasurementUnit`], where it
/// is required.
pub fn synthesize(
    version: OdmVersion,
    kind: IdentifierKind,
    row: &CrfRow,
    literal: Option<&str>,
) -> Result<String> {
    let s = &row.section.section_id;
    let so = row.section.section_order;
    let g = &row.item.group_id;
    let c = row.concept_order;
    let i = &row.item.collection_item;
    let v = &row.item.variable_name;
    let cl = &row.item.codelist;
    let oid = match (kind, version) {
        (IdentifierKind::Document, _) => DOCUMENT_OID.to_string(),
        (IdentifierKind::Study, _) => STUDY_OID.to_string(),
        (IdentifierKind::MetaDataVersion, _) => METADATA_VERSION_OID.to_string(),
        (IdentifierKind::Form, _) => form_oid(version, &row.section.form_id),
        (IdentifierKind::Section, _) => section_oid(version, &row.section),
        (IdentifierKind::Concept, OdmVersion::V1_3_2) => format!("IG.{s}_{so}_{g}_{c}"),
        (IdentifierKind::Concept, OdmVersion::V2_0) => format!("IG.{s}.{g}"),
        (IdentifierKind::Item, OdmVersion::V1_3_2) => format!("IT.{s}_{so}_{g}_{c}.{i}"),
        (IdentifierKind::Item, OdmVersion::V2_0) => format!("IT.{s}.{g}.{i}"),
        (IdentifierKind::Codelist, OdmVersion::V1_3_2) => format!("CL.{s}_{g}_{c}.{i}.{cl}"),
        (IdentifierKind::Codelist, OdmVersion::V2_0) => format!("CL.{s}.{g}.{v}.{cl}"),
        (IdentifierKind::CodelistFromValueList, OdmVersion::V1_3_2) => {
            format!("CL.{s}_{g}_{c}.{i}")
        }
        (IdentifierKind::CodelistFromValueList, OdmVersion::V2_0) => format!("CL.{s}.{g}.{v}"),
        (IdentifierKind::MeasurementUnit, _) => {
            let literal = literal.ok_or(CoreError::MissingLiteral { kind })?;
            unit_oid(literal)
        }
    };
    Ok(oid)
}

pub fn form_oid(version: OdmVersion, form_id: &str) -> String {
    match version {
        OdmVersion::V1_3_2 => format!("FORM.{form_id}"),
        OdmVersion::V2_0 => format!("IG.{form_id}"),
    }
}

pub fn section_oid(version: OdmVersion, section: &SectionRow) -> String {
    match version {
        OdmVersion::V1_3_2 => format!("IG.{}_{}", section.section_id, section.section_order),
        OdmVersion::V2_0 => format!("IG.{}.{}", section.form_id, section.section_id),
    }
}

/// `MU.` plus the unit literal with every character outside
/// `[A-Za-z0-9._-]` replaced by `_`.
pub fn unit_oid(literal: &str) -> String {
    let normalized: String = literal
        .trim()
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    format!("MU.{normalized}")
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
                repeating: false,
                annotation: String::new(),
                completion_instruction: String::new(),
            },
            concept_order: 2,
            item: ItemRow {
                group_id: "G1".to_string(),
                item_order: 1,
                collection_item: "VSPOS".to_string(),
                variable_name: "VSPOS".to_string(),
                codelist: "C71148".to_string(),
                ..ItemRow::default()
            },
            unit: None,
        }
    }

    #[test]
    fn templates_for_odm_132() {
        let row = row();
        let oid = |kind| synthesize(OdmVersion::V1_3_2, kind, &row, None).unwrap();
        assert_eq!(oid(IdentifierKind::Form), "FORM.VS");
        assert_eq!(oid(IdentifierKind::Section), "IG.S1_1");
        assert_eq!(oid(IdentifierKind::Concept), "IG.S1_1_G1_2");
        assert_eq!(oid(IdentifierKind::Item), "IT.S1_1_G1_2.VSPOS");
        assert_eq!(oid(IdentifierKind::Codelist), "CL.S1_G1_2.VSPOS.C71148");
        assert_eq!(oid(IdentifierKind::CodelistFromValueList), "CL.S1_G1_2.VSPOS");
    }

    #[test]
    fn templates_for_odm_20() {
        let row = row();
        let oid = |kind| synthesize(OdmVersion::V2_0, kind, &row, None).unwrap();
        assert_eq!(oid(IdentifierKind::Document), DOCUMENT_OID);
        assert_eq!(oid(IdentifierKind::Form), "IG.VS");
        assert_eq!(oid(IdentifierKind::Section), "IG.VS.S1");
        assert_eq!(oid(IdentifierKind::Concept), "IG.S1.G1");
        assert_eq!(oid(IdentifierKind::Item), "IT.S1.G1.VSPOS");
        assert_eq!(oid(IdentifierKind::Codelist), "CL.S1.G1.VSPOS.C71148");
    }

    #[test]
    fn unit_requires_literal() {
        let row = row();
        let err = synthesize(OdmVersion::V2_0, IdentifierKind::MeasurementUnit, &row, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingLiteral { .. }));
        let oid = synthesize(
            OdmVersion::V2_0,
            IdentifierKind::MeasurementUnit,
            &row,
            Some("beats/min"),
        )
        .unwrap();
        assert_eq!(oid, "MU.beats_min");
    }

    #[test]
    fn kind_names_parse() {
        for kind in IdentifierKind::ALL {
            assert_eq!(kind.as_str().parse::<IdentifierKind>().unwrap(), kind);
        }
        assert_eq!(
            "CODELIST_VL".parse::<IdentifierKind>().unwrap(),
            IdentifierKind::CodelistFromValueList
        );
        assert!(matches!(
            "Domain".parse::<IdentifierKind>(),
            Err(CoreError::InvalidIdentifierKind(_))
        ));
    }
}
