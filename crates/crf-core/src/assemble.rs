//! Document assembly: wraps a built hierarchy in the ODM file and study
//! envelope, shaped for the target release.

use std::collections::HashMap;

use chrono::{DateTime, SecondsFormat, Utc};
use crf_model::{
    FormDef, GlobalVariables, ItemGroupDef, ItemGroupType, ItemRef, LocalizedText,
    MetaDataVersion, Odm, OdmVersion, Study, YesNo,
};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::builder::BuiltForm;
use crate::oid::{DOCUMENT_OID, METADATA_VERSION_OID, STUDY_OID};

/// File and study level labels of a generated document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Envelope {
    pub originator: String,
    pub source_system: String,
    pub source_system_version: String,
    pub study_name: String,
    pub study_description: String,
    pub protocol_name: String,
    pub metadata_version_name: String,
    /// Defaults to a description naming the ODM release.
    pub metadata_version_description: Option<String>,
}

impl Default for Envelope {
    fn default() -> Self {
        Self {
            originator: "CDISC360i".to_string(),
            source_system: "crf-builder".to_string(),
            source_system_version: env!("CARGO_PKG_VERSION").to_string(),
            study_name: "CDISC360i CDASH POC Study".to_string(),
            study_description: "CDISC360i CDASH POC Study".to_string(),
            protocol_name: "CDISC360i CDASH POC Study protocol".to_string(),
            metadata_version_name: "CDISC360i CDASH POC Study Metadata Version".to_string(),
            metadata_version_description: None,
        }
    }
}

impl Envelope {
    pub fn metadata_version_description(&self, version: OdmVersion) -> String {
        self.metadata_version_description
            .clone()
            .unwrap_or_else(|| format!("CDISC360i CDASH ODM {version} metadata version"))
    }
}

/// ODM timestamp: UTC, second precision.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

/// Assemble the final document. No validation happens here.
pub fn assemble(
    built: BuiltForm,
    envelope: &Envelope,
    version: OdmVersion,
    created_at: DateTime<Utc>,
) -> Odm {
    let timestamp = format_timestamp(created_at);
    let description = envelope.metadata_version_description(version);
    let BuiltForm {
        form,
        sections,
        concepts,
        items,
        codelists,
        units,
        ..
    } = built;

    let (form_defs, item_group_defs) = match version {
        OdmVersion::V1_3_2 => {
            let form_def = FormDef {
                oid: form.oid,
                description: Some(LocalizedText::english(&form.name, version)),
                name: form.name,
                repeating: YesNo::No,
                item_group_refs: form.section_refs,
                aliases: form.aliases,
            };
            (vec![form_def], flatten_sections(sections, &concepts))
        }
        OdmVersion::V2_0 => {
            let form_group = ItemGroupDef {
                oid: form.oid,
                description: Some(LocalizedText::english(&form.name, version)),
                name: form.name,
                repeating: YesNo::No,
                group_type: Some(ItemGroupType::Form),
                codings: Vec::new(),
                item_group_refs: form.section_refs,
                item_refs: Vec::new(),
                aliases: form.aliases,
            };
            let mut groups = Vec::with_capacity(1 + sections.len() + concepts.len());
            groups.push(form_group);
            groups.extend(sections);
            groups.extend(concepts);
            (Vec::new(), groups)
        }
    };
    debug!(
        version = %version,
        item_groups = item_group_defs.len(),
        items = items.len(),
        codelists = codelists.len(),
        units = units.len(),
        "document assembled"
    );

    Odm {
        file_oid: DOCUMENT_OID.to_string(),
        granularity: "Metadata".to_string(),
        odm_version: version,
        file_type: "Snapshot".to_string(),
        creation_date_time: timestamp.clone(),
        as_of_date_time: (version == OdmVersion::V2_0).then_some(timestamp),
        originator: envelope.originator.clone(),
        source_system: envelope.source_system.clone(),
        source_system_version: envelope.source_system_version.clone(),
        study: Study {
            oid: STUDY_OID.to_string(),
            global_variables: GlobalVariables {
                study_name: envelope.study_name.clone(),
                study_description: envelope.study_description.clone(),
                protocol_name: envelope.protocol_name.clone(),
            },
            measurement_units: units,
            meta_data_version: MetaDataVersion {
                oid: METADATA_VERSION_OID.to_string(),
                name: envelope.metadata_version_name.clone(),
                description,
                form_defs,
                item_group_defs,
                item_defs: items,
                code_lists: codelists,
            },
        },
    }
}

/// ODM 1.3.2 item groups cannot nest, so each section lists the items of its
/// concepts directly, renumbered from 1 within the section.
fn flatten_sections(sections: Vec<ItemGroupDef>, concepts: &[ItemGroupDef]) -> Vec<ItemGroupDef> {
    let by_oid: HashMap<&str, &ItemGroupDef> = concepts
        .iter()
        .map(|concept| (concept.oid.as_str(), concept))
        .collect();
    sections
        .into_iter()
        .map(|mut section| {
            let refs = std::mem::take(&mut section.item_group_refs);
            section.item_refs = refs
                .iter()
                .filter_map(|group_ref| by_oid.get(group_ref.item_group_oid.as_str()))
                .flat_map(|concept| concept.item_refs.iter())
                .zip(1u32..)
                .map(|(item_ref, order_number)| ItemRef {
                    order_number,
                    ..item_ref.clone()
                })
                .collect();
            section.group_type = None;
            section
        })
        .collect()
}
