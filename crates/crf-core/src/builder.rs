//! Hierarchy builder.
//!
//! One pass over the merged rows. Consecutive rows with the same
//! [`GroupKey`] form one concept; a key change closes the concept in flight
//! and opens the next one. The last concept is closed after the loop.

use std::collections::{HashMap, HashSet};

use crf_model::{
    Alias, CodeList, CrfRow, FormMetadata, GroupKey, HiddenRowPolicy, ItemDef, ItemGroupDef,
    ItemGroupRef, MeasurementUnit, OdmVersion, YesNo,
};
use tracing::{debug, info};

use crate::codelist::{build_code_list, build_measurement_unit};
use crate::defs::{
    FORM_ANNOTATION, concept_def, concept_ref, item_def, item_ref, section_aliases, section_def,
};
use crate::error::{CoreError, Result};
use crate::oid::{form_oid, section_oid};

/// Root of the form hierarchy before it is given a version-specific shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormNode {
    pub oid: String,
    pub form_id: String,
    pub name: String,
    pub aliases: Vec<Alias>,
    /// Section references, ordered by section order.
    pub section_refs: Vec<ItemGroupRef>,
}

/// Output of the hierarchy builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltForm {
    pub version: OdmVersion,
    pub form: FormNode,
    /// Section groups in first-seen order, each referencing its concepts.
    pub sections: Vec<ItemGroupDef>,
    /// Concept groups in emission order, each referencing its items.
    pub concepts: Vec<ItemGroupDef>,
    pub items: Vec<ItemDef>,
    /// One per qualifying row; not deduplicated.
    pub codelists: Vec<CodeList>,
    /// Unique by literal, first-seen order.
    pub units: Vec<MeasurementUnit>,
}

impl BuiltForm {
    pub fn concept(&self, oid: &str) -> Option<&ItemGroupDef> {
        self.concepts.iter().find(|concept| concept.oid == oid)
    }

    pub fn section(&self, oid: &str) -> Option<&ItemGroupDef> {
        self.sections.iter().find(|section| section.oid == oid)
    }
}

/// Concept currently receiving items.
struct OpenConcept {
    key: GroupKey,
    section_index: usize,
    def: ItemGroupDef,
}

/// Explicit state threaded through the fold.
struct Accumulator {
    version: OdmVersion,
    policy: HiddenRowPolicy,
    sections: Vec<ItemGroupDef>,
    section_index: HashMap<String, usize>,
    concepts: Vec<ItemGroupDef>,
    concept_oids: HashSet<String>,
    open: Option<OpenConcept>,
    items: Vec<ItemDef>,
    codelists: Vec<CodeList>,
    units: Vec<MeasurementUnit>,
    seen_units: HashSet<String>,
}

impl Accumulator {
    fn new(version: OdmVersion, policy: HiddenRowPolicy) -> Self {
        Self {
            version,
            policy,
            sections: Vec::new(),
            section_index: HashMap::new(),
            concepts: Vec::new(),
            concept_oids: HashSet::new(),
            open: None,
            items: Vec::new(),
            codelists: Vec::new(),
            units: Vec::new(),
            seen_units: HashSet::new(),
        }
    }

    fn push(mut self, row: &CrfRow) -> Result<Self> {
        let key = row.group_key();
        if self.open.as_ref().map(|open| &open.key) != Some(&key) {
            self.flush();
            self.open_concept(key, row)?;
        }

        if !row.is_hidden() {
            let reference = item_ref(self.version, row)?;
            if let Some(open) = self.open.as_mut() {
                open.def.item_refs.push(reference);
            }
            self.items.push(item_def(self.version, row)?);
        }

        let emits_codelist = !row.is_hidden() || self.policy.emits_hidden_codelists();
        if emits_codelist && let Some(code_list) = build_code_list(self.version, row)? {
            debug!(
                oid = %code_list.oid,
                name = %code_list.name,
                entries = code_list.items.len() + code_list.enumerated_items.len(),
                "codelist"
            );
            self.codelists.push(code_list);
        }

        // Unit rows are usually hidden; they still feed the unit table.
        if let Some(literal) = row.item.unit_literal()
            && self.seen_units.insert(literal.to_string())
        {
            let unit = build_measurement_unit(self.version, literal);
            debug!(oid = %unit.oid, unit = literal, "measurement unit");
            self.units.push(unit);
        }
        Ok(self)
    }

    fn open_concept(&mut self, key: GroupKey, row: &CrfRow) -> Result<()> {
        let oid = section_oid(self.version, &row.section);
        let section_index = match self.section_index.get(&oid) {
            Some(index) => *index,
            None => {
                self.sections.push(section_def(self.version, &row.section));
                let index = self.sections.len() - 1;
                self.section_index.insert(oid, index);
                index
            }
        };
        let def = concept_def(self.version, row)?;
        // ODM 2.0 concept OIDs carry neither section nor concept order.
        if !self.concept_oids.insert(def.oid.clone()) {
            return Err(CoreError::DuplicateConcept {
                oid: def.oid,
                section_id: row.section.section_id.clone(),
                group_id: row.item.group_id.clone(),
            });
        }
        info!(
            section_id = %row.section.section_id,
            section_label = %row.section.label,
            group_id = %row.item.group_id,
            bc_id = %row.item.bc_id,
            concept = %def.oid,
            "concept"
        );
        self.sections[section_index]
            .item_group_refs
            .push(concept_ref(&def.oid, row));
        self.open = Some(OpenConcept {
            key,
            section_index,
            def,
        });
        Ok(())
    }

    fn flush(&mut self) {
        if let Some(open) = self.open.take() {
            debug!(
                concept = %open.def.oid,
                section = %self.sections[open.section_index].oid,
                items = open.def.item_refs.len(),
                "concept closed"
            );
            self.concepts.push(open.def);
        }
    }
}

/// Build the form hierarchy for one form's merged rows.
pub fn build(
    version: OdmVersion,
    policy: HiddenRowPolicy,
    metadata: &FormMetadata,
) -> Result<BuiltForm> {
    let mut acc = metadata
        .rows
        .iter()
        .try_fold(Accumulator::new(version, policy), Accumulator::push)?;
    acc.flush();

    // Section aliases come from the deduplicated section descriptors.
    for section in &metadata.sections {
        let oid = section_oid(version, section);
        if let Some(index) = acc.section_index.get(&oid) {
            let def = &mut acc.sections[*index];
            if def.aliases.is_empty() {
                def.aliases = section_aliases(section);
            }
        }
    }

    // Sections without any rows are left out of the form.
    let mut referenced = HashSet::new();
    let section_refs = metadata
        .sections
        .iter()
        .filter_map(|section| {
            let oid = section_oid(version, section);
            acc.section_index.contains_key(&oid).then_some((oid, section.section_order))
        })
        .filter(|(oid, _)| referenced.insert(oid.clone()))
        .map(|(item_group_oid, order_number)| ItemGroupRef {
            item_group_oid,
            order_number,
            mandatory: YesNo::Yes,
        })
        .collect();

    let mut aliases = Vec::new();
    if !metadata.form_annotation.is_empty() {
        aliases.push(Alias::new(FORM_ANNOTATION, &metadata.form_annotation));
    }
    let form = FormNode {
        oid: form_oid(version, &metadata.form_id),
        form_id: metadata.form_id.clone(),
        name: metadata.form_name.clone(),
        aliases,
        section_refs,
    };

    info!(
        form = %form.oid,
        sections = acc.sections.len(),
        concepts = acc.concepts.len(),
        items = acc.items.len(),
        codelists = acc.codelists.len(),
        units = acc.units.len(),
        "form hierarchy built"
    );
    Ok(BuiltForm {
        version,
        form,
        sections: acc.sections,
        concepts: acc.concepts,
        items: acc.items,
        codelists: acc.codelists,
        units: acc.units,
    })
}
