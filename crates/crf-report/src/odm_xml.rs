//! ODM XML output.
//!
//! Element placement follows the target release: ODM 1.3.2 keeps study
//! labels in `GlobalVariables` and units in `BasicDefinitions`; ODM 2.0
//! carries them as `Study` attributes and `Study/MeasurementUnit`.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use crf_model::{
    Alias, CodeList, Coding, FormDef, ItemDef, ItemGroupDef, ItemGroupRef, LocalizedText,
    MeasurementUnit, MetaDataVersion, Odm, OdmVersion,
};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use tracing::debug;

use crate::common::{XLINK_NS, ensure_parent_dir, write_text_element, write_translated_text};

/// Write the document to `output_path`.
pub fn write_odm_xml(output_path: &Path, odm: &Odm) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let file =
        File::create(output_path).with_context(|| format!("create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    write_odm(&mut writer, odm)?;
    writer
        .flush()
        .with_context(|| format!("flush {}", output_path.display()))?;
    debug!(path = %output_path.display(), "ODM XML written");
    Ok(())
}

/// Render the document to a string.
pub fn odm_xml_string(odm: &Odm) -> Result<String> {
    let mut buffer = Vec::new();
    write_odm(&mut buffer, odm)?;
    String::from_utf8(buffer).context("ODM XML is not valid UTF-8")
}

pub fn write_odm<W: Write>(writer: W, odm: &Odm) -> Result<()> {
    let version = odm.odm_version;
    let mut xml = Writer::new_with_indent(writer, b' ', 2);
    xml.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;

    let mut root = BytesStart::new("ODM");
    root.push_attribute(("xmlns", version.namespace()));
    root.push_attribute(("xmlns:xlink", XLINK_NS));
    root.push_attribute(("FileOID", odm.file_oid.as_str()));
    root.push_attribute(("Granularity", odm.granularity.as_str()));
    root.push_attribute(("ODMVersion", version.as_str()));
    root.push_attribute(("FileType", odm.file_type.as_str()));
    root.push_attribute(("CreationDateTime", odm.creation_date_time.as_str()));
    if let Some(as_of) = &odm.as_of_date_time {
        root.push_attribute(("AsOfDateTime", as_of.as_str()));
    }
    root.push_attribute(("Originator", odm.originator.as_str()));
    root.push_attribute(("SourceSystem", odm.source_system.as_str()));
    root.push_attribute(("SourceSystemVersion", odm.source_system_version.as_str()));
    xml.write_event(Event::Start(root))?;

    let study = &odm.study;
    let globals = &study.global_variables;
    let mut study_node = BytesStart::new("Study");
    study_node.push_attribute(("OID", study.oid.as_str()));
    match version {
        OdmVersion::V1_3_2 => {
            xml.write_event(Event::Start(study_node))?;
            xml.write_event(Event::Start(BytesStart::new("GlobalVariables")))?;
            write_text_element(&mut xml, "StudyName", &globals.study_name)?;
            write_text_element(&mut xml, "StudyDescription", &globals.study_description)?;
            write_text_element(&mut xml, "ProtocolName", &globals.protocol_name)?;
            xml.write_event(Event::End(BytesEnd::new("GlobalVariables")))?;
            if !study.measurement_units.is_empty() {
                xml.write_event(Event::Start(BytesStart::new("BasicDefinitions")))?;
                write_units(&mut xml, &study.measurement_units)?;
                xml.write_event(Event::End(BytesEnd::new("BasicDefinitions")))?;
            }
        }
        OdmVersion::V2_0 => {
            study_node.push_attribute(("StudyName", globals.study_name.as_str()));
            study_node.push_attribute(("ProtocolName", globals.protocol_name.as_str()));
            xml.write_event(Event::Start(study_node))?;
            write_translated_text(
                &mut xml,
                "Description",
                &LocalizedText::english(&globals.study_description, version),
            )?;
            write_units(&mut xml, &study.measurement_units)?;
        }
    }

    write_metadata_version(&mut xml, &study.meta_data_version, version)?;

    xml.write_event(Event::End(BytesEnd::new("Study")))?;
    xml.write_event(Event::End(BytesEnd::new("ODM")))?;
    Ok(())
}

fn write_units<W: Write>(xml: &mut Writer<W>, units: &[MeasurementUnit]) -> Result<()> {
    for unit in units {
        let mut node = BytesStart::new("MeasurementUnit");
        node.push_attribute(("OID", unit.oid.as_str()));
        node.push_attribute(("Name", unit.name.as_str()));
        xml.write_event(Event::Start(node))?;
        write_translated_text(xml, "Symbol", &unit.symbol)?;
        xml.write_event(Event::End(BytesEnd::new("MeasurementUnit")))?;
    }
    Ok(())
}

fn write_metadata_version<W: Write>(
    xml: &mut Writer<W>,
    mdv: &MetaDataVersion,
    version: OdmVersion,
) -> Result<()> {
    let mut node = BytesStart::new("MetaDataVersion");
    node.push_attribute(("OID", mdv.oid.as_str()));
    node.push_attribute(("Name", mdv.name.as_str()));
    if version == OdmVersion::V1_3_2 {
        node.push_attribute(("Description", mdv.description.as_str()));
    }
    xml.write_event(Event::Start(node))?;
    if version == OdmVersion::V2_0 {
        write_translated_text(
            xml,
            "Description",
            &LocalizedText::english(&mdv.description, version),
        )?;
    }

    for form in &mdv.form_defs {
        write_form_def(xml, form)?;
    }
    for group in &mdv.item_group_defs {
        write_item_group_def(xml, group)?;
    }
    for item in &mdv.item_defs {
        write_item_def(xml, item)?;
    }
    for code_list in &mdv.code_lists {
        write_code_list(xml, code_list)?;
    }

    xml.write_event(Event::End(BytesEnd::new("MetaDataVersion")))?;
    Ok(())
}

fn write_item_group_refs<W: Write>(xml: &mut Writer<W>, refs: &[ItemGroupRef]) -> Result<()> {
    for group_ref in refs {
        let order = group_ref.order_number.to_string();
        let mut node = BytesStart::new("ItemGroupRef");
        node.push_attribute(("ItemGroupOID", group_ref.item_group_oid.as_str()));
        node.push_attribute(("OrderNumber", order.as_str()));
        node.push_attribute(("Mandatory", group_ref.mandatory.as_str()));
        xml.write_event(Event::Empty(node))?;
    }
    Ok(())
}

fn write_aliases<W: Write>(xml: &mut Writer<W>, aliases: &[Alias]) -> Result<()> {
    for alias in aliases {
        let mut node = BytesStart::new("Alias");
        node.push_attribute(("Context", alias.context.as_str()));
        node.push_attribute(("Name", alias.name.as_str()));
        xml.write_event(Event::Empty(node))?;
    }
    Ok(())
}

fn write_codings<W: Write>(xml: &mut Writer<W>, codings: &[Coding]) -> Result<()> {
    for coding in codings {
        let mut node = BytesStart::new("Coding");
        node.push_attribute(("Code", coding.code.as_str()));
        node.push_attribute(("System", coding.system.as_str()));
        if let Some(name) = &coding.system_name {
            node.push_attribute(("SystemName", name.as_str()));
        }
        xml.write_event(Event::Empty(node))?;
    }
    Ok(())
}

fn write_form_def<W: Write>(xml: &mut Writer<W>, form: &FormDef) -> Result<()> {
    let mut node = BytesStart::new("FormDef");
    node.push_attribute(("OID", form.oid.as_str()));
    node.push_attribute(("Name", form.name.as_str()));
    node.push_attribute(("Repeating", form.repeating.as_str()));
    xml.write_event(Event::Start(node))?;
    if let Some(description) = &form.description {
        write_translated_text(xml, "Description", description)?;
    }
    write_item_group_refs(xml, &form.item_group_refs)?;
    write_aliases(xml, &form.aliases)?;
    xml.write_event(Event::End(BytesEnd::new("FormDef")))?;
    Ok(())
}

fn write_item_group_def<W: Write>(xml: &mut Writer<W>, group: &ItemGroupDef) -> Result<()> {
    let mut node = BytesStart::new("ItemGroupDef");
    node.push_attribute(("OID", group.oid.as_str()));
    node.push_attribute(("Name", group.name.as_str()));
    node.push_attribute(("Repeating", group.repeating.as_str()));
    if let Some(group_type) = group.group_type {
        node.push_attribute(("Type", group_type.as_str()));
    }
    xml.write_event(Event::Start(node))?;
    if let Some(description) = &group.description {
        write_translated_text(xml, "Description", description)?;
    }
    write_codings(xml, &group.codings)?;
    write_item_group_refs(xml, &group.item_group_refs)?;
    for item_ref in &group.item_refs {
        let order = item_ref.order_number.to_string();
        let mut ref_node = BytesStart::new("ItemRef");
        ref_node.push_attribute(("ItemOID", item_ref.item_oid.as_str()));
        ref_node.push_attribute(("OrderNumber", order.as_str()));
        ref_node.push_attribute(("Mandatory", item_ref.mandatory.as_str()));
        if let Some(value) = &item_ref.pre_specified_value {
            ref_node.push_attribute(("PreSpecifiedValue", value.as_str()));
        }
        xml.write_event(Event::Empty(ref_node))?;
    }
    write_aliases(xml, &group.aliases)?;
    xml.write_event(Event::End(BytesEnd::new("ItemGroupDef")))?;
    Ok(())
}

fn write_item_def<W: Write>(xml: &mut Writer<W>, item: &ItemDef) -> Result<()> {
    let mut node = BytesStart::new("ItemDef");
    node.push_attribute(("OID", item.oid.as_str()));
    node.push_attribute(("Name", item.name.as_str()));
    node.push_attribute(("DataType", item.data_type.as_str()));
    let length = item.length.map(|length| length.to_string());
    if let Some(length) = &length {
        node.push_attribute(("Length", length.as_str()));
    }
    xml.write_event(Event::Start(node))?;
    if let Some(description) = &item.description {
        write_translated_text(xml, "Description", description)?;
    }
    if let Some(question) = &item.question {
        write_translated_text(xml, "Question", question)?;
    }
    if let Some(prompt) = &item.prompt {
        write_translated_text(xml, "Prompt", prompt)?;
    }
    if let Some(unit_ref) = &item.measurement_unit_ref {
        let mut ref_node = BytesStart::new("MeasurementUnitRef");
        ref_node.push_attribute(("MeasurementUnitOID", unit_ref.measurement_unit_oid.as_str()));
        xml.write_event(Event::Empty(ref_node))?;
    }
    if let Some(code_list_ref) = &item.code_list_ref {
        let mut ref_node = BytesStart::new("CodeListRef");
        ref_node.push_attribute(("CodeListOID", code_list_ref.code_list_oid.as_str()));
        xml.write_event(Event::Empty(ref_node))?;
    }
    write_aliases(xml, &item.aliases)?;
    xml.write_event(Event::End(BytesEnd::new("ItemDef")))?;
    Ok(())
}

fn write_code_list<W: Write>(xml: &mut Writer<W>, code_list: &CodeList) -> Result<()> {
    let mut node = BytesStart::new("CodeList");
    node.push_attribute(("OID", code_list.oid.as_str()));
    node.push_attribute(("Name", code_list.name.as_str()));
    node.push_attribute(("DataType", code_list.data_type.as_str()));
    xml.write_event(Event::Start(node))?;
    for item in &code_list.items {
        let mut item_node = BytesStart::new("CodeListItem");
        item_node.push_attribute(("CodedValue", item.coded_value.as_str()));
        xml.write_event(Event::Start(item_node))?;
        if let Some(decode) = &item.decode {
            write_translated_text(xml, "Decode", decode)?;
        }
        write_codings(xml, &item.codings)?;
        xml.write_event(Event::End(BytesEnd::new("CodeListItem")))?;
    }
    for item in &code_list.enumerated_items {
        let mut item_node = BytesStart::new("EnumeratedItem");
        item_node.push_attribute(("CodedValue", item.coded_value.as_str()));
        xml.write_event(Event::Empty(item_node))?;
    }
    write_codings(xml, &code_list.codings)?;
    xml.write_event(Event::End(BytesEnd::new("CodeList")))?;
    Ok(())
}
