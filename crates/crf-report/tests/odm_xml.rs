mod common;

use crf_model::OdmVersion;
use crf_report::{odm_xml_string, write_odm_xml};
use quick_xml::Reader;
use quick_xml::events::Event;

use common::odm;

fn assert_well_formed(xml: &str) {
    let mut reader = Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(err) => panic!("malformed XML at {}: {err}", reader.buffer_position()),
        }
    }
}

fn item_def<'a>(xml: &'a str, oid: &str) -> &'a str {
    let start = xml
        .find(&format!("<ItemDef OID=\"{oid}\""))
        .unwrap_or_else(|| panic!("ItemDef {oid} missing"));
    let end = start + xml[start..].find("</ItemDef>").unwrap();
    &xml[start..end]
}

#[test]
fn test_odm_132_layout() {
    let xml = odm_xml_string(&odm(OdmVersion::V1_3_2)).unwrap();
    assert_well_formed(&xml);

    assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
    assert!(xml.contains("xmlns=\"http://www.cdisc.org/ns/odm/v1.3\""));
    assert!(xml.contains("ODMVersion=\"1.3.2\""));
    assert!(xml.contains("CreationDateTime=\"2025-03-14T09:26:53Z\""));
    assert!(!xml.contains("AsOfDateTime"));
    assert!(xml.contains("<GlobalVariables>"));
    assert!(xml.contains("<BasicDefinitions>"));
    assert!(xml.contains("<MeasurementUnit OID=\"MU.mmHg\" Name=\"mmHg\">"));
    assert!(xml.contains("<FormDef OID=\"FORM.VS\" Name=\"Vital Signs\" Repeating=\"No\">"));
    assert!(!xml.contains("Type=\"Concept\""));
    assert!(!xml.contains("<Prompt>"));
    assert!(xml.contains("<EnumeratedItem CodedValue=\"mmHg\"/>"));
    // hidden unit row
    assert!(!xml.contains("<ItemDef OID=\"IT.S1_1_BP_1.SYSBP_VSORRESU\""));
    assert!(xml.contains("<CodeList OID=\"CL.S1_BP_1.SYSBP_VSORRESU.C66770\""));
}

#[test]
fn test_odm_132_item_def_child_order() {
    let xml = odm_xml_string(&odm(OdmVersion::V1_3_2)).unwrap();
    let result = item_def(&xml, "IT.S1_1_BP_1.SYSBP_VSORRES");
    let question = result.find("<Question>").unwrap();
    let unit = result.find("<MeasurementUnitRef MeasurementUnitOID=\"MU.mmHg\"/>").unwrap();
    let alias = result.find("<Alias Context=\"SDTM\"").unwrap();
    assert!(question < unit && unit < alias);
    assert!(result.contains("<Alias Context=\"prompt\" Name=\"Systolic\"/>"));

    let position = item_def(&xml, "IT.S1_1_BP_1.VSPOS");
    assert!(position.contains("<CodeListRef CodeListOID=\"CL.S1_BP_1.VSPOS.C71148\"/>"));
}

#[test]
fn test_odm_20_layout() {
    let xml = odm_xml_string(&odm(OdmVersion::V2_0)).unwrap();
    assert_well_formed(&xml);

    assert!(xml.contains("xmlns=\"http://www.cdisc.org/ns/odm/v2.0\""));
    assert!(xml.contains("ODMVersion=\"2.0\""));
    assert!(xml.contains("AsOfDateTime=\"2025-03-14T09:26:53Z\""));
    assert!(xml.contains("StudyName=\"CDISC360i CDASH POC Study\""));
    assert!(!xml.contains("<GlobalVariables>"));
    assert!(!xml.contains("<BasicDefinitions>"));
    assert!(!xml.contains("<FormDef"));
    assert!(xml.contains(
        "<ItemGroupDef OID=\"IG.VS\" Name=\"Vital Signs\" Repeating=\"No\" Type=\"Form\">"
    ));
    assert!(xml.contains("Type=\"Section\""));
    assert!(xml.contains("<ItemGroupDef OID=\"IG.S1.BP\""));
    assert!(xml.contains("Type=\"text/plain\""));

    let position = item_def(&xml, "IT.S1.BP.VSPOS");
    assert!(position.contains("<Prompt>"));
    assert!(!position.contains("Context=\"prompt\""));

    let units = xml.find("<MeasurementUnit ").unwrap();
    let mdv = xml.find("<MetaDataVersion ").unwrap();
    assert!(units < mdv);
}

#[test]
fn test_write_odm_xml_creates_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("VS").join("vs_odmv2-0.xml");
    let document = odm(OdmVersion::V2_0);
    write_odm_xml(&path, &document).unwrap();
    let written = std::fs::read_to_string(&path).unwrap();
    assert_eq!(written, odm_xml_string(&document).unwrap());
}
