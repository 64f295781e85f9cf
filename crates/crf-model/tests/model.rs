//! Tests for crf-model types.

use crf_model::{
    CodeList, CodeListItem, EnumeratedItem, ItemRef, ItemRow, LocalizedText, MeasurementUnit,
    OdmVersion, YesNo,
};

#[test]
fn measurement_unit_serializes_with_odm_names() {
    let unit = MeasurementUnit {
        oid: "MU.kg".to_string(),
        name: "kg".to_string(),
        symbol: LocalizedText::english("kg", OdmVersion::V1_3_2),
    };
    insta::assert_json_snapshot!(unit, @r#"
    {
      "OID": "MU.kg",
      "Name": "kg",
      "Symbol": {
        "TranslatedText": [
          {
            "lang": "en",
            "_content": "kg"
          }
        ]
      }
    }
    "#);
}

#[test]
fn item_ref_omits_absent_pre_specified_value() {
    let item_ref = ItemRef {
        item_oid: "IT.S1.G1.VSORRES".to_string(),
        order_number: 2,
        mandatory: YesNo::Yes,
        pre_specified_value: None,
    };
    let json = serde_json::to_value(&item_ref).expect("serialize item ref");
    assert_eq!(json["ItemOID"], "IT.S1.G1.VSORRES");
    assert_eq!(json["OrderNumber"], 2);
    assert_eq!(json["Mandatory"], "Yes");
    assert!(json.get("PreSpecifiedValue").is_none());
}

#[test]
fn odm_2_text_records_content_type() {
    let text = LocalizedText::english("Weight", OdmVersion::V2_0);
    let json = serde_json::to_value(&text).expect("serialize text");
    assert_eq!(json["TranslatedText"][0]["Type"], "text/plain");
    assert_eq!(text.text(), Some("Weight"));
}

#[test]
fn codelist_options_prefer_enumerated_items() {
    let enumerated = CodeList {
        oid: "CL.1".to_string(),
        name: "UNIT".to_string(),
        data_type: "text".to_string(),
        items: Vec::new(),
        enumerated_items: vec![EnumeratedItem {
            coded_value: "kg".to_string(),
        }],
        codings: Vec::new(),
    };
    assert_eq!(enumerated.options(), vec![("kg", "kg")]);

    let decoded = CodeList {
        oid: "CL.2".to_string(),
        name: "NY".to_string(),
        data_type: "text".to_string(),
        items: vec![
            CodeListItem {
                coded_value: "Y".to_string(),
                decode: Some(LocalizedText::english("Yes", OdmVersion::V1_3_2)),
                codings: Vec::new(),
            },
            CodeListItem {
                coded_value: "N".to_string(),
                decode: None,
                codings: Vec::new(),
            },
        ],
        enumerated_items: Vec::new(),
        codings: Vec::new(),
    };
    assert_eq!(decoded.options(), vec![("Yes", "Y"), ("N", "N")]);
}

#[test]
fn odm_version_round_trips_through_json() {
    let json = serde_json::to_string(&OdmVersion::V2_0).expect("serialize version");
    assert_eq!(json, "\"2.0\"");
    let parsed: OdmVersion = serde_json::from_str("\"1.3.2\"").expect("deserialize version");
    assert_eq!(parsed, OdmVersion::V1_3_2);
}

#[test]
fn codelist_declaration_needs_a_codelist_or_display_list() {
    let plain = ItemRow::default();
    assert!(!plain.declares_codelist());

    let named = ItemRow {
        codelist: "C71148".to_string(),
        ..ItemRow::default()
    };
    assert!(named.declares_codelist());

    let value_list = ItemRow {
        value_display_list: "Sitting;Standing".to_string(),
        ..ItemRow::default()
    };
    assert!(value_list.declares_codelist());

    let values_only = ItemRow {
        value_list: "SITTING;STANDING".to_string(),
        ..ItemRow::default()
    };
    assert!(!values_only.declares_codelist());
}
