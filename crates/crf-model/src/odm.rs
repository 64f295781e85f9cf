//! CDISC ODM document model.
//!
//! A single model covers ODM 1.3.2 and 2.0. Fields that only exist in one
//! release are optional or left empty by the mapper for the other; the XML
//! writer decides element placement per [`OdmVersion`].
//!
//! Serialization uses ODM attribute and element names so the JSON rendition
//! mirrors the XML one.

use serde::{Deserialize, Serialize};

use crate::OdmVersion;

/// `Yes`/`No` attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum YesNo {
    Yes,
    No,
}

impl YesNo {
    pub fn as_str(&self) -> &'static str {
        match self {
            YesNo::Yes => "Yes",
            YesNo::No => "No",
        }
    }
}

impl From<bool> for YesNo {
    fn from(value: bool) -> Self {
        if value { YesNo::Yes } else { YesNo::No }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TranslatedText {
    #[serde(rename = "lang")]
    pub lang: String,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    #[serde(rename = "_content")]
    pub content: String,
}

/// Element holding translated texts (`Description`, `Question`, `Prompt`,
/// `Decode`, `Symbol`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LocalizedText {
    #[serde(rename = "TranslatedText")]
    pub translations: Vec<TranslatedText>,
}

impl LocalizedText {
    /// English text. ODM 2.0 also records the `text/plain` content type.
    pub fn english(text: impl Into<String>, version: OdmVersion) -> Self {
        let content_type = match version {
            OdmVersion::V1_3_2 => None,
            OdmVersion::V2_0 => Some("text/plain".to_string()),
        };
        Self {
            translations: vec![TranslatedText {
                lang: "en".to_string(),
                content_type,
                content: text.into(),
            }],
        }
    }

    /// First translation, if any.
    pub fn text(&self) -> Option<&str> {
        self.translations.first().map(|t| t.content.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Alias {
    pub context: String,
    pub name: String,
}

impl Alias {
    pub fn new(context: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            context: context.into(),
            name: name.into(),
        }
    }
}

/// ODM 2.0 `Coding` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Coding {
    pub code: String,
    pub system: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroupRef {
    #[serde(rename = "ItemGroupOID")]
    pub item_group_oid: String,
    #[serde(rename = "OrderNumber")]
    pub order_number: u32,
    #[serde(rename = "Mandatory")]
    pub mandatory: YesNo,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRef {
    #[serde(rename = "ItemOID")]
    pub item_oid: String,
    #[serde(rename = "OrderNumber")]
    pub order_number: u32,
    #[serde(rename = "Mandatory")]
    pub mandatory: YesNo,
    #[serde(rename = "PreSpecifiedValue", skip_serializing_if = "Option::is_none")]
    pub pre_specified_value: Option<String>,
}

/// Role of an item group in the ODM 2.0 form hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemGroupType {
    Form,
    Section,
    Concept,
}

impl ItemGroupType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemGroupType::Form => "Form",
            ItemGroupType::Section => "Section",
            ItemGroupType::Concept => "Concept",
        }
    }
}

/// ODM 1.3.2 `FormDef`. ODM 2.0 documents carry the form as an
/// [`ItemGroupDef`] of type [`ItemGroupType::Form`] instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormDef {
    #[serde(rename = "OID")]
    pub oid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Repeating")]
    pub repeating: YesNo,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(rename = "ItemGroupRef", skip_serializing_if = "Vec::is_empty", default)]
    pub item_group_refs: Vec<ItemGroupRef>,
    #[serde(rename = "Alias", skip_serializing_if = "Vec::is_empty", default)]
    pub aliases: Vec<Alias>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemGroupDef {
    #[serde(rename = "OID")]
    pub oid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Repeating")]
    pub repeating: YesNo,
    #[serde(rename = "Type", skip_serializing_if = "Option::is_none")]
    pub group_type: Option<ItemGroupType>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(rename = "Coding", skip_serializing_if = "Vec::is_empty", default)]
    pub codings: Vec<Coding>,
    #[serde(rename = "ItemGroupRef", skip_serializing_if = "Vec::is_empty", default)]
    pub item_group_refs: Vec<ItemGroupRef>,
    #[serde(rename = "ItemRef", skip_serializing_if = "Vec::is_empty", default)]
    pub item_refs: Vec<ItemRef>,
    #[serde(rename = "Alias", skip_serializing_if = "Vec::is_empty", default)]
    pub aliases: Vec<Alias>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListRef {
    #[serde(rename = "CodeListOID")]
    pub code_list_oid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementUnitRef {
    #[serde(rename = "MeasurementUnitOID")]
    pub measurement_unit_oid: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemDef {
    #[serde(rename = "OID")]
    pub oid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DataType")]
    pub data_type: String,
    #[serde(rename = "Length", skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(rename = "Description", skip_serializing_if = "Option::is_none")]
    pub description: Option<LocalizedText>,
    #[serde(rename = "Question", skip_serializing_if = "Option::is_none")]
    pub question: Option<LocalizedText>,
    #[serde(rename = "Prompt", skip_serializing_if = "Option::is_none")]
    pub prompt: Option<LocalizedText>,
    #[serde(rename = "CodeListRef", skip_serializing_if = "Option::is_none")]
    pub code_list_ref: Option<CodeListRef>,
    #[serde(rename = "MeasurementUnitRef", skip_serializing_if = "Option::is_none")]
    pub measurement_unit_ref: Option<MeasurementUnitRef>,
    #[serde(rename = "Alias", skip_serializing_if = "Vec::is_empty", default)]
    pub aliases: Vec<Alias>,
}

impl ItemDef {
    /// Name of the first alias with the given context.
    pub fn alias(&self, context: &str) -> Option<&str> {
        self.aliases
            .iter()
            .find(|alias| alias.context == context)
            .map(|alias| alias.name.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeListItem {
    #[serde(rename = "CodedValue")]
    pub coded_value: String,
    #[serde(rename = "Decode", skip_serializing_if = "Option::is_none")]
    pub decode: Option<LocalizedText>,
    #[serde(rename = "Coding", skip_serializing_if = "Vec::is_empty", default)]
    pub codings: Vec<Coding>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnumeratedItem {
    #[serde(rename = "CodedValue")]
    pub coded_value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeList {
    #[serde(rename = "OID")]
    pub oid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "DataType")]
    pub data_type: String,
    #[serde(rename = "CodeListItem", skip_serializing_if = "Vec::is_empty", default)]
    pub items: Vec<CodeListItem>,
    #[serde(rename = "EnumeratedItem", skip_serializing_if = "Vec::is_empty", default)]
    pub enumerated_items: Vec<EnumeratedItem>,
    #[serde(rename = "Coding", skip_serializing_if = "Vec::is_empty", default)]
    pub codings: Vec<Coding>,
}

impl CodeList {
    /// `(display, value)` pairs in document order.
    pub fn options(&self) -> Vec<(&str, &str)> {
        if !self.enumerated_items.is_empty() {
            return self
                .enumerated_items
                .iter()
                .map(|item| (item.coded_value.as_str(), item.coded_value.as_str()))
                .collect();
        }
        self.items
            .iter()
            .map(|item| {
                let display = item
                    .decode
                    .as_ref()
                    .and_then(LocalizedText::text)
                    .unwrap_or(item.coded_value.as_str());
                (display, item.coded_value.as_str())
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasurementUnit {
    #[serde(rename = "OID")]
    pub oid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Symbol")]
    pub symbol: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaDataVersion {
    #[serde(rename = "OID")]
    pub oid: String,
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "FormDef", skip_serializing_if = "Vec::is_empty", default)]
    pub form_defs: Vec<FormDef>,
    #[serde(rename = "ItemGroupDef", default)]
    pub item_group_defs: Vec<ItemGroupDef>,
    #[serde(rename = "ItemDef", default)]
    pub item_defs: Vec<ItemDef>,
    #[serde(rename = "CodeList", default)]
    pub code_lists: Vec<CodeList>,
}

impl MetaDataVersion {
    pub fn find_item_group(&self, oid: &str) -> Option<&ItemGroupDef> {
        self.item_group_defs.iter().find(|group| group.oid == oid)
    }

    pub fn find_item(&self, oid: &str) -> Option<&ItemDef> {
        self.item_defs.iter().find(|item| item.oid == oid)
    }

    /// Codelist lookup. Duplicate OIDs resolve to the last definition.
    pub fn find_code_list(&self, oid: &str) -> Option<&CodeList> {
        self.code_lists.iter().rev().find(|list| list.oid == oid)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GlobalVariables {
    pub study_name: String,
    pub study_description: String,
    pub protocol_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Study {
    #[serde(rename = "OID")]
    pub oid: String,
    #[serde(rename = "GlobalVariables")]
    pub global_variables: GlobalVariables,
    #[serde(rename = "MeasurementUnit", skip_serializing_if = "Vec::is_empty", default)]
    pub measurement_units: Vec<MeasurementUnit>,
    #[serde(rename = "MetaDataVersion")]
    pub meta_data_version: MetaDataVersion,
}

/// Root `ODM` element.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Odm {
    #[serde(rename = "FileOID")]
    pub file_oid: String,
    #[serde(rename = "Granularity")]
    pub granularity: String,
    #[serde(rename = "ODMVersion")]
    pub odm_version: OdmVersion,
    #[serde(rename = "FileType")]
    pub file_type: String,
    #[serde(rename = "CreationDateTime")]
    pub creation_date_time: String,
    #[serde(rename = "AsOfDateTime", skip_serializing_if = "Option::is_none")]
    pub as_of_date_time: Option<String>,
    #[serde(rename = "Originator")]
    pub originator: String,
    #[serde(rename = "SourceSystem")]
    pub source_system: String,
    #[serde(rename = "SourceSystemVersion")]
    pub source_system_version: String,
    #[serde(rename = "Study")]
    pub study: Study,
}

impl Odm {
    pub fn metadata(&self) -> &MetaDataVersion {
        &self.study.meta_data_version
    }

    /// Root of the form hierarchy: the `FormDef` (1.3.2) or the form-typed
    /// item group (2.0), as `(oid, name, refs)`.
    pub fn form_root(&self) -> Option<(&str, &str, &[ItemGroupRef])> {
        let mdv = self.metadata();
        if let Some(form) = mdv.form_defs.first() {
            return Some((&form.oid, &form.name, &form.item_group_refs));
        }
        mdv.item_group_defs
            .iter()
            .find(|group| group.group_type == Some(ItemGroupType::Form))
            .map(|group| (group.oid.as_str(), group.name.as_str(), group.item_group_refs.as_slice()))
    }
}
