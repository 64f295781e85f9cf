use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::ModelError;

/// CDISC ODM release targeted by a generated document.
///
/// Each release has one fixed document shape: identifier templates,
/// element nesting and a few attribute conventions differ between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum OdmVersion {
    #[default]
    V1_3_2,
    V2_0,
}

impl OdmVersion {
    /// Value of the `ODMVersion` attribute.
    pub fn as_str(&self) -> &'static str {
        match self {
            OdmVersion::V1_3_2 => "1.3.2",
            OdmVersion::V2_0 => "2.0",
        }
    }

    /// Default XML namespace of the document element.
    pub fn namespace(&self) -> &'static str {
        match self {
            OdmVersion::V1_3_2 => "http://www.cdisc.org/ns/odm/v1.3",
            OdmVersion::V2_0 => "http://www.cdisc.org/ns/odm/v2.0",
        }
    }

    /// Tag used in output file names, e.g. `odmv1-3-2`.
    pub fn file_tag(&self) -> &'static str {
        match self {
            OdmVersion::V1_3_2 => "odmv1-3-2",
            OdmVersion::V2_0 => "odmv2-0",
        }
    }

    /// Whether item groups may reference other item groups.
    pub fn supports_nested_groups(&self) -> bool {
        matches!(self, OdmVersion::V2_0)
    }
}

impl fmt::Display for OdmVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OdmVersion {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().trim_start_matches(['v', 'V']) {
            "1.3.2" | "132" | "1-3-2" => Ok(OdmVersion::V1_3_2),
            "2.0" | "20" | "2-0" | "2" => Ok(OdmVersion::V2_0),
            _ => Err(ModelError::UnknownOdmVersion(s.to_string())),
        }
    }
}

impl Serialize for OdmVersion {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for OdmVersion {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Whether rows flagged `display_hidden` still emit codelists.
///
/// Hidden rows never produce items or item references. Unit literals are
/// always collected from them because unit rows are normally hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HiddenRowPolicy {
    /// Hidden rows still emit their codelist.
    IncludeCodelists,
    /// Hidden rows emit nothing but unit literals.
    Exclude,
}

impl HiddenRowPolicy {
    /// Default policy for each ODM release.
    pub fn default_for(version: OdmVersion) -> Self {
        match version {
            OdmVersion::V1_3_2 => HiddenRowPolicy::IncludeCodelists,
            OdmVersion::V2_0 => HiddenRowPolicy::Exclude,
        }
    }

    pub fn emits_hidden_codelists(&self) -> bool {
        matches!(self, HiddenRowPolicy::IncludeCodelists)
    }
}

impl FromStr for HiddenRowPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "include-codelists" | "include" => Ok(HiddenRowPolicy::IncludeCodelists),
            "exclude" => Ok(HiddenRowPolicy::Exclude),
            _ => Err(ModelError::UnknownHiddenRowPolicy(s.to_string())),
        }
    }
}
