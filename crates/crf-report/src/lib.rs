//! Output adapters for assembled ODM documents: XML and JSON serialization,
//! reference and schema validation, HTML renditions and ZIP packaging.

mod common;

pub mod archive;
pub mod html;
pub mod odm_json;
pub mod odm_xml;
pub mod validate;

pub use archive::{ArchiveEntry, update_archive};
pub use html::{
    CrfRenderer, NativeRenderer, Rendition, XsltRenderer, render_crf_html, write_rendition,
};
pub use odm_json::{odm_json_string, write_odm_json};
pub use odm_xml::{odm_xml_string, write_odm, write_odm_xml};
pub use validate::{SchemaOutcome, SchemaValidator, check_references};
