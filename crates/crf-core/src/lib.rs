//! Mapping engine from merged CRF metadata rows to an ODM document.
//!
//! [`build`] folds the rows of one form into a Form, Section, Concept and
//! Item hierarchy with its codelists and measurement units; [`assemble`]
//! wraps that hierarchy into the version-specific document.

pub mod assemble;
pub mod builder;
pub mod codelist;
pub mod defs;
pub mod error;
pub mod oid;

pub use assemble::{Envelope, assemble, format_timestamp};
pub use builder::{BuiltForm, FormNode, build};
pub use error::{CoreError, Result};
pub use oid::{IdentifierKind, synthesize};
