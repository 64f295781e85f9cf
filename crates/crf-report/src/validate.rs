//! Document checks.
//!
//! [`check_references`] runs in-process and resolves every reference in the
//! document. [`SchemaValidator`] hands the written XML to an external
//! validator (`xmllint` by default). Neither stops a run; callers log the
//! outcome.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::process::Command;

use crf_model::{IssueSeverity, ItemGroupRef, Odm, ValidationReport};
use tracing::debug;

/// Resolve every ItemGroupRef, ItemRef, CodeListRef and MeasurementUnitRef.
/// Duplicate definition OIDs are reported as warnings.
pub fn check_references(odm: &Odm) -> ValidationReport {
    let mut report = ValidationReport::new("references");
    let mdv = odm.metadata();

    let group_oids: HashSet<&str> = mdv.item_group_defs.iter().map(|g| g.oid.as_str()).collect();
    let item_oids: HashSet<&str> = mdv.item_defs.iter().map(|i| i.oid.as_str()).collect();
    let code_list_oids: HashSet<&str> = mdv.code_lists.iter().map(|c| c.oid.as_str()).collect();
    let unit_oids: HashSet<&str> = odm
        .study
        .measurement_units
        .iter()
        .map(|u| u.oid.as_str())
        .collect();

    match odm.form_root() {
        Some((oid, _, refs)) => check_group_refs(&mut report, &group_oids, oid, refs),
        None => report.push(
            "MISSING_FORM",
            IssueSeverity::Error,
            None,
            "document has no form definition",
        ),
    }
    for group in &mdv.item_group_defs {
        check_group_refs(&mut report, &group_oids, &group.oid, &group.item_group_refs);
        for item_ref in &group.item_refs {
            if !item_oids.contains(item_ref.item_oid.as_str()) {
                report.push(
                    "UNRESOLVED_ITEM_REF",
                    IssueSeverity::Error,
                    Some(&group.oid),
                    format!("references missing item {}", item_ref.item_oid),
                );
            }
        }
    }

    for item in &mdv.item_defs {
        if let Some(code_list_ref) = &item.code_list_ref
            && !code_list_oids.contains(code_list_ref.code_list_oid.as_str())
        {
            report.push(
                "UNRESOLVED_CODELIST_REF",
                IssueSeverity::Error,
                Some(&item.oid),
                format!("references missing codelist {}", code_list_ref.code_list_oid),
            );
        }
        if let Some(unit_ref) = &item.measurement_unit_ref
            && !unit_oids.contains(unit_ref.measurement_unit_oid.as_str())
        {
            report.push(
                "UNRESOLVED_UNIT_REF",
                IssueSeverity::Error,
                Some(&item.oid),
                format!(
                    "references missing measurement unit {}",
                    unit_ref.measurement_unit_oid
                ),
            );
        }
    }

    report_duplicates(
        &mut report,
        "DUPLICATE_ITEM_GROUP",
        mdv.item_group_defs.iter().map(|g| g.oid.as_str()),
    );
    report_duplicates(
        &mut report,
        "DUPLICATE_ITEM",
        mdv.item_defs.iter().map(|i| i.oid.as_str()),
    );
    report_duplicates(
        &mut report,
        "DUPLICATE_CODELIST",
        mdv.code_lists.iter().map(|c| c.oid.as_str()),
    );

    debug!(
        errors = report.error_count(),
        warnings = report.warning_count(),
        "reference check finished"
    );
    report
}

fn check_group_refs(
    report: &mut ValidationReport,
    group_oids: &HashSet<&str>,
    owner: &str,
    refs: &[ItemGroupRef],
) {
    for group_ref in refs {
        if !group_oids.contains(group_ref.item_group_oid.as_str()) {
            report.push(
                "UNRESOLVED_ITEM_GROUP_REF",
                IssueSeverity::Error,
                Some(owner),
                format!("references missing item group {}", group_ref.item_group_oid),
            );
        }
    }
}

fn report_duplicates<'a>(
    report: &mut ValidationReport,
    code: &str,
    oids: impl Iterator<Item = &'a str>,
) {
    let mut seen = HashSet::new();
    let mut reported = HashSet::new();
    for oid in oids {
        if !seen.insert(oid) && reported.insert(oid) {
            report.push(
                code,
                IssueSeverity::Warning,
                Some(oid),
                "defined more than once",
            );
        }
    }
}

/// Result of running the external schema validator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SchemaOutcome {
    Valid,
    /// The validator ran and rejected the document.
    Invalid { details: String },
    /// The validator could not be run.
    Unavailable { reason: String },
}

/// External XML Schema validation, e.g. `xmllint --noout --schema <xsd> <xml>`.
#[derive(Debug, Clone)]
pub struct SchemaValidator {
    pub command: String,
    pub schema: PathBuf,
}

impl SchemaValidator {
    pub fn new(command: impl Into<String>, schema: impl Into<PathBuf>) -> Self {
        Self {
            command: command.into(),
            schema: schema.into(),
        }
    }

    pub fn validate(&self, xml_path: &Path) -> SchemaOutcome {
        if !self.schema.exists() {
            return SchemaOutcome::Unavailable {
                reason: format!("schema not found: {}", self.schema.display()),
            };
        }
        debug!(
            command = %self.command,
            schema = %self.schema.display(),
            xml = %xml_path.display(),
            "running schema validator"
        );
        let output = match Command::new(&self.command)
            .args(["--noout", "--schema"])
            .arg(&self.schema)
            .arg(xml_path)
            .output()
        {
            Ok(output) => output,
            Err(err) => {
                return SchemaOutcome::Unavailable {
                    reason: format!("failed to run {}: {err}", self.command),
                };
            }
        };
        if output.status.success() {
            SchemaOutcome::Valid
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stdout = String::from_utf8_lossy(&output.stdout);
            let details: Vec<&str> = [stdout.trim(), stderr.trim()]
                .into_iter()
                .filter(|text| !text.is_empty())
                .collect();
            SchemaOutcome::Invalid {
                details: details.join("\n"),
            }
        }
    }
}
