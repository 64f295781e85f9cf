//! Form build pipeline with explicit stages.
//!
//! The pipeline follows these stages in order:
//! 1. **Load**: read both metadata tables and merge the rows of one form
//! 2. **Build**: fold the rows into the form hierarchy and assemble the ODM
//! 3. **Write**: ODM XML and JSON
//! 4. **Validate**: reference integrity and XML Schema (never fatal)
//! 5. **Render**: plain and annotated HTML
//! 6. **Package**: optional ZIP archive
//!
//! Any failure in stages 1 and 2 stops the run before a file is written.

use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tracing::{debug, info, info_span, warn};

use crf_core::{assemble, build};
use crf_ingest::{FormSources, load_form_metadata};
use crf_model::{IssueSeverity, ItemGroupType, Odm, OdmVersion, ValidationReport};
use crf_report::{
    ArchiveEntry, NativeRenderer, Rendition, SchemaOutcome, SchemaValidator, XsltRenderer,
    check_references, update_archive, write_odm_json, write_odm_xml, write_rendition,
};

use crate::config::Config;

/// What to build and which optional stages to run.
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub form_id: String,
    /// Output file prefix; derived from the form id when absent.
    pub prefix: Option<String>,
    pub version: OdmVersion,
    pub html: bool,
    pub validate: bool,
    pub zip: bool,
}

/// Lower-case a prefix and replace spaces with underscores.
pub fn normalize_prefix(prefix: &str) -> String {
    prefix.trim().to_lowercase().replace(' ', "_")
}

/// Output file locations for one form: `<crf_path>/<form_id>/<prefix>_<tag>*`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub dir: PathBuf,
    pub xml: PathBuf,
    pub json: PathBuf,
    pub crf_html: PathBuf,
    pub acrf_html: PathBuf,
    pub zip: PathBuf,
}

impl OutputPaths {
    pub fn new(crf_path: &Path, form_id: &str, prefix: &str, version: OdmVersion) -> Self {
        let dir = crf_path.join(form_id);
        let stem = format!("{prefix}_{}", version.file_tag());
        Self {
            xml: dir.join(format!("{stem}.xml")),
            json: dir.join(format!("{stem}.json")),
            crf_html: dir.join(format!("{stem}_{}.html", Rendition::Plain.file_suffix())),
            acrf_html: dir.join(format!("{stem}_{}.html", Rendition::Annotated.file_suffix())),
            zip: dir.join(format!("{stem}.zip")),
            dir,
        }
    }

    pub fn html(&self, rendition: Rendition) -> &Path {
        match rendition {
            Rendition::Plain => &self.crf_html,
            Rendition::Annotated => &self.acrf_html,
        }
    }
}

/// Definition counts of a built document.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DocumentCounts {
    pub sections: usize,
    pub concepts: usize,
    pub items: usize,
    pub codelists: usize,
    pub units: usize,
}

impl DocumentCounts {
    pub fn from_odm(odm: &Odm) -> Self {
        let mdv = odm.metadata();
        let groups_of = |kind: ItemGroupType| {
            mdv.item_group_defs
                .iter()
                .filter(|group| group.group_type == Some(kind))
                .count()
        };
        let (sections, concepts) = match odm.odm_version {
            // 1.3.2 item groups are the flattened sections.
            OdmVersion::V1_3_2 => (mdv.item_group_defs.len(), 0),
            OdmVersion::V2_0 => (
                groups_of(ItemGroupType::Section),
                groups_of(ItemGroupType::Concept),
            ),
        };
        Self {
            sections,
            concepts,
            items: mdv.item_defs.len(),
            codelists: mdv.code_lists.len(),
            units: odm.study.measurement_units.len(),
        }
    }
}

/// Outcome of one pipeline run.
#[derive(Debug)]
pub struct RunOutcome {
    pub form_id: String,
    pub form_name: String,
    pub version: OdmVersion,
    pub counts: DocumentCounts,
    /// Every file written, in write order.
    pub outputs: Vec<PathBuf>,
    pub archive: Option<PathBuf>,
    pub references: Option<ValidationReport>,
    pub schema: Option<SchemaOutcome>,
}

/// Run the whole pipeline for one form.
pub fn run(config: &Config, options: &BuildOptions) -> Result<RunOutcome> {
    run_at(config, options, Utc::now())
}

/// [`run`] with a fixed creation timestamp.
pub fn run_at(
    config: &Config,
    options: &BuildOptions,
    created_at: DateTime<Utc>,
) -> Result<RunOutcome> {
    let version = options.version;
    let form_span = info_span!("form", form_id = %options.form_id, version = %version);
    let _form_guard = form_span.enter();
    let start = Instant::now();

    // ========================================================================
    // Stage 1: Load
    // ========================================================================
    let sources = FormSources::load(&config.source_paths()).context("load metadata tables")?;
    let metadata = load_form_metadata(&sources, &options.form_id)
        .with_context(|| format!("load form {}", options.form_id))?;

    // ========================================================================
    // Stage 2: Build
    // ========================================================================
    let policy = config.policy.hidden_rows_for(version);
    let built = build(version, policy, &metadata)
        .with_context(|| format!("build form {}", options.form_id))?;
    let odm = assemble(built, &config.document, version, created_at);
    let counts = DocumentCounts::from_odm(&odm);
    info!(
        sections = counts.sections,
        concepts = counts.concepts,
        items = counts.items,
        codelists = counts.codelists,
        units = counts.units,
        "document built"
    );

    // ========================================================================
    // Stage 3: Write
    // ========================================================================
    let prefix = options
        .prefix
        .as_deref()
        .map_or_else(|| normalize_prefix(&options.form_id), normalize_prefix);
    let paths = OutputPaths::new(&config.paths.crf_path, &options.form_id, &prefix, version);
    write_odm_xml(&paths.xml, &odm).context("write ODM XML")?;
    write_odm_json(&paths.json, &odm).context("write ODM JSON")?;
    let mut outputs = vec![paths.xml.clone(), paths.json.clone()];
    info!(dir = %paths.dir.display(), "ODM documents written");

    // ========================================================================
    // Stage 4: Validate
    // ========================================================================
    let (references, schema) = if options.validate {
        let references = check_references(&odm);
        log_report(&references);
        let schema = validate_schema(config, version, &paths.xml);
        (Some(references), schema)
    } else {
        debug!("validation skipped");
        (None, None)
    };

    // ========================================================================
    // Stage 5: Render
    // ========================================================================
    if options.html {
        outputs.extend(render_html(config, version, &odm, &paths)?);
    }

    // ========================================================================
    // Stage 6: Package
    // ========================================================================
    let archive = if options.zip {
        let entries: Vec<ArchiveEntry> = outputs.iter().map(ArchiveEntry::from_path).collect();
        update_archive(&paths.zip, &entries).context("update archive")?;
        Some(paths.zip.clone())
    } else {
        None
    };

    info!(
        outputs = outputs.len(),
        elapsed_ms = start.elapsed().as_millis(),
        "form complete"
    );
    Ok(RunOutcome {
        form_id: options.form_id.clone(),
        form_name: metadata.form_name,
        version,
        counts,
        outputs,
        archive,
        references,
        schema,
    })
}

fn log_report(report: &ValidationReport) {
    for issue in &report.issues {
        let oid = issue.oid.as_deref().unwrap_or("-");
        match issue.severity {
            IssueSeverity::Error => {
                warn!(code = %issue.code, oid, "{}", issue.message);
            }
            IssueSeverity::Warning => {
                debug!(code = %issue.code, oid, "{}", issue.message);
            }
        }
    }
    if report.is_clean() {
        info!(source = %report.source, "all references resolve");
    } else {
        warn!(
            source = %report.source,
            errors = report.error_count(),
            warnings = report.warning_count(),
            "reference check found issues"
        );
    }
}

fn validate_schema(config: &Config, version: OdmVersion, xml_path: &Path) -> Option<SchemaOutcome> {
    let Some(schema_config) = &config.schema else {
        debug!("no schema configured");
        return None;
    };
    let Some(schema) = schema_config.schema_for(version) else {
        debug!(version = %version, "no schema configured for this release");
        return None;
    };
    let outcome = SchemaValidator::new(&schema_config.validator, schema).validate(xml_path);
    match &outcome {
        SchemaOutcome::Valid => info!(schema = %schema.display(), "schema validation passed"),
        SchemaOutcome::Invalid { details } => {
            warn!(schema = %schema.display(), %details, "schema validation failed");
        }
        SchemaOutcome::Unavailable { reason } => {
            warn!(%reason, "schema validation skipped");
        }
    }
    Some(outcome)
}

/// Write both renditions. A configured stylesheet is tried first; when the
/// external processor fails the built-in renderer takes over.
fn render_html(
    config: &Config,
    version: OdmVersion,
    odm: &Odm,
    paths: &OutputPaths,
) -> Result<Vec<PathBuf>> {
    let xslt = config.stylesheet.as_ref().and_then(|stylesheet| {
        stylesheet
            .stylesheet_for(version)
            .map(|path| XsltRenderer::new(&stylesheet.processor, path))
    });
    let mut written = Vec::with_capacity(Rendition::ALL.len());
    for rendition in Rendition::ALL {
        let output = paths.html(rendition);
        if let Some(xslt) = &xslt {
            match write_rendition(xslt, odm, &paths.xml, rendition, output) {
                Ok(()) => {
                    written.push(output.to_path_buf());
                    continue;
                }
                Err(error) => {
                    warn!(
                        error = %format!("{error:#}"),
                        "stylesheet rendering failed, using built-in renderer"
                    );
                }
            }
        }
        write_rendition(&NativeRenderer, odm, &paths.xml, rendition, output)
            .with_context(|| format!("render {}", output.display()))?;
        written.push(output.to_path_buf());
    }
    info!(files = written.len(), "HTML renditions written");
    Ok(written)
}
