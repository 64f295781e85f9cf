//! ODM JSON output. Attribute and element names match the XML rendition.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use crf_model::Odm;
use tracing::debug;

use crate::common::ensure_parent_dir;

pub fn odm_json_string(odm: &Odm) -> Result<String> {
    serde_json::to_string_pretty(odm).context("serialize ODM JSON")
}

pub fn write_odm_json(output_path: &Path, odm: &Odm) -> Result<()> {
    ensure_parent_dir(output_path)?;
    let file =
        File::create(output_path).with_context(|| format!("create {}", output_path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, odm)
        .with_context(|| format!("write {}", output_path.display()))?;
    writer
        .flush()
        .with_context(|| format!("flush {}", output_path.display()))?;
    debug!(path = %output_path.display(), "ODM JSON written");
    Ok(())
}
