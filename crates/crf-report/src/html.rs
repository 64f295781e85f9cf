//! HTML renditions of a CRF.
//!
//! Two renditions exist: a plain CRF and an annotated CRF (aCRF) that also
//! shows the SDTM and CDASH mappings of every field. Rendering goes through
//! [`CrfRenderer`]: [`XsltRenderer`] runs an XSLT stylesheet with an
//! external processor, [`NativeRenderer`] builds the page directly from the
//! document.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use crf_model::{ItemDef, ItemGroupDef, LocalizedText, MetaDataVersion, Odm};
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::debug;

use crate::common::write_output;

const STYLE: &str = "
body { font-family: Arial, sans-serif; margin: 20px; }
.form-section { margin: 20px 0; padding: 10px; border: 1px solid #ccc; }
.item-group { margin: 10px 0; padding: 5px; background-color: #f9f9f9; }
.item { margin: 5px 0; }
.instruction { font-style: italic; }
.annotation { background-color: LightYellow; border: 1px solid #ccc; field-sizing: content; }
label { display: inline-block; min-width: 200px; }
";

/// Alias contexts shown in the annotated rendition.
const ANNOTATION_CONTEXTS: [&str; 2] = ["SDTM", "CDASH"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rendition {
    Plain,
    Annotated,
}

impl Rendition {
    pub const ALL: [Rendition; 2] = [Rendition::Plain, Rendition::Annotated];

    /// File name suffix, e.g. `vs1_odmv1-3-2_crf.html`.
    pub fn file_suffix(&self) -> &'static str {
        match self {
            Rendition::Plain => "crf",
            Rendition::Annotated => "acrf",
        }
    }

    pub fn shows_annotations(&self) -> bool {
        matches!(self, Rendition::Annotated)
    }
}

pub trait CrfRenderer {
    fn name(&self) -> &'static str;

    /// Render one rendition. `xml_path` is the ODM XML already written for
    /// `odm`.
    fn render(&self, odm: &Odm, xml_path: &Path, rendition: Rendition) -> Result<String>;
}

/// Render and write one rendition to `output_path`.
pub fn write_rendition(
    renderer: &dyn CrfRenderer,
    odm: &Odm,
    xml_path: &Path,
    rendition: Rendition,
    output_path: &Path,
) -> Result<()> {
    let html = renderer
        .render(odm, xml_path, rendition)
        .with_context(|| format!("{} rendering of {}", renderer.name(), xml_path.display()))?;
    write_output(output_path, &html)?;
    debug!(
        renderer = renderer.name(),
        rendition = rendition.file_suffix(),
        path = %output_path.display(),
        "HTML rendition written"
    );
    Ok(())
}

/// Runs an XSLT 1.0 stylesheet through an external processor (`xsltproc`).
/// The plain rendition passes `displayAnnotations=0`.
#[derive(Debug, Clone)]
pub struct XsltRenderer {
    pub processor: String,
    pub stylesheet: PathBuf,
}

impl XsltRenderer {
    pub fn new(processor: impl Into<String>, stylesheet: impl Into<PathBuf>) -> Self {
        Self {
            processor: processor.into(),
            stylesheet: stylesheet.into(),
        }
    }
}

impl CrfRenderer for XsltRenderer {
    fn name(&self) -> &'static str {
        "xslt"
    }

    fn render(&self, _odm: &Odm, xml_path: &Path, rendition: Rendition) -> Result<String> {
        if !self.stylesheet.exists() {
            bail!("stylesheet not found: {}", self.stylesheet.display());
        }
        let mut command = Command::new(&self.processor);
        if !rendition.shows_annotations() {
            command.args(["--param", "displayAnnotations", "0"]);
        }
        let output = command
            .arg(&self.stylesheet)
            .arg(xml_path)
            .output()
            .with_context(|| format!("failed to run {}", self.processor))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            bail!("{} exited with {}: {}", self.processor, output.status, stderr.trim());
        }
        String::from_utf8(output.stdout).context("XSLT output is not valid UTF-8")
    }
}

/// Built-in renderer. Walks the form hierarchy from the form root through
/// nested item groups down to the items.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeRenderer;

impl CrfRenderer for NativeRenderer {
    fn name(&self) -> &'static str {
        "native"
    }

    fn render(&self, odm: &Odm, _xml_path: &Path, rendition: Rendition) -> Result<String> {
        render_crf_html(odm, rendition)
    }
}

pub fn render_crf_html(odm: &Odm, rendition: Rendition) -> Result<String> {
    let mut buffer = Vec::new();
    let mut html = Writer::new_with_indent(&mut buffer, b' ', 2);
    let mdv = odm.metadata();
    let (_, form_name, section_refs) = odm
        .form_root()
        .context("document has no form definition")?;
    let form_aliases = mdv
        .form_defs
        .first()
        .map(|form| form.aliases.as_slice())
        .or_else(|| {
            odm.form_root()
                .and_then(|(oid, _, _)| mdv.find_item_group(oid))
                .map(|group| group.aliases.as_slice())
        })
        .unwrap_or_default();

    html.write_event(Event::DocType(BytesText::from_escaped("html")))?;
    start(&mut html, "html", &[("lang", "en")])?;
    start(&mut html, "head", &[])?;
    html.write_event(Event::Empty(element("meta", &[("charset", "utf-8")])))?;
    text_element(&mut html, "title", &[], &format!("{form_name} CRF"))?;
    text_element(&mut html, "style", &[], STYLE)?;
    end(&mut html, "head")?;

    start(&mut html, "body", &[])?;
    text_element(&mut html, "h1", &[], form_name)?;
    text_element(
        &mut html,
        "p",
        &[("class", "study")],
        &format!("Study: {}", odm.study.global_variables.study_name),
    )?;
    text_element(
        &mut html,
        "p",
        &[("class", "metadata-version")],
        &format!("Metadata Version: {}", mdv.name),
    )?;
    if rendition.shows_annotations() {
        for alias in form_aliases {
            text_element(&mut html, "p", &[("class", "annotation")], &alias.name)?;
        }
    }

    for section_ref in section_refs {
        let Some(section) = mdv.find_item_group(&section_ref.item_group_oid) else {
            continue;
        };
        start(&mut html, "div", &[("class", "form-section")])?;
        text_element(&mut html, "h2", &[], &section.name)?;
        render_group_body(&mut html, odm, mdv, section, rendition)?;
        end(&mut html, "div")?;
    }

    end(&mut html, "body")?;
    end(&mut html, "html")?;
    drop(html);
    String::from_utf8(buffer).context("rendered HTML is not valid UTF-8")
}

fn render_group_body<W: Write>(
    html: &mut Writer<W>,
    odm: &Odm,
    mdv: &MetaDataVersion,
    group: &ItemGroupDef,
    rendition: Rendition,
) -> Result<()> {
    for alias in &group.aliases {
        if alias.context == "formSectionCompletionInstruction" {
            text_element(html, "p", &[("class", "instruction")], &alias.name)?;
        } else if rendition.shows_annotations() {
            text_element(html, "p", &[("class", "annotation")], &alias.name)?;
        }
    }
    for child_ref in &group.item_group_refs {
        let Some(child) = mdv.find_item_group(&child_ref.item_group_oid) else {
            continue;
        };
        start(html, "div", &[("class", "item-group")])?;
        text_element(html, "h3", &[], &child.name)?;
        render_group_body(html, odm, mdv, child, rendition)?;
        end(html, "div")?;
    }
    if !group.item_refs.is_empty() {
        start(html, "div", &[("class", "item-group")])?;
        for item_ref in &group.item_refs {
            if let Some(item) = mdv.find_item(&item_ref.item_oid) {
                render_item(html, odm, mdv, item, rendition)?;
            }
        }
        end(html, "div")?;
    }
    Ok(())
}

fn render_item<W: Write>(
    html: &mut Writer<W>,
    odm: &Odm,
    mdv: &MetaDataVersion,
    item: &ItemDef,
    rendition: Rendition,
) -> Result<()> {
    start(html, "div", &[("class", "item")])?;
    let question = item.question.as_ref().and_then(LocalizedText::text);
    let prompt = item
        .prompt
        .as_ref()
        .and_then(LocalizedText::text)
        .or_else(|| item.alias("prompt"));
    if let Some(question) = question {
        text_element(html, "label", &[("for", item.oid.as_str())], question)?;
    }
    if let Some(prompt) = prompt {
        text_element(html, "label", &[("for", item.oid.as_str())], prompt)?;
    }
    if question.is_none() && prompt.is_none() {
        text_element(html, "label", &[("for", item.oid.as_str())], &item.name)?;
    }

    let code_list = item
        .code_list_ref
        .as_ref()
        .and_then(|code_list_ref| mdv.find_code_list(&code_list_ref.code_list_oid));
    match code_list {
        Some(code_list) => {
            start(
                html,
                "select",
                &[("id", item.oid.as_str()), ("name", item.oid.as_str())],
            )?;
            text_element(html, "option", &[("value", "")], "--select--")?;
            for (display, value) in code_list.options() {
                text_element(html, "option", &[("value", value)], display)?;
            }
            end(html, "select")?;
        }
        None => {
            html.write_event(Event::Empty(element(
                "input",
                &[
                    ("type", "text"),
                    ("id", item.oid.as_str()),
                    ("name", item.oid.as_str()),
                    ("placeholder", item.name.as_str()),
                ],
            )))?;
        }
    }

    if let Some(unit_ref) = &item.measurement_unit_ref
        && let Some(unit) = odm
            .study
            .measurement_units
            .iter()
            .find(|unit| unit.oid == unit_ref.measurement_unit_oid)
    {
        text_element(html, "span", &[("class", "unit")], &unit.name)?;
    }

    if rendition.shows_annotations() {
        for alias in item
            .aliases
            .iter()
            .filter(|alias| ANNOTATION_CONTEXTS.contains(&alias.context.as_str()))
        {
            let name = format!("{}.{}", item.oid, alias.context);
            let placeholder = format!("{}: {}", alias.context, alias.name);
            html.write_event(Event::Empty(element(
                "input",
                &[
                    ("type", "text"),
                    ("class", "annotation"),
                    ("name", name.as_str()),
                    ("placeholder", placeholder.as_str()),
                    ("readonly", "readonly"),
                ],
            )))?;
        }
    }
    end(html, "div")?;
    Ok(())
}

fn element<'a>(name: &'a str, attributes: &[(&str, &str)]) -> BytesStart<'a> {
    let mut node = BytesStart::new(name);
    for attribute in attributes {
        node.push_attribute(*attribute);
    }
    node
}

fn start<W: Write>(html: &mut Writer<W>, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
    html.write_event(Event::Start(element(name, attributes)))?;
    Ok(())
}

fn end<W: Write>(html: &mut Writer<W>, name: &str) -> Result<()> {
    html.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

fn text_element<W: Write>(
    html: &mut Writer<W>,
    name: &str,
    attributes: &[(&str, &str)],
    text: &str,
) -> Result<()> {
    start(html, name, attributes)?;
    html.write_event(Event::Text(BytesText::new(text)))?;
    end(html, name)
}
