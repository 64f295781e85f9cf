//! Shared XML helpers and output file handling.

use std::fs;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use crf_model::LocalizedText;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

/// XLink namespace, declared on ODM documents.
pub const XLINK_NS: &str = "http://www.w3.org/1999/xlink";

/// Write a simple text element.
pub fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Write a wrapper element (`Description`, `Question`, ...) holding one
/// `TranslatedText` per translation.
pub fn write_translated_text<W: Write>(
    writer: &mut Writer<W>,
    wrapper: &str,
    text: &LocalizedText,
) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(wrapper)))?;
    for translation in &text.translations {
        let mut node = BytesStart::new("TranslatedText");
        node.push_attribute(("xml:lang", translation.lang.as_str()));
        if let Some(content_type) = &translation.content_type {
            node.push_attribute(("Type", content_type.as_str()));
        }
        writer.write_event(Event::Start(node))?;
        writer.write_event(Event::Text(BytesText::new(&translation.content)))?;
        writer.write_event(Event::End(BytesEnd::new("TranslatedText")))?;
    }
    writer.write_event(Event::End(BytesEnd::new(wrapper)))?;
    Ok(())
}

/// Create the parent directory of an output file when needed.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).with_context(|| format!("create {}", parent.display()))?;
    }
    Ok(())
}

/// Write a whole output file, creating its directory first.
pub fn write_output(path: &Path, contents: &str) -> Result<()> {
    ensure_parent_dir(path)?;
    fs::write(path, contents).with_context(|| format!("write {}", path.display()))
}
