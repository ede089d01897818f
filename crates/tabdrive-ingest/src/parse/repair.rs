//! In-memory archive repair for workbooks with corrupt style tables
//!
//! A known corruption pattern leaves `cellStyleXfs` records that the
//! standards-compliant reader refuses to parse. Rewriting the style part
//! with an emptied `cellStyleXfs` element is enough to make the rest of
//! the workbook readable again; every other archive entry is copied
//! through untouched.

use crate::error::Result;
use quick_xml::events::{BytesStart, Event};
use quick_xml::{Reader, Writer};
use std::io::{Cursor, Read, Write};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

const STYLES_PART: &str = "xl/styles.xml";

/// Rebuild the archive with a neutralized style table
pub fn repair_styles(bytes: &[u8]) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(bytes.to_vec()))?;
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for index in 0..archive.len() {
        let mut entry = archive.by_index(index)?;
        let name = entry.name().to_string();

        if entry.is_dir() {
            writer.add_directory(name, options)?;
            continue;
        }

        let mut data = Vec::new();
        entry.read_to_end(&mut data)?;

        if name == STYLES_PART {
            // an unparseable style part is copied through unchanged; the
            // next strategy in the chain deals with it
            data = clear_cell_style_xfs(&data).unwrap_or(data);
        }

        writer.start_file(name, options)?;
        writer.write_all(&data)?;
    }

    Ok(writer.finish()?.into_inner())
}

/// Replace the `cellStyleXfs` element and its children with an empty
/// element declaring `count="0"`
fn clear_cell_style_xfs(xml: &[u8]) -> Result<Vec<u8>> {
    let mut reader = Reader::from_reader(xml);
    let mut writer = Writer::new(Cursor::new(Vec::new()));
    let mut buf = Vec::new();
    let mut skip_buf = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Eof => break,
            Event::Start(e) if e.local_name().as_ref() == b"cellStyleXfs" => {
                let end = e.to_end().into_owned();
                reader.read_to_end_into(end.name(), &mut skip_buf)?;
                writer.write_event(Event::Empty(emptied_element()))?;
            },
            Event::Empty(e) if e.local_name().as_ref() == b"cellStyleXfs" => {
                writer.write_event(Event::Empty(emptied_element()))?;
            },
            event => writer.write_event(event)?,
        }
        buf.clear();
    }

    Ok(writer.into_inner().into_inner())
}

fn emptied_element() -> BytesStart<'static> {
    let mut element = BytesStart::new("cellStyleXfs");
    element.push_attribute(("count", "0"));
    element
}
