//! Record file writers
//!
//! CSV with a UTF-8 byte order mark and a fixed header row, a plain list of
//! canonical URLs, and a JSON document of a whole collection.

use crate::catalog::{Record, RECORD_COLUMNS};
use crate::error::{Error, Result};
use crate::pagination::Collection;
use std::borrow::Cow;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Byte order mark so spreadsheet tools detect UTF-8
pub const UTF8_BOM: &str = "\u{feff}";

/// Write records as CSV, returning the number of rows written
pub fn write_csv(path: impl AsRef<Path>, records: &[Record]) -> Result<usize> {
    let mut writer = create(path.as_ref())?;

    let header = RECORD_COLUMNS.join(",");
    write_line(&mut writer, &format!("{UTF8_BOM}{header}"))?;

    for record in records {
        let line = record
            .fields()
            .iter()
            .map(|field| escape_csv_field(field))
            .collect::<Vec<_>>()
            .join(",");
        write_line(&mut writer, &line)?;
    }

    finish(writer)?;
    Ok(records.len())
}

/// Write one canonical URL per line, returning the number of lines written
pub fn write_url_list(path: impl AsRef<Path>, records: &[Record]) -> Result<usize> {
    let mut writer = create(path.as_ref())?;
    for record in records {
        write_line(&mut writer, &record.url)?;
    }
    finish(writer)?;
    Ok(records.len())
}

/// Write a collection as a pretty-printed JSON document
pub fn write_json(path: impl AsRef<Path>, collection: &Collection) -> Result<usize> {
    let mut writer = create(path.as_ref())?;
    serde_json::to_writer_pretty(&mut writer, collection)?;
    write_line(&mut writer, "")?;
    finish(writer)?;
    Ok(collection.len())
}

/// Quote a field if it contains a delimiter, quote or line break
pub fn escape_csv_field(value: &str) -> Cow<'_, str> {
    if value.contains([',', '"', '\n', '\r']) {
        Cow::Owned(format!("\"{}\"", value.replace('"', "\"\"")))
    } else {
        Cow::Borrowed(value)
    }
}

fn create(path: &Path) -> Result<BufWriter<File>> {
    let file = File::create(path)
        .map_err(|e| Error::output(format!("Failed to create {}: {e}", path.display())))?;
    Ok(BufWriter::new(file))
}

fn write_line(writer: &mut BufWriter<File>, line: &str) -> Result<()> {
    writeln!(writer, "{line}").map_err(|e| Error::output(format!("Failed to write line: {e}")))
}

fn finish(mut writer: BufWriter<File>) -> Result<()> {
    writer
        .flush()
        .map_err(|e| Error::output(format!("Failed to flush output: {e}")))
}
