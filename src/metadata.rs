use std::io::Read;
use std::path::Path;

use serde::Serialize;
use tracing::debug;

use crate::config::ColumnEntry;
use crate::error::CmftError;
use crate::table::{Row, Table};

/// One line of the per-assay metadata export.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MetadataRecord {
    pub sample: String,
    pub url: String,
    pub mark: String,
}

/// Reads the metadata CSV at `path`, skipping its header line.
pub fn read_records(path: &Path, columns: ColumnEntry) -> Result<Vec<MetadataRecord>, CmftError> {
    let file =
        std::fs::File::open(path).map_err(|_| CmftError::MetadataRead(path.to_path_buf()))?;
    let records = parse_records(file, columns)?;
    debug!(path = %path.display(), records = records.len(), "read metadata");
    Ok(records)
}

pub fn parse_records<R: Read>(
    reader: R,
    columns: ColumnEntry,
) -> Result<Vec<MetadataRecord>, CmftError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut records = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| CmftError::MetadataParse {
            line: err.position().map(|pos| pos.line()).unwrap_or(0),
            message: err.to_string(),
        })?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        let field = |column: usize| {
            record
                .get(column)
                .map(|value| value.trim().to_string())
                .ok_or(CmftError::MissingColumn { line, column })
        };
        records.push(MetadataRecord {
            sample: field(columns.sample)?,
            url: field(columns.url)?,
            mark: field(columns.mark)?,
        });
    }
    Ok(records)
}

/// Reads a headerless `sample, mark, filename` table as produced by an
/// earlier extraction.
pub fn read_rows(path: &Path, delimiter: u8) -> Result<Table, CmftError> {
    let file =
        std::fs::File::open(path).map_err(|_| CmftError::MetadataRead(path.to_path_buf()))?;
    parse_rows(file, delimiter)
}

pub fn parse_rows<R: Read>(reader: R, delimiter: u8) -> Result<Table, CmftError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .delimiter(delimiter)
        .from_reader(reader);

    let mut table = Table::new();
    for result in reader.records() {
        let record = result.map_err(|err| CmftError::MetadataParse {
            line: err.position().map(|pos| pos.line()).unwrap_or(0),
            message: err.to_string(),
        })?;
        let line = record.position().map(|pos| pos.line()).unwrap_or(0);
        if record.len() < 3 {
            return Err(CmftError::MissingColumn {
                line,
                column: record.len(),
            });
        }
        table.push(Row::assay(&record[0], &record[1], &record[2]))?;
    }
    Ok(table)
}
