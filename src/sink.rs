use std::fs;
use std::io::Write;

use camino::{Utf8Path, Utf8PathBuf};
use tempfile::NamedTempFile;
use tracing::debug;

use crate::error::CmftError;
use crate::table::Table;

/// Fully written temp file next to its destination, waiting for [`StagedFile::commit`].
/// Dropping it without committing removes the temp file.
#[derive(Debug)]
pub struct StagedFile {
    temp: NamedTempFile,
    destination: Utf8PathBuf,
    rows: usize,
}

impl StagedFile {
    /// Replaces the destination with the staged content.
    pub fn commit(self) -> Result<Utf8PathBuf, CmftError> {
        self.temp
            .persist(self.destination.as_std_path())
            .map_err(|err| CmftError::Filesystem(err.to_string()))?;
        debug!(path = %self.destination, rows = self.rows, "wrote table");
        Ok(self.destination)
    }
}

/// Writes `table` as headerless delimited text into a temp file in the
/// directory of `path`. Nothing is visible at `path` until the commit.
pub fn stage_table(path: &Utf8Path, table: &Table, delimiter: u8) -> Result<StagedFile, CmftError> {
    let parent = match path.parent() {
        Some(parent) if !parent.as_str().is_empty() => parent,
        _ => Utf8Path::new("."),
    };
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| CmftError::Filesystem(err.to_string()))?;
    let mut temp = tempfile::Builder::new()
        .prefix("kira-cmft")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| CmftError::Filesystem(err.to_string()))?;

    {
        let mut writer = csv::WriterBuilder::new()
            .has_headers(false)
            .delimiter(delimiter)
            .from_writer(temp.as_file_mut());
        for row in table {
            writer
                .write_record(row.fields())
                .map_err(|err| CmftError::TableWrite(err.to_string()))?;
        }
        writer
            .flush()
            .map_err(|err| CmftError::TableWrite(err.to_string()))?;
    }
    temp.as_file_mut()
        .flush()
        .map_err(|err| CmftError::Filesystem(err.to_string()))?;

    Ok(StagedFile {
        temp,
        destination: path.to_path_buf(),
        rows: table.len(),
    })
}

/// Stages one URL per line, the input format of `wget -i`.
pub fn stage_manifest(path: &Utf8Path, manifest: &Table) -> Result<StagedFile, CmftError> {
    stage_table(path, manifest, b'\t')
}

/// Writes `table` to `path`, replacing it atomically.
pub fn write_table(path: &Utf8Path, table: &Table, delimiter: u8) -> Result<(), CmftError> {
    stage_table(path, table, delimiter)?.commit()?;
    Ok(())
}
