//! Straight-line transformation from extracted rows to the cmft table.
//!
//! `group -> link -> append -> flatten -> purge`, with no I/O. Any error
//! aborts the whole run.

use tracing::info;

use crate::domain::CONTROL_MARK;
use crate::error::CmftError;
use crate::isolate::{flatten, group_isolates, link_controls, purge};
use crate::table::Table;

#[derive(Debug, Clone)]
pub struct PipelineOptions {
    pub purge: bool,
    pub control_mark: String,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            purge: false,
            control_mark: CONTROL_MARK.to_string(),
        }
    }
}

/// Row-major working table of `sample, mark, filename` plus the
/// single-column URL manifest aligned with it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedSources {
    pub rows: Table,
    pub manifest: Table,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PipelineStats {
    pub rows_in: usize,
    pub isolates: usize,
    pub samples_without_control: usize,
    pub purged_rows: usize,
}

#[derive(Debug, Clone)]
pub struct CmftOutput {
    pub cmft: Table,
    pub manifest: Option<Table>,
    pub stats: PipelineStats,
}

/// Combines the independently extracted URL and row columns once both are
/// complete, checking that every column has one entry per URL.
pub fn join_extraction(
    urls: Vec<String>,
    columns: Vec<Vec<String>>,
) -> Result<ExtractedSources, CmftError> {
    if let Some(misaligned) = columns.iter().find(|column| column.len() != urls.len()) {
        return Err(CmftError::ExtractionMisaligned {
            urls: urls.len(),
            rows: misaligned.len(),
        });
    }
    Ok(ExtractedSources {
        rows: Table::from_columns(columns)?,
        manifest: Table::from_columns(vec![urls])?,
    })
}

/// Groups `rows` by sample, links each sample's control filename as a
/// trailing column, flattens and optionally purges.
pub fn build_cmft(rows: Table, options: &PipelineOptions) -> Result<(Table, PipelineStats), CmftError> {
    let rows_in = rows.len();

    let mut isolates = group_isolates(rows);
    link_controls(&mut isolates, &options.control_mark);
    let samples_without_control = isolates.iter().filter(|isolate| !isolate.has_control()).count();
    let isolate_count = isolates.len();

    let flat = flatten(isolates)?;
    debug_assert_eq!(flat.len(), rows_in);
    let cmft = purge(flat, options.purge);

    let stats = PipelineStats {
        rows_in,
        isolates: isolate_count,
        samples_without_control,
        purged_rows: rows_in - cmft.len(),
    };
    info!(
        rows_in,
        rows_out = cmft.len(),
        isolates = isolate_count,
        samples_without_control,
        "built cmft"
    );
    Ok((cmft, stats))
}

/// Runs the pipeline over extracted sources; the manifest passes through ungrouped.
pub fn run(sources: ExtractedSources, options: &PipelineOptions) -> Result<CmftOutput, CmftError> {
    let (cmft, stats) = build_cmft(sources.rows, options)?;
    Ok(CmftOutput {
        cmft,
        manifest: Some(sources.manifest),
        stats,
    })
}
