use std::path::Path;
use std::time::{Duration, Instant};

use serde::Serialize;

use crate::config::ResolvedConfig;
use crate::error::CmftError;
use crate::geo::{ListingClient, extract_sources};
use crate::metadata;
use crate::pipeline::{self, CmftOutput, PipelineOptions};
use crate::sink::{stage_manifest, stage_table};

#[derive(Debug, Clone, Serialize)]
pub struct BuildResult {
    pub rows_in: usize,
    pub rows_out: usize,
    pub isolates: usize,
    pub samples_without_control: usize,
    pub purged_rows: usize,
    pub cmft_path: String,
    pub manifest_path: Option<String>,
    pub manifest_urls: Option<usize>,
    pub generated_at: String,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

#[derive(Clone)]
pub struct App<G: ListingClient> {
    listing: G,
}

impl<G: ListingClient> App<G> {
    pub fn new(listing: G) -> Self {
        Self { listing }
    }

    /// Reads the metadata export, lists every sample's supplementary files,
    /// builds the cmft and writes it next to the download manifest.
    pub fn build(
        &self,
        metadata_path: &Path,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<BuildResult, CmftError> {
        let start = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Read; {}", metadata_path.display()),
            elapsed: None,
        });
        let records = metadata::read_records(metadata_path, config.columns)?;

        let sources = extract_sources(
            &records,
            &self.listing,
            &config.host,
            &config.bed_suffix,
            config.workers,
            sink,
        )?;

        sink.event(ProgressEvent {
            message: format!("phase=Group; {} rows", sources.rows.len()),
            elapsed: Some(start.elapsed()),
        });
        let output = pipeline::run(sources, &pipeline_options(config))?;
        self.write(output, config, sink, start)
    }

    /// Rebuilds the cmft from an already extracted `sample, mark, filename`
    /// table without touching the network. No manifest is written.
    pub fn group(
        &self,
        rows_path: &Path,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
    ) -> Result<BuildResult, CmftError> {
        let start = Instant::now();
        sink.event(ProgressEvent {
            message: format!("phase=Read; {}", rows_path.display()),
            elapsed: None,
        });
        let rows = metadata::read_rows(rows_path, config.delimiter)?;

        sink.event(ProgressEvent {
            message: format!("phase=Group; {} rows", rows.len()),
            elapsed: Some(start.elapsed()),
        });
        let (cmft, stats) = pipeline::build_cmft(rows, &pipeline_options(config))?;
        let output = CmftOutput {
            cmft,
            manifest: None,
            stats,
        };
        self.write(output, config, sink, start)
    }

    fn write(
        &self,
        output: CmftOutput,
        config: &ResolvedConfig,
        sink: &dyn ProgressSink,
        start: Instant,
    ) -> Result<BuildResult, CmftError> {
        sink.event(ProgressEvent {
            message: format!("phase=Write; {}", config.out_dir),
            elapsed: Some(start.elapsed()),
        });
        // Nothing is committed until every output is staged.
        let staged_cmft = stage_table(&config.cmft_path(), &output.cmft, config.delimiter)?;
        let staged_manifest = output
            .manifest
            .as_ref()
            .map(|manifest| stage_manifest(&config.manifest_path(), manifest))
            .transpose()?;

        let cmft_path = staged_cmft.commit()?;
        let manifest_path = match staged_manifest {
            Some(staged) => Some(staged.commit()?.to_string()),
            None => None,
        };

        sink.event(ProgressEvent {
            message: "done".to_string(),
            elapsed: Some(start.elapsed()),
        });

        Ok(BuildResult {
            rows_in: output.stats.rows_in,
            rows_out: output.cmft.len(),
            isolates: output.stats.isolates,
            samples_without_control: output.stats.samples_without_control,
            purged_rows: output.stats.purged_rows,
            cmft_path: cmft_path.to_string(),
            manifest_path,
            manifest_urls: output.manifest.as_ref().map(|manifest| manifest.len()),
            generated_at: iso_timestamp(),
        })
    }
}

fn pipeline_options(config: &ResolvedConfig) -> PipelineOptions {
    PipelineOptions {
        purge: config.purge,
        control_mark: config.control_mark.clone(),
    }
}

fn iso_timestamp() -> String {
    chrono::Utc::now().to_rfc3339()
}
