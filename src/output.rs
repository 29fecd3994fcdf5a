use std::io::{self, Write};

use serde::Serialize;

use crate::app::{BuildResult, ProgressEvent, ProgressSink};

#[derive(Debug, Clone, Copy)]
pub enum OutputMode {
    Console,
    Json,
}

pub struct JsonOutput;

impl JsonOutput {
    pub fn print_build(result: &BuildResult) -> io::Result<()> {
        Self::print_json(result)
    }

    fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
        let json = serde_json::to_string_pretty(value).map_err(io::Error::other)?;
        let mut stdout = io::stdout();
        stdout.write_all(json.as_bytes())?;
        stdout.write_all(b"\n")?;
        Ok(())
    }
}

impl ProgressSink for JsonOutput {
    fn event(&self, _event: ProgressEvent) {}
}

/// Progress lines on stderr, summary on stdout.
pub struct ConsoleOutput;

impl ConsoleOutput {
    pub fn print_build(result: &BuildResult) -> io::Result<()> {
        let mut stdout = io::stdout();
        writeln!(
            stdout,
            "cmft: {} rows from {} samples -> {}",
            result.rows_out, result.isolates, result.cmft_path
        )?;
        if let (Some(path), Some(urls)) = (&result.manifest_path, result.manifest_urls) {
            writeln!(stdout, "manifest: {urls} urls -> {path}")?;
        }
        if result.samples_without_control > 0 {
            writeln!(
                stdout,
                "samples without control: {} ({} rows purged)",
                result.samples_without_control, result.purged_rows
            )?;
        }
        Ok(())
    }
}

impl ProgressSink for ConsoleOutput {
    fn event(&self, event: ProgressEvent) {
        let mut stderr = io::stderr();
        let _ = match event.elapsed {
            Some(elapsed) => writeln!(
                stderr,
                "[{:>7.2}s] {}",
                elapsed.as_secs_f64(),
                event.message
            ),
            None => writeln!(stderr, "{}", event.message),
        };
    }
}
