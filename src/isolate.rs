//! Sample grouping and control linking.
//!
//! Rows are clustered by sample id into [`Isolate`]s, each isolate resolves
//! the filename of its control assay, and every row of the isolate gains that
//! filename as a trailing column. The isolates are then flattened back into a
//! single table and optionally purged of rows without a control.

use std::collections::HashMap;

use tracing::{debug, info, warn};

use crate::error::CmftError;
use crate::table::{Row, Table};

/// Rows of one sample plus the filename of its control assay.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Isolate {
    sample_id: String,
    rows: Vec<Row>,
    control_filename: String,
}

impl Isolate {
    pub fn new(sample_id: impl Into<String>) -> Self {
        Self {
            sample_id: sample_id.into(),
            rows: Vec::new(),
            control_filename: String::new(),
        }
    }

    pub fn sample_id(&self) -> &str {
        &self.sample_id
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn control_filename(&self) -> &str {
        &self.control_filename
    }

    pub fn has_control(&self) -> bool {
        !self.control_filename.is_empty()
    }

    pub fn push(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// Resolves the control filename from the rows whose mark equals
    /// `control_mark`. The last matching row wins; the control row itself is
    /// kept.
    pub fn link_control(&mut self, control_mark: &str) {
        let mut matches = 0usize;
        for row in &self.rows {
            if row.mark() == control_mark {
                self.control_filename = row.filename().to_string();
                matches += 1;
            }
        }
        if matches > 1 {
            warn!(
                sample = %self.sample_id,
                matches,
                control = %self.control_filename,
                "multiple control rows; using the last one"
            );
        }
    }

    /// Appends the resolved control filename to every row, control row included.
    ///
    /// # Panics
    ///
    /// Panics if the isolate has no rows. Grouping never produces one.
    pub fn append_control_column(&mut self) {
        assert!(
            !self.rows.is_empty(),
            "control column appended to empty isolate {}",
            self.sample_id
        );
        for row in &mut self.rows {
            row.push(self.control_filename.clone());
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

/// Clusters rows by sample id in one forward pass.
///
/// Isolates come out in first-seen order of their sample id and rows keep
/// their relative input order.
pub fn group_isolates(table: Table) -> Vec<Isolate> {
    let mut positions: HashMap<String, usize> = HashMap::new();
    let mut isolates: Vec<Isolate> = Vec::new();

    for row in table {
        let position = match positions.get(row.sample_id()) {
            Some(&position) => position,
            None => {
                let position = isolates.len();
                positions.insert(row.sample_id().to_string(), position);
                isolates.push(Isolate::new(row.sample_id()));
                position
            }
        };
        isolates[position].push(row);
    }

    debug!(isolates = isolates.len(), "grouped rows by sample");
    isolates
}

/// Links and appends the control column on every isolate.
pub fn link_controls(isolates: &mut [Isolate], control_mark: &str) {
    for isolate in isolates.iter_mut() {
        isolate.link_control(control_mark);
        if !isolate.has_control() {
            debug!(sample = %isolate.sample_id(), "no control row found");
        }
        isolate.append_control_column();
    }
}

/// Concatenates isolate rows in isolate order.
pub fn flatten(isolates: Vec<Isolate>) -> Result<Table, CmftError> {
    let total = isolates.iter().map(Isolate::len).sum();
    let mut table = Table::with_capacity(total);
    for isolate in isolates {
        for row in isolate.into_rows() {
            table.push(row)?;
        }
    }
    Ok(table)
}

/// Drops rows whose trailing control field is empty when `enabled`.
pub fn purge(table: Table, enabled: bool) -> Table {
    if !enabled {
        return table;
    }

    let before = table.len();
    let kept = table.filter(|row| {
        let keep = row.last().is_some_and(|control| !control.is_empty());
        if !keep {
            debug!(sample = %row.sample_id(), file = %row.filename(), "purging row without control");
        }
        keep
    });

    let dropped = before - kept.len();
    if dropped > 0 {
        info!(dropped, kept = kept.len(), "purged rows without a control");
    }
    kept
}
