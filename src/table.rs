use serde::Serialize;

use crate::error::CmftError;

pub const SAMPLE_FIELD: usize = 0;
pub const MARK_FIELD: usize = 1;
pub const FILENAME_FIELD: usize = 2;
pub const CONTROL_FIELD: usize = 3;

/// One record of the working table: `sample, mark, filename` and, once
/// control linking has run, a trailing control filename.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Row(Vec<String>);

impl Row {
    pub fn new(fields: Vec<String>) -> Self {
        Self(fields)
    }

    pub fn assay(sample: &str, mark: &str, filename: &str) -> Self {
        Self(vec![
            sample.to_string(),
            mark.to_string(),
            filename.to_string(),
        ])
    }

    pub fn width(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> &[String] {
        &self.0
    }

    pub fn field(&self, index: usize) -> Option<&str> {
        self.0.get(index).map(String::as_str)
    }

    pub fn sample_id(&self) -> &str {
        self.field(SAMPLE_FIELD).unwrap_or_default()
    }

    pub fn mark(&self) -> &str {
        self.field(MARK_FIELD).unwrap_or_default()
    }

    pub fn filename(&self) -> &str {
        self.field(FILENAME_FIELD).unwrap_or_default()
    }

    pub fn control_filename(&self) -> Option<&str> {
        self.field(CONTROL_FIELD)
    }

    /// Trailing field of the row; after control linking this is the control filename.
    pub fn last(&self) -> Option<&str> {
        self.0.last().map(String::as_str)
    }

    pub(crate) fn push(&mut self, value: String) {
        self.0.push(value);
    }
}

/// Row-major table in which every row has the same width.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Table {
    width: Option<usize>,
    rows: Vec<Row>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_rows(rows: Vec<Row>) -> Result<Self, CmftError> {
        let mut table = Self::with_capacity(rows.len());
        for row in rows {
            table.push(row)?;
        }
        Ok(table)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            width: None,
            rows: Vec::with_capacity(capacity),
        }
    }

    /// Reorients a column-major accumulation into rows: row `i` field `j` is
    /// column `j` value `i`.
    pub fn from_columns(columns: Vec<Vec<String>>) -> Result<Self, CmftError> {
        let Some(first) = columns.first() else {
            return Err(CmftError::EmptyAccumulation);
        };
        let expected = first.len();
        for (column, values) in columns.iter().enumerate() {
            if values.len() != expected {
                return Err(CmftError::MalformedAccumulation {
                    column,
                    expected,
                    actual: values.len(),
                });
            }
        }

        let width = columns.len();
        let mut rows = (0..expected)
            .map(|_| Vec::with_capacity(width))
            .collect::<Vec<_>>();
        for column in columns {
            for (row, value) in rows.iter_mut().zip(column) {
                row.push(value);
            }
        }

        Ok(Self {
            width: Some(width),
            rows: rows.into_iter().map(Row::new).collect(),
        })
    }

    /// Inverse of [`Table::from_columns`].
    pub fn to_columns(&self) -> Vec<Vec<String>> {
        let mut columns = vec![Vec::with_capacity(self.rows.len()); self.width().unwrap_or(0)];
        for row in &self.rows {
            for (column, value) in columns.iter_mut().zip(row.fields()) {
                column.push(value.clone());
            }
        }
        columns
    }

    pub fn push(&mut self, row: Row) -> Result<(), CmftError> {
        match self.width {
            Some(expected) if row.width() != expected => {
                return Err(CmftError::RaggedRow {
                    expected,
                    actual: row.width(),
                });
            }
            Some(_) => {}
            None => self.width = Some(row.width()),
        }
        self.rows.push(row);
        Ok(())
    }

    /// Field count shared by every row; `None` until the first row or column set arrives.
    pub fn width(&self) -> Option<usize> {
        self.width
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn rows(&self) -> &[Row] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Row> {
        self.rows.iter()
    }

    /// Single pass keeping the rows accepted by `keep`, in order.
    pub fn filter<F>(self, mut keep: F) -> Table
    where
        F: FnMut(&Row) -> bool,
    {
        Self {
            width: self.width,
            rows: self.rows.into_iter().filter(|row| keep(row)).collect(),
        }
    }

    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}

impl IntoIterator for Table {
    type Item = Row;
    type IntoIter = std::vec::IntoIter<Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.into_iter()
    }
}

impl<'a> IntoIterator for &'a Table {
    type Item = &'a Row;
    type IntoIter = std::slice::Iter<'a, Row>;

    fn into_iter(self) -> Self::IntoIter {
        self.rows.iter()
    }
}
