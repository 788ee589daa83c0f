//! Tabular record batches
//!
//! A [`Batch`] is an ordered header plus ordered rows of string cells. Batches
//! are read from and written to delimited text with the `csv` crate; every
//! cell is kept verbatim as a string so that values round-trip byte for byte.

use crate::domain::errors::DeidentifyError;
use crate::domain::Result;
use std::collections::HashSet;
use std::io::{Read, Write};
use std::path::Path;

/// Ordered sequence of rows sharing one header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Batch {
    columns: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl Batch {
    /// Creates a batch after checking header uniqueness and row widths
    ///
    /// # Errors
    ///
    /// Returns [`DeidentifyError::InvalidBatch`] if a column name repeats or a
    /// row does not have one cell per column.
    pub fn new(columns: Vec<String>, rows: Vec<Vec<String>>) -> Result<Self> {
        let mut seen = HashSet::with_capacity(columns.len());
        let duplicates: Vec<&str> = columns
            .iter()
            .filter(|c| !seen.insert(c.as_str()))
            .map(String::as_str)
            .collect();
        if !duplicates.is_empty() {
            return Err(DeidentifyError::InvalidBatch(format!(
                "duplicate column names: {}",
                duplicates.join(", ")
            ))
            .into());
        }

        if let Some((i, row)) = rows
            .iter()
            .enumerate()
            .find(|(_, row)| row.len() != columns.len())
        {
            return Err(DeidentifyError::InvalidBatch(format!(
                "row {} has {} cells, expected {}",
                i + 1,
                row.len(),
                columns.len()
            ))
            .into());
        }

        Ok(Self { columns, rows })
    }

    /// Reads a batch from CSV text with a header row
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(reader);

        let columns: Vec<String> = csv_reader
            .headers()?
            .iter()
            .map(str::to_string)
            .collect();

        let mut rows = Vec::new();
        for record in csv_reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Self::new(columns, rows)
    }

    /// Reads a batch from a CSV file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = std::fs::File::open(path).map_err(|e| {
            crate::domain::DeidbError::Io(format!("Failed to open {}: {e}", path.display()))
        })?;
        Self::from_reader(std::io::BufReader::new(file))
    }

    /// Writes the batch as CSV, header first
    pub fn write_to<W: Write>(&self, writer: W) -> Result<()> {
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row)?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    /// Column names in header order
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    /// Rows in input order
    pub fn rows(&self) -> &[Vec<String>] {
        &self.rows
    }

    /// Number of data rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the batch has no data rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a column in the header
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Iterates over the values of one column, in row order
    pub fn column_values<'a>(&'a self, name: &str) -> Option<impl Iterator<Item = &'a str> + 'a> {
        let idx = self.column_index(name)?;
        Some(self.rows.iter().map(move |row| row[idx].as_str()))
    }
}
