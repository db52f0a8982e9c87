//! In-memory tabular dataset with CSV input and CSV/Parquet output.

use std::{
    fmt,
    fs::File,
    io::{Read, Write},
    path::Path,
    str::FromStr,
};

use polars::prelude::{DataFrame, NamedFrom, ParquetWriter, Series};
use tracing::info;

use crate::error::{AnalyticsError, Result};

/// Byte-order mark prefixed to every CSV we write so spreadsheet tools pick UTF-8.
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Row-major table of optional string cells.
///
/// A `None` cell is a missing value: an empty CSV field on input, or a row
/// that a join could not match on output.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Vec<Option<String>>>,
}

impl Table {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// Build a table from owned rows, rejecting rows of the wrong width.
    pub fn from_rows(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Result<Self> {
        let mut table = Self::new(columns);
        for row in rows {
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn read_csv<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let table = Self::from_reader(file)?;
        info!(path = %path.display(), rows = table.len(), "loaded table");
        Ok(table)
    }

    /// Parse CSV with a header row; a leading UTF-8 BOM is ignored.
    pub fn from_reader<R: Read>(mut reader: R) -> Result<Self> {
        let mut raw = String::new();
        reader.read_to_string(&mut raw)?;
        let body = raw.strip_prefix('\u{feff}').unwrap_or(&raw);

        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .from_reader(body.as_bytes());
        let columns = csv_reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect::<Vec<_>>();
        let mut table = Self::new(columns);
        for record in csv_reader.records() {
            let record = record?;
            let row = record
                .iter()
                .map(|cell| (!cell.is_empty()).then(|| cell.to_string()))
                .collect();
            table.push_row(row)?;
        }
        Ok(table)
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Vec<Option<String>>] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn push_row(&mut self, row: Vec<Option<String>>) -> Result<()> {
        if row.len() != self.columns.len() {
            return Err(AnalyticsError::validation(format!(
                "row has {} cells but table has {} columns",
                row.len(),
                self.columns.len()
            )));
        }
        self.rows.push(row);
        Ok(())
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.columns
            .iter()
            .position(|c| c == name)
            .ok_or_else(|| AnalyticsError::validation(format!("column '{name}' does not exist")))
    }

    pub fn column_values(&self, name: &str) -> Result<Vec<Option<&str>>> {
        let idx = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| row[idx].as_deref()).collect())
    }

    /// Append a column; `values` must hold exactly one cell per row.
    pub fn push_column(
        &mut self,
        name: impl Into<String>,
        values: Vec<Option<String>>,
    ) -> Result<()> {
        let name = name.into();
        if values.len() != self.rows.len() {
            return Err(AnalyticsError::validation(format!(
                "column '{name}' has {} values for {} rows",
                values.len(),
                self.rows.len()
            )));
        }
        if self.columns.contains(&name) {
            return Err(AnalyticsError::validation(format!(
                "column '{name}' already exists"
            )));
        }
        self.columns.push(name);
        for (row, value) in self.rows.iter_mut().zip(values) {
            row.push(value);
        }
        Ok(())
    }

    pub fn drop_column(&mut self, name: &str) -> Result<()> {
        let idx = self.column_index(name)?;
        self.columns.remove(idx);
        for row in &mut self.rows {
            row.remove(idx);
        }
        Ok(())
    }

    /// Keep rows for which `keep` returns true; relative order is preserved.
    pub fn retain_rows<F>(&mut self, mut keep: F)
    where
        F: FnMut(&[Option<String>]) -> bool,
    {
        self.rows.retain(|row| keep(row));
    }

    /// Rewrite every cell in place.
    pub fn map_cells<F>(&mut self, mut f: F)
    where
        F: FnMut(Option<&str>) -> Option<String>,
    {
        for row in &mut self.rows {
            for cell in row.iter_mut() {
                *cell = f(cell.as_deref());
            }
        }
    }

    /// Serialise as comma separated UTF-8 with a BOM and one header row.
    pub fn write_csv<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(UTF8_BOM)?;
        let mut csv_writer = csv::Writer::from_writer(writer);
        csv_writer.write_record(&self.columns)?;
        for row in &self.rows {
            csv_writer.write_record(row.iter().map(|cell| cell.as_deref().unwrap_or("")))?;
        }
        csv_writer.flush()?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P, format: OutputFormat) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        match format {
            OutputFormat::Csv => self.write_csv(File::create(path)?)?,
            OutputFormat::Parquet => self.write_parquet(path)?,
        }
        info!(path = %path.display(), rows = self.len(), %format, "wrote table");
        Ok(())
    }

    fn write_parquet(&self, path: &Path) -> Result<()> {
        let series = self
            .columns
            .iter()
            .enumerate()
            .map(|(idx, name)| {
                let values: Vec<Option<&str>> =
                    self.rows.iter().map(|row| row[idx].as_deref()).collect();
                Series::new(name.as_str().into(), values)
            })
            .collect::<Vec<_>>();
        let mut df = DataFrame::new(series)?;
        let file = File::create(path)?;
        ParquetWriter::new(file).finish(&mut df)?;
        Ok(())
    }
}

/// File format for persisted result tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Csv,
    Parquet,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Parquet => "parquet",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "parquet" => Ok(Self::Parquet),
            other => Err(AnalyticsError::validation(format!(
                "unsupported output format '{other}', expected 'csv' or 'parquet'"
            ))),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}
