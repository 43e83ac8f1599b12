use chrono::{DateTime, Local};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::RunError;
use crate::models::{FieldKey, LenderEntry, PropertyDetail, MIN_LENDER_COLUMNS, UNAVAILABLE};

/// An input row joined with what was scraped for it
#[derive(Debug, Clone)]
pub struct ResultRow {
    pub values: Vec<String>,
    pub detail: PropertyDetail,
}

/// Output rows in processing order. Rows are only ever appended.
#[derive(Debug, Clone)]
pub struct ResultTable {
    input_headers: Vec<String>,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn new(input_headers: Vec<String>) -> Self {
        Self {
            input_headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, values: Vec<String>, detail: PropertyDetail) {
        self.rows.push(ResultRow { values, detail });
    }

    #[cfg(test)]
    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Lender column pairs in the output: the most found for any row, at least three
    pub fn lender_columns(&self) -> usize {
        self.rows
            .iter()
            .filter_map(|r| r.detail.lenders.iter().map(|l| l.index).max())
            .max()
            .unwrap_or(0)
            .max(MIN_LENDER_COLUMNS)
    }

    pub fn headers(&self) -> Vec<String> {
        let mut headers = self.input_headers.clone();
        headers.extend(FieldKey::ALL.iter().map(|k| k.column()));
        for i in 1..=self.lender_columns() {
            headers.push(LenderEntry::name_column(i));
            headers.push(LenderEntry::rate_column(i));
        }
        headers
    }

    fn record(&self, row: &ResultRow, lender_columns: usize) -> Vec<String> {
        let mut record = row.values.clone();
        record.resize(self.input_headers.len(), String::new());
        record.extend(FieldKey::ALL.iter().map(|k| row.detail.field(*k).to_string()));
        for i in 1..=lender_columns {
            match row.detail.lender(i) {
                Some(lender) => {
                    record.push(lender.name.clone());
                    record.push(lender.rate.clone());
                }
                None => {
                    record.push(UNAVAILABLE.to_string());
                    record.push(UNAVAILABLE.to_string());
                }
            }
        }
        record
    }

    pub fn write_to<W: Write>(&self, writer: W) -> Result<(), RunError> {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(self.headers())?;

        let lender_columns = self.lender_columns();
        for row in &self.rows {
            wtr.write_record(self.record(row, lender_columns))?;
        }
        wtr.flush()?;
        Ok(())
    }

    /// `propstream_results_<YYYYmmdd_HHMMSS>.csv`
    pub fn file_name(at: DateTime<Local>) -> String {
        format!("propstream_results_{}.csv", at.format("%Y%m%d_%H%M%S"))
    }

    /// Write the table into `dir` under a timestamped name and return the path
    pub fn save(&self, dir: &Path) -> Result<PathBuf, RunError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(Self::file_name(Local::now()));
        let file = std::fs::File::create(&path)?;
        self.write_to(file)?;
        Ok(path)
    }
}
