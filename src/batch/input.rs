use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::info;

use crate::error::InputError;
use crate::models::AddressRecord;

/// Indices and names of the columns whose header mentions "address"
pub fn address_columns(headers: &[String]) -> Vec<(usize, &str)> {
    headers
        .iter()
        .enumerate()
        .filter(|(_, h)| h.to_lowercase().contains("address"))
        .map(|(i, h)| (i, h.as_str()))
        .collect()
}

/// The input table, with one column chosen as the search address
#[derive(Debug, Clone)]
pub struct AddressBook {
    pub headers: Vec<String>,
    pub records: Vec<AddressRecord>,
    /// Index into `headers` of the address column
    pub address_column: usize,
}

impl AddressBook {
    pub fn from_path(path: &Path, column: Option<&str>) -> Result<Self, InputError> {
        let file = File::open(path).map_err(csv::Error::from)?;
        Self::from_reader(file, column)
    }

    pub fn from_reader<R: Read>(reader: R, column: Option<&str>) -> Result<Self, InputError> {
        let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(reader);
        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();
        let address_column = Self::pick_column(&headers, column)?;

        let mut records = Vec::new();
        for row in reader.records() {
            let row = row?;
            let mut values: Vec<String> = row.iter().map(str::to_string).collect();
            values.resize(headers.len(), String::new());
            let address = values[address_column].trim().to_string();
            records.push(AddressRecord { values, address });
        }

        Ok(Self {
            headers,
            records,
            address_column,
        })
    }

    fn pick_column(headers: &[String], requested: Option<&str>) -> Result<usize, InputError> {
        let candidates = address_columns(headers);
        if candidates.is_empty() {
            return Err(InputError::NoAddressColumn);
        }

        match requested {
            Some(name) => candidates
                .iter()
                .find(|(_, h)| h.eq_ignore_ascii_case(name.trim()))
                .map(|(i, _)| *i)
                .ok_or_else(|| InputError::UnknownColumn {
                    name: name.to_string(),
                    available: candidates
                        .iter()
                        .map(|(_, h)| *h)
                        .collect::<Vec<_>>()
                        .join(", "),
                }),
            None => {
                let (index, name) = candidates[0];
                if candidates.len() > 1 {
                    let others: Vec<&str> = candidates[1..].iter().map(|(_, h)| *h).collect();
                    info!(
                        "📋 Using address column \"{}\" (also found: {})",
                        name,
                        others.join(", ")
                    );
                } else {
                    info!("📋 Using address column \"{}\"", name);
                }
                Ok(index)
            }
        }
    }

    pub fn address_header(&self) -> &str {
        &self.headers[self.address_column]
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }
}
