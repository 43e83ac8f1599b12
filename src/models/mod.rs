use serde::{Serialize, Serializer};
use std::fmt;
use tracing::debug;

use crate::error::ExtractionFailure;

/// Marker written wherever a value could not be extracted
pub const UNAVAILABLE: &str = "N/A";

/// Column prefix for every scraped field in the output table
pub const COLUMN_PREFIX: &str = "propstream_";

/// Number of lender column pairs always present in the output
pub const MIN_LENDER_COLUMNS: usize = 3;

/// A single scraped value, or the marker that nothing was extracted.
///
/// Kept as an enum so that a genuinely empty or zero value on the portal is
/// never confused with "we could not read it".
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Field {
    Value(String),
    #[default]
    Unavailable,
}

impl Field {
    pub fn value(raw: impl Into<String>) -> Self {
        Field::Value(raw.into())
    }

    pub fn as_str(&self) -> &str {
        match self {
            Field::Value(v) => v,
            Field::Unavailable => UNAVAILABLE,
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Field {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// The scalar fields read from the property detail overlay, in output order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldKey {
    EstimatedValue,
    LastSalePublicRecord,
    LastSaleDate,
    MlsValue,
    DocumentType,
    Beds,
    Baths,
    OpenMortgages,
    EstimatedBalance,
    InvoluntaryLiens,
    InvoluntaryAmount,
}

impl FieldKey {
    pub const ALL: [FieldKey; 11] = [
        FieldKey::EstimatedValue,
        FieldKey::LastSalePublicRecord,
        FieldKey::LastSaleDate,
        FieldKey::MlsValue,
        FieldKey::DocumentType,
        FieldKey::Beds,
        FieldKey::Baths,
        FieldKey::OpenMortgages,
        FieldKey::EstimatedBalance,
        FieldKey::InvoluntaryLiens,
        FieldKey::InvoluntaryAmount,
    ];

    pub fn name(self) -> &'static str {
        match self {
            FieldKey::EstimatedValue => "estimated_value",
            FieldKey::LastSalePublicRecord => "last_sale_public_record",
            FieldKey::LastSaleDate => "last_sale_date",
            FieldKey::MlsValue => "mls_value",
            FieldKey::DocumentType => "document_type",
            FieldKey::Beds => "beds",
            FieldKey::Baths => "baths",
            FieldKey::OpenMortgages => "open_mortgages",
            FieldKey::EstimatedBalance => "estimated_balance",
            FieldKey::InvoluntaryLiens => "involuntary_liens",
            FieldKey::InvoluntaryAmount => "involuntary_amount",
        }
    }

    /// Output column header, e.g. `propstream_estimated_value`
    pub fn column(self) -> String {
        format!("{}{}", COLUMN_PREFIX, self.name())
    }
}

/// One mortgage line from the detail view's history grid
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LenderEntry {
    /// 1-based position among the lenders extracted for one property
    pub index: usize,
    pub name: String,
    pub rate: String,
}

impl LenderEntry {
    pub fn name_column(index: usize) -> String {
        format!("{}lender_{}_name", COLUMN_PREFIX, index)
    }

    pub fn rate_column(index: usize) -> String {
        format!("{}lender_{}_rate", COLUMN_PREFIX, index)
    }
}

/// Everything scraped for one address
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PropertyDetail {
    pub estimated_value: Field,
    pub last_sale_public_record: Field,
    pub last_sale_date: Field,
    pub mls_value: Field,
    pub document_type: Field,
    pub beds: Field,
    pub baths: Field,
    pub open_mortgages: Field,
    pub estimated_balance: Field,
    pub involuntary_liens: Field,
    pub involuntary_amount: Field,
    pub lenders: Vec<LenderEntry>,
}

impl PropertyDetail {
    /// A detail with every field marked unavailable and no lenders
    pub fn unavailable() -> Self {
        Self::default()
    }

    /// Merge per-field extraction results into a detail.
    ///
    /// Any field whose extraction failed, or that was never attempted, is
    /// recorded as [`Field::Unavailable`].
    pub fn from_fields<I>(fields: I, lenders: Vec<LenderEntry>) -> Self
    where
        I: IntoIterator<Item = (FieldKey, Result<Field, ExtractionFailure>)>,
    {
        let mut detail = Self {
            lenders,
            ..Self::default()
        };

        for (key, result) in fields {
            let value = match result {
                Ok(value) => value,
                Err(failure) => {
                    debug!("{} unavailable: {}", key.name(), failure);
                    Field::Unavailable
                }
            };
            *detail.field_mut(key) = value;
        }

        detail
    }

    pub fn field(&self, key: FieldKey) -> &Field {
        match key {
            FieldKey::EstimatedValue => &self.estimated_value,
            FieldKey::LastSalePublicRecord => &self.last_sale_public_record,
            FieldKey::LastSaleDate => &self.last_sale_date,
            FieldKey::MlsValue => &self.mls_value,
            FieldKey::DocumentType => &self.document_type,
            FieldKey::Beds => &self.beds,
            FieldKey::Baths => &self.baths,
            FieldKey::OpenMortgages => &self.open_mortgages,
            FieldKey::EstimatedBalance => &self.estimated_balance,
            FieldKey::InvoluntaryLiens => &self.involuntary_liens,
            FieldKey::InvoluntaryAmount => &self.involuntary_amount,
        }
    }

    fn field_mut(&mut self, key: FieldKey) -> &mut Field {
        match key {
            FieldKey::EstimatedValue => &mut self.estimated_value,
            FieldKey::LastSalePublicRecord => &mut self.last_sale_public_record,
            FieldKey::LastSaleDate => &mut self.last_sale_date,
            FieldKey::MlsValue => &mut self.mls_value,
            FieldKey::DocumentType => &mut self.document_type,
            FieldKey::Beds => &mut self.beds,
            FieldKey::Baths => &mut self.baths,
            FieldKey::OpenMortgages => &mut self.open_mortgages,
            FieldKey::EstimatedBalance => &mut self.estimated_balance,
            FieldKey::InvoluntaryLiens => &mut self.involuntary_liens,
            FieldKey::InvoluntaryAmount => &mut self.involuntary_amount,
        }
    }

    pub fn lender(&self, index: usize) -> Option<&LenderEntry> {
        self.lenders.iter().find(|l| l.index == index)
    }

    /// One-line summary of the headline fields
    pub fn summary(&self) -> String {
        let primary = self
            .lender(1)
            .map(|l| l.name.as_str())
            .unwrap_or(UNAVAILABLE);
        format!(
            "Est. Value: {}, Beds: {}, Baths: {}, Mortgages: {}, Balance: {}, Primary Lender: {}",
            self.estimated_value,
            self.beds,
            self.baths,
            self.open_mortgages,
            self.estimated_balance,
            primary
        )
    }
}

/// One row of the input table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddressRecord {
    /// Every input column, aligned with the input headers
    pub values: Vec<String>,
    /// The trimmed content of the selected address column
    pub address: String,
}

impl AddressRecord {
    pub fn is_blank(&self) -> bool {
        self.address.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unavailable_detail_renders_marker() {
        let detail = PropertyDetail::unavailable();
        for key in FieldKey::ALL {
            assert_eq!(detail.field(key).to_string(), UNAVAILABLE);
        }
        assert!(detail.lenders.is_empty());
    }

    #[test]
    fn test_from_fields_substitutes_failures() {
        let detail = PropertyDetail::from_fields(
            vec![
                (FieldKey::EstimatedValue, Ok(Field::value("$450,000"))),
                (
                    FieldKey::Beds,
                    Err(ExtractionFailure::AnchorMissing { label: "Beds" }),
                ),
                (FieldKey::Baths, Ok(Field::value("2.5"))),
            ],
            vec![],
        );

        assert_eq!(detail.estimated_value, Field::value("$450,000"));
        assert_eq!(detail.beds, Field::Unavailable);
        assert_eq!(detail.baths, Field::value("2.5"));
        // never attempted
        assert_eq!(detail.mls_value, Field::Unavailable);
    }

    #[test]
    fn test_empty_value_is_not_unavailable() {
        let field = Field::value("");
        assert_ne!(field, Field::Unavailable);
        assert_eq!(field.as_str(), "");
    }

    #[test]
    fn test_column_names() {
        assert_eq!(FieldKey::LastSaleDate.column(), "propstream_last_sale_date");
        assert_eq!(LenderEntry::name_column(2), "propstream_lender_2_name");
        assert_eq!(LenderEntry::rate_column(4), "propstream_lender_4_rate");
    }

    #[test]
    fn test_summary_uses_primary_lender() {
        let detail = PropertyDetail {
            estimated_value: Field::value("$300,000"),
            lenders: vec![LenderEntry {
                index: 1,
                name: "Bank A".to_string(),
                rate: "4.5%".to_string(),
            }],
            ..PropertyDetail::default()
        };
        let line = detail.summary();
        assert!(line.contains("Est. Value: $300,000"));
        assert!(line.contains("Primary Lender: Bank A"));
        assert!(line.contains("Beds: N/A"));
    }
}
