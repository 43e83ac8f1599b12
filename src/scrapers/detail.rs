//! Parsing of the property detail overlay and its mortgage history grid.
//!
//! Both work on an HTML snapshot of the page. A field is found through a
//! text anchor (the element whose own text carries the field label) and its
//! value is read from elements under the anchor's parent.

use scraper::{ElementRef, Html, Selector};
use std::sync::LazyLock;

use crate::error::ExtractionFailure;
use crate::models::{Field, FieldKey, LenderEntry};
use crate::scrapers::normalize::{
    normalize_currency, normalize_numeric, normalize_text, split_sale_record, starts_with_number,
};

static ALL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("*").expect("valid selector"));
static LABEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[class*="label"]"#).expect("valid selector"));
static SPAN: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("span").expect("valid selector"));
static GRID_ROW: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(".ag-row").expect("valid selector"));
static LENDER_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[col-id="lenderName"]"#).expect("valid selector"));
static RATE_CELL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse(r#"[col-id="loanInterestRate"]"#).expect("valid selector"));
static DESCRIBED_LENDER: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[aria-describedby*="lenderName"]"#).expect("valid selector")
});
static DESCRIBED_RATE: LazyLock<Selector> = LazyLock::new(|| {
    Selector::parse(r#"[aria-describedby*="loanInterestRate"]"#).expect("valid selector")
});

/// Container that appears once the mortgage grid has rendered
pub const GRID_CONTAINER: &str = ".ag-center-cols-container";

/// How a field's value is read from under its anchor
#[derive(Debug, Clone, Copy)]
enum ValueRule {
    Currency,
    Numeric,
    Text,
    /// First span that is a whole number
    IntegerSpan,
    /// First span that starts with a number
    NumberSpan,
}

struct FieldSpec {
    key: FieldKey,
    label: &'static str,
    rule: ValueRule,
}

const fn field(key: FieldKey, label: &'static str, rule: ValueRule) -> FieldSpec {
    FieldSpec { key, label, rule }
}

const FIELDS: &[FieldSpec] = &[
    field(FieldKey::EstimatedValue, "Estimated Value", ValueRule::Currency),
    field(FieldKey::MlsValue, "MLS", ValueRule::Text),
    field(FieldKey::DocumentType, "Document Type", ValueRule::Text),
    field(FieldKey::Beds, "Beds", ValueRule::IntegerSpan),
    field(FieldKey::Baths, "Baths", ValueRule::NumberSpan),
    field(FieldKey::OpenMortgages, "Open Mortgages", ValueRule::Numeric),
    field(FieldKey::EstimatedBalance, "Estimated Balance", ValueRule::Currency),
    field(FieldKey::InvoluntaryLiens, "Involuntary Liens", ValueRule::Numeric),
    field(FieldKey::InvoluntaryAmount, "Involuntary Amount", ValueRule::Currency),
];

const SALE_LABEL: &str = "Public Record";

/// Text of the element's direct text children, ignoring descendants, with
/// whitespace runs (including non-breaking spaces) collapsed to one space
fn own_text(element: &ElementRef<'_>) -> String {
    let raw: String = element
        .children()
        .filter_map(|child| child.value().as_text())
        .map(|text| &**text)
        .collect();
    collapse_whitespace(&raw)
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn inner_text(element: &ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

/// Elements whose own text contains `label`, in document order
fn anchors<'a>(document: &'a Html, label: &str) -> Vec<ElementRef<'a>> {
    let needle = collapse_whitespace(label).to_lowercase();
    document
        .select(&ALL)
        .filter(|el| !matches!(el.value().name(), "script" | "style" | "title"))
        .filter(|el| own_text(el).to_lowercase().contains(&needle))
        .collect()
}

fn parent_of<'a>(element: &ElementRef<'a>) -> Option<ElementRef<'a>> {
    element.parent().and_then(ElementRef::wrap)
}

/// Raw value under the first anchor that has one
fn raw_value(
    document: &Html,
    label: &'static str,
    rule: ValueRule,
) -> Result<String, ExtractionFailure> {
    let found = anchors(document, label);
    if found.is_empty() {
        return Err(ExtractionFailure::AnchorMissing { label });
    }

    found
        .iter()
        .filter_map(parent_of)
        .find_map(|parent| match rule {
            ValueRule::IntegerSpan => parent.select(&SPAN).map(|s| inner_text(&s)).find(|t| {
                !t.is_empty() && t.chars().all(|c| c.is_ascii_digit())
            }),
            ValueRule::NumberSpan => parent
                .select(&SPAN)
                .map(|s| inner_text(&s))
                .find(|t| starts_with_number(t)),
            _ => parent.select(&LABEL).next().map(|l| inner_text(&l)),
        })
        .ok_or(ExtractionFailure::ValueMissing { label })
}

fn read_field(document: &Html, spec: &FieldSpec) -> Result<Field, ExtractionFailure> {
    let raw = raw_value(document, spec.label, spec.rule)?;
    Ok(match spec.rule {
        ValueRule::Currency => normalize_currency(&raw),
        ValueRule::Numeric | ValueRule::NumberSpan => normalize_numeric(&raw),
        ValueRule::Text | ValueRule::IntegerSpan => normalize_text(&raw),
    })
}

/// Read every scalar field from the detail overlay.
///
/// Each field succeeds or fails on its own; the caller decides what a
/// failure becomes.
pub fn parse_scalar_fields(html: &str) -> Vec<(FieldKey, Result<Field, ExtractionFailure>)> {
    let document = Html::parse_document(html);
    let mut fields: Vec<_> = FIELDS
        .iter()
        .map(|spec| (spec.key, read_field(&document, spec)))
        .collect();

    match raw_value(&document, SALE_LABEL, ValueRule::Text) {
        Ok(raw) => {
            let (amount, date) = split_sale_record(&raw);
            fields.push((FieldKey::LastSalePublicRecord, Ok(amount)));
            fields.push((FieldKey::LastSaleDate, Ok(date)));
        }
        Err(failure) => {
            fields.push((FieldKey::LastSaleDate, Err(sale_failure(&failure))));
            fields.push((FieldKey::LastSalePublicRecord, Err(failure)));
        }
    }

    fields
}

fn sale_failure(failure: &ExtractionFailure) -> ExtractionFailure {
    match failure {
        ExtractionFailure::AnchorMissing { label } => {
            ExtractionFailure::AnchorMissing { label: *label }
        }
        _ => ExtractionFailure::ValueMissing { label: SALE_LABEL },
    }
}

/// Number the non-blank name/rate pairs 1, 2, 3...
fn number_pairs<I>(pairs: I) -> Vec<LenderEntry>
where
    I: IntoIterator<Item = (String, String)>,
{
    pairs
        .into_iter()
        .filter(|(name, rate)| !name.is_empty() && !rate.is_empty())
        .enumerate()
        .map(|(i, (name, rate))| LenderEntry {
            index: i + 1,
            name,
            rate,
        })
        .collect()
}

/// Lender name and interest rate per row of the mortgage history grid.
///
/// Rows are read first; when no row yields a pair, name and rate cells are
/// paired by position instead.
pub fn parse_lenders(html: &str) -> Vec<LenderEntry> {
    let document = Html::parse_document(html);

    let by_row = number_pairs(document.select(&GRID_ROW).filter_map(|row| {
        let name = row.select(&LENDER_CELL).next()?;
        let rate = row.select(&RATE_CELL).next()?;
        Some((inner_text(&name), inner_text(&rate)))
    }));
    if !by_row.is_empty() {
        return by_row;
    }

    let names = document.select(&DESCRIBED_LENDER).map(|c| inner_text(&c));
    let rates = document.select(&DESCRIBED_RATE).map(|c| inner_text(&c));
    number_pairs(names.zip(rates))
}

#[cfg(test)]
mod tests {
    use super::*;

    const DETAIL_POPUP: &str = r#"
    <html><body>
      <div class="modal">
        <div class="stat"><div class="name">Estimated Value</div><div class="label">$425,300</div></div>
        <div class="stat"><div class="name">Last Sale (Public Record)</div><div class="label">$310,000 05/14/2019</div></div>
        <div class="stat"><div class="name">MLS</div><div class="label"> Off Market </div></div>
        <div class="stat"><div class="name">Document Type</div><div class="label">Grant Deed</div></div>
        <div class="facts">
          <div><span>Beds</span><span>Three</span><span>3</span></div>
          <div><span>Baths</span><span>n/a</span><span>2.5</span></div>
        </div>
        <div class="fin"><div class="name">Open Mortgages</div><div class="value-label">2</div></div>
        <div class="fin"><div class="name">Estimated Balance</div><div class="value-label">$198,750</div></div>
        <div class="fin"><div class="name">Involuntary Liens</div><div class="value-label">0</div></div>
        <div class="fin"><div class="name">Involuntary Amount</div><div class="value-label">N/A</div></div>
      </div>
    </body></html>
    "#;

    fn field(fields: &[(FieldKey, Result<Field, ExtractionFailure>)], key: FieldKey) -> Field {
        fields
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, r)| r.as_ref().cloned().unwrap_or(Field::Unavailable))
            .unwrap()
    }

    #[test]
    fn test_parse_full_popup() {
        let fields = parse_scalar_fields(DETAIL_POPUP);

        assert_eq!(field(&fields, FieldKey::EstimatedValue), Field::value("$425,300"));
        assert_eq!(field(&fields, FieldKey::LastSalePublicRecord), Field::value("$310,000"));
        assert_eq!(field(&fields, FieldKey::LastSaleDate), Field::value("05/14/2019"));
        assert_eq!(field(&fields, FieldKey::MlsValue), Field::value("Off Market"));
        assert_eq!(field(&fields, FieldKey::DocumentType), Field::value("Grant Deed"));
        assert_eq!(field(&fields, FieldKey::Beds), Field::value("3"));
        assert_eq!(field(&fields, FieldKey::Baths), Field::value("2.5"));
        assert_eq!(field(&fields, FieldKey::OpenMortgages), Field::value("2"));
        assert_eq!(field(&fields, FieldKey::EstimatedBalance), Field::value("$198,750"));
        assert_eq!(field(&fields, FieldKey::InvoluntaryLiens), Field::value("0"));
        assert_eq!(field(&fields, FieldKey::InvoluntaryAmount), Field::Unavailable);
    }

    #[test]
    fn test_every_field_reported_once() {
        let fields = parse_scalar_fields(DETAIL_POPUP);
        assert_eq!(fields.len(), FieldKey::ALL.len());
        for key in FieldKey::ALL {
            assert_eq!(fields.iter().filter(|(k, _)| *k == key).count(), 1, "{key:?}");
        }
    }

    #[test]
    fn test_missing_fields_fail_independently() {
        let html = r#"<div><div class="name">Estimated Value</div><div class="label">$99,000</div></div>
                      <div><div class="name">Document Type</div></div>"#;
        let fields = parse_scalar_fields(html);

        assert_eq!(field(&fields, FieldKey::EstimatedValue), Field::value("$99,000"));
        let doc = fields.iter().find(|(k, _)| *k == FieldKey::DocumentType).unwrap();
        assert!(matches!(doc.1, Err(ExtractionFailure::ValueMissing { label: "Document Type" })));
        let beds = fields.iter().find(|(k, _)| *k == FieldKey::Beds).unwrap();
        assert!(matches!(beds.1, Err(ExtractionFailure::AnchorMissing { label: "Beds" })));
        let date = fields.iter().find(|(k, _)| *k == FieldKey::LastSaleDate).unwrap();
        assert!(date.1.is_err());
    }

    #[test]
    fn test_beds_skip_non_numeric_siblings() {
        let html = r#"<div><span>Beds</span><span>--</span><span>4 bd</span><span>4</span></div>"#;
        let fields = parse_scalar_fields(html);
        assert_eq!(field(&fields, FieldKey::Beds), Field::value("4"));
    }

    #[test]
    fn test_anchor_match_is_case_insensitive() {
        let html = r#"<div><span class="name">ESTIMATED VALUE</span><span class="label">510,000</span></div>"#;
        let fields = parse_scalar_fields(html);
        assert_eq!(field(&fields, FieldKey::EstimatedValue), Field::value("$510,000"));
    }

    #[test]
    fn test_wrapped_and_nbsp_labels_still_anchor() {
        let html = "<div><div class=\"name\">Estimated\n   Value</div>\
                    <div class=\"label\">$512,000</div></div>\
                    <div><div class=\"name\">Open&nbsp;Mortgages</div>\
                    <div class=\"value-label\">1</div></div>";
        let fields = parse_scalar_fields(html);

        assert_eq!(field(&fields, FieldKey::EstimatedValue), Field::value("$512,000"));
        assert_eq!(field(&fields, FieldKey::OpenMortgages), Field::value("1"));
    }

    #[test]
    fn test_lenders_skip_blank_rows() {
        let html = r#"
        <div class="ag-center-cols-container">
          <div class="ag-row"><div col-id="lenderName">Bank A</div><div col-id="loanInterestRate">4.5%</div></div>
          <div class="ag-row"><div col-id="lenderName"> </div><div col-id="loanInterestRate"></div></div>
          <div class="ag-row"><div col-id="lenderName">Bank B</div><div col-id="loanInterestRate">3.9%</div></div>
        </div>"#;

        let lenders = parse_lenders(html);
        assert_eq!(
            lenders,
            vec![
                LenderEntry { index: 1, name: "Bank A".into(), rate: "4.5%".into() },
                LenderEntry { index: 2, name: "Bank B".into(), rate: "3.9%".into() },
            ]
        );
    }

    #[test]
    fn test_lenders_keep_repeated_names() {
        let html = r#"
          <div class="ag-row"><div col-id="lenderName">Bank A</div><div col-id="loanInterestRate">4.5%</div></div>
          <div class="ag-row"><div col-id="lenderName">Bank A</div><div col-id="loanInterestRate">6.1%</div></div>"#;

        let lenders = parse_lenders(html);
        assert_eq!(lenders.len(), 2);
        assert_eq!(lenders[1].index, 2);
        assert_eq!(lenders[1].rate, "6.1%");
    }

    #[test]
    fn test_lenders_fall_back_to_described_cells() {
        let html = r#"
          <div class="ag-pinned-left-cols-container">
            <div role="gridcell" aria-describedby="col-lenderName">Wells Fargo</div>
            <div role="gridcell" aria-describedby="col-lenderName"></div>
            <div role="gridcell" aria-describedby="col-lenderName">Chase</div>
          </div>
          <div class="ag-center-cols-container">
            <div role="gridcell" aria-describedby="col-loanInterestRate">5.25%</div>
            <div role="gridcell" aria-describedby="col-loanInterestRate"></div>
            <div role="gridcell" aria-describedby="col-loanInterestRate">2.875%</div>
          </div>"#;

        let lenders = parse_lenders(html);
        assert_eq!(lenders.len(), 2);
        assert_eq!(lenders[0].name, "Wells Fargo");
        assert_eq!(lenders[0].rate, "5.25%");
        assert_eq!(lenders[1].index, 2);
        assert_eq!(lenders[1].name, "Chase");
    }

    #[test]
    fn test_no_grid_no_lenders() {
        assert!(parse_lenders(DETAIL_POPUP).is_empty());
    }
}
