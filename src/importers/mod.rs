// Import module - sales export workbooks and their header schemas

pub mod dates;
pub mod rows;
pub mod schema;

use calamine::{open_workbook_from_rs, Data, Range, Reader, Xlsx};
use std::collections::BTreeMap;
use std::io::Cursor;
use tracing::{debug, info, warn};

pub use rows::{Record, SalesRow, UNKNOWN_GROUP};
pub use schema::{column_indices, is_valid_header, GroupDimension, HeaderSchema};

/// Extension of the only spreadsheet format the engine reads
pub const SPREADSHEET_EXTENSION: &str = "xlsx";

/// True when a stored file name carries the accepted spreadsheet extension
pub fn is_spreadsheet_name(name: &str) -> bool {
    name.rsplit_once('.')
        .map(|(stem, ext)| !stem.is_empty() && ext.eq_ignore_ascii_case(SPREADSHEET_EXTENSION))
        .unwrap_or(false)
}

/// A worksheet whose first row matched one of the known header schemas
#[derive(Debug, Clone)]
pub struct SalesSheet {
    pub name: String,
    pub schema: HeaderSchema,
    /// Normalized header labels, in column order
    pub header: Vec<String>,
    /// Position of each label the schema requires
    columns: BTreeMap<String, Option<usize>>,
    range: Range<Data>,
}

impl SalesSheet {
    /// Validate a worksheet's header row; `None` means the sheet is skipped
    pub fn from_range(name: impl Into<String>, range: Range<Data>) -> Option<Self> {
        let name = name.into();
        let header: Vec<String> = range
            .rows()
            .next()?
            .iter()
            .map(|cell| schema::normalize_label(&rows::cell_text(cell)))
            .collect();

        match HeaderSchema::detect(&header) {
            Some(schema) => {
                debug!("Sheet '{}' matches {}", name, schema.name());
                let columns = column_indices(&header, schema.required_labels());
                Some(Self {
                    name,
                    schema,
                    header,
                    columns,
                    range,
                })
            }
            None => {
                debug!("Sheet '{}' matches no known header, skipping", name);
                None
            }
        }
    }

    /// Column of a required label; labels outside the schema have none
    pub fn column(&self, label: &str) -> Option<usize> {
        self.columns.get(label).copied().flatten()
    }

    /// Data rows below the header, skipping rows where every cell is empty
    pub fn rows(&self) -> impl Iterator<Item = SalesRow<'_>> {
        self.range
            .rows()
            .skip(1)
            .filter(|cells| cells.iter().any(is_filled))
            .map(move |cells| SalesRow::new(self, cells))
    }

    pub fn row_count(&self) -> usize {
        self.rows().count()
    }
}

fn is_filled(cell: &Data) -> bool {
    match cell {
        Data::Empty => false,
        Data::String(s) => !s.trim().is_empty(),
        _ => true,
    }
}

/// Outcome of inspecting one worksheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SheetCheck {
    pub name: String,
    pub schema: Option<HeaderSchema>,
    pub rows: usize,
}

/// Open a workbook held in memory and return its worksheets in order
pub fn read_worksheets(bytes: &[u8]) -> Result<Vec<(String, Range<Data>)>, calamine::XlsxError> {
    let mut workbook: Xlsx<_> = open_workbook_from_rs(Cursor::new(bytes))?;
    Ok(workbook.worksheets())
}

/// Every sheet of the workbook that passes header validation.
///
/// An unreadable workbook yields no sheets; the failure is logged, not raised.
pub fn sales_sheets(file_name: &str, bytes: &[u8]) -> Vec<SalesSheet> {
    let worksheets = match read_worksheets(bytes) {
        Ok(ws) => ws,
        Err(e) => {
            warn!("Skipping unreadable workbook {}: {}", file_name, e);
            return Vec::new();
        }
    };

    info!("Processing file: {} ({} sheets)", file_name, worksheets.len());
    worksheets
        .into_iter()
        .filter_map(|(name, range)| SalesSheet::from_range(name, range))
        .collect()
}

/// Report the header schema of every sheet in a workbook
pub fn check_workbook(bytes: &[u8]) -> Result<Vec<SheetCheck>, calamine::XlsxError> {
    let worksheets = read_worksheets(bytes)?;
    Ok(worksheets
        .into_iter()
        .map(|(name, range)| {
            let total = range.height();
            match SalesSheet::from_range(name.clone(), range) {
                Some(sheet) => SheetCheck {
                    rows: sheet.row_count(),
                    name,
                    schema: Some(sheet.schema),
                },
                None => SheetCheck {
                    name,
                    schema: None,
                    rows: total.saturating_sub(1),
                },
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range_from(rows: Vec<Vec<Data>>) -> Range<Data> {
        let height = rows.len() as u32;
        let width = rows.iter().map(|r| r.len()).max().unwrap_or(0) as u32;
        let mut range = Range::new((0, 0), (height.saturating_sub(1), width.saturating_sub(1)));
        for (r, row) in rows.into_iter().enumerate() {
            for (c, cell) in row.into_iter().enumerate() {
                range.set_value((r as u32, c as u32), cell);
            }
        }
        range
    }

    fn s(v: &str) -> Data {
        Data::String(v.to_string())
    }

    fn schema_b_header() -> Vec<Data> {
        [
            "Sales Grp",
            "Customer Code",
            "Customer Name",
            "Material Name",
            "Material Code",
            "Quantity in SU",
            "Billing Date",
            "SKU Qty",
        ]
        .iter()
        .map(|h| s(h))
        .collect()
    }

    #[test]
    fn test_spreadsheet_name_filter() {
        assert!(is_spreadsheet_name("1700000000000-sales.xlsx"));
        assert!(is_spreadsheet_name("REPORT.XLSX"));
        assert!(!is_spreadsheet_name("notes.txt"));
        assert!(!is_spreadsheet_name("sales.xlsx.bak"));
        assert!(!is_spreadsheet_name(".xlsx"));
    }

    #[test]
    fn test_sheet_with_unknown_header_is_skipped() {
        let range = range_from(vec![vec![s("foo"), s("bar")], vec![s("1"), s("2")]]);
        assert!(SalesSheet::from_range("Other", range).is_none());
    }

    #[test]
    fn test_rows_skip_header_and_blank_rows() {
        let mut rows = vec![schema_b_header()];
        rows.push(vec![
            s("G1"),
            s("C1"),
            s("Acme"),
            s("Oil"),
            s("M1"),
            Data::Float(4.0),
            Data::Float(45000.0),
            Data::Float(1.0),
        ]);
        rows.push(vec![Data::Empty; 8]);
        rows.push(vec![
            s("G2"),
            s("C2"),
            s("Beta"),
            s("Oil"),
            s("M2"),
            Data::Float(6.0),
            Data::Float(45001.0),
            Data::Float(1.0),
        ]);
        let sheet = SalesSheet::from_range("Sheet1", range_from(rows)).expect("valid sheet");

        assert_eq!(sheet.schema, HeaderSchema::MaterialExport);
        assert_eq!(sheet.row_count(), 2);
        let codes: Vec<_> = sheet.rows().filter_map(|r| r.customer_code()).collect();
        assert_eq!(codes, vec!["C1".to_string(), "C2".to_string()]);
    }

    #[test]
    fn test_short_row_reads_missing_cells_as_empty() {
        let rows = vec![schema_b_header(), vec![s("G1"), s("C1")]];
        let sheet = SalesSheet::from_range("Sheet1", range_from(rows)).expect("valid sheet");
        let row = sheet.rows().next().expect("one row");
        assert_eq!(row.quantity(), rust_decimal::Decimal::ZERO);
        assert_eq!(row.billing_year(), None);
        assert_eq!(row.group_key(GroupDimension::MaterialCode), UNKNOWN_GROUP);
    }

    #[test]
    fn test_columns_follow_header_positions() {
        let mut header = schema_b_header();
        header.reverse();
        header.insert(0, s("Region"));
        let sheet =
            SalesSheet::from_range("Sheet1", range_from(vec![header])).expect("valid sheet");

        assert_eq!(sheet.column("sku qty"), Some(1));
        assert_eq!(sheet.column("sales grp"), Some(8));
        assert_eq!(sheet.column("quantity in su"), Some(3));
        // Present in the sheet but not part of the schema
        assert_eq!(sheet.column("region"), None);
        assert_eq!(sheet.row_count(), 0);
    }

    #[test]
    fn test_garbage_bytes_yield_no_sheets() {
        assert!(sales_sheets("broken.xlsx", b"definitely not a zip archive").is_empty());
        assert!(check_workbook(b"nope").is_err());
    }
}
