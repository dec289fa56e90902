//! Row extraction: spreadsheet sheets → ordered [`AttendeeRecord`]s.
//!
//! Every sheet is read in workbook order. The first row of a sheet's used
//! range is its header; each later non-blank row becomes one record, looked up
//! by the header names in [`ColumnMapping`]. Missing columns and empty cells
//! become empty strings so the renderer never has to branch on absent data.

use crate::config::ColumnMapping;
use crate::error::BadgePressError;
use calamine::{open_workbook_auto, Data, Reader};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, warn};

/// One attendee, as read from a spreadsheet row.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendeeRecord {
    pub surname: String,
    pub name: String,
    pub organization: String,
    pub role: String,
}

impl AttendeeRecord {
    pub fn new(
        surname: impl Into<String>,
        name: impl Into<String>,
        organization: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            surname: surname.into(),
            name: name.into(),
            organization: organization.into(),
            role: role.into(),
        }
    }
}

/// Read every sheet of the workbook at `path` into attendee records.
///
/// Runs inside `spawn_blocking`: calamine decodes the whole workbook
/// synchronously.
pub async fn read_records(
    path: &Path,
    columns: &ColumnMapping,
) -> Result<Vec<AttendeeRecord>, BadgePressError> {
    let path = path.to_path_buf();
    let columns = columns.clone();

    tokio::task::spawn_blocking(move || read_records_blocking(&path, &columns))
        .await
        .map_err(|e| BadgePressError::Internal(format!("Extract task panicked: {}", e)))?
}

/// Blocking implementation of [`read_records`].
pub fn read_records_blocking(
    path: &Path,
    columns: &ColumnMapping,
) -> Result<Vec<AttendeeRecord>, BadgePressError> {
    if !path.exists() {
        return Err(BadgePressError::SpreadsheetNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut workbook =
        open_workbook_auto(path).map_err(|e| BadgePressError::SpreadsheetUnreadable {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;

    let sheet_names = workbook.sheet_names().to_owned();
    let mut records = Vec::new();

    for sheet in &sheet_names {
        let range =
            workbook
                .worksheet_range(sheet)
                .map_err(|e| BadgePressError::SpreadsheetUnreadable {
                    path: path.to_path_buf(),
                    detail: format!("sheet '{}': {}", sheet, e),
                })?;

        let rows: Vec<Vec<String>> = range
            .rows()
            .map(|row| row.iter().map(cell_to_string).collect())
            .collect();

        let sheet_records = records_from_rows(sheet, &rows, columns);
        debug!("Sheet '{}': {} records", sheet, sheet_records.len());
        records.extend(sheet_records);
    }

    info!(
        "Read {} records from {} sheet(s) in {}",
        records.len(),
        sheet_names.len(),
        path.display()
    );
    Ok(records)
}

/// Turn the rows of one sheet (header first) into records.
///
/// Fully blank rows are skipped. A sheet with no rows yields nothing.
pub fn records_from_rows(
    sheet: &str,
    rows: &[Vec<String>],
    columns: &ColumnMapping,
) -> Vec<AttendeeRecord> {
    let Some((header, data)) = rows.split_first() else {
        return Vec::new();
    };

    let find = |wanted: &str| {
        let idx = header.iter().position(|h| h == wanted);
        if idx.is_none() {
            warn!("Sheet '{}' has no '{}' column; using empty values", sheet, wanted);
        }
        idx
    };
    let surname = find(&columns.surname);
    let name = find(&columns.name);
    let organization = find(&columns.organization);
    let role = find(&columns.role);

    let field = |row: &[String], idx: Option<usize>| -> String {
        idx.and_then(|i| row.get(i)).cloned().unwrap_or_default()
    };

    data.iter()
        .filter(|row| row.iter().any(|cell| !cell.is_empty()))
        .map(|row| AttendeeRecord {
            surname: field(row, surname),
            name: field(row, name),
            organization: field(row, organization),
            role: field(row, role),
        })
        .collect()
}

/// Render a cell the way it reads in the spreadsheet.
fn cell_to_string(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::Error(e) => {
            warn!("Cell error {:?} treated as empty", e);
            String::new()
        }
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(cells: &[&str]) -> Vec<String> {
        cells.iter().map(|c| c.to_string()).collect()
    }

    fn header() -> Vec<String> {
        row(&[
            "Фамилия",
            "Имя",
            "Компания или учебное заведение",
            "Должность",
        ])
    }

    #[test]
    fn maps_columns_by_header_name() {
        let rows = vec![
            header(),
            row(&["Иванов", "Иван", "ООО Ромашка", "Инженер"]),
            row(&["Петрова", "Анна", "МГУ", "Студент"]),
        ];
        let records = records_from_rows("Лист1", &rows, &ColumnMapping::default());
        assert_eq!(
            records,
            vec![
                AttendeeRecord::new("Иванов", "Иван", "ООО Ромашка", "Инженер"),
                AttendeeRecord::new("Петрова", "Анна", "МГУ", "Студент"),
            ]
        );
    }

    #[test]
    fn column_order_does_not_matter() {
        let rows = vec![
            row(&["Должность", "Имя", "Фамилия"]),
            row(&["Директор", "Олег", "Смирнов"]),
        ];
        let records = records_from_rows("s", &rows, &ColumnMapping::default());
        assert_eq!(records, vec![AttendeeRecord::new("Смирнов", "Олег", "", "Директор")]);
    }

    #[test]
    fn short_rows_default_to_empty() {
        let rows = vec![header(), row(&["Сидоров"])];
        let records = records_from_rows("s", &rows, &ColumnMapping::default());
        assert_eq!(records, vec![AttendeeRecord::new("Сидоров", "", "", "")]);
    }

    #[test]
    fn blank_rows_are_skipped() {
        let rows = vec![
            header(),
            row(&["A", "B", "C", "D"]),
            row(&["", "", "", ""]),
            row(&["E", "F", "G", "H"]),
        ];
        let records = records_from_rows("s", &rows, &ColumnMapping::default());
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].surname, "E");
    }

    #[test]
    fn header_match_is_exact() {
        let rows = vec![
            row(&["фамилия ", "Имя"]),
            row(&["X", "Y"]),
        ];
        let records = records_from_rows("s", &rows, &ColumnMapping::default());
        assert_eq!(records, vec![AttendeeRecord::new("", "Y", "", "")]);
    }

    #[test]
    fn custom_column_mapping() {
        let columns = ColumnMapping {
            surname: "Last".into(),
            name: "First".into(),
            organization: "Org".into(),
            role: "Title".into(),
        };
        let rows = vec![
            row(&["First", "Last", "Org", "Title"]),
            row(&["Ada", "Lovelace", "Analytical Engines", "Programmer"]),
        ];
        let records = records_from_rows("s", &rows, &columns);
        assert_eq!(
            records,
            vec![AttendeeRecord::new("Lovelace", "Ada", "Analytical Engines", "Programmer")]
        );
    }

    #[test]
    fn empty_sheet_yields_nothing() {
        assert!(records_from_rows("s", &[], &ColumnMapping::default()).is_empty());
        assert!(records_from_rows("s", &[header()], &ColumnMapping::default()).is_empty());
    }

    #[test]
    fn cells_stringify_like_the_sheet_shows_them() {
        assert_eq!(cell_to_string(&Data::Empty), "");
        assert_eq!(cell_to_string(&Data::String("МГУ".into())), "МГУ");
        assert_eq!(cell_to_string(&Data::Float(42.0)), "42");
        assert_eq!(cell_to_string(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_to_string(&Data::Int(7)), "7");
        assert_eq!(cell_to_string(&Data::Bool(true)), "true");
    }

    #[test]
    fn missing_file_is_fatal() {
        let err = read_records_blocking(
            Path::new("/definitely/not/here.xlsx"),
            &ColumnMapping::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BadgePressError::SpreadsheetNotFound { .. }));
    }

    #[test]
    fn garbage_file_is_unreadable() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.xlsx");
        std::fs::write(&path, b"this is not a zip archive").unwrap();
        let err = read_records_blocking(&path, &ColumnMapping::default()).unwrap_err();
        assert!(matches!(err, BadgePressError::SpreadsheetUnreadable { .. }));
    }
}
