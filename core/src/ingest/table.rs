use crate::ingest::lowercase_extension;
use crate::prelude::{WddError, WddResult};
use calamine::{open_workbook_auto, Data, Reader};
use std::path::{Path, PathBuf};

/// Rectangular text table read from a spreadsheet or CSV file.
///
/// Rows above `header_row` are ignored; blank rows below it are dropped.
#[derive(Debug, Clone)]
pub struct Table {
    source: PathBuf,
    headers: Vec<String>,
    rows: Vec<(usize, Vec<String>)>,
}

impl Table {
    pub fn load(path: &Path, header_row: usize) -> WddResult<Self> {
        let raw = match lowercase_extension(path).as_deref() {
            Some("xlsx" | "xlsm" | "xlsb" | "xls" | "ods") => read_spreadsheet(path)?,
            Some("csv") => read_csv(path)?,
            _ => return Err(WddError::UnsupportedFormat(path.to_path_buf())),
        };
        Self::from_rows(path, raw, header_row)
    }

    pub fn from_rows(
        source: impl Into<PathBuf>,
        raw: Vec<Vec<String>>,
        header_row: usize,
    ) -> WddResult<Self> {
        let source = source.into();
        let mut lines = raw.into_iter().enumerate().skip(header_row);
        let headers = match lines.next() {
            Some((_, cells)) => cells.into_iter().map(|cell| cell.trim().to_string()).collect(),
            None => {
                return Err(WddError::Table {
                    path: source,
                    row: header_row + 1,
                    column: String::new(),
                    message: "header row is missing".into(),
                })
            }
        };
        let rows = lines
            .filter(|(_, cells)| cells.iter().any(|cell| !cell.trim().is_empty()))
            .map(|(index, cells)| (index + 1, cells))
            .collect();

        Ok(Self {
            source,
            headers,
            rows,
        })
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn find_column(&self, name: &str) -> Option<usize> {
        let wanted = name.trim();
        self.headers.iter().position(|header| header == wanted)
    }

    pub fn column(&self, name: &str) -> WddResult<usize> {
        self.find_column(name).ok_or_else(|| WddError::MissingColumn {
            path: self.source.clone(),
            column: name.trim().to_string(),
        })
    }

    pub fn rows(&self) -> impl Iterator<Item = TableRow<'_>> {
        self.rows.iter().map(move |(line, cells)| TableRow {
            table: self,
            line: *line,
            cells,
        })
    }
}

/// Borrowed view of one data row.
pub struct TableRow<'a> {
    table: &'a Table,
    line: usize,
    cells: &'a [String],
}

impl<'a> TableRow<'a> {
    /// 1-based row number in the source file.
    pub fn line(&self) -> usize {
        self.line
    }

    /// Trimmed cell text; blank cells read as `None`.
    pub fn text(&self, column: usize) -> Option<&'a str> {
        self.cells
            .get(column)
            .map(|cell| cell.trim())
            .filter(|cell| !cell.is_empty())
    }

    pub fn require_text(&self, column: usize) -> WddResult<&'a str> {
        self.text(column)
            .ok_or_else(|| self.error(column, "value is missing"))
    }

    pub fn number(&self, column: usize) -> WddResult<Option<f64>> {
        match self.text(column) {
            None => Ok(None),
            Some(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Ok(Some(value)),
                _ => Err(self.error(column, &format!("`{}` is not a finite number", text))),
            },
        }
    }

    pub fn require_number(&self, column: usize) -> WddResult<f64> {
        self.number(column)?
            .ok_or_else(|| self.error(column, "value is missing"))
    }

    pub fn error(&self, column: usize, message: &str) -> WddError {
        WddError::Table {
            path: self.table.source.clone(),
            row: self.line,
            column: self.table.headers.get(column).cloned().unwrap_or_default(),
            message: message.to_string(),
        }
    }
}

fn read_spreadsheet(path: &Path) -> WddResult<Vec<Vec<String>>> {
    let spreadsheet_error = |message: String| WddError::Spreadsheet {
        path: path.to_path_buf(),
        message,
    };
    let mut workbook = open_workbook_auto(path).map_err(|err| spreadsheet_error(err.to_string()))?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| spreadsheet_error("workbook has no sheets".into()))?
        .map_err(|err| spreadsheet_error(err.to_string()))?;

    // The range starts at the first used cell; pad so row indices match the sheet.
    let leading_rows = range.start().map(|(row, _)| row as usize).unwrap_or(0);
    let mut rows = vec![Vec::new(); leading_rows];
    rows.extend(
        range
            .rows()
            .map(|row| row.iter().map(cell_text).collect::<Vec<_>>()),
    );
    Ok(rows)
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(text) => text.clone(),
        Data::Float(value) => value.to_string(),
        Data::Int(value) => value.to_string(),
        other => other.to_string(),
    }
}

fn read_csv(path: &Path) -> WddResult<Vec<Vec<String>>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_path(path)
        .map_err(|err| WddError::csv(path, err))?;
    reader
        .records()
        .map(|record| {
            record
                .map(|record| record.iter().map(str::to_string).collect())
                .map_err(|err| WddError::csv(path, err))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    fn rows(lines: &[&[&str]]) -> Vec<Vec<String>> {
        lines
            .iter()
            .map(|line| line.iter().map(|cell| cell.to_string()).collect())
            .collect()
    }

    #[test]
    fn header_row_skips_title_lines() {
        let table = Table::from_rows(
            "sheet.xlsx",
            rows(&[&["Tunnel bees 2024"], &[" a ", "b"], &["1", "2"], &["", ""], &["3", "x"]]),
            1,
        )
        .unwrap();
        assert_eq!(table.len(), 2);
        let b = table.column("b").unwrap();
        let a = table.column("a").unwrap();
        let parsed: Vec<_> = table.rows().map(|row| row.number(a).unwrap()).collect();
        assert_eq!(parsed, vec![Some(1.0), Some(3.0)]);

        let bad = table.rows().nth(1).unwrap();
        assert_eq!(bad.line(), 5);
        let err = bad.require_number(b).unwrap_err();
        assert!(err.to_string().contains("row 5"));
    }

    #[test]
    fn non_finite_numbers_are_rejected() {
        let table = Table::from_rows(
            "t.csv",
            rows(&[&["frames"], &["NaN"], &["inf"], &["-12.5"]]),
            0,
        )
        .unwrap();
        let frames = table.column("frames").unwrap();
        let parsed: Vec<_> = table.rows().map(|row| row.number(frames).ok()).collect();
        assert_eq!(parsed, vec![None, None, Some(Some(-12.5))]);

        let err = table.rows().next().unwrap().require_number(frames).unwrap_err();
        assert!(err.to_string().contains("row 2"));
    }

    #[test]
    fn missing_column_is_reported() {
        let table = Table::from_rows("t.csv", rows(&[&["a"]]), 0).unwrap();
        assert!(matches!(
            table.column("video_name"),
            Err(WddError::MissingColumn { .. })
        ));
    }

    #[test]
    fn missing_header_row_is_reported() {
        assert!(Table::from_rows("t.csv", rows(&[&["a"]]), 3).is_err());
    }

    #[test]
    fn loads_csv_with_ragged_rows() {
        let mut file = Builder::new().suffix(".csv").tempfile().unwrap();
        file.write_all(b"title\nx,y,z\n1,2\n4,5,6\n").unwrap();
        let table = Table::load(file.path(), 1).unwrap();
        assert_eq!(table.len(), 2);
        let z = table.column("z").unwrap();
        let first = table.rows().next().unwrap();
        assert_eq!(first.text(z), None);
    }

    #[test]
    fn loads_xlsx_keeping_sheet_row_numbers() {
        use rust_xlsxwriter::Workbook;

        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("annotations.xlsx");
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        // Row 0 stays blank, so the used range starts at row 1.
        sheet.write_string(1, 0, "Tunnel bees 2024").unwrap();
        sheet.write_string(2, 0, "name").unwrap();
        sheet.write_string(2, 1, " value ").unwrap();
        sheet.write_string(3, 0, "first").unwrap();
        sheet.write_number(3, 1, 100.5).unwrap();
        sheet.write_string(4, 0, "second").unwrap();
        sheet.write_number(4, 1, 200).unwrap();
        workbook.save(&path).unwrap();

        let table = Table::load(&path, 2).unwrap();
        assert_eq!(table.len(), 2);
        let name = table.column("name").unwrap();
        let value = table.column("value").unwrap();
        let rows: Vec<_> = table
            .rows()
            .map(|row| (row.line(), row.require_text(name).unwrap(), row.number(value).unwrap()))
            .collect();
        assert_eq!(rows, vec![(4, "first", Some(100.5)), (5, "second", Some(200.0))]);
    }

    #[test]
    fn unknown_extension_is_rejected() {
        let file = Builder::new().suffix(".txt").tempfile().unwrap();
        assert!(matches!(
            Table::load(file.path(), 0),
            Err(WddError::UnsupportedFormat(_))
        ));
    }
}
