use crate::book::Book;
use crate::cell::CellValue;
use crate::error::{Result, SheetError};
use crate::pivot_xml;
use crate::sheet::Sheet;
use calamine::{open_workbook, Data, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Convert calamine Data to CellValue
fn data_to_cell_value(data: &Data) -> CellValue {
    match data {
        Data::Empty => CellValue::Null,
        Data::Bool(b) => CellValue::Bool(*b),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::String(s) => CellValue::String(s.clone()),
        // Excel stores dates as days since 1899-12-30
        Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
        Data::DateTimeIso(s) => CellValue::String(s.clone()),
        Data::DurationIso(s) => CellValue::String(s.clone()),
        Data::Error(e) => CellValue::String(format!("#ERROR: {e:?}")),
    }
}

fn read_sheet(workbook: &mut Xlsx<BufReader<File>>, sheet_name: &str) -> Result<Sheet> {
    let mut sheet = Sheet::with_name(sheet_name);

    // calamine ranges start at the first used cell, not at A1
    let range = workbook.worksheet_range(sheet_name)?;
    if let Some((row0, col0)) = range.start() {
        for (row, col, data) in range.cells() {
            if matches!(data, Data::Empty) {
                continue;
            }
            sheet.set_cell(
                row0 as usize + row,
                col0 as usize + col,
                data_to_cell_value(data),
            )?;
        }
    }

    let formulas = workbook.worksheet_formula(sheet_name)?;
    if let Some((row0, col0)) = formulas.start() {
        for (row, col, source) in formulas.cells() {
            if source.is_empty() {
                continue;
            }
            sheet.set_cell(
                row0 as usize + row,
                col0 as usize + col,
                CellValue::formula(source.as_str()),
            )?;
        }
    }

    Ok(sheet)
}

/// Number formats for serial dates: time of day only, date only, or both.
struct DateFormats {
    time: Format,
    date: Format,
    date_time: Format,
}

impl DateFormats {
    fn new() -> Self {
        Self {
            time: Format::new().set_num_format("hh:mm:ss"),
            date: Format::new().set_num_format("yyyy-mm-dd"),
            date_time: Format::new().set_num_format("yyyy-mm-dd hh:mm:ss"),
        }
    }

    fn for_serial(&self, serial: f64) -> &Format {
        if serial < 1.0 {
            &self.time
        } else if serial.fract().abs() < f64::EPSILON {
            &self.date
        } else {
            &self.date_time
        }
    }
}

fn write_to_worksheet(sheet: &Sheet, worksheet: &mut Worksheet) -> Result<()> {
    let date_formats = DateFormats::new();
    for (row_idx, row) in sheet.rows().enumerate() {
        for (col_idx, cell) in row.iter().enumerate() {
            let row_num = u32::try_from(row_idx).map_err(|_| SheetError::CellOutOfRange {
                row: row_idx,
                col: col_idx,
                max_rows: crate::MAX_ROWS,
                max_cols: crate::MAX_COLS,
            })?;
            let col_num = u16::try_from(col_idx).map_err(|_| SheetError::CellOutOfRange {
                row: row_idx,
                col: col_idx,
                max_rows: crate::MAX_ROWS,
                max_cols: crate::MAX_COLS,
            })?;

            match cell {
                CellValue::Null => {}
                CellValue::Bool(b) => {
                    worksheet.write_boolean(row_num, col_num, *b)?;
                }
                CellValue::Int(i) => {
                    // Excel stores all numbers as f64; integers past 2^53 lose precision
                    worksheet.write_number(row_num, col_num, *i as f64)?;
                }
                CellValue::Float(f) => {
                    worksheet.write_number(row_num, col_num, *f)?;
                }
                CellValue::DateTime(serial) => {
                    worksheet.write_number_with_format(
                        row_num,
                        col_num,
                        *serial,
                        date_formats.for_serial(*serial),
                    )?;
                }
                CellValue::String(s) => {
                    worksheet.write_string(row_num, col_num, s)?;
                }
                CellValue::Formula(source) => {
                    worksheet.write_formula(row_num, col_num, source.as_str())?;
                }
            }
        }
    }
    Ok(())
}

impl Book {
    /// Open an Excel file and load every worksheet, formulas included.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let mut workbook: Xlsx<BufReader<File>> = open_workbook(path.as_ref())?;

        let sheet_names: Vec<String> = workbook.sheet_names().clone();
        let mut book = Book::new();

        for sheet_name in sheet_names {
            let sheet = read_sheet(&mut workbook, &sheet_name)?;
            book.add_sheet(&sheet_name, sheet)?;
        }

        Ok(book)
    }

    /// Serialize the book into XLSX bytes, pivot tables included.
    pub fn to_xlsx_bytes(&self) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();

        for (index, (name, sheet)) in self.sheets().enumerate() {
            let worksheet = workbook.add_worksheet();
            worksheet.set_name(name)?;
            if index == self.active_index() {
                worksheet.set_active(true);
            }
            write_to_worksheet(sheet, worksheet)?;
        }

        let package = workbook.save_to_buffer()?;
        if self.pivot_tables().is_empty() {
            return Ok(package);
        }
        pivot_xml::embed_pivot_tables(package, &self.sheet_names(), self.pivot_tables())
    }

    /// Save the book to an Excel file, replacing any existing file.
    pub fn save_as<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = self.to_xlsx_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_xlsx_write_and_read() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.xlsx");

        let mut book = Book::new();
        book.add_sheet(
            "Sheet1",
            Sheet::from_data(vec![vec!["Name", "Age"], vec!["Alice", "30"]]),
        )
        .unwrap();
        book.save_as(&path).unwrap();

        let loaded = Book::open(&path).unwrap();
        let sheet = loaded.get_sheet("Sheet1").unwrap();
        assert_eq!(sheet.row_count(), 2);
        assert_eq!(sheet.get_a1("A2").unwrap(), &CellValue::from("Alice"));
    }

    #[test]
    fn test_xlsx_types() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("types.xlsx");

        let mut sheet = Sheet::new();
        *sheet.data_mut() = vec![vec![
            CellValue::String("text".to_string()),
            CellValue::Int(42),
            CellValue::Float(2.5),
            CellValue::Bool(true),
        ]];
        let mut book = Book::new();
        book.add_sheet("Types", sheet).unwrap();
        book.save_as(&path).unwrap();

        let loaded = Book::open(&path).unwrap();
        let sheet = loaded.get_sheet("Types").unwrap();

        assert!(matches!(sheet.value_at(0, 0).unwrap(), CellValue::String(s) if s == "text"));
        // Int becomes Float in Excel
        assert!(
            matches!(sheet.value_at(0, 1).unwrap(), CellValue::Float(f) if (*f - 42.0).abs() < 0.01)
        );
        assert!(
            matches!(sheet.value_at(0, 2).unwrap(), CellValue::Float(f) if (*f - 2.5).abs() < 0.01)
        );
        assert!(matches!(sheet.value_at(0, 3).unwrap(), CellValue::Bool(true)));
    }

    #[test]
    fn test_xlsx_dates_survive_resave() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("dates.xlsx");

        // 2024-03-15, and 2024-03-15 12:00
        let mut sheet = Sheet::from_data(vec![vec![
            CellValue::from("入账日期"),
            CellValue::from("审核时间"),
        ]]);
        sheet.set_a1("A2", CellValue::DateTime(45366.0)).unwrap();
        sheet.set_a1("B2", CellValue::DateTime(45366.5)).unwrap();
        sheet.set_a1("C2", CellValue::Float(45366.0)).unwrap();
        let mut book = Book::new();
        book.add_sheet("Sheet1", sheet).unwrap();
        book.save_as(&path).unwrap();

        // open and save in place, as a run does
        Book::open(&path).unwrap().save_as(&path).unwrap();

        let loaded = Book::open(&path).unwrap();
        let sheet = loaded.get_sheet("Sheet1").unwrap();
        assert_eq!(sheet.get_a1("A2").unwrap(), &CellValue::DateTime(45366.0));
        assert_eq!(sheet.get_a1("B2").unwrap(), &CellValue::DateTime(45366.5));
        // plain numbers stay plain
        assert_eq!(sheet.get_a1("C2").unwrap(), &CellValue::Float(45366.0));
    }

    #[test]
    fn test_date_format_choice() {
        let formats = DateFormats::new();
        assert!(std::ptr::eq(formats.for_serial(0.25), &formats.time));
        assert!(std::ptr::eq(formats.for_serial(45366.0), &formats.date));
        assert!(std::ptr::eq(formats.for_serial(45366.5), &formats.date_time));
    }

    #[test]
    fn test_xlsx_keeps_absolute_positions() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("offset.xlsx");

        let mut sheet = Sheet::new();
        sheet.set_a1("C3", "late start").unwrap();
        let mut book = Book::new();
        book.add_sheet("Offset", sheet).unwrap();
        book.save_as(&path).unwrap();

        let loaded = Book::open(&path).unwrap();
        let sheet = loaded.get_sheet("Offset").unwrap();
        assert_eq!(sheet.get_a1("C3").unwrap(), &CellValue::from("late start"));
        assert_eq!(sheet.get_a1("A1").unwrap(), &CellValue::Null);
    }

    #[test]
    fn test_xlsx_formulas_survive_roundtrip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("formulas.xlsx");

        let mut sheet = Sheet::from_data(vec![vec![1, 2]]);
        sheet.set_formula("C1", "=SUM(A1,B1)").unwrap();
        let mut book = Book::new();
        book.add_sheet("Sheet1", sheet).unwrap();
        book.save_as(&path).unwrap();

        let loaded = Book::open(&path).unwrap();
        let cell = loaded.get_sheet("Sheet1").unwrap().get_a1("C1").unwrap();
        assert_eq!(cell.formula_source(), Some("=SUM(A1,B1)"));
    }
}
