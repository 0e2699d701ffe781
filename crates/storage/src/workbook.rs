#![forbid(unsafe_code)]

//! One-time import of a legacy spreadsheet workbook (`.xlsx`, `.xls`,
//! `.ods`) into the record file. The first sheet's first row names the
//! columns; headers outside the record shape are ignored.

use crate::StoreError;
use calamine::{Data, Reader, open_workbook_auto};
use csv::StringRecord;
use it_core::InternshipRecord;
use std::path::Path;

pub(crate) fn read_workbook(path: &Path) -> Result<Vec<InternshipRecord>, StoreError> {
    let mut workbook = open_workbook_auto(path)?;
    let range = workbook
        .worksheet_range_at(0)
        .ok_or(StoreError::InvalidInput("workbook has no sheets"))??;

    let mut rows = range.rows();
    let Some(header) = rows.next() else {
        return Ok(Vec::new());
    };
    let headers = StringRecord::from(header.iter().map(cell_text).collect::<Vec<_>>());

    let mut records = Vec::new();
    for (line, row) in rows.enumerate() {
        if row.iter().all(|cell| matches!(cell, Data::Empty)) {
            continue;
        }
        let values = StringRecord::from(row.iter().map(cell_text).collect::<Vec<_>>());
        let record = values
            .deserialize::<InternshipRecord>(Some(&headers))
            .map_err(|err| StoreError::Corrupt(format!("sheet row {}: {err}", line + 2)))?;
        records.push(record);
    }
    Ok(records)
}

/// Whole numbers come back from spreadsheets as floats; register and mobile
/// numbers must not gain a `.0`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::Float(value) if value.fract() == 0.0 && value.abs() < 1e15 => {
            format!("{}", *value as i64)
        }
        other => other.to_string().trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_floats_lose_the_fraction() {
        assert_eq!(cell_text(&Data::Float(9876543210.0)), "9876543210");
        assert_eq!(cell_text(&Data::Float(2.5)), "2.5");
        assert_eq!(cell_text(&Data::String(" Acme ".to_string())), "Acme");
        assert_eq!(cell_text(&Data::Empty), "");
    }
}
