//! Spreadsheet readers for the packages and MiGeL workbooks
//!
//! Only the first worksheet is read. Columns are fixed by letter; rows whose
//! cells do not carry the expected type are skipped silently, like blank or
//! header rows.

use std::collections::BTreeSet;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use calamine::{open_workbook_auto, Data, Range, Reader};
use tracing::debug;

use crate::domain::certificate::IKSNR_LEN;
use crate::domain::migel::MigelRow;
use crate::domain::{PackageRow, RegNumber};

/// Zero-based column index of a spreadsheet column letter (`A` = 0)
pub const fn column(letter: u8) -> u32 {
    (letter - b'A') as u32
}

mod packages {
    use super::column;
    pub const REG_NUMBER: u32 = column(b'A');
    pub const NAME: u32 = column(b'C');
    pub const ACTIVE_AGENT: u32 = column(b'Q');
}

mod migel {
    use super::column;
    pub const POSITION_NUMBER: u32 = column(b'H');
    pub const HVB_SELF_APPLICATION: u32 = column(b'M');
    pub const HVB_CARE: u32 = column(b'N');
}

/// Load the first worksheet of an `.xlsx`/`.xls`/`.ods` file
pub fn first_worksheet(path: &Path) -> Result<Range<Data>> {
    let mut workbook = open_workbook_auto(path).with_context(|| format!("Failed to open workbook {}", path.display()))?;
    workbook
        .worksheet_range_at(0)
        .ok_or_else(|| anyhow!("Workbook {} has no worksheet", path.display()))?
        .with_context(|| format!("Failed to read first worksheet of {}", path.display()))
}

/// Absolute row indices covered by the range
fn row_indices(range: &Range<Data>) -> std::ops::RangeInclusive<u32> {
    match (range.start(), range.end()) {
        (Some((first, _)), Some((last, _))) => first..=last,
        #[allow(clippy::reversed_empty_ranges)]
        _ => 1..=0,
    }
}

fn cell(range: &Range<Data>, row: u32, col: u32) -> Option<&Data> {
    range.get_value((row, col))
}

/// Integral numeric cell value
fn number_cell(range: &Range<Data>, row: u32, col: u32) -> Option<RegNumber> {
    match cell(range, row, col)? {
        Data::Int(n) => RegNumber::try_from(*n).ok(),
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        Data::Float(f) if f.fract() == 0.0 && *f >= 0.0 => Some(*f as RegNumber),
        _ => None,
    }
}

fn string_cell(range: &Range<Data>, row: u32, col: u32) -> Option<&str> {
    match cell(range, row, col)? {
        Data::String(s) => Some(s.as_str()),
        _ => None,
    }
}

/// `(registration number, name, active agent)` rows of the packages sheet
pub fn package_rows(range: &Range<Data>) -> Vec<PackageRow> {
    row_indices(range)
        .filter_map(|row| {
            Some(PackageRow {
                reg_number: number_cell(range, row, packages::REG_NUMBER)?,
                name: string_cell(range, row, packages::NAME)?.to_string(),
                active_agent: string_cell(range, row, packages::ACTIVE_AGENT)?.to_string(),
            })
        })
        .collect()
}

/// Distinct five-digit registration numbers of the packages sheet
pub fn five_digit_reg_numbers(range: &Range<Data>) -> BTreeSet<String> {
    let numbers: BTreeSet<String> = row_indices(range)
        .filter_map(|row| number_cell(range, row, packages::REG_NUMBER))
        .map(|n| n.to_string())
        .filter(|n| n.len() == IKSNR_LEN)
        .collect();
    debug!("Found {} five-digit registration numbers", numbers.len());
    numbers
}

/// MiGeL rows below the header row
pub fn migel_rows(range: &Range<Data>) -> Vec<MigelRow> {
    row_indices(range)
        .filter(|row| *row > 0)
        .filter_map(|row| {
            let position_number = string_cell(range, row, migel::POSITION_NUMBER)?.trim().to_string();
            Some(MigelRow {
                position_number,
                hvb_self_application: string_cell(range, row, migel::HVB_SELF_APPLICATION)
                    .unwrap_or_default()
                    .to_string(),
                hvb_care: string_cell(range, row, migel::HVB_CARE).unwrap_or_default().to_string(),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn packages_sheet() -> Range<Data> {
        let mut range = Range::new((0, 0), (4, column(b'Q')));
        range.set_value((0, 0), Data::String("Zulassungsnummer".into()));
        range.set_value((0, 2), Data::String("Bezeichnung".into()));
        range.set_value((0, 16), Data::String("Wirkstoff".into()));

        range.set_value((1, 0), Data::Float(58271.0));
        range.set_value((1, 2), Data::String("Ancotil 2.5 g".into()));
        range.set_value((1, 16), Data::String("flucytosinum".into()));

        range.set_value((2, 0), Data::Int(58271));
        range.set_value((2, 2), Data::String("Ancotil 1 g".into()));
        range.set_value((2, 16), Data::String("flucytosinum".into()));

        range.set_value((3, 0), Data::Int(123_456));
        range.set_value((3, 2), Data::String("Long".into()));
        range.set_value((3, 16), Data::Float(1.0));

        range.set_value((4, 0), Data::Float(60001.5));
        range.set_value((4, 2), Data::String("Fraction".into()));
        range.set_value((4, 16), Data::String("x".into()));
        range
    }

    #[test]
    fn reads_typed_package_rows() {
        let rows = package_rows(&packages_sheet());
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].reg_number, 58271);
        assert_eq!(rows[0].name, "Ancotil 2.5 g");
        assert_eq!(rows[1].active_agent, "flucytosinum");
    }

    #[test]
    fn keeps_only_five_digit_numbers() {
        let numbers: Vec<String> = five_digit_reg_numbers(&packages_sheet()).into_iter().collect();
        assert_eq!(numbers, vec!["58271"]);
    }

    #[test]
    fn reads_migel_rows_after_header() {
        let mut range = Range::new((0, 0), (2, column(b'N')));
        range.set_value((0, 7), Data::String("Positions-Nr.".into()));
        range.set_value((1, 7), Data::String(" 01.01.01.00.1 ".into()));
        range.set_value((1, 12), Data::String("12.50".into()));
        range.set_value((2, 7), Data::Float(3.0));

        let rows = migel_rows(&range);

        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].position_number, "01.01.01.00.1");
        assert_eq!(rows[0].hvb_self_application, "12.50");
        assert_eq!(rows[0].hvb_care, "");
    }
}
