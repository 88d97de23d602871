//! A1 notation helpers for addressing sheet cells.

/// Column letter for a 1-based column index: 1 → `A`, 27 → `AA`.
pub fn column_letter(index: usize) -> String {
    let mut n = index;
    let mut letters = Vec::new();
    while n > 0 {
        let rem = (n - 1) % 26;
        letters.push(char::from(b'A' + rem as u8));
        n = (n - 1) / 26;
    }
    letters.iter().rev().collect()
}

/// A single cell, e.g. `(2, 3)` → `C2`. Row and column are 1-based.
pub fn cell(row: usize, col: usize) -> String {
    format!("{}{}", column_letter(col), row)
}

/// Quote a worksheet name for use in a range (`'Sheet 1'`).
pub fn quote_sheet(sheet: &str) -> String {
    format!("'{}'", sheet.replace('\'', "''"))
}

/// One column over rows `first..=last`, e.g. `'Sheet1'!C2:C4`.
pub fn column_range(sheet: &str, col: usize, first_row: usize, last_row: usize) -> String {
    format!(
        "{}!{}:{}",
        quote_sheet(sheet),
        cell(first_row, col),
        cell(last_row, col)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_letter_columns() {
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
    }

    #[test]
    fn multi_letter_columns() {
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(52), "AZ");
        assert_eq!(column_letter(53), "BA");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn cells_and_ranges() {
        assert_eq!(cell(2, 3), "C2");
        assert_eq!(column_range("Sheet1", 5, 2, 11), "'Sheet1'!E2:E11");
        assert_eq!(quote_sheet("Bob's"), "'Bob''s'");
    }
}
