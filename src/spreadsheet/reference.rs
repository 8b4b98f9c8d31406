//! Conversions between zero-based indexes and Excel-style references.

/// Converts zero-based `(row, col)` to an Excel-style reference such as `C7`.
pub(crate) fn index_to_reference(row: usize, col: usize) -> String {
    let mut col = col + 1;
    let mut letters = String::new();
    while col > 0 {
        col -= 1;
        letters.insert(0, (b'A' + (col % 26) as u8) as char);
        col /= 26;
    }
    format!("{letters}{}", row + 1)
}

/// Parses column letters (`A` = 0, `AA` = 26) to a zero-based index.
pub(crate) fn col_to_index(letters: &str) -> Option<usize> {
    if letters.is_empty() || !letters.chars().all(|letter| letter.is_ascii_alphabetic()) {
        return None;
    }
    letters
        .to_ascii_uppercase()
        .bytes()
        .map(|letter| (letter - b'A') as usize + 1)
        .reduce(|index, digit| index * 26 + digit)
        .map(|col| col - 1)
}

/// Parses a 1-based row number to a zero-based index.
pub(crate) fn row_to_index(number: &str) -> Option<usize> {
    number.parse::<usize>().ok().filter(|row| *row > 0).map(|row| row - 1)
}

/// Parses an Excel-style reference such as `C7` to zero-based `(row, col)`.
pub(crate) fn reference_to_index(reference: &str) -> Option<(usize, usize)> {
    let split = reference.find(|c: char| c.is_ascii_digit())?;
    let (letters, digits) = reference.split_at(split);
    Some((row_to_index(digits)?, col_to_index(letters)?))
}
