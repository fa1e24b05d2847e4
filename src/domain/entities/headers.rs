use std::collections::HashSet;

use crate::domain::entities::cell::CellValue;

pub const PLACEHOLDER_HEADER: &str = "Column";

/// Ordered, pairwise-distinct column names for one persisted table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnHeaders(Vec<String>);

impl ColumnHeaders {
    pub fn as_slice(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.0.iter()
    }

    pub fn into_vec(self) -> Vec<String> {
        self.0
    }
}

impl<'a> IntoIterator for &'a ColumnHeaders {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

/// Turns raw header cells into column names that can all live in one table.
///
/// Duplicates are compared ASCII case-insensitively because SQLite treats
/// `Name` and `name` as the same column.
pub fn normalize_headers(raw: &[CellValue]) -> ColumnHeaders {
    let mut seen = HashSet::with_capacity(raw.len());
    let mut headers = Vec::with_capacity(raw.len());

    for cell in raw {
        let base = clean_header(cell);
        let mut candidate = base.clone();
        let mut counter = 1_usize;
        while seen.contains(&candidate.to_ascii_lowercase()) {
            candidate = format!("{base}_{counter}");
            counter += 1;
        }
        seen.insert(candidate.to_ascii_lowercase());
        headers.push(candidate);
    }

    ColumnHeaders(headers)
}

fn clean_header(cell: &CellValue) -> String {
    let cleaned = cell.to_text().replace('\n', " ").replace('\r', "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        PLACEHOLDER_HEADER.to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn texts(values: &[&str]) -> Vec<CellValue> {
        values.iter().map(|v| CellValue::from(*v)).collect()
    }

    #[test]
    fn repeated_headers_get_numbered_suffixes() {
        let headers = normalize_headers(&texts(&["A", "A", "A"]));
        assert_eq!(headers.as_slice(), ["A", "A_1", "A_2"]);
    }

    #[test]
    fn empty_and_null_headers_use_placeholder() {
        let headers = normalize_headers(&texts(&["", "X"]));
        assert_eq!(headers.as_slice(), ["Column", "X"]);

        let headers = normalize_headers(&[CellValue::Null, CellValue::Null]);
        assert_eq!(headers.as_slice(), ["Column", "Column_1"]);
    }

    #[test]
    fn line_breaks_and_padding_are_cleaned() {
        let headers = normalize_headers(&texts(&["  Unit\nPrice ", "Qty\r\n", "   "]));
        assert_eq!(headers.as_slice(), ["Unit Price", "Qty", "Column"]);
    }

    #[test]
    fn suffix_skips_names_already_taken() {
        let headers = normalize_headers(&texts(&["A", "A_1", "A"]));
        assert_eq!(headers.as_slice(), ["A", "A_1", "A_2"]);
    }

    #[test]
    fn case_variants_do_not_collide_in_storage() {
        let headers = normalize_headers(&texts(&["Name", "name"]));
        assert_eq!(headers.as_slice(), ["Name", "name_1"]);
    }

    #[test]
    fn non_text_headers_are_stringified() {
        let headers = normalize_headers(&[CellValue::Number(2024.0), CellValue::Bool(false)]);
        assert_eq!(headers.as_slice(), ["2024", "false"]);
    }

    #[test]
    fn output_is_same_length_and_distinct() {
        let raw = texts(&["a", "", "a", "b", "", "a_1", "B"]);
        let headers = normalize_headers(&raw);
        assert_eq!(headers.len(), raw.len());

        let distinct: HashSet<String> =
            headers.iter().map(|h| h.to_ascii_lowercase()).collect();
        assert_eq!(distinct.len(), headers.len());
    }
}
