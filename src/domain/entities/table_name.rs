/// Relational table name for one sheet of one workbook.
///
/// Only the file stem of `workbook_path` takes part, so the same workbook
/// opened from two directories maps to the same table.
pub fn table_name(workbook_path: &str, sheet_name: &str) -> String {
    format!("{}_{}", sanitize_stem(workbook_stem(workbook_path)), sheet_name)
}

/// File name without directory and without its last extension.
pub fn workbook_stem(workbook_path: &str) -> &str {
    let file_name = workbook_path
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(workbook_path);
    match file_name.rfind('.') {
        Some(0) | None => file_name,
        Some(dot) => &file_name[..dot],
    }
}

fn sanitize_stem(stem: &str) -> String {
    stem.chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}

/// Everything the store needs to create, look up, or guard one sheet table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableTarget {
    pub table_name: String,
    pub workbook_stem: String,
    pub workbook_path: String,
    pub sheet_name: String,
}

impl TableTarget {
    pub fn new(workbook_path: &str, sheet_name: &str) -> Self {
        Self {
            table_name: table_name(workbook_path, sheet_name),
            workbook_stem: workbook_stem(workbook_path).to_string(),
            workbook_path: workbook_path.to_string(),
            sheet_name: sheet_name.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_ignores_directory() {
        let a = table_name("/a/b/Report 1.xlsx", "Sheet 1");
        let b = table_name("/c/Report 1.xlsx", "Sheet 1");
        assert_eq!(a, b);
        assert_eq!(a, "Report_1_Sheet 1");
    }

    #[test]
    fn name_is_stable_across_calls() {
        let first = table_name("data/q3-sales.v2.xlsx", "Raw");
        let second = table_name("data/q3-sales.v2.xlsx", "Raw");
        assert_eq!(first, second);
        assert_eq!(first, "q3_sales_v2_Raw");
    }

    #[test]
    fn windows_separators_are_honoured() {
        assert_eq!(workbook_stem(r"C:\books\budget.xls"), "budget");
    }

    #[test]
    fn stem_keeps_unicode_letters_and_dotfiles() {
        assert_eq!(table_name("/tmp/資產總表.xlsx", "持股"), "資產總表_持股");
        assert_eq!(workbook_stem("/tmp/.hidden"), ".hidden");
        assert_eq!(workbook_stem("plain"), "plain");
    }

    #[test]
    fn target_carries_raw_stem() {
        let target = TableTarget::new("/x/Report-1.xlsx", "S");
        assert_eq!(target.table_name, "Report_1_S");
        assert_eq!(target.workbook_stem, "Report-1");
        assert_eq!(target.sheet_name, "S");
    }
}
