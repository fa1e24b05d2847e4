use std::path::Path;

use crate::domain::entities::merge::MergeIndex;
use crate::domain::entities::sheet::{LoadedSheet, SheetRef, SheetSelector};
use crate::error::{Result, SheetError};
use crate::infra::import::open_workbook_source;
use crate::usecase::ports::source::WorkbookSource;

struct OpenedWorkbook {
    path: String,
    source: Box<dyn WorkbookSource>,
    sheets: Vec<SheetRef>,
}

/// Sheet listing for the currently opened workbook. Rebuilt on every open.
#[derive(Default)]
pub struct WorkbookCatalog {
    opened: Option<OpenedWorkbook>,
}

impl WorkbookCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn list_sheets(&mut self, workbook_path: &Path) -> Result<Vec<SheetRef>> {
        self.opened = None;
        let source = open_workbook_source(workbook_path).map_err(SheetError::Source)?;
        self.open_with(&workbook_path.to_string_lossy(), source)
    }

    /// Same as [`list_sheets`](Self::list_sheets) with an already opened source.
    pub fn open_with(
        &mut self,
        workbook_path: &str,
        source: Box<dyn WorkbookSource>,
    ) -> Result<Vec<SheetRef>> {
        let sheets: Vec<SheetRef> = source
            .sheet_names()
            .into_iter()
            .enumerate()
            .map(|(index, name)| SheetRef {
                index: index as u32,
                name,
            })
            .collect();
        log::info!("read {} sheets from {workbook_path}", sheets.len());

        self.opened = Some(OpenedWorkbook {
            path: workbook_path.to_string(),
            source,
            sheets: sheets.clone(),
        });
        Ok(sheets)
    }

    pub fn close(&mut self) {
        self.opened = None;
    }

    pub fn workbook_path(&self) -> Result<&str> {
        self.opened().map(|opened| opened.path.as_str())
    }

    pub fn sheets(&self) -> Result<&[SheetRef]> {
        self.opened().map(|opened| opened.sheets.as_slice())
    }

    pub fn resolve(&self, selector: &SheetSelector) -> Result<SheetRef> {
        let sheets = self.sheets()?;
        let found = match selector {
            SheetSelector::Index(index) => sheets.get(*index as usize),
            SheetSelector::Name(name) => sheets.iter().find(|sheet| &sheet.name == name),
            SheetSelector::Ref(sheet_ref) => sheets.iter().find(|sheet| *sheet == sheet_ref),
        };
        found
            .cloned()
            .ok_or_else(|| SheetError::SheetNotFound(selector.to_string()))
    }

    /// Reads a sheet's cells and builds its merge index. Malformed merge
    /// regions are skipped, never fatal.
    pub fn read_sheet(&mut self, selector: &SheetSelector) -> Result<LoadedSheet> {
        let sheet = self.resolve(selector)?;
        let opened = self
            .opened
            .as_mut()
            .ok_or(SheetError::CatalogNotInitialized)?;

        let contents = opened
            .source
            .read_sheet(&sheet.name)
            .map_err(SheetError::Source)?;

        let mut merges = MergeIndex::new();
        let rejected = merges.set_regions(contents.merges);
        if !rejected.is_empty() {
            log::warn!(
                "sheet `{}` kept {} merge regions, skipped {}",
                sheet.name,
                merges.len(),
                rejected.len()
            );
        }

        Ok(LoadedSheet {
            sheet,
            data: contents.data,
            merges,
        })
    }

    fn opened(&self) -> Result<&OpenedWorkbook> {
        self.opened.as_ref().ok_or(SheetError::CatalogNotInitialized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::cell::CellValue;
    use crate::domain::entities::merge::{MergeRegion, Span};
    use crate::domain::entities::sheet::{RawSheetData, SheetContents};

    struct FakeSource {
        sheets: Vec<(String, SheetContents)>,
    }

    impl WorkbookSource for FakeSource {
        fn sheet_names(&self) -> Vec<String> {
            self.sheets.iter().map(|(name, _)| name.clone()).collect()
        }

        fn read_sheet(&mut self, name: &str) -> anyhow::Result<SheetContents> {
            self.sheets
                .iter()
                .find(|(sheet, _)| sheet == name)
                .map(|(_, contents)| contents.clone())
                .ok_or_else(|| anyhow::anyhow!("no sheet {name}"))
        }
    }

    fn fake_catalog() -> WorkbookCatalog {
        let summary = SheetContents {
            data: RawSheetData::new(vec![vec![CellValue::from("Title"), CellValue::Null]]),
            merges: vec![
                MergeRegion::new((0, 0), (0, 1)),
                MergeRegion::new((0, 1), (1, 1)),
            ],
        };
        let source = FakeSource {
            sheets: vec![
                ("Summary".to_string(), summary),
                ("Detail".to_string(), SheetContents::default()),
            ],
        };

        let mut catalog = WorkbookCatalog::new();
        catalog
            .open_with("/books/report.xlsx", Box::new(source))
            .expect("fake workbook should open");
        catalog
    }

    #[test]
    fn reads_before_listing_are_rejected() {
        let mut catalog = WorkbookCatalog::new();

        let err = catalog
            .resolve(&SheetSelector::Index(0))
            .expect_err("uninitialized catalog should fail");
        assert!(matches!(err, SheetError::CatalogNotInitialized));

        let err = catalog
            .read_sheet(&SheetSelector::from("Summary"))
            .expect_err("uninitialized catalog should fail");
        assert!(matches!(err, SheetError::CatalogNotInitialized));
    }

    #[test]
    fn selectors_resolve_to_the_same_sheet() {
        let catalog = fake_catalog();
        let detail = SheetRef {
            index: 1,
            name: "Detail".to_string(),
        };

        assert_eq!(catalog.resolve(&SheetSelector::Index(1)).ok(), Some(detail.clone()));
        assert_eq!(catalog.resolve(&"Detail".into()).ok(), Some(detail.clone()));
        assert_eq!(catalog.resolve(&detail.clone().into()).ok(), Some(detail));
    }

    #[test]
    fn unknown_selectors_are_not_found() {
        let catalog = fake_catalog();

        for selector in [
            SheetSelector::Index(2),
            SheetSelector::from("Missing"),
            SheetSelector::Ref(SheetRef {
                index: 0,
                name: "Detail".to_string(),
            }),
        ] {
            let err = catalog.resolve(&selector).expect_err("selector should not resolve");
            assert!(
                matches!(err, SheetError::SheetNotFound(_)),
                "unexpected error: {err}"
            );
        }
    }

    #[test]
    fn read_sheet_builds_tolerant_merge_index() {
        let mut catalog = fake_catalog();
        let loaded = catalog
            .read_sheet(&SheetSelector::Index(0))
            .expect("sheet should load");

        assert_eq!(loaded.sheet.name, "Summary");
        assert_eq!(loaded.merges.len(), 1);
        assert_eq!(loaded.merges.span_at(0, 0), (1, 2));
        assert_eq!(loaded.merges.span_at(1, 1), Span::UNMERGED);
    }

    #[test]
    fn reopening_rebuilds_and_close_forgets() {
        let mut catalog = fake_catalog();
        let sheets = catalog
            .open_with(
                "/books/other.xlsx",
                Box::new(FakeSource {
                    sheets: vec![("Only".to_string(), SheetContents::default())],
                }),
            )
            .expect("second workbook should open");

        assert_eq!(sheets.len(), 1);
        assert_eq!(catalog.workbook_path().ok(), Some("/books/other.xlsx"));
        assert!(catalog.resolve(&"Summary".into()).is_err());

        catalog.close();
        assert!(matches!(
            catalog.sheets(),
            Err(SheetError::CatalogNotInitialized)
        ));
    }
}
