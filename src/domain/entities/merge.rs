use std::collections::HashMap;
use std::fmt;

use thiserror::Error;

/// Rectangular block of merged cells, inclusive on both corners.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MergeRegion {
    start: (u32, u32),
    end: (u32, u32),
}

impl MergeRegion {
    /// Builds a region from two opposite corners, in any order.
    pub fn new(a: (u32, u32), b: (u32, u32)) -> Self {
        Self {
            start: (a.0.min(b.0), a.1.min(b.1)),
            end: (a.0.max(b.0), a.1.max(b.1)),
        }
    }

    pub fn start(&self) -> (u32, u32) {
        self.start
    }

    pub fn end(&self) -> (u32, u32) {
        self.end
    }

    pub fn is_degenerate(&self) -> bool {
        self.start == self.end
    }

    pub fn span(&self) -> Span {
        Span {
            rows: (self.end.0 - self.start.0).saturating_add(1),
            cols: (self.end.1 - self.start.1).saturating_add(1),
        }
    }

    pub fn cell_count(&self) -> u64 {
        (u64::from(self.end.0 - self.start.0) + 1) * (u64::from(self.end.1 - self.start.1) + 1)
    }

    pub fn contains(&self, row: u32, col: u32) -> bool {
        (self.start.0..=self.end.0).contains(&row) && (self.start.1..=self.end.1).contains(&col)
    }

    pub fn intersects(&self, other: &MergeRegion) -> bool {
        self.start.0 <= other.end.0
            && other.start.0 <= self.end.0
            && self.start.1 <= other.end.1
            && other.start.1 <= self.end.1
    }

    fn cells(&self) -> impl Iterator<Item = (u32, u32)> + '_ {
        (self.start.0..=self.end.0)
            .flat_map(move |row| (self.start.1..=self.end.1).map(move |col| (row, col)))
    }
}

impl fmt::Display for MergeRegion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})..({},{})",
            self.start.0, self.start.1, self.end.0, self.end.1
        )
    }
}

/// How many grid cells a rendered cell occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Span {
    pub rows: u32,
    pub cols: u32,
}

impl Span {
    pub const UNMERGED: Span = Span { rows: 1, cols: 1 };
    pub const SUPPRESSED: Span = Span { rows: 0, cols: 0 };

    pub fn is_suppressed(&self) -> bool {
        *self == Span::SUPPRESSED
    }
}

impl From<Span> for (u32, u32) {
    fn from(span: Span) -> Self {
        (span.rows, span.cols)
    }
}

impl PartialEq<(u32, u32)> for Span {
    fn eq(&self, other: &(u32, u32)) -> bool {
        self.rows == other.0 && self.cols == other.1
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellRole {
    Unmerged,
    Origin(Span),
    /// Hidden behind the origin cell of its region.
    Covered { origin: (u32, u32) },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    #[error("merge region {region} overlaps existing region {existing}")]
    Overlap {
        region: MergeRegion,
        existing: MergeRegion,
    },
    #[error("merge region {0} covers a single cell")]
    Degenerate(MergeRegion),
    #[error("merge region {region} covers {cells} cells, more than {max}", max = MAX_REGION_CELLS)]
    TooLarge { region: MergeRegion, cells: u64 },
}

/// Largest region `MergeIndex` accepts. Every covered cell gets an index
/// entry, so whole-sheet merges from broken files are refused.
pub const MAX_REGION_CELLS: u64 = 1 << 22;

/// A region `set_regions` skipped, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRegion {
    pub region: MergeRegion,
    pub error: MergeError,
}

/// Merge regions of one sheet with O(1) span lookups per cell.
#[derive(Debug, Clone, Default)]
pub struct MergeIndex {
    regions: Vec<MergeRegion>,
    // covered cell -> index into `regions`
    covered: HashMap<(u32, u32), usize>,
}

impl MergeIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_region(&mut self, region: MergeRegion) -> Result<(), MergeError> {
        if region.is_degenerate() {
            return Err(MergeError::Degenerate(region));
        }
        let cells = region.cell_count();
        if cells > MAX_REGION_CELLS {
            return Err(MergeError::TooLarge { region, cells });
        }
        if let Some(existing) = self.regions.iter().find(|r| r.intersects(&region)) {
            return Err(MergeError::Overlap {
                region,
                existing: *existing,
            });
        }

        let slot = self.regions.len();
        self.regions.push(region);
        self.covered.extend(region.cells().map(|cell| (cell, slot)));
        Ok(())
    }

    pub fn span_at(&self, row: u32, col: u32) -> Span {
        match self.role_at(row, col) {
            CellRole::Unmerged => Span::UNMERGED,
            CellRole::Origin(span) => span,
            CellRole::Covered { .. } => Span::SUPPRESSED,
        }
    }

    pub fn role_at(&self, row: u32, col: u32) -> CellRole {
        match self.region_at(row, col) {
            None => CellRole::Unmerged,
            Some(region) if region.start() == (row, col) => CellRole::Origin(region.span()),
            Some(region) => CellRole::Covered {
                origin: region.start(),
            },
        }
    }

    /// Top-left cell of the region covering `(row, col)`, if any.
    pub fn origin_of(&self, row: u32, col: u32) -> Option<(u32, u32)> {
        self.region_at(row, col).map(|region| region.start())
    }

    pub fn region_at(&self, row: u32, col: u32) -> Option<&MergeRegion> {
        self.covered
            .get(&(row, col))
            .and_then(|&slot| self.regions.get(slot))
    }

    pub fn clear(&mut self) {
        self.regions.clear();
        self.covered.clear();
    }

    /// Replaces every region. Invalid regions are skipped and returned; the
    /// rest of the batch is still applied.
    pub fn set_regions<I>(&mut self, regions: I) -> Vec<RejectedRegion>
    where
        I: IntoIterator<Item = MergeRegion>,
    {
        self.clear();
        let mut rejected = Vec::new();
        for region in regions {
            if let Err(error) = self.add_region(region) {
                log::warn!("skipping merge region {region}: {error}");
                rejected.push(RejectedRegion { region, error });
            }
        }
        rejected
    }

    pub fn regions(&self) -> &[MergeRegion] {
        &self.regions
    }

    pub fn len(&self) -> usize {
        self.regions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.regions.is_empty()
    }
}

impl FromIterator<MergeRegion> for MergeIndex {
    fn from_iter<I: IntoIterator<Item = MergeRegion>>(iter: I) -> Self {
        let mut index = MergeIndex::new();
        index.set_regions(iter);
        index
    }
}
