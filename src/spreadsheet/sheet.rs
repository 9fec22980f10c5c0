use crate::spreadsheet::cell::Cell;
use crate::spreadsheet::range::Range;
use std::collections::HashMap;

/// Cells collected from one worksheet, restricted to the requested region.
pub(crate) struct Sheet {
    /// Source file name
    pub(crate) file_name: String,
    /// Sheet name
    pub(crate) name: String,
    /// Non-empty cells inside the region, in document order
    pub(crate) cells: Vec<Cell>,
    /// Requested region
    pub(super) range: Range,
    /// Extent of the cells actually present
    pub(crate) row_lower_bound: Option<usize>,
    pub(crate) row_upper_bound: Option<usize>,
    pub(crate) col_lower_bound: Option<usize>,
    pub(crate) col_upper_bound: Option<usize>,
}

impl Sheet {
    pub(crate) fn new(file_name: &str, name: &str, range: Range) -> Self {
        Self {
            file_name: file_name.to_owned(),
            name: name.to_owned(),
            cells: Vec::new(),
            range,
            row_lower_bound: None,
            row_upper_bound: None,
            col_lower_bound: None,
            col_upper_bound: None,
        }
    }

    pub(super) fn before_row_lower_bound(&self, row: usize) -> bool {
        self.range.row_lower_bound.map(|lower| row < lower).unwrap_or(false)
    }

    /// Once true for a row, it is true for every later row; readers stop there.
    pub(super) fn after_row_upper_bound(&self, row: usize) -> bool {
        self.range.row_upper_bound.map(|upper| upper < row).unwrap_or(false)
    }

    pub(super) fn before_col_lower_bound(&self, col: usize) -> bool {
        self.range.col_lower_bound.map(|lower| col < lower).unwrap_or(false)
    }

    pub(super) fn after_col_upper_bound(&self, col: usize) -> bool {
        self.range.col_upper_bound.map(|upper| upper < col).unwrap_or(false)
    }

    pub(super) fn contains(&self, row: usize, col: usize) -> bool {
        !self.before_row_lower_bound(row)
            && !self.after_row_upper_bound(row)
            && !self.before_col_lower_bound(col)
            && !self.after_col_upper_bound(col)
    }

    /// Adds a cell if it lies inside the region.
    pub(crate) fn push(&mut self, cell: Cell) {
        if self.contains(cell.row, cell.col) {
            self.update_bound(cell.row, cell.col);
            self.cells.push(cell);
        }
    }

    fn update_bound(&mut self, row: usize, col: usize) {
        self.row_lower_bound = Some(self.row_lower_bound.map_or(row, |lower| lower.min(row)));
        self.row_upper_bound = Some(self.row_upper_bound.map_or(row, |upper| upper.max(row)));
        self.col_lower_bound = Some(self.col_lower_bound.map_or(col, |lower| lower.min(col)));
        self.col_upper_bound = Some(self.col_upper_bound.map_or(col, |upper| upper.max(col)));
    }

    /// First row of the region: the explicit lower bound, else the first populated row.
    pub(crate) fn header_row(&self) -> Option<usize> {
        self.range.row_lower_bound.or(self.row_lower_bound)
    }

    /// Lays the cells out as a grid from the header row to the last populated row
    /// inside the region. Missing cells are `None`.
    pub(crate) fn table(&self) -> Vec<Vec<Option<&Cell>>> {
        let (Some(row_lower), Some(row_upper)) = (self.header_row(), self.row_upper_bound) else {
            return Vec::new();
        };
        let col_lower = self.range.col_lower_bound.or(self.col_lower_bound).unwrap_or(0);
        let col_upper = self.range.col_upper_bound.or(self.col_upper_bound).unwrap_or(col_lower);
        if row_upper < row_lower || col_upper < col_lower {
            return Vec::new();
        }

        let indexes: HashMap<(usize, usize), usize> = self
            .cells
            .iter()
            .enumerate()
            .map(|(index, cell)| ((cell.row, cell.col), index))
            .collect();
        (row_lower..=row_upper)
            .map(|row| {
                (col_lower..=col_upper)
                    .map(|col| indexes.get(&(row, col)).map(|index| &self.cells[*index]))
                    .collect()
            })
            .collect()
    }
}
