/// Panel grid of a display session, filled row by row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Grid {
    pub rows: usize,
    pub cols: usize,
}

impl Grid {
    pub const SINGLE: Grid = Grid { rows: 1, cols: 1 };

    /// Grid for side-by-side volumes: one row up to three panels, 2x2 for four.
    pub fn for_volume_count(count: usize) -> Self {
        match count {
            0 | 1 => Self::SINGLE,
            4 => Grid { rows: 2, cols: 2 },
            n => Grid { rows: 1, cols: n },
        }
    }

    pub fn panel_count(&self) -> usize {
        self.rows * self.cols
    }

    /// (row, column) of a panel
    pub fn position(&self, panel: usize) -> (usize, usize) {
        (panel / self.cols, panel % self.cols)
    }
}
