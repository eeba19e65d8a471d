use std::fmt;

/// Width and height of the board.
pub const BOARD_SIDE: usize = 9;

/// Number of cells in a board payload.
pub const BOARD_CELLS: usize = BOARD_SIDE * BOARD_SIDE;

/// A board coordinate, 0-indexed. Both components are always `<= 8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Cell {
    row: u8,
    col: u8,
}

impl Cell {
    /// Returns `None` if either component is off the board.
    pub fn new(row: u8, col: u8) -> Option<Self> {
        if usize::from(row) < BOARD_SIDE && usize::from(col) < BOARD_SIDE {
            Some(Self { row, col })
        } else {
            None
        }
    }

    pub fn row(self) -> u8 {
        self.row
    }

    pub fn col(self) -> u8 {
        self.col
    }

    /// Row-major offset into a board payload.
    pub fn index(self) -> usize {
        usize::from(self.row) * BOARD_SIDE + usize::from(self.col)
    }

    fn from_index(index: usize) -> Self {
        Self {
            row: (index / BOARD_SIDE) as u8,
            col: (index % BOARD_SIDE) as u8,
        }
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// One full board as reported by the controller.
///
/// Values are 0-9 with 0 meaning empty. The controller is authoritative, so
/// other byte values are carried through untouched. A snapshot is never
/// edited in place; every board frame produces a new one.
#[derive(Clone, PartialEq, Eq)]
pub struct BoardSnapshot {
    cells: [u8; BOARD_CELLS],
}

impl BoardSnapshot {
    /// Build a snapshot from an 81-byte row-major payload.
    pub fn from_payload(payload: &[u8]) -> Option<Self> {
        payload.try_into().ok().map(Self::from_cells)
    }

    pub fn from_cells(cells: [u8; BOARD_CELLS]) -> Self {
        Self { cells }
    }

    /// A board with every cell empty.
    pub fn empty() -> Self {
        Self {
            cells: [0; BOARD_CELLS],
        }
    }

    pub fn get(&self, cell: Cell) -> u8 {
        self.cells[cell.index()]
    }

    /// One row of nine values.
    pub fn row(&self, row: usize) -> Option<&[u8]> {
        self.cells.chunks_exact(BOARD_SIDE).nth(row)
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8]> {
        self.cells.chunks_exact(BOARD_SIDE)
    }

    /// The raw row-major payload.
    pub fn as_bytes(&self) -> &[u8; BOARD_CELLS] {
        &self.cells
    }

    pub fn empty_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v == 0)
            .map(|(i, _)| Cell::from_index(i))
    }

    pub fn filled_cells(&self) -> impl Iterator<Item = Cell> + '_ {
        self.cells
            .iter()
            .enumerate()
            .filter(|(_, v)| **v != 0)
            .map(|(i, _)| Cell::from_index(i))
    }

    pub fn empty_count(&self) -> usize {
        self.cells.iter().filter(|v| **v == 0).count()
    }
}

impl Default for BoardSnapshot {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BoardSnapshot")
            .field("empty", &self.empty_count())
            .finish()
    }
}

/// Renders the board as nine lines with `.` for empty cells and a gap
/// between 3x3 boxes.
impl fmt::Display for BoardSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (r, row) in self.rows().enumerate() {
            if r > 0 && r % 3 == 0 {
                writeln!(f)?;
            }
            for (c, value) in row.iter().enumerate() {
                if c > 0 {
                    f.write_str(if c % 3 == 0 { "  " } else { " " })?;
                }
                if *value == 0 {
                    f.write_str(".")?;
                } else {
                    write!(f, "{value}")?;
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

/// Percentage of originally empty cells that are now filled, clamped to
/// 0-100. Returns 0 when the puzzle started with no empty cells.
pub fn progress_percent(total_empty: u8, current_empty: u8) -> u8 {
    if total_empty == 0 {
        return 0;
    }
    let filled = i32::from(total_empty) - i32::from(current_empty);
    let pct = filled * 100 / i32::from(total_empty);
    pct.clamp(0, 100) as u8
}
