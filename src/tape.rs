//! The cell tape and its data pointer.

/// Default number of cells on the tape.
pub const DEFAULT_TAPE_LEN: usize = 30_000;

/// The tape's cells could not be allocated.
#[derive(Debug, thiserror::Error)]
#[error("Out of memory allocating a tape of {len} cells")]
pub struct TapeAllocError {
    pub len: usize,
}

/// A fixed-length tape of signed byte cells with a clamped data pointer.
///
/// Moving the pointer past either end is a no-op. Cell arithmetic wraps.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tape {
    cells: Vec<i8>,
    pointer: usize,
}

impl Tape {
    /// Create a zeroed tape of `len` cells. A length of 0 is raised to 1 so
    /// the data pointer always addresses a cell.
    pub fn new(len: usize) -> Self {
        Self {
            cells: vec![0; len.max(1)],
            pointer: 0,
        }
    }

    /// Like [`Tape::new`], but reports allocation failure instead of aborting.
    pub fn try_new(len: usize) -> Result<Self, TapeAllocError> {
        let len = len.max(1);
        let mut cells: Vec<i8> = Vec::new();
        cells
            .try_reserve_exact(len)
            .map_err(|_| TapeAllocError { len })?;
        cells.resize(len, 0);
        Ok(Self { cells, pointer: 0 })
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    /// Always false; a tape holds at least one cell.
    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn pointer(&self) -> usize {
        self.pointer
    }

    pub fn cells(&self) -> &[i8] {
        &self.cells
    }

    /// `<`
    pub fn move_left(&mut self) {
        if self.pointer > 0 {
            self.pointer -= 1;
        }
    }

    /// `>`
    pub fn move_right(&mut self) {
        if self.pointer < self.cells.len() - 1 {
            self.pointer += 1;
        }
    }

    /// `+`
    pub fn increment(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_add(1);
    }

    /// `-`
    pub fn decrement(&mut self) {
        let cell = &mut self.cells[self.pointer];
        *cell = cell.wrapping_sub(1);
    }

    /// Value of the current cell.
    pub fn get(&self) -> i8 {
        self.cells[self.pointer]
    }

    /// Overwrite the current cell.
    pub fn set(&mut self, value: i8) {
        self.cells[self.pointer] = value;
    }

    /// The current cell reinterpreted as an unsigned byte, as written by `.`.
    pub fn byte(&self) -> u8 {
        self.get() as u8
    }
}

impl Default for Tape {
    fn default() -> Self {
        Self::new(DEFAULT_TAPE_LEN)
    }
}
