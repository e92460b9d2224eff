//! Rectangular Walkable/Blocked rasters.
//!
//! A [`GridMap`] is the logical map of a chapter. Cells are stored row-major
//! (`index = gy * width + gx`). Lookups take signed coordinates so callers can
//! probe neighbourhoods past the edge without casting; anything outside the
//! extents reads as [`Cell::Blocked`].

use glam::IVec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised when building a grid.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GridError {
    /// No rows, or rows of zero width.
    #[error("grid must have at least one row and one column")]
    Empty,
    /// A row's length differs from the first row.
    #[error("row {row} has {actual} cells, expected {expected}")]
    RaggedRow {
        /// Row index
        row: usize,
        /// Width of the first row
        expected: usize,
        /// Width of the offending row
        actual: usize,
    },
    /// Cell count does not match `width * height`.
    #[error("cell count mismatch: expected {expected}, got {actual}")]
    CellCountMismatch {
        /// `width * height`
        expected: usize,
        /// Cells supplied
        actual: usize,
    },
    /// A row contains a character that is not a known cell glyph.
    #[error("unknown cell glyph {glyph:?} at row {row}, column {column}")]
    UnknownGlyph {
        /// The offending character
        glyph: char,
        /// Row index
        row: usize,
        /// Column index
        column: usize,
    },
    /// The start cell lies outside the grid.
    #[error("start cell ({x}, {y}) is outside the {width}x{height} grid")]
    StartOutOfRange {
        /// Start x
        x: i32,
        /// Start y
        y: i32,
        /// Grid width
        width: u32,
        /// Grid height
        height: u32,
    },
    /// The start cell is Blocked.
    #[error("start cell ({x}, {y}) is blocked")]
    StartBlocked {
        /// Start x
        x: i32,
        /// Start y
        y: i32,
    },
    /// Generator parameters are out of range.
    #[error("invalid generator parameters: {0}")]
    InvalidGenerator(String),
}

/// One grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Cell {
    /// Impassable
    #[default]
    Blocked,
    /// Passable
    Walkable,
}

impl Cell {
    /// Parse a single map glyph: `.`/`0` walkable, `#`/`1` blocked.
    #[must_use]
    pub fn from_glyph(glyph: char) -> Option<Self> {
        match glyph {
            '.' | '0' => Some(Self::Walkable),
            '#' | '1' => Some(Self::Blocked),
            _ => None,
        }
    }

    /// Render as a map glyph.
    #[must_use]
    pub fn glyph(self) -> char {
        match self {
            Self::Walkable => '.',
            Self::Blocked => '#',
        }
    }

    /// Returns `true` for [`Cell::Walkable`].
    #[must_use]
    pub fn is_walkable(self) -> bool {
        matches!(self, Self::Walkable)
    }
}

/// Rectangular map of cells.
///
/// # Example
///
/// ```
/// use terra::{Cell, GridMap};
///
/// let grid = GridMap::from_rows(&["..#", "#.."]).unwrap();
/// assert_eq!(grid.width(), 3);
/// assert_eq!(grid.height(), 2);
/// assert_eq!(grid.get(2, 0), Some(Cell::Blocked));
/// assert!(grid.is_walkable(1, 1));
/// assert!(!grid.is_walkable(-1, 0));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawGridMap")]
pub struct GridMap {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

/// Unchecked serialized form; deserialization goes through [`GridMap::new`].
#[derive(Deserialize)]
struct RawGridMap {
    width: u32,
    height: u32,
    cells: Vec<Cell>,
}

impl TryFrom<RawGridMap> for GridMap {
    type Error = GridError;

    fn try_from(raw: RawGridMap) -> Result<Self, Self::Error> {
        Self::new(raw.width, raw.height, raw.cells)
    }
}

impl GridMap {
    /// Build a grid from a flat row-major cell vector.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Empty`] for zero dimensions and
    /// [`GridError::CellCountMismatch`] if `cells` is the wrong length.
    pub fn new(width: u32, height: u32, cells: Vec<Cell>) -> Result<Self, GridError> {
        if width == 0 || height == 0 {
            return Err(GridError::Empty);
        }
        let expected = width as usize * height as usize;
        if cells.len() != expected {
            return Err(GridError::CellCountMismatch {
                expected,
                actual: cells.len(),
            });
        }
        Ok(Self {
            width,
            height,
            cells,
        })
    }

    /// Build a grid where every cell holds `cell`.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::Empty`] for zero dimensions.
    pub fn filled(width: u32, height: u32, cell: Cell) -> Result<Self, GridError> {
        Self::new(width, height, vec![cell; width as usize * height as usize])
    }

    /// Parse a grid from text rows (see [`Cell::from_glyph`]).
    ///
    /// # Errors
    ///
    /// Returns [`GridError`] if the rows are empty, ragged, or contain an
    /// unknown glyph.
    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, GridError> {
        let Some(first) = rows.first() else {
            return Err(GridError::Empty);
        };
        let expected = first.as_ref().chars().count();
        if expected == 0 {
            return Err(GridError::Empty);
        }

        let mut cells = Vec::with_capacity(expected * rows.len());
        for (row, text) in rows.iter().enumerate() {
            let text = text.as_ref();
            let actual = text.chars().count();
            if actual != expected {
                return Err(GridError::RaggedRow {
                    row,
                    expected,
                    actual,
                });
            }
            for (column, glyph) in text.chars().enumerate() {
                let cell = Cell::from_glyph(glyph).ok_or(GridError::UnknownGlyph {
                    glyph,
                    row,
                    column,
                })?;
                cells.push(cell);
            }
        }

        let width = u32::try_from(expected).map_err(|_| GridError::Empty)?;
        let height = u32::try_from(rows.len()).map_err(|_| GridError::Empty)?;
        Self::new(width, height, cells)
    }

    /// Grid width in cells.
    #[must_use]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Grid height in cells.
    #[must_use]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Row-major cell storage.
    #[must_use]
    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    /// Row-major index of a cell, or `None` when out of range.
    #[must_use]
    #[allow(clippy::cast_sign_loss)]
    pub fn index_of(&self, gx: i32, gy: i32) -> Option<usize> {
        if gx < 0 || gy < 0 {
            return None;
        }
        let (x, y) = (gx as u32, gy as u32);
        if x >= self.width || y >= self.height {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    /// Returns `true` if `(gx, gy)` lies inside the grid.
    #[must_use]
    pub fn contains(&self, gx: i32, gy: i32) -> bool {
        self.index_of(gx, gy).is_some()
    }

    /// Cell at `(gx, gy)`, or `None` when out of range.
    #[must_use]
    pub fn get(&self, gx: i32, gy: i32) -> Option<Cell> {
        self.index_of(gx, gy).map(|index| self.cells[index])
    }

    /// Overwrite a cell. Out-of-range writes are ignored.
    pub fn set(&mut self, gx: i32, gy: i32, cell: Cell) {
        if let Some(index) = self.index_of(gx, gy) {
            self.cells[index] = cell;
        }
    }

    /// Returns `true` if the cell exists and is walkable.
    #[must_use]
    pub fn is_walkable(&self, gx: i32, gy: i32) -> bool {
        self.get(gx, gy).is_some_and(Cell::is_walkable)
    }

    /// Number of walkable cells.
    #[must_use]
    pub fn walkable_count(&self) -> usize {
        self.cells.iter().filter(|c| c.is_walkable()).count()
    }

    /// Fail unless `start` is an in-range walkable cell.
    ///
    /// # Errors
    ///
    /// Returns [`GridError::StartOutOfRange`] or [`GridError::StartBlocked`].
    pub fn ensure_walkable_start(&self, start: IVec2) -> Result<(), GridError> {
        match self.get(start.x, start.y) {
            None => Err(GridError::StartOutOfRange {
                x: start.x,
                y: start.y,
                width: self.width,
                height: self.height,
            }),
            Some(Cell::Blocked) => Err(GridError::StartBlocked {
                x: start.x,
                y: start.y,
            }),
            Some(Cell::Walkable) => Ok(()),
        }
    }

    /// Render the grid back into text rows.
    #[must_use]
    pub fn to_rows(&self) -> Vec<String> {
        self.cells
            .chunks(self.width as usize)
            .map(|row| row.iter().map(|c| c.glyph()).collect())
            .collect()
    }
}

// =============================================================================
// Tests
// =============================================================================
