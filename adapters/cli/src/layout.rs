//! ASCII grid layout parsing.
//!
//! Layouts are rectangular blocks of symbols, one row per line:
//! `.` empty ground, `#` blocked, `=` path, `S` spawn, `E` exit. Blank lines
//! and leading/trailing whitespace around the block are ignored.

use gridspire_core::CellKind;
use gridspire_world::GridMap;
use thiserror::Error;

/// Failures raised while parsing an ASCII layout.
#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum LayoutError {
    /// The input held no rows at all.
    #[error("layout is empty")]
    Empty,
    /// A row's width differed from the first row's.
    #[error("row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        found: usize,
    },
    /// An unrecognized symbol appeared in the grid block.
    #[error("unknown symbol {symbol:?} at row {row}, column {column}")]
    UnknownSymbol {
        /// The offending character.
        symbol: char,
        /// Zero-based row index.
        row: usize,
        /// Zero-based column index.
        column: usize,
    },
    /// The layout declared no spawn cell.
    #[error("layout has no spawn cell")]
    MissingSpawn,
    /// The layout declared no exit cell.
    #[error("layout has no exit cell")]
    MissingExit,
}

/// Parses an ASCII layout into a grid map with the provided cell size.
pub(crate) fn parse(input: &str, cell_size: f32) -> Result<GridMap, LayoutError> {
    let rows: Vec<&str> = input
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();
    let Some(first) = rows.first() else {
        return Err(LayoutError::Empty);
    };
    let width = first.chars().count();

    let mut kinds = Vec::with_capacity(width * rows.len());
    let mut has_spawn = false;
    let mut has_exit = false;
    for (row_index, row) in rows.iter().enumerate() {
        let found = row.chars().count();
        if found != width {
            return Err(LayoutError::RaggedRow {
                row: row_index,
                expected: width,
                found,
            });
        }
        for (column, symbol) in row.chars().enumerate() {
            let kind = match symbol {
                '.' => CellKind::Empty,
                '#' => CellKind::Blocked,
                '=' => CellKind::Path,
                'S' => CellKind::Spawn,
                'E' => CellKind::Exit,
                other => {
                    return Err(LayoutError::UnknownSymbol {
                        symbol: other,
                        row: row_index,
                        column,
                    })
                }
            };
            has_spawn |= kind == CellKind::Spawn;
            has_exit |= kind == CellKind::Exit;
            kinds.push(kind);
        }
    }
    if !has_spawn {
        return Err(LayoutError::MissingSpawn);
    }
    if !has_exit {
        return Err(LayoutError::MissingExit);
    }

    let grid = GridMap::from_layout(width as u32, rows.len() as u32, cell_size, &kinds)
        .expect("cell count matches the declared dimensions");
    Ok(grid)
}
