#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Maze Descent adapters.
//!
//! The simulation never talks to a backend directly. Adapters translate world
//! queries into a [`Scene`] describing the inset map of one level and hand it
//! to a [`RenderingBackend`].

use std::{error::Error, fmt, io::Write};

use anyhow::Result as AnyResult;
use glam::Vec2;
use maze_descent_core::LevelId;

/// Revealed grid cell of the inset map.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CellPresentation {
    /// Zero-based row; rows grow towards the north.
    pub row: u32,
    /// Zero-based column; columns grow towards the east.
    pub column: u32,
    /// Whether a corridor leads to the cell on the north.
    pub open_north: bool,
    /// Whether a corridor leads to the cell on the east.
    pub open_east: bool,
}

impl CellPresentation {
    /// Creates a cell descriptor.
    #[must_use]
    pub const fn new(row: u32, column: u32, open_north: bool, open_east: bool) -> Self {
        Self {
            row,
            column,
            open_north,
            open_east,
        }
    }
}

/// Something worth pointing out on the inset map.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Marker {
    /// The player, facing along `heading` (x east, y north).
    Player {
        /// Horizontal heading of the player.
        heading: Vec2,
    },
    /// An item still waiting to be picked up.
    Item,
    /// The goal at the bottom of the maze.
    Goal,
    /// Ramp leading to the level below.
    RampDown,
    /// Ramp leading back to the level above.
    RampUp,
}

impl Marker {
    fn glyph(self) -> char {
        match self {
            Self::Player { heading } => heading_glyph(heading),
            Self::Item => '*',
            Self::Goal => 'G',
            Self::RampDown => 'D',
            Self::RampUp => 'U',
        }
    }

    const fn priority(self) -> u8 {
        match self {
            Self::RampUp | Self::RampDown => 0,
            Self::Item => 1,
            Self::Goal => 2,
            Self::Player { .. } => 3,
        }
    }
}

fn heading_glyph(heading: Vec2) -> char {
    if heading.x.abs() > heading.y.abs() {
        if heading.x > 0.0 {
            '>'
        } else {
            '<'
        }
    } else if heading.y >= 0.0 {
        '^'
    } else {
        'v'
    }
}

/// Marker placed on a grid cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerPresentation {
    /// Row of the marked cell.
    pub row: u32,
    /// Column of the marked cell.
    pub column: u32,
    /// What is found on the cell.
    pub marker: Marker,
}

impl MarkerPresentation {
    /// Creates a marker descriptor.
    #[must_use]
    pub const fn new(row: u32, column: u32, marker: Marker) -> Self {
        Self {
            row,
            column,
            marker,
        }
    }
}

/// Inset map of a single level.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Level the map depicts.
    pub level: LevelId,
    /// Number of grid rows.
    pub rows: u32,
    /// Number of grid columns.
    pub columns: u32,
    /// Revealed cells; hidden cells are left out.
    pub cells: Vec<CellPresentation>,
    /// Markers drawn on top of the cells.
    pub markers: Vec<MarkerPresentation>,
}

impl Scene {
    /// Creates an empty map for a level grid.
    pub fn new(level: LevelId, rows: u32, columns: u32) -> Result<Self, RenderingError> {
        if rows == 0 || columns == 0 {
            return Err(RenderingError::EmptyGrid { rows, columns });
        }

        Ok(Self {
            level,
            rows,
            columns,
            cells: Vec::new(),
            markers: Vec::new(),
        })
    }

    /// Adds a revealed cell, rejecting coordinates outside the grid.
    pub fn reveal(&mut self, cell: CellPresentation) -> Result<(), RenderingError> {
        self.check_bounds(cell.row, cell.column)?;
        self.cells.push(cell);
        Ok(())
    }

    /// Adds a marker, rejecting coordinates outside the grid.
    pub fn mark(&mut self, marker: MarkerPresentation) -> Result<(), RenderingError> {
        self.check_bounds(marker.row, marker.column)?;
        self.markers.push(marker);
        Ok(())
    }

    fn check_bounds(&self, row: u32, column: u32) -> Result<(), RenderingError> {
        if row >= self.rows || column >= self.columns {
            return Err(RenderingError::CellOutOfBounds { row, column });
        }
        Ok(())
    }

    /// Draws the scene onto a character canvas, northernmost row first.
    ///
    /// Every cell occupies the odd positions of a `(2 * rows + 1) x
    /// (2 * columns + 1)` canvas; the even positions between cells hold walls
    /// or open corridors.
    #[must_use]
    pub fn to_lines(&self) -> Vec<String> {
        let height = 2 * self.rows as usize + 1;
        let width = 2 * self.columns as usize + 1;
        let mut canvas = vec![vec![' '; width]; height];

        let centre = |row: u32, column: u32| -> (usize, usize) {
            (
                2 * (self.rows - 1 - row) as usize + 1,
                2 * column as usize + 1,
            )
        };

        for cell in &self.cells {
            let (y, x) = centre(cell.row, cell.column);
            for line in &mut canvas[y - 1..=y + 1] {
                for slot in &mut line[x - 1..=x + 1] {
                    if *slot == ' ' {
                        *slot = '#';
                    }
                }
            }
            canvas[y][x] = '.';
        }

        for cell in &self.cells {
            let (y, x) = centre(cell.row, cell.column);
            if cell.open_north {
                canvas[y - 1][x] = '.';
            }
            if cell.open_east {
                canvas[y][x + 1] = '.';
            }
        }

        let mut markers = self.markers.clone();
        markers.sort_by_key(|marker| marker.marker.priority());
        for marker in markers {
            let (y, x) = centre(marker.row, marker.column);
            canvas[y][x] = marker.marker.glyph();
        }

        canvas
            .into_iter()
            .map(|line| line.into_iter().collect::<String>().trim_end().to_owned())
            .collect()
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Heading printed above the map.
    pub title: String,
    /// Map to display.
    pub scene: Scene,
    /// Free-form status lines printed below the map.
    pub status: Vec<String>,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(title: T, scene: Scene, status: Vec<String>) -> Self
    where
        T: Into<String>,
    {
        Self {
            title: title.into(),
            scene,
            status,
        }
    }
}

/// Rendering backend capable of presenting Maze Descent scenes.
pub trait RenderingBackend {
    /// Presents a single frame.
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()>;
}

/// Backend that prints the inset map as plain text.
#[derive(Debug)]
pub struct TextBackend<W: Write> {
    writer: W,
}

impl<W: Write> TextBackend<W> {
    /// Creates a backend writing frames to `writer`.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Consumes the backend, returning the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> RenderingBackend for TextBackend<W> {
    fn present(&mut self, presentation: &Presentation) -> AnyResult<()> {
        writeln!(self.writer, "{}", presentation.title)?;
        writeln!(self.writer, "level {}", presentation.scene.level.get())?;
        for line in presentation.scene.to_lines() {
            writeln!(self.writer, "{line}")?;
        }
        for line in &presentation.status {
            writeln!(self.writer, "{line}")?;
        }
        self.writer.flush()?;
        Ok(())
    }
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq, Eq)]
pub enum RenderingError {
    /// Maps need at least one row and one column.
    EmptyGrid {
        /// Requested rows.
        rows: u32,
        /// Requested columns.
        columns: u32,
    },
    /// A cell or marker lies outside the map.
    CellOutOfBounds {
        /// Offending row.
        row: u32,
        /// Offending column.
        column: u32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyGrid { rows, columns } => {
                write!(f, "inset map needs a non-empty grid (received {rows}x{columns})")
            }
            Self::CellOutOfBounds { row, column } => {
                write!(f, "cell ({row}, {column}) lies outside the inset map")
            }
        }
    }
}

impl Error for RenderingError {}
