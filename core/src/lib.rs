#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Maze Descent engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query the
//! immutable maze graph, and respond exclusively with new command batches.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Maze Descent.";

/// Largest grid dimension a level may reach before generation is refused.
pub const MAX_LEVEL_DIMENSION: u32 = 101;

/// Largest number of levels a maze may stack.
pub const MAX_LEVEL_COUNT: u32 = 64;

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Discards the current maze and generates a new one.
    GenerateMaze {
        /// Seed feeding the single random stream used during generation.
        seed: u64,
        /// Level layout scalars applied to every generated level.
        config: MazeConfig,
    },
    /// Points the player toward the provided horizontal heading.
    Turn {
        /// Requested heading; the vertical component is ignored.
        heading: Vec3,
    },
    /// Moves the player along an arc leaving its current vertex.
    TraverseArc {
        /// Arc the player should follow.
        arc: ArcId,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Announces that a fresh maze replaced the previous one.
    MazeGenerated {
        /// Seed the maze was generated from.
        seed: u64,
        /// Number of stacked levels in the maze.
        levels: u32,
        /// Vertex the player starts on.
        start: VertexId,
    },
    /// Reports that a generation request carried an invalid configuration.
    GenerationRejected {
        /// Reason the configuration was refused.
        reason: ConfigError,
    },
    /// Confirms that the player now faces a new heading.
    PlayerTurned {
        /// Normalised horizontal heading.
        heading: Vec3,
    },
    /// Reports that a turn request could not be honoured.
    TurnRejected {
        /// Heading supplied with the rejected request.
        heading: Vec3,
    },
    /// Confirms that the player travelled along an arc.
    PlayerMoved {
        /// Vertex the player left.
        from: VertexId,
        /// Vertex the player arrived at.
        to: VertexId,
        /// Arc that was followed.
        arc: ArcId,
    },
    /// Reports that a traversal request was refused.
    TraversalRejected {
        /// Arc supplied with the rejected request.
        arc: ArcId,
        /// Specific reason the traversal failed.
        reason: TraversalError,
    },
    /// Announces that the player stands on a different level than before.
    LevelEntered {
        /// Level the player entered.
        level: LevelId,
    },
    /// Lists vertices that became visible on the inset map.
    VerticesRevealed {
        /// Level containing the revealed vertices.
        level: LevelId,
        /// Newly revealed vertices in discovery order.
        vertices: Vec<VertexId>,
    },
    /// Confirms that the player picked up an item.
    ItemCollected {
        /// Identifier of the collected item.
        item: ItemId,
        /// Vertex the item was lying on.
        vertex: VertexId,
    },
    /// Announces that the player reached the goal at the bottom of the maze.
    GoalReached {
        /// Vertex holding the goal.
        vertex: VertexId,
    },
}

/// Reasons a traversal request may be rejected by the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TraversalError {
    /// No arc with the provided identifier exists in the maze.
    MissingArc,
    /// The arc does not leave the vertex the player stands on.
    NotAtOrigin,
}

/// Reasons a maze configuration may be refused.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigError {
    /// The configuration asked for no levels at all.
    #[error("a maze needs at least one level")]
    NoLevels,
    /// The configuration asked for more than [`MAX_LEVEL_COUNT`] levels.
    #[error(
        "a maze of {level_count} levels was requested; at most {max} are supported",
        max = MAX_LEVEL_COUNT
    )]
    TooManyLevels {
        /// Rejected level count.
        level_count: u32,
    },
    /// A level grid would be too small to carve a maze from.
    #[error("level {level} would have a {dimension}x{dimension} grid; at least 2x2 is required")]
    GridTooSmall {
        /// Zero-based level index.
        level: u32,
        /// Rows and columns of the offending level.
        dimension: u32,
    },
    /// A level grid would exceed [`MAX_LEVEL_DIMENSION`].
    #[error(
        "level {level} would have a {dimension}x{dimension} grid; at most {max} is supported",
        max = MAX_LEVEL_DIMENSION
    )]
    GridTooLarge {
        /// Zero-based level index.
        level: u32,
        /// Rows and columns of the offending level.
        dimension: u32,
    },
    /// Horizontal vertex spacing must be finite and positive.
    #[error("vertex spacing must be finite and positive, got {spacing}")]
    InvalidSpacing {
        /// Rejected spacing value.
        spacing: f32,
    },
    /// Vertical level spacing must be finite and positive.
    #[error("level spacing must be finite and positive, got {spacing}")]
    InvalidLevelSpacing {
        /// Rejected spacing value.
        spacing: f32,
    },
    /// Items cannot be placed zero hops from the entry.
    #[error("item hop distance must be at least 1 when items are placed")]
    InvalidItemHops,
}

/// Scalars that shape every level of a generated maze.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MazeConfig {
    /// Number of levels stacked below each other.
    pub level_count: u32,
    /// Rows and columns of the top level.
    pub base_dimension: u32,
    /// Rows and columns added per level when descending.
    pub dimension_growth: u32,
    /// Horizontal distance between neighbouring vertices.
    pub spacing: f32,
    /// Vertical distance between consecutive levels.
    pub level_spacing: f32,
    /// Items scattered on every level.
    pub items_per_level: u32,
    /// Preferred hop distance between a level's entry and its items.
    pub item_hops: u32,
}

impl Default for MazeConfig {
    fn default() -> Self {
        Self {
            level_count: 4,
            base_dimension: 3,
            dimension_growth: 2,
            spacing: 1.0,
            level_spacing: 1.0,
            items_per_level: 2,
            item_hops: 3,
        }
    }
}

impl MazeConfig {
    /// Rows and columns of the provided level.
    #[must_use]
    pub fn level_dimension(&self, level: LevelId) -> u32 {
        self.base_dimension
            .saturating_add(self.dimension_growth.saturating_mul(level.get()))
    }

    /// Vertical coordinate shared by every vertex of the provided level.
    #[must_use]
    pub fn level_height(&self, level: LevelId) -> f32 {
        -(level.get() as f32) * self.level_spacing
    }

    /// Iterator over the identifiers of every configured level, top first.
    pub fn levels(&self) -> impl Iterator<Item = LevelId> {
        (0..self.level_count).map(LevelId::new)
    }

    /// Checks that the configuration can produce a maze.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.level_count == 0 {
            return Err(ConfigError::NoLevels);
        }
        if self.level_count > MAX_LEVEL_COUNT {
            return Err(ConfigError::TooManyLevels {
                level_count: self.level_count,
            });
        }

        if !(self.spacing.is_finite() && self.spacing > 0.0) {
            return Err(ConfigError::InvalidSpacing {
                spacing: self.spacing,
            });
        }

        if !(self.level_spacing.is_finite() && self.level_spacing > 0.0) {
            return Err(ConfigError::InvalidLevelSpacing {
                spacing: self.level_spacing,
            });
        }

        if self.items_per_level > 0 && self.item_hops == 0 {
            return Err(ConfigError::InvalidItemHops);
        }

        for level in self.levels() {
            let dimension = self.level_dimension(level);
            if dimension < 2 {
                return Err(ConfigError::GridTooSmall {
                    level: level.get(),
                    dimension,
                });
            }
            if dimension > MAX_LEVEL_DIMENSION {
                return Err(ConfigError::GridTooLarge {
                    level: level.get(),
                    dimension,
                });
            }
        }

        Ok(())
    }
}

/// Unique identifier assigned to a vertex of the navigation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(u32);

impl VertexId {
    /// Creates a new vertex identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the vertex within dense per-vertex storage.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Unique identifier assigned to a directed arc of the navigation graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ArcId(u32);

impl ArcId {
    /// Creates a new arc identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Index of the arc within dense per-arc storage.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// Zero-based index of a maze level, counted downward from the top.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LevelId(u32);

impl LevelId {
    /// Creates a new level identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to an item scattered through the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ItemId(u32);

impl ItemId {
    /// Creates a new item identifier.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a vertex within its level grid.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GridCoord {
    row: u32,
    column: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }

    /// Zero-based row index, growing northward along the X axis.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Zero-based column index, growing eastward along the Z axis.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Moves the coordinate by signed increments, returning `None` when either
    /// component would leave the `rows x columns` bounds.
    #[must_use]
    pub fn offset(self, row_step: i32, column_step: i32, rows: u32, columns: u32) -> Option<Self> {
        let row = i64::from(self.row) + i64::from(row_step);
        let column = i64::from(self.column) + i64::from(column_step);
        if row < 0 || column < 0 || row >= i64::from(rows) || column >= i64::from(columns) {
            return None;
        }

        Some(Self::new(u32::try_from(row).ok()?, u32::try_from(column).ok()?))
    }

    /// Computes the Manhattan distance between two grid coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.row.abs_diff(other.row) + self.column.abs_diff(other.column)
    }
}
