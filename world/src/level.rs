//! Grid embedding of a single maze level.
//!
//! A level lays a rectangular grid of vertices into the shared [`NavGraph`],
//! joins every pair of grid neighbours, and then carves a perfect maze by
//! removing random arc pairs for as long as the level stays connected. The
//! level below the top one is reached through a ramp that lands on the
//! level's entry vertex.

use glam::Vec3;
use log::trace;
use maze_descent_core::{ArcId, GridCoord, LevelId, MazeConfig, VertexId};
use rand::Rng;

use crate::graph::NavGraph;

/// Dimensions and placement of one level grid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelLayout {
    /// Level the layout belongs to.
    pub id: LevelId,
    /// Number of grid rows, laid out along the X axis.
    pub rows: u32,
    /// Number of grid columns, laid out along the Z axis.
    pub columns: u32,
    /// Horizontal distance between neighbouring vertices.
    pub spacing: f32,
    /// Vertical coordinate shared by every vertex of the level.
    pub height: f32,
}

impl LevelLayout {
    /// Derives the layout of a level from the maze configuration.
    #[must_use]
    pub fn from_config(config: &MazeConfig, id: LevelId) -> Self {
        let dimension = config.level_dimension(id);
        Self {
            id,
            rows: dimension,
            columns: dimension,
            spacing: config.spacing,
            height: config.level_height(id),
        }
    }
}

/// Ramp arriving at a level from the level above.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LevelEntry {
    source: VertexId,
    landing: Vec3,
}

impl LevelEntry {
    /// Describes a ramp leaving `source` and touching down near `landing`.
    #[must_use]
    pub const fn new(source: VertexId, landing: Vec3) -> Self {
        Self { source, landing }
    }

    /// Vertex of the upper level the ramp departs from.
    #[must_use]
    pub const fn source(&self) -> VertexId {
        self.source
    }

    /// World-space point the ramp aims for on the new level.
    #[must_use]
    pub const fn landing(&self) -> Vec3 {
        self.landing
    }
}

/// One perfect-maze level embedded in the navigation graph.
#[derive(Clone, Debug)]
pub struct MazeLevel {
    layout: LevelLayout,
    first_vertex: u32,
    entry: Option<VertexId>,
    entry_source: Option<VertexId>,
    ramp: Option<ArcId>,
    exit: Option<VertexId>,
}

impl MazeLevel {
    /// Lays out, connects and carves a level inside `graph`.
    ///
    /// The random stream is consumed only while pruning, so the same stream
    /// state always carves the same corridors.
    ///
    /// # Panics
    ///
    /// Panics when the layout has fewer than two rows or two columns.
    pub fn generate<R: Rng + ?Sized>(
        graph: &mut NavGraph,
        layout: LevelLayout,
        entry: Option<LevelEntry>,
        rng: &mut R,
    ) -> Self {
        assert!(
            layout.rows > 1 && layout.columns > 1,
            "level {} needs at least a 2x2 grid, got {}x{}",
            layout.id.get(),
            layout.rows,
            layout.columns
        );

        let mut level = Self::lay_out(graph, layout);
        level.connect_neighbours(graph);

        if let Some(entry) = entry {
            let vertex = level.nearest_vertex(entry.landing());
            level.entry = Some(vertex);
            level.entry_source = Some(entry.source());
            level.reserve_entry(graph, entry.source(), vertex);
        }

        level.prune(graph, rng);

        if let (Some(source), Some(vertex)) = (level.entry_source, level.entry) {
            level.ramp = Some(graph.connect(source, vertex));
        }

        level
    }

    fn lay_out(graph: &mut NavGraph, layout: LevelLayout) -> Self {
        let first_vertex = u32::try_from(graph.vertex_count())
            .expect("navigation graph exceeds u32 identifiers");
        let level = Self {
            layout,
            first_vertex,
            entry: None,
            entry_source: None,
            ramp: None,
            exit: None,
        };

        for row in 0..layout.rows {
            for column in 0..layout.columns {
                let coord = GridCoord::new(row, column);
                let _ = graph.add_vertex(
                    format!("level {} ({row}, {column})", layout.id.get()),
                    level.location_of(coord),
                );
            }
        }

        level
    }

    fn connect_neighbours(&self, graph: &mut NavGraph) {
        for row in 0..self.layout.rows {
            for column in 0..self.layout.columns {
                let here = self.vertex_id(GridCoord::new(row, column));
                if row + 1 < self.layout.rows {
                    let _ = graph.connect(here, self.vertex_id(GridCoord::new(row + 1, column)));
                }
                if column + 1 < self.layout.columns {
                    let _ = graph.connect(here, self.vertex_id(GridCoord::new(row, column + 1)));
                }
            }
        }
    }

    /// Removes the corridor of `entry` that the ramp from `source` descends
    /// through. Only corridors heading toward the source side qualify.
    fn reserve_entry(&self, graph: &mut NavGraph, source: VertexId, entry: VertexId) {
        let offset = graph.vertex(source).location() - graph.vertex(entry).location();
        let Some(toward_source) = Vec3::new(offset.x, 0.0, offset.z).try_normalize() else {
            return;
        };

        let Some(arc) = graph.find_least_turn(entry, toward_source) else {
            return;
        };
        if graph.arc(arc).direction().dot(toward_source) > 0.0 {
            trace!("level {} reserves {arc:?} for its ramp", self.layout.id.get());
            graph.remove_pair(arc);
        }
    }

    /// Removes random arc pairs until the level is a spanning tree.
    fn prune<R: Rng + ?Sized>(&self, graph: &mut NavGraph, rng: &mut R) {
        let scope = self.vertex_ids();
        let target = scope.len() - 1;
        let mut pairs = self.pair_count(graph);

        while pairs > target {
            let arc = graph.random_arc_among(rng, &scope);
            if graph.spans_without(arc, &scope) {
                graph.remove_pair(arc);
                pairs -= 1;
            }
        }
    }

    /// Identifier of the level.
    #[must_use]
    pub const fn id(&self) -> LevelId {
        self.layout.id
    }

    /// Number of grid rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.layout.rows
    }

    /// Number of grid columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.layout.columns
    }

    /// Vertical coordinate of the level.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.layout.height
    }

    /// Vertex the ramp from the level above lands on.
    #[must_use]
    pub const fn entry(&self) -> Option<VertexId> {
        self.entry
    }

    /// Vertex of the level above the ramp departs from.
    #[must_use]
    pub const fn entry_source(&self) -> Option<VertexId> {
        self.entry_source
    }

    /// Arc descending from the entry source onto the entry vertex.
    #[must_use]
    pub const fn ramp(&self) -> Option<ArcId> {
        self.ramp
    }

    /// Vertex the ramp to the level below departs from.
    #[must_use]
    pub const fn exit(&self) -> Option<VertexId> {
        self.exit
    }

    pub(crate) fn set_exit(&mut self, vertex: VertexId) {
        self.exit = Some(vertex);
    }

    /// Number of vertices in the level.
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.layout.rows as usize * self.layout.columns as usize
    }

    /// Identifiers of every vertex in row-major order.
    #[must_use]
    pub fn vertex_ids(&self) -> Vec<VertexId> {
        let count = self.layout.rows * self.layout.columns;
        (self.first_vertex..self.first_vertex + count)
            .map(VertexId::new)
            .collect()
    }

    /// Reports whether the vertex belongs to this level.
    #[must_use]
    pub fn contains(&self, vertex: VertexId) -> bool {
        self.coord_of(vertex).is_some()
    }

    /// Vertex stored at the provided grid coordinate.
    #[must_use]
    pub fn vertex_at(&self, coord: GridCoord) -> Option<VertexId> {
        if coord.row() < self.layout.rows && coord.column() < self.layout.columns {
            Some(self.vertex_id(coord))
        } else {
            None
        }
    }

    /// Grid coordinate of a vertex belonging to this level.
    #[must_use]
    pub fn coord_of(&self, vertex: VertexId) -> Option<GridCoord> {
        let local = vertex.get().checked_sub(self.first_vertex)?;
        if local >= self.layout.rows * self.layout.columns {
            return None;
        }
        Some(GridCoord::new(
            local / self.layout.columns,
            local % self.layout.columns,
        ))
    }

    /// World-space location of a grid coordinate.
    #[must_use]
    pub fn location_of(&self, coord: GridCoord) -> Vec3 {
        Vec3::new(
            self.axis_location(coord.row(), self.layout.rows),
            self.layout.height,
            self.axis_location(coord.column(), self.layout.columns),
        )
    }

    /// Row nearest to a world-space location, clamped to the grid.
    #[must_use]
    pub fn row_of(&self, location: Vec3) -> u32 {
        self.axis_index(location.x, self.layout.rows)
    }

    /// Column nearest to a world-space location, clamped to the grid.
    #[must_use]
    pub fn column_of(&self, location: Vec3) -> u32 {
        self.axis_index(location.z, self.layout.columns)
    }

    /// Vertex nearest to a world-space location, clamped to the grid.
    #[must_use]
    pub fn nearest_vertex(&self, location: Vec3) -> VertexId {
        self.vertex_id(GridCoord::new(
            self.row_of(location),
            self.column_of(location),
        ))
    }

    /// Steps one grid cell from `from` and returns the neighbour only when an
    /// arc joins the two cells.
    ///
    /// # Panics
    ///
    /// Panics when both increments are zero.
    #[must_use]
    pub fn next_line_of_sight(
        &self,
        graph: &NavGraph,
        from: VertexId,
        row_step: i32,
        column_step: i32,
    ) -> Option<VertexId> {
        assert!(
            row_step != 0 || column_step != 0,
            "line of sight needs a non-zero grid step"
        );
        let coord = self.coord_of(from)?;
        let next = coord.offset(row_step, column_step, self.layout.rows, self.layout.columns)?;
        let neighbour = self.vertex_id(next);
        graph.find_arc(from, neighbour).map(|_| neighbour)
    }

    /// Vertices visible from `from` along a straight grid line, nearest first.
    #[must_use]
    pub fn line_of_sight(
        &self,
        graph: &NavGraph,
        from: VertexId,
        row_step: i32,
        column_step: i32,
    ) -> Vec<VertexId> {
        let mut visible = Vec::new();
        let mut current = from;
        while let Some(next) = self.next_line_of_sight(graph, current, row_step, column_step) {
            visible.push(next);
            current = next;
        }
        visible
    }

    /// Number of arc pairs joining two vertices of this level. Ramps are not
    /// counted.
    #[must_use]
    pub fn pair_count(&self, graph: &NavGraph) -> usize {
        let internal = self
            .vertex_ids()
            .into_iter()
            .flat_map(|vertex| graph.outgoing(vertex))
            .filter(|(_, arc)| self.contains(arc.to()))
            .count();
        internal / 2
    }

    fn vertex_id(&self, coord: GridCoord) -> VertexId {
        VertexId::new(self.first_vertex + coord.row() * self.layout.columns + coord.column())
    }

    fn axis_location(&self, index: u32, dimension: u32) -> f32 {
        let centre = (dimension / 2) as f32;
        self.layout.spacing * (index as f32 - centre)
    }

    fn axis_index(&self, coordinate: f32, dimension: u32) -> u32 {
        let centre = (dimension / 2) as f32;
        let index = (coordinate / self.layout.spacing).round() + centre;
        index.clamp(0.0, (dimension - 1) as f32) as u32
    }
}
