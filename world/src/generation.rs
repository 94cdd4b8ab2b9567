//! Multi-level maze generation.

use glam::Vec3;
use log::debug;
use maze_descent_core::{ArcId, GridCoord, ItemId, LevelId, MazeConfig, VertexId};
use rand::Rng;

use crate::{
    graph::NavGraph,
    level::{LevelEntry, LevelLayout, MazeLevel},
};

/// Collectible lying on a vertex of the maze.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Item {
    id: ItemId,
    level: LevelId,
    vertex: VertexId,
}

impl Item {
    /// Identifier of the item.
    #[must_use]
    pub const fn id(&self) -> ItemId {
        self.id
    }

    /// Level the item lies on.
    #[must_use]
    pub const fn level(&self) -> LevelId {
        self.level
    }

    /// Vertex the item lies on.
    #[must_use]
    pub const fn vertex(&self) -> VertexId {
        self.vertex
    }
}

/// Stack of perfect-maze levels sharing one navigation graph.
#[derive(Clone, Debug)]
pub struct Maze {
    config: MazeConfig,
    graph: NavGraph,
    levels: Vec<MazeLevel>,
    start: ArcId,
    items: Vec<Item>,
    goal: VertexId,
}

impl Maze {
    /// Generates every level of the maze from a single random stream.
    ///
    /// The stream is consumed in a fixed order: pruning of the top level, the
    /// start arc, pruning of each lower level, then item placement. The same
    /// stream state and configuration therefore always yield the same maze.
    ///
    /// # Panics
    ///
    /// Panics when the configuration does not validate.
    pub fn generate<R: Rng + ?Sized>(config: &MazeConfig, rng: &mut R) -> Self {
        if let Err(error) = config.validate() {
            panic!("invalid maze configuration: {error}");
        }

        let mut graph = NavGraph::new();
        let mut levels: Vec<MazeLevel> = Vec::new();
        let mut start: Option<(ArcId, VertexId)> = None;

        for id in config.levels() {
            let layout = LevelLayout::from_config(config, id);
            let entry = match (levels.last(), start) {
                (Some(above), Some((_, start_vertex))) => {
                    let origin = above.entry().unwrap_or(start_vertex);
                    Some(descend_from(&graph, above, origin, &layout))
                }
                _ => None,
            };

            let level = MazeLevel::generate(&mut graph, layout, entry, rng);
            if let (Some(above), Some(source)) = (levels.last_mut(), level.entry_source()) {
                above.set_exit(source);
            }

            if start.is_none() {
                let arc = graph.random_arc_among(rng, &level.vertex_ids());
                start = Some((arc, graph.arc(arc).from()));
            }

            debug!(
                "level {} carved: {}x{} grid, {} corridors, entry {:?}",
                id.get(),
                level.rows(),
                level.columns(),
                level.pair_count(&graph),
                level.entry()
            );
            levels.push(level);
        }

        let Some((start, start_vertex)) = start else {
            unreachable!("validated configurations contain at least one level");
        };

        let goal = match levels.last() {
            Some(bottom) => graph.find_furthest(
                bottom.entry().unwrap_or(start_vertex),
                Some(&bottom.vertex_ids()),
            ),
            None => start_vertex,
        };

        let items = place_items(&graph, &levels, start_vertex, goal, config, rng);

        Self {
            config: config.clone(),
            graph,
            levels,
            start,
            items,
            goal,
        }
    }

    /// Configuration the maze was generated from.
    #[must_use]
    pub fn config(&self) -> &MazeConfig {
        &self.config
    }

    /// Navigation graph spanning every level.
    #[must_use]
    pub fn graph(&self) -> &NavGraph {
        &self.graph
    }

    /// Levels ordered from the top down.
    #[must_use]
    pub fn levels(&self) -> &[MazeLevel] {
        &self.levels
    }

    /// Retrieves a level by identifier.
    #[must_use]
    pub fn level(&self, id: LevelId) -> Option<&MazeLevel> {
        self.levels.get(id.get() as usize)
    }

    /// Level containing the provided vertex.
    #[must_use]
    pub fn level_of(&self, vertex: VertexId) -> Option<LevelId> {
        self.levels
            .iter()
            .find(|level| level.contains(vertex))
            .map(MazeLevel::id)
    }

    /// Arc the player sets off along when the game starts.
    #[must_use]
    pub const fn start(&self) -> ArcId {
        self.start
    }

    /// Vertex the player starts on.
    #[must_use]
    pub fn start_vertex(&self) -> VertexId {
        self.graph.arc(self.start).from()
    }

    /// Items scattered through the maze, ordered by identifier.
    #[must_use]
    pub fn items(&self) -> &[Item] {
        &self.items
    }

    /// Vertex holding the goal on the bottom level.
    #[must_use]
    pub const fn goal(&self) -> VertexId {
        self.goal
    }

    /// Ramps joining consecutive levels, top first.
    #[must_use]
    pub fn ramps(&self) -> Vec<ArcId> {
        self.levels.iter().filter_map(MazeLevel::ramp).collect()
    }

    /// Vertex at a grid coordinate of a level.
    #[must_use]
    pub fn vertex_at(&self, level: LevelId, coord: GridCoord) -> Option<VertexId> {
        self.level(level)?.vertex_at(coord)
    }

    /// Vertex nearest to a world-space location, picking the level by height.
    #[must_use]
    pub fn nearest_vertex(&self, location: Vec3) -> VertexId {
        let depth = (-location.y / self.config.level_spacing).round();
        let deepest = (self.levels.len() - 1) as f32;
        let index = depth.clamp(0.0, deepest) as usize;
        self.levels[index].nearest_vertex(location)
    }

    /// The vertex itself plus every vertex visible from it along the four grid
    /// directions of its level.
    #[must_use]
    pub fn visible_from(&self, vertex: VertexId) -> Vec<VertexId> {
        let Some(level) = self.level_of(vertex).and_then(|id| self.level(id)) else {
            return Vec::new();
        };

        let mut visible = vec![vertex];
        for (row_step, column_step) in [(1, 0), (0, 1), (-1, 0), (0, -1)] {
            visible.extend(level.line_of_sight(&self.graph, vertex, row_step, column_step));
        }
        visible
    }
}

/// Picks the exit of the level above and the point below it where the ramp
/// to the next level touches down.
fn descend_from(
    graph: &NavGraph,
    above: &MazeLevel,
    origin: VertexId,
    layout: &LevelLayout,
) -> LevelEntry {
    let exit = graph.find_furthest(origin, Some(&above.vertex_ids()));
    let location = graph.vertex(exit).location();

    // The furthest vertex of a tree is a dead end; the ramp continues away
    // from its only corridor.
    let outward = graph
        .outgoing(exit)
        .next()
        .map_or(Vec3::ZERO, |(_, arc)| -arc.direction());
    let outward = Vec3::new(outward.x, 0.0, outward.z);

    let landing = Vec3::new(
        location.x + outward.x * layout.spacing,
        layout.height,
        location.z + outward.z * layout.spacing,
    );
    LevelEntry::new(exit, landing)
}

fn place_items<R: Rng + ?Sized>(
    graph: &NavGraph,
    levels: &[MazeLevel],
    start_vertex: VertexId,
    goal: VertexId,
    config: &MazeConfig,
    rng: &mut R,
) -> Vec<Item> {
    let mut items = Vec::new();
    let mut taken = vec![false; graph.vertex_count()];
    taken[goal.index()] = true;

    for level in levels {
        let origin = level.entry().unwrap_or(start_vertex);
        taken[origin.index()] = true;
        if let Some(exit) = level.exit() {
            taken[exit.index()] = true;
        }

        for _ in 0..config.items_per_level {
            let Some(vertex) = pick_item_vertex(graph, level, origin, config.item_hops, &taken, rng)
            else {
                break;
            };
            taken[vertex.index()] = true;
            items.push(Item {
                id: ItemId::new(items.len() as u32),
                level: level.id(),
                vertex,
            });
        }
    }

    items
}

/// Chooses a free vertex of `level` at `hops` from `origin`, moving closer to
/// the origin until some vertex qualifies.
fn pick_item_vertex<R: Rng + ?Sized>(
    graph: &NavGraph,
    level: &MazeLevel,
    origin: VertexId,
    hops: u32,
    taken: &[bool],
    rng: &mut R,
) -> Option<VertexId> {
    for distance in (1..=hops).rev() {
        let candidates: Vec<VertexId> = graph
            .find_by_hops(distance, origin)
            .into_iter()
            .filter(|vertex| level.contains(*vertex) && !taken[vertex.index()])
            .collect();
        if candidates.is_empty() {
            continue;
        }

        let pick = rng.gen_range(0..candidates.len() as u32) as usize;
        return Some(candidates[pick]);
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn generate(seed: u64, config: &MazeConfig) -> Maze {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        Maze::generate(config, &mut rng)
    }

    #[test]
    fn levels_grow_and_descend() {
        let maze = generate(1, &MazeConfig::default());

        let shapes: Vec<(u32, u32, f32)> = maze
            .levels()
            .iter()
            .map(|level| (level.rows(), level.columns(), level.height()))
            .collect();
        assert_eq!(
            shapes,
            vec![(3, 3, 0.0), (5, 5, -1.0), (7, 7, -2.0), (9, 9, -3.0)]
        );
        assert_eq!(maze.graph().vertex_count(), 9 + 25 + 49 + 81);
    }

    #[test]
    fn ramps_join_each_exit_to_the_next_entry() {
        let maze = generate(2, &MazeConfig::default());
        let levels = maze.levels();

        assert!(levels[0].entry().is_none());
        assert!(levels[3].exit().is_none());
        for pair in levels.windows(2) {
            let exit = pair[0].exit().expect("upper level has an exit");
            let entry = pair[1].entry().expect("lower level has an entry");
            let ramp = maze.graph().arc(pair[1].ramp().expect("ramp present"));
            assert_eq!(ramp.from(), exit);
            assert_eq!(ramp.to(), entry);
            assert!(pair[0].contains(exit));
            assert!(pair[1].contains(entry));
        }
        assert_eq!(maze.ramps().len(), 3);
        assert!(maze.graph().is_connected());
    }

    #[test]
    fn exit_is_the_furthest_vertex_from_the_level_entry() {
        let maze = generate(3, &MazeConfig::default());
        let top = &maze.levels()[0];
        let exit = top.exit().expect("exit");
        let distances = maze.graph().hop_distances(maze.start_vertex());

        let furthest = top
            .vertex_ids()
            .into_iter()
            .filter_map(|vertex| distances[vertex.index()])
            .max()
            .expect("reachable vertices");
        assert_eq!(distances[exit.index()], Some(furthest));
    }

    #[test]
    fn start_arc_lies_on_the_top_level() {
        let maze = generate(4, &MazeConfig::default());
        let start = maze.graph().arc(maze.start());
        assert_eq!(maze.level_of(start.from()), Some(LevelId::new(0)));
        assert_eq!(maze.level_of(start.to()), Some(LevelId::new(0)));
    }

    #[test]
    fn items_avoid_entries_exits_and_the_goal() {
        let config = MazeConfig {
            items_per_level: 3,
            ..MazeConfig::default()
        };
        let maze = generate(5, &config);

        assert_eq!(maze.level_of(maze.goal()), Some(LevelId::new(3)));
        for item in maze.items() {
            let level = maze.level(item.level()).expect("item level");
            assert!(level.contains(item.vertex()));
            assert_ne!(item.vertex(), maze.goal());
            assert_ne!(Some(item.vertex()), level.entry());
            assert_ne!(Some(item.vertex()), level.exit());
            assert_ne!(item.vertex(), maze.start_vertex());
        }
        let mut vertices: Vec<VertexId> = maze.items().iter().map(Item::vertex).collect();
        vertices.sort();
        vertices.dedup();
        assert_eq!(vertices.len(), maze.items().len());
    }

    #[test]
    fn nearest_vertex_selects_level_by_height() {
        let maze = generate(6, &MazeConfig::default());
        let second = &maze.levels()[1];
        let vertex = second.vertex_at(GridCoord::new(4, 0)).expect("in range");
        let location = maze.graph().vertex(vertex).location();

        assert_eq!(maze.nearest_vertex(location), vertex);
        assert_eq!(
            maze.nearest_vertex(Vec3::new(0.0, -40.0, 0.0)),
            maze.levels()[3]
                .vertex_at(GridCoord::new(4, 4))
                .expect("centre")
        );
        assert_eq!(maze.vertex_at(LevelId::new(1), GridCoord::new(4, 0)), Some(vertex));
    }

    #[test]
    fn single_level_maze_places_goal_on_the_top_level() {
        let config = MazeConfig {
            level_count: 1,
            ..MazeConfig::default()
        };
        let maze = generate(7, &config);
        assert_eq!(maze.levels().len(), 1);
        assert!(maze.ramps().is_empty());
        assert_eq!(maze.level_of(maze.goal()), Some(LevelId::new(0)));
        assert_eq!(
            maze.goal(),
            maze.graph().find_furthest(maze.start_vertex(), None)
        );
    }

    #[test]
    #[should_panic(expected = "invalid maze configuration")]
    fn invalid_configuration_fails_fast() {
        let config = MazeConfig {
            base_dimension: 1,
            ..MazeConfig::default()
        };
        let _ = generate(0, &config);
    }
}
