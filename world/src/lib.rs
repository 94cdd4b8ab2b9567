#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Maze Descent.

pub mod generation;
pub mod graph;
pub mod level;

use glam::Vec3;
use log::{info, warn};
use maze_descent_core::{
    Command, ConfigError, Event, LevelId, MazeConfig, TraversalError, VertexId, WELCOME_BANNER,
};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::generation::Maze;

/// Seed used by [`World::new`] when no seed is supplied.
pub const DEFAULT_MAZE_SEED: u64 = 0x6d61_7a65_2d64_6573;

/// Represents the authoritative Maze Descent world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    seed: u64,
    maze: Maze,
    player: Player,
    revealed: Vec<bool>,
    collected: Vec<bool>,
    goal_reached: bool,
}

#[derive(Clone, Copy, Debug)]
struct Player {
    vertex: VertexId,
    heading: Vec3,
    level: LevelId,
}

impl World {
    /// Creates a world holding the default maze generated from
    /// [`DEFAULT_MAZE_SEED`].
    #[must_use]
    pub fn new() -> Self {
        let mut world = Self::generate(DEFAULT_MAZE_SEED, &MazeConfig::default());
        let _ = world.reveal_around(world.player.vertex);
        world
    }

    /// Creates a world from an explicit seed and configuration.
    pub fn with_seed(seed: u64, config: &MazeConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let mut world = Self::generate(seed, config);
        let _ = world.reveal_around(world.player.vertex);
        Ok(world)
    }

    fn generate(seed: u64, config: &MazeConfig) -> Self {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let maze = Maze::generate(config, &mut rng);
        let start = maze.graph().arc(maze.start());
        let heading = horizontal(start.direction()).unwrap_or(Vec3::X);
        let player = Player {
            vertex: start.from(),
            heading,
            level: LevelId::new(0),
        };

        info!(
            "generated maze from seed {seed:#x}: {} levels, {} vertices, {} items",
            maze.levels().len(),
            maze.graph().vertex_count(),
            maze.items().len()
        );

        Self {
            banner: WELCOME_BANNER,
            seed,
            revealed: vec![false; maze.graph().vertex_count()],
            collected: vec![false; maze.items().len()],
            goal_reached: false,
            player,
            maze,
        }
    }

    /// Marks everything visible from `vertex` as revealed, returning the
    /// vertices that were hidden until now.
    fn reveal_around(&mut self, vertex: VertexId) -> Vec<VertexId> {
        let mut newly_revealed = Vec::new();
        for visible in self.maze.visible_from(vertex) {
            let slot = &mut self.revealed[visible.index()];
            if !*slot {
                *slot = true;
                newly_revealed.push(visible);
            }
        }
        newly_revealed
    }

    fn arrive(&mut self, vertex: VertexId, out_events: &mut Vec<Event>) {
        if let Some(level) = self.maze.level_of(vertex) {
            if level != self.player.level {
                self.player.level = level;
                info!("entered level {}", level.get());
                out_events.push(Event::LevelEntered { level });
            }
        }

        let vertices = self.reveal_around(vertex);
        if !vertices.is_empty() {
            out_events.push(Event::VerticesRevealed {
                level: self.player.level,
                vertices,
            });
        }

        for (index, item) in self.maze.items().iter().enumerate() {
            if item.vertex() == vertex && !self.collected[index] {
                self.collected[index] = true;
                out_events.push(Event::ItemCollected {
                    item: item.id(),
                    vertex,
                });
            }
        }

        if vertex == self.maze.goal() && !self.goal_reached {
            self.goal_reached = true;
            info!("goal reached at vertex {}", vertex.get());
            out_events.push(Event::GoalReached { vertex });
        }
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

/// Applies the provided command to the world, mutating state deterministically.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::GenerateMaze { seed, config } => {
            if let Err(reason) = config.validate() {
                warn!("refusing maze generation: {reason}");
                out_events.push(Event::GenerationRejected { reason });
                return;
            }

            *world = World::generate(seed, &config);
            let start = world.player.vertex;
            out_events.push(Event::MazeGenerated {
                seed,
                levels: config.level_count,
                start,
            });
            out_events.push(Event::LevelEntered {
                level: world.player.level,
            });
            let vertices = world.reveal_around(start);
            out_events.push(Event::VerticesRevealed {
                level: world.player.level,
                vertices,
            });
        }
        Command::Turn { heading } => match horizontal(heading) {
            Some(normalised) => {
                world.player.heading = normalised;
                out_events.push(Event::PlayerTurned {
                    heading: normalised,
                });
            }
            None => out_events.push(Event::TurnRejected { heading }),
        },
        Command::TraverseArc { arc } => {
            let Some(candidate) = world.maze.graph().get_arc(arc).copied() else {
                out_events.push(Event::TraversalRejected {
                    arc,
                    reason: TraversalError::MissingArc,
                });
                return;
            };
            if candidate.from() != world.player.vertex {
                out_events.push(Event::TraversalRejected {
                    arc,
                    reason: TraversalError::NotAtOrigin,
                });
                return;
            }

            world.player.vertex = candidate.to();
            if let Some(heading) = horizontal(candidate.direction()) {
                world.player.heading = heading;
            }
            out_events.push(Event::PlayerMoved {
                from: candidate.from(),
                to: candidate.to(),
                arc,
            });
            world.arrive(candidate.to(), out_events);
        }
    }
}

fn horizontal(direction: Vec3) -> Option<Vec3> {
    Vec3::new(direction.x, 0.0, direction.z).try_normalize()
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use glam::Vec3;
    use maze_descent_core::{ArcId, ItemId, LevelId, VertexId};

    use super::World;
    use crate::{generation::Maze, graph::NavGraph};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Seed the current maze was generated from.
    #[must_use]
    pub fn seed(world: &World) -> u64 {
        world.seed
    }

    /// Provides read-only access to the generated maze.
    #[must_use]
    pub fn maze(world: &World) -> &Maze {
        &world.maze
    }

    /// Provides read-only access to the navigation graph spanning all levels.
    #[must_use]
    pub fn graph(world: &World) -> &NavGraph {
        world.maze.graph()
    }

    /// Captures where the player stands and which way it faces.
    #[must_use]
    pub fn player(world: &World) -> PlayerSnapshot {
        PlayerSnapshot {
            vertex: world.player.vertex,
            heading: world.player.heading,
            level: world.player.level,
            location: world.maze.graph().vertex(world.player.vertex).location(),
        }
    }

    /// Exposes the graph around the player for systems that steer it.
    #[must_use]
    pub fn navigation_view(world: &World) -> NavigationView<'_> {
        NavigationView {
            graph: world.maze.graph(),
            vertex: world.player.vertex,
            heading: world.player.heading,
            goal: world.maze.goal(),
        }
    }

    /// Reports whether the vertex has been seen by the player.
    #[must_use]
    pub fn is_revealed(world: &World, vertex: VertexId) -> bool {
        world
            .revealed
            .get(vertex.index())
            .copied()
            .unwrap_or(false)
    }

    /// Enumerates the revealed vertices of a level in identifier order.
    #[must_use]
    pub fn revealed_vertices(world: &World, level: LevelId) -> Vec<VertexId> {
        world
            .maze
            .level(level)
            .map(|level| {
                level
                    .vertex_ids()
                    .into_iter()
                    .filter(|vertex| world.revealed[vertex.index()])
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Captures every item together with its collection state.
    #[must_use]
    pub fn items(world: &World) -> Vec<ItemSnapshot> {
        world
            .maze
            .items()
            .iter()
            .zip(&world.collected)
            .map(|(item, collected)| ItemSnapshot {
                id: item.id(),
                level: item.level(),
                vertex: item.vertex(),
                collected: *collected,
            })
            .collect()
    }

    /// Vertex holding the goal.
    #[must_use]
    pub fn goal(world: &World) -> VertexId {
        world.maze.goal()
    }

    /// Reports whether the player has reached the goal.
    #[must_use]
    pub fn goal_reached(world: &World) -> bool {
        world.goal_reached
    }

    /// Immutable representation of the player used for queries.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct PlayerSnapshot {
        /// Vertex the player stands on.
        pub vertex: VertexId,
        /// Normalised horizontal heading.
        pub heading: Vec3,
        /// Level containing the player.
        pub level: LevelId,
        /// World-space location of the player's vertex.
        pub location: Vec3,
    }

    /// Immutable representation of a single item.
    #[derive(Clone, Copy, Debug, PartialEq, Eq)]
    pub struct ItemSnapshot {
        /// Identifier of the item.
        pub id: ItemId,
        /// Level the item lies on.
        pub level: LevelId,
        /// Vertex the item lies on.
        pub vertex: VertexId,
        /// Indicates whether the player already picked the item up.
        pub collected: bool,
    }

    /// Read-only view of the graph from the player's point of view.
    #[derive(Clone, Copy, Debug)]
    pub struct NavigationView<'a> {
        graph: &'a NavGraph,
        vertex: VertexId,
        heading: Vec3,
        goal: VertexId,
    }

    impl<'a> NavigationView<'a> {
        /// Graph the player navigates.
        #[must_use]
        pub fn graph(&self) -> &'a NavGraph {
            self.graph
        }

        /// Vertex the player stands on.
        #[must_use]
        pub fn vertex(&self) -> VertexId {
            self.vertex
        }

        /// Heading the player faces.
        #[must_use]
        pub fn heading(&self) -> Vec3 {
            self.heading
        }

        /// Reports whether the player stands on the goal.
        #[must_use]
        pub fn at_goal(&self) -> bool {
            self.vertex == self.goal
        }

        /// Number of arcs leaving the player's vertex.
        #[must_use]
        pub fn exits(&self) -> usize {
            self.graph.vertex(self.vertex).arcs().len()
        }

        /// Arc leaving the player's vertex that deviates least from `direction`.
        #[must_use]
        pub fn least_turn(&self, direction: Vec3) -> Option<ArcId> {
            self.graph.find_least_turn(self.vertex, direction)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use maze_descent_core::ArcId;

    fn generate(world: &mut World, seed: u64, config: MazeConfig) -> Vec<Event> {
        let mut events = Vec::new();
        apply(world, Command::GenerateMaze { seed, config }, &mut events);
        events
    }

    #[test]
    fn new_world_reveals_the_start() {
        let world = World::new();
        let player = query::player(&world);

        assert_eq!(query::seed(&world), DEFAULT_MAZE_SEED);
        assert_eq!(query::welcome_banner(&world), WELCOME_BANNER);
        assert!(query::is_revealed(&world, player.vertex));
        assert_eq!(player.level, LevelId::new(0));
        assert!((player.heading.length() - 1.0).abs() < 1e-5);
        assert_eq!(player.heading.y, 0.0);
    }

    #[test]
    fn generate_maze_announces_the_new_maze() {
        let mut world = World::new();
        let config = MazeConfig {
            level_count: 2,
            ..MazeConfig::default()
        };
        let events = generate(&mut world, 11, config);

        let start = query::player(&world).vertex;
        assert_eq!(
            events[0],
            Event::MazeGenerated {
                seed: 11,
                levels: 2,
                start,
            }
        );
        assert_eq!(
            events[1],
            Event::LevelEntered {
                level: LevelId::new(0)
            }
        );
        match &events[2] {
            Event::VerticesRevealed { level, vertices } => {
                assert_eq!(*level, LevelId::new(0));
                assert_eq!(vertices[0], start);
            }
            other => panic!("unexpected event {other:?}"),
        }
        assert_eq!(query::seed(&world), 11);
        assert_eq!(query::maze(&world).levels().len(), 2);
    }

    #[test]
    fn invalid_configuration_is_rejected_without_replacing_the_maze() {
        let mut world = World::new();
        let before = query::graph(&world).vertex_count();
        let config = MazeConfig {
            level_count: 0,
            ..MazeConfig::default()
        };
        let events = generate(&mut world, 3, config);

        assert_eq!(
            events,
            vec![Event::GenerationRejected {
                reason: ConfigError::NoLevels
            }]
        );
        assert_eq!(query::graph(&world).vertex_count(), before);
        assert!(World::with_seed(3, &MazeConfig {
            level_count: 0,
            ..MazeConfig::default()
        })
        .is_err());
    }

    #[test]
    fn traversal_moves_the_player_and_updates_heading() {
        let mut world = World::new();
        let arc_id = query::maze(&world).start();
        let arc = *query::graph(&world).arc(arc_id);
        let mut events = Vec::new();

        apply(&mut world, Command::TraverseArc { arc: arc_id }, &mut events);

        assert_eq!(
            events[0],
            Event::PlayerMoved {
                from: arc.from(),
                to: arc.to(),
                arc: arc_id,
            }
        );
        let player = query::player(&world);
        assert_eq!(player.vertex, arc.to());
        assert!(player.heading.abs_diff_eq(arc.direction(), 1e-5));
        assert!(query::is_revealed(&world, arc.to()));
    }

    #[test]
    fn traversal_from_elsewhere_is_rejected() {
        let mut world = World::new();
        let start = query::player(&world).vertex;
        let (foreign, _) = query::graph(&world)
            .arcs()
            .find(|(_, arc)| arc.from() != start)
            .expect("maze has arcs elsewhere");
        let mut events = Vec::new();

        apply(&mut world, Command::TraverseArc { arc: foreign }, &mut events);
        apply(
            &mut world,
            Command::TraverseArc {
                arc: ArcId::new(u32::MAX),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::TraversalRejected {
                    arc: foreign,
                    reason: TraversalError::NotAtOrigin,
                },
                Event::TraversalRejected {
                    arc: ArcId::new(u32::MAX),
                    reason: TraversalError::MissingArc,
                },
            ]
        );
        assert_eq!(query::player(&world).vertex, start);
    }

    #[test]
    fn turn_normalises_and_rejects_vertical_headings() {
        let mut world = World::new();
        let mut events = Vec::new();

        apply(
            &mut world,
            Command::Turn {
                heading: Vec3::new(0.0, 3.0, -2.0),
            },
            &mut events,
        );
        apply(
            &mut world,
            Command::Turn {
                heading: Vec3::Y,
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![
                Event::PlayerTurned {
                    heading: Vec3::new(0.0, 0.0, -1.0)
                },
                Event::TurnRejected { heading: Vec3::Y },
            ]
        );
        assert_eq!(query::player(&world).heading, Vec3::new(0.0, 0.0, -1.0));
    }

    #[test]
    fn walking_the_tree_to_the_goal_collects_items_on_the_way() {
        let config = MazeConfig {
            level_count: 2,
            items_per_level: 1,
            item_hops: 1,
            ..MazeConfig::default()
        };
        let mut world = World::with_seed(5, &config).expect("valid config");
        let graph = query::graph(&world).clone();
        let goal = query::goal(&world);

        let mut path = vec![goal];
        let distances = graph.hop_distances(query::player(&world).vertex);
        while let Some(&current) = path.last() {
            let Some(hops) = distances[current.index()].filter(|hops| *hops > 0) else {
                break;
            };
            let previous = graph
                .outgoing(current)
                .map(|(_, arc)| arc.to())
                .find(|vertex| distances[vertex.index()] == Some(hops - 1))
                .expect("tree path towards the start");
            path.push(previous);
        }
        path.reverse();

        let mut events = Vec::new();
        for pair in path.windows(2) {
            let arc = graph.find_arc(pair[0], pair[1]).expect("path arc");
            apply(&mut world, Command::TraverseArc { arc }, &mut events);
        }

        assert!(query::goal_reached(&world));
        assert_eq!(query::player(&world).level, LevelId::new(1));
        assert!(events.contains(&Event::GoalReached { vertex: goal }));
        assert!(events.contains(&Event::LevelEntered {
            level: LevelId::new(1)
        }));
        for item in query::items(&world) {
            assert_eq!(item.collected, path.contains(&item.vertex));
        }
    }

    #[test]
    fn revealed_vertices_are_listed_per_level() {
        let world = World::new();
        let top = query::revealed_vertices(&world, LevelId::new(0));
        assert!(top.contains(&query::player(&world).vertex));
        assert!(query::revealed_vertices(&world, LevelId::new(3)).is_empty());
        assert!(query::revealed_vertices(&world, LevelId::new(9)).is_empty());
    }
}
