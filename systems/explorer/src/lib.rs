#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that turns player intent into turn and traversal commands.

use std::f32::consts::{FRAC_1_SQRT_2, FRAC_PI_2, PI};

use glam::{Quat, Vec3};
use log::debug;
use maze_descent_core::{ArcId, Command, Event, VertexId};
use maze_descent_world::query::NavigationView;

const CONE_TOLERANCE: f32 = 1e-4;

/// Quarter turns the player may request.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum TurnDirection {
    /// Rotate a quarter turn counter-clockwise seen from above.
    Left,
    /// Rotate a quarter turn clockwise seen from above.
    Right,
    /// Face the opposite way.
    Around,
}

impl TurnDirection {
    fn angle(self) -> f32 {
        match self {
            Self::Left => FRAC_PI_2,
            Self::Right => -FRAC_PI_2,
            Self::Around => PI,
        }
    }
}

/// Player intent collected by an adapter for a single frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ExplorerInput {
    /// Turn to perform before anything else.
    pub turn: Option<TurnDirection>,
    /// Step along the corridor ahead.
    pub forward: bool,
    /// Keep walking through corridors after the step.
    pub auto_walk: bool,
}

/// Pure system that reacts to world events and emits navigation commands.
#[derive(Debug, Default)]
pub struct Explorer {
    auto_walk: bool,
}

impl Explorer {
    /// Consumes world events, player input and the navigation view to emit
    /// commands.
    pub fn handle(
        &mut self,
        events: &[Event],
        input: ExplorerInput,
        view: NavigationView<'_>,
        out: &mut Vec<Command>,
    ) {
        let mut arrived_from: Option<VertexId> = None;
        for event in events {
            match event {
                Event::MazeGenerated { .. } | Event::GoalReached { .. } => {
                    self.auto_walk = false;
                    arrived_from = None;
                }
                Event::PlayerMoved { from, to, .. } if *to == view.vertex() => {
                    arrived_from = Some(*from);
                }
                Event::TraversalRejected { .. } => self.auto_walk = false,
                _ => {}
            }
        }

        let mut heading = view.heading();
        if let Some(turn) = input.turn {
            heading = turned(&view, heading, turn);
            out.push(Command::Turn { heading });
        }

        if input.forward {
            self.auto_walk = input.auto_walk;
            match open_towards(&view, heading) {
                Some(arc) => out.push(Command::TraverseArc { arc }),
                None => {
                    debug!("no corridor ahead of vertex {}", view.vertex().get());
                    self.auto_walk = false;
                }
            }
            return;
        }

        if let Some(previous) = arrived_from {
            if self.auto_walk {
                match corridor_continuation(&view, previous) {
                    Some(arc) => out.push(Command::TraverseArc { arc }),
                    None => self.auto_walk = false,
                }
            }
        }
    }

    /// Reports whether the explorer keeps walking on its own.
    #[must_use]
    pub fn is_auto_walking(&self) -> bool {
        self.auto_walk
    }
}

/// Chooses the input that follows the wall on the player's right hand.
///
/// Walking a tree this way visits every corridor twice at most, so it always
/// finds the goal.
#[must_use]
pub fn right_hand_rule(view: &NavigationView<'_>) -> ExplorerInput {
    let heading = view.heading();
    let turn = [
        Some(TurnDirection::Right),
        None,
        Some(TurnDirection::Left),
    ]
    .into_iter()
    .find(|turn| {
        let direction = turn.map_or(heading, |turn| rotate(heading, turn));
        open_towards(view, direction).is_some()
    })
    .unwrap_or(Some(TurnDirection::Around));

    ExplorerInput {
        turn,
        forward: true,
        auto_walk: false,
    }
}

fn rotate(heading: Vec3, turn: TurnDirection) -> Vec3 {
    Quat::from_rotation_y(turn.angle()) * heading
}

/// Rotates the heading and snaps it onto a corridor when one lies within 45
/// degrees of the rotated heading.
fn turned(view: &NavigationView<'_>, heading: Vec3, turn: TurnDirection) -> Vec3 {
    let rotated = rotate(heading, turn);
    open_towards(view, rotated)
        .and_then(|arc| horizontal(view.graph().arc(arc).direction()))
        .unwrap_or(rotated)
}

/// Least-turn arc whose horizontal direction lies within 45 degrees of
/// `heading`. Purely vertical arcs are always within reach.
fn open_towards(view: &NavigationView<'_>, heading: Vec3) -> Option<ArcId> {
    let arc = view.least_turn(heading)?;
    let direction = view.graph().arc(arc).direction();
    let within = horizontal(direction)
        .map_or(true, |direction| direction.dot(heading) >= FRAC_1_SQRT_2 - CONE_TOLERANCE);
    within.then_some(arc)
}

fn corridor_continuation(view: &NavigationView<'_>, previous: VertexId) -> Option<ArcId> {
    if view.at_goal() || view.exits() != 2 {
        return None;
    }
    view.graph()
        .outgoing(view.vertex())
        .find(|(_, arc)| arc.to() != previous)
        .map(|(id, _)| id)
}

fn horizontal(direction: Vec3) -> Option<Vec3> {
    Vec3::new(direction.x, 0.0, direction.z).try_normalize()
}
