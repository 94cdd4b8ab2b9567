use glam::{Vec2, Vec3};
use maze_descent_core::LevelId;
use maze_descent_rendering::{
    CellPresentation, Marker, MarkerPresentation, RenderingError, Scene,
};
use maze_descent_world::{query, World};

/// Builds the inset map of `level` from world queries.
///
/// Only revealed vertices and markers on them are drawn unless `reveal_all`
/// is set. The player is always drawn when standing on the level.
pub(crate) fn level_scene(
    world: &World,
    level: LevelId,
    reveal_all: bool,
) -> Result<Scene, RenderingError> {
    let maze = query::maze(world);
    let graph = query::graph(world);
    let Some(grid) = maze.level(level) else {
        return Scene::new(level, 0, 0);
    };
    let mut scene = Scene::new(level, grid.rows(), grid.columns())?;
    let visible = |vertex| reveal_all || query::is_revealed(world, vertex);

    for vertex in grid.vertex_ids() {
        if !visible(vertex) {
            continue;
        }
        let Some(coord) = grid.coord_of(vertex) else {
            continue;
        };
        let open = |row_step, column_step| {
            grid.next_line_of_sight(graph, vertex, row_step, column_step)
                .is_some()
        };
        scene.reveal(CellPresentation::new(
            coord.row(),
            coord.column(),
            open(1, 0),
            open(0, 1),
        ))?;
    }

    let mut markers = Vec::new();
    markers.extend(grid.entry().map(|vertex| (vertex, Marker::RampUp)));
    markers.extend(grid.exit().map(|vertex| (vertex, Marker::RampDown)));
    markers.extend(
        query::items(world)
            .into_iter()
            .filter(|item| item.level == level && !item.collected)
            .map(|item| (item.vertex, Marker::Item)),
    );
    markers.push((query::goal(world), Marker::Goal));

    for (vertex, marker) in markers {
        if !grid.contains(vertex) || !visible(vertex) {
            continue;
        }
        if let Some(coord) = grid.coord_of(vertex) {
            scene.mark(MarkerPresentation::new(coord.row(), coord.column(), marker))?;
        }
    }

    let player = query::player(world);
    if let Some(coord) = grid.coord_of(player.vertex) {
        scene.mark(MarkerPresentation::new(
            coord.row(),
            coord.column(),
            Marker::Player {
                heading: map_heading(player.heading),
            },
        ))?;
    }

    Ok(scene)
}

/// Rows run north along +X and columns east along +Z.
fn map_heading(heading: Vec3) -> Vec2 {
    Vec2::new(heading.z, heading.x)
}
