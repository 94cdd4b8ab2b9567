#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that generates and explores a Maze Descent maze.

mod maze_code;
mod scene;

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use maze_descent_core::{Event, LevelId, MazeConfig};
use maze_descent_rendering::{Presentation, RenderingBackend, TextBackend};
use maze_descent_system_explorer::{right_hand_rule, Explorer, ExplorerInput};
use maze_descent_world::{self as world, query, World, DEFAULT_MAZE_SEED};
use sha2::{Digest, Sha256};

use crate::maze_code::MazeCode;

/// Explore a procedurally generated maze that descends level by level.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for the maze generator
    #[arg(long, conflicts_with_all = ["seed_phrase", "code"])]
    seed: Option<u64>,

    /// Phrase hashed into the generator seed
    #[arg(long, conflicts_with = "code")]
    seed_phrase: Option<String>,

    /// Shared maze code printed by --print-code
    #[arg(long, conflicts_with = "config")]
    code: Option<String>,

    /// TOML file holding the maze configuration
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of levels, overriding the configuration
    #[arg(short, long)]
    levels: Option<u32>,

    /// Moves the right-hand autopilot makes before the map is printed
    #[arg(short, long, default_value_t = 0)]
    steps: u32,

    /// Draw every level in full instead of the player's explored level
    #[arg(long)]
    reveal_all: bool,

    /// Print the shareable maze code
    #[arg(long)]
    print_code: bool,
}

/// Entry point for the Maze Descent command-line interface.
fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    run(Args::parse())
}

fn run(args: Args) -> Result<()> {
    let (seed, config) = resolve_maze(&args)?;
    let mut world = World::with_seed(seed, &config).context("maze configuration rejected")?;
    println!("{}", query::welcome_banner(&world));

    if args.print_code {
        println!("{}", MazeCode { seed, config }.encode()?);
    }

    let moves = autopilot(&mut world, args.steps);
    debug!("autopilot made {moves} moves");

    let levels: Vec<LevelId> = if args.reveal_all {
        query::maze(&world).levels().iter().map(|level| level.id()).collect()
    } else {
        vec![query::player(&world).level]
    };

    let mut backend = TextBackend::new(io::stdout().lock());
    for level in levels {
        let scene = scene::level_scene(&world, level, args.reveal_all)?;
        let presentation = Presentation::new(format!("seed {seed:#x}"), scene, status(&world));
        backend.present(&presentation)?;
    }
    Ok(())
}

fn resolve_maze(args: &Args) -> Result<(u64, MazeConfig)> {
    let (seed, mut config) = if let Some(code) = &args.code {
        let code = MazeCode::decode(code).context("failed to read maze code")?;
        (code.seed, code.config)
    } else {
        let config = match &args.config {
            Some(path) => load_config(path)?,
            None => MazeConfig::default(),
        };
        let seed = match (&args.seed, &args.seed_phrase) {
            (Some(seed), _) => *seed,
            (None, Some(phrase)) => seed_from_phrase(phrase),
            (None, None) => DEFAULT_MAZE_SEED,
        };
        (seed, config)
    };

    if let Some(levels) = args.levels {
        config.level_count = levels;
    }
    Ok((seed, config))
}

fn load_config(path: &Path) -> Result<MazeConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read maze configuration at {}", path.display()))?;
    parse_config(&contents)
}

fn parse_config(contents: &str) -> Result<MazeConfig> {
    toml::from_str(contents).context("failed to parse maze configuration toml contents")
}

fn seed_from_phrase(phrase: &str) -> u64 {
    let digest = Sha256::digest(phrase.as_bytes());
    let mut bytes = [0_u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}

/// Walks the maze with the right-hand rule, returning the number of moves.
fn autopilot(world: &mut World, steps: u32) -> u32 {
    let mut explorer = Explorer::default();
    let mut moves = 0;

    for _ in 0..steps {
        if query::goal_reached(world) {
            break;
        }

        let mut input = right_hand_rule(&query::navigation_view(world));
        let mut pending = Vec::new();
        loop {
            let mut commands = Vec::new();
            explorer.handle(&pending, input, query::navigation_view(world), &mut commands);
            if commands.is_empty() {
                break;
            }

            pending.clear();
            for command in commands {
                world::apply(world, command, &mut pending);
            }
            for event in &pending {
                report(event, &mut moves);
            }
            input = ExplorerInput::default();
        }
    }

    moves
}

fn report(event: &Event, moves: &mut u32) {
    match event {
        Event::PlayerMoved { .. } => *moves += 1,
        Event::LevelEntered { level } => info!("descended to level {}", level.get()),
        Event::ItemCollected { item, .. } => info!("picked up item {}", item.get()),
        Event::GoalReached { .. } => info!("reached the goal after {} moves", *moves),
        _ => {}
    }
}

fn status(world: &World) -> Vec<String> {
    let items = query::items(world);
    let collected = items.iter().filter(|item| item.collected).count();
    let player = query::player(world);
    let position = query::maze(world)
        .level(player.level)
        .and_then(|level| level.coord_of(player.vertex))
        .map_or_else(String::new, |coord| {
            format!(" row {} column {}", coord.row(), coord.column())
        });

    vec![
        format!("player: level {}{position}", player.level.get()),
        format!("items: {collected}/{}", items.len()),
        if query::goal_reached(world) {
            "goal: reached".to_owned()
        } else {
            "goal: not reached".to_owned()
        },
    ]
}
