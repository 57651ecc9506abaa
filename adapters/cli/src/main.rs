#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that boots the Petri simulation.

mod pattern_transfer;

use anyhow::{bail, Context, Result};
use clap::Parser;
use pattern_transfer::{PatternOrganism, PatternSnapshot};
use petri_core::{CellCoord, Command, Event, GridSize, SpeciesId};
use petri_rendering::{
    species_color, Color, ControlPanelView, GridPresentation, OrganismPresentation, Presentation,
    RenderingBackend, Scene,
};
use petri_rendering_macroquad::MacroquadBackend;
use petri_system_control::{Control, ControlInput};
use petri_system_editor::{Editor, EditorInput};
use petri_world::{apply, query, World};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::time::Duration;

/// Side length of a rendered cell in world units.
const CELL_LENGTH: f32 = 24.0;
/// Width reserved for the control panel beside the board.
const CONTROL_PANEL_WIDTH: f32 = 240.0;
/// Background color used to clear each frame.
const CLEAR_COLOR: Color = Color::from_rgb_u8(0x10, 0x10, 0x14);
/// Color used when drawing grid lines.
const GRID_LINE_COLOR: Color = Color::from_rgb_u8(0x2e, 0x2e, 0x36);
/// Solid background of the control panel.
const PANEL_BACKGROUND: Color = Color::from_rgb_u8(0x1c, 0x1c, 0x22);

/// Multi-species Game of Life on a toroidal board.
#[derive(Debug, Parser)]
#[command(name = "petri", version, about)]
struct Args {
    /// Number of board columns.
    #[arg(long, default_value_t = 50)]
    columns: u32,

    /// Number of board rows.
    #[arg(long, default_value_t = 30)]
    rows: u32,

    /// Milliseconds between automatic generations while running.
    #[arg(long = "interval-ms", default_value_t = 200)]
    interval_ms: u64,

    /// Seed the board with a deterministic random fill.
    #[arg(long)]
    seed: Option<u64>,

    /// Fraction of cells occupied by the random fill.
    #[arg(long, default_value_t = 0.3)]
    density: f64,

    /// Number of species participating in the random fill.
    #[arg(long, default_value_t = 2)]
    species: u32,

    /// Board pattern string, as printed by a headless run. Takes precedence
    /// over --columns, --rows and --seed.
    #[arg(long)]
    pattern: Option<String>,

    /// Advance the given number of generations without opening a window and
    /// print a summary plus the final pattern.
    #[arg(long, value_name = "GENERATIONS")]
    headless: Option<u64>,

    /// Print frame timing metrics once per second.
    #[arg(long)]
    fps: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();
    validate(&args)?;

    let mut world = build_world(&args)?;
    match args.headless {
        Some(generations) => run_headless(&mut world, generations),
        None => run_interactive(world, args.fps),
    }
}

fn validate(args: &Args) -> Result<()> {
    if args.columns == 0 || args.rows == 0 {
        bail!("the board needs at least one column and one row");
    }
    if !(0.0..=1.0).contains(&args.density) {
        bail!("--density must lie within 0.0..=1.0 (received {})", args.density);
    }
    if args.species == 0 {
        bail!("--species must be at least 1");
    }
    Ok(())
}

/// Builds the world from the parsed arguments, seeding it from the pattern
/// string or the deterministic random fill when requested.
fn build_world(args: &Args) -> Result<World> {
    let pattern = args
        .pattern
        .as_deref()
        .map(PatternSnapshot::decode)
        .transpose()
        .context("could not load the provided --pattern string")?;

    let size = match &pattern {
        Some(snapshot) => GridSize::new(snapshot.columns, snapshot.rows),
        None => GridSize::new(args.columns, args.rows),
    };

    let mut world = World::with_size(size);
    let mut events = Vec::new();
    apply(
        &mut world,
        Command::ConfigureStepInterval {
            interval: Duration::from_millis(args.interval_ms),
        },
        &mut events,
    );

    match pattern {
        Some(snapshot) => {
            for PatternOrganism { species, cell } in snapshot.organisms {
                apply(
                    &mut world,
                    Command::SetCell {
                        cell,
                        occupant: Some(species),
                    },
                    &mut events,
                );
            }
        }
        None => {
            if let Some(seed) = args.seed {
                let mut rng = ChaCha8Rng::seed_from_u64(seed);
                for row in 0..i64::from(size.rows()) {
                    for column in 0..i64::from(size.columns()) {
                        if !rng.gen_bool(args.density) {
                            continue;
                        }
                        let species = SpeciesId::new(rng.gen_range(0..args.species));
                        apply(
                            &mut world,
                            Command::SetCell {
                                cell: CellCoord::new(column, row),
                                occupant: Some(species),
                            },
                            &mut events,
                        );
                    }
                }
            }
        }
    }

    Ok(world)
}

/// Advances the world the requested number of generations and prints a
/// summary alongside the final pattern string.
fn run_headless(world: &mut World, generations: u64) -> Result<()> {
    let mut events = Vec::new();
    let mut births = 0_u64;
    let mut deaths = 0_u64;

    for _ in 0..generations {
        events.clear();
        apply(world, Command::Step, &mut events);
        for event in &events {
            if let Event::GenerationAdvanced {
                births: step_births,
                deaths: step_deaths,
                ..
            } = event
            {
                births += u64::from(*step_births);
                deaths += u64::from(*step_deaths);
            }
        }
    }

    let view = query::board_view(world);
    println!("generation: {}", query::generation(world));
    println!("population: {}", view.population());
    println!("births: {births}");
    println!("deaths: {deaths}");
    println!("{}", capture_pattern(&view).encode());
    Ok(())
}

/// Opens the interactive window and drives the simulation loop.
fn run_interactive(world: World, show_fps: bool) -> Result<()> {
    let size = query::board_view(&world).size();
    let grid = GridPresentation::new(size.columns(), size.rows(), CELL_LENGTH, GRID_LINE_COLOR)?;

    let editor = Editor::default();
    let mut scene = Scene::new(
        grid,
        Vec::new(),
        None,
        query::run_mode(&world),
        query::generation(&world),
        query::step_interval(&world),
        Some(ControlPanelView::new(CONTROL_PANEL_WIDTH, PANEL_BACKGROUND)),
    );
    populate_scene(&world, &editor, &mut scene);
    let presentation = Presentation::new("Petri", CLEAR_COLOR, scene);

    let backend = MacroquadBackend::new().with_vsync(true).with_show_fps(show_fps);

    let mut world = world;
    let mut editor = editor;
    let mut control = Control::new();
    let mut events: Vec<Event> = Vec::new();
    let mut commands: Vec<Command> = Vec::new();

    backend.run(presentation, move |dt, input, scene| {
        commands.clear();
        control.handle(
            &events,
            ControlInput {
                toggle_run: input.toggle_run,
                single_step: input.single_step,
                clear_board: input.clear_board,
                speed_up: input.speed_up,
                slow_down: input.slow_down,
            },
            &mut commands,
        );
        {
            let view = query::board_view(&world);
            editor.handle(
                &events,
                EditorInput::new(input.primary_action, input.cursor_cell),
                |cell| view.occupant(cell),
                &mut commands,
            );
        }
        commands.push(Command::Tick { dt });

        events.clear();
        for command in commands.drain(..) {
            apply(&mut world, command, &mut events);
        }

        populate_scene(&world, &editor, scene);
    })
}

/// Refreshes the scene from the world snapshot after a frame's commands ran.
fn populate_scene(world: &World, editor: &Editor, scene: &mut Scene) {
    let view = query::board_view(world);
    let size = view.size();
    scene.grid.columns = size.columns();
    scene.grid.rows = size.rows();

    scene.organisms.clear();
    scene.organisms.extend(
        view.occupied()
            .map(|(cell, species)| OrganismPresentation::new(cell, species_color(species))),
    );

    scene.selection = editor.selection();
    scene.run_mode = query::run_mode(world);
    scene.generation = query::generation(world);
    scene.step_interval = query::step_interval(world);
}

/// Captures the board's occupied cells into a transferable pattern snapshot.
fn capture_pattern(view: &query::BoardView<'_>) -> PatternSnapshot {
    let size = view.size();
    PatternSnapshot {
        columns: size.columns(),
        rows: size.rows(),
        organisms: view
            .occupied()
            .map(|(cell, species)| PatternOrganism { species, cell })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args_for(extra: &[&str]) -> Args {
        let mut argv = vec!["petri"];
        argv.extend_from_slice(extra);
        Args::parse_from(argv)
    }

    #[test]
    fn seeded_fills_are_deterministic() {
        let args = args_for(&["--seed", "42", "--columns", "16", "--rows", "16"]);
        let first = build_world(&args).expect("world builds");
        let second = build_world(&args).expect("world builds");

        let first_cells: Vec<_> = query::board_view(&first).occupied().collect();
        let second_cells: Vec<_> = query::board_view(&second).occupied().collect();
        assert_eq!(first_cells, second_cells);
        assert!(!first_cells.is_empty(), "default density fills some cells");
    }

    #[test]
    fn pattern_strings_take_precedence_over_grid_flags() {
        let source = args_for(&["--seed", "7", "--columns", "12", "--rows", "9"]);
        let world = build_world(&source).expect("world builds");
        let encoded = capture_pattern(&query::board_view(&world)).encode();

        let restored_args = args_for(&["--pattern", &encoded, "--columns", "99", "--rows", "99"]);
        let restored = build_world(&restored_args).expect("pattern loads");

        let view = query::board_view(&restored);
        assert_eq!(view.size(), GridSize::new(12, 9));
        let original: Vec<_> = query::board_view(&world).occupied().collect();
        let reloaded: Vec<_> = view.occupied().collect();
        assert_eq!(original, reloaded);
    }

    #[test]
    fn headless_runs_advance_the_generation_counter() {
        let args = args_for(&["--columns", "8", "--rows", "8"]);
        let mut world = build_world(&args).expect("world builds");
        run_headless(&mut world, 5).expect("headless run succeeds");

        assert_eq!(query::generation(&world), 5);
    }

    #[test]
    fn validation_rejects_out_of_range_density() {
        let args = args_for(&["--density", "1.5"]);
        assert!(validate(&args).is_err());
    }

    #[test]
    fn validation_rejects_empty_boards_and_zero_species() {
        assert!(validate(&args_for(&["--columns", "0"])).is_err());
        assert!(validate(&args_for(&["--species", "0"])).is_err());
    }
}
