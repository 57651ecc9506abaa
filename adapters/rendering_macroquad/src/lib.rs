#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Macroquad-backed rendering adapter for Petri.
//!
//! Macroquad's optional audio stack depends on native ALSA development
//! libraries, which are unavailable in the containerised CI environment.
//! To keep `cargo test` usable everywhere we depend on macroquad without its
//! default `audio` feature.
//!
//! The adapter uses Macroquad's immediate-mode UI module so the control panel
//! can host widgets. All UI-specific calls live inside the local `ui` module
//! to avoid leaking Macroquad UI types throughout the renderer.

mod ui;

use self::ui::{draw_control_panel_ui, ControlPanelUiContext, ControlPanelUiResult};
use anyhow::Result;
use glam::Vec2;
use macroquad::math::Vec2 as MacroquadVec2;
use macroquad::{
    color::BLACK,
    input::{is_key_pressed, is_mouse_button_pressed, mouse_position, KeyCode, MouseButton},
};
use petri_core::CellCoord;
use petri_rendering::{
    Color, ControlPanelView, FrameInput, OrganismPresentation, Presentation, RenderingBackend,
    Scene,
};
use std::time::{Duration, Instant};

/// Tracks UI-sourced interactions so they can be merged with physical input
/// on the next frame.
#[doc(hidden)]
#[derive(Clone, Copy, Debug, Default)]
pub struct ControlPanelInputState {
    toggle_run_latched: bool,
    single_step_latched: bool,
    clear_board_latched: bool,
    speed_up_latched: bool,
    slow_down_latched: bool,
}

impl ControlPanelInputState {
    /// Returns whether the UI requested a run toggle and clears the latch so
    /// the action fires only once.
    pub fn take_toggle_run(&mut self) -> bool {
        std::mem::take(&mut self.toggle_run_latched)
    }

    /// Records that the control-panel button requested a run toggle.
    pub fn register_toggle_run(&mut self) {
        self.toggle_run_latched = true;
    }

    /// Returns the latched single-step request, clearing it so the action
    /// fires only once.
    pub fn take_single_step(&mut self) -> bool {
        std::mem::take(&mut self.single_step_latched)
    }

    /// Records that the control-panel button requested a single step.
    pub fn register_single_step(&mut self) {
        self.single_step_latched = true;
    }

    /// Returns the latched clear request, clearing it so the action fires
    /// only once.
    pub fn take_clear_board(&mut self) -> bool {
        std::mem::take(&mut self.clear_board_latched)
    }

    /// Records that the control-panel button requested an empty board.
    pub fn register_clear_board(&mut self) {
        self.clear_board_latched = true;
    }

    /// Returns the latched faster-cadence request, clearing the latch.
    pub fn take_speed_up(&mut self) -> bool {
        std::mem::take(&mut self.speed_up_latched)
    }

    /// Records that the control-panel button requested a faster cadence.
    pub fn register_speed_up(&mut self) {
        self.speed_up_latched = true;
    }

    /// Returns the latched slower-cadence request, clearing the latch.
    pub fn take_slow_down(&mut self) -> bool {
        std::mem::take(&mut self.slow_down_latched)
    }

    /// Records that the control-panel button requested a slower cadence.
    pub fn register_slow_down(&mut self) {
        self.slow_down_latched = true;
    }
}

/// Snapshot of edge-triggered keyboard shortcuts observed during a frame.
#[derive(Clone, Copy, Debug, Default)]
struct KeyboardShortcuts {
    /// `Q` or `Escape` to quit the frame loop.
    quit_requested: bool,
    /// `Space` toggles between idle and running.
    toggle_run: bool,
    /// `S` advances exactly one generation.
    single_step: bool,
    /// `C` empties the board.
    clear_board: bool,
    /// `+`/`=` shortens the step interval.
    speed_up: bool,
    /// `-` lengthens the step interval.
    slow_down: bool,
}

impl KeyboardShortcuts {
    fn poll() -> Self {
        Self {
            quit_requested: is_key_pressed(KeyCode::Escape) || is_key_pressed(KeyCode::Q),
            toggle_run: is_key_pressed(KeyCode::Space),
            single_step: is_key_pressed(KeyCode::S),
            clear_board: is_key_pressed(KeyCode::C),
            speed_up: is_key_pressed(KeyCode::Equal) || is_key_pressed(KeyCode::KpAdd),
            slow_down: is_key_pressed(KeyCode::Minus) || is_key_pressed(KeyCode::KpSubtract),
        }
    }
}

/// Rendering backend implemented on top of macroquad.
#[derive(Clone, Copy, Debug, Default)]
pub struct MacroquadBackend {
    swap_interval: Option<i32>,
    show_fps: bool,
}

impl MacroquadBackend {
    /// Returns a backend that requests the platform's default swap interval.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Configures the backend to request a specific swap interval from the
    /// platform.
    #[must_use]
    pub fn with_swap_interval(mut self, swap_interval: Option<i32>) -> Self {
        self.swap_interval = swap_interval;
        self
    }

    /// Configures the backend to either synchronise presentation with the
    /// display refresh rate or render as fast as possible.
    #[must_use]
    pub fn with_vsync(self, enabled: bool) -> Self {
        let swap_interval = if enabled { Some(1) } else { Some(0) };
        self.with_swap_interval(swap_interval)
    }

    /// Configures whether the backend prints frame timing metrics once per
    /// second.
    #[must_use]
    pub fn with_show_fps(mut self, show: bool) -> Self {
        self.show_fps = show;
        self
    }
}

/// Tracks the average frames-per-second produced by the render loop.
#[derive(Clone, Copy, Debug, Default)]
struct FrameBreakdown {
    frame: Duration,
    simulation: Duration,
    render: Duration,
}

#[derive(Debug, Default)]
struct FpsCounter {
    elapsed: Duration,
    frames: u32,
    simulation_accum: Duration,
    render_accum: Duration,
}

#[derive(Clone, Copy, Debug)]
struct FpsMetrics {
    per_second: f32,
    avg_simulation: Duration,
    avg_render: Duration,
}

impl FpsCounter {
    /// Records a rendered frame and returns averages once one second has
    /// elapsed.
    fn record_frame(&mut self, breakdown: FrameBreakdown) -> Option<FpsMetrics> {
        self.elapsed += breakdown.frame;
        self.frames = self.frames.saturating_add(1);
        self.simulation_accum += breakdown.simulation;
        self.render_accum += breakdown.render;

        if self.elapsed < Duration::from_secs(1) {
            return None;
        }

        let seconds = self.elapsed.as_secs_f32();
        let frames = self.frames.max(1);
        let metrics = if seconds <= f32::EPSILON {
            None
        } else {
            Some(FpsMetrics {
                per_second: self.frames as f32 / seconds,
                avg_simulation: self.simulation_accum / frames,
                avg_render: self.render_accum / frames,
            })
        };

        self.elapsed = Duration::ZERO;
        self.frames = 0;
        self.simulation_accum = Duration::ZERO;
        self.render_accum = Duration::ZERO;
        metrics
    }
}

impl RenderingBackend for MacroquadBackend {
    fn run<F>(self, presentation: Presentation, mut update_scene: F) -> Result<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static,
    {
        let Self {
            swap_interval,
            show_fps,
        } = self;

        let Presentation {
            window_title,
            clear_color,
            scene,
        } = presentation;

        let mut config = macroquad::window::Conf {
            window_title,
            window_width: 1_200,
            window_height: 720,
            ..macroquad::window::Conf::default()
        };
        if let Some(swap_interval) = swap_interval {
            config.platform.swap_interval = Some(swap_interval);
        }

        macroquad::Window::from_config(config, async move {
            let mut scene = scene;
            let background = to_macroquad_color(clear_color);
            let mut fps_counter = FpsCounter::default();
            let mut control_panel_input = ControlPanelInputState::default();

            loop {
                let keyboard = KeyboardShortcuts::poll();
                if keyboard.quit_requested {
                    break;
                }

                macroquad::window::clear_background(background);

                let screen_width = macroquad::window::screen_width();
                let screen_height = macroquad::window::screen_height();

                let dt_seconds = macroquad::time::get_frame_time();
                let frame_dt = Duration::from_secs_f32(dt_seconds.max(0.0));
                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);
                let frame_input =
                    gather_frame_input(&scene, &metrics, &mut control_panel_input, keyboard);

                let simulation_start = Instant::now();
                update_scene(frame_dt, frame_input, &mut scene);
                let simulation_duration = simulation_start.elapsed();

                // Input mapping used the pre-update metrics; drawing uses
                // metrics that reflect any board reconfiguration.
                let metrics = SceneMetrics::from_scene(&scene, screen_width, screen_height);

                let render_start = Instant::now();
                draw_organisms(&scene.organisms, &metrics);
                draw_grid_lines(&scene, &metrics);
                draw_selection(&scene, &metrics);

                if let Some(panel_context) = draw_control_panel(&scene, screen_width, screen_height)
                {
                    let mut panel_ui = macroquad::ui::root_ui();
                    let ControlPanelUiResult {
                        toggle_run,
                        single_step,
                        clear_board,
                        speed_up,
                        slow_down,
                    } = draw_control_panel_ui(&mut panel_ui, panel_context);
                    if toggle_run {
                        control_panel_input.register_toggle_run();
                    }
                    if single_step {
                        control_panel_input.register_single_step();
                    }
                    if clear_board {
                        control_panel_input.register_clear_board();
                    }
                    if speed_up {
                        control_panel_input.register_speed_up();
                    }
                    if slow_down {
                        control_panel_input.register_slow_down();
                    }
                }
                let render_duration = render_start.elapsed();

                let fps_metrics = fps_counter.record_frame(FrameBreakdown {
                    frame: frame_dt,
                    simulation: simulation_duration,
                    render: render_duration,
                });
                if show_fps {
                    if let Some(FpsMetrics {
                        per_second,
                        avg_simulation,
                        avg_render,
                    }) = fps_metrics
                    {
                        println!(
                            "FPS: {:.2} | sim: {:>6.2}ms render: {:>6.2}ms",
                            per_second,
                            avg_simulation.as_secs_f64() * 1_000.0,
                            avg_render.as_secs_f64() * 1_000.0,
                        );
                    }
                }

                macroquad::window::next_frame().await;
            }
        });

        Ok(())
    }
}

#[derive(Clone, Copy, Debug)]
struct SceneMetrics {
    scale: f32,
    offset_x: f32,
    offset_y: f32,
    cell_step: f32,
    grid_width_scaled: f32,
    grid_height_scaled: f32,
}

impl SceneMetrics {
    fn from_scene(scene: &Scene, screen_width: f32, screen_height: f32) -> Self {
        let grid = scene.grid;
        let world_width = grid.width();
        let world_height = grid.height();
        let panel_width = scene
            .control_panel
            .map(|panel| panel.width.max(0.0))
            .unwrap_or(0.0)
            .min(screen_width);
        let available_width = (screen_width - panel_width).max(0.0);
        let scale = if world_width == 0.0 || world_height == 0.0 {
            1.0
        } else {
            let width_ratio = if available_width <= f32::EPSILON {
                f32::INFINITY
            } else {
                available_width / world_width
            };
            width_ratio.min(screen_height / world_height)
        };

        let scaled_width = world_width * scale;
        let scaled_height = world_height * scale;
        let offset_x = ((available_width - scaled_width) * 0.5).max(0.0);
        let offset_y = ((screen_height - scaled_height) * 0.5).max(0.0);

        Self {
            scale,
            offset_x,
            offset_y,
            cell_step: grid.cell_length * scale,
            grid_width_scaled: scaled_width,
            grid_height_scaled: scaled_height,
        }
    }
}

fn gather_frame_input(
    scene: &Scene,
    metrics: &SceneMetrics,
    control_panel_input: &mut ControlPanelInputState,
    keyboard: KeyboardShortcuts,
) -> FrameInput {
    let (cursor_x, cursor_y) = mouse_position();
    let primary_click = is_mouse_button_pressed(MouseButton::Left);

    gather_frame_input_from_observations(
        scene,
        metrics,
        Vec2::new(cursor_x, cursor_y),
        primary_click,
        FrameInput {
            toggle_run: keyboard.toggle_run || control_panel_input.take_toggle_run(),
            single_step: keyboard.single_step || control_panel_input.take_single_step(),
            clear_board: keyboard.clear_board || control_panel_input.take_clear_board(),
            speed_up: keyboard.speed_up || control_panel_input.take_speed_up(),
            slow_down: keyboard.slow_down || control_panel_input.take_slow_down(),
            ..FrameInput::default()
        },
    )
}

fn gather_frame_input_from_observations(
    scene: &Scene,
    metrics: &SceneMetrics,
    cursor_position: Vec2,
    primary_click: bool,
    mut input: FrameInput,
) -> FrameInput {
    if metrics.scale <= f32::EPSILON {
        return input;
    }

    let grid = scene.grid;
    if grid.columns == 0 || grid.rows == 0 {
        return input;
    }

    let world_position = Vec2::new(
        (cursor_position.x - metrics.offset_x) / metrics.scale,
        (cursor_position.y - metrics.offset_y) / metrics.scale,
    );
    input.cursor_world_space = Some(grid.clamp_world_position(world_position));

    let inside = cursor_position.x >= metrics.offset_x
        && cursor_position.x < metrics.offset_x + metrics.grid_width_scaled
        && cursor_position.y >= metrics.offset_y
        && cursor_position.y < metrics.offset_y + metrics.grid_height_scaled;

    if inside {
        input.cursor_cell = grid.cell_at_world(world_position);
        input.primary_action = primary_click;
    }

    input
}

fn draw_control_panel(
    scene: &Scene,
    screen_width: f32,
    screen_height: f32,
) -> Option<ControlPanelUiContext> {
    let Some(ControlPanelView { width, background }) = scene.control_panel else {
        return None;
    };
    if width <= f32::EPSILON {
        return None;
    }

    let left = (screen_width - width).max(0.0);
    let background_color = to_macroquad_color(background);
    macroquad::shapes::draw_rectangle(left, 0.0, width, screen_height, background_color);

    Some(ControlPanelUiContext {
        origin: MacroquadVec2::new(left, 0.0),
        size: MacroquadVec2::new(width, screen_height),
        background: background_color,
        run_mode: scene.run_mode,
        generation: scene.generation,
        step_interval: scene.step_interval,
    })
}

fn draw_grid_lines(scene: &Scene, metrics: &SceneMetrics) {
    if metrics.cell_step <= f32::EPSILON {
        return;
    }

    let grid = scene.grid;
    let line_color = to_macroquad_color(grid.line_color);

    for column in 0..=grid.columns {
        let x = metrics.offset_x + column as f32 * metrics.cell_step;
        macroquad::shapes::draw_line(
            x,
            metrics.offset_y,
            x,
            metrics.offset_y + metrics.grid_height_scaled,
            1.0,
            line_color,
        );
    }

    for row in 0..=grid.rows {
        let y = metrics.offset_y + row as f32 * metrics.cell_step;
        macroquad::shapes::draw_line(
            metrics.offset_x,
            y,
            metrics.offset_x + metrics.grid_width_scaled,
            y,
            1.0,
            line_color,
        );
    }
}

fn draw_organisms(organisms: &[OrganismPresentation], metrics: &SceneMetrics) {
    if metrics.cell_step <= f32::EPSILON {
        return;
    }

    for organism in organisms {
        let x = metrics.offset_x + organism.cell.column() as f32 * metrics.cell_step;
        let y = metrics.offset_y + organism.cell.row() as f32 * metrics.cell_step;
        macroquad::shapes::draw_rectangle(
            x,
            y,
            metrics.cell_step,
            metrics.cell_step,
            to_macroquad_color(organism.color),
        );
        macroquad::shapes::draw_rectangle_lines(
            x,
            y,
            metrics.cell_step,
            metrics.cell_step,
            1.0,
            BLACK,
        );
    }
}

fn draw_selection(scene: &Scene, metrics: &SceneMetrics) {
    let Some(cell) = scene.selection else {
        return;
    };
    if metrics.cell_step <= f32::EPSILON {
        return;
    }

    let Some((x, y)) = selection_rectangle(cell, metrics) else {
        return;
    };
    let outline = to_macroquad_color(Color::from_rgb_u8(0xd6, 0x2c, 0x2c));
    let thickness = (metrics.cell_step * 0.15).max(2.0);
    macroquad::shapes::draw_rectangle_lines(
        x,
        y,
        metrics.cell_step,
        metrics.cell_step,
        thickness,
        outline,
    );
}

fn selection_rectangle(cell: CellCoord, metrics: &SceneMetrics) -> Option<(f32, f32)> {
    if cell.column() < 0 || cell.row() < 0 {
        return None;
    }

    Some((
        metrics.offset_x + cell.column() as f32 * metrics.cell_step,
        metrics.offset_y + cell.row() as f32 * metrics.cell_step,
    ))
}

fn to_macroquad_color(color: Color) -> macroquad::color::Color {
    macroquad::color::Color::new(color.red, color.green, color.blue, color.alpha)
}

#[cfg(test)]
mod tests {
    use super::*;
    use petri_core::RunMode;
    use petri_rendering::GridPresentation;
    use std::time::Duration;

    fn test_scene(panel_width: f32) -> Scene {
        let grid = GridPresentation::new(10, 5, 20.0, Color::from_rgb_u8(40, 40, 40))
            .expect("valid grid");
        Scene::new(
            grid,
            Vec::new(),
            None,
            RunMode::Idle,
            0,
            Duration::from_millis(200),
            Some(ControlPanelView::new(
                panel_width,
                Color::from_rgb_u8(0, 0, 0),
            )),
        )
    }

    #[test]
    fn metrics_reserve_the_control_panel_width() {
        let scene = test_scene(200.0);
        let metrics = SceneMetrics::from_scene(&scene, 1_200.0, 720.0);

        // 1000x500 screen area for a 200x100 world: width-limited 5x scale.
        assert!((metrics.scale - 5.0).abs() < f32::EPSILON);
        assert!(metrics.offset_x.abs() < f32::EPSILON);
        assert!((metrics.offset_y - 110.0).abs() < 0.5);
    }

    #[test]
    fn cursor_inside_the_board_maps_to_a_cell() {
        let scene = test_scene(0.0);
        let metrics = SceneMetrics::from_scene(&scene, 1_000.0, 500.0);

        let input = gather_frame_input_from_observations(
            &scene,
            &metrics,
            Vec2::new(metrics.offset_x + metrics.cell_step * 2.5, metrics.offset_y),
            true,
            FrameInput::default(),
        );

        assert_eq!(input.cursor_cell, Some(CellCoord::new(2, 0)));
        assert!(input.primary_action);
    }

    #[test]
    fn cursor_outside_the_board_suppresses_clicks() {
        let scene = test_scene(200.0);
        let metrics = SceneMetrics::from_scene(&scene, 1_200.0, 720.0);

        let input = gather_frame_input_from_observations(
            &scene,
            &metrics,
            Vec2::new(1_150.0, 10.0),
            true,
            FrameInput::default(),
        );

        assert_eq!(input.cursor_cell, None);
        assert!(!input.primary_action);
        assert!(input.cursor_world_space.is_some());
    }

    #[test]
    fn keyboard_and_panel_flags_survive_cell_mapping() {
        let scene = test_scene(0.0);
        let metrics = SceneMetrics::from_scene(&scene, 1_000.0, 500.0);

        let input = gather_frame_input_from_observations(
            &scene,
            &metrics,
            Vec2::new(-50.0, -50.0),
            false,
            FrameInput {
                toggle_run: true,
                clear_board: true,
                ..FrameInput::default()
            },
        );

        assert!(input.toggle_run);
        assert!(input.clear_board);
        assert!(!input.single_step);
    }
}
