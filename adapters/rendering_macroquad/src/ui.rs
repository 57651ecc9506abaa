//! Immediate-mode UI helpers for the Macroquad rendering backend.
//!
//! This module hosts all uses of `macroquad::ui` so the rest of the adapter
//! can remain agnostic of Macroquad's UI types. Control-panel widgets should
//! be added here via `draw_control_panel_ui`.

use macroquad::{
    color::{Color, WHITE},
    math::{RectOffset, Vec2},
    ui::{hash, Ui},
};
use petri_core::RunMode;
use std::time::Duration;

/// Outcome of rendering the control panel UI during the current frame.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) struct ControlPanelUiResult {
    /// Whether the idle/running toggle button was pressed this frame.
    pub toggle_run: bool,
    /// Whether the single-step button was pressed this frame.
    pub single_step: bool,
    /// Whether the clear button was pressed this frame.
    pub clear_board: bool,
    /// Whether the faster-cadence button was pressed this frame.
    pub speed_up: bool,
    /// Whether the slower-cadence button was pressed this frame.
    pub slow_down: bool,
}

/// Snapshot of the control panel's UI layout and data for the current frame.
#[derive(Clone, Copy, Debug)]
pub(crate) struct ControlPanelUiContext {
    /// Top-left corner of the panel in screen coordinates.
    pub origin: Vec2,
    /// Panel dimensions in screen space.
    pub size: Vec2,
    /// Background colour applied to the window skin so the UI matches the
    /// adapter's solid rectangle.
    pub background: Color,
    /// Current cadence mode, displayed as a status label.
    pub run_mode: RunMode,
    /// Generations completed since start or the last clear.
    pub generation: u64,
    /// Interval separating automatic generations.
    pub step_interval: Duration,
}

/// Renders the control panel's interactive elements for the current frame.
pub(crate) fn draw_control_panel_ui(
    ui: &mut Ui,
    context: ControlPanelUiContext,
) -> ControlPanelUiResult {
    let mut skin = ui.default_skin();
    skin.margin = 0.0;

    let window_style = ui
        .style_builder()
        .color(context.background)
        .color_hovered(context.background)
        .color_clicked(context.background)
        .color_selected(context.background)
        .color_selected_hovered(context.background)
        .color_inactive(context.background)
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(16.0, 16.0, 16.0, 16.0))
        .build();
    skin.window_style = window_style;

    let label_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .margin(RectOffset::new(0.0, 0.0, 4.0, 4.0))
        .build();
    skin.label_style = label_style;

    let button_style = ui
        .style_builder()
        .text_color(WHITE)
        .text_color_hovered(WHITE)
        .text_color_clicked(WHITE)
        .color(Color::from_rgba(70, 70, 70, 255))
        .color_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_clicked(Color::from_rgba(56, 56, 56, 255))
        .color_selected(Color::from_rgba(70, 70, 70, 255))
        .color_selected_hovered(Color::from_rgba(96, 96, 96, 255))
        .color_inactive(Color::from_rgba(56, 56, 56, 200))
        .margin(RectOffset::new(0.0, 0.0, 8.0, 8.0))
        .build();
    skin.button_style = button_style;

    ui.push_skin(&skin);

    let mut result = ControlPanelUiResult::default();
    let _ = ui.window(hash!("control_panel"), context.origin, context.size, |ui| {
        ui.label(None, &format!("Generation: {}", context.generation));

        let mode_label = match context.run_mode {
            RunMode::Idle => "Mode: Idle",
            RunMode::Running => "Mode: Running",
        };
        ui.label(None, mode_label);

        ui.label(
            None,
            &format!("Interval: {} ms", context.step_interval.as_millis()),
        );

        let toggle_label = match context.run_mode {
            RunMode::Idle => "Start",
            RunMode::Running => "Stop",
        };
        result.toggle_run = ui.button(None, toggle_label);
        result.single_step = ui.button(None, "Step");
        result.clear_board = ui.button(None, "Clear");
        result.speed_up = ui.button(None, "Faster");
        result.slow_down = ui.button(None, "Slower");

        ui.label(None, "Space toggles, S steps, C clears.");
        ui.label(None, "-/+ adjust the cadence.");
    });

    ui.pop_skin();

    result
}
