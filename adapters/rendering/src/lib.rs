#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Shared rendering contracts for Petri adapters.

use anyhow::Result as AnyResult;
use glam::Vec2;
use petri_core::{CellCoord, RunMode, SpeciesId};
use std::{error::Error, fmt, time::Duration};

/// RGBA color used when presenting frames.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    /// Red channel intensity in the range 0.0..=1.0.
    pub red: f32,
    /// Green channel intensity in the range 0.0..=1.0.
    pub green: f32,
    /// Blue channel intensity in the range 0.0..=1.0.
    pub blue: f32,
    /// Alpha channel intensity in the range 0.0..=1.0.
    pub alpha: f32,
}

impl Color {
    /// Creates a new color from floating point channels.
    #[must_use]
    pub const fn new(red: f32, green: f32, blue: f32, alpha: f32) -> Self {
        Self {
            red,
            green,
            blue,
            alpha,
        }
    }

    /// Creates an opaque color from byte RGB values.
    #[must_use]
    pub const fn from_rgb_u8(red: u8, green: u8, blue: u8) -> Self {
        Self {
            red: red as f32 / 255.0,
            green: green as f32 / 255.0,
            blue: blue as f32 / 255.0,
            alpha: 1.0,
        }
    }

}

/// Palette cycled through when assigning species their body colors.
const SPECIES_PALETTE: [Color; 8] = [
    Color::from_rgb_u8(0x2f, 0x95, 0x32),
    Color::from_rgb_u8(0xc8, 0x2a, 0x36),
    Color::from_rgb_u8(0xff, 0xc1, 0x07),
    Color::from_rgb_u8(0x58, 0x47, 0xff),
    Color::from_rgb_u8(0x17, 0xa2, 0xb8),
    Color::from_rgb_u8(0xe8, 0x6c, 0x14),
    Color::from_rgb_u8(0x9b, 0x2f, 0xae),
    Color::from_rgb_u8(0x6c, 0x75, 0x7d),
];

/// Deterministic body color assigned to a species.
#[must_use]
pub fn species_color(species: SpeciesId) -> Color {
    SPECIES_PALETTE[species.get() as usize % SPECIES_PALETTE.len()]
}

/// Input snapshot gathered by adapters before updating the scene.
#[derive(Clone, Debug, PartialEq, Default)]
pub struct FrameInput {
    /// Whether the adapter detected an idle/running toggle this frame.
    pub toggle_run: bool,
    /// Whether the adapter detected a single-step request this frame.
    pub single_step: bool,
    /// Whether the adapter detected a clear-board request this frame.
    pub clear_board: bool,
    /// Whether the adapter detected a faster-cadence request this frame.
    pub speed_up: bool,
    /// Whether the adapter detected a slower-cadence request this frame.
    pub slow_down: bool,
    /// Whether the adapter detected a primary pointer press this frame.
    pub primary_action: bool,
    /// Cursor position expressed in world units, clamped to the board bounds.
    pub cursor_world_space: Option<Vec2>,
    /// Board cell under the cursor, when the cursor lies inside the board.
    pub cursor_cell: Option<CellCoord>,
}

/// Describes the cell grid that can be rendered by adapters.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPresentation {
    /// Number of columns contained in the board.
    pub columns: u32,
    /// Number of rows contained in the board.
    pub rows: u32,
    /// Side length of a single square cell expressed in world units.
    pub cell_length: f32,
    /// Color used when drawing grid lines.
    pub line_color: Color,
}

impl GridPresentation {
    /// Creates a new grid descriptor.
    ///
    /// Returns an error when `cell_length` is not strictly positive.
    pub fn new(
        columns: u32,
        rows: u32,
        cell_length: f32,
        line_color: Color,
    ) -> std::result::Result<Self, RenderingError> {
        if !(cell_length > 0.0) {
            return Err(RenderingError::InvalidCellLength { cell_length });
        }

        Ok(Self {
            columns,
            rows,
            cell_length,
            line_color,
        })
    }

    /// Calculates the total width of the grid in world units.
    #[must_use]
    pub const fn width(&self) -> f32 {
        self.columns as f32 * self.cell_length
    }

    /// Calculates the total height of the grid in world units.
    #[must_use]
    pub const fn height(&self) -> f32 {
        self.rows as f32 * self.cell_length
    }

    /// Clamps a world-space position to the board bounds.
    #[must_use]
    pub fn clamp_world_position(&self, position: Vec2) -> Vec2 {
        if self.columns == 0 || self.rows == 0 {
            return Vec2::ZERO;
        }

        Vec2::new(
            position.x.clamp(0.0, self.width()),
            position.y.clamp(0.0, self.height()),
        )
    }

    /// Board cell containing the provided world-space position.
    ///
    /// Returns `None` when the position lies outside the board or the board
    /// has no area.
    #[must_use]
    pub fn cell_at_world(&self, position: Vec2) -> Option<CellCoord> {
        if self.columns == 0 || self.rows == 0 || self.cell_length <= f32::EPSILON {
            return None;
        }
        if position.x < 0.0
            || position.y < 0.0
            || position.x >= self.width()
            || position.y >= self.height()
        {
            return None;
        }

        let column = (position.x / self.cell_length).floor() as i64;
        let row = (position.y / self.cell_length).floor() as i64;
        Some(CellCoord::new(
            column.min(i64::from(self.columns) - 1),
            row.min(i64::from(self.rows) - 1),
        ))
    }
}

/// Organism rendered as a filled square covering one board cell.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OrganismPresentation {
    /// Canonical cell occupied by the organism.
    pub cell: CellCoord,
    /// Fill color derived from the organism's species.
    pub color: Color,
}

impl OrganismPresentation {
    /// Creates a new organism presentation descriptor.
    #[must_use]
    pub const fn new(cell: CellCoord, color: Color) -> Self {
        Self { cell, color }
    }
}

/// Control panel hosted beside the board.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ControlPanelView {
    /// Width of the panel in screen units.
    pub width: f32,
    /// Solid background color of the panel.
    pub background: Color,
}

impl ControlPanelView {
    /// Creates a new control panel descriptor.
    #[must_use]
    pub const fn new(width: f32, background: Color) -> Self {
        Self { width, background }
    }
}

/// Scene description combining the grid, its inhabitants and cadence state.
#[derive(Clone, Debug, PartialEq)]
pub struct Scene {
    /// Cell grid that composes the board.
    pub grid: GridPresentation,
    /// Organisms currently visible on the board.
    pub organisms: Vec<OrganismPresentation>,
    /// Cell outlined as the pending move source, if any.
    pub selection: Option<CellCoord>,
    /// Active cadence mode for the simulation.
    pub run_mode: RunMode,
    /// Generations completed since start or the last clear.
    pub generation: u64,
    /// Interval separating automatic generations.
    pub step_interval: Duration,
    /// Control panel hosted beside the board, if any.
    pub control_panel: Option<ControlPanelView>,
}

impl Scene {
    /// Creates a new scene descriptor.
    #[must_use]
    pub fn new(
        grid: GridPresentation,
        organisms: Vec<OrganismPresentation>,
        selection: Option<CellCoord>,
        run_mode: RunMode,
        generation: u64,
        step_interval: Duration,
        control_panel: Option<ControlPanelView>,
    ) -> Self {
        Self {
            grid,
            organisms,
            selection,
            run_mode,
            generation,
            step_interval,
            control_panel,
        }
    }
}

/// Presentation descriptor consumed by rendering backends.
#[derive(Clone, Debug, PartialEq)]
pub struct Presentation {
    /// Title used by the created window.
    pub window_title: String,
    /// Solid color used to clear each frame.
    pub clear_color: Color,
    /// Scene content that should be displayed.
    pub scene: Scene,
}

impl Presentation {
    /// Constructs a new presentation descriptor.
    #[must_use]
    pub fn new<T>(window_title: T, clear_color: Color, scene: Scene) -> Self
    where
        T: Into<String>,
    {
        Self {
            window_title: window_title.into(),
            clear_color,
            scene,
        }
    }
}

/// Rendering backend capable of presenting Petri scenes.
pub trait RenderingBackend {
    /// Runs the rendering backend until it is requested to exit.
    ///
    /// The provided `update_scene` closure receives the frame delta and the
    /// per-frame input captured by the adapter, and may mutate the scene
    /// before it is rendered, allowing adapters to present world snapshots
    /// deterministically.
    fn run<F>(self, presentation: Presentation, update_scene: F) -> AnyResult<()>
    where
        F: FnMut(Duration, FrameInput, &mut Scene) + 'static;
}

/// Errors that can occur when constructing rendering descriptors.
#[derive(Debug, PartialEq)]
pub enum RenderingError {
    /// Cell lengths must be positive to avoid a zero-sized board.
    InvalidCellLength {
        /// Provided cell length that failed validation.
        cell_length: f32,
    },
}

impl fmt::Display for RenderingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidCellLength { cell_length } => {
                write!(f, "cell_length must be positive (received {cell_length})")
            }
        }
    }
}

impl Error for RenderingError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grid_creation_accepts_positive_cell_length() {
        let grid = GridPresentation::new(50, 30, 20.0, Color::from_rgb_u8(0, 0, 0))
            .expect("positive cell_length should succeed");

        assert_eq!(grid.width(), 1_000.0);
        assert_eq!(grid.height(), 600.0);
    }

    #[test]
    fn grid_creation_rejects_non_positive_cell_length_without_panicking() {
        let error = GridPresentation::new(50, 30, 0.0, Color::from_rgb_u8(0, 0, 0))
            .expect_err("zero cell_length must be rejected");

        assert!(matches!(
            error,
            RenderingError::InvalidCellLength { cell_length } if cell_length == 0.0
        ));
    }

    #[test]
    fn clamp_world_position_limits_coordinates_to_board_bounds() {
        let grid =
            GridPresentation::new(5, 4, 32.0, Color::from_rgb_u8(0, 0, 0)).expect("valid grid");
        let clamped = grid.clamp_world_position(Vec2::new(-10.0, 170.0));

        assert_eq!(clamped, Vec2::new(0.0, grid.height()));
    }

    #[test]
    fn cell_at_world_floors_to_the_containing_cell() {
        let grid =
            GridPresentation::new(6, 3, 24.0, Color::from_rgb_u8(0, 0, 0)).expect("valid grid");

        assert_eq!(
            grid.cell_at_world(Vec2::new(0.0, 0.0)),
            Some(CellCoord::new(0, 0)),
        );
        assert_eq!(
            grid.cell_at_world(Vec2::new(25.0, 71.0)),
            Some(CellCoord::new(1, 2)),
        );
    }

    #[test]
    fn cell_at_world_rejects_positions_outside_the_board() {
        let grid =
            GridPresentation::new(3, 2, 16.0, Color::from_rgb_u8(0, 0, 0)).expect("valid grid");

        assert!(grid.cell_at_world(Vec2::new(-0.1, 10.0)).is_none());
        assert!(grid.cell_at_world(Vec2::new(48.0, 10.0)).is_none());
        assert!(grid.cell_at_world(Vec2::new(10.0, 32.0)).is_none());
    }

    #[test]
    fn species_colors_are_deterministic_and_cycle_through_the_palette() {
        let first = species_color(SpeciesId::new(0));
        assert_eq!(first, species_color(SpeciesId::new(0)));
        assert_ne!(first, species_color(SpeciesId::new(1)));
        assert_eq!(first, species_color(SpeciesId::new(8)));
    }
}
