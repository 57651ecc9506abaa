#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Petri engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values for systems to
//! react to deterministically. Systems consume event streams, query immutable
//! snapshots, and respond exclusively with new command batches.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Describes whether the simulation cadence is advancing on its own.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunMode {
    /// The board only changes through explicit editing or single steps.
    Idle,
    /// The board advances one generation per elapsed step interval.
    Running,
}

impl RunMode {
    /// Returns the opposite run mode.
    #[must_use]
    pub const fn toggled(self) -> Self {
        match self {
            Self::Idle => Self::Running,
            Self::Running => Self::Idle,
        }
    }
}

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    /// Replaces the board with an empty grid of the provided dimensions.
    ConfigureBoard {
        /// Dimensions of the new board measured in whole cells.
        size: GridSize,
    },
    /// Replaces the duration that must elapse between automatic steps.
    ConfigureStepInterval {
        /// Minimum simulated time between successive generations.
        interval: Duration,
    },
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Overwrites a single cell with the provided occupant.
    SetCell {
        /// Coordinate of the cell, wrapped toroidally by the world.
        cell: CellCoord,
        /// Species to store, or `None` to empty the cell.
        occupant: Option<SpeciesId>,
    },
    /// Transfers the occupant of one cell to another, emptying the source.
    MoveOccupant {
        /// Coordinate read and then emptied, wrapped toroidally.
        from: CellCoord,
        /// Coordinate overwritten with the source occupant, wrapped toroidally.
        to: CellCoord,
    },
    /// Computes exactly one new generation regardless of run mode.
    Step,
    /// Empties every cell and resets the generation counter to zero.
    Clear,
    /// Requests that the cadence state machine enter the provided mode.
    SetRunMode {
        /// Mode the world should activate.
        mode: RunMode,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// Confirms that the board was reallocated with new dimensions.
    BoardConfigured {
        /// Dimensions of the freshly allocated board.
        size: GridSize,
    },
    /// Confirms that the automatic step interval changed.
    StepIntervalChanged {
        /// Interval now separating automatic generations.
        interval: Duration,
    },
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// Confirms that a cell's occupant changed through editing.
    CellChanged {
        /// Wrapped coordinate of the affected cell.
        cell: CellCoord,
        /// Occupant now stored in the cell.
        occupant: Option<SpeciesId>,
    },
    /// Confirms that an occupant was transferred between two cells.
    OccupantMoved {
        /// Wrapped coordinate that was emptied.
        from: CellCoord,
        /// Wrapped coordinate that received the occupant.
        to: CellCoord,
        /// Occupant written to the target cell.
        occupant: Option<SpeciesId>,
    },
    /// Announces that a new generation replaced the previous board state.
    GenerationAdvanced {
        /// Number of completed generations since start or the last clear.
        generation: u64,
        /// Cells that became occupied during the step.
        births: u32,
        /// Cells that became empty during the step.
        deaths: u32,
    },
    /// Confirms that the board was emptied and the generation counter reset.
    BoardCleared,
    /// Announces that the cadence state machine changed modes.
    RunModeChanged {
        /// Mode that became active after processing commands.
        mode: RunMode,
    },
}

/// Non-negative integer tag identifying an organism's kind.
///
/// No behaviour differs between species beyond identity comparison; the
/// ordering is only used as the deterministic birth tie-break.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpeciesId(u32);

impl SpeciesId {
    /// Creates a new species identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
///
/// Coordinates are signed so that callers may address neighbours of edge
/// cells directly; the world wraps every coordinate onto the torus before
/// touching storage, which makes out-of-bounds state unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: i64,
    row: i64,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: i64, row: i64) -> Self {
        Self { column, row }
    }

    /// Column index of the cell, possibly outside the board bounds.
    #[must_use]
    pub const fn column(&self) -> i64 {
        self.column
    }

    /// Row index of the cell, possibly outside the board bounds.
    #[must_use]
    pub const fn row(&self) -> i64 {
        self.row
    }

    /// Returns the coordinate displaced by the provided deltas.
    #[must_use]
    pub const fn offset(self, delta_column: i64, delta_row: i64) -> Self {
        Self {
            column: self.column + delta_column,
            row: self.row + delta_row,
        }
    }
}

/// Dimensions of the board measured in whole cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridSize {
    columns: u32,
    rows: u32,
}

impl GridSize {
    /// Creates a new size descriptor with explicit dimensions.
    #[must_use]
    pub const fn new(columns: u32, rows: u32) -> Self {
        Self { columns, rows }
    }

    /// Number of columns contained in the board.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of rows contained in the board.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Total number of cells contained in the board.
    #[must_use]
    pub const fn area(&self) -> u64 {
        self.columns as u64 * self.rows as u64
    }
}
