#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure control system that turns panel and keyboard input into cadence
//! commands: run-mode toggling, single stepping, clearing, and interval
//! adjustment.

use std::time::Duration;

use petri_core::{Command, Event, RunMode};

/// Smallest interval selectable through the control surface.
pub const MIN_INTERVAL: Duration = Duration::from_millis(50);
/// Largest interval selectable through the control surface.
pub const MAX_INTERVAL: Duration = Duration::from_millis(1_000);
/// Amount added or removed per interval adjustment.
pub const INTERVAL_ADJUSTMENT: Duration = Duration::from_millis(50);

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct ControlInput {
    /// Indicates whether the player requested an idle/running toggle.
    pub toggle_run: bool,
    /// Indicates whether the player requested exactly one generation.
    pub single_step: bool,
    /// Indicates whether the player requested an empty board.
    pub clear_board: bool,
    /// Indicates whether the player requested a shorter step interval.
    pub speed_up: bool,
    /// Indicates whether the player requested a longer step interval.
    pub slow_down: bool,
}

/// Control system that tracks cadence state and emits matching commands.
#[derive(Clone, Copy, Debug)]
pub struct Control {
    run_mode: RunMode,
    step_interval: Duration,
}

impl Default for Control {
    fn default() -> Self {
        Self {
            run_mode: RunMode::Idle,
            step_interval: Duration::from_millis(200),
        }
    }
}

impl Control {
    /// Creates a new control system in the idle state.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Run mode last confirmed by the world.
    #[must_use]
    pub const fn run_mode(&self) -> RunMode {
        self.run_mode
    }

    /// Step interval last confirmed by the world.
    #[must_use]
    pub const fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Consumes world events and adapter-derived input to emit cadence
    /// commands.
    pub fn handle(&mut self, events: &[Event], input: ControlInput, out: &mut Vec<Command>) {
        for event in events {
            match event {
                Event::RunModeChanged { mode } => self.run_mode = *mode,
                Event::StepIntervalChanged { interval } => self.step_interval = *interval,
                _ => {}
            }
        }

        if input.toggle_run {
            out.push(Command::SetRunMode {
                mode: self.run_mode.toggled(),
            });
        }

        if input.single_step {
            out.push(Command::Step);
        }

        if input.clear_board {
            out.push(Command::Clear);
        }

        if input.speed_up != input.slow_down {
            let interval = if input.speed_up {
                self.step_interval
                    .saturating_sub(INTERVAL_ADJUSTMENT)
                    .max(MIN_INTERVAL)
            } else {
                self.step_interval
                    .saturating_add(INTERVAL_ADJUSTMENT)
                    .min(MAX_INTERVAL)
            };
            if interval != self.step_interval {
                out.push(Command::ConfigureStepInterval { interval });
            }
        }
    }
}
