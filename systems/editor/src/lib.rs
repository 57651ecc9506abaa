#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure editing system that turns pointer input into board mutation commands.
//!
//! The editor owns the click state machine of the interactive board: with no
//! selection, clicking an empty cell places the active species and clicking
//! an occupied cell selects it; with a selection, clicking an empty cell
//! moves the selected occupant there, and any click ends the selection.

use petri_core::{CellCoord, Command, Event, SpeciesId};

/// Input snapshot distilled from adapter-provided frame input data.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct EditorInput {
    /// Indicates whether the player pressed the primary pointer button.
    pub primary_action: bool,
    /// Canonical board cell currently under the cursor, if any.
    pub cursor_cell: Option<CellCoord>,
}

impl EditorInput {
    /// Creates a new input descriptor with explicit field values.
    #[must_use]
    pub const fn new(primary_action: bool, cursor_cell: Option<CellCoord>) -> Self {
        Self {
            primary_action,
            cursor_cell,
        }
    }
}

/// Editing system that translates clicks into placement and move commands.
#[derive(Clone, Debug)]
pub struct Editor {
    selection: Option<CellCoord>,
    active_species: SpeciesId,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(SpeciesId::new(0))
    }
}

impl Editor {
    /// Creates a new editor that places the provided species.
    #[must_use]
    pub const fn new(active_species: SpeciesId) -> Self {
        Self {
            selection: None,
            active_species,
        }
    }

    /// Cell currently selected for a pending move, if any.
    #[must_use]
    pub const fn selection(&self) -> Option<CellCoord> {
        self.selection
    }

    /// Species placed when clicking an empty cell without a selection.
    #[must_use]
    pub const fn active_species(&self) -> SpeciesId {
        self.active_species
    }

    /// Replaces the species placed by subsequent empty-cell clicks.
    pub fn set_active_species(&mut self, species: SpeciesId) {
        self.active_species = species;
    }

    /// Consumes world events and adapter-derived input to emit edit commands.
    ///
    /// The `occupant_at` closure should mirror the semantics of the world's
    /// `query::board_view(..).occupant` helper so the system can distinguish
    /// empty cells from occupied ones.
    pub fn handle<F>(
        &mut self,
        events: &[Event],
        input: EditorInput,
        mut occupant_at: F,
        out: &mut Vec<Command>,
    ) where
        F: FnMut(CellCoord) -> Option<SpeciesId>,
    {
        for event in events {
            match event {
                // Reallocating or emptying the board invalidates the
                // selection; a step may kill the selected organism too.
                Event::BoardConfigured { .. }
                | Event::BoardCleared
                | Event::GenerationAdvanced { .. } => {
                    self.selection = None;
                }
                _ => {}
            }
        }

        if !input.primary_action {
            return;
        }
        let Some(cell) = input.cursor_cell else {
            return;
        };

        match self.selection.take() {
            None => {
                if occupant_at(cell).is_none() {
                    out.push(Command::SetCell {
                        cell,
                        occupant: Some(self.active_species),
                    });
                } else {
                    self.selection = Some(cell);
                }
            }
            Some(source) => {
                if occupant_at(cell).is_none() {
                    out.push(Command::MoveOccupant {
                        from: source,
                        to: cell,
                    });
                }
            }
        }
    }
}
