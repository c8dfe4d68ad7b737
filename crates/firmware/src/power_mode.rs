//! Power-mode state machine.
//!
//! ```text
//!            enter_power_save
//!   ACTIVE ─────────────────────► POWER_SAVE
//!      ▲                              │
//!      └──────────────────────────────┘
//!              exit_power_save
//! ```
//!
//! Transitions are edge-triggered: asking for the mode the machine is
//! already in does nothing and touches no hardware. The mode follows the
//! last completed sequence even if some of its steps failed.

use crate::board::{PowerBoard, StepLog};

/// Coarse power state of the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PowerMode {
    /// Peripherals resumed, radio on.
    Active,
    /// Peripherals suspended, rails and radio off.
    PowerSave,
}

impl core::fmt::Display for PowerMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(match self {
            Self::Active => "ACTIVE",
            Self::PowerSave => "POWER_SAVE",
        })
    }
}

/// A completed mode change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    /// Mode before.
    pub from: PowerMode,
    /// Mode after.
    pub to: PowerMode,
    /// Per-step outcomes of the sequence.
    pub steps: StepLog,
}

/// Owns the current mode; only the main loop drives it.
#[derive(Debug)]
pub struct PowerModeMachine {
    mode: PowerMode,
    transitions: u32,
}

impl Default for PowerModeMachine {
    fn default() -> Self {
        Self::new(PowerMode::Active)
    }
}

impl PowerModeMachine {
    /// Start in `initial`. The board powers up in [`PowerMode::Active`].
    pub const fn new(initial: PowerMode) -> Self {
        Self {
            mode: initial,
            transitions: 0,
        }
    }

    /// Current mode.
    pub fn mode(&self) -> PowerMode {
        self.mode
    }

    /// Completed transitions so far.
    pub fn transitions(&self) -> u32 {
        self.transitions
    }

    fn complete(&mut self, to: PowerMode, steps: StepLog) -> Transition {
        let from = self.mode;
        self.mode = to;
        self.transitions = self.transitions.wrapping_add(1);
        if steps.is_clean() {
            info!("power mode {} -> {}", from, to);
        } else {
            warn!("power mode {} -> {} with {} failed steps", from, to, steps.failures().count());
        }
        Transition { from, to, steps }
    }

    /// ACTIVE → POWER_SAVE. `None` if already in power save.
    pub fn enter_power_save(&mut self, board: &mut PowerBoard<'_>) -> Option<Transition> {
        if self.mode == PowerMode::PowerSave {
            return None;
        }
        let steps = board.enter_power_save();
        Some(self.complete(PowerMode::PowerSave, steps))
    }

    /// POWER_SAVE → ACTIVE. `None` if already active.
    pub fn exit_power_save(&mut self, board: &mut PowerBoard<'_>) -> Option<Transition> {
        if self.mode == PowerMode::Active {
            return None;
        }
        let steps = board.exit_power_save();
        Some(self.complete(PowerMode::Active, steps))
    }

    /// Bring the mode in line with the host state: active with a confirmed
    /// host, power save without one.
    pub fn reconcile(
        &mut self,
        host_confirmed: bool,
        board: &mut PowerBoard<'_>,
    ) -> Option<Transition> {
        if host_confirmed {
            self.exit_power_save(board)
        } else {
            self.enter_power_save(board)
        }
    }
}
