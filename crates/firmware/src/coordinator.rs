//! Shared coordinator state and the main loop.
//!
//! Three contexts share [`PowerCore`]: the PMIC event pump (producer of
//! presence edges), the host poller (producer of confirmations) and the
//! main loop (sole consumer and sole owner of the power mode). The core is
//! `const`-constructible so firmware can keep it in a `static`.

use embassy_time::Timer;

use crate::board::PowerBoard;
use crate::config::CoordinatorConfig;
use crate::host_poll::PollArm;
use crate::power_mode::{PowerMode, PowerModeMachine, Transition};
use crate::presence::{Presence, PresenceEventSource};
use crate::wake::{WakeReason, WakeSignal};

/// State shared between the event pump, the poller and the main loop.
pub struct PowerCore {
    /// USB presence flags.
    pub presence: Presence,
    /// Main-loop wake gate.
    pub wake: WakeSignal,
    /// Poller request slot.
    pub poll: PollArm,
}

impl Default for PowerCore {
    fn default() -> Self {
        Self::new()
    }
}

impl PowerCore {
    /// Fresh state: no VBUS, no host, nothing pending.
    pub const fn new() -> Self {
        Self {
            presence: Presence::new(),
            wake: WakeSignal::new(),
            poll: PollArm::new(),
        }
    }

    /// PMIC event entry point bound to this core.
    pub fn event_source(&self) -> PresenceEventSource<'_> {
        PresenceEventSource::new(&self.presence, &self.poll)
    }
}

/// What one main-loop iteration did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Iteration {
    /// Mode change made at the top of the iteration, if any.
    pub transition: Option<Transition>,
    /// How the wake wait ended.
    pub wake: WakeReason,
    /// Host state after the wait.
    pub host_confirmed: bool,
}

/// The main loop.
pub struct Coordinator<'a> {
    core: &'a PowerCore,
    board: PowerBoard<'a>,
    machine: PowerModeMachine,
    config: CoordinatorConfig,
}

impl<'a> Coordinator<'a> {
    /// Start in [`PowerMode::Active`], the power-on state of the board.
    pub fn new(core: &'a PowerCore, board: PowerBoard<'a>, config: CoordinatorConfig) -> Self {
        Self {
            core,
            board,
            machine: PowerModeMachine::default(),
            config,
        }
    }

    /// Current power mode.
    pub fn mode(&self) -> PowerMode {
        self.machine.mode()
    }

    /// Completed mode transitions.
    pub fn transitions(&self) -> u32 {
        self.machine.transitions()
    }

    /// The board being driven.
    pub fn board(&self) -> &PowerBoard<'a> {
        &self.board
    }

    /// One pass: reconcile, wait, heartbeat, sleep.
    pub async fn iterate(&mut self) -> Iteration {
        let confirmed = self.core.presence.is_host_confirmed();
        let transition = self.machine.reconcile(confirmed, &mut self.board);

        let wake = self.core.wake.wait_timeout(self.config.heartbeat_timeout).await;
        trace!("wake {}", if wake == WakeReason::Raised { "raised" } else { "timeout" });

        if let Err(e) = self.board.toggle_heartbeat() {
            warn!("heartbeat toggle failed: {}", e);
        }

        // Keep the loop hot while a host is attached.
        let host_confirmed = self.core.presence.is_host_confirmed();
        if host_confirmed {
            self.core.wake.raise();
        }

        Timer::after(self.config.loop_interval).await;

        Iteration {
            transition,
            wake,
            host_confirmed,
        }
    }

    /// Run forever.
    pub async fn run(&mut self) -> ! {
        info!("coordinator running in {}", self.mode());
        loop {
            self.iterate().await;
        }
    }
}
