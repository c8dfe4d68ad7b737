//! Boot sequence for the power-mode coordinator.
//!
//! Initialization order (MUST be respected):
//!   1. Subscribe to the PMIC VBUS events
//!   2. Read the PMIC VBUS status once, synchronously
//!   3. If VBUS is present, seed the presence state and arm the poller
//!   4. Raise the wake signal so the first main-loop pass runs immediately
//!
//! Subscribing before the status read means a cable plugged in between the
//! two steps still produces an event. A failed subscription is not fatal:
//! the board keeps running on the boot-time status alone and never sees
//! later plug / unplug edges.

use platform::npm1300::{vbus_present, VBUSIN_BASE, VBUSIN_STATUS};
use platform::PowerManagementIc;

use crate::config::CoordinatorConfig;
use crate::coordinator::PowerCore;

/// Ordered list of boot steps for documentation and testing.
pub const BOOT_SEQUENCE_STEPS: &[&str] = &[
    "1. PMIC: subscribe to VBUS detected / removed events",
    "2. PMIC: read VBUSIN status register",
    "3. Presence: seed VBUS and arm the host poller if present",
    "4. Wake: raise so the main loop reconciles at once",
];

/// What boot found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BootReport {
    /// PMIC events are routed; the event pump should be started.
    pub subscribed: bool,
    /// VBUS state at boot, `None` if the status read failed.
    pub vbus_at_boot: Option<bool>,
}

impl BootReport {
    /// Whether to start [`run_event_pump`].
    pub fn event_pump_enabled(&self) -> bool {
        self.subscribed
    }

    /// Running without presence events.
    pub fn degraded(&self) -> bool {
        !self.subscribed
    }
}

/// Run the boot sequence. Never fails; problems are logged and reported.
pub async fn boot<P: PowerManagementIc>(
    core: &PowerCore,
    pmic: &mut P,
    config: &CoordinatorConfig,
) -> BootReport {
    info!("{} v{} booting", platform::config::APP_NAME, platform::config::APP_VERSION);

    let subscribed = match pmic.subscribe(config.event_mask) {
        Ok(()) => true,
        Err(e) => {
            error!("pmic event subscription failed: {}, vbus edges will be missed", e);
            false
        }
    };

    let vbus_at_boot = match pmic.read_register(VBUSIN_BASE, VBUSIN_STATUS).await {
        Ok(status) => Some(vbus_present(status)),
        Err(e) => {
            warn!("vbus status read failed: {}", e);
            None
        }
    };

    if vbus_at_boot == Some(true) {
        info!("vbus present at boot");
        core.presence.seed_vbus_present();
        core.poll.arm();
    }

    core.wake.raise();

    BootReport {
        subscribed,
        vbus_at_boot,
    }
}

/// Forward PMIC event batches to the presence event source forever.
pub async fn run_event_pump<P: PowerManagementIc>(core: &PowerCore, pmic: &mut P) -> ! {
    let source = core.event_source();
    loop {
        let mask = pmic.wait_for_events().await;
        source.on_interrupt(mask);
    }
}
