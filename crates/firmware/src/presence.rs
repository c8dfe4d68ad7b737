//! USB presence state and the PMIC event entry point.
//!
//! [`Presence`] owns the `{vbus_present, host_confirmed}` pair. Every update
//! happens inside one critical section, so no reader ever sees
//! `host_confirmed` without `vbus_present`.
//!
//! Each VBUS removal bumps an epoch. The host poller snapshots the epoch
//! before its status read and passes it back to [`Presence::confirm_host`];
//! a removal while the read was in flight makes the confirmation stale and
//! it is dropped.

use core::cell::Cell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use platform::npm1300::{EVENT_VBUS_DETECTED, EVENT_VBUS_REMOVED};

use crate::host_poll::PollArm;

/// Snapshot of the presence flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PresenceFlags {
    /// A USB supply is attached.
    pub vbus_present: bool,
    /// A USB host has configured the device.
    pub host_confirmed: bool,
    /// Number of VBUS removals seen, wrapping.
    pub epoch: u32,
}

/// Shared presence state.
pub struct Presence {
    flags: Mutex<CriticalSectionRawMutex, Cell<PresenceFlags>>,
}

impl Default for Presence {
    fn default() -> Self {
        Self::new()
    }
}

impl Presence {
    /// No VBUS, no host, epoch 0.
    pub const fn new() -> Self {
        Self {
            flags: Mutex::new(Cell::new(PresenceFlags {
                vbus_present: false,
                host_confirmed: false,
                epoch: 0,
            })),
        }
    }

    fn update<R>(&self, f: impl FnOnce(&mut PresenceFlags) -> R) -> R {
        self.flags.lock(|cell| {
            let mut flags = cell.get();
            let out = f(&mut flags);
            cell.set(flags);
            out
        })
    }

    /// Current flags.
    pub fn snapshot(&self) -> PresenceFlags {
        self.flags.lock(Cell::get)
    }

    /// Whether a host has confirmed.
    pub fn is_host_confirmed(&self) -> bool {
        self.snapshot().host_confirmed
    }

    /// Whether VBUS is present.
    pub fn is_vbus_present(&self) -> bool {
        self.snapshot().vbus_present
    }

    /// Current removal epoch.
    pub fn epoch(&self) -> u32 {
        self.snapshot().epoch
    }

    /// VBUS appeared.
    pub fn on_vbus_detected(&self) {
        self.update(|f| f.vbus_present = true);
    }

    /// VBUS went away: clear both flags together and start a new epoch.
    pub fn on_vbus_removed(&self) {
        self.update(|f| {
            f.vbus_present = false;
            f.host_confirmed = false;
            f.epoch = f.epoch.wrapping_add(1);
        });
    }

    /// Boot-time seed when the PMIC status register reports VBUS.
    ///
    /// Only ever sets presence; absence goes through [`Self::on_vbus_removed`]
    /// so confirmation and the epoch stay consistent.
    pub fn seed_vbus_present(&self) {
        self.update(|f| f.vbus_present = true);
    }

    /// Mark the host confirmed if VBUS is still present and no removal
    /// happened since `epoch` was read. Returns whether it took effect.
    pub fn confirm_host(&self, epoch: u32) -> bool {
        self.update(|f| {
            if f.vbus_present && f.epoch == epoch {
                f.host_confirmed = true;
                true
            } else {
                false
            }
        })
    }
}

/// Which VBUS edges one interrupt mask carried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PresenceEvents {
    /// VBUS-detected bit was set.
    pub detected: bool,
    /// VBUS-removed bit was set.
    pub removed: bool,
}

/// PMIC event callback: turns raw event masks into presence updates.
pub struct PresenceEventSource<'a> {
    presence: &'a Presence,
    arm: &'a PollArm,
}

impl<'a> PresenceEventSource<'a> {
    /// Bind to the shared presence state and poll arm.
    pub fn new(presence: &'a Presence, arm: &'a PollArm) -> Self {
        Self { presence, arm }
    }

    /// Handle one event mask. Never blocks and never fails.
    ///
    /// When both edges arrive together, detection is applied first so the
    /// removal wins.
    pub fn on_interrupt(&self, pins: u32) -> PresenceEvents {
        let events = PresenceEvents {
            detected: pins & EVENT_VBUS_DETECTED != 0,
            removed: pins & EVENT_VBUS_REMOVED != 0,
        };
        debug!("pmic event mask {}", pins);

        if events.detected {
            info!("vbus detected");
            self.presence.on_vbus_detected();
            self.arm.arm();
        }
        if events.removed {
            info!("vbus removed");
            self.presence.on_vbus_removed();
        }
        events
    }
}
