//! Power-mode coordinator desktop simulator
//!
//! Runs the real coordinator, host poller and PMIC event pump against
//! simulated hardware, with a scripted USB plug / unplug timeline.
//! Log lines go through `tracing`; filter them with RUST_LOG.
//!
//! Run with: cargo run --example pm_simulator --features emulator -- --plug-at-ms 2000 --unplug-at-ms 8000

// Desktop tooling: unwrap/expect acceptable outside the embedded crates.
#![allow(clippy::unwrap_used, clippy::expect_used)]

use clap::Parser;
use embassy_futures::join::join4;
use embassy_futures::select::select;
use embassy_time::{Duration, Timer};
use platform::config;
use platform::mocks::{
    CallLog, MockEeprom, MockNetInterface, MockNpm1300Bus, MockPin, MockPmDevice, MockSensor,
};
use platform::npm1300::{
    LoadSwitch, Npm1300LoadSwitch, Npm1300Pmic, VBUSIN0_DETECTED, VBUSIN0_REMOVED, VBUSIN_BASE,
    VBUSIN_STATUS,
};
use platform::UsbDeviceStatus;
use pm_firmware::{
    boot, run_event_pump, Coordinator, CoordinatorConfig, HostPoller, PowerBoard, PowerCore,
};
use tracing_subscriber::EnvFilter;

const CONNECTED: u16 = 2;
const DISCONNECTED: u16 = 4;

#[derive(Parser, Debug)]
#[command(name = "pm_simulator")]
#[command(about = "Simulate USB presence driving the power-mode coordinator", long_about = None)]
#[command(version)]
struct Cli {
    /// Report VBUS present in the PMIC status register at boot
    #[arg(long)]
    vbus_at_boot: bool,
    /// Plug the cable in after this many milliseconds
    #[arg(long)]
    plug_at_ms: Option<u64>,
    /// Pull the cable out this many milliseconds after boot
    #[arg(long)]
    unplug_at_ms: Option<u64>,
    /// Repeat the plug / unplug cycle with this period
    #[arg(long)]
    repeat_every_ms: Option<u64>,
    /// Status reads that see "connected" before the host configures the device
    #[arg(long, default_value_t = 3)]
    enumeration_polls: usize,
    /// Keep the PMIC off the bus during boot (degraded boot, no event pump)
    #[arg(long)]
    fail_subscribe: bool,
    /// Stop after this many seconds instead of running forever
    #[arg(long)]
    duration_s: Option<u64>,
}

/// Simulated USB cable and host.
struct Cable {
    bus: MockNpm1300Bus,
    eeprom: MockEeprom,
    enumeration_polls: usize,
}

impl Cable {
    fn plug(&self) {
        tracing::info!("sim: cable plugged in");
        for _ in 0..self.enumeration_polls {
            self.eeprom.push(Ok(CONNECTED));
        }
        self.eeprom.set_fallback(Ok(UsbDeviceStatus::CONFIGURED_CODE));
        self.bus.set_register(VBUSIN_BASE, VBUSIN_STATUS, 0x01);
        self.bus.latch_vbus_events(VBUSIN0_DETECTED);
    }

    fn unplug(&self) {
        tracing::info!("sim: cable pulled");
        self.eeprom.set_fallback(Ok(DISCONNECTED));
        self.bus.set_register(VBUSIN_BASE, VBUSIN_STATUS, 0x00);
        self.bus.latch_vbus_events(VBUSIN0_REMOVED);
    }

    async fn script(&self, cli: &Cli) {
        let mut elapsed = 0u64;
        loop {
            let mut events: Vec<(u64, bool)> = Vec::new();
            if let Some(at) = cli.plug_at_ms {
                events.push((at, true));
            }
            if let Some(at) = cli.unplug_at_ms {
                events.push((at, false));
            }
            events.sort_unstable();

            for (at, plug) in events {
                if at > elapsed {
                    Timer::after(Duration::from_millis(at.saturating_sub(elapsed))).await;
                    elapsed = at;
                }
                if plug {
                    self.plug();
                } else {
                    self.unplug();
                }
            }

            match cli.repeat_every_ms {
                Some(period) if period > elapsed => {
                    Timer::after(Duration::from_millis(period.saturating_sub(elapsed))).await;
                    elapsed = 0;
                }
                _ => core::future::pending::<()>().await,
            }
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    tracing::info!("{}", config::dev_banner());

    // Mocks are single-threaded (Rc); keep everything on one thread.
    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()?;
    rt.block_on(simulate(cli));
    Ok(())
}

async fn simulate(cli: Cli) {
    static CORE: PowerCore = PowerCore::new();
    let coordinator_config = CoordinatorConfig::default();

    let log = CallLog::new();
    // One simulated nPM1300 carries the PMIC core and both rails.
    let bus = MockNpm1300Bus::new();
    let cable = Cable {
        bus: bus.clone(),
        eeprom: MockEeprom::new(DISCONNECTED),
        enumeration_polls: cli.enumeration_polls,
    };
    if cli.vbus_at_boot {
        cable.plug();
    }

    // Board: rails on the simulated nPM1300, everything else plain mocks.
    let mut sensor_rail =
        Npm1300LoadSwitch::new(bus.clone(), LoadSwitch::Ldsw1, config::SENSOR_RAIL_NAME, true);
    let mut radio_rail =
        Npm1300LoadSwitch::new(bus.clone(), LoadSwitch::Ldsw2, config::RADIO_RAIL_NAME, true);
    let mut sensors: Vec<MockSensor> = config::GATED_SENSOR_NAMES
        .iter()
        .map(|&name| MockSensor::new(name, &log))
        .collect();
    let mut devices: Vec<MockPmDevice> = config::PM_DEVICE_NAMES
        .iter()
        .map(|&name| MockPmDevice::new(name, &log))
        .collect();
    let mut leds: Vec<MockPin> = config::STATUS_LED_NAMES
        .iter()
        .map(|&name| MockPin::new(name, &log))
        .collect();
    let mut net = MockNetInterface::new(true, &log);

    let mut builder = PowerBoard::builder()
        .sensor_rail(&mut sensor_rail)
        .radio_rail(&mut radio_rail)
        .net_interface(&mut net);
    for s in &mut sensors {
        builder = builder.sensor(s);
    }
    for d in &mut devices {
        builder = builder.pm_device(d);
    }
    for l in &mut leds {
        builder = builder.status_led(l);
    }
    let board = builder.build().expect("simulated board fits the list limits");

    let mut pmic = Npm1300Pmic::new(bus.clone());
    bus.set_offline(cli.fail_subscribe);
    let report = boot(&CORE, &mut pmic, &coordinator_config).await;
    bus.set_offline(false);
    let vbus = match report.vbus_at_boot {
        Some(true) => "present",
        Some(false) => "absent",
        None => "unknown",
    };
    tracing::info!("boot: subscribed={} vbus={}", report.subscribed, vbus);

    let mut coordinator = Coordinator::new(&CORE, board, coordinator_config);
    let mut poller = HostPoller::new(&CORE, cable.eeprom.clone(), coordinator_config);

    let pump = async {
        if report.event_pump_enabled() {
            run_event_pump(&CORE, &mut pmic).await
        } else {
            tracing::warn!("event pump disabled, plug / unplug edges will be missed");
            core::future::pending::<()>().await
        }
    };

    let system = join4(coordinator.run(), poller.run(), pump, cable.script(&cli));
    match cli.duration_s {
        Some(secs) => {
            select(system, Timer::after(Duration::from_secs(secs))).await;
            tracing::info!(
                "sim: stopped after {}s, {} hal calls, {} nPM1300 writes",
                secs,
                log.calls().len(),
                bus.writes().len()
            );
        }
        None => {
            system.await;
        }
    }
}
