//! End-to-end presence scenarios
//!
//! Runs the main loop and the host poller together against platform mocks,
//! with shortened timings, and checks the mode transitions each USB
//! plug / unplug story produces.
//!
//! Run with: cargo test -p pm-firmware --test scenarios

#![allow(clippy::unwrap_used, clippy::unreachable, clippy::indexing_slicing)]

use embassy_futures::select::{select, Either};
use embassy_time::{Duration, Timer};
use platform::mocks::{
    CallLog, HalCall, MockEeprom, MockNetInterface, MockPin, MockPmDevice, MockPmic,
    MockRegulator, MockSensor,
};
use platform::npm1300::{EVENT_VBUS_DETECTED, EVENT_VBUS_REMOVED, VBUSIN_BASE, VBUSIN_STATUS};
use platform::PmAction;
use pm_firmware::{
    boot, Coordinator, CoordinatorConfig, HostPoller, Iteration, PollDecision, PowerBoard,
    PowerCore, PowerMode,
};

const NOT_CONFIGURED: u16 = 2;
const CONFIGURED: u16 = 3;

fn fast_config() -> CoordinatorConfig {
    CoordinatorConfig::default()
        .with_host_check_interval(Duration::from_millis(10))
        .with_heartbeat_timeout(Duration::from_millis(20))
        .with_loop_interval(Duration::from_millis(5))
}

struct Mocks {
    sensor: MockSensor,
    sensor_rail: MockRegulator,
    radio_rail: MockRegulator,
    net: MockNetInterface,
    uart: MockPmDevice,
    pwm: MockPmDevice,
    led0: MockPin,
    led1: MockPin,
}

impl Mocks {
    fn new(log: &CallLog) -> Self {
        Self {
            sensor: MockSensor::new("bmi270", log),
            sensor_rail: MockRegulator::new("ldsw-sensors", log),
            radio_rail: MockRegulator::new("ldsw-radio", log),
            net: MockNetInterface::new(true, log),
            uart: MockPmDevice::new("uart0", log),
            pwm: MockPmDevice::new("pwm0", log),
            led0: MockPin::new("led0", log),
            led1: MockPin::new("led1", log),
        }
    }

    fn board(&mut self) -> PowerBoard<'_> {
        let Self {
            sensor,
            sensor_rail,
            radio_rail,
            net,
            uart,
            pwm,
            led0,
            led1,
        } = self;
        PowerBoard::builder()
            .sensor(sensor)
            .sensor_rail(sensor_rail)
            .radio_rail(radio_rail)
            .net_interface(net)
            .pm_device(uart)
            .pm_device(pwm)
            .status_led(led0)
            .status_led(led1)
            .build()
            .unwrap()
    }
}

/// Run `n` main-loop iterations with the poller alongside.
async fn drive(
    coord: &mut Coordinator<'_>,
    poller: &mut HostPoller<'_, MockEeprom>,
    n: usize,
) -> Vec<Iteration> {
    let main = async {
        let mut out = Vec::new();
        for _ in 0..n {
            out.push(coord.iterate().await);
        }
        out
    };
    let Either::Second(iterations) = select(poller.run(), main).await else {
        unreachable!("poller never returns");
    };
    iterations
}

fn exits(its: &[Iteration]) -> usize {
    its.iter()
        .filter(|i| i.transition.as_ref().is_some_and(|t| t.to == PowerMode::Active))
        .count()
}

fn enters(its: &[Iteration]) -> usize {
    its.iter()
        .filter(|i| i.transition.as_ref().is_some_and(|t| t.to == PowerMode::PowerSave))
        .count()
}

#[tokio::test]
async fn boot_with_vbus_confirms_and_exits_once() {
    let core = PowerCore::new();
    let log = CallLog::new();
    let mut mocks = Mocks::new(&log);
    let eeprom = MockEeprom::new(CONFIGURED);
    let mut pmic = MockPmic::new();
    pmic.set_register(VBUSIN_BASE, VBUSIN_STATUS, 0x01);

    let report = boot(&core, &mut pmic, &fast_config()).await;
    assert_eq!(report.vbus_at_boot, Some(true));

    let mut coord = Coordinator::new(&core, mocks.board(), fast_config());
    let mut poller = HostPoller::new(&core, eeprom.clone(), fast_config());
    let its = drive(&mut coord, &mut poller, 6).await;

    assert_eq!(exits(&its), 1, "exactly one exit after confirmation");
    assert!(enters(&its) <= 1);
    assert_eq!(coord.mode(), PowerMode::Active);
    assert!(core.presence.is_host_confirmed());
    assert_eq!(eeprom.reads(), 1, "confirmed on the first read, no further polling");
}

#[tokio::test]
async fn detect_then_remove_before_debounce_never_confirms() {
    let core = PowerCore::new();
    let log = CallLog::new();
    let mut mocks = Mocks::new(&log);
    // The store already says configured; only presence can stop confirmation.
    let eeprom = MockEeprom::new(CONFIGURED);

    let mut coord = Coordinator::new(&core, mocks.board(), fast_config());
    let mut poller = HostPoller::new(&core, eeprom.clone(), fast_config());

    let settle = drive(&mut coord, &mut poller, 1).await;
    assert_eq!(enters(&settle), 1);
    assert_eq!(coord.mode(), PowerMode::PowerSave);

    let source = core.event_source();
    source.on_interrupt(EVENT_VBUS_DETECTED);
    source.on_interrupt(EVENT_VBUS_REMOVED);

    let its = drive(&mut coord, &mut poller, 5).await;
    assert_eq!(exits(&its), 0);
    assert!(its.iter().all(|i| i.transition.is_none()));
    assert!(!core.presence.is_host_confirmed());
    assert_eq!(coord.mode(), PowerMode::PowerSave);
    assert!(eeprom.reads() <= 1, "no rescheduling once vbus is gone");
}

#[tokio::test]
async fn five_unconfigured_reads_then_configured_exits_once() {
    let core = PowerCore::new();
    let log = CallLog::new();
    let mut mocks = Mocks::new(&log);
    let eeprom = MockEeprom::new(CONFIGURED);
    for _ in 0..5 {
        eeprom.push(Ok(NOT_CONFIGURED));
    }

    let mut coord = Coordinator::new(&core, mocks.board(), fast_config());
    let mut poller = HostPoller::new(&core, eeprom.clone(), fast_config());
    drive(&mut coord, &mut poller, 1).await;
    assert_eq!(coord.mode(), PowerMode::PowerSave);

    core.event_source().on_interrupt(EVENT_VBUS_DETECTED);
    let its = drive(&mut coord, &mut poller, 8).await;

    assert_eq!(exits(&its), 1);
    assert_eq!(enters(&its), 0);
    assert_eq!(coord.mode(), PowerMode::Active);
    assert_eq!(eeprom.reads(), 6);
}

#[tokio::test]
async fn unplug_after_confirmation_returns_to_power_save() {
    let core = PowerCore::new();
    let log = CallLog::new();
    let mut mocks = Mocks::new(&log);
    let eeprom = MockEeprom::new(CONFIGURED);

    let mut coord = Coordinator::new(&core, mocks.board(), fast_config());
    let mut poller = HostPoller::new(&core, eeprom.clone(), fast_config());
    drive(&mut coord, &mut poller, 1).await;

    core.event_source().on_interrupt(EVENT_VBUS_DETECTED);
    let its = drive(&mut coord, &mut poller, 4).await;
    assert_eq!(exits(&its), 1);

    core.event_source().on_interrupt(EVENT_VBUS_REMOVED);
    let its = drive(&mut coord, &mut poller, 2).await;
    assert_eq!(enters(&its), 1);
    assert_eq!(coord.mode(), PowerMode::PowerSave);
    assert_eq!(coord.transitions(), 3);
    drop(coord);

    // Last sequence was a full enter.
    let calls = log.calls();
    let last_net_down = calls.iter().rposition(|c| *c == HalCall::NetDown).unwrap();
    let last_net_up = calls.iter().rposition(|c| *c == HalCall::NetUp).unwrap();
    assert!(last_net_down > last_net_up);
    assert!(mocks.uart.is_suspended());
}

#[tokio::test]
async fn removal_during_read_discards_confirmation() {
    let core: &'static PowerCore = Box::leak(Box::new(PowerCore::new()));
    core.presence.on_vbus_detected();

    let eeprom = MockEeprom::new(CONFIGURED);
    eeprom.set_read_hook(move |n| {
        if n == 1 {
            core.event_source().on_interrupt(EVENT_VBUS_REMOVED);
        }
    });

    let mut poller = HostPoller::new(core, eeprom.clone(), fast_config());
    assert_eq!(poller.poll_once().await, PollDecision::Finished);
    assert!(!core.presence.is_host_confirmed());
    assert!(!core.wake.is_raised());
}

#[tokio::test]
async fn replug_during_read_needs_a_fresh_read() {
    let core: &'static PowerCore = Box::leak(Box::new(PowerCore::new()));
    core.presence.on_vbus_detected();

    let eeprom = MockEeprom::new(CONFIGURED);
    eeprom.set_read_hook(move |n| {
        if n == 1 {
            let source = core.event_source();
            source.on_interrupt(EVENT_VBUS_REMOVED);
            source.on_interrupt(EVENT_VBUS_DETECTED);
        }
    });

    let mut poller = HostPoller::new(core, eeprom.clone(), fast_config());
    assert_eq!(poller.poll_once().await, PollDecision::Reschedule);
    assert!(!core.presence.is_host_confirmed());

    assert_eq!(poller.poll_once().await, PollDecision::Finished);
    assert!(core.presence.is_host_confirmed());
    assert!(core.wake.is_raised());
}

#[tokio::test]
async fn repeated_arming_does_not_double_cadence() {
    let core = PowerCore::new();
    let eeprom = MockEeprom::new(NOT_CONFIGURED);
    let config = fast_config().with_host_check_interval(Duration::from_millis(20));
    let mut poller = HostPoller::new(&core, eeprom.clone(), config);

    let source = core.event_source();
    let storm = async {
        // Re-detect every 4 ms for ~110 ms: the poller should still read
        // about once per 20 ms interval.
        for _ in 0..28 {
            source.on_interrupt(EVENT_VBUS_DETECTED);
            Timer::after(Duration::from_millis(4)).await;
        }
    };
    let Either::Second(()) = select(poller.run(), storm).await else {
        unreachable!("poller never returns");
    };

    let reads = eeprom.reads();
    assert!(reads >= 2, "poller must keep polling, got {reads}");
    assert!(reads <= 6, "arming must coalesce, got {reads} reads");
}

#[tokio::test]
async fn power_save_suspends_devices_in_declared_order() {
    let core = PowerCore::new();
    let log = CallLog::new();
    let mut mocks = Mocks::new(&log);
    let eeprom = MockEeprom::new(NOT_CONFIGURED);

    let mut coord = Coordinator::new(&core, mocks.board(), fast_config());
    let mut poller = HostPoller::new(&core, eeprom, fast_config());
    drive(&mut coord, &mut poller, 1).await;
    drop(coord);

    let uart = log.position(HalCall::Pm("uart0", PmAction::Suspend)).unwrap();
    let pwm = log.position(HalCall::Pm("pwm0", PmAction::Suspend)).unwrap();
    assert!(uart < pwm);
    assert!(mocks.pwm.is_suspended());
}
