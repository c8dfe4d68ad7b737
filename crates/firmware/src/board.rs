//! Power board: the ordered collaborator lists and the two best-effort
//! power sequences.
//!
//! # Enter power save (in order)
//!   1. Quiesce every gated sensor
//!   2. Disable the sensor rail
//!   3. Take the network interface down if it is up
//!   4. Disable the radio rail
//!   5. Suspend every power-managed device, in declared order
//!   6. Switch every status LED to a high-impedance input
//!
//! # Exit power save (in order)
//!   1. Resume every power-managed device, in declared order
//!   2. Switch every status LED to an inactive output
//!   3. Enable the sensor rail
//!   4. Restore every gated sensor
//!   5. Enable the radio rail
//!   6. Bring the network interface up if it is down
//!
//! Every step runs even when an earlier one failed. Each failure is logged
//! and recorded in the returned [`StepLog`].

use heapless::Vec;
use platform::{
    ConfigurablePin, HalError, NetInterface, PinMode, PmAction, PmDevice, Regulator, SensorGate,
};
use thiserror_no_std::Error;

/// Maximum gated sensors per board.
pub const MAX_SENSORS: usize = 8;
/// Maximum power-managed devices per board.
pub const MAX_PM_DEVICES: usize = 8;
/// Maximum status LEDs per board.
pub const MAX_LEDS: usize = 8;
/// Enough records for the longest possible sequence.
pub const MAX_STEPS: usize = 32;

/// One step of a power sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Step {
    /// `SensorGate::quiesce` on the named sensor.
    QuiesceSensor(&'static str),
    /// `SensorGate::restore` on the named sensor.
    RestoreSensor(&'static str),
    /// Disable the named rail.
    DisableRail(&'static str),
    /// Enable the named rail.
    EnableRail(&'static str),
    /// Network interface down.
    NetDown,
    /// Network interface up.
    NetUp,
    /// PM action on the named device.
    Device(&'static str, PmAction),
    /// Reconfigure the named LED.
    Led(&'static str, PinMode),
}

impl core::fmt::Display for Step {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::QuiesceSensor(n) => write!(f, "quiesce {n}"),
            Self::RestoreSensor(n) => write!(f, "restore {n}"),
            Self::DisableRail(n) => write!(f, "disable {n}"),
            Self::EnableRail(n) => write!(f, "enable {n}"),
            Self::NetDown => f.write_str("net down"),
            Self::NetUp => f.write_str("net up"),
            Self::Device(n, action) => write!(f, "{action} {n}"),
            Self::Led(n, mode) => write!(f, "{n} -> {mode}"),
        }
    }
}

/// Result of one step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Outcome {
    /// The collaborator accepted the request.
    Done,
    /// Nothing to do (interface absent or already in the target state).
    Skipped,
    /// The collaborator refused.
    Failed(HalError),
}

/// A step and how it went.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct StepRecord {
    /// What was attempted.
    pub step: Step,
    /// How it went.
    pub outcome: Outcome,
}

/// Ordered outcomes of one power sequence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepLog {
    records: Vec<StepRecord, MAX_STEPS>,
}

impl StepLog {
    /// Empty log.
    pub fn new() -> Self {
        Self::default()
    }

    fn push(&mut self, step: Step, outcome: Outcome) {
        // Capacity covers every list at its maximum length.
        let _ = self.records.push(StepRecord { step, outcome });
    }

    fn record(&mut self, step: Step, result: Result<(), HalError>) {
        match result {
            Ok(()) => self.push(step, Outcome::Done),
            Err(e) => {
                warn!("{} failed: {}", step, e);
                self.push(step, Outcome::Failed(e));
            }
        }
    }

    fn skip(&mut self, step: Step) {
        self.push(step, Outcome::Skipped);
    }

    /// All records, in execution order.
    pub fn records(&self) -> &[StepRecord] {
        &self.records
    }

    /// Records whose step failed.
    pub fn failures(&self) -> impl Iterator<Item = &StepRecord> {
        self.records
            .iter()
            .filter(|r| matches!(r.outcome, Outcome::Failed(_)))
    }

    /// Whether no step failed.
    pub fn is_clean(&self) -> bool {
        self.failures().next().is_none()
    }

    /// Outcome of the first record for `step`.
    pub fn outcome_of(&self, step: Step) -> Option<Outcome> {
        self.records
            .iter()
            .find(|r| r.step == step)
            .map(|r| r.outcome)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing was recorded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Board construction errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BoardError {
    /// No sensor rail was given.
    #[error("sensor rail missing")]
    MissingSensorRail,
    /// No radio rail was given.
    #[error("radio rail missing")]
    MissingRadioRail,
    /// More sensors than [`MAX_SENSORS`].
    #[error("too many gated sensors")]
    TooManySensors,
    /// More devices than [`MAX_PM_DEVICES`].
    #[error("too many power-managed devices")]
    TooManyPmDevices,
    /// More LEDs than [`MAX_LEDS`].
    #[error("too many status LEDs")]
    TooManyLeds,
}

/// Every collaborator the power sequences touch.
pub struct PowerBoard<'a> {
    sensors: Vec<&'a mut dyn SensorGate, MAX_SENSORS>,
    pm_devices: Vec<&'a mut dyn PmDevice, MAX_PM_DEVICES>,
    leds: Vec<&'a mut dyn ConfigurablePin, MAX_LEDS>,
    sensor_rail: &'a mut dyn Regulator,
    radio_rail: &'a mut dyn Regulator,
    net: Option<&'a mut dyn NetInterface>,
}

impl<'a> PowerBoard<'a> {
    /// Start describing a board.
    pub fn builder() -> PowerBoardBuilder<'a> {
        PowerBoardBuilder::new()
    }

    /// Power down everything the board can live without.
    pub fn enter_power_save(&mut self) -> StepLog {
        let mut log = StepLog::new();

        for sensor in self.sensors.iter_mut() {
            log.record(Step::QuiesceSensor(sensor.name()), sensor.quiesce());
        }

        let rail = &mut *self.sensor_rail;
        log.record(Step::DisableRail(rail.name()), rail.disable());

        match self.net.as_deref_mut() {
            Some(net) if net.is_admin_up() => log.record(Step::NetDown, net.down()),
            _ => log.skip(Step::NetDown),
        }

        let rail = &mut *self.radio_rail;
        log.record(Step::DisableRail(rail.name()), rail.disable());

        for dev in self.pm_devices.iter_mut() {
            let step = Step::Device(dev.name(), PmAction::Suspend);
            log.record(step, dev.run_action(PmAction::Suspend));
        }

        for led in self.leds.iter_mut() {
            log.record(Step::Led(led.name(), PinMode::Input), led.configure(PinMode::Input));
        }

        log
    }

    /// Bring everything back, mirroring [`Self::enter_power_save`].
    pub fn exit_power_save(&mut self) -> StepLog {
        let mut log = StepLog::new();

        for dev in self.pm_devices.iter_mut() {
            let step = Step::Device(dev.name(), PmAction::Resume);
            log.record(step, dev.run_action(PmAction::Resume));
        }

        for led in self.leds.iter_mut() {
            let step = Step::Led(led.name(), PinMode::OutputInactive);
            log.record(step, led.configure(PinMode::OutputInactive));
        }

        let rail = &mut *self.sensor_rail;
        log.record(Step::EnableRail(rail.name()), rail.enable());

        for sensor in self.sensors.iter_mut() {
            log.record(Step::RestoreSensor(sensor.name()), sensor.restore());
        }

        let rail = &mut *self.radio_rail;
        log.record(Step::EnableRail(rail.name()), rail.enable());

        match self.net.as_deref_mut() {
            Some(net) if !net.is_admin_up() => log.record(Step::NetUp, net.up()),
            _ => log.skip(Step::NetUp),
        }

        log
    }

    /// Toggle the heartbeat LED (the first status LED), if any.
    pub fn toggle_heartbeat(&mut self) -> Result<(), HalError> {
        match self.leds.first_mut() {
            Some(led) => led.toggle(),
            None => Ok(()),
        }
    }

    /// Sensor rail state.
    pub fn sensor_rail_enabled(&self) -> bool {
        self.sensor_rail.is_enabled()
    }

    /// Radio rail state.
    pub fn radio_rail_enabled(&self) -> bool {
        self.radio_rail.is_enabled()
    }

    /// Network admin state, `None` without an interface.
    pub fn net_is_up(&self) -> Option<bool> {
        self.net.as_deref().map(|net| net.is_admin_up())
    }
}

/// Fluent builder for [`PowerBoard`].
///
/// List order is the order the sequences walk. Overflowing a list is
/// reported by [`PowerBoardBuilder::build`].
pub struct PowerBoardBuilder<'a> {
    sensors: Vec<&'a mut dyn SensorGate, MAX_SENSORS>,
    pm_devices: Vec<&'a mut dyn PmDevice, MAX_PM_DEVICES>,
    leds: Vec<&'a mut dyn ConfigurablePin, MAX_LEDS>,
    sensor_rail: Option<&'a mut dyn Regulator>,
    radio_rail: Option<&'a mut dyn Regulator>,
    net: Option<&'a mut dyn NetInterface>,
    overflow: Option<BoardError>,
}

impl Default for PowerBoardBuilder<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> PowerBoardBuilder<'a> {
    /// Empty board description.
    pub fn new() -> Self {
        Self {
            sensors: Vec::new(),
            pm_devices: Vec::new(),
            leds: Vec::new(),
            sensor_rail: None,
            radio_rail: None,
            net: None,
            overflow: None,
        }
    }

    fn note_overflow(&mut self, err: BoardError) {
        self.overflow.get_or_insert(err);
    }

    /// Append a sensor gated with the sensor rail.
    #[must_use]
    pub fn sensor(mut self, sensor: &'a mut dyn SensorGate) -> Self {
        if self.sensors.push(sensor).is_err() {
            self.note_overflow(BoardError::TooManySensors);
        }
        self
    }

    /// Append a runtime power-managed device.
    #[must_use]
    pub fn pm_device(mut self, dev: &'a mut dyn PmDevice) -> Self {
        if self.pm_devices.push(dev).is_err() {
            self.note_overflow(BoardError::TooManyPmDevices);
        }
        self
    }

    /// Append a status LED. The first one is the heartbeat.
    #[must_use]
    pub fn status_led(mut self, led: &'a mut dyn ConfigurablePin) -> Self {
        if self.leds.push(led).is_err() {
            self.note_overflow(BoardError::TooManyLeds);
        }
        self
    }

    /// Rail feeding the gated sensors.
    #[must_use]
    pub fn sensor_rail(mut self, rail: &'a mut dyn Regulator) -> Self {
        self.sensor_rail = Some(rail);
        self
    }

    /// Rail feeding the radio.
    #[must_use]
    pub fn radio_rail(mut self, rail: &'a mut dyn Regulator) -> Self {
        self.radio_rail = Some(rail);
        self
    }

    /// Network interface, if the board has one.
    #[must_use]
    pub fn net_interface(mut self, net: &'a mut dyn NetInterface) -> Self {
        self.net = Some(net);
        self
    }

    /// Finish the board.
    pub fn build(self) -> Result<PowerBoard<'a>, BoardError> {
        if let Some(err) = self.overflow {
            return Err(err);
        }
        Ok(PowerBoard {
            sensors: self.sensors,
            pm_devices: self.pm_devices,
            leds: self.leds,
            sensor_rail: self.sensor_rail.ok_or(BoardError::MissingSensorRail)?,
            radio_rail: self.radio_rail.ok_or(BoardError::MissingRadioRail)?,
            net: self.net,
        })
    }
}
