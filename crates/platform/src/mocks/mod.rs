//! Mock implementations for testing
//!
//! This module provides mock implementations of all platform traits
//! for use in unit tests, integration tests and the desktop simulator.
//!
//! The board holds its collaborators by `&mut`, so tests cannot inspect
//! them while a sequence runs. Every mock therefore records into a shared
//! [`CallLog`], and the async mocks ([`MockEeprom`], [`MockPmic`]) are
//! cheap `Clone` handles onto shared state.

#![cfg(any(test, feature = "std"))]

use core::cell::RefCell;
use std::boxed::Box;
use std::collections::VecDeque;
use std::rc::Rc;
use std::vec::Vec;

use crate::*;

/// One collaborator call, recorded whether it succeeded or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HalCall {
    /// `Regulator::enable`
    RegulatorEnable(&'static str),
    /// `Regulator::disable`
    RegulatorDisable(&'static str),
    /// `PmDevice::run_action`
    Pm(&'static str, PmAction),
    /// `ConfigurablePin::configure`
    PinConfigure(&'static str, PinMode),
    /// `ConfigurablePin::toggle`
    PinToggle(&'static str),
    /// `NetInterface::up`
    NetUp,
    /// `NetInterface::down`
    NetDown,
    /// `SensorGate::quiesce`
    SensorQuiesce(&'static str),
    /// `SensorGate::restore`
    SensorRestore(&'static str),
}

/// Shared, ordered record of collaborator calls.
#[derive(Debug, Clone, Default)]
pub struct CallLog(Rc<RefCell<Vec<HalCall>>>);

impl CallLog {
    /// Create an empty log
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a call
    pub fn record(&self, call: HalCall) {
        self.0.borrow_mut().push(call);
    }

    /// Snapshot of all calls so far
    pub fn calls(&self) -> Vec<HalCall> {
        self.0.borrow().clone()
    }

    /// Number of recorded calls matching `pred`
    pub fn count(&self, pred: impl Fn(&HalCall) -> bool) -> usize {
        self.0.borrow().iter().filter(|c| pred(c)).count()
    }

    /// Index of the first call equal to `call`
    pub fn position(&self, call: HalCall) -> Option<usize> {
        self.0.borrow().iter().position(|c| *c == call)
    }
}

fn outcome(fail: Option<HalError>) -> Result<(), HalError> {
    match fail {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

/// Mock load switch
pub struct MockRegulator {
    name: &'static str,
    enabled: bool,
    log: CallLog,
    fail_enable: Option<HalError>,
    fail_disable: Option<HalError>,
}

impl MockRegulator {
    /// Create an enabled rail (rails are on after reset)
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            enabled: true,
            log: log.clone(),
            fail_enable: None,
            fail_disable: None,
        }
    }

    /// Make every `enable` fail with `err`
    #[must_use]
    pub fn with_enable_error(mut self, err: HalError) -> Self {
        self.fail_enable = Some(err);
        self
    }

    /// Make every `disable` fail with `err`
    #[must_use]
    pub fn with_disable_error(mut self, err: HalError) -> Self {
        self.fail_disable = Some(err);
        self
    }
}

impl Regulator for MockRegulator {
    fn name(&self) -> &'static str {
        self.name
    }

    fn enable(&mut self) -> Result<(), HalError> {
        self.log.record(HalCall::RegulatorEnable(self.name));
        outcome(self.fail_enable)?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), HalError> {
        self.log.record(HalCall::RegulatorDisable(self.name));
        outcome(self.fail_disable)?;
        self.enabled = false;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// Mock runtime power-managed peripheral
pub struct MockPmDevice {
    name: &'static str,
    suspended: bool,
    log: CallLog,
    fail: Option<HalError>,
}

impl MockPmDevice {
    /// Create an active device
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            suspended: false,
            log: log.clone(),
            fail: None,
        }
    }

    /// Make every action fail with `err`
    #[must_use]
    pub fn with_error(mut self, err: HalError) -> Self {
        self.fail = Some(err);
        self
    }

    /// Whether the last successful action was a suspend
    pub fn is_suspended(&self) -> bool {
        self.suspended
    }
}

impl PmDevice for MockPmDevice {
    fn name(&self) -> &'static str {
        self.name
    }

    fn run_action(&mut self, action: PmAction) -> Result<(), HalError> {
        self.log.record(HalCall::Pm(self.name, action));
        outcome(self.fail)?;
        self.suspended = action == PmAction::Suspend;
        Ok(())
    }
}

/// Mock status LED pin
pub struct MockPin {
    name: &'static str,
    mode: PinMode,
    level: bool,
    log: CallLog,
    fail_configure: Option<HalError>,
}

impl MockPin {
    /// Create a pin configured as an inactive output
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            mode: PinMode::OutputInactive,
            level: false,
            log: log.clone(),
            fail_configure: None,
        }
    }

    /// Make every `configure` fail with `err`
    #[must_use]
    pub fn with_configure_error(mut self, err: HalError) -> Self {
        self.fail_configure = Some(err);
        self
    }

    /// Current pin mode
    pub fn mode(&self) -> PinMode {
        self.mode
    }

    /// Current output latch level
    pub fn level(&self) -> bool {
        self.level
    }
}

impl ConfigurablePin for MockPin {
    fn name(&self) -> &'static str {
        self.name
    }

    fn configure(&mut self, mode: PinMode) -> Result<(), HalError> {
        self.log.record(HalCall::PinConfigure(self.name, mode));
        outcome(self.fail_configure)?;
        self.mode = mode;
        self.level = false;
        Ok(())
    }

    fn toggle(&mut self) -> Result<(), HalError> {
        // Toggling an input only flips the output latch.
        self.log.record(HalCall::PinToggle(self.name));
        self.level = !self.level;
        Ok(())
    }
}

/// Mock network interface
pub struct MockNetInterface {
    up: bool,
    log: CallLog,
    fail_up: Option<HalError>,
    fail_down: Option<HalError>,
}

impl MockNetInterface {
    /// Create an interface in the given admin state
    pub fn new(up: bool, log: &CallLog) -> Self {
        Self {
            up,
            log: log.clone(),
            fail_up: None,
            fail_down: None,
        }
    }

    /// Make every `down` fail with `err`
    #[must_use]
    pub fn with_down_error(mut self, err: HalError) -> Self {
        self.fail_down = Some(err);
        self
    }

    /// Make every `up` fail with `err`
    #[must_use]
    pub fn with_up_error(mut self, err: HalError) -> Self {
        self.fail_up = Some(err);
        self
    }
}

impl NetInterface for MockNetInterface {
    fn name(&self) -> &'static str {
        "lte0"
    }

    fn is_admin_up(&self) -> bool {
        self.up
    }

    fn up(&mut self) -> Result<(), HalError> {
        self.log.record(HalCall::NetUp);
        outcome(self.fail_up)?;
        self.up = true;
        Ok(())
    }

    fn down(&mut self) -> Result<(), HalError> {
        self.log.record(HalCall::NetDown);
        outcome(self.fail_down)?;
        self.up = false;
        Ok(())
    }
}

/// Mock sensor gate that records quiesce / restore
pub struct MockSensor {
    name: &'static str,
    log: CallLog,
    fail_quiesce: Option<HalError>,
}

impl MockSensor {
    /// Create a sensor that always succeeds
    pub fn new(name: &'static str, log: &CallLog) -> Self {
        Self {
            name,
            log: log.clone(),
            fail_quiesce: None,
        }
    }

    /// Make every `quiesce` fail with `err`
    #[must_use]
    pub fn with_quiesce_error(mut self, err: HalError) -> Self {
        self.fail_quiesce = Some(err);
        self
    }
}

impl SensorGate for MockSensor {
    fn name(&self) -> &'static str {
        self.name
    }

    fn quiesce(&mut self) -> Result<(), HalError> {
        self.log.record(HalCall::SensorQuiesce(self.name));
        outcome(self.fail_quiesce)
    }

    fn restore(&mut self) -> Result<(), HalError> {
        self.log.record(HalCall::SensorRestore(self.name));
        Ok(())
    }
}

type ReadHook = Box<dyn FnMut(usize)>;

struct EepromState {
    script: VecDeque<Result<u16, HalError>>,
    fallback: Result<u16, HalError>,
    reads: usize,
    last_offset: Option<u32>,
    hook: Option<ReadHook>,
}

/// Mock EEPROM holding the USB status word.
///
/// Reads pop scripted results first, then return the fallback.
#[derive(Clone)]
pub struct MockEeprom {
    inner: Rc<RefCell<EepromState>>,
}

impl MockEeprom {
    /// Create an EEPROM whose status word always reads `value`
    pub fn new(value: u16) -> Self {
        Self {
            inner: Rc::new(RefCell::new(EepromState {
                script: VecDeque::new(),
                fallback: Ok(value),
                reads: 0,
                last_offset: None,
                hook: None,
            })),
        }
    }

    /// Queue one result for the next unscripted read
    pub fn push(&self, result: Result<u16, HalError>) {
        self.inner.borrow_mut().script.push_back(result);
    }

    /// Replace the value returned once the script runs out
    pub fn set_fallback(&self, result: Result<u16, HalError>) {
        self.inner.borrow_mut().fallback = result;
    }

    /// Run `hook` inside every read, with the 1-based read number
    pub fn set_read_hook(&self, hook: impl FnMut(usize) + 'static) {
        self.inner.borrow_mut().hook = Some(Box::new(hook));
    }

    /// Number of reads so far
    pub fn reads(&self) -> usize {
        self.inner.borrow().reads
    }

    /// Offset of the most recent read
    pub fn last_offset(&self) -> Option<u32> {
        self.inner.borrow().last_offset
    }
}

impl RegisterStore for MockEeprom {
    async fn read(&mut self, offset: u32, buf: &mut [u8]) -> Result<(), HalError> {
        let (result, reads, hook) = {
            let mut state = self.inner.borrow_mut();
            state.reads = state.reads.saturating_add(1);
            state.last_offset = Some(offset);
            let result = state.script.pop_front().unwrap_or(state.fallback);
            (result, state.reads, state.hook.take())
        };
        if let Some(mut hook) = hook {
            hook(reads);
            self.inner.borrow_mut().hook = Some(hook);
        }
        let bytes = result?.to_le_bytes();
        for (dst, src) in buf.iter_mut().zip(bytes) {
            *dst = src;
        }
        Ok(())
    }
}

struct PmicState {
    registers: Vec<((u8, u8), u8)>,
    read_error: Option<HalError>,
    subscribe_result: Result<(), HalError>,
    subscribed: Option<u32>,
    events: VecDeque<u32>,
}

/// Mock PMIC with a sparse register file and an event queue
#[derive(Clone)]
pub struct MockPmic {
    inner: Rc<RefCell<PmicState>>,
}

impl Default for MockPmic {
    fn default() -> Self {
        Self::new()
    }
}

impl MockPmic {
    /// Create a PMIC with all registers reading zero
    pub fn new() -> Self {
        Self {
            inner: Rc::new(RefCell::new(PmicState {
                registers: Vec::new(),
                read_error: None,
                subscribe_result: Ok(()),
                subscribed: None,
                events: VecDeque::new(),
            })),
        }
    }

    /// Set a register value
    pub fn set_register(&self, base: u8, offset: u8, value: u8) {
        let mut state = self.inner.borrow_mut();
        match state.registers.iter_mut().find(|(addr, _)| *addr == (base, offset)) {
            Some(entry) => entry.1 = value,
            None => state.registers.push(((base, offset), value)),
        }
    }

    /// Make every register read fail with `err`
    pub fn fail_reads(&self, err: HalError) {
        self.inner.borrow_mut().read_error = Some(err);
    }

    /// Result returned by `subscribe`
    pub fn set_subscribe_result(&self, result: Result<(), HalError>) {
        self.inner.borrow_mut().subscribe_result = result;
    }

    /// Mask passed to the last successful `subscribe`
    pub fn subscribed_mask(&self) -> Option<u32> {
        self.inner.borrow().subscribed
    }

    /// Queue an event batch for `wait_for_events`
    pub fn fire(&self, mask: u32) {
        self.inner.borrow_mut().events.push_back(mask);
    }
}

impl PowerManagementIc for MockPmic {
    async fn read_register(&mut self, base: u8, offset: u8) -> Result<u8, HalError> {
        let state = self.inner.borrow();
        outcome(state.read_error)?;
        Ok(state
            .registers
            .iter()
            .find(|(addr, _)| *addr == (base, offset))
            .map_or(0, |(_, v)| *v))
    }

    fn subscribe(&mut self, mask: u32) -> Result<(), HalError> {
        let mut state = self.inner.borrow_mut();
        state.subscribe_result?;
        state.subscribed = Some(mask);
        Ok(())
    }

    async fn wait_for_events(&mut self) -> u32 {
        loop {
            let next = self.inner.borrow_mut().events.pop_front();
            if let Some(mask) = next {
                return mask;
            }
            embassy_time::Timer::after_millis(10).await;
        }
    }
}

#[derive(Debug)]
/// Error type of [`MockNpm1300Bus`]
pub struct MockBusError;

impl embedded_hal::i2c::Error for MockBusError {
    fn kind(&self) -> embedded_hal::i2c::ErrorKind {
        embedded_hal::i2c::ErrorKind::Other
    }
}

#[derive(Default)]
struct Npm1300BusState {
    writes: Vec<[u8; 3]>,
    registers: Vec<((u8, u8), u8)>,
    offline: bool,
}

impl Npm1300BusState {
    fn register(&self, addr: (u8, u8)) -> u8 {
        self.registers
            .iter()
            .find(|(a, _)| *a == addr)
            .map_or(0, |(_, v)| *v)
    }

    fn store(&mut self, addr: (u8, u8), value: u8) {
        match self.registers.iter_mut().find(|(a, _)| *a == addr) {
            Some(entry) => entry.1 = value,
            None => self.registers.push((addr, value)),
        }
    }

    /// Register write with the nPM1300's set / clear pair semantics for
    /// the VBUSIN event latch.
    fn write(&mut self, base: u8, offset: u8, value: u8) {
        let latch = (npm1300::MAIN_BASE, npm1300::MAIN_EVENTS_VBUSIN0_SET);
        match (base, offset) {
            (npm1300::MAIN_BASE, npm1300::MAIN_EVENTS_VBUSIN0_SET) => {
                let bits = self.register(latch) | value;
                self.store(latch, bits);
            }
            (npm1300::MAIN_BASE, npm1300::MAIN_EVENTS_VBUSIN0_CLR) => {
                let bits = self.register(latch) & !value;
                self.store(latch, bits);
            }
            addr => self.store(addr, value),
        }
    }
}

/// Mock I2C bus backed by a shared nPM1300 register file.
///
/// Clones share the register file, so one bus handle per driver behaves
/// like one physical bus.
#[derive(Clone, Default)]
pub struct MockNpm1300Bus {
    inner: Rc<RefCell<Npm1300BusState>>,
}

impl MockNpm1300Bus {
    /// Create an idle bus with every register reading zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Every `[base, offset, value]` written so far
    pub fn writes(&self) -> Vec<[u8; 3]> {
        self.inner.borrow().writes.clone()
    }

    /// Current register value
    pub fn register(&self, base: u8, offset: u8) -> u8 {
        self.inner.borrow().register((base, offset))
    }

    /// Set a register from the device side (status bits, for example)
    pub fn set_register(&self, base: u8, offset: u8, value: u8) {
        self.inner.borrow_mut().store((base, offset), value);
    }

    /// Latch VBUSIN0 event bits as the device would on a VBUS edge
    pub fn latch_vbus_events(&self, bits: u8) {
        self.inner
            .borrow_mut()
            .write(npm1300::MAIN_BASE, npm1300::MAIN_EVENTS_VBUSIN0_SET, bits);
    }

    /// Fail every transaction while `offline` is set
    pub fn set_offline(&self, offline: bool) {
        self.inner.borrow_mut().offline = offline;
    }
}

impl embedded_hal::i2c::ErrorType for MockNpm1300Bus {
    type Error = MockBusError;
}

impl embedded_hal::i2c::I2c for MockNpm1300Bus {
    fn transaction(
        &mut self,
        address: u8,
        operations: &mut [embedded_hal::i2c::Operation<'_>],
    ) -> Result<(), Self::Error> {
        let mut state = self.inner.borrow_mut();
        if state.offline || address != npm1300::NPM1300_I2C_ADDR {
            return Err(MockBusError);
        }
        let mut pointer = (0u8, 0u8);
        for op in operations.iter_mut() {
            match op {
                embedded_hal::i2c::Operation::Write(data) => match **data {
                    [base, offset, value] => {
                        state.writes.push([base, offset, value]);
                        state.write(base, offset, value);
                    }
                    [base, offset] => pointer = (base, offset),
                    _ => return Err(MockBusError),
                },
                embedded_hal::i2c::Operation::Read(buf) => {
                    buf.fill(0);
                    if let Some(first) = buf.first_mut() {
                        *first = state.register(pointer);
                    }
                }
            }
        }
        Ok(())
    }
}
