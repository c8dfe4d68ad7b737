//! nPM1300 power management IC: register map, PMIC event driver and
//! load-switch driver.
//!
//! Reference: Nordic Semiconductor nPM1300 product specification v1.0.
//! Registers use a two-byte address: peripheral base, then offset.

use embassy_time::{Duration, Timer};

use crate::{HalError, PowerManagementIc, Regulator};

/// 7-bit I2C device address.
pub const NPM1300_I2C_ADDR: u8 = 0x6B;

/// MAIN block: event and interrupt registers.
pub const MAIN_BASE: u8 = 0x00;
/// MAIN: VBUSIN event flags, write-1-to-set.
pub const MAIN_EVENTS_VBUSIN0_SET: u8 = 0x16;
/// MAIN: VBUSIN event flags, write-1-to-clear.
pub const MAIN_EVENTS_VBUSIN0_CLR: u8 = 0x17;
/// MAIN: VBUSIN interrupt enable, write-1-to-set.
pub const MAIN_INTEN_VBUSIN0_SET: u8 = 0x18;
/// VBUSIN0 event: VBUS crossed the detection threshold.
pub const VBUSIN0_DETECTED: u8 = 1 << 0;
/// VBUSIN0 event: VBUS dropped below the removal threshold.
pub const VBUSIN0_REMOVED: u8 = 1 << 1;

/// VBUSIN block: USB input supply.
pub const VBUSIN_BASE: u8 = 0x02;
/// VBUSIN: live status register.
pub const VBUSIN_STATUS: u8 = 0x07;
/// VBUSIN_STATUS bit: VBUS present.
pub const VBUSIN_STATUS_PRESENT: u8 = 1 << 0;

/// LOADSW block: load switch tasks.
pub const LOADSW_BASE: u8 = 0x08;
/// LOADSW: enable load switch 1 task.
pub const LOADSW_TASK_LDSW1_SET: u8 = 0x00;
/// LOADSW: disable load switch 1 task.
pub const LOADSW_TASK_LDSW1_CLR: u8 = 0x01;
/// LOADSW: enable load switch 2 task.
pub const LOADSW_TASK_LDSW2_SET: u8 = 0x02;
/// LOADSW: disable load switch 2 task.
pub const LOADSW_TASK_LDSW2_CLR: u8 = 0x03;

/// Default spacing of event register polls in [`Npm1300Pmic::wait_for_events`].
pub const EVENT_POLL_INTERVAL_MS: u64 = 20;

/// Driver event bit: VBUS detected.
pub const EVENT_VBUS_DETECTED: u32 = 1 << 7;
/// Driver event bit: VBUS removed.
pub const EVENT_VBUS_REMOVED: u32 = 1 << 8;
/// Both VBUS event bits.
pub const EVENT_VBUS_MASK: u32 = EVENT_VBUS_DETECTED | EVENT_VBUS_REMOVED;

/// Whether a VBUSIN_STATUS value reports VBUS present.
#[inline]
#[must_use]
pub const fn vbus_present(status: u8) -> bool {
    status & VBUSIN_STATUS_PRESENT != 0
}

/// Translate a VBUSIN0 event register value into driver event bits.
#[must_use]
pub const fn event_mask_from_vbusin_events(events: u8) -> u32 {
    let mut mask = 0;
    if events & VBUSIN0_DETECTED != 0 {
        mask |= EVENT_VBUS_DETECTED;
    }
    if events & VBUSIN0_REMOVED != 0 {
        mask |= EVENT_VBUS_REMOVED;
    }
    mask
}

fn map_i2c_error<E: embedded_hal::i2c::Error>(err: &E) -> HalError {
    match err.kind() {
        embedded_hal::i2c::ErrorKind::NoAcknowledge(_) => HalError::NotReady,
        _ => HalError::Io,
    }
}

/// Read one register over I2C.
/// # Errors
/// Returns `NotReady` when the device does not acknowledge, `Io` otherwise.
pub fn read_register<I>(i2c: &mut I, base: u8, offset: u8) -> Result<u8, HalError>
where
    I: embedded_hal::i2c::I2c,
{
    let mut value = [0u8; 1];
    i2c.write_read(NPM1300_I2C_ADDR, &[base, offset], &mut value)
        .map_err(|e| map_i2c_error(&e))?;
    let [byte] = value;
    Ok(byte)
}

/// Write one register over I2C.
/// # Errors
/// Returns `NotReady` when the device does not acknowledge, `Io` otherwise.
pub fn write_register<I>(i2c: &mut I, base: u8, offset: u8, value: u8) -> Result<(), HalError>
where
    I: embedded_hal::i2c::I2c,
{
    i2c.write(NPM1300_I2C_ADDR, &[base, offset, value])
        .map_err(|e| map_i2c_error(&e))
}

/// Route the VBUS detected / removed events to the interrupt pin and clear
/// any latched ones.
/// # Errors
/// Returns the first failing register write.
pub fn enable_vbus_interrupts<I>(i2c: &mut I) -> Result<(), HalError>
where
    I: embedded_hal::i2c::I2c,
{
    let bits = VBUSIN0_DETECTED | VBUSIN0_REMOVED;
    write_register(i2c, MAIN_BASE, MAIN_EVENTS_VBUSIN0_CLR, bits)?;
    write_register(i2c, MAIN_BASE, MAIN_INTEN_VBUSIN0_SET, bits)
}

/// Load switch selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum LoadSwitch {
    /// LDSW1
    Ldsw1,
    /// LDSW2
    Ldsw2,
}

impl LoadSwitch {
    const fn set_offset(self) -> u8 {
        match self {
            Self::Ldsw1 => LOADSW_TASK_LDSW1_SET,
            Self::Ldsw2 => LOADSW_TASK_LDSW2_SET,
        }
    }

    const fn clr_offset(self) -> u8 {
        match self {
            Self::Ldsw1 => LOADSW_TASK_LDSW1_CLR,
            Self::Ldsw2 => LOADSW_TASK_LDSW2_CLR,
        }
    }
}

/// One nPM1300 load switch driven as a [`Regulator`].
///
/// The task registers are write-only, so the enabled state is the last
/// successfully commanded one.
pub struct Npm1300LoadSwitch<I> {
    i2c: I,
    switch: LoadSwitch,
    name: &'static str,
    enabled: bool,
}

impl<I: embedded_hal::i2c::I2c> Npm1300LoadSwitch<I> {
    /// Wrap a bus handle. `enabled` is the state the rail boots in.
    pub fn new(i2c: I, switch: LoadSwitch, name: &'static str, enabled: bool) -> Self {
        Self {
            i2c,
            switch,
            name,
            enabled,
        }
    }

    /// Which switch this driver controls.
    pub fn switch(&self) -> LoadSwitch {
        self.switch
    }

    /// Give the bus handle back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: embedded_hal::i2c::I2c> Regulator for Npm1300LoadSwitch<I> {
    fn name(&self) -> &'static str {
        self.name
    }

    fn enable(&mut self) -> Result<(), HalError> {
        write_register(&mut self.i2c, LOADSW_BASE, self.switch.set_offset(), 1)?;
        self.enabled = true;
        Ok(())
    }

    fn disable(&mut self) -> Result<(), HalError> {
        write_register(&mut self.i2c, LOADSW_BASE, self.switch.clr_offset(), 1)?;
        self.enabled = false;
        Ok(())
    }

    fn is_enabled(&self) -> bool {
        self.enabled
    }
}

/// The nPM1300 core as a [`PowerManagementIc`].
///
/// Events are latched in `MAIN_EVENTS_VBUSIN0_SET`. `wait_for_events`
/// polls that register and acknowledges what it found through the
/// matching clear register, so each edge is reported once.
pub struct Npm1300Pmic<I> {
    i2c: I,
    poll_interval: Duration,
    subscribed: u32,
}

impl<I: embedded_hal::i2c::I2c> Npm1300Pmic<I> {
    /// Wrap a bus handle. Nothing is subscribed until [`PowerManagementIc::subscribe`].
    pub fn new(i2c: I) -> Self {
        Self {
            i2c,
            poll_interval: Duration::from_millis(EVENT_POLL_INTERVAL_MS),
            subscribed: 0,
        }
    }

    /// Set the event register poll interval.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Event bits accepted by the last successful subscribe.
    pub fn subscribed(&self) -> u32 {
        self.subscribed
    }

    /// Read and acknowledge latched VBUS events.
    ///
    /// Returns the subscribed driver event bits among them, `0` if none.
    pub fn take_events(&mut self) -> Result<u32, HalError> {
        let latched = read_register(&mut self.i2c, MAIN_BASE, MAIN_EVENTS_VBUSIN0_SET)?;
        let pending = latched & (VBUSIN0_DETECTED | VBUSIN0_REMOVED);
        if pending != 0 {
            write_register(&mut self.i2c, MAIN_BASE, MAIN_EVENTS_VBUSIN0_CLR, pending)?;
        }
        Ok(event_mask_from_vbusin_events(pending) & self.subscribed)
    }

    /// Give the bus handle back.
    pub fn release(self) -> I {
        self.i2c
    }
}

impl<I: embedded_hal::i2c::I2c> PowerManagementIc for Npm1300Pmic<I> {
    async fn read_register(&mut self, base: u8, offset: u8) -> Result<u8, HalError> {
        read_register(&mut self.i2c, base, offset)
    }

    fn subscribe(&mut self, mask: u32) -> Result<(), HalError> {
        if mask & !EVENT_VBUS_MASK != 0 {
            return Err(HalError::Unsupported);
        }
        enable_vbus_interrupts(&mut self.i2c)?;
        self.subscribed = mask;
        Ok(())
    }

    async fn wait_for_events(&mut self) -> u32 {
        loop {
            // Bus errors are retried on the next poll.
            if let Ok(mask) = self.take_events() {
                if mask != 0 {
                    return mask;
                }
            }
            Timer::after(self.poll_interval).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Nack;

    impl embedded_hal::i2c::Error for Nack {
        fn kind(&self) -> embedded_hal::i2c::ErrorKind {
            embedded_hal::i2c::ErrorKind::NoAcknowledge(
                embedded_hal::i2c::NoAcknowledgeSource::Address,
            )
        }
    }

    #[derive(Default)]
    struct SharedMockI2c {
        writes: std::vec::Vec<(u8, std::vec::Vec<u8>)>,
        read_value: u8,
        nack: bool,
    }
    impl embedded_hal::i2c::ErrorType for SharedMockI2c {
        type Error = Nack;
    }
    impl embedded_hal::i2c::I2c for SharedMockI2c {
        fn transaction(
            &mut self,
            address: u8,
            operations: &mut [embedded_hal::i2c::Operation<'_>],
        ) -> Result<(), Self::Error> {
            if self.nack {
                return Err(Nack);
            }
            for op in operations.iter_mut() {
                match op {
                    embedded_hal::i2c::Operation::Write(data) => {
                        self.writes.push((address, data.to_vec()));
                    }
                    embedded_hal::i2c::Operation::Read(buf) => {
                        buf.fill(self.read_value);
                    }
                }
            }
            Ok(())
        }
    }

    #[test]
    fn npm1300_i2c_addr_is_0x6b() {
        assert_eq!(NPM1300_I2C_ADDR, 0x6B);
    }

    #[test]
    fn vbus_status_bit_zero_means_present() {
        assert!(vbus_present(0x01));
        assert!(vbus_present(0xFF));
        assert!(!vbus_present(0x00));
        assert!(!vbus_present(0xFE));
    }

    #[test]
    fn event_mask_covers_both_vbus_bits() {
        assert_eq!(EVENT_VBUS_MASK, 0x180);
        assert_eq!(event_mask_from_vbusin_events(0), 0);
        assert_eq!(event_mask_from_vbusin_events(VBUSIN0_DETECTED), EVENT_VBUS_DETECTED);
        assert_eq!(event_mask_from_vbusin_events(VBUSIN0_REMOVED), EVENT_VBUS_REMOVED);
        assert_eq!(event_mask_from_vbusin_events(0b11), EVENT_VBUS_MASK);
        // Unrelated VBUSIN events (over-voltage, under-voltage) are ignored.
        assert_eq!(event_mask_from_vbusin_events(0b1100), 0);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn read_register_sends_two_byte_address() {
        let mut mock = SharedMockI2c { read_value: 0x01, ..Default::default() };
        let v = read_register(&mut mock, VBUSIN_BASE, VBUSIN_STATUS).unwrap();
        assert_eq!(v, 0x01);
        assert_eq!(mock.writes, std::vec![(NPM1300_I2C_ADDR, std::vec![0x02, 0x07])]);
    }

    #[test]
    fn nack_maps_to_not_ready() {
        let mut mock = SharedMockI2c { nack: true, ..Default::default() };
        assert_eq!(read_register(&mut mock, VBUSIN_BASE, VBUSIN_STATUS), Err(HalError::NotReady));
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn enable_vbus_interrupts_clears_then_enables() {
        let mut mock = SharedMockI2c::default();
        enable_vbus_interrupts(&mut mock).unwrap();
        assert_eq!(
            mock.writes,
            std::vec![
                (NPM1300_I2C_ADDR, std::vec![MAIN_BASE, MAIN_EVENTS_VBUSIN0_CLR, 0b11]),
                (NPM1300_I2C_ADDR, std::vec![MAIN_BASE, MAIN_INTEN_VBUSIN0_SET, 0b11]),
            ]
        );
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn load_switch_writes_task_registers() {
        let mut ldsw = Npm1300LoadSwitch::new(SharedMockI2c::default(), LoadSwitch::Ldsw2, "ldsw2", true);
        ldsw.disable().unwrap();
        assert!(!ldsw.is_enabled());
        ldsw.enable().unwrap();
        assert!(ldsw.is_enabled());
        let bus = ldsw.release();
        assert_eq!(
            bus.writes,
            std::vec![
                (NPM1300_I2C_ADDR, std::vec![LOADSW_BASE, LOADSW_TASK_LDSW2_CLR, 1]),
                (NPM1300_I2C_ADDR, std::vec![LOADSW_BASE, LOADSW_TASK_LDSW2_SET, 1]),
            ]
        );
    }

    #[test]
    fn failed_disable_keeps_rail_marked_enabled() {
        let mut ldsw = Npm1300LoadSwitch::new(
            SharedMockI2c { nack: true, ..Default::default() },
            LoadSwitch::Ldsw1,
            "ldsw1",
            true,
        );
        assert_eq!(ldsw.disable(), Err(HalError::NotReady));
        assert!(ldsw.is_enabled());
        assert_eq!(ldsw.name(), "ldsw1");
        assert_eq!(ldsw.switch(), LoadSwitch::Ldsw1);
    }

    #[allow(clippy::unwrap_used)]
    #[test]
    fn take_events_acknowledges_latched_bits() {
        let mock = SharedMockI2c { read_value: VBUSIN0_REMOVED | 0b100, ..Default::default() };
        let mut pmic = Npm1300Pmic::new(mock);
        pmic.subscribe(EVENT_VBUS_MASK).unwrap();
        assert_eq!(pmic.subscribed(), EVENT_VBUS_MASK);

        assert_eq!(pmic.take_events(), Ok(EVENT_VBUS_REMOVED));
        let bus = pmic.release();
        assert_eq!(
            bus.writes.last(),
            Some(&(NPM1300_I2C_ADDR, std::vec![MAIN_BASE, MAIN_EVENTS_VBUSIN0_CLR, VBUSIN0_REMOVED]))
        );
        assert!(bus
            .writes
            .contains(&(NPM1300_I2C_ADDR, std::vec![MAIN_BASE, MAIN_EVENTS_VBUSIN0_SET])));
    }

    #[test]
    fn unsubscribed_events_are_dropped() {
        let mock = SharedMockI2c { read_value: VBUSIN0_DETECTED, ..Default::default() };
        let mut pmic = Npm1300Pmic::new(mock);
        assert_eq!(pmic.take_events(), Ok(0));
    }

    #[test]
    fn subscribe_rejects_foreign_bits_and_nacks() {
        let mut pmic = Npm1300Pmic::new(SharedMockI2c::default());
        assert_eq!(pmic.subscribe(1 << 3), Err(HalError::Unsupported));
        assert!(pmic.release().writes.is_empty());

        let mut pmic = Npm1300Pmic::new(SharedMockI2c { nack: true, ..Default::default() });
        assert_eq!(pmic.subscribe(EVENT_VBUS_MASK), Err(HalError::NotReady));
        assert_eq!(pmic.subscribed(), 0);
    }
}
