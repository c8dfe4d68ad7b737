//! Property-based tests for PMIC and USB status register decoding.
//! Verifies invariants hold for ALL register values, not just fixed examples.

use platform::npm1300::{
    event_mask_from_vbusin_events, vbus_present, EVENT_VBUS_DETECTED, EVENT_VBUS_MASK,
    EVENT_VBUS_REMOVED, VBUSIN0_DETECTED, VBUSIN0_REMOVED,
};
use platform::UsbDeviceStatus;

proptest::proptest! {
    /// Only bit 0 of VBUSIN_STATUS decides presence.
    #[test]
    fn vbus_present_depends_only_on_bit0(status in 0u8..=255u8) {
        assert_eq!(vbus_present(status), vbus_present(status & 0x01));
    }

    /// Translated event masks never carry bits outside the VBUS pair.
    #[test]
    fn event_mask_stays_within_vbus_bits(events in 0u8..=255u8) {
        let mask = event_mask_from_vbusin_events(events);
        assert_eq!(mask & !EVENT_VBUS_MASK, 0);
        assert_eq!(mask & EVENT_VBUS_DETECTED != 0, events & VBUSIN0_DETECTED != 0);
        assert_eq!(mask & EVENT_VBUS_REMOVED != 0, events & VBUSIN0_REMOVED != 0);
    }

    /// Exactly one raw code decodes to Configured.
    #[test]
    fn only_code_three_is_configured(raw in 0u16..=u16::MAX) {
        let configured = UsbDeviceStatus::from_raw(raw) == UsbDeviceStatus::Configured;
        assert_eq!(configured, raw == UsbDeviceStatus::CONFIGURED_CODE,
            "raw {} decoded as {}", raw, UsbDeviceStatus::from_raw(raw));
    }

    /// Codes beyond the table all collapse to Unknown.
    #[test]
    fn out_of_table_codes_are_unknown(raw in 11u16..=u16::MAX) {
        assert_eq!(UsbDeviceStatus::from_raw(raw), UsbDeviceStatus::Unknown);
    }
}
