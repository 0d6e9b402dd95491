use std::fmt;

use crate::protocol::*;

/// A camera property that a session can read or write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PropertyId {
    /// Exposure time, in the device's units (100 µs for UVC).
    Exposure,
    /// Sensor gain.
    Gain,
}

/// The UVC entity that hosts a control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnitKind {
    CameraTerminal,
    ProcessingUnit,
}

/// Where a property's facet lives on the device and how it is encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSpec {
    pub unit: UnitKind,
    pub selector: u8,
    /// Bit index in the unit's bmControls that advertises this control.
    pub control_bit: u32,
    /// wLength of the control payload.
    pub size: usize,
}

/// Device-reported bounds for a property value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyRange {
    pub min: i32,
    pub max: i32,
    pub step: i32,
}

impl PropertyRange {
    pub fn contains(&self, value: i32) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl PropertyId {
    /// The numeric value facet.
    pub fn value_control(self) -> ControlSpec {
        match self {
            Self::Exposure => ControlSpec {
                unit: UnitKind::CameraTerminal,
                selector: CT_EXPOSURE_TIME_ABSOLUTE_CONTROL,
                control_bit: CT_BIT_EXPOSURE_ABSOLUTE,
                size: 4,
            },
            Self::Gain => ControlSpec {
                unit: UnitKind::ProcessingUnit,
                selector: PU_GAIN_CONTROL,
                control_bit: PU_BIT_GAIN,
                size: 2,
            },
        }
    }

    /// The automatic/manual facet, if the property has one.
    pub fn mode_control(self) -> Option<ControlSpec> {
        match self {
            Self::Exposure => Some(ControlSpec {
                unit: UnitKind::CameraTerminal,
                selector: CT_AE_MODE_CONTROL,
                control_bit: CT_BIT_AE_MODE,
                size: 1,
            }),
            Self::Gain => None,
        }
    }
}

impl fmt::Display for PropertyId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exposure => write!(f, "Exposure"),
            Self::Gain => write!(f, "Gain"),
        }
    }
}

// --- Value encoding ---
//
// Exposure and gain are unsigned on the wire (u32 / u16, little endian).
// The session API speaks i32, so decoding saturates anything a device
// reports above i32::MAX.

/// Decode a little-endian unsigned control payload.
pub fn decode_value(bytes: &[u8]) -> i32 {
    let mut raw = [0u8; 4];
    let n = bytes.len().min(4);
    raw[..n].copy_from_slice(&bytes[..n]);
    i32::try_from(u32::from_le_bytes(raw)).unwrap_or(i32::MAX)
}

/// Encode a value into a `size`-byte little-endian payload.
///
/// Returns `None` when the value is negative or does not fit in `size` bytes.
pub fn encode_value(value: i32, size: usize) -> Option<Vec<u8>> {
    let raw = u32::try_from(value).ok()?;
    if size < 4 && raw >> (size * 8) != 0 {
        return None;
    }
    Some(raw.to_le_bytes()[..size].to_vec())
}

// --- Auto-exposure mode ---

/// Whether an AE mode byte means the device picks the exposure time itself.
///
/// Shutter priority only automates the iris; exposure time stays manual.
pub fn ae_mode_is_auto(mode: u8) -> bool {
    mode & (AE_MODE_AUTO | AE_MODE_APERTURE_PRIORITY) != 0
}

/// Pick the AE mode to write for the requested auto state.
///
/// `supported` is the GET_RES bitmap of modes the device accepts. Aperture
/// priority is preferred because it is the only auto mode most webcams have.
pub fn ae_mode_for(auto: bool, supported: u8) -> u8 {
    if !auto {
        AE_MODE_MANUAL
    } else if supported & AE_MODE_APERTURE_PRIORITY != 0 {
        AE_MODE_APERTURE_PRIORITY
    } else {
        AE_MODE_AUTO
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exposure_lives_on_camera_terminal() {
        let spec = PropertyId::Exposure.value_control();
        assert_eq!(spec.unit, UnitKind::CameraTerminal);
        assert_eq!(spec.selector, CT_EXPOSURE_TIME_ABSOLUTE_CONTROL);
        assert_eq!(spec.size, 4);
        assert!(PropertyId::Exposure.mode_control().is_some());
    }

    #[test]
    fn gain_has_no_mode_facet() {
        let spec = PropertyId::Gain.value_control();
        assert_eq!(spec.unit, UnitKind::ProcessingUnit);
        assert_eq!(spec.control_bit, PU_BIT_GAIN);
        assert!(PropertyId::Gain.mode_control().is_none());
    }

    #[test]
    fn decode_short_and_long_payloads() {
        assert_eq!(decode_value(&[0x96, 0x00]), 150);
        assert_eq!(decode_value(&[0x10, 0x27, 0x00, 0x00]), 10_000);
        assert_eq!(decode_value(&[0xff, 0xff, 0xff, 0xff]), i32::MAX);
        assert_eq!(decode_value(&[]), 0);
    }

    #[test]
    fn encode_respects_width() {
        assert_eq!(encode_value(30, 2), Some(vec![0x1e, 0x00]));
        assert_eq!(encode_value(150, 4), Some(vec![0x96, 0x00, 0x00, 0x00]));
        assert_eq!(encode_value(0x1_0000, 2), None);
        assert_eq!(encode_value(-1, 4), None);
    }

    #[test]
    fn ae_mode_selection() {
        assert_eq!(ae_mode_for(false, 0x0f), AE_MODE_MANUAL);
        assert_eq!(ae_mode_for(true, 0x09), AE_MODE_APERTURE_PRIORITY);
        assert_eq!(ae_mode_for(true, 0x03), AE_MODE_AUTO);
        assert!(!ae_mode_is_auto(AE_MODE_MANUAL));
    }

    #[test]
    fn only_automatic_exposure_time_counts_as_auto() {
        assert!(ae_mode_is_auto(AE_MODE_AUTO));
        assert!(ae_mode_is_auto(AE_MODE_APERTURE_PRIORITY));
        assert!(!ae_mode_is_auto(AE_MODE_SHUTTER_PRIORITY));
        assert!(!ae_mode_is_auto(AE_MODE_MANUAL));

        // Whatever mode enabling auto picks reads back as auto.
        for supported in 0..=0x0f {
            assert!(ae_mode_is_auto(ae_mode_for(true, supported)));
            assert!(!ae_mode_is_auto(ae_mode_for(false, supported)));
        }
    }

    #[test]
    fn range_is_inclusive() {
        let range = PropertyRange { min: 3, max: 2047, step: 1 };
        assert!(range.contains(3));
        assert!(range.contains(2047));
        assert!(!range.contains(2));
        assert!(!range.contains(2048));
    }
}
