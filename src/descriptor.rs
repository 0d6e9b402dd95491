//! UVC VideoControl descriptor parsing.
//!
//! The class-specific descriptors of the VideoControl interface arrive as one
//! concatenated blob (libusb's "extra" bytes).  Each entry starts with
//! `[bLength, bDescriptorType, bDescriptorSubtype]`; we only care about the
//! camera input terminal and the processing unit, which host the exposure
//! and gain controls.

use crate::property::{ControlSpec, UnitKind};
use crate::protocol::*;

/// A control-hosting entity found in the descriptors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControlUnit {
    pub id: u8,
    /// bmControls, little endian, as advertised by the device.
    pub controls: Vec<u8>,
}

impl ControlUnit {
    /// Whether bmControls advertises the control at `bit`.
    pub fn supports(&self, bit: u32) -> bool {
        let byte = (bit / 8) as usize;
        self.controls
            .get(byte)
            .is_some_and(|b| b & (1 << (bit % 8)) != 0)
    }
}

/// The parts of a camera's VideoControl topology that property access needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VideoControlTopology {
    pub camera_terminal: Option<ControlUnit>,
    pub processing_unit: Option<ControlUnit>,
}

impl VideoControlTopology {
    /// Walk the class-specific descriptor blob of a VideoControl interface.
    ///
    /// Unknown entries are skipped.  A zero or overlong bLength ends the walk
    /// so a malformed descriptor can never cause an out-of-bounds read.
    pub fn parse(extra: &[u8]) -> Self {
        let mut topology = Self::default();
        let mut offset = 0;

        while offset + 3 <= extra.len() {
            let len = extra[offset] as usize;
            if len < 3 || offset + len > extra.len() {
                break;
            }
            let desc = &extra[offset..offset + len];
            offset += len;

            if desc[1] != CS_INTERFACE {
                continue;
            }

            match desc[2] {
                VC_INPUT_TERMINAL if topology.camera_terminal.is_none() => {
                    if desc.len() > CT_CONTROL_SIZE_OFFSET
                        && u16::from_le_bytes([desc[4], desc[5]]) == ITT_CAMERA
                    {
                        topology.camera_terminal = Self::unit(desc, CT_CONTROL_SIZE_OFFSET);
                    }
                }
                VC_PROCESSING_UNIT if topology.processing_unit.is_none() => {
                    if desc.len() > PU_CONTROL_SIZE_OFFSET {
                        topology.processing_unit = Self::unit(desc, PU_CONTROL_SIZE_OFFSET);
                    }
                }
                _ => {}
            }
        }

        topology
    }

    /// Resolve a control to the unit that hosts it, if the device advertises it.
    pub fn unit_for(&self, spec: &ControlSpec) -> Option<&ControlUnit> {
        let unit = match spec.unit {
            UnitKind::CameraTerminal => self.camera_terminal.as_ref(),
            UnitKind::ProcessingUnit => self.processing_unit.as_ref(),
        }?;
        unit.supports(spec.control_bit).then_some(unit)
    }

    fn unit(desc: &[u8], size_offset: usize) -> Option<ControlUnit> {
        let size = desc[size_offset] as usize;
        let start = size_offset + 1;
        let controls = desc.get(start..start + size)?.to_vec();
        Some(ControlUnit { id: desc[3], controls })
    }
}
