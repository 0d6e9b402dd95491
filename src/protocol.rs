//! Protocol constants for UVC VideoControl requests and descriptors.
//!
//! All magic numbers, selectors, and descriptor subtypes are defined here so
//! the rest of the codebase references named constants instead of raw hex.
//! Values follow the USB Device Class Definition for Video Devices 1.5.

// ---------------------------------------------------------------------------
// Interface identification
// ---------------------------------------------------------------------------

/// bInterfaceClass for video devices (CC_VIDEO).
pub const CC_VIDEO: u8 = 0x0e;
/// bInterfaceSubClass for the VideoControl interface (SC_VIDEOCONTROL).
pub const SC_VIDEOCONTROL: u8 = 0x01;

// ---------------------------------------------------------------------------
// Class-specific VideoControl descriptors
// ---------------------------------------------------------------------------

/// bDescriptorType for class-specific interface descriptors.
pub const CS_INTERFACE: u8 = 0x24;
/// VC_INPUT_TERMINAL descriptor subtype.
pub const VC_INPUT_TERMINAL: u8 = 0x02;
/// VC_PROCESSING_UNIT descriptor subtype.
pub const VC_PROCESSING_UNIT: u8 = 0x05;
/// wTerminalType of a camera sensor input terminal (ITT_CAMERA).
pub const ITT_CAMERA: u16 = 0x0201;

/// Offset of bControlSize in a camera terminal descriptor.
pub const CT_CONTROL_SIZE_OFFSET: usize = 14;
/// Offset of bControlSize in a processing unit descriptor.
pub const PU_CONTROL_SIZE_OFFSET: usize = 7;

// ---------------------------------------------------------------------------
// Control selectors and their bmControls bit positions
// ---------------------------------------------------------------------------

/// CT_AE_MODE_CONTROL — auto-exposure mode bitmap, 1 byte.
pub const CT_AE_MODE_CONTROL: u8 = 0x02;
/// CT_EXPOSURE_TIME_ABSOLUTE_CONTROL — exposure time in 100 µs units, 4 bytes.
pub const CT_EXPOSURE_TIME_ABSOLUTE_CONTROL: u8 = 0x04;
/// PU_GAIN_CONTROL — gain, 2 bytes unsigned.
pub const PU_GAIN_CONTROL: u8 = 0x04;

/// Camera terminal bmControls bit: Auto-Exposure Mode.
pub const CT_BIT_AE_MODE: u32 = 1;
/// Camera terminal bmControls bit: Exposure Time (Absolute).
pub const CT_BIT_EXPOSURE_ABSOLUTE: u32 = 3;
/// Processing unit bmControls bit: Gain.
pub const PU_BIT_GAIN: u32 = 9;

// ---------------------------------------------------------------------------
// Auto-exposure mode bitmap values
// ---------------------------------------------------------------------------

/// Manual exposure time, manual iris.
pub const AE_MODE_MANUAL: u8 = 0x01;
/// Auto exposure time, auto iris.
pub const AE_MODE_AUTO: u8 = 0x02;
/// Manual exposure time, auto iris.
pub const AE_MODE_SHUTTER_PRIORITY: u8 = 0x04;
/// Auto exposure time, manual iris. The auto mode most webcams implement.
pub const AE_MODE_APERTURE_PRIORITY: u8 = 0x08;

// ---------------------------------------------------------------------------
// Class-specific requests
// ---------------------------------------------------------------------------

/// bmRequestType for class request to an interface (host-to-device).
pub const UVC_REQUEST_TYPE_OUT: u8 = 0x21;
/// bmRequestType for class request to an interface (device-to-host).
pub const UVC_REQUEST_TYPE_IN: u8 = 0xA1;
/// SET_CUR bRequest.
pub const UVC_SET_CUR: u8 = 0x01;
/// GET_CUR bRequest.
pub const UVC_GET_CUR: u8 = 0x81;
/// GET_MIN bRequest.
pub const UVC_GET_MIN: u8 = 0x82;
/// GET_MAX bRequest.
pub const UVC_GET_MAX: u8 = 0x83;
/// GET_RES bRequest. For CT_AE_MODE_CONTROL this returns the supported-mode bitmap.
pub const UVC_GET_RES: u8 = 0x84;

// ---------------------------------------------------------------------------
// Shared
// ---------------------------------------------------------------------------

/// Default USB control transfer timeout.
pub const USB_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(1);
/// Number of port levels that fit in a location ID below the bus byte.
pub const LOCATION_MAX_DEPTH: usize = 6;
