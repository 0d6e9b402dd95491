//! libusb backend: device discovery and UVC control transfers.
//!
//! [`UsbEnumerator`] scans the bus for cameras with the requested IDs and
//! derives each one's location from its bus and port chain.
//! [`UsbEnumerator::open_channel`] locates the VideoControl interface, parses
//! its descriptors, and claims it.  The [`Drop`] impl on [`UsbChannel`]
//! releases the interface and reattaches the kernel driver on cleanup.
//!
//! Every property access is a single class-specific request on the
//! VideoControl interface:
//!   `wValue = selector << 8`, `wIndex = unit_id << 8 | interface`.

use std::time::Duration;

use log::{Level, LevelFilter, debug, warn};
use rusb::{Context, Device, DeviceHandle, UsbContext};

use crate::channel::ControlChannel;
use crate::descriptor::VideoControlTopology;
use crate::device::{DeviceCandidate, DeviceEnumerator, location_id};
use crate::error::ControlError;
use crate::property::*;
use crate::protocol::*;
use crate::session::SessionConfig;

/// Enumerates cameras through libusb.
///
/// A fresh libusb context is created per query, so constructing an
/// enumerator never touches the bus.
#[derive(Debug, Default)]
pub struct UsbEnumerator;

impl UsbEnumerator {
    pub fn new() -> Self {
        Self
    }

    /// Find the VideoControl interface and its class-specific descriptors.
    fn find_video_control(device: &Device<Context>) -> Result<(u8, Vec<u8>), ControlError> {
        let config = device
            .active_config_descriptor()
            .map_err(|e| ControlError::ChannelOpenFailed(format!("reading configuration: {}", e)))?;

        for interface in config.interfaces() {
            for desc in interface.descriptors() {
                if desc.class_code() == CC_VIDEO && desc.sub_class_code() == SC_VIDEOCONTROL {
                    return Ok((desc.interface_number(), desc.extra().to_vec()));
                }
            }
        }

        Err(ControlError::ChannelOpenFailed(
            "device has no UVC VideoControl interface".to_string(),
        ))
    }
}

impl DeviceEnumerator for UsbEnumerator {
    type Handle = Device<Context>;
    type Channel = UsbChannel;

    fn list_matching(
        &self,
        vendor_id: u16,
        product_id: u16,
        config: &SessionConfig,
    ) -> Result<Vec<DeviceCandidate<Device<Context>>>, ControlError> {
        let context = Context::new()
            .map_err(|e| ControlError::ChannelError(format!("initializing libusb: {}", e)))?;
        let devices = context
            .devices()
            .map_err(|e| ControlError::ChannelError(format!("listing USB devices: {}", e)))?;

        let mut found = Vec::new();
        for device in devices.iter() {
            let desc = match device.device_descriptor() {
                Ok(d) => d,
                Err(_) => continue,
            };
            if desc.vendor_id() != vendor_id || desc.product_id() != product_id {
                continue;
            }

            let bus = device.bus_number();
            let ports = match device.port_numbers() {
                Ok(ports) => ports,
                Err(e) => {
                    if config.logs(Level::Warn) {
                        warn!(
                            "Skipping {:04x}:{:04x} on bus {}: reading port chain: {}",
                            vendor_id, product_id, bus, e
                        );
                    }
                    continue;
                }
            };
            let Some(location) = location_id(bus, &ports) else {
                if config.logs(Level::Warn) {
                    warn!(
                        "Skipping {:04x}:{:04x} on bus {} ports {:?}: no location ID for this port chain",
                        vendor_id, product_id, bus, ports
                    );
                }
                continue;
            };
            if config.logs(Level::Debug) {
                debug!(
                    "Found {:04x}:{:04x} on bus {} ports {:?} (location 0x{:08x})",
                    vendor_id, product_id, bus, ports, location
                );
            }

            found.push(DeviceCandidate {
                vendor_id,
                product_id,
                location_id: location,
                handle: device,
            });
        }

        Ok(found)
    }

    fn open_channel(
        &self,
        candidate: DeviceCandidate<Device<Context>>,
        config: &SessionConfig,
    ) -> Result<UsbChannel, ControlError> {
        let device = candidate.handle;
        let (interface, extra) = Self::find_video_control(&device)?;
        let topology = VideoControlTopology::parse(&extra);

        let mut handle = device
            .open()
            .map_err(|e| ControlError::ChannelOpenFailed(format!("opening device: {}", e)))?;

        let kernel_driver_was_active = handle.kernel_driver_active(interface).unwrap_or(false);
        if kernel_driver_was_active {
            handle.detach_kernel_driver(interface).map_err(|e| {
                ControlError::ChannelOpenFailed(format!(
                    "detaching kernel driver from interface {}: {}",
                    interface, e
                ))
            })?;
            if config.logs(Level::Debug) {
                debug!("Temporarily detached kernel driver from interface {}", interface);
            }
        }

        if let Err(e) = handle.claim_interface(interface) {
            if kernel_driver_was_active {
                let _ = handle.attach_kernel_driver(interface);
            }
            return Err(ControlError::ChannelOpenFailed(format!(
                "claiming interface {}: {}",
                interface, e
            )));
        }
        if config.logs(Level::Debug) {
            debug!("Claimed VideoControl interface {}", interface);
        }

        Ok(UsbChannel {
            handle,
            interface,
            topology,
            timeout: config.transfer_timeout,
            log_level: config.log_level,
            kernel_driver_was_active,
        })
    }
}

/// A claimed VideoControl interface on an opened camera.
pub struct UsbChannel {
    handle: DeviceHandle<Context>,
    interface: u8,
    topology: VideoControlTopology,
    timeout: Duration,
    log_level: LevelFilter,
    kernel_driver_was_active: bool,
}

impl UsbChannel {
    fn logs(&self, level: Level) -> bool {
        level <= self.log_level
    }

    // --- Low-level UVC transport ---

    /// wIndex for a control on `unit_id`.
    fn w_index(&self, unit_id: u8) -> u16 {
        ((unit_id as u16) << 8) | self.interface as u16
    }

    /// Unit ID hosting `spec`, or `UnsupportedProperty` if the device does
    /// not advertise it.
    fn unit_id(&self, id: PropertyId, spec: &ControlSpec, facet: &'static str) -> Result<u8, ControlError> {
        self.topology
            .unit_for(spec)
            .map(|unit| unit.id)
            .ok_or(ControlError::UnsupportedProperty { property: id, facet })
    }

    /// GET_* request for one control, returning exactly `spec.size` bytes.
    fn get(&self, request: u8, unit_id: u8, spec: &ControlSpec) -> Result<Vec<u8>, ControlError> {
        let mut buf = vec![0u8; spec.size];

        let len = self
            .handle
            .read_control(
                UVC_REQUEST_TYPE_IN,
                request,
                (spec.selector as u16) << 8,
                self.w_index(unit_id),
                &mut buf,
                self.timeout,
            )
            .map_err(|e| ControlError::from_transfer(request_name(request), e))?;

        if len != spec.size {
            return Err(ControlError::ChannelError(format!(
                "{} returned {} bytes, expected {}",
                request_name(request),
                len,
                spec.size
            )));
        }

        Ok(buf)
    }

    /// SET_CUR for one control.
    fn set_cur(&self, unit_id: u8, spec: &ControlSpec, data: &[u8]) -> Result<(), ControlError> {
        self.handle
            .write_control(
                UVC_REQUEST_TYPE_OUT,
                UVC_SET_CUR,
                (spec.selector as u16) << 8,
                self.w_index(unit_id),
                data,
                self.timeout,
            )
            .map_err(|e| ControlError::from_transfer("SET_CUR", e))?;

        Ok(())
    }

    fn mode_spec(id: PropertyId) -> Result<ControlSpec, ControlError> {
        id.mode_control()
            .ok_or(ControlError::UnsupportedProperty { property: id, facet: "auto mode" })
    }
}

impl ControlChannel for UsbChannel {
    fn read_value(&mut self, id: PropertyId) -> Result<i32, ControlError> {
        let spec = id.value_control();
        let unit = self.unit_id(id, &spec, "value")?;
        let data = self.get(UVC_GET_CUR, unit, &spec)?;
        Ok(decode_value(&data))
    }

    fn write_value(&mut self, id: PropertyId, value: i32) -> Result<(), ControlError> {
        let spec = id.value_control();
        let unit = self.unit_id(id, &spec, "value")?;
        let data = encode_value(value, spec.size).ok_or(ControlError::InvalidPropertyValue {
            property: id,
            value,
            min: 0,
            max: if spec.size >= 4 { i32::MAX } else { (1 << (spec.size * 8)) - 1 },
        })?;
        self.set_cur(unit, &spec, &data)
    }

    fn value_range(&mut self, id: PropertyId) -> Result<PropertyRange, ControlError> {
        let spec = id.value_control();
        let unit = self.unit_id(id, &spec, "value")?;
        let min = decode_value(&self.get(UVC_GET_MIN, unit, &spec)?);
        let max = decode_value(&self.get(UVC_GET_MAX, unit, &spec)?);
        let step = decode_value(&self.get(UVC_GET_RES, unit, &spec)?);
        Ok(PropertyRange { min, max, step })
    }

    fn read_auto_mode(&mut self, id: PropertyId) -> Result<bool, ControlError> {
        let spec = Self::mode_spec(id)?;
        let unit = self.unit_id(id, &spec, "auto mode")?;
        let data = self.get(UVC_GET_CUR, unit, &spec)?;
        Ok(ae_mode_is_auto(data[0]))
    }

    fn write_auto_mode(&mut self, id: PropertyId, enabled: bool) -> Result<(), ControlError> {
        let spec = Self::mode_spec(id)?;
        let unit = self.unit_id(id, &spec, "auto mode")?;
        // For AE mode, GET_RES is the bitmap of modes the device accepts.
        let supported = self.get(UVC_GET_RES, unit, &spec)?[0];
        let mode = ae_mode_for(enabled, supported);
        if self.logs(Level::Debug) {
            debug!("Writing AE mode 0x{:02x} (supported 0x{:02x})", mode, supported);
        }
        self.set_cur(unit, &spec, &[mode])
    }
}

impl Drop for UsbChannel {
    fn drop(&mut self) {
        if let Err(e) = self.handle.release_interface(self.interface) {
            if self.logs(Level::Warn) {
                warn!("Failed to release interface {}: {}", self.interface, e);
            }
        }

        if self.kernel_driver_was_active {
            // Best-effort reattach; fails on platforms without kernel drivers
            let _ = self.handle.attach_kernel_driver(self.interface);
        }
    }
}

fn request_name(request: u8) -> &'static str {
    match request {
        UVC_GET_CUR => "GET_CUR",
        UVC_GET_MIN => "GET_MIN",
        UVC_GET_MAX => "GET_MAX",
        UVC_GET_RES => "GET_RES",
        _ => "GET",
    }
}
