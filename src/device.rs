//! Device identity and resolution.
//!
//! A [`DeviceIdentity`] names a camera by vendor ID, product ID and location.
//! [`resolve`] asks a [`DeviceEnumerator`] for every connected device with the
//! right IDs and picks exactly one, using the location to tell identical
//! models apart.  Nothing is opened here; that happens in
//! [`ControlSession::open`](crate::ControlSession::open).

use std::fmt;

use log::{Level, debug, info};

use crate::channel::ControlChannel;
use crate::error::ControlError;
use crate::protocol::LOCATION_MAX_DEPTH;
use crate::session::SessionConfig;

/// Location ID that matches any device.
pub const ANY_LOCATION: u32 = 0;

/// Which camera to control.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeviceIdentity {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Platform location ID, or [`ANY_LOCATION`] to take the first match.
    pub location_id: u32,
}

impl DeviceIdentity {
    pub fn new(vendor_id: u16, product_id: u16, location_id: u32) -> Self {
        Self { vendor_id, product_id, location_id }
    }

    pub fn is_wildcard(&self) -> bool {
        self.location_id == ANY_LOCATION
    }

    fn not_found(&self) -> ControlError {
        ControlError::DeviceNotFound {
            vendor_id: self.vendor_id,
            product_id: self.product_id,
            location: if self.is_wildcard() {
                "any".to_string()
            } else {
                format!("0x{:08x}", self.location_id)
            },
        }
    }
}

impl fmt::Display for DeviceIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04x}:{:04x}", self.vendor_id, self.product_id)?;
        if self.is_wildcard() {
            write!(f, " @ any")
        } else {
            write!(f, " @ 0x{:08x}", self.location_id)
        }
    }
}

/// One enumerated device that matched a vendor/product query.
///
/// `handle` is whatever the backend needs to open a channel later; it is
/// opaque to the resolver.
#[derive(Debug, Clone)]
pub struct DeviceCandidate<H> {
    pub vendor_id: u16,
    pub product_id: u16,
    /// Actual location of this device. Never [`ANY_LOCATION`].
    pub location_id: u32,
    pub handle: H,
}

impl<H> DeviceCandidate<H> {
    /// The concrete identity of this device.
    pub fn identity(&self) -> DeviceIdentity {
        DeviceIdentity::new(self.vendor_id, self.product_id, self.location_id)
    }
}

/// Backend that can list cameras and open control channels to them.
pub trait DeviceEnumerator {
    /// Opaque per-device token carried in each candidate.
    type Handle;
    /// Channel type produced by [`open_channel`](Self::open_channel).
    type Channel: ControlChannel;

    /// Every connected device with the given IDs, in platform enumeration order.
    ///
    /// Devices whose location cannot be expressed as a location ID are left
    /// out rather than given one that might collide with another device.
    fn list_matching(
        &self,
        vendor_id: u16,
        product_id: u16,
        config: &SessionConfig,
    ) -> Result<Vec<DeviceCandidate<Self::Handle>>, ControlError>;

    /// Open a control channel to a previously listed device.
    ///
    /// Fails with [`ControlError::ChannelOpenFailed`] if the device went away,
    /// access is denied, or another owner holds it exclusively.
    fn open_channel(
        &self,
        candidate: DeviceCandidate<Self::Handle>,
        config: &SessionConfig,
    ) -> Result<Self::Channel, ControlError>;
}

/// Pick the one device `identity` refers to.
///
/// A wildcard location takes the first candidate in enumeration order;
/// otherwise the location must match exactly.
pub fn resolve<E: DeviceEnumerator>(
    enumerator: &E,
    identity: &DeviceIdentity,
    config: &SessionConfig,
) -> Result<DeviceCandidate<E::Handle>, ControlError> {
    let candidates = enumerator.list_matching(identity.vendor_id, identity.product_id, config)?;
    if config.logs(Level::Debug) {
        debug!("{} candidate(s) for {}", candidates.len(), identity);
    }

    let chosen = candidates.into_iter().find(|c| {
        if config.logs(Level::Debug) {
            debug!("Considering {:04x}:{:04x} at 0x{:08x}", c.vendor_id, c.product_id, c.location_id);
        }
        identity.is_wildcard() || c.location_id == identity.location_id
    });

    match chosen {
        Some(candidate) => {
            if config.logs(Level::Info) {
                info!("Resolved {} to location 0x{:08x}", identity, candidate.location_id);
            }
            Ok(candidate)
        }
        None => Err(identity.not_found()),
    }
}

/// Build a location ID from a bus number and port chain.
///
/// Uses the IOKit layout: bus in the top byte, then one nibble per port from
/// the root hub down.  Returns `None` when the chain is deeper than six
/// levels or a port number does not fit in a nibble, since truncating either
/// would give two devices the same ID.  Bus numbers start at 1, so the
/// result is never [`ANY_LOCATION`].
pub fn location_id(bus: u8, ports: &[u8]) -> Option<u32> {
    if ports.len() > LOCATION_MAX_DEPTH {
        return None;
    }

    let mut id = (bus as u32) << 24;
    for (depth, &port) in ports.iter().enumerate() {
        if port > 0x0f {
            return None;
        }
        id |= (port as u32) << (20 - 4 * depth);
    }
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::{PropertyId, PropertyRange};
    use std::cell::Cell;

    struct NullChannel;

    impl ControlChannel for NullChannel {
        fn read_value(&mut self, _: PropertyId) -> Result<i32, ControlError> {
            Ok(0)
        }
        fn write_value(&mut self, _: PropertyId, _: i32) -> Result<(), ControlError> {
            Ok(())
        }
        fn value_range(&mut self, _: PropertyId) -> Result<PropertyRange, ControlError> {
            Ok(PropertyRange { min: 0, max: 0, step: 1 })
        }
        fn read_auto_mode(&mut self, _: PropertyId) -> Result<bool, ControlError> {
            Ok(false)
        }
        fn write_auto_mode(&mut self, _: PropertyId, _: bool) -> Result<(), ControlError> {
            Ok(())
        }
    }

    /// Simulated bus: (vid, pid, location) triples in enumeration order.
    struct FakeBus {
        devices: Vec<(u16, u16, u32)>,
        queries: Cell<usize>,
    }

    impl FakeBus {
        fn new(devices: &[(u16, u16, u32)]) -> Self {
            Self { devices: devices.to_vec(), queries: Cell::new(0) }
        }
    }

    impl DeviceEnumerator for FakeBus {
        type Handle = usize;
        type Channel = NullChannel;

        fn list_matching(
            &self,
            vid: u16,
            pid: u16,
            _: &SessionConfig,
        ) -> Result<Vec<DeviceCandidate<usize>>, ControlError> {
            self.queries.set(self.queries.get() + 1);
            Ok(self
                .devices
                .iter()
                .enumerate()
                .filter(|(_, d)| d.0 == vid && d.1 == pid)
                .map(|(i, d)| DeviceCandidate { vendor_id: d.0, product_id: d.1, location_id: d.2, handle: i })
                .collect())
        }

        fn open_channel(&self, _: DeviceCandidate<usize>, _: &SessionConfig) -> Result<NullChannel, ControlError> {
            Ok(NullChannel)
        }
    }

    fn pick(bus: &FakeBus, location: u32) -> Result<DeviceCandidate<usize>, ControlError> {
        resolve(bus, &DeviceIdentity::new(0x046d, 0x0825, location), &SessionConfig::default())
    }

    const TWIN_CAMERAS: &[(u16, u16, u32)] = &[
        (0x046d, 0x0825, 0x0110_0000),
        (0x1234, 0x5678, 0x1410_0000),
        (0x046d, 0x0825, 0x0120_0000),
        (0x046d, 0x0825, 0x0213_0000),
    ];

    #[test]
    fn exact_location_picks_that_device() {
        let bus = FakeBus::new(TWIN_CAMERAS);
        for &location in &[0x0110_0000, 0x0120_0000, 0x0213_0000] {
            let c = pick(&bus, location).unwrap();
            assert_eq!(c.location_id, location);
            assert_eq!(c.identity(), DeviceIdentity::new(0x046d, 0x0825, location));
        }
    }

    #[test]
    fn wildcard_takes_first_in_enumeration_order() {
        let bus = FakeBus::new(TWIN_CAMERAS);
        let c = pick(&bus, ANY_LOCATION).unwrap();
        assert_eq!(c.handle, 0);
        assert_eq!(c.location_id, 0x0110_0000);
    }

    #[test]
    fn empty_enumeration_is_not_found() {
        let bus = FakeBus::new(&[]);
        let err = pick(&bus, ANY_LOCATION).unwrap_err();
        assert!(matches!(err, ControlError::DeviceNotFound { location, .. } if location == "any"));
        assert_eq!(bus.queries.get(), 1);
    }

    #[test]
    fn unmatched_location_is_not_found() {
        let bus = FakeBus::new(TWIN_CAMERAS);
        // Right location, wrong model.
        let err = pick(&bus, 0x1410_0000).unwrap_err();
        assert!(matches!(
            err,
            ControlError::DeviceNotFound { vendor_id: 0x046d, product_id: 0x0825, .. }
        ));
    }

    #[test]
    fn location_id_uses_iokit_layout() {
        assert_eq!(location_id(1, &[]), Some(0x0100_0000));
        assert_eq!(location_id(0x14, &[1, 2]), Some(0x1412_0000));
        assert_eq!(location_id(2, &[1, 2, 3, 4, 5, 6]), Some(0x0212_3456));
        assert_eq!(location_id(2, &[15]), Some(0x02f0_0000));
    }

    #[test]
    fn unrepresentable_port_chain_has_no_location() {
        assert_eq!(location_id(1, &[16]), None);
        assert_eq!(location_id(1, &[17]), None);
        assert_eq!(location_id(1, &[2, 200]), None);
        assert_eq!(location_id(2, &[1, 2, 3, 4, 5, 6, 7]), None);
    }

    #[test]
    fn distinct_port_chains_get_distinct_locations() {
        let chains: &[&[u8]] = &[&[1], &[2], &[1, 1], &[1, 2], &[2, 1], &[15, 15]];
        let mut ids: Vec<u32> = chains.iter().filter_map(|c| location_id(1, c)).collect();
        assert_eq!(ids.len(), chains.len());
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), chains.len());
    }

    #[test]
    fn location_id_is_never_wildcard_on_a_real_bus() {
        for bus in 1..=u8::MAX {
            assert_ne!(location_id(bus, &[0]), Some(ANY_LOCATION));
            assert_ne!(location_id(bus, &[]), Some(ANY_LOCATION));
        }
    }

    #[test]
    fn identity_display() {
        assert_eq!(DeviceIdentity::new(0x1234, 0x5678, 0).to_string(), "1234:5678 @ any");
        assert_eq!(DeviceIdentity::new(0x1234, 0x5678, 0x10).to_string(), "1234:5678 @ 0x00000010");
    }
}
