//! UVC camera exposure and gain control library.
//!
//! Locates a camera by vendor ID, product ID and location, opens a control
//! channel to its VideoControl interface, and reads or writes exposure and
//! gain through a [`ControlSession`].
//!
//! # Quick Start
//!
//! ```no_run
//! use uvcctl::{ControlSession, DeviceIdentity, PropertyId, SessionConfig, UsbEnumerator};
//!
//! let enumerator = UsbEnumerator::new();
//! let identity = DeviceIdentity::new(0x046d, 0x0825, 0);
//! let mut session = ControlSession::connect(&enumerator, &identity, SessionConfig::default())?;
//!
//! println!("Exposure: {}", session.get_property(PropertyId::Exposure)?);
//! session.set_exposure(false, 150)?;
//! session.set_property(PropertyId::Gain, 30)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod cli;

mod channel;
mod descriptor;
mod device;
mod error;
mod property;
mod protocol;
mod session;
mod usb;

pub use channel::ControlChannel;
pub use descriptor::{ControlUnit, VideoControlTopology};
pub use device::{ANY_LOCATION, DeviceCandidate, DeviceEnumerator, DeviceIdentity, location_id, resolve};
pub use error::ControlError;
pub use property::{PropertyId, PropertyRange};
pub use session::{ControlSession, SessionConfig, SessionState};
pub use usb::{UsbChannel, UsbEnumerator};
