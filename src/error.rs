//! Error types for uvcctl.
//!
//! Every failure a control session can hit maps onto one variant, so callers
//! can tell a missing device apart from a flaky transfer or a bad value
//! without string matching.

use thiserror::Error;

use crate::property::PropertyId;

/// Top-level error type for all uvcctl operations.
#[derive(Debug, Error)]
pub enum ControlError {
    /// Wrong number of command-line arguments.
    #[error("expected {expected} arguments, got {got}")]
    InvalidArguments { expected: usize, got: usize },

    /// Invalid CLI argument value.
    #[error("Invalid value '{value}' for {arg}.\nValid values: {valid}")]
    InvalidArgument {
        arg: &'static str,
        value: String,
        valid: &'static str,
    },

    /// No enumerated device matched the requested identity.
    #[error("No camera found matching {vendor_id:04x}:{product_id:04x} at location {location}")]
    DeviceNotFound {
        vendor_id: u16,
        product_id: u16,
        location: String,
    },

    /// The backend refused to open a control channel to the resolved device.
    #[error("Failed to open control channel: {0}")]
    ChannelOpenFailed(String),

    /// A control transfer failed on an open channel.
    #[error("Control transfer failed: {0}")]
    ChannelError(String),

    /// A control transfer did not complete within the configured timeout.
    #[error("Control transfer timed out: {0}")]
    ChannelTimeout(String),

    /// The device does not implement the requested property or facet.
    #[error("{property} {facet} is not supported by this device")]
    UnsupportedProperty {
        property: PropertyId,
        facet: &'static str,
    },

    /// A value outside the device-reported range was rejected.
    #[error("Invalid value {value} for {property}: device accepts {min}..={max}")]
    InvalidPropertyValue {
        property: PropertyId,
        value: i32,
        min: i32,
        max: i32,
    },

    /// An operation was attempted on a session that is not open.
    #[error("Session is {0}; no property access is possible")]
    InvalidSessionState(&'static str),

    /// The report could not be written to the console.
    #[error("Failed to write report: {0}")]
    Output(#[from] std::io::Error),
}

impl ControlError {
    /// Whether this error means the control path itself is broken, as
    /// opposed to a rejected request on a healthy channel.
    pub fn is_channel_failure(&self) -> bool {
        matches!(self, Self::ChannelError(_) | Self::ChannelTimeout(_))
    }

    /// Whether the command line itself was wrong.
    pub fn is_usage_error(&self) -> bool {
        matches!(self, Self::InvalidArguments { .. } | Self::InvalidArgument { .. })
    }

    /// Map a libusb transfer error, separating timeouts from other failures.
    pub(crate) fn from_transfer(what: &str, err: rusb::Error) -> Self {
        match err {
            rusb::Error::Timeout => Self::ChannelTimeout(format!("{} timed out", what)),
            other => Self::ChannelError(format!("{} failed: {}", what, other)),
        }
    }
}
