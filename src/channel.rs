//! The low-level control transport for one opened device.
//!
//! A [`ControlChannel`] performs single blocking transfers and nothing else:
//! no state tracking, no range checks.  [`ControlSession`](crate::ControlSession)
//! layers those on top.  Dropping a channel releases the underlying device.

use crate::error::ControlError;
use crate::property::{PropertyId, PropertyRange};

pub trait ControlChannel {
    /// Read the current numeric value of a property.
    fn read_value(&mut self, id: PropertyId) -> Result<i32, ControlError>;

    /// Write a numeric value. The caller has already validated the range.
    fn write_value(&mut self, id: PropertyId, value: i32) -> Result<(), ControlError>;

    /// Query the device-reported bounds of a property.
    fn value_range(&mut self, id: PropertyId) -> Result<PropertyRange, ControlError>;

    /// Read the automatic/manual facet. `true` means automatic.
    fn read_auto_mode(&mut self, id: PropertyId) -> Result<bool, ControlError>;

    /// Write the automatic/manual facet.
    fn write_auto_mode(&mut self, id: PropertyId, enabled: bool) -> Result<(), ControlError>;
}
