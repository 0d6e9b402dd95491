//! Control session lifecycle and typed property access.
//!
//! A [`ControlSession`] owns the channel to exactly one camera.  It only
//! exists once a channel has been opened, and it moves to
//! [`SessionState::Closed`] on [`close`](ControlSession::close), on drop, or
//! as soon as the control path fails.  After that every property call returns
//! [`ControlError::InvalidSessionState`].

use std::time::Duration;

use log::{Level, LevelFilter, debug, info, warn};

use crate::channel::ControlChannel;
use crate::device::{DeviceCandidate, DeviceEnumerator, DeviceIdentity, resolve};
use crate::error::ControlError;
use crate::property::{PropertyId, PropertyRange};
use crate::protocol::USB_TIMEOUT;

/// Per-session settings, passed in explicitly rather than read from globals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Upper bound on each blocking control transfer.
    pub transfer_timeout: Duration,
    /// Most verbose level this session will emit through `log`.
    pub log_level: LevelFilter,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            transfer_timeout: USB_TIMEOUT,
            log_level: LevelFilter::Info,
        }
    }
}

impl SessionConfig {
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    pub fn with_log_level(mut self, level: LevelFilter) -> Self {
        self.log_level = level;
        self
    }

    pub(crate) fn logs(&self, level: Level) -> bool {
        level <= self.log_level
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Open,
    Closed,
}

/// An open control channel to one camera.
pub struct ControlSession<C: ControlChannel> {
    channel: Option<C>,
    identity: DeviceIdentity,
    config: SessionConfig,
}

impl<C: ControlChannel> ControlSession<C> {
    /// Open a control channel to a resolved device.
    pub fn open<E>(
        enumerator: &E,
        candidate: DeviceCandidate<E::Handle>,
        config: SessionConfig,
    ) -> Result<Self, ControlError>
    where
        E: DeviceEnumerator<Channel = C>,
    {
        let identity = candidate.identity();
        let channel = enumerator.open_channel(candidate, &config)?;
        if config.logs(Level::Info) {
            info!("Opened control session to {}", identity);
        }
        Ok(Self { channel: Some(channel), identity, config })
    }

    /// Resolve `identity` and open a session to the device it selects.
    pub fn connect<E>(
        enumerator: &E,
        identity: &DeviceIdentity,
        config: SessionConfig,
    ) -> Result<Self, ControlError>
    where
        E: DeviceEnumerator<Channel = C>,
    {
        let candidate = resolve(enumerator, identity, &config)?;
        Self::open(enumerator, candidate, config)
    }

    /// The concrete identity of the device, with its actual location.
    pub fn identity(&self) -> DeviceIdentity {
        self.identity
    }

    pub fn state(&self) -> SessionState {
        if self.channel.is_some() {
            SessionState::Open
        } else {
            SessionState::Closed
        }
    }

    pub fn get_property(&mut self, id: PropertyId) -> Result<i32, ControlError> {
        let value = self.with_channel(|ch| ch.read_value(id))?;
        if self.config.logs(Level::Debug) {
            debug!("{} read {} = {}", self.identity, id, value);
        }
        Ok(value)
    }

    /// Write a value after checking it against the device-reported range.
    ///
    /// Out-of-range values are rejected with
    /// [`ControlError::InvalidPropertyValue`] and nothing is written.
    pub fn set_property(&mut self, id: PropertyId, value: i32) -> Result<(), ControlError> {
        let range = self.property_range(id)?;
        if !range.contains(value) {
            return Err(ControlError::InvalidPropertyValue {
                property: id,
                value,
                min: range.min,
                max: range.max,
            });
        }

        self.with_channel(|ch| ch.write_value(id, value))?;
        if self.config.logs(Level::Debug) {
            debug!("{} wrote {} = {}", self.identity, id, value);
        }
        Ok(())
    }

    pub fn property_range(&mut self, id: PropertyId) -> Result<PropertyRange, ControlError> {
        self.with_channel(|ch| ch.value_range(id))
    }

    pub fn get_auto_mode(&mut self, id: PropertyId) -> Result<bool, ControlError> {
        let auto = self.with_channel(|ch| ch.read_auto_mode(id))?;
        if self.config.logs(Level::Debug) {
            debug!("{} read {} auto = {}", self.identity, id, auto);
        }
        Ok(auto)
    }

    pub fn set_auto_mode(&mut self, id: PropertyId, enabled: bool) -> Result<(), ControlError> {
        self.with_channel(|ch| ch.write_auto_mode(id, enabled))?;
        if self.config.logs(Level::Debug) {
            debug!("{} wrote {} auto = {}", self.identity, id, enabled);
        }
        Ok(())
    }

    /// Set exposure mode and value together.
    ///
    /// The mode is always written first: a camera still in automatic mode
    /// may ignore or override a numeric exposure write.
    pub fn set_exposure(&mut self, auto: bool, value: i32) -> Result<(), ControlError> {
        self.set_auto_mode(PropertyId::Exposure, auto)?;
        self.set_property(PropertyId::Exposure, value)
    }

    /// Release the channel. Calling this again is a no-op.
    pub fn close(&mut self) {
        if let Some(channel) = self.channel.take() {
            drop(channel);
            if self.config.logs(Level::Info) {
                info!("Closed control session to {}", self.identity);
            }
        }
    }

    /// Run one channel operation, closing the session if the control path fails.
    fn with_channel<T>(
        &mut self,
        op: impl FnOnce(&mut C) -> Result<T, ControlError>,
    ) -> Result<T, ControlError> {
        let channel = self
            .channel
            .as_mut()
            .ok_or(ControlError::InvalidSessionState("closed"))?;

        let result = op(channel);
        if let Err(e) = &result {
            if e.is_channel_failure() {
                if self.config.logs(Level::Warn) {
                    warn!("Control path to {} failed, closing session: {}", self.identity, e);
                }
                self.close();
            }
        }
        result
    }
}

impl<C: ControlChannel> Drop for ControlSession<C> {
    fn drop(&mut self) {
        self.close();
    }
}
