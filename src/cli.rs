//! Command-line surface: argument parsing and the exposure/gain workflow.
//!
//! The workflow reads the current auto-exposure state, exposure and gain,
//! prints them alongside the requested values, then writes the mode before
//! the exposure value and finally the gain.  Any failure aborts the remaining
//! writes; nothing is rolled back.

use std::io::Write;

use crate::device::{DeviceEnumerator, DeviceIdentity};
use crate::error::ControlError;
use crate::property::PropertyId;
use crate::session::{ControlSession, SessionConfig};

/// Number of positional arguments, excluding the program name.
pub const ARG_COUNT: usize = 6;

/// One parsed invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Invocation {
    pub identity: DeviceIdentity,
    pub disable_auto_exposure: bool,
    pub exposure: i32,
    pub gain: i32,
}

impl Invocation {
    /// Parse `<vid> <pid> <location> <disable-ae> <exposure> <gain>`.
    pub fn parse(args: &[String]) -> Result<Self, ControlError> {
        if args.len() != ARG_COUNT {
            return Err(ControlError::InvalidArguments {
                expected: ARG_COUNT,
                got: args.len(),
            });
        }

        let vendor_id = parse_id(&args[0], "vid")?;
        let product_id = parse_id(&args[1], "pid")?;
        let location_id = parse_hex(&args[2], "location")?;
        let disable_auto_exposure = match parse_dec(&args[3], "disable autoexposure")? {
            0 => false,
            1 => true,
            _ => {
                return Err(invalid(&args[3], "disable autoexposure", "0 or 1"));
            }
        };
        let exposure = parse_dec(&args[4], "exposure")?;
        let gain = parse_dec(&args[5], "gain")?;

        Ok(Self {
            identity: DeviceIdentity::new(vendor_id, product_id, location_id),
            disable_auto_exposure,
            exposure,
            gain,
        })
    }
}

fn invalid(value: &str, arg: &'static str, valid: &'static str) -> ControlError {
    ControlError::InvalidArgument {
        arg,
        value: value.to_string(),
        valid,
    }
}

fn parse_hex(value: &str, arg: &'static str) -> Result<u32, ControlError> {
    let digits = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
        .unwrap_or(value);
    u32::from_str_radix(digits, 16).map_err(|_| invalid(value, arg, "hexadecimal number"))
}

fn parse_id(value: &str, arg: &'static str) -> Result<u16, ControlError> {
    u16::try_from(parse_hex(value, arg)?)
        .map_err(|_| invalid(value, arg, "16-bit hexadecimal number"))
}

fn parse_dec(value: &str, arg: &'static str) -> Result<i32, ControlError> {
    value
        .parse::<i32>()
        .map_err(|_| invalid(value, arg, "decimal integer"))
}

pub fn write_usage(w: &mut impl Write) -> std::io::Result<()> {
    writeln!(w, "Usage: uvcctl <vid> <pid> <location> <disable autoexposure> <exposure> <gain>")?;
    writeln!(w, "\tvid: USB Vendor ID in hex")?;
    writeln!(w, "\tpid: USB Product ID in hex")?;
    writeln!(w, "\tlocation: Location ID in hex, or 0 to select the first found location")?;
    writeln!(w, "\tdisable autoexposure: 1 to disable auto exposure, 0 to enable")?;
    writeln!(w, "\texposure: exposure value, decimal")?;
    writeln!(w, "\tgain: gain value, decimal")?;
    writeln!(w)?;
    writeln!(w, "Set RUST_LOG=debug to trace every control transfer.")
}

/// Read old values, report them, apply the new ones.
pub fn apply<E: DeviceEnumerator>(
    invocation: &Invocation,
    enumerator: &E,
    config: SessionConfig,
    out: &mut impl Write,
) -> Result<(), ControlError> {
    let mut session = ControlSession::connect(enumerator, &invocation.identity, config)?;

    let old_auto = session.get_auto_mode(PropertyId::Exposure)?;
    let old_exposure = session.get_property(PropertyId::Exposure)?;
    let old_gain = session.get_property(PropertyId::Gain)?;

    writeln!(
        out,
        "Disable autoexposure was {}, will set to {}",
        u8::from(!old_auto),
        u8::from(invocation.disable_auto_exposure)
    )?;
    writeln!(out, "Exposure was {}, will set to {}", old_exposure, invocation.exposure)?;
    writeln!(out, "Gain was {}, will set to {}", old_gain, invocation.gain)?;

    session.set_exposure(!invocation.disable_auto_exposure, invocation.exposure)?;
    session.set_property(PropertyId::Gain, invocation.gain)?;
    session.close();

    writeln!(out, "Done")?;
    Ok(())
}

/// Run the tool and return its process exit code.
///
/// Failures go to `err`; argument errors are followed by the usage text.
pub fn run<E: DeviceEnumerator>(
    args: &[String],
    enumerator: &E,
    config: SessionConfig,
    out: &mut impl Write,
    err: &mut impl Write,
) -> u8 {
    let result = Invocation::parse(args)
        .and_then(|invocation| apply(&invocation, enumerator, config, out));

    match result {
        Ok(()) => 0,
        Err(e) => {
            let _ = report_failure(&e, err);
            1
        }
    }
}

fn report_failure(e: &ControlError, err: &mut impl Write) -> std::io::Result<()> {
    writeln!(err, "Error: {}", e)?;
    if e.is_usage_error() {
        write_usage(err)?;
    }
    Ok(())
}
