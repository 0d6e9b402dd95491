//! Log records follow `SessionConfig::log_level`, whatever the global filter.

use std::sync::{Mutex, Once};

use log::{LevelFilter, Log, Metadata, Record};
use uvcctl::{
    ControlChannel, ControlError, ControlSession, DeviceCandidate, DeviceEnumerator,
    DeviceIdentity, PropertyId, PropertyRange, SessionConfig, resolve,
};

/// Global logger that keeps every record, with the global filter wide open.
struct Capture {
    records: Mutex<Vec<String>>,
}

impl Log for Capture {
    fn enabled(&self, _: &Metadata) -> bool {
        true
    }

    fn log(&self, record: &Record) {
        let line = format!("{} {}", record.level(), record.args());
        self.records.lock().unwrap().push(line);
    }

    fn flush(&self) {}
}

static CAPTURE: Capture = Capture { records: Mutex::new(Vec::new()) };
static INSTALL: Once = Once::new();

fn install() {
    INSTALL.call_once(|| {
        log::set_logger(&CAPTURE).unwrap();
        log::set_max_level(LevelFilter::Trace);
    });
}

/// Records that mention `tag`. Tests run in parallel, so each one uses its
/// own vendor ID and only looks at its own records.
fn records_for(tag: &str) -> Vec<String> {
    CAPTURE.records.lock().unwrap().iter().filter(|r| r.contains(tag)).cloned().collect()
}

struct QuietChannel;

impl ControlChannel for QuietChannel {
    fn read_value(&mut self, _: PropertyId) -> Result<i32, ControlError> {
        Ok(0)
    }
    fn write_value(&mut self, _: PropertyId, _: i32) -> Result<(), ControlError> {
        Ok(())
    }
    fn value_range(&mut self, _: PropertyId) -> Result<PropertyRange, ControlError> {
        Ok(PropertyRange { min: 0, max: 10, step: 1 })
    }
    fn read_auto_mode(&mut self, _: PropertyId) -> Result<bool, ControlError> {
        Ok(true)
    }
    fn write_auto_mode(&mut self, _: PropertyId, _: bool) -> Result<(), ControlError> {
        Ok(())
    }
}

/// One camera at location 0x10 for whatever IDs are asked for.
struct OneCamera;

impl DeviceEnumerator for OneCamera {
    type Handle = ();
    type Channel = QuietChannel;

    fn list_matching(
        &self,
        vendor_id: u16,
        product_id: u16,
        _: &SessionConfig,
    ) -> Result<Vec<DeviceCandidate<()>>, ControlError> {
        Ok(vec![DeviceCandidate { vendor_id, product_id, location_id: 0x10, handle: () }])
    }

    fn open_channel(&self, _: DeviceCandidate<()>, _: &SessionConfig) -> Result<QuietChannel, ControlError> {
        Ok(QuietChannel)
    }
}

fn exercise(vendor_id: u16, level: LevelFilter) {
    install();
    let config = SessionConfig::default().with_log_level(level);
    let identity = DeviceIdentity::new(vendor_id, 0x0002, 0);

    let candidate = resolve(&OneCamera, &identity, &config).unwrap();
    assert_eq!(candidate.location_id, 0x10);

    let mut session = ControlSession::connect(&OneCamera, &identity, config).unwrap();
    session.get_property(PropertyId::Gain).unwrap();
    session.set_property(PropertyId::Gain, 5).unwrap();
    session.close();
}

#[test]
fn silent_session_emits_nothing() {
    exercise(0xa001, LevelFilter::Off);
    assert_eq!(records_for("a001:0002"), Vec::<String>::new());
}

#[test]
fn info_session_hides_debug_records() {
    exercise(0xa002, LevelFilter::Info);
    let records = records_for("a002:0002");
    assert!(records.iter().any(|r| r.starts_with("INFO Resolved a002:0002 @ any")));
    assert!(records.iter().all(|r| !r.starts_with("DEBUG")), "{:?}", records);
}

#[test]
fn debug_session_traces_resolution() {
    exercise(0xa003, LevelFilter::Debug);
    let records = records_for("a003:0002");
    assert!(records.iter().any(|r| r == "DEBUG 1 candidate(s) for a003:0002 @ any"));
    assert!(records.iter().any(|r| r.starts_with("DEBUG Considering a003:0002")));
    assert!(records.iter().any(|r| r.starts_with("DEBUG a003:0002 @ 0x00000010 wrote Gain = 5")));
}
