use std::process::ExitCode;

use uvcctl::{SessionConfig, UsbEnumerator, cli};

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let config = SessionConfig::default().with_log_level(log::max_level());

    let stdout = std::io::stdout();
    let stderr = std::io::stderr();
    let code = cli::run(
        &args,
        &UsbEnumerator::new(),
        config,
        &mut stdout.lock(),
        &mut stderr.lock(),
    );

    ExitCode::from(code)
}
