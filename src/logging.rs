use std::io::Write;

use env_logger::WriteStyle;
use log::LevelFilter;

/// Installs the crate's `env_logger` formatter.
///
/// Safe to call more than once; later calls return the `SetLoggerError`
/// from the already installed logger.
pub fn try_init() -> Result<(), log::SetLoggerError> {
    env_logger::builder()
        .format(|buf, record| writeln!(buf, "[BALL2D | {}] {}", record.level(), record.args()))
        .write_style(WriteStyle::Always)
        .filter(None, LevelFilter::Info)
        .parse_default_env()
        .try_init()
}

/// Installs the formatter at `Debug` level for test binaries.
pub fn init_for_tests() {
    let _ = env_logger::builder()
        .format(|buf, record| writeln!(buf, "[BALL2D | {}] {}", record.level(), record.args()))
        .filter(None, LevelFilter::Debug)
        .is_test(true)
        .try_init();
}
