//! Logging setup and structured debug metrics for the conversion pipeline.
//!
//! The library itself only talks to the `log` facade. A host binary that wants to
//! see what the converter is doing calls [`enable_verbose_logging`] once; after that
//! every `log::info!` from collection assembly and export, plus the `log_metric!`
//! lines in debug builds, reach stderr or the given file.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Once;

use log::LevelFilter;

use crate::error::Result;

static INIT_LOGGER: Once = Once::new();

/// Logs a structured key-value metric line, only in debug builds.
///
/// # Example
/// ```
/// use downhole_core::log_metric;
/// let rows = 7;
/// log_metric!("event"="table_saved", "table"="path", "rows"=&rows);
/// ```
#[macro_export]
macro_rules! log_metric {
    ($($key:literal = $value:expr),+ $(,)?) => {
        #[cfg(debug_assertions)]
        {
            let mut parts = Vec::new();
            $(
                parts.push(format!("\"{}\": \"{}\"", $key, $value));
            )+
            log::debug!("DOWNHOLE_METRIC: {{ {} }}", parts.join(", "));
        }
    };
}

/// Installs an `env_logger` at `Info` level with a `[LEVEL] message` format.
///
/// Output goes to stderr, or is appended to `log_file` when one is given. Only the
/// first call has any effect; later calls return `Ok(())` without touching the file.
pub fn enable_verbose_logging(log_file: Option<&Path>) -> Result<()> {
    if INIT_LOGGER.is_completed() {
        return Ok(());
    }
    let file: Option<File> = match log_file {
        Some(path) => Some(OpenOptions::new().append(true).create(true).open(path)?),
        None => None,
    };

    INIT_LOGGER.call_once(move || {
        let mut builder = env_logger::Builder::new();

        builder.is_test(false);
        builder.filter_level(LevelFilter::Info);

        builder.format(|buf, record| {
            use std::io::Write;
            writeln!(buf, "[{}] {}", record.level(), record.args())?;
            buf.flush()?;
            Ok(())
        });

        if let Some(file) = file {
            builder.target(env_logger::Target::Pipe(Box::new(file)));
        }

        // Another logger may already be installed by the host.
        let _ = builder.try_init();
    });
    Ok(())
}
