//! Structured logging for the codec.
//!
//! The library logs through the `tracing` macros: `info!` when a compression or
//! decompression starts and finishes, `debug!` for header fields and coder
//! settings, `trace!` for per-band progress. Nothing is printed until a
//! subscriber is installed, for example with [`init_subscriber`]:
//!
//! ```
//! ccsds123_rs::log::init_subscriber(tracing::Level::DEBUG);
//! ```

pub use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// Installs a global subscriber writing messages up to `max_level` to
/// standard error. Returns false if a global subscriber was already set.
pub fn init_subscriber(max_level: Level) -> bool {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(max_level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber).is_ok()
}
