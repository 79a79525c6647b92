//! Stepwise teaching simulations built on [`microsim_linalg`].
//!
//! Every simulation is a plain state struct driven through the [`Sim`](sim::Sim) trait: input
//! arrives as events, time arrives through [`Sim::tick`](sim::Sim::tick), and everything shown to
//! the user is recomputed from the current state by getters. Nothing here draws or blocks; the
//! host calls `tick` once per frame and renders whatever the getters report.
//!
//! # Timing
//!
//! Auto-advancing simulations compare [`Instant`](std::time::Instant)s passed in by the caller
//! instead of reading the clock themselves, so tests can drive them with synthetic time.
//!
//! # Logging
//!
//! State transitions are logged through the [`log`] facade. Use [`init_logger!`] in binaries to
//! get output on *stderr*.

pub mod config;
pub mod sim;
pub mod stepper;

pub use config::{ConfigError, Tolerances};
pub use sim::{Sim, SimError, StepControl};
pub use stepper::{Stepper, StepperOptions, Ticker, WrapPolicy};

pub use microsim_linalg as linalg;

use log::LevelFilter;

/// macro-use only, not part of public API.
#[doc(hidden)]
pub fn init_logger(calling_crate: &'static str) {
    let log_level = if cfg!(debug_assertions) {
        LevelFilter::Trace
    } else {
        LevelFilter::Debug
    };
    env_logger::Builder::new()
        .filter(Some(calling_crate), log_level)
        .filter(Some(env!("CARGO_CRATE_NAME")), log_level)
        .parse_default_env()
        .try_init()
        .ok();
}

/// Initializes logging to *stderr*.
///
/// If `cfg!(debug_assertions)` is enabled, the calling crate and `microsim` will log at *trace*
/// level. Otherwise, they will log at *debug* level. `RUST_LOG` can override both.
///
/// If a global logger is already registered, this macro will do nothing.
#[macro_export]
macro_rules! init_logger {
    () => {
        $crate::init_logger(env!("CARGO_CRATE_NAME"))
    };
}
