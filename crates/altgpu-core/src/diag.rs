//! Process-wide diagnostic logging switch.
//!
//! A single atomic flag, set from the host's `altgpu.debug` option,
//! gates verbose per-operation logging. Records go through the `log`
//! facade under the `altgpu` target; the library never installs a
//! logger itself. The output path is serialized by a mutex because the
//! flag may be toggled from a different thread than the access calls.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::options::{flag_from_option, OptionSource, DEBUG_OPTION};

/// Log target used for every diagnostic record.
pub const LOG_TARGET: &str = "altgpu";

static DEBUG_ENABLED: AtomicBool = AtomicBool::new(false);
static OUTPUT_GUARD: Mutex<()> = Mutex::new(());

/// Whether verbose operation logging is currently enabled.
pub fn debug_enabled() -> bool {
    DEBUG_ENABLED.load(Ordering::Relaxed)
}

/// Enable or disable verbose operation logging.
pub fn set_debug_enabled(enabled: bool) {
    DEBUG_ENABLED.store(enabled, Ordering::Relaxed);
}

/// Re-read [`DEBUG_OPTION`] from `source` and apply it.
///
/// Returns the resulting flag. A missing or non-logical option
/// disables logging.
pub fn refresh_debug_option(source: &dyn OptionSource) -> bool {
    let enabled = flag_from_option(source.get_option(DEBUG_OPTION).as_ref());
    set_debug_enabled(enabled);
    enabled
}

/// Emit one diagnostic record if logging is enabled.
///
/// Prefer the [`debug_trace!`](crate::debug_trace) macro, which skips
/// formatting entirely while the flag is off.
pub fn emit(args: fmt::Arguments<'_>) {
    if !debug_enabled() {
        return;
    }
    let _guard = OUTPUT_GUARD.lock().unwrap_or_else(PoisonError::into_inner);
    log::debug!(target: LOG_TARGET, "{args}");
}

/// Log a formatted diagnostic line when the debug flag is set.
#[macro_export]
macro_rules! debug_trace {
    ($($arg:tt)*) => {
        if $crate::diag::debug_enabled() {
            $crate::diag::emit(format_args!($($arg)*));
        }
    };
}
