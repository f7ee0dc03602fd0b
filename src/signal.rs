//! Interrupt bookkeeping for the foreground pipeline.
//!
//! Foreground children share the shell's process group, so the terminal delivers
//! SIGINT to them directly. The shell itself only records that it happened; the
//! engine then stops whatever is still running in the interrupted pipeline.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

#[cfg(unix)]
extern "C" fn record_interrupt(_signal: libc::c_int) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Replaces the default SIGINT action (terminate the shell) with a handler that
/// sets a flag. Children get the default action back on exec.
#[cfg(unix)]
pub fn install_interrupt_handler() -> io::Result<()> {
    let handler = record_interrupt as extern "C" fn(libc::c_int);
    // SAFETY: the handler only stores into an atomic, which is async-signal-safe.
    let previous = unsafe { libc::signal(libc::SIGINT, handler as libc::sighandler_t) };
    if previous == libc::SIG_ERR {
        return Err(io::Error::last_os_error());
    }
    Ok(())
}

#[cfg(not(unix))]
pub fn install_interrupt_handler() -> io::Result<()> {
    Ok(())
}

/// Returns whether an interrupt arrived since the last call, clearing the flag.
pub fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

