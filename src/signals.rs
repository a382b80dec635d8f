use std::sync::atomic::{AtomicBool, Ordering};

use nix::sys::signal::{self, SigHandler, Signal};

static INTERRUPTED: AtomicBool = AtomicBool::new(false);

/// Route SIGINT into a flag instead of terminating the process, so a running
/// scan can be cancelled and its partial result printed.
pub fn install_interrupt_handler() -> nix::Result<()> {
    // SAFETY: the handler only stores to an atomic, which is async-signal-safe.
    unsafe {
        signal::signal(Signal::SIGINT, SigHandler::Handler(handle_interrupt))?;
    }
    Ok(())
}

extern "C" fn handle_interrupt(_: i32) {
    INTERRUPTED.store(true, Ordering::SeqCst);
}

/// Check and clear the interrupt flag
pub fn take_interrupt() -> bool {
    INTERRUPTED.swap(false, Ordering::SeqCst)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_interrupt_handler() {
        assert!(install_interrupt_handler().is_ok());
    }

    #[test]
    fn test_take_interrupt_clears_flag() {
        handle_interrupt(2);
        assert!(take_interrupt());
        assert!(!take_interrupt());
    }
}
