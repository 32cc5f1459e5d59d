//! Signal handling for the interactive shell (SPEC_FULL.md §5): handlers
//! only set atomic flags, the main thread is solely responsible for acting
//! on them between statements/reads. Grounded on `johnhenry-bash-backwards`'s
//! `signal-hook`/`nix` based flag registration for job control signals.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGCHLD, SIGINT, SIGWINCH};
use signal_hook::flag;

/// Atomic flags the main loop polls between statements. Each one is
/// `true` exactly once per delivered signal until the main loop consumes
/// it (via the `take_*` methods), matching the "signal handlers only set
/// atomic flags" policy — no shell state is touched from signal context.
pub struct SignalFlags {
    pub sigint: Arc<AtomicBool>,
    pub sigchld: Arc<AtomicBool>,
    pub sigwinch: Arc<AtomicBool>,
}

impl SignalFlags {
    /// Register handlers for `SIGINT` (foreground job / line cancellation),
    /// `SIGCHLD` (job-table reaping becomes due), and `SIGWINCH` (terminal
    /// resize, re-query dimensions). Returns an error only if the OS
    /// refuses to install a handler (e.g. already at the signal-hook
    /// registration limit).
    pub fn install() -> Result<Self, std::io::Error> {
        let sigint = Arc::new(AtomicBool::new(false));
        let sigchld = Arc::new(AtomicBool::new(false));
        let sigwinch = Arc::new(AtomicBool::new(false));

        flag::register(SIGINT, Arc::clone(&sigint))?;
        flag::register(SIGCHLD, Arc::clone(&sigchld))?;
        flag::register(SIGWINCH, Arc::clone(&sigwinch))?;

        Ok(Self { sigint, sigchld, sigwinch })
    }

    /// Consume a pending `SIGINT`, if any.
    pub fn take_sigint(&self) -> bool {
        self.sigint.swap(false, Ordering::SeqCst)
    }

    /// Consume a pending `SIGCHLD`, if any — the main loop should do a
    /// non-blocking `waitpid` reap pass when this returns true.
    pub fn take_sigchld(&self) -> bool {
        self.sigchld.swap(false, Ordering::SeqCst)
    }

    /// Consume a pending `SIGWINCH`, if any — the line editor should
    /// re-query terminal dimensions and redraw.
    pub fn take_sigwinch(&self) -> bool {
        self.sigwinch.swap(false, Ordering::SeqCst)
    }
}

/// Send `SIGHUP` then, after `grace` elapses without the process exiting,
/// `SIGKILL`, to every still-running job's process group (shell-exit
/// cleanup per SPEC_FULL.md §5).
pub fn hangup_then_kill(pgids: &[i32], grace: std::time::Duration) {
    use nix::sys::signal::{killpg, Signal};
    use nix::unistd::Pid;

    for &pgid in pgids {
        let _ = killpg(Pid::from_raw(pgid), Signal::SIGHUP);
    }
    if pgids.is_empty() {
        return;
    }
    std::thread::sleep(grace);
    for &pgid in pgids {
        let _ = killpg(Pid::from_raw(pgid), Signal::SIGKILL);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_start_clear_and_take_resets() {
        let flags = SignalFlags {
            sigint: Arc::new(AtomicBool::new(true)),
            sigchld: Arc::new(AtomicBool::new(false)),
            sigwinch: Arc::new(AtomicBool::new(false)),
        };
        assert!(flags.take_sigint());
        assert!(!flags.take_sigint());
    }
}
