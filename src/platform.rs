use anyhow::Result;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use std::thread;

#[cfg(unix)]
use signal_hook::{consts::SIGINT, consts::SIGTERM, iterator::Signals};

/// Standard Unix exit codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    SignalInt = 130,  // 128 + SIGINT (2)
    SignalTerm = 143, // 128 + SIGTERM (15)
}

impl ExitCode {
    pub fn exit(self) -> ! {
        process::exit(self as i32)
    }
}

/// Set once a shutdown has been requested
pub static SHOULD_TERMINATE: AtomicBool = AtomicBool::new(false);

/// Control messages from the signal handler to the polling loop
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Ctrl {
    Shutdown,
}

/// Turns SIGINT/SIGTERM into a `Ctrl::Shutdown`. A second signal exits
/// immediately.
pub struct SignalHandler {
    #[cfg(unix)]
    _handle: thread::JoinHandle<()>,
}

impl SignalHandler {
    #[cfg(unix)]
    pub fn new(ctrl_sender: Sender<Ctrl>) -> Result<Self> {
        let mut signals = Signals::new([SIGINT, SIGTERM])?;

        let handle = thread::spawn(move || {
            for sig in signals.forever() {
                let exit_code = match sig {
                    SIGINT => ExitCode::SignalInt,
                    _ => ExitCode::SignalTerm,
                };
                if SHOULD_TERMINATE.swap(true, Ordering::SeqCst) {
                    exit_code.exit();
                }
                log::info!("received signal {}, stopping after the current cycle", sig);
                let _ = ctrl_sender.send(Ctrl::Shutdown);
            }
        });

        Ok(Self { _handle: handle })
    }

    // Without signal-hook's iterator the default Ctrl-C behaviour applies; all
    // progress is already in the checkpoint file.
    #[cfg(not(unix))]
    pub fn new(_ctrl_sender: Sender<Ctrl>) -> Result<Self> {
        Ok(Self {})
    }
}

/// Sleep until the next cycle is due. Returns `false` if a shutdown was
/// requested in the meantime.
pub fn wait_for_next_cycle(ctrl_rx: &Receiver<Ctrl>, interval: Duration) -> bool {
    if SHOULD_TERMINATE.load(Ordering::SeqCst) {
        return false;
    }
    match ctrl_rx.recv_timeout(interval) {
        Ok(Ctrl::Shutdown) => false,
        Err(RecvTimeoutError::Timeout) => true,
        // No signal handler attached; fall back to a plain sleep
        Err(RecvTimeoutError::Disconnected) => {
            thread::sleep(interval);
            !SHOULD_TERMINATE.load(Ordering::SeqCst)
        }
    }
}
