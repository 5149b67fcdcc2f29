//! # Interrupt Listener
//!
//! `SIGINT` requests a snapshot instead of stopping the bridge. The handler
//! runs on its own thread with a single-threaded tokio runtime and does
//! nothing but flip the trigger; the control loop does the actual work.

use std::io;
use std::thread::JoinHandle;

use tokio::signal::unix::{signal, SignalKind};

use crate::snapshot::SnapshotTrigger;

/// Thread name of the listener.
pub const THREAD_NAME: &str = "tactile-interrupt";

/// Starts listening for `SIGINT`; every delivery requests a snapshot.
///
/// The handler is installed before this returns, so an interrupt that
/// arrives afterwards is never lost to the default (terminating) action.
pub fn spawn_interrupt_listener(trigger: SnapshotTrigger) -> io::Result<JoinHandle<()>> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;

    let mut interrupts = {
        let _context = runtime.enter();
        signal(SignalKind::interrupt())?
    };

    std::thread::Builder::new()
        .name(THREAD_NAME.into())
        .spawn(move || {
            runtime.block_on(async move {
                while interrupts.recv().await.is_some() {
                    tracing::info!("interrupt received; snapshot requested");
                    trigger.request();
                }
            });
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_interrupt_requests_snapshot() {
        let trigger = SnapshotTrigger::new();
        let _listener = spawn_interrupt_listener(trigger.clone()).unwrap();

        // SAFETY: raising a signal we have a handler for
        #[allow(unsafe_code)]
        let rc = unsafe { libc::raise(libc::SIGINT) };
        assert_eq!(rc, 0);

        let deadline = Instant::now() + Duration::from_secs(5);
        while !trigger.is_requested() {
            assert!(Instant::now() < deadline, "interrupt never reached the trigger");
            std::thread::sleep(Duration::from_millis(5));
        }
        assert!(trigger.take());
    }
}
