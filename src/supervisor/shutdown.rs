//! Termination signal fan-out
//!
//! One listener task turns SIGTERM/SIGINT into a value on a watch channel.
//! Setup steps poll it between statements and during waits; the
//! supervisor awaits it alongside the daemon.

use std::io;
use std::time::{Duration, Instant};

use nix::sys::signal::Signal;
use tokio::signal::unix::{signal, SignalKind};
use tokio::sync::watch;
use tokio::task::JoinHandle;

const POLL_SLICE: Duration = Duration::from_millis(50);

/// Sending half: records the first signal received
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<Option<i32>>,
}

/// Receiving half, cheap to clone
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: watch::Receiver<Option<i32>>,
}

/// Create a connected trigger/signal pair
pub fn shutdown_channel() -> (ShutdownTrigger, ShutdownSignal) {
    let (tx, rx) = watch::channel(None);
    (ShutdownTrigger { tx }, ShutdownSignal { rx })
}

impl ShutdownTrigger {
    /// Record `signal` unless one was already recorded
    pub fn trigger(&self, signal: i32) {
        self.tx.send_if_modified(|current| {
            if current.is_none() {
                *current = Some(signal);
                true
            } else {
                false
            }
        });
    }
}

impl ShutdownSignal {
    /// Signal received so far, if any
    pub fn received(&self) -> Option<i32> {
        *self.rx.borrow()
    }

    /// Wait for a signal. Never resolves if the trigger is gone unfired.
    pub async fn recv(&mut self) -> i32 {
        loop {
            if let Some(signal) = *self.rx.borrow_and_update() {
                return signal;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Blocking sleep that ends early on a signal.
    ///
    /// Returns the signal if one arrived before `duration` elapsed.
    pub fn sleep(&self, duration: Duration) -> Option<i32> {
        let deadline = Instant::now() + duration;
        loop {
            if let Some(signal) = self.received() {
                return Some(signal);
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            std::thread::sleep((deadline - now).min(POLL_SLICE));
        }
    }
}

/// Route SIGTERM and SIGINT to `trigger`. Must run inside a tokio runtime.
pub fn spawn_signal_listener(trigger: ShutdownTrigger) -> io::Result<JoinHandle<()>> {
    let mut terminate = signal(SignalKind::terminate())?;
    let mut interrupt = signal(SignalKind::interrupt())?;

    Ok(tokio::spawn(async move {
        loop {
            let received = tokio::select! {
                Some(()) = terminate.recv() => Signal::SIGTERM,
                Some(()) = interrupt.recv() => Signal::SIGINT,
                else => break,
            };
            trigger.trigger(received as i32);
        }
    }))
}
