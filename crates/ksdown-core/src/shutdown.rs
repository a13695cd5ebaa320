//! Shutdown flag and the termination controller.
//!
//! The engine, its producers and its workers all hold a clone of one
//! [`ShutdownSignal`]. The [`TerminationController`] traps OS termination
//! signals and trips that flag; workers then stop taking new segments and
//! finish the ones in flight.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared stop flag. Cloning shares the same flag.
#[derive(Debug, Clone, Default)]
pub struct ShutdownSignal {
    flag: Arc<AtomicBool>,
}

impl ShutdownSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests shutdown. Idempotent; returns true only for the first call.
    pub fn trigger(&self) -> bool {
        !self.flag.swap(true, Ordering::SeqCst)
    }

    pub fn is_triggered(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}

/// Termination signals the controller knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TermSignal {
    Terminate,
    Interrupt,
    Hangup,
    Quit,
    /// Cannot be caught on POSIX; always dropped by [`TerminationController::new`].
    Kill,
}

impl TermSignal {
    pub fn is_catchable(self) -> bool {
        !matches!(self, TermSignal::Kill)
    }

    pub fn name(self) -> &'static str {
        match self {
            TermSignal::Terminate => "SIGTERM",
            TermSignal::Interrupt => "SIGINT",
            TermSignal::Hangup => "SIGHUP",
            TermSignal::Quit => "SIGQUIT",
            TermSignal::Kill => "SIGKILL",
        }
    }
}

impl fmt::Display for TermSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Signals trapped by default.
pub const DEFAULT_SIGNALS: [TermSignal; 4] = [
    TermSignal::Terminate,
    TermSignal::Interrupt,
    TermSignal::Hangup,
    TermSignal::Quit,
];

/// Validated set of signals that trip a [`ShutdownSignal`].
#[derive(Debug)]
pub struct TerminationController {
    signals: Vec<TermSignal>,
    shutdown: ShutdownSignal,
}

impl TerminationController {
    /// Builds a controller for `signals`, dropping duplicates and signals that
    /// cannot be caught.
    pub fn new(signals: impl IntoIterator<Item = TermSignal>, shutdown: ShutdownSignal) -> Self {
        let mut kept: Vec<TermSignal> = Vec::new();
        for sig in signals {
            if !sig.is_catchable() {
                tracing::warn!(signal = %sig, "signal cannot be trapped, ignoring");
                continue;
            }
            if !kept.contains(&sig) {
                kept.push(sig);
            }
        }
        Self {
            signals: kept,
            shutdown,
        }
    }

    pub fn signals(&self) -> &[TermSignal] {
        &self.signals
    }

    /// Registers the OS handlers. Must run inside a tokio runtime.
    pub fn arm(self) -> io::Result<ArmedController> {
        let listeners = platform::register(&self.signals)?;
        tracing::debug!(signals = ?self.signals, "termination signals armed");
        Ok(ArmedController {
            listeners,
            shutdown: self.shutdown,
        })
    }
}

/// A controller whose OS handlers are installed.
pub struct ArmedController {
    listeners: platform::Listeners,
    shutdown: ShutdownSignal,
}

impl ArmedController {
    /// Resolves on the first trapped signal after tripping the shutdown flag.
    pub async fn wait(mut self) -> TermSignal {
        let sig = self.listeners.recv().await;
        tracing::info!(signal = %sig, "received termination signal, stopping downloads");
        self.shutdown.trigger();
        sig
    }
}

#[cfg(unix)]
mod platform {
    use super::TermSignal;
    use std::future::poll_fn;
    use std::io;
    use std::task::Poll;
    use tokio::signal::unix::{signal, Signal, SignalKind};

    pub(super) struct Listeners(Vec<(TermSignal, Signal)>);

    fn kind(sig: TermSignal) -> Option<SignalKind> {
        match sig {
            TermSignal::Terminate => Some(SignalKind::terminate()),
            TermSignal::Interrupt => Some(SignalKind::interrupt()),
            TermSignal::Hangup => Some(SignalKind::hangup()),
            TermSignal::Quit => Some(SignalKind::quit()),
            TermSignal::Kill => None,
        }
    }

    pub(super) fn register(signals: &[TermSignal]) -> io::Result<Listeners> {
        let mut out = Vec::with_capacity(signals.len());
        for &sig in signals {
            if let Some(k) = kind(sig) {
                out.push((sig, signal(k)?));
            }
        }
        Ok(Listeners(out))
    }

    impl Listeners {
        pub(super) async fn recv(&mut self) -> TermSignal {
            poll_fn(|cx| {
                for (sig, stream) in self.0.iter_mut() {
                    if let Poll::Ready(Some(())) = stream.poll_recv(cx) {
                        return Poll::Ready(*sig);
                    }
                }
                Poll::Pending
            })
            .await
        }
    }
}

#[cfg(not(unix))]
mod platform {
    use super::TermSignal;
    use std::io;

    /// Only Ctrl-C is observable here; it maps to `Interrupt`.
    pub(super) struct Listeners {
        ctrl_c: bool,
    }

    pub(super) fn register(signals: &[TermSignal]) -> io::Result<Listeners> {
        Ok(Listeners {
            ctrl_c: signals.contains(&TermSignal::Interrupt),
        })
    }

    impl Listeners {
        pub(super) async fn recv(&mut self) -> TermSignal {
            if self.ctrl_c && tokio::signal::ctrl_c().await.is_ok() {
                return TermSignal::Interrupt;
            }
            std::future::pending().await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kill_is_dropped_and_duplicates_removed() {
        let ctl = TerminationController::new(
            [
                TermSignal::Terminate,
                TermSignal::Interrupt,
                TermSignal::Kill,
                TermSignal::Hangup,
                TermSignal::Interrupt,
                TermSignal::Quit,
            ],
            ShutdownSignal::new(),
        );
        assert_eq!(ctl.signals(), &DEFAULT_SIGNALS);
    }

    #[test]
    fn shutdown_trigger_is_shared_and_idempotent() {
        let a = ShutdownSignal::new();
        let b = a.clone();
        assert!(!b.is_triggered());
        assert!(a.trigger());
        assert!(!b.trigger());
        assert!(b.is_triggered());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn hangup_trips_shutdown() {
        let shutdown = ShutdownSignal::new();
        let armed = TerminationController::new([TermSignal::Hangup], shutdown.clone())
            .arm()
            .unwrap();
        unsafe {
            libc::raise(libc::SIGHUP);
        }
        let sig = tokio::time::timeout(std::time::Duration::from_secs(5), armed.wait())
            .await
            .unwrap();
        assert_eq!(sig, TermSignal::Hangup);
        assert!(shutdown.is_triggered());
    }
}
