//! # Cross-platform interrupt handling.
//!
//! Provides [`ShutdownSignal`], which installs the process signal listeners up
//! front and then completes on the first interrupt.
//!
//! ## Signals
//! **Unix platforms:**
//! - `SIGINT` (Ctrl-C in terminal)
//! - `SIGTERM` (default kill signal, used by systemd/Kubernetes)
//!
//! **Other platforms:**
//! - `Ctrl-C` via [`tokio::signal::ctrl_c`]
//!
//! Tokio never uninstalls a signal handler, so once listened for, these
//! signals stop terminating the process for its whole lifetime.

/// Installed interrupt listeners.
///
/// Listeners are registered by [`listen`](ShutdownSignal::listen), so a signal
/// arriving between `listen` and [`recv`](ShutdownSignal::recv) is not lost.
#[cfg(unix)]
pub(crate) struct ShutdownSignal {
    sigint: tokio::signal::unix::Signal,
    sigterm: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl ShutdownSignal {
    /// Registers the listeners; fails if the OS refuses the registration.
    pub(crate) fn listen() -> std::io::Result<Self> {
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            sigint: signal(SignalKind::interrupt())?,
            sigterm: signal(SignalKind::terminate())?,
        })
    }

    /// Completes when any of the signals is received.
    pub(crate) async fn recv(&mut self) {
        tokio::select! {
            _ = self.sigint.recv()  => {},
            _ = self.sigterm.recv() => {},
        }
    }
}

/// Installed interrupt listeners.
#[cfg(not(unix))]
pub(crate) struct ShutdownSignal;

#[cfg(not(unix))]
impl ShutdownSignal {
    /// Nothing to register up front on this platform.
    pub(crate) fn listen() -> std::io::Result<Self> {
        Ok(Self)
    }

    /// Completes on Ctrl-C; a registration failure never completes.
    pub(crate) async fn recv(&mut self) {
        if tokio::signal::ctrl_c().await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
