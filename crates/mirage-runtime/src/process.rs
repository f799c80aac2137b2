//! Simulated process lifecycle.
//!
//! A process never executes anything. Its spec states how long it "runs"
//! and what it exits with, and a background task replays that on a timer
//! while listening for signals. Whichever of the two fires first publishes
//! the exit code; every waiter, early or late, observes that same value.

use std::time::Duration;

use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::Instrument;

use mirage_common::constants::SIGNALED_EXIT_CODE;
use mirage_common::error::{MirageError, Result};
use mirage_common::types::{ProcessId, ProcessSpec, RunSpec, Signal, TtySpec};

/// Deadline used when the declared duration does not fit the clock.
const FAR_FUTURE: Duration = Duration::from_secs(86400 * 365 * 30);

/// A simulated process owned by a container.
///
/// The exit status lives in a `watch` channel holding `None` until the
/// lifecycle task settles it to `Some(code)` exactly once.
#[derive(Debug)]
pub struct Process {
    id: ProcessId,
    run_spec: RunSpec,
    signals: mpsc::Sender<Signal>,
    exit_status: watch::Receiver<Option<i64>>,
    lifecycle: JoinHandle<()>,
}

impl Process {
    /// Starts a simulated process described by `spec`.
    ///
    /// The run-spec payload is read from `spec.path`. A payload that does not
    /// decode is logged and replaced by [`RunSpec::default`], so the process
    /// exits immediately with code 0.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::Runtime`] when called outside a Tokio runtime.
    pub fn spawn(spec: &ProcessSpec) -> Result<Self> {
        let runtime =
            tokio::runtime::Handle::try_current().map_err(|e| MirageError::Runtime {
                message: e.to_string(),
            })?;

        let id = ProcessId::generate();
        tracing::debug!(id = %id, path = %spec.path, "process spec received");
        let run_spec = decode_run_spec(&spec.path);
        let deadline = deadline_after(run_spec.duration());

        let (signal_tx, signal_rx) = mpsc::channel(1);
        let (status_tx, status_rx) = watch::channel(None);
        let span = tracing::info_span!(
            "process",
            id = %id,
            duration_in_seconds = run_spec.duration_in_seconds,
            exit_code = run_spec.exit_code,
        );
        let lifecycle =
            runtime.spawn(race(deadline, run_spec, signal_rx, status_tx).instrument(span));
        tracing::info!(id = %id, "process started");

        Ok(Self {
            id,
            run_spec,
            signals: signal_tx,
            exit_status: status_rx,
            lifecycle,
        })
    }

    /// Returns the process identifier.
    #[must_use]
    pub const fn id(&self) -> &ProcessId {
        &self.id
    }

    /// Returns the decoded run spec.
    #[must_use]
    pub const fn run_spec(&self) -> RunSpec {
        self.run_spec
    }

    /// Returns the exit code if the process has already exited.
    #[must_use]
    pub fn exit_status(&self) -> Option<i64> {
        *self.exit_status.borrow()
    }

    /// Waits for the process to exit and returns its exit code.
    ///
    /// Safe to call from any number of tasks at once; all of them see the
    /// same code.
    ///
    /// # Errors
    ///
    /// Returns [`MirageError::ProcessLost`] if the lifecycle task was torn
    /// down (runtime shutdown) before the process exited.
    pub async fn wait(&self) -> Result<i64> {
        tracing::debug!(id = %self.id, "waiting for exit");
        let mut exit_status = self.exit_status.clone();
        let published = exit_status
            .wait_for(Option::is_some)
            .await
            .map_err(|_| self.lost())?;
        let exit_code = *published;
        exit_code.ok_or_else(|| self.lost())
    }

    /// Asks the process to terminate.
    ///
    /// Every signal kind has the same effect: a running process exits with
    /// [`SIGNALED_EXIT_CODE`]. Signalling an exited process is a no-op and
    /// never blocks.
    pub fn signal(&self, signal: Signal) {
        match self.signals.try_send(signal) {
            Ok(()) => tracing::info!(id = %self.id, %signal, "signal delivered"),
            Err(TrySendError::Full(_)) => {
                tracing::debug!(id = %self.id, %signal, "signal already pending");
            }
            Err(TrySendError::Closed(_)) => {
                tracing::debug!(id = %self.id, %signal, "process already exited, signal ignored");
            }
        }
    }

    /// Accepts TTY settings. Simulated processes have no terminal.
    pub fn set_tty(&self, spec: TtySpec) {
        tracing::debug!(id = %self.id, ?spec, "ignoring tty settings");
    }

    fn lost(&self) -> MirageError {
        MirageError::ProcessLost {
            id: self.id.to_string(),
        }
    }
}

impl Drop for Process {
    fn drop(&mut self) {
        self.lifecycle.abort();
    }
}

/// Returns the instant `duration` from now, clamped to [`FAR_FUTURE`]
/// when the addition would overflow.
fn deadline_after(duration: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(duration).unwrap_or(now + FAR_FUTURE)
}

/// Decodes a run-spec payload strictly.
///
/// # Errors
///
/// Returns [`MirageError::Decode`] if the payload is not a JSON object of
/// the expected shape.
pub fn parse_run_spec(payload: &str) -> Result<RunSpec> {
    Ok(serde_json::from_str(payload)?)
}

/// Decodes a run-spec payload, falling back to the default spec.
#[must_use]
pub fn decode_run_spec(payload: &str) -> RunSpec {
    parse_run_spec(payload).unwrap_or_else(|e| {
        tracing::error!(error = %e, "failed to decode run spec, using default");
        RunSpec::default()
    })
}

/// Races the run timer against the first incoming signal and publishes
/// the resulting exit code.
async fn race(
    deadline: Instant,
    run_spec: RunSpec,
    mut signals: mpsc::Receiver<Signal>,
    exit_status: watch::Sender<Option<i64>>,
) {
    tracing::info!("starting");

    let exit_code = tokio::select! {
        () = tokio::time::sleep_until(deadline) => run_spec.exit_code,
        Some(signal) = signals.recv() => {
            tracing::info!(%signal, "terminated by signal");
            SIGNALED_EXIT_CODE
        }
    };

    let _ = exit_status.send_replace(Some(exit_code));
    tracing::info!(exit_code, "completed");
}
