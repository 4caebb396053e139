//! Lifecycle of a playing stream.
//!
//! An [`AudioStream`] owns the device handle and the [`StreamStatus`] it
//! reports to. Releasing it, either explicitly or by dropping it, waits for
//! the status to stop being live and then stops and closes the device.
//! Release after a failure (an error returned from [`AudioStream::run`], or
//! a panic unwinding through the drop) skips the wait.

use std::sync::Arc;
use std::time::Duration;

use super::status::{StreamState, StreamStatus};
use super::traits::PlaybackHandle;
use crate::error::{RemoteAudioError, RemoteAudioResult};

/// How often a draining stream re-checks its status.
pub const POLL_INTERVAL: Duration = Duration::from_millis(100);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Created,
    Started,
    Released,
}

/// A device stream bound to the status that decides when it is done.
///
/// The stream is started at most once. [`stop`](Self::stop) is idempotent and
/// never fails: errors from a device that is already gone are logged and
/// dropped.
pub struct AudioStream<H: PlaybackHandle> {
    handle: H,
    status: Arc<StreamStatus>,
    exit_interrupt: bool,
    poll_interval: Duration,
    phase: Phase,
}

impl<H: PlaybackHandle> AudioStream<H> {
    /// Wrap an opened, not yet started, device handle.
    pub fn new(handle: H, status: Arc<StreamStatus>) -> Self {
        Self {
            handle,
            status,
            exit_interrupt: false,
            poll_interval: POLL_INTERVAL,
            phase: Phase::Created,
        }
    }

    /// When set, releasing the stream stops it immediately instead of
    /// waiting for playback to drain.
    pub fn with_exit_interrupt(mut self, exit_interrupt: bool) -> Self {
        self.exit_interrupt = exit_interrupt;
        self
    }

    /// Change how often [`wait`](Self::wait) polls the status.
    pub fn with_poll_interval(mut self, poll_interval: Duration) -> Self {
        self.poll_interval = poll_interval;
        self
    }

    /// See [`with_exit_interrupt`](Self::with_exit_interrupt).
    pub fn set_exit_interrupt(&mut self, exit_interrupt: bool) {
        self.exit_interrupt = exit_interrupt;
    }

    /// Whether release skips the drain wait.
    pub fn exit_interrupt(&self) -> bool {
        self.exit_interrupt
    }

    /// Start the device. A second call is a no-op.
    ///
    /// Fails if the stream has already been stopped.
    pub fn start(&mut self) -> RemoteAudioResult<()> {
        match self.phase {
            Phase::Created => {
                self.handle.start()?;
                self.phase = Phase::Started;
                tracing::debug!("Audio stream started");
                Ok(())
            }
            Phase::Started => Ok(()),
            Phase::Released => Err(RemoteAudioError::invalid_input(
                "cannot restart a stream that has been stopped",
            )),
        }
    }

    /// Deactivate the status, stop the device and close it.
    pub fn stop(&mut self) {
        if self.phase == Phase::Released {
            return;
        }
        self.status.stop();

        if self.phase == Phase::Started {
            if let Err(err) = self.handle.stop() {
                tracing::warn!(error = %err, "Ignoring error while stopping stream");
            }
        }
        if let Err(err) = self.handle.close() {
            tracing::warn!(error = %err, "Ignoring error while closing stream");
        }

        self.phase = Phase::Released;
        tracing::debug!(
            bytes_played = self.status.bytes_played(),
            "Audio stream stopped"
        );
    }

    /// Whether the device has been started.
    pub fn is_started(&self) -> bool {
        self.phase == Phase::Started
    }

    /// Whether the stream is still expecting to play data.
    pub fn is_live(&self) -> bool {
        self.phase != Phase::Released && self.status.is_live()
    }

    /// The shared status.
    pub fn status(&self) -> &Arc<StreamStatus> {
        &self.status
    }

    /// The device handle.
    pub fn handle(&self) -> &H {
        &self.handle
    }

    /// Mutable access to the device handle.
    pub fn handle_mut(&mut self) -> &mut H {
        &mut self.handle
    }

    /// Block until the stream is no longer live, returning the state it
    /// ended in. Returns immediately if the stream was never started.
    pub fn wait(&self) -> StreamState {
        while self.phase == Phase::Started && self.status.is_live() {
            std::thread::sleep(self.poll_interval);
        }
        self.status.state()
    }

    /// Wait for playback to drain (unless `exit_interrupt` is set), then
    /// stop. Returns the state observed before stopping.
    pub fn finish(mut self) -> StreamState {
        self.release(true)
    }

    /// Stop without waiting.
    pub fn abort(mut self) {
        self.release(false);
    }

    /// Start the stream, run `body`, then release it.
    ///
    /// On success the release waits for playback to drain like
    /// [`finish`](Self::finish). An error from `body` stops the stream at
    /// once and is returned unchanged.
    pub fn run<T, E, F>(mut self, body: F) -> Result<T, E>
    where
        F: FnOnce(&mut Self) -> Result<T, E>,
        E: From<RemoteAudioError>,
    {
        if let Err(err) = self.start() {
            self.release(false);
            return Err(err.into());
        }

        let result = body(&mut self);
        self.release(result.is_ok());
        result
    }

    fn release(&mut self, drain: bool) -> StreamState {
        if self.phase == Phase::Released {
            return self.status.state();
        }
        if drain && !self.exit_interrupt {
            self.wait();
        }
        let state = self.status.state();
        self.stop();
        state
    }
}

impl<H: PlaybackHandle> Drop for AudioStream<H> {
    fn drop(&mut self) {
        self.release(!std::thread::panicking());
    }
}

impl<H: PlaybackHandle> std::fmt::Debug for AudioStream<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AudioStream")
            .field("phase", &self.phase)
            .field("exit_interrupt", &self.exit_interrupt)
            .field("status", &self.status)
            .finish()
    }
}
