//! Seams between the stream lifecycle and whatever actually produces sound.

use crate::error::RemoteAudioResult;

/// Control surface of an opened output stream.
///
/// [`AudioStream`](super::AudioStream) drives playback through this trait
/// so its lifecycle can be exercised without an audio device.
pub trait PlaybackHandle {
    /// Begin (or resume) pulling data through the device callback.
    fn start(&mut self) -> RemoteAudioResult<()>;

    /// Stop pulling data.
    fn stop(&mut self) -> RemoteAudioResult<()>;

    /// Release the underlying device resources.
    ///
    /// Called once after [`stop`](Self::stop). The default does nothing.
    fn close(&mut self) -> RemoteAudioResult<()> {
        Ok(())
    }
}

impl<H: PlaybackHandle + ?Sized> PlaybackHandle for Box<H> {
    fn start(&mut self) -> RemoteAudioResult<()> {
        (**self).start()
    }

    fn stop(&mut self) -> RemoteAudioResult<()> {
        (**self).stop()
    }

    fn close(&mut self) -> RemoteAudioResult<()> {
        (**self).close()
    }
}
