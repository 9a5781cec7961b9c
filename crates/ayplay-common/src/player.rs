//! Unified chiptune player trait.
//!
//! Both replayer drivers (YM register streams, PT3 tracker modules) present
//! the same object-safe playback surface so that frontends can treat them
//! interchangeably through `Box<dyn ChiptunePlayer>`.

use crate::SongInfo;

/// Playback state for chiptune players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PlaybackState {
    /// Player is stopped (at beginning or end).
    #[default]
    Stopped,
    /// Player is actively playing.
    Playing,
    /// Player is paused (can resume).
    Paused,
}

/// Notification emitted by a player to its observer.
#[derive(Debug, Clone, PartialEq)]
pub enum PlayerEvent {
    /// The playback state changed.
    StateChanged(PlaybackState),
    /// The driver advanced to a new frame.
    FrameChanged {
        /// Current frame index.
        current: u32,
        /// Total frame count (0 if unknown).
        total: u32,
    },
    /// A non-fatal playback error occurred.
    Error(String),
}

/// Observer callback invoked by a player on state and frame changes.
pub type PlayerObserver = Box<dyn FnMut(PlayerEvent) + Send>;

/// Object-safe playback interface shared by all replayer drivers.
///
/// A player owns its PSG chip(s) and driver state. Audio is pulled through
/// [`render`](ChiptunePlayer::render), which advances the driver at the
/// song's frame rate while synthesising samples: register writes issued for
/// frame N are therefore always applied before the first sample of frame N
/// is produced, and in file order within the frame.
pub trait ChiptunePlayer: Send {
    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback, keeping driver state. Issues silencing volume writes
    /// so a stalled audio sink does not hold a sustained tone.
    fn pause(&mut self);

    /// Stop playback and reset driver and chip state to the beginning.
    fn stop(&mut self);

    /// Current playback state.
    fn state(&self) -> PlaybackState;

    /// Check if currently playing.
    fn is_playing(&self) -> bool {
        self.state() == PlaybackState::Playing
    }

    /// Fill the stereo buffers with samples, advancing playback.
    ///
    /// Both slices must have the same length. When stopped or paused the
    /// buffers are filled with silence.
    fn render(&mut self, left: &mut [f32], right: &mut [f32]);

    /// Output sample rate in Hz.
    fn sample_rate(&self) -> u32;

    /// Driver frame rate in Hz (typically 50).
    fn frame_rate(&self) -> u32;

    /// Current driver frame index.
    fn current_frame(&self) -> u32;

    /// Total frame count up to the loop point (0 if unknown).
    fn frame_count(&self) -> u32;

    /// Number of times playback has wrapped to the loop point.
    fn loops_completed(&self) -> u32 {
        0
    }

    /// Seek to an absolute frame index (clamped to the song length).
    fn seek_frame(&mut self, frame: u32);

    /// Seek to a time offset in seconds.
    fn seek_seconds(&mut self, seconds: f32) {
        let frame = (seconds.max(0.0) * self.frame_rate() as f32) as u32;
        self.seek_frame(frame);
    }

    /// Set the master output volume (clamped to `[0, 1]`).
    fn set_master_volume(&mut self, volume: f32);

    /// Set the stereo position of a channel (`-1` = left, `+1` = right).
    fn set_channel_pan(&mut self, channel: usize, pan: f32);

    /// Latest per-channel output magnitudes, for visualisation.
    fn channel_levels(&self) -> [f32; 3];

    /// Install an observer for state/frame-change notifications.
    fn set_observer(&mut self, observer: PlayerObserver);

    /// Song metadata.
    fn info(&self) -> &SongInfo;
}
