pub mod double_buffer;
pub mod driver;
pub mod sequencer;

use crate::media::types::FrameInfo;

/// Lifecycle of a playback session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlaybackState {
    Running = 0,
    Paused = 1,
    Stopped = 2,
    /// The sequencer could not produce another frame.
    Finished = 3,
}

impl PlaybackState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => PlaybackState::Running,
            1 => PlaybackState::Paused,
            3 => PlaybackState::Finished,
            _ => PlaybackState::Stopped,
        }
    }
}

/// Notifications from a running driver.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaybackEvent {
    Started,
    /// A frame was presented to the front buffer.
    Frame(FrameInfo),
    /// The sequence wrapped around or reflected.
    Repeating,
    Paused,
    Stopped,
    Finished,
}
