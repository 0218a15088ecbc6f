use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::canvas::PixelBuffer;

/// What happens to a frame's area before the next frame is drawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Disposal {
    /// Unspecified; treated like `DoNotDispose`.
    #[default]
    None,
    DoNotDispose,
    RestoreBackground,
    RestorePrevious,
}

impl Disposal {
    pub fn label(self) -> &'static str {
        match self {
            Disposal::None => "none",
            Disposal::DoNotDispose => "keep",
            Disposal::RestoreBackground => "background",
            Disposal::RestorePrevious => "previous",
        }
    }
}

impl fmt::Display for Disposal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Rectangle in canvas pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: u32, y: u32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Right and bottom edges, saturating.
    pub fn extent(&self) -> (u32, u32) {
        (
            self.x.saturating_add(self.width),
            self.y.saturating_add(self.height),
        )
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{} {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// One frame as the bitstream decoder hands it over, before compositing.
#[derive(Debug, Clone)]
pub struct RawFrame {
    pub block: PixelBuffer,
    pub left: u32,
    pub top: u32,
    pub delay_ms: u32,
    pub disposal: Disposal,
}

impl RawFrame {
    pub fn placement(&self) -> Rect {
        Rect::new(self.left, self.top, self.block.width, self.block.height)
    }
}

/// A displayable frame: the decoded block plus the reconstructed canvas at this index.
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    pub delay_ms: u32,
    pub disposal: Disposal,
    pub placement: Rect,
    /// Decoded block, never modified after decode.
    pub raw: Arc<PixelBuffer>,
    /// Full canvas snapshot at this frame.
    pub composed: Arc<PixelBuffer>,
}

impl Frame {
    /// A self-contained full-canvas image, for sources that need no compositing.
    pub fn from_image(index: usize, image: PixelBuffer, delay_ms: u32) -> Self {
        let placement = Rect::new(0, 0, image.width, image.height);
        let image = Arc::new(image);
        Self {
            index,
            delay_ms,
            disposal: Disposal::None,
            placement,
            raw: Arc::clone(&image),
            composed: image,
        }
    }

    pub fn width(&self) -> u32 {
        self.composed.width
    }

    pub fn height(&self) -> u32 {
        self.composed.height
    }

    pub fn info(&self, num_frames: Option<usize>) -> FrameInfo {
        FrameInfo {
            index: self.index,
            num_frames,
            delay_ms: self.delay_ms,
            disposal: self.disposal,
            placement: self.placement,
        }
    }
}

/// Lightweight description of a presented frame, passed to callbacks and events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameInfo {
    pub index: usize,
    /// `None` while the frame count is still unknown.
    pub num_frames: Option<usize>,
    pub delay_ms: u32,
    pub disposal: Disposal,
    pub placement: Rect,
}

impl fmt::Display for FrameInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.num_frames {
            Some(n) => write!(f, "#{}/{}", self.index, n)?,
            None => write!(f, "#{}/?", self.index)?,
        }
        write!(
            f,
            " delay {}ms, dispose {}, at {}",
            self.delay_ms, self.disposal, self.placement
        )
    }
}

/// Playback direction for the sequencer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayDirection {
    #[default]
    Forward,
    Backward,
}

impl PlayDirection {
    pub fn reversed(self) -> Self {
        match self {
            PlayDirection::Forward => PlayDirection::Backward,
            PlayDirection::Backward => PlayDirection::Forward,
        }
    }
}
