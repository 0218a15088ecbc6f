use std::collections::VecDeque;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use super::canvas::PixelBuffer;
use super::types::{Disposal, Frame, RawFrame};
use crate::error::DecodeError;

/// Forward-only source of raw frames.
///
/// Implementations hand out frames in stream order and report `Ok(None)` once
/// the stream is exhausted. The frame store treats an `Err` the same way,
/// so a decoder does not need to recover after failing.
pub trait FrameDecoder: Send {
    /// Logical screen size, when the container declares one up front.
    fn canvas_size(&self) -> Option<(u32, u32)>;

    fn read_next_frame(&mut self) -> Result<Option<RawFrame>, DecodeError>;
}

/// Streaming GIF decoder producing RGBA blocks.
pub struct GifDecoder<R: Read> {
    reader: gif::Decoder<R>,
    width: u32,
    height: u32,
}

impl<R: Read> GifDecoder<R> {
    pub fn new(source: R) -> Result<Self, DecodeError> {
        let mut options = gif::DecodeOptions::new();
        options.set_color_output(gif::ColorOutput::RGBA);
        let reader = options.read_info(source)?;
        let width = u32::from(reader.width());
        let height = u32::from(reader.height());
        Ok(Self {
            reader,
            width,
            height,
        })
    }
}

impl GifDecoder<BufReader<File>> {
    pub fn open(path: &Path) -> Result<Self, DecodeError> {
        let file = File::open(path)?;
        Self::new(BufReader::new(file))
    }
}

impl GifDecoder<Cursor<Vec<u8>>> {
    pub fn from_bytes(bytes: Vec<u8>) -> Result<Self, DecodeError> {
        Self::new(Cursor::new(bytes))
    }
}

impl<R: Read + Send> FrameDecoder for GifDecoder<R> {
    fn canvas_size(&self) -> Option<(u32, u32)> {
        (self.width > 0 && self.height > 0).then_some((self.width, self.height))
    }

    fn read_next_frame(&mut self) -> Result<Option<RawFrame>, DecodeError> {
        let Some(frame) = self.reader.read_next_frame()? else {
            return Ok(None);
        };
        let block = PixelBuffer::from_rgba(
            u32::from(frame.width),
            u32::from(frame.height),
            frame.buffer.to_vec(),
        )?;
        Ok(Some(RawFrame {
            block,
            left: u32::from(frame.left),
            top: u32::from(frame.top),
            delay_ms: u32::from(frame.delay) * 10, // GIF delay is in centiseconds
            disposal: map_disposal(frame.dispose),
        }))
    }
}

fn map_disposal(method: gif::DisposalMethod) -> Disposal {
    match method {
        gif::DisposalMethod::Any => Disposal::None,
        gif::DisposalMethod::Keep => Disposal::DoNotDispose,
        gif::DisposalMethod::Background => Disposal::RestoreBackground,
        gif::DisposalMethod::Previous => Disposal::RestorePrevious,
    }
}

/// Decoder over frames already in memory. Useful for synthesized animations
/// and for driving the store without a real bitstream.
#[derive(Debug, Default)]
pub struct MemoryDecoder {
    canvas: Option<(u32, u32)>,
    frames: VecDeque<Result<RawFrame, DecodeError>>,
}

impl MemoryDecoder {
    pub fn new(canvas: Option<(u32, u32)>) -> Self {
        Self {
            canvas,
            frames: VecDeque::new(),
        }
    }

    #[must_use]
    pub fn with_frame(mut self, frame: RawFrame) -> Self {
        self.frames.push_back(Ok(frame));
        self
    }

    /// Queue a failure; it is returned in place of the next frame.
    #[must_use]
    pub fn with_error(mut self, error: DecodeError) -> Self {
        self.frames.push_back(Err(error));
        self
    }
}

impl FrameDecoder for MemoryDecoder {
    fn canvas_size(&self) -> Option<(u32, u32)> {
        self.canvas
    }

    fn read_next_frame(&mut self) -> Result<Option<RawFrame>, DecodeError> {
        self.frames.pop_front().transpose()
    }
}

/// Load a still image (PNG, JPEG) as a single self-contained frame.
pub fn load_static_image(path: &Path) -> Result<Frame, DecodeError> {
    let img = image::open(path)?;
    let rgba = img.to_rgba8();
    let (w, h) = rgba.dimensions();
    let pixels = PixelBuffer::from_rgba(w, h, rgba.into_raw())?;
    Ok(Frame::from_image(0, pixels, 0))
}
