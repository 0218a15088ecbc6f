use std::fmt;

use super::types::Rect;
use crate::error::DecodeError;

const BYTES_PER_PIXEL: usize = 4;

/// An owned RGBA8 pixel buffer, row-major, no padding.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            data: vec![0u8; byte_len(width, height)],
        }
    }

    /// Wrap decoded RGBA bytes, rejecting a length that does not match the dimensions.
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Result<Self, DecodeError> {
        let expected = byte_len(width, height);
        if data.len() != expected {
            return Err(DecodeError::BlockSize {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Buffer filled with one color.
    pub fn filled(width: u32, height: u32, rgba: [u8; 4]) -> Self {
        let mut data = Vec::with_capacity(byte_len(width, height));
        for _ in 0..(width as usize * height as usize) {
            data.extend_from_slice(&rgba);
        }
        Self {
            width,
            height,
            data,
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y as usize * self.width as usize + x as usize) * BYTES_PER_PIXEL;
        let p = &self.data[i..i + BYTES_PER_PIXEL];
        Some([p[0], p[1], p[2], p[3]])
    }

    /// True when no pixel is fully transparent, i.e. compositing this block
    /// replaces everything underneath it.
    pub fn is_opaque(&self) -> bool {
        self.data.chunks_exact(BYTES_PER_PIXEL).all(|p| p[3] != 0)
    }

    /// Overwrite with `other`, reusing the allocation when the sizes match.
    pub fn copy_from(&mut self, other: &PixelBuffer) {
        self.width = other.width;
        self.height = other.height;
        self.data.clear();
        self.data.extend_from_slice(&other.data);
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

fn byte_len(width: u32, height: u32) -> usize {
    width as usize * height as usize * BYTES_PER_PIXEL
}

/// Accumulation surface for reconstructed frames. Single writer.
#[derive(Debug, Clone)]
pub struct Canvas {
    pixels: PixelBuffer,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            pixels: PixelBuffer::new(width, height),
        }
    }

    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }

    pub fn pixels(&self) -> &PixelBuffer {
        &self.pixels
    }

    /// Reallocate to new dimensions. Contents are cleared.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.pixels = PixelBuffer::new(width, height);
    }

    /// Draw `block` over the canvas with its top-left corner at (x, y).
    ///
    /// Parts falling outside the canvas are clipped. Source pixels with zero
    /// alpha leave the destination untouched; every other pixel replaces it,
    /// which is how GIF transparency composes.
    pub fn composite_at(&mut self, block: &PixelBuffer, x: u32, y: u32) {
        let (cw, ch) = (self.pixels.width as usize, self.pixels.height as usize);
        let (x, y) = (x as usize, y as usize);
        if x >= cw || y >= ch || block.is_empty() {
            return;
        }
        let bw = block.width as usize;
        let visible_w = bw.min(cw - x);
        let visible_h = (block.height as usize).min(ch - y);

        for row in 0..visible_h {
            let src_start = row * bw * BYTES_PER_PIXEL;
            let dst_start = ((y + row) * cw + x) * BYTES_PER_PIXEL;
            let len = visible_w * BYTES_PER_PIXEL;
            let src = &block.data[src_start..src_start + len];
            let dst = &mut self.pixels.data[dst_start..dst_start + len];
            for (d, s) in dst
                .chunks_exact_mut(BYTES_PER_PIXEL)
                .zip(src.chunks_exact(BYTES_PER_PIXEL))
            {
                if s[3] != 0 {
                    d.copy_from_slice(s);
                }
            }
        }
    }

    /// Set a rectangle (clipped to the canvas) to transparent.
    pub fn clear_rect(&mut self, rect: Rect) {
        let (cw, ch) = (self.pixels.width as usize, self.pixels.height as usize);
        let (x, y) = (rect.x as usize, rect.y as usize);
        if x >= cw || y >= ch {
            return;
        }
        let w = (rect.width as usize).min(cw - x);
        let h = (rect.height as usize).min(ch - y);
        for row in y..y + h {
            let start = (row * cw + x) * BYTES_PER_PIXEL;
            self.pixels.data[start..start + w * BYTES_PER_PIXEL].fill(0);
        }
    }

    pub fn clear(&mut self) {
        self.pixels.data.fill(0);
    }

    /// Owned copy of the current pixels.
    pub fn snapshot(&self) -> PixelBuffer {
        self.pixels.clone()
    }

    /// Replace the whole canvas with a previously captured state of the same size.
    pub fn restore_from(&mut self, saved: &PixelBuffer) {
        if saved.width == self.pixels.width && saved.height == self.pixels.height {
            self.pixels.data.copy_from_slice(&saved.data);
        } else {
            log::warn!(
                "Ignoring canvas restore: saved state is {}x{}, canvas is {}x{}",
                saved.width,
                saved.height,
                self.pixels.width,
                self.pixels.height
            );
        }
    }
}
