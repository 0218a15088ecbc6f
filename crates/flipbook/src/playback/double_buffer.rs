use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::media::canvas::PixelBuffer;

/// Which of the two images is meant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferSlot {
    First,
    Second,
}

/// Two images handed between one writer and any number of readers.
///
/// The writer fills the back image and calls [`swap_images`](Self::swap_images);
/// readers only look at the front image. Each image has its own lock, so a
/// reader holding the front image blocks the writer from reusing it after a
/// swap instead of seeing a half-written frame.
#[derive(Debug)]
pub struct DoubleBuffer {
    images: [RwLock<PixelBuffer>; 2],
    swapped: AtomicBool,
}

impl DoubleBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            images: [
                RwLock::new(PixelBuffer::new(width, height)),
                RwLock::new(PixelBuffer::new(width, height)),
            ],
            swapped: AtomicBool::new(false),
        }
    }

    pub fn front_slot(&self) -> BufferSlot {
        if self.swapped.load(Ordering::Acquire) {
            BufferSlot::Second
        } else {
            BufferSlot::First
        }
    }

    pub fn back_slot(&self) -> BufferSlot {
        match self.front_slot() {
            BufferSlot::First => BufferSlot::Second,
            BufferSlot::Second => BufferSlot::First,
        }
    }

    /// Image to display.
    pub fn front_buffer(&self) -> RwLockReadGuard<'_, PixelBuffer> {
        self.slot(self.front_slot())
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Image to draw into. Only the producing thread should call this.
    pub fn back_buffer(&self) -> RwLockWriteGuard<'_, PixelBuffer> {
        self.slot(self.back_slot())
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    pub fn swap_images(&self) {
        self.swapped.fetch_xor(true, Ordering::AcqRel);
    }

    /// Reallocate both images as transparent `width` x `height`.
    pub fn resize(&self, width: u32, height: u32) {
        for image in &self.images {
            let mut image = image.write().unwrap_or_else(PoisonError::into_inner);
            *image = PixelBuffer::new(width, height);
        }
    }

    pub fn dimensions(&self) -> (u32, u32) {
        let front = self.front_buffer();
        (front.width, front.height)
    }

    fn slot(&self, slot: BufferSlot) -> &RwLock<PixelBuffer> {
        match slot {
            BufferSlot::First => &self.images[0],
            BufferSlot::Second => &self.images[1],
        }
    }
}
