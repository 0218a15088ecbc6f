use super::store::FrameStore;
use super::types::Frame;
use crate::error::PlaybackError;

/// Position of a producer's cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Cursor {
    /// Next `next_frame` yields frame 0; `prev_frame` yields nothing.
    #[default]
    BeforeStart,
    At(usize),
    /// Next `prev_frame` yields the last frame; `next_frame` yields nothing.
    PastEnd,
}

impl Cursor {
    fn next_index(self) -> Option<usize> {
        match self {
            Cursor::BeforeStart => Some(0),
            Cursor::At(i) => Some(i + 1),
            Cursor::PastEnd => None,
        }
    }

    fn prev_index(self, count: usize) -> Option<usize> {
        match self {
            Cursor::BeforeStart => None,
            Cursor::At(i) => i.checked_sub(1),
            Cursor::PastEnd => count.checked_sub(1),
        }
    }
}

/// Uniform stepping interface over a frame source.
///
/// Stepping past either end returns `None` and parks the cursor at that end;
/// it is never an error.
pub trait FrameProducer: Send {
    fn next_frame(&mut self) -> Option<Frame>;

    fn prev_frame(&mut self) -> Option<Frame>;

    /// Next `next_frame` yields frame 0.
    fn reset_to_zero(&mut self);

    /// Next `prev_frame` yields the last frame.
    fn reset_to_end(&mut self);

    /// Place the cursor on `index`, so `next_frame` yields `index + 1` and
    /// `prev_frame` yields `index - 1`.
    fn reset_to(&mut self, index: usize) -> Result<(), PlaybackError>;

    /// Frame count, computing it if the producer can.
    fn num_frames(&mut self) -> Option<usize>;

    /// Frame count if already known, without doing any work.
    fn known_num_frames(&self) -> Option<usize>;

    fn is_reverse_supported(&self) -> bool;

    fn is_dynamic_num_frames(&self) -> bool {
        false
    }

    fn width(&self) -> u32;

    fn height(&self) -> u32;

    fn cursor(&self) -> Cursor;

    fn index(&self) -> Option<usize> {
        match self.cursor() {
            Cursor::At(i) => Some(i),
            _ => None,
        }
    }
}

/// Producer over frames that are fully composed up front.
#[derive(Debug, Clone, Default)]
pub struct ArrayProducer {
    frames: Vec<Frame>,
    cursor: Cursor,
    width: u32,
    height: u32,
}

impl ArrayProducer {
    pub fn new(frames: Vec<Frame>) -> Self {
        let width = frames.iter().map(Frame::width).max().unwrap_or(0);
        let height = frames.iter().map(Frame::height).max().unwrap_or(0);
        Self {
            frames,
            cursor: Cursor::BeforeStart,
            width,
            height,
        }
    }

    /// Decode and compose every frame of `store` now.
    pub fn from_store(mut store: FrameStore) -> Self {
        store.load_until_end();
        let count = store.num_frames().unwrap_or(0);
        let frames: Vec<Frame> = (0..count).filter_map(|i| store.frame(i)).collect();
        log::info!(
            "Pre-decoded {} frames ({}x{})",
            frames.len(),
            store.width(),
            store.height()
        );
        Self::new(frames)
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }
}

impl FrameProducer for ArrayProducer {
    fn next_frame(&mut self) -> Option<Frame> {
        match self.cursor.next_index() {
            Some(i) if i < self.frames.len() => {
                self.cursor = Cursor::At(i);
                Some(self.frames[i].clone())
            }
            _ => {
                self.cursor = Cursor::PastEnd;
                None
            }
        }
    }

    fn prev_frame(&mut self) -> Option<Frame> {
        match self.cursor.prev_index(self.frames.len()) {
            Some(i) => {
                self.cursor = Cursor::At(i);
                Some(self.frames[i].clone())
            }
            None => {
                self.cursor = Cursor::BeforeStart;
                None
            }
        }
    }

    fn reset_to_zero(&mut self) {
        self.cursor = Cursor::BeforeStart;
    }

    fn reset_to_end(&mut self) {
        self.cursor = Cursor::PastEnd;
    }

    fn reset_to(&mut self, index: usize) -> Result<(), PlaybackError> {
        if index >= self.frames.len() {
            return Err(PlaybackError::InvalidIndex {
                index,
                count: self.frames.len(),
            });
        }
        self.cursor = Cursor::At(index);
        Ok(())
    }

    fn num_frames(&mut self) -> Option<usize> {
        Some(self.frames.len())
    }

    fn known_num_frames(&self) -> Option<usize> {
        Some(self.frames.len())
    }

    fn is_reverse_supported(&self) -> bool {
        true
    }

    fn width(&self) -> u32 {
        self.width
    }

    fn height(&self) -> u32 {
        self.height
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

/// Producer that decodes on demand through a [`FrameStore`].
///
/// Forward stepping during the first pass decodes one frame at a time.
/// Anything that needs the frame count (resets, random access, backward
/// stepping from the end) forces the rest of the stream to be decoded first.
pub struct LazyProducer {
    store: FrameStore,
    cursor: Cursor,
}

impl LazyProducer {
    pub fn new(store: FrameStore) -> Self {
        Self {
            store,
            cursor: Cursor::BeforeStart,
        }
    }

    pub fn store(&self) -> &FrameStore {
        &self.store
    }

    fn ensure_scanned(&mut self) {
        if !self.store.is_first_pass_done() {
            log::debug!(
                "Decoding remaining frames after {}",
                self.store.decoded_count()
            );
            self.store.load_until_end();
        }
    }
}

impl FrameProducer for LazyProducer {
    fn next_frame(&mut self) -> Option<Frame> {
        let frame = self
            .cursor
            .next_index()
            .and_then(|i| self.store.frame(i));
        self.cursor = match &frame {
            Some(f) => Cursor::At(f.index),
            None => Cursor::PastEnd,
        };
        frame
    }

    fn prev_frame(&mut self) -> Option<Frame> {
        if !self.store.is_reverse_supported() {
            return None;
        }
        let count = self.store.decoded_count();
        let frame = self
            .cursor
            .prev_index(count)
            .and_then(|i| self.store.frame(i));
        self.cursor = match &frame {
            Some(f) => Cursor::At(f.index),
            None => Cursor::BeforeStart,
        };
        frame
    }

    fn reset_to_zero(&mut self) {
        self.ensure_scanned();
        self.cursor = Cursor::BeforeStart;
    }

    fn reset_to_end(&mut self) {
        self.ensure_scanned();
        self.cursor = Cursor::PastEnd;
    }

    fn reset_to(&mut self, index: usize) -> Result<(), PlaybackError> {
        self.ensure_scanned();
        let count = self.store.decoded_count();
        if index >= count {
            return Err(PlaybackError::InvalidIndex { index, count });
        }
        self.cursor = Cursor::At(index);
        Ok(())
    }

    fn num_frames(&mut self) -> Option<usize> {
        self.ensure_scanned();
        self.store.num_frames()
    }

    fn known_num_frames(&self) -> Option<usize> {
        self.store.num_frames()
    }

    fn is_reverse_supported(&self) -> bool {
        self.store.is_reverse_supported()
    }

    fn width(&self) -> u32 {
        self.store.width()
    }

    fn height(&self) -> u32 {
        self.store.height()
    }

    fn cursor(&self) -> Cursor {
        self.cursor
    }
}

impl Drop for LazyProducer {
    fn drop(&mut self) {
        self.store.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::canvas::PixelBuffer;
    use crate::media::decoder::MemoryDecoder;
    use crate::media::store::tests::{RED, full_frames, raw};
    use crate::media::types::{Disposal, Rect};

    fn array(count: usize) -> ArrayProducer {
        let frames = (0..count)
            .map(|i| Frame::from_image(i, PixelBuffer::new(2, 2), 10))
            .collect();
        ArrayProducer::new(frames)
    }

    fn indices(frames: impl IntoIterator<Item = Option<Frame>>) -> Vec<Option<usize>> {
        frames.into_iter().map(|f| f.map(|f| f.index)).collect()
    }

    #[test]
    fn array_steps_forward_and_parks_past_end() {
        let mut p = array(2);
        let seen = indices([p.next_frame(), p.next_frame(), p.next_frame(), p.next_frame()]);
        assert_eq!(seen, vec![Some(0), Some(1), None, None]);
        assert_eq!(p.cursor(), Cursor::PastEnd);
        assert_eq!(p.prev_frame().map(|f| f.index), Some(1));
    }

    #[test]
    fn prev_before_any_next_returns_none() {
        let mut p = array(3);
        assert!(p.prev_frame().is_none());
        assert_eq!(p.cursor(), Cursor::BeforeStart);
        assert_eq!(p.next_frame().map(|f| f.index), Some(0));
    }

    #[test]
    fn array_resets() {
        let mut p = array(3);
        p.reset_to_end();
        assert_eq!(p.prev_frame().map(|f| f.index), Some(2));
        p.reset_to(1).unwrap();
        assert_eq!(p.index(), Some(1));
        assert_eq!(p.next_frame().map(|f| f.index), Some(2));
        p.reset_to(1).unwrap();
        assert_eq!(p.prev_frame().map(|f| f.index), Some(0));
        assert!(matches!(
            p.reset_to(3),
            Err(PlaybackError::InvalidIndex { index: 3, count: 3 })
        ));
        p.reset_to_zero();
        assert_eq!(p.next_frame().map(|f| f.index), Some(0));
    }

    #[test]
    fn array_dimensions_are_maxima() {
        let p = ArrayProducer::new(vec![
            Frame::from_image(0, PixelBuffer::new(4, 1), 10),
            Frame::from_image(1, PixelBuffer::new(2, 3), 10),
        ]);
        assert_eq!((p.width(), p.height()), (4, 3));
        assert!(p.is_reverse_supported());
        assert!(!p.is_dynamic_num_frames());
    }

    #[test]
    fn array_from_store_matches_lazy_first_pass() {
        let decoder = MemoryDecoder::new(Some((2, 1)))
            .with_frame(raw(Rect::new(0, 0, 1, 1), RED, Disposal::DoNotDispose, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), RED, Disposal::None, 20));
        let p = ArrayProducer::from_store(FrameStore::new(decoder));
        assert_eq!(p.frames().len(), 2);
        assert_eq!(p.frames()[1].composed.pixel(0, 0), Some(RED));
        assert_eq!(p.frames()[1].delay_ms, 20);
    }

    #[test]
    fn lazy_decodes_incrementally() {
        let mut p = LazyProducer::new(FrameStore::new(full_frames(3)));
        assert_eq!(p.next_frame().map(|f| f.index), Some(0));
        assert_eq!(p.store().decoded_count(), 1);
        assert_eq!(p.known_num_frames(), None);
        assert!(!p.is_reverse_supported());
        assert!(p.prev_frame().is_none());
    }

    #[test]
    fn lazy_reset_forces_full_scan() {
        let mut p = LazyProducer::new(FrameStore::new(full_frames(4)));
        p.next_frame();
        p.reset_to_zero();
        assert!(p.store().is_first_pass_done());
        assert_eq!(p.known_num_frames(), Some(4));
        assert_eq!(p.next_frame().map(|f| f.index), Some(0));
    }

    #[test]
    fn lazy_num_frames_forces_full_scan() {
        let mut p = LazyProducer::new(FrameStore::new(full_frames(5)));
        assert_eq!(p.num_frames(), Some(5));
        assert!(p.is_reverse_supported());
    }

    #[test]
    fn lazy_steps_backward_after_first_pass() {
        let mut p = LazyProducer::new(FrameStore::new(full_frames(3)));
        while p.next_frame().is_some() {}
        assert_eq!(p.cursor(), Cursor::PastEnd);
        let back = indices([p.prev_frame(), p.prev_frame(), p.prev_frame(), p.prev_frame()]);
        assert_eq!(back, vec![Some(2), Some(1), Some(0), None]);
        assert_eq!(p.cursor(), Cursor::BeforeStart);
    }

    #[test]
    fn lazy_reset_to_validates_index() {
        let mut p = LazyProducer::new(FrameStore::new(full_frames(2)));
        assert!(matches!(
            p.reset_to(2),
            Err(PlaybackError::InvalidIndex { index: 2, count: 2 })
        ));
        p.reset_to(1).unwrap();
        assert_eq!(p.prev_frame().map(|f| f.index), Some(0));
    }

    #[test]
    fn lazy_and_array_agree_on_composed_frames() {
        let decoder = || {
            MemoryDecoder::new(Some((2, 2)))
                .with_frame(raw(Rect::new(0, 0, 2, 2), RED, Disposal::RestoreBackground, 10))
                .with_frame(raw(Rect::new(1, 1, 1, 1), RED, Disposal::RestorePrevious, 10))
                .with_frame(raw(Rect::new(0, 0, 1, 1), RED, Disposal::None, 10))
        };
        let array = ArrayProducer::from_store(FrameStore::new(decoder()));
        let mut lazy = LazyProducer::new(FrameStore::new(decoder()));
        lazy.reset_to_end();
        for expected in array.frames().iter().rev() {
            let frame = lazy.prev_frame().unwrap();
            assert_eq!(frame.index, expected.index);
            assert_eq!(frame.composed, expected.composed);
        }
    }
}
