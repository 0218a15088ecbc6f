use std::sync::Arc;

use super::canvas::{Canvas, PixelBuffer};
use super::decoder::FrameDecoder;
use super::types::{Disposal, Frame, RawFrame, Rect};
use crate::error::{DecodeError, PlaybackError};

/// Metadata and decoded block for one frame. Append-only, in index order.
#[derive(Debug, Clone)]
struct FrameRecord {
    delay_ms: u32,
    disposal: Disposal,
    placement: Rect,
    raw: Arc<PixelBuffer>,
    /// Block covers the whole logical canvas.
    full: bool,
    /// No fully transparent pixel in the block.
    opaque: bool,
}

impl FrameRecord {
    /// Compositing this frame onto any canvas yields the same image, and
    /// nothing after it needs to restore past it.
    fn is_anchor(&self) -> bool {
        self.full && self.opaque && self.disposal != Disposal::RestorePrevious
    }
}

/// Lazily decodes frames and reconstructs each one's displayable image by
/// replaying disposal rules on a persistent canvas.
///
/// The first pass pulls frames from the decoder one by one. Once the stream
/// ends the decoder is dropped and every later access rebuilds frames from the
/// cached raw blocks, either incrementally from the previous frame or by
/// walking forward from the nearest anchor frame.
pub struct FrameStore {
    decoder: Option<Box<dyn FrameDecoder>>,
    width: u32,
    height: u32,
    canvas: Canvas,
    records: Vec<FrameRecord>,
    end_reached: bool,
    last_full_frame: Option<usize>,
    /// Sequential cursor for `next_frame`.
    next_index: usize,
    /// Frame whose composite the canvas currently holds, disposal not yet applied.
    canvas_frame: Option<usize>,
    /// Frame that starts the current RestorePrevious run; `restore_pixels`
    /// holds the canvas as it was just before that frame was drawn.
    restore_point: Option<usize>,
    restore_pixels: PixelBuffer,
}

impl FrameStore {
    pub fn new(decoder: impl FrameDecoder + 'static) -> Self {
        Self::from_boxed(Box::new(decoder))
    }

    pub fn from_boxed(decoder: Box<dyn FrameDecoder>) -> Self {
        let (width, height) = decoder.canvas_size().unwrap_or((0, 0));
        Self {
            decoder: Some(decoder),
            width,
            height,
            canvas: Canvas::new(width, height),
            records: Vec::new(),
            end_reached: false,
            last_full_frame: None,
            next_index: 0,
            canvas_frame: None,
            restore_point: None,
            restore_pixels: PixelBuffer::new(0, 0),
        }
    }

    /// Logical canvas width; 0 until known.
    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_first_pass_done(&self) -> bool {
        self.end_reached
    }

    /// Frames decoded so far.
    pub fn decoded_count(&self) -> usize {
        self.records.len()
    }

    /// Total frame count, known only after the first pass.
    pub fn num_frames(&self) -> Option<usize> {
        self.end_reached.then_some(self.records.len())
    }

    pub fn last_full_frame(&self) -> Option<usize> {
        self.last_full_frame
    }

    /// Direct seeking needs the complete frame list and no partial frames.
    pub fn is_seekable(&self) -> bool {
        self.end_reached && !self.records.is_empty() && self.records.iter().all(|r| r.full)
    }

    /// Frames can be rebuilt in any order once the first pass has finished.
    pub fn is_reverse_supported(&self) -> bool {
        self.end_reached && !self.records.is_empty()
    }

    /// Whether frame `index` covers the whole canvas.
    pub fn is_full_frame(&self, index: usize) -> Option<bool> {
        self.records.get(index).map(|r| r.full)
    }

    /// Sequential access. Decodes during the first pass and replays afterwards.
    /// Returns `None` at the end and rewinds to frame 0.
    pub fn next_frame(&mut self) -> Option<Frame> {
        let frame = self.frame(self.next_index);
        match frame {
            Some(_) => self.next_index += 1,
            None => self.next_index = 0,
        }
        frame
    }

    /// Frame `index`, decoding forward as far as needed. `None` when the
    /// stream ends before `index`.
    pub fn frame(&mut self, index: usize) -> Option<Frame> {
        while index >= self.records.len() {
            if !self.decode_next() {
                return None;
            }
        }
        Some(self.render(index))
    }

    /// Random access, allowed only on seekable sequences.
    ///
    /// An opaque full frame is drawn on its own. A full frame with transparent
    /// pixels is rebuilt by walking forward from the nearest opaque one, so
    /// only the former is constant time.
    pub fn get_frame(&mut self, index: usize) -> Result<Frame, PlaybackError> {
        self.check_seek(index)?;
        log::debug!("Seeking to frame {index}");
        Ok(self.render(index))
    }

    /// Position the sequential cursor so the next `next_frame` yields `index`.
    pub fn seek_to_frame(&mut self, index: usize) -> Result<(), PlaybackError> {
        self.check_seek(index)?;
        self.next_index = index;
        Ok(())
    }

    /// Drain the decoder, fixing the frame count.
    pub fn load_until_end(&mut self) {
        while self.decode_next() {}
    }

    /// Release the decoder early. Frames decoded so far remain available.
    pub fn close(&mut self) {
        if !self.end_reached {
            log::info!("Closing frame store after {} frames", self.records.len());
        }
        self.finish_first_pass();
    }

    fn check_seek(&self, index: usize) -> Result<(), PlaybackError> {
        if !self.is_seekable() {
            return Err(PlaybackError::Unsupported(
                "seeking needs a completed first pass over full frames",
            ));
        }
        if index >= self.records.len() {
            return Err(PlaybackError::InvalidIndex {
                index,
                count: self.records.len(),
            });
        }
        Ok(())
    }

    /// Pull one frame from the decoder into the record list. Returns false
    /// when the stream is over.
    fn decode_next(&mut self) -> bool {
        let Some(decoder) = self.decoder.as_mut() else {
            return false;
        };
        let index = self.records.len();
        let raw = match decoder.read_next_frame() {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                self.finish_first_pass();
                return false;
            }
            Err(e) => {
                log::warn!("Frame {index} failed to decode, ending sequence: {e}");
                self.finish_first_pass();
                return false;
            }
        };
        if let Err(e) = validate(&raw) {
            log::warn!("Frame {index} is malformed, ending sequence: {e}");
            self.finish_first_pass();
            return false;
        }

        if index == 0 && (self.width == 0 || self.height == 0) {
            let (w, h) = raw.placement().extent();
            log::debug!("No logical screen size, using first frame extent {w}x{h}");
            self.width = w;
            self.height = h;
            self.canvas.resize(w, h);
        }

        let placement = raw.placement();
        let full = placement.x == 0
            && placement.y == 0
            && placement.width == self.width
            && placement.height == self.height;
        if full {
            self.last_full_frame = Some(index);
        }
        let opaque = raw.block.is_opaque();
        self.records.push(FrameRecord {
            delay_ms: raw.delay_ms,
            disposal: raw.disposal,
            placement,
            raw: Arc::new(raw.block),
            full,
            opaque,
        });
        true
    }

    fn finish_first_pass(&mut self) {
        if self.end_reached {
            return;
        }
        self.end_reached = true;
        self.decoder = None;
        log::info!(
            "First pass complete: {} frames, {}x{}, seekable: {}",
            self.records.len(),
            self.width,
            self.height,
            self.is_seekable()
        );
    }

    /// Bring the canvas to frame `index` and snapshot it.
    fn render(&mut self, index: usize) -> Frame {
        let start = match index.checked_sub(1) {
            Some(prev) if self.canvas_frame == Some(prev) => {
                self.apply_disposal(prev);
                index
            }
            _ => self.rewind_for(index),
        };
        for i in start..index {
            self.composite(i);
            self.apply_disposal(i);
        }
        self.composite(index);

        let record = &self.records[index];
        Frame {
            index,
            delay_ms: record.delay_ms,
            disposal: record.disposal,
            placement: record.placement,
            raw: Arc::clone(&record.raw),
            composed: Arc::new(self.canvas.snapshot()),
        }
    }

    /// Clear the canvas and pick the frame to replay from.
    fn rewind_for(&mut self, index: usize) -> usize {
        let anchor = self.records[..=index]
            .iter()
            .rposition(FrameRecord::is_anchor)
            .unwrap_or(0);
        if anchor != index {
            log::debug!("Rebuilding frame {index} from frame {anchor}");
        }
        self.canvas.clear();
        self.canvas_frame = None;
        self.restore_point = None;
        anchor
    }

    fn composite(&mut self, index: usize) {
        let chain_start = self.restore_chain_start(index);
        let record = &self.records[index];
        if chain_start == Some(index) {
            self.restore_pixels.copy_from(self.canvas.pixels());
            self.restore_point = Some(index);
        }
        self.canvas
            .composite_at(&record.raw, record.placement.x, record.placement.y);
        self.canvas_frame = Some(index);
    }

    /// First frame of the RestorePrevious run containing `index`, or `None`
    /// when `index` does not restore.
    fn restore_chain_start(&self, index: usize) -> Option<usize> {
        if self.records[index].disposal != Disposal::RestorePrevious {
            return None;
        }
        let run = self.records[..index]
            .iter()
            .rev()
            .take_while(|r| r.disposal == Disposal::RestorePrevious)
            .count();
        Some(index - run)
    }

    /// Apply frame `index`'s disposal, readying the canvas for `index + 1`.
    fn apply_disposal(&mut self, index: usize) {
        let record = &self.records[index];
        let placement = record.placement;
        match record.disposal {
            Disposal::None | Disposal::DoNotDispose => {}
            Disposal::RestoreBackground => self.canvas.clear_rect(placement),
            Disposal::RestorePrevious => {
                // Back to the canvas as it was before the run of restoring frames began
                let start = self.restore_chain_start(index);
                if start.is_some() && self.restore_point == start {
                    self.canvas.restore_from(&self.restore_pixels);
                } else {
                    log::warn!("No saved canvas before frame {index}, clearing its area instead");
                    self.canvas.clear_rect(placement);
                }
            }
        }
        self.canvas_frame = None;
    }
}

fn validate(raw: &RawFrame) -> Result<(), DecodeError> {
    if raw.block.is_empty() {
        return Err(DecodeError::EmptyBlock);
    }
    let expected = raw.block.width as usize * raw.block.height as usize * 4;
    if raw.block.data.len() != expected {
        return Err(DecodeError::BlockSize {
            width: raw.block.width,
            height: raw.block.height,
            expected,
            actual: raw.block.data.len(),
        });
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use proptest::prelude::*;

    use super::*;
    use crate::media::decoder::tests::encode_gif;
    use crate::media::decoder::{GifDecoder, MemoryDecoder};

    pub(crate) const RED: [u8; 4] = [255, 0, 0, 255];
    pub(crate) const GREEN: [u8; 4] = [0, 255, 0, 255];
    pub(crate) const BLUE: [u8; 4] = [0, 0, 255, 255];
    const CLEAR: [u8; 4] = [0, 0, 0, 0];

    pub(crate) fn raw(
        rect: Rect,
        rgba: [u8; 4],
        disposal: Disposal,
        delay_ms: u32,
    ) -> RawFrame {
        RawFrame {
            block: PixelBuffer::filled(rect.width, rect.height, rgba),
            left: rect.x,
            top: rect.y,
            delay_ms,
            disposal,
        }
    }

    /// `count` opaque full frames on a 2x2 canvas, each a different shade.
    pub(crate) fn full_frames(count: usize) -> MemoryDecoder {
        (0..count).fold(MemoryDecoder::new(Some((2, 2))), |decoder, i| {
            let shade = (i * 20 % 256) as u8;
            decoder.with_frame(raw(
                Rect::new(0, 0, 2, 2),
                [shade, 0, 0, 255],
                Disposal::None,
                10 * (i as u32 + 1),
            ))
        })
    }

    fn first_pass(store: &mut FrameStore) -> Vec<Frame> {
        let mut frames = Vec::new();
        while let Some(f) = store.next_frame() {
            frames.push(f);
        }
        frames
    }

    #[test]
    fn first_pass_composes_partial_frames() {
        let decoder = MemoryDecoder::new(Some((3, 1)))
            .with_frame(raw(Rect::new(0, 0, 3, 1), RED, Disposal::DoNotDispose, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), BLUE, Disposal::None, 10));
        let mut store = FrameStore::new(decoder);
        let frames = first_pass(&mut store);

        assert_eq!(frames.len(), 2);
        let second = &frames[1].composed;
        assert_eq!(second.pixel(0, 0), Some(RED));
        assert_eq!(second.pixel(1, 0), Some(BLUE));
        assert_eq!(second.pixel(2, 0), Some(RED));
        // The first snapshot is untouched by later compositing
        assert_eq!(frames[0].composed.pixel(1, 0), Some(RED));
        assert_eq!(store.num_frames(), Some(2));
        assert_eq!(store.last_full_frame(), Some(0));
    }

    #[test]
    fn restore_background_clears_only_previous_rect() {
        let decoder = MemoryDecoder::new(Some((2, 1)))
            .with_frame(raw(Rect::new(0, 0, 2, 1), RED, Disposal::None, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), BLUE, Disposal::RestoreBackground, 10))
            .with_frame(raw(Rect::new(0, 0, 1, 1), GREEN, Disposal::None, 10));
        let mut store = FrameStore::new(decoder);
        let frames = first_pass(&mut store);
        assert_eq!(frames[2].composed.pixel(0, 0), Some(GREEN));
        assert_eq!(frames[2].composed.pixel(1, 0), Some(CLEAR));
    }

    #[test]
    fn restore_previous_returns_to_last_kept_state() {
        // A keeps, B restores previous, C draws on the canvas as it was after A
        let decoder = MemoryDecoder::new(Some((2, 1)))
            .with_frame(raw(Rect::new(0, 0, 1, 1), RED, Disposal::DoNotDispose, 10))
            .with_frame(raw(Rect::new(0, 0, 2, 1), BLUE, Disposal::RestorePrevious, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), GREEN, Disposal::None, 10));
        let mut store = FrameStore::new(decoder);
        let frames = first_pass(&mut store);
        let c = &frames[2].composed;
        assert_eq!(c.pixel(0, 0), Some(RED));
        assert_eq!(c.pixel(1, 0), Some(GREEN));
    }

    #[test]
    fn restore_previous_chain_skips_to_last_non_restoring_frame() {
        let decoder = MemoryDecoder::new(Some((3, 1)))
            .with_frame(raw(Rect::new(0, 0, 1, 1), RED, Disposal::None, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), BLUE, Disposal::RestorePrevious, 10))
            .with_frame(raw(Rect::new(2, 0, 1, 1), GREEN, Disposal::RestorePrevious, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), GREEN, Disposal::None, 10));
        let mut store = FrameStore::new(decoder);
        let frames = first_pass(&mut store);
        let last = &frames[3].composed;
        assert_eq!(last.pixel(0, 0), Some(RED));
        assert_eq!(last.pixel(1, 0), Some(GREEN));
        assert_eq!(last.pixel(2, 0), Some(CLEAR));
    }

    #[test]
    fn restore_previous_after_background_disposal_keeps_cleared_area() {
        // A is cleared before B is drawn, so restoring B must not bring A back
        let decoder = MemoryDecoder::new(Some((2, 1)))
            .with_frame(raw(Rect::new(0, 0, 2, 1), RED, Disposal::RestoreBackground, 10))
            .with_frame(raw(Rect::new(0, 0, 1, 1), BLUE, Disposal::RestorePrevious, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), GREEN, Disposal::None, 10));
        let mut store = FrameStore::new(decoder);
        let frames = first_pass(&mut store);
        assert_eq!(frames[1].composed.pixel(0, 0), Some(BLUE));
        assert_eq!(frames[1].composed.pixel(1, 0), Some(CLEAR));
        let c = &frames[2].composed;
        assert_eq!(c.pixel(0, 0), Some(CLEAR));
        assert_eq!(c.pixel(1, 0), Some(GREEN));
        assert_eq!(store.frame(2).unwrap().composed, *c);
    }

    #[test]
    fn restore_previous_on_first_frame_clears_its_rect() {
        let decoder = MemoryDecoder::new(Some((2, 1)))
            .with_frame(raw(Rect::new(0, 0, 1, 1), RED, Disposal::RestorePrevious, 10))
            .with_frame(raw(Rect::new(1, 0, 1, 1), BLUE, Disposal::None, 10));
        let mut store = FrameStore::new(decoder);
        let frames = first_pass(&mut store);
        assert_eq!(frames[1].composed.pixel(0, 0), Some(CLEAR));
        assert_eq!(frames[1].composed.pixel(1, 0), Some(BLUE));
    }

    #[test]
    fn seekability_requires_all_full_frames() {
        let mut store = FrameStore::new(full_frames(3));
        assert!(!store.is_seekable());
        store.load_until_end();
        assert!(store.is_seekable());

        let decoder =
            full_frames(2).with_frame(raw(Rect::new(0, 0, 1, 1), RED, Disposal::None, 10));
        let mut partial = FrameStore::new(decoder);
        partial.load_until_end();
        assert!(!partial.is_seekable());
        assert!(partial.is_reverse_supported());
        assert_eq!(partial.is_full_frame(2), Some(false));
    }

    #[test]
    fn get_frame_errors_are_distinct() {
        let mut store = FrameStore::new(full_frames(3));
        assert!(matches!(store.get_frame(0), Err(PlaybackError::Unsupported(_))));
        store.load_until_end();
        assert!(matches!(
            store.get_frame(3),
            Err(PlaybackError::InvalidIndex { index: 3, count: 3 })
        ));
        assert!(matches!(
            store.seek_to_frame(7),
            Err(PlaybackError::InvalidIndex { .. })
        ));
    }

    #[test]
    fn seek_to_frame_moves_sequential_cursor() {
        let mut store = FrameStore::new(full_frames(4));
        store.load_until_end();
        store.seek_to_frame(2).unwrap();
        assert_eq!(store.next_frame().map(|f| f.index), Some(2));
        assert_eq!(store.next_frame().map(|f| f.index), Some(3));
        assert!(store.next_frame().is_none());
        // Wrapped back to the start
        assert_eq!(store.next_frame().map(|f| f.index), Some(0));
    }

    #[test]
    fn decode_error_ends_sequence_without_propagating() {
        let decoder = full_frames(2).with_error(DecodeError::EmptyBlock);
        let mut store = FrameStore::new(decoder);
        assert_eq!(first_pass(&mut store).len(), 2);
        assert!(store.is_first_pass_done());
        assert_eq!(store.num_frames(), Some(2));
    }

    #[test]
    fn malformed_block_leaves_canvas_untouched() {
        let bad = RawFrame {
            block: PixelBuffer {
                width: 2,
                height: 2,
                data: vec![255; 3],
            },
            left: 0,
            top: 0,
            delay_ms: 10,
            disposal: Disposal::None,
        };
        let decoder = MemoryDecoder::new(Some((2, 2)))
            .with_frame(raw(Rect::new(0, 0, 2, 2), RED, Disposal::DoNotDispose, 10))
            .with_frame(bad);
        let mut store = FrameStore::new(decoder);
        let first = store.next_frame().unwrap();
        assert!(store.next_frame().is_none());
        assert_eq!(store.num_frames(), Some(1));
        let replay = store.frame(0).unwrap();
        assert_eq!(replay.composed, first.composed);
    }

    #[test]
    fn canvas_size_falls_back_to_first_frame_extent() {
        let decoder = MemoryDecoder::new(None).with_frame(raw(
            Rect::new(1, 1, 2, 3),
            RED,
            Disposal::None,
            10,
        ));
        let mut store = FrameStore::new(decoder);
        assert_eq!(store.width(), 0);
        let frame = store.next_frame().unwrap();
        assert_eq!((store.width(), store.height()), (3, 4));
        assert_eq!((frame.width(), frame.height()), (3, 4));
    }

    #[test]
    fn empty_stream_has_zero_frames() {
        let mut store = FrameStore::new(MemoryDecoder::new(Some((4, 4))));
        assert!(store.next_frame().is_none());
        assert_eq!(store.num_frames(), Some(0));
        assert!(!store.is_seekable());
        assert!(!store.is_reverse_supported());
    }

    #[test]
    fn replays_gif_with_restore_previous() {
        use gif::DisposalMethod::{Any, Keep, Previous};
        let bytes = encode_gif(
            3,
            1,
            &[
                (0, 0, 3, 1, vec![0, 0, 0], 10, Keep),
                (0, 0, 2, 1, vec![1, 1], 10, Previous),
                (2, 0, 1, 1, vec![1], 10, Any),
            ],
        );
        let mut store = FrameStore::new(GifDecoder::from_bytes(bytes).unwrap());
        let frames = first_pass(&mut store);
        assert_eq!(frames.len(), 3);
        let last = &frames[2].composed;
        assert_eq!(last.pixel(0, 0), Some(RED));
        assert_eq!(last.pixel(1, 0), Some(RED));
        assert_eq!(last.pixel(2, 0), Some(BLUE));

        // Out-of-order replay matches the first pass
        for i in [2, 0, 1, 2] {
            assert_eq!(store.frame(i).unwrap().composed, frames[i].composed);
        }
    }

    fn arb_disposal() -> impl Strategy<Value = Disposal> {
        prop_oneof![
            Just(Disposal::None),
            Just(Disposal::DoNotDispose),
            Just(Disposal::RestoreBackground),
            Just(Disposal::RestorePrevious),
        ]
    }

    /// Random frames on a 4x4 canvas, some partial, some with transparent pixels.
    fn arb_frames() -> impl Strategy<Value = Vec<RawFrame>> {
        let frame = (
            0u32..4,
            0u32..4,
            1u32..5,
            1u32..5,
            any::<u8>(),
            any::<bool>(),
            arb_disposal(),
        )
            .prop_map(|(x, y, w, h, shade, holes, disposal)| {
                let mut block = PixelBuffer::filled(w, h, [shade, 255 - shade, 0, 255]);
                if holes {
                    block.data[3] = 0;
                }
                RawFrame {
                    block,
                    left: x,
                    top: y,
                    delay_ms: 10,
                    disposal,
                }
            });
        prop::collection::vec(frame, 1..8)
    }

    /// Straight-line compositor that saves the canvas before every frame.
    fn reference_composites(frames: &[RawFrame], width: u32, height: u32) -> Vec<PixelBuffer> {
        let mut canvas = Canvas::new(width, height);
        let mut out = Vec::new();
        for frame in frames {
            let before = canvas.snapshot();
            canvas.composite_at(&frame.block, frame.left, frame.top);
            out.push(canvas.snapshot());
            match frame.disposal {
                Disposal::None | Disposal::DoNotDispose => {}
                Disposal::RestoreBackground => canvas.clear_rect(frame.placement()),
                Disposal::RestorePrevious => canvas.restore_from(&before),
            }
        }
        out
    }

    proptest! {
        #[test]
        fn replay_matches_first_pass(frames in arb_frames(), order in prop::collection::vec(0usize..8, 1..12)) {
            let count = frames.len();
            let decoder = frames.into_iter().fold(MemoryDecoder::new(Some((4, 4))), MemoryDecoder::with_frame);
            let mut store = FrameStore::new(decoder);
            let originals = first_pass(&mut store);
            prop_assert_eq!(originals.len(), count);

            for i in order.into_iter().map(|i| i % count) {
                let replay = store.frame(i).unwrap();
                prop_assert_eq!(&replay.composed, &originals[i].composed);
                let again = store.frame(i).unwrap();
                prop_assert_eq!(&again.composed, &replay.composed);
            }
        }

        #[test]
        fn first_pass_matches_reference_compositor(frames in arb_frames()) {
            let expected = reference_composites(&frames, 4, 4);
            let decoder = frames.into_iter().fold(MemoryDecoder::new(Some((4, 4))), MemoryDecoder::with_frame);
            let mut store = FrameStore::new(decoder);
            let composed: Vec<_> = first_pass(&mut store).into_iter().map(|f| f.composed).collect();
            prop_assert_eq!(composed.len(), expected.len());
            for (i, (got, want)) in composed.iter().zip(&expected).enumerate() {
                prop_assert_eq!(&**got, want, "frame {}", i);
            }
        }

        #[test]
        fn full_frame_seek_matches_first_pass(count in 1usize..10, seeks in prop::collection::vec(0usize..10, 1..10)) {
            let mut store = FrameStore::new(full_frames(count));
            let originals = first_pass(&mut store);
            prop_assert!(store.is_seekable());
            for i in seeks.into_iter().map(|i| i % count) {
                let frame = store.get_frame(i).unwrap();
                prop_assert_eq!(frame.index, i);
                prop_assert_eq!(&frame.composed, &originals[i].composed);
                prop_assert_eq!(frame.delay_ms, originals[i].delay_ms);
            }
        }
    }
}
