use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::error::PlaybackError;
use crate::media::producer::FrameProducer;
use crate::media::types::{Frame, PlayDirection};

/// Turns a producer into a playable animation: direction, looping,
/// ping-pong reflection and random access.
pub struct Sequencer {
    producer: Box<dyn FrameProducer>,
    direction: PlayDirection,
    ping_pong: bool,
    current: Option<Frame>,
    /// Times the sequence wrapped or reflected.
    loops: u64,
    rng: StdRng,
}

impl Sequencer {
    pub fn new(producer: impl FrameProducer + 'static) -> Self {
        Self::from_boxed(Box::new(producer))
    }

    pub fn from_boxed(producer: Box<dyn FrameProducer>) -> Self {
        Self {
            producer,
            direction: PlayDirection::Forward,
            ping_pong: false,
            current: None,
            loops: 0,
            rng: StdRng::from_entropy(),
        }
    }

    /// Deterministic random jumps.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    #[must_use]
    pub fn with_direction(mut self, direction: PlayDirection) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn with_ping_pong(mut self, ping_pong: bool) -> Self {
        self.ping_pong = ping_pong;
        self
    }

    pub fn direction(&self) -> PlayDirection {
        self.direction
    }

    pub fn set_direction(&mut self, direction: PlayDirection) {
        self.direction = direction;
    }

    pub fn is_ping_pong(&self) -> bool {
        self.ping_pong
    }

    pub fn set_ping_pong(&mut self, ping_pong: bool) {
        self.ping_pong = ping_pong;
    }

    pub fn current_frame(&self) -> Option<&Frame> {
        self.current.as_ref()
    }

    pub fn loop_count(&self) -> u64 {
        self.loops
    }

    pub fn width(&self) -> u32 {
        self.producer.width()
    }

    pub fn height(&self) -> u32 {
        self.producer.height()
    }

    pub fn known_num_frames(&self) -> Option<usize> {
        self.producer.known_num_frames()
    }

    pub fn num_frames(&mut self) -> Option<usize> {
        self.producer.num_frames()
    }

    pub fn is_reverse_supported(&self) -> bool {
        self.producer.is_reverse_supported()
    }

    /// Advance one frame in the current direction, handling the end of the
    /// sequence. Returns false when no frame can be produced at all.
    pub fn step(&mut self) -> bool {
        self.step_in(self.direction, self.ping_pong)
    }

    /// One step against the current direction. Wraps at the ends.
    pub fn step_back(&mut self) -> bool {
        self.step_in(self.direction.reversed(), false)
    }

    /// Rewind so the next forward step yields frame 0.
    pub fn reset(&mut self) {
        self.producer.reset_to_zero();
        self.current = None;
    }

    /// Pick a uniformly random frame and position so the next `step` yields it.
    pub fn random_step(&mut self) -> Result<usize, PlaybackError> {
        let count = self.frame_count_for_seek()?;
        let index = self.rng.gen_range(0..count);
        self.position_before(index, count)?;
        log::debug!("Random jump to frame {index} of {count}");
        Ok(index)
    }

    /// Position so the next `step` yields `index`.
    pub fn jump_to(&mut self, index: usize) -> Result<(), PlaybackError> {
        let count = self.frame_count_for_seek()?;
        if index >= count {
            return Err(PlaybackError::InvalidIndex { index, count });
        }
        self.position_before(index, count)
    }

    fn step_in(&mut self, direction: PlayDirection, reflect: bool) -> bool {
        let backward = direction == PlayDirection::Backward && self.producer.is_reverse_supported();
        let frame = if backward {
            match self.producer.prev_frame() {
                Some(frame) => Some(frame),
                None => {
                    let frame = if reflect {
                        self.direction = PlayDirection::Forward;
                        self.reflect_at_start()
                    } else {
                        self.producer.reset_to_end();
                        self.producer.prev_frame()
                    };
                    self.count_loop(frame.is_some());
                    frame
                }
            }
        } else {
            match self.producer.next_frame() {
                Some(frame) => Some(frame),
                None => {
                    // A lazy producer can only reverse once the pass just ended
                    let frame = if reflect && self.producer.is_reverse_supported() {
                        self.direction = PlayDirection::Backward;
                        self.reflect_at_end()
                    } else {
                        self.producer.reset_to_zero();
                        self.producer.next_frame()
                    };
                    self.count_loop(frame.is_some());
                    frame
                }
            }
        };
        self.current = frame;
        self.current.is_some()
    }

    fn count_loop(&mut self, wrapped: bool) {
        if wrapped {
            self.loops += 1;
        }
    }

    /// Turn around at the last frame without showing it twice.
    fn reflect_at_end(&mut self) -> Option<Frame> {
        let last = self.producer.num_frames()?.checked_sub(1)?;
        self.producer.reset_to(last).ok()?;
        self.producer.prev_frame().or_else(|| {
            self.producer.reset_to_zero();
            self.producer.next_frame()
        })
    }

    /// Turn around at frame 0 without showing it twice.
    fn reflect_at_start(&mut self) -> Option<Frame> {
        self.producer.reset_to(0).ok()?;
        self.producer.next_frame().or_else(|| {
            self.producer.reset_to_end();
            self.producer.prev_frame()
        })
    }

    fn frame_count_for_seek(&mut self) -> Result<usize, PlaybackError> {
        match self.producer.num_frames() {
            Some(0) => Err(PlaybackError::Unsupported("random access on an empty sequence")),
            Some(count) => Ok(count),
            None => Err(PlaybackError::Unsupported(
                "random access needs a known frame count",
            )),
        }
    }

    fn position_before(&mut self, index: usize, count: usize) -> Result<(), PlaybackError> {
        let backward =
            self.direction == PlayDirection::Backward && self.producer.is_reverse_supported();
        if backward {
            if index + 1 >= count {
                self.producer.reset_to_end();
                Ok(())
            } else {
                self.producer.reset_to(index + 1)
            }
        } else if index == 0 {
            self.producer.reset_to_zero();
            Ok(())
        } else {
            self.producer.reset_to(index - 1)
        }
    }
}
