//! Frame playback for GIF-style animations.
//!
//! Frames are decoded lazily from a [`FrameDecoder`], reconstructed on a
//! persistent canvas according to each frame's disposal rule, and stepped
//! forward, backward, randomly or ping-pong by a [`Sequencer`]. A
//! [`PlaybackDriver`] runs the sequencer on its own thread and hands finished
//! frames to the display side through a [`DoubleBuffer`].
//!
//! ```no_run
//! use flipbook::media::open_animation;
//! use flipbook::{PlaybackDriver, Sequencer};
//!
//! let producer = open_animation("spinner.gif".as_ref(), false)?;
//! let driver = PlaybackDriver::spawn(Sequencer::from_boxed(producer).with_ping_pong(true), None)?;
//! driver.play();
//! let front = driver.buffer();
//! let image = front.front_buffer();
//! println!("{}x{}", image.width, image.height);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod error;
pub mod media;
pub mod playback;
pub mod settings;

pub use error::{DecodeError, PlaybackError};
pub use media::canvas::{Canvas, PixelBuffer};
pub use media::decoder::{FrameDecoder, GifDecoder, MemoryDecoder};
pub use media::producer::{ArrayProducer, Cursor, FrameProducer, LazyProducer};
pub use media::store::FrameStore;
pub use media::types::{Disposal, Frame, FrameInfo, PlayDirection, RawFrame, Rect};
pub use playback::double_buffer::{BufferSlot, DoubleBuffer};
pub use playback::driver::{FrameCallback, PlaybackDriver};
pub use playback::sequencer::Sequencer;
pub use playback::{PlaybackEvent, PlaybackState};
pub use settings::PlaybackSettings;
