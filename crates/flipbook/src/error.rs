use thiserror::Error;

/// Failures while pulling frames out of a bitstream.
#[derive(Debug, Error)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("GIF decode error: {0}")]
    Gif(#[from] gif::DecodingError),

    #[error("image decode error: {0}")]
    Image(#[from] image::ImageError),

    #[error("pixel block {width}x{height} needs {expected} bytes, got {actual}")]
    BlockSize {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    #[error("frame has an empty pixel block")]
    EmptyBlock,
}

/// Errors returned by producers, the store and the sequencer.
#[derive(Debug, Error)]
pub enum PlaybackError {
    #[error("frame index {index} out of range (frame count {count})")]
    InvalidIndex { index: usize, count: usize },

    #[error("unsupported: {0}")]
    Unsupported(&'static str),

    #[error(transparent)]
    Decode(#[from] DecodeError),
}
