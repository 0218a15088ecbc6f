pub mod canvas;
pub mod decoder;
pub mod producer;
pub mod store;
pub mod types;

use std::path::Path;

use decoder::{GifDecoder, load_static_image};
use producer::{ArrayProducer, FrameProducer, LazyProducer};
use store::FrameStore;

use crate::error::DecodeError;

/// Open a GIF (streamed) or still image (single frame) as a producer.
///
/// `preload` decodes and composes every GIF frame up front; otherwise frames
/// are decoded as playback reaches them.
pub fn open_animation(path: &Path, preload: bool) -> Result<Box<dyn FrameProducer>, DecodeError> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    if ext != "gif" {
        let frame = load_static_image(path)?;
        log::info!(
            "Loaded still image {}: {}x{}",
            path.display(),
            frame.width(),
            frame.height()
        );
        return Ok(Box::new(ArrayProducer::new(vec![frame])));
    }

    let decoder = GifDecoder::open(path)?;
    let store = FrameStore::new(decoder);
    log::info!(
        "Opened GIF {}: {}x{}",
        path.display(),
        store.width(),
        store.height()
    );
    if preload {
        Ok(Box::new(ArrayProducer::from_store(store)))
    } else {
        Ok(Box::new(LazyProducer::new(store)))
    }
}
