//! Image decoding off the frame thread.
//!
//! Assets are decoded to upright RGBA8 pixels, EXIF orientation applied, so
//! the renderer only has to upload them.

use std::collections::VecDeque;
use std::io::Cursor;
use std::sync::{Arc, Mutex, PoisonError};

use exif::{In, Reader, Tag, Value};
use image::DynamicImage;
use tracing::{debug, warn};

use crate::asset::AssetRef;
use crate::constants::DECODED_CACHE_LIMIT;

/// Upright pixels of one asset, four bytes per pixel, rows top to bottom.
#[derive(Clone, PartialEq, Eq)]
pub struct DecodedImage {
    pub width: u32,
    pub height: u32,
    pub rgba: Vec<u8>,
}

impl std::fmt::Debug for DecodedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodedImage")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.rgba.len())
            .finish()
    }
}

/// Decodes any supported format, sniffing it from the bytes.
///
/// Flipped orientations (2, 4, 5, 7) are kept as stored.
pub fn decode_image(bytes: &[u8]) -> image::ImageResult<DecodedImage> {
    let image = image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()?
        .decode()?;

    let image = match exif_orientation(bytes) {
        3 => image.rotate180(),
        6 => image.rotate90(),
        8 => image.rotate270(),
        1 => image,
        other => {
            warn!(orientation = other, "unsupported EXIF orientation");
            image
        }
    };
    Ok(into_decoded(image))
}

fn into_decoded(image: DynamicImage) -> DecodedImage {
    let rgba = image.into_rgba8();
    DecodedImage {
        width: rgba.width(),
        height: rgba.height(),
        rgba: rgba.into_raw(),
    }
}

// 1 when absent or unreadable.
fn exif_orientation(bytes: &[u8]) -> u16 {
    match Reader::new().read_from_container(&mut Cursor::new(bytes)) {
        Ok(exif) => match exif.get_field(Tag::Orientation, In::PRIMARY).map(|f| &f.value) {
            Some(Value::Short(values)) if !values.is_empty() => values[0],
            _ => 1,
        },
        Err(e) => {
            debug!(error = %e, "no usable EXIF data");
            1
        }
    }
}

/// Decoded assets waiting to be uploaded by the renderer.
///
/// Shared between preload tasks and the frame loop. Only the most recent
/// entries are kept; a superseded load that finishes late pushes out older ones.
#[derive(Clone, Default)]
pub struct DecodedCache {
    entries: Arc<Mutex<VecDeque<(AssetRef, DecodedImage)>>>,
}

impl DecodedCache {
    pub fn insert(&self, asset: AssetRef, image: DecodedImage) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|(cached, _)| *cached != asset);
        entries.push_back((asset, image));
        while entries.len() > DECODED_CACHE_LIMIT {
            entries.pop_front();
        }
    }

    /// Removes and returns the pixels for `asset`, if decoded.
    pub fn take(&self, asset: &AssetRef) -> Option<DecodedImage> {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        let position = entries.iter().position(|(cached, _)| cached == asset)?;
        entries.remove(position).map(|(_, image)| image)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
