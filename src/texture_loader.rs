use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use carousel::decode::{DecodedImage, decode_image};
use raylib::prelude::*;

/// Reads and decodes an image file on the calling thread.
pub fn decode_file(path: &Path) -> Result<DecodedImage> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    decode_image(&bytes).with_context(|| format!("failed to decode {}", path.display()))
}

/// Uploads already decoded RGBA pixels into a new texture.
pub fn upload_texture(rl: &mut RaylibHandle, thread: &RaylibThread, image: &DecodedImage) -> Result<Texture2D> {
    let width = i32::try_from(image.width).context("image too wide")?;
    let height = i32::try_from(image.height).context("image too tall")?;

    // A blank RGBA8 image only sizes the texture; the pixels follow.
    let blank = Image::gen_image_color(width, height, Color::BLANK);
    let mut texture = rl
        .load_texture_from_image(thread, &blank)
        .map_err(|e| anyhow::anyhow!("failed to create texture: {e}"))?;
    texture
        .update_texture(&image.rgba)
        .map_err(|e| anyhow::anyhow!("failed to upload pixels: {e}"))?;
    Ok(texture)
}
