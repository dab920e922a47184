use std::path::{Path, PathBuf};

use anyhow::Result;
use carousel::decode::DecodedCache;
use carousel::{AssetRef, Indicator};
use raylib::prelude::*;
use tracing::{debug, warn};

use crate::texture_loader::{decode_file, upload_texture};

const FILL: f32 = 0.9;           // Largest share of the window an asset may cover
const DOT_RADIUS: f32 = 6.0;
const DOT_SPACING: f32 = 24.0;
const DOT_MARGIN: f32 = 24.0;    // Distance of the dot row from the bottom edge
const EDGE_ZONE: f32 = 0.1;      // Share of the width that acts as prev/next button

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    Prev,
    Next,
    Indicator(usize),
}

/// The on-screen image: one texture for whatever the carousel currently displays.
pub struct Stage {
    root: PathBuf,
    decoded: DecodedCache,
    current: Option<(AssetRef, Texture2D)>,
    failed: Option<AssetRef>,
}

impl Stage {
    pub fn new(root: &Path, decoded: DecodedCache) -> Self {
        Self {
            root: root.to_path_buf(),
            decoded,
            current: None,
            failed: None,
        }
    }

    /// Uploads a texture for `displayed` if it changed. On failure the previous
    /// texture stays up and the same asset is not retried.
    pub fn sync(&mut self, rl: &mut RaylibHandle, thread: &RaylibThread, displayed: Option<&AssetRef>) {
        let Some(asset) = displayed else {
            return;
        };
        if self.current.as_ref().map(|(a, _)| a) == Some(asset) || self.failed.as_ref() == Some(asset) {
            return;
        }

        match self.texture_for(rl, thread, asset) {
            Ok(texture) => {
                self.current = Some((asset.clone(), texture));
                self.failed = None;
            }
            Err(e) => {
                warn!(%asset, error = %e, "cannot display asset");
                self.failed = Some(asset.clone());
            }
        }
    }

    // Preloaded pixels when available. The first asset is shown without a
    // preload, so it is decoded here.
    fn texture_for(&self, rl: &mut RaylibHandle, thread: &RaylibThread, asset: &AssetRef) -> Result<Texture2D> {
        let image = match self.decoded.take(asset) {
            Some(image) => image,
            None => {
                debug!(%asset, "not preloaded, decoding on the frame thread");
                decode_file(&self.root.join(asset.as_str()))?
            }
        };
        upload_texture(rl, thread, &image)
    }

    pub fn draw(&self, d: &mut RaylibDrawHandle, opacity: f32) {
        let Some((_, texture)) = &self.current else {
            return;
        };

        let screen_width = d.get_screen_width() as f32;
        let screen_height = d.get_screen_height() as f32;

        let tex_width = texture.width() as f32;
        let tex_height = texture.height() as f32;
        let scale = fit_scale(tex_width, tex_height, screen_width, screen_height);

        let scaled_width = tex_width * scale;
        let scaled_height = tex_height * scale;

        let alpha = (opacity.clamp(0.0, 1.0) * 255.0).round() as u8;

        d.draw_texture_pro(
            texture,
            Rectangle::new(0.0, 0.0, tex_width, tex_height),
            Rectangle::new(
                (screen_width - scaled_width) * 0.5,
                (screen_height - scaled_height) * 0.5,
                scaled_width,
                scaled_height,
            ),
            Vector2::new(0.0, 0.0),
            0.0,
            Color::new(255, 255, 255, alpha),
        );
    }
}

// Never upscale; shrink so both sides fit within FILL of the window.
fn fit_scale(tex_width: f32, tex_height: f32, screen_width: f32, screen_height: f32) -> f32 {
    if tex_width <= 0.0 || tex_height <= 0.0 {
        return 1.0;
    }
    (screen_width * FILL / tex_width)
        .min(screen_height * FILL / tex_height)
        .min(1.0)
}

fn indicator_centers(count: usize, screen_width: f32, screen_height: f32) -> Vec<Vector2> {
    let row_width = DOT_SPACING * count.saturating_sub(1) as f32;
    let start_x = (screen_width - row_width) * 0.5;
    let y = screen_height - DOT_MARGIN;
    (0..count)
        .map(|i| Vector2::new(start_x + DOT_SPACING * i as f32, y))
        .collect()
}

/// What a click at `point` activates. Indicators take precedence over the edge zones.
pub fn hit_test(point: Vector2, indicator_count: usize, screen_width: f32, screen_height: f32) -> Option<Hit> {
    let reach = DOT_RADIUS + 4.0;
    let dot = indicator_centers(indicator_count, screen_width, screen_height)
        .iter()
        .position(|c| (c.x - point.x).hypot(c.y - point.y) <= reach);
    if let Some(index) = dot {
        return Some(Hit::Indicator(index));
    }

    if point.x < screen_width * EDGE_ZONE {
        Some(Hit::Prev)
    } else if point.x > screen_width * (1.0 - EDGE_ZONE) {
        Some(Hit::Next)
    } else {
        None
    }
}

pub fn draw_controls(d: &mut RaylibDrawHandle, indicators: &[Indicator]) {
    if indicators.is_empty() {
        return;
    }
    let screen_width = d.get_screen_width() as f32;
    let screen_height = d.get_screen_height() as f32;

    let arrow_y = (screen_height * 0.5) as i32 - 20;
    d.draw_text("<", (screen_width * EDGE_ZONE * 0.4) as i32, arrow_y, 40, Color::LIGHTGRAY);
    d.draw_text(">", (screen_width * (1.0 - EDGE_ZONE * 0.6)) as i32, arrow_y, 40, Color::LIGHTGRAY);

    let centers = indicator_centers(indicators.len(), screen_width, screen_height);
    for (indicator, center) in indicators.iter().zip(centers) {
        let color = if indicator.active { Color::WHITE } else { Color::GRAY };
        d.draw_circle_v(center, DOT_RADIUS, color);
    }
}
