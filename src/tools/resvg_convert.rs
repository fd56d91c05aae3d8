use std::path::Path;
use std::sync::Arc;

use anyhow::{Context as _, anyhow};

use crate::tools::traits::{RasterConverter, ToolResult};

/// Largest raster edge the converter will allocate.
const MAX_DIM: u32 = 8_192;

/// In-process SVG→PNG converter built on `usvg` + `resvg`.
///
/// The font database is loaded once and shared by every conversion.
#[derive(Clone)]
pub struct ResvgConverter {
    fontdb: Arc<usvg::fontdb::Database>,
    scale: f32,
}

impl ResvgConverter {
    pub fn new() -> Self {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        Self {
            fontdb: Arc::new(db),
            scale: 1.0,
        }
    }

    /// Rasterize at `scale` times the SVG's intrinsic size.
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = if scale.is_finite() && scale > 0.0 {
            scale
        } else {
            1.0
        };
        self
    }

    /// Rasterize SVG bytes into straight-alpha RGBA8.
    pub fn rasterize(&self, svg: &[u8]) -> anyhow::Result<image::RgbaImage> {
        let opts = usvg::Options {
            fontdb: Arc::clone(&self.fontdb),
            ..Default::default()
        };
        let tree = usvg::Tree::from_data(svg, &opts).context("parse svg tree")?;

        let size = tree.size();
        let to_px = |v: f32| -> anyhow::Result<u32> {
            let px = (v * self.scale).ceil();
            if !px.is_finite() || px < 1.0 || px > MAX_DIM as f32 {
                return Err(anyhow!("svg raster size {px} out of range (1..={MAX_DIM})"));
            }
            Ok(px as u32)
        };
        let (w, h) = (to_px(size.width())?, to_px(size.height())?);

        let mut pixmap = resvg::tiny_skia::Pixmap::new(w, h)
            .ok_or_else(|| anyhow!("failed to allocate {w}x{h} pixmap"))?;
        let xform = resvg::tiny_skia::Transform::from_scale(
            w as f32 / size.width(),
            h as f32 / size.height(),
        );
        resvg::render(&tree, xform, &mut pixmap.as_mut());

        let mut rgba = Vec::with_capacity((w * h * 4) as usize);
        for px in pixmap.pixels() {
            let c = px.demultiply();
            rgba.extend_from_slice(&[c.red(), c.green(), c.blue(), c.alpha()]);
        }
        image::RgbaImage::from_raw(w, h, rgba).ok_or_else(|| anyhow!("pixmap size mismatch"))
    }
}

impl Default for ResvgConverter {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ResvgConverter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgConverter")
            .field("font_faces", &self.fontdb.len())
            .field("scale", &self.scale)
            .finish()
    }
}

impl RasterConverter for ResvgConverter {
    fn convert(&self, vector: &Path, dest: &Path) -> ToolResult {
        let bytes = std::fs::read(vector)
            .with_context(|| format!("read svg '{}'", vector.display()))?;
        let img = self.rasterize(&bytes)?;
        img.save_with_format(dest, image::ImageFormat::Png)
            .with_context(|| format!("write png '{}'", dest.display()))?;
        Ok(())
    }
}
