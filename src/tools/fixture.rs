//! Deterministic stand-ins for the external collaborators.
//!
//! Used by tests and for exercising the pipeline without image tooling installed. Board states
//! are expected to be `frame-<n>` (see [`frame_state`]); each frame rasterizes to a solid
//! web-safe color derived from `n`, so the decoded animation reveals frame order directly.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use anyhow::{Context as _, anyhow};

use crate::foundation::core::Orientation;
use crate::foundation::error::{BoardgifResult, ToolError};
use crate::game::model::{BoardState, Game, Outcome};
use crate::palette::theme::{Rgb8, ThemeColors};
use crate::tools::traits::{
    Annotator, OutcomeStamper, RasterConverter, Renderer, ToolResult, Toolkit,
};

/// Palette index the fixture stamper paints the final frame with (web-safe white).
pub const STAMPED_PALETTE_INDEX: u8 = 215;

/// Board state recognized by the fixtures as frame `i`.
pub fn frame_state(i: usize) -> BoardState {
    BoardState::new(format!("frame-{i}"))
}

/// A game of `n` fixture states. `n == 0` is rejected like any empty game.
pub fn fixture_game(id: &str, n: usize, outcome: Outcome) -> BoardgifResult<Game> {
    let mut tags = BTreeMap::new();
    tags.insert("White".to_owned(), "Alice".to_owned());
    tags.insert("WhiteElo".to_owned(), "1500".to_owned());
    tags.insert("Black".to_owned(), "Bob".to_owned());
    Game::new(id, (0..n).map(frame_state).collect(), tags, outcome)
}

/// Web-safe palette index frame `i` is painted with. Never equals [`STAMPED_PALETTE_INDEX`].
pub fn fixture_palette_index(i: usize) -> u8 {
    (i % 215) as u8
}

fn web_safe(idx: u8) -> Rgb8 {
    let idx = idx as u16;
    let step = |v: u16| (v * 0x33) as u8;
    Rgb8::new(step(idx / 36), step((idx / 6) % 6), step(idx % 6))
}

fn parse_frame(text: &str) -> Option<usize> {
    text.trim().strip_prefix("frame-")?.parse().ok()
}

/// Knobs for [`FixtureTools`].
#[derive(Clone, Debug)]
pub struct FixtureOpts {
    pub width: u32,
    pub height: u32,
    /// Upper bound of the per-frame artificial delay, to shuffle completion order.
    pub jitter_ms: u64,
    pub fail_render_at: Option<usize>,
    pub fail_convert_at: Option<usize>,
    /// Write undecodable bytes instead of a PNG for this frame.
    pub corrupt_raster_at: Option<usize>,
    pub fail_annotate_at: Option<usize>,
    pub fail_stamp: bool,
}

impl Default for FixtureOpts {
    fn default() -> Self {
        Self {
            width: 8,
            height: 8,
            jitter_ms: 0,
            fail_render_at: None,
            fail_convert_at: None,
            corrupt_raster_at: None,
            fail_annotate_at: None,
            fail_stamp: false,
        }
    }
}

/// What the fixtures were asked to do.
#[derive(Debug, Default)]
pub struct FixtureCalls {
    pub renders: AtomicUsize,
    pub converts: AtomicUsize,
    pub annotates: AtomicUsize,
    pub stamps: AtomicUsize,
    annotations: Mutex<Vec<(String, String)>>,
    stamped: Mutex<Vec<(PathBuf, String)>>,
    orientations: Mutex<Vec<Orientation>>,
    colors: Mutex<Vec<ThemeColors>>,
}

impl FixtureCalls {
    pub fn annotations(&self) -> Vec<(String, String)> {
        self.annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn stamped(&self) -> Vec<(PathBuf, String)> {
        self.stamped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn orientations(&self) -> Vec<Orientation> {
        self.orientations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn theme_colors(&self) -> Vec<ThemeColors> {
        self.colors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// Implements every collaborator trait with deterministic file output.
#[derive(Debug, Default)]
pub struct FixtureTools {
    opts: FixtureOpts,
    calls: FixtureCalls,
}

impl FixtureTools {
    pub fn new(opts: FixtureOpts) -> Arc<Self> {
        Arc::new(Self {
            opts,
            calls: FixtureCalls::default(),
        })
    }

    pub fn calls(&self) -> &FixtureCalls {
        &self.calls
    }

    /// A toolkit routing every collaborator to `tools`.
    pub fn toolkit(tools: &Arc<Self>) -> Toolkit {
        Toolkit::new(tools.clone(), tools.clone(), tools.clone(), tools.clone())
    }

    fn jitter(&self, i: usize) {
        if self.opts.jitter_ms == 0 {
            return;
        }
        // Pseudo-random per-frame delay so completions arrive out of order.
        let span = self.opts.jitter_ms + 1;
        let ms = ((i as u64).wrapping_mul(7919) ^ 0x5a) % span;
        std::thread::sleep(Duration::from_millis(ms));
    }

    fn solid_png(&self, color: Rgb8, dest: &Path) -> ToolResult {
        let img = image::RgbaImage::from_pixel(
            self.opts.width,
            self.opts.height,
            image::Rgba([color.r, color.g, color.b, 255]),
        );
        img.save_with_format(dest, image::ImageFormat::Png)
            .with_context(|| format!("write fixture png '{}'", dest.display()))?;
        Ok(())
    }
}

impl Renderer for FixtureTools {
    fn render(
        &self,
        state: &BoardState,
        orientation: Orientation,
        colors: ThemeColors,
        dest: &Path,
    ) -> ToolResult {
        self.calls.renders.fetch_add(1, Ordering::SeqCst);
        let i = parse_frame(&state.fen)
            .ok_or_else(|| anyhow!("fixture state '{}' is not frame-<n>", state.fen))?;
        self.calls
            .orientations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(orientation);
        self.calls
            .colors
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(colors);

        self.jitter(i);
        if self.opts.fail_render_at == Some(i) {
            return Err(ToolError::Other(anyhow!("injected render failure")));
        }
        std::fs::write(dest, &state.fen)?;
        Ok(())
    }
}

impl RasterConverter for FixtureTools {
    fn convert(&self, vector: &Path, dest: &Path) -> ToolResult {
        self.calls.converts.fetch_add(1, Ordering::SeqCst);
        let text = std::fs::read_to_string(vector)?;
        let i = parse_frame(&text).ok_or_else(|| anyhow!("unexpected vector content"))?;
        if self.opts.fail_convert_at == Some(i) {
            return Err(ToolError::Other(anyhow!("injected convert failure")));
        }
        if self.opts.corrupt_raster_at == Some(i) {
            std::fs::write(dest, b"definitely not a png")?;
            return Ok(());
        }
        self.solid_png(web_safe(fixture_palette_index(i)), dest)
    }
}

impl Annotator for FixtureTools {
    fn annotate(&self, raster: &Path, white: &str, black: &str) -> ToolResult {
        self.calls.annotates.fetch_add(1, Ordering::SeqCst);
        self.calls
            .annotations
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((white.to_owned(), black.to_owned()));

        if let Some(k) = self.opts.fail_annotate_at {
            let img = image::open(raster).context("open raster to annotate")?;
            let px = img.to_rgba8().get_pixel(0, 0).0;
            let target = web_safe(fixture_palette_index(k));
            if [px[0], px[1], px[2]] == [target.r, target.g, target.b] {
                return Err(ToolError::Other(anyhow!("injected annotate failure")));
            }
        }
        Ok(())
    }
}

impl OutcomeStamper for FixtureTools {
    fn stamp(&self, raster: &Path, outcome: &str) -> ToolResult {
        self.calls.stamps.fetch_add(1, Ordering::SeqCst);
        self.calls
            .stamped
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((raster.to_path_buf(), outcome.to_owned()));
        if self.opts.fail_stamp {
            return Err(ToolError::Other(anyhow!("injected stamp failure")));
        }
        if !raster.is_file() {
            return Err(ToolError::Other(anyhow!(
                "nothing to stamp at '{}'",
                raster.display()
            )));
        }
        self.solid_png(web_safe(STAMPED_PALETTE_INDEX), raster)
    }
}
