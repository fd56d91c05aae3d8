use std::path::Path;
use std::sync::Arc;

use crate::foundation::core::Orientation;
use crate::foundation::error::ToolError;
use crate::game::model::BoardState;
use crate::palette::theme::ThemeColors;

pub type ToolResult = Result<(), ToolError>;

/// Writes a vector (SVG) description of one board state to `dest`.
pub trait Renderer: Send + Sync {
    fn render(
        &self,
        state: &BoardState,
        orientation: Orientation,
        colors: ThemeColors,
        dest: &Path,
    ) -> ToolResult;
}

/// Converts the vector file at `vector` into a raster (PNG) file at `dest`.
pub trait RasterConverter: Send + Sync {
    fn convert(&self, vector: &Path, dest: &Path) -> ToolResult;
}

/// Burns the two player labels onto the raster at `raster`, in place.
pub trait Annotator: Send + Sync {
    fn annotate(&self, raster: &Path, white: &str, black: &str) -> ToolResult;
}

/// Burns the game outcome onto the final raster, in place.
pub trait OutcomeStamper: Send + Sync {
    fn stamp(&self, raster: &Path, outcome: &str) -> ToolResult;
}

/// Annotator/stamper that leaves the raster untouched.
#[derive(Clone, Copy, Debug, Default)]
pub struct Noop;

impl Annotator for Noop {
    fn annotate(&self, _raster: &Path, _white: &str, _black: &str) -> ToolResult {
        Ok(())
    }
}

impl OutcomeStamper for Noop {
    fn stamp(&self, _raster: &Path, _outcome: &str) -> ToolResult {
        Ok(())
    }
}

/// The set of collaborators one pipeline run calls into.
#[derive(Clone)]
pub struct Toolkit {
    pub renderer: Arc<dyn Renderer>,
    pub converter: Arc<dyn RasterConverter>,
    pub annotator: Arc<dyn Annotator>,
    pub stamper: Arc<dyn OutcomeStamper>,
}

impl Toolkit {
    pub fn new(
        renderer: Arc<dyn Renderer>,
        converter: Arc<dyn RasterConverter>,
        annotator: Arc<dyn Annotator>,
        stamper: Arc<dyn OutcomeStamper>,
    ) -> Self {
        Self {
            renderer,
            converter,
            annotator,
            stamper,
        }
    }

    /// In-process toolkit: built-in SVG board, resvg rasterization, no annotation.
    pub fn builtin() -> Self {
        Self::new(
            Arc::new(crate::tools::board_svg::SvgBoardRenderer::default()),
            Arc::new(crate::tools::resvg_convert::ResvgConverter::new()),
            Arc::new(Noop),
            Arc::new(Noop),
        )
    }

    pub fn with_converter(mut self, converter: Arc<dyn RasterConverter>) -> Self {
        self.converter = converter;
        self
    }

    pub fn with_annotator(mut self, annotator: Arc<dyn Annotator>) -> Self {
        self.annotator = annotator;
        self
    }

    pub fn with_stamper(mut self, stamper: Arc<dyn OutcomeStamper>) -> Self {
        self.stamper = stamper;
        self
    }
}

impl std::fmt::Debug for Toolkit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toolkit").finish_non_exhaustive()
    }
}
