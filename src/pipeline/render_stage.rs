use std::sync::Arc;

use crate::foundation::core::Orientation;
use crate::foundation::error::{BoardgifError, BoardgifResult};
use crate::game::model::BoardState;
use crate::palette::theme::ThemeColors;
use crate::pipeline::scratch::StagedArtifact;
use crate::tools::traits::Toolkit;

/// Per-run inputs shared by every render job. Immutable once the run starts.
#[derive(Clone, Debug)]
pub struct RenderContext {
    pub toolkit: Toolkit,
    pub orientation: Orientation,
    pub colors: ThemeColors,
    pub white_label: Arc<str>,
    pub black_label: Arc<str>,
    pub remove_vector_after_convert: bool,
}

/// Produce the staged raster for one board state: render, convert, annotate.
///
/// Each step's collaborator error is wrapped with the frame index; nothing is retried.
#[tracing::instrument(level = "trace", skip_all, fields(index = artifact.index))]
pub fn render_frame(
    ctx: &RenderContext,
    state: &BoardState,
    artifact: &StagedArtifact,
) -> BoardgifResult<()> {
    let index = artifact.index;

    ctx.toolkit
        .renderer
        .render(state, ctx.orientation, ctx.colors, &artifact.vector_path)
        .map_err(|source| BoardgifError::Render { index, source })?;

    ctx.toolkit
        .converter
        .convert(&artifact.vector_path, &artifact.raster_path)
        .map_err(|source| BoardgifError::Convert { index, source })?;

    if ctx.remove_vector_after_convert {
        // The scratch guard still owns the path; a failed delete is retried at cleanup.
        if let Err(e) = std::fs::remove_file(&artifact.vector_path) {
            tracing::debug!(index, error = %e, "vector file not removed early");
        }
    }

    ctx.toolkit
        .annotator
        .annotate(&artifact.raster_path, &ctx.white_label, &ctx.black_label)
        .map_err(|source| BoardgifError::Annotate { index, source })?;

    Ok(())
}
