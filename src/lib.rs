//! boardgif renders the positions of a recorded board game into an animated GIF.
//!
//! Every position is rendered to a scratch raster in parallel, the final one is stamped with
//! the result, and the rasters are quantized against one shared palette and assembled in game
//! order. Entry points:
//!
//! - [`produce_animation`] fetches a game from a [`GameProvider`] and writes the GIF
//! - [`PipelineRun`] runs an already-loaded [`Game`]
//! - [`AnimationRequest::normalize`] applies the request-boundary defaults
#![forbid(unsafe_code)]

mod foundation;

/// Bounded job execution.
pub mod exec;
/// Games and game providers.
pub mod game;
/// Tracing subscriber setup for binaries.
pub mod logging;
/// Board themes and the shared palette.
pub mod palette;
/// The render/encode pipeline.
pub mod pipeline;
pub mod request;
/// External collaborators.
pub mod tools;

pub use crate::exec::executor::{BoundedExecutor, ExecutorStats};
pub use crate::foundation::core::{FrameDelay, Orientation, RunId, Speed};
pub use crate::foundation::error::{BoardgifError, BoardgifResult, ToolError};
pub use crate::game::model::{BoardState, Game, Outcome, Player};
pub use crate::game::provider::{GameProvider, InMemoryProvider, JsonGameProvider};
pub use crate::palette::shared::SharedPalette;
pub use crate::palette::theme::{Rgb8, Theme, ThemeColors};
pub use crate::pipeline::run::{
    AnimationReceipt, PipelineOpts, PipelineRun, RunSettings, produce_animation,
};
pub use crate::request::{AnimationParams, AnimationRequest, FailureResponse};
pub use crate::tools::traits::{Annotator, OutcomeStamper, RasterConverter, Renderer, Toolkit};
