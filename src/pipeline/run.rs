use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use crate::exec::executor::BoundedExecutor;
use crate::exec::latch::FirstFailure;
use crate::foundation::core::{Orientation, RunId, Speed};
use crate::foundation::error::{BoardgifError, BoardgifResult};
use crate::game::model::Game;
use crate::game::provider::GameProvider;
use crate::palette::shared::SharedPalette;
use crate::palette::theme::Theme;
use crate::pipeline::assembler::assemble;
use crate::pipeline::collector::OrderedCollector;
use crate::pipeline::delay::schedule;
use crate::pipeline::encode_stage::encode_frame;
use crate::pipeline::render_stage::{RenderContext, render_frame};
use crate::pipeline::scratch::{ScratchSpace, StagedArtifact};
use crate::tools::traits::Toolkit;

/// Execution knobs for a [`PipelineRun`].
#[derive(Clone, Debug)]
pub struct PipelineOpts {
    /// Upper bound on jobs running at once, shared by both phases. Must be `>= 1`.
    pub max_concurrency: usize,
    pub scratch_dir: PathBuf,
    /// Skip not-yet-started jobs once any job of the run has failed.
    pub cancel_on_failure: bool,
    pub remove_vector_after_convert: bool,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            max_concurrency: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            scratch_dir: std::env::temp_dir(),
            cancel_on_failure: true,
            remove_vector_after_convert: true,
        }
    }
}

/// How the animation should look.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct RunSettings {
    pub theme: Theme,
    pub speed: Speed,
    pub orientation: Orientation,
}

/// What a successful run produced.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationReceipt {
    /// Canonical id of the rendered game.
    pub game_id: String,
    pub frames: usize,
    pub bytes_written: u64,
    pub run_id: RunId,
}

impl AnimationReceipt {
    /// Suggested download name for the animation.
    pub fn file_name(&self) -> String {
        format!("{}.gif", self.game_id)
    }
}

/// One end-to-end render of a game into an animation.
#[derive(Debug)]
pub struct PipelineRun {
    run_id: RunId,
    game: Game,
    settings: RunSettings,
    opts: PipelineOpts,
}

impl PipelineRun {
    pub fn new(game: Game, settings: RunSettings, opts: PipelineOpts) -> BoardgifResult<Self> {
        if game.is_empty() {
            return Err(BoardgifError::validation(format!(
                "game '{}' has no positions",
                game.id()
            )));
        }
        if opts.max_concurrency == 0 {
            return Err(BoardgifError::validation("max_concurrency must be >= 1"));
        }
        Ok(Self {
            run_id: RunId::generate(game.id()),
            game,
            settings,
            opts,
        })
    }

    /// Replace the generated run id (scratch files are named after it).
    pub fn with_run_id(mut self, run_id: RunId) -> Self {
        self.run_id = run_id;
        self
    }

    pub fn run_id(&self) -> &RunId {
        &self.run_id
    }

    pub fn game(&self) -> &Game {
        &self.game
    }

    pub fn settings(&self) -> RunSettings {
        self.settings
    }

    /// Render, stamp, encode and assemble, writing the animation to `out`.
    ///
    /// On any failure nothing is written to `out`. Scratch files of this run are removed before
    /// returning, whatever the outcome.
    #[tracing::instrument(skip_all, fields(run_id = %self.run_id, game = self.game.id()))]
    pub fn execute<W: Write + ?Sized>(
        &self,
        toolkit: &Toolkit,
        out: &mut W,
    ) -> BoardgifResult<AnimationReceipt> {
        let started = Instant::now();
        let n = self.game.len();
        tracing::info!(
            frames = n,
            theme = self.settings.theme.name(),
            speed = self.settings.speed.get(),
            reversed = self.settings.orientation.is_reversed(),
            max_concurrency = self.opts.max_concurrency,
            "animation run started"
        );

        // Declared before the executor so it is dropped after it: no job is still running
        // when the scratch files are deleted.
        let scratch = ScratchSpace::new(&self.opts.scratch_dir, self.run_id.clone())?;
        let exec = BoundedExecutor::new(self.opts.max_concurrency)?;

        let result = self.run_phases(toolkit, &exec, &scratch, out);
        exec.drain_all();
        let cleaned = scratch.cleanup();

        match &result {
            Ok(receipt) => tracing::info!(
                frames = receipt.frames,
                bytes = receipt.bytes_written,
                scratch_removed = cleaned.removed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "animation run finished"
            ),
            Err(err) => tracing::warn!(
                error = %err,
                scratch_removed = cleaned.removed,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "animation run failed"
            ),
        }
        result
    }

    fn run_phases<W: Write + ?Sized>(
        &self,
        toolkit: &Toolkit,
        exec: &BoundedExecutor,
        scratch: &ScratchSpace,
        out: &mut W,
    ) -> BoardgifResult<AnimationReceipt> {
        let n = self.game.len();
        let cancel = self.opts.cancel_on_failure;
        let colors = self.settings.theme.colors();

        let artifacts: Vec<StagedArtifact> = (0..n).map(|i| scratch.stage(i)).collect();

        // Phase 1: render every position into a staged raster.
        let ctx = Arc::new(RenderContext {
            toolkit: toolkit.clone(),
            orientation: self.settings.orientation,
            colors,
            white_label: Arc::from(self.game.white().label()),
            black_label: Arc::from(self.game.black().label()),
            remove_vector_after_convert: self.opts.remove_vector_after_convert,
        });
        let render_failure = Arc::new(FirstFailure::new());
        let panicked_before = exec.stats().panicked;

        for (state, artifact) in self.game.positions().iter().zip(&artifacts) {
            if cancel && render_failure.is_tripped() {
                break;
            }
            let ctx = Arc::clone(&ctx);
            let failure = Arc::clone(&render_failure);
            let state = state.clone();
            let artifact = artifact.clone();
            exec.submit(move || {
                if cancel && failure.is_tripped() {
                    return;
                }
                if let Err(err) = render_frame(&ctx, &state, &artifact) {
                    failure.record(err);
                }
            });
        }
        let stats = exec.drain_all();
        tracing::debug!(finished = stats.finished, "render phase drained");
        if stats.panicked > panicked_before {
            render_failure.record(BoardgifError::Other(anyhow::anyhow!(
                "{} render job(s) panicked",
                stats.panicked - panicked_before
            )));
        }
        if let Some(err) = render_failure.take() {
            return Err(err);
        }

        // Only after every render finished: the stamp mutates the artifact phase 2 reads.
        let last = &artifacts[n - 1];
        toolkit
            .stamper
            .stamp(&last.raster_path, self.game.outcome().label())
            .map_err(BoardgifError::Stamp)?;

        // Phase 2: decode and quantize every staged raster.
        let palette = Arc::new(SharedPalette::new(colors));
        let collector = Arc::new(OrderedCollector::new(n));
        let panicked_before = exec.stats().panicked;

        for artifact in artifacts {
            if cancel && collector.has_failed() {
                break;
            }
            let palette = Arc::clone(&palette);
            let collector = Arc::clone(&collector);
            exec.submit(move || {
                if cancel && collector.has_failed() {
                    return;
                }
                let result = encode_frame(&artifact, &palette);
                collector.deliver(artifact.index, result);
            });
        }
        let stats = exec.drain_all();
        tracing::debug!(
            finished = stats.finished,
            delivered = collector.delivered(),
            "encode phase drained"
        );
        if stats.panicked > panicked_before {
            collector.fail(BoardgifError::Other(anyhow::anyhow!(
                "{} encode job(s) panicked",
                stats.panicked - panicked_before
            )));
        }
        let frames = collector.finish()?;

        let delays = schedule(n, self.settings.speed);
        let bytes_written = assemble(&frames, &delays, &palette, out)?;

        Ok(AnimationReceipt {
            game_id: self.game.id().to_owned(),
            frames: n,
            bytes_written,
            run_id: self.run_id.clone(),
        })
    }
}

/// Fetch game `game_id` from `provider` and render it into `out`.
///
/// Provider failures surface unchanged ([`BoardgifError::GameNotFound`] or
/// [`BoardgifError::Provider`]); no run is started for them.
#[tracing::instrument(skip_all, fields(game_id))]
pub fn produce_animation<W: Write + ?Sized>(
    provider: &dyn GameProvider,
    toolkit: &Toolkit,
    game_id: &str,
    settings: RunSettings,
    opts: &PipelineOpts,
    out: &mut W,
) -> BoardgifResult<AnimationReceipt> {
    tracing::Span::current().record("game_id", game_id);
    let game = provider.fetch(game_id)?;
    PipelineRun::new(game, settings, opts.clone())?.execute(toolkit, out)
}
