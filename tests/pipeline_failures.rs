use std::path::PathBuf;
use std::sync::atomic::Ordering;

use boardgif::pipeline::scratch::files_for_run;
use boardgif::tools::fixture::{FixtureOpts, FixtureTools, fixture_game};
use boardgif::{
    BoardgifError, FailureResponse, GameProvider, InMemoryProvider, Outcome, PipelineOpts,
    PipelineRun, RunSettings, produce_animation,
};

fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!(
        "boardgif_{name}_{}_{}",
        std::process::id(),
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos()
    ))
}

fn opts(scratch: &PathBuf, cancel_on_failure: bool) -> PipelineOpts {
    PipelineOpts {
        max_concurrency: 4,
        scratch_dir: scratch.clone(),
        cancel_on_failure,
        remove_vector_after_convert: false,
    }
}

/// Run `n` fixture frames with `fixture`, expecting failure. Returns the error.
fn run_failing(name: &str, n: usize, fixture: FixtureOpts, cancel: bool) -> BoardgifError {
    let scratch = temp_dir(name);
    let tools = FixtureTools::new(fixture);
    let game = fixture_game("abcdefgh", n, Outcome::WhiteWon).unwrap();
    let run = PipelineRun::new(game, RunSettings::default(), opts(&scratch, cancel)).unwrap();

    let mut out = Vec::new();
    let err = run
        .execute(&FixtureTools::toolkit(&tools), &mut out)
        .unwrap_err();

    assert!(out.is_empty(), "{name}: partial output written");
    assert!(
        files_for_run(&scratch, run.run_id()).is_empty(),
        "{name}: scratch files left behind"
    );
    std::fs::remove_dir_all(&scratch).ok();
    err
}

#[test]
fn render_failure_aborts_without_output() {
    for cancel in [true, false] {
        let err = run_failing(
            "fail_render",
            20,
            FixtureOpts {
                fail_render_at: Some(7),
                ..FixtureOpts::default()
            },
            cancel,
        );
        assert!(matches!(err, BoardgifError::Render { index: 7, .. }), "{err}");
        assert_eq!(FailureResponse::from_error(&err).status, 500);
    }
}

#[test]
fn convert_failure_aborts_without_output() {
    let err = run_failing(
        "fail_convert",
        12,
        FixtureOpts {
            fail_convert_at: Some(0),
            ..FixtureOpts::default()
        },
        true,
    );
    assert!(matches!(err, BoardgifError::Convert { index: 0, .. }), "{err}");
}

#[test]
fn annotate_failure_aborts_without_output() {
    let err = run_failing(
        "fail_annotate",
        12,
        FixtureOpts {
            fail_annotate_at: Some(11),
            ..FixtureOpts::default()
        },
        false,
    );
    assert!(matches!(err, BoardgifError::Annotate { index: 11, .. }), "{err}");
}

#[test]
fn stamp_failure_aborts_before_encoding() {
    let scratch = temp_dir("fail_stamp");
    let tools = FixtureTools::new(FixtureOpts {
        fail_stamp: true,
        ..FixtureOpts::default()
    });
    let game = fixture_game("abcdefgh", 5, Outcome::Draw).unwrap();
    let run = PipelineRun::new(game, RunSettings::default(), opts(&scratch, true)).unwrap();

    let mut out = Vec::new();
    let err = run
        .execute(&FixtureTools::toolkit(&tools), &mut out)
        .unwrap_err();
    assert!(matches!(err, BoardgifError::Stamp(_)), "{err}");
    assert!(out.is_empty());
    // Every render ran before the stamp was attempted.
    assert_eq!(tools.calls().renders.load(Ordering::SeqCst), 5);
    assert_eq!(tools.calls().stamps.load(Ordering::SeqCst), 1);
    assert!(files_for_run(&scratch, run.run_id()).is_empty());
    std::fs::remove_dir_all(&scratch).ok();
}

#[test]
fn undecodable_raster_is_encode_error() {
    for cancel in [true, false] {
        let err = run_failing(
            "fail_encode",
            15,
            FixtureOpts {
                corrupt_raster_at: Some(4),
                ..FixtureOpts::default()
            },
            cancel,
        );
        assert!(matches!(err, BoardgifError::Encode { index: 4, .. }), "{err}");
    }
}

#[test]
fn stamp_is_skipped_when_rendering_failed() {
    let scratch = temp_dir("fail_no_stamp");
    let tools = FixtureTools::new(FixtureOpts {
        fail_render_at: Some(1),
        ..FixtureOpts::default()
    });
    let game = fixture_game("abcdefgh", 3, Outcome::Draw).unwrap();
    let run = PipelineRun::new(game, RunSettings::default(), opts(&scratch, true)).unwrap();
    let mut out = Vec::new();
    run.execute(&FixtureTools::toolkit(&tools), &mut out)
        .unwrap_err();
    assert_eq!(tools.calls().stamps.load(Ordering::SeqCst), 0);
    std::fs::remove_dir_all(&scratch).ok();
}

#[test]
fn empty_game_is_invalid() {
    let err = fixture_game("abcdefgh", 0, Outcome::Draw).unwrap_err();
    assert_eq!(FailureResponse::from_error(&err).status, 400);
}

#[test]
fn unknown_game_is_not_found_and_writes_nothing() {
    let scratch = temp_dir("fail_not_found");
    let tools = FixtureTools::new(FixtureOpts::default());
    let provider = InMemoryProvider::new();
    assert!(provider.fetch("zzzzzzzz").is_err());

    let mut out = Vec::new();
    let err = produce_animation(
        &provider,
        &FixtureTools::toolkit(&tools),
        "zzzzzzzz",
        RunSettings::default(),
        &opts(&scratch, true),
        &mut out,
    )
    .unwrap_err();
    assert!(err.is_provider_error());
    assert_eq!(FailureResponse::from_error(&err).status, 404);
    assert!(out.is_empty());
    assert_eq!(tools.calls().renders.load(Ordering::SeqCst), 0);
    std::fs::remove_dir_all(&scratch).ok();
}
