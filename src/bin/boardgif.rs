use std::io::Write as _;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};

use boardgif::logging::{LogConfig, init_logging};
use boardgif::tools::command::CommandTool;
use boardgif::{
    AnimationRequest, FailureResponse, JsonGameProvider, PipelineOpts, Theme, Toolkit,
    produce_animation,
};

#[derive(Parser, Debug)]
#[command(name = "boardgif", version)]
struct Cli {
    /// Emit logs as JSON lines on stderr.
    #[arg(long, global = true)]
    log_json: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a recorded game into an animated GIF.
    Render(RenderArgs),
    /// List the available board themes.
    Themes,
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Game id (at least 8 characters; longer ids are matched on their first 8).
    #[arg(long)]
    game: String,

    /// Directory holding `<id>.json` game records.
    #[arg(long, default_value = "games")]
    games_dir: PathBuf,

    /// Output GIF path, or `-` for stdout.
    #[arg(long)]
    out: PathBuf,

    /// Playback speed in (0, 10]; anything else plays at 1.0.
    #[arg(long)]
    speed: Option<String>,

    /// Board theme; unknown names use brown.
    #[arg(long)]
    theme: Option<String>,

    /// Draw the board from black's side.
    #[arg(long)]
    reversed: bool,

    /// Maximum number of frames processed at once.
    #[arg(long)]
    concurrency: Option<usize>,

    /// Directory for intermediate files.
    #[arg(long)]
    scratch_dir: Option<PathBuf>,

    /// Vector→raster converter.
    #[arg(long, value_enum, default_value_t = ConverterChoice::Resvg)]
    converter: ConverterChoice,

    /// Custom converter command line (`{input}`, `{output}`); overrides `--converter`.
    #[arg(long)]
    convert_cmd: Option<String>,

    /// Annotation command line (`{raster}`, `{white}`, `{black}`).
    #[arg(long)]
    annotate_cmd: Option<String>,

    /// Outcome stamp command line (`{raster}`, `{outcome}`).
    #[arg(long)]
    stamp_cmd: Option<String>,

    /// Keep intermediate SVG files until the end of the run.
    #[arg(long)]
    keep_vectors: bool,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum ConverterChoice {
    /// In-process rasterization.
    Resvg,
    /// Headless inkscape (requires `inkscape` and `dbus-run-session` on PATH).
    Inkscape,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(&LogConfig {
        json: cli.log_json,
        ..LogConfig::default()
    });
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Themes => cmd_themes(),
    }
}

fn make_toolkit(args: &RenderArgs) -> anyhow::Result<Toolkit> {
    let mut toolkit = Toolkit::builtin();
    if let Some(line) = &args.convert_cmd {
        let tool = CommandTool::parse(line).context("parse --convert-cmd")?;
        toolkit = toolkit.with_converter(Arc::new(tool));
    } else if let ConverterChoice::Inkscape = args.converter {
        toolkit = toolkit.with_converter(Arc::new(CommandTool::inkscape()));
    }
    if let Some(line) = &args.annotate_cmd {
        let tool = CommandTool::parse(line).context("parse --annotate-cmd")?;
        toolkit = toolkit.with_annotator(Arc::new(tool));
    }
    if let Some(line) = &args.stamp_cmd {
        let tool = CommandTool::parse(line).context("parse --stamp-cmd")?;
        toolkit = toolkit.with_stamper(Arc::new(tool));
    }
    Ok(toolkit)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let request = AnimationRequest {
        id: args.game.clone(),
        reversed: args.reversed.then(|| "true".to_owned()),
        speed: args.speed.clone(),
        theme: args.theme.clone(),
    };
    let params = request.normalize()?;

    let mut opts = PipelineOpts::default();
    if let Some(n) = args.concurrency {
        opts.max_concurrency = n;
    }
    if let Some(dir) = &args.scratch_dir {
        opts.scratch_dir = dir.clone();
    }
    opts.remove_vector_after_convert = !args.keep_vectors;

    let toolkit = make_toolkit(&args)?;
    let provider = JsonGameProvider::new(&args.games_dir);

    // Buffered so a failed run never leaves a truncated file behind.
    let mut gif = Vec::new();
    let receipt = match produce_animation(
        &provider,
        &toolkit,
        &params.game_id,
        params.settings,
        &opts,
        &mut gif,
    ) {
        Ok(r) => r,
        Err(err) => {
            let resp = FailureResponse::from_error(&err);
            tracing::error!(status = resp.status, "{}", resp.message);
            return Err(err.into());
        }
    };

    if args.out.as_os_str() == "-" {
        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&gif).context("write gif to stdout")?;
        stdout.flush().context("flush stdout")?;
    } else {
        if let Some(parent) = args.out.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create output dir '{}'", parent.display()))?;
        }
        std::fs::write(&args.out, &gif)
            .with_context(|| format!("write gif '{}'", args.out.display()))?;
        eprintln!(
            "wrote {} ({} frames, {} bytes)",
            args.out.display(),
            receipt.frames,
            receipt.bytes_written
        );
    }
    Ok(())
}

fn cmd_themes() -> anyhow::Result<()> {
    for theme in Theme::ALL {
        let c = theme.colors();
        println!("{:<8} dark {}  light {}", theme.name(), c.dark.to_hex(), c.light.to_hex());
    }
    Ok(())
}
