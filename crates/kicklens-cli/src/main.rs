//! kicklens-cli: run the kick-analysis pipeline from the command line.
//!
//! Uploads a video to the collaborator server, extracts frames around a
//! timestamp, runs pose detection and direction prediction, then prints
//! the produced artifact URLs and the quadrant intensity grid.
//!
//! # Usage
//!
//! ```text
//! cargo run --bin kicklens-cli -- --timestamp 2.4 <VIDEO_PATH>
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::cell::RefCell;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use kicklens_pipeline::quadrant::{COLUMNS, ROWS};
use kicklens_pipeline::{
    Action, Command, Epoch, PipelineController, PipelineStage, Quadrant, QuadrantGrid,
    QuadrantVisualizer, RecordId, SequenceKind, SourceFile, VisualizerConfig, run,
};
use kicklens_remote::{HttpCollaborator, RemoteConfig};
use serde::{Deserialize, Serialize};

/// Analyze a penalty kick video with the kicklens collaborator services.
///
/// Runs upload, frame extraction, pose detection, and direction
/// prediction in order and reports what each stage produced.
#[derive(Parser)]
#[command(name = "kicklens-cli", version)]
struct Cli {
    /// Path to the kick video (MP4, M4V, MOV, WebM, AVI, MKV).
    video_path: PathBuf,

    /// Playback position of the strike, in seconds.
    #[arg(long)]
    timestamp: f64,

    /// Collaborator server address.
    #[arg(long, default_value = RemoteConfig::DEFAULT_BASE_URL)]
    base_url: String,

    /// Intensity of a zero-probability quadrant.
    #[arg(long, default_value_t = VisualizerConfig::DEFAULT_FLOOR)]
    floor: f64,

    /// Intensity added for the most likely quadrant.
    #[arg(long, default_value_t = VisualizerConfig::DEFAULT_SPREAD)]
    spread: f64,

    /// Last stage to run.
    #[arg(long, value_enum, default_value_t = Stop::Predict)]
    stop_after: Stop,

    /// Full run config as a JSON string.
    ///
    /// When provided, `--base-url`, `--floor`, and `--spread` are
    /// ignored. Missing fields take their defaults.
    #[arg(long)]
    config_json: Option<String>,

    /// Output the report as JSON instead of human-readable text.
    #[arg(long)]
    json: bool,

    /// Log debug detail to stderr.
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Log errors only.
    #[arg(short, long)]
    quiet: bool,
}

/// Where to stop the pipeline.
#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Stop {
    Upload,
    Extract,
    Detect,
    Predict,
}

impl Stop {
    const fn action(self) -> Action {
        match self {
            Self::Upload => Action::Upload,
            Self::Extract => Action::Extract,
            Self::Detect => Action::Detect,
            Self::Predict => Action::Predict,
        }
    }
}

/// Everything configurable about a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
struct RunConfig {
    remote: RemoteConfig,
    visualizer: VisualizerConfig,
}

/// Build a [`RunConfig`] from CLI arguments.
///
/// `--config-json` wins over the individual flags.
fn config_from_cli(cli: &Cli) -> Result<RunConfig, String> {
    let config = if let Some(ref json) = cli.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        RunConfig {
            remote: RemoteConfig::with_base_url(cli.base_url.clone()),
            visualizer: VisualizerConfig {
                floor: cli.floor,
                spread: cli.spread,
            },
        }
    };
    config.visualizer.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Commands to run, in order, up to and including `stop`.
fn commands(timestamp: f64, stop: Stop) -> Vec<Command> {
    [
        Command::Upload,
        Command::ExtractFrames { timestamp },
        Command::DetectPose,
        Command::PredictDirection,
    ]
    .into_iter()
    .filter(|c| c.action() <= stop.action())
    .collect()
}

fn init_tracing(quiet: bool, verbose: bool) -> Result<(), String> {
    let level = if quiet {
        "error"
    } else if verbose {
        "debug"
    } else {
        "warn"
    };

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|e| format!("failed to initialize tracing subscriber: {e}"))
}

/// What the run produced.
#[derive(Debug, Serialize)]
struct Report {
    video: String,
    stored_filename: Option<String>,
    video_id: Option<RecordId>,
    kick_id: Option<RecordId>,
    stage: PipelineStage,
    epoch: Epoch,
    frames: Vec<String>,
    annotated_frames: Vec<String>,
    grid: Option<QuadrantGrid>,
}

impl Report {
    fn collect(
        video: String,
        controller: &PipelineController,
        base_url: &str,
        visualizer: &QuadrantVisualizer,
    ) -> Self {
        let urls = |kind: SequenceKind| -> Vec<String> {
            controller
                .sequence(kind)
                .iter()
                .map(|a| a.render_url(base_url))
                .collect()
        };
        Self {
            video,
            stored_filename: controller.stored_filename().map(str::to_owned),
            video_id: controller.video_id().cloned(),
            kick_id: controller.kick_id().cloned(),
            stage: controller.stage(),
            epoch: controller.epoch(),
            frames: urls(SequenceKind::Frames),
            annotated_frames: urls(SequenceKind::AnnotatedFrames),
            grid: controller.probabilities().map(|p| visualizer.render(p)),
        }
    }

    fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!("Video: {}\n", self.video));
        if let Some(ref name) = self.stored_filename {
            out.push_str(&format!("Stored as: {name}"));
            if let Some(ref id) = self.video_id {
                out.push_str(&format!(" (video {id})"));
            }
            out.push('\n');
        }
        out.push_str(&format!("Stage: {} (epoch {})\n", self.stage, self.epoch));

        for (title, urls) in [
            (SequenceKind::Frames.label(), &self.frames),
            (SequenceKind::AnnotatedFrames.label(), &self.annotated_frames),
        ] {
            if urls.is_empty() {
                continue;
            }
            out.push_str(&format!("\n{title} ({}):\n", urls.len()));
            for url in urls {
                out.push_str(&format!("  {url}\n"));
            }
        }

        if let Some(ref grid) = self.grid {
            out.push_str("\nQuadrants (probability / intensity):\n");
            for row in 0..ROWS {
                let cells: Vec<String> = (0..COLUMNS)
                    .filter_map(|col| Quadrant::from_index(row * COLUMNS + col))
                    .map(|q| {
                        let cell = grid.cell(q);
                        format!("{:>6.1}% / {:.2}", cell.percent(), cell.intensity)
                    })
                    .collect();
                out.push_str(&format!("  | {} |\n", cells.join(" | ")));
            }
            if let Some(q) = grid.dominant {
                out.push_str(&format!("Most likely: {q}\n"));
            }
        }
        out
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(msg) = init_tracing(cli.quiet, cli.verbose) {
        eprintln!("{msg}");
        return ExitCode::FAILURE;
    }

    let config = match config_from_cli(&cli) {
        Ok(c) => c,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    tracing::debug!(?config, "run config");

    let bytes = match std::fs::read(&cli.video_path) {
        Ok(bytes) => bytes,
        Err(e) => {
            eprintln!("Error reading {}: {e}", cli.video_path.display());
            return ExitCode::FAILURE;
        }
    };
    let name = cli
        .video_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("video.mp4")
        .to_owned();

    let collaborator = match HttpCollaborator::new(config.remote.clone()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{e}");
            return ExitCode::FAILURE;
        }
    };

    eprintln!("Video: {} ({} bytes)", cli.video_path.display(), bytes.len());
    eprintln!("Server: {}", config.remote.base_url);

    let controller = RefCell::new(PipelineController::new());
    controller
        .borrow_mut()
        .select_file(SourceFile::new(name, bytes));

    let mut failed = false;
    for command in commands(cli.timestamp, cli.stop_after) {
        let action = command.action();
        eprintln!("{}", action.pending_status());
        if let Err(e) = run(&controller, &collaborator, command).await {
            tracing::warn!(%action, error = %e, "pipeline stopped");
            eprintln!("Error: {e}");
            failed = true;
            break;
        }
        if let Some(status) = controller.borrow().status() {
            eprintln!("  {}", status.message);
        }
    }

    let visualizer = QuadrantVisualizer::new(config.visualizer);
    let report = Report::collect(
        cli.video_path.display().to_string(),
        &controller.borrow(),
        &config.remote.base_url,
        &visualizer,
    );

    if cli.json {
        match serde_json::to_string_pretty(&report) {
            Ok(json) => println!("{json}"),
            Err(e) => {
                eprintln!("Error serializing report: {e}");
                return ExitCode::FAILURE;
            }
        }
    } else {
        print!("{}", report.render_text());
    }

    if failed {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
