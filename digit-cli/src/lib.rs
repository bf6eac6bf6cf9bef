//! # Digit Canvas CLI
//!
//! Native host for the drawing pad. Drawings come from pointer scripts:
//! recorded JSON documents holding the displayed geometry and the events in
//! arrival order.
//!
//! ## Usage
//!
//! ```bash
//! # Replay a script and save it as ./drawing.png
//! digit-canvas save --script seven.json
//!
//! # Replay a script and ask a classifier what it is
//! CLASSIFIER_ENDPOINT=http://localhost:5000/predict digit-canvas predict --script seven.json
//!
//! # Render to an arbitrary file, optionally as JPEG
//! digit-canvas render --script seven.json --output seven.jpg --format jpeg
//! ```
//!
//! ## Architecture
//!
//! - `CliArgs` - Command-line arguments parsed with clap
//! - `PadArgs` - Pad settings shared by every command
//! - `run` - Replays the script into a `Sketchpad` and hands the surface to
//!   the export gateway or the renderer

#![forbid(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Args, Parser, Subcommand, ValueEnum};
use digit_core::{
    MapperConfig, MissingCoordinatePolicy, PadConfig, PointerScript, Sketchpad, StrokeStyle,
    DEFAULT_SENSITIVITY, DEFAULT_SURFACE_SIZE,
};
use digit_gateway::{
    DirectoryDownloads, ExportGateway, FailurePolicy, GatewayConfig, HttpClassifier,
    PredictionView, ENDPOINT_ENV,
};
use digit_renderer::{ExportConfig, ExportFormat, SurfaceExporter};

/// Command-line arguments for digit-canvas.
#[derive(Debug, Clone, Parser)]
#[command(name = "digit-canvas")]
#[command(about = "Replay, save and classify hand-drawn digits")]
#[command(version)]
pub struct CliArgs {
    /// Pad settings
    #[command(flatten)]
    pub pad: PadArgs,

    /// What to do with the drawing
    #[command(subcommand)]
    pub command: Command,
}

/// Pad settings shared by every command.
#[derive(Debug, Clone, Args)]
pub struct PadArgs {
    /// Surface width in pixels
    #[arg(long, global = true, default_value_t = DEFAULT_SURFACE_SIZE)]
    pub width: u32,

    /// Surface height in pixels
    #[arg(long, global = true, default_value_t = DEFAULT_SURFACE_SIZE)]
    pub height: u32,

    /// Input sensitivity divisor K
    #[arg(long, global = true, env = "DIGIT_SENSITIVITY", default_value_t = DEFAULT_SENSITIVITY)]
    pub sensitivity: f64,

    /// Stroke width in surface pixels
    #[arg(long, global = true, default_value_t = 1.0)]
    pub stroke_width: f64,

    /// Drop samples with an undeterminable position instead of snapping them to 0
    #[arg(long, global = true)]
    pub ignore_missing: bool,
}

impl From<&PadArgs> for PadConfig {
    fn from(args: &PadArgs) -> Self {
        Self {
            width: args.width,
            height: args.height,
            mapper: MapperConfig {
                sensitivity: args.sensitivity,
                missing: if args.ignore_missing {
                    MissingCoordinatePolicy::Ignore
                } else {
                    MissingCoordinatePolicy::ZeroFill
                },
            },
            style: StrokeStyle {
                width: args.stroke_width,
                ..StrokeStyle::default()
            },
        }
    }
}

/// Subcommands.
#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Replay a script and save the drawing as a PNG download
    Save {
        /// Pointer script (JSON)
        #[arg(long)]
        script: PathBuf,

        /// Directory the download lands in
        #[arg(long, default_value = ".")]
        out_dir: PathBuf,
    },

    /// Replay a script and submit the drawing to the classifier
    Predict {
        /// Pointer script (JSON)
        #[arg(long)]
        script: PathBuf,

        /// Classifier endpoint (e.g., <http://localhost:5000/predict>).
        /// Falls back to `$CLASSIFIER_ENDPOINT`.
        #[arg(long)]
        endpoint: Option<String>,

        /// Whether a failed request is visible in the result
        #[arg(long, value_enum, default_value_t = PolicyArg::Swallow)]
        failure_policy: PolicyArg,
    },

    /// Replay a script and write the encoded image to a file
    Render {
        /// Pointer script (JSON)
        #[arg(long)]
        script: PathBuf,

        /// Output file
        #[arg(long)]
        output: PathBuf,

        /// Image format
        #[arg(long, value_enum, default_value_t = FormatArg::Png)]
        format: FormatArg,
    },
}

/// `--failure-policy` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PolicyArg {
    /// Log the failure and keep the previous label
    Swallow,
    /// Fail the command
    Surface,
}

impl From<PolicyArg> for FailurePolicy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Swallow => Self::Swallow,
            PolicyArg::Surface => Self::Surface,
        }
    }
}

/// `--format` values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Lossless RGBA PNG
    Png,
    /// RGB JPEG flattened onto white
    Jpeg,
}

impl From<FormatArg> for ExportFormat {
    fn from(arg: FormatArg) -> Self {
        match arg {
            FormatArg::Png => Self::Png,
            FormatArg::Jpeg => Self::Jpeg,
        }
    }
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Drawing saved to this path.
    Saved(PathBuf),
    /// Classifier state after the submission.
    Predicted(PredictionView),
    /// Encoded image written to this path.
    Rendered(PathBuf),
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Saved(path) | Self::Rendered(path) => write!(f, "{}", path.display()),
            Self::Predicted(view) => write!(f, "{}", view.label),
        }
    }
}

/// Load a pointer script from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read or is not a script.
pub fn load_script(path: &Path) -> anyhow::Result<PointerScript> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read script {}", path.display()))?;
    PointerScript::from_json(&json)
        .with_context(|| format!("Invalid pointer script {}", path.display()))
}

/// Build a pad, clear it and replay the script into it.
///
/// # Errors
///
/// Returns an error if the pad settings are invalid or the script was
/// recorded for a surface of another size.
pub fn draw(pad: &PadArgs, script: &PointerScript) -> anyhow::Result<Sketchpad> {
    let mut sketchpad = Sketchpad::new(PadConfig::from(pad)).context("Invalid pad settings")?;
    sketchpad.clear();
    let consumed = sketchpad
        .replay(script)
        .context("Script does not fit the pad")?;
    tracing::info!(
        events = script.events.len(),
        consumed,
        "Pointer script replayed"
    );
    Ok(sketchpad)
}

/// Execute a parsed command line.
///
/// # Errors
///
/// Returns an error if the script cannot be loaded, the drawing cannot be
/// encoded or written, or (under `--failure-policy surface`) the classifier
/// request fails.
pub async fn run(args: CliArgs) -> anyhow::Result<Outcome> {
    match args.command {
        Command::Save { script, out_dir } => {
            let pad = draw(&args.pad, &load_script(&script)?)?;
            let surface = pad.surface().context("Pad has no surface")?;
            let gateway = ExportGateway::new(None::<HttpClassifier>, GatewayConfig::default());
            let target = DirectoryDownloads::new(out_dir);
            gateway
                .save_locally(surface, &target)
                .context("Failed to save drawing")?;
            Ok(Outcome::Saved(target.dir().join(&gateway.config().download_name)))
        }
        Command::Predict {
            script,
            endpoint,
            failure_policy,
        } => {
            let pad = draw(&args.pad, &load_script(&script)?)?;
            let surface = pad.surface().context("Pad has no surface")?;

            let config = match endpoint {
                Some(url) => GatewayConfig::default().with_endpoint(&url)?,
                None => GatewayConfig::from_env()
                    .with_context(|| format!("Invalid {ENDPOINT_ENV}"))?,
            }
            .with_failure_policy(failure_policy.into());
            let classifier = HttpClassifier::from_config(&config).with_context(|| {
                format!("No classifier endpoint; pass --endpoint or set {ENDPOINT_ENV}")
            })?;
            tracing::info!(endpoint = %classifier.endpoint(), "Submitting drawing");
            let gateway = ExportGateway::new(classifier, config);

            if let Err(err) = gateway.submit_for_prediction(surface).await {
                if gateway.view().failed {
                    return Err(err).context("Prediction failed");
                }
                tracing::warn!("Prediction failed; label unchanged");
            }
            Ok(Outcome::Predicted(gateway.view()))
        }
        Command::Render {
            script,
            output,
            format,
        } => {
            let pad = draw(&args.pad, &load_script(&script)?)?;
            let surface = pad.surface().context("Pad has no surface")?;
            let image = SurfaceExporter::new(ExportConfig::default())
                .export(surface, format.into())
                .context("Failed to encode drawing")?;
            let mime = image.mime_type();
            std::fs::write(&output, image.into_bytes())
                .with_context(|| format!("Failed to write {}", output.display()))?;
            tracing::info!(path = %output.display(), format = mime, "Drawing rendered");
            Ok(Outcome::Rendered(output))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_pad_args() {
        let args = CliArgs::parse_from(["digit-canvas", "save", "--script", "s.json"]);
        let config = PadConfig::from(&args.pad);
        assert_eq!(config, PadConfig::default());
        match args.command {
            Command::Save { script, out_dir } => {
                assert_eq!(script, PathBuf::from("s.json"));
                assert_eq!(out_dir, PathBuf::from("."));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_pad_flags_after_subcommand() {
        let args = CliArgs::parse_from([
            "digit-canvas",
            "render",
            "--script",
            "s.json",
            "--output",
            "out.jpg",
            "--format",
            "jpeg",
            "--sensitivity",
            "1",
            "--ignore-missing",
        ]);
        let config = PadConfig::from(&args.pad);
        assert!((config.mapper.sensitivity - 1.0).abs() < f64::EPSILON);
        assert_eq!(config.mapper.missing, MissingCoordinatePolicy::Ignore);
        assert!(matches!(
            args.command,
            Command::Render {
                format: FormatArg::Jpeg,
                ..
            }
        ));
    }

    #[test]
    fn test_predict_policy_flag() {
        let args = CliArgs::parse_from([
            "digit-canvas",
            "predict",
            "--script",
            "s.json",
            "--endpoint",
            "http://localhost:5000/predict",
            "--failure-policy",
            "surface",
        ]);
        match args.command {
            Command::Predict {
                endpoint,
                failure_policy,
                ..
            } => {
                assert_eq!(endpoint.as_deref(), Some("http://localhost:5000/predict"));
                assert_eq!(FailurePolicy::from(failure_policy), FailurePolicy::Surface);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_script_is_required() {
        assert!(CliArgs::try_parse_from(["digit-canvas", "save"]).is_err());
    }

    #[test]
    fn test_outcome_display() {
        let view = PredictionView {
            label: "7".to_string(),
            ..PredictionView::default()
        };
        assert_eq!(Outcome::Predicted(view).to_string(), "7");
    }
}
