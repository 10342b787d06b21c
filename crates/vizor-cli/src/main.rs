//! vizor: headless image filtering and region export.
//!
//! Loads a batch of images, runs the filter pipeline with the given
//! parameters, and prints per-stage diagnostics. Optionally:
//!
//! - saves the first processed image (`--output`)
//! - crops rectangular selections out of every processed image
//!   (`--region`, `--crops-dir`)
//! - writes previews with selection outlines drawn in (`--preview-dir`)
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin vizor -- [OPTIONS] <IMAGES>...
//! ```

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::{Duration, Instant};

use clap::{Parser, ValueEnum};
use vizor_dispatch::{RegionLabel, regions_for};
use vizor_io::Workspace;
use vizor_pipeline::{Clock, FilterParameters, PipelineDiagnostics, PixelPoint, Stage};

/// Filter images and export selected regions.
///
/// Runs the filter pipeline over every input image with the given
/// parameters and prints per-stage timing for each.
#[derive(Parser)]
#[command(name = "vizor", version)]
struct Cli {
    /// Input images (PNG, JPEG, BMP, WebP). Unreadable files are skipped.
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Brightness offset (-100..=100).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    brightness: i32,

    /// Contrast (-100..=100).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    contrast: i32,

    /// Saturation shift (-100..=100).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    saturation: i32,

    /// Hue offset in 8-bit HSV hue steps of 2 degrees each, wrapping
    /// modulo 180 steps (-180..=180).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    hue: i32,

    /// Gamma in tenths; 10 is neutral (1..=50).
    #[arg(long, default_value_t = FilterParameters::DEFAULT_GAMMA)]
    gamma: u32,

    /// Gaussian blur radius; the kernel spans `2 * blur + 1` pixels (0..=20).
    #[arg(long, default_value_t = 0)]
    blur: u32,

    /// Sharpen strength (0..=10).
    #[arg(long, default_value_t = 0)]
    sharpen: u32,

    /// Gaussian noise standard deviation (0..=50).
    #[arg(long, default_value_t = 0)]
    noise: u32,

    /// Seed for the noise stage.
    #[arg(long, default_value_t = 0)]
    noise_seed: u64,

    /// Canny low threshold for the edge overlay; 0 disables it (0..=100).
    #[arg(long, default_value_t = 0)]
    edge_detection: u32,

    /// Red channel offset (-100..=100).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    color_balance_r: i32,

    /// Green channel offset (-100..=100).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    color_balance_g: i32,

    /// Blue channel offset (-100..=100).
    #[arg(long, default_value_t = 0, allow_hyphen_values = true)]
    color_balance_b: i32,

    /// Convert to greyscale.
    #[arg(long)]
    greyscale: bool,

    /// Invert colors.
    #[arg(long)]
    invert: bool,

    /// Apply a sepia tone.
    #[arg(long)]
    sepia: bool,

    /// Counter-clockwise rotation.
    #[arg(long, value_enum, default_value_t = RotationArg::None)]
    rotation: RotationArg,

    /// Mirror the result.
    #[arg(long, value_enum, default_value_t = FlipArg::None)]
    flip: FlipArg,

    /// Full filter parameters as a JSON string.
    ///
    /// When provided, all other filter flags are ignored. Missing fields
    /// take their defaults.
    #[arg(long)]
    params_json: Option<String>,

    /// Selection in processed-image pixels as `x1,y1,x2,y2`; repeatable.
    /// Applied to every image.
    #[arg(long = "region", value_parser = parse_region)]
    regions: Vec<[PixelPoint; 2]>,

    /// Shape used to outline `--region` selections in previews.
    #[arg(long, value_enum, default_value_t = ShapeArg::Rectangle)]
    shape: ShapeArg,

    /// Write the first processed image to this file.
    #[arg(long)]
    output: Option<PathBuf>,

    /// Write each region crop of each image into this directory as PNG.
    #[arg(long)]
    crops_dir: Option<PathBuf>,

    /// Write each processed image with selection outlines into this
    /// directory as PNG.
    #[arg(long)]
    preview_dir: Option<PathBuf>,

    /// Number of timed runs per image.
    #[arg(long, default_value_t = 1, value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..))]
    runs: usize,

    /// Output diagnostics as JSON instead of a human-readable report.
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum RotationArg {
    None,
    #[value(name = "90")]
    Deg90,
    #[value(name = "180")]
    Deg180,
    #[value(name = "270")]
    Deg270,
}

#[derive(Clone, Copy, ValueEnum)]
enum FlipArg {
    None,
    Horizontal,
    Vertical,
}

#[derive(Clone, Copy, ValueEnum)]
enum ShapeArg {
    Rectangle,
    Triangle,
}

impl From<ShapeArg> for vizor_pipeline::ShapeMode {
    fn from(shape: ShapeArg) -> Self {
        match shape {
            ShapeArg::Rectangle => Self::Rectangle,
            ShapeArg::Triangle => Self::Triangle,
        }
    }
}

/// Parse `x1,y1,x2,y2` into the two corner points of a selection.
fn parse_region(s: &str) -> Result<[PixelPoint; 2], String> {
    let coords = s
        .split(',')
        .map(|part| part.trim().parse::<u32>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| format!("invalid coordinate in {s:?}: {e}"))?;
    match coords[..] {
        [x1, y1, x2, y2] => Ok([PixelPoint::new(x1, y1), PixelPoint::new(x2, y2)]),
        _ => Err(format!("expected x1,y1,x2,y2, got {s:?}")),
    }
}

/// Build [`FilterParameters`] from CLI arguments.
///
/// If `--params-json` is provided, the JSON is parsed directly and all
/// individual filter flags are ignored. Out-of-range values are clamped
/// by the pipeline either way.
fn parameters_from_cli(cli: &Cli) -> Result<FilterParameters, String> {
    if let Some(ref json) = cli.params_json {
        return serde_json::from_str(json).map_err(|e| format!("Error parsing --params-json: {e}"));
    }

    Ok(FilterParameters {
        brightness: cli.brightness,
        contrast: cli.contrast,
        saturation: cli.saturation,
        hue: cli.hue,
        gamma: cli.gamma,
        blur: cli.blur,
        sharpen: cli.sharpen,
        noise: cli.noise,
        edge_detection: cli.edge_detection,
        color_balance_r: cli.color_balance_r,
        color_balance_g: cli.color_balance_g,
        color_balance_b: cli.color_balance_b,
        greyscale: cli.greyscale,
        invert: cli.invert,
        sepia: cli.sepia,
        rotation: match cli.rotation {
            RotationArg::None => vizor_pipeline::Rotation::None,
            RotationArg::Deg90 => vizor_pipeline::Rotation::Deg90,
            RotationArg::Deg180 => vizor_pipeline::Rotation::Deg180,
            RotationArg::Deg270 => vizor_pipeline::Rotation::Deg270,
        },
        flip: match cli.flip {
            FlipArg::None => vizor_pipeline::Flip::None,
            FlipArg::Horizontal => vizor_pipeline::Flip::Horizontal,
            FlipArg::Vertical => vizor_pipeline::Flip::Vertical,
        },
        noise_seed: cli.noise_seed,
    })
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();

    let parameters = match parameters_from_cli(&cli) {
        Ok(p) => p,
        Err(msg) => {
            eprintln!("{msg}");
            return ExitCode::FAILURE;
        }
    };

    let mut workspace = Workspace::new();
    workspace.set_parameters(parameters);
    for failure in workspace.load(&cli.images) {
        eprintln!("Skipping: {failure}");
    }
    if workspace.is_empty() {
        eprintln!("No images could be loaded");
        return ExitCode::FAILURE;
    }

    eprintln!("Parameters: {:#?}", workspace.parameters());
    eprintln!("Images: {}  Runs: {}", workspace.len(), cli.runs);
    eprintln!();

    let mut all_diagnostics = Vec::with_capacity(workspace.len() * cli.runs);
    for index in 0..workspace.len() {
        let Some(source) = workspace.source(index) else {
            continue;
        };
        eprintln!("=== {} ===", source.label);
        for _ in 0..cli.runs {
            let (_, diagnostics) = vizor_pipeline::apply_with_diagnostics(
                &source.image,
                workspace.parameters(),
                &StdClock,
            );
            if let Err(msg) = print_diagnostics(&diagnostics, cli.json) {
                eprintln!("{msg}");
                return ExitCode::FAILURE;
            }
            all_diagnostics.push(diagnostics);
        }
    }

    if all_diagnostics.len() > 1 {
        print_multi_run_summary(&all_diagnostics);
    }

    for index in 0..workspace.len() {
        for points in &cli.regions {
            if workspace.select(index, cli.shape.into(), points).is_none() {
                eprintln!("Ignoring region {points:?} on image {index}");
            }
        }
    }

    let mut ok = true;

    if let Some(ref path) = cli.output {
        match workspace.save_first(path) {
            Ok(()) => eprintln!("Saved {}", path.display()),
            Err(e) => {
                eprintln!("{e}");
                ok = false;
            }
        }
    }

    if let Some(ref dir) = cli.crops_dir {
        ok &= write_crops(&workspace, dir);
    }

    if let Some(ref dir) = cli.preview_dir {
        ok &= write_previews(&workspace, dir);
    }

    if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}

fn print_diagnostics(diagnostics: &PipelineDiagnostics, json: bool) -> Result<(), String> {
    if json {
        let text = serde_json::to_string_pretty(diagnostics)
            .map_err(|e| format!("Error serializing diagnostics: {e}"))?;
        println!("{text}");
    } else {
        println!("{}", diagnostics.report());
    }
    Ok(())
}

/// Save every region crop of every image. Returns `false` if any write
/// failed.
fn write_crops(workspace: &Workspace, dir: &Path) -> bool {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Error creating {}: {e}", dir.display());
        return false;
    }
    let mut ok = true;
    for job in workspace.recognition_jobs() {
        let stem = workspace
            .source(job.image_index)
            .map_or_else(|| format!("image{}", job.image_index), |s| file_stem(&s.path));
        for region in regions_for(&job.image, &job.selections) {
            let path = dir.join(crop_file_name(&stem, region.label));
            match vizor_io::save_image(&region.pixels, &path) {
                Ok(()) => eprintln!(
                    "Crop {} ({}) -> {}",
                    region.label,
                    rect_text(&region),
                    path.display()
                ),
                Err(e) => {
                    eprintln!("{e}");
                    ok = false;
                }
            }
        }
    }
    ok
}

/// Save every processed image with its selections outlined. Returns
/// `false` if any write failed.
fn write_previews(workspace: &Workspace, dir: &Path) -> bool {
    if let Err(e) = std::fs::create_dir_all(dir) {
        eprintln!("Error creating {}: {e}", dir.display());
        return false;
    }
    let mut ok = true;
    for index in 0..workspace.len() {
        let (Some(source), Some(preview)) = (workspace.source(index), workspace.preview(index))
        else {
            continue;
        };
        let path = dir.join(format!("{}-preview.png", file_stem(&source.path)));
        if let Err(e) = vizor_io::save_image(&preview, &path) {
            eprintln!("{e}");
            ok = false;
        }
    }
    ok
}

fn file_stem(path: &Path) -> String {
    path.file_stem().map_or_else(
        || "image".to_owned(),
        |s| s.to_string_lossy().into_owned(),
    )
}

fn crop_file_name(stem: &str, label: RegionLabel) -> String {
    match label {
        RegionLabel::Whole => format!("{stem}-whole.png"),
        RegionLabel::Selection(i) => format!("{stem}-region{}.png", i + 1),
    }
}

fn rect_text(region: &vizor_dispatch::Region) -> String {
    let r = region.rect;
    format!("{},{} to {},{}", r.x1, r.y1, r.x2, r.y2)
}

/// [`Clock`] implementation backed by [`std::time::Instant`].
struct StdClock;

impl Clock for StdClock {
    type Instant = Instant;

    fn now(&self) -> Instant {
        Instant::now()
    }

    fn elapsed(&self, since: &Instant) -> Duration {
        since.elapsed()
    }
}

/// Print aggregated statistics across every run of every image.
#[allow(clippy::cast_precision_loss)]
fn print_multi_run_summary(all_diagnostics: &[PipelineDiagnostics]) {
    println!();
    println!(
        "Summary ({} runs)\n{}",
        all_diagnostics.len(),
        "=".repeat(60),
    );

    let durations: Vec<f64> = all_diagnostics
        .iter()
        .map(|d| d.total_duration.as_secs_f64() * 1000.0)
        .collect();

    let min = durations.iter().copied().reduce(f64::min).unwrap_or(0.0);
    let max = durations.iter().copied().reduce(f64::max).unwrap_or(0.0);
    let mean = durations.iter().sum::<f64>() / durations.len().max(1) as f64;

    println!("Total duration: min={min:.3}ms  mean={mean:.3}ms  max={max:.3}ms");

    println!();
    println!("{:<24} {:>12}", "Stage", "Mean (ms)");
    println!("{}", "-".repeat(40));

    for stage in Stage::ALL {
        let stage_durations: Vec<f64> = all_diagnostics
            .iter()
            .filter_map(|d| d.stages.iter().find(|s| s.stage == stage && s.applied))
            .map(|s| s.duration.as_secs_f64() * 1000.0)
            .collect();

        if stage_durations.is_empty() {
            continue;
        }

        let stage_mean = stage_durations.iter().sum::<f64>() / stage_durations.len() as f64;
        println!("{:<24} {stage_mean:>10.3}ms", stage.name());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("vizor").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn flags_map_to_parameters() {
        let cli = parse(&[
            "a.png",
            "--brightness",
            "-20",
            "--gamma",
            "15",
            "--invert",
            "--rotation",
            "90",
            "--flip",
            "vertical",
            "--color-balance-b",
            "-5",
        ]);
        let params = parameters_from_cli(&cli).unwrap();
        assert_eq!(params.brightness, -20);
        assert_eq!(params.gamma, 15);
        assert!(params.invert);
        assert_eq!(params.rotation, vizor_pipeline::Rotation::Deg90);
        assert_eq!(params.flip, vizor_pipeline::Flip::Vertical);
        assert_eq!(params.color_balance(), [0, 0, -5]);
    }

    #[test]
    fn no_flags_give_defaults() {
        let params = parameters_from_cli(&parse(&["a.png"])).unwrap();
        assert_eq!(params, FilterParameters::default());
    }

    #[test]
    fn params_json_overrides_flags() {
        let cli = parse(&[
            "a.png",
            "--brightness",
            "50",
            "--params-json",
            r#"{"contrast": 30, "sepia": true}"#,
        ]);
        let params = parameters_from_cli(&cli).unwrap();
        assert_eq!(params.brightness, 0);
        assert_eq!(params.contrast, 30);
        assert!(params.sepia);
    }

    #[test]
    fn bad_params_json_is_an_error() {
        let cli = parse(&["a.png", "--params-json", "{not json"]);
        let err = parameters_from_cli(&cli).unwrap_err();
        assert!(err.starts_with("Error parsing --params-json"));
    }

    #[test]
    fn regions_parse_and_repeat() {
        let cli = parse(&["a.png", "--region", "1,2,30,40", "--region", "5, 5, 6, 9"]);
        assert_eq!(
            cli.regions,
            vec![
                [PixelPoint::new(1, 2), PixelPoint::new(30, 40)],
                [PixelPoint::new(5, 5), PixelPoint::new(6, 9)],
            ]
        );
    }

    #[test]
    fn malformed_regions_are_rejected() {
        assert!(parse_region("1,2,3").is_err());
        assert!(parse_region("1,2,3,x").is_err());
        assert!(parse_region("-1,2,3,4").is_err());
    }

    fn help_for(id: &str) -> String {
        use clap::CommandFactory;
        Cli::command()
            .get_arguments()
            .find(|arg| arg.get_id() == id)
            .and_then(|arg| arg.get_help())
            .map(ToString::to_string)
            .unwrap()
    }

    #[test]
    fn help_describes_stage_units() {
        assert!(help_for("blur").starts_with("Gaussian blur radius"));
        let hue = help_for("hue");
        assert!(hue.contains("hue steps of 2 degrees"), "{hue}");
        assert!(hue.contains("modulo 180"), "{hue}");
    }

    #[test]
    fn images_are_required() {
        assert!(Cli::try_parse_from(["vizor"]).is_err());
    }

    #[test]
    fn crop_names_follow_labels() {
        assert_eq!(crop_file_name("card", RegionLabel::Whole), "card-whole.png");
        assert_eq!(crop_file_name("card", RegionLabel::Selection(0)), "card-region1.png");
    }
}
