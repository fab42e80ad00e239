//! markscan-cli: headless answer-sheet cropping and region tooling.
//!
//! Runs the calibration core without a browser. Useful for:
//!
//! - Cropping a photographed answer sheet from known corner positions
//! - Rendering the editor overlays to an image for inspection
//! - Cutting per-question crops out of a student photo using a saved
//!   region payload
//!
//! # Usage
//!
//! ```text
//! cargo run --release --bin markscan-cli -- crop sheet.jpg -o crop.png
//! cargo run --release --bin markscan-cli -- preview template.png --payload regions.json -o preview.png
//! cargo run --release --bin markscan-cli -- extract regions.json photo.jpg --out-dir answers/
//! ```
//!
//! Log verbosity follows `RUST_LOG` (default `info`); logs go to stderr
//! so stdout stays machine-readable.

#![allow(clippy::print_stdout, clippy::print_stderr)]

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};
use markscan_calibrate::marker::push_region_commands;
use markscan_calibrate::{
    Corner, CornerLabel, CornerScanner, DrawCommand, RegionPayload, RenderStyle, RgbaImage,
    ScannerConfig, raster, source,
};
use markscan_export::data_url::flatten_onto_black;
use tracing_subscriber::EnvFilter;

/// Answer-sheet scanning and region calibration from the command line.
#[derive(Parser)]
#[command(name = "markscan-cli", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Crop a photo to the bounding box of four corners.
    ///
    /// Prints the corners used as JSON on stdout.
    Crop {
        /// Photo to crop (PNG, JPEG, BMP, WebP).
        image: PathBuf,

        #[command(flatten)]
        scanner: ScannerArgs,

        /// Output image; the extension picks the format.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Render the scanner or marker overlay onto an image.
    ///
    /// Labels are not drawn.
    Preview {
        /// Image to draw over.
        image: PathBuf,

        #[command(flatten)]
        scanner: ScannerArgs,

        /// Draw the regions of a saved payload instead of the scanner
        /// quadrilateral.
        #[arg(long, conflicts_with = "corners")]
        payload: Option<PathBuf>,

        /// Output image.
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Cut every region of a payload out of a photo.
    ///
    /// The payload is rescaled to the photo's resolution first. One PNG
    /// per region is written, named after its question id.
    Extract {
        /// Saved region payload (JSON).
        payload: PathBuf,

        /// Student photo of the same template.
        photo: PathBuf,

        /// Directory for the crops; created if missing.
        #[arg(long)]
        out_dir: PathBuf,
    },
}

/// Corner placement options shared by `crop` and `preview`.
#[derive(Args)]
struct ScannerArgs {
    /// Corners as JSON: `[{"x":..,"y":..,"label":"TL"}, ...]`.
    ///
    /// When omitted, the default inset rectangle is used.
    #[arg(long)]
    corners: Option<String>,

    /// Inset of the default corners from each edge.
    #[arg(long, default_value_t = ScannerConfig::DEFAULT_MARGIN)]
    margin: f64,

    /// Corner grab radius.
    #[arg(long, default_value_t = ScannerConfig::DEFAULT_PICK_RADIUS)]
    pick_radius: f64,

    /// Full scanner config as a JSON string.
    ///
    /// When provided, `--margin` and `--pick-radius` are ignored.
    #[arg(long)]
    config_json: Option<String>,
}

/// Build a [`ScannerConfig`] from CLI arguments.
fn config_from_args(args: &ScannerArgs) -> Result<ScannerConfig, String> {
    let config = if let Some(ref json) = args.config_json {
        serde_json::from_str(json).map_err(|e| format!("Error parsing --config-json: {e}"))?
    } else {
        ScannerConfig {
            margin: args.margin,
            pick_radius: args.pick_radius,
        }
    };
    config.validate().map_err(|e| e.to_string())?;
    Ok(config)
}

/// Parse a corner list and order it `TL, TR, BR, BL`.
///
/// Each label must appear exactly once; input order does not matter.
fn parse_corners(json: &str) -> Result<[Corner; 4], String> {
    let corners: Vec<Corner> =
        serde_json::from_str(json).map_err(|e| format!("Error parsing --corners: {e}"))?;
    if corners.len() != 4 {
        return Err(format!(
            "--corners needs exactly 4 corners, got {}",
            corners.len()
        ));
    }
    let mut ordered = [None; 4];
    for corner in corners {
        let slot = CornerLabel::ALL
            .iter()
            .position(|l| *l == corner.label)
            .and_then(|i| ordered.get_mut(i))
            .ok_or_else(|| format!("unknown corner label {}", corner.label))?;
        if slot.replace(corner).is_some() {
            return Err(format!("corner {} given twice", corner.label));
        }
    }
    let mut out = Vec::with_capacity(4);
    for (label, corner) in CornerLabel::ALL.iter().zip(ordered) {
        out.push(corner.ok_or_else(|| format!("corner {label} missing"))?);
    }
    out.try_into().map_err(|_| String::from("--corners needs exactly 4 corners"))
}

/// Load `image` into a scanner and drag each corner to its requested
/// position, the same way a user would.
fn scanner_for(image: RgbaImage, args: &ScannerArgs) -> Result<CornerScanner, String> {
    let mut scanner = CornerScanner::new(config_from_args(args)?);
    scanner.load(image);
    if let Some(ref json) = args.corners {
        for (index, corner) in parse_corners(json)?.iter().enumerate() {
            scanner.begin_drag(index);
            scanner.update_drag(corner.point());
            scanner.end_drag();
        }
    }
    Ok(scanner)
}

fn read_image(path: &Path) -> Result<RgbaImage, String> {
    let bytes =
        std::fs::read(path).map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    let image = source::decode(&bytes).map_err(|e| format!("{}: {e}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "image decoded"
    );
    Ok(image)
}

fn is_jpeg(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("jpg") || e.eq_ignore_ascii_case("jpeg"))
}

/// Write `image`, flattening transparency for JPEG outputs.
fn write_image(image: &RgbaImage, path: &Path) -> Result<(), String> {
    if image.width() == 0 || image.height() == 0 {
        return Err(format!(
            "refusing to write an empty image to {}",
            path.display()
        ));
    }
    let result = if is_jpeg(path) {
        flatten_onto_black(image).save(path)
    } else {
        image.save(path)
    };
    result.map_err(|e| format!("Error writing {}: {e}", path.display()))?;
    tracing::info!(
        path = %path.display(),
        width = image.width(),
        height = image.height(),
        "image written"
    );
    Ok(())
}

fn crop(image: &Path, args: &ScannerArgs, output: &Path) -> Result<(), String> {
    let scanner = scanner_for(read_image(image)?, args)?;
    let result = scanner.confirm().map_err(|e| e.to_string())?;
    write_image(&result.image, output)?;
    let json = serde_json::to_string_pretty(&result.corners)
        .map_err(|e| format!("Error serializing corners: {e}"))?;
    println!("{json}");
    Ok(())
}

fn preview(
    image: &Path,
    args: &ScannerArgs,
    payload: Option<&Path>,
    output: &Path,
) -> Result<(), String> {
    let source = read_image(image)?;
    let style = RenderStyle::default();
    let commands = if let Some(path) = payload {
        let loaded = read_payload(path)?;
        let scaled = loaded
            .scale_to(markscan_calibrate::Dimensions::of(&source))
            .map_err(|e| e.to_string())?;
        let regions: Vec<_> = scaled.regions.iter().map(|r| r.to_region()).collect();
        let mut cmds = vec![DrawCommand::Clear, DrawCommand::Image];
        push_region_commands(&mut cmds, &regions, &style);
        cmds
    } else {
        scanner_for(source.clone(), args)?.render(&style)
    };
    tracing::debug!(commands = commands.len(), "rasterizing overlay");
    write_image(&raster::rasterize(&commands, &source), output)
}

fn read_payload(path: &Path) -> Result<RegionPayload, String> {
    let json = std::fs::read_to_string(path)
        .map_err(|e| format!("Error reading {}: {e}", path.display()))?;
    markscan_export::payload::from_json(&json).map_err(|e| format!("{}: {e}", path.display()))
}

/// File name for a region crop. Question ids are free-form text.
fn crop_file_name(question_id: &str, index: usize) -> String {
    let safe: String = question_id
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
        .collect();
    format!("{index:02}-q{safe}.png")
}

fn extract(payload: &Path, photo: &Path, out_dir: &Path) -> Result<(), String> {
    let payload = read_payload(payload)?;
    let photo = read_image(photo)?;
    let scaled = payload
        .scale_to(markscan_calibrate::Dimensions::of(&photo))
        .map_err(|e| e.to_string())?;
    std::fs::create_dir_all(out_dir)
        .map_err(|e| format!("Error creating {}: {e}", out_dir.display()))?;

    let mut written = 0usize;
    for (index, (question_id, crop)) in scaled.extract(&photo).into_iter().enumerate() {
        if crop.width() == 0 || crop.height() == 0 {
            tracing::warn!(%question_id, "region lies outside the photo, skipped");
            continue;
        }
        write_image(&crop, &out_dir.join(crop_file_name(&question_id, index)))?;
        written += 1;
    }
    eprintln!(
        "{written} of {} regions written to {}",
        scaled.regions.len(),
        out_dir.display()
    );
    Ok(())
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Crop {
            ref image,
            ref scanner,
            ref output,
        } => crop(image, scanner, output),
        Command::Preview {
            ref image,
            ref scanner,
            ref payload,
            ref output,
        } => preview(image, scanner, payload.as_deref(), output),
        Command::Extract {
            ref payload,
            ref photo,
            ref out_dir,
        } => extract(payload, photo, out_dir),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(msg) => {
            eprintln!("{msg}");
            ExitCode::FAILURE
        }
    }
}
