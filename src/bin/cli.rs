//! CLI application for fingertip estimation from a silhouette contour.
//!
//! Usage:
//!   palmtips <frame.json>                          # Human-readable output
//!   palmtips <frame.json> --json                   # JSON output
//!   palmtips <frame.json> --overlay overlay.png    # Also render the model
//!
//! The input file holds `contour` (a list of `[x, y]` pixels) and either
//! `palm_center` + `palm_height` or an enclosing-circle `circle_center`.

use clap::{Parser, ValueEnum};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_hollow_circle_mut, draw_hollow_rect_mut, draw_line_segment_mut};
use imageproc::rect::Rect;
use log::{debug, info};
use palmtips::{
    observe, BayesianAssigner, ExhaustiveAssigner, Finger, FingerClass, HandConfig, HandLayout,
    Observation, PalmEstimate, Pixel, SideFinger, SideHand, Strategy,
};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "palmtips")]
#[command(author, version, about = "Fingertip estimation from hand silhouettes", long_about = None)]
struct Args {
    /// Input frame file (JSON)
    #[arg(required = true)]
    input: PathBuf,

    /// Model configuration (JSON); defaults are used when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Candidate assignment strategy
    #[arg(long, value_enum, default_value_t = StrategyArg::Bayes)]
    strategy: StrategyArg,

    /// Output as JSON
    #[arg(short, long)]
    json: bool,

    /// Output file (default: stdout)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Render hypothesis and estimate onto a blank canvas and save it here
    #[arg(long)]
    overlay: Option<PathBuf>,

    /// Overlay canvas width
    #[arg(long, default_value = "256")]
    width: u32,

    /// Overlay canvas height
    #[arg(long, default_value = "256")]
    height: u32,

    /// Also report the side-view model for the same palm
    #[arg(long)]
    side: bool,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum StrategyArg {
    /// Nearest-neighbour weighted MAP assignment
    Bayes,
    /// Minimum total distance over all candidate subsets
    Exhaustive,
}

/// Input frame as read from disk.
#[derive(Deserialize, Debug)]
struct FrameFile {
    contour: Vec<Pixel>,
    palm_center: Option<Pixel>,
    palm_height: Option<f64>,
    circle_center: Option<Pixel>,
}

/// Output structure for JSON serialization
#[derive(Serialize)]
struct Output {
    input: String,
    #[serde(flatten)]
    observation: Observation,
    #[serde(skip_serializing_if = "Option::is_none")]
    side_view: Option<HandLayout<SideFinger>>,
}

fn main() {
    let args = Args::parse();

    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    if let Err(e) = run(&args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            HandConfig::load(path)?
        }
        None => HandConfig::default(),
    };

    info!("Loading frame {:?}", args.input);
    let frame: FrameFile = serde_json::from_reader(BufReader::new(File::open(&args.input)?))?;

    let (palm_center, palm_height) = match (frame.palm_center, frame.palm_height) {
        (Some(center), Some(height)) => (center, height),
        _ => {
            let circle_center = frame
                .circle_center
                .ok_or("frame needs palm_center and palm_height, or circle_center")?;
            let palm = PalmEstimate::from_contour(&frame.contour, circle_center)?;
            debug!("Estimated palm {:?} from circle center {:?}", palm, circle_center);
            (palm.center, palm.height)
        }
    };

    let strategy = match args.strategy {
        StrategyArg::Bayes => Strategy::Bayesian(BayesianAssigner::from_config(&config)),
        StrategyArg::Exhaustive => Strategy::Exhaustive(ExhaustiveAssigner::from_config(&config)),
    };

    let observation = observe(&frame.contour, palm_center, palm_height, &config, &strategy)?;
    info!(
        "{} candidate(s), estimate {}",
        observation.candidates.len(),
        if observation.is_complete() { "found" } else { "not found" }
    );

    let side_view = if args.side {
        Some(SideHand::new(palm_center, palm_height, &config)?.layout()?)
    } else {
        None
    };

    if let Some(ref path) = args.overlay {
        let canvas = render_overlay(&observation, args.width, args.height);
        canvas.save(path)?;
        info!("Overlay written to {:?}", path);
    }

    let output = Output {
        input: args.input.display().to_string(),
        observation,
        side_view,
    };

    let output_str = if args.json {
        serde_json::to_string_pretty(&output)?
    } else {
        format_human_readable(&output)
    };

    if let Some(ref path) = args.output {
        std::fs::write(path, &output_str)?;
        info!("Output written to {:?}", path);
    } else {
        println!("{}", output_str);
    }

    Ok(())
}

const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
const RED: Rgb<u8> = Rgb([255, 0, 0]);
const BLUE: Rgb<u8> = Rgb([0, 0, 255]);
const YELLOW: Rgb<u8> = Rgb([255, 255, 0]);

fn render_overlay(observation: &Observation, width: u32, height: u32) -> RgbImage {
    let mut canvas = RgbImage::new(width, height);

    draw_layout(&mut canvas, &observation.hypothesis, GREEN, BLUE);
    if let Some(layout) = &observation.estimate_layout {
        draw_layout(&mut canvas, layout, YELLOW, RED);
    }
    for p in observation.candidates.as_slice() {
        draw_hollow_circle_mut(&mut canvas, (p.x, p.y), 4, RED);
    }

    canvas
}

fn draw_layout<F: FingerClass>(
    canvas: &mut RgbImage,
    layout: &HandLayout<F>,
    color: Rgb<u8>,
    box_color: Rgb<u8>,
) {
    let w = (layout.bottom_right.x - layout.top_left.x).max(1) as u32;
    let h = (layout.bottom_right.y - layout.top_left.y).max(1) as u32;
    draw_hollow_rect_mut(
        canvas,
        Rect::at(layout.top_left.x, layout.top_left.y).of_size(w, h),
        color,
    );
    draw_hollow_circle_mut(canvas, (layout.base.x, layout.base.y), 1, color);

    for geometry in layout.fingers.values() {
        draw_segment(canvas, layout.base, geometry.tip, color);
        draw_hollow_circle_mut(canvas, (geometry.tip.x, geometry.tip.y), 4, color);
        draw_hollow_circle_mut(
            canvas,
            (geometry.basepoint.x, geometry.basepoint.y),
            4,
            box_color,
        );

        let b = &geometry.bounding_box;
        for i in 0..b.len() {
            draw_segment(canvas, b[i], b[(i + 1) % b.len()], box_color);
        }
    }
}

fn draw_segment(canvas: &mut RgbImage, from: Pixel, to: Pixel, color: Rgb<u8>) {
    draw_line_segment_mut(
        canvas,
        (from.x as f32, from.y as f32),
        (to.x as f32, to.y as f32),
        color,
    );
}

fn format_human_readable(output: &Output) -> String {
    let obs = &output.observation;
    let mut s = String::new();

    s.push_str(&format!("Input: {}\n", output.input));
    s.push_str(&format!(
        "Palm: center ({}, {}), height {:.1}\n",
        obs.palm_center.x, obs.palm_center.y, obs.palm_height
    ));
    s.push_str(&format!("Candidates: {}\n", obs.candidates.len()));

    s.push_str("\nHypothesis:\n");
    push_layout(&mut s, &obs.hypothesis);

    match &obs.estimate {
        Some(estimate) => {
            s.push_str("\nMAP estimate:\n");
            for &finger in Finger::ALL {
                if let Some(p) = estimate.get(finger) {
                    s.push_str(&format!("  {:<7} ({}, {})\n", finger.name(), p.x, p.y));
                }
            }
        }
        None => s.push_str("\nMAP estimate: none (not every finger matched)\n"),
    }

    if let Some(side) = &output.side_view {
        s.push_str("\nSide view:\n");
        push_layout(&mut s, side);
    }

    s
}

fn push_layout<F: FingerClass>(s: &mut String, layout: &HandLayout<F>) {
    s.push_str(&format!(
        "  Palm {:?} .. {:?}\n",
        layout.top_left, layout.bottom_right
    ));
    for (finger, g) in &layout.fingers {
        s.push_str(&format!(
            "  {:<7} tip ({}, {})  base ({}, {})  length {:.1}\n",
            finger.name(),
            g.tip.x,
            g.tip.y,
            g.basepoint.x,
            g.basepoint.y,
            g.length
        ));
    }
}
