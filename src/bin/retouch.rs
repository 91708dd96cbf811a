use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::Parser;

use retouch::app::{EditorController, EditorEvent, HeadlessRuntime};
use retouch::clipboard::WlCopyBackend;
use retouch::config::load_app_config;
use retouch::editor::{ActionType, DetachedCropper};
use retouch::geometry::{ElementBox, PixelRect, Point, PointerPosition};
use retouch::input::SourceFile;
use retouch::notification::{DesktopNotifier, LogNotifier, NoticeKind, Notifier};
use retouch::remote::HttpRemovalService;
use retouch::state::ModeEvent;
use retouch::storage::StorageService;

/// Send an image to the watermark-removal service and save the result.
#[derive(Debug, Parser)]
#[command(name = "retouch", version)]
struct Cli {
    /// Source image.
    input: PathBuf,

    /// Region to remove, in image pixels: X,Y,W,H.
    #[arg(long, value_parser = parse_rect, conflicts_with = "stroke")]
    rect: Option<PixelRect>,

    /// Brush stroke as space-separated image points: "x,y x,y ...".
    /// Repeat for several strokes; each one is sent on its own.
    #[arg(long, value_parser = parse_stroke)]
    stroke: Vec<Stroke>,

    /// Treatment for brushed areas.
    #[arg(long, value_parser = parse_action)]
    action: Option<ActionType>,

    #[arg(long)]
    brush_size: Option<u32>,

    /// Removal endpoint; overrides the config file.
    #[arg(long)]
    endpoint: Option<String>,

    /// Directory for the exported result.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Also copy the result to the clipboard.
    #[arg(long)]
    copy: bool,

    /// Show failures as desktop notifications.
    #[arg(long)]
    notify: bool,
}

#[derive(Debug, Clone)]
struct Stroke(Vec<Point>);

fn parse_numbers<T: std::str::FromStr>(value: &str, expected: usize) -> Result<Vec<T>, String> {
    let numbers = value
        .split(',')
        .map(|part| part.trim().parse::<T>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|_| format!("`{value}` is not a list of numbers"))?;
    if numbers.len() != expected {
        return Err(format!("`{value}` needs {expected} comma-separated numbers"));
    }
    Ok(numbers)
}

fn parse_rect(value: &str) -> Result<PixelRect, String> {
    let numbers = parse_numbers::<u32>(value, 4)?;
    Ok(PixelRect::new(numbers[0], numbers[1], numbers[2], numbers[3]))
}

fn parse_stroke(value: &str) -> Result<Stroke, String> {
    let points = value
        .split_whitespace()
        .map(|pair| parse_numbers::<f64>(pair, 2).map(|xy| Point::new(xy[0], xy[1])))
        .collect::<Result<Vec<_>, _>>()?;
    if points.is_empty() {
        return Err("a stroke needs at least one point".to_string());
    }
    Ok(Stroke(points))
}

fn parse_action(value: &str) -> Result<ActionType, String> {
    value.parse().map_err(|err| format!("{err}"))
}

fn main() -> Result<()> {
    retouch::logging::init();
    let cli = Cli::parse();
    if cli.rect.is_none() && cli.stroke.is_empty() {
        bail!("nothing to remove: pass --rect or at least one --stroke");
    }

    let config = load_app_config();
    let endpoint = cli
        .endpoint
        .clone()
        .unwrap_or_else(|| config.endpoint().to_string());
    let mut brush = config.brush_options();
    if let Some(size) = cli.brush_size {
        brush.set_size(size);
    }
    if let Some(action) = cli.action {
        brush.set_action(action);
    }
    let storage = match cli.out.clone().or_else(|| config.export_dir.clone()) {
        Some(dir) => StorageService::with_export_dir(dir),
        None => StorageService::with_default_paths()
            .context("failed to resolve current directory")?,
    };

    let service = HttpRemovalService::new(&endpoint, config.request_timeout())
        .context("failed to build HTTP client")?;
    let notifier: Box<dyn Notifier> = if cli.notify {
        Box::new(DesktopNotifier)
    } else {
        Box::new(LogNotifier)
    };
    let mut runtime = HeadlessRuntime::new(
        EditorController::new(DetachedCropper::new(), brush),
        Arc::new(service),
        Box::new(WlCopyBackend),
        Box::new(storage),
        notifier,
    );
    tracing::info!(endpoint = %endpoint, input = %cli.input.display(), "starting");

    let source = SourceFile::from_path(&cli.input)?;
    runtime.dispatch(EditorEvent::LoadFile(source));
    let natural = runtime
        .controller()
        .session()
        .natural_size()
        .with_context(|| format!("{} could not be loaded", cli.input.display()))?;
    // Lay the image out at its natural size so screen and image pixels agree.
    let image_box = ElementBox::sized(f64::from(natural.width), f64::from(natural.height));
    runtime.dispatch(EditorEvent::ImageLaidOut(image_box));

    if let Some(rect) = cli.rect {
        runtime.dispatch(EditorEvent::SwitchMode(ModeEvent::SelectRect));
        runtime.dispatch(EditorEvent::CoordinatesEdited(rect));
        runtime.wait_for_requests();
    }
    for Stroke(points) in &cli.stroke {
        let mut points = points.iter().map(|point| PointerPosition::new(point.x, point.y));
        if let Some(first) = points.next() {
            runtime.dispatch(EditorEvent::PointerDown(first));
        }
        for point in points {
            runtime.dispatch(EditorEvent::PointerMove(point));
        }
        runtime.dispatch(EditorEvent::PointerUp);
        runtime.wait_for_requests();
    }

    if let Some(failure) = runtime.notices().iter().rev().find(|notice| {
        matches!(
            notice.kind,
            NoticeKind::Input | NoticeKind::Transport | NoticeKind::Service
        )
    }) {
        bail!("removal failed: {failure}");
    }

    runtime.dispatch(EditorEvent::Download);
    if cli.copy {
        runtime.dispatch(EditorEvent::Copy);
    }
    for path in runtime.exports() {
        println!("{}", path.display());
    }
    if runtime.exports().is_empty() {
        bail!("no result was written");
    }
    Ok(())
}
