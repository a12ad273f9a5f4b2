#![warn(missing_docs)]
//! # restyle binary
//!
//! CLI shell driving the capture-to-compare session and the demonstrative
//! upload endpoint.

use std::fs;
use std::io::Write as _;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use restyle_app::{
    app_version, camera_enabled_from_env, generate_design_pair, regenerate_design,
    service_url_from_env,
};
use restyle_capture::{CameraBackend, CaptureController, StartOutcome};
#[cfg(not(feature = "real-camera"))]
use restyle_capture::SyntheticCameraBackend;
use restyle_compare::{CompareController, SlotIndex};
use restyle_core::{CategorySelection, EncodedImage, parse_data_url, to_data_url};
use restyle_gen_client::{DesignServiceClient, HttpGenerationTransport};
use restyle_mailbox::{CAPTURED_PHOTO_KEY, SessionMailbox};
use restyle_ui::{FlowState, UpstreamResolution};

#[derive(Parser)]
#[command(name = "restyle", version = app_version(), about = "Capture a room photo and compare AI-generated redesigns")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the capture-to-compare session end to end.
    Flow(FlowArgs),
    /// Serve the demonstrative photo-upload endpoint.
    ServeUpload(ServeUploadArgs),
}

#[derive(Args)]
struct FlowArgs {
    /// Room photo file; omit to capture from the camera backend.
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Comma-joined category tags (floor,walls,furniture,lighting,decor).
    #[arg(long)]
    categories: String,

    /// Generation service base URL; falls back to RESTYLE_SERVICE_URL.
    #[arg(long)]
    service_url: Option<String>,

    /// Directory receiving generated design images.
    #[arg(long, default_value = "designs")]
    out_dir: PathBuf,
}

#[derive(Args)]
struct ServeUploadArgs {
    /// Port for the upload endpoint.
    #[arg(long, default_value_t = 8080)]
    port: u16,
}

fn main() -> Result<()> {
    env_logger::init();

    match Cli::parse().command {
        Command::Flow(args) => run_flow(args),
        Command::ServeUpload(args) => run_serve_upload(args),
    }
}

fn run_flow(args: FlowArgs) -> Result<()> {
    let mailbox = SessionMailbox::in_memory();
    let mut flow = FlowState::new();

    // Capture screen: acquire the photo and stage it for the next screen.
    let captured = acquire_photo(args.photo.as_deref())?;
    mailbox.put(CAPTURED_PHOTO_KEY, to_data_url(&captured));
    flow.photo_ready();

    // Categories screen: toggle the requested tags and pass the gate.
    let selection = CategorySelection::parse(&args.categories)
        .context("unrecognized --categories value")?;
    for category in selection.iter() {
        flow.toggle_category(category);
    }

    let payload = match flow.resolve_upstream(mailbox.take_once(CAPTURED_PHOTO_KEY)) {
        UpstreamResolution::Available(payload) => payload,
        UpstreamResolution::RedirectedToEntry => {
            bail!("captured photo went missing; start over from capture")
        }
    };
    let navigation = flow.activate_generate(&payload)?;
    println!("Generating two designs for: {}", navigation.tags);
    mailbox.put(CAPTURED_PHOTO_KEY, payload);

    // Compare screen: consume the staged photo and drive the refine loop.
    let payload = match flow.resolve_upstream(mailbox.take_once(CAPTURED_PHOTO_KEY)) {
        UpstreamResolution::Available(payload) => payload,
        UpstreamResolution::RedirectedToEntry => {
            bail!("captured photo went missing; start over from capture")
        }
    };
    let decoded = parse_data_url(&payload)?;
    let source = EncodedImage::new(decoded.bytes, decoded.mime, captured.width, captured.height)?;

    let service_url = args.service_url.unwrap_or_else(service_url_from_env);
    let client = DesignServiceClient::new(&service_url, Arc::new(HttpGenerationTransport::new()?))?;

    run_compare_loop(&client, &source, &args.out_dir)
}

fn acquire_photo(photo: Option<&Path>) -> Result<EncodedImage> {
    let mut controller = CaptureController::new(camera_backend());

    if let Some(path) = photo {
        let bytes =
            fs::read(path).with_context(|| format!("cannot read photo '{}'", path.display()))?;
        return Ok(controller.ingest_file(&bytes)?.clone());
    }

    if !camera_enabled_from_env() {
        bail!("camera capture is disabled (RESTYLE_CAMERA_ENABLED); pass --photo <file> instead");
    }

    match controller.start_camera() {
        StartOutcome::Streaming => Ok(controller.capture_still()?.clone()),
        StartOutcome::FallbackToFilePicker { reason } => {
            bail!("camera unavailable ({reason}); pass --photo <file> instead")
        }
    }
}

fn camera_backend() -> Arc<dyn CameraBackend> {
    #[cfg(feature = "real-camera")]
    {
        Arc::new(restyle_capture::RealCameraBackend::new())
    }
    #[cfg(not(feature = "real-camera"))]
    {
        Arc::new(SyntheticCameraBackend::new())
    }
}

fn run_compare_loop(
    client: &DesignServiceClient,
    source: &EncodedImage,
    out_dir: &Path,
) -> Result<()> {
    fs::create_dir_all(out_dir)
        .with_context(|| format!("cannot create output directory '{}'", out_dir.display()))?;

    let mut compare = CompareController::new();

    // Initial pair: both calls issued together, rendered only when both land.
    loop {
        let pair = compare.begin_pair()?;
        match generate_design_pair(client, source) {
            Ok(displays) => {
                compare.commit_pair(pair.request_id, displays);
                break;
            }
            Err(error) => {
                compare.fail_pair(pair.request_id, error.to_string());
                eprintln!("Initial generation failed: {error}");
                if !prompt("Retry the full pair? [y/N] ")?.starts_with('y') {
                    return Ok(());
                }
            }
        }
    }

    loop {
        write_designs(&compare, out_dir)?;

        let choice = prompt("Keep which design? [0/1], q to finish: ")?;
        let kept = match choice.as_str() {
            "0" => SlotIndex::First,
            "1" => SlotIndex::Second,
            "q" => break,
            _ => continue,
        };

        let regeneration = compare.choose(kept)?;
        match regenerate_design(client, source) {
            Ok(display) => {
                compare.commit_regeneration(regeneration.request_id, display);
            }
            Err(error) => {
                compare.fail_regeneration(regeneration.request_id, error.to_string());
                eprintln!("Regeneration failed; keeping the previous pair: {error}");
            }
        }
    }

    Ok(())
}

fn write_designs(compare: &CompareController, out_dir: &Path) -> Result<()> {
    for slot in [SlotIndex::First, SlotIndex::Second] {
        let Some(design) = compare.slot(slot) else {
            continue;
        };
        let decoded = parse_data_url(&design.display)?;
        let path = out_dir.join(format!(
            "{}.{}",
            design.id,
            extension_for_mime(&decoded.mime)
        ));
        fs::write(&path, &decoded.bytes)
            .with_context(|| format!("cannot write design '{}'", path.display()))?;
        println!("  [{}] {}", slot.as_usize(), path.display());
    }
    Ok(())
}

fn extension_for_mime(mime: &str) -> &'static str {
    match mime {
        "image/png" => "png",
        "image/jpeg" => "jpg",
        _ => "img",
    }
}

fn prompt(message: &str) -> Result<String> {
    print!("{message}");
    std::io::stdout().flush()?;

    let mut line = String::new();
    std::io::stdin().read_line(&mut line)?;
    Ok(line.trim().to_ascii_lowercase())
}

fn run_serve_upload(args: ServeUploadArgs) -> Result<()> {
    let addr = SocketAddr::from(([127, 0, 0, 1], args.port));
    println!("Serving upload endpoint on http://{addr}/api/upload");

    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("cannot start async runtime")?
        .block_on(restyle_ingest::serve(addr))
        .context("upload endpoint terminated")
}
