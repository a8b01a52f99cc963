use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::Parser;
use disk_geometry::Axis;
use disk_inspector::{InspectorConfig, Session, SessionError};
use format_adf::ExportFormat;
use log::{info, warn};

#[derive(Parser)]
#[command(name = "disk-inspector", about = "Inspect, check and export floppy disk images")]
struct Args {
    /// ADF or IMG/IMA image to open
    image: PathBuf,

    /// JSON config file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Check the file system in strict mode
    #[arg(long, default_value_t = false)]
    strict: bool,

    #[arg(long, allow_negative_numbers = true)]
    cylinder: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    head: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    track: Option<i64>,

    #[arg(long, allow_negative_numbers = true)]
    sector: Option<i64>,

    #[arg(long, allow_negative_numbers = true,
          conflicts_with_all = ["cylinder", "head", "track", "sector"])]
    block: Option<i64>,

    /// Jump forward this many corrupted blocks
    #[arg(long, default_value_t = 0)]
    next: u32,

    /// Jump back this many corrupted blocks
    #[arg(long, default_value_t = 0)]
    prev: u32,

    /// Byte offset to explain
    #[arg(long)]
    select: Option<usize>,

    /// Print a hex dump of the current block
    #[arg(long, default_value_t = false)]
    dump: bool,

    /// Print the session summary as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Export the image to this file
    #[arg(long)]
    export: Option<PathBuf>,

    /// Export format (adf, img, ima); defaults to the export file's extension
    #[arg(long)]
    format: Option<ExportFormat>,
}

fn load_config(args: &Args) -> Result<InspectorConfig> {
    let mut config = match &args.config {
        Some(path) => InspectorConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => InspectorConfig::default(),
    };
    if args.strict {
        config.strict = true;
    }
    Ok(config)
}

fn navigate(session: &mut Session, args: &Args) -> Result<()> {
    let edits = [
        (Axis::Track, args.track),
        (Axis::Cylinder, args.cylinder),
        (Axis::Head, args.head),
        (Axis::Sector, args.sector),
        (Axis::Block, args.block),
    ];
    for (axis, value) in edits {
        if let Some(value) = value {
            let address = session.goto(axis, value);
            if i64::from(address.get(axis)) != value {
                warn!("{axis} {value} clamped to {}", address.get(axis));
            }
        }
    }

    for _ in 0..args.next {
        match session.jump_next_corrupted() {
            Ok(block) => info!("next corrupted block: {block}"),
            Err(SessionError::NoCorruption) => {
                warn!("no corrupted blocks to jump to");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }
    for _ in 0..args.prev {
        match session.jump_prev_corrupted() {
            Ok(block) => info!("previous corrupted block: {block}"),
            Err(SessionError::NoCorruption) => {
                warn!("no corrupted blocks to jump to");
                break;
            }
            Err(e) => return Err(e.into()),
        }
    }

    if let Some(offset) = args.select {
        session.toggle_selection(offset);
    }
    Ok(())
}

/// An explicit `--format` wins; otherwise the file extension decides.
fn export_format(path: &Path, explicit: Option<ExportFormat>) -> Result<ExportFormat> {
    if let Some(format) = explicit {
        return Ok(format);
    }
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .and_then(ExportFormat::from_extension)
    {
        Some(format) => Ok(format),
        None => bail!("cannot tell export format of {}; use --format", path.display()),
    }
}

fn export(session: &Session, args: &Args) -> Result<()> {
    let Some(path) = &args.export else {
        return Ok(());
    };
    let format = export_format(path, args.format)?;
    session
        .export(path, format)
        .with_context(|| format!("exporting to {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config(&args)?;
    let mut session = Session::open_path(&args.image, &config)
        .with_context(|| format!("opening {}", args.image.display()))?;

    navigate(&mut session, &args)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&session.summary())?);
    } else {
        let summary = session.summary();
        println!("{}", summary.layout);
        println!("{}", summary.volume);
        println!("{}", summary.position);
        if let Some(corruption) = &summary.corruption {
            println!("{corruption}");
        }
        if let Some(report) = summary.report.filter(|r| r.bitmap_errors > 0) {
            println!("{} bitmap error(s)", report.bitmap_errors);
        }
        if !summary.info.is_empty() {
            println!("{}", summary.info);
        }
    }

    if args.dump {
        for row in session.hex_rows() {
            println!("{row}");
        }
    }

    export(&session, &args)
}
