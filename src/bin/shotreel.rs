use std::{
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::Context as _;
use clap::{Args, Parser, Subcommand};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use shotreel::{
    Clip, ConformMode, Config, Edit, FfmpegTool, FindOptions, FootageSource, Location,
    mask_file, save_shot_list, scan_folder, shotlist,
};

#[derive(Parser, Debug)]
#[command(name = "shotreel", version, about = "Assemble stamped review edits from dailies")]
struct Cli {
    /// Log at debug level (overridden by RUST_LOG).
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve footage, stamp every clip and concatenate the edit.
    Build(BuildArgs),
    /// Write a shot list for the video files in a folder.
    Scan(ScanArgs),
    /// Stamp every video in a folder with the shot mask.
    Mask(MaskArgs),
}

#[derive(Args, Debug)]
#[group(required = true, multiple = false, id = "footage_source")]
struct SourceArgs {
    /// Footage folder, scanned recursively.
    #[arg(long)]
    footage: Option<PathBuf>,

    /// Location tree JSON.
    #[arg(long)]
    locations: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct BuildArgs {
    /// Config JSON. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Shot-list JSON.
    #[arg(long, conflicts_with = "shot")]
    shots: Option<PathBuf>,

    /// Shot name, appended in order. Repeatable.
    #[arg(long, required_unless_present = "shots")]
    shot: Vec<String>,

    #[command(flatten)]
    source: SourceArgs,

    /// Pass name shown on masks and slates.
    #[arg(long)]
    pass: Option<String>,

    /// Only take footage from the location named by --pass.
    #[arg(long, requires = "pass")]
    force_pass: bool,

    /// Only take footage from this location (ignored with --force-pass).
    #[arg(long)]
    location: Option<String>,

    /// Use footage lengths instead of shot-list durations.
    #[arg(long)]
    footage_lengths: bool,

    /// Conform mode: in_frame, in_frame_clip or duration.
    #[arg(long)]
    conform: Option<String>,

    /// Add a slate; an optional value sets its length in seconds.
    #[arg(long, num_args = 0..=1)]
    slate: Option<Option<f64>>,

    /// Concatenate without re-encoding (no sequence timecode).
    #[arg(long)]
    fast: bool,

    /// Directory for per-clip renders.
    #[arg(long)]
    temp: Option<PathBuf>,

    /// Leave per-clip renders on disk.
    #[arg(long)]
    keep_temp: bool,

    /// Output MP4 path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ScanArgs {
    #[arg(long)]
    folder: PathBuf,

    /// Shot-list JSON to write.
    #[arg(long)]
    out: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct MaskArgs {
    #[arg(long)]
    folder: PathBuf,

    #[arg(long)]
    out_dir: PathBuf,

    #[arg(long)]
    config: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);
    match cli.cmd {
        Command::Build(args) => cmd_build(args),
        Command::Scan(args) => cmd_scan(args),
        Command::Mask(args) => cmd_mask(args),
    }
}

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let cfg = match path {
        Some(p) => Config::load(p)?,
        None => Config::default(),
    };
    cfg.validate()?;
    Ok(cfg)
}

fn cmd_build(args: BuildArgs) -> anyhow::Result<()> {
    let mut cfg = load_config(args.config.as_deref())?;
    if let Some(pass) = &args.pass {
        cfg = cfg.with_pass(pass.clone());
    }
    let force = cfg.force_pass || args.force_pass;
    cfg = cfg.with_force_pass(force);
    let cfg = Arc::new(cfg);
    let tool = FfmpegTool::from_config(&cfg);

    let by_name = args.shots.is_none();
    let mut edit = match &args.shots {
        Some(path) => Edit::from_shot_list(Arc::clone(&cfg), path)?,
        None => {
            let mut edit = Edit::new(Arc::clone(&cfg));
            for name in &args.shot {
                edit.add_clip(Clip::new(Arc::clone(&cfg), name.clone(), 0, 0.0), true);
            }
            edit
        }
    };

    let locations = args
        .source
        .locations
        .as_deref()
        .map(Location::load)
        .transpose()?;
    let source = match (&locations, &args.source.footage) {
        (Some(root), _) => FootageSource::Locations(root),
        (None, Some(folder)) => FootageSource::Folder(folder),
        (None, None) => anyhow::bail!("one of --footage or --locations is required"),
    };
    let opts = FindOptions {
        location_filter: args.location.clone(),
        duration_from_footage: args.footage_lengths,
    };
    edit.find_footage(source, &opts, &tool);

    match args.conform.as_deref() {
        Some(mode) => {
            edit.conform_named(mode);
        }
        // Shots given by name only get their lengths from footage.
        None if by_name => edit.conform(ConformMode::Duration),
        None => {}
    }
    if let Some(duration) = args.slate {
        edit.add_auto_slate(duration);
    }

    let report = edit.preconvert_clips(&tool, args.temp.as_deref())?;
    for failure in &report.failures {
        warn!(clip = %failure.name, error = %failure.error, "clip left out of the edit");
    }

    let built = if args.fast {
        edit.fastbuild(&args.out, &tool)
    } else {
        edit.build(&args.out, &tool)
    };

    if args.keep_temp {
        info!(dir = %report.temp_dir.display(), "keeping per-clip renders");
    } else {
        edit.cleanup()?;
    }

    let out = built?;
    eprintln!("wrote {}", out.display());
    Ok(())
}

fn cmd_scan(args: ScanArgs) -> anyhow::Result<()> {
    let cfg = load_config(args.config.as_deref())?;
    let tool = FfmpegTool::from_config(&cfg);
    let shots = scan_folder(&args.folder, &tool)?;
    save_shot_list(&args.out, &shots)?;
    eprintln!("wrote {} ({} shots)", args.out.display(), shots.len());
    Ok(())
}

fn cmd_mask(args: MaskArgs) -> anyhow::Result<()> {
    let cfg = Arc::new(load_config(args.config.as_deref())?);
    let tool = FfmpegTool::from_config(&cfg);
    std::fs::create_dir_all(&args.out_dir)
        .with_context(|| format!("create output dir '{}'", args.out_dir.display()))?;

    let mut failed = 0usize;
    for path in shotlist::video_files(&args.folder)? {
        match mask_file(Arc::clone(&cfg), &path, &args.out_dir, &tool) {
            Ok(out) => eprintln!("wrote {}", out.display()),
            Err(err) => {
                warn!(path = %path.display(), error = %err, "mask failed");
                failed += 1;
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} file(s) could not be masked");
    }
    Ok(())
}
