use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use anyhow::Context as _;
use clap::{Parser, Subcommand, ValueEnum};
use hookdance::AudioClock as _;
use sha2::Digest as _;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};

#[derive(Parser, Debug)]
#[command(name = "hookdance", version)]
struct Cli {
    /// Default log level (`RUST_LOG` takes precedence).
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    log_level: LogLevel,

    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a direction document against a lyric sheet.
    Validate(ValidateArgs),
    /// Repair raw generator output into a complete direction document.
    Repair(RepairArgs),
    /// Render a single frame of a song as a PNG.
    Frame(FrameArgs),
    /// Step through a whole song and print a determinism digest.
    Simulate(SimulateArgs),
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Direction JSON.
    #[arg(long)]
    direction: PathBuf,

    /// Lyric lines JSON (`[{text, start, end}, ...]`).
    #[arg(long)]
    lyrics: PathBuf,
}

#[derive(Parser, Debug)]
struct RepairArgs {
    /// Raw generator output.
    #[arg(long = "in")]
    in_path: PathBuf,

    /// Lyric lines JSON.
    #[arg(long)]
    lyrics: PathBuf,

    /// Output JSON path (stdout when omitted).
    #[arg(long)]
    out: Option<PathBuf>,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct FrameArgs {
    /// Song record JSON.
    #[arg(long)]
    song: PathBuf,

    /// Playback time in seconds.
    #[arg(long)]
    time: f64,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,

    /// Seconds of playback simulated before the frame so physics has warmed up.
    #[arg(long, default_value_t = 2.0)]
    preroll: f64,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct SimulateArgs {
    /// Song record JSON.
    #[arg(long)]
    song: PathBuf,

    /// Frames per second of playback.
    #[arg(long, default_value_t = 30)]
    fps: u32,

    /// Engine config JSON.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogLevel {
    Off,
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for LevelFilter {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Off => LevelFilter::OFF,
            LogLevel::Error => LevelFilter::ERROR,
            LogLevel::Warn => LevelFilter::WARN,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Trace => LevelFilter::TRACE,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging(cli.log_level);
    match cli.cmd {
        Command::Validate(args) => cmd_validate(args),
        Command::Repair(args) => cmd_repair(args),
        Command::Frame(args) => cmd_frame(args),
        Command::Simulate(args) => cmd_simulate(args),
    }
}

fn init_logging(level: LogLevel) {
    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::from(level).into())
        .from_env_lossy();
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn read_lyrics(path: &Path) -> anyhow::Result<Vec<hookdance::LyricLine>> {
    let bytes = std::fs::read(path).with_context(|| format!("open lyrics '{}'", path.display()))?;
    let lines: Vec<hookdance::LyricLine> =
        serde_json::from_slice(&bytes).with_context(|| "parse lyrics JSON")?;
    hookdance::LyricLine::validate_sequence(&lines)?;
    Ok(lines)
}

fn read_config(path: Option<&Path>) -> anyhow::Result<hookdance::EngineConfig> {
    match path {
        Some(p) => Ok(hookdance::EngineConfig::from_path(p)?),
        None => Ok(hookdance::EngineConfig::default()),
    }
}

fn build_engine(
    song: &Path,
    config: &hookdance::EngineConfig,
) -> anyhow::Result<hookdance::PlaybackEngine> {
    let record = hookdance::SongRecord::from_path(song)?;
    let inputs = hookdance::SessionInputs::from_record(&record);
    Ok(hookdance::PlaybackEngine::new(inputs, config)?)
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let lines = read_lyrics(&args.lyrics)?;
    let bytes = std::fs::read(&args.direction)
        .with_context(|| format!("open direction '{}'", args.direction.display()))?;
    let value: serde_json::Value =
        serde_json::from_slice(&bytes).with_context(|| "parse direction JSON")?;

    let defects = hookdance::validate_direction(Some(&value), lines.len());
    for d in &defects {
        println!("{d}");
    }
    if !defects.is_empty() {
        let msg = format!("direction has {} defect(s)", defects.len());
        return Err(hookdance::DanceError::direction(msg).into());
    }
    println!("ok");
    Ok(())
}

fn cmd_repair(args: RepairArgs) -> anyhow::Result<()> {
    let lines = read_lyrics(&args.lyrics)?;
    let config = read_config(args.config.as_deref())?;
    let raw = std::fs::read_to_string(&args.in_path)
        .with_context(|| format!("open raw direction '{}'", args.in_path.display()))?;

    let outcome = hookdance::ingest_direction(&raw, &lines);
    eprintln!("ingest: {}", outcome.kind());
    for d in outcome.defects() {
        eprintln!("  {d}");
    }
    let prepared =
        hookdance::prepare_direction(outcome.into_playable(&lines), &lines, &config.icons);
    for a in &prepared.actions {
        eprintln!("  synthesized {}: {}", a.field, a.action);
    }
    eprintln!("  icons added: {}", prepared.icons.added.len());

    let json = serde_json::to_string_pretty(&prepared.doc).context("serialize direction")?;
    match &args.out {
        Some(out) => {
            write_parent_dir(out)?;
            std::fs::write(out, json + "\n")
                .with_context(|| format!("write direction '{}'", out.display()))?;
            eprintln!("wrote {}", out.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn cmd_frame(args: FrameArgs) -> anyhow::Result<()> {
    let config = read_config(args.config.as_deref())?;
    let mut engine = build_engine(&args.song, &config)?;
    anyhow::ensure!(args.time.is_finite() && args.time >= 0.0, "--time must be >= 0");

    let fonts = config.fonts()?;
    let step = 1.0 / config.tick_hz;
    let mut warmup = hookdance::DisplayList::with_fonts(config.canvas, fonts.clone());
    let mut clock = hookdance::ManualClock::at((args.time - args.preroll.max(0.0)).max(0.0));
    clock.play();
    while clock.current_time() + step < args.time {
        warmup.reset();
        engine.frame(&clock, &mut warmup);
        clock.advance(step);
    }
    clock.set_time(args.time);

    let mut canvas = hookdance::CpuCanvas::with_fonts(config.canvas, fonts)?;
    let report = engine.frame(&clock, &mut canvas);
    let frame = canvas.finish();

    write_parent_dir(&args.out)?;
    image::save_buffer_with_format(
        &args.out,
        &frame.data,
        frame.width,
        frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!(
        "wrote {} (line {:?}, effect {})",
        args.out.display(),
        report.line_index,
        report.effect.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn cmd_simulate(args: SimulateArgs) -> anyhow::Result<()> {
    anyhow::ensure!(args.fps > 0, "--fps must be > 0");
    let config = read_config(args.config.as_deref())?;
    let mut engine = build_engine(&args.song, &config)?;

    let fps = f64::from(args.fps);
    let frames = (engine.duration() * fps).ceil() as u64 + 1;
    let mut list = hookdance::DisplayList::with_fonts(config.canvas, config.fonts()?);
    let mut clock = hookdance::ManualClock::new();
    let mut digest = sha2::Sha256::new();
    let mut lines_seen = std::collections::BTreeSet::new();
    let mut effects: BTreeMap<String, u64> = BTreeMap::new();
    let mut surprises = 0u64;
    let mut skipped = 0usize;

    for n in 0..frames {
        clock.set_time(n as f64 / fps);
        list.reset();
        let report = engine.frame(&clock, &mut list);
        digest.update(list.fingerprint().to_bytes());
        if let Some(i) = report.line_index {
            lines_seen.insert(i);
        }
        if let Some(e) = report.effect {
            *effects.entry(e).or_default() += 1;
        }
        surprises += u64::from(report.surprise.is_some());
        skipped += report.skipped_beats;
    }

    let summary = serde_json::json!({
        "frames": frames,
        "duration_s": engine.duration(),
        "lines": engine.lines().len(),
        "lines_drawn": lines_seen.len(),
        "effects": effects,
        "micro_surprises": surprises,
        "skipped_beats": skipped,
        "digest": hex(&digest.finalize()),
    });
    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn write_parent_dir(path: &Path) -> anyhow::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }
    Ok(())
}

fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 2);
    for b in bytes {
        out.push_str(&format!("{:02x}", b));
    }
    out
}
