use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "montage", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile one frame and print its render graph.
    Compile(CompileArgs),
    /// Apply a list of edit commands to a timeline.
    Edit(EditArgs),
}

#[derive(Parser, Debug)]
struct CompileArgs {
    /// Input timeline JSON.
    #[arg(long)]
    timeline: PathBuf,

    /// Playhead in seconds.
    #[arg(long)]
    at: f64,

    /// Quality tier (draft, preview, full).
    #[arg(long, default_value = "preview")]
    quality: montage::Quality,

    /// Effect manifests JSON (array). Defaults to the built-in registry.
    #[arg(long)]
    registry: Option<PathBuf>,

    /// Compiler config JSON.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Frame context JSON with per-clip regions.
    #[arg(long)]
    regions: Option<PathBuf>,
}

#[derive(Parser, Debug)]
struct EditArgs {
    /// Input timeline JSON.
    #[arg(long)]
    timeline: PathBuf,

    /// JSON array of edit commands, applied in order.
    #[arg(long)]
    commands: PathBuf,

    /// Output timeline JSON. Printed to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Compile(args) => cmd_compile(args),
        Command::Edit(args) => cmd_edit(args),
    }
}

fn cmd_compile(args: CompileArgs) -> anyhow::Result<()> {
    let timeline = load_timeline(&args.timeline)?;
    let registry = match &args.registry {
        Some(path) => montage::ManifestRegistry::from_path(path)?,
        None => montage::standard_registry(),
    };
    let config = match &args.config {
        Some(path) => montage::CompilerConfig::from_path(path)?,
        None => montage::CompilerConfig::default(),
    };
    let ctx = match &args.regions {
        Some(path) => montage::FrameContext::from_path(path)?,
        None => montage::FrameContext::new(),
    };

    let compiler = montage::TimelineCompiler::new(registry, config)?;
    let req = compiler
        .compile(&timeline, montage::Time(args.at), args.quality, &ctx)
        .with_context(|| format!("compile '{}' at {}s", args.timeline.display(), args.at))?;

    print!("{}", req.graph.dump());
    println!(
        "resolution: {}x{} ({})",
        req.resolution.width,
        req.resolution.height,
        req.quality.as_str()
    );
    println!("fingerprint: {}", req.graph.fingerprint());
    Ok(())
}

fn cmd_edit(args: EditArgs) -> anyhow::Result<()> {
    let mut timeline = load_timeline(&args.timeline)?;
    let commands = read_commands(&args.commands)?;

    let sink = montage::MemoryTraceSink::new();
    let mut applied = 0usize;
    for cmd in &commands {
        let outcome = montage::apply_command(&mut timeline, cmd, &sink);
        if outcome.is_applied() {
            applied += 1;
        }
        for ev in sink.take() {
            let fields = ev
                .fields
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join(" ");
            eprintln!("{} {fields}", ev.name);
        }
    }

    let json = serde_json::to_string_pretty(&timeline).context("serialize timeline")?;
    match &args.out {
        Some(out) => {
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(out, json).with_context(|| format!("write '{}'", out.display()))?;
            eprintln!(
                "applied {applied}/{} commands, wrote {}",
                commands.len(),
                out.display()
            );
        }
        None => println!("{json}"),
    }
    Ok(())
}

/// Parse, validate and normalize the duration of a timeline file.
fn load_timeline(path: &Path) -> anyhow::Result<montage::Timeline> {
    let mut timeline = montage::Timeline::from_path(path)?;
    timeline
        .validate()
        .with_context(|| format!("invalid timeline '{}'", path.display()))?;
    timeline.recompute_duration();
    Ok(timeline)
}

fn read_commands(path: &Path) -> anyhow::Result<Vec<montage::IntentCommand>> {
    let f = std::fs::File::open(path)
        .with_context(|| format!("open commands '{}'", path.display()))?;
    serde_json::from_reader(std::io::BufReader::new(f))
        .with_context(|| format!("parse commands '{}'", path.display()))
}
