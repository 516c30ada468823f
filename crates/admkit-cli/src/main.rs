use std::collections::HashSet;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use admkit_metadata::RenderableItem;
use admkit_session::{Session, SessionConfig};
use anyhow::{anyhow, bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .try_init()
        .ok();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => SessionConfig::load_from_path(path),
        None => SessionConfig::load(),
    };
    match cli.command {
        Commands::Items(args) => execute_items(config, args),
        Commands::Blocks(args) => execute_blocks(config, args),
        Commands::Audio(args) => execute_audio(config, args),
    }
}

#[derive(Parser)]
#[command(author, version, about = "Inspection tools for ADM scenes and their audio")]
struct Cli {
    /// Session configuration (JSON). Defaults to the user config directory.
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the renderable items discovered in a scene.
    Items(ItemsArgs),
    /// Stream every timed parameter block as JSON lines.
    Blocks(BlocksArgs),
    /// Read a window of samples through the block cache.
    Audio(AudioArgs),
}

#[derive(Args)]
struct SceneArgs {
    /// Scene description (JSON document plus channel table).
    #[arg(long)]
    scene: PathBuf,
    /// Audio file the scene's track UIDs point into.
    #[arg(long)]
    audio: PathBuf,
}

#[derive(Args)]
struct ItemsArgs {
    #[command(flatten)]
    scene: SceneArgs,
    /// Output style.
    #[arg(long, value_enum, default_value_t = ListFormat::Table)]
    format: ListFormat,
    /// Include items that cannot be rendered.
    #[arg(long)]
    all: bool,
}

#[derive(Args)]
struct BlocksArgs {
    #[command(flatten)]
    scene: SceneArgs,
    /// Stop after this many blocks.
    #[arg(long)]
    limit: Option<usize>,
}

#[derive(Args)]
struct AudioArgs {
    #[command(flatten)]
    scene: SceneArgs,
    /// First frame of the window; may be negative.
    #[arg(long, allow_hyphen_values = true, default_value_t = 0)]
    start: i64,
    /// Number of frames to read.
    #[arg(long)]
    frames: usize,
    /// 0-based source channel, repeatable. Defaults to every channel in the
    /// scene's channel table.
    #[arg(long = "channel", allow_hyphen_values = true)]
    channels: Vec<i32>,
    /// First audible frame.
    #[arg(long, allow_hyphen_values = true)]
    lower: Option<i64>,
    /// Last audible frame.
    #[arg(long)]
    upper: Option<i64>,
    /// Write the window to a 32-bit float WAV file instead of stdout.
    #[arg(long)]
    output: Option<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum ListFormat {
    Table,
    Json,
}

#[derive(Serialize)]
struct ItemSummary<'a> {
    id: String,
    #[serde(rename = "type")]
    type_definition: String,
    name: &'a str,
    start: f64,
    end: f64,
    channels: usize,
    programmes: Vec<u16>,
    valid: bool,
}

impl<'a> ItemSummary<'a> {
    fn new(item: &'a RenderableItem, valid: bool) -> Self {
        Self {
            id: item.id.to_string(),
            type_definition: item.type_definition.to_string(),
            name: &item.presented_name,
            start: item.start_time,
            end: item.end_time,
            channels: item.channel_count(),
            programmes: item.programme_numbers().collect(),
            valid,
        }
    }
}

fn open_session(config: SessionConfig, args: &SceneArgs) -> Result<Session> {
    let mut session = Session::new(config);
    session.open(&args.scene, &args.audio).with_context(|| {
        format!(
            "failed to open scene {} with audio {}",
            args.scene.display(),
            args.audio.display()
        )
    })?;
    if !session.config().discover_on_open {
        session.discover();
    }
    Ok(session)
}

fn execute_items(config: SessionConfig, args: ItemsArgs) -> Result<()> {
    let session = open_session(config, &args.scene)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    write_items(&session, args.format, args.all, &mut out)?;
    out.flush()?;
    Ok(())
}

fn write_items(
    session: &Session,
    format: ListFormat,
    all: bool,
    out: &mut impl Write,
) -> Result<()> {
    let graph = session.extractor().graph();
    let valid: HashSet<_> = graph.valid_items().map(|item| item.id).collect();
    let summaries: Vec<_> = graph
        .items()
        .map(|item| ItemSummary::new(item, valid.contains(&item.id)))
        .filter(|summary| all || summary.valid)
        .collect();

    match format {
        ListFormat::Json => {
            serde_json::to_writer_pretty(&mut *out, &summaries)?;
            writeln!(out)?;
        }
        ListFormat::Table => {
            writeln!(
                out,
                "{:<16}  {:<14}  {:>8}  {:>10}  {:>3}  name",
                "id", "type", "start", "end", "ch"
            )?;
            for summary in &summaries {
                writeln!(
                    out,
                    "{:<16}  {:<14}  {:>8.3}  {:>10.3}  {:>3}  {}{}",
                    summary.id,
                    summary.type_definition,
                    summary.start,
                    summary.end,
                    summary.channels,
                    summary.name,
                    if summary.valid { "" } else { " (invalid)" }
                )?;
            }
            writeln!(
                out,
                "{} items, {} renderable, {} channels",
                graph.item_count(),
                graph.valid_count(),
                graph.channel_count()
            )?;
        }
    }
    Ok(())
}

fn execute_blocks(config: SessionConfig, args: BlocksArgs) -> Result<()> {
    let mut session = open_session(config, &args.scene)?;
    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    let sent = write_blocks(&mut session, args.limit, &mut out)?;
    out.flush()?;
    tracing::debug!(blocks = sent, "finished streaming blocks");
    Ok(())
}

/// One JSON line per block; returns how many were written.
fn write_blocks(
    session: &mut Session,
    limit: Option<usize>,
    out: &mut impl Write,
) -> Result<usize> {
    let limit = limit.unwrap_or(usize::MAX);
    let mut sent = 0;
    while sent < limit {
        let Some(block) = session.next_block() else {
            break;
        };
        serde_json::to_writer(&mut *out, &block)?;
        writeln!(out)?;
        sent += 1;
    }
    Ok(sent)
}

fn execute_audio(config: SessionConfig, args: AudioArgs) -> Result<()> {
    let mut session = open_session(config, &args.scene)?;
    let selectors = if args.channels.is_empty() {
        session
            .channel_table()
            .rows()
            .iter()
            .map(|row| i32::from(row.track_index) - 1)
            .collect()
    } else {
        args.channels.clone()
    };
    if selectors.is_empty() {
        bail!("no channels selected and the scene has no channel table");
    }

    let lower = args.lower.unwrap_or(0);
    let upper = args.upper.unwrap_or(i64::MAX);
    let mut samples = vec![0.0f32; args.frames * selectors.len()];
    if !session.audio_block(args.start, args.frames, &selectors, lower, upper, &mut samples) {
        let reason = session.last_error().unwrap_or("unknown error");
        bail!("failed to read audio block: {reason}");
    }

    match &args.output {
        Some(path) => {
            let sample_rate = session
                .sample_rate()
                .ok_or_else(|| anyhow!("audio source has no sample rate"))?;
            write_wav(path, sample_rate, selectors.len(), &samples)?;
        }
        None => {
            let stdout = io::stdout();
            let mut out = BufWriter::new(stdout.lock());
            write_frames(args.start, selectors.len(), &samples, &mut out)?;
            out.flush()?;
        }
    }

    let stats = session.cache_stats();
    tracing::debug!(hits = stats.hits, misses = stats.misses, "cache usage");
    Ok(())
}

/// Tab separated rows: absolute frame, then one sample per channel.
fn write_frames(start: i64, channels: usize, samples: &[f32], out: &mut impl Write) -> Result<()> {
    for (offset, frame) in samples.chunks_exact(channels).enumerate() {
        write!(out, "{}", start + offset as i64)?;
        for sample in frame {
            write!(out, "\t{sample}")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_wav(path: &Path, sample_rate: u32, channels: usize, samples: &[f32]) -> Result<()> {
    let spec = hound::WavSpec {
        channels: u16::try_from(channels).context("too many channels for a WAV file")?,
        sample_rate,
        bits_per_sample: 32,
        sample_format: hound::SampleFormat::Float,
    };
    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer
        .finalize()
        .with_context(|| format!("failed to finalise {}", path.display()))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use admkit_tests::{object_block, SceneBuilder};

    fn session() -> Session {
        let mut scene = SceneBuilder::new();
        scene
            .object(0x1001, "Dialogue", vec![object_block(0, 100, 0.0), object_block(100, 100, 10.0)])
            .hoa(0x1002, "Room", &[(0, 0, &[0])])
            .stray_uid();
        let (document, table) = scene.build();
        let mut session = Session::default();
        session.attach(document, table, Box::new(scene.source(48_000, 10)));
        session
    }

    #[test]
    fn parses_audio_window_with_negative_start() {
        let cli = Cli::try_parse_from([
            "admkit", "audio", "--scene", "s.json", "--audio", "a.wav", "--start", "-64",
            "--frames", "128", "--channel", "0", "--channel", "-1", "--lower", "-8",
        ])
        .unwrap();
        let Commands::Audio(args) = cli.command else {
            panic!("expected the audio subcommand");
        };
        assert_eq!(args.start, -64);
        assert_eq!(args.frames, 128);
        assert_eq!(args.channels, vec![0, -1]);
        assert_eq!(args.lower, Some(-8));
        assert_eq!(args.upper, None);
        assert_eq!(args.scene.scene, PathBuf::from("s.json"));
    }

    #[test]
    fn config_flag_is_global() {
        let cli = Cli::try_parse_from([
            "admkit", "items", "--scene", "s.json", "--audio", "a.wav", "--config", "c.json",
            "--format", "json", "--all",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("c.json")));
        let Commands::Items(args) = cli.command else {
            panic!("expected the items subcommand");
        };
        assert!(matches!(args.format, ListFormat::Json));
        assert!(args.all);
    }

    #[test]
    fn scene_and_frames_are_required() {
        assert!(Cli::try_parse_from(["admkit", "blocks", "--audio", "a.wav"]).is_err());
        assert!(
            Cli::try_parse_from(["admkit", "audio", "--scene", "s.json", "--audio", "a.wav"])
                .is_err()
        );
    }

    #[test]
    fn item_listing_marks_validity() {
        let session = session();
        let mut table = Vec::new();
        write_items(&session, ListFormat::Table, false, &mut table).unwrap();
        let table = String::from_utf8(table).unwrap();
        assert!(table.contains("Dialogue"));
        assert!(!table.contains("(invalid)"));
        assert!(table.ends_with("2 items, 2 renderable, 5 channels\n"));

        let mut json = Vec::new();
        write_items(&session, ListFormat::Json, true, &mut json).unwrap();
        let listed: serde_json::Value = serde_json::from_slice(&json).unwrap();
        let names: Vec<_> = listed
            .as_array()
            .unwrap()
            .iter()
            .map(|item| item["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, vec!["Dialogue", "Room"]);
        assert!(listed[1]["valid"].as_bool().unwrap());
    }

    #[test]
    fn block_stream_honours_the_limit() {
        let mut session = session();
        let mut out = Vec::new();
        assert_eq!(write_blocks(&mut session, Some(2), &mut out).unwrap(), 2);
        assert_eq!(String::from_utf8(out).unwrap().lines().count(), 2);

        let mut rest = Vec::new();
        assert_eq!(write_blocks(&mut session, None, &mut rest).unwrap(), 1);
        let line: serde_json::Value = serde_json::from_slice(&rest).unwrap();
        assert!(line.is_object());
    }

    #[test]
    fn frames_print_one_row_each() {
        let mut out = Vec::new();
        write_frames(-1, 2, &[0.0, 0.0, 0.5, -0.25], &mut out).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "-1\t0\t0\n0\t0.5\t-0.25\n");
    }
}
