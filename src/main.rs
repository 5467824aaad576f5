use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use desk_recorder::config::CaptureBackendKind;
use desk_recorder::{
    CaptureHost, CaptureHostFactory, Config, ExportOutcome, FixedPathDialog, RecordingSession,
    SessionConfig, SourcePicker, Terminal,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, Level};

#[derive(Parser)]
#[command(name = "desk-recorder", version)]
#[command(about = "Record a screen or window to a video file")]
struct Cli {
    /// Config file (extension optional)
    #[arg(short, long, global = true, default_value = "config/desk-recorder")]
    config: String,

    /// Capture backend, overrides the config file
    #[arg(long, global = true, value_enum)]
    backend: Option<BackendArg>,

    /// Directory of pre-encoded files for the replay backend
    #[arg(long, global = true)]
    replay_dir: Option<PathBuf>,

    /// Log at debug level
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List capturable windows and screens
    Sources {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record one source and save it
    Record {
        /// Source id or name; a menu is shown when omitted
        #[arg(short, long)]
        source: Option<String>,

        /// Stop after this many seconds instead of waiting for Enter
        #[arg(short, long)]
        duration: Option<u64>,

        /// Save here instead of asking
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum BackendArg {
    Ffmpeg,
    Replay,
}

impl From<BackendArg> for CaptureBackendKind {
    fn from(arg: BackendArg) -> Self {
        match arg {
            BackendArg::Ffmpeg => CaptureBackendKind::Ffmpeg,
            BackendArg::Replay => CaptureBackendKind::Replay,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_max_level(if cli.verbose { Level::DEBUG } else { Level::INFO })
        .with_writer(std::io::stderr)
        .init();

    let mut cfg = Config::load(&cli.config)?;
    if let Some(backend) = cli.backend {
        cfg.capture.backend = backend.into();
    }
    if let Some(dir) = cli.replay_dir {
        cfg.capture.replay_dir = Some(dir);
    }

    info!("desk-recorder v{}", env!("CARGO_PKG_VERSION"));
    debug!("Loaded config: {:?}", cfg);

    let host = CaptureHostFactory::create(&cfg.capture).context("Failed to create capture host")?;

    match cli.command {
        Command::Sources { json } => list_sources(host.as_ref(), json).await,
        Command::Record {
            source,
            duration,
            output,
        } => record(&cfg, host, source, duration, output).await,
    }
}

async fn list_sources(host: &dyn CaptureHost, json: bool) -> Result<()> {
    let sources = SourcePicker::default()
        .list_sources(host)
        .await
        .context("Failed to list capture sources")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&sources)?);
    } else {
        for source in &sources {
            println!("{}\t{}\t{}", source.id, source.kind, source.name);
        }
    }

    Ok(())
}

async fn record(
    cfg: &Config,
    host: Box<dyn CaptureHost>,
    source: Option<String>,
    duration: Option<u64>,
    output: Option<PathBuf>,
) -> Result<()> {
    let mut terminal = Terminal::stdio();
    let mut session = RecordingSession::new(SessionConfig::from_config(cfg), host);

    match source {
        Some(query) => {
            session
                .select_by_query(&query)
                .await
                .with_context(|| format!("Failed to select source {:?}", query))?;
        }
        None => {
            if session.pick_source(&mut terminal).await?.is_none() {
                info!("No source selected");
                return Ok(());
            }
        }
    }

    session.start().await.context("Failed to start recording")?;
    eprintln!("Recording \"{}\". Press Enter or Ctrl-C to stop.", session.source_label());

    wait_for_stop(&mut session, &mut terminal, duration).await;

    session.stop().await.context("Failed to stop recording")?;

    let outcome = match output {
        Some(path) => session.export(&mut FixedPathDialog::new(Some(path))).await,
        None => session.export(&mut terminal).await,
    }
    .context("Failed to save recording")?;

    match outcome {
        ExportOutcome::Saved(file) => info!(
            "Saved {} bytes to {}",
            file.bytes_written,
            file.path.display()
        ),
        ExportOutcome::Cancelled => info!("Recording discarded"),
    }

    println!("{}", serde_json::to_string_pretty(&session.stats())?);

    Ok(())
}

/// Block until the duration elapses, Enter is pressed or Ctrl-C arrives,
/// moving fragments into the session buffer meanwhile
async fn wait_for_stop<W>(
    session: &mut RecordingSession,
    terminal: &mut Terminal<W>,
    duration: Option<u64>,
) where
    W: tokio::io::AsyncWrite + Unpin + Send,
{
    let deadline = async {
        match duration {
            Some(secs) => tokio::time::sleep(Duration::from_secs(secs)).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);

    let mut poll = tokio::time::interval(Duration::from_secs(1));
    let mut stdin_open = true;

    loop {
        tokio::select! {
            _ = &mut deadline => {
                info!("Recording duration elapsed");
                break;
            }
            line = terminal.next_line(), if stdin_open => match line {
                Some(_) => break,
                None => stdin_open = false,
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
            _ = poll.tick() => {
                let ended = session.poll();
                debug!("{} fragments buffered", session.chunks().len());
                if ended {
                    info!("Capture stream ended");
                    break;
                }
            }
        }
    }
}
