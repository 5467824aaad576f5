//! ffmpeg capture pipeline
//!
//! Screens and windows are grabbed by an ffmpeg child process that encodes
//! VP9 into a WebM container on stdout. Stdout is collected and flushed to
//! the recorder once per timeslice.

use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use super::backend::{CaptureBackend, CaptureHost, Fragment, MediaStream, StreamConstraints};
use super::source::{CaptureSource, SourceKind};
use crate::config::CaptureConfig;
use crate::error::{Error, Result};

/// How long ffmpeg must survive after spawn before it counts as started
const STARTUP_PROBE: Duration = Duration::from_millis(300);

/// A monitor as reported by `xrandr --listmonitors`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Monitor {
    pub index: usize,
    pub output: String,
    pub width: u32,
    pub height: u32,
    pub x: i32,
    pub y: i32,
}

/// A top-level window as reported by `wmctrl -l`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowEntry {
    pub id: String,
    pub title: String,
}

/// What ffmpeg is asked to grab
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GrabTarget {
    Screen(Monitor),
    Window(WindowEntry),
    /// Whole desktop on platforms without per-monitor enumeration
    Desktop,
}

/// Parse `xrandr --listmonitors` output
///
/// ```text
/// Monitors: 2
///  0: +*eDP-1 1920/344x1080/193+0+0  eDP-1
///  1: +HDMI-1 2560/597x1440/336+1920+0  HDMI-1
/// ```
pub fn parse_xrandr_monitors(output: &str) -> Vec<Monitor> {
    output
        .lines()
        .filter_map(|line| {
            let (index, rest) = line.trim().split_once(':')?;
            let index = index.trim().parse().ok()?;
            let mut fields = rest.split_whitespace();
            let output = fields.next()?.trim_start_matches(&['+', '*'][..]).to_string();
            let (width, height, x, y) = parse_monitor_geometry(fields.next()?)?;
            Some(Monitor {
                index,
                output,
                width,
                height,
                x,
                y,
            })
        })
        .collect()
}

// "1920/344x1080/193+0+0"
fn parse_monitor_geometry(geometry: &str) -> Option<(u32, u32, i32, i32)> {
    let (width, rest) = geometry.split_once('x')?;
    let width = width.split('/').next()?.parse().ok()?;

    let mut parts = rest.split('+');
    let height = parts.next()?.split('/').next()?.parse().ok()?;
    let x = parts.next()?.parse().ok()?;
    let y = parts.next()?.parse().ok()?;

    Some((width, height, x, y))
}

/// Parse `wmctrl -l` output
///
/// ```text
/// 0x03a00007  0 host Terminal
/// 0x04200003 -1 host Desktop panel
/// ```
/// Sticky windows (desktop -1) are panels and docks, so they are skipped.
pub fn parse_wmctrl_windows(output: &str) -> Vec<WindowEntry> {
    output
        .lines()
        .filter_map(|line| {
            let mut fields = line.split_whitespace();
            let id = fields.next()?;
            let desktop = fields.next()?;
            let _host = fields.next()?;
            let title = fields.collect::<Vec<_>>().join(" ");
            if desktop == "-1" || !id.starts_with("0x") || title.is_empty() {
                return None;
            }
            Some(WindowEntry {
                id: id.to_string(),
                title,
            })
        })
        .collect()
}

/// Build the ffmpeg argument list for a grab target
pub fn ffmpeg_args(target: &GrabTarget, config: &CaptureConfig) -> Vec<String> {
    let framerate = config.framerate.to_string();
    let mut args: Vec<String> = vec!["-hide_banner".into(), "-loglevel".into(), "error".into()];

    match target {
        GrabTarget::Screen(monitor) => {
            args.extend([
                "-f".into(),
                "x11grab".into(),
                "-framerate".into(),
                framerate,
                "-video_size".into(),
                format!("{}x{}", monitor.width, monitor.height),
                "-i".into(),
                format!("{}+{},{}", config.display(), monitor.x, monitor.y),
            ]);
        }
        GrabTarget::Window(window) => {
            args.extend([
                "-f".into(),
                "x11grab".into(),
                "-framerate".into(),
                framerate,
                "-window_id".into(),
                window.id.clone(),
                "-i".into(),
                config.display(),
            ]);
        }
        GrabTarget::Desktop => {
            args.extend(desktop_input_args(framerate));
        }
    }

    args.extend(
        [
            "-an",
            "-c:v",
            "libvpx-vp9",
            "-deadline",
            "realtime",
            "-cpu-used",
            "8",
            "-row-mt",
            "1",
            "-f",
            "webm",
            "-",
        ]
        .map(String::from),
    );

    args
}

#[cfg(target_os = "windows")]
fn desktop_input_args(framerate: String) -> Vec<String> {
    vec![
        "-f".into(),
        "gdigrab".into(),
        "-framerate".into(),
        framerate,
        "-i".into(),
        "desktop".into(),
    ]
}

#[cfg(target_os = "macos")]
fn desktop_input_args(framerate: String) -> Vec<String> {
    vec![
        "-f".into(),
        "avfoundation".into(),
        "-framerate".into(),
        framerate,
        "-capture_cursor".into(),
        "1".into(),
        "-i".into(),
        "0:none".into(),
    ]
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn desktop_input_args(framerate: String) -> Vec<String> {
    vec![
        "-f".into(),
        "x11grab".into(),
        "-framerate".into(),
        framerate,
        "-i".into(),
        ":0".into(),
    ]
}

/// Map ffmpeg's stderr after an early exit onto the capture error taxonomy
pub fn classify_ffmpeg_failure(stderr: &str) -> Error {
    let lowered = stderr.to_ascii_lowercase();
    let message = stderr.trim().to_string();

    if lowered.contains("cannot open display")
        || lowered.contains("permission denied")
        || lowered.contains("not authorized")
    {
        Error::Permission(message)
    } else {
        Error::Device(message)
    }
}

/// Capture host backed by ffmpeg and the X11 enumeration tools
pub struct FfmpegHost {
    config: CaptureConfig,
}

impl FfmpegHost {
    pub fn new(config: CaptureConfig) -> Self {
        Self { config }
    }

    async fn enumerate(&self, kinds: &[SourceKind]) -> Result<Vec<(CaptureSource, GrabTarget)>> {
        #[cfg(target_os = "linux")]
        {
            enumerate_x11(kinds).await
        }

        #[cfg(not(target_os = "linux"))]
        {
            if kinds.contains(&SourceKind::Screen) {
                Ok(vec![(
                    CaptureSource::new("screen:0", "Entire Screen", SourceKind::Screen),
                    GrabTarget::Desktop,
                )])
            } else {
                Err(Error::PlatformQuery(
                    "window enumeration is only supported on Linux".to_string(),
                ))
            }
        }
    }
}

#[cfg(target_os = "linux")]
async fn enumerate_x11(kinds: &[SourceKind]) -> Result<Vec<(CaptureSource, GrabTarget)>> {
    let mut found = Vec::new();
    let mut failures = Vec::new();

    if kinds.contains(&SourceKind::Window) {
        match run_tool("wmctrl", &["-l"]).await {
            Ok(output) => {
                for window in parse_wmctrl_windows(&output) {
                    let source = CaptureSource::new(
                        format!("window:{}", window.id),
                        window.title.clone(),
                        SourceKind::Window,
                    );
                    found.push((source, GrabTarget::Window(window)));
                }
            }
            Err(e) => {
                warn!("Window enumeration unavailable: {}", e);
                failures.push(e);
            }
        }
    }

    if kinds.contains(&SourceKind::Screen) {
        match run_tool("xrandr", &["--listmonitors"]).await {
            Ok(output) => {
                for monitor in parse_xrandr_monitors(&output) {
                    let source = CaptureSource::new(
                        format!("screen:{}", monitor.index),
                        format!("Screen {}", monitor.index + 1),
                        SourceKind::Screen,
                    );
                    found.push((source, GrabTarget::Screen(monitor)));
                }
            }
            Err(e) => {
                warn!("Screen enumeration unavailable: {}", e);
                failures.push(e);
            }
        }
    }

    if !kinds.is_empty() && failures.len() == kinds.len() {
        return Err(Error::PlatformQuery(failures.join("; ")));
    }

    Ok(found)
}

#[cfg(target_os = "linux")]
async fn run_tool(program: &str, args: &[&str]) -> std::result::Result<String, String> {
    let output = Command::new(program)
        .args(args)
        .output()
        .await
        .map_err(|e| format!("{} failed to run: {}", program, e))?;

    if !output.status.success() {
        return Err(format!(
            "{} exited with {}: {}",
            program,
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

#[async_trait]
impl CaptureHost for FfmpegHost {
    async fn list_sources(&self, kinds: &[SourceKind]) -> Result<Vec<CaptureSource>> {
        let sources = self.enumerate(kinds).await?;
        info!("Found {} capture sources", sources.len());
        Ok(sources.into_iter().map(|(source, _)| source).collect())
    }

    async fn acquire(&self, constraints: &StreamConstraints) -> Result<MediaStream> {
        if constraints.audio {
            warn!("Audio capture is not supported; recording video only");
        }

        let source_id = &constraints.video.source_id;
        let (source, target) = self
            .enumerate(&SourceKind::ALL)
            .await?
            .into_iter()
            .find(|(source, _)| &source.id == source_id)
            .ok_or_else(|| Error::Device(format!("source {} is no longer available", source_id)))?;

        info!("Acquired ffmpeg stream for {}", source);

        let backend = FfmpegBackend::new(
            self.config.ffmpeg_path.clone(),
            ffmpeg_args(&target, &self.config),
            self.config.timeslice(),
            self.config.stop_grace(),
        );

        Ok(MediaStream::new(source, Box::new(backend)))
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// One ffmpeg child process encoding a single source
pub struct FfmpegBackend {
    program: String,
    args: Vec<String>,
    timeslice: Duration,
    stop_grace: Duration,
    child: Option<Child>,
    stdin: Option<ChildStdin>,
    reader: Option<JoinHandle<()>>,
}

impl FfmpegBackend {
    pub fn new(program: String, args: Vec<String>, timeslice: Duration, stop_grace: Duration) -> Self {
        Self {
            program,
            args,
            timeslice,
            stop_grace,
            child: None,
            stdin: None,
            reader: None,
        }
    }
}

#[async_trait]
impl CaptureBackend for FfmpegBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>> {
        debug!("Spawning {} {}", self.program, self.args.join(" "));

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Device(format!("failed to start {}: {}", self.program, e)))?;

        // A grab that cannot open its source exits almost immediately
        if let Ok(status) = tokio::time::timeout(STARTUP_PROBE, child.wait()).await {
            let status = status?;
            let mut stderr = String::new();
            if let Some(mut pipe) = child.stderr.take() {
                pipe.read_to_string(&mut stderr).await?;
            }
            error!("ffmpeg exited during startup ({}): {}", status, stderr.trim());
            return Err(classify_ffmpeg_failure(&stderr));
        }

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::Device("ffmpeg stdout was not captured".to_string()))?;

        if let Some(stderr) = child.stderr.take() {
            tokio::spawn(log_stderr(stderr));
        }

        let (tx, rx) = mpsc::channel(100);
        self.reader = Some(tokio::spawn(forward_output(stdout, tx, self.timeslice)));
        self.stdin = child.stdin.take();
        self.child = Some(child);

        info!("ffmpeg capture started");

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        let Some(mut child) = self.child.take() else {
            return Ok(());
        };

        info!("Stopping ffmpeg capture");

        // 'q' makes ffmpeg finish the container cleanly
        if let Some(mut stdin) = self.stdin.take() {
            if let Err(e) = stdin.write_all(b"q").await {
                warn!("Failed to signal ffmpeg to stop: {}", e);
            }
            drop(stdin);
        }

        match tokio::time::timeout(self.stop_grace, child.wait()).await {
            Ok(status) => info!("ffmpeg exited with {}", status?),
            Err(_) => {
                warn!(
                    "ffmpeg did not exit within {:?}, killing it",
                    self.stop_grace
                );
                child.kill().await?;
            }
        }

        // The reader finishes on its own once stdout hits EOF
        self.reader.take();

        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.child.is_some()
    }

    fn name(&self) -> &str {
        "ffmpeg"
    }
}

/// Collect encoder output and hand it over once per timeslice
async fn forward_output<R>(mut output: R, tx: mpsc::Sender<Fragment>, timeslice: Duration)
where
    R: AsyncRead + Unpin,
{
    let mut pending = Vec::new();
    let mut buf = vec![0u8; 16 * 1024];
    let mut ticker = tokio::time::interval(timeslice);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    ticker.tick().await;

    loop {
        tokio::select! {
            read = output.read(&mut buf) => match read {
                Ok(0) => break,
                Ok(n) => pending.extend_from_slice(&buf[..n]),
                Err(e) => {
                    error!("Failed to read encoder output: {}", e);
                    break;
                }
            },
            _ = ticker.tick() => {
                if !pending.is_empty() && tx.send(std::mem::take(&mut pending)).await.is_err() {
                    return;
                }
            }
        }
    }

    if !pending.is_empty() {
        let _ = tx.send(pending).await;
    }
    debug!("Encoder output closed");
}

async fn log_stderr<R>(stderr: R)
where
    R: AsyncRead + Unpin,
{
    use tokio::io::AsyncBufReadExt;

    let mut lines = tokio::io::BufReader::new(stderr).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        warn!("ffmpeg: {}", line);
    }
}
