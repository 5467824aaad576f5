// Scripted stand-ins for the capture host, preview and save dialog
//
// Each acquired stream replays the next "take" of fragments queued on the
// host. Fragments are queued before start() returns, so the order the
// recorder sees is fully deterministic.

#![allow(dead_code)]

use async_trait::async_trait;
use desk_recorder::capture::{CaptureBackend, MediaStream, PreviewSurface};
use desk_recorder::export::{SaveDialog, SaveDialogOptions};
use desk_recorder::{CaptureHost, CaptureSource, Error, Fragment, Result, SourceKind, StreamConstraints};
use std::collections::VecDeque;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tokio::sync::mpsc;

pub fn sources() -> Vec<CaptureSource> {
    vec![
        CaptureSource::new("screen:0", "Screen 1", SourceKind::Screen),
        CaptureSource::new("window:0x05000001", "Window A", SourceKind::Window),
    ]
}

#[derive(Default)]
pub struct ScriptedHost {
    sources: Vec<CaptureSource>,
    takes: Mutex<VecDeque<Vec<Fragment>>>,
    /// Streams close on their own right after the scripted fragments
    end_early: bool,
    deny_query: bool,
    deny_capture: bool,
    /// How many times each acquired pipeline refuses to start
    start_failures: usize,
    pub acquired: Arc<Mutex<Vec<StreamConstraints>>>,
}

impl ScriptedHost {
    pub fn new(sources: Vec<CaptureSource>) -> Self {
        Self {
            sources,
            ..Self::default()
        }
    }

    pub fn with_take<I, F>(self, fragments: I) -> Self
    where
        I: IntoIterator<Item = F>,
        F: AsRef<[u8]>,
    {
        self.takes
            .lock()
            .unwrap()
            .push_back(fragments.into_iter().map(|f| f.as_ref().to_vec()).collect());
        self
    }

    pub fn ending_early(mut self) -> Self {
        self.end_early = true;
        self
    }

    pub fn denying_query(mut self) -> Self {
        self.deny_query = true;
        self
    }

    pub fn denying_capture(mut self) -> Self {
        self.deny_capture = true;
        self
    }

    pub fn failing_start(mut self, times: usize) -> Self {
        self.start_failures = times;
        self
    }
}

#[async_trait]
impl CaptureHost for ScriptedHost {
    async fn list_sources(&self, kinds: &[SourceKind]) -> Result<Vec<CaptureSource>> {
        if self.deny_query {
            return Err(Error::PlatformQuery("enumeration denied".to_string()));
        }
        Ok(self
            .sources
            .iter()
            .filter(|s| kinds.contains(&s.kind))
            .cloned()
            .collect())
    }

    async fn acquire(&self, constraints: &StreamConstraints) -> Result<MediaStream> {
        self.acquired.lock().unwrap().push(constraints.clone());

        if self.deny_capture {
            return Err(Error::Permission("user denied capture".to_string()));
        }

        let source = self
            .sources
            .iter()
            .find(|s| s.id == constraints.video.source_id)
            .cloned()
            .ok_or_else(|| Error::Device(constraints.video.source_id.clone()))?;

        let fragments = self.takes.lock().unwrap().pop_front().unwrap_or_default();
        let backend = ScriptedBackend {
            fragments,
            end_early: self.end_early,
            start_failures: self.start_failures,
            starts: 0,
            tx: None,
        };
        Ok(MediaStream::new(source, Box::new(backend)))
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

struct ScriptedBackend {
    fragments: Vec<Fragment>,
    end_early: bool,
    start_failures: usize,
    starts: usize,
    tx: Option<mpsc::Sender<Fragment>>,
}

#[async_trait]
impl CaptureBackend for ScriptedBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>> {
        self.starts += 1;
        if self.starts <= self.start_failures {
            return Err(Error::Permission("Cannot open display".to_string()));
        }

        let (tx, rx) = mpsc::channel(self.fragments.len().max(1));
        for fragment in self.fragments.drain(..) {
            tx.try_send(fragment).expect("channel sized for every fragment");
        }
        if !self.end_early {
            self.tx = Some(tx);
        }
        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.tx = None;
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.tx.is_some()
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Preview that remembers what it was asked to show
#[derive(Clone, Default)]
pub struct RecordingPreview {
    pub shown: Arc<Mutex<Vec<String>>>,
}

impl PreviewSurface for RecordingPreview {
    fn attach(&mut self, stream: &MediaStream) {
        self.shown.lock().unwrap().push(stream.source().name.clone());
    }
}

/// Save dialog that answers with a fixed path and counts how often it opened
#[derive(Default)]
pub struct CountingDialog {
    pub answer: Option<PathBuf>,
    pub calls: usize,
    pub last_options: Option<SaveDialogOptions>,
}

impl CountingDialog {
    pub fn answering(path: PathBuf) -> Self {
        Self {
            answer: Some(path),
            ..Self::default()
        }
    }

    pub fn cancelling() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SaveDialog for CountingDialog {
    async fn show_save_dialog(&mut self, options: &SaveDialogOptions) -> Result<Option<PathBuf>> {
        self.calls += 1;
        self.last_options = Some(options.clone());
        Ok(self.answer.clone())
    }
}
