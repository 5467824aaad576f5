//! Replay capture host
//!
//! Treats every file in a directory as a window and "captures" it by feeding
//! its bytes back as fragments. Useful for demos and headless runs where no
//! display is available.

use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use super::backend::{CaptureBackend, CaptureHost, Fragment, MediaStream, StreamConstraints};
use super::source::{CaptureSource, SourceKind};
use crate::error::{Error, Result};

pub struct ReplayHost {
    dir: PathBuf,
    fragment_bytes: usize,
    timeslice: Duration,
}

impl ReplayHost {
    pub fn new(dir: PathBuf, fragment_bytes: usize, timeslice: Duration) -> Self {
        Self {
            dir,
            fragment_bytes: fragment_bytes.max(1),
            timeslice,
        }
    }

    async fn files(&self) -> Result<Vec<(CaptureSource, PathBuf)>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await.map_err(|e| {
            Error::PlatformQuery(format!("cannot read {}: {}", self.dir.display(), e))
        })?;

        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let path = entry.path();
            let name = path
                .file_stem()
                .map(|stem| stem.to_string_lossy().into_owned())
                .unwrap_or_default();
            let id = format!("replay:{}", entry.file_name().to_string_lossy());
            found.push((CaptureSource::new(id, name, SourceKind::Window), path));
        }

        // read_dir order is filesystem dependent
        found.sort_by(|a, b| a.0.id.cmp(&b.0.id));
        Ok(found)
    }
}

#[async_trait]
impl CaptureHost for ReplayHost {
    async fn list_sources(&self, kinds: &[SourceKind]) -> Result<Vec<CaptureSource>> {
        if !kinds.contains(&SourceKind::Window) {
            return Ok(Vec::new());
        }
        Ok(self.files().await?.into_iter().map(|(source, _)| source).collect())
    }

    async fn acquire(&self, constraints: &StreamConstraints) -> Result<MediaStream> {
        let source_id = &constraints.video.source_id;
        let (source, path) = self
            .files()
            .await?
            .into_iter()
            .find(|(source, _)| &source.id == source_id)
            .ok_or_else(|| Error::Device(format!("source {} is no longer available", source_id)))?;

        info!("Acquired replay stream for {}", path.display());

        let backend = ReplayBackend {
            path,
            fragment_bytes: self.fragment_bytes,
            timeslice: self.timeslice,
            stop_requested: Arc::new(AtomicBool::new(false)),
            feeder: None,
        };
        Ok(MediaStream::new(source, Box::new(backend)))
    }

    fn name(&self) -> &str {
        "replay"
    }
}

struct ReplayBackend {
    path: PathBuf,
    fragment_bytes: usize,
    timeslice: Duration,
    stop_requested: Arc<AtomicBool>,
    feeder: Option<JoinHandle<()>>,
}

#[async_trait]
impl CaptureBackend for ReplayBackend {
    async fn start(&mut self) -> Result<mpsc::Receiver<Fragment>> {
        let data = tokio::fs::read(&self.path)
            .await
            .map_err(|e| Error::Device(format!("cannot read {}: {}", self.path.display(), e)))?;

        let (tx, rx) = mpsc::channel(100);
        let fragment_bytes = self.fragment_bytes;
        let timeslice = self.timeslice;
        let stop_requested = Arc::clone(&self.stop_requested);

        self.feeder = Some(tokio::spawn(async move {
            for fragment in data.chunks(fragment_bytes) {
                if stop_requested.load(Ordering::SeqCst) {
                    break;
                }
                if tx.send(fragment.to_vec()).await.is_err() {
                    break;
                }
                tokio::time::sleep(timeslice).await;
            }
            debug!("Replay feeder finished");
        }));

        Ok(rx)
    }

    async fn stop(&mut self) -> Result<()> {
        self.stop_requested.store(true, Ordering::SeqCst);
        self.feeder.take();
        Ok(())
    }

    fn is_capturing(&self) -> bool {
        self.feeder.as_ref().is_some_and(|f| !f.is_finished())
    }

    fn name(&self) -> &str {
        "replay"
    }
}
